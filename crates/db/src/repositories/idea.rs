use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use ideaflow_core::domain::idea::{Idea, IdeaId, IdeaStatus, ImplementationPhase, Level};
use ideaflow_core::domain::user::UserId;

use super::{
    decode_err, parse_optional_timestamp, parse_timestamp, IdeaRepository, RepositoryError,
};
use crate::DbPool;

const IDEA_COLUMNS: &str = "id, title, description, category, benefits, submitter_id, status,
    date_submitted, last_modified, assigned_approver_id, attachments_json, impact, effort,
    implementation_phase, implementation_start_date, estimated_completion_date,
    actual_completion_date, expected_roi";

pub struct SqlIdeaRepository {
    pool: DbPool,
}

impl SqlIdeaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_optional<T>(value: Option<String>) -> Result<Option<T>, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.as_deref().map(T::from_str).transpose().map_err(decode_err)
}

fn row_to_idea(row: &sqlx::sqlite::SqliteRow) -> Result<Idea, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let title: String = row.try_get("title").map_err(decode_err)?;
    let description: String = row.try_get("description").map_err(decode_err)?;
    let category: String = row.try_get("category").map_err(decode_err)?;
    let benefits: String = row.try_get("benefits").map_err(decode_err)?;
    let submitter_id: String = row.try_get("submitter_id").map_err(decode_err)?;
    let status: String = row.try_get("status").map_err(decode_err)?;
    let date_submitted: String = row.try_get("date_submitted").map_err(decode_err)?;
    let last_modified: String = row.try_get("last_modified").map_err(decode_err)?;
    let assigned_approver_id: Option<String> =
        row.try_get("assigned_approver_id").map_err(decode_err)?;
    let attachments_json: String = row.try_get("attachments_json").map_err(decode_err)?;
    let impact: Option<String> = row.try_get("impact").map_err(decode_err)?;
    let effort: Option<String> = row.try_get("effort").map_err(decode_err)?;
    let implementation_phase: Option<String> =
        row.try_get("implementation_phase").map_err(decode_err)?;
    let implementation_start_date: Option<String> =
        row.try_get("implementation_start_date").map_err(decode_err)?;
    let estimated_completion_date: Option<String> =
        row.try_get("estimated_completion_date").map_err(decode_err)?;
    let actual_completion_date: Option<String> =
        row.try_get("actual_completion_date").map_err(decode_err)?;
    let expected_roi: Option<String> = row.try_get("expected_roi").map_err(decode_err)?;

    let attachments: Vec<String> = serde_json::from_str(&attachments_json).map_err(decode_err)?;

    Ok(Idea {
        id: IdeaId(id),
        title,
        description,
        category,
        benefits,
        submitter_id: UserId(submitter_id),
        status: IdeaStatus::from_str(&status).map_err(decode_err)?,
        date_submitted: parse_timestamp("date_submitted", &date_submitted)?,
        last_modified: parse_timestamp("last_modified", &last_modified)?,
        assigned_approver_id: assigned_approver_id.map(UserId),
        attachments,
        impact: parse_optional::<Level>(impact)?,
        effort: parse_optional::<Level>(effort)?,
        implementation_phase: parse_optional::<ImplementationPhase>(implementation_phase)?,
        implementation_start_date: parse_optional_timestamp(
            "implementation_start_date",
            implementation_start_date,
        )?,
        estimated_completion_date: parse_optional_timestamp(
            "estimated_completion_date",
            estimated_completion_date,
        )?,
        actual_completion_date: parse_optional_timestamp(
            "actual_completion_date",
            actual_completion_date,
        )?,
        expected_roi: parse_optional::<Decimal>(expected_roi)?,
    })
}

#[async_trait::async_trait]
impl IdeaRepository for SqlIdeaRepository {
    async fn find_by_id(&self, id: &IdeaId) -> Result<Option<Idea>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {IDEA_COLUMNS} FROM idea WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_idea).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Idea>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {IDEA_COLUMNS} FROM idea ORDER BY date_submitted DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_idea).collect()
    }

    async fn list_by_status(&self, status: IdeaStatus) -> Result<Vec<Idea>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {IDEA_COLUMNS} FROM idea WHERE status = ? ORDER BY date_submitted DESC, id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_idea).collect()
    }

    async fn save(&self, idea: Idea) -> Result<(), RepositoryError> {
        let attachments_json = serde_json::to_string(&idea.attachments).map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO idea (id, title, description, category, benefits, submitter_id, status,
                               date_submitted, last_modified, assigned_approver_id,
                               attachments_json, impact, effort, implementation_phase,
                               implementation_start_date, estimated_completion_date,
                               actual_completion_date, expected_roi)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 description = excluded.description,
                 category = excluded.category,
                 benefits = excluded.benefits,
                 status = excluded.status,
                 last_modified = excluded.last_modified,
                 assigned_approver_id = excluded.assigned_approver_id,
                 attachments_json = excluded.attachments_json,
                 impact = excluded.impact,
                 effort = excluded.effort,
                 implementation_phase = excluded.implementation_phase,
                 implementation_start_date = excluded.implementation_start_date,
                 estimated_completion_date = excluded.estimated_completion_date,
                 actual_completion_date = excluded.actual_completion_date,
                 expected_roi = excluded.expected_roi",
        )
        .bind(&idea.id.0)
        .bind(&idea.title)
        .bind(&idea.description)
        .bind(&idea.category)
        .bind(&idea.benefits)
        .bind(&idea.submitter_id.0)
        .bind(idea.status.as_str())
        .bind(idea.date_submitted.to_rfc3339())
        .bind(idea.last_modified.to_rfc3339())
        .bind(idea.assigned_approver_id.as_ref().map(|id| id.0.clone()))
        .bind(attachments_json)
        .bind(idea.impact.map(Level::as_str))
        .bind(idea.effort.map(Level::as_str))
        .bind(idea.implementation_phase.map(ImplementationPhase::as_str))
        .bind(idea.implementation_start_date.map(|dt| dt.to_rfc3339()))
        .bind(idea.estimated_completion_date.map(|dt| dt.to_rfc3339()))
        .bind(idea.actual_completion_date.map(|dt| dt.to_rfc3339()))
        .bind(idea.expected_roi.map(|roi| roi.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
