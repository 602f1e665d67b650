use std::collections::BTreeMap;

use sqlx::Row;

use ideaflow_core::audit::{AuditCategory, AuditEvent, AuditOutcome};
use ideaflow_core::domain::idea::IdeaId;

use super::{decode_err, parse_timestamp, AuditRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAuditRepository {
    pool: DbPool,
}

impl SqlAuditRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_category(value: &str) -> Result<AuditCategory, RepositoryError> {
    match value {
        "submission" => Ok(AuditCategory::Submission),
        "workflow" => Ok(AuditCategory::Workflow),
        "comment" => Ok(AuditCategory::Comment),
        "persistence" => Ok(AuditCategory::Persistence),
        "system" => Ok(AuditCategory::System),
        other => Err(RepositoryError::Decode(format!("unknown audit category `{other}`"))),
    }
}

fn parse_outcome(value: &str) -> Result<AuditOutcome, RepositoryError> {
    match value {
        "success" => Ok(AuditOutcome::Success),
        "rejected" => Ok(AuditOutcome::Rejected),
        "failed" => Ok(AuditOutcome::Failed),
        other => Err(RepositoryError::Decode(format!("unknown audit outcome `{other}`"))),
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEvent, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let idea_id: Option<String> = row.try_get("idea_id").map_err(decode_err)?;
    let correlation_id: String = row.try_get("correlation_id").map_err(decode_err)?;
    let event_type: String = row.try_get("event_type").map_err(decode_err)?;
    let category: String = row.try_get("event_category").map_err(decode_err)?;
    let actor: String = row.try_get("actor").map_err(decode_err)?;
    let outcome: String = row.try_get("outcome").map_err(decode_err)?;
    let metadata_json: String = row.try_get("metadata_json").map_err(decode_err)?;
    let occurred_at: String = row.try_get("occurred_at").map_err(decode_err)?;

    let metadata: BTreeMap<String, String> =
        serde_json::from_str(&metadata_json).map_err(decode_err)?;

    Ok(AuditEvent {
        event_id: id,
        idea_id: idea_id.map(IdeaId),
        correlation_id,
        event_type,
        category: parse_category(&category)?,
        actor,
        outcome: parse_outcome(&outcome)?,
        metadata,
        occurred_at: parse_timestamp("occurred_at", &occurred_at)?,
    })
}

#[async_trait::async_trait]
impl AuditRepository for SqlAuditRepository {
    async fn append(&self, event: AuditEvent) -> Result<(), RepositoryError> {
        insert_event(&self.pool, &event).await
    }

    async fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<AuditEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, idea_id, correlation_id, event_type, event_category, actor, outcome,
                    metadata_json, occurred_at
             FROM audit_event
             WHERE idea_id = ?
             ORDER BY occurred_at ASC, rowid ASC",
        )
        .bind(&idea_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect()
    }
}

pub(crate) async fn insert_event<'e, E>(executor: E, event: &AuditEvent) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let metadata_json = serde_json::to_string(&event.metadata).map_err(decode_err)?;

    sqlx::query(
        "INSERT INTO audit_event (id, idea_id, correlation_id, event_type, event_category,
                                  actor, outcome, metadata_json, occurred_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.event_id)
    .bind(event.idea_id.as_ref().map(|id| id.0.clone()))
    .bind(&event.correlation_id)
    .bind(&event.event_type)
    .bind(event.category.as_str())
    .bind(&event.actor)
    .bind(event.outcome.as_str())
    .bind(metadata_json)
    .bind(event.occurred_at.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}
