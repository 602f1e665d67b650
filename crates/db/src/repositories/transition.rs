use std::str::FromStr;

use ideaflow_core::domain::idea::IdeaStatus;

use super::audit::insert_event;
use super::comment::insert_comment;
use super::{decode_err, RepositoryError, TransitionRecord, TransitionRepository, TransitionWrite};
use crate::DbPool;

pub struct SqlTransitionRepository {
    pool: DbPool,
}

impl SqlTransitionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TransitionRepository for SqlTransitionRepository {
    async fn record_transition(
        &self,
        record: TransitionRecord,
    ) -> Result<TransitionWrite, RepositoryError> {
        let idea = &record.idea;
        let mut tx = self.pool.begin().await?;

        // Only the workflow-owned columns move; the status guard makes this a compare-and-swap.
        let updated = sqlx::query(
            "UPDATE idea
             SET status = ?, last_modified = ?, assigned_approver_id = ?
             WHERE id = ? AND status = ?",
        )
        .bind(idea.status.as_str())
        .bind(idea.last_modified.to_rfc3339())
        .bind(idea.assigned_approver_id.as_ref().map(|id| id.0.clone()))
        .bind(&idea.id.0)
        .bind(record.expected_status.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM idea WHERE id = ?")
                    .bind(&idea.id.0)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;

            let current =
                current.ok_or_else(|| RepositoryError::Missing(format!("idea `{}`", idea.id.0)))?;
            return Ok(TransitionWrite::Stale {
                current: IdeaStatus::from_str(&current).map_err(decode_err)?,
            });
        }

        if let Some(comment) = &record.comment {
            insert_comment(&mut *tx, comment).await?;
        }
        for event in &record.events {
            insert_event(&mut *tx, event).await?;
        }

        tx.commit().await?;
        Ok(TransitionWrite::Applied)
    }
}
