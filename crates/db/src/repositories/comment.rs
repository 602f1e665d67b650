use std::str::FromStr;

use sqlx::Row;

use ideaflow_core::domain::comment::{Comment, CommentId, CommentType};
use ideaflow_core::domain::idea::IdeaId;
use ideaflow_core::domain::user::UserId;

use super::{decode_err, parse_timestamp, CommentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCommentRepository {
    pool: DbPool,
}

impl SqlCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Result<Comment, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let idea_id: String = row.try_get("idea_id").map_err(decode_err)?;
    let user_id: String = row.try_get("user_id").map_err(decode_err)?;
    let text: String = row.try_get("comment_text").map_err(decode_err)?;
    let comment_type: String = row.try_get("comment_type").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;

    Ok(Comment {
        id: CommentId(id),
        idea_id: IdeaId(idea_id),
        user_id: UserId(user_id),
        text,
        created_at: parse_timestamp("created_at", &created_at)?,
        comment_type: CommentType::from_str(&comment_type).map_err(decode_err)?,
    })
}

#[async_trait::async_trait]
impl CommentRepository for SqlCommentRepository {
    async fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, idea_id, user_id, comment_text, comment_type, created_at
             FROM idea_comment
             WHERE idea_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(&idea_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn append(&self, comment: Comment) -> Result<(), RepositoryError> {
        insert_comment(&self.pool, &comment).await
    }
}

pub(crate) async fn insert_comment<'e, E>(executor: E, comment: &Comment) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO idea_comment (id, idea_id, user_id, comment_text, comment_type, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&comment.id.0)
    .bind(&comment.idea_id.0)
    .bind(&comment.user_id.0)
    .bind(&comment.text)
    .bind(comment.comment_type.as_str())
    .bind(comment.created_at.to_rfc3339())
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
            Err(RepositoryError::Duplicate(format!("comment `{}`", comment.id.0)))
        }
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use ideaflow_core::domain::comment::{Comment, CommentId, CommentType};
    use ideaflow_core::domain::idea::{Idea, IdeaId, IdeaStatus};
    use ideaflow_core::domain::user::{User, UserId, UserRole};

    use super::SqlCommentRepository;
    use crate::repositories::{
        CommentRepository, IdeaRepository, RepositoryError, SqlIdeaRepository, SqlUserRepository,
        UserRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlCommentRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        SqlUserRepository::new(pool.clone())
            .save(User {
                id: UserId("approver4".to_string()),
                username: "jbrown".to_string(),
                full_name: "Jessica Brown".to_string(),
                email: "jessica.brown@company.com".to_string(),
                role: UserRole::Approver,
                department: "HR".to_string(),
                approval_categories: vec!["Employee Experience".to_string()],
                is_active: true,
            })
            .await
            .expect("insert user");

        let now = Utc::now();
        SqlIdeaRepository::new(pool.clone())
            .save(Idea {
                id: IdeaId("idea3".to_string()),
                title: "Implement four-day work week pilot program".to_string(),
                description: "Pilot a four-day work week in selected departments.".to_string(),
                category: "Employee Experience".to_string(),
                benefits: "Improved work-life balance.".to_string(),
                submitter_id: UserId("approver4".to_string()),
                status: IdeaStatus::UnderReview,
                date_submitted: now,
                last_modified: now,
                assigned_approver_id: None,
                attachments: Vec::new(),
                impact: None,
                effort: None,
                implementation_phase: None,
                implementation_start_date: None,
                estimated_completion_date: None,
                actual_completion_date: None,
                expected_roi: None,
            })
            .await
            .expect("insert idea");

        SqlCommentRepository::new(pool)
    }

    fn comment(id: &str, text: &str, comment_type: CommentType, offset_minutes: i64) -> Comment {
        Comment {
            id: CommentId(id.to_string()),
            idea_id: IdeaId("idea3".to_string()),
            user_id: UserId("approver4".to_string()),
            text: text.to_string(),
            created_at: Utc::now() + Duration::minutes(offset_minutes),
            comment_type,
        }
    }

    #[tokio::test]
    async fn comments_are_listed_in_creation_order() {
        let repo = setup().await;
        repo.append(comment("c2", "Please add rollout details.", CommentType::RevisionRequest, 5))
            .await
            .expect("append");
        repo.append(comment("c1", "Interesting proposal.", CommentType::General, 0))
            .await
            .expect("append");

        let listed = repo.list_for_idea(&IdeaId("idea3".to_string())).await.expect("list");
        let ids: Vec<_> = listed.iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(listed[1].comment_type, CommentType::RevisionRequest);
    }

    #[tokio::test]
    async fn duplicate_comment_id_is_rejected() {
        let repo = setup().await;
        let first = comment("c1", "Interesting proposal.", CommentType::General, 0);
        repo.append(first.clone()).await.expect("append");

        let error = repo.append(first).await.expect_err("comments are append-only");
        assert!(matches!(error, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn unknown_idea_yields_empty_list() {
        let repo = setup().await;
        let listed = repo.list_for_idea(&IdeaId("idea99".to_string())).await.expect("list");
        assert!(listed.is_empty());
    }
}
