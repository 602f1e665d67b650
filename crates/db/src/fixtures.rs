use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Expected state of one seeded idea.
struct SeedIdeaContract {
    id: &'static str,
    status: &'static str,
    category: &'static str,
    submitter_id: &'static str,
    assigned_approver_id: Option<&'static str>,
}

const SEED_IDEAS: &[SeedIdeaContract] = &[
    SeedIdeaContract {
        id: "idea1",
        status: "approved",
        category: "Technology Innovation",
        submitter_id: "user1",
        assigned_approver_id: Some("approver1"),
    },
    SeedIdeaContract {
        id: "idea2",
        status: "under_review",
        category: "Sustainability",
        submitter_id: "user2",
        assigned_approver_id: Some("approver10"),
    },
    SeedIdeaContract {
        id: "idea3",
        status: "revision_requested",
        category: "Employee Experience",
        submitter_id: "user3",
        assigned_approver_id: Some("approver4"),
    },
    SeedIdeaContract {
        id: "idea4",
        status: "submitted",
        category: "Customer Experience",
        submitter_id: "user5",
        assigned_approver_id: None,
    },
    SeedIdeaContract {
        id: "idea5",
        status: "rejected",
        category: "Cost Saving",
        submitter_id: "user4",
        assigned_approver_id: Some("approver3"),
    },
    SeedIdeaContract {
        id: "idea6",
        status: "approved",
        category: "Product Enhancement",
        submitter_id: "user1",
        assigned_approver_id: Some("approver2"),
    },
    SeedIdeaContract {
        id: "idea7",
        status: "under_review",
        category: "Process Improvement",
        submitter_id: "user2",
        assigned_approver_id: Some("approver5"),
    },
    SeedIdeaContract {
        id: "idea8",
        status: "submitted",
        category: "Revenue Generation",
        submitter_id: "user5",
        assigned_approver_id: None,
    },
    SeedIdeaContract {
        id: "idea9",
        status: "approved",
        category: "Risk Reduction",
        submitter_id: "user4",
        assigned_approver_id: Some("approver8"),
    },
    SeedIdeaContract {
        id: "idea10",
        status: "under_review",
        category: "Employee Experience",
        submitter_id: "user3",
        assigned_approver_id: Some("approver4"),
    },
    SeedIdeaContract {
        id: "idea11",
        status: "revision_requested",
        category: "Product Enhancement",
        submitter_id: "user1",
        assigned_approver_id: Some("approver6"),
    },
    SeedIdeaContract {
        id: "idea12",
        status: "submitted",
        category: "Process Improvement",
        submitter_id: "user1",
        assigned_approver_id: None,
    },
];

const SEED_ADMINISTRATOR_IDS: &[&str] = &["admin1"];

const SEED_APPROVER_IDS: &[&str] = &[
    "approver1",
    "approver2",
    "approver3",
    "approver4",
    "approver5",
    "approver6",
    "approver7",
    "approver8",
    "approver9",
    "approver10",
];

const SEED_SUBMITTER_IDS: &[&str] = &["user1", "user2", "user3", "user4", "user5"];

const SEED_COMMENTS: &[(&str, &str, &str)] = &[
    ("comment1", "idea1", "general"),
    ("comment2", "idea3", "revision_request"),
    ("comment3", "idea5", "rejection_reason"),
    ("comment4", "idea6", "general"),
    ("comment5", "idea9", "general"),
    ("comment6", "idea11", "revision_request"),
    ("comment7", "idea2", "general"),
    ("comment8", "idea7", "general"),
    ("comment9", "idea10", "general"),
];

/// Mock workflow dataset: one administrator, ten approvers, five submitters,
/// twelve ideas spread over every status, and nine comments.
pub struct MockDataset;

impl MockDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/mock_dataset.sql");

    /// Loads the dataset. Existing rows are left untouched, so loading twice is harmless.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::raw_sql(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            users_seeded: SEED_ADMINISTRATOR_IDS.len()
                + SEED_APPROVER_IDS.len()
                + SEED_SUBMITTER_IDS.len(),
            ideas_seeded: SEED_IDEAS.len(),
            comments_seeded: SEED_COMMENTS.len(),
        })
    }

    /// Checks that every seeded record exists with its contracted shape.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for (role, ids) in [
            ("administrator", SEED_ADMINISTRATOR_IDS),
            ("approver", SEED_APPROVER_IDS),
            ("submitter", SEED_SUBMITTER_IDS),
        ] {
            for id in ids {
                let exists: i64 = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM app_user WHERE id = ?1 AND role = ?2)",
                )
                .bind(id)
                .bind(role)
                .fetch_one(pool)
                .await?;
                checks.push(VerificationCheck::new(format!("user-{id}"), exists == 1));
            }
        }

        let approvers_without_scope: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM app_user
             WHERE role = 'approver' AND json_array_length(approval_categories_json) = 0",
        )
        .fetch_one(pool)
        .await?;
        checks.push(VerificationCheck::new("approvers-have-categories", approvers_without_scope == 0));

        for idea in SEED_IDEAS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM idea
                     WHERE id = ?1 AND category = ?2 AND submitter_id = ?3
                       AND assigned_approver_id IS ?4
                 )",
            )
            .bind(idea.id)
            .bind(idea.category)
            .bind(idea.submitter_id)
            .bind(idea.assigned_approver_id)
            .fetch_one(pool)
            .await?;
            checks.push(VerificationCheck::new(format!("idea-{}", idea.id), exists == 1));

            let submitted_event: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM audit_event WHERE idea_id = ?1 AND event_type = 'idea.submitted'
                 )",
            )
            .bind(idea.id)
            .fetch_one(pool)
            .await?;
            checks.push(VerificationCheck::new(
                format!("audit-{}-submitted", idea.id),
                submitted_event == 1,
            ));
        }

        for (id, idea_id, comment_type) in SEED_COMMENTS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM idea_comment WHERE id = ?1 AND idea_id = ?2 AND comment_type = ?3
                 )",
            )
            .bind(id)
            .bind(idea_id)
            .bind(comment_type)
            .fetch_one(pool)
            .await?;
            checks.push(VerificationCheck::new(format!("{id}-on-{idea_id}"), exists == 1));
        }

        let all_present = checks.iter().all(|check| check.passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Ideas whose stored status no longer matches the seeded status.
    ///
    /// Workflow actions move seeded ideas on; this reports that drift without
    /// treating it as a verification failure.
    pub async fn status_drift(pool: &DbPool) -> Result<Vec<StatusDrift>, RepositoryError> {
        let mut drift = Vec::new();
        for idea in SEED_IDEAS {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM idea WHERE id = ?1")
                    .bind(idea.id)
                    .fetch_optional(pool)
                    .await?;
            if let Some(current) = current.filter(|status| status != idea.status) {
                drift.push(StatusDrift {
                    idea_id: idea.id,
                    seeded: idea.status,
                    current,
                });
            }
        }
        Ok(drift)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub users_seeded: usize,
    pub ideas_seeded: usize,
    pub comments_seeded: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationCheck {
    pub name: String,
    pub passed: bool,
}

impl VerificationCheck {
    fn new(name: impl Into<String>, passed: bool) -> Self {
        Self { name: name.into(), passed }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<VerificationCheck>,
}

impl VerificationResult {
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks.iter().filter(|check| !check.passed).map(|check| check.name.as_str()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusDrift {
    pub idea_id: &'static str,
    pub seeded: &'static str,
    pub current: String,
}
