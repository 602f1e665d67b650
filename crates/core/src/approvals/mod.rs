use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::idea::{Idea, IdeaStatus};
use crate::domain::user::{User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthorizationFailure {
    InactiveUser { user_id: String },
    InsufficientRole { user_id: String, role: String },
    CategoryNotAllowed { user_id: String, category: String },
}

impl AuthorizationFailure {
    pub fn reason(&self) -> String {
        match self {
            Self::InactiveUser { user_id } => format!("user `{user_id}` is not active"),
            Self::InsufficientRole { user_id, role } => {
                format!("user `{user_id}` with role `{role}` cannot review ideas")
            }
            Self::CategoryNotAllowed { user_id, category } => {
                format!("approver `{user_id}` does not review category `{category}`")
            }
        }
    }
}

impl fmt::Display for AuthorizationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    pub allowed: bool,
    pub reason: String,
    pub failure: Option<AuthorizationFailure>,
}

impl AuthorizationResult {
    fn allow(reason: impl Into<String>) -> Self {
        Self { allowed: true, reason: reason.into(), failure: None }
    }

    fn deny(failure: AuthorizationFailure) -> Self {
        Self { allowed: false, reason: failure.reason(), failure: Some(failure) }
    }

    pub fn into_result(self) -> Result<(), AuthorizationFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// Decides whether a user may act on an idea's status.
#[derive(Clone, Debug, Default)]
pub struct ApprovalAuthority {
    enforce_category_scope: bool,
}

impl ApprovalAuthority {
    pub fn new(enforce_category_scope: bool) -> Self {
        Self { enforce_category_scope }
    }

    pub fn enforces_category_scope(&self) -> bool {
        self.enforce_category_scope
    }

    /// Checks role and activity only; used where no specific idea is involved.
    pub fn authorize_reviewer(&self, actor: &User) -> AuthorizationResult {
        if !actor.is_active {
            return AuthorizationResult::deny(AuthorizationFailure::InactiveUser {
                user_id: actor.id.0.clone(),
            });
        }

        if !actor.role.can_review() {
            return AuthorizationResult::deny(AuthorizationFailure::InsufficientRole {
                user_id: actor.id.0.clone(),
                role: actor.role.as_str().to_owned(),
            });
        }

        AuthorizationResult::allow(format!(
            "user `{}` may review as `{}`",
            actor.id,
            actor.role.as_str()
        ))
    }

    pub fn authorize(&self, actor: &User, idea: &Idea) -> AuthorizationResult {
        let reviewer = self.authorize_reviewer(actor);
        if !reviewer.allowed {
            return reviewer;
        }

        let scoped = self.enforce_category_scope && actor.role == UserRole::Approver;
        if scoped && !actor.covers_category(&idea.category) {
            return AuthorizationResult::deny(AuthorizationFailure::CategoryNotAllowed {
                user_id: actor.id.0.clone(),
                category: idea.category.clone(),
            });
        }

        AuthorizationResult::allow(format!(
            "user `{}` may review idea `{}` in `{}`",
            actor.id, idea.id, idea.category
        ))
    }
}

/// Active approvers that review the given category.
pub fn approvers_for_category<'a>(users: &'a [User], category: &str) -> Vec<&'a User> {
    users
        .iter()
        .filter(|user| {
            user.role == UserRole::Approver && user.is_active && user.covers_category(category)
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<IdeaStatus>,
}

impl QueueFilter {
    fn matches(&self, idea: &Idea) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|term| !term.is_empty()) {
            let term = term.to_lowercase();
            let hit = idea.title.to_lowercase().contains(&term)
                || idea.description.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }

        if let Some(category) =
            self.category.as_deref().map(str::trim).filter(|category| !category.is_empty())
        {
            if idea.category != category {
                return false;
            }
        }

        if let Some(status) = self.status {
            if idea.status != status {
                return false;
            }
        }

        true
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalQueue {
    pub pending: Vec<Idea>,
    pub approved: Vec<Idea>,
    pub rejected: Vec<Idea>,
    pub revision_requested: Vec<Idea>,
    /// Categories present in the reviewer's visible ideas, before filtering.
    pub categories: Vec<String>,
}

impl ApprovalQueue {
    /// Builds the reviewer's queue. Approvers only see ideas in their categories.
    pub fn build(
        reviewer: &User,
        ideas: &[Idea],
        filter: &QueueFilter,
    ) -> Result<Self, AuthorizationFailure> {
        ApprovalAuthority::default().authorize_reviewer(reviewer).into_result()?;

        let visible: Vec<&Idea> = ideas
            .iter()
            .filter(|idea| {
                reviewer.role == UserRole::Administrator || reviewer.covers_category(&idea.category)
            })
            .collect();

        let mut categories: Vec<String> = Vec::new();
        for idea in &visible {
            if !categories.contains(&idea.category) {
                categories.push(idea.category.clone());
            }
        }

        let mut queue = Self { categories, ..Self::default() };
        for idea in visible.into_iter().filter(|idea| filter.matches(idea)) {
            let bucket = match idea.status {
                IdeaStatus::Submitted | IdeaStatus::UnderReview => &mut queue.pending,
                IdeaStatus::Approved => &mut queue.approved,
                IdeaStatus::Rejected => &mut queue.rejected,
                IdeaStatus::RevisionRequested => &mut queue.revision_requested,
            };
            bucket.push(idea.clone());
        }

        Ok(queue)
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.approved.len() + self.rejected.len() + self.revision_requested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
