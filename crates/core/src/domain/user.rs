use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Submitter,
    Approver,
    Administrator,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitter => "submitter",
            Self::Approver => "approver",
            Self::Administrator => "administrator",
        }
    }

    pub fn can_review(self) -> bool {
        matches!(self, Self::Approver | Self::Administrator)
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "submitter" => Ok(Self::Submitter),
            "approver" => Ok(Self::Approver),
            "administrator" => Ok(Self::Administrator),
            other => Err(DomainError::UnknownValue { kind: "user role", value: other.to_owned() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub department: String,
    #[serde(default)]
    pub approval_categories: Vec<String>,
    pub is_active: bool,
}

impl User {
    pub fn can_review(&self) -> bool {
        self.is_active && self.role.can_review()
    }

    pub fn covers_category(&self, category: &str) -> bool {
        self.approval_categories.iter().any(|candidate| candidate.eq_ignore_ascii_case(category))
    }
}
