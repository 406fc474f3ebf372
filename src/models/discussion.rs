use chrono::{DateTime, Utc};
use rocket::FromFormField;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_not_blank;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Thread {
    pub id: i64,
    pub created_by: i64,
    pub author_role: String,
    pub title: String,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub thread_id: i64,
    pub created_by: i64,
    pub author_role: String,
    pub body: String,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ThreadInput {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostInput {
    #[validate(
        length(min = 1, max = 5000, message = "Post must be between 1 and 5000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ReportTarget {
    Post,
    Thread,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, FromFormField,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Resolved,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Report {
    pub id: i64,
    pub reporter_id: i64,
    pub target_type: ReportTarget,
    pub target_id: i64,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportInput {
    pub target_type: ReportTarget,
    pub target_id: i64,
    #[validate(
        length(min = 1, max = 500, message = "Reason must be between 1 and 500 characters"),
        custom(function = "validate_not_blank")
    )]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportResolution {
    Resolve,
    Dismiss,
}

impl From<ReportResolution> for ReportStatus {
    fn from(resolution: ReportResolution) -> Self {
        match resolution {
            ReportResolution::Resolve => ReportStatus::Resolved,
            ReportResolution::Dismiss => ReportStatus::Dismissed,
        }
    }
}
