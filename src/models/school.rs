use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{STATE_CODE, validate_not_blank};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub division: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SchoolInput {
    #[validate(length(min = 1, max = 200, message = "School name is required"), custom(function = "validate_not_blank"))]
    pub name: String,
    pub division: Option<String>,
    pub city: Option<String>,
    #[validate(regex(path = *STATE_CODE, message = "State must be a two-letter code"))]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestType {
    #[default]
    Like,
    Follow,
    TopChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    PublicToVerifiedCoaches,
    PrivateUntilApproved,
    Private,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Interest {
    pub id: i64,
    pub athlete_user_id: i64,
    pub school_id: i64,
    pub interest_type: InterestType,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

/// An interest joined with the school it points at, as the athlete's list shows it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InterestWithSchool {
    pub id: i64,
    pub school_id: i64,
    pub interest_type: InterestType,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub school_name: String,
    pub school_division: Option<String>,
    pub school_city: Option<String>,
    pub school_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterestInput {
    pub school_id: i64,
    #[serde(default)]
    pub interest_type: InterestType,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterestUpdate {
    pub interest_type: Option<InterestType>,
    pub visibility: Option<Visibility>,
}

