use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::Role;
use crate::validation::validate_message_body;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ContactRequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContactRequest {
    pub id: i64,
    pub coach_user_id: i64,
    pub athlete_user_id: i64,
    pub message: Option<String>,
    pub status: ContactRequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// A contact request as the athlete sees it, with the coach's school and title.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContactRequestView {
    pub id: i64,
    pub coach_user_id: i64,
    pub athlete_user_id: i64,
    pub message: Option<String>,
    pub status: ContactRequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub coach_school: Option<String>,
    pub coach_title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequestInput {
    pub athlete_user_id: i64,
    #[validate(length(max = 500, message = "Message must be less than 500 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactResponse {
    Accept,
    Decline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ConversationStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: i64,
    pub athlete_user_id: i64,
    pub coach_user_id: i64,
    pub status: ConversationStatus,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.athlete_user_id == user_id || self.coach_user_id == user_id
    }

    pub fn counterpart_of(&self, user_id: i64) -> i64 {
        if self.athlete_user_id == user_id {
            self.coach_user_id
        } else {
            self.athlete_user_id
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbConversationSummary {
    pub id: i64,
    pub athlete_user_id: i64,
    pub coach_user_id: i64,
    pub status: ConversationStatus,
    pub last_message_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub athlete_first_name: Option<String>,
    pub athlete_last_name: Option<String>,
    pub coach_school: Option<String>,
    pub coach_title: Option<String>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub athlete_user_id: i64,
    pub coach_user_id: i64,
    pub status: ConversationStatus,
    pub last_message_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub counterpart_label: String,
    pub unread_count: i64,
}

impl ConversationSummary {
    pub fn from_db(db: DbConversationSummary, viewer_role: Role) -> Self {
        let counterpart_label = match viewer_role {
            Role::Athlete => format!(
                "{} - {}",
                db.coach_school.as_deref().unwrap_or("Unknown school"),
                db.coach_title.as_deref().unwrap_or("Coach")
            ),
            _ => {
                let name = format!(
                    "{} {}",
                    db.athlete_first_name.as_deref().unwrap_or_default(),
                    db.athlete_last_name.as_deref().unwrap_or_default()
                );
                let name = name.trim();
                if name.is_empty() {
                    "Athlete".to_string()
                } else {
                    name.to_string()
                }
            }
        };

        Self {
            id: db.id,
            athlete_user_id: db.athlete_user_id,
            coach_user_id: db.coach_user_id,
            status: db.status,
            last_message_at: db.last_message_at,
            updated_at: db.updated_at,
            counterpart_label,
            unread_count: db.unread_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum SenderRole {
    Athlete,
    Coach,
}

impl TryFrom<Role> for SenderRole {
    type Error = crate::error::AppError;

    fn try_from(role: Role) -> Result<Self, Self::Error> {
        match role {
            Role::Athlete => Ok(SenderRole::Athlete),
            Role::Coach => Ok(SenderRole::Coach),
            Role::Admin => Err(crate::error::AppError::Authorization(
                "Admins do not take part in conversations".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_user_id: i64,
    pub sender_role: SenderRole,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageInput {
    #[validate(custom(function = "validate_message_body"))]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartConversationInput {
    pub athlete_user_id: i64,
}
