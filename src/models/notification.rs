use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Message,
    ContactRequest,
    ContactAccepted,
    CoachVerified,
}

impl NotificationType {
    /// The client route a click on this notification should open.
    pub fn link(&self, related_id: Option<i64>) -> String {
        match (self, related_id) {
            (NotificationType::Message, Some(id)) => format!("/messages?conversation={}", id),
            (NotificationType::ContactAccepted, Some(id)) => {
                format!("/messages?conversation={}", id)
            }
            (NotificationType::Message | NotificationType::ContactAccepted, None) => {
                "/messages".to_string()
            }
            (NotificationType::ContactRequest, _) => "/dashboard".to_string(),
            (NotificationType::CoachVerified, _) => "/search".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub related_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub link: String,
}

impl From<Notification> for NotificationView {
    fn from(notification: Notification) -> Self {
        let link = notification
            .notification_type
            .link(notification.related_id);
        Self { notification, link }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub related_id: Option<i64>,
}

impl NewNotification {
    pub fn new_message(recipient_id: i64, conversation_id: i64) -> Self {
        Self {
            user_id: recipient_id,
            notification_type: NotificationType::Message,
            title: "New message".to_string(),
            body: Some("You have a new message".to_string()),
            related_id: Some(conversation_id),
        }
    }

    pub fn contact_request(athlete_id: i64, request_id: i64, coach_label: &str) -> Self {
        Self {
            user_id: athlete_id,
            notification_type: NotificationType::ContactRequest,
            title: "New contact request".to_string(),
            body: Some(format!("{} would like to connect", coach_label)),
            related_id: Some(request_id),
        }
    }

    pub fn contact_accepted(coach_id: i64, conversation_id: i64) -> Self {
        Self {
            user_id: coach_id,
            notification_type: NotificationType::ContactAccepted,
            title: "Contact request accepted".to_string(),
            body: Some("An athlete accepted your contact request".to_string()),
            related_id: Some(conversation_id),
        }
    }

    pub fn coach_verified(coach_id: i64) -> Self {
        Self {
            user_id: coach_id,
            notification_type: NotificationType::CoachVerified,
            title: "You're verified".to_string(),
            body: Some("Your coach profile has been verified. Search is now open.".to_string()),
            related_id: None,
        }
    }
}
