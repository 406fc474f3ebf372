use chrono::Utc;
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

use crate::auth::User;
use crate::db::insert_notification;
use crate::error::AppError;
use crate::models::{
    ContactRequest, ContactRequestStatus, ContactRequestView, ContactResponse, Conversation,
    ConversationStatus, ConversationSummary, DbConversationSummary, Message, NewNotification,
    SenderRole,
};

const CONTACT_REQUEST_COLUMNS: &str =
    "id, coach_user_id, athlete_user_id, message, status, created_at, responded_at";

const CONVERSATION_COLUMNS: &str =
    "id, athlete_user_id, coach_user_id, status, last_message_at, created_at, updated_at";

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_user_id, sender_role, body, created_at, read_at";

#[instrument(skip(pool, message, coach_label))]
pub async fn create_contact_request(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    athlete_user_id: i64,
    message: Option<&str>,
    coach_label: &str,
) -> Result<ContactRequest, AppError> {
    info!("Creating contact request");

    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, ContactRequest>(&format!(
        "INSERT INTO contact_requests (coach_user_id, athlete_user_id, message, status, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {}",
        CONTACT_REQUEST_COLUMNS
    ))
    .bind(coach_user_id)
    .bind(athlete_user_id)
    .bind(message.map(str::trim).filter(|m| !m.is_empty()))
    .bind(ContactRequestStatus::Pending)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    insert_notification(
        &mut tx,
        &NewNotification::contact_request(athlete_user_id, request.id, coach_label),
    )
    .await?;

    tx.commit().await?;

    Ok(request)
}

#[instrument(skip(pool))]
pub async fn list_contact_requests_for_athlete(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
) -> Result<Vec<ContactRequestView>, AppError> {
    info!("Listing contact requests for athlete");

    let requests = sqlx::query_as::<_, ContactRequestView>(
        "SELECT cr.id, cr.coach_user_id, cr.athlete_user_id, cr.message, cr.status,
            cr.created_at, cr.responded_at,
            cp.school AS coach_school, cp.title AS coach_title
         FROM contact_requests cr
         LEFT JOIN coach_profiles cp ON cp.user_id = cr.coach_user_id
         WHERE cr.athlete_user_id = ?
         ORDER BY cr.created_at DESC, cr.id DESC",
    )
    .bind(athlete_user_id)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

#[instrument(skip(pool))]
pub async fn list_contact_requests_for_coach(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
) -> Result<Vec<ContactRequest>, AppError> {
    info!("Listing contact requests sent by coach");

    let requests = sqlx::query_as::<_, ContactRequest>(&format!(
        "SELECT {} FROM contact_requests WHERE coach_user_id = ?
         ORDER BY created_at DESC, id DESC",
        CONTACT_REQUEST_COLUMNS
    ))
    .bind(coach_user_id)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

#[instrument(skip(pool))]
pub async fn count_pending_contact_requests(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM contact_requests WHERE athlete_user_id = ? AND status = 'pending'",
    )
    .bind(athlete_user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Records the athlete's answer. Accepting opens the conversation with the coach and
/// notifies them; everything happens in one transaction.
#[instrument(skip(pool))]
pub async fn respond_to_contact_request(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    request_id: i64,
    response: ContactResponse,
) -> Result<(ContactRequest, Option<Conversation>), AppError> {
    info!("Responding to contact request");

    let status = match response {
        ContactResponse::Accept => ContactRequestStatus::Accepted,
        ContactResponse::Decline => ContactRequestStatus::Declined,
    };

    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, ContactRequest>(&format!(
        "UPDATE contact_requests SET status = ?, responded_at = ?
         WHERE id = ? AND athlete_user_id = ? AND status = 'pending'
         RETURNING {}",
        CONTACT_REQUEST_COLUMNS
    ))
    .bind(status)
    .bind(Utc::now())
    .bind(request_id)
    .bind(athlete_user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(request) = request else {
        let exists: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM contact_requests WHERE id = ? AND athlete_user_id = ?",
        )
        .bind(request_id)
        .bind(athlete_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        return Err(match exists {
            Some(_) => AppError::Conflict("This request has already been answered".to_string()),
            None => AppError::NotFound(format!("Contact request {} not found", request_id)),
        });
    };

    let conversation = match status {
        ContactRequestStatus::Accepted => {
            let conversation =
                get_or_create_conversation(&mut tx, athlete_user_id, request.coach_user_id)
                    .await?;
            insert_notification(
                &mut tx,
                &NewNotification::contact_accepted(request.coach_user_id, conversation.id),
            )
            .await?;
            Some(conversation)
        }
        _ => None,
    };

    tx.commit().await?;

    Ok((request, conversation))
}

/// One conversation per (athlete, coach) pair. The UNIQUE constraint decides races;
/// an existing closed conversation is reopened.
#[instrument(skip(conn))]
pub async fn get_or_create_conversation(
    conn: &mut SqliteConnection,
    athlete_user_id: i64,
    coach_user_id: i64,
) -> Result<Conversation, AppError> {
    info!("Opening conversation");

    let now = Utc::now();

    sqlx::query(
        "INSERT INTO conversations (athlete_user_id, coach_user_id, status, created_at, updated_at)
         VALUES (?, ?, 'OPEN', ?, ?)
         ON CONFLICT (athlete_user_id, coach_user_id) DO UPDATE SET status = 'OPEN'",
    )
    .bind(athlete_user_id)
    .bind(coach_user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let conversation = sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {} FROM conversations WHERE athlete_user_id = ? AND coach_user_id = ?",
        CONVERSATION_COLUMNS
    ))
    .bind(athlete_user_id)
    .bind(coach_user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(conversation)
}

#[instrument(skip(pool))]
pub async fn start_conversation(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    coach_user_id: i64,
) -> Result<Conversation, AppError> {
    let mut conn = pool.acquire().await?;
    get_or_create_conversation(&mut conn, athlete_user_id, coach_user_id).await
}

#[instrument(skip(pool))]
pub async fn get_conversation(pool: &Pool<Sqlite>, id: i64) -> Result<Conversation, AppError> {
    info!("Fetching conversation");

    let conversation = sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {} FROM conversations WHERE id = ?",
        CONVERSATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    conversation.ok_or_else(|| AppError::NotFound(format!("Conversation {} not found", id)))
}

/// Open conversations for the user, most recently active first.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_conversations(
    pool: &Pool<Sqlite>,
    user: &User,
) -> Result<Vec<ConversationSummary>, AppError> {
    info!("Listing conversations");

    let rows = sqlx::query_as::<_, DbConversationSummary>(
        "SELECT c.id, c.athlete_user_id, c.coach_user_id, c.status, c.last_message_at,
            c.updated_at,
            ap.first_name AS athlete_first_name, ap.last_name AS athlete_last_name,
            cp.school AS coach_school, cp.title AS coach_title,
            (SELECT COUNT(*) FROM messages m
             WHERE m.conversation_id = c.id AND m.sender_user_id != ? AND m.read_at IS NULL
            ) AS unread_count
         FROM conversations c
         LEFT JOIN athlete_profiles ap ON ap.user_id = c.athlete_user_id
         LEFT JOIN coach_profiles cp ON cp.user_id = c.coach_user_id
         WHERE (c.athlete_user_id = ? OR c.coach_user_id = ?) AND c.status = 'OPEN'
         ORDER BY c.updated_at DESC, c.id DESC",
    )
    .bind(user.id)
    .bind(user.id)
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ConversationSummary::from_db(row, user.role))
        .collect())
}

#[instrument(skip(pool))]
pub async fn list_messages(
    pool: &Pool<Sqlite>,
    conversation_id: i64,
) -> Result<Vec<Message>, AppError> {
    info!("Listing messages");

    let messages = sqlx::query_as::<_, Message>(&format!(
        "SELECT {} FROM messages WHERE conversation_id = ? ORDER BY created_at, id",
        MESSAGE_COLUMNS
    ))
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Marks everything the other participant sent as read by the viewer.
#[instrument(skip(pool))]
pub async fn mark_messages_read(
    pool: &Pool<Sqlite>,
    conversation_id: i64,
    viewer_user_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE messages SET read_at = ?
         WHERE conversation_id = ? AND sender_user_id != ? AND read_at IS NULL",
    )
    .bind(Utc::now())
    .bind(conversation_id)
    .bind(viewer_user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!(marked = result.rows_affected(), "Messages marked read");
    }

    Ok(result.rows_affected())
}

/// Appends a message, bumps the conversation so it sorts first and notifies the recipient.
#[instrument(skip(pool, conversation, sender, body), fields(conversation_id = conversation.id, sender_id = sender.id))]
pub async fn send_message(
    pool: &Pool<Sqlite>,
    conversation: &Conversation,
    sender: &User,
    body: &str,
) -> Result<Message, AppError> {
    info!("Sending message");

    if !conversation.has_participant(sender.id) {
        warn!("Sender is not part of the conversation");
        return Err(AppError::Authorization(
            "You are not part of this conversation".to_string(),
        ));
    }
    if conversation.status == ConversationStatus::Closed {
        return Err(AppError::Conflict("This conversation is closed".to_string()));
    }

    let sender_role = SenderRole::try_from(sender.role)?;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let message = sqlx::query_as::<_, Message>(&format!(
        "INSERT INTO messages (conversation_id, sender_user_id, sender_role, body, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {}",
        MESSAGE_COLUMNS
    ))
    .bind(conversation.id)
    .bind(sender.id)
    .bind(sender_role)
    .bind(body.trim())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE conversations SET updated_at = ?, last_message_at = ? WHERE id = ?")
        .bind(now)
        .bind(now)
        .bind(conversation.id)
        .execute(&mut *tx)
        .await?;

    insert_notification(
        &mut tx,
        &NewNotification::new_message(conversation.counterpart_of(sender.id), conversation.id),
    )
    .await?;

    tx.commit().await?;

    Ok(message)
}

#[instrument(skip(pool))]
pub async fn close_conversation(pool: &Pool<Sqlite>, conversation_id: i64) -> Result<(), AppError> {
    info!("Closing conversation");

    sqlx::query("UPDATE conversations SET status = 'CLOSED', updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(conversation_id)
        .execute(pool)
        .await?;

    Ok(())
}
