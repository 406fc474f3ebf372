use chrono::Utc;
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, type, title, body, related_id, created_at, read_at";

/// Inserts on an open connection so callers can fold it into their own transaction.
#[instrument(skip(conn, notification), fields(user_id = notification.user_id, kind = ?notification.notification_type))]
pub async fn insert_notification(
    conn: &mut SqliteConnection,
    notification: &NewNotification,
) -> Result<i64, AppError> {
    info!("Creating notification");

    let res = sqlx::query(
        "INSERT INTO notifications (user_id, type, title, body, related_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(notification.user_id)
    .bind(notification.notification_type)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(notification.related_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, notification))]
pub async fn create_notification(
    pool: &Pool<Sqlite>,
    notification: &NewNotification,
) -> Result<i64, AppError> {
    let mut conn = pool.acquire().await?;
    insert_notification(&mut conn, notification).await
}

#[instrument(skip(pool))]
pub async fn list_notifications(
    pool: &Pool<Sqlite>,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Notification>, AppError> {
    info!("Listing notifications");

    let notifications = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {} FROM notifications WHERE user_id = ?
         ORDER BY created_at DESC, id DESC LIMIT ?",
        NOTIFICATION_COLUMNS
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

#[instrument(skip(pool))]
pub async fn unread_notification_count(pool: &Pool<Sqlite>, user_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Marks one notification read. An already-read notification keeps its first `read_at`.
#[instrument(skip(pool))]
pub async fn mark_notification_read(
    pool: &Pool<Sqlite>,
    user_id: i64,
    notification_id: i64,
) -> Result<Notification, AppError> {
    info!("Marking notification read");

    let notification = sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET read_at = COALESCE(read_at, ?)
         WHERE id = ? AND user_id = ?
         RETURNING {}",
        NOTIFICATION_COLUMNS
    ))
    .bind(Utc::now())
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    notification.ok_or_else(|| {
        AppError::NotFound(format!("Notification {} not found", notification_id))
    })
}

#[instrument(skip(pool))]
pub async fn mark_all_notifications_read(pool: &Pool<Sqlite>, user_id: i64) -> Result<u64, AppError> {
    info!("Marking all notifications read");

    let result =
        sqlx::query("UPDATE notifications SET read_at = ? WHERE user_id = ? AND read_at IS NULL")
            .bind(Utc::now())
            .bind(user_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}
