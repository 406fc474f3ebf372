use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Post, Report, ReportInput, ReportStatus, ReportTarget, Thread};

const THREAD_SELECT: &str = "SELECT t.id, t.created_by, u.role AS author_role, t.title,
        t.is_hidden, t.created_at
     FROM discussion_threads t
     JOIN users u ON u.id = t.created_by";

const POST_SELECT: &str = "SELECT p.id, p.thread_id, p.created_by, u.role AS author_role,
        p.body, p.is_hidden, p.created_at
     FROM discussion_posts p
     JOIN users u ON u.id = p.created_by";

const REPORT_COLUMNS: &str =
    "id, reporter_id, target_type, target_id, reason, status, created_at, resolved_at";

#[instrument(skip(pool))]
pub async fn list_threads(
    pool: &Pool<Sqlite>,
    include_hidden: bool,
    limit: i64,
) -> Result<Vec<Thread>, AppError> {
    info!("Listing discussion threads");

    let threads = sqlx::query_as::<_, Thread>(&format!(
        "{} WHERE (? OR t.is_hidden = FALSE) ORDER BY t.created_at DESC, t.id DESC LIMIT ?",
        THREAD_SELECT
    ))
    .bind(include_hidden)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(threads)
}

#[instrument(skip(pool))]
pub async fn get_thread(
    pool: &Pool<Sqlite>,
    thread_id: i64,
    include_hidden: bool,
) -> Result<Thread, AppError> {
    let thread = sqlx::query_as::<_, Thread>(&format!(
        "{} WHERE t.id = ? AND (? OR t.is_hidden = FALSE)",
        THREAD_SELECT
    ))
    .bind(thread_id)
    .bind(include_hidden)
    .fetch_optional(pool)
    .await?;

    thread.ok_or_else(|| AppError::NotFound(format!("Thread {} not found", thread_id)))
}

#[instrument(skip(pool, title))]
pub async fn create_thread(
    pool: &Pool<Sqlite>,
    user_id: i64,
    title: &str,
) -> Result<Thread, AppError> {
    info!("Creating discussion thread");

    let id = sqlx::query(
        "INSERT INTO discussion_threads (created_by, title, is_hidden, created_at)
         VALUES (?, ?, FALSE, ?)",
    )
    .bind(user_id)
    .bind(title.trim())
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_thread(pool, id, false).await
}

#[instrument(skip(pool))]
pub async fn list_posts(
    pool: &Pool<Sqlite>,
    thread_id: i64,
    include_hidden: bool,
) -> Result<Vec<Post>, AppError> {
    info!("Listing discussion posts");

    let posts = sqlx::query_as::<_, Post>(&format!(
        "{} WHERE p.thread_id = ? AND (? OR p.is_hidden = FALSE) ORDER BY p.created_at, p.id",
        POST_SELECT
    ))
    .bind(thread_id)
    .bind(include_hidden)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

#[instrument(skip(pool, body))]
pub async fn create_post(
    pool: &Pool<Sqlite>,
    thread_id: i64,
    user_id: i64,
    body: &str,
) -> Result<Post, AppError> {
    info!("Creating discussion post");

    get_thread(pool, thread_id, false).await?;

    let id = sqlx::query(
        "INSERT INTO discussion_posts (thread_id, created_by, body, is_hidden, created_at)
         VALUES (?, ?, ?, FALSE, ?)",
    )
    .bind(thread_id)
    .bind(user_id)
    .bind(body.trim())
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = ?", POST_SELECT))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(post)
}

#[instrument(skip(pool))]
pub async fn set_thread_hidden(
    pool: &Pool<Sqlite>,
    thread_id: i64,
    hidden: bool,
) -> Result<(), AppError> {
    info!("Changing thread visibility");

    let result = sqlx::query("UPDATE discussion_threads SET is_hidden = ? WHERE id = ?")
        .bind(hidden)
        .bind(thread_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Thread {} not found", thread_id)));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn set_post_hidden(pool: &Pool<Sqlite>, post_id: i64, hidden: bool) -> Result<(), AppError> {
    info!("Changing post visibility");

    let result = sqlx::query("UPDATE discussion_posts SET is_hidden = ? WHERE id = ?")
        .bind(hidden)
        .bind(post_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Post {} not found", post_id)));
    }
    Ok(())
}

#[instrument(skip(pool, input), fields(target_type = ?input.target_type, target_id = input.target_id))]
pub async fn create_report(
    pool: &Pool<Sqlite>,
    reporter_id: i64,
    input: &ReportInput,
) -> Result<Report, AppError> {
    info!("Filing report");

    let target_sql = match input.target_type {
        ReportTarget::Thread => "SELECT id FROM discussion_threads WHERE id = ?",
        ReportTarget::Post => "SELECT id FROM discussion_posts WHERE id = ?",
    };
    let target: Option<i64> = sqlx::query_scalar(target_sql)
        .bind(input.target_id)
        .fetch_optional(pool)
        .await?;
    if target.is_none() {
        return Err(AppError::NotFound(format!(
            "Reported {:?} {} does not exist",
            input.target_type, input.target_id
        )));
    }

    let report = sqlx::query_as::<_, Report>(&format!(
        "INSERT INTO reports (reporter_id, target_type, target_id, reason, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {}",
        REPORT_COLUMNS
    ))
    .bind(reporter_id)
    .bind(input.target_type)
    .bind(input.target_id)
    .bind(input.reason.trim())
    .bind(ReportStatus::Pending)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(report)
}

#[instrument(skip(pool))]
pub async fn list_reports(
    pool: &Pool<Sqlite>,
    status: ReportStatus,
) -> Result<Vec<Report>, AppError> {
    info!("Listing reports");

    let reports = sqlx::query_as::<_, Report>(&format!(
        "SELECT {} FROM reports WHERE status = ? ORDER BY created_at, id",
        REPORT_COLUMNS
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(reports)
}

#[instrument(skip(pool))]
pub async fn resolve_report(
    pool: &Pool<Sqlite>,
    report_id: i64,
    status: ReportStatus,
) -> Result<Report, AppError> {
    info!("Resolving report");

    if status == ReportStatus::Pending {
        return Err(AppError::Validation(
            "A report can only be resolved or dismissed".to_string(),
        ));
    }

    let report = sqlx::query_as::<_, Report>(&format!(
        "UPDATE reports SET status = ?, resolved_at = ? WHERE id = ? RETURNING {}",
        REPORT_COLUMNS
    ))
    .bind(status)
    .bind(Utc::now())
    .bind(report_id)
    .fetch_optional(pool)
    .await?;

    report.ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))
}
