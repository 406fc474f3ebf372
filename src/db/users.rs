use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::auth::{DbUser, DbUserSession, Role, User, UserSession};
use crate::error::AppError;

const CONFIRMATION_CODE_TTL_HOURS: i64 = 24;

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(
        "SELECT id, email, role, email_confirmed_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => User::try_from(user),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip_all, fields(email, role = %role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    info!("Creating new user");

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let email = email.trim().to_lowercase();

    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO users (email, password, role, created_at) VALUES (?, ?, ?, ?)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(&email)
    .bind(hashed_password)
    .bind(role.as_str())
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    match id {
        Some(id) => get_user(pool, id).await,
        None => Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        )),
    }
}

#[instrument(skip_all, fields(email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    info!("Authenticating user");

    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;

    let invalid = || AppError::Authentication("Invalid email or password".to_string());

    let Some((id, hash)) = row else {
        return Err(invalid());
    };

    match bcrypt::verify(password, &hash) {
        Ok(true) => get_user(pool, id).await,
        Ok(false) => Err(invalid()),
        Err(err) => {
            warn!(user_id = %id, error = %err, "Stored password hash could not be verified");
            Err(invalid())
        }
    }
}

/// Issues a one-time code that `confirm_email` exchanges for a confirmed address.
#[instrument(skip(pool))]
pub async fn create_email_confirmation(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<String, AppError> {
    info!("Creating email confirmation code");

    let code = uuid::Uuid::new_v4().simple().to_string();

    sqlx::query("INSERT INTO email_confirmations (user_id, code, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(&code)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(code)
}

#[instrument(skip_all)]
pub async fn confirm_email(pool: &Pool<Sqlite>, code: &str) -> Result<User, AppError> {
    info!("Exchanging email confirmation code");

    let now = Utc::now();
    let cutoff = now - Duration::hours(CONFIRMATION_CODE_TTL_HOURS);

    let mut tx = pool.begin().await?;

    let user_id: Option<i64> = sqlx::query_scalar(
        "UPDATE email_confirmations SET consumed_at = ?
         WHERE code = ? AND consumed_at IS NULL AND created_at > ?
         RETURNING user_id",
    )
    .bind(now)
    .bind(code)
    .bind(cutoff)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        return Err(AppError::Authentication(
            "Invalid or expired confirmation code".to_string(),
        ));
    };

    sqlx::query(
        "UPDATE users SET email_confirmed_at = COALESCE(email_confirmed_at, ?) WHERE id = ?",
    )
    .bind(now)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_user(pool, user_id).await
}

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query(
        "INSERT INTO user_sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(token)
    .bind(Utc::now())
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
