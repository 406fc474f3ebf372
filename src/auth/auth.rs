use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, SameSite};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::db::{create_user_session, invalidate_session};
use crate::error::AppError;

use super::{User, UserSession};

pub const SESSION_COOKIE: &str = "session_token";
pub const ROLE_COOKIE: &str = "user_role";

/// Creates a session row for the user and hands its token to the client in a private cookie.
#[instrument(skip(pool, cookies, user), fields(user_id = user.id))]
pub async fn start_session(
    pool: &Pool<Sqlite>,
    cookies: &CookieJar<'_>,
    user: &User,
    ttl: Duration,
) -> Result<(), AppError> {
    let token = UserSession::generate_token();
    let expires_at = Utc::now() + ttl;

    create_user_session(pool, user.id, &token, expires_at).await?;

    let max_age = rocket::time::Duration::seconds(ttl.num_seconds());

    cookies.add_private(
        Cookie::build((SESSION_COOKIE, token))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(max_age),
    );
    cookies.add_private(
        Cookie::build((ROLE_COOKIE, user.role.to_string()))
            .same_site(SameSite::Lax)
            .max_age(max_age),
    );

    info!(expires_at = %expires_at, "Session started");
    Ok(())
}

#[instrument(skip_all)]
pub async fn end_session(pool: &Pool<Sqlite>, cookies: &CookieJar<'_>) {
    let token = cookies
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        if let Err(err) = invalidate_session(pool, &token).await {
            warn!(error = %err, "Failed to invalidate session, clearing cookies anyway");
        }
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));
    cookies.remove_private(Cookie::build(ROLE_COOKIE));
    info!("Session ended");
}
