use rocket::State;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{Role, SIGN_IN_ROUTE, User, end_session, start_session};
use crate::db::{authenticate_user, confirm_email, create_email_confirmation, create_user};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::validation::{ApiResult, JsonValidateExt, validate_signup_role};

const DEFAULT_CALLBACK_ROUTE: &str = "/dashboard";
const CONFIRMATION_FAILED_ROUTE: &str = "/auth/signin?error=confirmation_failed";

#[derive(Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(custom(function = "validate_signup_role"))]
    pub role: String,
}

#[derive(Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub redirect_to: &'static str,
}

#[derive(Serialize)]
pub struct SignOutResponse {
    pub redirect_to: &'static str,
}

#[post("/auth/signup", data = "<request>")]
pub async fn api_sign_up(
    request: Json<SignUpRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<AuthResponse>> {
    let request = request.validate_custom()?;
    let role = Role::from_str(&request.role).map_err(|e| AppError::Validation(e.to_string()))?;

    let user = create_user(db, &request.email, &request.password, role).await?;

    // Mail delivery is handled outside this service; the link is logged for the operator.
    let code = create_email_confirmation(db, user.id).await?;
    info!(
        user_id = %user.id,
        confirmation_link = %format!("{}/auth/callback?code={}", config.public_base_url, code),
        "Email confirmation issued"
    );

    start_session(db, cookies, &user, config.session_ttl()).await?;

    Ok(Json(AuthResponse {
        redirect_to: role.onboarding_route(),
        user,
    }))
}

#[post("/auth/signin", data = "<request>")]
pub async fn api_sign_in(
    request: Json<SignInRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<AuthResponse>> {
    let request = request.validate_custom()?;

    let user = authenticate_user(db, &request.email, &request.password).await?;
    start_session(db, cookies, &user, config.session_ttl()).await?;

    info!(user_id = %user.id, role = %user.role, "User signed in");

    Ok(Json(AuthResponse {
        redirect_to: user.role.default_route(),
        user,
    }))
}

#[post("/auth/signout")]
pub async fn api_sign_out(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Json<SignOutResponse> {
    end_session(db, cookies).await;
    Json(SignOutResponse {
        redirect_to: SIGN_IN_ROUTE,
    })
}

#[get("/auth/me")]
pub fn api_me(user: User) -> Json<User> {
    Json(user)
}

/// Only same-site absolute paths are followed after confirmation.
fn callback_target(next: Option<String>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or_else(|| DEFAULT_CALLBACK_ROUTE.to_string())
}

/// Link target of the confirmation email. Exchanges the code, signs the user in and
/// redirects; any failure lands on the sign-in page with an error flag.
#[get("/auth/callback?<code>&<next>")]
pub async fn auth_callback(
    code: Option<String>,
    next: Option<String>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> Redirect {
    let Some(code) = code.filter(|c| !c.is_empty()) else {
        warn!("Confirmation callback without a code");
        return Redirect::to(CONFIRMATION_FAILED_ROUTE);
    };

    let user = match confirm_email(db, &code).await {
        Ok(user) => user,
        Err(err) => {
            err.log_and_record("Email confirmation");
            return Redirect::to(CONFIRMATION_FAILED_ROUTE);
        }
    };

    if let Err(err) = start_session(db, cookies, &user, config.session_ttl()).await {
        err.log_and_record("Session after email confirmation");
        return Redirect::to(CONFIRMATION_FAILED_ROUTE);
    }

    info!(user_id = %user.id, "Email confirmed");
    Redirect::to(callback_target(next))
}
