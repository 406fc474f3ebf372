use rocket::Request;
use rocket::http::Status;
use rocket::outcome::try_outcome;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{Instrument, error, info, warn};

use crate::db::{get_coach_profile, get_session_by_token, get_user};
use crate::error::AppError;
use crate::models::CoachProfile;
use crate::validation::{ToValidationResponse, ValidationResponse};

use super::{Role, SESSION_COOKIE, User};

pub const SIGN_IN_ROUTE: &str = "/auth/signin";

/// Where the client should send a user a guard turned away.
#[derive(Debug, Default, Clone)]
struct AccessDenial {
    redirect_to: Option<&'static str>,
}

fn deny<T>(request: &Request<'_>, redirect_to: &'static str) -> Outcome<T, ()> {
    request.local_cache(|| AccessDenial {
        redirect_to: Some(redirect_to),
    });
    Outcome::Error((Status::Forbidden, ()))
}

struct CachedUser(Result<User, Status>);

async fn resolve_user(request: &Request<'_>) -> Result<User, Status> {
    let token = request
        .cookies()
        .get_private(SESSION_COOKIE)
        .map(|c| c.value().to_string());

    let Some(token) = token else {
        return Err(Status::Unauthorized);
    };

    let Some(db) = request.rocket().state::<SqlitePool>() else {
        error!("Database pool not found in managed state");
        return Err(Status::ServiceUnavailable);
    };

    let session = match get_session_by_token(db, &token).await {
        Ok(session) => session,
        Err(AppError::Authentication(_)) => {
            warn!("Unknown session token");
            return Err(Status::Unauthorized);
        }
        Err(err) => return Err(err.to_status_with_log("Session lookup")),
    };

    if !session.is_valid() {
        warn!(session_id = %session.id, "Session token expired");
        return Err(Status::Unauthorized);
    }

    match get_user(db, session.user_id).await {
        Ok(user) => {
            info!(user_id = %user.id, role = %user.role, "User authenticated via session token");
            Ok(user)
        }
        Err(err) => {
            error!(user_id = %session.user_id, error = ?err, "Failed to fetch user for valid session");
            Err(Status::InternalServerError)
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cached = request
            .local_cache_async(
                async { CachedUser(resolve_user(request).await) }
                    .instrument(tracing::info_span!("user_auth_guard")),
            )
            .await;

        match &cached.0 {
            Ok(user) => Outcome::Success(user.clone()),
            Err(status) => Outcome::Error((*status, ())),
        }
    }
}

/// A coach whose profile an admin has verified. Search, interested athletes and
/// contact are behind this guard.
pub struct VerifiedCoach {
    pub user: User,
    pub profile: CoachProfile,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for VerifiedCoach {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = try_outcome!(request.guard::<User>().await);

        if user.role != Role::Coach {
            warn!(user_id = %user.id, role = %user.role, "Non-coach on a coach-only route");
            return deny(request, "/dashboard");
        }

        let Some(db) = request.rocket().state::<SqlitePool>() else {
            return Outcome::Error((Status::ServiceUnavailable, ()));
        };

        match get_coach_profile(db, user.id).await {
            Ok(Some(profile)) if profile.is_verified() => {
                Outcome::Success(VerifiedCoach { user, profile })
            }
            Ok(_) => {
                warn!(user_id = %user.id, "Coach is not verified");
                deny(request, "/profile")
            }
            Err(err) => Outcome::Error((err.to_status_with_log("Coach verification lookup"), ())),
        }
    }
}

async fn require_role<'r>(request: &'r Request<'_>, role: Role) -> Outcome<User, ()> {
    let user = try_outcome!(request.guard::<User>().await);

    if user.role != role {
        warn!(user_id = %user.id, role = %user.role, required = %role, "Wrong role for route");
        return deny(request, "/dashboard");
    }

    Outcome::Success(user)
}

pub struct AthleteUser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AthleteUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        require_role(request, Role::Athlete).await.map(AthleteUser)
    }
}

/// Any coach, verified or not.
pub struct CoachUser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CoachUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        require_role(request, Role::Coach).await.map(CoachUser)
    }
}

pub struct AdminUser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        require_role(request, Role::Admin).await.map(AdminUser)
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    #[serde(flatten)]
    pub response: ValidationResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<&'static str>,
}

fn error_body(status: Status, redirect_to: Option<&'static str>) -> Custom<Json<ErrorBody>> {
    let Custom(status, Json(response)) = status.to_validation_response();
    Custom(
        status,
        Json(ErrorBody {
            response,
            redirect_to,
        }),
    )
}

#[catch(401)]
pub fn unauthorized_api(req: &Request) -> Custom<Json<ErrorBody>> {
    warn!(uri = %req.uri(), "Unauthorized access attempt");
    error_body(Status::Unauthorized, Some(SIGN_IN_ROUTE))
}

#[catch(403)]
pub fn forbidden_api(req: &Request) -> Custom<Json<ErrorBody>> {
    warn!(uri = %req.uri(), "Forbidden access attempt");
    let denial = req.local_cache(AccessDenial::default);
    error_body(Status::Forbidden, denial.redirect_to)
}

#[catch(default)]
pub fn default_api(status: Status, _req: &Request) -> Custom<Json<ErrorBody>> {
    error_body(status, None)
}
