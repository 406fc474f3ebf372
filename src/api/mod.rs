use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::warn;

use crate::auth::{AthleteUser, Role, User};
use crate::completeness::completeness_report;
use crate::db::{
    count_pending_contact_requests, count_saved_athletes, get_athlete_profile,
    get_coach_profile, list_coaches_by_status, list_notifications, list_reports,
    suggested_schools, unread_notification_count, SUGGESTED_SCHOOL_LIMIT,
};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::models::{NotificationView, ReportStatus, School, VerificationStatus};
use crate::validation::{ApiResult, ValidationResponse};

pub mod admin;
pub mod auth;
pub mod discussions;
pub mod messaging;
pub mod notifications;
pub mod profiles;
pub mod recruiting;
pub mod schools;
pub mod stats;

const FEED_NOTIFICATION_LIMIT: i64 = 10;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

#[get("/health")]
pub async fn health(db: &State<Pool<Sqlite>>) -> Json<HealthResponse> {
    let (status, database) = match sqlx::query("SELECT 1").execute(db.inner()).await {
        Ok(_) => ("ok", true),
        Err(err) => {
            warn!(error = %err, "Health check could not reach the database");
            ("degraded", false)
        }
    };

    Json(HealthResponse {
        status,
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health while no database is configured.
#[get("/health")]
pub fn setup_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "setup_required",
        database: false,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct SetupStatus {
    pub setup_required: bool,
    pub missing: Vec<&'static str>,
}

#[get("/setup")]
pub fn setup_status(config: &State<AppConfig>) -> Json<SetupStatus> {
    let missing: Vec<&'static str> = match config.database_url {
        Some(_) => Vec::new(),
        None => vec!["DATABASE_URL"],
    };

    Json(SetupStatus {
        setup_required: !missing.is_empty(),
        missing,
    })
}

/// Answers every unmatched `/api` path while the server has no database configured.
#[catch(404)]
pub fn setup_required() -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::ServiceUnavailable,
        Json(ValidationResponse::with_error(
            "setup",
            "The database is not configured. Set DATABASE_URL and restart the server.",
        )),
    )
}

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardSummary {
    Athlete {
        has_profile: bool,
        profile_completeness: i32,
        missing_fields: Vec<&'static str>,
        pending_contact_requests: i64,
        unread_notifications: i64,
    },
    Coach {
        has_profile: bool,
        verification_status: Option<VerificationStatus>,
        saved_athletes: i64,
        unread_notifications: i64,
    },
    Admin {
        pending_coaches: usize,
        pending_reports: usize,
        unread_notifications: i64,
    },
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub user: User,
    pub summary: DashboardSummary,
    /// Set when the user still has to finish onboarding.
    pub redirect_to: Option<&'static str>,
}

#[get("/dashboard")]
pub async fn api_dashboard(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<DashboardResponse>> {
    let unread_notifications = unread_notification_count(db, user.id).await?;

    let (summary, needs_onboarding) = match user.role {
        Role::Athlete => {
            let profile = get_athlete_profile(db, user.id).await?;
            let report = completeness_report(
                &profile
                    .as_ref()
                    .map(|p| p.as_input())
                    .unwrap_or_default(),
            );
            let summary = DashboardSummary::Athlete {
                has_profile: profile.is_some(),
                profile_completeness: report.score,
                missing_fields: report.missing_fields,
                pending_contact_requests: count_pending_contact_requests(db, user.id).await?,
                unread_notifications,
            };
            (summary, profile.is_none())
        }
        Role::Coach => {
            let profile = get_coach_profile(db, user.id).await?;
            let summary = DashboardSummary::Coach {
                has_profile: profile.is_some(),
                verification_status: profile.as_ref().map(|p| p.verification_status),
                saved_athletes: count_saved_athletes(db, user.id).await?,
                unread_notifications,
            };
            (summary, profile.is_none())
        }
        Role::Admin => {
            let summary = DashboardSummary::Admin {
                pending_coaches: list_coaches_by_status(db, VerificationStatus::Pending)
                    .await?
                    .len(),
                pending_reports: list_reports(db, ReportStatus::Pending).await?.len(),
                unread_notifications,
            };
            (summary, false)
        }
    };

    let redirect_to = needs_onboarding.then(|| user.role.onboarding_route());

    Ok(Json(DashboardResponse {
        user,
        summary,
        redirect_to,
    }))
}

#[derive(Serialize)]
pub struct AthleteFeed {
    pub suggested_schools: Vec<School>,
    pub notifications: Vec<NotificationView>,
}

#[get("/feed")]
pub async fn api_athlete_feed(
    athlete: AthleteUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<AthleteFeed>> {
    let AthleteUser(user) = athlete;

    let suggested_schools = suggested_schools(db, user.id, SUGGESTED_SCHOOL_LIMIT).await?;
    let notifications = list_notifications(db, user.id, FEED_NOTIFICATION_LIMIT)
        .await?
        .into_iter()
        .map(NotificationView::from)
        .collect();

    Ok(Json(AthleteFeed {
        suggested_schools,
        notifications,
    }))
}

/// Looks up the user a route parameter names and checks they have the expected role.
pub(crate) async fn require_user_with_role(
    db: &Pool<Sqlite>,
    user_id: i64,
    role: Role,
) -> Result<User, AppError> {
    let user = crate::db::get_user(db, user_id).await?;
    if user.role != role {
        return Err(AppError::NotFound(format!("No {} with id {}", role, user_id)));
    }
    Ok(user)
}
