use rocket::State;
use rocket::form::{self, error::ErrorKind};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::AdminUser;
use crate::db::{
    create_school, list_coaches_by_status, list_reports, resolve_report, set_coach_verification,
    set_post_hidden, set_thread_hidden,
};
use crate::error::AppError;
use crate::models::{
    CoachProfile, Report, ReportResolution, ReportStatus, School, SchoolInput, VerificationStatus,
};
use crate::validation::{ApiResult, JsonValidateExt};

/// An absent filter means the default status; a present but unknown one is rejected.
fn status_filter<T: Default>(status: form::Result<'_, T>) -> Result<T, AppError> {
    match status {
        Ok(status) => Ok(status),
        Err(errors) if errors.iter().all(|e| matches!(e.kind, ErrorKind::Missing)) => {
            Ok(T::default())
        }
        Err(errors) => Err(AppError::Validation(format!("Unknown status filter: {}", errors))),
    }
}

#[get("/admin/coaches?<status>")]
pub async fn api_list_coaches(
    status: form::Result<'_, VerificationStatus>,
    _admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<CoachProfile>>> {
    let status = status_filter(status)?;
    Ok(Json(list_coaches_by_status(db, status).await?))
}

#[derive(Deserialize)]
pub struct VerificationDecision {
    pub status: VerificationStatus,
}

#[post("/admin/coaches/<coach_id>/verification", data = "<decision>")]
pub async fn api_set_coach_verification(
    coach_id: i64,
    admin: AdminUser,
    decision: Json<VerificationDecision>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<CoachProfile>> {
    let profile = set_coach_verification(db, coach_id, decision.status).await?;
    info!(admin_id = %admin.0.id, coach_id, status = ?decision.status, "Coach verification changed");
    Ok(Json(profile))
}

#[post("/admin/schools", data = "<school>")]
pub async fn api_create_school(
    _admin: AdminUser,
    school: Json<SchoolInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<School>> {
    let input = school.validate_custom()?;
    Ok(Json(create_school(db, &input).await?))
}

#[get("/admin/reports?<status>")]
pub async fn api_list_reports(
    status: form::Result<'_, ReportStatus>,
    _admin: AdminUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Report>>> {
    let status = status_filter(status)?;
    Ok(Json(list_reports(db, status).await?))
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub resolution: ReportResolution,
}

#[post("/admin/reports/<id>/resolve", data = "<request>")]
pub async fn api_resolve_report(
    id: i64,
    _admin: AdminUser,
    request: Json<ResolveRequest>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Report>> {
    Ok(Json(resolve_report(db, id, request.resolution.into()).await?))
}

#[derive(Deserialize)]
pub struct VisibilityRequest {
    pub hidden: bool,
}

#[derive(Serialize)]
pub struct VisibilityResponse {
    pub id: i64,
    pub hidden: bool,
}

#[post("/admin/threads/<id>/visibility", data = "<request>")]
pub async fn api_set_thread_visibility(
    id: i64,
    _admin: AdminUser,
    request: Json<VisibilityRequest>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<VisibilityResponse>> {
    set_thread_hidden(db, id, request.hidden).await?;
    Ok(Json(VisibilityResponse {
        id,
        hidden: request.hidden,
    }))
}

#[post("/admin/posts/<id>/visibility", data = "<request>")]
pub async fn api_set_post_visibility(
    id: i64,
    _admin: AdminUser,
    request: Json<VisibilityRequest>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<VisibilityResponse>> {
    set_post_hidden(db, id, request.hidden).await?;
    Ok(Json(VisibilityResponse {
        id,
        hidden: request.hidden,
    }))
}
