use rocket::State;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::{AthleteUser, CoachUser, Role, User};
use crate::completeness::{CompletenessReport, completeness_report};
use crate::db::{
    add_highlight, add_stat, get_athlete_profile, get_coach_profile, is_saved,
    list_highlights, list_stats, upsert_athlete_profile, upsert_coach_profile,
};
use crate::error::AppError;
use crate::models::{
    AthleteProfile, AthleteProfileInput, CoachProfile, CoachProfileInput, Highlight,
    HighlightInput, Stat, StatInput,
};
use crate::validation::{ApiResult, JsonValidateExt};

#[derive(Serialize)]
#[serde(untagged)]
pub enum RoleProfile {
    Athlete(AthleteProfile),
    Coach(CoachProfile),
}

#[derive(Serialize)]
pub struct MyProfileResponse {
    pub user: User,
    /// `null` until onboarding has been completed.
    pub profile: Option<RoleProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completeness: Option<CompletenessReport>,
}

#[get("/profile")]
pub async fn api_my_profile(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<MyProfileResponse>> {
    let (profile, completeness) = match user.role {
        Role::Athlete => {
            let profile = get_athlete_profile(db, user.id).await?;
            let report = profile
                .as_ref()
                .map(|p| completeness_report(&p.as_input()));
            (profile.map(RoleProfile::Athlete), report)
        }
        Role::Coach => (
            get_coach_profile(db, user.id).await?.map(RoleProfile::Coach),
            None,
        ),
        Role::Admin => (None, None),
    };

    Ok(Json(MyProfileResponse {
        user,
        profile,
        completeness,
    }))
}

/// Athlete onboarding and every later profile edit.
#[put("/profile/athlete", data = "<profile>")]
pub async fn api_save_athlete_profile(
    athlete: AthleteUser,
    profile: Json<AthleteProfileInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<AthleteProfile>> {
    let AthleteUser(user) = athlete;
    let input = Json(profile.into_inner().normalized()).validate_custom()?;

    let saved = upsert_athlete_profile(db, user.id, &input).await?;
    Ok(Json(saved))
}

/// Coach onboarding and edits. Saving sends the profile back for verification.
#[put("/profile/coach", data = "<profile>")]
pub async fn api_save_coach_profile(
    coach: CoachUser,
    profile: Json<CoachProfileInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<CoachProfile>> {
    let CoachUser(user) = coach;
    let input = profile.validate_custom()?;

    let saved = upsert_coach_profile(db, user.id, &input).await?;
    info!(user_id = %user.id, "Coach profile saved, awaiting verification");
    Ok(Json(saved))
}

#[derive(Serialize)]
pub struct AthleteDetail {
    pub profile: AthleteProfile,
    pub highlights: Vec<Highlight>,
    pub stats: Vec<Stat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_saved: Option<bool>,
}

#[get("/athletes/<id>")]
pub async fn api_athlete_detail(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<AthleteDetail>> {
    let not_found = || AppError::NotFound(format!("Athlete {} not found", id));

    let profile = get_athlete_profile(db, id).await?.ok_or_else(not_found)?;

    let may_view = profile.is_public || user.id == id || user.role == Role::Admin;
    if !may_view {
        return Err(not_found().into());
    }

    let highlights = list_highlights(db, id).await?;
    let stats = list_stats(db, id).await?;
    let is_saved = match user.role {
        Role::Coach => Some(is_saved(db, user.id, id).await?),
        _ => None,
    };

    Ok(Json(AthleteDetail {
        profile,
        highlights,
        stats,
        is_saved,
    }))
}

#[get("/profile/highlights")]
pub async fn api_list_highlights(
    athlete: AthleteUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Highlight>>> {
    Ok(Json(list_highlights(db, athlete.0.id).await?))
}

#[post("/profile/highlights", data = "<highlight>")]
pub async fn api_add_highlight(
    athlete: AthleteUser,
    highlight: Json<HighlightInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Highlight>> {
    let input = highlight.validate_custom()?;
    Ok(Json(add_highlight(db, athlete.0.id, &input).await?))
}

#[get("/profile/stats")]
pub async fn api_list_stats(athlete: AthleteUser, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Stat>>> {
    Ok(Json(list_stats(db, athlete.0.id).await?))
}

#[post("/profile/stats", data = "<stat>")]
pub async fn api_add_stat(
    athlete: AthleteUser,
    stat: Json<StatInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Stat>> {
    let input = Json(stat.into_inner().normalized()).validate_custom()?;
    Ok(Json(add_stat(db, athlete.0.id, &input).await?))
}
