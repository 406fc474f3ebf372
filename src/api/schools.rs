use rocket::State;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::auth::{AthleteUser, User};
use crate::db::{
    delete_interest, get_school, list_interests, list_schools, toggle_interest,
    update_interest, upsert_interest,
};
use crate::env::AppConfig;
use crate::models::{Interest, InterestInput, InterestUpdate, InterestWithSchool, School};
use crate::validation::ApiResult;

#[get("/schools?<search>")]
pub async fn api_list_schools(
    search: Option<String>,
    _user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Vec<School>>> {
    let schools = list_schools(db, search.as_deref(), config.search_result_limit).await?;
    Ok(Json(schools))
}

#[get("/schools/<id>")]
pub async fn api_get_school(id: i64, _user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<School>> {
    Ok(Json(get_school(db, id).await?))
}

#[get("/interests")]
pub async fn api_list_interests(
    athlete: AthleteUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<InterestWithSchool>>> {
    Ok(Json(list_interests(db, athlete.0.id).await?))
}

#[post("/interests", data = "<interest>")]
pub async fn api_add_interest(
    athlete: AthleteUser,
    interest: Json<InterestInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Interest>> {
    Ok(Json(upsert_interest(db, athlete.0.id, &interest).await?))
}

#[derive(Serialize)]
pub struct ToggleInterestResponse {
    pub school_id: i64,
    pub interested: bool,
    pub interest: Option<Interest>,
}

#[post("/interests/toggle/<school_id>")]
pub async fn api_toggle_interest(
    school_id: i64,
    athlete: AthleteUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ToggleInterestResponse>> {
    let interest = toggle_interest(db, athlete.0.id, school_id).await?;
    Ok(Json(ToggleInterestResponse {
        school_id,
        interested: interest.is_some(),
        interest,
    }))
}

#[patch("/interests/<id>", data = "<update>")]
pub async fn api_update_interest(
    id: i64,
    athlete: AthleteUser,
    update: Json<InterestUpdate>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Interest>> {
    Ok(Json(update_interest(db, athlete.0.id, id, &update).await?))
}

#[delete("/interests/<id>")]
pub async fn api_delete_interest(
    id: i64,
    athlete: AthleteUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<rocket::http::Status> {
    delete_interest(db, athlete.0.id, id).await?;
    Ok(rocket::http::Status::NoContent)
}
