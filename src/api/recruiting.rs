use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::api::require_user_with_role;
use crate::auth::{AthleteUser, CoachUser, Role, VerifiedCoach};
use crate::db::{
    create_contact_request, interested_athletes, list_contact_requests_for_athlete,
    list_contact_requests_for_coach, list_saved_athletes, respond_to_contact_request,
    save_athlete, search_athletes, toggle_saved_athlete, unsave_athlete,
};
use crate::env::AppConfig;
use crate::models::{
    ContactRequest, ContactRequestInput, ContactRequestView, ContactResponse, Conversation,
    InterestedAthlete, SavedAthlete, SearchFilters, SearchResult,
};
use crate::validation::{ApiResult, JsonValidateExt};

#[get("/search?<filters..>")]
pub async fn api_search_athletes(
    filters: SearchFilters,
    coach: VerifiedCoach,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let results =
        search_athletes(db, &coach.profile, &filters, config.search_result_limit).await?;
    Ok(Json(results))
}

#[derive(Serialize)]
pub struct InterestedAthletesResponse {
    pub school_linked: bool,
    pub athletes: Vec<InterestedAthlete>,
}

#[get("/interested-athletes")]
pub async fn api_interested_athletes(
    coach: VerifiedCoach,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<InterestedAthletesResponse>> {
    let Some(school_id) = coach.profile.school_id else {
        return Ok(Json(InterestedAthletesResponse {
            school_linked: false,
            athletes: Vec::new(),
        }));
    };

    Ok(Json(InterestedAthletesResponse {
        school_linked: true,
        athletes: interested_athletes(db, school_id).await?,
    }))
}

#[get("/shortlist")]
pub async fn api_list_shortlist(
    coach: CoachUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<SavedAthlete>>> {
    Ok(Json(list_saved_athletes(db, coach.0.id).await?))
}

#[derive(Serialize)]
pub struct ShortlistResponse {
    pub athlete_user_id: i64,
    pub saved: bool,
}

#[put("/shortlist/<athlete_id>")]
pub async fn api_save_athlete(
    athlete_id: i64,
    coach: CoachUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ShortlistResponse>> {
    require_user_with_role(db, athlete_id, Role::Athlete).await?;
    save_athlete(db, coach.0.id, athlete_id).await?;
    Ok(Json(ShortlistResponse {
        athlete_user_id: athlete_id,
        saved: true,
    }))
}

#[delete("/shortlist/<athlete_id>")]
pub async fn api_unsave_athlete(
    athlete_id: i64,
    coach: CoachUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ShortlistResponse>> {
    unsave_athlete(db, coach.0.id, athlete_id).await?;
    Ok(Json(ShortlistResponse {
        athlete_user_id: athlete_id,
        saved: false,
    }))
}

#[post("/shortlist/<athlete_id>/toggle")]
pub async fn api_toggle_saved_athlete(
    athlete_id: i64,
    coach: CoachUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ShortlistResponse>> {
    require_user_with_role(db, athlete_id, Role::Athlete).await?;
    let saved = toggle_saved_athlete(db, coach.0.id, athlete_id).await?;
    Ok(Json(ShortlistResponse {
        athlete_user_id: athlete_id,
        saved,
    }))
}

#[post("/contact-requests", data = "<request>")]
pub async fn api_send_contact_request(
    coach: VerifiedCoach,
    request: Json<ContactRequestInput>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ContactRequest>> {
    let input = request.validate_custom()?;
    require_user_with_role(db, input.athlete_user_id, Role::Athlete).await?;

    let request = create_contact_request(
        db,
        coach.user.id,
        input.athlete_user_id,
        input.message.as_deref(),
        &coach.profile.display_label(),
    )
    .await?;

    info!(request_id = %request.id, "Contact request sent");
    Ok(Json(request))
}

#[get("/contact-requests")]
pub async fn api_list_contact_requests(
    athlete: AthleteUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<ContactRequestView>>> {
    Ok(Json(list_contact_requests_for_athlete(db, athlete.0.id).await?))
}

#[get("/contact-requests/sent")]
pub async fn api_list_sent_contact_requests(
    coach: CoachUser,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<ContactRequest>>> {
    Ok(Json(list_contact_requests_for_coach(db, coach.0.id).await?))
}

#[derive(Deserialize)]
pub struct RespondRequest {
    pub response: ContactResponse,
}

#[derive(Serialize)]
pub struct RespondResponse {
    pub request: ContactRequest,
    pub conversation: Option<Conversation>,
}

#[post("/contact-requests/<id>/respond", data = "<answer>")]
pub async fn api_respond_to_contact_request(
    id: i64,
    athlete: AthleteUser,
    answer: Json<RespondRequest>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<RespondResponse>> {
    let (request, conversation) =
        respond_to_contact_request(db, athlete.0.id, id, answer.response).await?;
    Ok(Json(RespondResponse {
        request,
        conversation,
    }))
}
