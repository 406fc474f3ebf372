use rocket::State;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::info;
use validator::Validate;

use crate::auth::{AthleteUser, User};
use crate::db::add_stats;
use crate::error::AppError;
use crate::models::Stat;
use crate::stats_providers::{ProviderRegistry, ProviderSummary, StatsProviderParams};
use crate::validation::{ApiResult, ValidationErrorWrapper};

#[get("/stats/providers")]
pub fn api_list_providers(
    _user: User,
    registry: &State<ProviderRegistry>,
) -> Json<Vec<ProviderSummary>> {
    Json(registry.list_enabled())
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub provider: String,
    pub imported: Vec<Stat>,
}

/// Runs an allowlisted provider for the signed-in athlete and stores what it returns.
/// Every row is validated before anything is written.
#[post("/stats/import/<provider>", data = "<params>")]
pub async fn api_import_stats(
    provider: &str,
    athlete: AthleteUser,
    params: Option<Json<StatsProviderParams>>,
    registry: &State<ProviderRegistry>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ImportResponse>> {
    let AthleteUser(user) = athlete;

    let source = registry.validate_usage(provider).map_err(AppError::from)?;

    let mut params = params.map(Json::into_inner).unwrap_or_default();
    params.athlete_user_id = user.id;

    let fetched = source.fetch_stats(&params).await.map_err(AppError::from)?;

    let rows: Vec<_> = fetched.into_iter().map(|stat| stat.normalized()).collect();
    for row in &rows {
        row.validate().map_err(ValidationErrorWrapper)?;
    }

    let imported = add_stats(db, user.id, &rows).await?;
    info!(user_id = %user.id, provider, count = imported.len(), "Stats imported");

    Ok(Json(ImportResponse {
        provider: provider.to_string(),
        imported,
    }))
}
