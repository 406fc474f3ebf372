use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::profiles::ATHLETE_PROFILE_COLUMNS;
use crate::error::AppError;
use crate::models::{DbSavedAthlete, SavedAthlete};

#[instrument(skip(pool))]
pub async fn save_athlete(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    athlete_user_id: i64,
) -> Result<(), AppError> {
    info!("Saving athlete to shortlist");

    sqlx::query(
        "INSERT INTO saved_athletes (coach_user_id, athlete_user_id, created_at) VALUES (?, ?, ?)
         ON CONFLICT (coach_user_id, athlete_user_id) DO NOTHING",
    )
    .bind(coach_user_id)
    .bind(athlete_user_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn unsave_athlete(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    athlete_user_id: i64,
) -> Result<bool, AppError> {
    info!("Removing athlete from shortlist");

    let result =
        sqlx::query("DELETE FROM saved_athletes WHERE coach_user_id = ? AND athlete_user_id = ?")
            .bind(coach_user_id)
            .bind(athlete_user_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns whether the athlete is saved after the toggle.
#[instrument(skip(pool))]
pub async fn toggle_saved_athlete(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    athlete_user_id: i64,
) -> Result<bool, AppError> {
    if unsave_athlete(pool, coach_user_id, athlete_user_id).await? {
        return Ok(false);
    }
    save_athlete(pool, coach_user_id, athlete_user_id).await?;
    Ok(true)
}

#[instrument(skip(pool))]
pub async fn is_saved(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    athlete_user_id: i64,
) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM saved_athletes WHERE coach_user_id = ? AND athlete_user_id = ?",
    )
    .bind(coach_user_id)
    .bind(athlete_user_id)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

#[instrument(skip(pool))]
pub async fn list_saved_athletes(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
) -> Result<Vec<SavedAthlete>, AppError> {
    info!("Listing saved athletes");

    let rows = sqlx::query_as::<_, DbSavedAthlete>(&format!(
        "SELECT sa.created_at AS saved_at, {}
         FROM saved_athletes sa
         JOIN athlete_profiles p ON p.user_id = sa.athlete_user_id
         WHERE sa.coach_user_id = ?
         ORDER BY sa.created_at DESC, p.user_id DESC",
        ATHLETE_PROFILE_COLUMNS
    ))
    .bind(coach_user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SavedAthlete::from).collect())
}

#[instrument(skip(pool))]
pub async fn count_saved_athletes(pool: &Pool<Sqlite>, coach_user_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_athletes WHERE coach_user_id = ?")
        .bind(coach_user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
