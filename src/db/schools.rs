use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    Interest, InterestInput, InterestType, InterestUpdate, InterestWithSchool, School,
    SchoolInput, Visibility,
};

pub const SUGGESTED_SCHOOL_LIMIT: i64 = 6;

const INTEREST_COLUMNS: &str =
    "id, athlete_user_id, school_id, interest_type, visibility, created_at";

/// Escapes `%`, `_` and `\` so user text matches literally inside `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[instrument]
pub async fn list_schools(
    pool: &Pool<Sqlite>,
    search: Option<&str>,
    limit: i64,
) -> Result<Vec<School>, AppError> {
    info!("Listing schools");

    let mut query =
        QueryBuilder::<Sqlite>::new("SELECT id, name, division, city, state FROM schools");

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query
            .push(" WHERE name LIKE ")
            .push_bind(like_pattern(term))
            .push(" ESCAPE '\\'");
    }

    query.push(" ORDER BY name, id LIMIT ").push_bind(limit);

    let schools = query.build_query_as::<School>().fetch_all(pool).await?;

    Ok(schools)
}

#[instrument]
pub async fn get_school(pool: &Pool<Sqlite>, id: i64) -> Result<School, AppError> {
    info!("Fetching school");

    let school = sqlx::query_as::<_, School>(
        "SELECT id, name, division, city, state FROM schools WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    school.ok_or_else(|| AppError::NotFound(format!("School {} does not exist", id)))
}

#[instrument(skip(pool))]
pub async fn create_school(pool: &Pool<Sqlite>, input: &SchoolInput) -> Result<School, AppError> {
    info!(name = %input.name, "Creating school");

    let school = sqlx::query_as::<_, School>(
        "INSERT INTO schools (name, division, city, state, created_at) VALUES (?, ?, ?, ?, ?)
         RETURNING id, name, division, city, state",
    )
    .bind(input.name.trim())
    .bind(&input.division)
    .bind(&input.city)
    .bind(&input.state)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(school)
}

/// Schools the athlete has not expressed any interest in yet, alphabetically.
#[instrument]
pub async fn suggested_schools(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    limit: i64,
) -> Result<Vec<School>, AppError> {
    info!("Fetching suggested schools");

    let schools = sqlx::query_as::<_, School>(
        "SELECT id, name, division, city, state FROM schools
         WHERE id NOT IN (
            SELECT school_id FROM athlete_school_interests WHERE athlete_user_id = ?
         )
         ORDER BY name, id LIMIT ?",
    )
    .bind(athlete_user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(schools)
}

#[instrument]
pub async fn list_interests(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
) -> Result<Vec<InterestWithSchool>, AppError> {
    info!("Listing athlete interests");

    let interests = sqlx::query_as::<_, InterestWithSchool>(
        "SELECT i.id, i.school_id, i.interest_type, i.visibility, i.created_at,
            s.name AS school_name, s.division AS school_division,
            s.city AS school_city, s.state AS school_state
         FROM athlete_school_interests i
         JOIN schools s ON s.id = i.school_id
         WHERE i.athlete_user_id = ?
         ORDER BY i.created_at DESC, i.id DESC",
    )
    .bind(athlete_user_id)
    .fetch_all(pool)
    .await?;

    Ok(interests)
}

/// Adds or re-types the athlete's interest in a school; one row per (athlete, school).
#[instrument(skip(pool))]
pub async fn upsert_interest(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    input: &InterestInput,
) -> Result<Interest, AppError> {
    info!("Saving interest");

    get_school(pool, input.school_id).await?;

    let interest = sqlx::query_as::<_, Interest>(&format!(
        "INSERT INTO athlete_school_interests
            (athlete_user_id, school_id, interest_type, visibility, created_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (athlete_user_id, school_id) DO UPDATE SET
            interest_type = excluded.interest_type,
            visibility = excluded.visibility
         RETURNING {}",
        INTEREST_COLUMNS
    ))
    .bind(athlete_user_id)
    .bind(input.school_id)
    .bind(input.interest_type)
    .bind(input.visibility)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(interest)
}

/// Removes the interest if present, otherwise adds one with default type and visibility.
/// Returns the new interest, or `None` when the toggle removed it.
#[instrument(skip(pool))]
pub async fn toggle_interest(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    school_id: i64,
) -> Result<Option<Interest>, AppError> {
    info!("Toggling interest");

    let removed = sqlx::query(
        "DELETE FROM athlete_school_interests WHERE athlete_user_id = ? AND school_id = ?",
    )
    .bind(athlete_user_id)
    .bind(school_id)
    .execute(pool)
    .await?;

    if removed.rows_affected() > 0 {
        info!("Interest removed");
        return Ok(None);
    }

    let input = InterestInput {
        school_id,
        interest_type: InterestType::default(),
        visibility: Visibility::default(),
    };
    upsert_interest(pool, athlete_user_id, &input).await.map(Some)
}

#[instrument(skip(pool))]
pub async fn update_interest(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    interest_id: i64,
    update: &InterestUpdate,
) -> Result<Interest, AppError> {
    info!("Updating interest");

    let interest = sqlx::query_as::<_, Interest>(&format!(
        "UPDATE athlete_school_interests SET
            interest_type = COALESCE(?, interest_type),
            visibility = COALESCE(?, visibility)
         WHERE id = ? AND athlete_user_id = ?
         RETURNING {}",
        INTEREST_COLUMNS
    ))
    .bind(update.interest_type)
    .bind(update.visibility)
    .bind(interest_id)
    .bind(athlete_user_id)
    .fetch_optional(pool)
    .await?;

    interest.ok_or_else(|| AppError::NotFound(format!("Interest {} not found", interest_id)))
}

#[instrument(skip(pool))]
pub async fn delete_interest(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    interest_id: i64,
) -> Result<(), AppError> {
    info!("Removing interest");

    let result =
        sqlx::query("DELETE FROM athlete_school_interests WHERE id = ? AND athlete_user_id = ?")
            .bind(interest_id)
            .bind(athlete_user_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Interest {} not found", interest_id)));
    }

    Ok(())
}
