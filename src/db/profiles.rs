use chrono::Utc;
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::completeness::profile_completeness;
use crate::db::insert_notification;
use crate::error::AppError;
use crate::models::{
    AthleteProfile, AthleteProfileInput, Camp, CoachProfile, CoachProfileInput, DbAthleteProfile,
    DbCoachProfile, Highlight, HighlightInput, NewNotification, Stat, StatInput,
    StatVerification, VerificationStatus,
};

/// Column list for `DbAthleteProfile`, aliased `p` so it can be joined.
pub(crate) const ATHLETE_PROFILE_COLUMNS: &str = "p.user_id, p.first_name, p.last_name, p.sport, \
     p.positions, p.grad_year, p.city, p.state, p.bio, p.gpa, p.sat_score, p.act_score, \
     p.height_feet, p.height_inches, p.weight, p.is_public, p.profile_completeness, \
     p.created_at, p.updated_at";

const COACH_PROFILE_COLUMNS: &str = "user_id, school, school_id, title, sports, looking_for, \
     verification_status, created_at, updated_at";

#[instrument]
pub async fn get_athlete_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Option<AthleteProfile>, AppError> {
    info!("Fetching athlete profile");

    let row = sqlx::query_as::<_, DbAthleteProfile>(&format!(
        "SELECT {} FROM athlete_profiles p WHERE p.user_id = ?",
        ATHLETE_PROFILE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(AthleteProfile::from))
}

#[instrument(skip(pool, input))]
pub async fn upsert_athlete_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
    input: &AthleteProfileInput,
) -> Result<AthleteProfile, AppError> {
    info!("Saving athlete profile");

    let completeness = profile_completeness(input);
    let positions = serde_json::to_string(&input.positions)?;
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO athlete_profiles (
            user_id, first_name, last_name, sport, positions, grad_year, city, state, bio,
            gpa, sat_score, act_score, height_feet, height_inches, weight, is_public,
            profile_completeness, created_at, updated_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, TRUE), ?, ?, ?)
         ON CONFLICT (user_id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            sport = excluded.sport,
            positions = excluded.positions,
            grad_year = excluded.grad_year,
            city = excluded.city,
            state = excluded.state,
            bio = excluded.bio,
            gpa = excluded.gpa,
            sat_score = excluded.sat_score,
            act_score = excluded.act_score,
            height_feet = excluded.height_feet,
            height_inches = excluded.height_inches,
            weight = excluded.weight,
            is_public = COALESCE(?, athlete_profiles.is_public),
            profile_completeness = excluded.profile_completeness,
            updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.sport)
    .bind(positions)
    .bind(input.grad_year)
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.bio)
    .bind(input.gpa)
    .bind(input.sat_score)
    .bind(input.act_score)
    .bind(input.height_feet)
    .bind(input.height_inches)
    .bind(input.weight)
    .bind(input.is_public)
    .bind(completeness)
    .bind(now)
    .bind(now)
    .bind(input.is_public)
    .execute(pool)
    .await?;

    info!(completeness, "Athlete profile saved");

    get_athlete_profile(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Athlete profile vanished after save".to_string()))
}

#[instrument(skip(conn))]
async fn load_camps(conn: &mut SqliteConnection, coach_user_id: i64) -> Result<Vec<Camp>, AppError> {
    let camps = sqlx::query_as::<_, Camp>(
        "SELECT id, position, name, location, event_date, url FROM coach_camps
         WHERE coach_user_id = ? ORDER BY position",
    )
    .bind(coach_user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(camps)
}

#[instrument(skip(conn))]
async fn fetch_coach_profile(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<CoachProfile>, AppError> {
    let row = sqlx::query_as::<_, DbCoachProfile>(&format!(
        "SELECT {} FROM coach_profiles WHERE user_id = ?",
        COACH_PROFILE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut profile = CoachProfile::from(row);
    profile.camps = load_camps(conn, user_id).await?;
    Ok(Some(profile))
}

#[instrument]
pub async fn get_coach_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Option<CoachProfile>, AppError> {
    info!("Fetching coach profile");
    let mut conn = pool.acquire().await?;
    fetch_coach_profile(&mut conn, user_id).await
}

/// Saves a coach profile and replaces its camps. Any coach-initiated save goes back to review.
#[instrument(skip(pool, input))]
pub async fn upsert_coach_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
    input: &CoachProfileInput,
) -> Result<CoachProfile, AppError> {
    info!(camps = input.camps.len(), "Saving coach profile");

    let sports = serde_json::to_string(&input.sports)?;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    if let Some(school_id) = input.school_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM schools WHERE id = ?")
            .bind(school_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("School {} does not exist", school_id)));
        }
    }

    sqlx::query(
        "INSERT INTO coach_profiles (
            user_id, school, school_id, title, sports, looking_for, verification_status,
            created_at, updated_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (user_id) DO UPDATE SET
            school = excluded.school,
            school_id = excluded.school_id,
            title = excluded.title,
            sports = excluded.sports,
            looking_for = excluded.looking_for,
            verification_status = excluded.verification_status,
            updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(input.school.trim())
    .bind(input.school_id)
    .bind(input.title.trim())
    .bind(sports)
    .bind(&input.looking_for)
    .bind(VerificationStatus::Pending)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM coach_camps WHERE coach_user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for (position, camp) in input.camps.iter().enumerate() {
        sqlx::query(
            "INSERT INTO coach_camps (coach_user_id, position, name, location, event_date, url)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(position as i64)
        .bind(&camp.name)
        .bind(&camp.location)
        .bind(camp.event_date)
        .bind(&camp.url)
        .execute(&mut *tx)
        .await?;
    }

    let profile = fetch_coach_profile(&mut tx, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Coach profile vanished after save".to_string()))?;

    tx.commit().await?;

    Ok(profile)
}

#[instrument]
pub async fn list_coaches_by_status(
    pool: &Pool<Sqlite>,
    status: VerificationStatus,
) -> Result<Vec<CoachProfile>, AppError> {
    info!("Listing coaches by verification status");

    let rows = sqlx::query_as::<_, DbCoachProfile>(&format!(
        "SELECT {} FROM coach_profiles WHERE verification_status = ? ORDER BY updated_at, user_id",
        COACH_PROFILE_COLUMNS
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CoachProfile::from).collect())
}

/// Admin decision on a coach. Verification notifies the coach in the same transaction.
#[instrument(skip(pool))]
pub async fn set_coach_verification(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    status: VerificationStatus,
) -> Result<CoachProfile, AppError> {
    info!("Updating coach verification status");

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE coach_profiles SET verification_status = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(coach_user_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Coach {} has no profile",
            coach_user_id
        )));
    }

    if status == VerificationStatus::Verified {
        insert_notification(&mut tx, &NewNotification::coach_verified(coach_user_id)).await?;
    }

    let profile = fetch_coach_profile(&mut tx, coach_user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Coach profile vanished after update".to_string()))?;

    tx.commit().await?;

    Ok(profile)
}

#[instrument(skip(pool, input))]
pub async fn add_highlight(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    input: &HighlightInput,
) -> Result<Highlight, AppError> {
    info!("Adding highlight");

    let highlight = sqlx::query_as::<_, Highlight>(
        "INSERT INTO athlete_highlights (athlete_user_id, title, url, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING id, athlete_user_id, title, url, created_at",
    )
    .bind(athlete_user_id)
    .bind(input.title.trim())
    .bind(input.url.trim())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(highlight)
}

#[instrument]
pub async fn list_highlights(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
) -> Result<Vec<Highlight>, AppError> {
    info!("Listing highlights");

    let highlights = sqlx::query_as::<_, Highlight>(
        "SELECT id, athlete_user_id, title, url, created_at FROM athlete_highlights
         WHERE athlete_user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(athlete_user_id)
    .fetch_all(pool)
    .await?;

    Ok(highlights)
}

async fn insert_stat(
    conn: &mut SqliteConnection,
    athlete_user_id: i64,
    input: &StatInput,
) -> Result<Stat, AppError> {
    let stat = sqlx::query_as::<_, Stat>(
        "INSERT INTO athlete_stats (
            athlete_user_id, season, stat_key, stat_value, source_type, source_url,
            verification_status, created_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id, athlete_user_id, season, stat_key, stat_value, source_type, source_url,
            verification_status, created_at",
    )
    .bind(athlete_user_id)
    .bind(input.season.trim())
    .bind(input.stat_key.trim())
    .bind(input.stat_value.trim())
    .bind(input.source_type)
    .bind(&input.source_url)
    .bind(StatVerification::from(input.source_type))
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(stat)
}

#[instrument(skip(pool, input))]
pub async fn add_stat(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    input: &StatInput,
) -> Result<Stat, AppError> {
    info!(source_type = ?input.source_type, "Adding stat");
    let mut conn = pool.acquire().await?;
    insert_stat(&mut conn, athlete_user_id, input).await
}

/// Inserts a provider's batch all-or-nothing.
#[instrument(skip(pool, inputs), fields(count = inputs.len()))]
pub async fn add_stats(
    pool: &Pool<Sqlite>,
    athlete_user_id: i64,
    inputs: &[StatInput],
) -> Result<Vec<Stat>, AppError> {
    info!("Importing stats");

    let mut tx = pool.begin().await?;
    let mut stats = Vec::with_capacity(inputs.len());
    for input in inputs {
        stats.push(insert_stat(&mut tx, athlete_user_id, input).await?);
    }
    tx.commit().await?;

    Ok(stats)
}

#[instrument]
pub async fn list_stats(pool: &Pool<Sqlite>, athlete_user_id: i64) -> Result<Vec<Stat>, AppError> {
    info!("Listing stats");

    let stats = sqlx::query_as::<_, Stat>(
        "SELECT id, athlete_user_id, season, stat_key, stat_value, source_type, source_url,
            verification_status, created_at
         FROM athlete_stats WHERE athlete_user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(athlete_user_id)
    .fetch_all(pool)
    .await?;

    Ok(stats)
}
