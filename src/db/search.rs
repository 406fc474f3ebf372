use std::collections::{HashMap, HashSet};

use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument};

use crate::db::profiles::ATHLETE_PROFILE_COLUMNS;
use crate::db::schools::like_pattern;
use crate::error::AppError;
use crate::models::{
    AthleteProfile, CoachProfile, DbAthleteProfile, DbInterestedAthlete, InterestedAthlete,
    SearchFilters, SearchResult, VisibleInterest,
};

/// Public athlete profiles matching every filter that is set, for a verified coach.
///
/// `interested_in_my_school` narrows the fetched page afterwards, and only when the coach
/// has linked a school.
#[instrument(skip(pool, coach), fields(coach_user_id = coach.user_id))]
pub async fn search_athletes(
    pool: &Pool<Sqlite>,
    coach: &CoachProfile,
    filters: &SearchFilters,
    limit: i64,
) -> Result<Vec<SearchResult>, AppError> {
    info!("Searching athletes");

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM athlete_profiles p WHERE p.is_public = TRUE",
        ATHLETE_PROFILE_COLUMNS
    ));

    if let Some(sport) = filters.sport.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND p.sport = ").push_bind(sport.to_string());
    }
    if let Some(state) = filters.state.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND p.state = ").push_bind(state.to_uppercase());
    }
    if let Some(grad_year) = filters.grad_year {
        query.push(" AND p.grad_year = ").push_bind(grad_year);
    }
    if let Some(min_gpa) = filters.min_gpa {
        query.push(" AND p.gpa >= ").push_bind(min_gpa);
    }
    if let Some(term) = filters.name_query() {
        let pattern = like_pattern(term);
        query
            .push(" AND (p.first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.last_name LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    query
        .push(" ORDER BY p.last_name, p.user_id LIMIT ")
        .push_bind(limit);

    let profiles: Vec<AthleteProfile> = query
        .build_query_as::<DbAthleteProfile>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(AthleteProfile::from)
        .collect();

    if profiles.is_empty() {
        return Ok(Vec::new());
    }

    let mut interests = visible_interests(pool, &profiles, coach.school_id).await?;

    let saved: HashSet<i64> =
        sqlx::query_scalar("SELECT athlete_user_id FROM saved_athletes WHERE coach_user_id = ?")
            .bind(coach.user_id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let mut results: Vec<SearchResult> = profiles
        .into_iter()
        .map(|profile| {
            let interests = interests.remove(&profile.user_id).unwrap_or_default();
            let interested_in_my_school = coach
                .school_id
                .is_some_and(|school_id| interests.iter().any(|i| i.school_id == school_id));
            let is_saved = saved.contains(&profile.user_id);
            SearchResult {
                profile,
                interests,
                interested_in_my_school,
                is_saved,
            }
        })
        .collect();

    if filters.interested_in_my_school && coach.school_id.is_some() {
        results.retain(|r| r.interested_in_my_school);
    }

    info!(results = results.len(), "Search complete");

    Ok(results)
}

/// Interests a verified coach may see: public ones for any school, plus
/// approval-gated ones pointing at the coach's own school.
async fn visible_interests(
    pool: &Pool<Sqlite>,
    profiles: &[AthleteProfile],
    coach_school_id: Option<i64>,
) -> Result<HashMap<i64, Vec<VisibleInterest>>, AppError> {
    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT i.athlete_user_id, i.school_id, s.name AS school_name,
            i.interest_type, i.visibility
         FROM athlete_school_interests i
         JOIN schools s ON s.id = i.school_id
         WHERE i.athlete_user_id IN (",
    );

    let mut ids = query.separated(", ");
    for profile in profiles {
        ids.push_bind(profile.user_id);
    }
    ids.push_unseparated(")");

    query.push(" AND (i.visibility = 'PUBLIC_TO_VERIFIED_COACHES'");
    if let Some(school_id) = coach_school_id {
        query
            .push(" OR (i.visibility = 'PRIVATE_UNTIL_APPROVED' AND i.school_id = ")
            .push_bind(school_id)
            .push(")");
    }
    query.push(") ORDER BY s.name, i.id");

    let rows = query
        .build_query_as::<VisibleInterest>()
        .fetch_all(pool)
        .await?;

    let mut by_athlete: HashMap<i64, Vec<VisibleInterest>> = HashMap::new();
    for row in rows {
        by_athlete.entry(row.athlete_user_id).or_default().push(row);
    }

    Ok(by_athlete)
}

#[instrument(skip(pool))]
pub async fn interested_athletes(
    pool: &Pool<Sqlite>,
    school_id: i64,
) -> Result<Vec<InterestedAthlete>, AppError> {
    info!("Listing athletes interested in school");

    let rows = sqlx::query_as::<_, DbInterestedAthlete>(&format!(
        "SELECT i.id AS interest_id, i.interest_type, i.visibility, i.created_at AS interested_at,
            {}
         FROM athlete_school_interests i
         JOIN athlete_profiles p ON p.user_id = i.athlete_user_id
         WHERE i.school_id = ?
            AND i.visibility IN ('PUBLIC_TO_VERIFIED_COACHES', 'PRIVATE_UNTIL_APPROVED')
            AND p.is_public = TRUE
         ORDER BY i.created_at DESC, i.id DESC",
        ATHLETE_PROFILE_COLUMNS
    ))
    .bind(school_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(InterestedAthlete::from).collect())
}
