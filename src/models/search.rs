use chrono::{DateTime, Utc};
use rocket::FromForm;
use serde::Serialize;

use super::{AthleteProfile, DbAthleteProfile, InterestType, Visibility};

#[derive(Debug, Clone, Default, FromForm)]
pub struct SearchFilters {
    pub sport: Option<String>,
    pub state: Option<String>,
    pub grad_year: Option<i32>,
    pub min_gpa: Option<f64>,
    pub search: Option<String>,
    #[field(default = false)]
    pub interested_in_my_school: bool,
}

impl SearchFilters {
    pub fn name_query(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// An interest a verified coach is allowed to see on a search result.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VisibleInterest {
    #[serde(skip)]
    pub athlete_user_id: i64,
    pub school_id: i64,
    pub school_name: String,
    pub interest_type: InterestType,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub profile: AthleteProfile,
    pub interests: Vec<VisibleInterest>,
    pub interested_in_my_school: bool,
    pub is_saved: bool,
}

#[derive(sqlx::FromRow)]
pub struct DbInterestedAthlete {
    pub interest_id: i64,
    pub interest_type: InterestType,
    pub visibility: Visibility,
    pub interested_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub profile: DbAthleteProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterestedAthlete {
    pub interest_id: i64,
    pub interest_type: InterestType,
    pub visibility: Visibility,
    pub interested_at: DateTime<Utc>,
    pub athlete: AthleteProfile,
}

impl From<DbInterestedAthlete> for InterestedAthlete {
    fn from(db: DbInterestedAthlete) -> Self {
        Self {
            interest_id: db.interest_id,
            interest_type: db.interest_type,
            visibility: db.visibility,
            interested_at: db.interested_at,
            athlete: AthleteProfile::from(db.profile),
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct DbSavedAthlete {
    pub saved_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub profile: DbAthleteProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedAthlete {
    pub saved_at: DateTime<Utc>,
    pub athlete: AthleteProfile,
}

impl From<DbSavedAthlete> for SavedAthlete {
    fn from(db: DbSavedAthlete) -> Self {
        Self {
            saved_at: db.saved_at,
            athlete: AthleteProfile::from(db.profile),
        }
    }
}
