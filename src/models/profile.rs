use chrono::{DateTime, NaiveDate, Utc};
use rocket::FromFormField;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{STATE_CODE, validate_not_blank, validate_positions};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, FromFormField,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SourceType {
    SelfReported,
    SourceLink,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StatVerification {
    SelfReported,
    SourceProvided,
    Verified,
}

// One-way: nothing in the service ever promotes a stat after insert.
impl From<SourceType> for StatVerification {
    fn from(source: SourceType) -> Self {
        match source {
            SourceType::SelfReported => StatVerification::SelfReported,
            SourceType::SourceLink | SourceType::Upload => StatVerification::SourceProvided,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct AthleteProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sport: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_positions"))]
    pub positions: Vec<String>,
    #[validate(range(min = 2020, max = 2030, message = "Graduation year must be between 2020 and 2030"))]
    pub grad_year: Option<i32>,
    pub city: Option<String>,
    #[validate(regex(path = *STATE_CODE, message = "State must be a two-letter code"))]
    pub state: Option<String>,
    #[validate(length(max = 1000, message = "Bio must be less than 1000 characters"))]
    pub bio: Option<String>,
    #[validate(range(min = 0.0, max = 4.0, message = "GPA must be between 0 and 4.0"))]
    pub gpa: Option<f64>,
    #[validate(range(min = 400, max = 1600, message = "SAT score must be between 400 and 1600"))]
    pub sat_score: Option<i32>,
    #[validate(range(min = 1, max = 36, message = "ACT score must be between 1 and 36"))]
    pub act_score: Option<i32>,
    #[validate(range(min = 4, max = 7, message = "Height must be between 4 and 7 feet"))]
    pub height_feet: Option<i32>,
    #[validate(range(min = 0, max = 11, message = "Inches must be between 0 and 11"))]
    pub height_inches: Option<i32>,
    #[validate(range(min = 50, max = 500, message = "Weight must be between 50 and 500"))]
    pub weight: Option<i32>,
    pub is_public: Option<bool>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AthleteProfileInput {
    /// Trims text fields and treats empty strings as unset, the way the onboarding form submits them.
    pub fn normalized(self) -> Self {
        Self {
            first_name: non_empty(self.first_name),
            last_name: non_empty(self.last_name),
            sport: non_empty(self.sport),
            positions: self
                .positions
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            city: non_empty(self.city),
            state: non_empty(self.state).map(|s| s.to_uppercase()),
            bio: non_empty(self.bio),
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AthleteProfile {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sport: Option<String>,
    pub positions: Vec<String>,
    pub grad_year: Option<i32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bio: Option<String>,
    pub gpa: Option<f64>,
    pub sat_score: Option<i32>,
    pub act_score: Option<i32>,
    pub height_feet: Option<i32>,
    pub height_inches: Option<i32>,
    pub weight: Option<i32>,
    pub is_public: bool,
    pub profile_completeness: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAthleteProfile {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sport: Option<String>,
    pub positions: String,
    pub grad_year: Option<i32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bio: Option<String>,
    pub gpa: Option<f64>,
    pub sat_score: Option<i32>,
    pub act_score: Option<i32>,
    pub height_feet: Option<i32>,
    pub height_inches: Option<i32>,
    pub weight: Option<i32>,
    pub is_public: bool,
    pub profile_completeness: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAthleteProfile> for AthleteProfile {
    fn from(db: DbAthleteProfile) -> Self {
        Self {
            user_id: db.user_id,
            first_name: db.first_name,
            last_name: db.last_name,
            sport: db.sport,
            positions: serde_json::from_str(&db.positions).unwrap_or_default(),
            grad_year: db.grad_year,
            city: db.city,
            state: db.state,
            bio: db.bio,
            gpa: db.gpa,
            sat_score: db.sat_score,
            act_score: db.act_score,
            height_feet: db.height_feet,
            height_inches: db.height_inches,
            weight: db.weight,
            is_public: db.is_public,
            profile_completeness: db.profile_completeness,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl AthleteProfile {
    pub fn as_input(&self) -> AthleteProfileInput {
        AthleteProfileInput {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            sport: self.sport.clone(),
            positions: self.positions.clone(),
            grad_year: self.grad_year,
            city: self.city.clone(),
            state: self.state.clone(),
            bio: self.bio.clone(),
            gpa: self.gpa,
            sat_score: self.sat_score,
            act_score: self.act_score,
            height_feet: self.height_feet,
            height_inches: self.height_inches,
            weight: self.weight,
            is_public: Some(self.is_public),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CampInput {
    #[validate(length(min = 1, message = "Camp name is required"))]
    pub name: String,
    pub location: Option<String>,
    pub event_date: Option<NaiveDate>,
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CoachProfileInput {
    #[validate(length(min = 1, message = "School is required"), custom(function = "validate_not_blank"))]
    pub school: String,
    pub school_id: Option<i64>,
    #[validate(length(min = 1, message = "Title is required"), custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    pub sports: Vec<String>,
    #[validate(length(max = 2000, message = "Must be less than 2000 characters"))]
    pub looking_for: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub camps: Vec<CampInput>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Camp {
    pub id: i64,
    pub position: i64,
    pub name: String,
    pub location: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachProfile {
    pub user_id: i64,
    pub school: String,
    pub school_id: Option<i64>,
    pub title: String,
    pub sports: Vec<String>,
    pub looking_for: Option<String>,
    pub verification_status: VerificationStatus,
    pub camps: Vec<Camp>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCoachProfile {
    pub user_id: i64,
    pub school: String,
    pub school_id: Option<i64>,
    pub title: String,
    pub sports: String,
    pub looking_for: Option<String>,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbCoachProfile> for CoachProfile {
    fn from(db: DbCoachProfile) -> Self {
        Self {
            user_id: db.user_id,
            school: db.school,
            school_id: db.school_id,
            title: db.title,
            sports: serde_json::from_str(&db.sports).unwrap_or_default(),
            looking_for: db.looking_for,
            verification_status: db.verification_status,
            camps: Vec::new(),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl CoachProfile {
    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }

    /// "School - Title", the label athletes see for a coach.
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.school, self.title)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HighlightInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(url(message = "Invalid URL"))]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Highlight {
    pub id: i64,
    pub athlete_user_id: i64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatInput {
    #[validate(length(min = 1, message = "Season is required"))]
    pub season: String,
    #[validate(length(min = 1, message = "Stat key is required"))]
    pub stat_key: String,
    #[validate(length(min = 1, message = "Stat value is required"))]
    pub stat_value: String,
    pub source_type: SourceType,
    #[validate(url(message = "Invalid URL"))]
    pub source_url: Option<String>,
}

impl StatInput {
    pub fn normalized(self) -> Self {
        Self {
            source_url: non_empty(self.source_url),
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Stat {
    pub id: i64,
    pub athlete_user_id: i64,
    pub season: String,
    pub stat_key: String,
    pub stat_value: String,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub verification_status: StatVerification,
    pub created_at: DateTime<Utc>,
}
