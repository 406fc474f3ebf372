use serde::Serialize;

use crate::models::AthleteProfileInput;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletenessReport {
    pub score: i32,
    pub missing_fields: Vec<&'static str>,
}

pub const MAX_SCORE: i32 = 100;

// Weights add up to 114, so a full profile is capped at MAX_SCORE.
// Adding a field here does not rescale rows saved earlier.
const FIELD_WEIGHTS: &[(&str, i32)] = &[
    ("first_name", 14),
    ("last_name", 14),
    ("sport", 14),
    ("grad_year", 14),
    ("city", 14),
    ("state", 14),
    ("gpa", 14),
    ("positions", 14),
    ("bio", 2),
];

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn is_filled(profile: &AthleteProfileInput, field: &str) -> bool {
    match field {
        "first_name" => has_text(&profile.first_name),
        "last_name" => has_text(&profile.last_name),
        "sport" => has_text(&profile.sport),
        "grad_year" => profile.grad_year.is_some_and(|year| year != 0),
        "city" => has_text(&profile.city),
        "state" => has_text(&profile.state),
        "gpa" => profile.gpa.is_some_and(|gpa| gpa != 0.0),
        "positions" => !profile.positions.is_empty(),
        "bio" => has_text(&profile.bio),
        _ => false,
    }
}

pub fn completeness_report(profile: &AthleteProfileInput) -> CompletenessReport {
    let mut score = 0;
    let mut missing_fields = Vec::new();

    for (field, weight) in FIELD_WEIGHTS {
        if is_filled(profile, field) {
            score += weight;
        } else {
            missing_fields.push(*field);
        }
    }

    CompletenessReport {
        score: score.min(MAX_SCORE),
        missing_fields,
    }
}

pub fn profile_completeness(profile: &AthleteProfileInput) -> i32 {
    completeness_report(profile).score
}
