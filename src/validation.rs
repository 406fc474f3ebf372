use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use validator::{Validate, ValidationError};

pub type ApiResult<T> = Result<T, Custom<Json<ValidationResponse>>>;

pub static STATE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationResponse {
    pub status: String,
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResponse {
    pub fn new(errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            status: "error".to_string(),
            errors,
        }
    }

    pub fn with_error(field: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::new(errors)
    }
}

pub trait ToValidationResponse {
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>>;
}

impl ToValidationResponse for AppError {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        self.log_and_record("API Validation Error");
        let status = self.status_code();

        let (field, message) = match &self {
            AppError::Database(sqlx::Error::RowNotFound) => {
                ("resource", "Not found: requested record does not exist".to_string())
            }
            AppError::Database(_) => ("database", "A database error occurred".to_string()),
            AppError::Authentication(msg) => {
                ("authentication", format!("Authentication error: {}", msg))
            }
            AppError::Authorization(msg) => {
                ("authorization", format!("Permission denied: {}", msg))
            }
            AppError::NotFound(msg) => ("resource", format!("Not found: {}", msg)),
            AppError::Validation(msg) => ("request", msg.clone()),
            AppError::Conflict(msg) => ("resource", msg.clone()),
            AppError::SetupRequired(msg) => ("setup", msg.clone()),
            AppError::ExternalService(msg) => ("service", format!("Service error: {}", msg)),
            AppError::Internal(_) => ("server", "Internal server error".to_string()),
        };

        Custom(status, Json(ValidationResponse::with_error(field, &message)))
    }
}

impl ToValidationResponse for Status {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        let (field, message) = match self.code {
            403 => (
                "permission",
                "You don't have permission to perform this action",
            ),
            401 => ("authentication", "Authentication required"),
            404 => ("resource", "Resource not found"),
            409 => ("resource", "Resource already exists"),
            400 => ("request", "Bad request"),
            422 => ("validation", "Validation failed"),
            500 => ("server", "Internal server error"),
            503 => ("service", "Service unavailable"),
            _ => ("error", "An error occurred"),
        };

        Custom(self, Json(ValidationResponse::with_error(field, message)))
    }
}

impl From<AppError> for Custom<Json<ValidationResponse>> {
    fn from(error: AppError) -> Self {
        error.to_validation_response()
    }
}

#[derive(Debug)]
pub struct ValidationErrorWrapper(pub validator::ValidationErrors);

impl From<ValidationErrorWrapper> for Custom<Json<ValidationResponse>> {
    #[instrument]
    fn from(wrapper: ValidationErrorWrapper) -> Self {
        let errors = wrapper.0;
        let mut error_map = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let error_messages: Vec<String> = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .clone()
                        .unwrap_or_else(|| "Invalid value".into())
                        .to_string()
                })
                .collect();

            error_map.insert(field.to_string(), error_messages);
        }

        tracing::warn!(fields = ?error_map.keys().collect::<Vec<_>>(), "Request failed validation");

        Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::new(error_map)),
        )
    }
}

/// Runs `validator` on a JSON body and hands back the inner value.
pub trait JsonValidateExt<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>> {
        let inner = self.into_inner();
        inner
            .validate()
            .map_err(|errors| Custom::from(ValidationErrorWrapper(errors)))?;
        Ok(inner)
    }
}

pub fn validate_signup_role(role: &str) -> Result<(), ValidationError> {
    match role {
        "athlete" | "coach" => Ok(()),
        _ => Err(ValidationError::new("role").with_message("Role must be athlete or coach".into())),
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Must not be blank".into()));
    }
    Ok(())
}

pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Messages are stored trimmed, so the limit applies to the trimmed body.
pub fn validate_message_body(body: &str) -> Result<(), ValidationError> {
    let length = body.trim().chars().count();
    if length == 0 || length > MAX_MESSAGE_CHARS {
        return Err(ValidationError::new("length")
            .with_message("Message must be between 1 and 5000 characters".into()));
    }
    Ok(())
}

pub fn validate_positions(positions: &[String]) -> Result<(), ValidationError> {
    if positions.iter().any(|p| p.trim().is_empty()) {
        return Err(ValidationError::new("positions")
            .with_message("Positions must not contain empty entries".into()));
    }
    Ok(())
}
