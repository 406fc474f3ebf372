use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;

use crate::error::AppError;

use super::{Permission, Role};

const SESSION_TOKEN_LENGTH: usize = 48;

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub email_confirmed: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(user: DbUser) -> Result<Self, Self::Error> {
        let role = Role::from_str(&user.role)
            .map_err(|e| AppError::Internal(format!("Stored user {} has {}", user.id, e)))?;

        Ok(Self {
            id: user.id,
            email: user.email,
            role,
            email_confirmed: user.email_confirmed_at.is_some(),
        })
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "{} accounts cannot do this",
                self.role
            )))
        }
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.id, role = %self.role, required = %role, "Wrong role");
            Err(AppError::Authorization(format!("Only {} accounts can do this", role)))
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUserSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<DbUserSession> for UserSession {
    fn from(session: DbUserSession) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            token: session.token,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

impl UserSession {
    pub fn generate_token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}
