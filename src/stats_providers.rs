use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::StatInput;

/// Providers that may be registered at all. A name goes here only once the
/// data source has agreed to this use; nothing scrapes or logs in on a user's behalf.
pub const ALLOWED_PROVIDERS: &[&str] = &["manual"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSourceType {
    Api,
    FileParser,
    Manual,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsProviderParams {
    #[serde(skip)]
    pub athlete_user_id: i64,
    pub source_url: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProviderError {
    #[error("Provider \"{0}\" is not allowlisted. Add it to ALLOWED_PROVIDERS after obtaining explicit permission.")]
    NotAllowlisted(String),

    #[error("Provider \"{0}\" not found")]
    NotFound(String),

    #[error("Provider \"{0}\" is not enabled")]
    NotEnabled(String),

    #[error("Provider \"{0}\" failed: {1}")]
    Fetch(String, String),
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::NotFound(_) => AppError::NotFound(error.to_string()),
            ProviderError::NotAllowlisted(_) => AppError::Authorization(error.to_string()),
            ProviderError::NotEnabled(_) => AppError::Validation(error.to_string()),
            ProviderError::Fetch(_, _) => AppError::ExternalService(error.to_string()),
        }
    }
}

#[rocket::async_trait]
pub trait StatsProvider: Send + Sync {
    fn name(&self) -> &str;

    fn source_type(&self) -> ProviderSourceType;

    fn is_enabled(&self) -> bool;

    async fn fetch_stats(&self, params: &StatsProviderParams) -> Result<Vec<StatInput>, ProviderError>;
}

/// User-entered stats. Entry happens through the stats form, so there is nothing to fetch.
pub struct ManualProvider;

#[rocket::async_trait]
impl StatsProvider for ManualProvider {
    fn name(&self) -> &str {
        "manual"
    }

    fn source_type(&self) -> ProviderSourceType {
        ProviderSourceType::Manual
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn fetch_stats(&self, _params: &StatsProviderParams) -> Result<Vec<StatInput>, ProviderError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub name: String,
    pub source_type: ProviderSourceType,
    pub is_enabled: bool,
}

pub struct ProviderRegistry {
    allowed: Vec<String>,
    providers: HashMap<String, Arc<dyn StatsProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(ALLOWED_PROVIDERS)
    }
}

impl ProviderRegistry {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|name| name.to_string()).collect(),
            providers: HashMap::new(),
        }
    }

    /// The registry the server runs with: the default allowlist and the manual provider.
    pub fn with_builtin() -> Result<Self, ProviderError> {
        let mut registry = Self::default();
        registry.register(Arc::new(ManualProvider))?;
        Ok(registry)
    }

    fn is_allowed(&self, name: &str) -> bool {
        self.allowed.iter().any(|allowed| allowed == name)
    }

    pub fn register(&mut self, provider: Arc<dyn StatsProvider>) -> Result<(), ProviderError> {
        let name = provider.name().to_string();
        if !self.is_allowed(&name) {
            warn!(provider = %name, "Refusing to register provider outside the allowlist");
            return Err(ProviderError::NotAllowlisted(name));
        }

        info!(provider = %name, "Registered stats provider");
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn StatsProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn list_enabled(&self) -> Vec<ProviderSummary> {
        let mut enabled: Vec<ProviderSummary> = self
            .providers
            .values()
            .filter(|p| p.is_enabled())
            .map(|p| ProviderSummary {
                name: p.name().to_string(),
                source_type: p.source_type(),
                is_enabled: true,
            })
            .collect();
        enabled.sort_by(|a, b| a.name.cmp(&b.name));
        enabled
    }

    /// Checks a provider may be used right now and hands it back.
    pub fn validate_usage(&self, name: &str) -> Result<Arc<dyn StatsProvider>, ProviderError> {
        let provider = self
            .get(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;

        if !provider.is_enabled() {
            return Err(ProviderError::NotEnabled(name.to_string()));
        }

        if !self.is_allowed(name) {
            return Err(ProviderError::NotAllowlisted(name.to_string()));
        }

        Ok(provider)
    }
}
