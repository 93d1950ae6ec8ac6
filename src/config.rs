//! Runtime configuration.
//!
//! Loaded from a YAML file where every field is optional; missing fields fall
//! back to the defaults below. `CRM_DATABASE_PATH` and `CRM_LOG_DIR` override
//! the file when set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

pub const ENV_DATABASE_PATH: &str = "CRM_DATABASE_PATH";
pub const ENV_LOG_DIR: &str = "CRM_LOG_DIR";

const DEFAULT_DATABASE_FILE: &str = "courtier-crm.sqlite";
const DEFAULT_LOG_DIRECTIVES: &str = "info,app::engagement=debug,app::suggestions=debug,app::db=info";

/// Upper bound for `suggestions.recent_window_days` (100 years).
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;
/// Upper bound for `engagement.interaction_sample_limit`.
pub const MAX_INTERACTION_SAMPLE_LIMIT: usize = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct CrmConfig {
    pub database_path: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_directives: String,
    pub engagement: EngagementConfig,
    pub suggestions: SuggestionConfig,
    pub confidence: ConfidenceTable,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            log_dir: None,
            log_directives: DEFAULT_LOG_DIRECTIVES.to_string(),
            engagement: EngagementConfig::default(),
            suggestions: SuggestionConfig::default(),
            confidence: ConfidenceTable::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct EngagementConfig {
    /// How many of the newest interactions are fetched for scoring.
    pub interaction_sample_limit: usize,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            interaction_sample_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct SuggestionConfig {
    /// Trailing window, in days, that counts as "recent" for the follow-up rule.
    pub recent_window_days: i64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            recent_window_days: 30,
        }
    }
}

/// Fixed confidence values, one per output kind.
///
/// None of these are derived from data. Replacing them with a model only
/// needs to change this table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct ConfidenceTable {
    pub engagement: f64,
    pub follow_up: f64,
    pub cross_sell: f64,
    pub action: f64,
}

impl Default for ConfidenceTable {
    fn default() -> Self {
        Self {
            engagement: 0.85,
            follow_up: 0.8,
            cross_sell: 0.75,
            action: 0.7,
        }
    }
}

impl ConfidenceTable {
    fn validate(&self) -> AppResult<()> {
        let entries = [
            ("engagement", self.engagement),
            ("follow_up", self.follow_up),
            ("cross_sell", self.cross_sell),
            ("action", self.action),
        ];
        for (name, value) in entries {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::config(format!(
                    "confidence.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl CrmConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            AppError::config(format!("cannot read {}: {err}", path.display()))
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        info!(target: "app::config", config_path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var_os(ENV_DATABASE_PATH).map(PathBuf::from),
            std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
        );
    }

    fn apply_overrides(&mut self, database_path: Option<PathBuf>, log_dir: Option<PathBuf>) {
        if let Some(path) = database_path.filter(|p| !p.as_os_str().is_empty()) {
            self.database_path = path;
        }
        if let Some(dir) = log_dir.filter(|p| !p.as_os_str().is_empty()) {
            self.log_dir = Some(dir);
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(AppError::config("database_path must not be empty"));
        }
        let sample = self.engagement.interaction_sample_limit;
        if !(1..=MAX_INTERACTION_SAMPLE_LIMIT).contains(&sample) {
            return Err(AppError::config(format!(
                "engagement.interaction_sample_limit must be within [1, {MAX_INTERACTION_SAMPLE_LIMIT}], got {sample}"
            )));
        }
        let window = self.suggestions.recent_window_days;
        if !(1..=MAX_RECENT_WINDOW_DAYS).contains(&window) {
            return Err(AppError::config(format!(
                "suggestions.recent_window_days must be within [1, {MAX_RECENT_WINDOW_DAYS}], got {window}"
            )));
        }
        self.confidence.validate()
    }
}
