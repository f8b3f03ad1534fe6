use std::time::Duration;

use super::schema::{AppConfig, PartialConfig, SearchProvider};
use crate::error::ConfigError;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            model: self.model.or(fallback.model),
            search_provider: self.search_provider.or(fallback.search_provider),
            brave_api_key: self.brave_api_key.or(fallback.brave_api_key),
            max_subtasks: self.max_subtasks.or(fallback.max_subtasks),
            max_results: self.max_results.or(fallback.max_results),
            subtask_timeout_secs: self.subtask_timeout_secs.or(fallback.subtask_timeout_secs),
            global_deadline_secs: self.global_deadline_secs.or(fallback.global_deadline_secs),
            search_timeout_secs: self.search_timeout_secs.or(fallback.search_timeout_secs),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults and
    /// validating the result. Fails fast (before any request work begins)
    /// when the resolved configuration cannot dispatch a single subtask.
    pub fn finalize(self) -> Result<AppConfig, ConfigError> {
        let search_provider = self.search_provider.unwrap_or(SearchProvider::DuckDuckGo);
        let brave_api_key = self.brave_api_key;

        if search_provider == SearchProvider::Brave && brave_api_key.is_none() {
            return Err(ConfigError::Missing("BRAVE_API_KEY"));
        }

        let max_subtasks = self.max_subtasks.unwrap_or(4);
        if max_subtasks == 0 {
            return Err(ConfigError::Invalid {
                key: "max_subtasks",
                message: "must be at least 1".to_string(),
            });
        }

        let max_results = self.max_results.unwrap_or(5);
        if max_results == 0 {
            return Err(ConfigError::Invalid {
                key: "max_results",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(AppConfig {
            model: self
                .model
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            search_provider,
            brave_api_key,
            max_subtasks,
            max_results,
            subtask_timeout: Duration::from_secs(self.subtask_timeout_secs.unwrap_or(60)),
            global_deadline: Duration::from_secs(self.global_deadline_secs.unwrap_or(120)),
            search_timeout: Duration::from_secs(self.search_timeout_secs.unwrap_or(15)),
        })
    }
}
