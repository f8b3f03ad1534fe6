use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// The TOML file structure for hydra.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub search: Option<SearchConfig>,
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    pub provider: Option<String>,
    pub max_results: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    pub max_subtasks: Option<usize>,
    pub subtask_timeout_secs: Option<u64>,
    pub global_deadline_secs: Option<u64>,
}

/// Which search backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    /// Zero-config HTML scraping of the DuckDuckGo lite endpoint.
    DuckDuckGo,
    /// Brave Search REST API. Requires `BRAVE_API_KEY`.
    Brave,
}

impl FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(SearchProvider::DuckDuckGo),
            "brave" => Ok(SearchProvider::Brave),
            other => Err(format!(
                "unknown search provider '{other}' (expected \"duckduckgo\" or \"brave\")"
            )),
        }
    }
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub search_provider: SearchProvider,
    pub brave_api_key: Option<String>,
    pub max_subtasks: usize,
    pub max_results: usize,
    pub subtask_timeout: Duration,
    pub global_deadline: Duration,
    pub search_timeout: Duration,
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub model: Option<String>,
    pub search_provider: Option<SearchProvider>,
    pub brave_api_key: Option<String>,
    pub max_subtasks: Option<usize>,
    pub max_results: Option<usize>,
    pub subtask_timeout_secs: Option<u64>,
    pub global_deadline_secs: Option<u64>,
    pub search_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Flatten the sectioned file structure into a PartialConfig.
    /// An unrecognized provider name in the file is ignored (with a warning)
    /// rather than failing the whole merge.
    pub fn to_partial(self) -> PartialConfig {
        let general = self.general;
        let search = self.search;
        let limits = self.limits;

        let search_provider = search
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .and_then(|raw| match raw.parse::<SearchProvider>() {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!("Ignoring config file provider: {e}");
                    None
                }
            });

        PartialConfig {
            model: general.and_then(|g| g.model),
            search_provider,
            brave_api_key: None,
            max_subtasks: limits.as_ref().and_then(|l| l.max_subtasks),
            max_results: search.as_ref().and_then(|s| s.max_results),
            subtask_timeout_secs: limits.as_ref().and_then(|l| l.subtask_timeout_secs),
            global_deadline_secs: limits.as_ref().and_then(|l| l.global_deadline_secs),
            search_timeout_secs: search.as_ref().and_then(|s| s.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_names() {
        assert_eq!(
            "duckduckgo".parse::<SearchProvider>().unwrap(),
            SearchProvider::DuckDuckGo
        );
        assert_eq!(
            "DDG".parse::<SearchProvider>().unwrap(),
            SearchProvider::DuckDuckGo
        );
        assert_eq!(
            " Brave ".parse::<SearchProvider>().unwrap(),
            SearchProvider::Brave
        );
    }

    #[test]
    fn provider_rejects_unknown_names() {
        let err = "tavily".parse::<SearchProvider>().unwrap_err();
        assert!(err.contains("tavily"));
    }

    #[test]
    fn config_file_flattens_to_partial() {
        let file: ConfigFile = toml::from_str(
            r#"
            [general]
            model = "gemini-2.0-flash"

            [search]
            provider = "brave"
            max_results = 3

            [limits]
            max_subtasks = 2
            global_deadline_secs = 90
            "#,
        )
        .unwrap();

        let partial = file.to_partial();
        assert_eq!(partial.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(partial.search_provider, Some(SearchProvider::Brave));
        assert_eq!(partial.max_results, Some(3));
        assert_eq!(partial.max_subtasks, Some(2));
        assert_eq!(partial.global_deadline_secs, Some(90));
        assert_eq!(partial.subtask_timeout_secs, None);
    }
}
