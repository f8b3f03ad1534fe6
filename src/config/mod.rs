pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::{Cli, Commands};
use crate::error::ConfigError;
use anyhow::Context;
use std::path::Path;
use std::str::FromStr;

/// Load configuration by merging CLI, environment, and global-file sources.
/// Precedence: CLI > environment > global config file > defaults.
///
/// A missing config file is handled gracefully (defaults apply); invalid
/// resolved values fail fast with [`ConfigError`].
pub fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    // Layer 1: Global config (~/.config/hydra/hydra.toml or platform equivalent)
    let global = load_global_config();

    // Layer 2: Environment variables
    let env = env_to_partial();

    // Layer 3: CLI args (converted to PartialConfig)
    let cli_partial = cli_to_partial(cli);

    cli_partial.with_fallback(env).with_fallback(global).finalize()
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    let path = global_config_path();
    match path {
        Some(p) => load_toml_file(&p).unwrap_or_default(),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns None on file-not-found; logs parse errors instead of propagating.
fn load_toml_file(path: &Path) -> Option<PartialConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            match toml::from_str::<ConfigFile>(&contents)
                .context(format!("Failed to parse {}", path.display()))
            {
                Ok(config_file) => {
                    tracing::info!("Loaded config from {}", path.display());
                    Some(config_file.to_partial())
                }
                Err(e) => {
                    tracing::warn!("Config parse error: {:#}", e);
                    None
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to read config at {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/hydra/hydra.toml
/// macOS: ~/Library/Application Support/hydra/hydra.toml
fn global_config_path() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("", "", "hydra")
        .map(|dirs| dirs.config_dir().join("hydra.toml"))
}

/// Read configuration from environment variables.
///
/// `BRAVE_API_KEY` only enters config through this layer; the model
/// provider's own API keys are read by the genai client directly.
fn env_to_partial() -> PartialConfig {
    PartialConfig {
        model: env_var("HYDRA_MODEL"),
        search_provider: env_var("HYDRA_SEARCH_PROVIDER")
            .and_then(|raw| match SearchProvider::from_str(&raw) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!("Ignoring HYDRA_SEARCH_PROVIDER: {e}");
                    None
                }
            }),
        brave_api_key: env_var("BRAVE_API_KEY"),
        max_subtasks: env_parse("HYDRA_MAX_SUBTASKS"),
        max_results: env_parse("HYDRA_MAX_RESULTS"),
        subtask_timeout_secs: env_parse("HYDRA_SUBTASK_TIMEOUT_SECS"),
        global_deadline_secs: env_parse("HYDRA_GLOBAL_DEADLINE_SECS"),
        search_timeout_secs: env_parse("HYDRA_SEARCH_TIMEOUT_SECS"),
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_var(key)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {key}={raw}");
            None
        }
    }
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    match &cli.command {
        Commands::Ask {
            model,
            provider,
            max_subtasks,
            subtask_timeout,
            deadline,
            ..
        } => PartialConfig {
            model: model.clone(),
            search_provider: provider
                .as_deref()
                .and_then(|raw| match SearchProvider::from_str(raw) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::warn!("Ignoring --provider: {e}");
                        None
                    }
                }),
            max_subtasks: *max_subtasks,
            subtask_timeout_secs: *subtask_timeout,
            global_deadline_secs: *deadline,
            ..Default::default()
        },
    }
}
