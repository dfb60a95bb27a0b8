//! Configuration loader: .env file, then a TOML file, then env vars.

use std::path::{Path, PathBuf};

use common::config::{BatchPolicy, UnavailablePolicy};
use common::{Error, ScoutConfig};

const DEFAULT_CONFIG_FILE: &str = "scout.toml";

/// Load scout configuration.
///
/// Precedence, lowest first: built-in defaults, the TOML file (`path`, else
/// `SCOUT_CONFIG`, else `scout.toml` when present), then `SCOUT_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<ScoutConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults, then the config file if one applies.
    let mut config = match config_path(path) {
        Some(file) => {
            let contents = std::fs::read_to_string(&file).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", file.display(), e))
            })?;
            tracing::debug!("Loaded config from {}", file.display());
            ScoutConfig::parse_toml(&contents)?
        }
        None => ScoutConfig::default(),
    };

    // 3. Override with environment variables (highest priority).
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    // 4. Validate.
    config.validate()?;
    Ok(config)
}

/// An explicit path must exist; the default file is optional.
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(raw) = std::env::var("SCOUT_CONFIG") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    fallback.exists().then(|| fallback.to_path_buf())
}

fn apply_env_overrides<F>(config: &mut ScoutConfig, lookup: F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(category) = lookup("SCOUT_CATEGORY") {
        config.ranking.category = category;
    }
    if let Some(flag) = lookup("SCOUT_INCLUDE_DELIVERY") {
        config.ranking.include_delivery = flag != "0" && flag.to_lowercase() != "false";
    }
    if let Some(raw) = lookup("SCOUT_UNAVAILABLE_POLICY") {
        config.ranking.unavailable_policy = raw.parse::<UnavailablePolicy>()?;
    }
    if let Some(raw) = lookup("SCOUT_BATCH_POLICY") {
        config.ranking.batch_policy = raw.parse::<BatchPolicy>()?;
    }
    Ok(())
}
