//! Environment-based settings.
//!
//! All configuration comes from environment variables, optionally seeded
//! from a `KEY=VALUE` env file named by `PARKDAILY_ENV_FILE` (real env
//! vars always win over file values). Required credentials missing at
//! startup are fatal: the process refuses to start rather than run
//! degraded.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Environment variables that must be present for any run.
const REQUIRED_VARS: &[&str] = &["NPS_API_KEY"];

/// All environment-based configuration for the digest pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    /// NPS developer API key, used by the alert/event/campground providers.
    pub nps_api_key: String,
    /// Four-letter NPS park code the digest is generated for.
    pub park_code: String,
    /// Deployment environment, recorded in every run report.
    pub environment: String,
    /// User-Agent sent to upstream APIs that require one (NWS does).
    pub user_agent: String,
}

impl Settings {
    /// Load settings from the process environment, seeded from the env
    /// file named by `PARKDAILY_ENV_FILE` if that variable is set.
    pub fn load() -> Result<Self, ConfigError> {
        let mut seed = BTreeMap::new();
        if let Ok(path) = std::env::var("PARKDAILY_ENV_FILE") {
            seed = read_env_file(Path::new(&path))?;
        }
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| seed.get(key).cloned()))
    }

    /// Build settings from an arbitrary key lookup. Pure; the seam unit
    /// tests use instead of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|var| lookup(var).map_or(true, |v| v.is_empty()))
            .map(|var| (*var).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars { missing });
        }

        let get_or = |key: &str, default: &str| {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            nps_api_key: lookup("NPS_API_KEY").unwrap_or_default(),
            park_code: get_or("PARK_CODE", "glac"),
            environment: get_or("ENVIRONMENT", "development"),
            user_agent: get_or("PARKDAILY_USER_AGENT", "parkdaily/1.0 (ops@parkdaily.local)"),
        })
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Parse a `KEY=VALUE` env file. Blank lines and `#` comments are
/// skipped; values may be single- or double-quoted.
fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::EnvFile {
        path: path.display().to_string(),
        source,
    })?;

    let mut vars = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            vars.insert(key.trim().to_string(), value.to_string());
        }
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(map: &'a BTreeMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn missing_required_var_is_fatal() {
        let map = BTreeMap::new();
        let err = Settings::from_lookup(lookup_from(&map)).unwrap_err();
        match err {
            ConfigError::MissingVars { missing } => {
                assert_eq!(missing, vec!["NPS_API_KEY".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_required_var_counts_as_missing() {
        let map = BTreeMap::from([("NPS_API_KEY", "")]);
        assert!(Settings::from_lookup(lookup_from(&map)).is_err());
    }

    #[test]
    fn optional_vars_fall_back_to_defaults() {
        let map = BTreeMap::from([("NPS_API_KEY", "k123")]);
        let settings = Settings::from_lookup(lookup_from(&map)).unwrap();
        assert_eq!(settings.nps_api_key, "k123");
        assert_eq!(settings.park_code, "glac");
        assert_eq!(settings.environment, "development");
        assert!(!settings.is_production());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let map = BTreeMap::from([
            ("NPS_API_KEY", "k123"),
            ("PARK_CODE", "yell"),
            ("ENVIRONMENT", "production"),
        ]);
        let settings = Settings::from_lookup(lookup_from(&map)).unwrap();
        assert_eq!(settings.park_code, "yell");
        assert!(settings.is_production());
    }

    #[test]
    fn env_file_parsing_handles_comments_and_quotes() {
        let td = tempfile::TempDir::new().unwrap();
        let path = td.path().join("test.env");
        fs::write(
            &path,
            "# secrets\nNPS_API_KEY=\"k123\"\n\nPARK_CODE='yell'\nBAD LINE\n",
        )
        .unwrap();

        let vars = read_env_file(&path).unwrap();
        assert_eq!(vars.get("NPS_API_KEY").unwrap(), "k123");
        assert_eq!(vars.get("PARK_CODE").unwrap(), "yell");
        assert!(!vars.contains_key("BAD LINE"));
    }

    #[test]
    fn env_file_missing_is_an_error() {
        let err = read_env_file(Path::new("/nonexistent/path.env")).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }
}
