//! TOML-driven gateway settings.
//!
//! Settings are declared in a TOML file and loaded at startup; every field
//! has a default so an empty document is valid.  The backend base URL can
//! also be overridden through the `CARELOG_API_URL` environment variable,
//! which wins over both the default and the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use carelog_contracts::error::{CarelogError, CarelogResult};

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "CARELOG_API_URL";

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_frequency_presets() -> Vec<String> {
    // Suggestions shown next to the frequency input. Free text is still
    // accepted; this list never validates anything.
    vec![
        "1x/week".to_string(),
        "2x/week".to_string(),
        "3x/week".to_string(),
        "5x/week".to_string(),
        "daily".to_string(),
    ]
}

/// Gateway configuration loaded from TOML and the environment.
///
/// Example:
/// ```toml
/// base_url = "https://api.practice.example"
/// timeout_secs = 10
/// frequency_presets = ["1x/week", "3x/week"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Backend base URL. Default `http://localhost:8000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Frequency suggestions offered by the disciplines view.
    #[serde(default = "default_frequency_presets")]
    pub frequency_presets: Vec<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            frequency_presets: default_frequency_presets(),
        }
    }
}

impl GatewaySettings {
    /// Parse `s` as TOML settings.
    ///
    /// Returns `CarelogError::Config` if the TOML is malformed or does not
    /// match the expected shape.
    pub fn from_toml_str(s: &str) -> CarelogResult<Self> {
        let settings: GatewaySettings =
            toml::from_str(s).map_err(|e| CarelogError::Config {
                reason: format!("failed to parse gateway settings TOML: {}", e),
            })?;
        Ok(settings)
    }

    /// Read the file at `path` and parse it as TOML settings.
    pub fn from_file(path: &Path) -> CarelogResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CarelogError::Config {
            reason: format!("failed to read settings file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env();
        settings
    }

    /// Apply environment overrides to already-loaded settings.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// An empty document yields the defaults.
    #[test]
    fn test_empty_toml_yields_defaults() {
        let settings = GatewaySettings::from_toml_str("").unwrap();
        assert_eq!(settings.base_url, "http://localhost:8000");
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.frequency_presets.contains(&"3x/week".to_string()));
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let toml = r#"
            base_url = "https://api.practice.example"
        "#;
        let settings = GatewaySettings::from_toml_str(toml).unwrap();
        assert_eq!(settings.base_url, "https://api.practice.example");
        assert_eq!(settings.timeout_secs, 30);
    }

    /// Malformed TOML must produce a `CarelogError::Config`.
    #[test]
    fn test_toml_parse_error() {
        let bad_toml = r#"
            this is not valid toml ][[[
        "#;

        let result = GatewaySettings::from_toml_str(bad_toml);

        match result {
            Err(CarelogError::Config { reason }) => {
                assert!(
                    reason.contains("failed to parse gateway settings TOML"),
                    "expected parse error message, got: {reason}"
                );
            }
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_env_override_wins() {
        std::env::set_var(API_URL_ENV, "http://env-host:9000");
        let settings = GatewaySettings::from_env();
        std::env::remove_var(API_URL_ENV);

        assert_eq!(settings.base_url, "http://env-host:9000");
    }
}
