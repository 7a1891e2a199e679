use crate::constants::{API_KEY_VAR, DATABASE_URL_VAR};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";
const PLACEHOLDER_DATABASE_URL: &str = "YOUR_DATABASE_URL";

/// Connection settings for the shared remote store. Unset or placeholder values leave the game
/// running on the local store only.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteConfig {
    pub api_key: Option<String>,
    pub database_url: Option<String>,
}

impl RemoteConfig {
    pub fn new(api_key: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            database_url: Some(database_url.into()),
        }
    }

    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_VAR).ok(),
            database_url: std::env::var(DATABASE_URL_VAR).ok(),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading remote config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing remote config {}", path.display()))
    }

    pub fn is_configured(&self) -> bool {
        match (self.api_key.as_deref(), self.database_url.as_deref()) {
            (Some(key), Some(url)) => {
                !key.trim().is_empty()
                    && !url.trim().is_empty()
                    && key != PLACEHOLDER_API_KEY
                    && !url.contains(PLACEHOLDER_DATABASE_URL)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_not_configured() {
        assert!(!RemoteConfig::default().is_configured());
        assert!(!RemoteConfig::new("YOUR_API_KEY", "https://db.example").is_configured());
        assert!(!RemoteConfig::new("k", "https://YOUR_DATABASE_URL.example").is_configured());
        assert!(!RemoteConfig::new("k", "  ").is_configured());
        assert!(RemoteConfig::new("k", "https://db.example").is_configured());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: RemoteConfig = serde_json::from_str(r#"{"apiKey":"k"}"#).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert!(config.database_url.is_none());
        assert!(!config.is_configured());
    }
}
