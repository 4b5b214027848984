use folio_editor::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Overrides the `token` field when set
pub const TOKEN_ENV: &str = "FOLIO_TOKEN";

/// Folio configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the folio-server backend
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Admin token for saving and publishing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Editing session tunables (`debounceMs`, `historyCapacity`)
    #[serde(flatten)]
    pub editor: StoreOptions,
}

fn default_server_url() -> String {
    "http://127.0.0.1:3030".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            // Return default config if none exists
            Config::default()
        };

        if let Some(token) = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            config.token = Some(token);
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            token: None,
            editor: StoreOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "serverUrl": "https://cms.example.com",
            "token": "abc",
            "debounceMs": 500,
            "historyCapacity": 10
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server_url, "https://cms.example.com");
        assert_eq!(config.token, Some("abc".to_string()));
        assert_eq!(config.editor.debounce, Duration::from_millis(500));
        assert_eq!(config.editor.history_capacity, 10);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "serverUrl": "http://x" }"#).unwrap();
        assert_eq!(config.token, None);
        assert_eq!(config.editor, StoreOptions::default());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server_url, "http://127.0.0.1:3030");
        assert_eq!(config.editor.history_capacity, 50);
    }

    #[test]
    fn test_written_config_reads_back() {
        let config = Config {
            token: Some("t".to_string()),
            ..Config::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"debounceMs\": 3000"));
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }
}
