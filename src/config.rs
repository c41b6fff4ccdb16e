//! Runtime configuration read from the environment (and `.env` via dotenvy in `main`).

use crate::error::ConfigError;
use crate::types::ResponseMode;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/call-api";
pub const DEFAULT_PLACEHOLDER: &str = "Processing your request";
const DEFAULT_CHUNK_DELAY_MS: u64 = 50;

/// Text clean-up applied to every decoded stream chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamFilter {
    /// Strip a leading `data: ` from each chunk.
    pub strip_event_prefix: bool,
    /// Status phrase removed from the accumulated text, matched case-insensitively.
    pub placeholder: Option<String>,
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self {
            strip_event_prefix: true,
            placeholder: Some(DEFAULT_PLACEHOLDER.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub endpoint: String,
    pub response_mode: ResponseMode,
    /// Pause after each published chunk; zero disables pacing.
    pub chunk_delay: Duration,
    pub filter: StreamFilter,
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            response_mode: ResponseMode::default(),
            chunk_delay: Duration::from_millis(DEFAULT_CHUNK_DELAY_MS),
            filter: StreamFilter::default(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("AGENTDESK_ENDPOINT") {
            let endpoint = endpoint.trim();
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    var: "AGENTDESK_ENDPOINT",
                    value: endpoint.to_string(),
                    expected: "an http:// or https:// URL",
                });
            }
            config.endpoint = endpoint.to_string();
        }

        if let Some(raw) = lookup("AGENTDESK_RESPONSE_MODE") {
            config.response_mode =
                ResponseMode::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                    var: "AGENTDESK_RESPONSE_MODE",
                    value: raw.clone(),
                    expected: "json or stream",
                })?;
        }

        if let Some(raw) = lookup("AGENTDESK_CHUNK_DELAY_MS") {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid {
                    var: "AGENTDESK_CHUNK_DELAY_MS",
                    value: raw.clone(),
                    expected: "milliseconds as a whole number",
                })?;
            config.chunk_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("AGENTDESK_STRIP_EVENT_PREFIX") {
            config.filter.strip_event_prefix =
                parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                    var: "AGENTDESK_STRIP_EVENT_PREFIX",
                    value: raw.clone(),
                    expected: "true or false",
                })?;
        }

        if let Some(raw) = lookup("AGENTDESK_PLACEHOLDER") {
            let phrase = raw.trim();
            config.filter.placeholder = if phrase.is_empty() || phrase.eq_ignore_ascii_case("off")
            {
                None
            } else {
                Some(phrase.to_string())
            };
        }

        if let Some(dir) = lookup("AGENTDESK_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(dir.trim()));
            }
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.chunk_delay, Duration::from_millis(50));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("AGENTDESK_ENDPOINT", "http://localhost:9000/call-api"),
            ("AGENTDESK_RESPONSE_MODE", "json"),
            ("AGENTDESK_CHUNK_DELAY_MS", "0"),
            ("AGENTDESK_STRIP_EVENT_PREFIX", "No"),
            ("AGENTDESK_PLACEHOLDER", "off"),
        ])
        .unwrap();
        assert_eq!(config.endpoint, "http://localhost:9000/call-api");
        assert_eq!(config.response_mode, ResponseMode::Json);
        assert_eq!(config.chunk_delay, Duration::ZERO);
        assert!(!config.filter.strip_event_prefix);
        assert_eq!(config.filter.placeholder, None);
    }

    #[test]
    fn rejects_bad_values() {
        let err = config_from(&[("AGENTDESK_CHUNK_DELAY_MS", "fast")]).unwrap_err();
        assert!(err.to_string().contains("AGENTDESK_CHUNK_DELAY_MS"));
        assert!(config_from(&[("AGENTDESK_ENDPOINT", "127.0.0.1:8000")]).is_err());
        assert!(config_from(&[("AGENTDESK_RESPONSE_MODE", "sse")]).is_err());
    }
}
