use std::env;
use std::time::Duration;

use eyre::{bail, eyre, Result, WrapErr};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://text.pollinations.ai/openai";
pub const DEFAULT_MODEL: &str = "openai";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const API_URL_VAR: &str = "CONFUCIUS_API_URL";
const MODEL_VAR: &str = "CONFUCIUS_MODEL";
const TIMEOUT_VAR: &str = "CONFUCIUS_TIMEOUT_SECS";

/// Where and how to reach the chat endpoint.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub model: String,
    /// Transport timeout for a whole request.
    pub timeout: Duration,
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Builds the config from defaults, the process environment and `overrides`.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve(overrides, |key| env::var(key).ok())
    }

    fn resolve(overrides: ConfigOverrides, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = overrides
            .api_url
            .or_else(|| lookup(API_URL_VAR))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&api_url)?;

        let model = overrides
            .model
            .or_else(|| lookup(MODEL_VAR))
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model.is_empty() {
            bail!("Model name cannot be empty");
        }

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match lookup(TIMEOUT_VAR) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .wrap_err_with(|| format!("{} must be a whole number of seconds, got '{}'", TIMEOUT_VAR, raw))?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            bail!("Timeout must be at least one second");
        }

        Ok(Self {
            api_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| eyre!("Invalid API URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => bail!("API URL must use http or https, not '{}'", scheme),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve_with(overrides: ConfigOverrides, vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(overrides, |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_input() {
        let config = resolve_with(ConfigOverrides::default(), &[]).unwrap();
        assert_eq!(config.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = resolve_with(
            ConfigOverrides::default(),
            &[
                (API_URL_VAR, "http://localhost:8080/chat"),
                (MODEL_VAR, "mistral"),
                (TIMEOUT_VAR, "15"),
            ],
        )
        .unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/chat");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn flags_override_environment() {
        let overrides = ConfigOverrides {
            api_url: Some("https://example.com/v1/chat".to_string()),
            model: Some("openai-large".to_string()),
            timeout_secs: Some(5),
        };
        let config = resolve_with(
            overrides,
            &[(API_URL_VAR, "http://localhost:8080/chat"), (MODEL_VAR, "mistral"), (TIMEOUT_VAR, "15")],
        )
        .unwrap();
        assert_eq!(config.api_url.as_str(), "https://example.com/v1/chat");
        assert_eq!(config.model, "openai-large");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(resolve_with(ConfigOverrides::default(), &[(API_URL_VAR, "not a url")]).is_err());
        assert!(resolve_with(ConfigOverrides::default(), &[(API_URL_VAR, "ftp://example.com")]).is_err());
        assert!(resolve_with(ConfigOverrides::default(), &[(TIMEOUT_VAR, "soon")]).is_err());
        assert!(resolve_with(ConfigOverrides::default(), &[(TIMEOUT_VAR, "0")]).is_err());
        assert!(resolve_with(ConfigOverrides::default(), &[(MODEL_VAR, "  ")]).is_err());
    }
}
