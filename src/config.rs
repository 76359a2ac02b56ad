use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::agent::AgentConfig;
use crate::bot::DEFAULT_TELEGRAM_BASE_URL;
use crate::llm::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::lookup::{DEFAULT_SEARCH_BASE_URL, DEFAULT_WEATHER_BASE_URL, LookupConfig};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 90;

const CONFIG_DIR_NAME: &str = "campus-assistant";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub owm_api_key: Option<String>,
    pub owm_base_url: String,
    pub tavily_api_key: Option<String>,
    pub tavily_base_url: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_base_url: String,
    pub http_timeout_secs: u64,
    /// Opt-in on-disk session trace; off unless the config file enables it.
    pub session_trace: bool,
    pub agent: AgentConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    owm_api_key: Option<String>,
    owm_base_url: Option<String>,
    tavily_api_key: Option<String>,
    tavily_base_url: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_base_url: Option<String>,
    http_timeout_secs: Option<u64>,
    session_trace: Option<bool>,
    agent: Option<RawAgentConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAgentConfig {
    max_steps: Option<usize>,
    campus_weather_city: Option<String>,
    enforce_weather_precaution: Option<bool>,
}

impl AppConfig {
    /// Environment wins over `.env`, which wins over the config file.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                path.to_path_buf()
            }
            None => discover_config_path()?,
        };
        let file = load_file_config(&config_path)?.unwrap_or_default();

        dotenvy::dotenv().ok();

        let agent = validate_agent(file.agent.as_ref(), &config_path)?;
        let http_timeout_secs = match file.http_timeout_secs {
            Some(0) => {
                return Err(config_error(
                    &config_path,
                    "http_timeout_secs",
                    "must be at least 1",
                ));
            }
            Some(secs) => secs,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            openai_api_key: setting("OPENAI_API_KEY", &file.openai_api_key),
            openai_model: setting("OPENAI_MODEL", &file.openai_model)
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: setting("OPENAI_BASE_URL", &file.openai_base_url)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            owm_api_key: setting("OWM_API_KEY", &file.owm_api_key),
            owm_base_url: setting("OWM_BASE_URL", &file.owm_base_url)
                .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
            tavily_api_key: setting("TAVILY_API_KEY", &file.tavily_api_key),
            tavily_base_url: setting("TAVILY_BASE_URL", &file.tavily_base_url)
                .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string()),
            telegram_bot_token: setting("TELEGRAM_BOT_TOKEN", &file.telegram_bot_token),
            telegram_base_url: setting("TELEGRAM_BASE_URL", &file.telegram_base_url)
                .unwrap_or_else(|| DEFAULT_TELEGRAM_BASE_URL.to_string()),
            http_timeout_secs,
            session_trace: file.session_trace.unwrap_or(false),
            agent,
        })
    }

    pub fn lookup_config(&self) -> LookupConfig {
        LookupConfig {
            weather_api_key: self.owm_api_key.clone(),
            weather_base_url: self.owm_base_url.clone(),
            search_api_key: self.tavily_api_key.clone(),
            search_base_url: self.tavily_base_url.clone(),
        }
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn validate_agent(raw: Option<&RawAgentConfig>, config_path: &Path) -> Result<AgentConfig> {
    let mut config = AgentConfig::default();
    let Some(raw) = raw else {
        return Ok(config);
    };

    if let Some(max_steps) = raw.max_steps {
        if max_steps == 0 {
            return Err(config_error(
                config_path,
                "agent.max_steps",
                "must be at least 1",
            ));
        }
        config.max_steps = max_steps;
    }

    if let Some(city) = &raw.campus_weather_city {
        config.campus_weather_city = non_empty(city)
            .ok_or_else(|| {
                config_error(config_path, "agent.campus_weather_city", "must not be empty")
            })?
            .to_string();
    }

    if let Some(enforce) = raw.enforce_weather_precaution {
        config.enforce_weather_precaution = enforce;
    }

    Ok(config)
}

fn setting(env_key: &str, file_value: &Option<String>) -> Option<String> {
    env_non_empty(env_key).or_else(|| {
        file_value
            .as_deref()
            .and_then(non_empty)
            .map(ToOwned::to_owned)
    })
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|value| non_empty(&value).map(ToOwned::to_owned))
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
