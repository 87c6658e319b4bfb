//! Runtime configuration loaded from the environment

use crate::turn::TurnConfig;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_PORT: u16 = 8080;

/// Everything the server reads from the environment at startup
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub model: Option<String>,
    pub weather_api_key: Option<String>,
    pub weather_base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub max_tool_rounds: Option<u32>,
    pub history_limit: Option<usize>,
    pub port: Option<u16>,
}

impl AppConfig {
    /// Read configuration, loading a `.env` file first if one exists
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!(path = %path.display(), "Loaded .env file");
        }

        Self {
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            anthropic_base_url: non_empty_var("ANTHROPIC_BASE_URL"),
            model: non_empty_var("ANTHROPIC_MODEL"),
            weather_api_key: non_empty_var("OPENWEATHERMAP_API_KEY"),
            weather_base_url: non_empty_var("OPENWEATHERMAP_BASE_URL"),
            max_tokens: parsed_var("MAX_TOKENS"),
            max_tool_rounds: parsed_var("MAX_TOOL_ROUNDS"),
            history_limit: parsed_var("HISTORY_LIMIT"),
            port: parsed_var("PORT"),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Loop limits, falling back to defaults for anything unset
    pub fn turn_config(&self) -> TurnConfig {
        let defaults = TurnConfig::default();
        TurnConfig {
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            max_tool_rounds: self.max_tool_rounds.unwrap_or(defaults.max_tool_rounds),
            history_limit: self.history_limit.unwrap_or(defaults.history_limit),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = non_empty_var(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}
