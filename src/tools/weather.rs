//! Weather tool - current conditions from OpenWeatherMap

use super::{error_payload, Tool};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RESPONSE_LANGUAGE: &str = "zh_cn";

/// Upstream settings for the weather tool
#[derive(Debug, Clone, Default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Unit system requested by the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    fn as_query(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherInput {
    city: String,
    #[serde(default)]
    units: Units,
}

/// `get_weather` tool
pub struct WeatherTool {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherTool {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key,
            base_url: config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    async fn fetch(&self, api_key: &str, input: &WeatherInput) -> Result<Value, String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", input.city.as_str()),
                ("appid", api_key),
                ("units", input.units.as_query()),
                ("lang", RESPONSE_LANGUAGE),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_error)?;

        response.json::<Value>().await.map_err(fetch_error)
    }
}

/// The request URL carries the API key in `appid`, so it never reaches the message
fn fetch_error(err: reqwest::Error) -> String {
    format!("unable to fetch weather: {}", err.without_url())
}

/// Flatten an OpenWeatherMap payload into the record handed to the model
fn normalize(data: &Value, units: Units) -> Result<Value, String> {
    const FIELDS: [(&str, &str); 7] = [
        ("city", "/name"),
        ("country", "/sys/country"),
        ("temperature", "/main/temp"),
        ("feels_like", "/main/feels_like"),
        ("humidity", "/main/humidity"),
        ("description", "/weather/0/description"),
        ("wind_speed", "/wind/speed"),
    ];

    let mut record = Map::new();
    for (key, pointer) in FIELDS {
        let value = data
            .pointer(pointer)
            .filter(|v| !v.is_null())
            .ok_or_else(|| format!("malformed weather data: missing {pointer}"))?;
        record.insert(key.to_string(), value.clone());
    }
    record.insert("unit_label".to_string(), json!(units.label()));
    Ok(Value::Object(record))
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "get_weather"
    }

    fn description(&self) -> String {
        "Get the current weather for a city. Accepts city names in Chinese or English.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name, e.g. 北京, 上海, New York, London"
                },
                "units": {
                    "type": "string",
                    "enum": ["metric", "imperial"],
                    "description": "Temperature units: metric (Celsius) or imperial (Fahrenheit). Defaults to metric.",
                    "default": "metric"
                }
            },
            "required": ["city"]
        })
    }

    async fn run(&self, input: Value) -> Value {
        let Some(api_key) = self.api_key.as_deref() else {
            return error_payload("OpenWeatherMap API key is not configured");
        };

        let input: WeatherInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => return error_payload(format!("Invalid input: {e}")),
        };

        let result = self
            .fetch(api_key, &input)
            .await
            .and_then(|data| normalize(&data, input.units));

        match result {
            Ok(record) => {
                tracing::info!(city = %input.city, units = input.units.as_query(), "Weather lookup succeeded");
                record
            }
            Err(message) => {
                tracing::warn!(city = %input.city, error = %message, "Weather lookup failed");
                error_payload(message)
            }
        }
    }
}
