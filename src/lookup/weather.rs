use serde::Deserialize;
use serde_json::Number;

use super::{LookupError, LookupResult, endpoint, require_key, transport_error};
use crate::http::client::HttpClient;

const PROVIDER: &str = "OpenWeatherMap";
const WEATHER_PATH: &str = "/data/2.5/weather";

pub(super) async fn current_weather(
    http: &HttpClient,
    base_url: &str,
    api_key: Option<&str>,
    city: &str,
) -> LookupResult<String> {
    let api_key = require_key(api_key, PROVIDER)?;

    let response = http
        .get(
            &endpoint(base_url, WEATHER_PATH),
            &[("q", city), ("appid", api_key), ("units", "metric")],
        )
        .await
        .map_err(transport_error)?;

    if response.status != 200 {
        let message = serde_json::from_str::<ProviderErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("Unable to fetch weather data for {city}"));
        return Err(LookupError::Provider(message));
    }

    let parsed = serde_json::from_str::<CurrentWeather>(&response.body).map_err(|err| {
        LookupError::Parse {
            subject: "weather data",
            detail: err.to_string(),
        }
    })?;
    format_weather_report(&parsed)
}

fn format_weather_report(weather: &CurrentWeather) -> LookupResult<String> {
    let condition = weather
        .weather
        .first()
        .ok_or_else(|| LookupError::Parse {
            subject: "weather data",
            detail: "missing weather[0].description".to_string(),
        })?;

    Ok(format!(
        "Weather in {}, {}:\n\
         • Condition: {}\n\
         • Temperature: {}°C\n\
         • Feels like: {}°C\n\
         • Humidity: {}%\n\
         • Wind speed: {} m/s",
        weather.name,
        weather.sys.country,
        capitalize(&condition.description),
        weather.main.temp,
        weather.main.feels_like,
        weather.main.humidity,
        weather.wind.speed,
    ))
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

// Readings stay as `Number` so they print exactly as the provider sent them.
#[derive(Debug, Clone, Deserialize)]
struct CurrentWeather {
    name: String,
    weather: Vec<Condition>,
    main: Readings,
    wind: Wind,
    sys: Sys,
}

#[derive(Debug, Clone, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Readings {
    temp: Number,
    feels_like: Number,
    humidity: Number,
}

#[derive(Debug, Clone, Deserialize)]
struct Wind {
    speed: Number,
}

#[derive(Debug, Clone, Deserialize)]
struct Sys {
    country: String,
}
