use serde_json::{Value, json};

use crate::llm::provider::FunctionDeclaration;
use crate::lookup::LookupProvider;

pub const WEATHER_TOOL: &str = "weather";
pub const SEARCH_TOOL: &str = "search";

pub fn tool_declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: WEATHER_TOOL.to_string(),
            description: "Get the current weather for a city".to_string(),
            parameters_json_schema: json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "City name, e.g. Mymensingh"}
                },
                "required": ["city"]
            }),
        },
        FunctionDeclaration {
            name: SEARCH_TOOL.to_string(),
            description: "Search the web for up-to-date information".to_string(),
            parameters_json_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"}
                },
                "required": ["query"]
            }),
        },
    ]
}

/// The closed set of lookups the reasoning step may request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Weather { city: String },
    Search { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityParseError {
    Unknown(String),
    InvalidArgs { name: String, detail: String },
}

impl Capability {
    pub fn from_call(name: &str, args_json: &Value) -> Result<Self, CapabilityParseError> {
        match name {
            WEATHER_TOOL => {
                required_string(name, args_json, "city").map(|city| Self::Weather { city })
            }
            SEARCH_TOOL => {
                required_string(name, args_json, "query").map(|query| Self::Search { query })
            }
            other => Err(CapabilityParseError::Unknown(other.to_string())),
        }
    }

    pub fn args_json(&self) -> Value {
        match self {
            Self::Weather { city } => json!({ "city": city }),
            Self::Search { query } => json!({ "query": query }),
        }
    }

    pub fn is_weather(&self) -> bool {
        matches!(self, Self::Weather { .. })
    }
}

fn required_string(
    name: &str,
    args_json: &Value,
    field: &str,
) -> Result<String, CapabilityParseError> {
    args_json
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CapabilityParseError::InvalidArgs {
            name: name.to_string(),
            detail: format!("{name} expects a non-empty string field `{field}`, got {args_json}"),
        })
}

pub async fn dispatch<L: LookupProvider>(lookups: &L, capability: &Capability) -> String {
    match capability {
        Capability::Weather { city } => lookups.weather(city).await,
        Capability::Search { query } => lookups.search(query).await,
    }
}

pub fn invalid_args_result(detail: &str) -> String {
    format!("Error: invalid arguments: {detail}")
}
