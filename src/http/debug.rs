use reqwest::Url;
#[cfg(test)]
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde_json::Value;

const REDACTION: &str = "***REDACTED***";
const SENSITIVE_KEYS: [&str; 9] = [
    "appid",
    "api_key",
    "apikey",
    "key",
    "token",
    "access_token",
    "authorization",
    "secret",
    "password",
];
// Telegram embeds the bot token in the path: /bot<token>/<method>.
const BOT_PATH_PREFIX: &str = "bot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    pub enabled: bool,
    pub redact_secrets: bool,
    pub max_body_chars: usize,
}

impl HttpDebugConfig {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            redact_secrets: true,
            max_body_chars: 2_000,
        }
    }

    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }
}

pub fn redact_url(url: &Url, enable_redaction: bool) -> String {
    if !enable_redaction {
        return url.as_str().to_string();
    }

    let mut redacted = url.clone();
    let segments: Option<Vec<String>> = redacted.path_segments().map(|segments| {
        segments
            .map(|segment| match segment.strip_prefix(BOT_PATH_PREFIX) {
                Some(token) if token.contains(':') => format!("{BOT_PATH_PREFIX}{REDACTION}"),
                _ => segment.to_string(),
            })
            .collect()
    });
    if let Some(segments) = segments {
        redacted.set_path(&format!("/{}", segments.join("/")));
    }

    let pairs: Vec<(String, String)> = redacted
        .query_pairs()
        .map(|(k, v)| {
            if is_sensitive_key(k.as_ref()) {
                (k.into_owned(), REDACTION.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    redacted.set_query(None);
    if !pairs.is_empty() {
        let mut qp = redacted.query_pairs_mut();
        for (k, v) in pairs {
            qp.append_pair(&k, &v);
        }
    }

    redacted.as_str().to_string()
}

#[cfg(test)]
pub fn redact_headers(headers: &HeaderMap, enable_redaction: bool) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                name.as_str(),
                redact_header_value(name.as_str(), value, enable_redaction)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn redact_header_value(name: &str, value: &HeaderValue, enable_redaction: bool) -> String {
    if enable_redaction && is_sensitive_key(name) {
        REDACTION.to_string()
    } else {
        value
            .to_str()
            .map(std::string::ToString::to_string)
            .unwrap_or_else(|_| "<non-utf8>".to_string())
    }
}

pub fn redact_text_body(raw: &str, enable_redaction: bool) -> String {
    if !enable_redaction {
        return raw.to_string();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(mut json) => {
            redact_json_value(&mut json);
            serde_json::to_string(&json).unwrap_or_else(|_| raw.to_string())
        }
        Err(_) => raw.to_string(),
    }
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let count = input.chars().count();
    if count <= max_chars {
        return input.to_string();
    }

    let truncated = input.chars().take(max_chars).collect::<String>();
    format!("{truncated}... <truncated {} chars>", count - max_chars)
}

fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                if is_sensitive_key(key) {
                    *item = Value::String(REDACTION.to_string());
                } else {
                    redact_json_value(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json_value),
        _ => {}
    }
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(key))
}
