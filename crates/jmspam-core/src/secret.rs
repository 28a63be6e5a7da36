use std::fmt;

use serde_json::Value;

/// Outcome of an account-secret request: either the secret, or a
/// description of what went wrong.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Secret {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub desc: String,
}

impl Secret {
    pub fn is_valid(&self) -> bool {
        self.desc.is_empty()
    }

    pub fn from_error(err: impl fmt::Display) -> Self {
        Self {
            secret: None,
            desc: err.to_string(),
        }
    }

    /// Interpret an API response. Status 200 yields the `secret` field;
    /// any other status folds the body's key/value pairs into `desc`.
    pub fn from_response(status: u16, body: &Value) -> Self {
        if status != 200 {
            let desc = match body.as_object() {
                Some(map) if !map.is_empty() => map
                    .iter()
                    .map(|(k, v)| format!("{k}: {}; ", display_value(v)))
                    .collect(),
                _ => format!("unexpected status {status}"),
            };
            return Self { secret: None, desc };
        }

        match body.get("secret").and_then(Value::as_str) {
            Some(secret) => Self {
                secret: Some(secret.to_string()),
                desc: String::new(),
            },
            None => Self::from_error("response has no secret field"),
        }
    }
}

fn display_value(v: &Value) -> String {
    match v.as_str() {
        Some(s) => s.to_string(),
        None => v.to_string(),
    }
}
