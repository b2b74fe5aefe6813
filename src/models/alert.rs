use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Alert {
    pub id: i32, // SERIAL
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
    pub priority: i32,
}

/// A validated alert, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
    pub priority: i32,
}

#[cfg(test)]
impl NewAlert {
    pub fn with_id(self, id: i32) -> Alert {
        Alert {
            id,
            message: self.message,
            latitude: self.latitude,
            longitude: self.longitude,
            priority: self.priority,
        }
    }
}

/// POST payload as received. Every field may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct AlertDraft {
    pub message: Option<String>,
    #[serde(default, deserialize_with = "parse_finite_option")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "parse_finite_option")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "parse_option")]
    pub priority: Option<i32>,
}

impl AlertDraft {
    /// Reads a draft out of a request body. Anything that is not an object with
    /// well-typed fields yields an empty draft, which fails validation.
    pub fn from_body(body: Option<&Value>) -> Self {
        body.cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Zero is a valid coordinate and priority; only absence is rejected.
    pub fn validate(self) -> Option<NewAlert> {
        let message = self.message.filter(|m| !m.is_empty())?;
        Some(NewAlert {
            message,
            latitude: self.latitude?,
            longitude: self.longitude?,
            priority: self.priority?,
        })
    }
}

/// Accepts either the value itself or a string holding it. Blank strings are
/// treated as absent.
fn parse_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOr<U> {
        String(String),
        Value(U),
    }

    let v: Option<StringOr<T>> = Option::deserialize(deserializer)?;
    match v {
        Some(StringOr::Value(v)) => Ok(Some(v)),
        Some(StringOr::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim().parse::<T>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        None => Ok(None),
    }
}

/// NaN and infinities cannot be read back as JSON numbers, so they are refused.
fn parse_finite_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match parse_option::<D, f64>(deserializer)? {
        Some(f) if !f.is_finite() => Err(serde::de::Error::custom(format!(
            "coordinate must be finite, got {}",
            f
        ))),
        v => Ok(v),
    }
}
