//! Tolerant timestamp parsing for the CPNU API.
//!
//! The API emits timestamps like `2023-01-25T09:40:35.227` (no offset) and
//! occasionally standard RFC 3339 values; absent dates are a literal JSON
//! `null`. [`Fecha`] accepts all three: the bare local format is taken as
//! UTC, RFC 3339 is the fallback, and `null` is "no value", not an error.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A nullable CPNU timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fecha(pub Option<DateTime<Utc>>);

impl Fecha {
    /// The parsed timestamp, if the field carried one.
    pub fn into_inner(self) -> Option<DateTime<Utc>> {
        self.0
    }
}

impl Default for Fecha {
    fn default() -> Self {
        Fecha(None)
    }
}

/// Parse one CPNU timestamp string.
pub fn parse_fecha(s: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = s.trim();

    // The API's own format first: bare local datetime, optional fraction.
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    // Standard fallback.
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    Err(format!("unrecognized CPNU timestamp: {trimmed:?}"))
}

impl<'de> Deserialize<'de> for Fecha {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(Fecha(None)),
            Some(s) if s.trim().is_empty() => Ok(Fecha(None)),
            Some(s) => parse_fecha(&s)
                .map(|at| Fecha(Some(at)))
                .map_err(serde::de::Error::custom),
        }
    }
}
