// src/job/priority.rs

//! Job priority ordinal.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::JobgateError;

/// Ordinal rank of a job; a **lower** value is dispatched **earlier**.
///
/// The named levels cover the common cases, but any `i32` is accepted for
/// finer control (e.g. `Priority::new(0)` jumps ahead of `CRITICAL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(i32);

impl Priority {
    pub const CRITICAL: Priority = Priority(1);
    pub const HIGH: Priority = Priority(2);
    pub const NORMAL: Priority = Priority(3);
    pub const LOW: Priority = Priority(4);
    pub const BACKGROUND: Priority = Priority(5);

    pub const fn new(value: i32) -> Self {
        Priority(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    /// Name of the level, if this priority is one of the named levels.
    pub fn level_name(self) -> Option<&'static str> {
        match self.0 {
            1 => Some("critical"),
            2 => Some("high"),
            3 => Some("normal"),
            4 => Some("low"),
            5 => Some("background"),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl TryFrom<i64> for Priority {
    type Error = JobgateError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        i32::try_from(value).map(Priority).map_err(|_| {
            JobgateError::InvalidJob(format!("priority {value} is out of range"))
        })
    }
}

impl FromStr for Priority {
    type Err = JobgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "critical" => Ok(Priority::CRITICAL),
            "high" => Ok(Priority::HIGH),
            "normal" => Ok(Priority::NORMAL),
            "low" => Ok(Priority::LOW),
            "background" => Ok(Priority::BACKGROUND),
            other => other
                .parse::<i64>()
                .map_err(|_| {
                    JobgateError::InvalidJob(format!(
                        "invalid priority: {trimmed} (expected critical, high, normal, low, background or an integer)"
                    ))
                })
                .and_then(Priority::try_from),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level_name() {
            Some(name) => write!(f, "{name}({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Accepts either a level name (`"high"`) or an integer (`2`).
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Name(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Priority::try_from(v),
            Raw::Name(s) => s.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
