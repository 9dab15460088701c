//! Grade parsing and validation.
//!
//! A grade is either a numeric score in 0-100 or a letter grade from the
//! faculty scale. There is a single current value per project; setting a new
//! grade overwrites the old one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The letter grades the faculty scale recognises, best first.
const LETTER_GRADES: &[&str] = &[
    "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "F",
];

/// A recorded grade: numeric score or letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Grade {
    Points(f64),
    Letter(String),
}

impl Grade {
    /// Parse a grade from a JSON value as sent by clients.
    ///
    /// Accepts a number, a string containing a number, or a letter grade
    /// (case-insensitive). Numbers outside [0, 100] are rejected rather than
    /// clamped, so stored grades are in range by construction.
    pub fn parse(value: &serde_json::Value) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidGrade {
            value: value.to_string(),
        };

        match value {
            serde_json::Value::Number(n) => {
                let points = n.as_f64().ok_or_else(invalid)?;
                Self::from_points(points).ok_or_else(invalid)
            }
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(points) = trimmed.parse::<f64>() {
                    return Self::from_points(points).ok_or_else(invalid);
                }
                let upper = trimmed.to_uppercase();
                if LETTER_GRADES.contains(&upper.as_str()) {
                    Ok(Self::Letter(upper))
                } else {
                    Err(invalid())
                }
            }
            _ => Err(invalid()),
        }
    }

    fn from_points(points: f64) -> Option<Self> {
        if points.is_finite() && (0.0..=100.0).contains(&points) {
            Some(Self::Points(points))
        } else {
            None
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Points(p) => write!(f, "{}", p),
            Self::Letter(l) => write!(f, "{}", l),
        }
    }
}
