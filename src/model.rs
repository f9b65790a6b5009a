use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Store-assigned record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(Uuid);

impl StudentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Anything that is not a UUID is a malformed identifier (400), never a
    /// missing record (404).
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| ApiError::invalid_id(raw))
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub group_number: String,
    pub average_score: f64,
}

/// Validated body of a create or a full-replacement update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub group_number: String,
    pub average_score: f64,
}

impl StudentInput {
    pub fn from_json(params: &serde_json::Value) -> Result<Self, ApiError> {
        if !params.is_object() {
            return Err(ApiError::bad_params("body must be a JSON object"));
        }
        let first_name = required_text(params, "firstName")?;
        let last_name = required_text(params, "lastName")?;
        let group_number = required_text(params, "groupNumber")?;

        let gender = match params.get("gender").and_then(|v| v.as_str()) {
            Some(v) => Gender::parse(v.trim())
                .ok_or_else(|| ApiError::bad_params("gender must be \"M\" or \"F\""))?,
            None => return Err(ApiError::bad_params("missing gender")),
        };

        // Form inputs arrive as strings as often as numbers.
        let average_score = match params.get("averageScore") {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(serde_json::Value::Null) | None => {
                return Err(ApiError::bad_params("missing averageScore"))
            }
            Some(_) => None,
        };
        let Some(average_score) = average_score.filter(|v| v.is_finite()) else {
            return Err(ApiError::bad_params("averageScore must be a number"));
        };
        if !(MIN_SCORE..=MAX_SCORE).contains(&average_score) {
            return Err(ApiError::bad_params(format!(
                "averageScore must be between {MIN_SCORE} and {MAX_SCORE}"
            )));
        }

        Ok(Self {
            first_name,
            last_name,
            gender,
            group_number,
            average_score,
        })
    }

    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            gender: self.gender,
            group_number: self.group_number,
            average_score: self.average_score,
        }
    }
}

fn required_text(params: &serde_json::Value, key: &str) -> Result<String, ApiError> {
    let Some(v) = params.get(key) else {
        return Err(ApiError::bad_params(format!("missing {key}")));
    };
    let Some(s) = v.as_str() else {
        return Err(ApiError::bad_params(format!("{key} must be a string")));
    };
    let s = s.trim();
    if s.is_empty() {
        return Err(ApiError::bad_params(format!("{key} must not be empty")));
    }
    Ok(s.to_string())
}
