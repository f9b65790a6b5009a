use serde_json::json;

/// Failures surfaced by the student service to either transport.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad identifier, missing field, or a value outside its allowed range.
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The record store failed. `retryable` is set when the store was busy
    /// or otherwise temporarily unavailable.
    #[error("{message}")]
    Infrastructure {
        code: &'static str,
        message: String,
        retryable: bool,
    },
}

impl ApiError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "bad_params",
            message: message.into(),
        }
    }

    pub fn invalid_id(raw: &str) -> Self {
        Self::Validation {
            code: "invalid_id",
            message: format!("invalid id format: {raw:?}"),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Infrastructure {
            code: "store_unavailable",
            message: message.into(),
            retryable: true,
        }
    }

    /// Maps a SQLite failure onto the infrastructure variant. Busy and locked
    /// databases are reported as retryable.
    pub fn db(code: &'static str, e: rusqlite::Error) -> Self {
        let busy = matches!(
            e.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
        );
        if busy {
            return Self::unavailable(e.to_string());
        }
        Self::Infrastructure {
            code,
            message: e.to_string(),
            retryable: false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. } | Self::Infrastructure { code, .. } => code,
            Self::NotFound(_) => "not_found",
        }
    }

    /// HTTP status for this error: 400, 404 or 500.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound(_) => 404,
            Self::Infrastructure { .. } => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Infrastructure {
                retryable: true,
                ..
            }
        )
    }

    /// Extra detail object carried in error envelopes, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Infrastructure { retryable, .. } => Some(json!({ "retryable": retryable })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(ApiError::bad_params("x").status(), 400);
        assert_eq!(ApiError::invalid_id("nope").status(), 400);
        assert_eq!(ApiError::NotFound("student").status(), 404);
        assert_eq!(ApiError::unavailable("down").status(), 500);
    }

    #[test]
    fn busy_database_is_retryable() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let e = ApiError::db("db_query_failed", busy);
        assert!(e.is_retryable());
        assert_eq!(e.code(), "store_unavailable");

        let other = ApiError::db("db_query_failed", rusqlite::Error::InvalidQuery);
        assert!(!other.is_retryable());
        assert_eq!(other.code(), "db_query_failed");
    }

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(ApiError::NotFound("student").to_string(), "student not found");
    }
}
