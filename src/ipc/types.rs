use std::path::PathBuf;

use serde::Deserialize;

use crate::query::QueryDefaults;
use crate::store::SqliteStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<SqliteStore>,
    pub defaults: QueryDefaults,
}

impl AppState {
    pub fn new(defaults: QueryDefaults) -> Self {
        Self {
            workspace: None,
            store: None,
            defaults,
        }
    }
}
