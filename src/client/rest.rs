//! [`StudentsApi`] over the REST surface served by `crate::http`.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::model::{Student, StudentId, StudentInput};
use crate::query::{PageRequest, PageResult};

use super::api::StudentsApi;

pub struct HttpStudentsApi {
    client: Client,
    base_url: String,
}

impl HttpStudentsApi {
    /// `base_url` is the server root, with or without the `/api` prefix.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    retryable: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Deleted {
    deleted_record: Student,
}

/// Query string for a page request; absent filters are omitted.
fn list_query(req: &PageRequest) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("page", req.page().to_string()),
        ("limit", req.limit().to_string()),
    ];
    if let Some(group) = req.group() {
        pairs.push(("groupNumber", group.to_string()));
    }
    if let Some(search) = req.search() {
        pairs.push(("search", search.to_string()));
    }
    pairs
}

fn transport(e: reqwest::Error) -> ApiError {
    warn!(error = %e, "students request failed");
    ApiError::unavailable(e.to_string())
}

async fn read<T: DeserializeOwned>(sent: Result<Response, reqwest::Error>) -> Result<T, ApiError> {
    let resp = sent.map_err(transport)?;
    let status = resp.status();
    if status.is_success() {
        return resp.json::<T>().await.map_err(|e| ApiError::Infrastructure {
            code: "bad_response",
            message: e.to_string(),
            retryable: false,
        });
    }
    let body = resp.text().await.map_err(transport)?;
    debug!(%status, "students request rejected");
    Err(error_from_body(status, &body))
}

/// Rebuilds the server's error from its status and `{"error": {...}}` body.
fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    let (code, message, retryable) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => (error.code, error.message, error.retryable),
        Err(_) => (String::new(), body.trim().to_string(), false),
    };
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound("student");
    }
    if status.is_client_error() {
        return ApiError::Validation {
            code: if code == "invalid_id" {
                "invalid_id"
            } else {
                "bad_params"
            },
            message,
        };
    }
    let code = match code.as_str() {
        "store_unavailable" => "store_unavailable",
        "db_query_failed" => "db_query_failed",
        "db_insert_failed" => "db_insert_failed",
        "db_update_failed" => "db_update_failed",
        "db_delete_failed" => "db_delete_failed",
        _ => "server_error",
    };
    ApiError::Infrastructure {
        code,
        message,
        retryable: retryable || status == StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl StudentsApi for HttpStudentsApi {
    async fn list(&self, req: &PageRequest) -> Result<PageResult, ApiError> {
        let sent = self
            .client
            .get(self.url("/students"))
            .query(&list_query(req))
            .send()
            .await;
        read(sent).await
    }

    async fn groups(&self) -> Result<Vec<String>, ApiError> {
        read(self.client.get(self.url("/students/groups")).send().await).await
    }

    async fn create(&self, input: StudentInput) -> Result<Student, ApiError> {
        let sent = self
            .client
            .post(self.url("/students"))
            .json(&input)
            .send()
            .await;
        read(sent).await
    }

    async fn update(&self, id: &StudentId, input: StudentInput) -> Result<Student, ApiError> {
        let sent = self
            .client
            .put(self.url(&format!("/students/{id}")))
            .json(&input)
            .send()
            .await;
        read(sent).await
    }

    async fn delete(&self, id: &StudentId) -> Result<Student, ApiError> {
        let sent = self
            .client
            .delete(self.url(&format!("/students/{id}")))
            .send()
            .await;
        read::<Deleted>(sent).await.map(|d| d.deleted_record)
    }
}
