use crate::error::ApiError;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{StudentId, StudentInput};
use crate::query::{ListParams, PageRequest, QueryDefaults};
use crate::store::SqliteStore;
use serde_json::json;

fn student_id(req: &Request) -> Result<StudentId, ApiError> {
    match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => StudentId::parse(v),
        None => Err(ApiError::bad_params("missing studentId")),
    }
}

fn handle_list(store: &SqliteStore, defaults: &QueryDefaults, req: &Request) -> serde_json::Value {
    let page = PageRequest::from_params(&ListParams::from_json(&req.params), defaults);
    match store.list(&page) {
        Ok(result) => ok(&req.id, json!(result)),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_groups(store: &SqliteStore, req: &Request) -> serde_json::Value {
    match store.groups() {
        Ok(groups) => ok(&req.id, json!({ "groups": groups })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_create(store: &SqliteStore, req: &Request) -> serde_json::Value {
    let created = StudentInput::from_json(&req.params).and_then(|input| store.create(input));
    match created {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_update(store: &SqliteStore, req: &Request) -> serde_json::Value {
    let updated = student_id(req).and_then(|id| {
        let input = StudentInput::from_json(&req.params)?;
        store.update(&id, input)
    });
    match updated {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_delete(store: &SqliteStore, req: &Request) -> serde_json::Value {
    match student_id(req).and_then(|id| store.delete(&id)) {
        Ok(student) => ok(
            &req.id,
            json!({ "message": "student deleted", "deletedRecord": student }),
        ),
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let method = req.method.as_str();
    if !matches!(
        method,
        "students.list"
            | "students.groups"
            | "students.create"
            | "students.update"
            | "students.delete"
    ) {
        return None;
    }

    let Some(store) = state.store.as_ref() else {
        return Some(err(
            &req.id,
            "no_workspace",
            "select a workspace first",
            None,
        ));
    };

    Some(match method {
        "students.list" => handle_list(store, &state.defaults, req),
        "students.groups" => handle_groups(store, req),
        "students.create" => handle_create(store, req),
        "students.update" => handle_update(store, req),
        _ => handle_delete(store, req),
    })
}
