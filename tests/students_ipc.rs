use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_studentsd");
    let mut child = Command::new(exe)
        .env_remove("STUDENTSD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn studentsd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send_line(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    line: &str,
) -> serde_json::Value {
    writeln!(stdin, "{}", line).expect("write request");
    stdin.flush().expect("flush request");

    let mut out = String::new();
    reader.read_line(&mut out).expect("read response line");
    assert!(!out.trim().is_empty(), "empty response for {}", line);
    serde_json::from_str(out.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    let value = send_line(stdin, reader, &payload.to_string());
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_default()
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn student(first: &str, last: &str, group: &str, score: f64) -> serde_json::Value {
    json!({
        "firstName": first,
        "lastName": last,
        "gender": "M",
        "groupNumber": group,
        "averageScore": score
    })
}

#[test]
fn students_lifecycle_over_stdio() {
    let workspace = temp_dir("studentsd-ipc-lifecycle");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("workspacePath").map(|v| v.is_null()).unwrap_or(false));

    let before = request(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(error_code(&before), "no_workspace");

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        student("Ali", "Mammadov", "101", 91.0),
    );
    let id = created["student"]["id"].as_str().expect("id").to_string();
    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        student("Rauf", "Aliyev", "102", 64.5),
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.list",
        json!({ "page": 1, "limit": 10 }),
    );
    let names: Vec<&str> = listed["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["lastName"].as_str())
        .collect();
    assert_eq!(names, ["Aliyev", "Mammadov"]);
    assert_eq!(
        listed["pagination"],
        json!({ "total": 2, "page": 1, "limit": 10, "pages": 1 })
    );

    let groups = request_ok(&mut stdin, &mut reader, "7", "students.groups", json!({}));
    assert_eq!(groups["groups"], json!(["101", "102"]));

    let mut patch = student("Ali", "Mammadli", "103", 95.0);
    patch["studentId"] = json!(id);
    let updated = request_ok(&mut stdin, &mut reader, "8", "students.update", patch);
    assert_eq!(updated["student"]["lastName"], "Mammadli");
    assert_eq!(updated["student"]["id"], json!(id));

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "students.delete",
        json!({ "studentId": id }),
    );
    assert_eq!(deleted["deletedRecord"]["groupNumber"], "103");

    let again = request(
        &mut stdin,
        &mut reader,
        "10",
        "students.delete",
        json!({ "studentId": id }),
    );
    assert_eq!(error_code(&again), "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn protocol_errors_have_stable_codes() {
    let workspace = temp_dir("studentsd-ipc-errors");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let bad = send_line(&mut stdin, &mut reader, "{not json");
    assert_eq!(error_code(&bad), "bad_json");

    let unknown = request(&mut stdin, &mut reader, "1", "grades.list", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let malformed = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.delete",
        json!({ "studentId": "12345" }),
    );
    assert_eq!(error_code(&malformed), "invalid_id");

    let out_of_range = request(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        student("A", "B", "101", 120.0),
    );
    assert_eq!(error_code(&out_of_range), "bad_params");

    let missing = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.update",
        json!({ "firstName": "A" }),
    );
    assert_eq!(error_code(&missing), "bad_params");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_paging_params_fall_back_to_defaults() {
    let workspace = temp_dir("studentsd-ipc-paging");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.list",
        json!({ "page": "first", "limit": 0 }),
    );
    assert_eq!(
        listed["pagination"],
        json!({ "total": 0, "page": 1, "limit": 25, "pages": 0 })
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
