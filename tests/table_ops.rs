use chrono::Datelike;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_zhurnald");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn zhurnald");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
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
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
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
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn names_of(result: &serde_json::Value) -> Vec<String> {
    result
        .get("rows")
        .and_then(|v| v.as_array())
        .expect("rows")
        .iter()
        .map(|r| {
            r.pointer("/values/0")
                .and_then(|v| v.as_str())
                .expect("fio")
                .to_string()
        })
        .collect()
}

fn birth_for_age(age: i32) -> String {
    format!("01.01.{}", chrono::Local::now().date_naive().year() - age)
}

#[test]
fn search_sort_reset_on_staged_rows() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "table.stage",
        json!({
            "kind": "students",
            "rows": [
                ["Иванов Пётр", birth_for_age(15), "10А"],
                ["Борисова Екатерина", birth_for_age(8), "2Б"],
                ["Алексеев Максим", birth_for_age(8), "2А"],
            ]
        }),
    );

    // Class codes order numerically: 2А and 2Б come before 10А.
    let sorted = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "table.sort",
        json!({ "kind": "students", "column": 2 }),
    );
    assert_eq!(
        names_of(&sorted),
        vec!["Алексеев Максим", "Борисова Екатерина", "Иванов Пётр"]
    );

    // Sorting again by the same column changes nothing.
    let sorted_again = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "table.sort",
        json!({ "kind": "students", "column": 2 }),
    );
    assert_eq!(names_of(&sorted), names_of(&sorted_again));

    let descending = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "table.sort",
        json!({ "kind": "students", "column": 2, "descending": true }),
    );
    assert_eq!(
        names_of(&descending),
        vec!["Иванов Пётр", "Борисова Екатерина", "Алексеев Максим"]
    );

    let found = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "table.search",
        json!({ "kind": "students", "term": "борис" }),
    );
    assert_eq!(names_of(&found), vec!["Борисова Екатерина"]);

    let empty = request(
        &mut stdin,
        &mut reader,
        "7",
        "table.search",
        json!({ "kind": "students", "term": "   " }),
    );
    assert_eq!(
        empty.pointer("/error/code").and_then(|v| v.as_str()),
        Some("empty_search")
    );

    let reset = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "table.reset",
        json!({ "kind": "students" }),
    );
    assert_eq!(names_of(&reset).len(), 3);
}

#[test]
fn staged_edits_stay_local_until_commit() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "table.stage",
        json!({
            "kind": "students",
            "rows": [
                ["Иванов Пётр", birth_for_age(8), "2Б"],
                ["Борисова Екатерина", birth_for_age(8), "2А"],
            ]
        }),
    );

    // Edit the staged row; the store must stay empty.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "records.update",
        json!({
            "kind": "students",
            "index": 0,
            "values": ["Иванов Павел", birth_for_age(8), "2б"]
        }),
    );
    assert_eq!(updated.get("source").and_then(|v| v.as_str()), Some("staged"));
    assert_eq!(names_of(&updated)[0], "Иванов Павел");

    // Even staged edits go through admission.
    let rejected = request(
        &mut stdin,
        &mut reader,
        "4",
        "records.update",
        json!({
            "kind": "students",
            "index": 1,
            "values": ["Борисова Екатерина", birth_for_age(8), "2Д"]
        }),
    );
    assert_eq!(
        rejected.pointer("/error/message").and_then(|v| v.as_str()),
        Some("bad letter")
    );

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "records.delete",
        json!({ "kind": "students", "indices": [1] }),
    );
    assert_eq!(deleted.get("removed").and_then(|v| v.as_u64()), Some(1));

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "table.load",
        json!({ "kind": "students" }),
    );
    assert_eq!(
        loaded.get("rows").and_then(|v| v.as_array()).map(Vec::len),
        Some(0),
        "staged edits must not reach the store"
    );
}

#[test]
fn persistent_edits_write_through_and_reload() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "records.add",
        json!({
            "kind": "students",
            "values": ["Иванов Пётр", birth_for_age(8), "2Б"]
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "records.add",
        json!({
            "kind": "grades",
            "values": ["Иванов Пётр", "Математика", "4"]
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "table.load",
        json!({ "kind": "students" }),
    );

    // The class letter normalizes on the way through admission.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "records.update",
        json!({
            "kind": "students",
            "index": 0,
            "values": ["Иванов Пётр", birth_for_age(8), "2а"]
        }),
    );
    assert_eq!(
        updated.get("source").and_then(|v| v.as_str()),
        Some("persistent")
    );
    assert_eq!(
        updated
            .pointer("/rows/0/values/2")
            .and_then(|v| v.as_str()),
        Some("2А")
    );

    // Deleting the student also removes the dependent grade entry.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "records.delete",
        json!({ "kind": "students", "indices": [0] }),
    );
    let grades = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "table.load",
        json!({ "kind": "grades" }),
    );
    assert_eq!(
        grades.get("rows").and_then(|v| v.as_array()).map(Vec::len),
        Some(0)
    );
}

#[test]
fn saved_file_reopens_with_same_tuples() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let out_path = workspace.path().join("students_out.csv");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "table.stage",
        json!({
            "kind": "students",
            "rows": [
                ["Иванов Пётр", birth_for_age(8), "2Б"],
                ["Борисова Екатерина", birth_for_age(8), "2А"],
            ]
        }),
    );
    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "file.save",
        json!({ "kind": "students", "path": out_path.to_string_lossy() }),
    );
    assert_eq!(saved.get("saved").and_then(|v| v.as_u64()), Some(2));

    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "file.open",
        json!({ "kind": "students", "path": out_path.to_string_lossy() }),
    );
    assert_eq!(names_of(&reopened), vec!["Иванов Пётр", "Борисова Екатерина"]);

    // file.create starts an empty staging buffer and an empty file.
    let fresh_path = workspace.path().join("fresh.csv");
    let fresh = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "file.create",
        json!({ "kind": "students", "path": fresh_path.to_string_lossy() }),
    );
    assert_eq!(fresh.get("source").and_then(|v| v.as_str()), Some("staged"));
    assert_eq!(
        fresh.get("rows").and_then(|v| v.as_array()).map(Vec::len),
        Some(0)
    );
    assert!(fresh_path.exists());
}
