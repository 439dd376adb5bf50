use std::path::PathBuf;

use serde_json::json;

use super::{parse_kind, rows_payload};
use crate::interchange;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn path_param(req: &Request) -> Result<PathBuf, serde_json::Value> {
    req.params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| err(&req.id, "bad_params", "missing params.path", None))
}

/// Reads an interchange file into the staging buffer. The table switches to
/// the staged source; nothing touches the store until a commit.
fn handle_file_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let path = match path_param(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let tuples = match interchange::read_rows(&path, kind) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "file_read_failed", e.to_string(), None),
    };
    log::info!(
        "staged {} rows for {} from {}",
        tuples.len(),
        kind.as_str(),
        path.display()
    );

    let table = state.tables.get_mut(kind);
    table.load_from_staging(tuples);
    ok(&req.id, rows_payload(table))
}

fn handle_file_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let path = match path_param(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let table = state.tables.get_mut(kind);
    if let Err(e) = interchange::write_rows(&path, kind, table.rows()) {
        return err(&req.id, "file_write_failed", e.to_string(), None);
    }
    log::info!(
        "saved {} rows of {} to {}",
        table.rows().len(),
        kind.as_str(),
        path.display()
    );
    ok(&req.id, json!({ "saved": table.rows().len() }))
}

/// Starts a fresh, empty staging buffer and creates its file on disk.
fn handle_file_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let path = match path_param(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let table = state.tables.get_mut(kind);
    table.load_from_staging(Vec::new());
    if let Err(e) = interchange::write_rows(&path, kind, table.rows()) {
        return err(&req.id, "file_write_failed", e.to_string(), None);
    }
    ok(&req.id, rows_payload(table))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "file.open" => Some(handle_file_open(state, req)),
        "file.save" => Some(handle_file_save(state, req)),
        "file.create" => Some(handle_file_create(state, req)),
        _ => None,
    }
}
