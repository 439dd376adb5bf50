use chrono::Local;
use serde_json::json;

use super::{parse_kind, rows_payload};
use crate::admission;
use crate::ipc::error::{err, ok, table_err};
use crate::ipc::types::{AppState, Request};

fn handle_table_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let table = state.tables.get_mut(kind);
    if let Err(e) = table.load_from_store(store) {
        return err(&req.id, "db_query_failed", e.to_string(), None);
    }
    ok(&req.id, rows_payload(table))
}

fn handle_table_rows(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    ok(&req.id, rows_payload(state.tables.get_mut(kind)))
}

fn handle_table_stage(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let Some(items) = req.params.get("rows").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing rows array", None);
    };
    let mut tuples = Vec::with_capacity(items.len());
    for item in items {
        let Some(cells) = item.as_array() else {
            return err(&req.id, "bad_params", "rows must be arrays of strings", None);
        };
        let mut tuple = Vec::with_capacity(cells.len());
        for cell in cells {
            let Some(s) = cell.as_str() else {
                return err(&req.id, "bad_params", "rows must be arrays of strings", None);
            };
            tuple.push(s.to_string());
        }
        tuples.push(tuple);
    }

    let table = state.tables.get_mut(kind);
    table.load_from_staging(tuples);
    ok(&req.id, rows_payload(table))
}

fn handle_table_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let term = req
        .params
        .get("term")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    if term.is_empty() {
        return err(&req.id, "empty_search", "search text must not be empty", None);
    }

    let table = state.tables.get_mut(kind);
    table.search(&term);
    ok(&req.id, rows_payload(table))
}

fn handle_table_sort(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let Some(column) = req.params.get("column").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing column", None);
    };
    let descending = req
        .params
        .get("descending")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let table = state.tables.get_mut(kind);
    match table.sort(column as usize, descending) {
        Ok(()) => ok(&req.id, rows_payload(table)),
        Err(e) => table_err(&req.id, e),
    }
}

fn handle_table_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let table = state.tables.get_mut(kind);
    table.reset();
    ok(&req.id, rows_payload(table))
}

fn handle_table_commit_staged(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let today = Local::now().date_naive();
    let table = state.tables.get_mut(kind);
    match table.commit_staged_to_persistent(store, today) {
        Ok(outcome) => {
            log::info!(
                "committed staging buffer for {}: {} inserted, {} rejected",
                kind.as_str(),
                outcome.inserted,
                outcome.rejected.len()
            );
            let rejected: Vec<serde_json::Value> = outcome
                .rejected
                .iter()
                .map(|r| {
                    json!({
                        "row": r.fields,
                        "message": r.reason,
                        "field": admission::field_label(&r.reason),
                    })
                })
                .collect();
            let mut payload = rows_payload(table);
            payload["inserted"] = json!(outcome.inserted);
            payload["rejected"] = json!(rejected);
            ok(&req.id, payload)
        }
        Err(e) => table_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "table.load" => Some(handle_table_load(state, req)),
        "table.rows" => Some(handle_table_rows(state, req)),
        "table.stage" => Some(handle_table_stage(state, req)),
        "table.search" => Some(handle_table_search(state, req)),
        "table.sort" => Some(handle_table_sort(state, req)),
        "table.reset" => Some(handle_table_reset(state, req)),
        "table.commitStaged" => Some(handle_table_commit_staged(state, req)),
        _ => None,
    }
}
