use chrono::Local;
use serde_json::json;

use super::{parse_kind, parse_values};
use crate::admission;
use crate::ipc::error::{admission_err, err, ok, table_err};
use crate::ipc::types::{AppState, Request};
use crate::table::Source;

fn handle_records_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let values = match parse_values(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let today = Local::now().date_naive();
    let admitted = match admission::admit_record(store, kind, &values, today, None) {
        Ok(a) => a,
        Err(e) => return admission_err(&req.id, e),
    };
    let id = match admitted.insert(store) {
        Ok(id) => id,
        Err(e) => return err(&req.id, "db_insert_failed", e.to_string(), None),
    };
    log::debug!("added {} record {}", kind.as_str(), id);

    // A store-backed table is stale after the insert; staged tables are not
    // touched, their rows belong to the staging buffer.
    let table = state.tables.get_mut(kind);
    if table.source() == Some(Source::Persistent) {
        if let Err(e) = table.load_from_store(store) {
            return err(&req.id, "db_query_failed", e.to_string(), None);
        }
    }

    ok(&req.id, json!({ "id": id }))
}

fn handle_records_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let values = match parse_values(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(index) = req.params.get("index").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing index", None);
    };
    let index = index as usize;
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let table = state.tables.get_mut(kind);
    let Some(row) = table.row(index) else {
        return err(&req.id, "bad_params", "row index out of range", None);
    };
    let exclude_id = row.id.clone();

    let today = Local::now().date_naive();
    let admitted =
        match admission::admit_record(store, kind, &values, today, exclude_id.as_deref()) {
            Ok(a) => a,
            Err(e) => return admission_err(&req.id, e),
        };

    let fields = admitted.display_fields();
    if let Err(e) = table.mutate(store, index, fields, |store, id| admitted.update(store, id)) {
        return table_err(&req.id, e);
    }
    log::debug!("updated {} row {}", kind.as_str(), index);

    ok(&req.id, super::rows_payload(state.tables.get_mut(kind)))
}

fn handle_records_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let Some(items) = req.params.get("indices").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing indices array", None);
    };
    let mut indices = Vec::with_capacity(items.len());
    for item in items {
        let Some(i) = item.as_u64() else {
            return err(&req.id, "bad_params", "indices must be integers", None);
        };
        indices.push(i as usize);
    }
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let table = state.tables.get_mut(kind);
    match table.delete(store, &indices) {
        Ok(removed) => {
            log::debug!("deleted {} rows from {}", removed, kind.as_str());
            let mut payload = super::rows_payload(table);
            payload["removed"] = json!(removed);
            ok(&req.id, payload)
        }
        Err(e) => table_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.add" => Some(handle_records_add(state, req)),
        "records.update" => Some(handle_records_update(state, req)),
        "records.delete" => Some(handle_records_delete(state, req)),
        _ => None,
    }
}
