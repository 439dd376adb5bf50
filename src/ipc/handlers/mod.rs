pub mod core;
pub mod exchange;
pub mod records;
pub mod reports;
pub mod tables;

use serde_json::json;

use super::error::err;
use super::types::Request;
use crate::catalog::RecordKind;
use crate::table::{Source, TableModel};

/// Extracts and validates the `kind` param shared by most table methods.
pub(crate) fn parse_kind(req: &Request) -> Result<RecordKind, serde_json::Value> {
    req.params
        .get("kind")
        .and_then(|v| v.as_str())
        .and_then(RecordKind::parse)
        .ok_or_else(|| err(&req.id, "bad_params", "missing or unknown kind", None))
}

/// Extracts a `values` array of display strings.
pub(crate) fn parse_values(req: &Request) -> Result<Vec<String>, serde_json::Value> {
    let Some(items) = req.params.get("values").and_then(|v| v.as_array()) else {
        return Err(err(&req.id, "bad_params", "missing values array", None));
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Some(s) = item.as_str() else {
            return Err(err(&req.id, "bad_params", "values must be strings", None));
        };
        out.push(s.to_string());
    }
    Ok(out)
}

/// The table payload every row-returning method responds with.
pub(crate) fn rows_payload(table: &TableModel) -> serde_json::Value {
    let source = match table.source() {
        None => serde_json::Value::Null,
        Some(Source::Persistent) => json!("persistent"),
        Some(Source::Staged) => json!("staged"),
    };
    let rows: Vec<serde_json::Value> = table
        .rows()
        .iter()
        .map(|r| json!({ "id": r.id, "values": r.fields }))
        .collect();
    json!({
        "source": source,
        "columns": table.kind().headers(),
        "rows": rows,
    })
}
