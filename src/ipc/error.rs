use serde_json::json;

use crate::admission::{self, AdmissionError};
use crate::table::TableError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Rejected candidates surface verbatim, tagged with the display label of the
/// offending field so the UI can point at the right input.
pub fn admission_err(id: &str, e: AdmissionError) -> serde_json::Value {
    match e {
        AdmissionError::Invalid(reason) => {
            let message = reason.to_string();
            let details = admission::field_label(&message).map(|label| json!({ "field": label }));
            err(id, "validation_failed", message, details)
        }
        AdmissionError::Store(e) => err(id, "db_error", e.to_string(), None),
    }
}

pub fn table_err(id: &str, e: TableError) -> serde_json::Value {
    let code = match &e {
        TableError::NoFile => "no_file",
        TableError::NoData => "no_data",
        TableError::NoSource => "no_source",
        TableError::BadRowIndex | TableError::BadColumn => "bad_params",
        TableError::Store(_) => "db_error",
    };
    err(id, code, e.to_string(), None)
}
