use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::AcademicRow;

fn rows_json(rows: &[AcademicRow]) -> Vec<serde_json::Value> {
    rows.iter()
        .map(|r| json!({ "fio": r.fio, "class": r.class }))
        .collect()
}

/// Academic standing summary: who averages at least 4.5 and who sits below
/// 3.5. Rendering is the presentation layer's business.
fn handle_reports_academic(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match store.academic_report() {
        Ok(report) => ok(
            &req.id,
            json!({
                "goodStudents": rows_json(&report.good),
                "badStudents": rows_json(&report.bad),
                "totalStudents": report.total_students,
            }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.academic" => Some(handle_reports_academic(state, req)),
        _ => None,
    }
}
