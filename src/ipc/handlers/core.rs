use std::path::PathBuf;

use chrono::{Datelike, Local};
use serde_json::json;

use crate::admission;
use crate::catalog;
use crate::ipc::error::{admission_err, err, ok};
use crate::ipc::types::{AppState, Request, Tables};
use crate::logging;
use crate::store::SchoolStore;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match SchoolStore::open(&path) {
        Ok(store) => {
            // Best-effort: a failed logger must not prevent the workspace
            // from opening.
            if let Err(e) = logging::init(&path.join("logs")) {
                eprintln!("zhurnald: {}", e);
            }
            log::info!("workspace selected: {}", path.display());

            state.workspace = Some(path.clone());
            state.store = Some(store);
            // Any previously loaded rows belonged to another workspace.
            state.tables = Tables::new();
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_meta_subjects(req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "subjects": catalog::SUBJECTS,
            "placeholder": catalog::PRIMARY_BLOCK_SUBJECT,
        }),
    )
}

fn handle_meta_classes(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "classes": catalog::all_class_codes() }))
}

fn handle_seed_demo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let counts = match store.person_counts() {
        Ok(c) => c,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if counts != (0, 0) {
        return ok(&req.id, json!({ "seeded": false }));
    }

    let today = Local::now().date_naive();
    let year = today.year();

    // Birth years are derived from the current date so the demo records pass
    // the same age checks as real input.
    let teachers = [
        ("Иванова Анна Петровна", format!("12.03.{}", year - 41), "Математика", "5А, 6Б, 9А"),
        ("Петров Сергей Владимирович", format!("07.11.{}", year - 48), "Физика", "7А, 8Б, 10А"),
        ("Сидорова Ольга Михайловна", format!("25.06.{}", year - 35), "Русская литература", "5А, 6А, 7А, 8А"),
    ];
    let students = [
        ("Алексеев Александр Сергеевич", "5А", format!("01.01.{}", year - 11)),
        ("Борисова Екатерина Игоревна", "6Б", format!("01.01.{}", year - 12)),
        ("Васильев Максим Дмитриевич", "7А", format!("01.01.{}", year - 13)),
        ("Григорьева София Андреевна", "8Б", format!("01.01.{}", year - 14)),
    ];

    for (fio, birth, subject, classes) in &teachers {
        let admitted = match admission::admit_teacher(fio, birth, subject, classes, today, |t| {
            store.teacher_exists(t, None)
        }) {
            Ok(t) => t,
            Err(e) => return admission_err(&req.id, e),
        };
        if let Err(e) = store.insert_teacher(&admitted) {
            return err(&req.id, "db_insert_failed", e.to_string(), None);
        }
    }
    for (fio, class, birth) in &students {
        let admitted = match admission::admit_student(fio, birth, class, today) {
            Ok(s) => s,
            Err(e) => return admission_err(&req.id, e),
        };
        if let Err(e) = store.insert_student(&admitted) {
            return err(&req.id, "db_insert_failed", e.to_string(), None);
        }
    }

    log::info!(
        "seeded demo data: {} teachers, {} students",
        teachers.len(),
        students.len()
    );

    // Tables backed by the store are stale now; drop them back to unloaded.
    state.tables = Tables::new();

    ok(
        &req.id,
        json!({
            "seeded": true,
            "teachers": teachers.len(),
            "students": students.len(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "meta.subjects" => Some(handle_meta_subjects(req)),
        "meta.classes" => Some(handle_meta_classes(req)),
        "setup.seedDemo" => Some(handle_seed_demo(state, req)),
        _ => None,
    }
}
