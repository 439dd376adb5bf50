use std::path::PathBuf;

use serde::Deserialize;

use crate::catalog::RecordKind;
use crate::store::SchoolStore;
use crate::table::TableModel;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One display table per record kind, constructed at startup and swapped out
/// wholesale when a different workspace is selected.
pub struct Tables {
    pub teachers: TableModel,
    pub students: TableModel,
    pub grades: TableModel,
}

impl Tables {
    pub fn new() -> Tables {
        Tables {
            teachers: TableModel::new(RecordKind::Teachers),
            students: TableModel::new(RecordKind::Students),
            grades: TableModel::new(RecordKind::Grades),
        }
    }

    pub fn get_mut(&mut self, kind: RecordKind) -> &mut TableModel {
        match kind {
            RecordKind::Teachers => &mut self.teachers,
            RecordKind::Students => &mut self.students,
            RecordKind::Grades => &mut self.grades,
        }
    }
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<SchoolStore>,
    pub tables: Tables,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            workspace: None,
            store: None,
            tables: Tables::new(),
        }
    }
}
