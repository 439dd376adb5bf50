//! Dual-source display tables.
//!
//! Each record kind owns one `TableModel`. Its rows are backed either by the
//! persistent store or by a staging buffer loaded from an interchange file,
//! never a mix. Mutations against the store reload the table afterwards
//! (read-after-write; the store may normalize what it was given), staged
//! mutations patch the buffer locally. A shadow baseline makes search and
//! sort reversible, and `commit_staged_to_persistent` replays the staging
//! buffer through the admission pipeline row by row.

use chrono::NaiveDate;
use thiserror::Error;

use crate::admission::{self, AdmissionError};
use crate::catalog::RecordKind;
use crate::sortkey::{self, SortKey};
use crate::store::SchoolStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    /// Present only for store-backed rows.
    pub id: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Persistent,
    Staged,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("no staging data was loaded")]
    NoFile,
    #[error("no staged rows to commit")]
    NoData,
    #[error("no rows are loaded")]
    NoSource,
    #[error("row index out of range")]
    BadRowIndex,
    #[error("column index out of range")]
    BadColumn,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub fields: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub inserted: usize,
    pub rejected: Vec<RejectedRow>,
}

pub struct TableModel {
    kind: RecordKind,
    source: Option<Source>,
    staging_loaded: bool,
    rows: Vec<DisplayRow>,
    baseline: Vec<DisplayRow>,
}

impl TableModel {
    pub fn new(kind: RecordKind) -> TableModel {
        TableModel {
            kind,
            source: None,
            staging_loaded: false,
            rows: Vec::new(),
            baseline: Vec::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn source(&self) -> Option<Source> {
        self.source
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DisplayRow> {
        self.rows.get(index)
    }

    pub fn load_from_store(&mut self, store: &SchoolStore) -> anyhow::Result<()> {
        let rows = store.fetch_all(self.kind)?;
        self.baseline = rows.clone();
        self.rows = rows;
        self.source = Some(Source::Persistent);
        Ok(())
    }

    /// Replaces the table with caller-supplied tuples. The previous content,
    /// whatever its source, is discarded.
    pub fn load_from_staging(&mut self, tuples: Vec<Vec<String>>) {
        let rows: Vec<DisplayRow> = tuples
            .into_iter()
            .map(|fields| DisplayRow { id: None, fields })
            .collect();
        self.baseline = rows.clone();
        self.rows = rows;
        self.source = Some(Source::Staged);
        self.staging_loaded = true;
    }

    /// Replaces one row. Store-backed tables write through `update` (called
    /// with the row's id) and reload; staged tables patch the tuple locally.
    pub fn mutate(
        &mut self,
        store: &SchoolStore,
        index: usize,
        fields: Vec<String>,
        update: impl FnOnce(&SchoolStore, &str) -> anyhow::Result<()>,
    ) -> Result<(), TableError> {
        match self.source {
            None => Err(TableError::NoSource),
            Some(Source::Persistent) => {
                let row = self.rows.get(index).ok_or(TableError::BadRowIndex)?;
                let id = row
                    .id
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("store-backed row has no id"))?;
                update(store, &id)?;
                self.load_from_store(store)?;
                Ok(())
            }
            Some(Source::Staged) => {
                let row = self.rows.get_mut(index).ok_or(TableError::BadRowIndex)?;
                row.fields = fields;
                self.baseline = self.rows.clone();
                Ok(())
            }
        }
    }

    /// Deletes rows by index into the current row set. Store-backed rows are
    /// deleted from the store (the store cascades dependent grade entries)
    /// and the table reloads; staged rows just leave the buffer.
    pub fn delete(&mut self, store: &SchoolStore, indices: &[usize]) -> Result<usize, TableError> {
        if indices.iter().any(|&i| i >= self.rows.len()) {
            return Err(TableError::BadRowIndex);
        }
        match self.source {
            None => Err(TableError::NoSource),
            Some(Source::Persistent) => {
                let mut removed = 0;
                for &i in indices {
                    let id = self.rows[i]
                        .id
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("store-backed row has no id"))?;
                    store.delete_row(self.kind, &id)?;
                    removed += 1;
                }
                self.load_from_store(store)?;
                Ok(removed)
            }
            Some(Source::Staged) => {
                let mut order: Vec<usize> = indices.to_vec();
                order.sort_unstable();
                order.dedup();
                for &i in order.iter().rev() {
                    self.rows.remove(i);
                }
                let removed = order.len();
                self.baseline = self.rows.clone();
                Ok(removed)
            }
        }
    }

    /// Replays the staging buffer through the admission pipeline. Rows that
    /// fail admission are skipped and reported, not fatal; the table ends up
    /// store-backed either way. Store access failures abort the batch.
    pub fn commit_staged_to_persistent(
        &mut self,
        store: &SchoolStore,
        today: NaiveDate,
    ) -> Result<CommitOutcome, TableError> {
        if !self.staging_loaded {
            return Err(TableError::NoFile);
        }
        let staged: Vec<DisplayRow> = if self.source == Some(Source::Staged) {
            self.baseline.clone()
        } else {
            Vec::new()
        };
        if staged.is_empty() {
            return Err(TableError::NoData);
        }

        let mut inserted = 0;
        let mut rejected = Vec::new();
        for row in &staged {
            match admission::admit_record(store, self.kind, &row.fields, today, None) {
                Ok(admitted) => {
                    admitted.insert(store)?;
                    inserted += 1;
                }
                Err(AdmissionError::Invalid(reason)) => rejected.push(RejectedRow {
                    fields: row.fields.clone(),
                    reason: reason.to_string(),
                }),
                Err(AdmissionError::Store(e)) => return Err(TableError::Store(e)),
            }
        }

        self.load_from_store(store)?;
        Ok(CommitOutcome { inserted, rejected })
    }

    /// Narrows the visible rows to those with any field containing `term`,
    /// case-insensitively. Always filters from the baseline, so consecutive
    /// searches do not compound.
    pub fn search(&mut self, term: &str) {
        let needle = term.to_lowercase();
        self.rows = self
            .baseline
            .iter()
            .filter(|row| {
                row.fields
                    .iter()
                    .any(|f| f.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
    }

    /// Stable sort of the visible rows by one column's key. Equal keys keep
    /// their current relative order in either direction.
    pub fn sort(&mut self, column: usize, descending: bool) -> Result<(), TableError> {
        let col = self
            .kind
            .columns()
            .get(column)
            .ok_or(TableError::BadColumn)?;
        let col_kind = col.kind;

        let mut decorated: Vec<(SortKey, DisplayRow)> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| {
                let value = row.fields.get(column).map(String::as_str).unwrap_or("");
                (sortkey::sort_key(col_kind, value), row)
            })
            .collect();
        decorated.sort_by(|a, b| {
            if descending {
                b.0.cmp(&a.0)
            } else {
                a.0.cmp(&b.0)
            }
        });
        self.rows = decorated.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }

    /// Restores the visible rows to the shadow baseline, undoing any search
    /// narrowing and sort order.
    pub fn reset(&mut self) {
        self.rows = self.baseline.clone();
    }
}
