//! CSV interchange files.
//!
//! The table layer only needs field tuples in and out; this module maps one
//! record kind's rows onto a headed CSV file. Rows whose field count does not
//! match the kind's column set are dropped on read, the same way the desktop
//! app ignored short lines.

use std::path::Path;

use anyhow::Context;

use crate::catalog::RecordKind;
use crate::table::DisplayRow;

pub fn read_rows(path: &Path, kind: RecordKind) -> anyhow::Result<Vec<Vec<String>>> {
    let expected = kind.columns().len();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open interchange file {}", path.display()))?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read {}", path.display()))?;
        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        if fields.len() != expected {
            continue;
        }
        if fields.iter().all(String::is_empty) {
            continue;
        }
        out.push(fields);
    }
    Ok(out)
}

pub fn write_rows(path: &Path, kind: RecordKind, rows: &[DisplayRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create interchange file {}", path.display()))?;
    writer.write_record(kind.headers())?;
    for row in rows {
        writer.write_record(&row.fields)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_keeps_field_tuples() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("students.csv");

        let rows = vec![
            DisplayRow {
                id: None,
                fields: vec!["Иванов Пётр".into(), "01.09.2016".into(), "2Б".into()],
            },
            DisplayRow {
                id: None,
                fields: vec!["Борисова, Екатерина".into(), "".into(), "2А".into()],
            },
        ];
        write_rows(&path, RecordKind::Students, &rows).expect("write");

        let read = read_rows(&path, RecordKind::Students).expect("read");
        assert_eq!(read.len(), 2);
        assert_eq!(read[0], vec!["Иванов Пётр", "01.09.2016", "2Б"]);
        // Embedded commas survive quoting.
        assert_eq!(read[1][0], "Борисова, Екатерина");
    }

    #[test]
    fn short_and_blank_lines_are_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("students.csv");
        std::fs::write(
            &path,
            "ФИО,Дата рождения,Класс\nИванов Пётр,01.09.2016,2Б\nобрывок\n,,\n",
        )
        .expect("write raw");

        let read = read_rows(&path, RecordKind::Students).expect("read");
        assert_eq!(read.len(), 1);
    }
}
