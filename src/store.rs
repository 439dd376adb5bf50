//! SQLite-backed system of record.
//!
//! One connection per process, opened when the workspace is selected. Rows
//! carry opaque TEXT ids; callers above this layer never see SQL.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::admission::{display_date, GradeEntry, Student, Teacher};
use crate::catalog::RecordKind;
use crate::table::DisplayRow;
use crate::validate::FullName;

const ISO_DATE: &str = "%Y-%m-%d";

pub struct SchoolStore {
    conn: Connection,
}

impl SchoolStore {
    pub fn open(workspace: &Path) -> anyhow::Result<SchoolStore> {
        std::fs::create_dir_all(workspace)?;
        let db_path = workspace.join("school.sqlite3");
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> anyhow::Result<SchoolStore> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<SchoolStore> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS teachers(
                id TEXT PRIMARY KEY,
                last_name TEXT NOT NULL,
                first_name TEXT NOT NULL,
                middle_name TEXT NOT NULL DEFAULT '',
                birth_date TEXT NOT NULL,
                subject TEXT NOT NULL,
                classes TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS students(
                id TEXT PRIMARY KEY,
                last_name TEXT NOT NULL,
                first_name TEXT NOT NULL,
                middle_name TEXT NOT NULL DEFAULT '',
                birth_date TEXT NOT NULL,
                class_name TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS grades(
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                grade INTEGER NOT NULL,
                FOREIGN KEY(student_id) REFERENCES students(id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_grades_student ON grades(student_id)",
            [],
        )?;

        Ok(SchoolStore { conn })
    }

    pub fn insert_teacher(&self, t: &Teacher) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO teachers(id, last_name, first_name, middle_name, birth_date, subject, classes)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                &t.name.last_name,
                &t.name.first_name,
                &t.name.middle_name,
                t.birth_date.format(ISO_DATE).to_string(),
                &t.subject,
                t.classes.join(", "),
            ),
        )?;
        Ok(id)
    }

    pub fn update_teacher(&self, id: &str, t: &Teacher) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE teachers
             SET last_name = ?, first_name = ?, middle_name = ?, birth_date = ?, subject = ?, classes = ?
             WHERE id = ?",
            (
                &t.name.last_name,
                &t.name.first_name,
                &t.name.middle_name,
                t.birth_date.format(ISO_DATE).to_string(),
                &t.subject,
                t.classes.join(", "),
                id,
            ),
        )?;
        Ok(())
    }

    pub fn delete_teacher(&self, id: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM teachers WHERE id = ?", [id])?;
        Ok(())
    }

    pub fn insert_student(&self, s: &Student) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO students(id, last_name, first_name, middle_name, birth_date, class_name)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &id,
                &s.name.last_name,
                &s.name.first_name,
                &s.name.middle_name,
                s.birth_date.format(ISO_DATE).to_string(),
                &s.class,
            ),
        )?;
        Ok(id)
    }

    pub fn update_student(&self, id: &str, s: &Student) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE students
             SET last_name = ?, first_name = ?, middle_name = ?, birth_date = ?, class_name = ?
             WHERE id = ?",
            (
                &s.name.last_name,
                &s.name.first_name,
                &s.name.middle_name,
                s.birth_date.format(ISO_DATE).to_string(),
                &s.class,
                id,
            ),
        )?;
        Ok(())
    }

    /// Removes a student together with every grade entry that references it.
    pub fn delete_student(&self, id: &str) -> anyhow::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM grades WHERE student_id = ?", [id])?;
        tx.execute("DELETE FROM students WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn insert_grade(&self, g: &GradeEntry) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO grades(id, student_id, subject_name, grade) VALUES(?, ?, ?, ?)",
            (&id, &g.student_id, &g.subject, g.score),
        )?;
        Ok(id)
    }

    pub fn update_grade(&self, id: &str, g: &GradeEntry) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE grades SET student_id = ?, subject_name = ?, grade = ? WHERE id = ?",
            (&g.student_id, &g.subject, g.score, id),
        )?;
        Ok(())
    }

    pub fn delete_grade(&self, id: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM grades WHERE id = ?", [id])?;
        Ok(())
    }

    pub fn delete_row(&self, kind: RecordKind, id: &str) -> anyhow::Result<()> {
        match kind {
            RecordKind::Teachers => self.delete_teacher(id),
            RecordKind::Students => self.delete_student(id),
            RecordKind::Grades => self.delete_grade(id),
        }
    }

    /// All rows of one kind as display tuples, in insertion order.
    pub fn fetch_all(&self, kind: RecordKind) -> anyhow::Result<Vec<DisplayRow>> {
        match kind {
            RecordKind::Teachers => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, last_name, first_name, middle_name, birth_date, subject, classes
                     FROM teachers ORDER BY rowid",
                )?;
                let rows = stmt.query_map([], |row| {
                    let fio = fio_from_parts(row.get(1)?, row.get(2)?, row.get(3)?);
                    Ok(DisplayRow {
                        id: Some(row.get(0)?),
                        fields: vec![
                            fio,
                            display_from_iso(&row.get::<_, String>(4)?),
                            row.get(5)?,
                            row.get(6)?,
                        ],
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            RecordKind::Students => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, last_name, first_name, middle_name, birth_date, class_name
                     FROM students ORDER BY rowid",
                )?;
                let rows = stmt.query_map([], |row| {
                    let fio = fio_from_parts(row.get(1)?, row.get(2)?, row.get(3)?);
                    Ok(DisplayRow {
                        id: Some(row.get(0)?),
                        fields: vec![
                            fio,
                            display_from_iso(&row.get::<_, String>(4)?),
                            row.get(5)?,
                        ],
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            RecordKind::Grades => {
                let mut stmt = self.conn.prepare(
                    "SELECT g.id, s.last_name, s.first_name, s.middle_name, g.subject_name, g.grade
                     FROM grades g
                     JOIN students s ON s.id = g.student_id
                     ORDER BY g.rowid",
                )?;
                let rows = stmt.query_map([], |row| {
                    let fio = fio_from_parts(row.get(1)?, row.get(2)?, row.get(3)?);
                    Ok(DisplayRow {
                        id: Some(row.get(0)?),
                        fields: vec![fio, row.get(4)?, row.get::<_, i64>(5)?.to_string()],
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
        }
    }

    /// Natural-key duplicate probe for teachers. `exclude_id` exempts one row
    /// so updates do not collide with themselves.
    pub fn teacher_exists(&self, t: &Teacher, exclude_id: Option<&str>) -> anyhow::Result<bool> {
        let found: Option<i64> = match exclude_id {
            Some(id) => self
                .conn
                .query_row(
                    "SELECT 1 FROM teachers
                     WHERE last_name = ? AND first_name = ? AND COALESCE(middle_name, '') = ?
                       AND subject = ? AND id <> ?
                     LIMIT 1",
                    (
                        &t.name.last_name,
                        &t.name.first_name,
                        &t.name.middle_name,
                        &t.subject,
                        id,
                    ),
                    |r| r.get(0),
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    "SELECT 1 FROM teachers
                     WHERE last_name = ? AND first_name = ? AND COALESCE(middle_name, '') = ?
                       AND subject = ?
                     LIMIT 1",
                    (
                        &t.name.last_name,
                        &t.name.first_name,
                        &t.name.middle_name,
                        &t.subject,
                    ),
                    |r| r.get(0),
                )
                .optional()?,
        };
        Ok(found.is_some())
    }

    pub fn find_student_id(&self, name: &FullName) -> anyhow::Result<Option<String>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM students
                 WHERE last_name = ? AND first_name = ? AND COALESCE(middle_name, '') = ?
                 LIMIT 1",
                (&name.last_name, &name.first_name, &name.middle_name),
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn person_counts(&self) -> anyhow::Result<(i64, i64)> {
        let teachers = self
            .conn
            .query_row("SELECT COUNT(*) FROM teachers", [], |r| r.get(0))?;
        let students = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
        Ok((teachers, students))
    }

    /// Students doing well (average >= 4.5) and poorly (average < 3.5).
    pub fn academic_report(&self) -> anyhow::Result<AcademicReport> {
        let good = self.students_by_average("AVG(grade) >= 4.5")?;
        let bad = self.students_by_average("AVG(grade) < 3.5")?;
        let total_students = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
        Ok(AcademicReport {
            good,
            bad,
            total_students,
        })
    }

    fn students_by_average(&self, having: &str) -> anyhow::Result<Vec<AcademicRow>> {
        let sql = format!(
            "SELECT last_name, first_name, middle_name, class_name
             FROM students
             WHERE id IN (
                 SELECT student_id FROM grades GROUP BY student_id HAVING {}
             )
             ORDER BY last_name, first_name",
            having
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(AcademicRow {
                fio: fio_from_parts(row.get(0)?, row.get(1)?, row.get(2)?),
                class: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[derive(Debug, Clone)]
pub struct AcademicRow {
    pub fio: String,
    pub class: String,
}

#[derive(Debug, Clone)]
pub struct AcademicReport {
    pub good: Vec<AcademicRow>,
    pub bad: Vec<AcademicRow>,
    pub total_students: i64,
}

fn fio_from_parts(last: String, first: String, middle: String) -> String {
    FullName {
        last_name: last,
        first_name: first,
        middle_name: middle,
    }
    .display()
}

fn display_from_iso(iso: &str) -> String {
    match NaiveDate::parse_from_str(iso, ISO_DATE) {
        Ok(d) => display_date(d),
        Err(_) => iso.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::parse_full_name;
    use chrono::NaiveDate;

    fn teacher(fio: &str, subject: &str) -> Teacher {
        Teacher {
            name: parse_full_name(fio).expect("name"),
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 12).expect("date"),
            subject: subject.to_string(),
            classes: vec!["5А".to_string(), "6Б".to_string()],
        }
    }

    fn student(fio: &str, class: &str) -> Student {
        Student {
            name: parse_full_name(fio).expect("name"),
            birth_date: NaiveDate::from_ymd_opt(2015, 9, 1).expect("date"),
            class: class.to_string(),
        }
    }

    #[test]
    fn teacher_roundtrip_and_duplicate_probe() {
        let store = SchoolStore::open_in_memory().expect("open");
        let t = teacher("Иванова Анна Петровна", "Математика");
        let id = store.insert_teacher(&t).expect("insert");

        assert!(store.teacher_exists(&t, None).expect("exists"));
        assert!(!store.teacher_exists(&t, Some(&id)).expect("exists"));
        assert!(!store
            .teacher_exists(&teacher("Иванова Анна Петровна", "Физика"), None)
            .expect("exists"));

        let rows = store.fetch_all(RecordKind::Teachers).expect("fetch");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(
            rows[0].fields,
            vec!["Иванова Анна Петровна", "12.03.1985", "Математика", "5А, 6Б"]
        );
    }

    #[test]
    fn deleting_student_cascades_to_grades() {
        let store = SchoolStore::open_in_memory().expect("open");
        let s = student("Алексеев Александр Сергеевич", "5А");
        let sid = store.insert_student(&s).expect("insert student");
        store
            .insert_grade(&GradeEntry {
                student_id: sid.clone(),
                student_fio: s.name.display(),
                subject: "Физика".to_string(),
                score: 5,
            })
            .expect("insert grade");

        assert_eq!(store.fetch_all(RecordKind::Grades).expect("fetch").len(), 1);
        store.delete_student(&sid).expect("delete");
        assert_eq!(store.fetch_all(RecordKind::Grades).expect("fetch").len(), 0);
        assert_eq!(
            store.fetch_all(RecordKind::Students).expect("fetch").len(),
            0
        );
    }

    #[test]
    fn grade_rows_join_student_names() {
        let store = SchoolStore::open_in_memory().expect("open");
        let s = student("Борисова Екатерина Игоревна", "6Б");
        let sid = store.insert_student(&s).expect("insert");
        store
            .insert_grade(&GradeEntry {
                student_id: sid,
                student_fio: s.name.display(),
                subject: "Математика".to_string(),
                score: 4,
            })
            .expect("insert grade");

        let rows = store.fetch_all(RecordKind::Grades).expect("fetch");
        assert_eq!(
            rows[0].fields,
            vec!["Борисова Екатерина Игоревна", "Математика", "4"]
        );
    }

    #[test]
    fn academic_report_buckets_by_average() {
        let store = SchoolStore::open_in_memory().expect("open");
        let strong = student("Иванов Пётр", "5А");
        let weak = student("Сидоров Максим", "5Б");
        let strong_id = store.insert_student(&strong).expect("insert");
        let weak_id = store.insert_student(&weak).expect("insert");

        for (sid, fio, score) in [
            (&strong_id, "Иванов Пётр", 5),
            (&strong_id, "Иванов Пётр", 5),
            (&weak_id, "Сидоров Максим", 3),
            (&weak_id, "Сидоров Максим", 3),
        ] {
            store
                .insert_grade(&GradeEntry {
                    student_id: sid.clone(),
                    student_fio: fio.to_string(),
                    subject: "Математика".to_string(),
                    score,
                })
                .expect("insert grade");
        }

        let report = store.academic_report().expect("report");
        assert_eq!(report.total_students, 2);
        assert_eq!(report.good.len(), 1);
        assert_eq!(report.good[0].fio, "Иванов Пётр");
        assert_eq!(report.bad.len(), 1);
        assert_eq!(report.bad[0].class, "5Б");
    }
}
