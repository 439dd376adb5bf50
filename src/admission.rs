//! Per-kind admission pipelines.
//!
//! A candidate record arrives as raw text fields (typed into a form or read
//! from an interchange file) and leaves either as a fully validated record or
//! as the first rejection reason, in pipeline order. Name parsing failures
//! abort the pipeline immediately; a malformed name makes every downstream
//! check meaningless. All other validators run before the first error is
//! picked, so a candidate is never "fixed one field at a time" against a
//! moving target of reasons.

use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::{self, RecordKind};
use crate::store::SchoolStore;
use crate::validate::{self, FullName, ValidationError, DATE_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub name: FullName,
    pub birth_date: NaiveDate,
    pub subject: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: FullName,
    pub birth_date: NaiveDate,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeEntry {
    pub student_id: String,
    pub student_fio: String,
    pub subject: String,
    pub score: i64,
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub fn display_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Admits a teacher candidate. `exists` answers whether a teacher with the
/// same (surname, given name, patronymic, subject) is already on record.
pub fn admit_teacher(
    full_name: &str,
    birth_date: &str,
    subject: &str,
    classes: &str,
    today: NaiveDate,
    exists: impl FnOnce(&Teacher) -> anyhow::Result<bool>,
) -> Result<Teacher, AdmissionError> {
    let name = validate::parse_full_name(full_name)?;

    let subject = validate::validate_subject(subject);
    let classes = validate::validate_code_set(classes);
    let birth = validate::parse_birth_date(birth_date, today);

    let subject = subject?;
    let classes = classes?;
    let birth = birth?;
    validate::check_teacher_age(validate::age_on(birth, today))?;

    let teacher = Teacher {
        name,
        birth_date: birth,
        subject,
        classes,
    };
    if exists(&teacher).map_err(AdmissionError::Store)? {
        return Err(ValidationError::DuplicateTeacher.into());
    }
    Ok(teacher)
}

/// Admits a student candidate. Students carry a single class code and, unlike
/// teachers, are not checked for duplicates.
pub fn admit_student(
    full_name: &str,
    birth_date: &str,
    class_code: &str,
    today: NaiveDate,
) -> Result<Student, AdmissionError> {
    let name = validate::parse_full_name(full_name)?;

    let class = validate::validate_code(class_code);
    let birth = validate::parse_birth_date(birth_date, today);

    let class = class?;
    let birth = birth?;
    validate::check_student_age(validate::age_on(birth, today), &class)?;

    Ok(Student {
        name,
        birth_date: birth,
        class,
    })
}

/// Admits an assessment entry. The student reference is resolved to its
/// persistent id up front; a dangling reference aborts like a parse failure.
pub fn admit_grade(
    student_fio: &str,
    subject: &str,
    score: &str,
    resolve: impl FnOnce(&FullName) -> anyhow::Result<Option<String>>,
) -> Result<GradeEntry, AdmissionError> {
    let name = validate::parse_full_name(student_fio)?;
    let Some(student_id) = resolve(&name).map_err(AdmissionError::Store)? else {
        return Err(ValidationError::UnknownStudent.into());
    };

    let subject = validate::validate_subject(subject);
    let score = validate::validate_score(score);

    let subject = subject?;
    if subject == catalog::PRIMARY_BLOCK_SUBJECT {
        return Err(ValidationError::PrimaryBlockGrade.into());
    }
    let score = score?;

    Ok(GradeEntry {
        student_id,
        student_fio: name.display(),
        subject,
        score,
    })
}

/// A record admitted through the pipeline, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admitted {
    Teacher(Teacher),
    Student(Student),
    Grade(GradeEntry),
}

impl Admitted {
    pub fn insert(&self, store: &SchoolStore) -> anyhow::Result<String> {
        match self {
            Admitted::Teacher(t) => store.insert_teacher(t),
            Admitted::Student(s) => store.insert_student(s),
            Admitted::Grade(g) => store.insert_grade(g),
        }
    }

    pub fn update(&self, store: &SchoolStore, id: &str) -> anyhow::Result<()> {
        match self {
            Admitted::Teacher(t) => store.update_teacher(id, t),
            Admitted::Student(s) => store.update_student(id, s),
            Admitted::Grade(g) => store.update_grade(id, g),
        }
    }

    /// The display tuple for this record, in its kind's column order.
    pub fn display_fields(&self) -> Vec<String> {
        match self {
            Admitted::Teacher(t) => vec![
                t.name.display(),
                display_date(t.birth_date),
                t.subject.clone(),
                t.classes.join(", "),
            ],
            Admitted::Student(s) => vec![
                s.name.display(),
                display_date(s.birth_date),
                s.class.clone(),
            ],
            Admitted::Grade(g) => vec![
                g.student_fio.clone(),
                g.subject.clone(),
                g.score.to_string(),
            ],
        }
    }
}

/// Admits one display tuple of the given kind against the store. Missing
/// trailing fields count as empty input. `exclude_id` exempts one persistent
/// row from the duplicate check so a record can be updated onto itself.
pub fn admit_record(
    store: &SchoolStore,
    kind: RecordKind,
    fields: &[String],
    today: NaiveDate,
    exclude_id: Option<&str>,
) -> Result<Admitted, AdmissionError> {
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");
    match kind {
        RecordKind::Teachers => admit_teacher(field(0), field(1), field(2), field(3), today, |t| {
            store.teacher_exists(t, exclude_id)
        })
        .map(Admitted::Teacher),
        RecordKind::Students => {
            admit_student(field(0), field(1), field(2), today).map(Admitted::Student)
        }
        RecordKind::Grades => admit_grade(field(0), field(1), field(2), |name| {
            store.find_student_id(name)
        })
        .map(Admitted::Grade),
    }
}

/// Maps a rejection message onto the display label of the offending field.
/// Matching is by keyword fragment, earliest match wins; a message with no
/// known fragment gets no label.
pub fn field_label(message: &str) -> Option<&'static str> {
    const FRAGMENTS: &[(&str, &str)] = &[
        ("name", "ФИО"),
        ("date", "Дата рождения"),
        ("age", "Дата рождения"),
        ("subject", "Предмет"),
        ("score", "Оценка"),
        ("student", "Ученик"),
        ("class", "Класс"),
        ("grade", "Класс"),
        ("letter", "Класс"),
        ("teacher", "ФИО"),
    ];
    FRAGMENTS
        .iter()
        .find(|(fragment, _)| message.contains(fragment))
        .map(|(_, label)| *label)
}
