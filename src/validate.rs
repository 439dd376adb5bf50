//! Leaf validators for candidate record fields.
//!
//! Every check returns the exact reason a field was rejected; the admission
//! pipeline composes these into per-kind decisions and maps the reasons to
//! display field labels at the IPC boundary.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::catalog;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty name")]
    EmptyName,
    #[error("too few name parts")]
    TooFewNameParts,
    #[error("invalid characters in name")]
    BadNameChars,
    #[error("empty date")]
    EmptyDate,
    #[error("bad format")]
    BadDateFormat,
    #[error("future date")]
    FutureDate,
    #[error("bad grade")]
    BadGrade,
    #[error("bad letter")]
    BadLetter,
    #[error("no classes given")]
    NoClasses,
    #[error("unknown subject")]
    UnknownSubject,
    #[error("score not a number")]
    ScoreNotANumber,
    #[error("score out of range")]
    ScoreOutOfRange,
    #[error("teacher age out of range")]
    TeacherAgeOutOfRange,
    #[error("age below minimum for grade")]
    AgeBelowGradeMinimum,
    #[error("age above maximum for grade")]
    AgeAboveGradeMaximum,
    #[error("unknown grade")]
    UnknownGrade,
    #[error("duplicate teacher")]
    DuplicateTeacher,
    #[error("unknown student")]
    UnknownStudent,
    #[error("grade entry for primary class subject")]
    PrimaryBlockGrade,
}

/// Surname / given name / patronymic. The patronymic may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
}

impl FullName {
    /// The ordered concatenation shown in tables, patronymic omitted if empty.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for part in [&self.last_name, &self.first_name, &self.middle_name] {
            if part.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(part);
        }
        out
    }
}

// Cyrillic letter runs joined by a single space or hyphen; no digits, no
// leading or trailing separators.
static NAME_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[А-Яа-яЁё]+(?:[ -][А-Яа-яЁё]+)*$").expect("name pattern"));

pub fn parse_full_name(text: &str) -> Result<FullName, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(ValidationError::TooFewNameParts);
    }

    let last_name = parts[0].to_string();
    let first_name = parts[1].to_string();
    let middle_name = parts[2..].join(" ");

    for part in [&last_name, &first_name] {
        if !NAME_PART.is_match(part) {
            return Err(ValidationError::BadNameChars);
        }
    }
    if !middle_name.is_empty() && !NAME_PART.is_match(&middle_name) {
        return Err(ValidationError::BadNameChars);
    }

    Ok(FullName {
        last_name,
        first_name,
        middle_name,
    })
}

pub const DATE_FORMAT: &str = "%d.%m.%Y";

pub fn parse_birth_date(text: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDate);
    }
    let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::BadDateFormat)?;
    if date > today {
        return Err(ValidationError::FutureDate);
    }
    Ok(date)
}

/// Whole years between `birth` and `today`, not yet counting this year's
/// birthday if it has not happened.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Normalizes a class code to canonical `"<grade><letter>"` form.
pub fn validate_code(code: &str) -> Result<String, ValidationError> {
    let normalized = code.trim().to_uppercase();
    let digits: String = normalized.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(ValidationError::BadGrade);
    }
    let grade: u32 = digits.parse().map_err(|_| ValidationError::BadGrade)?;
    let Some(letters) = catalog::letters_for_grade(grade) else {
        return Err(ValidationError::BadGrade);
    };

    // The digit prefix is ASCII, so its byte length is a char boundary.
    let mut rest = normalized[digits.len()..].chars();
    let letter = match (rest.next(), rest.next()) {
        (Some(l), None) => l,
        _ => return Err(ValidationError::BadLetter),
    };
    if !letters.contains(&letter) {
        return Err(ValidationError::BadLetter);
    }

    Ok(format!("{}{}", grade, letter))
}

/// Validates a comma-separated set of class codes. Order is preserved and
/// duplicates are kept; whether repeated codes should collapse is an open
/// question with the school office.
pub fn validate_code_set(text: &str) -> Result<Vec<String>, ValidationError> {
    let pieces: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if pieces.is_empty() {
        return Err(ValidationError::NoClasses);
    }
    pieces.into_iter().map(validate_code).collect()
}

pub fn validate_subject(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if !catalog::is_known_subject(trimmed) {
        return Err(ValidationError::UnknownSubject);
    }
    Ok(trimmed.to_string())
}

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

pub fn validate_score(text: &str) -> Result<i64, ValidationError> {
    let value: i64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::ScoreNotANumber)?;
    if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(ValidationError::ScoreOutOfRange);
    }
    Ok(value)
}

pub fn check_teacher_age(age: i32) -> Result<(), ValidationError> {
    if !(catalog::TEACHER_MIN_AGE..=catalog::TEACHER_MAX_AGE).contains(&age) {
        return Err(ValidationError::TeacherAgeOutOfRange);
    }
    Ok(())
}

/// Cross-checks a student's age against the band for the grade encoded in a
/// class code. The code does not have to be pre-validated; an unknown grade
/// number is its own error.
pub fn check_student_age(age: i32, class_code: &str) -> Result<(), ValidationError> {
    let digits: String = class_code
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let grade: u32 = digits.parse().map_err(|_| ValidationError::UnknownGrade)?;
    let Some((min_age, max_age)) = catalog::student_age_band(grade) else {
        return Err(ValidationError::UnknownGrade);
    };
    if age < min_age {
        return Err(ValidationError::AgeBelowGradeMinimum);
    }
    if age > max_age {
        return Err(ValidationError::AgeAboveGradeMaximum);
    }
    Ok(())
}
