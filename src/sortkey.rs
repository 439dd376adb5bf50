//! Comparable keys for table columns.
//!
//! Keys are total over any input: a malformed or empty value degrades to the
//! column's sentinel (minimum date, grade 0, score 0) instead of failing the
//! sort. Within one column every key is the same variant, so the derived
//! ordering never compares across variants.

use chrono::NaiveDate;

use crate::catalog::ColumnKind;
use crate::validate::DATE_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Date(NaiveDate),
    Class(u32, String),
    ClassSet(u32, String),
    Score(i64),
}

pub fn sort_key(kind: ColumnKind, value: &str) -> SortKey {
    match kind {
        ColumnKind::Text => SortKey::Text(value.to_lowercase()),
        ColumnKind::Date => SortKey::Date(
            NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).unwrap_or(NaiveDate::MIN),
        ),
        ColumnKind::ClassCode => {
            let (grade, letters) = split_class(value);
            SortKey::Class(grade, letters)
        }
        ColumnKind::ClassCodeSet => {
            SortKey::ClassSet(min_grade(value), value.trim().to_uppercase())
        }
        ColumnKind::Score => SortKey::Score(value.trim().parse().unwrap_or(0)),
    }
}

/// Splits a single class code into (grade number, letter part). All digits
/// anywhere in the string make up the number, everything else the letters.
fn split_class(value: &str) -> (u32, String) {
    let normalized = value.trim().to_uppercase();
    let mut digits = String::new();
    let mut letters = String::new();
    for ch in normalized.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            letters.push(ch);
        }
    }
    (digits.parse().unwrap_or(0), letters)
}

/// The smallest grade number mentioned anywhere in a comma-joined code set.
fn min_grade(value: &str) -> u32 {
    let normalized = value.trim().to_uppercase();
    let mut best: Option<u32> = None;
    let mut run = String::new();
    for ch in normalized.chars().chain(std::iter::once('\0')) {
        if ch.is_ascii_digit() {
            run.push(ch);
            continue;
        }
        if !run.is_empty() {
            if let Ok(n) = run.parse::<u32>() {
                best = Some(best.map_or(n, |b| b.min(n)));
            }
            run.clear();
        }
    }
    best.unwrap_or(0)
}
