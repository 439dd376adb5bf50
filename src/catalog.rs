//! School structure: grades, section letters, subjects, age bands, and the
//! display column layout for each record kind.

pub const MIN_GRADE: u32 = 1;
pub const MAX_GRADE: u32 = 11;

/// Grades 1-4 run three parallel sections, 5-11 run two.
pub fn letters_for_grade(grade: u32) -> Option<&'static [char]> {
    match grade {
        1..=4 => Some(&['А', 'Б', 'В']),
        5..=11 => Some(&['А', 'Б']),
        _ => None,
    }
}

/// Every class code the school currently has, in grade order.
pub fn all_class_codes() -> Vec<String> {
    let mut out = Vec::new();
    for grade in MIN_GRADE..=MAX_GRADE {
        if let Some(letters) = letters_for_grade(grade) {
            for letter in letters {
                out.push(format!("{}{}", grade, letter));
            }
        }
    }
    out
}

/// Grades 1-4 are taught by one homeroom teacher under this umbrella subject.
/// It receives no individual assessment entries.
pub const PRIMARY_BLOCK_SUBJECT: &str = "Начальные классы";

pub const SUBJECTS: &[&str] = &[
    PRIMARY_BLOCK_SUBJECT,
    "Русский язык",
    "Русская литература",
    "Иностранный язык",
    "Музыка",
    "ИЗО",
    "Физкультура",
    "Математика",
    "Человек и мир",
    "Английский язык",
    "Немецкий язык",
    "История России",
    "Всемирная история",
    "Физика",
    "Химия",
    "Биология",
    "География",
    "Информатика",
    "ОБЖ",
    "Обществознание",
    "Экономика",
];

pub fn is_known_subject(name: &str) -> bool {
    SUBJECTS.iter().any(|s| *s == name)
}

/// Admissible age range for a student of the given grade, inclusive.
pub fn student_age_band(grade: u32) -> Option<(i32, i32)> {
    if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
        return None;
    }
    let g = grade as i32;
    Some((g + 5, g + 7))
}

pub const TEACHER_MIN_AGE: i32 = 20;
pub const TEACHER_MAX_AGE: i32 = 86;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Teachers,
    Students,
    Grades,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Date,
    ClassCode,
    ClassCodeSet,
    Score,
}

pub struct Column {
    pub header: &'static str,
    pub kind: ColumnKind,
}

const TEACHER_COLUMNS: &[Column] = &[
    Column { header: "ФИО", kind: ColumnKind::Text },
    Column { header: "Дата рождения", kind: ColumnKind::Date },
    Column { header: "Предмет", kind: ColumnKind::Text },
    Column { header: "Классы", kind: ColumnKind::ClassCodeSet },
];

const STUDENT_COLUMNS: &[Column] = &[
    Column { header: "ФИО", kind: ColumnKind::Text },
    Column { header: "Дата рождения", kind: ColumnKind::Date },
    Column { header: "Класс", kind: ColumnKind::ClassCode },
];

const GRADE_COLUMNS: &[Column] = &[
    Column { header: "ФИО", kind: ColumnKind::Text },
    Column { header: "Предмет", kind: ColumnKind::Text },
    Column { header: "Оценка", kind: ColumnKind::Score },
];

impl RecordKind {
    pub fn parse(s: &str) -> Option<RecordKind> {
        match s {
            "teachers" => Some(RecordKind::Teachers),
            "students" => Some(RecordKind::Students),
            "grades" => Some(RecordKind::Grades),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Teachers => "teachers",
            RecordKind::Students => "students",
            RecordKind::Grades => "grades",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            RecordKind::Teachers => TEACHER_COLUMNS,
            RecordKind::Students => STUDENT_COLUMNS,
            RecordKind::Grades => GRADE_COLUMNS,
        }
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.header).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_grades_have_three_sections() {
        assert_eq!(letters_for_grade(1), Some(&['А', 'Б', 'В'][..]));
        assert_eq!(letters_for_grade(4), Some(&['А', 'Б', 'В'][..]));
        assert_eq!(letters_for_grade(5), Some(&['А', 'Б'][..]));
        assert_eq!(letters_for_grade(11), Some(&['А', 'Б'][..]));
        assert_eq!(letters_for_grade(0), None);
        assert_eq!(letters_for_grade(12), None);
    }

    #[test]
    fn class_code_listing_covers_all_grades() {
        let codes = all_class_codes();
        // 4 grades x 3 sections + 7 grades x 2 sections.
        assert_eq!(codes.len(), 4 * 3 + 7 * 2);
        assert_eq!(codes.first().map(String::as_str), Some("1А"));
        assert_eq!(codes.last().map(String::as_str), Some("11Б"));
    }

    #[test]
    fn age_bands_follow_grade() {
        assert_eq!(student_age_band(1), Some((6, 8)));
        assert_eq!(student_age_band(11), Some((16, 18)));
        assert_eq!(student_age_band(0), None);
        assert_eq!(student_age_band(12), None);
    }

    #[test]
    fn subject_vocabulary_is_closed() {
        assert!(is_known_subject("Математика"));
        assert!(is_known_subject(PRIMARY_BLOCK_SUBJECT));
        assert!(!is_known_subject("Астрономия"));
    }
}
