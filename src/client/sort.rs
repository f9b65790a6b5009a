//! Local secondary sort of an already-loaded page. Never refetches.

use std::cmp::Ordering;

use feruca::Collator;

use crate::model::Student;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    FirstName,
    LastName,
    Gender,
    AverageScore,
    GroupNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::LastName,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// Same column flips direction; a new column starts ascending.
    pub fn select(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = match self.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.column = column;
            self.direction = SortDirection::Ascending;
        }
    }

    /// Sorts `rows` in place. Text columns use root-locale collation.
    pub fn sort(&self, rows: &mut [&Student]) {
        let mut collator = Collator::default();
        rows.sort_by(|a, b| self.compare(&mut collator, a, b));
    }

    pub fn compare(&self, collator: &mut Collator, a: &Student, b: &Student) -> Ordering {
        let ord = compare_keys(
            collator,
            sort_key(a, self.column),
            sort_key(b, self.column),
        );
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

/// Blank text counts as a missing value.
fn sort_key(student: &Student, column: SortColumn) -> Option<SortKey<'_>> {
    let text = match column {
        SortColumn::FirstName => student.first_name.as_str(),
        SortColumn::LastName => student.last_name.as_str(),
        SortColumn::Gender => student.gender.as_str(),
        SortColumn::GroupNumber => student.group_number.as_str(),
        SortColumn::AverageScore => return Some(SortKey::Number(student.average_score)),
    };
    (!text.trim().is_empty()).then_some(SortKey::Text(text))
}

/// Ascending order with missing values first.
fn compare_keys(
    collator: &mut Collator,
    a: Option<SortKey<'_>>,
    b: Option<SortKey<'_>>,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(SortKey::Number(x)), Some(SortKey::Number(y))) => x.total_cmp(&y),
        (Some(SortKey::Text(x)), Some(SortKey::Text(y))) => collate(collator, x, y),
        (Some(SortKey::Number(_)), Some(SortKey::Text(_))) => Ordering::Less,
        (Some(SortKey::Text(_)), Some(SortKey::Number(_))) => Ordering::Greater,
    }
}

/// Unicode Collation Algorithm order (CLDR root), byte order as the
/// tiebreak.
pub fn collate(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    collator.collate(a, b).then_with(|| a.cmp(b))
}
