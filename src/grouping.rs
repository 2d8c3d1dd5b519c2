//! Classification of selected questions into sections and sub-groups.
//!
//! A paper is organised by mark value: every mark value present in the
//! selection becomes one [`Section`] with a fixed label and name taken from a
//! [`MarkTable`]. Inside a section, questions are grouped by a resolved title
//! into [`SubGroup`]s. Both levels keep the selection order.

use log::{debug, warn};

use crate::error::{PaperError, Result};
use crate::model::Question;

/// Title of the single sub-group used when a paper is not section-wise.
pub const FLAT_SUBGROUP_TITLE: &str = "All";

/// One row of the mark table: the canonical label and name for a mark value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkEntry {
    marks: u32,
    label: String,
    name: String,
}

impl MarkEntry {
    /// Creates a table row.
    pub fn new(marks: u32, label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            marks,
            label: label.into(),
            name: name.into(),
        }
    }

    /// Returns the mark value this row classifies.
    pub fn marks(&self) -> u32 {
        self.marks
    }

    /// Returns the section letter.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the canonical section name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The valid mark domain together with the section each value maps to.
///
/// Questions whose mark value has no row in the table are left out of the
/// section tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkTable {
    entries: Vec<MarkEntry>,
}

impl MarkTable {
    /// The six-row table used by default: marks 1 to 6 map to sections A to F.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                MarkEntry::new(1, "A", "MCQs"),
                MarkEntry::new(2, "B", "Short Answer"),
                MarkEntry::new(3, "C", "Medium Answer"),
                MarkEntry::new(4, "D", "Long Answer"),
                MarkEntry::new(5, "E", "Very Long Answer"),
                MarkEntry::new(6, "F", "Essay/Other"),
            ],
        }
    }

    /// Builds a custom table. Rows are sorted by mark value.
    ///
    /// The table must not be empty and must not list a mark value twice.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = MarkEntry>,
    {
        let mut entries: Vec<MarkEntry> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(PaperError::InvalidMarkTable(
                "at least one mark value is required".into(),
            ));
        }

        entries.sort_by_key(MarkEntry::marks);
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].marks == pair[1].marks) {
            return Err(PaperError::InvalidMarkTable(format!(
                "mark value {} is listed more than once",
                pair[0].marks
            )));
        }

        Ok(Self { entries })
    }

    /// Restricts the standard table to marks `1..=max`.
    pub fn standard_up_to(max: u32) -> Result<Self> {
        Self::from_entries(
            Self::standard()
                .entries
                .into_iter()
                .filter(|entry| entry.marks <= max),
        )
    }

    /// Returns the row for `marks`, if the value is in the domain.
    pub fn lookup(&self, marks: i64) -> Option<&MarkEntry> {
        self.position(marks).map(|index| &self.entries[index])
    }

    fn position(&self, marks: i64) -> Option<usize> {
        let marks = u32::try_from(marks).ok()?;
        self.entries
            .binary_search_by_key(&marks, MarkEntry::marks)
            .ok()
    }

    /// Returns the rows in ascending mark order.
    pub fn entries(&self) -> &[MarkEntry] {
        &self.entries
    }
}

impl Default for MarkTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Adds up mark values, saturating at the bounds of `i64`.
///
/// Flat papers keep every mark value the selection carries, so totals can
/// exceed the range of a single value.
pub fn sum_marks<I: IntoIterator<Item = i64>>(marks: I) -> i64 {
    marks.into_iter().fold(0i64, i64::saturating_add)
}

/// Total marks of a run of questions and the shared mark value, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarkSummary {
    /// Sum of the marks of every question.
    pub total: i64,
    /// The mark value every question carries, when they all agree.
    pub uniform: Option<i64>,
}

impl MarkSummary {
    /// Summarises `questions`. An empty run has no uniform value.
    pub fn of(questions: &[&Question]) -> Self {
        let total = sum_marks(questions.iter().map(|question| question.marks()));
        let uniform = match questions.split_first() {
            Some((first, rest)) if rest.iter().all(|q| q.marks() == first.marks()) => {
                Some(first.marks())
            }
            _ => None,
        };
        Self { total, uniform }
    }
}

/// Questions of one section that share a resolved title.
#[derive(Clone, Debug, PartialEq)]
pub struct SubGroup<'q> {
    title: String,
    questions: Vec<&'q Question>,
    summary: MarkSummary,
}

impl<'q> SubGroup<'q> {
    /// Creates a sub-group and computes its mark summary.
    pub fn new(title: impl Into<String>, questions: Vec<&'q Question>) -> Self {
        let summary = MarkSummary::of(&questions);
        Self {
            title: title.into(),
            questions,
            summary,
        }
    }

    /// Returns the resolved title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the member questions in selection order.
    pub fn questions(&self) -> &[&'q Question] {
        &self.questions
    }

    /// Returns the number of member questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Returns whether the sub-group has no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns the sum of member marks.
    pub fn total_marks(&self) -> i64 {
        self.summary.total
    }

    /// Returns the mark value shared by every member, if any.
    pub fn uniform_marks(&self) -> Option<i64> {
        self.summary.uniform
    }
}

/// All questions of one mark value.
#[derive(Clone, Debug, PartialEq)]
pub struct Section<'q> {
    marks: Option<u32>,
    label: String,
    name: String,
    subgroups: Vec<SubGroup<'q>>,
    total_marks: i64,
}

impl<'q> Section<'q> {
    fn new(entry: Option<&MarkEntry>, subgroups: Vec<SubGroup<'q>>) -> Self {
        let total_marks = sum_marks(subgroups.iter().map(SubGroup::total_marks));
        let (marks, label, name) = match entry {
            Some(entry) => (Some(entry.marks), entry.label.clone(), entry.name.clone()),
            None => (None, String::new(), FLAT_SUBGROUP_TITLE.to_owned()),
        };
        Self {
            marks,
            label,
            name,
            subgroups,
            total_marks,
        }
    }

    /// Returns the mark value of the section, or `None` for a flat paper.
    pub fn marks(&self) -> Option<u32> {
        self.marks
    }

    /// Returns the section letter; empty for a flat paper.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the canonical section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether this is the single section of a flat paper.
    pub fn is_flat(&self) -> bool {
        self.marks.is_none()
    }

    /// Returns the sub-groups in first-seen order.
    pub fn subgroups(&self) -> &[SubGroup<'q>] {
        &self.subgroups
    }

    /// Returns the sum of marks over every sub-group.
    pub fn total_marks(&self) -> i64 {
        self.total_marks
    }

    /// Returns the number of questions in the section.
    pub fn question_count(&self) -> usize {
        self.subgroups.iter().map(SubGroup::len).sum()
    }
}

/// Returns whether the subject forces one sub-group per section.
///
/// Mathematics and science papers are graded by mark value only, so their
/// free-form section labels are ignored.
pub fn uses_canonical_titles(subject: &str) -> bool {
    let subject = subject.to_lowercase();
    subject.contains("math") || subject.contains("science")
}

fn resolve_title<'a>(question: &'a Question, entry: &'a MarkEntry, canonical: bool) -> &'a str {
    if canonical {
        return entry.name();
    }
    question
        .section_title()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| entry.name())
}

/// Groups `questions` into sections by mark value, then into sub-groups by
/// resolved title.
///
/// Sections come out in ascending mark order; mark values without questions
/// produce no section.
pub fn build<'q>(questions: &'q [Question], subject: &str, table: &MarkTable) -> Vec<Section<'q>> {
    let canonical = uses_canonical_titles(subject);
    let mut excluded = 0usize;

    // (title, members) per table row, in first-seen title order.
    let mut buckets: Vec<Vec<(&str, Vec<&'q Question>)>> = vec![Vec::new(); table.entries().len()];

    for question in questions {
        let Some(row) = table.position(question.marks()) else {
            warn!(
                "Question {} carries {} marks which is outside the mark table; leaving it out",
                question.id(),
                question.marks()
            );
            excluded += 1;
            continue;
        };

        let title = resolve_title(question, &table.entries()[row], canonical);
        let bucket = &mut buckets[row];
        match bucket.iter_mut().find(|(existing, _)| *existing == title) {
            Some((_, members)) => members.push(question),
            None => bucket.push((title, vec![question])),
        }
    }

    let sections: Vec<Section<'q>> = table
        .entries()
        .iter()
        .zip(buckets)
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(entry, bucket)| {
            let subgroups = bucket
                .into_iter()
                .map(|(title, members)| SubGroup::new(title, members))
                .collect();
            Section::new(Some(entry), subgroups)
        })
        .collect();

    debug!(
        "Grouped {} question(s) into {} section(s); {} excluded",
        questions.len() - excluded,
        sections.len(),
        excluded
    );

    sections
}

/// Puts every question, in selection order, into one section with one
/// sub-group titled [`FLAT_SUBGROUP_TITLE`].
pub fn build_flat(questions: &[Question]) -> Vec<Section<'_>> {
    if questions.is_empty() {
        return Vec::new();
    }
    let members = questions.iter().collect();
    vec![Section::new(
        None,
        vec![SubGroup::new(FLAT_SUBGROUP_TITLE, members)],
    )]
}
