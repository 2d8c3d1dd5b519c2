//! Packing sections and sub-groups into pages of bounded question count.
//!
//! Pagination happens in two steps. [`linearize`] walks the section tree in
//! order and cuts every sub-group that is larger than the budget into
//! contiguous [`Chunk`]s; sub-groups that fit stay whole. [`pack`] then fills
//! pages greedily with those chunks. Every document variant paginates the
//! same linearization, so question order and numbering agree between the
//! exam pages, the answer key and the study material.

use std::num::NonZeroUsize;

use log::debug;

use crate::error::{PaperError, Result};
use crate::grouping::{sum_marks, MarkSummary, Section, SubGroup};
use crate::model::Question;

const DEFAULT_QUESTIONS_PER_PAGE: usize = 10;

/// Maximum number of questions placed on one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageBudget(NonZeroUsize);

impl PageBudget {
    /// Creates a budget of `questions` per page. Zero is rejected.
    pub fn new(questions: usize) -> Result<Self> {
        NonZeroUsize::new(questions)
            .map(Self)
            .ok_or(PaperError::InvalidBudget)
    }

    /// A budget no selection can exceed.
    pub fn unbounded() -> Self {
        Self(NonZeroUsize::MAX)
    }

    /// Returns the number of questions allowed per page.
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Returns whether this budget never forces a page break.
    pub fn is_unbounded(self) -> bool {
        self.0 == NonZeroUsize::MAX
    }
}

impl Default for PageBudget {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_QUESTIONS_PER_PAGE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// A contiguous run of questions from one sub-group.
///
/// A chunk is the whole sub-group unless the sub-group alone exceeds the page
/// budget, in which case it is one budget-sized piece of it. Mark totals are
/// recomputed for the slice.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk<'a> {
    section: &'a Section<'a>,
    subgroup: &'a SubGroup<'a>,
    questions: &'a [&'a Question],
    part: usize,
    parts: usize,
    summary: MarkSummary,
}

impl<'a> Chunk<'a> {
    fn new(
        section: &'a Section<'a>,
        subgroup: &'a SubGroup<'a>,
        questions: &'a [&'a Question],
        part: usize,
        parts: usize,
    ) -> Self {
        Self {
            section,
            subgroup,
            questions,
            part,
            parts,
            summary: MarkSummary::of(questions),
        }
    }

    /// Returns the section this chunk belongs to.
    pub fn section(&self) -> &'a Section<'a> {
        self.section
    }

    /// Returns the sub-group this chunk was cut from.
    pub fn subgroup(&self) -> &'a SubGroup<'a> {
        self.subgroup
    }

    /// Returns the sub-group title.
    pub fn title(&self) -> &'a str {
        self.subgroup.title()
    }

    /// Returns the questions of this chunk in order.
    pub fn questions(&self) -> &'a [&'a Question] {
        self.questions
    }

    /// Returns the number of questions in the chunk.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Returns whether the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based index of this chunk within its sub-group.
    pub fn part(&self) -> usize {
        self.part
    }

    /// Number of chunks the sub-group was cut into.
    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Returns whether the chunk is the entire sub-group.
    pub fn is_whole(&self) -> bool {
        self.parts == 1
    }

    /// Returns whether an earlier chunk of the same sub-group precedes this one.
    pub fn is_continuation(&self) -> bool {
        self.part > 0
    }

    /// Sum of marks in this chunk.
    pub fn total_marks(&self) -> i64 {
        self.summary.total
    }

    /// Mark value shared by every question in this chunk, if any.
    pub fn uniform_marks(&self) -> Option<i64> {
        self.summary.uniform
    }
}

/// One page of questions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page<'a> {
    chunks: Vec<Chunk<'a>>,
    question_count: usize,
}

impl<'a> Page<'a> {
    fn push(&mut self, chunk: Chunk<'a>) {
        self.question_count += chunk.len();
        self.chunks.push(chunk);
    }

    /// Returns the chunks placed on this page, in order.
    pub fn chunks(&self) -> &[Chunk<'a>] {
        &self.chunks
    }

    /// Returns the number of questions on this page.
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Returns the sum of marks on this page.
    pub fn total_marks(&self) -> i64 {
        sum_marks(self.chunks.iter().map(Chunk::total_marks))
    }

    /// Iterates over the questions on this page in order.
    pub fn questions(&self) -> impl Iterator<Item = &'a Question> + '_ {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.questions().iter().copied())
    }

    fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Walks sections and sub-groups in order, cutting every sub-group larger
/// than `budget` into budget-sized chunks.
pub fn linearize<'a>(sections: &'a [Section<'a>], budget: PageBudget) -> Vec<Chunk<'a>> {
    let size = budget.get();
    let mut chunks = Vec::new();

    for section in sections {
        for subgroup in section.subgroups() {
            if subgroup.is_empty() {
                continue;
            }
            let parts = subgroup.len().div_ceil(size);
            for (part, slice) in subgroup.questions().chunks(size).enumerate() {
                chunks.push(Chunk::new(section, subgroup, slice, part, parts));
            }
        }
    }

    chunks
}

/// Fills pages greedily with `chunks`, never exceeding `budget` questions per
/// page.
///
/// A page is closed before a chunk that would overflow it and as soon as it
/// holds exactly `budget` questions. Chunks produced by [`linearize`] never
/// exceed the budget, so no chunk is ever divided here.
pub fn pack<'a>(chunks: Vec<Chunk<'a>>, budget: PageBudget) -> Vec<Page<'a>> {
    let size = budget.get();
    let mut pages = Vec::new();
    let mut current = Page::default();

    for chunk in chunks {
        debug_assert!(chunk.len() <= size, "chunk larger than the page budget");
        if !current.is_empty() && current.question_count + chunk.len() > size {
            pages.push(std::mem::take(&mut current));
        }
        current.push(chunk);
        if current.question_count == size {
            pages.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }

    pages
}

/// Linearizes `sections` and packs the result into pages.
pub fn paginate<'a>(sections: &'a [Section<'a>], budget: PageBudget) -> Vec<Page<'a>> {
    let chunks = linearize(sections, budget);
    let chunk_count = chunks.len();
    let pages = pack(chunks, budget);
    debug!(
        "Paginated {} chunk(s) into {} page(s) with a budget of {}",
        chunk_count,
        pages.len(),
        if budget.is_unbounded() {
            "unbounded".to_owned()
        } else {
            budget.get().to_string()
        }
    );
    pages
}
