//! Assembly of the three printable document variants.
//!
//! Every variant starts from the same section tree and the same pagination,
//! so the question numbered `N` on the exam pages is the question answered
//! under `N` in the answer key. Numbering is threaded through each pass as an
//! explicit counter; assembling twice from the same selection yields equal
//! documents.
//!
//! The assembled [`ExamDocument`] owns all of its text and holds no borrows
//! into the selection, so the derived section tree is dropped as soon as
//! [`assemble`] returns.

use std::fmt;

use log::debug;

use crate::config::{Layout, PaperConfig};
use crate::content::{self, Run};
use crate::grouping::{self, Section};
use crate::model::{Question, Selection};
use crate::pagination::{self, Chunk, Page};

/// The document a caller asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Question paper only.
    Exam,
    /// Question paper followed by an answer key.
    ExamWithAnswer,
    /// Questions interleaved with their answers.
    Material,
}

impl Variant {
    /// Returns the name used on the command line and in file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Exam => "exam",
            Variant::ExamWithAnswer => "exam-with-answer",
            Variant::Material => "material",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lettered multiple-choice option.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionLine {
    /// Display label such as `(a)`.
    pub label: String,
    /// Rendered option text.
    pub runs: Vec<Run>,
}

/// Logical content of an assembled page, drawn top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Title repeated at the top of every page.
    RunningHeader(String),
    /// Heading opening the answer key or the study material.
    Heading(String),
    /// Section name and mark total.
    SectionHeading {
        label: String,
        name: String,
        total_marks: i64,
        continued: bool,
    },
    /// Sub-group title with its mark information.
    SubGroupHeading {
        title: String,
        uniform_marks: Option<i64>,
        total_marks: i64,
        continued: bool,
    },
    /// A numbered question on the exam pages.
    Question {
        number: usize,
        runs: Vec<Run>,
        options: Vec<OptionLine>,
        /// Individual marks, shown when the sub-group marks are not uniform.
        marks: Option<i64>,
    },
    /// A numbered answer in the answer key.
    Answer { number: usize, runs: Vec<Run> },
    /// A numbered question together with its answer.
    StudyEntry {
        number: usize,
        question: Vec<Run>,
        options: Vec<OptionLine>,
        answer: Vec<Run>,
    },
}

/// One assembled page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageContent {
    blocks: Vec<Block>,
}

impl PageContent {
    /// Returns the blocks of the page in drawing order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the numbers of every question, answer or study entry on the page.
    pub fn numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Question { number, .. }
            | Block::Answer { number, .. }
            | Block::StudyEntry { number, .. } => Some(*number),
            _ => None,
        })
    }

    fn has_entries(&self) -> bool {
        self.numbers().next().is_some()
    }
}

/// A fully assembled document ready to be handed to a rendering backend.
#[derive(Clone, Debug, PartialEq)]
pub struct ExamDocument {
    variant: Variant,
    title: String,
    pages: Vec<PageContent>,
    answer_key_start: Option<usize>,
    total_marks: i64,
    question_count: usize,
}

impl ExamDocument {
    /// Returns the variant this document was assembled as.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Returns the paper title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns every page in order.
    pub fn pages(&self) -> &[PageContent] {
        &self.pages
    }

    /// Index of the first answer key page, for [`Variant::ExamWithAnswer`].
    pub fn answer_key_start(&self) -> Option<usize> {
        self.answer_key_start
    }

    /// Sum of marks over every question on the paper.
    pub fn total_marks(&self) -> i64 {
        self.total_marks
    }

    /// Number of questions placed on the paper.
    pub fn question_count(&self) -> usize {
        self.question_count
    }
}

/// Builds the section tree for `questions` as configured.
pub fn sections<'q>(questions: &'q [Question], config: &PaperConfig) -> Vec<Section<'q>> {
    match config.layout() {
        Layout::SectionWise => grouping::build(questions, config.subject(), config.mark_table()),
        Layout::Flat => grouping::build_flat(questions),
    }
}

/// Assembles `variant` from the selection.
pub fn assemble(selection: &Selection, config: &PaperConfig, variant: Variant) -> ExamDocument {
    let sections = sections(selection.questions(), config);
    let pages = pagination::paginate(&sections, config.budget());

    let total_marks = grouping::sum_marks(sections.iter().map(Section::total_marks));
    let question_count = sections.iter().map(Section::question_count).sum();

    let (pages, answer_key_start) = match variant {
        Variant::Exam => (exam_pass(&pages, config), None),
        Variant::ExamWithAnswer => {
            let mut exam = exam_pass(&pages, config);
            let start = exam.len();
            let key = answer_key_pass(&pages, config);
            debug_assert_eq!(
                answered_count(&pages),
                question_count,
                "answer key and exam disagree on question count"
            );
            exam.extend(key);
            (exam, Some(start))
        }
        Variant::Material => (material_pass(&pages, config), None),
    };

    debug!(
        "Assembled {} document: {} page(s), {} question(s), {} mark(s)",
        variant,
        pages.len(),
        question_count,
        total_marks
    );

    ExamDocument {
        variant,
        title: config.title().to_owned(),
        pages,
        answer_key_start,
        total_marks,
        question_count,
    }
}

fn answered_count(pages: &[Page<'_>]) -> usize {
    pages.iter().map(Page::question_count).sum()
}

/// Returns the display label of the option at `index`: `(a)`, `(b)`, ...
pub fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => format!("({})", char::from(b'a' + offset)),
        _ => format!("({})", index + 1),
    }
}

fn option_lines(question: &Question, config: &PaperConfig) -> Vec<OptionLine> {
    question
        .options()
        .iter()
        .enumerate()
        .map(|(index, option)| OptionLine {
            label: option_label(index),
            runs: content::render_field(option, config.language(), &[]),
        })
        .collect()
}

fn question_runs(question: &Question, config: &PaperConfig) -> Vec<Run> {
    let content = question.question();
    content::render_field(content.text(), config.language(), content.images())
}

fn subgroup_heading(chunk: &Chunk<'_>) -> Block {
    Block::SubGroupHeading {
        title: chunk.title().to_owned(),
        uniform_marks: chunk.uniform_marks(),
        total_marks: chunk.total_marks(),
        continued: chunk.is_continuation(),
    }
}

fn exam_pass(pages: &[Page<'_>], config: &PaperConfig) -> Vec<PageContent> {
    let (rendered, _) = pages
        .iter()
        .fold((Vec::with_capacity(pages.len()), 1), |(mut out, next), page| {
            let (content, next) = exam_page(page, config, next);
            out.push(content);
            (out, next)
        });
    rendered
}

fn exam_page(page: &Page<'_>, config: &PaperConfig, mut next: usize) -> (PageContent, usize) {
    let mut blocks = vec![Block::RunningHeader(config.title().to_owned())];
    let mut previous: Option<&Section<'_>> = None;

    for chunk in page.chunks() {
        let section = chunk.section();
        let same_section = previous.is_some_and(|prev| std::ptr::eq(prev, section));
        if !same_section && !section.is_flat() {
            blocks.push(Block::SectionHeading {
                label: section.label().to_owned(),
                name: section.name().to_owned(),
                total_marks: section.total_marks(),
                continued: chunk.is_continuation()
                    || !std::ptr::eq(chunk.subgroup(), &section.subgroups()[0]),
            });
        }
        previous = Some(section);

        blocks.push(subgroup_heading(chunk));
        let uniform = chunk.uniform_marks().is_some();
        for question in chunk.questions() {
            blocks.push(Block::Question {
                number: next,
                runs: question_runs(question, config),
                options: option_lines(question, config),
                marks: (!uniform).then(|| question.marks()),
            });
            next += 1;
        }
    }

    (PageContent { blocks }, next)
}

fn answer_key_pass(pages: &[Page<'_>], config: &PaperConfig) -> Vec<PageContent> {
    let header = format!("{} - {}", config.title(), config.answer_key_title());
    let (rendered, _) = pages.iter().enumerate().fold(
        (Vec::with_capacity(pages.len()), 1),
        |(mut out, mut next), (index, page)| {
            let mut blocks = vec![Block::RunningHeader(header.clone())];
            if index == 0 {
                blocks.push(Block::Heading(config.answer_key_title().to_owned()));
            }
            for chunk in page.chunks() {
                blocks.push(subgroup_heading(chunk));
                for question in chunk.questions() {
                    let answer = question.answer();
                    blocks.push(Block::Answer {
                        number: next,
                        runs: content::render_field(
                            answer.text(),
                            config.language(),
                            answer.images(),
                        ),
                    });
                    next += 1;
                }
            }
            out.push(PageContent { blocks });
            (out, next)
        },
    );
    rendered
}

fn material_pass(pages: &[Page<'_>], config: &PaperConfig) -> Vec<PageContent> {
    let header = format!("{} - {}", config.title(), config.material_title());
    let (rendered, _) = pages.iter().fold(
        (Vec::with_capacity(pages.len()), 1),
        |(mut out, mut next): (Vec<PageContent>, usize), page| {
            let mut blocks = vec![Block::RunningHeader(header.clone())];
            if out.is_empty() {
                blocks.push(Block::Heading(config.material_title().to_owned()));
            }
            for chunk in page.chunks() {
                let entries: Vec<Block> = chunk
                    .questions()
                    .iter()
                    .filter_map(|question| {
                        let answer = question.answer();
                        let resolved = content::resolve(answer.text(), config.language())?;
                        let entry = Block::StudyEntry {
                            number: next,
                            question: question_runs(question, config),
                            options: option_lines(question, config),
                            answer: content::render_str(Some(&resolved), answer.images()),
                        };
                        next += 1;
                        Some(entry)
                    })
                    .collect();
                if !entries.is_empty() {
                    blocks.push(subgroup_heading(chunk));
                    blocks.extend(entries);
                }
            }
            let page = PageContent { blocks };
            if page.has_entries() {
                out.push(page);
            }
            (out, next)
        },
    );
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Content, LocalizedText};
    use crate::pagination::PageBudget;

    fn question(id: &str, marks: i64, answer: &str) -> Question {
        Question::new(id, marks)
            .with_question(Content::new(LocalizedText::primary_only(format!("Question {id}"))))
            .with_answer(Content::new(LocalizedText::primary_only(answer)))
    }

    fn config(budget: usize) -> PaperConfig {
        PaperConfig::new()
            .with_title("Unit Test")
            .with_subject("History")
            .with_budget(PageBudget::new(budget).expect("non-zero budget"))
    }

    fn numbers(pages: &[PageContent]) -> Vec<usize> {
        pages.iter().flat_map(PageContent::numbers).collect()
    }

    #[test]
    fn exam_numbers_questions_across_pages() {
        let selection: Selection = (0..5).map(|i| question(&i.to_string(), 1, "a")).collect();
        let document = assemble(&selection, &config(2), Variant::Exam);

        assert_eq!(document.pages().len(), 3);
        assert_eq!(numbers(document.pages()), [1, 2, 3, 4, 5]);
        assert_eq!(document.total_marks(), 5);
        assert_eq!(document.question_count(), 5);
        assert!(matches!(
            document.pages()[0].blocks()[0],
            Block::RunningHeader(ref title) if title == "Unit Test"
        ));
    }

    #[test]
    fn marks_shown_only_for_mixed_subgroups() {
        let selection = Selection::new(vec![question("a", 2, "x"), question("b", 2, "y")]);
        let document = assemble(&selection, &config(10), Variant::Exam);
        let marks: Vec<_> = document.pages()[0]
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Question { marks, .. } => Some(*marks),
                _ => None,
            })
            .collect();
        assert_eq!(marks, [None, None]);

        let flat = config(10).with_layout(Layout::Flat);
        let selection = Selection::new(vec![question("a", 2, "x"), question("b", 3, "y")]);
        let document = assemble(&selection, &flat, Variant::Exam);
        let marks: Vec<_> = document.pages()[0]
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Question { marks, .. } => Some(*marks),
                _ => None,
            })
            .collect();
        assert_eq!(marks, [Some(2), Some(3)]);
    }

    #[test]
    fn flat_layout_skips_section_headings() {
        let selection = Selection::new(vec![question("a", 1, "x"), question("b", 9, "y")]);
        let document = assemble(
            &selection,
            &config(10).with_layout(Layout::Flat),
            Variant::Exam,
        );
        let blocks = document.pages()[0].blocks();
        assert!(!blocks
            .iter()
            .any(|block| matches!(block, Block::SectionHeading { .. })));
        assert!(blocks.iter().any(|block| matches!(
            block,
            Block::SubGroupHeading { title, .. } if title == grouping::FLAT_SUBGROUP_TITLE
        )));
        assert_eq!(document.total_marks(), 10);
    }

    #[test]
    fn answer_key_restarts_numbering_on_same_order() {
        let selection = Selection::new(vec![
            question("a", 2, "two"),
            question("b", 1, "one"),
            question("c", 2, "two again"),
        ]);
        let document = assemble(&selection, &config(2), Variant::ExamWithAnswer);
        let start = document.answer_key_start().expect("answer key present");

        let (exam, key) = document.pages().split_at(start);
        assert_eq!(numbers(exam), [1, 2, 3]);
        assert_eq!(numbers(key), [1, 2, 3]);
        assert_eq!(exam.len(), key.len());

        let answers: Vec<_> = key
            .iter()
            .flat_map(PageContent::blocks)
            .filter_map(|block| match block {
                Block::Answer { runs, .. } => Some(runs.clone()),
                _ => None,
            })
            .collect();
        // Section A (1 mark) comes before section B (2 marks).
        assert_eq!(answers[0], [Run::Text("one".into())]);
        assert_eq!(answers[1], [Run::Text("two".into())]);
        assert!(key[0]
            .blocks()
            .iter()
            .any(|block| matches!(block, Block::Heading(text) if text == "Answer Key")));
        assert!(!key
            .iter()
            .flat_map(PageContent::blocks)
            .any(|block| matches!(block, Block::SectionHeading { .. })));
    }

    #[test]
    fn material_omits_unanswered_entries_without_gaps() {
        let selection = Selection::new(vec![
            question("a", 1, "first"),
            question("b", 1, ""),
            question("c", 1, "null"),
            question("d", 1, "fourth"),
        ]);
        let document = assemble(&selection, &config(10), Variant::Material);

        assert_eq!(numbers(document.pages()), [1, 2]);
        let entries: Vec<_> = document.pages()[0]
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::StudyEntry { question, .. } => Some(question.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(entries[1], [Run::Text("Question d".into())]);
    }

    #[test]
    fn material_drops_pages_without_entries() {
        let selection = Selection::new(vec![
            question("a", 1, ""),
            question("b", 2, "kept"),
        ]);
        let document = assemble(&selection, &config(1), Variant::Material);
        assert_eq!(document.pages().len(), 1);
        assert_eq!(numbers(document.pages()), [1]);
    }

    #[test]
    fn options_are_lettered() {
        let selection = Selection::new(vec![question("a", 1, "x").with_options(vec![
            LocalizedText::primary_only("red"),
            LocalizedText::new("blue", "vaadli"),
        ])]);
        let document = assemble(&selection, &config(10), Variant::Exam);
        let options = document.pages()[0]
            .blocks()
            .iter()
            .find_map(|block| match block {
                Block::Question { options, .. } => Some(options.clone()),
                _ => None,
            })
            .expect("question block");

        assert_eq!(options[0].label, "(a)");
        assert_eq!(options[1].runs, [Run::Text("vaadli".into())]);
        assert_eq!(option_label(26), "(27)");
    }

    #[test]
    fn section_heading_marks_continuation() {
        let selection: Selection = (0..3).map(|i| question(&i.to_string(), 1, "a")).collect();
        let document = assemble(&selection, &config(2), Variant::Exam);
        let continued: Vec<bool> = document
            .pages()
            .iter()
            .flat_map(PageContent::blocks)
            .filter_map(|block| match block {
                Block::SectionHeading { continued, .. } => Some(*continued),
                _ => None,
            })
            .collect();
        assert_eq!(continued, [false, true]);
    }

    #[test]
    fn flat_totals_saturate_on_extreme_marks() {
        let selection = Selection::new(vec![
            question("a", i64::MAX, "x"),
            question("b", 1, "y"),
        ]);
        let flat = config(10).with_layout(Layout::Flat);
        for variant in [Variant::Exam, Variant::ExamWithAnswer, Variant::Material] {
            let document = assemble(&selection, &flat, variant);
            assert_eq!(document.total_marks(), i64::MAX);
            assert_eq!(document.question_count(), 2);
        }

        let selection = Selection::new(vec![
            question("a", i64::MIN, "x"),
            question("b", -1, "y"),
        ]);
        let document = assemble(&selection, &flat, Variant::Exam);
        assert_eq!(document.total_marks(), i64::MIN);
    }

    #[test]
    fn assembly_is_idempotent() {
        let selection: Selection = (0..7)
            .map(|i| question(&i.to_string(), (i % 3) + 1, "a"))
            .collect();
        for variant in [Variant::Exam, Variant::ExamWithAnswer, Variant::Material] {
            assert_eq!(
                assemble(&selection, &config(3), variant),
                assemble(&selection, &config(3), variant)
            );
        }
    }
}
