//! Settings that shape one generated paper.

use crate::content::Language;
use crate::grouping::MarkTable;
use crate::pagination::PageBudget;

const DEFAULT_TITLE: &str = "Examination";
const DEFAULT_ANSWER_KEY_TITLE: &str = "Answer Key";
const DEFAULT_MATERIAL_TITLE: &str = "Study Material";

/// How questions are organised before pagination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Sections by mark value, sub-groups by resolved title.
    #[default]
    SectionWise,
    /// A single section holding every question in selection order.
    Flat,
}

/// Configuration for assembling a paper.
///
/// Values are set through the `with_*` methods and default to a section-wise
/// paper of ten questions per page that prefers the secondary language.
#[derive(Clone, Debug, PartialEq)]
pub struct PaperConfig {
    budget: PageBudget,
    mark_table: MarkTable,
    layout: Layout,
    language: Language,
    subject: String,
    title: String,
    answer_key_title: String,
    material_title: String,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            budget: PageBudget::default(),
            mark_table: MarkTable::standard(),
            layout: Layout::default(),
            language: Language::default(),
            subject: String::new(),
            title: DEFAULT_TITLE.to_owned(),
            answer_key_title: DEFAULT_ANSWER_KEY_TITLE.to_owned(),
            material_title: DEFAULT_MATERIAL_TITLE.to_owned(),
        }
    }
}

impl PaperConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of questions allowed per page.
    pub fn with_budget(mut self, budget: PageBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the mark table that defines the valid mark domain.
    pub fn with_mark_table(mut self, mark_table: MarkTable) -> Self {
        self.mark_table = mark_table;
        self
    }

    /// Chooses between a section-wise and a flat paper.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the preferred language for bilingual fields.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Sets the subject name used to decide how sub-groups are titled.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the paper title shown in the running header.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the heading of the answer key pages.
    pub fn with_answer_key_title(mut self, title: impl Into<String>) -> Self {
        self.answer_key_title = title.into();
        self
    }

    /// Sets the heading of the study material pages.
    pub fn with_material_title(mut self, title: impl Into<String>) -> Self {
        self.material_title = title.into();
        self
    }

    pub fn budget(&self) -> PageBudget {
        self.budget
    }

    pub fn mark_table(&self) -> &MarkTable {
        &self.mark_table
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn answer_key_title(&self) -> &str {
        &self.answer_key_title
    }

    pub fn material_title(&self) -> &str {
        &self.material_title
    }
}
