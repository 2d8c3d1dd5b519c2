//! Composition and pagination of printable exam papers.
//!
//! A selection of questions flows one way through the crate:
//!
//! 1. [`grouping`] classifies questions into sections by mark value and into
//!    sub-groups by title.
//! 2. [`pagination`] packs the sub-groups into pages of bounded size.
//! 3. [`assembly`] produces one of three documents (exam, exam with answer
//!    key, study material) from those pages.
//! 4. [`backend`] draws the document through a [`backend::RenderBackend`];
//!    [`pdf`] provides one built on `genpdf`.
//!
//! Every step is a pure function of its input, so the same selection always
//! yields the same document.

pub mod assembly;
pub mod backend;
pub mod builder;
pub mod config;
pub mod content;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod grouping;
pub mod model;
pub mod pagination;
pub mod pdf;

pub use assembly::{assemble, ExamDocument, Variant};
pub use config::{Layout, PaperConfig};
pub use content::Language;
pub use error::{PaperError, Result};
pub use grouping::MarkTable;
pub use model::{Content, LocalizedText, Question, RawText, Selection};
pub use pagination::PageBudget;
