//! Drawing assembled documents through a minimal backend interface.
//!
//! A [`RenderBackend`] only has to start pages and draw text, images and
//! missing-image markers. [`emit`] walks an [`ExamDocument`] and turns its
//! blocks into those primitives. The backend is consumed by the pass: if any
//! primitive fails, the backend is dropped together with whatever it had
//! produced so far, and the caller receives only the error.

use crate::assembly::{Block, ExamDocument, OptionLine};
use crate::content::{ImageRef, Run};
use crate::error::Result;

/// What a piece of text is, so backends can style it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRole {
    /// Title repeated at the top of each page.
    RunningHeader,
    /// Heading of the answer key or study material.
    Heading,
    /// Section name and marks.
    SectionHeading,
    /// Sub-group title and marks.
    SubGroupHeading,
    /// Question number or option letter.
    Number,
    /// Question, option and answer text.
    Body,
    /// Marks printed next to a question.
    Marks,
    /// Fixed labels such as "Answer:".
    Label,
}

/// The drawing primitives a rendering backend provides.
pub trait RenderBackend {
    /// What the backend produces once the document is complete.
    type Output;

    /// Begins a new page. Called once before the first block of every page.
    fn start_page(&mut self) -> Result<()>;

    /// Appends text to the current line.
    fn draw_text(&mut self, text: &str, role: TextRole) -> Result<()>;

    /// Appends an image to the current line.
    fn draw_image(&mut self, image: &ImageRef) -> Result<()>;

    /// Appends a marker for a placeholder that did not resolve to an image.
    fn draw_missing_image_marker(&mut self, placeholder: &str) -> Result<()>;

    /// Ends the current line; the next text starts below it.
    fn end_line(&mut self) -> Result<()>;

    /// Completes the document.
    fn finish(self) -> Result<Self::Output>;
}

/// Formats a mark count as `1 mark` or `N marks`.
pub fn marks_label(marks: i64) -> String {
    if marks == 1 {
        "1 mark".to_owned()
    } else {
        format!("{marks} marks")
    }
}

fn continued_suffix(continued: bool) -> &'static str {
    if continued {
        " (continued)"
    } else {
        ""
    }
}

/// Text of a section heading, e.g. `Section A: MCQs (5 marks)`.
pub fn section_heading_text(label: &str, name: &str, total_marks: i64, continued: bool) -> String {
    format!(
        "Section {label}: {name}{} ({})",
        continued_suffix(continued),
        marks_label(total_marks)
    )
}

/// Text of a sub-group heading, e.g. `Short Answer (2 marks each) [6 marks]`.
pub fn subgroup_heading_text(
    title: &str,
    uniform_marks: Option<i64>,
    total_marks: i64,
    continued: bool,
) -> String {
    let each = uniform_marks
        .map(|marks| format!(" ({} each)", marks_label(marks)))
        .unwrap_or_default();
    format!(
        "{title}{}{each} [{}]",
        continued_suffix(continued),
        marks_label(total_marks)
    )
}

fn draw_runs<B: RenderBackend>(backend: &mut B, runs: &[Run]) -> Result<()> {
    for run in runs {
        match run {
            Run::Text(text) => backend.draw_text(text, TextRole::Body)?,
            Run::Image(image) => backend.draw_image(image)?,
            Run::MissingImage(placeholder) => backend.draw_missing_image_marker(placeholder)?,
        }
    }
    Ok(())
}

fn draw_options<B: RenderBackend>(backend: &mut B, options: &[OptionLine]) -> Result<()> {
    for option in options {
        backend.draw_text(&format!("    {} ", option.label), TextRole::Number)?;
        draw_runs(backend, &option.runs)?;
        backend.end_line()?;
    }
    Ok(())
}

fn draw_block<B: RenderBackend>(backend: &mut B, block: &Block) -> Result<()> {
    match block {
        Block::RunningHeader(title) => {
            backend.draw_text(title, TextRole::RunningHeader)?;
            backend.end_line()
        }
        Block::Heading(text) => {
            backend.draw_text(text, TextRole::Heading)?;
            backend.end_line()
        }
        Block::SectionHeading {
            label,
            name,
            total_marks,
            continued,
        } => {
            let text = section_heading_text(label, name, *total_marks, *continued);
            backend.draw_text(&text, TextRole::SectionHeading)?;
            backend.end_line()
        }
        Block::SubGroupHeading {
            title,
            uniform_marks,
            total_marks,
            continued,
        } => {
            let text = subgroup_heading_text(title, *uniform_marks, *total_marks, *continued);
            backend.draw_text(&text, TextRole::SubGroupHeading)?;
            backend.end_line()
        }
        Block::Question {
            number,
            runs,
            options,
            marks,
        } => {
            backend.draw_text(&format!("{number}. "), TextRole::Number)?;
            draw_runs(backend, runs)?;
            if let Some(marks) = marks {
                backend.draw_text(&format!(" [{}]", marks_label(*marks)), TextRole::Marks)?;
            }
            backend.end_line()?;
            draw_options(backend, options)
        }
        Block::Answer { number, runs } => {
            backend.draw_text(&format!("{number}. "), TextRole::Number)?;
            draw_runs(backend, runs)?;
            backend.end_line()
        }
        Block::StudyEntry {
            number,
            question,
            options,
            answer,
        } => {
            backend.draw_text(&format!("{number}. "), TextRole::Number)?;
            draw_runs(backend, question)?;
            backend.end_line()?;
            draw_options(backend, options)?;
            backend.draw_text("Answer: ", TextRole::Label)?;
            draw_runs(backend, answer)?;
            backend.end_line()
        }
    }
}

/// Draws every page of `document` through `backend` and returns its output.
pub fn emit<B: RenderBackend>(document: &ExamDocument, mut backend: B) -> Result<B::Output> {
    for page in document.pages() {
        backend.start_page()?;
        for block in page.blocks() {
            draw_block(&mut backend, block)?;
        }
    }
    backend.finish()
}

/// A backend that writes every primitive as plain text.
///
/// Pages are separated by `--- page N ---` lines, images appear as
/// `[image: ref]` and unresolved placeholders as `[missing image: [imgN]]`.
#[derive(Debug, Default)]
pub struct TranscriptBackend {
    output: String,
    line: String,
    pages: usize,
}

impl TranscriptBackend {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    fn flush_line(&mut self) {
        if !self.line.is_empty() {
            self.output.push_str(self.line.trim_end());
            self.output.push('\n');
            self.line.clear();
        }
    }
}

impl RenderBackend for TranscriptBackend {
    type Output = String;

    fn start_page(&mut self) -> Result<()> {
        self.flush_line();
        self.pages += 1;
        self.output.push_str(&format!("--- page {} ---\n", self.pages));
        Ok(())
    }

    fn draw_text(&mut self, text: &str, _role: TextRole) -> Result<()> {
        self.line.push_str(text);
        Ok(())
    }

    fn draw_image(&mut self, image: &ImageRef) -> Result<()> {
        self.line.push_str(&format!("[image: {image}]"));
        Ok(())
    }

    fn draw_missing_image_marker(&mut self, placeholder: &str) -> Result<()> {
        self.line.push_str(&format!("[missing image: {placeholder}]"));
        Ok(())
    }

    fn end_line(&mut self) -> Result<()> {
        self.flush_line();
        Ok(())
    }

    fn finish(mut self) -> Result<String> {
        self.flush_line();
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{assemble, Variant};
    use crate::config::PaperConfig;
    use crate::error::PaperError;
    use crate::model::{Content, LocalizedText, Question, Selection};

    #[test]
    fn heading_texts() {
        assert_eq!(
            section_heading_text("A", "MCQs", 5, false),
            "Section A: MCQs (5 marks)"
        );
        assert_eq!(
            subgroup_heading_text("Short Answer", Some(2), 6, true),
            "Short Answer (continued) (2 marks each) [6 marks]"
        );
        assert_eq!(subgroup_heading_text("Mixed", None, 1, false), "Mixed [1 mark]");
    }

    #[test]
    fn transcript_draws_images_and_markers() {
        let selection = Selection::new(vec![Question::new("q", 1).with_question(
            Content::new(LocalizedText::primary_only("Label [img1] and [img2]"))
                .with_images(["figs/a.png"]),
        )]);
        let document = assemble(&selection, &PaperConfig::new(), Variant::Exam);
        let transcript = emit(&document, TranscriptBackend::new()).expect("transcript");

        assert!(transcript.starts_with("--- page 1 ---\nExamination\n"));
        assert!(transcript.contains("Section A: MCQs (1 mark)"));
        assert!(transcript.contains("1. Label [image: figs/a.png] and [missing image: [img2]]"));
    }

    struct FailingBackend {
        pages: usize,
    }

    impl RenderBackend for FailingBackend {
        type Output = usize;

        fn start_page(&mut self) -> Result<()> {
            self.pages += 1;
            if self.pages > 1 {
                return Err(PaperError::Backend("out of paper".into()));
            }
            Ok(())
        }

        fn draw_text(&mut self, _text: &str, _role: TextRole) -> Result<()> {
            Ok(())
        }

        fn draw_image(&mut self, _image: &ImageRef) -> Result<()> {
            Ok(())
        }

        fn draw_missing_image_marker(&mut self, _placeholder: &str) -> Result<()> {
            Ok(())
        }

        fn end_line(&mut self) -> Result<()> {
            Ok(())
        }

        fn finish(self) -> Result<usize> {
            Ok(self.pages)
        }
    }

    #[test]
    fn backend_failure_aborts_the_whole_pass() {
        let selection: Selection = (0..25).map(|i| Question::new(i.to_string(), 1)).collect();
        let document = assemble(&selection, &PaperConfig::new(), Variant::Exam);
        let result = emit(&document, FailingBackend { pages: 0 });
        assert!(matches!(result, Err(PaperError::Backend(_))));
    }
}
