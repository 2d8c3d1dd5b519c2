//! PDF rendering backend built on `genpdf`.
//!
//! Each assembled page starts on a fresh PDF page. Text drawn on one line is
//! collected into a single paragraph; images interrupt the paragraph and are
//! placed on their own line below it.

use std::path::{Path, PathBuf};

use genpdf::elements::{Break, PageBreak, Paragraph};
use genpdf::style::Style;
use genpdf::{Alignment, Element, Size};
use log::{debug, warn};

use crate::assembly::ExamDocument;
use crate::backend::{emit, RenderBackend, TextRole};
use crate::builder::DocumentBuilder;
use crate::content::ImageRef;
use crate::elements::{missing_image_marker, mm, FittedImage};
use crate::error::Result;
use crate::fonts;

const DEFAULT_FONT_SIZE: u8 = 11;
const DEFAULT_MAX_IMAGE_WIDTH_MM: f64 = 120.0;
const PAGE_NUMBER_LABEL: &str = "Page";

/// Bytes of a rendered PDF together with the number of assembled pages.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    /// The encoded PDF file.
    pub bytes: Vec<u8>,
    /// Number of assembled pages that were drawn.
    pub pages: usize,
}

impl RenderedPdf {
    /// Writes the PDF to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Settings of the PDF backend.
#[derive(Clone, Debug)]
pub struct PdfOptions {
    image_base_dir: Option<PathBuf>,
    font: Option<(PathBuf, String)>,
    font_size: u8,
    max_image_width_mm: f64,
    paper_size: Option<Size>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            image_base_dir: None,
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            max_image_width_mm: DEFAULT_MAX_IMAGE_WIDTH_MM,
            paper_size: None,
        }
    }
}

impl PdfOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative image paths against `directory`.
    pub fn with_image_base_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.image_base_dir = Some(directory.into());
        self
    }

    /// Loads the font family `family` from `directory` instead of the default.
    pub fn with_font(mut self, directory: impl Into<PathBuf>, family: impl Into<String>) -> Self {
        self.font = Some((directory.into(), family.into()));
        self
    }

    /// Sets the body font size in points.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    /// Caps the width of question images.
    pub fn with_max_image_width_mm(mut self, width_mm: f64) -> Self {
        self.max_image_width_mm = width_mm;
        self
    }

    /// Sets the paper size; A4 when unset.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }
}

/// A [`RenderBackend`] that lays out pages with `genpdf`.
pub struct PdfBackend {
    document: genpdf::Document,
    options: PdfOptions,
    line: Option<(Paragraph, TextRole)>,
    pages: usize,
}

impl PdfBackend {
    /// Prepares an empty PDF document titled `title`.
    pub fn new(title: &str, options: PdfOptions) -> Result<Self> {
        let mut builder = DocumentBuilder::new()
            .with_title(title)
            .with_font_size(options.font_size)
            .with_page_numbers(PAGE_NUMBER_LABEL);

        if let Some((directory, family)) = &options.font {
            builder = builder.with_font_family(fonts::font_family_from(directory, family)?);
        }
        if let Some(paper_size) = options.paper_size {
            builder = builder.with_paper_size(paper_size);
        }

        Ok(Self {
            document: builder.build()?,
            options,
            line: None,
            pages: 0,
        })
    }

    fn style_for(&self, role: TextRole) -> Style {
        let base = self.options.font_size;
        let mut style = Style::new();
        match role {
            TextRole::RunningHeader => {
                style.set_italic();
                style.set_font_size(base.saturating_sub(2).max(6));
            }
            TextRole::Heading => {
                style.set_bold();
                style.set_font_size(base.saturating_add(5));
            }
            TextRole::SectionHeading => {
                style.set_bold();
                style.set_font_size(base.saturating_add(2));
            }
            TextRole::SubGroupHeading => {
                style.set_bold();
                style.set_italic();
            }
            TextRole::Number | TextRole::Label => style.set_bold(),
            TextRole::Marks => style.set_italic(),
            TextRole::Body => {}
        }
        style
    }

    fn push<E: Element + 'static>(&mut self, element: E) {
        self.document.push(element);
    }

    fn flush_line(&mut self) {
        if let Some((mut paragraph, role)) = self.line.take() {
            if matches!(role, TextRole::RunningHeader | TextRole::Heading) {
                paragraph.set_alignment(Alignment::Center);
            }
            self.push(paragraph);
            if matches!(
                role,
                TextRole::RunningHeader | TextRole::Heading | TextRole::SectionHeading
            ) {
                self.push(Break::new(0.5));
            }
        }
    }

    fn resolve_image_path(&self, image: &ImageRef) -> PathBuf {
        let path = Path::new(image.as_str());
        match &self.options.image_base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn push_marker(&mut self, placeholder: &str) {
        let marker = missing_image_marker(placeholder, self.options.font_size);
        self.push(marker);
    }
}

impl RenderBackend for PdfBackend {
    type Output = RenderedPdf;

    fn start_page(&mut self) -> Result<()> {
        self.flush_line();
        if self.pages > 0 {
            self.push(PageBreak::new());
        }
        self.pages += 1;
        Ok(())
    }

    fn draw_text(&mut self, text: &str, role: TextRole) -> Result<()> {
        let style = self.style_for(role);
        let (paragraph, _) = self
            .line
            .get_or_insert_with(|| (Paragraph::default(), role));
        paragraph.push_styled(text.to_owned(), style);
        Ok(())
    }

    fn draw_image(&mut self, image: &ImageRef) -> Result<()> {
        self.flush_line();
        if image.is_remote() {
            warn!("Remote image {} cannot be embedded; drawing a marker", image);
            self.push_marker(image.as_str());
            return Ok(());
        }

        let path = self.resolve_image_path(image);
        match FittedImage::from_path(&path) {
            Ok(fitted) => {
                let max_width = mm(self.options.max_image_width_mm);
                self.push(fitted.with_max_width(max_width));
            }
            Err(err) => {
                warn!("Image {} could not be loaded: {}", path.display(), err);
                self.push_marker(image.as_str());
            }
        }
        Ok(())
    }

    fn draw_missing_image_marker(&mut self, placeholder: &str) -> Result<()> {
        self.flush_line();
        self.push_marker(placeholder);
        Ok(())
    }

    fn end_line(&mut self) -> Result<()> {
        self.flush_line();
        Ok(())
    }

    fn finish(mut self) -> Result<RenderedPdf> {
        self.flush_line();
        let mut bytes = Vec::new();
        self.document.render(&mut bytes)?;
        debug!("Rendered {} page(s) into {} PDF bytes", self.pages, bytes.len());
        Ok(RenderedPdf {
            bytes,
            pages: self.pages,
        })
    }
}

/// Renders an assembled document to PDF bytes.
///
/// Nothing is returned unless the whole document rendered successfully.
pub fn render_pdf(document: &ExamDocument, options: PdfOptions) -> Result<RenderedPdf> {
    let backend = PdfBackend::new(document.title(), options)?;
    emit(document, backend)
}
