//! Construction of the `genpdf::Document` a paper is printed into.

use genpdf::elements::Paragraph;
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{Alignment, Context, Element, Margins, PageDecorator, Position, Size};

#[cfg(feature = "hyphenation")]
use genpdf::hyphenation;

use crate::elements::mm;
use crate::fonts;

const DEFAULT_MARGIN_MM: f64 = 15.0;
const PAGE_NUMBER_HEIGHT_MM: f64 = 8.0;

/// Builder for the PDF document of one paper.
///
/// Every page gets the configured margins; with [`with_page_numbers`]
/// a centered `<label> N` line is reserved at the bottom of each page.
///
/// [`with_page_numbers`]: DocumentBuilder::with_page_numbers
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    paper_size: Option<Size>,
    font_family: Option<FontFamily<FontData>>,
    font_size: Option<u8>,
    page_number_label: Option<String>,
    #[cfg(feature = "hyphenation")]
    hyphenator: Option<hyphenation::Standard>,
}

impl DocumentBuilder {
    /// Creates a builder with A4 paper, 15 mm margins and the default fonts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Prints with `family` instead of [`fonts::default_font_family`].
    pub fn with_font_family(mut self, family: FontFamily<FontData>) -> Self {
        self.font_family = Some(family);
        self
    }

    /// Sets the body font size in points.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Numbers every physical page as `<label> N`.
    pub fn with_page_numbers(mut self, label: impl Into<String>) -> Self {
        self.page_number_label = Some(label.into());
        self
    }

    /// Enables hyphenation with the given dictionary.
    #[cfg(feature = "hyphenation")]
    pub fn with_hyphenator(mut self, hyphenator: hyphenation::Standard) -> Self {
        self.hyphenator = Some(hyphenator);
        self
    }

    /// Builds the configured document, loading the default fonts when no
    /// family was given.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = match self.font_family {
            Some(family) => family,
            None => fonts::default_font_family()?,
        };
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }
        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        if let Some(font_size) = self.font_size {
            document.set_font_size(font_size);
        }

        document.set_page_decorator(PaperPageDecorator {
            page: 0,
            margins: Margins::all(mm(DEFAULT_MARGIN_MM)),
            page_number_label: self.page_number_label,
        });

        #[cfg(feature = "hyphenation")]
        if let Some(hyphenator) = self.hyphenator {
            document.set_hyphenator(hyphenator);
        }

        Ok(document)
    }
}

struct PaperPageDecorator {
    page: usize,
    margins: Margins,
    page_number_label: Option<String>,
}

impl PaperPageDecorator {
    fn draw_page_number<'a>(
        &self,
        label: &str,
        context: &Context,
        area: &mut Area<'a>,
        style: Style,
    ) -> Result<(), Error> {
        let height = mm(PAGE_NUMBER_HEIGHT_MM);
        let available = area.size().height;
        if height > available {
            return Err(Error::new(
                "Page number does not fit below the margins",
                ErrorKind::InvalidData,
            ));
        }

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, available - height));
        let mut footer = Paragraph::new(format!("{label} {}", self.page));
        footer.set_alignment(Alignment::Center);
        if footer.render(context, footer_area, style)?.has_more {
            return Err(Error::new(
                "Page number overflows its reserved line",
                ErrorKind::PageSizeExceeded,
            ));
        }

        area.set_height(available - height);
        Ok(())
    }
}

impl PageDecorator for PaperPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, Error> {
        self.page += 1;
        area.add_margins(self.margins);
        if let Some(label) = &self.page_number_label {
            self.draw_page_number(label, context, &mut area, style)?;
        }
        Ok(area)
    }
}
