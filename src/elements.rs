//! `genpdf` elements used by the PDF backend.
//!
//! Question images are decoded with the [`image`] crate and shrunk to the
//! available width at render time. Placeholders that do not resolve to a
//! loadable image are drawn as a framed marker so the gap stays visible on
//! the printed paper.

use std::path::Path;

use image::GenericImageView;

use genpdf::elements::{FramedElement, Image, Paragraph};
use genpdf::error::{Context as _, Error};
use genpdf::style::{Color, Style};
use genpdf::{render, Alignment, Element, Mm, RenderResult, Scale, Size};

/// Resolution assumed for question figures, which carry no physical size.
const FIGURE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const MARKER_COLOR: Color = Color::Rgb(180, 40, 40);

pub(crate) fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_value(value: Mm) -> f64 {
    printpdf::Mm::from(value).0
}

fn pixels_to_mm(pixels: u32) -> Mm {
    mm(MM_PER_INCH * f64::from(pixels) / FIGURE_DPI)
}

/// An image that keeps its natural size unless that exceeds the available
/// width or a configured maximum, in which case it is scaled down
/// proportionally.
pub struct FittedImage {
    image: Image,
    natural_size: Size,
    max_width: Option<Mm>,
}

impl FittedImage {
    /// Wraps an already decoded image.
    pub fn from_dynamic_image(image: image::DynamicImage) -> Result<Self, Error> {
        let (width, height) = image.dimensions();
        let natural_size = Size::new(pixels_to_mm(width), pixels_to_mm(height));
        let mut image = Image::from_dynamic_image(image)?;
        image.set_alignment(Alignment::Left);
        Ok(Self {
            image,
            natural_size,
            max_width: None,
        })
    }

    /// Decodes the figure stored at `path`, guessing its format from the content.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let decoded = image::io::Reader::open(path)
            .with_context(|| format!("Failed to open figure {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Unable to detect the format of {}", path.display()))?
            .decode()
            .with_context(|| format!("Failed to decode figure {}", path.display()))?;
        Self::from_dynamic_image(decoded)
    }

    /// Decodes a figure held in memory.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, Error> {
        let decoded = image::load_from_memory(bytes.as_ref())
            .context("Failed to decode figure from memory")?;
        Self::from_dynamic_image(decoded)
    }

    /// Caps the rendered width and returns the updated element.
    pub fn with_max_width(mut self, width: impl Into<Option<Mm>>) -> Self {
        self.max_width = width.into();
        self
    }

    /// Returns the size the image would take at its natural resolution.
    pub fn natural_size(&self) -> Size {
        self.natural_size
    }

    fn scale_for(&self, available: Mm) -> f64 {
        let natural = mm_value(self.natural_size.width);
        if natural <= f64::EPSILON {
            return 1.0;
        }
        let limit = self
            .max_width
            .map_or(mm_value(available), |max| mm_value(max).min(mm_value(available)));
        (limit / natural).min(1.0)
    }
}

impl Element for FittedImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let scale = self.scale_for(area.size().width);
        self.image.set_scale(Scale::new(scale, scale));
        self.image.render(context, area, style)
    }
}

/// Builds the framed marker drawn where an image could not be shown.
pub fn missing_image_marker(placeholder: &str, font_size: u8) -> FramedElement<Paragraph> {
    let mut style = Style::new();
    style.set_italic();
    style.set_font_size(font_size);
    style.set_color(MARKER_COLOR);

    let mut paragraph = Paragraph::default();
    paragraph.push_styled(format!("image unavailable: {placeholder}"), style);
    FramedElement::new(paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb([200u8, 200, 200]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn natural_size_follows_dpi() {
        let image = FittedImage::from_bytes(png_bytes(300, 600)).expect("decode");
        let size = image.natural_size();
        assert!((mm_value(size.width) - 25.4).abs() < 1e-6);
        assert!((mm_value(size.height) - 50.8).abs() < 1e-6);
    }

    #[test]
    fn wide_images_are_scaled_to_fit() {
        let image = FittedImage::from_bytes(png_bytes(3000, 100))
            .expect("decode")
            .with_max_width(mm(100.0));
        assert!((image.scale_for(mm(180.0)) - 100.0 / 254.0).abs() < 1e-9);
        assert!((image.scale_for(mm(50.8)) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn small_images_keep_natural_size() {
        let image = FittedImage::from_bytes(png_bytes(30, 30)).expect("decode");
        assert_eq!(image.scale_for(mm(180.0)), 1.0);
    }

    #[test]
    fn undecodable_bytes_are_reported() {
        assert!(FittedImage::from_bytes(b"not an image").is_err());
        assert!(FittedImage::from_path("/__missing__/figure.png").is_err());
    }
}
