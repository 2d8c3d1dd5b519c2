//! Splitting question and answer text into text runs and images.
//!
//! Text coming from the question bank embeds positional placeholders such as
//! `[img1]` that refer, 1-indexed, into the image list stored next to it. The
//! renderer turns such text into an ordered sequence of [`Run`]s which the
//! rendering backends draw one by one. Malformed input never fails: empty
//! text becomes a single dash and unresolved placeholders become a
//! missing-image marker.

use std::borrow::Cow;
use std::fmt;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{is_blank_text, LocalizedText, RawText};

/// Text drawn in place of content that is missing altogether.
pub const PLACEHOLDER_DASH: &str = "-";

static IMAGE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[img(\d+)\]").expect("image placeholder regex is valid"));

static URL_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(https?://|data:image/|file://)\S+$").expect("url regex is valid")
});

static PATH_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s]*([/\\][^\s]+|\.[A-Za-z0-9]{2,5})$").expect("path regex is valid")
});

/// A syntactically valid image reference: a URL or a file path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    /// Validates `candidate` and wraps it when it looks like a path or URL.
    pub fn parse(candidate: &str) -> Option<Self> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return None;
        }
        if URL_LIKE.is_match(trimmed) || PATH_LIKE.is_match(trimmed) {
            Some(Self(trimmed.to_owned()))
        } else {
            None
        }
    }

    /// Returns the reference as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the reference points to a remote resource.
    pub fn is_remote(&self) -> bool {
        URL_LIKE.is_match(&self.0)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One drawable piece of rendered content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Run {
    /// A stretch of plain text.
    Text(String),
    /// An image resolved from a placeholder.
    Image(ImageRef),
    /// A placeholder that did not resolve; carries the placeholder as written.
    MissingImage(String),
}

/// Which language of a bilingual pair is preferred.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    /// Prefer the primary value and fall back to the secondary one.
    Primary,
    /// Prefer the secondary value and fall back to the primary one.
    #[default]
    Secondary,
}

/// Picks the text to show for a bilingual field.
///
/// The preferred language wins when it holds non-empty text, then the other
/// language, then the serialized form of any structured value. `None` means
/// the field carries no content at all.
pub fn resolve(field: &LocalizedText, language: Language) -> Option<String> {
    let (first, second) = match language {
        Language::Secondary => (field.secondary(), field.primary()),
        Language::Primary => (field.primary(), field.secondary()),
    };

    first
        .as_non_empty_str()
        .or_else(|| second.as_non_empty_str())
        .map(str::to_owned)
        .or_else(|| first.stringified())
        .or_else(|| second.stringified())
}

/// Keeps only the image references that are syntactically valid, in order.
pub fn valid_images(images: &[String]) -> Vec<ImageRef> {
    images
        .iter()
        .filter_map(|candidate| ImageRef::parse(candidate))
        .collect()
}

/// Renders a raw text value against its image list.
///
/// Structured values are serialized first; empty content yields a single
/// dash run.
pub fn render(text: &RawText, images: &[String]) -> Vec<Run> {
    let text: Option<Cow<'_, str>> = text
        .as_non_empty_str()
        .map(Cow::Borrowed)
        .or_else(|| text.stringified().map(Cow::Owned));
    render_str(text.as_deref(), images)
}

/// Resolves the language of `field` and renders the result.
pub fn render_field(field: &LocalizedText, language: Language, images: &[String]) -> Vec<Run> {
    render_str(resolve(field, language).as_deref(), images)
}

/// Renders already resolved text against its image list.
pub fn render_str(text: Option<&str>, images: &[String]) -> Vec<Run> {
    let text = match text {
        Some(text) if !is_blank_text(text) => text,
        _ => return vec![Run::Text(PLACEHOLDER_DASH.to_owned())],
    };

    let images = valid_images(images);
    let mut runs = Vec::new();
    let mut cursor = 0;

    for captures in IMAGE_PLACEHOLDER.captures_iter(text) {
        let Some(token) = captures.get(0) else {
            continue;
        };
        if token.start() > cursor {
            runs.push(Run::Text(text[cursor..token.start()].to_owned()));
        }
        cursor = token.end();

        let resolved = captures[1]
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| images.get(index));

        match resolved {
            Some(image) => runs.push(Run::Image(image.clone())),
            None => {
                warn!(
                    "Image placeholder {} does not match any of {} image(s)",
                    token.as_str(),
                    images.len()
                );
                runs.push(Run::MissingImage(token.as_str().to_owned()));
            }
        }
    }

    if cursor < text.len() {
        runs.push(Run::Text(text[cursor..].to_owned()));
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn images(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn dash() -> Vec<Run> {
        vec![Run::Text(PLACEHOLDER_DASH.to_owned())]
    }

    #[test]
    fn empty_inputs_render_a_single_dash() {
        assert_eq!(render(&RawText::Absent, &[]), dash());
        assert_eq!(render(&RawText::text(""), &[]), dash());
        assert_eq!(render(&RawText::text("null"), &[]), dash());
        assert_eq!(render(&RawText::from(Some(json!({}))), &[]), dash());
        assert_eq!(render_str(None, &[]), dash());
    }

    #[test]
    fn splits_text_around_images() {
        let runs = render(
            &RawText::text("Find [img1] and [img2]."),
            &images(&["a.png", "https://cdn.example.com/b.jpg"]),
        );
        assert_eq!(
            runs,
            vec![
                Run::Text("Find ".into()),
                Run::Image(ImageRef("a.png".into())),
                Run::Text(" and ".into()),
                Run::Image(ImageRef("https://cdn.example.com/b.jpg".into())),
                Run::Text(".".into()),
            ]
        );
    }

    #[test]
    fn out_of_range_placeholder_becomes_marker() {
        let runs = render(&RawText::text("[img0][img3]"), &images(&["a.png"]));
        assert_eq!(
            runs,
            vec![
                Run::MissingImage("[img0]".into()),
                Run::MissingImage("[img3]".into()),
            ]
        );
    }

    #[test]
    fn invalid_references_are_filtered_before_indexing() {
        let runs = render(
            &RawText::text("[img1][img2]"),
            &images(&["", "not an image", "figures/c.png"]),
        );
        assert_eq!(
            runs,
            vec![
                Run::Image(ImageRef("figures/c.png".into())),
                Run::MissingImage("[img2]".into()),
            ]
        );
    }

    #[test]
    fn structured_values_are_serialized() {
        let runs = render(&RawText::from(Some(json!(["x"]))), &[]);
        assert_eq!(runs, vec![Run::Text(r#"["x"]"#.into())]);
    }

    #[test]
    fn huge_placeholder_index_is_missing() {
        let runs = render(&RawText::text("[img99999999999999999999999]"), &images(&["a.png"]));
        assert!(matches!(runs.as_slice(), [Run::MissingImage(_)]));
    }

    #[test]
    fn image_ref_validation() {
        assert!(ImageRef::parse("uploads/q1.png").is_some());
        assert!(ImageRef::parse("diagram.jpeg").is_some());
        assert!(ImageRef::parse("https://example.com/x").is_some());
        assert!(ImageRef::parse("C:\\img\\x.png").is_some());
        assert!(ImageRef::parse("   ").is_none());
        assert!(ImageRef::parse("just words").is_none());
        assert!(ImageRef::parse("plain").is_none());
    }

    #[test]
    fn resolve_prefers_secondary_then_primary() {
        let both = LocalizedText::new("english", "gujarati");
        assert_eq!(resolve(&both, Language::Secondary).as_deref(), Some("gujarati"));
        assert_eq!(resolve(&both, Language::Primary).as_deref(), Some("english"));

        let primary_only = LocalizedText::new("english", "null");
        assert_eq!(
            resolve(&primary_only, Language::Secondary).as_deref(),
            Some("english")
        );
    }

    #[test]
    fn resolve_falls_back_to_structured_then_nothing() {
        let structured = LocalizedText::new(RawText::from(Some(json!({"n": 1}))), "");
        assert_eq!(
            resolve(&structured, Language::Secondary).as_deref(),
            Some(r#"{"n":1}"#)
        );
        assert_eq!(resolve(&LocalizedText::default(), Language::Secondary), None);
        assert_eq!(
            render_field(&LocalizedText::default(), Language::Secondary, &[]),
            dash()
        );
    }

    proptest! {
        #[test]
        fn in_range_placeholders_resolve(count in 1usize..8, pick in 0usize..8) {
            let list: Vec<String> = (0..count).map(|i| format!("img/{i}.png")).collect();
            let k = pick % count + 1;
            let runs = render_str(Some(&format!("see [img{k}]")), &list);
            prop_assert_eq!(runs.last(), Some(&Run::Image(ImageRef(list[k - 1].clone()))));
        }

        #[test]
        fn out_of_range_placeholders_never_panic(count in 0usize..4, k in 0usize..50) {
            let list: Vec<String> = (0..count).map(|i| format!("img/{i}.png")).collect();
            let runs = render_str(Some(&format!("[img{k}]")), &list);
            prop_assert_eq!(runs.len(), 1);
            if k == 0 || k > count {
                prop_assert!(matches!(runs[0], Run::MissingImage(_)));
            } else {
                prop_assert!(matches!(runs[0], Run::Image(_)));
            }
        }

        #[test]
        fn text_without_placeholders_is_one_run(text in "[a-z ]{1,20}[a-z]") {
            prop_assume!(text.trim() != "null");
            prop_assert_eq!(render_str(Some(&text), &[]), vec![Run::Text(text.clone())]);
        }
    }
}
