//! Input records describing the questions selected for a paper.
//!
//! The types here are immutable snapshots handed over by the selection UI or
//! the data store. Every bilingual field is an explicit [`LocalizedText`] pair
//! so the choice of language happens through [`crate::content::resolve`]
//! rather than by building field names at runtime.
//!
//! All records deserialize from the JSON shape used by the question bank
//! export (`camelCase` keys, text fields that may be strings, `null`, or
//! arbitrary objects).

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single text value as it arrives from the question bank.
///
/// Text columns are loosely typed upstream: they may be missing, plain
/// strings, or structured JSON that still has to be shown to the reader.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Option<Value>")]
pub enum RawText {
    /// No value was stored.
    #[default]
    Absent,
    /// Plain text, possibly containing `[imgN]` placeholders.
    Text(String),
    /// Any other JSON value; shown through its serialized form.
    Structured(Value),
}

impl RawText {
    /// Creates a plain text value.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the string when the value is non-empty plain text.
    pub fn as_non_empty_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) if !is_blank_text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the serialized form of a structured value that carries content.
    ///
    /// Empty objects, empty arrays and `null` carry nothing and yield `None`.
    pub fn stringified(&self) -> Option<String> {
        match self {
            Self::Structured(value) if !is_empty_value(value) => Some(match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            }),
            _ => None,
        }
    }
}

impl From<Option<Value>> for RawText {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(text)) => Self::Text(text),
            Some(other) => Self::Structured(other),
        }
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Whether a text value should be treated as "no content".
///
/// The literal string `"null"` is produced by some upstream exports for empty
/// columns and is treated like a missing value.
pub(crate) fn is_blank_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == "null"
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => is_blank_text(text),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// A bilingual field: the primary language value and its secondary-language
/// translation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LocalizedText {
    #[serde(rename = "text", default)]
    primary: RawText,
    #[serde(rename = "textSecondary", default)]
    secondary: RawText,
}

impl LocalizedText {
    /// Creates a pair from its two language values.
    pub fn new(primary: impl Into<RawText>, secondary: impl Into<RawText>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Creates a pair with only the primary language filled in.
    pub fn primary_only(primary: impl Into<RawText>) -> Self {
        Self {
            primary: primary.into(),
            secondary: RawText::Absent,
        }
    }

    /// Returns the primary-language value.
    pub fn primary(&self) -> &RawText {
        &self.primary
    }

    /// Returns the secondary-language value.
    pub fn secondary(&self) -> &RawText {
        &self.secondary
    }
}

/// Question or answer content: bilingual text plus the images its
/// `[imgN]` placeholders refer to.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "ContentRecord")]
pub struct Content {
    text: LocalizedText,
    images: Vec<String>,
}

impl Content {
    /// Creates content from a bilingual text pair without images.
    pub fn new(text: LocalizedText) -> Self {
        Self {
            text,
            images: Vec::new(),
        }
    }

    /// Returns the bilingual text.
    pub fn text(&self) -> &LocalizedText {
        &self.text
    }

    /// Returns the raw image references in placeholder order.
    ///
    /// The list is kept as received; invalid entries are filtered out when
    /// the content is rendered.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Sets the image references and returns the updated content.
    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentRecord {
    #[serde(default)]
    text: RawText,
    #[serde(default)]
    text_secondary: RawText,
    #[serde(default, deserialize_with = "lenient_strings")]
    images: Vec<String>,
}

impl From<ContentRecord> for Content {
    fn from(record: ContentRecord) -> Self {
        Self {
            text: LocalizedText::new(record.text, record.text_secondary),
            images: record.images,
        }
    }
}

/// An immutable question record taken from the selection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(deserialize_with = "integer_or_numeric_string")]
    marks: i64,
    #[serde(default)]
    section_title: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    subject_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    chapter_no: Option<String>,
    #[serde(default)]
    question: Content,
    #[serde(default)]
    answer: Content,
    #[serde(default)]
    options: Vec<LocalizedText>,
}

impl Question {
    /// Creates a question with the given identifier and mark value.
    pub fn new(id: impl Into<String>, marks: i64) -> Self {
        Self {
            id: id.into(),
            marks,
            section_title: None,
            kind: None,
            subject_id: None,
            chapter_no: None,
            question: Content::default(),
            answer: Content::default(),
            options: Vec::new(),
        }
    }

    /// Returns the unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the mark value as stored, which may lie outside the valid domain.
    pub fn marks(&self) -> i64 {
        self.marks
    }

    /// Returns the free-form section label, if any.
    pub fn section_title(&self) -> Option<&str> {
        self.section_title.as_deref()
    }

    /// Returns the free-form question type label, if any.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Returns the subject identifier, if any.
    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    /// Returns the chapter number, if any.
    pub fn chapter_no(&self) -> Option<&str> {
        self.chapter_no.as_deref()
    }

    /// Returns the question content.
    pub fn question(&self) -> &Content {
        &self.question
    }

    /// Returns the answer content.
    pub fn answer(&self) -> &Content {
        &self.answer
    }

    /// Returns the multiple-choice options in display order.
    pub fn options(&self) -> &[LocalizedText] {
        &self.options
    }

    /// Sets the section label and returns the updated question.
    pub fn with_section_title(mut self, title: impl Into<Option<String>>) -> Self {
        self.section_title = title.into();
        self
    }

    /// Sets the type label and returns the updated question.
    pub fn with_kind(mut self, kind: impl Into<Option<String>>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Sets the subject identifier and returns the updated question.
    pub fn with_subject_id(mut self, subject_id: impl Into<Option<String>>) -> Self {
        self.subject_id = subject_id.into();
        self
    }

    /// Sets the chapter number and returns the updated question.
    pub fn with_chapter_no(mut self, chapter_no: impl Into<Option<String>>) -> Self {
        self.chapter_no = chapter_no.into();
        self
    }

    /// Sets the question content and returns the updated question.
    pub fn with_question(mut self, question: Content) -> Self {
        self.question = question;
        self
    }

    /// Sets the answer content and returns the updated question.
    pub fn with_answer(mut self, answer: Content) -> Self {
        self.answer = answer;
        self
    }

    /// Sets the multiple-choice options and returns the updated question.
    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = LocalizedText>,
    {
        self.options = options.into_iter().collect();
        self
    }
}

/// The ordered list of questions picked for one paper.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    questions: Vec<Question>,
}

impl Selection {
    /// Wraps an already ordered list of questions.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parses a JSON array of question records.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Ok(Self { questions })
    }

    /// Returns the questions in selection order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the number of selected questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Returns whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl FromIterator<Question> for Selection {
    fn from_iter<I: IntoIterator<Item = Question>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

fn integer_or_numeric_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        serde::de::Error::custom(format!("expected an integer mark value, found {value}"))
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

// Non-string entries become empty strings so that placeholder positions are
// preserved until the renderer filters them out.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .map(|value| match value {
            Value::String(text) => text,
            _ => String::new(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_text_from_json_values() {
        assert_eq!(RawText::from(None), RawText::Absent);
        assert_eq!(RawText::from(Some(Value::Null)), RawText::Absent);
        assert_eq!(
            RawText::from(Some(Value::String("x".into()))),
            RawText::Text("x".into())
        );
        assert!(matches!(
            RawText::from(Some(serde_json::json!({"a": 1}))),
            RawText::Structured(_)
        ));
    }

    #[test]
    fn literal_null_is_blank() {
        assert_eq!(RawText::text("null").as_non_empty_str(), None);
        assert_eq!(RawText::text("  ").as_non_empty_str(), None);
        assert_eq!(RawText::text("x").as_non_empty_str(), Some("x"));
    }

    #[test]
    fn empty_object_has_no_stringified_form() {
        let empty = RawText::from(Some(serde_json::json!({})));
        assert_eq!(empty.stringified(), None);
        let full = RawText::from(Some(serde_json::json!({"k": "v"})));
        assert_eq!(full.stringified().as_deref(), Some(r#"{"k":"v"}"#));
    }

    #[test]
    fn selection_parses_export_shape() {
        let json = r#"[
            {
                "id": 7,
                "marks": 2,
                "sectionTitle": "Part A",
                "type": "short",
                "chapterNo": 3,
                "question": {"text": "Q [img1]", "textSecondary": null, "images": ["a.png", 5]},
                "answer": {"text": {"value": 4}},
                "options": [{"text": "yes"}, {"text": "no", "textSecondary": "na"}]
            }
        ]"#;

        let selection = Selection::from_json(json).expect("selection parses");
        let question = &selection.questions()[0];
        assert_eq!(question.id(), "7");
        assert_eq!(question.marks(), 2);
        assert_eq!(question.section_title(), Some("Part A"));
        assert_eq!(question.kind(), Some("short"));
        assert_eq!(question.chapter_no(), Some("3"));
        assert_eq!(question.question().images(), ["a.png", ""]);
        assert_eq!(question.question().text().secondary(), &RawText::Absent);
        assert!(matches!(
            question.answer().text().primary(),
            RawText::Structured(_)
        ));
        assert_eq!(question.options().len(), 2);
        assert_eq!(question.options()[1].secondary(), &RawText::text("na"));
    }

    #[test]
    fn marks_accept_numeric_strings() {
        let selection =
            Selection::from_json(r#"[{"id": 1, "marks": 2}, {"id": 2, "marks": " 3 "}]"#)
                .expect("selection parses");
        let marks: Vec<i64> = selection.questions().iter().map(Question::marks).collect();
        assert_eq!(marks, [2, 3]);

        assert!(Selection::from_json(r#"[{"id": 1, "marks": "three"}]"#).is_err());
        assert!(Selection::from_json(r#"[{"id": 1, "marks": 2.5}]"#).is_err());
    }

    #[test]
    fn selection_rejects_malformed_json() {
        assert!(Selection::from_json("[{\"id\": 1}]").is_err());
    }
}
