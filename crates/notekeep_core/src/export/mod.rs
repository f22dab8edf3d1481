//! Note export pipeline.
//!
//! # Responsibility
//! - Render one note snapshot into HTML, PDF, DOCX, Markdown or plain text.
//! - Name the artifact and hand it to a `FileSink`.
//! - Define the full-collection backup document and import payloads.
//!
//! # Invariants
//! - Renderers never touch the store; they only read a `&Note`.
//! - Plain-text forms (PDF, DOCX, Markdown, text) carry content with markup
//!   tags stripped; HTML keeps the rich content.
//! - Filenames are `<title>_<YYYY-MM-DD>.<ext>`, dated at export time.

pub mod backup;
mod docx;
mod html;
mod pdf;
mod sink;
mod text;

pub use backup::{BackupDocument, ImportPayload, ImportSummary, BACKUP_FORMAT_VERSION};
pub use sink::{DirectorySink, FileSink, SavedFile};

use crate::clock::{format_date, format_date_time};
use crate::model::note::Note;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static MARKUP_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

const UNTITLED: &str = "untitled";

#[derive(Debug)]
pub enum ExportError {
    /// Format name not recognized.
    UnknownFormat(String),
    /// Renderer failed to produce a payload.
    Render(String),
    /// Payload could not be encoded as JSON.
    Serialization(serde_json::Error),
    /// The file-save collaborator rejected the payload.
    Sink(std::io::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFormat(value) => {
                write!(f, "unknown export format `{value}`; expected html|pdf|docx|markdown|txt")
            }
            Self::Render(message) => write!(f, "failed to render export: {message}"),
            Self::Serialization(err) => write!(f, "failed to encode export: {err}"),
            Self::Sink(err) => write!(f, "failed to save export: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            Self::Sink(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Sink(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Pdf,
    Docx,
    Markdown,
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Markdown => "md",
            Self::Txt => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html;charset=utf-8",
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Markdown => "text/markdown;charset=utf-8",
            Self::Txt => "text/plain;charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "markdown" | "md" => Ok(Self::Markdown),
            "txt" | "text" => Ok(Self::Txt),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Emit the created/updated header.
    pub include_metadata: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
        }
    }
}

/// Creation/update lines shown above exported content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Metadata {
    pub created: String,
    /// Present only when the note changed after creation.
    pub updated: Option<String>,
}

impl Metadata {
    pub(crate) fn of(note: &Note, options: &ExportOptions) -> Option<Self> {
        if !options.include_metadata {
            return None;
        }
        Some(Self {
            created: format_date_time(&note.created_at),
            updated: (note.updated_at != note.created_at)
                .then(|| format_date_time(&note.updated_at)),
        })
    }
}

/// Renders `note` into a named artifact without saving it.
pub fn render_note(
    note: &Note,
    format: ExportFormat,
    options: &ExportOptions,
    exported_at: DateTime<Utc>,
) -> Result<SavedFile, ExportError> {
    let bytes = match format {
        ExportFormat::Html => html::render(note, options).into_bytes(),
        ExportFormat::Pdf => pdf::render(note, options),
        ExportFormat::Docx => docx::render(note, options)?,
        ExportFormat::Markdown => text::render_markdown(note, options).into_bytes(),
        ExportFormat::Txt => text::render_plain(note, options).into_bytes(),
    };

    Ok(SavedFile {
        filename: format!(
            "{}_{}.{}",
            filename_stem(&note.title),
            format_date(&exported_at),
            format.extension()
        ),
        mime_type: format.mime_type().to_string(),
        bytes,
    })
}

/// Removes markup tags and decodes the basic HTML entities.
pub fn strip_markup(content: &str) -> String {
    let stripped = MARKUP_TAG_RE.replace_all(content, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Escapes text for HTML and XML bodies and attributes.
pub(crate) fn escape_markup(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn filename_stem(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_markup, filename_stem, strip_markup, ExportError, ExportFormat};

    #[test]
    fn strip_markup_removes_tags_and_decodes_entities() {
        assert_eq!(strip_markup("<b>hi</b>"), "hi");
        assert_eq!(
            strip_markup("<p>a&nbsp;&amp;&nbsp;b</p><br/>&lt;tag&gt;"),
            "a & b<tag>"
        );
    }

    #[test]
    fn escape_markup_escapes_reserved_characters() {
        assert_eq!(escape_markup("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }

    #[test]
    fn filename_stem_replaces_separators_and_defaults_blank_titles() {
        assert_eq!(filename_stem("plans/2024"), "plans_2024");
        assert_eq!(filename_stem("   "), "untitled");
    }

    #[test]
    fn format_parses_aliases_and_rejects_unknown() {
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert!(matches!(
            "rtf".parse::<ExportFormat>(),
            Err(ExportError::UnknownFormat(_))
        ));
    }
}
