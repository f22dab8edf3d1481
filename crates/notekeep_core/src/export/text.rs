//! Markdown and plain-text renderers.

use super::{strip_markup, ExportOptions, Metadata};
use crate::model::note::Note;

pub(super) fn render_markdown(note: &Note, options: &ExportOptions) -> String {
    let mut markdown = format!("# {}\n\n", note.title);
    if let Some(meta) = Metadata::of(note, options) {
        markdown.push_str(&format!("*Created: {}*\n\n", meta.created));
        if let Some(updated) = meta.updated {
            markdown.push_str(&format!("*Updated: {updated}*\n\n"));
        }
    }
    markdown.push_str(&strip_markup(&note.content));
    markdown
}

pub(super) fn render_plain(note: &Note, options: &ExportOptions) -> String {
    let mut text = format!("{}\n\n", note.title);
    if let Some(meta) = Metadata::of(note, options) {
        text.push_str(&format!("Created: {}\n", meta.created));
        if let Some(updated) = meta.updated {
            text.push_str(&format!("Updated: {updated}\n"));
        }
        text.push('\n');
    }
    text.push_str(&strip_markup(&note.content));
    text
}
