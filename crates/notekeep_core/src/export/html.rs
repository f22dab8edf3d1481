//! Self-contained HTML document renderer.

use super::{escape_markup, ExportOptions, Metadata};
use crate::model::note::Note;

const STYLE: &str = r#"    body {
      font-family: -apple-system, BlinkMacSystemFont, 'SF Pro Text', sans-serif;
      max-width: 800px;
      margin: 0 auto;
      padding: 20px;
      line-height: 1.6;
    }
    .note-header { border-bottom: 1px solid #eee; padding-bottom: 20px; margin-bottom: 20px; }
    .note-title { font-size: 28px; font-weight: bold; margin: 0; }
    .note-meta { color: #666; font-size: 14px; margin-top: 10px; }
    .note-content { font-size: 16px; }"#;

pub(super) fn render(note: &Note, options: &ExportOptions) -> String {
    let title = escape_markup(&note.title);
    let meta = Metadata::of(note, options)
        .map(|meta| {
            let mut lines = format!("Created: {}", meta.created);
            if let Some(updated) = meta.updated {
                lines.push_str(&format!("<br>Updated: {updated}"));
            }
            format!("\n    <div class=\"note-meta\">{lines}</div>")
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
{STYLE}
  </style>
</head>
<body>
  <div class="note-header">
    <h1 class="note-title">{title}</h1>{meta}
  </div>
  <div class="note-content">
{content}
  </div>
</body>
</html>
"#,
        content = note.content,
    )
}
