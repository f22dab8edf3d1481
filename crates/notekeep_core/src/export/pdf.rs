//! Minimal PDF 1.4 writer for note export.
//!
//! Layout follows an A4 portrait page in millimetres: title at 30 mm, metadata
//! at 45/55 mm, body from 70 mm, 20 mm side margins, 170 mm text column.
//! Body text flows onto new pages once it reaches the bottom margin.
//!
//! Text uses the built-in Helvetica font with WinAnsi encoding; characters
//! outside Latin-1 are replaced with `?`.

use super::{strip_markup, ExportOptions, Metadata};
use crate::model::note::Note;

const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;
const PT_PER_MM: f32 = 72.0 / 25.4;

const MARGIN_LEFT_MM: f32 = 20.0;
const MARGIN_TOP_MM: f32 = 20.0;
const MARGIN_BOTTOM_MM: f32 = 20.0;
const TEXT_WIDTH_MM: f32 = 170.0;

const TITLE_Y_MM: f32 = 30.0;
const CREATED_Y_MM: f32 = 45.0;
const UPDATED_Y_MM: f32 = 55.0;
const BODY_Y_MM: f32 = 70.0;

const TITLE_SIZE_PT: f32 = 16.0;
const META_SIZE_PT: f32 = 10.0;
const BODY_SIZE_PT: f32 = 12.0;
const LINE_HEIGHT_FACTOR: f32 = 1.15;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH_EM: f32 = 0.5;

pub(super) fn render(note: &Note, options: &ExportOptions) -> Vec<u8> {
    let mut layout = Layout::new();
    layout.place(&note.title, TITLE_SIZE_PT, TITLE_Y_MM);

    if let Some(meta) = Metadata::of(note, options) {
        layout.place(&format!("Created: {}", meta.created), META_SIZE_PT, CREATED_Y_MM);
        if let Some(updated) = meta.updated {
            layout.place(&format!("Updated: {updated}"), META_SIZE_PT, UPDATED_Y_MM);
        }
    }

    let body = strip_markup(&note.content);
    layout.flow(&wrap_text(&body, max_chars_per_line(BODY_SIZE_PT)), BODY_SIZE_PT, BODY_Y_MM);

    write_document(&note.title, &layout.pages)
}

struct Layout {
    /// One content stream per page.
    pages: Vec<String>,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![String::new()],
        }
    }

    fn place(&mut self, text: &str, size_pt: f32, y_mm: f32) {
        let x = MARGIN_LEFT_MM * PT_PER_MM;
        let y = PAGE_HEIGHT_PT - y_mm * PT_PER_MM;
        let op = format!(
            "BT /F1 {size_pt:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET\n",
            encode_text(text)
        );
        if let Some(page) = self.pages.last_mut() {
            page.push_str(&op);
        }
    }

    fn flow(&mut self, lines: &[String], size_pt: f32, start_y_mm: f32) {
        let line_height_mm = size_pt * LINE_HEIGHT_FACTOR / PT_PER_MM;
        let bottom_mm = PAGE_HEIGHT_PT / PT_PER_MM - MARGIN_BOTTOM_MM;
        let mut y_mm = start_y_mm;
        for line in lines {
            if y_mm > bottom_mm {
                self.pages.push(String::new());
                y_mm = MARGIN_TOP_MM;
            }
            if !line.is_empty() {
                self.place(line, size_pt, y_mm);
            }
            y_mm += line_height_mm;
        }
    }
}

fn max_chars_per_line(size_pt: f32) -> usize {
    let width_pt = TEXT_WIDTH_MM * PT_PER_MM;
    ((width_pt / (size_pt * AVG_GLYPH_WIDTH_EM)).floor() as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }
        lines.push(current);
    }
    lines
}

/// PDF literal-string body: escapes delimiters, octal-encodes non-ASCII.
fn encode_text(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                encoded.push('\\');
                encoded.push(ch);
            }
            ch if ch.is_ascii_graphic() || ch == ' ' => encoded.push(ch),
            ch if (ch as u32) >= 0xA0 && (ch as u32) <= 0xFF => {
                encoded.push_str(&format!("\\{:03o}", ch as u32));
            }
            _ => encoded.push('?'),
        }
    }
    encoded
}

fn write_document(title: &str, pages: &[String]) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3 font, 4 info, then (page, contents) pairs.
    let page_ids: Vec<usize> = (0..pages.len()).map(|idx| 5 + idx * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        format!(
            "<< /Title ({}) /Producer (notekeep) >>",
            encode_text(title)
        ),
    ];
    for (page_id, stream) in page_ids.iter().zip(pages) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH_PT} {PAGE_HEIGHT_PT}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}endstream",
            stream.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", idx + 1));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R /Info 4 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}
