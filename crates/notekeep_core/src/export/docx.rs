//! Minimal WordprocessingML (.docx) package writer.

use super::{escape_markup, strip_markup, ExportError, ExportOptions, Metadata};
use crate::model::note::Note;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Half-point sizes used by `w:sz`.
const TITLE_HALF_POINTS: u32 = 32;
const META_HALF_POINTS: u32 = 20;

pub(super) fn render(note: &Note, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let document = document_xml(note, options);
    let zip_options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("word/document.xml", document.as_str()),
    ] {
        writer
            .start_file(name, zip_options)
            .map_err(|err| ExportError::Render(format!("docx entry `{name}`: {err}")))?;
        writer
            .write_all(body.as_bytes())
            .map_err(|err| ExportError::Render(format!("docx entry `{name}`: {err}")))?;
    }
    let cursor = writer
        .finish()
        .map_err(|err| ExportError::Render(format!("docx package: {err}")))?;
    Ok(cursor.into_inner())
}

fn document_xml(note: &Note, options: &ExportOptions) -> String {
    let mut body = paragraph(&note.title, Some(TITLE_HALF_POINTS), true, None);
    if let Some(meta) = Metadata::of(note, options) {
        body.push_str(&paragraph(
            &format!("Created: {}", meta.created),
            Some(META_HALF_POINTS),
            false,
            Some("666666"),
        ));
        if let Some(updated) = meta.updated {
            body.push_str(&paragraph(
                &format!("Updated: {updated}"),
                Some(META_HALF_POINTS),
                false,
                Some("666666"),
            ));
        }
    }
    for line in strip_markup(&note.content).lines() {
        body.push_str(&paragraph(line, None, false, None));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    )
}

fn paragraph(text: &str, half_points: Option<u32>, bold: bool, color: Option<&str>) -> String {
    let mut run_props = String::new();
    if bold {
        run_props.push_str("<w:b/>");
    }
    if let Some(color) = color {
        run_props.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
    }
    if let Some(size) = half_points {
        run_props.push_str(&format!(r#"<w:sz w:val="{size}"/>"#));
    }
    let run_props = if run_props.is_empty() {
        run_props
    } else {
        format!("<w:rPr>{run_props}</w:rPr>")
    };

    format!(
        r#"<w:p><w:r>{run_props}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_markup(text)
    )
}
