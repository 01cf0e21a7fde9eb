use anyhow::{Context, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::{MinutesDocument, SectionBody, EMPTY_SECTION};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// The paragraph styles `document.xml` refers to.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="120"/></w:pPr><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="40"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="60"/><w:ind w:left="360"/></w:pPr></w:style></w:styles>"#;

/// Minimal WordprocessingML package: the document part plus a styles part
/// defining its title, heading and bullet styles.
pub fn render_docx(document: &MinutesDocument) -> Result<Vec<u8>> {
    let body = document_xml(document);

    // Fixed timestamps keep the archive byte-identical across renders.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/document.xml", body.as_str()),
        ("word/styles.xml", STYLES),
    ] {
        zip.start_file(name, options)
            .with_context(|| format!("Failed to add {} to docx", name))?;
        zip.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write {} to docx", name))?;
    }

    let cursor = zip.finish().context("Failed to finish docx archive")?;
    Ok(cursor.into_inner())
}

fn document_xml(document: &MinutesDocument) -> String {
    let mut paragraphs = vec![paragraph(Some("Title"), &document.title)];
    for line in document.details() {
        paragraphs.push(paragraph(None, &line));
    }

    for section in &document.sections {
        paragraphs.push(paragraph(Some("Heading1"), section.heading));
        match &section.body {
            SectionBody::Paragraph(text) if text.trim().is_empty() => {
                paragraphs.push(paragraph(None, EMPTY_SECTION));
            }
            SectionBody::Paragraph(text) => paragraphs.push(paragraph(None, text)),
            SectionBody::List(items) if items.is_empty() => {
                paragraphs.push(paragraph(None, EMPTY_SECTION));
            }
            SectionBody::List(items) => {
                for item in items {
                    paragraphs.push(paragraph(Some("ListBullet"), &format!("\u{2022} {}", item)));
                }
            }
        }
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:body>{}</w:body></w:document>"
        ),
        paragraphs.concat()
    )
}

fn paragraph(style: Option<&str>, text: &str) -> String {
    let properties = style
        .map(|style| format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, style))
        .unwrap_or_default();
    format!(
        r#"<w:p>{}<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        properties,
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if c.is_control() && c != '\t' => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::completed_job;
    use std::io::Read;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("R&D <team> \"q\""), "R&amp;D &lt;team&gt; &quot;q&quot;");
    }

    #[test]
    fn test_docx_package_contents() {
        let document = MinutesDocument::from_job(&completed_job()).unwrap();
        let bytes = render_docx(&document).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"_rels/.rels".to_string()));

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains("Source: standup.mp3"));
        assert!(xml.contains("\u{2022} Bob will send the deck"));
        assert!(xml.contains("None recorded."));
    }

    #[test]
    fn test_docx_defines_referenced_styles() {
        let document = MinutesDocument::from_job(&completed_job()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(render_docx(&document).unwrap())).unwrap();

        let mut read = |name: &str| {
            let mut xml = String::new();
            archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
            xml
        };
        let content_types = read("[Content_Types].xml");
        let rels = read("word/_rels/document.xml.rels");
        let styles = read("word/styles.xml");

        assert!(content_types.contains(r#"PartName="/word/styles.xml""#));
        assert!(rels.contains(r#"Target="styles.xml""#));
        for style in ["Title", "Heading1", "ListBullet"] {
            assert!(
                styles.contains(&format!(r#"w:styleId="{}""#, style)),
                "missing style {}",
                style
            );
        }
    }
}
