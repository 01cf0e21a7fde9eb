use anyhow::{Context, Result};
use lopdf::{dictionary, Document, Object, Stream};

use super::{MinutesDocument, SectionBody, EMPTY_SECTION};

const LINES_PER_PAGE: usize = 50;
const WRAP_WIDTH: usize = 90;

/// Letter-sized PDF in built-in Helvetica. No creation date is written.
pub fn render_pdf(document: &MinutesDocument) -> Result<Vec<u8>> {
    let lines = document_lines(document);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let resources_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }),
    );
    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        }),
    );

    let mut page_ids = Vec::new();
    for page_lines in lines.chunks(LINES_PER_PAGE) {
        let content_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        let content = Stream::new(dictionary! {}, page_content(page_lines).into_bytes());
        doc.objects.insert(content_id, Object::Stream(content));
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            }),
        );
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| (*id).into()).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).context("Failed to write PDF")?;
    Ok(buffer)
}

fn document_lines(document: &MinutesDocument) -> Vec<String> {
    let mut lines = vec![document.title.clone(), String::new()];
    lines.extend(document.details());

    for section in &document.sections {
        lines.push(String::new());
        lines.push(section.heading.to_uppercase());
        match &section.body {
            SectionBody::Paragraph(text) if text.trim().is_empty() => {
                lines.push(EMPTY_SECTION.to_string());
            }
            SectionBody::Paragraph(text) => {
                for paragraph in text.lines() {
                    lines.extend(wrap(paragraph, WRAP_WIDTH));
                }
            }
            SectionBody::List(items) if items.is_empty() => {
                lines.push(EMPTY_SECTION.to_string());
            }
            SectionBody::List(items) => {
                for item in items {
                    let mut wrapped = wrap(item, WRAP_WIDTH - 2).into_iter();
                    if let Some(first) = wrapped.next() {
                        lines.push(format!("- {}", first));
                    }
                    lines.extend(wrapped.map(|rest| format!("  {}", rest)));
                }
            }
        }
    }
    lines
}

/// Greedy word wrap. Words longer than the width are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();

        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn page_content(lines: &[String]) -> String {
    let mut content = String::from("BT\n/F1 11 Tf\n50 742 Td\n14 TL\n");
    for line in lines {
        content.push_str(&format!("({}) Tj T*\n", escape_pdf_string(line)));
    }
    content.push_str("ET\n");
    content
}

fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            c if c.is_ascii() && !c.is_control() => c.to_string(),
            _ => "?".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::completed_job;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three four", 9), vec!["one two", "three", "four"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string(r"a (b) \c"), r"a \(b\) \\c");
        assert_eq!(escape_pdf_string("caf\u{e9}"), "caf?");
    }

    #[test]
    fn test_pdf_structure() {
        let document = MinutesDocument::from_job(&completed_job()).unwrap();
        let bytes = render_pdf(&document).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let parsed = Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn test_long_documents_paginate() {
        let mut document = MinutesDocument::from_job(&completed_job()).unwrap();
        document.sections[1].body =
            SectionBody::List((0..120).map(|i| format!("Task number {}", i)).collect());

        let bytes = render_pdf(&document).unwrap();
        let parsed = Document::load_mem(&bytes).unwrap();
        assert!(parsed.get_pages().len() >= 3);
    }
}
