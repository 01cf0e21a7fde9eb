use super::{MinutesDocument, SectionBody, EMPTY_SECTION};

pub fn render_txt(document: &MinutesDocument) -> String {
    let mut out = String::new();
    push_underlined(&mut out, &document.title, '=');
    out.push('\n');
    for line in document.details() {
        out.push_str(&line);
        out.push('\n');
    }

    for section in &document.sections {
        out.push('\n');
        push_underlined(&mut out, section.heading, '-');
        match &section.body {
            SectionBody::Paragraph(text) => {
                out.push_str(non_empty(text));
                out.push('\n');
            }
            SectionBody::List(items) if items.is_empty() => {
                out.push_str(EMPTY_SECTION);
                out.push('\n');
            }
            SectionBody::List(items) => {
                for item in items {
                    out.push_str("- ");
                    out.push_str(item);
                    out.push('\n');
                }
            }
        }
    }
    out
}

pub fn render_markdown(document: &MinutesDocument) -> String {
    let mut out = format!("# {}\n\n", document.title);
    for line in document.details() {
        // Split "Label: value" into a bold label.
        match line.split_once(": ") {
            Some((label, value)) => out.push_str(&format!("**{}:** {}  \n", label, value)),
            None => out.push_str(&format!("{}  \n", line)),
        }
    }

    for section in &document.sections {
        out.push_str(&format!("\n## {}\n\n", section.heading));
        match &section.body {
            SectionBody::Paragraph(text) => {
                out.push_str(non_empty(text));
                out.push('\n');
            }
            SectionBody::List(items) if items.is_empty() => {
                out.push_str(&format!("_{}_\n", EMPTY_SECTION));
            }
            SectionBody::List(items) => {
                for item in items {
                    out.push_str(&format!("- {}\n", item));
                }
            }
        }
    }
    out
}

fn push_underlined(out: &mut String, heading: &str, underline: char) {
    out.push_str(heading);
    out.push('\n');
    out.extend(std::iter::repeat(underline).take(heading.chars().count()));
    out.push('\n');
}

fn non_empty(text: &str) -> &str {
    if text.trim().is_empty() {
        EMPTY_SECTION
    } else {
        text
    }
}
