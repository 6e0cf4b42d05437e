use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};

use crate::reader::{DocumentReader, Extracted};
use crate::{Error, Result};

/// Maximum decompressed size of `word/document.xml`.
const MAX_DOCUMENT_XML_BYTES: u64 = 50 * 1024 * 1024;

/// Section name used before the first heading.
const DEFAULT_SECTION: &str = "Document";

/// Word (OOXML) documents, grouped into sections by heading paragraphs.
///
/// Every paragraph styled `Heading*` starts a new section; the body
/// paragraphs under it become one item tagged with the heading text.
pub struct DocxReader;

impl DocumentReader for DocxReader {
    fn extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn extract(&self, path: &Path) -> Result<Vec<Extracted>> {
        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(ooxml_error)?;
        let entry = archive
            .by_name("word/document.xml")
            .map_err(ooxml_error)?;

        let mut xml = Vec::new();
        entry.take(MAX_DOCUMENT_XML_BYTES).read_to_end(&mut xml)?;
        if xml.len() as u64 >= MAX_DOCUMENT_XML_BYTES {
            return Err(Error::Extraction(
                "word/document.xml exceeds size limit".into(),
            ));
        }

        sections(&xml)
    }

    fn name(&self) -> &str {
        "docx"
    }
}

/// A paragraph read from `word/document.xml`.
#[derive(Default)]
struct Paragraph {
    text: String,
    heading: bool,
}

/// Parse `word/document.xml` into heading-delimited sections.
pub(crate) fn sections(xml: &[u8]) -> Result<Vec<Extracted>> {
    let mut items = Vec::new();
    let mut body: Vec<String> = Vec::new();
    let mut section = DEFAULT_SECTION.to_string();

    for paragraph in paragraphs(xml)? {
        let text = paragraph.text.trim();
        if text.is_empty() {
            continue;
        }
        if paragraph.heading {
            if !body.is_empty() {
                items.push(section_item(&body, &section));
                body.clear();
            }
            section = text.to_string();
        } else {
            body.push(text.to_string());
        }
    }
    if !body.is_empty() {
        items.push(section_item(&body, &section));
    }

    Ok(items)
}

fn section_item(body: &[String], section: &str) -> Extracted {
    Extracted {
        text: body.join("\n"),
        section: Some(section.to_string()),
        page: None,
    }
}

fn paragraphs(xml: &[u8]) -> Result<Vec<Paragraph>> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut current: Option<Paragraph> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => current = Some(Paragraph::default()),
                b"t" => in_text = true,
                b"pStyle" => mark_heading(&e, current.as_mut()),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"pStyle" => mark_heading(&e, current.as_mut()),
                b"tab" | b"br" => {
                    if let Some(p) = current.as_mut() {
                        p.text.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                if let Some(p) = current.as_mut() {
                    let text = t.unescape().map_err(ooxml_error)?;
                    p.text.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

fn mark_heading(element: &BytesStart<'_>, paragraph: Option<&mut Paragraph>) {
    let Some(paragraph) = paragraph else {
        return;
    };
    if let Ok(Some(style)) = element.try_get_attribute("w:val") {
        if let Ok(value) = style.unescape_value() {
            paragraph.heading = value.contains("Heading");
        }
    }
}

fn ooxml_error(e: impl std::fmt::Display) -> Error {
    Error::Extraction(format!("OOXML extraction failed: {e}"))
}
