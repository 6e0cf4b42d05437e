use std::path::Path;

use crate::reader::{DocumentReader, Extracted};
use crate::{Error, Result};

/// Page separator emitted by the text extractor.
const PAGE_BREAK: char = '\u{c}';

/// PDF text layer extraction via `pdf-extract`.
///
/// Pages are split on form feeds; empty pages are dropped but keep their
/// 1-based number for the pages that follow. Scanned documents without a
/// text layer yield nothing, which lets [`ReaderSet`](super::ReaderSet) fall
/// back to OCR.
pub struct PdfReader;

impl DocumentReader for PdfReader {
    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn extract(&self, path: &Path) -> Result<Vec<Extracted>> {
        let bytes = std::fs::read(path)?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| Error::Extraction(format!("{}: {e}", path.display())))?;
        Ok(split_pages(&text))
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}

fn split_pages(text: &str) -> Vec<Extracted> {
    text.split(PAGE_BREAK)
        .zip(1u32..)
        .filter(|(page, _)| !page.trim().is_empty())
        .map(|(page, number)| Extracted {
            text: page.to_string(),
            section: None,
            page: Some(number),
        })
        .collect()
}
