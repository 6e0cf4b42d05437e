//! Document readers
//!
//! A [`DocumentReader`] turns one source file into `(text, metadata)` items.
//! The [`ReaderSet`] picks the readers registered for a file extension, tries
//! them in priority order and, when none yields usable text, runs an optional
//! [`OcrConverter`] once and retries on the converted file.
//!
//! Extraction failures never abort an index build: they are logged and the
//! file contributes no chunks.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::CategoryConfig;
use crate::Result;

/// One unit of extracted text (a page, a section or a whole file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub section: Option<String>,
    pub page: Option<u32>,
}

impl Extracted {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Trait for text extraction backends
pub trait DocumentReader: Send + Sync {
    /// Lower-case file extensions (without the dot) this reader handles
    fn extensions(&self) -> &[&str];

    /// Extract text items from a file
    fn extract(&self, path: &Path) -> Result<Vec<Extracted>>;

    /// Returns the backend name, used in logs
    fn name(&self) -> &str;
}

/// Converts a document without a text layer into one that has it.
pub trait OcrConverter: Send + Sync {
    /// Whether the converter handles files with this extension
    fn handles(&self, extension: &str) -> bool;

    /// Whether the converter can run on this machine
    fn available(&self) -> bool;

    /// Convert `path`, returning the path of a new converted file.
    ///
    /// The caller owns the returned file and removes it after reading.
    fn convert(&self, path: &Path) -> Result<PathBuf>;
}

/// Ordered collection of readers plus an optional OCR fallback.
#[derive(Default)]
pub struct ReaderSet {
    readers: Vec<Box<dyn DocumentReader>>,
    ocr: Option<Box<dyn OcrConverter>>,
}

impl ReaderSet {
    /// Create an empty set with no readers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// PDF, DOCX and plain text readers with `ocrmypdf` as fallback.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_reader(PdfReader)
            .with_reader(DocxReader)
            .with_reader(TextReader)
            .with_ocr(OcrMyPdf::default())
    }

    /// Register a reader. Earlier readers take priority for shared extensions.
    #[must_use]
    pub fn with_reader(mut self, reader: impl DocumentReader + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    #[must_use]
    pub fn with_ocr(mut self, ocr: impl OcrConverter + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    /// Returns `true` if some reader handles this file's extension.
    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        let ext = extension(path);
        self.readers.iter().any(|r| r.extensions().contains(&ext.as_str()))
    }

    /// Extract text from a file, absorbing backend failures.
    ///
    /// Returns an empty vector when no backend (and no OCR retry) yields text.
    pub fn extract(&self, path: &Path) -> Vec<Extracted> {
        let ext = extension(path);
        let items = self.try_readers(path, &ext);
        if !items.is_empty() {
            return items;
        }

        if let Some(ocr) = self.ocr.as_ref().filter(|o| o.handles(&ext)) {
            if ocr.available() {
                info!(file = %path.display(), "attempting OCR");
                match ocr.convert(path) {
                    Ok(converted) => {
                        let items = self.try_readers(&converted, &ext);
                        discard(&converted, path);
                        if !items.is_empty() {
                            info!(file = %path.display(), "OCR succeeded");
                            return items;
                        }
                    }
                    Err(e) => warn!(file = %path.display(), error = %e, "OCR failed"),
                }
            }
        }

        warn!(file = %path.display(), "no text extracted");
        Vec::new()
    }

    fn readers_for<'a>(
        &'a self,
        ext: &'a str,
    ) -> impl Iterator<Item = &'a dyn DocumentReader> + 'a {
        self.readers
            .iter()
            .map(|r| -> &'a dyn DocumentReader { &**r })
            .filter(move |r| r.extensions().contains(&ext))
    }

    fn try_readers(&self, path: &Path, ext: &str) -> Vec<Extracted> {
        for reader in self.readers_for(ext) {
            match reader.extract(path) {
                Ok(items) => {
                    let usable: Vec<_> = items
                        .into_iter()
                        .filter(|item| !item.text.trim().is_empty())
                        .collect();
                    if !usable.is_empty() {
                        return usable;
                    }
                    warn!(
                        file = %path.display(),
                        reader = reader.name(),
                        "degraded extraction: reader produced no text"
                    );
                }
                Err(e) => warn!(
                    file = %path.display(),
                    reader = reader.name(),
                    error = %e,
                    "degraded extraction: reader failed"
                ),
            }
        }
        Vec::new()
    }
}

/// Tag a file with the first vocabulary keyword found in its name.
///
/// Matching is a case-insensitive substring scan; files matching nothing get
/// the fallback tag.
#[must_use]
pub fn categorize(filename: &str, categories: &CategoryConfig) -> String {
    let name = filename.to_lowercase();
    categories
        .vocabulary
        .iter()
        .find(|keyword| name.contains(&keyword.to_lowercase()))
        .unwrap_or(&categories.fallback)
        .clone()
}

/// Remove an OCR output once it has been read back. Never touches the source.
fn discard(converted: &Path, source: &Path) {
    if converted == source {
        return;
    }
    if let Err(e) = std::fs::remove_file(converted) {
        warn!(file = %converted.display(), error = %e, "could not remove OCR output");
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

mod docx;
mod ocr;
mod pdf;
mod text;

pub use docx::*;
pub use ocr::*;
pub use pdf::*;
pub use text::*;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::Error;

    struct StubReader {
        name: &'static str,
        result: fn() -> Result<Vec<Extracted>>,
        calls: Arc<AtomicUsize>,
    }

    impl DocumentReader for StubReader {
        fn extensions(&self) -> &[&str] {
            &["pdf"]
        }

        fn extract(&self, _path: &Path) -> Result<Vec<Extracted>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct StubOcr {
        available: bool,
        calls: Arc<AtomicUsize>,
    }

    impl OcrConverter for StubOcr {
        fn handles(&self, extension: &str) -> bool {
            extension == "pdf"
        }

        fn available(&self) -> bool {
            self.available
        }

        fn convert(&self, path: &Path) -> Result<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(path.with_file_name("converted.pdf"))
        }
    }

    fn stub(name: &'static str, result: fn() -> Result<Vec<Extracted>>) -> (StubReader, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let reader = StubReader {
            name,
            result,
            calls: calls.clone(),
        };
        (reader, calls)
    }

    #[test]
    fn test_primary_reader_wins() {
        let (primary, primary_calls) = stub("primary", || Ok(vec![Extracted::new("entry angle")]));
        let (fallback, fallback_calls) = stub("fallback", || Ok(vec![Extracted::new("other")]));
        let readers = ReaderSet::new().with_reader(primary).with_reader(fallback);

        let items = readers.extract(Path::new("kb/Basketball.PDF"));

        assert_eq!(items, vec![Extracted::new("entry angle")]);
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_falls_back_when_primary_empty_or_failing() {
        let (empty, _) = stub("empty", || Ok(vec![Extracted::new("   ")]));
        let (broken, _) = stub("broken", || Err(Error::Extraction("bad xref".into())));
        let (good, good_calls) = stub("good", || Ok(vec![Extracted::new("follow-through")]));
        let readers = ReaderSet::new()
            .with_reader(empty)
            .with_reader(broken)
            .with_reader(good);

        let items = readers.extract(Path::new("scan.pdf"));

        assert_eq!(items.len(), 1);
        assert_eq!(good_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ocr_invoked_only_when_nothing_extracted() {
        let (empty, reader_calls) = stub("empty", || Ok(Vec::new()));
        let ocr_calls = Arc::new(AtomicUsize::new(0));
        let readers = ReaderSet::new().with_reader(empty).with_ocr(StubOcr {
            available: true,
            calls: ocr_calls.clone(),
        });

        let items = readers.extract(Path::new("scan.pdf"));

        assert!(items.is_empty());
        assert_eq!(ocr_calls.load(Ordering::SeqCst), 1);
        // once on the original, once on the converted file
        assert_eq!(reader_calls.load(Ordering::SeqCst), 2);
    }

    /// Writes each conversion into `out_dir`, like `ocrmypdf` would.
    struct FileOcr {
        out_dir: PathBuf,
        calls: AtomicUsize,
    }

    impl OcrConverter for FileOcr {
        fn handles(&self, extension: &str) -> bool {
            extension == "pdf"
        }

        fn available(&self) -> bool {
            true
        }

        fn convert(&self, path: &Path) -> Result<PathBuf> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let output = self.out_dir.join(format!("scan_ocr_{n}.pdf"));
            std::fs::copy(path, &output)?;
            Ok(output)
        }
    }

    /// Finds text only in files produced by OCR.
    struct OcrOnlyReader;

    impl DocumentReader for OcrOnlyReader {
        fn extensions(&self) -> &[&str] {
            &["pdf"]
        }

        fn extract(&self, path: &Path) -> Result<Vec<Extracted>> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.contains("_ocr_") {
                Ok(vec![Extracted::new("release angle")])
            } else {
                Ok(Vec::new())
            }
        }

        fn name(&self) -> &str {
            "ocr-only"
        }
    }

    #[test]
    fn test_ocr_output_removed_after_extraction() {
        let corpus = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let scan = corpus.path().join("scan.pdf");
        std::fs::write(&scan, b"%PDF-1.4 image only").unwrap();

        let readers = ReaderSet::new().with_reader(OcrOnlyReader).with_ocr(FileOcr {
            out_dir: out_dir.path().to_path_buf(),
            calls: AtomicUsize::new(0),
        });
        for _ in 0..3 {
            assert_eq!(readers.extract(&scan), vec![Extracted::new("release angle")]);
        }

        assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 0);
        assert!(scan.is_file());
    }

    #[test]
    fn test_ocr_output_removed_when_still_empty() {
        let corpus = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let scan = corpus.path().join("scan.pdf");
        std::fs::write(&scan, b"%PDF-1.4 blank").unwrap();

        let (empty, _) = stub("empty", || Ok(Vec::new()));
        let readers = ReaderSet::new().with_reader(empty).with_ocr(FileOcr {
            out_dir: out_dir.path().to_path_buf(),
            calls: AtomicUsize::new(0),
        });

        assert!(readers.extract(&scan).is_empty());
        assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unavailable_ocr_skipped() {
        let (empty, _) = stub("empty", || Ok(Vec::new()));
        let ocr_calls = Arc::new(AtomicUsize::new(0));
        let readers = ReaderSet::new().with_reader(empty).with_ocr(StubOcr {
            available: false,
            calls: ocr_calls.clone(),
        });

        assert!(readers.extract(Path::new("scan.pdf")).is_empty());
        assert_eq!(ocr_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_supports() {
        let readers = ReaderSet::standard();
        assert!(readers.supports(Path::new("a.pdf")));
        assert!(readers.supports(Path::new("b.DOCX")));
        assert!(readers.supports(Path::new("c.md")));
        assert!(!readers.supports(Path::new("d.mp4")));
        assert!(!readers.supports(Path::new("no_extension")));
    }

    #[test]
    fn test_categorize() {
        let categories = CategoryConfig::default();
        assert_eq!(
            categorize("Basketball_Knowledge_Base_for_AI.pdf", &categories),
            "basketball"
        );
        assert_eq!(categorize("SOCCER drills.docx", &categories), "soccer");
        assert_eq!(categorize("strength_training.pdf", &categories), "sports");
    }

    #[test]
    fn test_categorize_first_match_wins() {
        let categories = CategoryConfig::default();
        assert_eq!(categorize("tennis_vs_soccer.pdf", &categories), "soccer");
    }
}
