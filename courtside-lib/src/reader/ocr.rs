use std::path::{Path, PathBuf};
use std::process::Command;

use uuid::Uuid;

use crate::reader::OcrConverter;
use crate::{Error, Result};

/// OCR for scanned PDFs using the `ocrmypdf` command line tool.
///
/// Converted files are written to the system temp directory so they never
/// end up in the corpus on the next rebuild. [`ReaderSet`](crate::reader::ReaderSet)
/// deletes each one after reading it back.
pub struct OcrMyPdf {
    program: PathBuf,
    output_dir: PathBuf,
}

impl Default for OcrMyPdf {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ocrmypdf"),
            output_dir: std::env::temp_dir(),
        }
    }
}

impl OcrMyPdf {
    /// Use a specific executable and output directory.
    pub fn new(program: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
        }
    }

    fn output_path(&self, path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        self.output_dir
            .join(format!("{stem}_ocr_{}.pdf", Uuid::new_v4().simple()))
    }
}

impl OcrConverter for OcrMyPdf {
    fn handles(&self, extension: &str) -> bool {
        extension == "pdf"
    }

    fn available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn convert(&self, path: &Path) -> Result<PathBuf> {
        let output = self.output_path(path);
        let result = Command::new(&self.program)
            .args(["--skip-text", "--deskew", "--rotate-pages"])
            .arg(path)
            .arg(&output)
            .output()?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let excerpt: String = stderr.chars().take(300).collect();
            return Err(Error::Extraction(format!(
                "ocrmypdf failed on {}: {excerpt}",
                path.display()
            )));
        }

        Ok(output)
    }
}
