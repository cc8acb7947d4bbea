//! Document text extraction
//!
//! PDF files go through `pdf-extract`; everything else is read as UTF-8
//! text. Extraction happens once per run and its output is never mutated.

use anyhow::{Context, Result};
use std::path::Path;

/// Reads a document into a single string
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Text layer extraction for PDF documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| anyhow::anyhow!("Failed to parse PDF: {}", e))
    }
}

/// Plain UTF-8 text files
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Chooses an extractor from the file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor {
    pdf: PdfExtractor,
    text: PlainTextExtractor,
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_pdf(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        if Self::is_pdf(path) {
            self.pdf.extract(path)
        } else {
            self.text.extract(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_text_extraction() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Software construction\nfundamentals").unwrap();

        let text = DocumentExtractor::new().extract(file.path()).unwrap();
        assert_eq!(text, "Software construction\nfundamentals");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = DocumentExtractor::new().extract(Path::new("/nonexistent/swebok.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_pdf_is_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(file, "this is not a pdf").unwrap();

        assert!(DocumentExtractor::new().extract(file.path()).is_err());
    }

    #[test]
    fn test_pdf_detection_is_case_insensitive() {
        assert!(DocumentExtractor::is_pdf(Path::new("guide.PDF")));
        assert!(DocumentExtractor::is_pdf(Path::new("guide.pdf")));
        assert!(!DocumentExtractor::is_pdf(Path::new("guide.txt")));
        assert!(!DocumentExtractor::is_pdf(Path::new("guide")));
    }
}
