//! PDF collaborators: text extraction and page rendering.
//!
//! Both operations sit behind traits so the indexer and the vision tool
//! can be tested without poppler installed. The shipped implementations
//! shell out to the poppler CLI utilities (`pdftotext`, `pdftoppm`),
//! which handle the formats far more robustly than any pure-Rust
//! reimplementation would.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::error::{RagError, Result};

/// Extracts per-page text from a PDF.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    /// Returns one string per page, in page order. Pages without
    /// extractable text (scanned pages) come back empty, not missing.
    async fn extract_pages(&self, pdf: &Path) -> Result<Vec<String>>;
}

/// Renders PDF pages to PNG images.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Renders up to `max_pages` pages of `pdf` into `out_dir` at the
    /// given resolution, returning the image paths in page order.
    async fn render_pages(
        &self,
        pdf: &Path,
        out_dir: &Path,
        max_pages: usize,
        dpi: u32,
    ) -> Result<Vec<PathBuf>>;
}

/// Text extraction via the `pdftotext` CLI.
#[derive(Debug, Clone, Default)]
pub struct PopplerExtractor;

#[async_trait]
impl PdfTextExtractor for PopplerExtractor {
    async fn extract_pages(&self, pdf: &Path) -> Result<Vec<String>> {
        let output = Command::new("pdftotext")
            .arg(pdf)
            .arg("-")
            .output()
            .await
            .map_err(|e| RagError::Pdf(format!("failed to run pdftotext: {}", e)))?;

        if !output.status.success() {
            return Err(RagError::Pdf(format!(
                "pdftotext failed for {}: {}",
                pdf.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let pages = split_form_feed(&text);
        debug!(pdf = %pdf.display(), pages = pages.len(), "extracted PDF text");
        Ok(pages)
    }
}

/// Splits `pdftotext` output into pages. The tool terminates every page
/// with a form feed, so the final empty element is dropped.
fn split_form_feed(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw.split('\u{000C}').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().map(|p| p.trim().is_empty()).unwrap_or(false) {
        pages.pop();
    }
    pages
}

/// Page rendering via the `pdftoppm` CLI.
#[derive(Debug, Clone, Default)]
pub struct PopplerRenderer;

#[async_trait]
impl PageRenderer for PopplerRenderer {
    async fn render_pages(
        &self,
        pdf: &Path,
        out_dir: &Path,
        max_pages: usize,
        dpi: u32,
    ) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(out_dir).await?;
        let prefix = out_dir.join("page");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(max_pages.to_string())
            .arg(pdf)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| RagError::Pdf(format!("failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            return Err(RagError::Pdf(format!(
                "pdftoppm failed for {}: {}",
                pdf.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // pdftoppm zero-pads page numbers by the document's total page
        // count (page-1.png vs page-01.png), so scan the directory
        // rather than predicting names.
        let mut produced = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_page_png = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("page-") && n.ends_with(".png"))
                .unwrap_or(false);
            if is_page_png {
                produced.push(path);
            }
        }
        produced.sort();
        produced.truncate(max_pages);

        debug!(pdf = %pdf.display(), rendered = produced.len(), "rendered PDF pages");
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_form_feed_drops_terminator() {
        let raw = "page one\u{000C}page two\u{000C}";
        assert_eq!(split_form_feed(raw), vec!["page one", "page two"]);
    }

    #[test]
    fn test_split_form_feed_keeps_interior_blank_pages() {
        let raw = "page one\u{000C}\u{000C}page three\u{000C}";
        assert_eq!(split_form_feed(raw), vec!["page one", "", "page three"]);
    }

    #[test]
    fn test_split_form_feed_no_marker() {
        assert_eq!(split_form_feed("single blob"), vec!["single blob"]);
    }

    // NOTE: These tests require poppler-utils (pdftotext, pdftoppm) on
    // PATH and a sample PDF. Run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_live_extract_pages() {
        let extractor = PopplerExtractor;
        let pages = extractor
            .extract_pages(Path::new("./docs/sample.pdf"))
            .await
            .unwrap();
        assert!(!pages.is_empty());
    }
}
