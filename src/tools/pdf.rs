//! Blood test report reader
//!
//! Pulls plain text out of an uploaded PDF with `lopdf`. Failures are typed
//! so the tool layer can turn them into readable observations.

use lopdf::Document;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("file not found at path: {0}")]
    NotFound(String),

    #[error("unable to parse PDF: {0}")]
    Unreadable(String),

    #[error("no content found in PDF")]
    Empty,
}

pub type ExtractionResult = Result<String, ExtractionError>;

/// Extract the full text of the PDF at `path`, pages in document order.
///
/// Runs of blank lines are collapsed to a single line break. A document
/// that parses but yields only whitespace is reported as `Empty`.
pub fn extract_text(path: &Path) -> ExtractionResult {
    if !path.is_file() {
        return Err(ExtractionError::NotFound(path.display().to_string()));
    }

    let document =
        Document::load(path).map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

    let pages = document.get_pages();
    let mut full_report = String::new();
    for page_number in pages.keys() {
        let content = document
            .extract_text(&[*page_number])
            .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
        full_report.push_str(&content);
        full_report.push('\n');
    }

    let full_report = collapse_blank_lines(&full_report);
    debug!(
        path = %path.display(),
        pages = pages.len(),
        chars = full_report.len(),
        "Extracted report text"
    );

    if full_report.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(full_report)
}

/// Collapse every run of consecutive line breaks into one.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_newline = false;
    for ch in text.chars() {
        if ch == '\n' {
            if previous_newline {
                continue;
            }
            previous_newline = true;
        } else {
            previous_newline = false;
        }
        out.push(ch);
    }
    out
}
