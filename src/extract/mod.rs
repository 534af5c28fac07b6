//! Document Text Extraction
//!
//! Turns a resume or job description on disk into plain text.
//! Supports PDF (first pages only), DOCX and anything UTF-8-ish.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::types::{ExtractionError, FitError, Result};

static XML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Recognized document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Detect by file extension; unknown extensions are read as text
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            _ => Self::Text,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Text => "text",
        }
    }
}

/// Read a file and extract its text
pub async fn extract_text(path: &Path, config: &ExtractionConfig) -> Result<String> {
    let metadata = tokio::fs::metadata(path).await?;
    check_size(metadata.len(), config.max_file_size)?;

    let bytes = tokio::fs::read(path).await?;
    let format = DocumentFormat::from_path(path);
    info!(path = %path.display(), format = format.label(), bytes = bytes.len(), "Extracting text");

    extract_bytes(bytes, format, config).await
}

/// Extract text from in-memory content of a known format
pub async fn extract_bytes(
    bytes: Vec<u8>,
    format: DocumentFormat,
    config: &ExtractionConfig,
) -> Result<String> {
    check_size(bytes.len() as u64, config.max_file_size)?;

    let text = match format {
        DocumentFormat::Pdf => {
            let max_pages = config.max_pdf_pages;
            // pdf parsing is CPU-bound and may panic on hostile input
            tokio::task::spawn_blocking(move || pdf_text(&bytes, max_pages))
                .await
                .map_err(|e| ExtractionError::Unreadable {
                    format: format.label(),
                    reason: format!("parser crashed: {}", e),
                })??
        }
        DocumentFormat::Docx => docx_text(&bytes)?,
        DocumentFormat::Text => String::from_utf8_lossy(&bytes).into_owned(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::NoContent {
            format: format.label(),
        }
        .into());
    }

    debug!(chars = trimmed.len(), "Extraction complete");
    Ok(trimmed.to_string())
}

fn check_size(size: u64, limit: u64) -> std::result::Result<(), ExtractionError> {
    if size == 0 {
        return Err(ExtractionError::Empty);
    }
    if size > limit {
        return Err(ExtractionError::TooLarge { size, limit });
    }
    Ok(())
}

fn pdf_text(bytes: &[u8], max_pages: usize) -> std::result::Result<String, FitError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        let reason = e.to_string();
        let lower = reason.to_lowercase();
        let hint = if lower.contains("encrypt") || lower.contains("password") {
            "the PDF is password-protected, remove the password and try again"
        } else {
            "the file appears to be corrupted or not a valid PDF"
        };
        warn!(error = %reason, "PDF parsing failed");
        ExtractionError::Unreadable {
            format: "PDF",
            reason: format!("{} ({})", hint, reason),
        }
    })?;

    if pages.len() > max_pages {
        debug!(pages = pages.len(), max_pages, "Truncating PDF to page limit");
    }

    Ok(pages
        .iter()
        .take(max_pages)
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn docx_text(bytes: &[u8]) -> std::result::Result<String, ExtractionError> {
    let unreadable = |reason: String| ExtractionError::Unreadable {
        format: "DOCX",
        reason,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| unreadable(format!("not a valid Word document: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| unreadable(format!("missing document body: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| unreadable(e.to_string()))?;

    Ok(docx_xml_to_text(&xml))
}

/// Paragraphs become lines, tabs and breaks are kept, other markup dropped
fn docx_xml_to_text(xml: &str) -> String {
    let marked = xml
        .replace("</w:p>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<w:br/>", "\n");

    let stripped = XML_TAG.replace_all(&marked, "");
    let decoded = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
