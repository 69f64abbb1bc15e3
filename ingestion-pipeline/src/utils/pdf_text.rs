use std::path::{Path, PathBuf};

use common::error::AppError;
use lopdf::Document;
use tracing::{error, info};

/// Extracts the text layer of a PDF, one labelled section per non-blank page.
///
/// Runs the parsing on the blocking pool; encrypted documents are refused
/// rather than decrypted.
pub async fn extract_text(path: &Path) -> Result<String, AppError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text_blocking(&path)).await?
}

fn extract_text_blocking(path: &Path) -> Result<String, AppError> {
    let name = display_name(path);

    let document = Document::load(path).map_err(|err| {
        let message = err.to_string();
        error!(file = %name, error = %message, "Error in reading pdf");
        if looks_encrypted(&message) {
            AppError::Encrypted(name.clone())
        } else {
            AppError::PdfRead(format!("{name}: {message}"))
        }
    })?;

    extract_document_text(&document, &name)
}

/// Same as [`extract_text`] for a document that is already loaded.
pub fn extract_document_text(document: &Document, name: &str) -> Result<String, AppError> {
    if document.is_encrypted() {
        error!(file = %name, "Document is encrypted");
        return Err(AppError::Encrypted(name.to_string()));
    }

    let mut sections = Vec::new();
    // `get_pages` is keyed by 1-based page number in ascending order.
    for page_number in document.get_pages().keys() {
        let text = document.extract_text(&[*page_number]).map_err(|err| {
            error!(file = %name, page = page_number, error = %err, "Error in reading pdf");
            AppError::PdfRead(format!("{name}: page {page_number}: {err}"))
        })?;

        if text.trim().is_empty() {
            continue;
        }

        sections.push(page_section(*page_number, &text));
    }

    info!(file = %name, page_count = sections.len(), "PDF read successfully");
    Ok(sections.join("\n"))
}

fn page_section(page_number: u32, text: &str) -> String {
    format!("\n --- Page {page_number} --- \n {text}")
}

fn looks_encrypted(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("encrypt") || lowered.contains("password")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}
