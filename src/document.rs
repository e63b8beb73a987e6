//! PDF text extraction for uploaded medical reports

use lopdf::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Could not read the PDF: {0}")]
    Parse(String),
    #[error("The PDF contains no readable text")]
    NoText,
}

/// Extract the text of every page, in page order.
///
/// Pages whose text cannot be decoded contribute nothing. A document with no
/// text at all (for example a scanned image) is an error.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    // BTreeMap keys are page numbers, so iteration preserves page order
    let page_texts: Vec<String> = doc
        .get_pages()
        .keys()
        .map(|&page_number| {
            doc.extract_text(&[page_number]).unwrap_or_else(|e| {
                tracing::debug!(page = page_number, error = %e, "Skipping unreadable page");
                String::new()
            })
        })
        .collect();

    let text = join_pages(&page_texts);
    if text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }
    Ok(text)
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim_end())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
