//! Uploaded document text extraction.
//!
//! PDF only; other formats are rejected before the upload is stored.

use lopdf::Document;

const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];

/// Check if the uploaded file has an allowed extension.
pub fn allowed_file(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to load pdf: {0}")]
    Load(#[from] lopdf::Error),

    #[error("no text extracted from pdf")]
    Empty,
}

/// Extract text from a PDF, page by page.
///
/// Pages that fail to extract are logged and skipped; an entirely empty
/// result is an error.
pub fn extract_text_from_pdf(data: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(data)?;

    let mut text = String::new();
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push(' ');
            }
            Err(e) => {
                tracing::warn!("failed to extract text from page {page_num}: {e}");
            }
        }
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("protocol.pdf"));
        assert!(allowed_file("PROTOCOL.PDF"));
        assert!(allowed_file("study.v2.pdf"));
        assert!(!allowed_file("protocol.docx"));
        assert!(!allowed_file("protocol.txt"));
        assert!(!allowed_file("protocol"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let result = extract_text_from_pdf(b"not a pdf at all");
        assert!(matches!(result, Err(ExtractError::Load(_))));
    }

    #[test]
    fn test_pdf_without_text_is_empty() {
        use lopdf::{dictionary, Object};

        // A structurally valid document with no pages extracts nothing.
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let result = extract_text_from_pdf(&bytes);
        assert!(matches!(result, Err(ExtractError::Empty)));
    }

    #[test]
    fn test_extracts_fixture_text() {
        let data = include_bytes!("../tests/fixtures/sample.pdf");
        let text = extract_text_from_pdf(data).unwrap();
        assert!(text.contains("Hello"), "extracted: {text:?}");
    }
}
