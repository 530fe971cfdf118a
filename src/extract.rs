//! Text extraction for indexed regulation documents.
//!
//! Sources supply bytes plus a content type; this module returns one text
//! entry per page for PDFs and a single entry for plain text. Extraction
//! never panics the caller: [`extract_pages_blocking`] runs the PDF parser on
//! a blocking worker and turns a parser panic into an error.

use std::borrow::Cow;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// Extraction error. The ingest pipeline logs it and skips the document.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedContentType(String),
    Pdf(String),
    Encoding(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedContentType(ct) => {
                write!(f, "unsupported content-type: {}", ct)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Encoding(e) => write!(f, "text is not valid UTF-8: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Guess a content type from a file name or URL path.
pub fn content_type_for(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    let lower = lower.split(['?', '#']).next().unwrap_or_default();
    if lower.ends_with(".pdf") {
        Some(MIME_PDF)
    } else if lower.ends_with(".txt") {
        Some(MIME_TEXT)
    } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
        Some(MIME_MARKDOWN)
    } else {
        None
    }
}

/// Extract text pages. PDFs yield at most `max_pages` entries, blank pages
/// dropped; text documents yield one entry. Page numbers are 1-based.
pub fn extract_pages(
    bytes: &[u8],
    content_type: &str,
    max_pages: usize,
) -> Result<Vec<(Option<u32>, String)>, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf_pages(bytes, max_pages),
        MIME_TEXT | MIME_MARKDOWN => {
            let text =
                std::str::from_utf8(bytes).map_err(|e| ExtractError::Encoding(e.to_string()))?;
            let text = text.trim();
            if text.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![(None, text.to_string())])
            }
        }
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

fn extract_pdf_pages(
    bytes: &[u8],
    max_pages: usize,
) -> Result<Vec<(Option<u32>, String)>, ExtractError> {
    let capped = first_pages(bytes, max_pages)?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&capped)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| (Some(i as u32 + 1), collapse_whitespace(&text)))
        .filter(|(_, text)| !text.is_empty())
        .collect())
}

/// The document cut down to its first `max_pages` pages, so the text
/// extractor never parses the rest.
fn first_pages(bytes: &[u8], max_pages: usize) -> Result<Cow<'_, [u8]>, ExtractError> {
    let mut doc =
        lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let beyond: Vec<u32> = doc
        .get_pages()
        .keys()
        .copied()
        .filter(|n| *n as usize > max_pages)
        .collect();
    if beyond.is_empty() {
        return Ok(Cow::Borrowed(bytes));
    }

    doc.delete_pages(&beyond);
    doc.prune_objects();
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(Cow::Owned(out))
}

/// Run [`extract_pages`] on the blocking pool. A panic inside the PDF parser
/// surfaces as [`ExtractError::Pdf`].
pub async fn extract_pages_blocking(
    bytes: Vec<u8>,
    content_type: &'static str,
    max_pages: usize,
) -> Result<Vec<(Option<u32>, String)>, ExtractError> {
    tokio::task::spawn_blocking(move || extract_pages(&bytes, content_type, max_pages))
        .await
        .unwrap_or_else(|e| Err(ExtractError::Pdf(format!("extractor aborted: {}", e))))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content hash used to index identical documents once.
pub fn content_hash(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_content_type_returns_error() {
        let err = extract_pages(b"foo", "application/octet-stream", 10).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedContentType(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pages(b"not a pdf", MIME_PDF, 10).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn plain_text_is_one_unnumbered_page() {
        let pages = extract_pages("  Trabalho em Altura \n".as_bytes(), MIME_TEXT, 10).unwrap();
        assert_eq!(pages, vec![(None, "Trabalho em Altura".to_string())]);
        assert!(extract_pages(b"   ", MIME_TEXT, 10).unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_text_returns_error() {
        let err = extract_pages(&[0xff, 0xfe, 0x00], MIME_TEXT, 10).unwrap_err();
        assert!(matches!(err, ExtractError::Encoding(_)));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("NR-35.PDF"), Some(MIME_PDF));
        assert_eq!(content_type_for("https://x.org/nr10.pdf?dl=1"), Some(MIME_PDF));
        assert_eq!(content_type_for("notes.md"), Some(MIME_MARKDOWN));
        assert_eq!(content_type_for("a.txt"), Some(MIME_TEXT));
        assert_eq!(content_type_for("image.png"), None);
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = content_hash(b"abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, content_hash(b"abc"));
        assert_ne!(h, content_hash(b"abd"));
    }

    /// `total` pages reading "Pagina n"; pages from `broken_from` on use a
    /// font missing from their resources.
    fn numbered_pdf(total: u32, broken_from: u32) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids: Vec<Object> = Vec::new();
        for n in 1..=total {
            let font = if n >= broken_from { "F9" } else { "F1" };
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![font.into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Pagina {}", n))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => i64::from(total),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pages_past_the_cap_are_never_parsed() {
        let bytes = numbered_pdf(15, 12);
        let pages = extract_pages(&bytes, MIME_PDF, 10).unwrap();
        assert_eq!(pages.len(), 10);
        assert_eq!(pages[0].0, Some(1));
        assert_eq!(pages[9].0, Some(10));
        assert!(pages[0].1.contains("Pagina"), "{:?}", pages[0]);
    }

    #[test]
    fn short_pdf_is_read_whole() {
        let bytes = numbered_pdf(3, u32::MAX);
        let pages = extract_pages(&bytes, MIME_PDF, 10).unwrap();
        assert_eq!(pages.len(), 3);
    }

    #[tokio::test]
    async fn blocking_wrapper_reports_bad_pdf() {
        let err = extract_pages_blocking(b"%PDF-garbage".to_vec(), MIME_PDF, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
