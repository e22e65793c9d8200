//! Text extraction for uploaded files
//!
//! Only PDF and plain text are accepted. PDF goes through `pdf-extract` first;
//! when that fails or panics on an unusual font, `lopdf` is tried page by page.

use crate::error::{Error, Result};
use crate::types::FileType;

/// Replace ligatures and invisible characters PDF fonts tend to emit
#[cfg(feature = "pdf")]
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{00AD}', "")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// File text extractor
pub struct FileParser;

impl FileParser {
    /// Extract raw text from a file, dispatching on its extension
    ///
    /// Returns the text as extracted; whitespace is normalised later by the chunker.
    pub fn extract(filename: &str, data: &[u8]) -> Result<String> {
        match FileType::from_filename(filename) {
            FileType::Pdf => Self::extract_pdf(filename, data),
            FileType::Txt => Ok(Self::extract_text(data)),
            other => Err(Error::UnsupportedFileType(other.display_name().to_string())),
        }
    }

    /// Decode plain text, tolerating invalid UTF-8 and a leading BOM
    fn extract_text(data: &[u8]) -> String {
        let text = String::from_utf8_lossy(data);
        text.trim_start_matches('\u{FEFF}').replace('\0', "")
    }

    #[cfg(feature = "pdf")]
    fn extract_pdf(filename: &str, data: &[u8]) -> Result<String> {
        let primary = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data));

        match primary {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(cleanup_pdf_text(&text)),
            Ok(Ok(_)) => {
                tracing::debug!("pdf-extract found no text in {}, trying fallback", filename);
                Self::extract_pdf_fallback(filename, data)
            }
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed on {}: {}, trying fallback", filename, e);
                Self::extract_pdf_fallback(filename, data)
            }
            Err(_) => {
                tracing::warn!("pdf-extract panicked on {}, trying fallback", filename);
                Self::extract_pdf_fallback(filename, data)
            }
        }
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf(_filename: &str, _data: &[u8]) -> Result<String> {
        Err(Error::UnsupportedFileType(
            "PDF (this build has no PDF support)".to_string(),
        ))
    }

    /// Page-by-page extraction with lopdf
    #[cfg(feature = "pdf")]
    fn extract_pdf_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut text = String::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    tracing::debug!("Could not extract page {} of {}: {}", page_number, filename, e);
                }
            }
        }

        // Empty output is left to the pipeline, which reports it as no readable text
        Ok(cleanup_pdf_text(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_extraction() {
        let text = FileParser::extract("notes.txt", b"\xEF\xBB\xBFHostel fees are due in July").unwrap();
        assert_eq!(text, "Hostel fees are due in July");

        let lossy = FileParser::extract("notes.TXT", b"caf\xFF menu").unwrap();
        assert!(lossy.starts_with("caf"));
        assert!(lossy.ends_with(" menu"));
    }

    #[test]
    fn test_unsupported_types_are_rejected() {
        let err = FileParser::extract("timetable.docx", b"PK\x03\x04").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
        assert!(err.to_string().contains("docx"));

        assert!(matches!(
            FileParser::extract("Makefile", b"all:"),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_cleanup() {
        assert_eq!(cleanup_pdf_text("e\u{FB03}cient\0 o\u{FB03}ce"), "efficient office");
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_garbage_pdf_is_a_parse_error() {
        let err = FileParser::extract("handbook.pdf", b"not really a pdf").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
