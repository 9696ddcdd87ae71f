use std::{
    io::{Cursor, Read},
    path::Path,
};

use quick_xml::{events::Event, Reader};
use thiserror::Error;

const WORD_BODY_PART: &str = "word/document.xml";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Could not read document: {0}")]
    Unreadable(String),

    #[error("Document contains no text")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Word,
}

impl DocumentKind {
    /// Picks the format from the file extension, falling back to the content
    /// type when the name has none. Legacy `.doc` files are not supported.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Result<Self, ExtractionError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let kind = match extension.as_deref() {
            Some("txt" | "text" | "md" | "markdown" | "csv") => Some(DocumentKind::PlainText),
            Some("pdf") => Some(DocumentKind::Pdf),
            Some("docx") => Some(DocumentKind::Word),
            Some(_) => None,
            None => content_type.and_then(Self::from_content_type),
        };

        kind.ok_or_else(|| ExtractionError::UnsupportedFormat(file_name.to_string()))
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" | "text/markdown" | "text/csv" => Some(DocumentKind::PlainText),
            "application/pdf" => Some(DocumentKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentKind::Word)
            }
            _ => None,
        }
    }
}

/// Whitespace-only output is reported as [`ExtractionError::Empty`].
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = match kind {
        DocumentKind::PlainText => extract_plain(bytes)?,
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Word => extract_docx(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }

    log::debug!(
        "Extracted {} characters from {:?} document",
        text.chars().count(),
        kind
    );
    Ok(text)
}

fn extract_plain(bytes: &[u8]) -> Result<String, ExtractionError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ExtractionError::Unreadable(format!("text is not valid UTF-8: {}", e)))
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| ExtractionError::Unreadable(format!("invalid PDF: {}", e)))?;

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Err(ExtractionError::Empty);
    }

    document
        .extract_text(&pages)
        .map_err(|e| ExtractionError::Unreadable(format!("PDF text extraction failed: {}", e)))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Unreadable(format!("invalid .docx archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(WORD_BODY_PART)
        .map_err(|e| ExtractionError::Unreadable(format!("missing {}: {}", WORD_BODY_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Unreadable(format!("unreadable {}: {}", WORD_BODY_PART, e)))?;

    word_xml_text(&xml)
}

/// Collects `w:t` runs. Paragraph ends and `w:br` become newlines and
/// `w:tab` a tab; tab-stop definitions inside `w:tabs` are ignored.
fn word_xml_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;
    let mut in_tab_stops = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionError::Unreadable(format!("malformed document XML: {}", e)))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = true,
                b"w:tabs" => in_tab_stops = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:tabs" => in_tab_stops = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:tab" if !in_tab_stops => text.push('\t'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_run_text => {
                let run = e.unescape().map_err(|err| {
                    ExtractionError::Unreadable(format!("malformed document XML: {}", err))
                })?;
                text.push_str(&run);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(WORD_BODY_PART, SimpleFileOptions::default())
            .expect("zip entry should start");
        writer
            .write_all(xml.as_bytes())
            .expect("zip entry should be written");
        writer.finish().expect("zip should finish").into_inner()
    }

    #[test]
    fn detects_kind_by_extension_case_insensitively() {
        assert_eq!(
            DocumentKind::detect("Notes.TXT", None),
            Ok(DocumentKind::PlainText)
        );
        assert_eq!(
            DocumentKind::detect("chapter.pdf", None),
            Ok(DocumentKind::Pdf)
        );
        assert_eq!(
            DocumentKind::detect("essay.docx", Some("application/octet-stream")),
            Ok(DocumentKind::Word)
        );
    }

    #[test]
    fn falls_back_to_content_type_without_extension() {
        assert_eq!(
            DocumentKind::detect("upload", Some("text/plain; charset=utf-8")),
            Ok(DocumentKind::PlainText)
        );
        assert_eq!(
            DocumentKind::detect("upload", Some("application/pdf")),
            Ok(DocumentKind::Pdf)
        );
    }

    #[test]
    fn legacy_and_unknown_formats_are_unsupported() {
        assert_eq!(
            DocumentKind::detect("old.doc", None),
            Err(ExtractionError::UnsupportedFormat("old.doc".to_string()))
        );
        assert!(DocumentKind::detect("image.png", Some("text/plain")).is_err());
        assert!(DocumentKind::detect("upload", None).is_err());
    }

    #[test]
    fn plain_text_strips_bom() {
        let bytes = b"\xEF\xBB\xBFCells divide by mitosis.";

        let text = extract_text(DocumentKind::PlainText, bytes).expect("text should extract");

        assert_eq!(text, "Cells divide by mitosis.");
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let result = extract_text(DocumentKind::PlainText, &[0x66, 0xFF, 0xFE]);

        assert!(matches!(result, Err(ExtractionError::Unreadable(_))));
    }

    #[test]
    fn whitespace_only_document_is_empty() {
        assert_eq!(
            extract_text(DocumentKind::PlainText, b"  \n\t "),
            Err(ExtractionError::Empty)
        );
    }

    #[test]
    fn garbage_pdf_is_unreadable() {
        let result = extract_text(DocumentKind::Pdf, b"definitely not a pdf");

        assert!(matches!(result, Err(ExtractionError::Unreadable(_))));
    }

    #[test]
    fn docx_runs_and_paragraphs_are_extracted() {
        let bytes = docx_with_body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Photosynthesis</w:t></w:r><w:r><w:t xml:space="preserve"> &amp; respiration</w:t></w:r></w:p><w:p><w:r><w:t>Step</w:t><w:tab/><w:t>one</w:t><w:br/><w:t>Step two</w:t></w:r></w:p>"#,
        );

        let text = extract_text(DocumentKind::Word, &bytes).expect("docx should extract");

        assert_eq!(text, "Photosynthesis & respiration\nStep\tone\nStep two\n");
    }

    #[test]
    fn docx_without_body_part_is_unreadable() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", SimpleFileOptions::default())
            .expect("zip entry should start");
        writer.write_all(b"<styles/>").expect("zip entry should be written");
        let bytes = writer.finish().expect("zip should finish").into_inner();

        let result = extract_text(DocumentKind::Word, &bytes);

        assert!(matches!(result, Err(ExtractionError::Unreadable(_))));
    }

    #[test]
    fn non_zip_docx_is_unreadable() {
        let result = extract_text(DocumentKind::Word, b"plain bytes");

        assert!(matches!(result, Err(ExtractionError::Unreadable(_))));
    }
}
