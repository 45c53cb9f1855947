//! PDF parsing and page geometry using lopdf

use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use shared_types::PageDimensions;

/// How far into the file a `%PDF-` header may appear
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Parent chains deeper than this are treated as cyclic
const MAX_TREE_DEPTH: usize = 64;

/// Wrapper around lopdf::Document that keeps the bytes it was loaded from
pub struct PdfDocument {
    pub(crate) doc: Document,
    pub(crate) bytes: Vec<u8>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("pages", &self.page_count())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    ///
    /// # Errors
    ///
    /// * `PdfError::NotPdf` when no `%PDF-` header is present
    /// * `PdfError::Encrypted` when the file carries an `/Encrypt` dictionary
    /// * `PdfError::Parse` for anything lopdf cannot read
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PdfError> {
        if !has_pdf_header(&bytes) {
            return Err(PdfError::NotPdf);
        }

        let doc = match Document::load_mem(&bytes) {
            Ok(doc) => doc,
            Err(_) if mentions_encryption(&bytes) => return Err(PdfError::Encrypted),
            Err(e) => return Err(PdfError::Parse(e.to_string())),
        };

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc, bytes })
    }

    /// Get the raw bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the number of pages
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Get page object ID for a given page number (1-indexed)
    pub fn page_id(&self, page_num: u32) -> Option<ObjectId> {
        self.doc.get_pages().get(&page_num).copied()
    }

    /// Get page geometry from the page's MediaBox (1-indexed)
    pub fn page_dimensions(&self, page_num: u32) -> Result<PageDimensions, PdfError> {
        let page_id = self
            .page_id(page_num)
            .ok_or(PdfError::PageNotFound(page_num))?;
        let page_dict = self.doc.get_dictionary(page_id)?;
        let media_box = self.get_media_box(page_dict)?;
        Ok(PageDimensions::from_media_box(media_box))
    }

    /// Extract MediaBox from page dictionary, walking up the page tree if needed
    fn get_media_box(&self, page_dict: &Dictionary) -> Result<[f64; 4], PdfError> {
        let mut current = page_dict;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(media_box) = current.get(b"MediaBox") {
                return self.parse_rect(media_box);
            }
            let parent = current
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id));
            match parent {
                Ok(parent_dict) => current = parent_dict,
                Err(_) => break,
            }
        }

        // Default to US Letter size
        Ok(PageDimensions::letter().media_box())
    }

    /// Parse a PDF rectangle array into [x, y, width, height]
    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4], PdfError> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self.doc.get_object(*id)?.as_array().map_err(|_| {
                PdfError::Malformed("MediaBox reference is not an array".to_string())
            })?,
            _ => return Err(PdfError::Malformed("MediaBox is not an array".to_string())),
        };

        if arr.len() != 4 {
            return Err(PdfError::Malformed(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }

        // Corners may come in any order
        let x = values[0].min(values[2]);
        let y = values[1].min(values[3]);
        Ok([
            x,
            y,
            (values[2] - values[0]).abs(),
            (values[3] - values[1]).abs(),
        ])
    }

    /// Extract a number from a PDF object
    fn extract_number(&self, obj: &Object) -> Result<f64, PdfError> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => self.extract_number(self.doc.get_object(*id)?),
            _ => Err(PdfError::Malformed(
                "Expected number in rectangle".to_string(),
            )),
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Get mutable access to the internal document
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Save the document to bytes
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Save(e.to_string()))?;
        self.bytes = buffer.clone();
        Ok(buffer)
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

fn mentions_encryption(bytes: &[u8]) -> bool {
    bytes.windows(8).any(|w| w == b"/Encrypt")
}
