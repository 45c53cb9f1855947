//! Draw images onto existing PDF pages without touching their content
//!
//! Each stamped page gets its original content streams wrapped in a `q`/`Q`
//! pair once, then one extra content stream per image. Nothing on the page is
//! rewritten, so text and vector content survive as-is.

use crate::error::PdfError;
use crate::parser::PdfDocument;
use crate::xobject::add_image_xobject;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use shared_types::{RasterImage, Rect};
use std::collections::HashSet;

const MAX_TREE_DEPTH: usize = 64;

/// Stamps images onto the pages of a loaded document
pub struct PdfStamper<'a> {
    doc: &'a mut PdfDocument,
    isolated: HashSet<ObjectId>,
    stamped: usize,
}

impl<'a> PdfStamper<'a> {
    pub fn new(doc: &'a mut PdfDocument) -> Self {
        Self {
            doc,
            isolated: HashSet::new(),
            stamped: 0,
        }
    }

    /// Number of images drawn so far
    pub fn stamped(&self) -> usize {
        self.stamped
    }

    /// Draw `image` stretched over `rect` on page `page_num` (1-indexed)
    ///
    /// `rect` is in document space, anchored at its bottom-left corner.
    /// Returns the resource name the image was registered under.
    pub fn stamp_image(
        &mut self,
        page_num: u32,
        rect: Rect,
        image: &RasterImage,
    ) -> Result<String, PdfError> {
        if !rect.is_valid() {
            return Err(PdfError::Malformed(format!(
                "stamp rectangle {:?} has no area",
                rect
            )));
        }
        let page_id = self
            .doc
            .page_id(page_num)
            .ok_or(PdfError::PageNotFound(page_num))?;

        let doc = self.doc.doc_mut();
        if !self.isolated.contains(&page_id) {
            isolate_content(doc, page_id)?;
            self.isolated.insert(page_id);
        }

        let xobject_id = add_image_xobject(doc, image)?;
        let name = match register_xobject(doc, page_id, xobject_id) {
            Ok(name) => name,
            Err(e) => {
                discard_xobject(doc, xobject_id);
                return Err(e);
            }
        };

        let content = format!(
            "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/{} Do\nQ\n",
            rect.width, rect.height, rect.x, rect.y, name
        );
        append_content(doc, page_id, content.into_bytes())?;

        self.stamped += 1;
        tracing::debug!(page = page_num, name = %name, "stamped image");
        Ok(name)
    }
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, PdfError> {
    Ok(doc.get_object_mut(page_id)?.as_dict_mut()?)
}

/// Content stream references of a page in drawing order
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, PdfError> {
    let page = doc.get_dictionary(page_id)?;
    let refs = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(arr) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };
    Ok(refs)
}

/// Wrap the page's existing content in a save/restore pair
///
/// Pages that leave a transform or colour set at the end of their content
/// would otherwise skew anything appended after them.
fn isolate_content(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfError> {
    let original = content_refs(doc, page_id)?;
    let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    let mut contents = Vec::with_capacity(original.len() + 2);
    contents.push(Object::Reference(save));
    contents.extend(original);
    contents.push(Object::Reference(restore));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn append_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<(), PdfError> {
    let mut contents = content_refs(doc, page_id)?;
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content));
    contents.push(Object::Reference(stream_id));
    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Remove an image XObject, and its soft mask, that no page refers to
fn discard_xobject(doc: &mut Document, xobject_id: ObjectId) {
    if let Some(Object::Stream(stream)) = doc.objects.remove(&xobject_id) {
        if let Ok(mask_id) = stream.dict.get(b"SMask").and_then(Object::as_reference) {
            doc.objects.remove(&mask_id);
        }
    }
}

enum Slot {
    Inline,
    Shared(ObjectId),
}

/// Resolve a dictionary-valued entry that may be inline or indirect
fn resolve_dict(doc: &Document, obj: &Object) -> Result<(Dictionary, Slot), PdfError> {
    match obj {
        Object::Dictionary(dict) => Ok((dict.clone(), Slot::Inline)),
        Object::Reference(id) => Ok((doc.get_dictionary(*id)?.clone(), Slot::Shared(*id))),
        _ => Err(PdfError::Malformed(
            "expected a dictionary or reference".to_string(),
        )),
    }
}

/// Resources in effect for a page, following inheritance through the page tree
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<(Dictionary, Slot), PdfError> {
    let page = doc.get_dictionary(page_id)?;
    if let Ok(obj) = page.get(b"Resources") {
        return resolve_dict(doc, obj);
    }

    let mut current = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent = match current.get(b"Parent").and_then(Object::as_reference) {
            Ok(id) => doc.get_dictionary(id)?,
            Err(_) => break,
        };
        if let Ok(obj) = parent.get(b"Resources") {
            // Inherited resources are copied onto the page rather than edited in place
            let (dict, _) = resolve_dict(doc, obj)?;
            return Ok((dict, Slot::Inline));
        }
        current = parent;
    }
    Ok((Dictionary::new(), Slot::Inline))
}

/// Register `xobject_id` in the page's XObject resources under a fresh name
fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<String, PdfError> {
    let (mut resources, resources_slot) = page_resources(doc, page_id)?;
    let (mut xobjects, xobjects_slot) = match resources.get(b"XObject") {
        Ok(obj) => resolve_dict(doc, obj)?,
        Err(_) => (Dictionary::new(), Slot::Inline),
    };

    let mut n = xobjects.len() + 1;
    let name = loop {
        let candidate = format!("SigImg{}", n);
        if !xobjects.has(candidate.as_bytes()) {
            break candidate;
        }
        n += 1;
    };
    xobjects.set(name.as_bytes().to_vec(), Object::Reference(xobject_id));

    match xobjects_slot {
        Slot::Shared(id) => {
            doc.objects.insert(id, Object::Dictionary(xobjects));
        }
        Slot::Inline => resources.set("XObject", Object::Dictionary(xobjects)),
    }
    match resources_slot {
        Slot::Shared(id) => {
            doc.objects.insert(id, Object::Dictionary(resources));
        }
        Slot::Inline => page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources)),
    }
    Ok(name)
}
