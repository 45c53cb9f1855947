//! Stateful signing session
//!
//! A `DocumentSession` owns everything tied to one uploaded document: the
//! source bytes, the renderer picked for them, the placed fields, the
//! signature pad and the page currently on screen. Dropping or resetting the
//! session releases all of it.
//!
//! Rendering is split in two so a caller can keep the session usable while a
//! page is being drawn: `request_page` hands out a [`RenderJob`] stamped with
//! a ticket, and `apply_render` accepts its outcome only if no newer request
//! or reset happened in between.

use crate::compose::{draw_image, outline, Tally, SIGNED_OUTLINE, UNSIGNED_OUTLINE};
use crate::config::SigningConfig;
use crate::error::{CompositingError, DocumentError, SigningError};
use crate::fields::{Field, FieldId, FieldModel};
use crate::ink::InkCapture;
use crate::pixels::image_from_pixmap;
use crate::renderer::{DocumentKind, DocumentRenderer, PageRaster, RendererAdapter};
use crate::signature::SignatureImage;
use shared_pdf::{display_to_surface, rescale_rect, surface_rect_to_display};
use shared_types::{Point, RasterImage, Rect, RenderedPage, Size};
use std::sync::Arc;
use uuid::Uuid;

/// Inset, in display pixels, between a field outline and its signature
const SIGNATURE_INSET: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The uploaded file, kept byte-for-byte
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
    pub kind: DocumentKind,
}

/// Where and how densely a page is being shown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Available width in CSS pixels
    pub container_width: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(container_width: f64, device_pixel_ratio: f64) -> Self {
        Self {
            container_width,
            device_pixel_ratio,
        }
    }
}

/// Identifies one render request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub session: SessionId,
    pub sequence: u64,
    pub page_index: usize,
}

/// A render request detached from the session
///
/// Holds its own handle to the renderer, so it can run while the session is
/// borrowed elsewhere.
#[derive(Debug)]
pub struct RenderJob {
    ticket: RenderTicket,
    renderer: Arc<DocumentRenderer>,
    scale: f64,
    display: Size,
}

impl RenderJob {
    pub fn ticket(&self) -> RenderTicket {
        self.ticket
    }

    pub async fn run(self) -> RenderOutcome {
        let result = self
            .renderer
            .render_page(self.ticket.page_index, self.scale)
            .await;
        RenderOutcome {
            ticket: self.ticket,
            display: self.display,
            result,
        }
    }
}

/// A finished render waiting to be applied
#[derive(Debug)]
pub struct RenderOutcome {
    pub ticket: RenderTicket,
    display: Size,
    result: Result<PageRaster, SigningError>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderApplied {
    /// The outcome became the current page view
    Applied(RenderedPage),
    /// A newer request or a reset superseded the outcome; it was dropped
    Stale,
}

/// The current page as composed for display
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub image: RasterImage,
    /// Signatures drawn onto the page
    pub drawn: usize,
    /// Signed fields whose signature could not be drawn
    pub skipped: Vec<CompositingError>,
}

/// The page currently on screen
#[derive(Debug)]
pub struct PageView {
    /// Layout size in CSS pixels
    pub display: Size,
    pub raster: PageRaster,
}

impl PageView {
    pub fn page(&self) -> &RenderedPage {
        &self.raster.page
    }
}

pub struct DocumentSession {
    id: SessionId,
    source: SourceDocument,
    renderer: Arc<DocumentRenderer>,
    fields: FieldModel,
    capture: InkCapture,
    view: Option<PageView>,
    latest_request: u64,
    config: SigningConfig,
    degraded: bool,
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("id", &self.id)
            .field("name", &self.source.name)
            .field("kind", &self.renderer.kind())
            .field("fields", &self.fields.len())
            .field("degraded", &self.degraded)
            .finish()
    }
}

impl DocumentSession {
    /// Open an uploaded document
    ///
    /// # Errors
    ///
    /// * `SigningError::Document` when the file type is not accepted or the
    ///   document cannot be opened
    /// * `SigningError::InvalidSurface` when the configured pad is unusable
    pub fn open(
        name: &str,
        media_type: &str,
        bytes: Vec<u8>,
        config: SigningConfig,
    ) -> Result<Self, SigningError> {
        let kind = DocumentKind::detect(media_type, name).ok_or_else(|| {
            DocumentError::UnsupportedFormat(format!("{} ({})", name, media_type))
        })?;
        let renderer = DocumentRenderer::open(kind, &bytes)?;
        Self::assemble(name, media_type, bytes, kind, renderer, config, false)
    }

    /// Open an uploaded document, falling back to the placeholder page
    ///
    /// When the real renderer cannot open the file the session still comes
    /// up, degraded, so fields can be placed without a live preview. The
    /// reason is returned alongside.
    pub fn open_or_degrade(
        name: &str,
        media_type: &str,
        bytes: Vec<u8>,
        config: SigningConfig,
    ) -> Result<(Self, Option<DocumentError>), SigningError> {
        let kind = DocumentKind::detect(media_type, name);
        let opened = kind
            .ok_or_else(|| DocumentError::UnsupportedFormat(format!("{} ({})", name, media_type)))
            .and_then(|kind| DocumentRenderer::open(kind, &bytes).map(|r| (kind, r)));

        match opened {
            Ok((kind, renderer)) => {
                let session = Self::assemble(name, media_type, bytes, kind, renderer, config, false)?;
                Ok((session, None))
            }
            Err(reason) => {
                tracing::warn!(name, error = %reason, "falling back to placeholder renderer");
                let session = Self::assemble(
                    name,
                    media_type,
                    bytes,
                    kind.unwrap_or(DocumentKind::Placeholder),
                    DocumentRenderer::Placeholder(Default::default()),
                    config,
                    true,
                )?;
                Ok((session, Some(reason)))
            }
        }
    }

    fn assemble(
        name: &str,
        media_type: &str,
        bytes: Vec<u8>,
        kind: DocumentKind,
        renderer: DocumentRenderer,
        config: SigningConfig,
        degraded: bool,
    ) -> Result<Self, SigningError> {
        let capture = InkCapture::from_config(&config.capture)?;
        let session = Self {
            id: SessionId::new(),
            source: SourceDocument {
                name: name.to_string(),
                media_type: media_type.to_string(),
                bytes: bytes.into(),
                kind,
            },
            renderer: Arc::new(renderer),
            fields: FieldModel::new(),
            capture,
            view: None,
            latest_request: 0,
            config,
            degraded,
        };
        tracing::info!(
            session = %session.id,
            name,
            kind = ?session.renderer.kind(),
            pages = session.renderer.page_count(),
            degraded,
            "document session opened"
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source(&self) -> &SourceDocument {
        &self.source
    }

    pub fn renderer(&self) -> &DocumentRenderer {
        &self.renderer
    }

    pub(crate) fn renderer_handle(&self) -> Arc<DocumentRenderer> {
        Arc::clone(&self.renderer)
    }

    /// True when the session runs on the placeholder renderer instead of the document's own
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn page_count(&self) -> usize {
        self.renderer.page_count()
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    pub fn fields(&self) -> &FieldModel {
        &self.fields
    }

    pub fn capture(&self) -> &InkCapture {
        &self.capture
    }

    /// The signature pad, for stroke input and confirmation
    pub fn capture_mut(&mut self) -> &mut InkCapture {
        &mut self.capture
    }

    pub fn current_view(&self) -> Option<&PageView> {
        self.view.as_ref()
    }

    /// CSS pixels per native unit for `page_index` laid out in `container_width`
    ///
    /// Pages are fitted to the container width but never blown up past
    /// `render.max_display_scale`.
    pub fn display_scale(&self, page_index: usize, container_width: f64) -> Result<f64, SigningError> {
        if !(container_width.is_finite() && container_width > 0.0) {
            return Err(SigningError::InvalidSurface(format!(
                "container width {} must be positive",
                container_width
            )));
        }
        let dims = self.renderer.page_dimensions(page_index)?;
        Ok((container_width / dims.width_units).min(self.config.render.max_display_scale))
    }

    /// Start rendering a page; any earlier request becomes stale
    pub fn request_page(&mut self, page_index: usize, viewport: Viewport) -> Result<RenderJob, SigningError> {
        if !(viewport.device_pixel_ratio.is_finite() && viewport.device_pixel_ratio > 0.0) {
            return Err(SigningError::InvalidSurface(format!(
                "device pixel ratio {} must be positive",
                viewport.device_pixel_ratio
            )));
        }
        let display_scale = self.display_scale(page_index, viewport.container_width)?;
        let dims = self.renderer.page_dimensions(page_index)?;

        self.latest_request += 1;
        let ticket = RenderTicket {
            session: self.id,
            sequence: self.latest_request,
            page_index,
        };
        tracing::debug!(
            session = %self.id,
            sequence = ticket.sequence,
            page = page_index,
            display_scale,
            "render requested"
        );

        Ok(RenderJob {
            ticket,
            renderer: self.renderer_handle(),
            scale: display_scale * viewport.device_pixel_ratio,
            display: Size::new(
                dims.width_units * display_scale,
                dims.height_units * display_scale,
            ),
        })
    }

    /// Install a finished render if it is still the latest request
    ///
    /// # Errors
    ///
    /// Returns the renderer's error when the latest request itself failed.
    /// Failures of superseded requests are dropped like any stale outcome.
    pub fn apply_render(&mut self, outcome: RenderOutcome) -> Result<RenderApplied, SigningError> {
        let ticket = outcome.ticket;
        if ticket.session != self.id || ticket.sequence != self.latest_request {
            tracing::warn!(
                session = %self.id,
                ticket_session = %ticket.session,
                sequence = ticket.sequence,
                latest = self.latest_request,
                page = ticket.page_index,
                "discarding stale render"
            );
            return Ok(RenderApplied::Stale);
        }

        let raster = outcome.result?;
        let page = raster.page;
        self.view = Some(PageView {
            display: outcome.display,
            raster,
        });
        tracing::debug!(session = %self.id, page = page.page_index, "render applied");
        Ok(RenderApplied::Applied(page))
    }

    /// Request, render and apply a page in one step
    pub async fn show_page(&mut self, page_index: usize, viewport: Viewport) -> Result<RenderedPage, SigningError> {
        let outcome = self.request_page(page_index, viewport)?.run().await;
        match self.apply_render(outcome)? {
            RenderApplied::Applied(page) => Ok(page),
            RenderApplied::Stale => Err(SigningError::StaleSession),
        }
    }

    fn view(&self) -> Result<&PageView, SigningError> {
        self.view.as_ref().ok_or(SigningError::NoPageRendered)
    }

    /// Arm field placement for the next click
    pub fn begin_placement(&mut self) {
        self.fields.begin_placement();
    }

    pub fn cancel_placement(&mut self) {
        self.fields.cancel_placement();
    }

    /// Place a field of the configured default size centred on a display-space click
    pub fn place_field(&mut self, display_point: Point) -> Result<FieldId, SigningError> {
        let size = self.config.fields.default_size();
        self.place_field_with_size(display_point, size)
    }

    /// Place a field of `size` surface pixels centred on a display-space click
    pub fn place_field_with_size(&mut self, display_point: Point, size: Size) -> Result<FieldId, SigningError> {
        let view = match self.view.as_ref() {
            Some(view) => view,
            None => {
                // The click still consumes placement mode
                self.fields.cancel_placement();
                return Err(SigningError::NoPageRendered);
            }
        };
        let page = view.raster.page;
        let center = display_to_surface(display_point, view.display, &page);
        let field = self.fields.add_field(&page, center, size)?;
        Ok(field.id)
    }

    /// Attach the pad's confirmed signature to a field
    ///
    /// # Errors
    ///
    /// * `UnknownField` if the field does not exist
    /// * `NoSignatureAvailable` if nothing has been confirmed on the pad
    pub fn sign_field(&mut self, id: FieldId) -> Result<&Field, SigningError> {
        let signature = self.capture.confirmed().cloned();
        self.fields.attach_signature(id, signature)
    }

    /// Attach a signature that did not come from the pad, such as one
    /// restored from a data URL
    pub fn sign_field_with(&mut self, id: FieldId, signature: SignatureImage) -> Result<&Field, SigningError> {
        self.fields.attach_signature(id, Some(signature))
    }

    pub fn unsign_field(&mut self, id: FieldId) -> Result<&Field, SigningError> {
        self.fields.detach_signature(id)
    }

    pub fn remove_field(&mut self, id: FieldId) -> Result<Field, SigningError> {
        self.fields.remove_field(id)
    }

    /// Field under a display-space point on the current page
    pub fn field_at(&self, display_point: Point) -> Option<&Field> {
        let view = self.view.as_ref()?;
        let page = view.page();
        let point = display_to_surface(display_point, view.display, page);
        self.fields.field_at(page, point)
    }

    /// Where a field sits on the current page, in display pixels
    pub fn field_display_rect(&self, id: FieldId) -> Option<Rect> {
        let view = self.view.as_ref()?;
        let field = self.fields.field(id)?;
        if field.page_index != view.page().page_index {
            return None;
        }
        let surface = rescale_rect(field.rect, &field.basis, view.page());
        Some(surface_rect_to_display(surface, view.display, view.page()))
    }

    /// The current page with field outlines and attached signatures drawn in
    ///
    /// Unsigned fields get a dashed blue outline, signed ones a solid green
    /// outline with the signature inset inside it. A signature that cannot
    /// be drawn keeps its outline and is reported in [`Preview::skipped`].
    pub fn compose_preview(&self) -> Result<Preview, SigningError> {
        let view = self.view()?;
        let page = view.page();
        let mut pixmap = view.raster.pixmap.clone();
        let px_per_css = page.surface_width() / view.display.width;
        let mut tally = Tally::default();

        for field in self.fields.fields_for_page(page.page_index) {
            let rect = rescale_rect(field.rect, &field.basis, page);
            match &field.signature {
                Some(signature) => {
                    outline(&mut pixmap, rect, SIGNED_OUTLINE, (2.0 * px_per_css) as f32, false);
                    let target = rect.inset(SIGNATURE_INSET * px_per_css);
                    let result = signature
                        .decode()
                        .and_then(|decoded| draw_image(&mut pixmap, &decoded, target))
                        .map_err(|e| e.to_string());
                    tally.record(field, result);
                }
                None => {
                    outline(&mut pixmap, rect, UNSIGNED_OUTLINE, (2.0 * px_per_css) as f32, true);
                }
            }
        }

        Ok(Preview {
            image: image_from_pixmap(&pixmap)?,
            drawn: tally.stamped,
            skipped: tally.skipped,
        })
    }

    /// Drop all fields, ink and the current view and start over on the same document
    ///
    /// The session gets a new id, so renders and exports still in flight are
    /// discarded when they come back.
    pub fn reset(&mut self) {
        let previous = self.id;
        self.id = SessionId::new();
        self.fields.clear();
        self.capture.clear();
        self.view = None;
        self.latest_request = 0;
        tracing::info!(previous = %previous, session = %self.id, "session reset");
    }

    /// Tear the session down, releasing the document and every render
    pub fn close(self) {
        tracing::info!(session = %self.id, name = %self.source.name, "document session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn placeholder_session() -> DocumentSession {
        DocumentSession::open_or_degrade("blank", "", Vec::new(), SigningConfig::default())
            .unwrap()
            .0
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        RasterImage::from_rgba(width, height, [240, 240, 240, 255].repeat((width * height) as usize))
            .unwrap()
            .encode_png()
            .unwrap()
    }

    fn sign_pad(session: &mut DocumentSession) -> SignatureImage {
        let pad = session.capture_mut();
        pad.begin_stroke(Point::new(20.0, 20.0));
        pad.extend_stroke(Point::new(200.0, 80.0));
        pad.end_stroke();
        pad.confirm().unwrap()
    }

    #[test]
    fn test_open_rejects_unknown_type() {
        let result = DocumentSession::open("notes.txt", "text/plain", b"hi".to_vec(), SigningConfig::default());
        assert!(matches!(
            result,
            Err(SigningError::Document(DocumentError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_open_or_degrade_reports_reason() {
        let (session, reason) = DocumentSession::open_or_degrade(
            "lease.pdf",
            "application/pdf",
            b"%PDF-1.7\ngarbage".to_vec(),
            SigningConfig::default(),
        )
        .unwrap();
        assert!(session.is_degraded());
        assert_eq!(session.source().kind, DocumentKind::Paginated);
        assert_eq!(session.renderer().kind(), DocumentKind::Placeholder);
        assert!(matches!(reason, Some(DocumentError::CorruptedDocument(_))));
    }

    #[test]
    fn test_display_scale_is_capped() {
        let session = placeholder_session();
        assert_eq!(session.display_scale(0, 300.0).unwrap(), 0.5);
        assert_eq!(session.display_scale(0, 3000.0).unwrap(), 1.5);
        assert!(session.display_scale(0, 0.0).is_err());
        assert!(matches!(
            session.display_scale(1, 600.0),
            Err(SigningError::PageOutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_show_page_sizes_surface_for_dpr() {
        let mut session = placeholder_session();
        let page = session.show_page(0, Viewport::new(300.0, 2.0)).await.unwrap();
        assert_eq!((page.surface_width_px, page.surface_height_px), (600, 800));
        let view = session.current_view().unwrap();
        assert_eq!(view.display, Size::new(300.0, 400.0));
    }

    #[tokio::test]
    async fn test_place_field_converts_click_to_surface() {
        let mut session = placeholder_session();
        session.show_page(0, Viewport::new(300.0, 2.0)).await.unwrap();

        session.begin_placement();
        let id = session.place_field(Point::new(100.0, 100.0)).unwrap();
        let field = session.fields().field(id).unwrap();
        assert_eq!(field.rect, Rect::new(125.0, 175.0, 150.0, 50.0));
        assert!(!session.fields().is_placing());

        // Display rect is the surface rect at half size
        assert_eq!(
            session.field_display_rect(id).unwrap(),
            Rect::new(62.5, 87.5, 75.0, 25.0)
        );
        assert_eq!(session.field_at(Point::new(100.0, 100.0)).unwrap().id, id);
    }

    #[test]
    fn test_place_field_needs_a_rendered_page() {
        let mut session = placeholder_session();
        session.begin_placement();
        assert!(matches!(
            session.place_field(Point::new(1.0, 1.0)),
            Err(SigningError::NoPageRendered)
        ));
        assert!(!session.fields().is_placing());
    }

    #[tokio::test]
    async fn test_sign_field_uses_confirmed_signature() {
        let mut session = placeholder_session();
        session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();
        session.begin_placement();
        let id = session.place_field(Point::new(300.0, 400.0)).unwrap();

        assert!(matches!(
            session.sign_field(id),
            Err(SigningError::NoSignatureAvailable)
        ));

        let signature = sign_pad(&mut session);
        let field = session.sign_field(id).unwrap();
        assert!(field.signature.as_ref().unwrap().ptr_eq(&signature));

        session.unsign_field(id).unwrap();
        assert_eq!(session.fields().signed_count(), 0);
    }

    #[tokio::test]
    async fn test_preview_draws_fields() {
        let mut session = placeholder_session();
        session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();

        session.begin_placement();
        let unsigned = session.place_field(Point::new(150.0, 500.0)).unwrap();
        session.begin_placement();
        let signed = session.place_field(Point::new(400.0, 600.0)).unwrap();
        sign_pad(&mut session);
        session.sign_field(signed).unwrap();

        let preview = session.compose_preview().unwrap();
        assert_eq!(preview.drawn, 1);
        assert!(preview.skipped.is_empty());
        let preview = preview.image;
        assert_eq!((preview.width(), preview.height()), (600, 800));

        let at = |x: u32, y: u32| {
            let i = ((y * preview.width() + x) * 4) as usize;
            [preview.pixels()[i], preview.pixels()[i + 1], preview.pixels()[i + 2]]
        };
        // Left edge of each outline
        let unsigned_rect = session.fields().field(unsigned).unwrap().rect;
        let signed_rect = session.fields().field(signed).unwrap().rect;
        let left = unsigned_rect.x as u32;
        assert!((unsigned_rect.y as u32..unsigned_rect.bottom() as u32)
            .any(|y| at(left, y) == [0x3b, 0x82, 0xf6]));
        // Dashed: some of the edge is left blank
        assert!((unsigned_rect.y as u32..unsigned_rect.bottom() as u32)
            .any(|y| at(left, y) == [255, 255, 255]));
        assert_eq!(at(signed_rect.x as u32, signed_rect.y as u32 + 20), [0x10, 0xb9, 0x81]);
    }

    #[tokio::test]
    async fn test_preview_reports_undrawable_signature() {
        let mut session = placeholder_session();
        session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();

        session.begin_placement();
        let good = session.place_field(Point::new(150.0, 200.0)).unwrap();
        sign_pad(&mut session);
        session.sign_field(good).unwrap();

        session.begin_placement();
        let broken = session.place_field(Point::new(400.0, 600.0)).unwrap();
        session
            .sign_field_with(broken, SignatureImage::from_encoded(b"not a png".to_vec(), 10, 10))
            .unwrap();

        let preview = session.compose_preview().unwrap();
        assert_eq!(preview.drawn, 1);
        assert_eq!(preview.skipped.len(), 1);
        assert_eq!(preview.skipped[0].field_id, broken);
        assert_eq!(preview.skipped[0].page_index, 0);

        // The broken field still gets its outline
        let rect = session.fields().field(broken).unwrap().rect;
        let i = ((rect.y as u32 + 20) * 600 + rect.x as u32) as usize * 4;
        assert_eq!(&preview.image.pixels()[i..i + 3], &[0x10, 0xb9, 0x81]);
    }

    #[tokio::test]
    async fn test_preview_reports_field_too_small_for_inset() {
        let mut session = placeholder_session();
        session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();
        session.begin_placement();
        let tiny = session
            .place_field_with_size(Point::new(300.0, 300.0), Size::new(8.0, 8.0))
            .unwrap();
        sign_pad(&mut session);
        session.sign_field(tiny).unwrap();

        let preview = session.compose_preview().unwrap();
        assert_eq!(preview.drawn, 0);
        assert_eq!(preview.skipped.len(), 1);
        assert_eq!(preview.skipped[0].field_id, tiny);
    }

    #[tokio::test]
    async fn test_more_ink_after_confirm_blocks_signing() {
        let mut session = placeholder_session();
        session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();
        session.begin_placement();
        let id = session.place_field(Point::new(300.0, 400.0)).unwrap();

        let pad = session.capture_mut();
        pad.begin_stroke(Point::new(20.0, 20.0));
        pad.extend_stroke(Point::new(100.0, 60.0));
        pad.confirm().unwrap();
        pad.extend_stroke(Point::new(200.0, 80.0));

        assert!(matches!(
            session.sign_field(id),
            Err(SigningError::NoSignatureAvailable)
        ));
        assert!(!session.fields().field(id).unwrap().is_signed());
    }

    #[tokio::test]
    async fn test_stale_render_is_discarded() {
        let mut session = placeholder_session();
        let first = session.request_page(0, Viewport::new(600.0, 1.0)).unwrap();
        let second = session.request_page(0, Viewport::new(300.0, 1.0)).unwrap();

        let second = second.run().await;
        let first = first.run().await;
        assert!(matches!(session.apply_render(second).unwrap(), RenderApplied::Applied(_)));
        assert_eq!(session.apply_render(first).unwrap(), RenderApplied::Stale);
        assert_eq!(session.current_view().unwrap().display.width, 300.0);
    }

    #[tokio::test]
    async fn test_reset_discards_inflight_render() {
        let mut session = placeholder_session();
        let job = session.request_page(0, Viewport::new(600.0, 1.0)).unwrap();
        let old_id = session.id();
        session.reset();
        assert_ne!(session.id(), old_id);

        let outcome = job.run().await;
        assert_eq!(session.apply_render(outcome).unwrap(), RenderApplied::Stale);
        assert!(session.current_view().is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let mut session = placeholder_session();
        session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();
        session.begin_placement();
        session.place_field(Point::new(100.0, 100.0)).unwrap();
        sign_pad(&mut session);

        session.reset();
        assert!(session.fields().is_empty());
        assert!(!session.capture().has_ink());
        assert!(session.capture().confirmed().is_none());
        assert!(session.current_view().is_none());
    }

    #[tokio::test]
    async fn test_raster_document_session() {
        let mut session = DocumentSession::open(
            "scan.png",
            "image/png",
            png_bytes(1200, 1600),
            SigningConfig::default(),
        )
        .unwrap();
        assert!(!session.is_degraded());
        assert_eq!(session.page_count(), 1);

        let page = session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();
        assert_eq!(page.native_width_units, 1200.0);
        assert_eq!(page.surface_width_px, 600);
    }
}
