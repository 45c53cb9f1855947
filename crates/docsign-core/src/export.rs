//! Writing the signed artifact
//!
//! The uploaded bytes are never modified. Each export builds a new artifact
//! from a snapshot of the session, picking the most faithful path the
//! document's renderer allows:
//!
//! * PDF sources are reloaded and every signature is stamped onto its page
//! * image sources are composited at native resolution and written as PNG
//! * anything else is rebuilt from page rasters into a new PDF
//!
//! A signature that fails to decode or draw is skipped and reported in the
//! artifact; it never aborts the export.

use crate::compose::{draw_image, skip, Tally};
use crate::error::{CompositingError, DocumentError, SigningError};
use crate::fields::Field;
use crate::pixels::image_from_pixmap;
use crate::renderer::{DocumentRenderer, ExportCapability, RendererAdapter};
use crate::session::{DocumentSession, SessionId, SourceDocument};
use shared_pdf::{
    assemble_from_rasters, rect_to_document, rect_to_native, rescale_rect, PdfDocument,
    PdfStamper, RasterPage,
};
use shared_types::RasterImage;
use std::sync::Arc;

/// Producer recorded in rebuilt PDFs
const PRODUCER: &str = "docsign-core";

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const PNG_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExportFidelity {
    /// Original content kept; signatures drawn on top
    Preserved,
    /// Pages replaced by rasters of themselves
    Rasterized,
}

/// A finished export
#[derive(Clone, PartialEq)]
pub struct ExportArtifact {
    /// Session the export was taken from
    pub session: SessionId,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub media_type: &'static str,
    pub fidelity: ExportFidelity,
    pub page_count: usize,
    /// Signatures drawn into the output
    pub stamped: usize,
    /// Signed fields that could not be drawn
    pub skipped: Vec<CompositingError>,
}

impl std::fmt::Debug for ExportArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportArtifact")
            .field("session", &self.session)
            .field("bytes", &self.bytes.len())
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("fidelity", &self.fidelity)
            .field("page_count", &self.page_count)
            .field("stamped", &self.stamped)
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// `signed-<stem>.<extension>` for an uploaded file name
pub fn signed_file_name(original: &str, extension: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };
    let stem = if stem.trim().is_empty() { "document" } else { stem };
    format!("signed-{}.{}", stem, extension)
}

/// Snapshot of everything an export needs
///
/// Taken from the session up front so the session can keep changing while
/// the export runs. Signatures are shared, not copied.
#[derive(Debug)]
pub struct ExportJob {
    session: SessionId,
    source: SourceDocument,
    renderer: Arc<DocumentRenderer>,
    fields: Vec<Field>,
    export_scale: f64,
}

impl DocumentSession {
    pub fn begin_export(&self) -> ExportJob {
        ExportJob {
            session: self.id(),
            source: self.source().clone(),
            renderer: self.renderer_handle(),
            fields: self.fields().fields().to_vec(),
            export_scale: self.config().render.export_scale,
        }
    }

    /// Hand back an artifact only if it belongs to this session as it is now
    ///
    /// # Errors
    ///
    /// `SigningError::StaleSession` when the session was reset after the
    /// export started
    pub fn accept_export(&self, artifact: ExportArtifact) -> Result<ExportArtifact, SigningError> {
        if artifact.session != self.id() {
            tracing::warn!(
                session = %self.id(),
                artifact_session = %artifact.session,
                "discarding export from a previous session"
            );
            return Err(SigningError::StaleSession);
        }
        Ok(artifact)
    }
}

/// Export the session's document with every signed field composited in
pub async fn export(session: &DocumentSession) -> Result<ExportArtifact, SigningError> {
    let artifact = session.begin_export().run().await?;
    session.accept_export(artifact)
}

impl ExportJob {
    pub async fn run(self) -> Result<ExportArtifact, SigningError> {
        let capability = self.renderer.export_capability();
        let artifact = match capability {
            ExportCapability::PreservePdf => self.export_pdf()?,
            ExportCapability::PreservePng => self.export_png().await?,
            ExportCapability::RasterOnly => self.export_rasterized().await?,
        };
        tracing::info!(
            session = %artifact.session,
            file = %artifact.file_name,
            fidelity = ?artifact.fidelity,
            pages = artifact.page_count,
            stamped = artifact.stamped,
            skipped = artifact.skipped.len(),
            "export complete"
        );
        Ok(artifact)
    }

    /// Signed fields on `page_index` in placement order
    fn signed_on_page(&self, page_index: usize) -> impl Iterator<Item = &Field> + '_ {
        self.fields
            .iter()
            .filter(move |f| f.page_index == page_index && f.signature.is_some())
    }

    fn artifact(
        &self,
        bytes: Vec<u8>,
        extension: &str,
        media_type: &'static str,
        fidelity: ExportFidelity,
        page_count: usize,
        tally: Tally,
    ) -> ExportArtifact {
        ExportArtifact {
            session: self.session,
            bytes,
            file_name: signed_file_name(&self.source.name, extension),
            media_type,
            fidelity,
            page_count,
            stamped: tally.stamped,
            skipped: tally.skipped,
        }
    }

    fn export_pdf(&self) -> Result<ExportArtifact, SigningError> {
        let mut doc = PdfDocument::from_bytes(self.source.bytes.to_vec()).map_err(DocumentError::from)?;
        let page_count = doc.page_count();
        let mut tally = Tally::default();

        let mut stamper = PdfStamper::new(&mut doc);
        for page_index in 0..page_count {
            for field in self.signed_on_page(page_index) {
                let result = decode(field).and_then(|image| {
                    let rect = rect_to_document(field.rect, &field.basis);
                    stamper
                        .stamp_image(page_index as u32 + 1, rect, &image)
                        .map_err(|e| e.to_string())
                });
                tally.record(field, result.map(|_| ()));
            }
        }
        tally.skipped.extend(self.orphans(page_count));

        let bytes = doc.save_to_bytes()?;
        Ok(self.artifact(
            bytes,
            "pdf",
            PDF_MEDIA_TYPE,
            ExportFidelity::Preserved,
            page_count,
            tally,
        ))
    }

    async fn export_png(&self) -> Result<ExportArtifact, SigningError> {
        // Scale 1 renders the source at its own pixel size
        let mut raster = self.renderer.render_page(0, 1.0).await?;
        let mut tally = Tally::default();

        for field in self.signed_on_page(0) {
            let result = decode(field).and_then(|image| {
                let rect = rect_to_native(field.rect, &field.basis);
                draw_image(&mut raster.pixmap, &image, rect).map_err(|e| e.to_string())
            });
            tally.record(field, result);
        }
        tally.skipped.extend(self.orphans(1));

        let bytes = image_from_pixmap(&raster.pixmap)?.encode_png()?;
        Ok(self.artifact(
            bytes,
            "png",
            PNG_MEDIA_TYPE,
            ExportFidelity::Preserved,
            1,
            tally,
        ))
    }

    async fn export_rasterized(&self) -> Result<ExportArtifact, SigningError> {
        let page_count = self.renderer.page_count();
        let mut pages = Vec::with_capacity(page_count);
        let mut tally = Tally::default();

        for page_index in 0..page_count {
            let mut raster = self
                .renderer
                .render_page(page_index, self.export_scale)
                .await?;
            for field in self.signed_on_page(page_index) {
                let result = decode(field).and_then(|image| {
                    let rect = rescale_rect(field.rect, &field.basis, &raster.page);
                    draw_image(&mut raster.pixmap, &image, rect).map_err(|e| e.to_string())
                });
                tally.record(field, result);
            }
            pages.push((raster.page.dimensions(), image_from_pixmap(&raster.pixmap)?));
        }
        tally.skipped.extend(self.orphans(page_count));

        let raster_pages: Vec<RasterPage<'_>> = pages
            .iter()
            .map(|(dimensions, image)| RasterPage {
                dimensions: *dimensions,
                image,
            })
            .collect();
        let bytes = assemble_from_rasters(&raster_pages, PRODUCER)?;
        Ok(self.artifact(
            bytes,
            "pdf",
            PDF_MEDIA_TYPE,
            ExportFidelity::Rasterized,
            page_count,
            tally,
        ))
    }

    /// Signed fields pointing past the last page
    fn orphans(&self, page_count: usize) -> Vec<CompositingError> {
        self.fields
            .iter()
            .filter(|f| f.page_index >= page_count && f.signature.is_some())
            .map(|f| skip(f, format!("page {} does not exist", f.page_index)))
            .collect()
    }
}

fn decode(field: &Field) -> Result<RasterImage, String> {
    field
        .signature
        .as_ref()
        .ok_or_else(|| "field is not signed".to_string())?
        .decode()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningConfig;
    use crate::session::Viewport;
    use crate::signature::SignatureImage;
    use pretty_assertions::assert_eq;
    use shared_types::Point;

    fn png(width: u32, height: u32) -> Vec<u8> {
        RasterImage::from_rgba(width, height, [255, 255, 255, 255].repeat((width * height) as usize))
            .unwrap()
            .encode_png()
            .unwrap()
    }

    fn black_ink() -> SignatureImage {
        let image = RasterImage::from_rgba(10, 10, [0, 0, 0, 255].repeat(100)).unwrap();
        SignatureImage::from_png(image.encode_png().unwrap()).unwrap()
    }

    #[test]
    fn test_signed_file_name() {
        assert_eq!(signed_file_name("lease.pdf", "pdf"), "signed-lease.pdf");
        assert_eq!(signed_file_name("scan.final.JPG", "png"), "signed-scan.final.png");
        assert_eq!(signed_file_name("C:\\docs\\nda.pdf", "pdf"), "signed-nda.pdf");
        assert_eq!(signed_file_name("README", "pdf"), "signed-README.pdf");
        assert_eq!(signed_file_name("", "pdf"), "signed-document.pdf");
        assert_eq!(signed_file_name(".hidden", "png"), "signed-.hidden.png");
    }

    #[tokio::test]
    async fn test_png_export_composites_at_native_resolution() {
        let mut session =
            DocumentSession::open("photo.png", "image/png", png(400, 200), SigningConfig::default())
                .unwrap();
        // Displayed at half size
        session.show_page(0, Viewport::new(200.0, 1.0)).await.unwrap();

        session.begin_placement();
        let id = session
            .place_field_with_size(Point::new(50.0, 50.0), shared_types::Size::new(20.0, 10.0))
            .unwrap();
        session.sign_field_with(id, black_ink()).unwrap();

        let artifact = export(&session).await.unwrap();
        assert_eq!(artifact.file_name, "signed-photo.png");
        assert_eq!(artifact.media_type, PNG_MEDIA_TYPE);
        assert_eq!(artifact.fidelity, ExportFidelity::Preserved);
        assert_eq!(artifact.stamped, 1);

        let out = RasterImage::decode_png(&artifact.bytes).unwrap();
        assert_eq!((out.width(), out.height()), (400, 200));
        let at = |x: u32, y: u32| out.pixels()[((y * 400 + x) * 4) as usize];
        // Surface rect (40, 45, 20, 10) doubles to native (80, 90, 40, 20)
        assert_eq!(at(100, 100), 0);
        assert_eq!(at(70, 100), 255);
        assert_eq!(at(100, 115), 255);
    }

    #[tokio::test]
    async fn test_placeholder_export_is_rasterized() {
        let (mut session, _) =
            DocumentSession::open_or_degrade("contract", "", Vec::new(), SigningConfig::default())
                .unwrap();
        session.show_page(0, Viewport::new(600.0, 1.0)).await.unwrap();
        session.begin_placement();
        let id = session.place_field(Point::new(300.0, 700.0)).unwrap();
        session.sign_field_with(id, black_ink()).unwrap();
        session.begin_placement();
        session.place_field(Point::new(300.0, 100.0)).unwrap();

        let artifact = export(&session).await.unwrap();
        assert_eq!(artifact.fidelity, ExportFidelity::Rasterized);
        assert_eq!(artifact.file_name, "signed-contract.pdf");
        assert_eq!(artifact.stamped, 1);
        assert!(artifact.skipped.is_empty());

        let pdf = PdfDocument::from_bytes(artifact.bytes).unwrap();
        assert_eq!(pdf.page_count(), 1);
        let dims = pdf.page_dimensions(1).unwrap();
        assert_eq!((dims.width_units, dims.height_units), (600.0, 800.0));
    }

    #[tokio::test]
    async fn test_export_after_reset_is_stale() {
        let (mut session, _) =
            DocumentSession::open_or_degrade("contract", "", Vec::new(), SigningConfig::default())
                .unwrap();
        let job = session.begin_export();
        session.reset();
        let artifact = job.run().await.unwrap();
        assert!(matches!(
            session.accept_export(artifact),
            Err(SigningError::StaleSession)
        ));
    }

    #[tokio::test]
    async fn test_export_never_touches_source() {
        let bytes = png(40, 40);
        let mut session =
            DocumentSession::open("a.png", "image/png", bytes.clone(), SigningConfig::default())
                .unwrap();
        session.show_page(0, Viewport::new(40.0, 1.0)).await.unwrap();
        session.begin_placement();
        let id = session.place_field(Point::new(20.0, 20.0)).unwrap();
        session.sign_field_with(id, black_ink()).unwrap();

        export(&session).await.unwrap();
        assert_eq!(&*session.source().bytes, bytes.as_slice());
    }
}
