//! Document signing core logic
//!
//! This crate provides the signing workflow behind the upload, sign and
//! download flow: capturing a drawn signature, placing signature fields on
//! a rendered page, and exporting a new document with every signature drawn
//! exactly where it was placed on screen.
//!
//! ```no_run
//! use docsign_core::{export, DocumentSession, Point, SigningConfig, Viewport};
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), docsign_core::SigningError> {
//! let mut session = DocumentSession::open("lease.pdf", "application/pdf", bytes, SigningConfig::default())?;
//! session.show_page(0, Viewport::new(800.0, 2.0)).await?;
//!
//! let pad = session.capture_mut();
//! pad.begin_stroke(Point::new(10.0, 40.0));
//! pad.extend_stroke(Point::new(120.0, 60.0));
//! pad.end_stroke();
//! pad.confirm()?;
//!
//! session.begin_placement();
//! let field = session.place_field(Point::new(300.0, 500.0))?;
//! session.sign_field(field)?;
//!
//! let artifact = export(&session).await?;
//! assert_eq!(artifact.file_name, "signed-lease.pdf");
//! # Ok(())
//! # }
//! ```

mod compose;
pub mod config;
pub mod error;
pub mod export;
pub mod fields;
pub mod ink;
mod pixels;
pub mod renderer;
pub mod session;
pub mod signature;

pub use config::SigningConfig;
pub use error::{CompositingError, DocumentError, SigningError};
pub use export::{export, ExportArtifact, ExportFidelity, ExportJob};
pub use fields::{Field, FieldId, FieldModel};
pub use ink::{InkCapture, InkStyle};
pub use renderer::{
    DocumentKind, DocumentRenderer, ExportCapability, PageRaster, RendererAdapter,
};
pub use session::{
    DocumentSession, PageView, Preview, RenderApplied, RenderJob, RenderOutcome, RenderTicket,
    SessionId, Viewport,
};
pub use signature::SignatureImage;

// Re-export types from shared crates
pub use shared_pdf::coords;
pub use shared_types::{PageDimensions, Point, Rect, RenderedPage, Size};
