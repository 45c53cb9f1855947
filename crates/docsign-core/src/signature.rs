//! Confirmed signature images

use crate::error::SigningError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared_types::RasterImage;
use std::sync::Arc;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// An immutable, encoded signature raster
///
/// Cloning shares the encoded bytes. Every field holding the same confirmed
/// signature points at the same buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureImage {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for SignatureImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl SignatureImage {
    /// Wrap PNG bytes after checking they decode
    pub fn from_png(bytes: Vec<u8>) -> Result<Self, SigningError> {
        let decoded = RasterImage::decode_png(&bytes)?;
        Ok(Self {
            data: bytes.into(),
            width: decoded.width(),
            height: decoded.height(),
        })
    }

    /// Wrap already-encoded bytes whose dimensions are known
    ///
    /// The bytes are not decoded here. A bad payload surfaces when the
    /// signature is composited.
    pub fn from_encoded(bytes: impl Into<Arc<[u8]>>, width: u32, height: u32) -> Self {
        Self {
            data: bytes.into(),
            width,
            height,
        }
    }

    pub(crate) fn encode(image: &RasterImage) -> Result<Self, SigningError> {
        Ok(Self {
            data: image.encode_png()?.into(),
            width: image.width(),
            height: image.height(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Natural width in backing pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in backing pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    /// True when both values share the same encoded buffer
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Fully decode to straight-alpha RGBA
    pub fn decode(&self) -> Result<RasterImage, SigningError> {
        Ok(RasterImage::decode_png(&self.data)?)
    }

    pub fn to_data_url(&self) -> String {
        format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(&self.data))
    }

    pub fn from_data_url(url: &str) -> Result<Self, SigningError> {
        let payload = url.strip_prefix(DATA_URL_PREFIX).ok_or_else(|| {
            SigningError::Encoding("expected a base64 PNG data URL".to_string())
        })?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| SigningError::Encoding(e.to_string()))?;
        Self::from_png(bytes)
    }
}
