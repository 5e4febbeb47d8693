//! The loaded image.

use crate::imaging::{DecodeError, ImageCodec, format_for_mime};
use image::{ImageFormat, RgbaImage};
use std::sync::Arc;

/// The decoded original plus the frame currently on screen.
///
/// `original` is never modified after load; every edit derives `current`
/// from it again.
#[derive(Debug, Clone)]
pub struct ImageDocument {
    original: Arc<RgbaImage>,
    current: Arc<RgbaImage>,
    source_format: ImageFormat,
}

impl ImageDocument {
    pub fn new(original: RgbaImage, source_format: ImageFormat) -> Self {
        let original = Arc::new(original);
        Self {
            current: Arc::clone(&original),
            original,
            source_format,
        }
    }

    pub fn original(&self) -> &Arc<RgbaImage> {
        &self.original
    }

    pub fn current(&self) -> &Arc<RgbaImage> {
        &self.current
    }

    pub(crate) fn set_current(&mut self, frame: Arc<RgbaImage>) {
        self.current = frame;
    }

    pub fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    pub fn width(&self) -> u32 {
        self.current.width()
    }

    pub fn height(&self) -> u32 {
        self.current.height()
    }

    pub fn original_dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }
}

/// Decode file bytes into a document, enforcing a per-side size limit.
pub fn decode_document(
    codec: &dyn ImageCodec,
    bytes: &[u8],
    mime_type: &str,
    max_dimension: u32,
) -> Result<ImageDocument, DecodeError> {
    let format = format_for_mime(mime_type)?;
    let bitmap = codec.decode(bytes, format)?;
    let (width, height) = bitmap.dimensions();
    if width > max_dimension || height > max_dimension {
        return Err(DecodeError::TooLarge {
            width,
            height,
            max: max_dimension,
        });
    }
    Ok(ImageDocument::new(bitmap, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustCodec;
    use crate::test_helpers::{encode_png, gradient};

    #[test]
    fn new_document_shows_original() {
        let doc = ImageDocument::new(gradient(5, 4), ImageFormat::Png);
        assert!(Arc::ptr_eq(doc.original(), doc.current()));
        assert_eq!((doc.width(), doc.height()), (5, 4));
    }

    #[test]
    fn set_current_leaves_original_alone() {
        let mut doc = ImageDocument::new(gradient(5, 4), ImageFormat::Png);
        doc.set_current(Arc::new(gradient(2, 2)));
        assert_eq!(doc.original_dimensions(), (5, 4));
        assert_eq!((doc.width(), doc.height()), (2, 2));
    }

    #[test]
    fn decode_document_from_png() {
        let bytes = encode_png(&gradient(12, 9));
        let doc = decode_document(&RustCodec::new(), &bytes, "image/png", 100).unwrap();
        assert_eq!(doc.original_dimensions(), (12, 9));
        assert_eq!(doc.source_format(), ImageFormat::Png);
    }

    #[test]
    fn decode_document_enforces_limit() {
        let bytes = encode_png(&gradient(12, 9));
        let err = decode_document(&RustCodec::new(), &bytes, "image/png", 10).unwrap_err();
        assert!(matches!(err, DecodeError::TooLarge { width: 12, max: 10, .. }));
    }

    #[test]
    fn decode_document_rejects_unknown_mime() {
        let err = decode_document(&RustCodec::new(), b"", "application/pdf", 100).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
    }
}
