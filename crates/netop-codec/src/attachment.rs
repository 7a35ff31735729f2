//! Binary attachment descriptors for multipart bodies.
//!
//! Image and video encoding are not done here. A payload is either bytes the
//! caller already encoded, or a [`MediaEncoder`] that produces them on demand
//! (the JPEG quality factor is handed to it).

use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, Result};

/// Media type of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Png,
    Jpeg,
    Mp4,
}

impl AttachmentKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Mp4 => "video/mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Mp4 => "mp4",
        }
    }

    fn default_field(self) -> &'static str {
        match self {
            Self::Png | Self::Jpeg => "image",
            Self::Mp4 => "video",
        }
    }
}

/// Produces encoded media bytes for an attachment.
pub trait MediaEncoder: Send + Sync {
    /// `quality` is in `0.0..=1.0` and only meaningful for JPEG.
    fn encode(&self, kind: AttachmentKind, quality: f32) -> io::Result<Bytes>;
}

/// Where attachment bytes come from.
#[derive(Clone)]
pub enum AttachmentSource {
    Encoded(Bytes),
    Deferred(Arc<dyn MediaEncoder>),
}

impl fmt::Debug for AttachmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoded(bytes) => f.debug_tuple("Encoded").field(&bytes.len()).finish(),
            Self::Deferred(_) => f.write_str("Deferred { ... }"),
        }
    }
}

/// A binary attachment sent as the last part of a multipart body.
#[derive(Debug, Clone)]
pub struct Attachment {
    kind:         AttachmentKind,
    source:       AttachmentSource,
    field_name:   String,
    file_name:    String,
    jpeg_quality: f32,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, data: impl Into<Bytes>) -> Self {
        Self::with_source(kind, AttachmentSource::Encoded(data.into()))
    }

    pub fn deferred(kind: AttachmentKind, encoder: Arc<dyn MediaEncoder>) -> Self {
        Self::with_source(kind, AttachmentSource::Deferred(encoder))
    }

    fn with_source(kind: AttachmentKind, source: AttachmentSource) -> Self {
        Self {
            kind,
            source,
            field_name: kind.default_field().to_string(),
            file_name: format!("{}.{}", kind.default_field(), kind.extension()),
            jpeg_quality: 0.75,
        }
    }

    pub fn png(data: impl Into<Bytes>) -> Self { Self::new(AttachmentKind::Png, data) }

    pub fn jpeg(data: impl Into<Bytes>, quality: f32) -> Self {
        Self::new(AttachmentKind::Jpeg, data).jpeg_quality(quality)
    }

    pub fn mp4(data: impl Into<Bytes>) -> Self { Self::new(AttachmentKind::Mp4, data) }

    #[must_use]
    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    #[must_use]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: f32) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn kind(&self) -> AttachmentKind { self.kind }

    pub fn field(&self) -> &str { &self.field_name }

    pub fn file(&self) -> &str { &self.file_name }

    pub fn quality(&self) -> f32 { self.jpeg_quality }

    pub fn content_type(&self) -> &'static str { self.kind.mime_type() }

    /// Resolve the attachment bytes, running the encoder if deferred.
    pub fn payload(&self) -> Result<Bytes> {
        if self.kind == AttachmentKind::Jpeg && !(0.0..=1.0).contains(&self.jpeg_quality) {
            return Err(EncodeError::InvalidQuality(self.jpeg_quality));
        }
        match &self.source {
            AttachmentSource::Encoded(bytes) => Ok(bytes.clone()),
            AttachmentSource::Deferred(encoder) => encoder
                .encode(self.kind, self.jpeg_quality)
                .map_err(EncodeError::Attachment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEncoder;

    impl MediaEncoder for FixedEncoder {
        fn encode(&self, kind: AttachmentKind, quality: f32) -> io::Result<Bytes> {
            Ok(Bytes::from(format!("{}@{quality}", kind.mime_type())))
        }
    }

    struct BrokenEncoder;

    impl MediaEncoder for BrokenEncoder {
        fn encode(&self, _: AttachmentKind, _: f32) -> io::Result<Bytes> {
            Err(io::Error::other("codec unavailable"))
        }
    }

    #[test]
    fn test_defaults_follow_kind() {
        let png = Attachment::png(vec![1, 2, 3]);
        assert_eq!(png.field(), "image");
        assert_eq!(png.file(), "image.png");
        assert_eq!(png.content_type(), "image/png");

        let mp4 = Attachment::mp4(vec![]);
        assert_eq!(mp4.field(), "video");
        assert_eq!(mp4.file(), "video.mp4");
    }

    #[test]
    fn test_deferred_encoder_receives_quality() {
        let attachment = Attachment::deferred(AttachmentKind::Jpeg, Arc::new(FixedEncoder)).jpeg_quality(0.5);
        assert_eq!(attachment.payload().unwrap(), Bytes::from("image/jpeg@0.5"));
    }

    #[test]
    fn test_encoder_failure_is_an_encode_error() {
        let attachment = Attachment::deferred(AttachmentKind::Png, Arc::new(BrokenEncoder));
        assert!(matches!(attachment.payload(), Err(EncodeError::Attachment(_))));
    }

    #[test]
    fn test_jpeg_quality_out_of_range() {
        let err = Attachment::jpeg(vec![0xff, 0xd8], 1.5).payload().unwrap_err();
        assert!(matches!(err, EncodeError::InvalidQuality(q) if q == 1.5));

        let nan = Attachment::jpeg(vec![0xff, 0xd8], f32::NAN).payload();
        assert!(nan.is_err());
    }
}
