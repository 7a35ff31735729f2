use std::io;

/// Failures while building a request body. Always fatal to the request.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("gzip compression failed: {0}")]
    Compression(#[source] io::Error),

    #[error("attachment could not be produced: {0}")]
    Attachment(#[source] io::Error),

    #[error("jpeg quality must be within 0.0..=1.0, got {0}")]
    InvalidQuality(f32),
}

/// Failures while unpacking a response body.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("gzip decompression failed: {0}")]
    Gzip(#[source] io::Error),

    #[error("bytes are not valid {encoding} (offset {offset})")]
    InvalidText {
        encoding: &'static str,
        offset:   usize,
    },

    #[error("malformed form body: {0}")]
    MalformedForm(String),
}

pub type Result<T, E = EncodeError> = std::result::Result<T, E>;
