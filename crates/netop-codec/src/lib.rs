//! Request body encoding and response body decoding for netop operations.
//!
//! Everything here is a pure function of its inputs: no async, no I/O, no
//! shared state. The operation layer calls into this crate once per
//! operation to build the request body, and once per finished response to
//! unpack it.
//!
//! # Key Features
//!
//! - **Form encoding**: `key=value&key=value` with RFC 3986 percent-encoding
//! - **Multipart**: one part per parameter plus one binary attachment part,
//!   separated by a random boundary that is checked against the payload
//! - **Gzip**: request compression and response decompression via `flate2`
//! - **Charsets**: UTF-8, US-ASCII, Latin-1 and UTF-16 text decoding
//!
//! # Example
//!
//! ```
//! use netop_codec::{Params, decode_parameters, encode_parameters};
//!
//! let mut params = Params::new();
//! params.insert("q".to_string(), "rust lang".into());
//!
//! let body = encode_parameters(&params);
//! assert_eq!(body, b"q=rust%20lang");
//! assert_eq!(decode_parameters(&body).unwrap()["q"], "rust lang");
//! ```

pub use self::attachment::{Attachment, AttachmentKind, AttachmentSource, MediaEncoder};
pub use self::charset::{TextEncoding, charset_from_content_type};
pub use self::compress::{compress, decompress, is_gzip_encoding, maybe_compress};
pub use self::error::{DecodeError, EncodeError, Result};
pub use self::multipart::{Multipart, encode_multipart};
pub use self::params::{ParamValue, Params, decode_parameters, encode_parameters};

mod attachment;
mod charset;
mod compress;
mod error;
mod multipart;
mod params;
