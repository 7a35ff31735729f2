//! Text encodings for response bodies.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Supported response text encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "us-ascii", alias = "ascii")]
    Ascii,
    #[serde(rename = "iso-8859-1", alias = "latin1")]
    Latin1,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be", alias = "utf-16")]
    Utf16Be,
}

impl TextEncoding {
    /// Resolve a charset label as found in a `Content-Type` header.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" | "unicode-1-1-utf-8" => Some(Self::Utf8),
            "us-ascii" | "ascii" | "ansi_x3.4-1968" => Some(Self::Ascii),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" => Some(Self::Latin1),
            "utf-16le" => Some(Self::Utf16Le),
            "utf-16be" | "utf-16" => Some(Self::Utf16Be),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "us-ascii",
            Self::Latin1 => "iso-8859-1",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        }
    }

    /// Decode `bytes`, failing on the first invalid sequence.
    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]).unwrap_or(bytes);
                std::str::from_utf8(bytes)
                    .map(str::to_owned)
                    .map_err(|e| self.invalid(e.valid_up_to()))
            }
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(self.invalid(offset)),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Self::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Self::Utf16Le | Self::Utf16Be => self.decode_utf16(bytes),
        }
    }

    fn decode_utf16(self, bytes: &[u8]) -> Result<String, DecodeError> {
        if bytes.len() % 2 != 0 {
            return Err(self.invalid(bytes.len() - 1));
        }
        let units = bytes.chunks_exact(2).map(|pair| {
            let pair = [pair[0], pair[1]];
            if self == Self::Utf16Le { u16::from_le_bytes(pair) } else { u16::from_be_bytes(pair) }
        });

        let mut out = String::with_capacity(bytes.len() / 2);
        for (index, unit) in char::decode_utf16(units).enumerate() {
            match unit {
                Ok('\u{feff}') if index == 0 => {}
                Ok(c) => out.push(c),
                Err(_) => return Err(self.invalid(index * 2)),
            }
        }
        Ok(out)
    }

    fn invalid(self, offset: usize) -> DecodeError {
        DecodeError::InvalidText {
            encoding: self.label(),
            offset,
        }
    }
}

/// Extract the `charset` parameter from a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}
