//! Content-transfer codecs for the body region, plus the GZIP helpers used
//! by the session layer.

use std::io;
use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// A codec rejected its input while decoding.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input was not valid base16.
    #[error("invalid base16 input: {0}")]
    Base16(#[from] hex::FromHexError),

    /// Input was not valid RFC 4648 base32.
    #[error("invalid base32 input")]
    Base32,

    /// Input was not valid base64.
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Input was not a length-prefixed binary payload.
    #[error("invalid binary payload: {0}")]
    Binary(#[from] bincode::Error),
}

/// A GZIP stream could not be produced or consumed.
#[derive(Debug, Error)]
#[error("gzip stream error: {0}")]
pub struct CompressionError(#[from] io::Error);

/// A content-transfer encoding for the body-plus-files region of a frame.
///
/// The Base16/32/64 alphabets are what make delimiter framing safe: every
/// byte a banned delimiter could collide with is excluded from them. The
/// [`Binary`](Self::Binary) codec carries raw bytes behind a length prefix
/// and offers no such protection; it exists for interoperability with peers
/// that negotiate it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentEncoding {
    /// Pass bytes through untouched.
    Identity,
    /// Lowercase hexadecimal.
    Base16,
    /// RFC 4648 base32 with padding.
    Base32,
    /// Standard base64 with padding.
    #[default]
    Base64,
    /// Length-prefixed binary via bincode.
    Binary,
}

impl ContentEncoding {
    /// Encodes `data` with this codec.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Identity => data.to_vec(),
            Self::Base16 => hex::encode(data).into_bytes(),
            Self::Base32 => {
                base32::encode(base32::Alphabet::Rfc4648 { padding: true }, data).into_bytes()
            }
            Self::Base64 => BASE64_STANDARD.encode(data).into_bytes(),
            // byte-slice serialization is a length prefix plus a copy; it has
            // no failure mode without a size limit configured
            Self::Binary => bincode::serialize(&data).unwrap_or_default(),
        }
    }

    /// Decodes `data`, failing if it is not valid for this codec.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>, DecodeError> {
        match self {
            Self::Identity => Ok(data.to_vec()),
            Self::Base16 => Ok(hex::decode(data)?),
            Self::Base32 => {
                let text = std::str::from_utf8(data).map_err(|_| DecodeError::Base32)?;
                base32::decode(base32::Alphabet::Rfc4648 { padding: true }, text)
                    .ok_or(DecodeError::Base32)
            }
            Self::Base64 => Ok(BASE64_STANDARD.decode(data)?),
            Self::Binary => Ok(bincode::deserialize(data)?),
        }
    }

    /// Human-readable codec name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Base16 => "base16",
            Self::Base32 => "base32",
            Self::Base64 => "base64",
            Self::Binary => "binary",
        }
    }

    /// Parses a codec name as produced by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "identity" => Some(Self::Identity),
            "base16" => Some(Self::Base16),
            "base32" => Some(Self::Base32),
            "base64" => Some(Self::Base64),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// Compresses `data` as a GZIP stream.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompresses a GZIP stream produced by [`compress`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}
