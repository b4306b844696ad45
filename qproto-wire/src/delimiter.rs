//! The base delimiter and the structural delimiters derived from it.

use core::fmt;

use thiserror::Error;

/// The delimiter used when a caller does not supply one.
pub const STANDARD_DELIMITER: &[u8] = b"$";

/// Bytes that may never appear inside a delimiter.
///
/// Every ASCII letter and `=` collide with the Base16/32/64 alphabets used
/// for content-transfer encoding; the remaining bytes are known to break
/// framing (`\x00` doubles as the empty-body marker). The list is
/// authoritative: do not shorten it.
pub const BANNED_DELIMITER_BYTES: &[u8] =
    b"=_()\x00\x08\x1eABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// A delimiter was rejected at construction time.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidDelimiter {
    /// The delimiter was zero bytes long.
    #[error("delimiter must be at least one byte")]
    Empty,

    /// The delimiter contained a byte from [`BANNED_DELIMITER_BYTES`].
    #[error("delimiter contains banned byte {0:#04x}")]
    BannedByte(u8),
}

/// A validated frame delimiter of one or more bytes.
///
/// The same byte sequence, repeated, forms every structural marker of a
/// frame:
///
/// | Marker | Repetitions |
/// |---|---|
/// | field  | 1× |
/// | [`header`](Self::header) | 2× |
/// | [`body`](Self::body)     | 4× |
/// | [`file`](Self::file)     | 6× |
/// | [`ending`](Self::ending) | 8× |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    bytes: Vec<u8>,
}

impl Delimiter {
    /// Validates `bytes` against the banned table and wraps them.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, InvalidDelimiter> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(InvalidDelimiter::Empty);
        }

        if let Some(bad) = bytes
            .iter()
            .copied()
            .find(|b| BANNED_DELIMITER_BYTES.contains(b))
        {
            return Err(InvalidDelimiter::BannedByte(bad));
        }

        Ok(Self { bytes })
    }

    /// The standard delimiter, `$`.
    pub fn standard() -> Self {
        Self {
            bytes: STANDARD_DELIMITER.to_vec(),
        }
    }

    /// The raw delimiter bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in one repetition.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A delimiter is validated non-empty; always false.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The header delimiter: the base delimiter twice.
    pub fn header(&self) -> Vec<u8> {
        self.bytes.repeat(2)
    }

    /// The body delimiter: the base delimiter four times.
    pub fn body(&self) -> Vec<u8> {
        self.bytes.repeat(4)
    }

    /// The file delimiter: the base delimiter six times.
    pub fn file(&self) -> Vec<u8> {
        self.bytes.repeat(6)
    }

    /// The ending delimiter: the base delimiter eight times. Every generated
    /// frame ends with these bytes.
    pub fn ending(&self) -> Vec<u8> {
        self.bytes.repeat(8)
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            if byte.is_ascii_graphic() {
                write!(f, "{}", *byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<&[u8]> for Delimiter {
    type Error = InvalidDelimiter;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::new(bytes.to_vec())
    }
}

impl TryFrom<&str> for Delimiter {
    type Error = InvalidDelimiter;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.as_bytes().to_vec())
    }
}
