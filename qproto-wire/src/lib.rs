//! # qproto-wire
//!
//! Wire format for the qproto delimiter-framed message protocol.
//!
//! A frame packs a multimap of headers, a binary body and zero or more named
//! file attachments into a single self-delimited byte stream. There is no
//! magic number, no version and no length prefix: the same configurable
//! delimiter, repeated at four nesting depths, separates fields, headers,
//! files and the end of the frame.
//!
//! This crate is pure: it never touches a socket and never blocks. The
//! session layer (handshake, encryption, compression, cookies) lives in the
//! `qproto` crate.

#![warn(missing_docs)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]

mod delimiter;
pub use delimiter::{Delimiter, InvalidDelimiter, BANNED_DELIMITER_BYTES, STANDARD_DELIMITER};

mod encoding;
pub use encoding::{compress, decompress, CompressionError, ContentEncoding, DecodeError};

mod file;
pub use file::FileAttachment;

mod message;
pub use message::{Content, InvalidHeaderValue, Message, ParseError};

pub(crate) mod util;
