use std::io;

use thiserror::Error;

use qproto_wire::{CompressionError, DecodeError, InvalidHeaderValue, ParseError};

use crate::addr::InvalidPort;
use crate::crypto::CryptoError;
use crate::SESSION_KEY_LEN;

/// The key-exchange frame that opens an encrypted session was rejected.
///
/// A failed handshake is fatal for the connection and leaves no entry in
/// the server's registry.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The first frame did not carry a `type: aes_key` header.
    #[error("first frame did not carry an aes_key header")]
    MissingKeyHeader,

    /// The key material had the wrong length.
    #[error("session key must be {SESSION_KEY_LEN} bytes, got {0}")]
    BadKeyLength(usize),

    /// The wrapped key was not valid base64.
    #[error("wrapped session key could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    /// The RSA unwrap of the key failed.
    #[error("session key could not be unwrapped: {0}")]
    Unwrap(#[source] CryptoError),
}

/// An error on one protocol session.
///
/// Any of these ends the affected connection; a server keeps its listener
/// running and its registry intact regardless.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    /// A socket operation failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The peer closed the connection before a full frame arrived.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The client has no open connection; call `connect` first.
    #[error("client is not connected")]
    NotConnected,

    /// The server has no open listener; call `listen` first.
    #[error("server is not listening")]
    NotListening,

    /// A port could not be normalized to 16 bits.
    #[error(transparent)]
    InvalidPort(#[from] InvalidPort),

    /// The key exchange failed.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Symmetric encryption or decryption of a frame failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// GZIP wrapping or unwrapping of a frame failed.
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// An incoming frame could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A header (typically a stamped cookie) would have broken framing.
    #[error(transparent)]
    InvalidHeader(#[from] InvalidHeaderValue),
}
