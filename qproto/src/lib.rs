//! # qproto
//!
//! Asynchronous client and server for the qproto delimiter-framed message
//! protocol.
//!
//! The wire format itself lives in [`qproto-wire`](qproto_wire); this crate
//! adds everything a session needs on top of it: the hybrid RSA/AES key
//! handshake, per-connection symmetric encryption, optional GZIP
//! compression, and cookie propagation between client and server.
//!
//! A client dials, optionally establishes a session key, and then exchanges
//! frames; a server accepts connections into an address-keyed registry and
//! can write to one client or broadcast to all of them.

#![warn(missing_docs)]

mod addr;
pub use addr::{craft_addr, InvalidPort, Port};

mod config;
pub use config::{Config, ConfigBuilder};

pub mod conn;

mod client;
pub use client::Client;

mod crypto;
pub use crypto::{CryptoError, SessionKey, SESSION_KEY_LEN};

mod error;
pub use error::{HandshakeError, SessionError};

mod server;
pub use server::{Server, ServerClient};

pub mod sysinfo;
pub use self::sysinfo::{IncludedInfo, SystemReport};

// reexported for ease of access
pub use qproto_wire as wire;
pub use qproto_wire::{Content, ContentEncoding, Delimiter, FileAttachment, Message};

/// Header name carrying the frame type during the handshake.
pub const TYPE_HEADER: &str = "type";

/// `type` header value of the key-exchange frame.
pub const AES_KEY_TYPE: &str = "aes_key";

/// `type` header value of the system report frame a client may send after
/// connecting.
pub const SYS_INFO_TYPE: &str = "sys_info";

/// Header prefix for cookies a client sends back to the server.
pub const COOKIE_HEADER_PREFIX: &str = "Q-COOKIES-";

/// Header prefix instructing a client to store a cookie.
pub const SET_COOKIE_HEADER_PREFIX: &str = "Q-SET-COOKIES-";

/// Header prefix instructing a client to drop a cookie.
pub const DEL_COOKIE_HEADER_PREFIX: &str = "Q-DEL-COOKIES-";

/// Canonical value carried by a delete-cookie header; the client ignores it.
pub const DEL_COOKIE_VALUE: &str = "\x00";
