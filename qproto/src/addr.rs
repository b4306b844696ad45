//! Address crafting and the loosely-typed port surface.

use std::fmt;

use thiserror::Error;

/// A port value that could not be normalized to a 16-bit unsigned integer.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("port is not a 16-bit unsigned integer: {0:?}")]
pub struct InvalidPort(pub String);

/// A TCP port, accepted either as a number or as text.
///
/// The protocol surface historically accepts both; internally every port is
/// normalized to a `u16` via [`resolve`](Self::resolve).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Port {
    /// A numeric port.
    Number(u16),
    /// A textual port, parsed on use.
    Text(String),
}

impl Port {
    /// Normalizes the port to a 16-bit unsigned integer.
    pub fn resolve(&self) -> Result<u16, InvalidPort> {
        match self {
            Self::Number(port) => Ok(*port),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| InvalidPort(text.clone())),
        }
    }
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Self::Number(port)
    }
}

impl From<&str> for Port {
    fn from(port: &str) -> Self {
        Self::Text(port.to_owned())
    }
}

impl From<String> for Port {
    fn from(port: String) -> Self {
        Self::Text(port)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(port) => write!(f, "{port}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Joins an IP and a port into a `ip:port` dial/bind address.
pub fn craft_addr(ip: &str, port: &Port) -> Result<String, InvalidPort> {
    Ok(format!("{ip}:{}", port.resolve()?))
}
