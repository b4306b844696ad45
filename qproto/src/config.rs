//! Shared, immutable session parameters.

use getset::{CopyGetters, Getters};
use rsa::{RsaPrivateKey, RsaPublicKey};

use qproto_wire::{ContentEncoding, Delimiter, InvalidDelimiter, Message};

use crate::sysinfo::IncludedInfo;

/// Immutable parameters shared by every connection of a client or server.
///
/// Both peers must agree on the delimiter, the codec choice and the
/// encryption/compression flags; nothing on the wire carries them.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Config {
    /// The frame delimiter.
    #[getset(get = "pub")]
    delimiter: Delimiter,

    /// Whether the body region of each frame is content-transfer-encoded.
    #[getset(get_copy = "pub")]
    use_encoding: bool,

    /// Whether sessions establish a symmetric key and encrypt every frame.
    #[getset(get_copy = "pub")]
    use_crypto: bool,

    /// Whether frames are GZIP-compressed.
    #[getset(get_copy = "pub")]
    compressed: bool,

    /// Socket read chunk size.
    #[getset(get_copy = "pub")]
    buf_size: usize,

    /// Codec for the body region.
    #[getset(get_copy = "pub")]
    encoding: ContentEncoding,

    /// System details a client volunteers after connecting.
    #[getset(get_copy = "pub")]
    included_info: IncludedInfo,

    private_key: Option<RsaPrivateKey>,
    public_key: Option<RsaPublicKey>,
}

impl Config {
    /// Starts building a config with default parameters.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// The server-side RSA key unwrapping handshake frames, if configured.
    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private_key.as_ref()
    }

    /// The client-side RSA key wrapping handshake frames, if configured.
    pub fn public_key(&self) -> Option<&RsaPublicKey> {
        self.public_key.as_ref()
    }

    /// Creates an empty message seeded with this config's delimiter and
    /// codec.
    pub fn new_message(&self) -> Message {
        Message::new(self.delimiter.clone(), self.use_encoding, self.encoding)
    }
}

/// Builder for [`Config`] objects.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    delimiter: Vec<u8>,
    use_encoding: bool,
    use_crypto: bool,
    compressed: bool,
    buf_size: usize,
    encoding: ContentEncoding,
    included_info: IncludedInfo,
    private_key: Option<RsaPrivateKey>,
    public_key: Option<RsaPublicKey>,
}

impl ConfigBuilder {
    /// Creates a builder with the standard delimiter, base64 body encoding
    /// enabled, and crypto/compression off.
    pub fn new() -> Self {
        Self {
            delimiter: qproto_wire::STANDARD_DELIMITER.to_vec(),
            use_encoding: true,
            use_crypto: false,
            compressed: false,
            buf_size: 4096,
            encoding: ContentEncoding::Base64,
            included_info: IncludedInfo::empty(),
            private_key: None,
            public_key: None,
        }
    }

    /// Sets the frame delimiter; validated against the banned table in
    /// [`build`](Self::build).
    pub fn delimiter(&mut self, delimiter: impl Into<Vec<u8>>) -> &mut Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Enables or disables content-transfer encoding of the body region.
    pub fn use_encoding(&mut self, use_encoding: bool) -> &mut Self {
        self.use_encoding = use_encoding;
        self
    }

    /// Enables or disables the symmetric-key handshake and per-frame
    /// encryption.
    pub fn use_crypto(&mut self, use_crypto: bool) -> &mut Self {
        self.use_crypto = use_crypto;
        self
    }

    /// Enables or disables GZIP compression of frames.
    pub fn compressed(&mut self, compressed: bool) -> &mut Self {
        self.compressed = compressed;
        self
    }

    /// Sets the socket read chunk size.
    pub fn buf_size(&mut self, buf_size: usize) -> &mut Self {
        self.buf_size = buf_size;
        self
    }

    /// Sets the codec for the body region.
    pub fn encoding(&mut self, encoding: ContentEncoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Selects the system details a client volunteers after connecting.
    pub fn included_info(&mut self, included_info: IncludedInfo) -> &mut Self {
        self.included_info = included_info;
        self
    }

    /// Sets the RSA private key a server uses to unwrap session keys.
    pub fn private_key(&mut self, private_key: RsaPrivateKey) -> &mut Self {
        self.private_key = Some(private_key);
        self
    }

    /// Sets the RSA public key a client wraps session keys under.
    pub fn public_key(&mut self, public_key: RsaPublicKey) -> &mut Self {
        self.public_key = Some(public_key);
        self
    }

    /// Validates the delimiter and produces the config.
    pub fn build(&self) -> Result<Config, InvalidDelimiter> {
        Ok(Config {
            delimiter: Delimiter::new(self.delimiter.clone())?,
            use_encoding: self.use_encoding,
            use_crypto: self.use_crypto,
            compressed: self.compressed,
            buf_size: self.buf_size,
            encoding: self.encoding,
            included_info: self.included_info,
            private_key: self.private_key.clone(),
            public_key: self.public_key.clone(),
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
