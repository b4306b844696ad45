//! Session-key material and the opaque encryption pairs around it.
//!
//! Symmetric frames are sealed with AES-256-GCM; the 12-byte random nonce is
//! prepended to the ciphertext, the authentication tag trails it. The
//! session key itself travels in the handshake frame, optionally wrapped
//! under the server's RSA public key (PKCS#1 v1.5).

use aes_gcm::aead::{Aead, KeyInit, OsRng as AeadOsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use thiserror::Error;


/// Byte length of a session key (AES-256).
pub const SESSION_KEY_LEN: usize = 32;

/// Byte length of the AES-GCM nonce prepended to every sealed frame.
pub(crate) const NONCE_LEN: usize = 12;

/// A symmetric encrypt/decrypt operation failed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The frame could not be encrypted.
    #[error("frame encryption failed")]
    EncryptFailed,

    /// The frame could not be decrypted, or its authentication tag did not
    /// verify.
    #[error("frame decryption failed or ciphertext was tampered with")]
    DecryptFailed,

    /// Sealed input was shorter than the nonce it must start with.
    #[error("ciphertext shorter than the {NONCE_LEN}-byte nonce")]
    TooShort,

    /// The RSA wrap/unwrap of a session key failed.
    #[error("rsa operation failed: {0}")]
    Rsa(#[from] rsa::Error),
}

/// A per-session AES-256 key.
///
/// Generated fresh by the client for every session and handed to the server
/// in the first frame.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    /// Draws a fresh key from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps exactly [`SESSION_KEY_LEN`] bytes; anything else is `None`.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; SESSION_KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }

    /// Encrypts `plaintext`, returning `nonce || ciphertext || tag`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new(&self.0.into());
        let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::EncryptFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypts data produced by [`seal`](Self::seal), verifying the tag.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_LEN {
            return Err(CryptoError::TooShort);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(&self.0.into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptFailed)
    }
}

// key material stays out of debug output
impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Encrypts a session key under the server's RSA public key.
pub fn wrap_session_key(
    public_key: &RsaPublicKey,
    key: &SessionKey,
) -> Result<Vec<u8>, CryptoError> {
    let mut rng = rand::thread_rng();
    Ok(public_key.encrypt(&mut rng, Pkcs1v15Encrypt, key.as_bytes())?)
}

/// Recovers session-key bytes wrapped by [`wrap_session_key`].
pub fn unwrap_session_key(
    private_key: &RsaPrivateKey,
    wrapped: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    Ok(private_key.decrypt(Pkcs1v15Encrypt, wrapped)?)
}
