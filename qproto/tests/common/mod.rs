use qproto::{Config, ContentEncoding};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// A plaintext config matching the historical default profile.
pub fn plain_config() -> Config {
    Config::builder()
        .delimiter(&b"&"[..])
        .use_encoding(true)
        .encoding(ContentEncoding::Base64)
        .buf_size(4096)
        .build()
        .expect("test delimiter is valid")
}

/// An RSA keypair for handshake tests. A small modulus keeps key
/// generation fast; 32-byte session keys still fit.
pub fn rsa_keypair() -> (RsaPrivateKey, RsaPublicKey) {
    let private_key =
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("keypair generation");
    let public_key = RsaPublicKey::from(&private_key);
    (private_key, public_key)
}

/// Client/server config pair for an encrypted, compressed session: the
/// client carries the public key, the server the private one.
pub fn secure_configs() -> (Config, Config) {
    let (private_key, public_key) = rsa_keypair();

    let client = Config::builder()
        .delimiter(&b"&"[..])
        .use_encoding(true)
        .use_crypto(true)
        .compressed(true)
        .public_key(public_key)
        .build()
        .expect("test delimiter is valid");

    let server = Config::builder()
        .delimiter(&b"&"[..])
        .use_encoding(true)
        .use_crypto(true)
        .compressed(true)
        .private_key(private_key)
        .build()
        .expect("test delimiter is valid");

    (client, server)
}
