//! The connecting side of a session.

use std::collections::HashMap;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use qproto_wire::{ContentEncoding, Message};

use crate::addr::{craft_addr, InvalidPort, Port};
use crate::config::Config;
use crate::conn;
use crate::crypto::{self, SessionKey};
use crate::error::SessionError;
use crate::sysinfo::SystemReport;
use crate::{
    AES_KEY_TYPE, COOKIE_HEADER_PREFIX, DEL_COOKIE_HEADER_PREFIX, SET_COOKIE_HEADER_PREFIX,
    SYS_INFO_TYPE, TYPE_HEADER,
};

/// A protocol client.
///
/// [`connect`](Self::connect) dials the server and, when the config enables
/// crypto, establishes the session key by sending it in the first frame,
/// wrapped under the server's RSA public key when one is configured. After
/// that, [`read`](Self::read) and [`write`](Self::write) exchange frames;
/// [`listen`](Self::listen) turns the pull API into a callback loop.
///
/// The client keeps a cookie jar: values the server sets via
/// `Q-SET-COOKIES-*` headers are stamped onto every outgoing message as
/// `Q-COOKIES-*` headers until the server deletes them.
pub struct Client {
    ip: String,
    port: Port,
    config: Config,
    conn: Option<TcpStream>,
    key: Option<SessionKey>,
    cookies: HashMap<String, Vec<String>>,
}

impl Client {
    /// Creates a client for `ip:port`. No connection is opened yet.
    pub fn new(ip: impl Into<String>, port: impl Into<Port>, config: Config) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
            config,
            conn: None,
            key: None,
            cookies: HashMap::new(),
        }
    }

    /// The server address in `ip:port` form.
    pub fn addr(&self) -> Result<String, InvalidPort> {
        craft_addr(&self.ip, &self.port)
    }

    /// The client's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Dials the server and performs the key exchange when crypto is
    /// enabled.
    ///
    /// The handshake frame carries the fresh 32-byte session key in its
    /// body under a `type: aes_key` header; with a public key configured
    /// the body is RSA-wrapped and base64-encoded first. The frame itself
    /// goes out without symmetric encryption; the key it carries is the
    /// one being established.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        let addr = self.addr()?;
        let stream = TcpStream::connect(&addr).await?;
        debug!(%addr, "connected");
        self.conn = Some(stream);

        if self.config.use_crypto() && self.key.is_none() {
            let key = SessionKey::generate();

            let mut msg = self.config.new_message();
            msg.add_header(TYPE_HEADER, AES_KEY_TYPE)?;
            let mut body = key.as_bytes().to_vec();
            if let Some(public_key) = self.config.public_key() {
                let wrapped = crypto::wrap_session_key(public_key, &key)?;
                body = ContentEncoding::Base64.encode(&wrapped);
            }
            msg.set_body(body);

            let stream = self.conn.as_mut().ok_or(SessionError::NotConnected)?;
            conn::write_message(stream, &self.config, &msg, None, self.config.compressed())
                .await?;

            self.key = Some(key);
            debug!("session key established");
        }

        if !self.config.included_info().is_empty() {
            let report = SystemReport::probe(self.config.included_info());
            let mut msg = self.config.new_message();
            msg.add_header(TYPE_HEADER, SYS_INFO_TYPE)?;
            msg.set_body(report.to_json());
            self.write(&mut msg).await?;
        }

        Ok(())
    }

    /// Reads one message from the server.
    ///
    /// `Q-SET-COOKIES-*` and `Q-DEL-COOKIES-*` headers update the jar; the
    /// message itself is returned untouched.
    pub async fn read(&mut self) -> Result<Message, SessionError> {
        let stream = self.conn.as_mut().ok_or(SessionError::NotConnected)?;
        let msg = conn::read_message(
            stream,
            &self.config,
            self.key.as_ref(),
            self.config.compressed(),
        )
        .await?;

        for (key, values) in msg.headers() {
            if let Some(name) = key.strip_prefix(SET_COOKIE_HEADER_PREFIX) {
                self.cookies.insert(name.to_owned(), values.clone());
            } else if let Some(name) = key.strip_prefix(DEL_COOKIE_HEADER_PREFIX) {
                self.cookies.remove(name);
            }
        }

        Ok(msg)
    }

    /// Stamps the cookie jar onto `msg` and writes it to the server.
    pub async fn write(&mut self, msg: &mut Message) -> Result<(), SessionError> {
        for (name, values) in &self.cookies {
            for value in values {
                msg.add_header(format!("{COOKIE_HEADER_PREFIX}{name}"), value.clone())?;
            }
        }

        let stream = self.conn.as_mut().ok_or(SessionError::NotConnected)?;
        conn::write_message(
            stream,
            &self.config,
            msg,
            self.key.as_ref(),
            self.config.compressed(),
        )
        .await
    }

    /// Reads messages in a loop, handing each to `on_message`.
    ///
    /// Returns the error that terminated the loop; a server going away
    /// surfaces as [`SessionError::ConnectionClosed`].
    pub async fn listen<F>(&mut self, mut on_message: F) -> SessionError
    where
        F: FnMut(Message),
    {
        loop {
            match self.read().await {
                Ok(msg) => on_message(msg),
                Err(err) => return err,
            }
        }
    }

    /// Closes the connection. The session key is kept, so a reconnect does
    /// not repeat the handshake.
    pub async fn terminate(&mut self) -> Result<(), SessionError> {
        if let Some(mut stream) = self.conn.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    /// Values of the named cookie, if the server has set it.
    pub fn cookies(&self, name: &str) -> Option<&[String]> {
        self.cookies.get(name).map(Vec::as_slice)
    }

    /// The full cookie jar.
    pub fn cookie_jar(&self) -> &HashMap<String, Vec<String>> {
        &self.cookies
    }
}
