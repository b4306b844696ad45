//! The accepting side of a session: per-connection records, an
//! address-keyed registry, and broadcast.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use qproto_wire::{ContentEncoding, Message};

use crate::addr::{craft_addr, InvalidPort, Port};
use crate::config::Config;
use crate::conn;
use crate::crypto::{self, SessionKey};
use crate::error::{HandshakeError, SessionError};
use crate::{
    AES_KEY_TYPE, COOKIE_HEADER_PREFIX, DEL_COOKIE_HEADER_PREFIX, DEL_COOKIE_VALUE,
    SET_COOKIE_HEADER_PREFIX, TYPE_HEADER,
};


/// One accepted connection, as tracked by a [`Server`].
///
/// The read and write halves sit behind independent locks so that a
/// broadcast can write to a connection that is blocked in a read. Cookie
/// state and user data are plain mutex-guarded maps: they are written by
/// the task that owns the connection, and instructions queued with
/// [`set_cookie`](Self::set_cookie)/[`delete_cookie`](Self::delete_cookie)
/// take effect on the next write to this client.
pub struct ServerClient {
    id: Uuid,
    addr: String,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    key: Option<SessionKey>,
    cookies: StdMutex<HashMap<String, Vec<String>>>,
    set_cookies: StdMutex<HashMap<String, Vec<String>>>,
    del_cookies: StdMutex<Vec<String>>,
    user_data: StdMutex<HashMap<String, String>>,
}

impl ServerClient {
    fn new(stream: TcpStream, addr: String, key: Option<SessionKey>) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            id: Uuid::new_v4(),
            addr,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            key,
            cookies: StdMutex::new(HashMap::new()),
            set_cookies: StdMutex::new(HashMap::new()),
            del_cookies: StdMutex::new(Vec::new()),
            user_data: StdMutex::new(HashMap::new()),
        }
    }

    /// Identifier of this connection, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The remote address this connection was accepted from.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The session key negotiated at accept time, if crypto is enabled.
    pub fn session_key(&self) -> Option<&SessionKey> {
        self.key.as_ref()
    }

    /// Values of a cookie previously received from the client.
    pub fn cookies(&self, name: &str) -> Option<Vec<String>> {
        self.cookies.lock().expect("cookie lock").get(name).cloned()
    }

    /// Queues a set-cookie instruction for the next write to this client.
    pub fn set_cookie(&self, name: impl Into<String>, values: Vec<String>) {
        self.set_cookies
            .lock()
            .expect("cookie lock")
            .insert(name.into(), values);
    }

    /// Queues a delete-cookie instruction for the next write to this client.
    pub fn delete_cookie(&self, name: impl Into<String>) {
        self.del_cookies.lock().expect("cookie lock").push(name.into());
    }

    /// Attaches an application value to this connection.
    pub fn set_user_value(&self, key: impl Into<String>, value: impl Into<String>) {
        self.user_data
            .lock()
            .expect("user data lock")
            .insert(key.into(), value.into());
    }

    /// Reads back an application value attached to this connection.
    pub fn user_value(&self, key: &str) -> Option<String> {
        self.user_data.lock().expect("user data lock").get(key).cloned()
    }

    fn store_cookies(&self, incoming: Vec<(String, Vec<String>)>) {
        let mut cookies = self.cookies.lock().expect("cookie lock");
        for (header, values) in incoming {
            if let Some(name) = header.strip_prefix(COOKIE_HEADER_PREFIX) {
                cookies.insert(name.to_owned(), values);
            }
        }
    }

    fn inject_cookie_instructions(&self, msg: &mut Message) -> Result<(), SessionError> {
        let pending_set: Vec<(String, Vec<String>)> =
            self.set_cookies.lock().expect("cookie lock").drain().collect();
        for (name, values) in pending_set {
            for value in values {
                msg.add_header(format!("{SET_COOKIE_HEADER_PREFIX}{name}"), value)?;
            }
        }

        let pending_del: Vec<String> = self
            .del_cookies
            .lock()
            .expect("cookie lock")
            .drain(..)
            .collect();
        for name in pending_del {
            msg.add_header(format!("{DEL_COOKIE_HEADER_PREFIX}{name}"), DEL_COOKIE_VALUE)?;
        }

        Ok(())
    }
}

/// A protocol server.
///
/// The server is a pull API like the client: the embedding application
/// accepts connections and drives per-connection reads from its own tasks.
/// Any error on one connection ends only that connection; the listener and
/// the registry of other clients are unaffected.
pub struct Server {
    ip: String,
    port: Port,
    config: Config,
    listener: Option<TcpListener>,
    clients: Mutex<HashMap<String, Arc<ServerClient>>>,
}

impl Server {
    /// Creates a server for `ip:port`. No listener is opened yet.
    pub fn new(ip: impl Into<String>, port: impl Into<Port>, config: Config) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
            config,
            listener: None,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// The bind address in `ip:port` form.
    pub fn addr(&self) -> Result<String, InvalidPort> {
        craft_addr(&self.ip, &self.port)
    }

    /// The server's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the TCP listener.
    pub async fn listen(&mut self) -> Result<(), SessionError> {
        let addr = self.addr()?;
        let listener = TcpListener::bind(&addr).await?;
        info!(%addr, "listening");
        self.listener = Some(listener);
        Ok(())
    }

    /// The bound address, once [`listen`](Self::listen) has succeeded.
    /// Useful when binding to port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Accepts one connection, performs the key exchange when crypto is
    /// enabled, and registers the client.
    ///
    /// A handshake failure is fatal for that connection and leaves no
    /// registry entry; the caller is expected to keep accepting.
    pub async fn accept(&self) -> Result<Arc<ServerClient>, SessionError> {
        let listener = self.listener.as_ref().ok_or(SessionError::NotListening)?;
        let (mut stream, peer) = listener.accept().await?;
        let addr = peer.to_string();

        let key = if self.config.use_crypto() {
            let handshake = conn::read_message(
                &mut stream,
                &self.config,
                None,
                self.config.compressed(),
            )
            .await?;

            match self.exchange_key(&handshake) {
                Ok(key) => Some(key),
                Err(err) => {
                    warn!(%addr, error = %err, "handshake failed");
                    return Err(err.into());
                }
            }
        } else {
            None
        };

        let client = Arc::new(ServerClient::new(stream, addr.clone(), key));
        info!(client = %client.id(), %addr, "accepted connection");

        self.clients
            .lock()
            .await
            .insert(addr, Arc::clone(&client));
        Ok(client)
    }

    /// Recovers the session key from a handshake frame.
    fn exchange_key(&self, handshake: &Message) -> Result<SessionKey, HandshakeError> {
        let is_key_frame = handshake
            .header(TYPE_HEADER)
            .and_then(|values| values.first())
            .is_some_and(|value| value == AES_KEY_TYPE);
        if !is_key_frame {
            return Err(HandshakeError::MissingKeyHeader);
        }

        let mut key_bytes = handshake.body().clone();
        if let Some(private_key) = self.config.private_key() {
            let wrapped = ContentEncoding::Base64.decode(&key_bytes)?;
            key_bytes =
                crypto::unwrap_session_key(private_key, &wrapped).map_err(HandshakeError::Unwrap)?;
        }

        SessionKey::from_slice(&key_bytes)
            .ok_or(HandshakeError::BadKeyLength(key_bytes.len()))
    }

    /// Reads one message from `client`.
    ///
    /// Incoming `Q-COOKIES-*` headers are stripped off the message and
    /// stored on the client record.
    pub async fn read(&self, client: &ServerClient) -> Result<Message, SessionError> {
        let mut msg = {
            let mut reader = client.reader.lock().await;
            conn::read_message(
                &mut *reader,
                &self.config,
                client.session_key(),
                self.config.compressed(),
            )
            .await?
        };

        client.store_cookies(msg.take_headers_with_prefix(COOKIE_HEADER_PREFIX));
        Ok(msg)
    }

    /// Writes `msg` to `client`, injecting any queued cookie instructions.
    pub async fn write(&self, client: &ServerClient, msg: &mut Message) -> Result<(), SessionError> {
        client.inject_cookie_instructions(msg)?;

        let mut writer = client.writer.lock().await;
        conn::write_message(
            &mut *writer,
            &self.config,
            msg,
            client.session_key(),
            self.config.compressed(),
        )
        .await
    }

    /// Writes `msg` to every registered client, stopping at the first
    /// error.
    ///
    /// Each client gets its own copy of the message so that per-client
    /// cookie instructions stay with their connection. Visit order is
    /// unspecified, and a slow consumer blocks the broadcast.
    pub async fn broadcast(&self, msg: &Message) -> Result<(), SessionError> {
        let clients: Vec<Arc<ServerClient>> =
            self.clients.lock().await.values().cloned().collect();

        for client in clients {
            let mut copy = msg.clone();
            self.write(&client, &mut copy).await?;
        }
        Ok(())
    }

    /// Looks up a registered client by remote address.
    pub async fn client(&self, addr: &str) -> Option<Arc<ServerClient>> {
        self.clients.lock().await.get(addr).cloned()
    }

    /// Number of registered clients.
    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Drops a client from the registry and closes its connection.
    pub async fn remove_client(&self, addr: &str) {
        if let Some(client) = self.clients.lock().await.remove(addr) {
            let mut writer = client.writer.lock().await;
            if let Err(err) = writer.shutdown().await {
                debug!(client = %client.id(), error = %err, "shutdown after removal");
            }
        }
    }

    /// Closes the listener. Existing connections stay up until removed.
    pub fn terminate(&mut self) {
        self.listener = None;
    }
}
