//! Frame transport: drain one frame from a stream, put one frame on it.
//!
//! Ordering contract when encryption and compression are both enabled:
//! the generated frame is stripped of its Ending delimiter, encrypted, then
//! compressed, and the delimiter is re-appended last, so the Ending
//! delimiter is the final on-wire bytes in every combination. Compressing
//! ciphertext yields no gains; the order is kept for interoperability with
//! existing peers.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use qproto_wire::{compress, decompress, Message};

use crate::config::Config;
use crate::crypto::SessionKey;
use crate::error::SessionError;


/// Reads one frame from `stream` and parses it.
///
/// Bytes are drained in `config.buf_size()` chunks until the buffer contains
/// the Ending delimiter; EOF before that is
/// [`ConnectionClosed`](SessionError::ConnectionClosed). Decompression and
/// decryption are undone in the inverse of the write order, and the Ending
/// delimiter is re-appended before parsing so the parser always sees a
/// well-formed frame.
pub async fn read_message<R>(
    stream: &mut R,
    config: &Config,
    key: Option<&SessionKey>,
    compressed: bool,
) -> Result<Message, SessionError>
where
    R: AsyncRead + Unpin,
{
    let ending = config.delimiter().ending();

    let mut data = Vec::new();
    let mut buf = vec![0u8; config.buf_size().max(1)];
    while find(&data, &ending).is_none() {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(SessionError::ConnectionClosed);
        }
        data.extend_from_slice(&buf[..n]);
    }

    if compressed {
        truncate_at_ending(&mut data, &ending);
        data = decompress(&data)?;
    }

    if let Some(key) = key {
        if !compressed {
            truncate_at_ending(&mut data, &ending);
        }
        data = key.open(&data)?;
        // the parser expects a terminated frame
        data.extend_from_slice(&ending);
    }

    let mut msg = config.new_message();
    msg.parse(&data)?;
    Ok(msg)
}

/// Generates `msg` and writes it to `stream` as one frame.
///
/// The full frame goes out in a single `write_all` followed by a flush, so
/// concurrent writers on other connections cannot interleave inside it.
pub async fn write_message<W>(
    stream: &mut W,
    config: &Config,
    msg: &Message,
    key: Option<&SessionKey>,
    compressed: bool,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let ending = config.delimiter().ending();

    let mut data = msg.generate();
    if let Some(key) = key {
        data.truncate(data.len() - ending.len());
        data = key.seal(&data)?;
        if !compressed {
            data.extend_from_slice(&ending);
        }
    }

    if compressed {
        data = compress(&data)?;
        data.extend_from_slice(&ending);
    }

    stream.write_all(&data).await.map_err(write_error)?;
    stream.flush().await.map_err(write_error)?;
    Ok(())
}

/// A peer that went away mid-write reports as a closed connection rather
/// than a bare I/O error.
fn write_error(err: io::Error) -> SessionError {
    match err.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => {
            SessionError::ConnectionClosed
        }
        _ => SessionError::Io(err),
    }
}

/// Cuts `data` at the first occurrence of the Ending delimiter, dropping it
/// and anything after it.
fn truncate_at_ending(data: &mut Vec<u8>, ending: &[u8]) {
    if let Some(at) = find(data, ending) {
        data.truncate(at);
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
