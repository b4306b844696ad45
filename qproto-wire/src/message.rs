//! Protocol messages and their binary frame format.
//!
//! A generated frame has the shape
//!
//! ```text
//! <headers><HeaderDelim>[ encode( ]<file>*<body>[ ) ]<EndingDelim>
//! ```
//!
//! where each header line is `key<D>value<D>value<D>...<D>`, each file record
//! is `name<HeaderDelim>is_encoded<HeaderDelim>data<FileDelim>`, and the
//! optional content-transfer encoding covers the whole file-plus-body region.
//! An empty body is written as a single `0x00` byte so that a trailing file
//! record cannot be mistaken for the body on parse.

use std::collections::HashMap;

use getset::{CopyGetters, Getters};
use thiserror::Error;

use crate::delimiter::Delimiter;
use crate::encoding::{ContentEncoding, DecodeError};
use crate::file::FileAttachment;
use crate::util;

#[cfg(test)]
mod tests;

/// A header key or value was rejected because it would break framing.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidHeaderValue {
    /// The header key contained the delimiter.
    #[error("header key cannot contain the delimiter")]
    KeyContainsDelimiter,

    /// The header value contained the delimiter.
    #[error("header value cannot contain the delimiter")]
    ValueContainsDelimiter,
}

/// A frame could not be parsed back into a message.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParseError {
    /// The frame did not split into a header section and a body section.
    #[error("frame does not contain a body delimiter")]
    InvalidFrame,

    /// A header line did not split into a key and at least one value, or
    /// held text that was not UTF-8.
    #[error("header line does not split into a key and at least one value")]
    InvalidHeader,

    /// A file record did not split into name, encoding flag and data, or its
    /// encoding flag was not `true`/`false`.
    #[error("file record does not split into name, encoding flag and data")]
    InvalidFile,

    /// The body or file codec rejected its input.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Message content, normalized from the loosely-typed surface of the
/// protocol: text and bytes append to the body, files attach by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// UTF-8 text appended to the body.
    Text(String),
    /// Raw bytes appended to the body.
    Binary(Vec<u8>),
    /// A named attachment.
    File(FileAttachment),
}

/// One protocol message: a header multimap, a body and named file
/// attachments, together with the framing parameters used to put it on the
/// wire.
///
/// Messages are single-use per direction: the sender populates one and calls
/// [`generate`](Self::generate), the receiver calls
/// [`parse`](Self::parse) on a codec-seeded empty message. Header and file
/// ordering on the wire is unspecified; parsers must not rely on it.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Message {
    /// The base delimiter all structural markers derive from.
    #[getset(get = "pub")]
    delimiter: Delimiter,

    /// Whether the file-plus-body region is content-transfer-encoded.
    #[getset(get_copy = "pub")]
    use_encoding: bool,

    /// Codec for the file-plus-body region.
    #[getset(get_copy = "pub")]
    encoding: ContentEncoding,

    /// Codec for individual colliding file payloads.
    #[getset(get_copy = "pub")]
    file_encoding: ContentEncoding,

    /// Header name to ordered values.
    #[getset(get = "pub")]
    headers: HashMap<String, Vec<String>>,

    /// The message body.
    #[getset(get = "pub")]
    body: Vec<u8>,

    /// File attachments by name.
    #[getset(get = "pub")]
    files: HashMap<String, FileAttachment>,
}

impl Message {
    /// Creates an empty message framed by `delimiter`.
    ///
    /// The file codec defaults to Base64; override it with
    /// [`set_file_encoding`](Self::set_file_encoding) when both peers agree.
    pub fn new(delimiter: Delimiter, use_encoding: bool, encoding: ContentEncoding) -> Self {
        Self {
            delimiter,
            use_encoding,
            encoding,
            file_encoding: ContentEncoding::Base64,
            headers: HashMap::new(),
            body: Vec::new(),
            files: HashMap::new(),
        }
    }

    /// Replaces the codec used for colliding file payloads.
    pub fn set_file_encoding(&mut self, encoding: ContentEncoding) {
        self.file_encoding = encoding;
    }

    /// Appends `value` to the values of header `key`.
    ///
    /// Keys and values may not contain the delimiter; the derived structural
    /// markers are all repetitions of it, so this single check keeps the
    /// header section unambiguous.
    pub fn add_header(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), InvalidHeaderValue> {
        let key = key.into();
        let value = value.into();
        let delim = self.delimiter.as_bytes();

        if util::find(key.as_bytes(), delim).is_some() {
            return Err(InvalidHeaderValue::KeyContainsDelimiter);
        }
        if util::find(value.as_bytes(), delim).is_some() {
            return Err(InvalidHeaderValue::ValueContainsDelimiter);
        }

        self.headers.entry(key).or_default().push(value);
        Ok(())
    }

    /// The values of header `key`, if present.
    pub fn header(&self, key: &str) -> Option<&[String]> {
        self.headers.get(key).map(Vec::as_slice)
    }

    /// Removes header `key`, returning its values.
    pub fn remove_header(&mut self, key: &str) -> Option<Vec<String>> {
        self.headers.remove(key)
    }

    /// Removes and returns every header whose key starts with `prefix`.
    pub fn take_headers_with_prefix(&mut self, prefix: &str) -> Vec<(String, Vec<String>)> {
        let keys: Vec<String> = self
            .headers
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();

        keys.into_iter()
            .filter_map(|k| self.headers.remove(&k).map(|v| (k, v)))
            .collect()
    }

    /// Replaces the message body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Adds content to the message: text and bytes extend the body, a file
    /// attaches by name.
    pub fn add_content(&mut self, content: Content) {
        match content {
            Content::Text(text) => self.body.extend_from_slice(text.as_bytes()),
            Content::Binary(bytes) => self.body.extend_from_slice(&bytes),
            Content::File(file) => self.add_file(file),
        }
    }

    /// Attaches `file`, replacing any attachment with the same name.
    pub fn add_file(&mut self, file: FileAttachment) {
        self.files.insert(file.name().clone(), file);
    }

    /// Creates an attachment from a name and payload and attaches it.
    pub fn add_raw_file(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.add_file(FileAttachment::new(name, data));
    }

    /// Sizes of all attachments, keyed by name.
    pub fn file_sizes(&self) -> HashMap<String, usize> {
        self.files
            .values()
            .map(|f| (f.name().clone(), f.size()))
            .collect()
    }

    /// Encodes the message into one self-delimited frame.
    ///
    /// The returned bytes always end with the Ending delimiter.
    pub fn generate(&self) -> Vec<u8> {
        let delim = self.delimiter.as_bytes();
        let header_delim = self.delimiter.header();
        let file_delim = self.delimiter.file();

        let mut frame = Vec::new();
        if self.headers.is_empty() {
            // the Body delimiter normally forms from the last line's trailing
            // delimiters meeting the closing header delimiter; with no lines
            // it must be written outright or the parser has no split point
            frame.extend_from_slice(&self.delimiter.body());
        } else {
            for (key, values) in &self.headers {
                frame.extend_from_slice(key.as_bytes());
                frame.extend_from_slice(delim);
                for value in values {
                    frame.extend_from_slice(value.as_bytes());
                    frame.extend_from_slice(delim);
                }
                // the closing delimiter; together with the line's trailing one
                // it forms the header delimiter that separates lines
                frame.extend_from_slice(delim);
            }
            frame.extend_from_slice(&header_delim);
        }

        let mut region = Vec::new();
        for file in self.files.values() {
            // a payload carrying the delimiter anywhere could merge with the
            // structural markers written around it, so it goes through the
            // file codec; clean payloads are written raw to save space
            let is_encoded = util::find(file.data(), delim).is_some();
            let payload = if is_encoded {
                self.file_encoding.encode(file.data())
            } else {
                file.data().clone()
            };

            region.extend_from_slice(file.name().as_bytes());
            region.extend_from_slice(&header_delim);
            region.extend_from_slice(if is_encoded { b"true" } else { b"false" });
            region.extend_from_slice(&header_delim);
            region.extend_from_slice(&payload);
            region.extend_from_slice(&file_delim);
        }

        if self.body.is_empty() {
            // keeps a trailing file record from being taken for the body
            region.push(0x00);
        } else {
            region.extend_from_slice(&self.body);
        }

        if self.use_encoding {
            frame.extend_from_slice(&self.encoding.encode(&region));
        } else {
            frame.extend_from_slice(&region);
        }

        frame.extend_from_slice(&self.delimiter.ending());
        frame
    }

    /// Decodes one frame into this message, filling headers, body and files.
    ///
    /// `data` must hold a complete frame; a trailing Ending delimiter is
    /// accepted and ignored (the decompression path of the session layer
    /// consumes it before parsing).
    pub fn parse(&mut self, data: &[u8]) -> Result<(), ParseError> {
        let delim = self.delimiter.as_bytes();
        let header_delim = self.delimiter.header();
        let body_delim = self.delimiter.body();
        let file_delim = self.delimiter.file();
        let ending_delim = self.delimiter.ending();

        let (head, tail) =
            util::split_once(data, &body_delim).ok_or(ParseError::InvalidFrame)?;

        if !head.is_empty() {
            for line in util::split(head, &header_delim) {
                let tokens = util::split(line, delim);
                if tokens.len() < 2 {
                    return Err(ParseError::InvalidHeader);
                }

                let key = str_token(tokens[0]).ok_or(ParseError::InvalidHeader)?;
                let values = tokens[1..]
                    .iter()
                    .map(|t| str_token(t).ok_or(ParseError::InvalidHeader))
                    .collect::<Result<Vec<_>, _>>()?;

                self.headers.entry(key).or_default().extend(values);
            }
        }

        let mut region = tail;
        while region.ends_with(&ending_delim) {
            region = &region[..region.len() - ending_delim.len()];
        }

        let decoded;
        let region: &[u8] = if self.use_encoding {
            decoded = self.encoding.decode(region)?;
            &decoded
        } else {
            region
        };

        let mut parts = util::split(region, &file_delim);
        // the last element is the body; everything before it is a file record
        let body = parts.pop().unwrap_or_default();

        for record in parts {
            let fields = util::splitn(record, &header_delim, 3);
            if fields.len() != 3 {
                return Err(ParseError::InvalidFile);
            }

            let name = str_token(fields[0]).ok_or(ParseError::InvalidFile)?;
            let is_encoded = if fields[1] == b"true" {
                true
            } else if fields[1] == b"false" {
                false
            } else {
                return Err(ParseError::InvalidFile);
            };
            let payload = if is_encoded {
                self.file_encoding.decode(fields[2])?
            } else {
                fields[2].to_vec()
            };

            self.files.insert(name.clone(), FileAttachment::new(name, payload));
        }

        if body.len() != 1 || body[0] != 0x00 {
            self.body = body.to_vec();
        }

        Ok(())
    }
}

fn str_token(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}
