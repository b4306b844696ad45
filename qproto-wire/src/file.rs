//! Named binary attachments carried inside a message.

use std::fmt;
use std::io;
use std::path::Path;

use getset::Getters;

/// A named blob of bytes attached to a [`Message`](crate::Message).
///
/// File names are unique within a message; adding a second attachment under
/// the same name replaces the first.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct FileAttachment {
    /// The attachment name.
    #[getset(get = "pub")]
    name: String,

    /// The attachment payload.
    #[getset(get = "pub")]
    data: Vec<u8>,
}

impl FileAttachment {
    /// Bundles a name and payload into an attachment.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// The payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Writes the payload to `dir`, using the attachment name as the file
    /// name.
    pub fn save(&self, dir: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(dir.as_ref().join(&self.name), &self.data)
    }
}

impl fmt::Display for FileAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
