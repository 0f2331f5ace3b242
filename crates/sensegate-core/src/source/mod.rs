//! Message sources.
//!
//! Transport frontends (MQTT, queue consumers) live outside this crate;
//! they implement [`MessageSource`] and feed device adapters. The one
//! implementation shipped here is the offline [`FileSource`] the CLI
//! uses: one payload per line, hex-encoded or plain text, optionally
//! prefixed with the input topic as `topic|payload`. All file I/O stays
//! in this module; parsing and decoding never touch it.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use thiserror::Error;

/// One raw message handed to a device adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: Option<String>,
    pub payload: Vec<u8>,
}

/// Pull-based message feed. `Ok(None)` means the feed is exhausted.
pub trait MessageSource {
    fn next_message(&mut self) -> Result<Option<Message>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid hex payload: {message}")]
    InvalidHex { line: usize, message: String },
}

/// How each line's payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Hex-encoded binary payloads (BLE advertisements).
    Hex,
    /// Plain text payloads (bus monitor lines).
    Text,
}

/// Line-oriented capture file: blank lines and `#` comments are
/// skipped; `topic|payload` carries the input topic.
pub struct FileSource {
    lines: Lines<BufReader<File>>,
    format: PayloadFormat,
    line: usize,
}

impl FileSource {
    pub fn open(path: &Path, format: PayloadFormat) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            format,
            line: 0,
        })
    }
}

impl MessageSource for FileSource {
    fn next_message(&mut self) -> Result<Option<Message>, SourceError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (topic, body) = match trimmed.split_once('|') {
                Some((topic, body)) => (Some(topic.to_string()), body),
                None => (None, trimmed),
            };

            let payload = match self.format {
                PayloadFormat::Hex => {
                    hex::decode(body.trim()).map_err(|err| SourceError::InvalidHex {
                        line: self.line,
                        message: err.to_string(),
                    })?
                }
                PayloadFormat::Text => body.as_bytes().to_vec(),
            };

            return Ok(Some(Message { topic, payload }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{FileSource, Message, MessageSource, PayloadFormat, SourceError};

    fn source_for(content: &str, format: PayloadFormat) -> FileSource {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(content.as_bytes()).expect("write");
        FileSource::open(file.path(), format).expect("open")
        // NamedTempFile is dropped here; the open handle keeps reading.
    }

    #[test]
    fn hex_lines_with_comments_and_topics() {
        let mut source = source_for(
            "# capture from 2023-03-14\n\n4400\nble/kitchen|2b01\n",
            PayloadFormat::Hex,
        );
        assert_eq!(
            source.next_message().unwrap(),
            Some(Message {
                topic: None,
                payload: vec![0x44, 0x00],
            })
        );
        assert_eq!(
            source.next_message().unwrap(),
            Some(Message {
                topic: Some("ble/kitchen".to_string()),
                payload: vec![0x2b, 0x01],
            })
        );
        assert_eq!(source.next_message().unwrap(), None);
    }

    #[test]
    fn text_lines_keep_bytes_verbatim() {
        let mut source = source_for(
            "p1p2/bridge42|R 2023-03-14 17:56:09 M 8900\n",
            PayloadFormat::Text,
        );
        let message = source.next_message().unwrap().unwrap();
        assert_eq!(message.topic.as_deref(), Some("p1p2/bridge42"));
        assert_eq!(message.payload, b"R 2023-03-14 17:56:09 M 8900");
    }

    #[test]
    fn invalid_hex_reports_line_number() {
        let mut source = source_for("4400\nnothex\n", PayloadFormat::Hex);
        source.next_message().unwrap();
        let err = source.next_message().unwrap_err();
        match err {
            SourceError::InvalidHex { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
