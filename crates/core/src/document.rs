use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use thiserror::Error;

/// Line ending style detected on load and restored on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    /// Returns the literal string written out when serialising text.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

/// Text encodings a document can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Windows1252 => "windows-1252",
        }
    }
}

/// Errors that can occur while loading or saving a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("file encoding is not supported or data is invalid")]
    InvalidEncoding,
    #[error("text cannot be represented in target encoding {0}")]
    Unrepresentable(&'static str),
}

/// In-memory plain-text document: the canonical buffer the find/replace
/// engine searches and edits.
///
/// Contents are newline-normalised to `\n`; the original line ending style,
/// encoding, and BOM are remembered and restored on save.
#[derive(Debug, Clone)]
pub struct Document {
    path: Option<PathBuf>,
    contents: String,
    line_ending: LineEnding,
    encoding: Encoding,
    has_bom: bool,
    is_dirty: bool,
}

impl Document {
    /// Creates an unsaved document with empty contents.
    pub fn new() -> Self {
        Self {
            path: None,
            contents: String::new(),
            line_ending: LineEnding::Lf,
            encoding: Encoding::Utf8,
            has_bom: false,
            is_dirty: false,
        }
    }

    /// Creates an unsaved document seeded with the given text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut document = Self::new();
        document.contents = normalize_newlines(&text.into());
        document
    }

    /// Loads a document from disk, normalising newlines to `\n` internally.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path_ref = path.as_ref();
        let mut file = File::open(path_ref)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let decoded = decode_bytes(bytes)?;
        let line_ending = detect_line_ending(&decoded.text);
        let contents = normalize_newlines(&decoded.text);

        Ok(Self {
            path: Some(path_ref.to_path_buf()),
            contents,
            line_ending,
            encoding: decoded.encoding,
            has_bom: decoded.has_bom,
            is_dirty: false,
        })
    }

    /// Saves the document to its current path; fails if no path is set.
    pub fn save(&mut self) -> Result<(), DocumentError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "document has no associated path"))?
            .to_path_buf();
        self.save_as(path)
    }

    /// Saves the document to a new path.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path_ref = path.as_ref();
        let encoded = self.serialise_contents()?;

        // Temporary file plus rename guards against partial writes.
        let tmp_path = path_ref.with_extension("tmp_scribepad");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(&encoded)?;
            tmp_file.sync_all()?;
        }
        fs::rename(&tmp_path, path_ref)?;

        self.path = Some(path_ref.to_path_buf());
        self.is_dirty = false;
        Ok(())
    }

    /// Returns the current contents, normalised to `\n` line endings.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Replaces the in-memory contents, marking the document as dirty.
    pub fn set_contents(&mut self, text: impl Into<String>) {
        self.contents = normalize_newlines(&text.into());
        self.is_dirty = true;
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Indicates whether a BOM is written when the document is saved.
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Returns whether the document has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// The backing file path, if the document is linked to one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn serialise_contents(&self) -> Result<Vec<u8>, DocumentError> {
        let text = self.contents.replace('\n', self.line_ending.as_str());
        let bytes = match self.encoding {
            Encoding::Utf8 => {
                if self.has_bom {
                    let mut prefixed = Vec::with_capacity(3 + text.len());
                    prefixed.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
                    prefixed.extend_from_slice(text.as_bytes());
                    prefixed
                } else {
                    text.into_bytes()
                }
            }
            Encoding::Utf16Le => encode_utf16(&text, self.has_bom, false),
            Encoding::Utf16Be => encode_utf16(&text, self.has_bom, true),
            Encoding::Windows1252 => {
                let (encoded, _, unmappable) = WINDOWS_1252.encode(&text);
                if unmappable {
                    return Err(DocumentError::Unrepresentable("windows-1252"));
                }
                encoded.into_owned()
            }
        };
        Ok(bytes)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

struct DecodedText {
    text: String,
    encoding: Encoding,
    has_bom: bool,
}

fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedText, DocumentError> {
    if bytes.starts_with(b"\xEF\xBB\xBF") {
        let text =
            String::from_utf8(bytes[3..].to_vec()).map_err(|_| DocumentError::InvalidEncoding)?;
        return Ok(DecodedText {
            text,
            encoding: Encoding::Utf8,
            has_bom: true,
        });
    }

    if bytes.starts_with(b"\xFF\xFE") {
        let text = decode_utf16(&bytes[2..], false)?;
        return Ok(DecodedText {
            text,
            encoding: Encoding::Utf16Le,
            has_bom: true,
        });
    }

    if bytes.starts_with(b"\xFE\xFF") {
        let text = decode_utf16(&bytes[2..], true)?;
        return Ok(DecodedText {
            text,
            encoding: Encoding::Utf16Be,
            has_bom: true,
        });
    }

    if let Ok(text) = std::str::from_utf8(&bytes) {
        return Ok(DecodedText {
            text: text.to_owned(),
            encoding: Encoding::Utf8,
            has_bom: false,
        });
    }

    // windows-1252 maps every byte, so this cannot fail; it is the fallback
    // for non-UTF text.
    let (text, _, _) = WINDOWS_1252.decode(&bytes);
    Ok(DecodedText {
        text: text.into_owned(),
        encoding: Encoding::Windows1252,
        has_bom: false,
    })
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> Result<String, DocumentError> {
    if bytes.len() % 2 != 0 {
        return Err(DocumentError::InvalidEncoding);
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| {
            let pair = [chunk[0], chunk[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|_| DocumentError::InvalidEncoding)
}

fn encode_utf16(text: &str, include_bom: bool, big_endian: bool) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(text.len() * 2 + if include_bom { 2 } else { 0 });
    if include_bom {
        buffer.extend_from_slice(if big_endian {
            &[0xFE, 0xFF]
        } else {
            &[0xFF, 0xFE]
        });
    }
    for unit in text.encode_utf16() {
        let pair = if big_endian {
            unit.to_be_bytes()
        } else {
            unit.to_le_bytes()
        };
        buffer.extend_from_slice(&pair);
    }
    buffer
}

fn detect_line_ending(text: &str) -> LineEnding {
    if text.contains("\r\n") {
        LineEnding::CrLf
    } else if text.contains('\r') {
        LineEnding::Cr
    } else {
        LineEnding::Lf
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
