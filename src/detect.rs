//! Input encoding, byte-order mark and line-break detection.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A text encoding, backed by an `encoding_rs` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextEncoding(&'static Encoding);

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl TextEncoding {
    /// UTF-8
    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    /// UTF-16, little endian
    pub fn utf16le() -> Self {
        Self(UTF_16LE)
    }

    /// UTF-16, big endian
    pub fn utf16be() -> Self {
        Self(UTF_16BE)
    }

    /// windows-1252, the encoding ISO-8859-1 labels resolve to
    pub fn windows_1252() -> Self {
        Self(WINDOWS_1252)
    }

    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// The `encoding_rs` encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.0
    }

    /// Byte-order mark of the encoding (empty for legacy encodings).
    pub fn bom(&self) -> &'static [u8] {
        if self.0 == UTF_8 {
            b"\xEF\xBB\xBF"
        } else if self.0 == UTF_16LE {
            b"\xFF\xFE"
        } else if self.0 == UTF_16BE {
            b"\xFE\xFF"
        } else {
            b""
        }
    }
}

impl From<&'static Encoding> for TextEncoding {
    fn from(encoding: &'static Encoding) -> Self {
        Self(encoding)
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim().replace('_', "-");
        Encoding::for_label_no_replacement(label.as_bytes())
            .map(TextEncoding)
            .ok_or_else(|| Error::Encoding(format!("unsupported encoding: {}", s)))
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Line-break convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineBreak {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl LineBreak {
    /// The line-break characters.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineBreak::Lf => "\n",
            LineBreak::CrLf => "\r\n",
            LineBreak::Cr => "\r",
        }
    }
}

/// What was detected about an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFormat {
    /// Text encoding
    pub encoding: TextEncoding,
    /// Whether the input starts with a byte-order mark
    pub has_bom: bool,
    /// First line-break convention found (LF if none)
    pub line_break: LineBreak,
}

/// Detect the encoding and BOM of raw bytes.
///
/// A BOM decides the encoding. Without BOM, input that is valid UTF-8 is
/// UTF-8 and anything else is taken as windows-1252. The line break is left
/// at its default; see [`decode`] for full detection.
pub fn detect_from_bytes(data: &[u8]) -> InputFormat {
    let (encoding, has_bom) = match Encoding::for_bom(data) {
        Some((encoding, _)) => (TextEncoding(encoding), true),
        None if std::str::from_utf8(data).is_ok() => (TextEncoding::utf8(), false),
        None => (TextEncoding::windows_1252(), false),
    };
    InputFormat {
        encoding,
        has_bom,
        line_break: LineBreak::default(),
    }
}

/// Decode raw bytes into text, stripping the BOM.
///
/// Fails only when a BOM announces an encoding the bytes are not valid in.
pub fn decode(data: &[u8]) -> Result<(String, InputFormat)> {
    let format = detect_from_bytes(data);
    if !format.has_bom && format.encoding != TextEncoding::utf8() {
        log::debug!("input is not UTF-8, decoding as {}", format.encoding);
    }
    decode_body(data, format)
}

/// Decode raw bytes with a declared encoding.
///
/// A BOM still wins over the declaration, the way browsers treat a
/// declared charset.
pub fn decode_as(data: &[u8], encoding: TextEncoding) -> Result<(String, InputFormat)> {
    let mut format = detect_from_bytes(data);
    if !format.has_bom {
        format.encoding = encoding;
    }
    decode_body(data, format)
}

/// Read and decode a file.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<(String, InputFormat)> {
    let data = fs::read(path)?;
    decode(&data)
}

fn decode_body(data: &[u8], mut format: InputFormat) -> Result<(String, InputFormat)> {
    let body = if format.has_bom {
        &data[format.encoding.bom().len()..]
    } else {
        data
    };
    let text = format
        .encoding
        .encoding()
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| Error::Encoding(format!("input is not valid {}", format.encoding)))?
        .into_owned();
    format.line_break = detect_line_break(&text);
    Ok((text, format))
}

/// First line-break convention found in a text (LF if none).
pub fn detect_line_break(text: &str) -> LineBreak {
    let bytes = text.as_bytes();
    match bytes.iter().position(|&b| b == b'\n' || b == b'\r') {
        Some(i) if bytes[i] == b'\n' => LineBreak::Lf,
        Some(i) if bytes.get(i + 1) == Some(&b'\n') => LineBreak::CrLf,
        Some(_) => LineBreak::Cr,
        None => LineBreak::Lf,
    }
}

/// Rewrite every line break of `text` with `line_break`.
pub fn normalize_line_breaks(text: &str, line_break: LineBreak) -> Cow<'_, str> {
    if !text.contains(['\r', '\n']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(line_break.as_str());
            }
            '\n' => out.push_str(line_break.as_str()),
            _ => out.push(ch),
        }
    }
    if out == text {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(out)
    }
}

/// Encode text for output, with an optional byte-order mark.
///
/// Characters a legacy encoding cannot represent are written as numeric
/// character references.
pub fn encode(text: &str, encoding: TextEncoding, with_bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 3);
    if with_bom {
        out.extend_from_slice(encoding.bom());
    }
    // encoding_rs has no UTF-16 encoder
    if encoding == TextEncoding::utf16le() {
        text.encode_utf16().for_each(|u| out.extend_from_slice(&u.to_le_bytes()));
    } else if encoding == TextEncoding::utf16be() {
        text.encode_utf16().for_each(|u| out.extend_from_slice(&u.to_be_bytes()));
    } else {
        let (bytes, _, unmappable) = encoding.encoding().encode(text);
        if unmappable {
            log::warn!("characters not representable in {} were written as references", encoding);
        }
        out.extend_from_slice(&bytes);
    }
    out
}
