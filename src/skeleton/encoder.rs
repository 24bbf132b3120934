//! Output escaping per target format.

use std::borrow::Cow;
use std::fmt;

/// Where the text being encoded comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderContext {
    /// Extracted text
    Text,
    /// Original data of an inline code
    Inline,
}

/// Escapes text for the format being written.
pub trait Encoder: fmt::Debug + Send + Sync {
    /// Encode `text` for the given context.
    fn encode<'a>(&self, text: &'a str, context: EncoderContext) -> Cow<'a, str>;

    /// Name of the encoder.
    fn name(&self) -> &'static str;
}

/// Leaves everything as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEncoder;

impl Encoder for DefaultEncoder {
    fn encode<'a>(&self, text: &'a str, _context: EncoderContext) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

/// Escapes extracted text for XML and HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlEncoder {
    /// Escape `>` as `&gt;` (only `]]>` is escaped otherwise)
    pub escape_gt: bool,
    /// Escape `"` and `'`
    pub escape_quotes: bool,
}

impl XmlEncoder {
    /// Create an encoder escaping only `&` and `<` (and `>` after `]]`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Escape `>` everywhere (builder style).
    pub fn with_escape_gt(mut self, escape: bool) -> Self {
        self.escape_gt = escape;
        self
    }

    /// Escape quotes (builder style).
    pub fn with_escape_quotes(mut self, escape: bool) -> Self {
        self.escape_quotes = escape;
        self
    }
}

impl Encoder for XmlEncoder {
    fn encode<'a>(&self, text: &'a str, context: EncoderContext) -> Cow<'a, str> {
        if context != EncoderContext::Text {
            return Cow::Borrowed(text);
        }
        if !text.contains(['&', '<', '>', '"', '\'']) {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + 16);
        for ch in text.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' if self.escape_gt || out.ends_with("]]") => out.push_str("&gt;"),
                '"' if self.escape_quotes => out.push_str("&quot;"),
                '\'' if self.escape_quotes => out.push_str("&apos;"),
                _ => out.push(ch),
            }
        }
        Cow::Owned(out)
    }

    fn name(&self) -> &'static str {
        "xml"
    }
}

/// Escapes extracted text for Java properties files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesEncoder {
    /// Write non-ASCII characters as `\uXXXX`
    pub escape_extended: bool,
    /// Escape `:`, `=`, `#`, `!` and `\` with a backslash
    pub java_escapes: bool,
}

impl PropertiesEncoder {
    /// Create an encoder escaping line breaks and tabs only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write non-ASCII characters as escapes (builder style).
    pub fn with_escape_extended(mut self, escape: bool) -> Self {
        self.escape_extended = escape;
        self
    }

    /// Escape the characters special to the format (builder style).
    pub fn with_java_escapes(mut self, escape: bool) -> Self {
        self.java_escapes = escape;
        self
    }
}

impl Encoder for PropertiesEncoder {
    fn encode<'a>(&self, text: &'a str, context: EncoderContext) -> Cow<'a, str> {
        if context != EncoderContext::Text {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                ':' | '=' | '#' | '!' | '\\' if self.java_escapes => {
                    out.push('\\');
                    out.push(ch);
                }
                c if (c as u32) > 127 && self.escape_extended => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        out.push_str(&format!("\\u{:04x}", unit));
                    }
                }
                _ => out.push(ch),
            }
        }
        if out == text {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(out)
        }
    }

    fn name(&self) -> &'static str {
        "properties"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encoder() {
        assert_eq!(DefaultEncoder.encode("a<b", EncoderContext::Text), "a<b");
    }

    #[test]
    fn test_xml_encoder() {
        let enc = XmlEncoder::new();
        assert_eq!(enc.encode("a & b < c > d", EncoderContext::Text), "a &amp; b &lt; c > d");
        assert_eq!(enc.encode("x]]>", EncoderContext::Text), "x]]&gt;");
        assert_eq!(enc.encode("<b>", EncoderContext::Inline), "<b>");

        let enc = XmlEncoder::new().with_escape_gt(true).with_escape_quotes(true);
        assert_eq!(enc.encode("\"a\" > 'b'", EncoderContext::Text), "&quot;a&quot; &gt; &apos;b&apos;");
    }

    #[test]
    fn test_properties_encoder() {
        let enc = PropertiesEncoder::new().with_escape_extended(true);
        assert_eq!(enc.encode("caf\u{e9}\n", EncoderContext::Text), "caf\\u00e9\\n");
        assert_eq!(enc.encode("\u{1F600}", EncoderContext::Text), "\\ud83d\\ude00");
        assert_eq!(enc.encode("a=b", EncoderContext::Text), "a=b");

        let enc = PropertiesEncoder::new().with_java_escapes(true);
        assert_eq!(enc.encode("a=b", EncoderContext::Text), "a\\=b");
    }
}
