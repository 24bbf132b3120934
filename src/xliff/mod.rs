//! XLIFF output of extracted content.
//!
//! [`XliffWriter`] serializes events as an XLIFF 2 document: one `file` per
//! sub-document, `group` for groups and `unit` for text units, with their
//! notes, matches, metadata, glossary and extension data. Namespaces are
//! tracked per element by an [`NsStack`]; the namespaces of an extension
//! subtree are declared once, on its outermost element. Inline codes are
//! numbered per unit and annotated codes become ITS markers.

mod ext_writer;
mod flavor;
mod inline;
mod ns;
mod options;
mod writer;

pub use ext_writer::ExtensionsWriter;
pub use flavor::{Flavor, FlavorRules};
pub use ns::{NsContext, NsStack, NS_XML};
pub use options::XliffOptions;
pub use writer::XliffWriter;

use std::borrow::Cow;

use crate::skeleton::{Encoder, EncoderContext, XmlEncoder};

/// XLIFF 2.0 core namespace.
pub const NS_XLIFF: &str = "urn:oasis:names:tc:xliff:document:2.0";
/// XLIFF 2.0 translation candidates module.
pub const NS_MATCHES: &str = "urn:oasis:names:tc:xliff:matches:2.0";
/// XLIFF 2.0 glossary module.
pub const NS_GLOSSARY: &str = "urn:oasis:names:tc:xliff:glossary:2.0";
/// XLIFF 2.0 metadata module.
pub const NS_METADATA: &str = "urn:oasis:names:tc:xliff:metadata:2.0";
/// ITS 2.0 namespace.
pub const NS_ITS: &str = "http://www.w3.org/2005/11/its";

/// Escape text for element content, or for an attribute value.
pub(crate) fn to_xml(text: &str, attribute: bool) -> Cow<'_, str> {
    XmlEncoder::new()
        .with_escape_gt(attribute)
        .with_escape_quotes(attribute)
        .encode(text, EncoderContext::Text)
}

/// Escape element content, writing characters XML cannot carry as `<cp>`.
pub(crate) fn to_safe_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if is_xml_char(ch) {
            continue;
        }
        out.push_str(&to_xml(&text[start..i], false));
        out.push_str(&format!("<cp hex=\"{:04X}\"/>", ch as u32));
        start = i + ch.len_utf8();
    }
    out.push_str(&to_xml(&text[start..], false));
    out
}

fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
