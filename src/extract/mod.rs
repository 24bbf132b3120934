//! Extraction boundary: raw documents in, event streams out.
//!
//! A [`Filter`] turns a [`RawDocument`] into a lazy [`EventStream`]. Filters
//! are looked up by configuration id in a [`FilterRegistry`], which also
//! applies the format-independent steps (NFC normalization and sentence
//! segmentation) to the text units as they pass.
//!
//! # Example
//!
//! ```
//! use unmark::extract::{ExtractOptions, FilterRegistry, RawDocument};
//! use unmark::model::LocaleId;
//!
//! fn main() -> unmark::Result<()> {
//!     let registry = FilterRegistry::with_defaults();
//!     let doc = RawDocument::new("<p>Hello <b>world</b></p>", LocaleId::new("en")).with_filter_id("html");
//!
//!     let mut units = 0;
//!     for event in registry.open(doc, &ExtractOptions::default())? {
//!         if event?.as_text_unit().is_some() {
//!             units += 1;
//!         }
//!     }
//!     assert_eq!(units, 1);
//!     Ok(())
//! }
//! ```

mod builder;
mod markup;
mod options;
mod plaintext;
mod segmenter;
mod tokenizer;

pub use markup::MarkupFilter;
pub use options::{ExtractOptions, FilterParameters};
pub use plaintext::PlainTextFilter;
pub use segmenter::{Segmenter, SentenceSegmenter};
pub use tokenizer::{SimpleMarkupTokenizer, TagKind, Token, Tokenizer};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::detect::{self, InputFormat};
use crate::error::{Error, Result};
use crate::model::{Event, LocaleId, TextUnit};

// ==================== Raw Document ====================

/// Input of an extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Document id, used for the start-document event
    pub id: String,

    /// Decoded text
    pub text: String,

    /// Locale of the text
    pub source_locale: LocaleId,

    /// Locale translations will be written in
    pub target_locale: Option<LocaleId>,

    /// Filter configuration id
    pub filter_id: Option<String>,

    /// What was detected about the input bytes
    pub format: InputFormat,

    /// Document name (file name when read from disk)
    pub name: Option<String>,
}

impl RawDocument {
    /// Create a document from text.
    pub fn new(text: impl Into<String>, source_locale: LocaleId) -> Self {
        let text = text.into();
        let format = InputFormat {
            line_break: detect::detect_line_break(&text),
            ..InputFormat::default()
        };
        Self {
            id: "doc1".to_string(),
            text,
            source_locale,
            target_locale: None,
            filter_id: None,
            format,
            name: None,
        }
    }

    /// Create a document from raw bytes, detecting encoding and BOM.
    pub fn from_bytes(data: &[u8], source_locale: LocaleId) -> Result<Self> {
        let (text, format) = detect::decode(data)?;
        let mut doc = Self::new(text, source_locale);
        doc.format = format;
        Ok(doc)
    }

    /// Create a document from raw bytes in a declared encoding.
    ///
    /// A byte-order mark in the data overrides the declaration.
    pub fn from_bytes_with_encoding(data: &[u8], encoding: &str, source_locale: LocaleId) -> Result<Self> {
        let (text, format) = detect::decode_as(data, encoding.parse()?)?;
        let mut doc = Self::new(text, source_locale);
        doc.format = format;
        Ok(doc)
    }

    /// Read a document from a file.
    pub fn from_file<P: AsRef<Path>>(path: P, source_locale: LocaleId) -> Result<Self> {
        let path = path.as_ref();
        let (text, format) = detect::decode_file(path)?;
        let mut doc = Self::new(text, source_locale);
        doc.format = format;
        doc.name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        Ok(doc)
    }

    /// Set the document id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the target locale.
    pub fn with_target_locale(mut self, locale: impl Into<LocaleId>) -> Self {
        self.target_locale = Some(locale.into());
        self
    }

    /// Set the filter configuration id.
    pub fn with_filter_id(mut self, id: impl Into<String>) -> Self {
        self.filter_id = Some(id.into());
        self
    }
}

// ==================== Diagnostics ====================

/// Kind of a non-fatal extraction anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A paired code without partner was demoted to a placeholder
    DemotedCode,
    /// Segmentation could not be applied to a text unit
    Segmentation,
    /// Anything else
    Other,
}

/// A non-fatal anomaly found while extracting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Kind of anomaly
    pub kind: DiagnosticKind,
    /// Resource the anomaly was found in
    pub resource_id: String,
    /// Description
    pub message: String,
}

// ==================== Event Stream ====================

/// Source of events behind an [`EventStream`].
pub trait EventProducer: Send {
    /// Produce the next event, or `None` when the document is done.
    fn next_event(&mut self) -> Option<Result<Event>>;

    /// Diagnostics found since the last call.
    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Lazy, forward-only stream of the events of one document.
///
/// The stream ends after the end-document event or after the first error.
pub struct EventStream {
    producer: Box<dyn EventProducer>,
    segmenter: Option<Arc<dyn Segmenter>>,
    nfc: bool,
    locale: LocaleId,
    diagnostics: Vec<Diagnostic>,
    done: bool,
}

impl EventStream {
    /// Wrap a producer without any post-processing.
    pub fn new(producer: Box<dyn EventProducer>) -> Self {
        Self {
            producer,
            segmenter: None,
            nfc: false,
            locale: LocaleId::default(),
            diagnostics: Vec::new(),
            done: false,
        }
    }

    /// Segment text units with a segmenter.
    pub fn with_segmenter(mut self, segmenter: Option<Arc<dyn Segmenter>>) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Normalize text unit content to NFC.
    pub fn with_nfc(mut self, nfc: bool) -> Self {
        self.nfc = nfc;
        self
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the stream, returning all events and diagnostics.
    ///
    /// Fails with the first error of the stream.
    pub fn collect_with_diagnostics(mut self) -> Result<(Vec<Event>, Vec<Diagnostic>)> {
        let mut events = Vec::new();
        for event in self.by_ref() {
            events.push(event?);
        }
        Ok((events, self.diagnostics))
    }

    fn post_process(&mut self, unit: &mut TextUnit) {
        if self.nfc {
            for part in unit.container.parts_mut() {
                let targets = part.targets.values_mut();
                for fragment in std::iter::once(&mut part.source).chain(targets) {
                    if let Err(e) = fragment.map_text(|t| t.nfc().collect()) {
                        log::warn!("text unit '{}' left unnormalized: {}", unit.id, e);
                    }
                }
            }
        }

        let Some(segmenter) = &self.segmenter else {
            return;
        };
        if !unit.translatable || unit.is_referent || unit.container.len() != 1 {
            return;
        }
        let Some(part) = unit.container.part(0) else {
            return;
        };
        let ranges = segmenter.segment(&part.source, &self.locale);
        let whole = 0..part.source.len();
        if ranges.is_empty() || (ranges.len() == 1 && ranges[0] == whole) {
            return;
        }
        match unit.container.apply_segmentation(0, &ranges) {
            Ok(count) => log::debug!("{}: {} parts after segmentation", unit.id, count),
            Err(e) => {
                log::warn!("{}: segmentation skipped: {}", unit.id, e);
                self.diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::Segmentation,
                    resource_id: unit.id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
}

impl Iterator for EventStream {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.producer.next_event();
        self.diagnostics.extend(self.producer.take_diagnostics());
        match next {
            None => {
                self.done = true;
                None
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            Some(Ok(mut event)) => {
                match &mut event {
                    Event::StartDocument(sd) => self.locale = sd.locale.clone(),
                    Event::TextUnit(tu) => self.post_process(tu),
                    _ => {}
                }
                Some(Ok(event))
            }
        }
    }
}

impl std::iter::FusedIterator for EventStream {}

// ==================== Filters ====================

/// Extracts events from one document format.
pub trait Filter: Send + Sync {
    /// Name of the filter.
    fn name(&self) -> &str;

    /// MIME type of the documents it reads.
    fn mime_type(&self) -> &str;

    /// Configuration ids this filter answers to (lowercase).
    fn configuration_ids(&self) -> &[&str];

    /// Start extracting a document.
    ///
    /// Parameters are validated here, before any event is produced.
    fn open(&self, document: RawDocument, parameters: &FilterParameters) -> Result<Box<dyn EventProducer>>;
}

/// Registry of filters keyed by configuration id.
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Create a registry with the markup and plain-text filters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MarkupFilter::new()));
        registry.register(Arc::new(PlainTextFilter::new()));
        registry
    }

    /// Register a filter under all its configuration ids.
    pub fn register(&mut self, filter: Arc<dyn Filter>) {
        for id in filter.configuration_ids() {
            self.filters.insert(id.to_lowercase(), filter.clone());
        }
    }

    /// Get a filter by configuration id.
    pub fn get(&self, configuration_id: &str) -> Option<Arc<dyn Filter>> {
        self.filters.get(&configuration_id.to_lowercase()).cloned()
    }

    /// Check if a configuration id is known.
    pub fn supports(&self, configuration_id: &str) -> bool {
        self.filters.contains_key(&configuration_id.to_lowercase())
    }

    /// All known configuration ids, sorted.
    pub fn configuration_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.filters.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Open a document with the filter named by the options, or else by the
    /// document.
    pub fn open(&self, document: RawDocument, options: &ExtractOptions) -> Result<EventStream> {
        let id = options
            .filter_id
            .as_deref()
            .or(document.filter_id.as_deref())
            .ok_or_else(|| Error::UnknownFormat("no filter configuration given".into()))?;
        let filter = self.get(id).ok_or_else(|| Error::UnknownFormat(id.to_string()))?;
        log::debug!("Opening '{}' with filter '{}'", document.id, filter.name());

        let producer = filter.open(document, &options.parameters)?;
        Ok(EventStream::new(producer)
            .with_segmenter(options.segmenter.clone())
            .with_nfc(options.nfc))
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventKind, PartKind};

    fn extract(text: &str, options: ExtractOptions) -> (Vec<Event>, Vec<Diagnostic>) {
        let doc = RawDocument::new(text, LocaleId::new("en"));
        FilterRegistry::with_defaults()
            .open(doc, &options)
            .unwrap()
            .collect_with_diagnostics()
            .unwrap()
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = FilterRegistry::with_defaults();
        assert!(registry.supports("html"));
        assert!(registry.supports("PlainText"));
        assert!(!registry.supports("okf_json"));
        assert_eq!(registry.configuration_ids(), vec!["html", "markup", "plaintext", "text"]);
        assert_eq!(registry.get("HTML").unwrap().mime_type(), "text/html");
    }

    #[test]
    fn test_unknown_filter_fails_before_events() {
        let registry = FilterRegistry::with_defaults();
        let doc = RawDocument::new("x", LocaleId::new("en")).with_filter_id("okf_foo");
        let err = registry.open(doc, &ExtractOptions::new()).err().unwrap();
        assert!(matches!(err, Error::UnknownFormat(id) if id == "okf_foo"));

        let doc = RawDocument::new("x", LocaleId::new("en"));
        assert!(registry.open(doc, &ExtractOptions::new()).is_err());
    }

    #[test]
    fn test_invalid_parameter_fails_before_events() {
        let registry = FilterRegistry::with_defaults();
        let doc = RawDocument::new("x", LocaleId::new("en"));
        let options = ExtractOptions::new()
            .with_filter_id("plaintext")
            .with_parameter("paragraphs", "sometimes");
        assert!(matches!(registry.open(doc, &options), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_options_filter_id_wins() {
        let registry = FilterRegistry::with_defaults();
        let doc = RawDocument::new("<b>x</b>", LocaleId::new("en")).with_filter_id("html");
        let (events, _) = registry
            .open(doc, &ExtractOptions::new().with_filter_id("text"))
            .unwrap()
            .collect_with_diagnostics()
            .unwrap();
        let tu = events.iter().find_map(Event::as_text_unit).unwrap();
        assert!(!tu.container.full_source().unwrap().has_codes());
    }

    #[test]
    fn test_segmentation_applied() {
        let options = ExtractOptions::new()
            .with_filter_id("text")
            .with_sentence_segmentation();
        let (events, diagnostics) = extract("One. Two.", options);
        assert!(diagnostics.is_empty());
        let tu = events.iter().find_map(Event::as_text_unit).unwrap();
        let kinds: Vec<PartKind> = tu.container.parts().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PartKind::Segment, PartKind::Ignorable, PartKind::Segment]);
        assert_eq!(tu.container.segment("3").unwrap().source.text(), "Two.");
    }

    #[test]
    fn test_nfc() {
        let options = ExtractOptions::new().with_filter_id("text").with_nfc(true);
        let (events, _) = extract("Cafe\u{0301}", options);
        let tu = events.iter().find_map(Event::as_text_unit).unwrap();
        assert_eq!(tu.container.full_source().unwrap().text(), "Caf\u{00E9}");
    }

    #[test]
    fn test_stream_kinds() {
        let (events, _) = extract("Hello", ExtractOptions::new().with_filter_id("text"));
        let kinds: Vec<EventKind> = events.iter().map(Event::kind).collect();
        assert_eq!(kinds, vec![EventKind::StartDocument, EventKind::TextUnit, EventKind::EndDocument]);
    }

    #[test]
    fn test_from_bytes_keeps_format() {
        let doc = RawDocument::from_bytes(b"\xEF\xBB\xBFa\r\nb", LocaleId::new("en")).unwrap();
        assert_eq!(doc.text, "a\r\nb");
        assert!(doc.format.has_bom);
        assert_eq!(doc.format.line_break, detect::LineBreak::CrLf);
    }

    #[test]
    fn test_latin1_document() {
        let doc = RawDocument::from_bytes(b"caf\xE9", LocaleId::new("fr")).unwrap();
        assert_eq!(doc.text, "caf\u{e9}");
        assert_eq!(doc.format.encoding.name(), "windows-1252");

        let doc = RawDocument::from_bytes_with_encoding(b"\xE0 bient\xF4t", "iso-8859-1", LocaleId::new("fr")).unwrap();
        assert_eq!(doc.text, "\u{e0} bient\u{f4}t");
        assert!(RawDocument::from_bytes_with_encoding(b"x", "no-such-charset", LocaleId::new("fr")).is_err());
    }
}
