//! # unmark
//!
//! Round-trip extraction of translatable text from structured documents.
//!
//! Documents are read into a locale-neutral model: text units holding coded
//! text (plain text with inline codes standing for the original markup), and
//! skeletons holding every byte around them. Translations are set on the
//! text units, and the writer rebuilds the document from the skeletons,
//! byte-identical to the input wherever nothing was translated.
//!
//! ## Quick Start
//!
//! ```
//! use unmark::extract::RawDocument;
//! use unmark::model::{Fragment, LocaleId};
//! use unmark::Unmark;
//!
//! fn main() -> unmark::Result<()> {
//!     let doc = RawDocument::new("<p>Hello <b>world</b></p>", LocaleId::new("en"));
//!     let mut result = Unmark::new().with_filter_id("html").with_target_locale("fr").extract(doc)?;
//!
//!     for unit in result.text_units_mut() {
//!         let mut target = Fragment::from_text("Bonjour ")?;
//!         let source = unit.container.full_source()?;
//!         target.append_code(source.codes()[0].clone())?;
//!         target.append_text("monde")?;
//!         target.append_code(source.codes()[1].clone())?;
//!         if let Some(part) = unit.container.part_mut(0) {
//!             part.set_target(LocaleId::new("fr"), target);
//!         }
//!     }
//!
//!     assert_eq!(result.write()?, b"<p>Bonjour <b>monde</b></p>");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Coded text**: inline markup kept as balanced codes across splits and joins
//! - **Skeletons**: exact reconstruction, with referents and properties
//! - **XLIFF 2 output**: namespace-aware, with extension data and dialects

pub mod detect;
pub mod error;
pub mod extract;
pub mod json;
pub mod model;
pub mod skeleton;
pub mod xliff;

// Re-export commonly used types
pub use detect::{InputFormat, LineBreak, TextEncoding};
pub use error::{Error, Result};
pub use extract::{
    Diagnostic, DiagnosticKind, EventStream, ExtractOptions, Filter, FilterParameters, FilterRegistry, RawDocument,
};
pub use json::JsonFormat;
pub use model::{
    Code, CodeRole, Container, Event, EventKind, Fragment, LocaleId, MissingTarget, Part, PartKind, TagType,
    TextUnit,
};
pub use skeleton::{DocumentWriter, Skeleton, SkeletonBuilder, SkeletonWriter, WriterOptions};
pub use xliff::{Flavor, XliffOptions, XliffWriter};

use std::io::Write;
use std::path::Path;

/// Extract all events of a document with the default filters.
///
/// The filter is chosen by the document's configuration id.
///
/// # Example
///
/// ```
/// use unmark::{extract, EventKind, LocaleId, RawDocument};
///
/// let doc = RawDocument::new("One\n\nTwo", LocaleId::new("en")).with_filter_id("text");
/// let events = extract(doc).unwrap();
/// assert_eq!(events.iter().filter(|e| e.kind() == EventKind::TextUnit).count(), 2);
/// ```
pub fn extract(document: RawDocument) -> Result<Vec<Event>> {
    extract_with_options(document, &ExtractOptions::default()).map(|(events, _)| events)
}

/// Extract all events and diagnostics of a document.
pub fn extract_with_options(document: RawDocument, options: &ExtractOptions) -> Result<(Vec<Event>, Vec<Diagnostic>)> {
    FilterRegistry::with_defaults()
        .open(document, options)?
        .collect_with_diagnostics()
}

/// Extract a file, choosing the filter from its extension.
///
/// # Example
///
/// ```no_run
/// use unmark::{extract_file, LocaleId};
///
/// let events = extract_file("page.html", LocaleId::new("en")).unwrap();
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P, source_locale: LocaleId) -> Result<Vec<Event>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnknownFormat(format!("{}: file has no extension", path.display())))?;
    let filter_id = match ext.to_lowercase().as_str() {
        "htm" | "html" | "xhtml" => "html",
        "txt" | "text" => "text",
        other => return Err(Error::UnknownFormat(other.to_string())),
    };
    let document = RawDocument::from_file(path, source_locale)?.with_filter_id(filter_id);
    extract(document)
}

/// Rebuild a document from its events.
pub fn write_document(events: &[Event], options: &WriterOptions) -> Result<Vec<u8>> {
    let mut writer = DocumentWriter::new(Vec::new(), options.clone());
    writer.write_all(events)?;
    writer.finish()
}

/// Extract a document and write it back unchanged.
///
/// Useful to check that a filter loses nothing: the output equals the
/// input bytes.
pub fn round_trip(document: RawDocument) -> Result<Vec<u8>> {
    let events = extract(document)?;
    write_document(&events, &WriterOptions::default())
}

/// Serialize events as an XLIFF document.
pub fn to_xliff(events: &[Event], options: XliffOptions) -> Result<String> {
    let mut writer = XliffWriter::new(Vec::new(), options);
    writer.write_all(events)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| Error::Encoding(e.to_string()))
}

/// Builder wiring extraction and writing together.
///
/// # Example
///
/// ```
/// use unmark::{LocaleId, RawDocument, Unmark};
///
/// let doc = RawDocument::new("First. Second.", LocaleId::new("en"));
/// let result = Unmark::new()
///     .with_filter_id("text")
///     .with_sentence_segmentation()
///     .extract(doc)?;
/// assert_eq!(result.text_units().next().unwrap().container.segment_count(), 2);
/// # Ok::<(), unmark::Error>(())
/// ```
pub struct Unmark {
    registry: FilterRegistry,
    extract_options: ExtractOptions,
    writer_options: WriterOptions,
    xliff_options: XliffOptions,
}

impl Unmark {
    /// Create a new builder with the default filters.
    pub fn new() -> Self {
        Self {
            registry: FilterRegistry::with_defaults(),
            extract_options: ExtractOptions::default(),
            writer_options: WriterOptions::default(),
            xliff_options: XliffOptions::default(),
        }
    }

    /// Use another filter registry.
    pub fn with_registry(mut self, registry: FilterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the filter configuration id.
    pub fn with_filter_id(mut self, id: impl Into<String>) -> Self {
        self.extract_options = self.extract_options.with_filter_id(id);
        self
    }

    /// Set a filter parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extract_options = self.extract_options.with_parameter(name, value);
        self
    }

    /// Segment text units at sentence boundaries.
    pub fn with_sentence_segmentation(mut self) -> Self {
        self.extract_options = self.extract_options.with_sentence_segmentation();
        self
    }

    /// Normalize extracted text to NFC.
    pub fn with_nfc(mut self) -> Self {
        self.extract_options = self.extract_options.with_nfc(true);
        self
    }

    /// Write translations in this locale.
    pub fn with_target_locale(mut self, locale: impl Into<LocaleId>) -> Self {
        let locale = locale.into();
        self.writer_options = self.writer_options.with_locale(locale.clone());
        self.xliff_options = self.xliff_options.with_target_locale(locale);
        self
    }

    /// Set what to write for segments without translation.
    pub fn with_missing_target(mut self, missing: MissingTarget) -> Self {
        self.writer_options = self.writer_options.with_missing_target(missing);
        self
    }

    /// Set the writer options.
    pub fn with_writer_options(mut self, options: WriterOptions) -> Self {
        self.writer_options = options;
        self
    }

    /// Set the XLIFF dialect.
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.xliff_options = self.xliff_options.with_flavor(flavor);
        self
    }

    /// Extract a document.
    pub fn extract(self, document: RawDocument) -> Result<UnmarkResult> {
        let (events, diagnostics) = self
            .registry
            .open(document, &self.extract_options)?
            .collect_with_diagnostics()?;
        Ok(UnmarkResult {
            events,
            diagnostics,
            writer_options: self.writer_options,
            xliff_options: self.xliff_options,
        })
    }

    /// Read and extract a file.
    pub fn extract_file<P: AsRef<Path>>(self, path: P, source_locale: LocaleId) -> Result<UnmarkResult> {
        let document = RawDocument::from_file(path, source_locale)?;
        self.extract(document)
    }
}

impl Default for Unmark {
    fn default() -> Self {
        Self::new()
    }
}

/// Events of an extracted document, ready to be translated and written.
#[derive(Debug)]
pub struct UnmarkResult {
    /// All events of the document
    pub events: Vec<Event>,
    /// Non-fatal anomalies found while extracting
    pub diagnostics: Vec<Diagnostic>,
    writer_options: WriterOptions,
    xliff_options: XliffOptions,
}

impl UnmarkResult {
    /// Non-referent text units.
    pub fn text_units(&self) -> impl Iterator<Item = &TextUnit> {
        self.events
            .iter()
            .filter_map(Event::as_text_unit)
            .filter(|tu| !tu.is_referent)
    }

    /// All text units, referents included, for setting translations.
    pub fn text_units_mut(&mut self) -> impl Iterator<Item = &mut TextUnit> {
        self.events.iter_mut().filter_map(Event::as_text_unit_mut)
    }

    /// Rebuild the document.
    pub fn write(&self) -> Result<Vec<u8>> {
        write_document(&self.events, &self.writer_options)
    }

    /// Rebuild the document into a sink.
    pub fn write_to<W: Write>(&self, sink: W) -> Result<W> {
        let mut writer = DocumentWriter::new(sink, self.writer_options.clone());
        writer.write_all(&self.events)?;
        writer.finish()
    }

    /// Serialize as XLIFF.
    pub fn to_xliff(&self) -> Result<String> {
        to_xliff(&self.events, self.xliff_options.clone())
    }

    /// Serialize the events as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        json::to_json(&self.events, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> LocaleId {
        LocaleId::new("en")
    }

    #[test]
    fn test_unmark_builder() {
        let unmark = Unmark::new()
            .with_filter_id("html")
            .with_parameter("inline_elements", "b")
            .with_nfc()
            .with_target_locale("de")
            .with_missing_target(MissingTarget::Empty)
            .with_flavor(Flavor::Sdl);

        assert_eq!(unmark.extract_options.filter_id.as_deref(), Some("html"));
        assert_eq!(unmark.extract_options.parameters.get("inline_elements"), Some("b"));
        assert!(unmark.extract_options.nfc);
        assert_eq!(unmark.writer_options.locale, Some(LocaleId::new("de")));
        assert_eq!(unmark.writer_options.missing_target, MissingTarget::Empty);
        assert_eq!(unmark.xliff_options.target_locale, Some(LocaleId::new("de")));
        assert_eq!(unmark.xliff_options.flavor, Flavor::Sdl);
    }

    #[test]
    fn test_round_trip() {
        let input = "<html><body>\n<h1 title=\"T\">Title</h1>\n<p>A <i>b</i> c</p>\n</body></html>\n";
        let doc = RawDocument::new(input, en()).with_filter_id("html");
        assert_eq!(round_trip(doc).unwrap(), input.as_bytes());
    }

    #[test]
    fn test_unknown_filter() {
        let doc = RawDocument::new("x", en()).with_filter_id("okf_doc");
        assert!(matches!(extract(doc), Err(Error::UnknownFormat(_))));
    }

    #[test]
    fn test_missing_target_policy() {
        let doc = RawDocument::new("<p>Hi</p>", en());
        let result = Unmark::new()
            .with_filter_id("html")
            .with_target_locale("fr")
            .with_missing_target(MissingTarget::Empty)
            .extract(doc)
            .unwrap();
        assert_eq!(result.write().unwrap(), b"<p></p>");
    }

    #[test]
    fn test_extract_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "\u{FEFF}Alpha\r\n\r\nBeta").unwrap();

        let events = extract_file(&path, en()).unwrap();
        let Some(Event::StartDocument(sd)) = events.first() else {
            panic!("expected start document");
        };
        assert!(sd.has_bom);
        assert_eq!(sd.line_break, LineBreak::CrLf);
        assert_eq!(sd.name.as_deref(), Some("notes.txt"));

        let bytes = write_document(&events, &WriterOptions::default()).unwrap();
        assert_eq!(bytes, std::fs::read(&path).unwrap());

        let other = dir.path().join("data.bin");
        std::fs::write(&other, "x").unwrap();
        assert!(matches!(extract_file(&other, en()), Err(Error::UnknownFormat(_))));
    }

    #[test]
    fn test_result_to_xliff_and_json() {
        let doc = RawDocument::new("Hello", en());
        let result = Unmark::new().with_filter_id("text").extract(doc).unwrap();
        assert_eq!(result.text_units().count(), 1);

        let xliff = result.to_xliff().unwrap();
        assert!(xliff.contains("<source>Hello</source>"));

        let json = result.to_json(JsonFormat::Compact).unwrap();
        assert_eq!(json::from_json(&json).unwrap(), result.events);
    }
}
