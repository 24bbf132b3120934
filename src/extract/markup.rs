//! Minimal HTML-like markup filter.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::builder::EventBuilder;
use super::tokenizer::{SimpleMarkupTokenizer, TagKind, Token, Tokenizer};
use super::{Diagnostic, DiagnosticKind, EventProducer, Filter, FilterParameters, RawDocument};
use crate::error::Result;
use crate::model::{Event, Fragment, REF_MARKER_START};

const MIME_TYPE: &str = "text/html";

const DEFAULT_INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "em", "font", "i", "img", "kbd", "mark", "q", "s",
    "samp", "small", "span", "strong", "sub", "sup", "u", "var",
];
const DEFAULT_EXCLUDED: &[&str] = &["script", "style"];
const DEFAULT_ATTRIBUTES: &[&str] = &["alt", "title"];

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s([A-Za-z_:][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern is valid")
});

/// Extracts the text of HTML-like markup.
///
/// Inline elements become codes of the surrounding text; any other element
/// ends the current text unit and goes to the skeleton. Values of
/// translatable attributes are extracted as referent text units.
///
/// Parameters (comma-separated lists):
/// - `inline_elements`
/// - `exclude_elements`: content kept verbatim in the skeleton
/// - `translatable_attributes`
#[derive(Clone)]
pub struct MarkupFilter {
    tokenizer: Arc<dyn Tokenizer>,
}

impl std::fmt::Debug for MarkupFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupFilter").finish_non_exhaustive()
    }
}

impl Default for MarkupFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupFilter {
    /// Create a markup filter with the built-in tokenizer.
    pub fn new() -> Self {
        Self {
            tokenizer: Arc::new(SimpleMarkupTokenizer::new()),
        }
    }

    /// Use another tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Arc::new(tokenizer);
        self
    }
}

impl Filter for MarkupFilter {
    fn name(&self) -> &str {
        "markup"
    }

    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn configuration_ids(&self) -> &[&str] {
        &["markup", "html"]
    }

    fn open(&self, document: RawDocument, parameters: &FilterParameters) -> Result<Box<dyn EventProducer>> {
        let config = MarkupConfig {
            inline: parameters.get_list("inline_elements", DEFAULT_INLINE),
            excluded: parameters.get_list("exclude_elements", DEFAULT_EXCLUDED),
            attributes: parameters.get_list("translatable_attributes", DEFAULT_ATTRIBUTES),
        };
        let tokens = self.tokenizer.tokenize(&document.text);
        log::debug!("{}: {} markup tokens", document.id, tokens.len());

        let mut builder = EventBuilder::new(MIME_TYPE);
        builder.start_document(&document, self.name());
        Ok(Box::new(MarkupProducer {
            tokens: tokens.into_iter(),
            builder,
            config,
            fragment: Fragment::new(),
            excluded: None,
            done: false,
        }))
    }
}

#[derive(Debug)]
struct MarkupConfig {
    inline: Vec<String>,
    excluded: Vec<String>,
    attributes: Vec<String>,
}

impl MarkupConfig {
    fn is_inline(&self, name: &str) -> bool {
        self.inline.iter().any(|n| n == name)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|n| n == name)
    }
}

/// A tag split around its translatable attribute values.
enum TagPiece {
    Text(String),
    Referent(String),
}

struct MarkupProducer {
    tokens: std::vec::IntoIter<Token>,
    builder: EventBuilder,
    config: MarkupConfig,
    fragment: Fragment,
    excluded: Option<String>,
    done: bool,
}

impl MarkupProducer {
    fn flush(&mut self) {
        let fragment = std::mem::take(&mut self.fragment);
        if !fragment.is_empty() {
            self.builder.add_content(fragment);
        }
    }

    /// Split a tag so that translatable attribute values become referents.
    fn split_tag(&mut self, data: &str) -> Result<Vec<TagPiece>> {
        let mut pieces = Vec::new();
        let mut last = 0;
        for caps in ATTRIBUTE.captures_iter(data) {
            let Some(name) = caps.get(1) else {
                continue;
            };
            if !self.config.attributes.contains(&name.as_str().to_ascii_lowercase()) {
                continue;
            }
            let Some(value) = caps.get(2).or_else(|| caps.get(3)) else {
                continue;
            };
            if value.as_str().trim().is_empty() {
                continue;
            }
            pieces.push(TagPiece::Text(data[last..value.start()].to_string()));
            pieces.push(TagPiece::Referent(self.builder.add_referent(value.as_str())?));
            last = value.end();
        }
        pieces.push(TagPiece::Text(data[last..].to_string()));
        Ok(pieces)
    }

    fn inline_tag(&mut self, kind: TagKind, name: String, data: &str) -> Result<()> {
        let data: String = self
            .split_tag(data)?
            .into_iter()
            .map(|piece| match piece {
                TagPiece::Text(text) => text,
                TagPiece::Referent(id) => format!("{}{}]", REF_MARKER_START, id),
            })
            .collect();
        match kind {
            TagKind::Start => self.fragment.append_opening(name, data)?,
            TagKind::End => self.fragment.append_closing(name, data)?,
            TagKind::Empty => self.fragment.append_placeholder(name, data)?,
        };
        Ok(())
    }

    fn structural_tag(&mut self, data: &str) -> Result<()> {
        self.flush();
        for piece in self.split_tag(data)? {
            match piece {
                TagPiece::Text(text) => {
                    self.builder.skeleton().text(&text);
                }
                TagPiece::Referent(id) => {
                    self.builder.skeleton().reference(id);
                }
            }
        }
        Ok(())
    }

    fn step(&mut self, token: Token) -> Result<()> {
        if let Some(excluded) = &self.excluded {
            let closes = matches!(&token, Token::Tag { kind: TagKind::End, name, .. } if name == excluded);
            self.builder.skeleton().text(token.raw());
            if closes {
                self.excluded = None;
            }
            return Ok(());
        }

        match token {
            Token::Text(text) => self.fragment.append_text(&text)?,
            Token::Other(raw) => {
                if self.fragment.is_empty() {
                    self.builder.skeleton().text(&raw);
                } else {
                    self.fragment.append_placeholder("x-other", raw)?;
                }
            }
            Token::Tag { kind, name, data } => {
                if self.config.is_excluded(&name) && kind == TagKind::Start {
                    self.flush();
                    self.builder.skeleton().text(&data);
                    self.excluded = Some(name);
                } else if self.config.is_inline(&name) {
                    self.inline_tag(kind, name, &data)?;
                } else {
                    self.structural_tag(&data)?;
                }
            }
        }
        Ok(())
    }
}

impl EventProducer for MarkupProducer {
    fn next_event(&mut self) -> Option<Result<Event>> {
        loop {
            if let Some(event) = self.builder.pop() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            match self.tokens.next() {
                Some(token) => {
                    if let Err(e) = self.step(token) {
                        self.builder.diagnose(DiagnosticKind::Other, "markup", e.to_string());
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                None => {
                    self.flush();
                    self.builder.end_document();
                    self.done = true;
                }
            }
        }
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.builder.take_diagnostics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodeRole, EventKind, LocaleId, TagType};
    use crate::skeleton::{SkeletonWriter, WriterOptions};

    fn events(text: &str, parameters: &FilterParameters) -> Vec<Event> {
        let doc = RawDocument::new(text, LocaleId::new("en"));
        let mut producer = MarkupFilter::new().open(doc, parameters).unwrap();
        std::iter::from_fn(|| producer.next_event()).map(|e| e.unwrap()).collect()
    }

    fn rewrite(events: &[Event]) -> String {
        SkeletonWriter::new(WriterOptions::default()).write_events(events).unwrap()
    }

    #[test]
    fn test_inline_codes() {
        let input = "<html><body>\n<p>Hello <b>bold</b> world</p>\n</body></html>";
        let events = events(input, &FilterParameters::new());
        let units: Vec<_> = events.iter().filter_map(Event::as_text_unit).collect();
        assert_eq!(units.len(), 1);

        let source = units[0].container.full_source().unwrap();
        assert_eq!(source.text(), "Hello bold world");
        let codes = source.codes();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].tag_type(), TagType::Opening);
        assert_eq!(codes[1].tag_type(), TagType::Closing);
        assert_eq!(codes[0].id(), codes[1].id());
        assert_eq!(rewrite(&events), input);
    }

    #[test]
    fn test_no_translatable_content() {
        let input = "<html>\n  <body><br/></body>\n</html>\n";
        let events = events(input, &FilterParameters::new());
        assert!(events.iter().all(|e| e.kind() != EventKind::TextUnit));
        assert_eq!(rewrite(&events), input);
    }

    #[test]
    fn test_excluded_element() {
        let input = "<p>Hi</p><script>var s = \"<b>x</b>\";</script><p>There</p>";
        let events = events(input, &FilterParameters::new());
        let texts: Vec<String> = events
            .iter()
            .filter_map(Event::as_text_unit)
            .map(|tu| tu.container.full_source().unwrap().text())
            .collect();
        assert_eq!(texts, vec!["Hi", "There"]);
        assert_eq!(rewrite(&events), input);
    }

    #[test]
    fn test_attribute_referents() {
        let input = "<p title=\"Tip\">See <img src=\"a.png\" alt=\"A cat\"> here</p>";
        let events = events(input, &FilterParameters::new());
        let referents: Vec<String> = events
            .iter()
            .filter_map(Event::as_text_unit)
            .filter(|tu| tu.is_referent)
            .map(|tu| tu.container.full_source().unwrap().text())
            .collect();
        assert_eq!(referents, vec!["Tip", "A cat"]);

        let content = events
            .iter()
            .filter_map(Event::as_text_unit)
            .find(|tu| !tu.is_referent)
            .unwrap();
        let source = content.container.full_source().unwrap();
        assert_eq!(source.codes()[0].data, "<img src=\"a.png\" alt=\"[#$tu2]\">");
        assert_eq!(rewrite(&events), input);
    }

    #[test]
    fn test_unbalanced_inline_is_demoted() {
        let input = "<p>a</i>b</p>";
        let doc = RawDocument::new(input, LocaleId::new("en"));
        let mut producer = MarkupFilter::new().open(doc, &FilterParameters::new()).unwrap();
        let events: Vec<Event> = std::iter::from_fn(|| producer.next_event()).map(|e| e.unwrap()).collect();
        let diagnostics = producer.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DemotedCode);

        let tu = events.iter().find_map(Event::as_text_unit).unwrap();
        let source = tu.container.full_source().unwrap();
        let code = &source.codes()[0];
        assert_eq!(code.role(), CodeRole::Closing);
        assert_eq!(code.tag_type(), TagType::Placeholder);
        assert_eq!(rewrite(&events), input);
    }

    #[test]
    fn test_custom_inline_elements() {
        let params = FilterParameters::new().with("inline_elements", "b");
        let events = events("<p>a <span>b</span></p>", &params);
        let texts: Vec<String> = events
            .iter()
            .filter_map(Event::as_text_unit)
            .map(|tu| tu.container.full_source().unwrap().text())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
