//! Plain-text filter.

use std::sync::LazyLock;

use regex::Regex;

use super::builder::EventBuilder;
use super::{Diagnostic, EventProducer, Filter, FilterParameters, RawDocument};
use crate::error::Result;
use crate::model::{Event, Fragment};

const MIME_TYPE: &str = "text/plain";

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r\n|\r|\n)(?:[ \t]*(?:\r\n|\r|\n))+").expect("paragraph pattern is valid"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("line pattern is valid"));

/// Extracts paragraphs (or lines) of plain text.
///
/// Parameters:
/// - `paragraphs` (default `true`): a text unit per block of lines separated
///   by blank lines; with `false`, a text unit per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFilter;

impl PlainTextFilter {
    /// Create a plain-text filter.
    pub fn new() -> Self {
        Self
    }
}

impl Filter for PlainTextFilter {
    fn name(&self) -> &str {
        "plaintext"
    }

    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn configuration_ids(&self) -> &[&str] {
        &["plaintext", "text"]
    }

    fn open(&self, document: RawDocument, parameters: &FilterParameters) -> Result<Box<dyn EventProducer>> {
        let paragraphs = parameters.get_bool("paragraphs", true)?;
        let separator = if paragraphs { &*PARAGRAPH_BREAK } else { &*LINE_BREAK };

        let mut blocks = Vec::new();
        let mut last = 0;
        for m in separator.find_iter(&document.text) {
            blocks.push(Block::Content(document.text[last..m.start()].to_string()));
            blocks.push(Block::Separator(m.as_str().to_string()));
            last = m.end();
        }
        blocks.push(Block::Content(document.text[last..].to_string()));

        let mut builder = EventBuilder::new(MIME_TYPE);
        builder.start_document(&document, self.name());
        Ok(Box::new(PlainTextProducer {
            blocks: blocks.into_iter(),
            builder,
            done: false,
        }))
    }
}

enum Block {
    Content(String),
    Separator(String),
}

struct PlainTextProducer {
    blocks: std::vec::IntoIter<Block>,
    builder: EventBuilder,
    done: bool,
}

impl EventProducer for PlainTextProducer {
    fn next_event(&mut self) -> Option<Result<Event>> {
        loop {
            if let Some(event) = self.builder.pop() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            match self.blocks.next() {
                Some(Block::Content(text)) => match Fragment::from_text(text) {
                    Ok(fragment) => self.builder.add_content(fragment),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Some(Block::Separator(text)) => {
                    self.builder.skeleton().text(&text);
                }
                None => {
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
