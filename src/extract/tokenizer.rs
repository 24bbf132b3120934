//! Markup tokenization.

use std::sync::LazyLock;

use regex::Regex;

/// Kind of a tag token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `<name ...>`
    Start,
    /// `</name>`
    End,
    /// `<name .../>` or a void element
    Empty,
}

/// One token of markup input. Every token keeps its raw text, so the
/// concatenation of all tokens is the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Character data
    Text(String),
    /// An element tag
    Tag {
        /// Start, end or empty
        kind: TagKind,
        /// Lowercased element name
        name: String,
        /// Raw tag text
        data: String,
    },
    /// Comment, processing instruction, CDATA section or declaration
    Other(String),
}

impl Token {
    /// Raw text of the token.
    pub fn raw(&self) -> &str {
        match self {
            Token::Text(text) | Token::Other(text) => text,
            Token::Tag { data, .. } => data,
        }
    }
}

/// Splits input into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the whole input.
    fn tokenize(&self, input: &str) -> Vec<Token>;
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

static MARKUP_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<[!?][^>]*>|</\s*([A-Za-z][\w:.-]*)\s*>|<([A-Za-z][\w:.-]*)(?:\s(?:[^>"']|"[^"]*"|'[^']*')*?)?\s*(/?)>"#,
    )
    .expect("markup token pattern is valid")
});

/// Regex-based tokenizer for HTML-like markup.
///
/// It does not build a tree and does not decode entities: text keeps its
/// escapes as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleMarkupTokenizer;

impl SimpleMarkupTokenizer {
    /// Create a tokenizer.
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for SimpleMarkupTokenizer {
    fn tokenize(&self, input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut last = 0;
        for caps in MARKUP_TOKEN.captures_iter(input) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                tokens.push(Token::Text(input[last..whole.start()].to_string()));
            }
            let data = whole.as_str().to_string();
            let token = if let Some(name) = caps.get(1) {
                Token::Tag {
                    kind: TagKind::End,
                    name: name.as_str().to_ascii_lowercase(),
                    data,
                }
            } else if let Some(name) = caps.get(2) {
                let name = name.as_str().to_ascii_lowercase();
                let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
                let kind = if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                    TagKind::Empty
                } else {
                    TagKind::Start
                };
                Token::Tag { kind, name, data }
            } else {
                Token::Other(data)
            };
            tokens.push(token);
            last = whole.end();
        }
        if last < input.len() {
            tokens.push(Token::Text(input[last..].to_string()));
        }
        tokens
    }
}
