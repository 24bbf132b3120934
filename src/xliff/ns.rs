//! Namespace scoping for XML output.

use std::collections::BTreeMap;

/// The namespace bound to the `xml` prefix.
pub const NS_XML: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix-to-URI bindings in scope at one element.
///
/// The empty prefix is the default namespace. `xml` is always bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsContext {
    bindings: BTreeMap<String, String>,
}

impl Default for NsContext {
    fn default() -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert("xml".to_string(), NS_XML.to_string());
        Self { bindings }
    }
}

impl NsContext {
    /// Create a context with only the predefined bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a default namespace.
    pub fn with_default(uri: impl Into<String>) -> Self {
        let mut ctx = Self::default();
        ctx.bindings.insert(String::new(), uri.into());
        ctx
    }

    /// Bind a prefix, replacing any previous binding of that prefix.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.bindings.insert(prefix.into(), uri.into());
    }

    /// URI bound to a prefix.
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// A prefix bound to `uri`, the default (empty) prefix first.
    pub fn prefix(&self, uri: &str) -> Option<&str> {
        if self.uri("") == Some(uri) {
            return Some("");
        }
        self.prefixed(uri)
    }

    /// A non-empty prefix bound to `uri`.
    pub fn prefixed(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, u)| !p.is_empty() && u.as_str() == uri)
            .map(|(p, _)| p.as_str())
    }

    /// Check if `prefix` is bound to exactly `uri`.
    pub fn has_pair(&self, prefix: &str, uri: &str) -> bool {
        self.uri(prefix) == Some(uri)
    }

    /// Check if `uri` is bound to some prefix.
    pub fn is_in_scope(&self, uri: &str) -> bool {
        self.prefix(uri).is_some()
    }
}

/// One [`NsContext`] per open element.
///
/// [`push`](Self::push) clones the parent's context, so bindings added on an
/// element disappear when it is popped. Prefixes invented for namespaces
/// without a preferred prefix (`x1`, `x2`, ...) are unique per stack.
#[derive(Debug, Clone)]
pub struct NsStack {
    stack: Vec<NsContext>,
    invented: usize,
}

impl NsStack {
    /// Create a stack whose root context has `default_uri` as default namespace.
    pub fn new(default_uri: &str) -> Self {
        Self {
            stack: vec![NsContext::with_default(default_uri)],
            invented: 0,
        }
    }

    /// Open an element.
    pub fn push(&mut self) {
        let top = self.current().clone();
        self.stack.push(top);
    }

    /// Close an element. The root context is never popped.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Context of the innermost element.
    pub fn current(&self) -> &NsContext {
        // The root context is never removed.
        &self.stack[self.stack.len() - 1]
    }

    /// Context of the innermost element, mutable.
    pub fn current_mut(&mut self) -> &mut NsContext {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Resolve the prefix of an element in `uri`, declaring it on the
    /// current element if it is not in scope.
    ///
    /// Returns the prefix (empty for the default namespace) and, when a
    /// declaration is needed, the ` xmlns:p="uri"` text to write in the
    /// current start tag.
    ///
    /// An empty `uri` is no namespace: the element is unprefixed and a
    /// non-empty default namespace is undeclared with `xmlns=""`.
    pub fn ensure(&mut self, uri: &str, preferred: Option<&str>) -> (String, Option<String>) {
        if uri.is_empty() {
            if self.current().uri("").map_or(true, str::is_empty) {
                return (String::new(), None);
            }
            self.current_mut().bind("", "");
            return (String::new(), Some(" xmlns=\"\"".to_string()));
        }
        if let Some(prefix) = self.current().prefix(uri) {
            return (prefix.to_string(), None);
        }
        self.declare(uri, preferred)
    }

    /// Like [`ensure`](Self::ensure) for an attribute, which needs a
    /// non-empty prefix to be in a namespace.
    pub fn ensure_prefixed(&mut self, uri: &str, preferred: Option<&str>) -> (String, Option<String>) {
        if let Some(prefix) = self.current().prefixed(uri) {
            return (prefix.to_string(), None);
        }
        self.declare(uri, preferred)
    }

    fn declare(&mut self, uri: &str, preferred: Option<&str>) -> (String, Option<String>) {
        let prefix = match preferred {
            Some(p) if !p.is_empty() && self.current().uri(p).is_none() => p.to_string(),
            _ => self.invent_prefix(),
        };
        self.current_mut().bind(prefix.clone(), uri);
        let declaration = format!(" xmlns:{}=\"{}\"", prefix, super::to_xml(uri, true));
        (prefix, Some(declaration))
    }

    fn invent_prefix(&mut self) -> String {
        loop {
            self.invented += 1;
            let candidate = format!("x{}", self.invented);
            if self.current().uri(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
