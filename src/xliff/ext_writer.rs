//! Output of extension attributes and elements.

use super::ns::NsStack;
use super::to_xml;
use crate::detect::LineBreak;
use crate::model::{ExtAttributes, ExtChild, ExtElement};

/// Writes extension data with the namespace declarations it needs.
///
/// Namespaces not in scope are declared on the outermost extension element,
/// with the preferred prefix of the data or an invented one. An element in
/// no namespace is written unqualified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionsWriter {
    line_break: LineBreak,
}

impl ExtensionsWriter {
    /// Create a writer using `line_break` in text content.
    pub fn new(line_break: LineBreak) -> Self {
        Self { line_break }
    }

    /// Attribute text for the start tag of the current element.
    ///
    /// The element's namespace context must already be pushed.
    pub fn attributes(&self, ns: &mut NsStack, attributes: &ExtAttributes) -> String {
        let mut out = String::new();
        for attr in attributes.iter() {
            let name = if attr.namespace.is_empty() {
                attr.name.clone()
            } else {
                let (prefix, declaration) = ns.ensure_prefixed(&attr.namespace, attr.prefix.as_deref());
                if let Some(declaration) = declaration {
                    out.push_str(&declaration);
                }
                format!("{}:{}", prefix, attr.name)
            };
            out.push_str(&format!(" {}=\"{}\"", name, to_xml(&attr.value, true)));
        }
        out
    }

    /// Elements, each followed by a line break.
    pub fn elements(&self, ns: &mut NsStack, elements: &[ExtElement]) -> String {
        let mut out = String::new();
        for element in elements {
            self.element(ns, element, &mut out);
            out.push_str(self.line_break.as_str());
        }
        out
    }

    /// One element and its descendants.
    ///
    /// Every namespace the subtree uses that is not in scope yet is declared
    /// on this element, so its descendants declare none.
    pub fn element(&self, ns: &mut NsStack, element: &ExtElement, out: &mut String) {
        ns.push();
        let mut used = Vec::new();
        gather_namespaces(element, &mut used);
        let mut declarations = String::new();
        for (uri, preferred, attribute) in used {
            let (_, declaration) = if attribute {
                ns.ensure_prefixed(uri, preferred)
            } else {
                ns.ensure(uri, preferred)
            };
            declarations.push_str(&declaration.unwrap_or_default());
        }
        self.write(ns, element, declarations, out);
        ns.pop();
    }

    fn write(&self, ns: &mut NsStack, element: &ExtElement, mut declarations: String, out: &mut String) {
        // Only an element in no namespace can still need a declaration here
        let (prefix, declaration) = ns.ensure(&element.namespace, element.prefix.as_deref());
        declarations.push_str(&declaration.unwrap_or_default());
        let qname = if prefix.is_empty() {
            element.name.clone()
        } else {
            format!("{}:{}", prefix, element.name)
        };

        out.push('<');
        out.push_str(&qname);
        out.push_str(&declarations);
        for (name, value) in &element.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, to_xml(value, true)));
        }
        out.push_str(&self.attributes(ns, &element.ext_attributes));

        if element.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        let lb = self.line_break.as_str();
        for child in &element.children {
            match child {
                ExtChild::Element(e) => {
                    ns.push();
                    self.write(ns, e, String::new(), out);
                    ns.pop();
                }
                ExtChild::Text(text) => out.push_str(&to_xml(&text.replace('\n', lb), false)),
                ExtChild::Cdata(text) => {
                    let text = text.replace('\n', lb).replace("]]>", "]]]]><![CDATA[>");
                    out.push_str(&format!("<![CDATA[{}]]>", text));
                }
                ExtChild::ProcessingInstruction { target, data } if data.is_empty() => {
                    out.push_str(&format!("<?{}?>", target))
                }
                ExtChild::ProcessingInstruction { target, data } => {
                    out.push_str(&format!("<?{} {}?>", target, data.replace('\n', lb)))
                }
            }
        }
        out.push_str(&format!("</{}>", qname));
    }
}

/// Namespaces of an element subtree in document order, with the preferred
/// prefix and whether the use is an attribute.
fn gather_namespaces<'e>(element: &'e ExtElement, used: &mut Vec<(&'e str, Option<&'e str>, bool)>) {
    let mut add = |uri: &'e str, prefix: Option<&'e str>, attribute: bool| {
        if !uri.is_empty() && !used.iter().any(|&(u, _, a)| u == uri && a == attribute) {
            used.push((uri, prefix, attribute));
        }
    };
    add(element.namespace.as_str(), element.prefix.as_deref(), false);
    for attr in element.ext_attributes.iter() {
        add(attr.namespace.as_str(), attr.prefix.as_deref(), true);
    }
    for child in element.child_elements() {
        gather_namespaces(child, used);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS_CORE: &str = "urn:oasis:names:tc:xliff:document:2.0";

    #[test]
    fn test_nested_same_namespace() {
        let mut ns = NsStack::new(NS_CORE);
        let inner = ExtElement::new("urn:a", "item").with_text("1 < 2");
        let outer = ExtElement::new("urn:a", "list").with_prefix("a").with_child(inner);
        let out = ExtensionsWriter::default().elements(&mut ns, &[outer]);
        assert_eq!(out, "<a:list xmlns:a=\"urn:a\"><a:item>1 &lt; 2</a:item></a:list>\n");
    }

    #[test]
    fn test_attributes_declare_once() {
        let mut ns = NsStack::new(NS_CORE);
        ns.push();
        let mut attrs = ExtAttributes::new();
        attrs.set_with_prefix("urn:b", "one", "1", Some("b"));
        attrs.set("urn:b", "two", "\"2\"");
        attrs.set("", "plain", "3");
        let out = ExtensionsWriter::default().attributes(&mut ns, &attrs);
        assert_eq!(out, " xmlns:b=\"urn:b\" b:one=\"1\" b:two=\"&quot;2&quot;\" plain=\"3\"");
    }

    #[test]
    fn test_subtree_namespaces_on_outer_element() {
        let mut ns = NsStack::new(NS_CORE);
        let middle = ExtElement::new("urn:a", "middle")
            .with_child(ExtElement::new("urn:b", "leaf"))
            .with_child(ExtElement::new("urn:b", "sibling"));
        let outer = ExtElement::new("urn:a", "outer").with_prefix("a").with_child(middle);
        let out = ExtensionsWriter::default().elements(&mut ns, &[outer]);
        assert_eq!(
            out,
            "<a:outer xmlns:a=\"urn:a\" xmlns:x1=\"urn:b\"><a:middle><x1:leaf/><x1:sibling/></a:middle></a:outer>\n"
        );
    }

    #[test]
    fn test_cdata_and_processing_instruction() {
        let mut ns = NsStack::new(NS_CORE);
        let mut out = String::new();
        let element = ExtElement::new("urn:a", "code")
            .with_prefix("a")
            .with_cdata("x < y ]]> z")
            .with_processing_instruction("render", "mode=\"fast\"")
            .with_processing_instruction("flush", "");
        ExtensionsWriter::default().element(&mut ns, &element, &mut out);
        assert_eq!(
            out,
            "<a:code xmlns:a=\"urn:a\"><![CDATA[x < y ]]]]><![CDATA[> z]]><?render mode=\"fast\"?><?flush?></a:code>"
        );
    }

    #[test]
    fn test_no_namespace_element() {
        let mut ns = NsStack::new(NS_CORE);
        let mut out = String::new();
        let element = ExtElement::new("", "plain").with_child(ExtElement::new("", "inner"));
        ExtensionsWriter::default().element(&mut ns, &element, &mut out);
        assert_eq!(out, "<plain xmlns=\"\"><inner/></plain>");

        // Already out of the default namespace: nothing to undeclare
        let mut ns = NsStack::new("");
        let mut out = String::new();
        ExtensionsWriter::default().element(&mut ns, &ExtElement::new("", "plain"), &mut out);
        assert_eq!(out, "<plain/>");
    }

    #[test]
    fn test_unprefixed_foreign_element() {
        let mut ns = NsStack::new(NS_CORE);
        let mut out = String::new();
        ExtensionsWriter::default().element(&mut ns, &ExtElement::new("urn:c", "x"), &mut out);
        assert_eq!(out, "<x1:x xmlns:x1=\"urn:c\"/>");
        // Back out of scope after the element closed
        assert!(!ns.current().is_in_scope("urn:c"));
    }
}
