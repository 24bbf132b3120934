//! Third-party extension data carried through the model.
//!
//! Extension attributes and elements belong to namespaces the model does not
//! know about. They are kept as plain trees and written back by the XLIFF
//! writer with the namespace declarations they need.

use serde::{Deserialize, Serialize};

/// One namespaced attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtAttribute {
    /// Namespace URI
    pub namespace: String,
    /// Local name
    pub name: String,
    /// Attribute value
    pub value: String,
    /// Preferred prefix when the namespace must be declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Ordered set of extension attributes, unique by namespace and name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtAttributes(Vec<ExtAttribute>);

impl ExtAttributes {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing the value of an existing one.
    pub fn set(&mut self, namespace: &str, name: &str, value: impl Into<String>) {
        self.set_with_prefix(namespace, name, value, None);
    }

    /// Set an attribute with a preferred prefix.
    pub fn set_with_prefix(&mut self, namespace: &str, name: &str, value: impl Into<String>, prefix: Option<&str>) {
        let value = value.into();
        match self.0.iter_mut().find(|a| a.namespace == namespace && a.name == name) {
            Some(existing) => {
                existing.value = value;
                if prefix.is_some() {
                    existing.prefix = prefix.map(str::to_string);
                }
            }
            None => self.0.push(ExtAttribute {
                namespace: namespace.to_string(),
                name: name.to_string(),
                value,
                prefix: prefix.map(str::to_string),
            }),
        }
    }

    /// Value of an attribute.
    pub fn get(&self, namespace: &str, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.namespace == namespace && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Remove an attribute.
    pub fn remove(&mut self, namespace: &str, name: &str) -> Option<ExtAttribute> {
        let pos = self.0.iter().position(|a| a.namespace == namespace && a.name == name)?;
        Some(self.0.remove(pos))
    }

    /// Iterate over the attributes.
    pub fn iter(&self) -> impl Iterator<Item = &ExtAttribute> {
        self.0.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there is no attribute.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Child node of an extension element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtChild {
    /// Nested element
    Element(ExtElement),
    /// Character data
    Text(String),
    /// Character data written as a CDATA section
    Cdata(String),
    /// Processing instruction
    #[serde(rename = "pi")]
    ProcessingInstruction {
        /// PI target
        target: String,
        /// Everything after the target
        #[serde(default, skip_serializing_if = "String::is_empty")]
        data: String,
    },
}

/// An element from a foreign namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtElement {
    /// Namespace URI
    pub namespace: String,
    /// Local name
    pub name: String,
    /// Preferred prefix when the namespace must be declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Attributes in no namespace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    /// Namespaced attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,
    /// Child nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExtChild>,
}

impl ExtElement {
    /// Create an empty element.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            prefix: None,
            attributes: Vec::new(),
            ext_attributes: ExtAttributes::new(),
            children: Vec::new(),
        }
    }

    /// Set the preferred prefix (builder style).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add an attribute in no namespace (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Add a child element (builder style).
    pub fn with_child(mut self, child: ExtElement) -> Self {
        self.children.push(ExtChild::Element(child));
        self
    }

    /// Add character data (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(ExtChild::Text(text.into()));
        self
    }

    /// Add a CDATA section (builder style).
    pub fn with_cdata(mut self, text: impl Into<String>) -> Self {
        self.children.push(ExtChild::Cdata(text.into()));
        self
    }

    /// Add a processing instruction (builder style).
    pub fn with_processing_instruction(mut self, target: impl Into<String>, data: impl Into<String>) -> Self {
        self.children.push(ExtChild::ProcessingInstruction {
            target: target.into(),
            data: data.into(),
        });
        self
    }

    /// Iterate over the child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &ExtElement> {
        self.children.iter().filter_map(|c| match c {
            ExtChild::Element(e) => Some(e),
            _ => None,
        })
    }
}
