//! Skeletons and document reconstruction.
//!
//! A [`Skeleton`] holds the non-translatable bytes around the extracted
//! content, interleaved with references: to the content of its own resource,
//! to one segment of it, to a property, or to another (referent) resource.
//! [`SkeletonWriter`] walks events and resolves those references to rebuild
//! the document in a given locale.

mod encoder;
mod options;
mod sink;
mod writer;

pub use encoder::{DefaultEncoder, Encoder, EncoderContext, PropertiesEncoder, XmlEncoder};
pub use options::WriterOptions;
pub use sink::DocumentWriter;
pub use writer::SkeletonWriter;

use serde::{Deserialize, Serialize};

use crate::model::LocaleId;

/// One element of a skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkeletonPart {
    /// Literal bytes, output as is
    Text {
        /// The literal text
        text: String,
    },
    /// The whole content of the owning text unit
    Content {
        /// Locale to output; the output locale when `None`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<LocaleId>,
    },
    /// One segment of the owning text unit
    Segment {
        /// Segment id
        id: String,
        /// Locale to output; the output locale when `None`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<LocaleId>,
    },
    /// Another resource marked as referent
    Reference {
        /// Id of the referenced resource
        id: String,
    },
    /// A property of the owning resource
    Property {
        /// Property name
        name: String,
        /// Locale to output; the output locale when `None`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<LocaleId>,
    },
}

/// Frozen skeleton of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skeleton {
    parts: Vec<SkeletonPart>,
}

impl Skeleton {
    /// Skeleton holding only literal text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            parts: vec![SkeletonPart::Text { text }],
        }
    }

    /// Parts in order.
    pub fn parts(&self) -> &[SkeletonPart] {
        &self.parts
    }

    /// Check if the skeleton is empty.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Check if the skeleton refers to its own resource's content.
    pub fn has_self_reference(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, SkeletonPart::Content { .. } | SkeletonPart::Segment { .. }))
    }

    /// Ids of the referent resources used by the skeleton.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            SkeletonPart::Reference { id } => Some(id.as_str()),
            _ => None,
        })
    }

    /// Concatenated literal text.
    pub fn literal_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                SkeletonPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Incremental builder for a [`Skeleton`].
#[derive(Debug, Clone, Default)]
pub struct SkeletonBuilder {
    parts: Vec<SkeletonPart>,
}

impl SkeletonBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Add literal text. Adjacent text is merged.
    pub fn text(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SkeletonPart::Text { text: last }) => last.push_str(text),
            _ => self.parts.push(SkeletonPart::Text { text: text.to_string() }),
        }
        self
    }

    /// Add a reference to the owning resource's content.
    pub fn content(&mut self) -> &mut Self {
        self.parts.push(SkeletonPart::Content { locale: None });
        self
    }

    /// Add a reference to the owning resource's content in a fixed locale.
    pub fn content_in(&mut self, locale: LocaleId) -> &mut Self {
        self.parts.push(SkeletonPart::Content { locale: Some(locale) });
        self
    }

    /// Add a reference to one segment of the owning text unit.
    pub fn segment(&mut self, id: impl Into<String>) -> &mut Self {
        self.parts.push(SkeletonPart::Segment {
            id: id.into(),
            locale: None,
        });
        self
    }

    /// Add a reference to a referent resource.
    pub fn reference(&mut self, id: impl Into<String>) -> &mut Self {
        self.parts.push(SkeletonPart::Reference { id: id.into() });
        self
    }

    /// Add a reference to a property of the owning resource.
    pub fn property(&mut self, name: impl Into<String>) -> &mut Self {
        self.parts.push(SkeletonPart::Property {
            name: name.into(),
            locale: None,
        });
        self
    }

    /// Freeze the skeleton.
    pub fn build(self) -> Skeleton {
        Skeleton { parts: self.parts }
    }

    /// Freeze the current content and leave the builder empty.
    pub fn take(&mut self) -> Skeleton {
        Skeleton {
            parts: std::mem::take(&mut self.parts),
        }
    }
}
