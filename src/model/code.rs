//! Inline codes.

use serde::{Deserialize, Serialize};

use super::annotation::Annotations;

/// Start of a referent marker inside code data (`[#$id]`).
pub const REF_MARKER_START: &str = "[#$";

/// Effective type of a code inside its fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    /// Opening half of a pair whose closing half is in the same fragment
    Opening,
    /// Closing half of a pair whose opening half is in the same fragment
    Closing,
    /// Half of a pair declared as isolated by the extractor; never paired
    Isolated,
    /// Standalone code, or a paired code whose partner is out of scope
    Placeholder,
}

impl TagType {
    /// Check if this is one half of a matched pair.
    pub fn is_paired(self) -> bool {
        matches!(self, TagType::Opening | TagType::Closing)
    }
}

/// Role a code has in the original markup. Never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeRole {
    /// Starts a span (e.g. `<b>`)
    Opening,
    /// Ends a span (e.g. `</b>`)
    Closing,
    /// Stands alone (e.g. `<br/>`)
    Standalone,
}

/// One inline, non-text markup unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    id: i32,

    tag_type: TagType,

    role: CodeRole,

    /// Category label (e.g. "bold", "link", "x-fmt")
    pub category: String,

    /// Original markup
    pub data: String,

    /// Markup surrounding the code in some formats (e.g. a wrapping element)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_data: Option<String>,

    /// Short text to show to translators instead of the markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,

    /// Identifier the code had in the source format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,

    /// Translators may delete the code
    #[serde(default)]
    pub deleteable: bool,

    /// Translators may duplicate the code
    #[serde(default)]
    pub cloneable: bool,

    /// The code was added in the target
    #[serde(default)]
    pub added: bool,

    /// Metadata attached to this marker
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) split_hint: Option<i32>,
}

impl Code {
    /// Create a code with an explicit role.
    pub fn new(role: CodeRole, category: impl Into<String>, data: impl Into<String>) -> Self {
        let tag_type = match role {
            CodeRole::Opening => TagType::Opening,
            CodeRole::Closing => TagType::Closing,
            CodeRole::Standalone => TagType::Placeholder,
        };
        Self {
            id: 0,
            tag_type,
            role,
            category: category.into(),
            data: data.into(),
            outer_data: None,
            display_text: None,
            original_id: None,
            deleteable: false,
            cloneable: false,
            added: false,
            annotations: Annotations::default(),
            split_hint: None,
        }
    }

    /// Create an opening code.
    pub fn opening(category: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(CodeRole::Opening, category, data)
    }

    /// Create a closing code.
    pub fn closing(category: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(CodeRole::Closing, category, data)
    }

    /// Create a standalone placeholder code.
    pub fn placeholder(category: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(CodeRole::Standalone, category, data)
    }

    /// Create one half of a pair that the source format declares isolated.
    pub fn isolated(role: CodeRole, category: impl Into<String>, data: impl Into<String>) -> Self {
        let mut code = Self::new(role, category, data);
        if role != CodeRole::Standalone {
            code.tag_type = TagType::Isolated;
        }
        code
    }

    /// Set the original identifier (builder style).
    pub fn with_original_id(mut self, id: impl Into<String>) -> Self {
        self.original_id = Some(id.into());
        self
    }

    /// Set the outer data (builder style).
    pub fn with_outer_data(mut self, outer: impl Into<String>) -> Self {
        self.outer_data = Some(outer.into());
        self
    }

    /// Set the display text (builder style).
    pub fn with_display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }

    /// Mark the code as deleteable (builder style).
    pub fn with_deleteable(mut self, deleteable: bool) -> Self {
        self.deleteable = deleteable;
        self
    }

    /// Identifier of the code in its fragment.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Effective type of the code.
    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    /// Role of the code in the original markup.
    pub fn role(&self) -> CodeRole {
        self.role
    }

    /// Check if the code was declared isolated by the extractor.
    pub fn is_isolated(&self) -> bool {
        self.tag_type == TagType::Isolated
    }

    /// Check if the code is half of a pair currently shown as a placeholder.
    pub fn is_demoted(&self) -> bool {
        self.tag_type == TagType::Placeholder && self.role != CodeRole::Standalone
    }

    /// Markup to output for this code.
    pub fn markup(&self) -> &str {
        self.outer_data.as_deref().unwrap_or(&self.data)
    }

    /// Check if the data holds referent markers.
    pub fn has_reference(&self) -> bool {
        self.data.contains(REF_MARKER_START)
    }

    pub(crate) fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub(crate) fn set_tag_type(&mut self, tag_type: TagType) {
        self.tag_type = tag_type;
    }

    /// Key used to compare codes between source and target.
    pub(crate) fn signature(&self) -> (CodeRole, &str, &str) {
        (self.role, self.category.as_str(), self.data.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let open = Code::opening("bold", "<b>");
        assert_eq!(open.tag_type(), TagType::Opening);
        assert_eq!(open.role(), CodeRole::Opening);

        let br = Code::placeholder("break", "<br/>");
        assert_eq!(br.tag_type(), TagType::Placeholder);
        assert!(!br.is_demoted());

        let iso = Code::isolated(CodeRole::Closing, "bold", "</b>");
        assert!(iso.is_isolated());
        assert_eq!(iso.role(), CodeRole::Closing);
    }

    #[test]
    fn test_markup_prefers_outer_data() {
        let code = Code::placeholder("img", "<img/>").with_outer_data("<x id=\"1\"/>");
        assert_eq!(code.markup(), "<x id=\"1\"/>");
        assert_eq!(Code::placeholder("img", "<img/>").markup(), "<img/>");
    }

    #[test]
    fn test_has_reference() {
        assert!(Code::placeholder("img", "<img alt=\"[#$tu2]\"/>").has_reference());
        assert!(!Code::placeholder("img", "<img/>").has_reference());
    }
}
