//! Writer options and configuration.

use std::sync::Arc;

use super::encoder::{DefaultEncoder, Encoder};
use crate::detect::LineBreak;
use crate::model::{LocaleId, MissingTarget};

/// Options for reconstructing documents.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Output locale (the source locale when `None`)
    pub locale: Option<LocaleId>,

    /// What to write for segments without target
    pub missing_target: MissingTarget,

    /// Line-break convention to force (the input's when `None`)
    pub line_break: Option<LineBreak>,

    /// Escaping applied to extracted text
    pub encoder: Arc<dyn Encoder>,

    /// Write a byte-order mark (as in the input when `None`)
    pub write_bom: Option<bool>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            locale: None,
            missing_target: MissingTarget::CopySource,
            line_break: None,
            encoder: Arc::new(DefaultEncoder),
            write_bom: None,
        }
    }
}

impl WriterOptions {
    /// Create new writer options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output locale.
    pub fn with_locale(mut self, locale: impl Into<LocaleId>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the missing-target policy.
    pub fn with_missing_target(mut self, missing: MissingTarget) -> Self {
        self.missing_target = missing;
        self
    }

    /// Force a line-break convention.
    pub fn with_line_break(mut self, line_break: LineBreak) -> Self {
        self.line_break = Some(line_break);
        self
    }

    /// Set the encoder.
    pub fn with_encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Force writing (or not) a byte-order mark.
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.write_bom = Some(bom);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::XmlEncoder;

    #[test]
    fn test_defaults() {
        let options = WriterOptions::default();
        assert_eq!(options.missing_target, MissingTarget::CopySource);
        assert!(options.locale.is_none());
        assert_eq!(options.encoder.name(), "default");
    }

    #[test]
    fn test_builder() {
        let options = WriterOptions::new()
            .with_locale("fr-FR")
            .with_missing_target(MissingTarget::Empty)
            .with_encoder(XmlEncoder::new())
            .with_line_break(LineBreak::CrLf)
            .with_bom(true);
        assert_eq!(options.locale, Some(LocaleId::new("fr-fr")));
        assert_eq!(options.encoder.name(), "xml");
        assert_eq!(options.write_bom, Some(true));
    }
}
