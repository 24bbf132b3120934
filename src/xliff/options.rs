//! XLIFF writer options.

use super::flavor::Flavor;
use crate::detect::LineBreak;
use crate::model::LocaleId;

/// Options for writing XLIFF.
#[derive(Debug, Clone)]
pub struct XliffOptions {
    /// Dialect to write
    pub flavor: Flavor,

    /// Locale of the targets to write (no targets when `None`)
    pub target_locale: Option<LocaleId>,

    /// Line break between elements
    pub line_break: LineBreak,

    /// Write the original data of inline codes
    pub with_original_data: bool,
}

impl Default for XliffOptions {
    fn default() -> Self {
        Self {
            flavor: Flavor::Default,
            target_locale: None,
            line_break: LineBreak::Lf,
            with_original_data: true,
        }
    }
}

impl XliffOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flavor.
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Set the target locale.
    pub fn with_target_locale(mut self, locale: impl Into<LocaleId>) -> Self {
        self.target_locale = Some(locale.into());
        self
    }

    /// Set the line break.
    pub fn with_line_break(mut self, line_break: LineBreak) -> Self {
        self.line_break = line_break;
        self
    }

    /// Include or leave out the original data of codes.
    pub fn with_original_data(mut self, with_data: bool) -> Self {
        self.with_original_data = with_data;
        self
    }
}
