//! Extraction options and filter parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::segmenter::{Segmenter, SentenceSegmenter};
use crate::error::{Error, Result};

/// Named parameters of a filter configuration.
///
/// Values are kept as strings and checked when a filter reads them, so a
/// bad value is reported as [`Error::InvalidParameter`] before the first
/// event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParameters {
    values: BTreeMap<String, String>,
}

impl FilterParameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Raw value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Boolean parameter (`true`/`false`, `yes`/`no`, `1`/`0`).
    pub fn get_bool(&self, name: &str, default: bool) -> Result<bool> {
        match self.get(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(Error::InvalidParameter(format!("{}: expected a boolean, got '{}'", name, v))),
            },
        }
    }

    /// Comma-separated list parameter, lowercased and trimmed.
    pub fn get_list(&self, name: &str, default: &[&str]) -> Vec<String> {
        match self.get(name) {
            None => default.iter().map(|s| s.to_string()).collect(),
            Some(v) => v
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Check if no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Options for extracting events from a document.
#[derive(Clone, Default)]
pub struct ExtractOptions {
    /// Filter configuration id (the document's own when `None`)
    pub filter_id: Option<String>,

    /// Filter parameters
    pub parameters: FilterParameters,

    /// Splits text units into segments
    pub segmenter: Option<Arc<dyn Segmenter>>,

    /// Normalize extracted text to NFC
    pub nfc: bool,
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("filter_id", &self.filter_id)
            .field("parameters", &self.parameters)
            .field("segmenter", &self.segmenter.as_ref().map(|s| s.name()))
            .field("nfc", &self.nfc)
            .finish()
    }
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter configuration id.
    pub fn with_filter_id(mut self, id: impl Into<String>) -> Self {
        self.filter_id = Some(id.into());
        self
    }

    /// Set one filter parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.set(name, value);
        self
    }

    /// Replace the filter parameters.
    pub fn with_parameters(mut self, parameters: FilterParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Segment text units with a segmenter.
    pub fn with_segmenter(mut self, segmenter: impl Segmenter + 'static) -> Self {
        self.segmenter = Some(Arc::new(segmenter));
        self
    }

    /// Segment text units at sentence boundaries.
    pub fn with_sentence_segmentation(self) -> Self {
        self.with_segmenter(SentenceSegmenter::new())
    }

    /// Enable NFC normalization of extracted text.
    pub fn with_nfc(mut self, nfc: bool) -> Self {
        self.nfc = nfc;
        self
    }
}
