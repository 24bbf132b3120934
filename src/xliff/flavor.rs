//! XLIFF dialects.
//!
//! Each [`Flavor`] is a row of one rules table. The writer consults the
//! rules instead of branching on the flavor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::TargetState;

/// Tool-specific XLIFF dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Plain XLIFF
    #[default]
    Default,
    /// SDL Trados
    Sdl,
}

/// Output rules of one flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlavorRules {
    /// Name of the flavor
    pub name: &'static str,
    /// Tool namespace as `(prefix, uri)`, declared on the root element
    pub namespace: Option<(&'static str, &'static str)>,
    /// Tool attribute carrying the segment state, in the tool namespace
    pub state_attribute: Option<&'static str>,
    /// Tool values for initial, translated, reviewed and final
    pub state_values: [&'static str; 4],
    /// Tool attribute carrying the best match score, in the tool namespace
    pub score_attribute: Option<&'static str>,
}

static RULES: [FlavorRules; 2] = [
    FlavorRules {
        name: "default",
        namespace: None,
        state_attribute: None,
        state_values: ["initial", "translated", "reviewed", "final"],
        score_attribute: None,
    },
    FlavorRules {
        name: "sdl",
        namespace: Some(("sdl", "http://sdl.com/FileTypes/SdlXliff/1.0")),
        state_attribute: Some("conf"),
        state_values: ["Draft", "Translated", "ApprovedTranslation", "ApprovedSignOff"],
        score_attribute: Some("percent"),
    },
];

impl Flavor {
    /// All flavors.
    pub const ALL: [Flavor; 2] = [Flavor::Default, Flavor::Sdl];

    /// Rules of the flavor.
    pub fn rules(&self) -> &'static FlavorRules {
        match self {
            Flavor::Default => &RULES[0],
            Flavor::Sdl => &RULES[1],
        }
    }
}

impl FlavorRules {
    /// Tool value for a segment state.
    pub fn state_value(&self, state: TargetState) -> &'static str {
        match state {
            TargetState::Initial => self.state_values[0],
            TargetState::Translated => self.state_values[1],
            TargetState::Reviewed => self.state_values[2],
            TargetState::Final => self.state_values[3],
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rules().name)
    }
}

impl FromStr for Flavor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flavor::ALL
            .into_iter()
            .find(|f| f.rules().name.eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter(format!("unknown XLIFF flavor: {}", s)))
    }
}
