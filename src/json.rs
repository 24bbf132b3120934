//! JSON form of event streams.
//!
//! Events serialize with their skeletons and coded text, so a stream saved
//! with [`to_json`] and read back with [`from_json`] reconstructs the same
//! document.

use std::io::{Read, Write};

use crate::error::Result;
use crate::model::Event;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert events to JSON.
pub fn to_json(events: &[Event], format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(events)?,
        JsonFormat::Compact => serde_json::to_string(events)?,
    };
    Ok(json)
}

/// Write events as JSON.
pub fn to_writer<W: Write>(writer: W, events: &[Event], format: JsonFormat) -> Result<()> {
    match format {
        JsonFormat::Pretty => serde_json::to_writer_pretty(writer, events)?,
        JsonFormat::Compact => serde_json::to_writer(writer, events)?,
    }
    Ok(())
}

/// Read events from JSON.
pub fn from_json(json: &str) -> Result<Vec<Event>> {
    Ok(serde_json::from_str(json)?)
}

/// Read events from a JSON reader.
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Event>> {
    Ok(serde_json::from_reader(reader)?)
}
