//! Text fragments with embedded inline codes.
//!
//! A [`Fragment`] stores its content as a list of runs (text, or a handle into
//! its code list). The coded-text form, where each code is written as a marker
//! symbol followed by an index symbol, only exists at the boundary
//! ([`Fragment::coded_text`], [`Fragment::from_coded_text`] and serde).
//!
//! Positions taken by the structural operations are coded-text positions: a
//! text character counts 1, a code counts 2.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::annotation::Annotations;
use super::balance::{balance_codes, BalanceReport, Balancer};
use super::code::{Code, CodeRole, TagType};
use crate::error::{Error, Result};

/// Marker symbol for an opening code.
pub const MARKER_OPENING: char = '\u{E101}';
/// Marker symbol for a closing code.
pub const MARKER_CLOSING: char = '\u{E102}';
/// Marker symbol for an isolated or placeholder code.
pub const MARKER_ISOLATED: char = '\u{E103}';
/// Maximum number of codes a fragment can hold.
pub const MAX_CODES: usize = 6127;

const INDEX_BASE: u32 = 0xE110;

/// Check if a character is one of the three marker symbols.
pub fn is_marker(ch: char) -> bool {
    matches!(ch, MARKER_OPENING | MARKER_CLOSING | MARKER_ISOLATED)
}

/// Check if a character is reserved for coded text (a marker or an index
/// symbol) and so cannot appear as plain text.
pub fn is_reserved(ch: char) -> bool {
    is_marker(ch) || symbol_index(ch).is_some()
}

/// Index symbol for a code index.
pub fn index_symbol(index: usize) -> Option<char> {
    if index >= MAX_CODES {
        return None;
    }
    char::from_u32(INDEX_BASE + index as u32)
}

/// Code index encoded by an index symbol.
pub fn symbol_index(ch: char) -> Option<usize> {
    let value = ch as u32;
    if (INDEX_BASE..INDEX_BASE + MAX_CODES as u32).contains(&value) {
        Some((value - INDEX_BASE) as usize)
    } else {
        None
    }
}

fn marker_for(tag_type: TagType) -> char {
    match tag_type {
        TagType::Opening => MARKER_OPENING,
        TagType::Closing => MARKER_CLOSING,
        TagType::Isolated | TagType::Placeholder => MARKER_ISOLATED,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Run {
    Text(String),
    Code(usize),
}

#[derive(Debug, Clone, Copy)]
enum Atom {
    Char(char),
    Code(usize),
}

impl Atom {
    fn width(self) -> usize {
        match self {
            Atom::Char(_) => 1,
            Atom::Code(_) => 2,
        }
    }
}

/// Borrowed view of one run of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Plain text
    Text(&'a str),
    /// An inline code
    Code(&'a Code),
}

/// Codes that differ between a source fragment and its target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeAnomalies {
    /// Source codes absent from the target (deleteable codes excluded)
    pub missing: Vec<Code>,
    /// Target codes absent from the source (codes flagged `added` excluded)
    pub added: Vec<Code>,
}

impl CodeAnomalies {
    /// Check if source and target carry the same codes.
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.added.is_empty()
    }
}

/// Text with embedded inline codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "WireFragment", into = "WireFragment")]
pub struct Fragment {
    runs: Vec<Run>,
    codes: Vec<Code>,
    balancer: Balancer,
}

#[derive(Serialize, Deserialize)]
struct WireFragment {
    coded_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    codes: Vec<Code>,
}

impl From<Fragment> for WireFragment {
    fn from(fragment: Fragment) -> Self {
        Self {
            coded_text: fragment.coded_text(),
            codes: fragment.codes,
        }
    }
}

impl TryFrom<WireFragment> for Fragment {
    type Error = Error;

    fn try_from(wire: WireFragment) -> Result<Self> {
        Fragment::from_coded_text(&wire.coded_text, wire.codes)
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.runs == other.runs && self.codes == other.codes
    }
}

impl Eq for Fragment {}

impl TryFrom<&str> for Fragment {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        Fragment::from_text(text)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

impl Fragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fragment holding plain text.
    ///
    /// Fails if the text holds a reserved code point (see [`is_reserved`]).
    pub fn from_text(text: impl AsRef<str>) -> Result<Self> {
        let mut fragment = Self::new();
        fragment.append_text(text.as_ref())?;
        Ok(fragment)
    }

    /// Parse coded text and its code list.
    ///
    /// Codes may be listed in any order; they are stored in the order their
    /// markers appear. Ids are kept as given. Every code must be referenced
    /// exactly once, and each marker must agree with its code's tag type.
    pub fn from_coded_text(coded: &str, codes: Vec<Code>) -> Result<Self> {
        let invalid = |position: usize, reason: String| Error::InvalidCodedText { position, reason };

        if codes.len() > MAX_CODES {
            return Err(Error::TooManyCodes(MAX_CODES));
        }
        let mut atoms = Vec::with_capacity(coded.len());
        let mut used = vec![false; codes.len()];
        let mut chars = coded.chars().enumerate();
        let mut count = 0;
        while let Some((position, ch)) = chars.next() {
            count = position + 1;
            if is_marker(ch) {
                let (_, symbol) = chars
                    .next()
                    .ok_or_else(|| invalid(position, "marker without index".into()))?;
                count += 1;
                let index = symbol_index(symbol)
                    .filter(|&i| i < codes.len())
                    .ok_or_else(|| invalid(position + 1, format!("no code for index symbol U+{:04X}", symbol as u32)))?;
                if used[index] {
                    return Err(invalid(position, format!("code {} referenced twice", index)));
                }
                if marker_for(codes[index].tag_type()) != ch {
                    return Err(invalid(
                        position,
                        format!("marker does not match the type of code {}", index),
                    ));
                }
                used[index] = true;
                atoms.push(Atom::Code(index));
            } else if symbol_index(ch).is_some() {
                return Err(invalid(position, "index symbol without marker".into()));
            } else {
                atoms.push(Atom::Char(ch));
            }
        }
        if let Some(index) = used.iter().position(|u| !u) {
            return Err(invalid(count, format!("code {} is not referenced", index)));
        }
        Ok(Self::from_atoms(&atoms, &codes))
    }

    // ==================== Building ====================

    /// Append plain text.
    ///
    /// Marker and index symbols cannot appear as text: a text holding one is
    /// rejected with [`Error::InvalidParameter`] and nothing is appended.
    pub fn append_text(&mut self, text: &str) -> Result<()> {
        if let Some((position, ch)) = text.chars().enumerate().find(|(_, ch)| is_reserved(*ch)) {
            return Err(Error::InvalidParameter(format!(
                "reserved code point U+{:04X} at position {} of the text",
                ch as u32, position
            )));
        }
        self.push_text(text);
        Ok(())
    }

    /// Append one character.
    pub fn append_char(&mut self, ch: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.append_text(ch.encode_utf8(&mut buf))
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(Run::Text(last)) => last.push_str(text),
            _ => self.runs.push(Run::Text(text.to_string())),
        }
    }

    /// Append a code and assign its id. Returns the code index.
    ///
    /// An opening code is shown as a placeholder until its closing code is
    /// appended; a closing code without opening stays a placeholder.
    pub fn append_code(&mut self, code: Code) -> Result<usize> {
        if self.codes.len() >= MAX_CODES {
            return Err(Error::TooManyCodes(MAX_CODES));
        }
        let index = self.codes.len();
        self.codes.push(code);
        self.balancer.assign(&mut self.codes, index);
        self.runs.push(Run::Code(index));
        Ok(index)
    }

    /// Append an opening code.
    pub fn append_opening(&mut self, category: impl Into<String>, data: impl Into<String>) -> Result<usize> {
        self.append_code(Code::opening(category, data))
    }

    /// Append a closing code.
    pub fn append_closing(&mut self, category: impl Into<String>, data: impl Into<String>) -> Result<usize> {
        self.append_code(Code::closing(category, data))
    }

    /// Append a standalone placeholder code.
    pub fn append_placeholder(&mut self, category: impl Into<String>, data: impl Into<String>) -> Result<usize> {
        self.append_code(Code::placeholder(category, data))
    }

    /// Append a copy of another fragment and rebalance.
    pub fn append_fragment(&mut self, other: &Fragment) -> Result<BalanceReport> {
        self.append_raw(other)?;
        Ok(self.balance())
    }

    pub(crate) fn append_raw(&mut self, other: &Fragment) -> Result<()> {
        if self.codes.len() + other.codes.len() > MAX_CODES {
            return Err(Error::TooManyCodes(MAX_CODES));
        }
        for run in &other.runs {
            match run {
                Run::Text(text) => self.push_text(text),
                Run::Code(index) => {
                    self.codes.push(other.codes[*index].clone());
                    self.runs.push(Run::Code(self.codes.len() - 1));
                }
            }
        }
        Ok(())
    }

    // ==================== Access ====================

    /// Coded-text form of the fragment.
    pub fn coded_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match run {
                Run::Text(text) => out.push_str(text),
                Run::Code(index) => {
                    out.push(marker_for(self.codes[*index].tag_type()));
                    out.push(index_symbol(*index).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
        }
        out
    }

    /// Codes in document order.
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Code at the given index.
    pub fn code(&self, index: usize) -> Option<&Code> {
        self.codes.get(index)
    }

    /// Annotations of the code at the given index.
    pub fn code_annotations_mut(&mut self, index: usize) -> Option<&mut Annotations> {
        self.codes.get_mut(index).map(|c| &mut c.annotations)
    }

    /// Number of codes.
    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    /// Check if the fragment holds codes.
    pub fn has_codes(&self) -> bool {
        !self.codes.is_empty()
    }

    /// Check if the fragment holds non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.runs
            .iter()
            .any(|r| matches!(r, Run::Text(t) if !t.trim().is_empty()))
    }

    /// Length in coded-text positions.
    pub fn len(&self) -> usize {
        self.runs
            .iter()
            .map(|r| match r {
                Run::Text(text) => text.chars().count(),
                Run::Code(_) => 2,
            })
            .sum()
    }

    /// Check if the fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Iterate over text runs and codes in order.
    pub fn pieces(&self) -> impl Iterator<Item = Piece<'_>> {
        self.runs.iter().map(move |run| match run {
            Run::Text(text) => Piece::Text(text),
            Run::Code(index) => Piece::Code(&self.codes[*index]),
        })
    }

    /// Plain text with codes stripped.
    pub fn text(&self) -> String {
        self.pieces()
            .filter_map(|p| match p {
                Piece::Text(text) => Some(text),
                Piece::Code(_) => None,
            })
            .collect()
    }

    /// Text with each code replaced by its original markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for piece in self.pieces() {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Code(code) => out.push_str(code.markup()),
            }
        }
        out
    }

    // ==================== Transforms ====================

    /// Rewrite every text run. Codes are left untouched.
    ///
    /// If a rewritten run holds a reserved code point the fragment is left
    /// unchanged and [`Error::InvalidParameter`] is returned.
    pub fn map_text<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> String,
    {
        let mut runs = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            match run {
                Run::Text(text) => {
                    let mapped = f(text);
                    if mapped.chars().any(is_reserved) {
                        return Err(Error::InvalidParameter(format!(
                            "text mapped from '{}' holds a reserved code point",
                            text
                        )));
                    }
                    if !mapped.is_empty() {
                        runs.push(Run::Text(mapped));
                    }
                }
                Run::Code(index) => runs.push(Run::Code(*index)),
            }
        }
        self.runs = runs;
        Ok(())
    }

    /// Copy of a range, with its own balanced id space.
    pub fn sub_fragment(&self, range: Range<usize>) -> Result<Fragment> {
        let atoms = self.atoms();
        let (start, end) = self.atom_span(&atoms, &range)?;
        let mut part = Self::from_atoms(&atoms[start..end], &self.codes);
        part.balance();
        Ok(part)
    }

    /// Remove a range and return it as a fragment.
    pub fn remove(&mut self, range: Range<usize>) -> Result<Fragment> {
        self.splice(range, None)
    }

    /// Insert a copy of `other` at a position.
    pub fn insert(&mut self, position: usize, other: &Fragment) -> Result<()> {
        self.splice(position..position, Some(other)).map(|_| ())
    }

    /// Replace a range with a copy of `replacement`. Returns what was removed.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &Fragment) -> Result<Fragment> {
        self.splice(range, Some(replacement))
    }

    /// Rebalance the whole fragment, renumbering ids from 1.
    pub fn balance(&mut self) -> BalanceReport {
        let (balancer, report) = balance_codes(&mut self.codes);
        self.balancer = balancer;
        report
    }

    /// Compare the codes of this fragment with those of a target.
    pub fn code_anomalies(&self, target: &Fragment) -> CodeAnomalies {
        let mut remaining: Vec<&Code> = target.codes.iter().collect();
        let mut anomalies = CodeAnomalies::default();
        for code in &self.codes {
            match remaining.iter().position(|t| t.signature() == code.signature()) {
                Some(pos) => {
                    remaining.remove(pos);
                }
                None if code.deleteable => {}
                None => anomalies.missing.push(code.clone()),
            }
        }
        anomalies.added = remaining.into_iter().filter(|c| !c.added).cloned().collect();
        anomalies
    }

    /// Record the current id of every paired code as its split hint.
    pub(crate) fn mark_split_hints(&mut self) {
        for code in &mut self.codes {
            if code.tag_type().is_paired() {
                code.split_hint = Some(code.id());
            }
        }
    }

    /// Check if the fragment holds an opening code still waiting for its
    /// closing code.
    pub fn has_pending_openings(&self) -> bool {
        self.codes
            .iter()
            .any(|c| c.role() == CodeRole::Opening && c.tag_type() == TagType::Placeholder)
    }

    fn splice(&mut self, range: Range<usize>, replacement: Option<&Fragment>) -> Result<Fragment> {
        let atoms = self.atoms();
        let (start, end) = self.atom_span(&atoms, &range)?;
        let mut removed = Self::from_atoms(&atoms[start..end], &self.codes);
        removed.balance();

        let mut rebuilt = Self::from_atoms(&atoms[..start], &self.codes);
        if let Some(replacement) = replacement {
            rebuilt.append_raw(replacement)?;
        }
        rebuilt.append_raw(&Self::from_atoms(&atoms[end..], &self.codes))?;
        rebuilt.balance();
        *self = rebuilt;
        Ok(removed)
    }

    fn atoms(&self) -> Vec<Atom> {
        let mut atoms = Vec::new();
        for run in &self.runs {
            match run {
                Run::Text(text) => atoms.extend(text.chars().map(Atom::Char)),
                Run::Code(index) => atoms.push(Atom::Code(*index)),
            }
        }
        atoms
    }

    fn atom_span(&self, atoms: &[Atom], range: &Range<usize>) -> Result<(usize, usize)> {
        let len: usize = atoms.iter().map(|a| a.width()).sum();
        let error = || Error::InvalidRange {
            start: range.start,
            end: range.end,
            len,
        };
        if range.start > range.end || range.end > len {
            return Err(error());
        }
        let start = atom_index(atoms, range.start).ok_or_else(error)?;
        let end = atom_index(atoms, range.end).ok_or_else(error)?;
        Ok((start, end))
    }

    fn from_atoms(atoms: &[Atom], codes: &[Code]) -> Self {
        let mut fragment = Self::new();
        for atom in atoms {
            match atom {
                Atom::Char(ch) => {
                    let mut buf = [0u8; 4];
                    fragment.push_text(ch.encode_utf8(&mut buf));
                }
                Atom::Code(index) => {
                    fragment.codes.push(codes[*index].clone());
                    fragment.runs.push(Run::Code(fragment.codes.len() - 1));
                }
            }
        }
        fragment.balancer = Balancer::resume(&fragment.codes);
        fragment
    }
}

/// Atom index starting at a coded position, `None` if inside a code.
fn atom_index(atoms: &[Atom], position: usize) -> Option<usize> {
    let mut offset = 0;
    for (i, atom) in atoms.iter().enumerate() {
        if offset == position {
            return Some(i);
        }
        offset += atom.width();
        if offset > position {
            return None;
        }
    }
    (offset == position).then_some(atoms.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> Fragment {
        let mut f = Fragment::new();
        f.append_text("a").unwrap();
        f.append_opening("b", "<b>").unwrap();
        f.append_text("bold").unwrap();
        f.append_closing("b", "</b>").unwrap();
        f.append_text("c").unwrap();
        f
    }

    // ==================== Coded Text Tests ====================

    #[test]
    fn test_coded_text_scheme() {
        let f = bold();
        let expected = format!(
            "a{}{}bold{}{}c",
            MARKER_OPENING, '\u{E110}', MARKER_CLOSING, '\u{E111}'
        );
        assert_eq!(f.coded_text(), expected);
        assert_eq!(f.len(), 10);
        assert_eq!(f.codes()[0].id(), 1);
        assert_eq!(f.codes()[1].id(), 1);
    }

    #[test]
    fn test_from_coded_text() {
        let f = bold();
        let parsed = Fragment::from_coded_text(&f.coded_text(), f.codes().to_vec()).unwrap();
        assert_eq!(parsed, f);
        assert_eq!(parsed.to_markup(), "a<b>bold</b>c");
    }

    #[test]
    fn test_from_coded_text_errors() {
        let codes = vec![Code::placeholder("br", "<br/>")];
        assert!(Fragment::from_coded_text("x\u{E103}", codes.clone()).is_err());
        assert!(Fragment::from_coded_text("x\u{E110}", codes.clone()).is_err());
        assert!(Fragment::from_coded_text("no codes", codes.clone()).is_err());
        assert!(Fragment::from_coded_text("\u{E101}\u{E110}", codes.clone()).is_err());
        assert!(Fragment::from_coded_text("\u{E103}\u{E110}", codes).is_ok());
    }

    #[test]
    fn test_reserved_text_rejected() {
        let mut f = Fragment::from_text("x").unwrap();
        assert!(matches!(
            f.append_text("\u{E101}\u{E110}y"),
            Err(Error::InvalidParameter(_))
        ));
        assert!(f.append_char('\u{E103}').is_err());
        assert!(f.append_char('\u{F8FF}').is_err());
        assert_eq!(f.coded_text(), "x");
        assert!(Fragment::from_text("a\u{E112}").is_err());

        // Private-use characters outside the reserved ranges are plain text
        f.append_text("\u{E100}\u{E104}").unwrap();
        let json = serde_json::to_string(&f).unwrap();
        let back: Fragment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn test_pending_opening_is_placeholder() {
        let mut f = Fragment::new();
        f.append_opening("b", "<b>").unwrap();
        f.append_text("x").unwrap();
        assert_eq!(f.codes()[0].tag_type(), TagType::Placeholder);
        assert!(f.has_pending_openings());
        f.append_closing("b", "</b>").unwrap();
        assert_eq!(f.codes()[0].tag_type(), TagType::Opening);
        assert!(!f.has_pending_openings());
    }

    #[test]
    fn test_too_many_codes() {
        let mut f = Fragment::new();
        for _ in 0..MAX_CODES {
            f.append_placeholder("x", "<x/>").unwrap();
        }
        assert!(matches!(f.append_placeholder("x", "<x/>"), Err(Error::TooManyCodes(_))));
    }

    // ==================== Structural Tests ====================

    #[test]
    fn test_sub_fragment_rebalances() {
        let f = bold();
        let first = f.sub_fragment(0..5).unwrap();
        assert_eq!(first.to_markup(), "a<b>bo");
        assert_eq!(first.codes()[0].tag_type(), TagType::Placeholder);
        assert_eq!(first.codes()[0].id(), 1);
    }

    #[test]
    fn test_position_inside_marker() {
        let f = bold();
        assert!(matches!(f.sub_fragment(2..5), Err(Error::InvalidRange { .. })));
        assert!(f.sub_fragment(0..11).is_err());
        assert!(f.sub_fragment(0..10).is_ok());
    }

    #[test]
    fn test_remove_and_insert() {
        let mut f = bold();
        let removed = f.remove(3..7).unwrap();
        assert_eq!(removed.text(), "bold");
        assert_eq!(f.to_markup(), "a<b></b>c");
        assert_eq!(f.codes()[1].tag_type(), TagType::Closing);

        f.insert(3, &Fragment::from_text("BOLD").unwrap()).unwrap();
        assert_eq!(f.to_markup(), "a<b>BOLD</b>c");
    }

    #[test]
    fn test_replace_range() {
        let mut f = bold();
        let mut replacement = Fragment::from_text("x").unwrap();
        replacement.append_placeholder("br", "<br/>").unwrap();
        let removed = f.replace_range(0..1, &replacement).unwrap();
        assert_eq!(removed.text(), "a");
        assert_eq!(f.to_markup(), "x<br/><b>bold</b>c");
        let ids: Vec<i32> = f.codes().iter().map(Code::id).collect();
        assert_eq!(ids, vec![1, 2, 2]);
    }

    #[test]
    fn test_append_fragment_renumbers() {
        let mut f = bold();
        let report = f.append_fragment(&bold()).unwrap();
        assert!(report.is_clean());
        let ids: Vec<i32> = f.codes().iter().map(Code::id).collect();
        assert_eq!(ids, vec![1, 1, 2, 2]);
    }

    // ==================== Rendering Tests ====================

    #[test]
    fn test_map_text_keeps_codes() {
        let mut f = bold();
        f.map_text(|t| t.to_uppercase()).unwrap();
        assert_eq!(f.to_markup(), "A<b>BOLD</b>C");
        assert_eq!(f.code_count(), 2);
        assert_eq!(f.text(), "ABOLDC");

        assert!(f.map_text(|t| format!("{}\u{E102}", t)).is_err());
        assert_eq!(f.to_markup(), "A<b>BOLD</b>C");
    }

    #[test]
    fn test_code_anomalies() {
        let source = bold();
        let mut target = Fragment::from_text("x").unwrap();
        target.append_placeholder("br", "<br/>").unwrap();
        let anomalies = source.code_anomalies(&target);
        assert_eq!(anomalies.missing.len(), 2);
        assert_eq!(anomalies.added.len(), 1);
        assert!(source.code_anomalies(&bold()).is_empty());
    }

    #[test]
    fn test_serde_wire_form() {
        let f = bold();
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("coded_text"));
        let back: Fragment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
