//! Ordered parts of a text unit, with split and join.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::fragment::Fragment;
use super::locale::LocaleId;
use super::part::{MissingTarget, Part, PartKind};
use crate::error::{Error, Result};

/// Content of a text unit as an ordered list of segments and ignorables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    parts: Vec<Part>,
    #[serde(default)]
    segmented: bool,
}

impl Default for Container {
    fn default() -> Self {
        Self::new(Fragment::new())
    }
}

impl Container {
    /// Create a container holding one segment.
    pub fn new(source: Fragment) -> Self {
        Self {
            parts: vec![Part::segment("1", source)],
            segmented: false,
        }
    }

    /// Create a container from existing parts.
    pub fn from_parts(parts: Vec<Part>) -> Result<Self> {
        if parts.is_empty() {
            return Err(Error::InvalidParameter("a container needs at least one part".into()));
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = parts.iter().find(|p| !seen.insert(p.id.as_str())) {
            return Err(Error::InvalidParameter(format!("duplicate part id '{}'", dup.id)));
        }
        let segmented = parts.len() > 1;
        Ok(Self { parts, segmented })
    }

    // ==================== Access ====================

    /// All parts in document order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// All parts, mutably. The part list itself cannot change through this.
    pub fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    /// Part at an index.
    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    /// Mutable part at an index.
    pub fn part_mut(&mut self, index: usize) -> Option<&mut Part> {
        self.parts.get_mut(index)
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the container has no content at all.
    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|p| p.source.is_empty())
    }

    /// Check if the content was split into several parts.
    pub fn is_segmented(&self) -> bool {
        self.segmented
    }

    /// Iterate over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|p| p.is_segment())
    }

    /// Iterate mutably over the segments.
    pub fn segments_mut(&mut self) -> impl Iterator<Item = &mut Part> {
        self.parts.iter_mut().filter(|p| p.is_segment())
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Segment with the given id.
    pub fn segment(&self, id: &str) -> Option<&Part> {
        self.segments().find(|p| p.id == id)
    }

    /// Mutable segment with the given id.
    pub fn segment_mut(&mut self, id: &str) -> Option<&mut Part> {
        self.parts.iter_mut().find(|p| p.is_segment() && p.id == id)
    }

    /// Index of the part with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.parts.iter().position(|p| p.id == id)
    }

    /// Check if any part has a target for a locale.
    pub fn has_target(&self, locale: &LocaleId) -> bool {
        self.parts.iter().any(|p| p.has_target(locale))
    }

    /// Whole source content.
    pub fn full_source(&self) -> Result<Fragment> {
        let mut full = Fragment::new();
        for part in &self.parts {
            full.append_raw(&part.source)?;
        }
        full.balance();
        Ok(full)
    }

    /// Whole target content for a locale.
    ///
    /// Ignorables without target contribute their source; segments without
    /// target follow `missing`.
    pub fn full_target(&self, locale: &LocaleId, missing: MissingTarget) -> Result<Fragment> {
        let mut full = Fragment::new();
        for part in &self.parts {
            let content = if part.is_segment() {
                part.target_or(locale, missing)
            } else {
                part.target_or(locale, MissingTarget::CopySource)
            };
            full.append_raw(&content)?;
        }
        full.balance();
        Ok(full)
    }

    // ==================== Building ====================

    /// Append a segment with a fresh id.
    pub fn append_segment(&mut self, source: Fragment) -> &mut Part {
        self.append_part(PartKind::Segment, source)
    }

    /// Append an ignorable with a fresh id.
    pub fn append_ignorable(&mut self, source: Fragment) -> &mut Part {
        self.append_part(PartKind::Ignorable, source)
    }

    fn append_part(&mut self, kind: PartKind, source: Fragment) -> &mut Part {
        if self.parts.len() == 1 && self.parts[0].source.is_empty() && self.parts[0].targets.is_empty() {
            self.parts[0].kind = kind;
            self.parts[0].source = source;
        } else {
            let id = self.fresh_id();
            self.parts.push(Part::new(kind, id, source));
            self.segmented = true;
        }
        let last = self.parts.len() - 1;
        &mut self.parts[last]
    }

    fn fresh_id(&self) -> String {
        let max = self
            .parts
            .iter()
            .filter_map(|p| p.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }

    // ==================== Split ====================

    /// Split a part at coded-text offsets of its source.
    ///
    /// Each piece keeps the metadata of the original part and gets its own
    /// balanced id space. The first piece keeps the original id. Returns the
    /// number of pieces. Parts with targets need [`split_aligned`](Self::split_aligned).
    pub fn split(&mut self, part_index: usize, offsets: &[usize]) -> Result<usize> {
        let part = self.resegmentable(part_index)?;
        if !part.targets.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "part {} has targets and must be split with aligned offsets",
                part_index
            )));
        }
        let ranges = ranges_from_offsets(offsets, part.source.len())?;
        let kind = part.kind;
        let pieces = ranges.into_iter().map(|r| (r, kind)).collect();
        self.carve(part_index, pieces, BTreeMap::new())
    }

    /// Split a part and its targets, each at its own offsets.
    ///
    /// Every locale with a target must have as many offsets as the source.
    pub fn split_aligned(
        &mut self,
        part_index: usize,
        source_offsets: &[usize],
        target_offsets: &BTreeMap<LocaleId, Vec<usize>>,
    ) -> Result<usize> {
        let part = self.resegmentable(part_index)?;
        let kind = part.kind;
        let source_ranges = ranges_from_offsets_keep_empty(source_offsets, part.source.len())?;

        let mut target_ranges = BTreeMap::new();
        for (locale, target) in &part.targets {
            let offsets = target_offsets.get(locale).ok_or_else(|| {
                Error::InvalidParameter(format!("no split offsets for target locale {}", locale))
            })?;
            if offsets.len() != source_offsets.len() {
                return Err(Error::InvalidParameter(format!(
                    "target {} has {} offsets, source has {}",
                    locale,
                    offsets.len(),
                    source_offsets.len()
                )));
            }
            target_ranges.insert(locale.clone(), ranges_from_offsets_keep_empty(offsets, target.len())?);
        }

        let pieces = source_ranges.into_iter().map(|r| (r, kind)).collect();
        self.carve(part_index, pieces, target_ranges)
    }

    /// Turn ranges of a part's source into segments, and the gaps between
    /// them into ignorables.
    pub fn apply_segmentation(&mut self, part_index: usize, ranges: &[Range<usize>]) -> Result<usize> {
        let part = self.resegmentable(part_index)?;
        if !part.targets.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "part {} has targets and cannot be re-segmented",
                part_index
            )));
        }
        let len = part.source.len();
        let mut pieces = Vec::new();
        let mut cursor = 0;
        for range in ranges {
            if range.start < cursor || range.start > range.end || range.end > len {
                return Err(Error::InvalidRange {
                    start: range.start,
                    end: range.end,
                    len,
                });
            }
            if range.start == range.end {
                continue;
            }
            if range.start > cursor {
                pieces.push((cursor..range.start, PartKind::Ignorable));
            }
            pieces.push((range.clone(), PartKind::Segment));
            cursor = range.end;
        }
        if !pieces.iter().any(|(_, k)| *k == PartKind::Segment) {
            return Ok(1);
        }
        if cursor < len {
            pieces.push((cursor..len, PartKind::Ignorable));
        }
        self.carve(part_index, pieces, BTreeMap::new())
    }

    fn carve(
        &mut self,
        part_index: usize,
        pieces: Vec<(Range<usize>, PartKind)>,
        target_ranges: BTreeMap<LocaleId, Vec<Range<usize>>>,
    ) -> Result<usize> {
        let original = &self.parts[part_index];
        let mut source = original.source.clone();
        source.mark_split_hints();
        let mut targets = original.targets.clone();
        for target in targets.values_mut() {
            target.mark_split_hints();
        }

        let mut next_id = self
            .parts
            .iter()
            .filter_map(|p| p.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let mut original_id_used = false;
        let mut new_parts = Vec::with_capacity(pieces.len());
        for (i, (range, kind)) in pieces.iter().enumerate() {
            let mut piece = original.clone_metadata();
            piece.kind = *kind;
            piece.source = source.sub_fragment(range.clone())?;
            for (locale, target) in &targets {
                if let Some(r) = target_ranges.get(locale).and_then(|ranges| ranges.get(i)) {
                    piece.targets.insert(locale.clone(), target.sub_fragment(r.clone())?);
                }
            }
            if *kind == original.kind && !original_id_used {
                original_id_used = true;
            } else {
                piece.id = next_id.to_string();
                next_id += 1;
            }
            new_parts.push(piece);
        }

        let count = new_parts.len();
        log::debug!("split part '{}' into {} pieces", original.id, count);
        self.parts.splice(part_index..=part_index, new_parts);
        self.segmented = self.parts.len() > 1;
        Ok(count)
    }

    // ==================== Join ====================

    /// Merge the parts of a range into one.
    ///
    /// The result takes the id and metadata of the first segment, the
    /// earliest state, and `preserve_ws` if any part had it. For each target
    /// locale, a part without target contributes its source.
    pub fn join(&mut self, range: Range<usize>) -> Result<()> {
        if range.start >= range.end || range.end > self.parts.len() {
            return Err(Error::InvalidRange {
                start: range.start,
                end: range.end,
                len: self.parts.len(),
            });
        }
        if range.len() == 1 {
            return Ok(());
        }
        if let Some(index) = range
            .clone()
            .find(|&i| self.parts[i].is_segment() && !self.parts[i].can_resegment)
        {
            return Err(Error::NotResegmentable(index));
        }

        let merged = merge_parts(&self.parts[range.clone()])?;
        log::debug!("joined {} parts into '{}'", range.len(), merged.id);
        self.parts.splice(range, std::iter::once(merged));
        self.segmented = self.parts.len() > 1;
        Ok(())
    }

    /// Join every run of parts not interrupted by a segment that cannot be
    /// re-segmented.
    pub fn join_all(&mut self) -> Result<()> {
        let mut end = self.parts.len();
        for i in (0..self.parts.len()).rev() {
            let part = &self.parts[i];
            if part.is_segment() && !part.can_resegment {
                if end - (i + 1) > 1 {
                    self.join(i + 1..end)?;
                }
                end = i;
            }
        }
        if end > 1 {
            self.join(0..end)?;
        }
        self.segmented = self.parts.len() > 1;
        Ok(())
    }

    fn part_checked(&self, index: usize) -> Result<&Part> {
        self.parts
            .get(index)
            .ok_or_else(|| Error::InvalidParameter(format!("no part at index {}", index)))
    }

    fn resegmentable(&self, index: usize) -> Result<&Part> {
        let part = self.part_checked(index)?;
        if !part.can_resegment {
            return Err(Error::NotResegmentable(index));
        }
        Ok(part)
    }
}

fn merge_parts(parts: &[Part]) -> Result<Part> {
    let first = parts
        .iter()
        .find(|p| p.is_segment())
        .or_else(|| parts.first())
        .ok_or_else(|| Error::InvalidParameter("nothing to join".into()))?;
    let mut merged = first.clone_metadata();
    if parts.iter().any(Part::is_segment) {
        merged.kind = PartKind::Segment;
    }

    let locales: BTreeSet<&LocaleId> = parts.iter().flat_map(|p| p.targets.keys()).collect();
    let mut targets: BTreeMap<LocaleId, Fragment> =
        locales.into_iter().map(|l| (l.clone(), Fragment::new())).collect();
    let mut source = Fragment::new();

    for part in parts {
        source.append_raw(&part.source)?;
        for (locale, target) in targets.iter_mut() {
            target.append_raw(&part.target_or(locale, MissingTarget::CopySource))?;
        }
        if part.is_segment() && part.state < merged.state {
            merged.state = part.state;
            merged.sub_state = part.sub_state.clone();
        }
        merged.preserve_ws |= part.preserve_ws;
    }

    source.balance();
    for target in targets.values_mut() {
        target.balance();
    }
    merged.source = source;
    merged.targets = targets;
    Ok(merged)
}

/// Non-empty ranges between increasing offsets.
fn ranges_from_offsets(offsets: &[usize], len: usize) -> Result<Vec<Range<usize>>> {
    Ok(ranges_from_offsets_keep_empty(offsets, len)?
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect())
}

fn ranges_from_offsets_keep_empty(offsets: &[usize], len: usize) -> Result<Vec<Range<usize>>> {
    let mut ranges = Vec::with_capacity(offsets.len() + 1);
    let mut start = 0;
    for &offset in offsets {
        if offset < start || offset > len {
            return Err(Error::InvalidRange {
                start,
                end: offset,
                len,
            });
        }
        ranges.push(start..offset);
        start = offset;
    }
    ranges.push(start..len);
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Code, TagType, TargetState};

    fn bold() -> Fragment {
        let mut f = Fragment::new();
        f.append_text("a").unwrap();
        f.append_opening("b", "<b>").unwrap();
        f.append_text("bold").unwrap();
        f.append_closing("b", "</b>").unwrap();
        f.append_text("c").unwrap();
        f
    }

    // ==================== Split Tests ====================

    #[test]
    fn test_split_in_middle_of_pair() {
        let mut c = Container::new(bold());
        assert_eq!(c.split(0, &[5]).unwrap(), 2);
        assert!(c.is_segmented());
        let first = &c.parts()[0];
        let second = &c.parts()[1];
        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert_eq!(first.source.codes()[0].tag_type(), TagType::Placeholder);
        assert_eq!(second.source.codes()[0].tag_type(), TagType::Placeholder);
        assert_eq!(first.source.to_markup(), "a<b>bo");
        assert_eq!(second.source.to_markup(), "ld</b>c");
    }

    #[test]
    fn test_split_rejects_offsets_inside_code() {
        let mut c = Container::new(bold());
        assert!(matches!(c.split(0, &[2]), Err(Error::InvalidRange { .. })));
        assert!(c.split(0, &[7, 3]).is_err());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_split_requires_aligned_when_targets() {
        let fr = LocaleId::new("fr");
        let mut c = Container::new(Fragment::from_text("Hello. World.").unwrap());
        c.part_mut(0).unwrap().set_target(fr.clone(), Fragment::from_text("Bonjour. Monde.").unwrap());
        assert!(c.split(0, &[6]).is_err());

        let mut offsets = BTreeMap::new();
        offsets.insert(fr.clone(), vec![8]);
        c.split_aligned(0, &[6], &offsets).unwrap();
        assert_eq!(c.parts()[0].target(&fr).map(|t| t.text()), Some("Bonjour.".into()));
        assert_eq!(c.parts()[1].target(&fr).map(|t| t.text()), Some(" Monde.".into()));
    }

    #[test]
    fn test_apply_segmentation() {
        let mut c = Container::new(Fragment::from_text("One. Two.").unwrap());
        c.apply_segmentation(0, &[0..4, 5..9]).unwrap();
        let kinds: Vec<PartKind> = c.parts().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PartKind::Segment, PartKind::Ignorable, PartKind::Segment]);
        assert_eq!(c.segment_count(), 2);
        assert_eq!(c.parts()[1].source.text(), " ");
        assert_eq!(c.segment("1").map(|p| p.source.text()), Some("One.".into()));
    }

    // ==================== Join Tests ====================

    #[test]
    fn test_join_restores_pair() {
        let original = bold();
        let mut c = Container::new(original.clone());
        c.split(0, &[5]).unwrap();
        c.join_all().unwrap();
        assert_eq!(c.len(), 1);
        assert!(!c.is_segmented());
        let joined = &c.parts()[0].source;
        assert_eq!(joined.coded_text(), original.coded_text());
        assert_eq!(joined.codes()[0].id(), joined.codes()[1].id());
    }

    #[test]
    fn test_join_state_and_whitespace() {
        let mut c = Container::new(Fragment::from_text("A").unwrap());
        c.append_segment(Fragment::from_text("B").unwrap());
        c.parts[0].state = TargetState::Final;
        c.parts[1].state = TargetState::Translated;
        c.parts[1].preserve_ws = true;
        c.join(0..2).unwrap();
        assert_eq!(c.parts()[0].state, TargetState::Translated);
        assert!(c.parts()[0].preserve_ws);
        assert_eq!(c.parts()[0].source.text(), "AB");
    }

    #[test]
    fn test_join_targets() {
        let fr = LocaleId::new("fr");
        let mut c = Container::new(Fragment::from_text("One.").unwrap());
        c.append_ignorable(Fragment::from_text(" ").unwrap());
        c.append_segment(Fragment::from_text("Two.").unwrap());
        c.part_mut(0).unwrap().set_target(fr.clone(), Fragment::from_text("Un.").unwrap());
        c.join_all().unwrap();
        assert_eq!(c.parts()[0].target(&fr).map(|t| t.text()), Some("Un. Two.".into()));
    }

    #[test]
    fn test_split_not_resegmentable() {
        let fr = LocaleId::new("fr");
        let mut c = Container::new(Fragment::from_text("One. Two.").unwrap());
        c.part_mut(0).unwrap().can_resegment = false;
        assert!(matches!(c.split(0, &[4]), Err(Error::NotResegmentable(0))));
        assert!(matches!(
            c.split_aligned(0, &[4], &BTreeMap::new()),
            Err(Error::NotResegmentable(0))
        ));
        assert_eq!(c.len(), 1);

        c.part_mut(0).unwrap().set_target(fr.clone(), Fragment::from_text("Un. Deux.").unwrap());
        let mut offsets = BTreeMap::new();
        offsets.insert(fr, vec![3]);
        assert!(c.split_aligned(0, &[4], &offsets).is_err());
        assert_eq!(c.parts()[0].source.text(), "One. Two.");
    }

    #[test]
    fn test_join_not_resegmentable() {
        let mut c = Container::new(Fragment::from_text("A").unwrap());
        c.append_segment(Fragment::from_text("B").unwrap()).can_resegment = false;
        c.append_segment(Fragment::from_text("C").unwrap());
        c.append_segment(Fragment::from_text("D").unwrap());
        assert!(matches!(c.join(0..2), Err(Error::NotResegmentable(1))));

        c.join_all().unwrap();
        let texts: Vec<String> = c.parts().iter().map(|p| p.source.text()).collect();
        assert_eq!(texts, vec!["A", "B", "CD"]);
    }

    #[test]
    fn test_split_join_idempotence() {
        let mut c = Container::new(Fragment::from_text("One. Two. Three.").unwrap());
        c.split(0, &[4, 9]).unwrap();
        let before: Vec<(String, String)> = c.parts().iter().map(|p| (p.id.clone(), p.source.coded_text())).collect();

        c.join_all().unwrap();
        c.split(0, &[4, 9]).unwrap();
        let after: Vec<(String, String)> = c.parts().iter().map(|p| (p.id.clone(), p.source.coded_text())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_nested_pairs_across_segments() {
        let mut first = Fragment::new();
        first.append_code(Code::opening("g", "<g1>")).unwrap();
        first.append_code(Code::opening("g", "<g2>")).unwrap();
        first.append_text("te").unwrap();
        let mut second = Fragment::from_text("xt").unwrap();
        second.append_code(Code::closing("g", "</g2>")).unwrap();
        second.append_code(Code::closing("g", "</g1>")).unwrap();

        let mut c = Container::new(first);
        c.append_segment(second);
        c.join_all().unwrap();
        let ids: Vec<i32> = c.parts()[0].source.codes().iter().map(Code::id).collect();
        assert_eq!(ids, vec![1, 2, 2, 1]);
    }

    #[test]
    fn test_full_target_policy() {
        let fr = LocaleId::new("fr");
        let mut c = Container::new(Fragment::from_text("One.").unwrap());
        c.append_ignorable(Fragment::from_text(" ").unwrap());
        c.append_segment(Fragment::from_text("Two.").unwrap());
        c.part_mut(2).unwrap().set_target(fr.clone(), Fragment::from_text("Deux.").unwrap());
        assert_eq!(c.full_target(&fr, MissingTarget::CopySource).unwrap().text(), "One. Deux.");
        assert_eq!(c.full_target(&fr, MissingTarget::Empty).unwrap().text(), " Deux.");
    }
}
