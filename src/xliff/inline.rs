//! Inline content of a unit: codes numbered across the whole unit, and
//! annotation markers.
//!
//! Codes are numbered over the concatenation of all parts, so a pair split
//! between two segments keeps one id and codes of different segments never
//! share one. `isolated` marks only a half whose partner is nowhere in the
//! unit. Target codes take the id of the source code they correspond to.
//!
//! A code carrying annotations stands for a marker: a pair whose halves are
//! in the same fragment becomes `mrk`, a pair spread over parts becomes
//! `sm`/`em`, and a single code is wrapped in its own `mrk`.

use std::collections::{HashMap, HashSet};

use super::{to_safe_xml, to_xml};
use crate::model::{
    AnnotationItem, AnnotationStore, Annotations, AnnotatorsRef, Code, CodeRole, Fragment, LocaleId, Part,
    Piece, StandoffGroup, TagType, TextUnit,
};

/// Stand-off forms: item kind, reference attribute, group element, item element.
const STANDOFF: &[(&str, &str, &str, &str)] = &[
    ("locQualityIssue", "locQualityIssuesRef", "locQualityIssues", "locQualityIssue"),
    ("provenance", "provenanceRecordsRef", "provenanceRecords", "provenanceRecord"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Start,
    End,
    IsolatedStart,
    IsolatedEnd,
    Standalone,
}

impl Shape {
    fn of(code: &Code) -> Self {
        match (code.tag_type(), code.role()) {
            (TagType::Opening, _) => Shape::Start,
            (TagType::Closing, _) => Shape::End,
            (_, CodeRole::Opening) => Shape::IsolatedStart,
            (_, CodeRole::Closing) => Shape::IsolatedEnd,
            (_, CodeRole::Standalone) => Shape::Standalone,
        }
    }

    fn is_paired(self) -> bool {
        matches!(self, Shape::Start | Shape::End)
    }
}

/// Placement of one code in its unit.
#[derive(Debug, Clone)]
struct Slot {
    id: i32,
    shape: Shape,
    /// Both halves of the pair are in the same fragment
    local: bool,
    /// Annotations of the marker the code stands for
    marker: Option<Annotations>,
}

/// Code placement for every part of a unit.
#[derive(Debug, Default)]
pub(super) struct UnitCodes {
    sources: Vec<Vec<Slot>>,
    targets: Vec<Vec<Slot>>,
}

impl UnitCodes {
    pub(super) fn new(tu: &TextUnit, locale: Option<&LocaleId>) -> Self {
        let parts = tu.container.parts();
        let sources = number(&parts.iter().map(|p| Some(&p.source)).collect::<Vec<_>>());
        let targets = match locale {
            Some(locale) => {
                let mut targets = number(&parts.iter().map(|p| p.target(locale)).collect::<Vec<_>>());
                align(&mut targets, &sources, parts, locale);
                targets
            }
            None => Vec::new(),
        };
        Self { sources, targets }
    }
}

/// Number the codes of a sequence of fragments as one content.
fn number(fragments: &[Option<&Fragment>]) -> Vec<Vec<Slot>> {
    let mut full = Fragment::new();
    for fragment in fragments.iter().flatten() {
        if let Err(e) = full.append_raw(fragment) {
            log::warn!("numbering codes per fragment: {}", e);
            return fragments.iter().map(|f| f.map(local_slots).unwrap_or_default()).collect();
        }
    }
    full.balance();
    let mut slots = slots_of(full.codes()).into_iter();
    fragments
        .iter()
        .map(|f| {
            let mut chunk: Vec<Slot> = slots.by_ref().take(f.map_or(0, Fragment::code_count)).collect();
            mark_local(&mut chunk);
            chunk
        })
        .collect()
}

fn local_slots(fragment: &Fragment) -> Vec<Slot> {
    let mut slots = slots_of(fragment.codes());
    mark_local(&mut slots);
    slots
}

fn slots_of(codes: &[Code]) -> Vec<Slot> {
    // A pair is a marker when either half is annotated; the opening wins
    let mut pairs: HashMap<i32, &Annotations> = HashMap::new();
    for code in codes.iter().filter(|c| !c.annotations.is_empty()) {
        match code.tag_type() {
            TagType::Opening => {
                pairs.insert(code.id(), &code.annotations);
            }
            TagType::Closing => {
                pairs.entry(code.id()).or_insert(&code.annotations);
            }
            _ => {}
        }
    }
    codes
        .iter()
        .map(|code| {
            let shape = Shape::of(code);
            let marker = if shape.is_paired() {
                pairs.get(&code.id()).map(|a| (*a).clone())
            } else if code.annotations.is_empty() {
                None
            } else {
                Some(code.annotations.clone())
            };
            Slot {
                id: code.id(),
                shape,
                local: false,
                marker,
            }
        })
        .collect()
}

fn mark_local(slots: &mut [Slot]) {
    let ids = |shape: Shape| -> HashSet<i32> { slots.iter().filter(|s| s.shape == shape).map(|s| s.id).collect() };
    let (starts, ends) = (ids(Shape::Start), ids(Shape::End));
    for slot in slots.iter_mut() {
        slot.local = slot.shape.is_paired() && starts.contains(&slot.id) && ends.contains(&slot.id);
    }
}

/// Give target codes the id of the matching source code of the same part.
///
/// Both halves of a target pair take the id found for its opening. Codes
/// without counterpart get ids above every source id.
fn align(targets: &mut [Vec<Slot>], sources: &[Vec<Slot>], parts: &[Part], locale: &LocaleId) {
    let mut fresh = sources.iter().flatten().map(|s| s.id).max().unwrap_or(0) + 1;
    let mut used = HashSet::new();
    let mut pairs: HashMap<i32, i32> = HashMap::new();
    for ((part, slots), source_slots) in parts.iter().zip(targets.iter_mut()).zip(sources) {
        let Some(target) = part.target(locale) else {
            continue;
        };
        let source_codes = part.source.codes();
        let mut taken = vec![false; source_codes.len()];
        for (code, slot) in target.codes().iter().zip(slots.iter_mut()) {
            let matched = source_codes
                .iter()
                .zip(&taken)
                .position(|(s, &taken)| !taken && s.signature() == code.signature());
            if let Some(k) = matched {
                taken[k] = true;
            }
            if let Some(&id) = pairs.get(&slot.id).filter(|_| slot.shape.is_paired()) {
                slot.id = id;
                continue;
            }
            let id = match matched.and_then(|k| source_slots.get(k)) {
                Some(source) if used.insert(source.id) => source.id,
                _ => {
                    while !used.insert(fresh) {
                        fresh += 1;
                    }
                    fresh
                }
            };
            if slot.shape.is_paired() {
                pairs.insert(slot.id, id);
            }
            slot.id = id;
        }
    }
}

/// Check if writing a unit needs the ITS namespace.
pub(super) fn uses_its(tu: &TextUnit) -> bool {
    let annotated = |f: &Fragment| f.codes().iter().any(|c| !c.annotations.is_empty());
    tu.container
        .parts()
        .iter()
        .any(|p| annotated(&p.source) || p.targets.values().any(annotated))
        || tu.matches.iter().any(|m| annotated(&m.source) || annotated(&m.target))
        || tu.store.iter().any(|(_, g)| standoff_form(g).is_some())
}

/// Unit-level stand-off elements for the groups of a store.
pub(super) fn standoff_elements(store: &AnnotationStore, its: &str, lb: &str) -> String {
    let mut out = String::new();
    for (_, group) in store.iter() {
        let Some(&(_, _, element, item_element)) = standoff_form(group) else {
            continue;
        };
        out.push_str(&format!("<{}:{} xml:id=\"{}\">{}", its, element, to_xml(&group.id, true), lb));
        for item in &group.items {
            out.push_str(&format!("<{}:{}", its, item_element));
            for (name, value) in &item.fields {
                out.push_str(&format!(" {}=\"{}\"", its_name(&item.kind, name), to_xml(value, true)));
            }
            out.push_str("/>");
            out.push_str(lb);
        }
        out.push_str(&format!("</{}:{}>{}", its, element, lb));
    }
    out
}

/// The stand-off form of a group whose items all have one kind.
fn standoff_form(group: &StandoffGroup) -> Option<&'static (&'static str, &'static str, &'static str, &'static str)> {
    let kind = &group.items.first()?.kind;
    if group.items.iter().any(|i| &i.kind != kind) {
        return None;
    }
    STANDOFF.iter().find(|form| form.0 == kind.as_str())
}

/// ITS attribute name of an item field: `severity` of a `locQualityIssue`
/// is `locQualityIssueSeverity`, `value` is the kind itself.
fn its_name(kind: &str, field: &str) -> String {
    if field == "value" {
        return kind.to_string();
    }
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", kind, first.to_uppercase(), chars.as_str()),
        None => kind.to_string(),
    }
}

/// Writes the source and target content of one unit.
pub(super) struct InlineWriter<'a> {
    codes: &'a UnitCodes,
    data: &'a HashMap<String, String>,
    store: &'a AnnotationStore,
    its: &'a str,
    annotators: AnnotatorsRef,
}

impl<'a> InlineWriter<'a> {
    /// `annotators` is the cascade of the levels enclosing the unit content.
    pub(super) fn new(
        codes: &'a UnitCodes,
        data: &'a HashMap<String, String>,
        store: &'a AnnotationStore,
        its: &'a str,
        annotators: AnnotatorsRef,
    ) -> Self {
        Self {
            codes,
            data,
            store,
            its,
            annotators,
        }
    }

    /// Source of the part at `index`.
    pub(super) fn source(&self, index: usize, fragment: &Fragment) -> String {
        self.render(fragment, self.codes.sources.get(index))
    }

    /// Target of the part at `index`.
    pub(super) fn target(&self, index: usize, fragment: &Fragment) -> String {
        self.render(fragment, self.codes.targets.get(index))
    }

    /// Content outside the unit parts, numbered on its own.
    pub(super) fn standalone(&self, fragment: &Fragment) -> String {
        self.render(fragment, None)
    }

    fn render(&self, fragment: &Fragment, slots: Option<&Vec<Slot>>) -> String {
        let owned;
        let slots = match slots {
            Some(slots) if slots.len() == fragment.code_count() => slots.as_slice(),
            _ => {
                owned = local_slots(fragment);
                owned.as_slice()
            }
        };
        let spans = spans(slots);
        let mut scopes = vec![self.annotators.clone()];
        let mut out = String::new();
        let mut slots = slots.iter();
        for piece in fragment.pieces() {
            let (code, slot) = match piece {
                Piece::Text(text) => {
                    out.push_str(&to_safe_xml(text));
                    continue;
                }
                Piece::Code(code) => match slots.next() {
                    Some(slot) => (code, slot),
                    None => continue,
                },
            };
            let element = self.code_element(code, slot);
            let Some(annotations) = &slot.marker else {
                out.push_str(&element);
                continue;
            };
            let parent = scopes.last().cloned().unwrap_or_default();
            let attributes = self.marker_attributes(annotations, &parent);
            match slot.shape {
                Shape::Start if spans.contains(&slot.id) => {
                    out.push_str(&format!("<mrk id=\"m{}\"{}>{}", slot.id, attributes, element));
                    scopes.push(AnnotatorsRef::cascade([Some(&parent), annotations.annotators_ref()]));
                }
                Shape::End if spans.contains(&slot.id) => {
                    out.push_str(&element);
                    out.push_str("</mrk>");
                    scopes.pop();
                }
                Shape::Start => out.push_str(&format!("<sm id=\"m{}\"{}/>{}", slot.id, attributes, element)),
                Shape::End => out.push_str(&format!("{}<em startRef=\"m{}\"/>", element, slot.id)),
                _ => out.push_str(&format!("<mrk id=\"m{}\"{}>{}</mrk>", slot.id, attributes, element)),
            }
        }
        out
    }

    /// `sc`/`ec`/`ph` for a code. A marker without original data has none.
    fn code_element(&self, code: &Code, slot: &Slot) -> String {
        if slot.marker.is_some() && code.markup().is_empty() {
            return String::new();
        }
        let mut attrs = String::new();
        if let Some(data_id) = self.data.get(code.markup()) {
            attrs.push_str(&format!(" dataRef=\"{}\"", data_id));
        }
        if let Some(display) = &code.display_text {
            attrs.push_str(&format!(" disp=\"{}\"", to_xml(display, true)));
        }
        if !code.deleteable {
            attrs.push_str(" canDelete=\"no\"");
        }
        if !code.cloneable {
            attrs.push_str(" canCopy=\"no\"");
        }
        let id = slot.id;
        match slot.shape {
            Shape::Start => format!("<sc id=\"{}\"{}/>", id, attrs),
            Shape::End => format!("<ec startRef=\"{}\"{}/>", id, attrs),
            Shape::IsolatedStart => format!("<sc id=\"{}\" isolated=\"yes\"{}/>", id, attrs),
            Shape::IsolatedEnd => format!("<ec id=\"{}\" isolated=\"yes\"{}/>", id, attrs),
            Shape::Standalone => format!("<ph id=\"{}\"{}/>", id, attrs),
        }
    }

    /// `type`, ITS data and `annotatorsRef` of a marker.
    fn marker_attributes(&self, annotations: &Annotations, parent: &AnnotatorsRef) -> String {
        let p = self.its;
        let mut out = String::new();
        let mut items: Vec<&AnnotationItem> = annotations.inline_items().collect();
        if let Some(group) = annotations.group().and_then(|g| self.store.get(g)) {
            match standoff_form(group) {
                Some(&(_, reference, ..)) => {
                    out.push_str(&format!(" {}:{}=\"#its={}\"", p, reference, to_xml(&group.id, true)))
                }
                None => items.extend(group.items.iter().filter(|i| annotations.get(&i.kind).is_none())),
            }
        }
        for item in &items {
            for (name, value) in &item.fields {
                out.push_str(&format!(" {}:{}=\"{}\"", p, its_name(&item.kind, name), to_xml(value, true)));
            }
        }
        if !out.is_empty() {
            out.insert_str(0, " type=\"its:any\"");
        }
        let current = AnnotatorsRef::cascade([Some(parent), annotations.annotators_ref()]);
        if let Some(value) = current.print_differences(Some(parent)) {
            out.push_str(&format!(" {}:annotatorsRef=\"{}\"", p, to_xml(&value, true)));
        }
        out
    }
}

/// Ids of marker pairs written as one `mrk` element: both halves in the
/// fragment and no overlap with another such pair.
fn spans(slots: &[Slot]) -> HashSet<i32> {
    let mut open: Vec<i32> = Vec::new();
    let mut spans = HashSet::new();
    for slot in slots.iter().filter(|s| s.local && s.marker.is_some()) {
        match slot.shape {
            Shape::Start => open.push(slot.id),
            Shape::End if open.last() == Some(&slot.id) => {
                open.pop();
                spans.insert(slot.id);
            }
            Shape::End => open.retain(|&id| id != slot.id),
            _ => {}
        }
    }
    spans
}
