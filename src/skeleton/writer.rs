//! Skeleton-driven reconstruction of documents.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::encoder::EncoderContext;
use super::options::WriterOptions;
use super::{Skeleton, SkeletonPart};
use crate::detect::normalize_line_breaks;
use crate::error::{Error, Result};
use crate::model::{Code, Event, Fragment, LocaleId, MissingTarget, Part, Piece, Properties, TextUnit};

/// Id standing for the resource holding the marker.
const SELF_ID: &str = "$self$";
const MAX_REFERENCE_DEPTH: usize = 32;
/// `[#$id]` or `[#$id@%property]`
static REFERENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[#\$([^\]@]+)(?:@%([^\]]+))?\]").expect("reference marker pattern is valid"));

#[derive(Clone, Copy)]
enum Owner<'a> {
    Unit(&'a TextUnit),
    Other {
        id: &'a str,
        properties: Option<&'a Properties>,
    },
}

impl<'a> Owner<'a> {
    fn id(&self) -> &'a str {
        match *self {
            Owner::Unit(tu) => &tu.id,
            Owner::Other { id, .. } => id,
        }
    }

    fn properties(&self) -> Option<&'a Properties> {
        match *self {
            Owner::Unit(tu) => Some(&tu.properties),
            Owner::Other { properties, .. } => properties,
        }
    }
}

#[derive(Debug)]
struct GroupCapture {
    id: String,
    depth: usize,
    events: Vec<Event>,
}

/// Rebuilds documents from events.
///
/// Referent resources are stored when they go by and only written where a
/// skeleton or a code references them. An unresolved reference, a reference
/// to a missing segment or a content reference outside a text unit is an
/// error for the current document; a missing target never is.
#[derive(Debug)]
pub struct SkeletonWriter {
    options: WriterOptions,
    source_locale: LocaleId,
    output_locale: LocaleId,
    referents: HashMap<String, Vec<Event>>,
    capture: Option<GroupCapture>,
}

impl SkeletonWriter {
    /// Create a writer.
    pub fn new(options: WriterOptions) -> Self {
        let output_locale = options.locale.clone().unwrap_or_default();
        Self {
            options,
            source_locale: LocaleId::default(),
            output_locale,
            referents: HashMap::new(),
            capture: None,
        }
    }

    /// Writer options.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Locale being written.
    pub fn output_locale(&self) -> &LocaleId {
        &self.output_locale
    }

    /// Check if the source content is being written.
    pub fn is_source_output(&self) -> bool {
        self.output_locale == self.source_locale
    }

    /// Process a sequence of events and return the concatenated output.
    pub fn write_events<'e>(&mut self, events: impl IntoIterator<Item = &'e Event>) -> Result<String> {
        let mut out = String::new();
        for event in events {
            out.push_str(&self.process(event)?);
        }
        Ok(out)
    }

    /// Process one event and return its output.
    pub fn process(&mut self, event: &Event) -> Result<String> {
        if self.capture_event(event) {
            return Ok(String::new());
        }

        let mut out = String::new();
        match event {
            Event::StartDocument(sd) => {
                self.source_locale = sd.locale.clone();
                self.output_locale = self.options.locale.clone().unwrap_or_else(|| sd.locale.clone());
                self.referents.clear();
                out.push_str(&self.render_event(event, 0)?);
            }
            Event::EndDocument(_) => {
                out.push_str(&self.render_event(event, 0)?);
                if !self.referents.is_empty() {
                    log::debug!("{} referent(s) stored for the document", self.referents.len());
                }
                self.referents.clear();
            }
            Event::StartGroup(group) if group.is_referent => {
                self.capture = Some(GroupCapture {
                    id: group.id.clone(),
                    depth: 1,
                    events: vec![event.clone()],
                });
            }
            e if e.is_referent() => {
                self.referents.insert(e.id().to_string(), vec![e.clone()]);
            }
            _ => out.push_str(&self.render_event(event, 0)?),
        }

        Ok(match self.options.line_break {
            Some(line_break) => normalize_line_breaks(&out, line_break).into_owned(),
            None => out,
        })
    }

    fn capture_event(&mut self, event: &Event) -> bool {
        let Some(capture) = self.capture.as_mut() else {
            return false;
        };
        match event {
            Event::StartGroup(_) => capture.depth += 1,
            Event::EndGroup(_) => capture.depth -= 1,
            _ => {}
        }
        capture.events.push(event.clone());
        if capture.depth == 0 {
            if let Some(done) = self.capture.take() {
                self.referents.insert(done.id, done.events);
            }
        }
        true
    }

    // ==================== Resources ====================

    fn render_event(&self, event: &Event, depth: usize) -> Result<String> {
        let (skeleton, owner) = match event {
            Event::TextUnit(tu) => match &tu.skeleton {
                Some(skeleton) => (skeleton, Owner::Unit(tu)),
                None => return self.render_unit_content(tu, None, depth),
            },
            other => match other.skeleton() {
                Some(skeleton) => (
                    skeleton,
                    Owner::Other {
                        id: other.id(),
                        properties: event_properties(other),
                    },
                ),
                None => return Ok(String::new()),
            },
        };
        self.render_skeleton(skeleton, owner, depth)
    }

    fn render_skeleton(&self, skeleton: &Skeleton, owner: Owner<'_>, depth: usize) -> Result<String> {
        let mut out = String::new();
        for part in skeleton.parts() {
            match part {
                SkeletonPart::Text { text } => out.push_str(text),
                SkeletonPart::Content { locale } => match owner {
                    Owner::Unit(tu) => out.push_str(&self.render_unit_content(tu, locale.as_ref(), depth)?),
                    Owner::Other { id, .. } => return Err(Error::InvalidSelfReference(id.to_string())),
                },
                SkeletonPart::Segment { id, locale } => match owner {
                    Owner::Unit(tu) => out.push_str(&self.render_segment(tu, id, locale.as_ref(), depth)?),
                    Owner::Other { id, .. } => return Err(Error::InvalidSelfReference(id.to_string())),
                },
                SkeletonPart::Reference { id } => {
                    out.push_str(&self.render_referent(owner.id(), id, None, depth)?)
                }
                SkeletonPart::Property { name, locale } => {
                    out.push_str(&self.render_property(owner.properties(), owner.id(), name, locale.as_ref()))
                }
            }
        }
        Ok(out)
    }

    fn render_referent(&self, owner_id: &str, id: &str, property: Option<&str>, depth: usize) -> Result<String> {
        if depth >= MAX_REFERENCE_DEPTH {
            return Err(Error::Other(format!(
                "reference nesting too deep at '{}' in resource '{}'",
                id, owner_id
            )));
        }
        let events = self.referents.get(id).ok_or_else(|| {
            log::warn!("reference to unknown resource '{}' in '{}'", id, owner_id);
            Error::UnresolvedReference {
                resource_id: owner_id.to_string(),
                reference: id.to_string(),
            }
        })?;

        if let Some(name) = property {
            let properties = events.first().and_then(event_properties);
            return Ok(self.render_property(properties, id, name, None));
        }
        let mut out = String::new();
        for event in events {
            out.push_str(&self.render_event(event, depth + 1)?);
        }
        Ok(out)
    }

    fn render_property(
        &self,
        properties: Option<&Properties>,
        owner_id: &str,
        name: &str,
        locale: Option<&LocaleId>,
    ) -> String {
        let locale = self.locale_for(locale);
        let target_locale = (*locale != self.source_locale).then_some(locale);
        match properties.and_then(|p| p.resolve(name, target_locale)) {
            Some(value) => self.options.encoder.encode(value, EncoderContext::Text).into_owned(),
            None => {
                log::warn!("property '{}' not found in resource '{}'", name, owner_id);
                String::new()
            }
        }
    }

    // ==================== Content ====================

    fn render_unit_content(&self, tu: &TextUnit, locale: Option<&LocaleId>, depth: usize) -> Result<String> {
        let locale = self.locale_for(locale);
        if !tu.translatable || *locale == self.source_locale {
            let source = tu.container.full_source()?;
            return self.render_fragment(&source, tu, depth);
        }
        for part in tu.container.segments() {
            self.check_target(tu, part, locale);
        }
        let target = tu.container.full_target(locale, self.options.missing_target)?;
        self.render_fragment(&target, tu, depth)
    }

    fn render_segment(
        &self,
        tu: &TextUnit,
        segment_id: &str,
        locale: Option<&LocaleId>,
        depth: usize,
    ) -> Result<String> {
        let part = tu
            .container
            .segment(segment_id)
            .ok_or_else(|| Error::OrphanedSegment {
                resource_id: tu.id.clone(),
                segment_id: segment_id.to_string(),
            })?;
        let locale = self.locale_for(locale);
        if !tu.translatable || *locale == self.source_locale {
            return self.render_fragment(&part.source, tu, depth);
        }
        self.check_target(tu, part, locale);
        let content = part.target_or(locale, self.options.missing_target);
        self.render_fragment(&content, tu, depth)
    }

    fn render_fragment(&self, fragment: &Fragment, tu: &TextUnit, depth: usize) -> Result<String> {
        let mut out = String::new();
        for piece in fragment.pieces() {
            match piece {
                Piece::Text(text) => out.push_str(&self.options.encoder.encode(text, EncoderContext::Text)),
                Piece::Code(code) => out.push_str(&self.render_code(code, tu, depth)?),
            }
        }
        Ok(out)
    }

    fn render_code(&self, code: &Code, tu: &TextUnit, depth: usize) -> Result<String> {
        let mut body = String::new();
        let mut last = 0;
        let data = code.markup();
        for caps in REFERENCE_MARKER.captures_iter(data) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            body.push_str(&self.encode_inline(&data[last..whole.start()]));
            let id = caps.get(1).map_or("", |m| m.as_str());
            let property = caps.get(2).map(|m| m.as_str());
            let expanded = if id == SELF_ID {
                match property {
                    Some(name) => self.render_property(Some(&tu.properties), &tu.id, name, None),
                    None => self.render_unit_content(tu, None, depth + 1)?,
                }
            } else {
                self.render_referent(&tu.id, id, property, depth + 1)?
            };
            body.push_str(&expanded);
            last = whole.end();
        }
        body.push_str(&self.encode_inline(&data[last..]));
        Ok(body)
    }

    // ==================== Helpers ====================

    fn locale_for<'l>(&'l self, locale: Option<&'l LocaleId>) -> &'l LocaleId {
        locale.unwrap_or(&self.output_locale)
    }

    fn check_target(&self, tu: &TextUnit, part: &Part, locale: &LocaleId) {
        if !part.has_target(locale) && self.options.missing_target == MissingTarget::CopySource {
            log::warn!(
                "no {} target for segment '{}' of '{}', writing the source",
                locale,
                part.id,
                tu.id
            );
        }
    }

    fn encode_inline(&self, text: &str) -> String {
        self.options.encoder.encode(text, EncoderContext::Inline).into_owned()
    }
}

fn event_properties(event: &Event) -> Option<&Properties> {
    match event {
        Event::StartDocument(r) => Some(&r.properties),
        Event::StartSubDocument(r) => Some(&r.properties),
        Event::StartGroup(r) => Some(&r.properties),
        Event::TextUnit(r) => Some(&r.properties),
        Event::DocumentPart(r) => Some(&r.properties),
        _ => None,
    }
}
