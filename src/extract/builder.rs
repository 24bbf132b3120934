//! Shared event assembly for filters.

use std::collections::VecDeque;

use super::{Diagnostic, DiagnosticKind, RawDocument};
use crate::error::Result;
use crate::model::{Container, DocumentPart, Ending, Event, Fragment, StartDocument, TextUnit};
use crate::skeleton::SkeletonBuilder;

/// Turns skeleton text and content fragments into events.
///
/// Skeleton accumulates until content arrives; it is then emitted as a
/// document part ahead of the text unit. Whitespace around the content goes
/// to the text unit's own skeleton.
#[derive(Debug)]
pub(crate) struct EventBuilder {
    pending: VecDeque<Event>,
    skeleton: SkeletonBuilder,
    mime_type: String,
    next_tu: usize,
    next_dp: usize,
    diagnostics: Vec<Diagnostic>,
}

impl EventBuilder {
    pub(crate) fn new(mime_type: &str) -> Self {
        Self {
            pending: VecDeque::new(),
            skeleton: SkeletonBuilder::new(),
            mime_type: mime_type.to_string(),
            next_tu: 0,
            next_dp: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn start_document(&mut self, document: &RawDocument, filter_id: &str) {
        let mut sd = StartDocument::new(document.id.clone(), document.source_locale.clone());
        sd.name = document.name.clone();
        sd.encoding = document.format.encoding.name().to_string();
        sd.has_bom = document.format.has_bom;
        sd.line_break = document.format.line_break;
        sd.mime_type = Some(self.mime_type.clone());
        sd.filter_id = Some(filter_id.to_string());
        self.pending.push_back(Event::StartDocument(sd));
    }

    pub(crate) fn end_document(&mut self) {
        let mut ending = Ending::new("ed1");
        if !self.skeleton.is_empty() {
            ending = ending.with_skeleton(self.skeleton.take());
        }
        self.pending.push_back(Event::EndDocument(ending));
    }

    pub(crate) fn pop(&mut self) -> Option<Event> {
        self.pending.pop_front()
    }

    pub(crate) fn skeleton(&mut self) -> &mut SkeletonBuilder {
        &mut self.skeleton
    }

    pub(crate) fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn diagnose(&mut self, kind: DiagnosticKind, resource_id: &str, message: String) {
        log::warn!("{}: {}", resource_id, message);
        self.diagnostics.push(Diagnostic {
            kind,
            resource_id: resource_id.to_string(),
            message,
        });
    }

    /// Id the next text unit will get.
    fn next_unit_id(&mut self) -> String {
        self.next_tu += 1;
        format!("tu{}", self.next_tu)
    }

    /// Emit a referent text unit holding `text`; returns its id.
    pub(crate) fn add_referent(&mut self, text: &str) -> Result<String> {
        let source = Fragment::from_text(text)?;
        let id = self.next_unit_id();
        let mut tu = TextUnit::new(id.clone(), Container::new(source));
        tu.is_referent = true;
        tu.mime_type = Some(self.mime_type.clone());
        self.pending.push_back(Event::from(tu));
        Ok(id)
    }

    /// Add content. A fragment without text (and without references to
    /// referents) goes to the skeleton as markup.
    pub(crate) fn add_content(&mut self, mut fragment: Fragment) {
        let has_refs = fragment.codes().iter().any(|c| c.has_reference());
        if !fragment.has_text() && !has_refs {
            self.skeleton.text(&fragment.to_markup());
            return;
        }

        let coded = fragment.coded_text();
        let lead: String = coded.chars().take_while(|c| c.is_whitespace()).collect();
        let trail: String = {
            let rest = &coded[lead.len()..];
            let trimmed = rest.trim_end_matches(char::is_whitespace);
            rest[trimmed.len()..].to_string()
        };
        let len = fragment.len();
        let lead_len = lead.chars().count();
        let trail_len = trail.chars().count();
        if lead_len + trail_len > 0 {
            match fragment.sub_fragment(lead_len..len - trail_len) {
                Ok(core) => fragment = core,
                Err(e) => {
                    self.diagnose(DiagnosticKind::Other, "content", e.to_string());
                    self.skeleton.text(&fragment.to_markup());
                    return;
                }
            }
        }

        let id = self.next_unit_id();
        let report = fragment.balance();
        for index in &report.demoted {
            if let Some(code) = fragment.code(*index) {
                let message = format!("unmatched {:?} code '{}' kept as placeholder", code.role(), code.data);
                self.diagnose(DiagnosticKind::DemotedCode, &id, message);
            }
        }

        if !self.skeleton.is_empty() {
            self.next_dp += 1;
            let dp = DocumentPart::new(format!("dp{}", self.next_dp), self.skeleton.take());
            self.pending.push_back(Event::from(dp));
        }
        let mut skeleton = SkeletonBuilder::new();
        skeleton.text(&lead).content().text(&trail);
        let mut tu = TextUnit::new(id, Container::new(fragment)).with_skeleton(skeleton.build());
        tu.mime_type = Some(self.mime_type.clone());
        self.pending.push_back(Event::from(tu));
    }
}
