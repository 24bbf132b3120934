//! XLIFF 2 serialization of events.

use std::collections::HashMap;
use std::io::Write;

use super::ext_writer::ExtensionsWriter;
use super::flavor::FlavorRules;
use super::inline::{self, InlineWriter, UnitCodes};
use super::ns::NsStack;
use super::options::XliffOptions;
use super::{to_safe_xml, to_xml, NS_GLOSSARY, NS_ITS, NS_MATCHES, NS_METADATA, NS_XLIFF};
use crate::error::{Error, Result};
use crate::model::{
    AnnotatorsRef, Event, ExtAttributes, ExtElement, Fragment, GlossEntry, Match, MetadataGroup, Note, Part,
    StartDocument, StartGroup, TargetState, TextUnit,
};

/// Writes events as an XLIFF 2 document.
///
/// Text units outside any sub-document go to an implicit `file` element.
/// Document parts carry no translatable content and are not written.
#[derive(Debug)]
pub struct XliffWriter<W: Write> {
    sink: Option<W>,
    options: XliffOptions,
    ns: NsStack,
    ext: ExtensionsWriter,
    lb: &'static str,
    in_document: bool,
    in_file: bool,
    files: usize,
    annotators: Vec<Option<AnnotatorsRef>>,
}

impl<W: Write> XliffWriter<W> {
    /// Create a writer over a sink.
    pub fn new(sink: W, options: XliffOptions) -> Self {
        Self {
            sink: Some(sink),
            ext: ExtensionsWriter::new(options.line_break),
            lb: options.line_break.as_str(),
            options,
            ns: NsStack::new(NS_XLIFF),
            in_document: false,
            in_file: false,
            files: 0,
            annotators: Vec::new(),
        }
    }

    /// Writer options.
    pub fn options(&self) -> &XliffOptions {
        &self.options
    }

    /// The sink.
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Write one event.
    pub fn write_event(&mut self, event: &Event) -> Result<()> {
        if !self.in_document && !matches!(event, Event::StartDocument(_)) {
            return Err(Error::Other(format!(
                "event '{}' written before the start of a document",
                event.id()
            )));
        }
        let out = match event {
            Event::StartDocument(sd) => self.start_document(sd),
            Event::StartSubDocument(sub) => {
                let mut out = self.close_file();
                out.push_str(&self.start_file(
                    &sub.id,
                    sub.name.as_deref(),
                    sub.annotators_ref.as_ref(),
                    &sub.notes,
                    &sub.ext_attributes,
                    &sub.ext_elements,
                ));
                out
            }
            Event::StartGroup(group) => self.start_group(group),
            Event::TextUnit(tu) => self.unit(tu),
            Event::DocumentPart(_) => String::new(),
            Event::EndGroup(_) => {
                self.ns.pop();
                self.annotators.pop();
                format!("</group>{}", self.lb)
            }
            Event::EndSubDocument(_) => self.close_file(),
            Event::EndDocument(_) => self.end_document(),
        };
        self.emit(&out)
    }

    /// Write a sequence of events.
    pub fn write_all<'e>(&mut self, events: impl IntoIterator<Item = &'e Event>) -> Result<()> {
        for event in events {
            self.write_event(event)?;
        }
        Ok(())
    }

    /// Flush and return the sink.
    pub fn finish(mut self) -> Result<W> {
        let mut sink = self
            .sink
            .take()
            .ok_or_else(|| Error::Other("XLIFF writer is finished".to_string()))?;
        sink.flush()?;
        Ok(sink)
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        match self.sink.as_mut() {
            Some(sink) => Ok(sink.write_all(text.as_bytes())?),
            None => Err(Error::Other("XLIFF writer is finished".to_string())),
        }
    }

    fn rules(&self) -> &'static FlavorRules {
        self.options.flavor.rules()
    }

    fn target_of<'p>(&self, part: &'p Part) -> Option<&'p Fragment> {
        self.options.target_locale.as_ref().and_then(|l| part.target(l))
    }

    // ==================== Structure ====================

    fn start_document(&mut self, sd: &StartDocument) -> String {
        self.in_document = true;
        self.in_file = false;
        self.files = 0;
        self.ns = NsStack::new(NS_XLIFF);
        self.annotators = vec![sd.annotators_ref.clone()];

        self.ns.push();
        let mut out = format!(
            "<?xml version=\"1.0\"?>{}<xliff xmlns=\"{}\" version=\"2.0\" srcLang=\"{}\"",
            self.lb,
            NS_XLIFF,
            to_xml(&sd.locale.to_bcp47(), true)
        );
        if let Some(target) = &self.options.target_locale {
            out.push_str(&format!(" trgLang=\"{}\"", to_xml(&target.to_bcp47(), true)));
        }
        if let Some((prefix, uri)) = self.rules().namespace {
            if let (_, Some(declaration)) = self.ns.ensure_prefixed(uri, Some(prefix)) {
                out.push_str(&declaration);
            }
        }
        out.push_str(&self.annotators_attribute());
        out.push('>');
        out.push_str(self.lb);
        out
    }

    fn end_document(&mut self) -> String {
        let mut out = self.close_file();
        out.push_str("</xliff>");
        out.push_str(self.lb);
        self.ns.pop();
        self.annotators.clear();
        self.in_document = false;
        out
    }

    fn start_file(
        &mut self,
        id: &str,
        original: Option<&str>,
        annotators: Option<&AnnotatorsRef>,
        notes: &[Note],
        ext_attributes: &ExtAttributes,
        ext_elements: &[ExtElement],
    ) -> String {
        self.files += 1;
        self.in_file = true;
        self.annotators.push(annotators.cloned());
        self.ns.push();

        let mut out = format!("<file id=\"{}\"", to_xml(id, true));
        if let Some(original) = original {
            out.push_str(&format!(" original=\"{}\"", to_xml(original, true)));
        }
        out.push_str(&self.annotators_attribute());
        out.push_str(&self.ext.attributes(&mut self.ns, ext_attributes));
        out.push('>');
        out.push_str(self.lb);
        out.push_str(&self.ext.elements(&mut self.ns, ext_elements));
        out.push_str(&self.notes(notes));
        out
    }

    fn ensure_file(&mut self) -> String {
        if self.in_file {
            return String::new();
        }
        let id = format!("f{}", self.files + 1);
        self.start_file(&id, None, None, &[], &ExtAttributes::new(), &[])
    }

    fn close_file(&mut self) -> String {
        if !self.in_file {
            return String::new();
        }
        self.in_file = false;
        self.ns.pop();
        self.annotators.pop();
        format!("</file>{}", self.lb)
    }

    fn start_group(&mut self, group: &StartGroup) -> String {
        let mut out = self.ensure_file();
        self.annotators.push(None);
        self.ns.push();

        out.push_str(&format!("<group id=\"{}\"", to_xml(&group.id, true)));
        if let Some(name) = &group.name {
            out.push_str(&format!(" name=\"{}\"", to_xml(name, true)));
        }
        if let Some(group_type) = &group.group_type {
            out.push_str(&format!(" type=\"{}\"", to_xml(group_type, true)));
        }
        out.push_str(&self.ext.attributes(&mut self.ns, &group.ext_attributes));
        out.push('>');
        out.push_str(self.lb);
        out.push_str(&self.ext.elements(&mut self.ns, &group.ext_elements));
        out.push_str(&self.notes(&group.notes));
        out
    }

    /// `its:annotatorsRef` for the innermost level, holding only what
    /// differs from the levels above it.
    fn annotators_attribute(&mut self) -> String {
        if !matches!(self.annotators.last(), Some(Some(_))) {
            return String::new();
        }
        let parents = &self.annotators[..self.annotators.len() - 1];
        let parent = AnnotatorsRef::cascade(parents.iter().map(Option::as_ref));
        let current = AnnotatorsRef::cascade(self.annotators.iter().map(Option::as_ref));
        let Some(value) = current.print_differences(Some(&parent)) else {
            return String::new();
        };
        let (prefix, declaration) = self.ns.ensure_prefixed(NS_ITS, Some("its"));
        format!(
            "{} {}:annotatorsRef=\"{}\"",
            declaration.unwrap_or_default(),
            prefix,
            to_xml(&value, true)
        )
    }

    // ==================== Units ====================

    fn unit(&mut self, tu: &TextUnit) -> String {
        let mut out = self.ensure_file();
        self.annotators.push(tu.annotations.annotators_ref().cloned());
        self.ns.push();

        out.push_str(&format!("<unit id=\"{}\"", to_xml(&tu.id, true)));
        if let Some(name) = &tu.name {
            out.push_str(&format!(" name=\"{}\"", to_xml(name, true)));
        }
        if let Some(unit_type) = &tu.unit_type {
            out.push_str(&format!(" type=\"{}\"", to_xml(unit_type, true)));
        }
        if !tu.translatable {
            out.push_str(" translate=\"no\"");
        }
        out.push_str(&self.annotators_attribute());
        let its = if inline::uses_its(tu) {
            let (prefix, declaration) = self.ns.ensure_prefixed(NS_ITS, Some("its"));
            out.push_str(&declaration.unwrap_or_default());
            prefix
        } else {
            String::new()
        };
        out.push_str(&self.ext.attributes(&mut self.ns, &tu.ext_attributes));
        out.push('>');
        out.push_str(self.lb);
        if !its.is_empty() {
            out.push_str(&inline::standoff_elements(&tu.store, &its, self.lb));
        }

        let (data, block) = if self.options.with_original_data {
            self.original_data(tu)
        } else {
            (HashMap::new(), String::new())
        };
        let codes = UnitCodes::new(tu, self.options.target_locale.as_ref());
        let annotators = AnnotatorsRef::cascade(self.annotators.iter().map(Option::as_ref));
        let content = InlineWriter::new(&codes, &data, &tu.store, &its, annotators);

        out.push_str(&self.matches(&tu.matches, &content));
        out.push_str(&self.glossary(&tu.glossary));
        out.push_str(&self.metadata(&tu.metadata));
        out.push_str(&self.ext.elements(&mut self.ns, &tu.ext_elements));
        out.push_str(&self.notes(&tu.notes));
        out.push_str(&block);
        for (index, part) in tu.container.parts().iter().enumerate() {
            out.push_str(&self.part(tu, index, part, &content));
        }

        out.push_str("</unit>");
        out.push_str(self.lb);
        self.ns.pop();
        self.annotators.pop();
        out
    }

    fn original_data(&self, tu: &TextUnit) -> (HashMap<String, String>, String) {
        let mut ids = HashMap::new();
        let mut block = String::new();
        for part in tu.container.parts() {
            let fragments = std::iter::once(&part.source).chain(self.target_of(part));
            for code in fragments.flat_map(Fragment::codes) {
                let data = code.markup();
                if data.is_empty() || ids.contains_key(data) {
                    continue;
                }
                let id = format!("d{}", ids.len() + 1);
                block.push_str(&format!("<data id=\"{}\">{}</data>{}", id, to_safe_xml(data), self.lb));
                ids.insert(data.to_string(), id);
            }
        }
        if block.is_empty() {
            return (ids, block);
        }
        (ids, format!("<originalData>{lb}{}</originalData>{lb}", block, lb = self.lb))
    }

    fn part(&mut self, tu: &TextUnit, index: usize, part: &Part, content: &InlineWriter<'_>) -> String {
        let rules = self.rules();
        let target = self.target_of(part);
        self.ns.push();

        let mut out = String::new();
        if part.is_segment() {
            out.push_str(&format!("<segment id=\"{}\"", to_xml(&part.id, true)));
            if !part.can_resegment {
                out.push_str(" canResegment=\"no\"");
            }
            if part.state != TargetState::Initial || part.sub_state.is_some() {
                out.push_str(&format!(" state=\"{}\"", part.state));
            }
            if let Some(sub_state) = &part.sub_state {
                out.push_str(&format!(" subState=\"{}\"", to_xml(sub_state, true)));
            }
            if let Some((preferred, uri)) = rules.namespace {
                if let (Some(attr), true) = (rules.state_attribute, target.is_some()) {
                    let (prefix, _) = self.ns.ensure_prefixed(uri, Some(preferred));
                    out.push_str(&format!(" {}:{}=\"{}\"", prefix, attr, rules.state_value(part.state)));
                }
                if let (Some(attr), Some(score)) = (rules.score_attribute, best_score(tu, part)) {
                    let (prefix, _) = self.ns.ensure_prefixed(uri, Some(preferred));
                    out.push_str(&format!(" {}:{}=\"{:.0}\"", prefix, attr, score));
                }
            }
        } else {
            out.push_str(&format!("<ignorable id=\"{}\"", to_xml(&part.id, true)));
        }
        out.push_str(&self.ext.attributes(&mut self.ns, &part.ext_attributes));
        out.push('>');
        out.push_str(self.lb);

        let space = if part.preserve_ws || tu.preserve_ws {
            " xml:space=\"preserve\""
        } else {
            ""
        };
        out.push_str(&format!("<source{}>{}</source>{}", space, content.source(index, &part.source), self.lb));
        if let Some(target) = target {
            out.push_str(&format!("<target{}>{}</target>{}", space, content.target(index, target), self.lb));
        }

        out.push_str(if part.is_segment() { "</segment>" } else { "</ignorable>" });
        out.push_str(self.lb);
        self.ns.pop();
        out
    }

    // ==================== Unit modules ====================

    fn notes(&mut self, notes: &[Note]) -> String {
        if notes.is_empty() {
            return String::new();
        }
        let mut out = format!("<notes>{}", self.lb);
        for note in notes {
            self.ns.push();
            out.push_str("<note");
            if let Some(id) = &note.id {
                out.push_str(&format!(" id=\"{}\"", to_xml(id, true)));
            }
            if let Some(applies_to) = note.applies_to {
                out.push_str(&format!(" appliesTo=\"{}\"", applies_to.as_str()));
            }
            if let Some(category) = &note.category {
                out.push_str(&format!(" category=\"{}\"", to_xml(category, true)));
            }
            if let Some(priority) = note.priority {
                out.push_str(&format!(" priority=\"{}\"", priority));
            }
            out.push_str(&self.ext.attributes(&mut self.ns, &note.ext_attributes));
            out.push_str(&format!(">{}</note>{}", to_safe_xml(&note.text), self.lb));
            self.ns.pop();
        }
        out.push_str("</notes>");
        out.push_str(self.lb);
        out
    }

    fn matches(&mut self, matches: &[Match], content: &InlineWriter<'_>) -> String {
        if matches.is_empty() {
            return String::new();
        }
        self.ns.push();
        let (p, declaration) = self.ns.ensure(NS_MATCHES, Some("mtc"));
        let mut out = format!("<{}:matches{}>{}", p, declaration.unwrap_or_default(), self.lb);
        for m in matches {
            self.ns.push();
            out.push_str(&format!("<{}:match ref=\"{}\"", p, to_xml(&m.ref_segment, true)));
            if let Some(id) = &m.id {
                out.push_str(&format!(" id=\"{}\"", to_xml(id, true)));
            }
            if let Some(similarity) = m.similarity {
                out.push_str(&format!(" similarity=\"{}\"", similarity));
            }
            if let Some(quality) = m.match_quality {
                out.push_str(&format!(" matchQuality=\"{}\"", quality));
            }
            if let Some(origin) = &m.origin {
                out.push_str(&format!(" origin=\"{}\"", to_xml(origin, true)));
            }
            if let Some(match_type) = &m.match_type {
                out.push_str(&format!(" type=\"{}\"", to_xml(match_type, true)));
            }
            out.push_str(&self.ext.attributes(&mut self.ns, &m.ext_attributes));
            out.push('>');
            out.push_str(self.lb);
            out.push_str(&self.metadata(&m.metadata));
            out.push_str(&format!("<source>{}</source>{}", content.standalone(&m.source), self.lb));
            out.push_str(&format!("<target>{}</target>{}", content.standalone(&m.target), self.lb));
            out.push_str(&self.ext.elements(&mut self.ns, &m.ext_elements));
            out.push_str(&format!("</{}:match>{}", p, self.lb));
            self.ns.pop();
        }
        out.push_str(&format!("</{}:matches>{}", p, self.lb));
        self.ns.pop();
        out
    }

    fn glossary(&mut self, entries: &[GlossEntry]) -> String {
        if entries.is_empty() {
            return String::new();
        }
        self.ns.push();
        let (p, declaration) = self.ns.ensure(NS_GLOSSARY, Some("gls"));
        let mut out = format!("<{}:glossary{}>{}", p, declaration.unwrap_or_default(), self.lb);
        for entry in entries {
            self.ns.push();
            out.push_str(&format!("<{}:glossEntry", p));
            if let Some(id) = &entry.id {
                out.push_str(&format!(" id=\"{}\"", to_xml(id, true)));
            }
            if let Some(reference) = &entry.reference {
                out.push_str(&format!(" ref=\"{}\"", to_xml(reference, true)));
            }
            out.push_str(&self.ext.attributes(&mut self.ns, &entry.ext_attributes));
            out.push('>');
            out.push_str(self.lb);

            out.push_str(&format!("<{}:term", p));
            if let Some(source) = &entry.term_source {
                out.push_str(&format!(" source=\"{}\"", to_xml(source, true)));
            }
            out.push_str(&format!(">{}</{}:term>{}", to_xml(&entry.term, false), p, self.lb));
            for translation in &entry.translations {
                out.push_str(&format!(
                    "<{p}:translation>{}</{p}:translation>{}",
                    to_xml(translation, false),
                    self.lb,
                    p = p
                ));
            }
            if let Some(definition) = &entry.definition {
                out.push_str(&format!(
                    "<{p}:definition>{}</{p}:definition>{}",
                    to_xml(definition, false),
                    self.lb,
                    p = p
                ));
            }
            out.push_str(&self.ext.elements(&mut self.ns, &entry.ext_elements));
            out.push_str(&format!("</{}:glossEntry>{}", p, self.lb));
            self.ns.pop();
        }
        out.push_str(&format!("</{}:glossary>{}", p, self.lb));
        self.ns.pop();
        out
    }

    fn metadata(&mut self, groups: &[MetadataGroup]) -> String {
        if groups.is_empty() {
            return String::new();
        }
        self.ns.push();
        let (p, declaration) = self.ns.ensure(NS_METADATA, Some("mda"));
        let mut out = format!("<{}:metadata{}>{}", p, declaration.unwrap_or_default(), self.lb);
        for group in groups {
            self.meta_group(&p, group, &mut out);
        }
        out.push_str(&format!("</{}:metadata>{}", p, self.lb));
        self.ns.pop();
        out
    }

    fn meta_group(&self, p: &str, group: &MetadataGroup, out: &mut String) {
        out.push_str(&format!("<{}:metaGroup", p));
        if let Some(id) = &group.id {
            out.push_str(&format!(" id=\"{}\"", to_xml(id, true)));
        }
        if let Some(category) = &group.category {
            out.push_str(&format!(" category=\"{}\"", to_xml(category, true)));
        }
        if let Some(applies_to) = group.applies_to {
            out.push_str(&format!(" appliesTo=\"{}\"", applies_to.as_str()));
        }
        out.push('>');
        out.push_str(self.lb);
        for entry in &group.entries {
            out.push_str(&format!(
                "<{p}:meta type=\"{}\">{}</{p}:meta>{}",
                to_xml(&entry.key, true),
                to_xml(&entry.value, false),
                self.lb,
                p = p
            ));
        }
        for sub in &group.groups {
            self.meta_group(p, sub, out);
        }
        out.push_str(&format!("</{}:metaGroup>{}", p, self.lb));
    }
}

impl<W: Write> Drop for XliffWriter<W> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.flush() {
                log::warn!("failed to flush XLIFF output on drop: {}", e);
            }
        }
    }
}

fn best_score(tu: &TextUnit, part: &Part) -> Option<f64> {
    tu.matches
        .iter()
        .filter(|m| m.ref_segment.trim_start_matches('#') == part.id)
        .filter_map(|m| m.similarity)
        .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Ending, LocaleId, StartSubDocument};
    use crate::xliff::Flavor;

    fn hello_unit() -> TextUnit {
        let mut source = Fragment::from_text("Hello ").unwrap();
        source.append_opening("b", "<b>").unwrap();
        source.append_text("World").unwrap();
        source.append_closing("b", "</b>").unwrap();
        let mut target = Fragment::from_text("Bonjour ").unwrap();
        target.append_opening("b", "<b>").unwrap();
        target.append_text("monde").unwrap();
        target.append_closing("b", "</b>").unwrap();

        let mut tu = TextUnit::new("tu1", Container::new(source));
        tu.container
            .part_mut(0)
            .unwrap()
            .set_target(LocaleId::new("fr"), target);
        tu
    }

    fn write(options: XliffOptions, events: &[Event]) -> String {
        let mut writer = XliffWriter::new(Vec::new(), options);
        writer.write_all(events).unwrap();
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    fn document(units: Vec<Event>) -> Vec<Event> {
        let mut events = vec![Event::StartDocument(StartDocument::new("sd1", LocaleId::new("en")))];
        events.extend(units);
        events.push(Event::EndDocument(Ending::new("ed1")));
        events
    }

    #[test]
    fn test_unit_with_codes() {
        let out = write(
            XliffOptions::new().with_target_locale("fr"),
            &document(vec![Event::from(hello_unit())]),
        );
        let expected = concat!(
            "<?xml version=\"1.0\"?>\n",
            "<xliff xmlns=\"urn:oasis:names:tc:xliff:document:2.0\" version=\"2.0\" srcLang=\"en\" trgLang=\"fr\">\n",
            "<file id=\"f1\">\n",
            "<unit id=\"tu1\">\n",
            "<originalData>\n",
            "<data id=\"d1\">&lt;b></data>\n",
            "<data id=\"d2\">&lt;/b></data>\n",
            "</originalData>\n",
            "<segment id=\"1\">\n",
            "<source>Hello <sc id=\"1\" dataRef=\"d1\"/>World<ec startRef=\"1\" dataRef=\"d2\"/></source>\n",
            "<target>Bonjour <sc id=\"1\" dataRef=\"d1\"/>monde<ec startRef=\"1\" dataRef=\"d2\"/></target>\n",
            "</segment>\n",
            "</unit>\n",
            "</file>\n",
            "</xliff>\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_without_original_data() {
        let out = write(
            XliffOptions::new().with_original_data(false),
            &document(vec![Event::from(hello_unit())]),
        );
        assert!(!out.contains("originalData"));
        assert!(out.contains("<source>Hello <sc id=\"1\"/>World<ec startRef=\"1\"/></source>"));
        assert!(!out.contains("<target>"));
    }

    #[test]
    fn test_event_before_document() {
        let mut writer = XliffWriter::new(Vec::new(), XliffOptions::new());
        assert!(writer.write_event(&Event::from(hello_unit())).is_err());
    }

    #[test]
    fn test_annotators_ref_differences() {
        let mut sd = StartDocument::new("sd1", LocaleId::new("en"));
        sd.annotators_ref = Some(AnnotatorsRef::parse("mt-confidence|tool-a").unwrap());
        let mut sub = StartSubDocument::new("file1");
        sub.annotators_ref = Some(AnnotatorsRef::parse("mt-confidence|tool-a terminology|tool-b").unwrap());
        let mut tu = hello_unit();
        tu.annotations
            .set_annotators_ref(Some(AnnotatorsRef::parse("terminology|tool-b").unwrap()));

        let events = vec![
            Event::StartDocument(sd),
            Event::StartSubDocument(sub),
            Event::from(tu),
            Event::EndSubDocument(Ending::new("file1e")),
            Event::EndDocument(Ending::new("ed1")),
        ];
        let out = write(XliffOptions::new(), &events);
        assert!(out.contains(
            "<xliff xmlns=\"urn:oasis:names:tc:xliff:document:2.0\" version=\"2.0\" srcLang=\"en\" xmlns:its=\"http://www.w3.org/2005/11/its\" its:annotatorsRef=\"mt-confidence|tool-a\">"
        ));
        assert!(out.contains("<file id=\"file1\" its:annotatorsRef=\"terminology|tool-b\">"));
        // Same values as the file: nothing to write on the unit
        assert!(out.contains("<unit id=\"tu1\">"));
        assert_eq!(out.matches("xmlns:its").count(), 1);
    }

    #[test]
    fn test_sdl_flavor() {
        let mut tu = hello_unit();
        tu.container.part_mut(0).unwrap().state = TargetState::Reviewed;
        tu.matches.push(Match::new("#1", Fragment::from_text("Hello").unwrap(), Fragment::from_text("Bonjour").unwrap()).with_similarity(88.0));
        let out = write(
            XliffOptions::new().with_flavor(Flavor::Sdl).with_target_locale("fr"),
            &document(vec![Event::from(tu)]),
        );
        assert!(out.contains("xmlns:sdl=\"http://sdl.com/FileTypes/SdlXliff/1.0\""));
        assert!(out.contains(
            "<segment id=\"1\" state=\"reviewed\" sdl:conf=\"ApprovedTranslation\" sdl:percent=\"88\">"
        ));
        assert!(out.contains("<mtc:matches xmlns:mtc=\"urn:oasis:names:tc:xliff:matches:2.0\">"));
        assert!(out.contains("<mtc:match ref=\"#1\" similarity=\"88\">"));
    }

    #[test]
    fn test_notes_and_ignorables() {
        let mut container = Container::new(Fragment::from_text("One. Two.").unwrap());
        container.apply_segmentation(0, &[0..4, 5..9]).unwrap();
        let mut tu = TextUnit::new("tu1", container);
        tu.notes.push(Note::new("Keep it short & simple"));
        tu.preserve_ws = true;
        let out = write(XliffOptions::new(), &document(vec![Event::from(tu)]));
        assert!(out.contains("<notes>\n<note>Keep it short &amp; simple</note>\n</notes>\n"));
        assert!(out.contains("<ignorable id=\"2\">\n<source xml:space=\"preserve\"> </source>\n</ignorable>"));
    }
}
