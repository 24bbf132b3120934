//! Integration tests for XLIFF output of extracted documents.

use unmark::extract::RawDocument;
use unmark::model::{
    AnnotationItem, AnnotatorsRef, Container, Ending, Event, Fragment, LocaleId, StandoffGroup, StartDocument,
    TargetState, TextUnit,
};
use unmark::xliff::{Flavor, XliffOptions};
use unmark::{to_xliff, Unmark};

fn en() -> LocaleId {
    LocaleId::new("en")
}

#[test]
fn test_extracted_markup_to_xliff() {
    let doc = RawDocument::new("<p>Click <b>here</b>. Then wait.</p>", en());
    let result = Unmark::new()
        .with_filter_id("html")
        .with_sentence_segmentation()
        .extract(doc)
        .unwrap();
    let xliff = result.to_xliff().unwrap();

    assert!(xliff.starts_with("<?xml version=\"1.0\"?>\n<xliff xmlns=\"urn:oasis:names:tc:xliff:document:2.0\""));
    assert!(xliff.contains("srcLang=\"en\""));
    assert!(xliff.contains("<segment id=\"1\">"));
    assert!(xliff.contains("<ignorable id=\"2\">"));
    assert!(xliff.contains("<segment id=\"3\">"));
    assert!(xliff.contains("<source>Click <sc id=\"1\" dataRef=\"d1\"/>here<ec startRef=\"1\" dataRef=\"d2\"/>.</source>"));
    assert!(xliff.contains("<data id=\"d1\">&lt;b></data>"));
    assert!(xliff.trim_end().ends_with("</xliff>"));
}

#[test]
fn test_sdl_flavor_with_targets() {
    let de = LocaleId::new("de");
    let doc = RawDocument::new("Hello", en());
    let mut result = Unmark::new()
        .with_filter_id("text")
        .with_target_locale(de.clone())
        .with_flavor(Flavor::Sdl)
        .extract(doc)
        .unwrap();

    for unit in result.text_units_mut() {
        let part = unit.container.part_mut(0).unwrap();
        part.set_target(de.clone(), Fragment::from_text("Hallo").unwrap());
        part.state = TargetState::Translated;
    }

    let xliff = result.to_xliff().unwrap();
    assert!(xliff.contains("trgLang=\"de\""));
    assert!(xliff.contains("xmlns:sdl=\"http://sdl.com/FileTypes/SdlXliff/1.0\""));
    assert!(xliff.contains("state=\"translated\" sdl:conf=\"Translated\""));
    assert!(xliff.contains("<target>Hallo</target>"));
}

fn unit_xliff(tu: TextUnit) -> String {
    let events = vec![
        Event::StartDocument(StartDocument::new("doc1", en())),
        Event::from(tu),
        Event::EndDocument(Ending::new("ed1")),
    ];
    to_xliff(&events, XliffOptions::new()).unwrap()
}

fn bold() -> Fragment {
    let mut f = Fragment::from_text("a").unwrap();
    f.append_opening("b", "<b>").unwrap();
    f.append_text("bold").unwrap();
    f.append_closing("b", "</b>").unwrap();
    f.append_text("c").unwrap();
    f
}

#[test]
fn test_pair_split_between_segments() {
    let mut container = Container::new(bold());
    container.split(0, &[5]).unwrap();
    let xliff = unit_xliff(TextUnit::new("tu1", container));

    assert!(xliff.contains("<source>a<sc id=\"1\" dataRef=\"d1\"/>bo</source>"));
    assert!(xliff.contains("<source>ld<ec startRef=\"1\" dataRef=\"d2\"/>c</source>"));
    assert!(!xliff.contains("isolated"));
}

#[test]
fn test_code_ids_unique_in_unit() {
    let mut first = Fragment::from_text("One").unwrap();
    first.append_placeholder("br", "<br/>").unwrap();
    let mut second = Fragment::from_text("Two").unwrap();
    second.append_placeholder("br", "<br/>").unwrap();
    let mut container = Container::new(first);
    container.append_segment(second);
    let xliff = unit_xliff(TextUnit::new("tu1", container));

    assert!(xliff.contains("<source>One<ph id=\"1\" dataRef=\"d1\"/></source>"));
    assert!(xliff.contains("<source>Two<ph id=\"2\" dataRef=\"d1\"/></source>"));
}

#[test]
fn test_unpaired_closing_is_isolated() {
    let mut f = Fragment::from_text("end").unwrap();
    f.append_closing("b", "</b>").unwrap();
    let xliff = unit_xliff(TextUnit::new("tu1", Container::new(f)));
    assert!(xliff.contains("<source>end<ec id=\"1\" isolated=\"yes\" dataRef=\"d1\"/></source>"));
}

#[test]
fn test_annotation_markers() {
    let mut f = Fragment::from_text("The ").unwrap();
    f.append_opening("term", "").unwrap();
    f.append_text("term").unwrap();
    f.append_closing("term", "").unwrap();
    f.append_text(" is ").unwrap();
    f.append_placeholder("x", "<x/>").unwrap();
    let mut tu = TextUnit::new("tu1", Container::new(f));
    let group = tu.store.add_group(
        StandoffGroup::new("lqi1").with_item(AnnotationItem::new("locQualityIssue").with_field("severity", "50")),
    );
    let source = &mut tu.container.part_mut(0).unwrap().source;
    let term = source.code_annotations_mut(0).unwrap();
    term.set(AnnotationItem::new("mtConfidence").with_field("value", "0.8"));
    term.set_annotators_ref(Some(AnnotatorsRef::parse("mt-confidence|mt-tool").unwrap()));
    source.code_annotations_mut(2).unwrap().set_group(Some(group));

    let xliff = unit_xliff(tu);
    assert!(xliff.contains("<unit id=\"tu1\" xmlns:its=\"http://www.w3.org/2005/11/its\">"));
    assert!(xliff.contains(concat!(
        "<its:locQualityIssues xml:id=\"lqi1\">\n",
        "<its:locQualityIssue locQualityIssueSeverity=\"50\"/>\n",
        "</its:locQualityIssues>\n",
    )));
    assert!(xliff.contains(concat!(
        "<source>The <mrk id=\"m1\" type=\"its:any\" its:mtConfidence=\"0.8\" its:annotatorsRef=\"mt-confidence|mt-tool\">term</mrk>",
        " is <mrk id=\"m2\" type=\"its:any\" its:locQualityIssuesRef=\"#its=lqi1\"><ph id=\"2\" dataRef=\"d1\"/></mrk></source>",
    )));
}

#[test]
fn test_annotation_marker_across_segments() {
    let mut f = Fragment::from_text("a").unwrap();
    f.append_opening("term", "").unwrap();
    f.append_text("bold").unwrap();
    f.append_closing("term", "").unwrap();
    let mut container = Container::new(f);
    container.split(0, &[5]).unwrap();
    container
        .part_mut(0)
        .unwrap()
        .source
        .code_annotations_mut(0)
        .unwrap()
        .set(AnnotationItem::new("mtConfidence").with_field("value", "0.6"));

    let xliff = unit_xliff(TextUnit::new("tu1", container));
    assert!(xliff.contains("<source>a<sm id=\"m1\" type=\"its:any\" its:mtConfidence=\"0.6\"/>bo</source>"));
    assert!(xliff.contains("<source>ld<em startRef=\"m1\"/></source>"));
}
