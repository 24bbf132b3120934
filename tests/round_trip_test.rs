//! Integration tests for extraction and reconstruction.

use unmark::extract::{ExtractOptions, FilterRegistry, RawDocument};
use unmark::model::{Event, EventKind, Fragment, LocaleId, MissingTarget};
use unmark::skeleton::{DocumentWriter, WriterOptions, XmlEncoder};
use unmark::{json, round_trip, write_document, JsonFormat, LineBreak, Unmark};

const PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>Demo</title>\n<style>p { color: red; }</style></head>\n<body>\n  <h1>Welcome</h1>\n  <p>Read the <a href=\"/docs\" title=\"Documentation\">docs</a> first.\n  Then <em>try</em> it.</p>\n  <!-- footer -->\n  <p><img src=\"logo.png\" alt=\"Logo\"></p>\n</body>\n</html>\n";

fn en() -> LocaleId {
    LocaleId::new("en")
}

fn extract(text: &str, options: &ExtractOptions) -> Vec<Event> {
    let doc = RawDocument::new(text, en());
    FilterRegistry::with_defaults()
        .open(doc, options)
        .unwrap()
        .collect_with_diagnostics()
        .unwrap()
        .0
}

#[test]
fn test_round_trip_identity() {
    let doc = RawDocument::new(PAGE, en()).with_filter_id("html");
    assert_eq!(round_trip(doc).unwrap(), PAGE.as_bytes());
}

#[test]
fn test_round_trip_with_segmentation() {
    let options = ExtractOptions::new()
        .with_filter_id("html")
        .with_sentence_segmentation();
    let events = extract(PAGE, &options);

    let segmented = events
        .iter()
        .filter_map(Event::as_text_unit)
        .find(|tu| tu.container.segment_count() == 2)
        .expect("the paragraph has two sentences");
    assert_eq!(segmented.container.parts()[0].source.text(), "Read the docs first.");

    let bytes = write_document(&events, &WriterOptions::default()).unwrap();
    assert_eq!(bytes, PAGE.as_bytes());
}

#[test]
fn test_round_trip_bytes_with_bom() {
    let mut data = vec![0xEF, 0xBB, 0xBF];
    data.extend_from_slice(b"Line one\r\n\r\nLine two\r\n");
    let doc = RawDocument::from_bytes(&data, en()).unwrap().with_filter_id("text");
    assert_eq!(round_trip(doc).unwrap(), data);
}

#[test]
fn test_round_trip_latin1_bytes() {
    let data = b"Caf\xE9 cr\xE8me\n\nNa\xEFve".to_vec();
    let doc = RawDocument::from_bytes(&data, en()).unwrap().with_filter_id("text");
    assert_eq!(doc.text, "Caf\u{e9} cr\u{e8}me\n\nNa\u{ef}ve");
    assert_eq!(round_trip(doc).unwrap(), data);
}

#[test]
fn test_no_translatable_content() {
    let input = "<html>\n<body>\n  <br/>\n  <script>alert('x');</script>\n</body>\n</html>\n";
    let events = extract(input, &ExtractOptions::new().with_filter_id("html"));
    assert_eq!(events.iter().filter(|e| e.kind() == EventKind::TextUnit).count(), 0);
    assert_eq!(write_document(&events, &WriterOptions::default()).unwrap(), input.as_bytes());
}

#[test]
fn test_translation_replaces_text() {
    let doc = RawDocument::new("<p>Hello <b>world</b>!</p>\n<p>Bye</p>", en());
    let fr = LocaleId::new("fr");
    let mut result = Unmark::new()
        .with_filter_id("html")
        .with_target_locale(fr.clone())
        .extract(doc)
        .unwrap();

    for unit in result.text_units_mut() {
        let source = unit.container.full_source().unwrap();
        if source.text() == "Hello world!" {
            let mut target = Fragment::from_text("Bonjour ").unwrap();
            target.append_code(source.codes()[0].clone()).unwrap();
            target.append_text("le monde").unwrap();
            target.append_code(source.codes()[1].clone()).unwrap();
            target.append_text(" !").unwrap();
            unit.container.part_mut(0).unwrap().set_target(fr.clone(), target);
        }
    }

    // The second paragraph has no target and falls back to the source
    let output = String::from_utf8(result.write().unwrap()).unwrap();
    assert_eq!(output, "<p>Bonjour <b>le monde</b> !</p>\n<p>Bye</p>");
}

#[test]
fn test_referent_translation() {
    let doc = RawDocument::new("<p title=\"Tip\">Text <img alt=\"Cat\"></p>", en());
    let de = LocaleId::new("de");
    let mut result = Unmark::new()
        .with_filter_id("html")
        .with_target_locale(de.clone())
        .extract(doc)
        .unwrap();

    for unit in result.text_units_mut() {
        let text = unit.container.full_source().unwrap().text();
        let translated = match text.as_str() {
            "Tip" => Fragment::from_text("Hinweis").unwrap(),
            "Cat" => Fragment::from_text("Katze").unwrap(),
            _ => continue,
        };
        unit.container.part_mut(0).unwrap().set_target(de.clone(), translated);
    }

    let output = String::from_utf8(result.write().unwrap()).unwrap();
    assert_eq!(output, "<p title=\"Hinweis\">Text <img alt=\"Katze\"></p>");
}

#[test]
fn test_missing_target_empty_policy() {
    let events = extract("<p>Keep</p>", &ExtractOptions::new().with_filter_id("html"));
    let options = WriterOptions::new()
        .with_locale("ja")
        .with_missing_target(MissingTarget::Empty);
    assert_eq!(write_document(&events, &options).unwrap(), b"<p></p>");
}

#[test]
fn test_encoder_and_line_break() {
    let events = extract("a < b\n\nc & d", &ExtractOptions::new().with_filter_id("text"));
    let options = WriterOptions::new()
        .with_encoder(XmlEncoder::new())
        .with_line_break(LineBreak::CrLf);
    let output = write_document(&events, &options).unwrap();
    assert_eq!(output, b"a &lt; b\r\n\r\nc &amp; d");
}

#[test]
fn test_json_reload_round_trip() {
    let events = extract(PAGE, &ExtractOptions::new().with_filter_id("html"));
    let saved = json::to_json(&events, JsonFormat::Pretty).unwrap();
    let reloaded = json::from_json(&saved).unwrap();
    assert_eq!(reloaded, events);
    assert_eq!(write_document(&reloaded, &WriterOptions::default()).unwrap(), PAGE.as_bytes());
}

#[test]
fn test_document_writer_file_sink() {
    let events = extract("Alpha\n\nBeta\n", &ExtractOptions::new().with_filter_id("text"));
    let file = tempfile::NamedTempFile::new().unwrap();
    {
        let mut writer = DocumentWriter::new(file.reopen().unwrap(), WriterOptions::default());
        writer.write_all(&events).unwrap();
        writer.finish().unwrap();
    }
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "Alpha\n\nBeta\n");
}
