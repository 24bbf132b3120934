//! Writing reconstructed documents to a byte sink.

use std::io::Write;

use super::options::WriterOptions;
use super::writer::SkeletonWriter;
use crate::detect::{encode, TextEncoding};
use crate::error::{Error, Result};
use crate::model::Event;

/// Writes events to a sink it owns from creation to [`finish`](Self::finish).
///
/// The output encoding and byte-order mark follow the start-document event
/// unless [`WriterOptions::write_bom`] says otherwise. Dropping the writer
/// without finishing still flushes the sink.
///
/// # Example
///
/// ```
/// use unmark::model::{Container, Ending, Event, Fragment, LocaleId, StartDocument, TextUnit};
/// use unmark::skeleton::{DocumentWriter, WriterOptions};
///
/// let events = vec![
///     Event::StartDocument(StartDocument::new("sd1", LocaleId::new("en"))),
///     Event::from(TextUnit::new("tu1", Container::new(Fragment::from_text("Hello")?))),
///     Event::EndDocument(Ending::new("ed1")),
/// ];
/// let mut writer = DocumentWriter::new(Vec::new(), WriterOptions::default());
/// writer.write_all(&events)?;
/// assert_eq!(writer.finish()?, b"Hello");
/// # Ok::<(), unmark::Error>(())
/// ```
#[derive(Debug)]
pub struct DocumentWriter<W: Write> {
    sink: Option<W>,
    writer: SkeletonWriter,
    encoding: TextEncoding,
    bom_pending: bool,
}

impl<W: Write> DocumentWriter<W> {
    /// Create a writer over a sink.
    pub fn new(sink: W, options: WriterOptions) -> Self {
        Self {
            sink: Some(sink),
            writer: SkeletonWriter::new(options),
            encoding: TextEncoding::utf8(),
            bom_pending: false,
        }
    }

    /// Writer options.
    pub fn options(&self) -> &WriterOptions {
        self.writer.options()
    }

    /// The sink.
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Write one event.
    pub fn write_event(&mut self, event: &Event) -> Result<()> {
        if let Event::StartDocument(sd) = event {
            self.encoding = sd.encoding.parse()?;
            self.bom_pending = self.writer.options().write_bom.unwrap_or(sd.has_bom);
        }
        let text = self.writer.process(event)?;
        if text.is_empty() && !self.bom_pending {
            return Ok(());
        }
        let bytes = encode(&text, self.encoding, std::mem::take(&mut self.bom_pending));
        match self.sink.as_mut() {
            Some(sink) => sink.write_all(&bytes)?,
            None => return Err(Error::Other("document writer is finished".to_string())),
        }
        Ok(())
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
            .ok_or_else(|| Error::Other("document writer is finished".to_string()))?;
        sink.flush()?;
        Ok(sink)
    }
}

impl<W: Write> Drop for DocumentWriter<W> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.flush() {
                log::warn!("failed to flush output on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Ending, Fragment, LocaleId, StartDocument, TextUnit};
    use std::fs;
    use std::io::BufWriter;

    fn events(has_bom: bool, encoding: &str) -> Vec<Event> {
        let mut sd = StartDocument::new("sd1", LocaleId::new("en"));
        sd.has_bom = has_bom;
        sd.encoding = encoding.to_string();
        vec![
            Event::StartDocument(sd),
            Event::from(TextUnit::new("tu1", Container::new(Fragment::from_text("h\u{e9}").unwrap()))),
            Event::EndDocument(Ending::new("ed1")),
        ]
    }

    #[test]
    fn test_bom_follows_input() {
        let mut writer = DocumentWriter::new(Vec::new(), WriterOptions::new());
        writer.write_all(&events(true, "UTF-8")).unwrap();
        assert_eq!(writer.finish().unwrap(), b"\xEF\xBB\xBFh\xC3\xA9");

        let mut writer = DocumentWriter::new(Vec::new(), WriterOptions::new().with_bom(false));
        writer.write_all(&events(true, "UTF-8")).unwrap();
        assert_eq!(writer.finish().unwrap(), "h\u{e9}".as_bytes());
    }

    #[test]
    fn test_utf16_output() {
        let mut writer = DocumentWriter::new(Vec::new(), WriterOptions::new());
        writer.write_all(&events(true, "UTF-16LE")).unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0xFF, 0xFE, b'h', 0, 0xE9, 0]);
    }

    #[test]
    fn test_unknown_encoding() {
        let mut writer = DocumentWriter::new(Vec::new(), WriterOptions::new());
        let err = writer.write_all(&events(false, "EBCDIC")).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_drop_flushes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        {
            let file = fs::File::create(&path).unwrap();
            let mut writer = DocumentWriter::new(BufWriter::new(file), WriterOptions::new());
            writer.write_all(&events(false, "UTF-8")).unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "h\u{e9}");
    }
}
