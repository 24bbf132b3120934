//! Sentence segmentation of extracted content.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Fragment, LocaleId, MARKER_CLOSING};

/// Finds segment boundaries in a fragment.
pub trait Segmenter: Send + Sync {
    /// Name of the segmenter.
    fn name(&self) -> &str;

    /// Ranges of the segments, in coded positions of `fragment`.
    ///
    /// Text between ranges becomes ignorable parts. Ranges must be sorted
    /// and must not overlap.
    fn segment(&self, fragment: &Fragment, locale: &LocaleId) -> Vec<Range<usize>>;
}

static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"[.!?\u{{3002}}\u{{FF01}}\u{{FF1F}}]+(?:{}.)*(\s+)", MARKER_CLOSING);
    Regex::new(&pattern).expect("sentence boundary pattern is valid")
});

/// Splits after sentence-final punctuation followed by whitespace.
///
/// Closing codes right after the punctuation stay in the sentence, and the
/// whitespace between sentences is left out of the segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceSegmenter;

impl SentenceSegmenter {
    /// Create a segmenter for `.`, `!`, `?` and their CJK forms.
    pub fn new() -> Self {
        Self
    }
}

impl Segmenter for SentenceSegmenter {
    fn name(&self) -> &str {
        "sentence"
    }

    fn segment(&self, fragment: &Fragment, _locale: &LocaleId) -> Vec<Range<usize>> {
        let coded = fragment.coded_text();
        let mut ranges = Vec::new();
        let mut start = 0;
        for caps in SENTENCE_BOUNDARY.captures_iter(&coded) {
            let (Some(whole), Some(space)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_trimmed(&coded, start..space.start(), &mut ranges);
            start = whole.end();
        }
        push_trimmed(&coded, start..coded.len(), &mut ranges);
        ranges
    }
}

/// Push a byte range of the coded text as a coded-position range, without
/// its surrounding whitespace.
fn push_trimmed(coded: &str, bytes: Range<usize>, ranges: &mut Vec<Range<usize>>) {
    let span = &coded[bytes.clone()];
    let trimmed = span.trim_start();
    let lead_bytes = span.len() - trimmed.len();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        return;
    }
    let start = coded[..bytes.start + lead_bytes].chars().count();
    ranges.push(start..start + trimmed.chars().count());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(fragment: &Fragment) -> Vec<Range<usize>> {
        SentenceSegmenter::new().segment(fragment, &LocaleId::new("en"))
    }

    #[test]
    fn test_sentences() {
        let f = Fragment::from_text("One. Two!  Three").unwrap();
        assert_eq!(segment(&f), vec![0..4, 5..9, 11..16]);
    }

    #[test]
    fn test_closing_code_stays() {
        let mut f = Fragment::from_text("A ").unwrap();
        f.append_opening("b", "<b>").unwrap();
        f.append_text("bold.").unwrap();
        f.append_closing("b", "</b>").unwrap();
        f.append_text(" Next.").unwrap();
        // "A " + 2 + "bold." + 2 = 11, then " Next."
        assert_eq!(segment(&f), vec![0..11, 12..17]);
    }

    #[test]
    fn test_no_boundary() {
        let f = Fragment::from_text("  no end  ").unwrap();
        assert_eq!(segment(&f), vec![2..8]);
    }
}
