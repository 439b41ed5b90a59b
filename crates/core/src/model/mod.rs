use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::parse_clock_time;

/// One timed lyric entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Position within the track at which the line becomes active.
    pub timestamp_millis: u64,
    /// Display text, possibly empty. Word timings, singer prefixes and
    /// background vocals are not part of it.
    pub text: String,
    /// Per-word timings from `<mm:ss.xx>` markers, main vocals first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<LyricWord>,
    /// Singer tag such as `v1` or `F` from a `v1:` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Text of a trailing `[bg:..]` group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl LyricLine {
    pub fn new(timestamp_millis: u64, text: impl Into<String>) -> Self {
        Self {
            timestamp_millis,
            text: text.into(),
            words: Vec::new(),
            actor: None,
            background: None,
        }
    }

    /// `true` when the line carries word-by-word timing.
    pub fn is_word_synced(&self) -> bool {
        self.words.iter().any(|word| !word.background)
    }

    pub fn main_words(&self) -> impl Iterator<Item = &LyricWord> {
        self.words.iter().filter(|word| !word.background)
    }

    pub fn background_words(&self) -> impl Iterator<Item = &LyricWord> {
        self.words.iter().filter(|word| word.background)
    }
}

/// A word of an enhanced LRC line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricWord {
    pub start_millis: u64,
    /// Start of the following marker; `None` when no marker follows.
    pub end_millis: Option<u64>,
    /// Word text including the spacing that followed it in the source.
    pub text: String,
    #[serde(default)]
    pub background: bool,
}

/// Result of parsing a lyrics file.
///
/// A document is immutable once built and gets replaced wholesale whenever
/// new lyrics are loaded. `lines` is always sorted by timestamp; entries that
/// share a timestamp are kept in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricDocument {
    /// Millisecond correction taken from the `[offset:..]` tag. It is not
    /// folded into `lines`; see [`LyricDocument::effective_position`].
    pub global_offset_millis: i64,
    pub lines: Vec<LyricLine>,
    /// Remaining attribute tags (`ti`, `ar`, `al`, ...) keyed by their
    /// lower-cased name.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl LyricDocument {
    /// Builds a document, sorting `lines` by timestamp.
    pub fn new(global_offset_millis: i64, mut lines: Vec<LyricLine>) -> Self {
        lines.sort_by_key(|line| line.timestamp_millis);
        Self {
            global_offset_millis,
            lines,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.attribute("ti")
    }

    pub fn artist(&self) -> Option<&str> {
        self.attribute("ar")
    }

    pub fn album(&self) -> Option<&str> {
        self.attribute("al")
    }

    /// Creator of the lyrics file (`[by:..]`).
    pub fn author(&self) -> Option<&str> {
        self.attribute("by")
    }

    /// Track length announced by a `[length:mm:ss]` tag.
    pub fn length_millis(&self) -> Option<u64> {
        self.attribute("length").and_then(parse_clock_time)
    }

    /// All line texts joined with newlines.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The moment line `index` stops being active, i.e. the start of the
    /// following line. The last line ends at the `[length:..]` of the track
    /// when one is given and lies after the line's start.
    pub fn line_end_millis(&self, index: usize) -> Option<u64> {
        let start = self.lines.get(index)?.timestamp_millis;
        match self.lines.get(index + 1) {
            Some(next) => Some(next.timestamp_millis),
            None => self.length_millis().filter(|&length| length >= start),
        }
    }

    /// Translates a playback position into the timeline of `lines`.
    ///
    /// A positive offset makes every line show up earlier.
    pub fn effective_position(&self, position_millis: i64) -> i64 {
        position_millis.saturating_add(self.global_offset_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> LyricDocument {
        LyricDocument::new(
            0,
            vec![
                LyricLine::new(2_000, "third"),
                LyricLine::new(0, "first"),
                LyricLine::new(1_000, "second"),
            ],
        )
    }

    #[test]
    fn sorts_lines_on_construction() {
        let doc = document();
        let stamps: Vec<u64> = doc.lines.iter().map(|l| l.timestamp_millis).collect();
        assert_eq!(stamps, vec![0, 1_000, 2_000]);
        assert_eq!(doc.plain_text(), "first\nsecond\nthird");
    }

    #[test]
    fn keeps_duplicate_timestamps_in_source_order() {
        let doc = LyricDocument::new(
            0,
            vec![
                LyricLine::new(500, "b"),
                LyricLine::new(100, "a"),
                LyricLine::new(500, "c"),
            ],
        );
        let texts: Vec<&str> = doc.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn line_end_is_next_line_start() {
        let doc = document();
        assert_eq!(doc.line_end_millis(0), Some(1_000));
        assert_eq!(doc.line_end_millis(2), None);
        assert_eq!(doc.line_end_millis(usize::MAX), None);
    }

    #[test]
    fn last_line_ends_at_track_length() {
        let mut attributes = BTreeMap::new();
        attributes.insert("length".to_string(), "00:04.50".to_string());
        let doc = document().with_attributes(attributes.clone());
        assert_eq!(doc.line_end_millis(1), Some(2_000));
        assert_eq!(doc.line_end_millis(2), Some(4_500));

        attributes.insert("length".to_string(), "00:01".to_string());
        let short = document().with_attributes(attributes);
        assert_eq!(short.line_end_millis(2), None);
    }

    #[test]
    fn offset_shifts_playback_position() {
        let mut doc = document();
        doc.global_offset_millis = 500;
        assert_eq!(doc.effective_position(1_000), 1_500);
        doc.global_offset_millis = -1_500;
        assert_eq!(doc.effective_position(1_000), -500);
    }

    #[test]
    fn reads_metadata_attributes() {
        let mut attributes = BTreeMap::new();
        attributes.insert("ti".to_string(), "Song".to_string());
        attributes.insert("length".to_string(), "03:25".to_string());
        let doc = document().with_attributes(attributes);

        assert_eq!(doc.title(), Some("Song"));
        assert_eq!(doc.artist(), None);
        assert_eq!(doc.length_millis(), Some(205_000));
    }
}
