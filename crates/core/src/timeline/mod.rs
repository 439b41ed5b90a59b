use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{LyricDocument, LyricIndex};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackClock {
    pub position_millis: u64,
}

impl PlaybackClock {
    pub fn at(position_millis: u64) -> Self {
        Self { position_millis }
    }

    pub fn reset(&mut self) {
        self.position_millis = 0;
    }

    pub fn advance(&mut self, delta_millis: u64) {
        self.position_millis = self.position_millis.saturating_add(delta_millis);
    }

    pub fn seek(&mut self, position_millis: u64) {
        self.position_millis = position_millis;
    }
}

/// Emitted by [`LyricCursor::tick`] when the active line moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    pub previous: Option<usize>,
    pub current: usize,
    /// The move skipped lines or went backwards, so the display should jump
    /// rather than animate.
    pub jumped: bool,
}

/// Called with the timestamp of the line a drag was released on. Returns
/// whether playback actually moved there.
pub type SeekCallback = Box<dyn FnMut(u64) -> bool + Send>;

/// Whether the user may drag the lyrics to seek.
///
/// Enabling drag always carries the callback that performs the seek.
#[derive(Default)]
pub enum DragMode {
    #[default]
    Disabled,
    Enabled(SeekCallback),
}

impl fmt::Debug for DragMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Enabled(_) => f.write_str("Enabled(..)"),
        }
    }
}

/// Follows playback through a lyric document, reporting line changes.
#[derive(Debug)]
pub struct LyricCursor {
    document: LyricDocument,
    index: LyricIndex,
    current: Option<usize>,
    apply_offset: bool,
    drag: DragMode,
    dragging: bool,
}

impl Default for LyricCursor {
    fn default() -> Self {
        Self::new(LyricDocument::default())
    }
}

impl LyricCursor {
    pub fn new(document: LyricDocument) -> Self {
        let index = LyricIndex::new(&document);
        Self {
            document,
            index,
            current: None,
            apply_offset: true,
            drag: DragMode::Disabled,
            dragging: false,
        }
    }

    /// Controls whether the document's `[offset:..]` is honoured.
    pub fn with_offset(mut self, apply_offset: bool) -> Self {
        self.apply_offset = apply_offset;
        self
    }

    /// Swaps in freshly loaded lyrics. Nothing from the previous document
    /// survives, including memoized offsets.
    pub fn load(&mut self, document: LyricDocument) {
        self.index = LyricIndex::new(&document);
        self.document = document;
        self.current = None;
        self.dragging = false;
    }

    pub fn document(&self) -> &LyricDocument {
        &self.document
    }

    pub fn index(&self) -> &LyricIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut LyricIndex {
        &mut self.index
    }

    pub fn current_line(&self) -> Option<usize> {
        self.current
    }

    /// Position on the lyric timeline for a playback clock.
    pub fn lyric_time(&self, clock: &PlaybackClock) -> i64 {
        let position = i64::try_from(clock.position_millis).unwrap_or(i64::MAX);
        if self.apply_offset {
            self.document.effective_position(position)
        } else {
            position
        }
    }

    /// Re-evaluates the active line. Returns `None` while the line is
    /// unchanged, while a drag is in progress or when there are no lyrics.
    pub fn tick(&mut self, clock: &PlaybackClock) -> Option<LineChange> {
        if self.document.is_empty() || self.dragging {
            return None;
        }

        let line = self.index.find_active_line(self.lyric_time(clock));
        self.move_to(line)
    }

    pub fn set_drag_mode(&mut self, mode: DragMode) {
        self.drag = mode;
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Starts a drag. Refused when drag is disabled or nothing is loaded.
    pub fn begin_drag(&mut self) -> bool {
        let allowed = matches!(self.drag, DragMode::Enabled(_)) && !self.document.is_empty();
        self.dragging = allowed;
        allowed
    }

    pub fn cancel_drag(&mut self) {
        self.dragging = false;
    }

    /// Ends a drag on `line`, asking the seek callback to jump there.
    ///
    /// # Panics
    ///
    /// Panics when `line` is not a line of the loaded document.
    pub fn release_drag(&mut self, line: usize) -> bool {
        assert!(
            line < self.document.len(),
            "drag released on line {line} but only {} lines are loaded",
            self.document.len()
        );
        if !self.dragging {
            return false;
        }
        self.dragging = false;

        let timestamp = self.document.lines[line].timestamp_millis;
        let accepted = match &mut self.drag {
            DragMode::Enabled(seek) => seek(timestamp),
            DragMode::Disabled => false,
        };
        if accepted {
            self.move_to(line);
        }
        tracing::debug!(line, timestamp, accepted, "drag released");
        accepted
    }

    fn move_to(&mut self, line: usize) -> Option<LineChange> {
        if self.current == Some(line) {
            return None;
        }

        let previous = self.current.replace(line);
        let jumped = match previous {
            Some(prev) => line < prev || line - prev > 1,
            None => false,
        };
        Some(LineChange {
            previous,
            current: line,
            jumped,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::parse;

    fn cursor() -> LyricCursor {
        LyricCursor::new(parse("[00:00.00]a\n[00:01.00]b\n[00:02.00]c\n[00:03.00]d"))
    }

    #[test]
    fn clock_advances_and_seeks() {
        let mut clock = PlaybackClock::default();
        clock.advance(1_500);
        clock.advance(500);
        assert_eq!(clock.position_millis, 2_000);
        clock.seek(10);
        assert_eq!(clock, PlaybackClock::at(10));
        clock.reset();
        assert_eq!(clock.position_millis, 0);
    }

    #[test]
    fn reports_each_line_change_once() {
        let mut cursor = cursor();
        let mut clock = PlaybackClock::default();

        let first = cursor.tick(&clock).unwrap();
        assert_eq!(first.current, 0);
        assert!(!first.jumped);
        assert_eq!(cursor.tick(&clock), None);

        clock.advance(1_100);
        let change = cursor.tick(&clock).unwrap();
        assert_eq!((change.previous, change.current, change.jumped), (Some(0), 1, false));
        clock.advance(100);
        assert_eq!(cursor.tick(&clock), None);
    }

    #[test]
    fn seeking_is_reported_as_a_jump() {
        let mut cursor = cursor();
        cursor.tick(&PlaybackClock::at(0));

        let forward = cursor.tick(&PlaybackClock::at(3_500)).unwrap();
        assert!(forward.jumped);
        let back = cursor.tick(&PlaybackClock::at(2_000)).unwrap();
        assert_eq!(back.current, 2);
        assert!(back.jumped);
    }

    #[test]
    fn honours_document_offset() {
        let doc = parse("[offset:500]\n[00:00.00]a\n[00:01.00]b");
        let mut with_offset = LyricCursor::new(doc.clone());
        let mut without = LyricCursor::new(doc).with_offset(false);
        let clock = PlaybackClock::at(600);

        assert_eq!(with_offset.tick(&clock).map(|c| c.current), Some(1));
        assert_eq!(without.tick(&clock).map(|c| c.current), Some(0));
    }

    #[test]
    fn empty_document_never_changes() {
        let mut cursor = LyricCursor::default();
        assert_eq!(cursor.tick(&PlaybackClock::at(5_000)), None);
        assert!(!cursor.begin_drag());
    }

    #[test]
    fn loading_replaces_everything() {
        let mut cursor = cursor();
        cursor.tick(&PlaybackClock::at(2_500));
        cursor
            .index_mut()
            .compute_offset(2, &[10.0; 4], 0.0, 100.0);

        cursor.load(parse("[00:10.00]new"));
        assert_eq!(cursor.current_line(), None);
        assert_eq!(cursor.index().cached_offsets(), 0);
        assert_eq!(cursor.document().len(), 1);
        assert_eq!(cursor.tick(&PlaybackClock::at(0)).map(|c| c.current), Some(0));
    }

    #[test]
    fn drag_requires_enabled_mode() {
        let mut cursor = cursor();
        assert!(!cursor.begin_drag());
        assert!(!cursor.is_dragging());
    }

    #[test]
    fn released_drag_seeks_to_line() {
        let seeks = Arc::new(Mutex::new(Vec::new()));
        let recorded = seeks.clone();
        let mut cursor = cursor();
        cursor.set_drag_mode(DragMode::Enabled(Box::new(move |ts| {
            recorded.lock().unwrap().push(ts);
            true
        })));
        cursor.tick(&PlaybackClock::at(0));

        assert!(cursor.begin_drag());
        assert_eq!(cursor.tick(&PlaybackClock::at(3_000)), None);
        assert!(cursor.release_drag(2));

        assert_eq!(*seeks.lock().unwrap(), vec![2_000]);
        assert_eq!(cursor.current_line(), Some(2));
        assert!(!cursor.is_dragging());
    }

    #[test]
    fn rejected_seek_keeps_current_line() {
        let mut cursor = cursor();
        cursor.set_drag_mode(DragMode::Enabled(Box::new(|_| false)));
        cursor.tick(&PlaybackClock::at(0));

        assert!(cursor.begin_drag());
        assert!(!cursor.release_drag(3));
        assert_eq!(cursor.current_line(), Some(0));
    }

    #[test]
    #[should_panic(expected = "drag released on line 9")]
    fn releasing_on_unknown_line_panics() {
        let mut cursor = cursor();
        cursor.set_drag_mode(DragMode::Enabled(Box::new(|_| true)));
        cursor.begin_drag();
        cursor.release_drag(9);
    }
}
