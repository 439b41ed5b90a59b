use crate::LyricDocument;

/// Time lookup and scroll geometry over a parsed document.
///
/// The timestamps are copied out of the document once, so lookups never touch
/// the lines themselves. Scroll offsets are memoized per line in an explicit
/// cache that is cleared whenever the layout changes.
#[derive(Debug, Clone, Default)]
pub struct LyricIndex {
    timestamps: Vec<u64>,
    track_length: Option<u64>,
    heights: Vec<f32>,
    offsets: OffsetCache,
}

impl LyricIndex {
    pub fn new(document: &LyricDocument) -> Self {
        let mut index = Self::from_timestamps(
            document
                .lines
                .iter()
                .map(|line| line.timestamp_millis)
                .collect(),
        );
        index.track_length = document.length_millis();
        index
    }

    /// Builds an index from raw timestamps, sorting them first.
    pub fn from_timestamps(mut timestamps: Vec<u64>) -> Self {
        timestamps.sort_unstable();
        Self {
            timestamps,
            track_length: None,
            heights: Vec::new(),
            offsets: OffsetCache::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamp(&self, index: usize) -> Option<u64> {
        self.timestamps.get(index).copied()
    }

    /// Returns the line active at `time_millis`: the last line starting at or
    /// before that time.
    ///
    /// Times before the first line, negative times and an empty index all
    /// map to line 0.
    pub fn find_active_line(&self, time_millis: i64) -> usize {
        let Ok(time) = u64::try_from(time_millis) else {
            return 0;
        };
        self.timestamps
            .partition_point(|&start| start <= time)
            .saturating_sub(1)
    }

    /// Start of line `index` and the start of the line after it. The last
    /// line ends at the document's `[length:..]`, if it has one.
    pub fn line_span(&self, index: usize) -> Option<(u64, Option<u64>)> {
        let start = self.timestamp(index)?;
        let end = match self.timestamp(index + 1) {
            Some(next) => Some(next),
            None => self.track_length.filter(|&length| length >= start),
        };
        Some((start, end))
    }

    /// Scroll offset that centers `line_index` in the viewport.
    ///
    /// Line 0 sits at `viewport_height / 2`; every following line moves the
    /// content up by half of its own height, half of the previous line's
    /// height and one divider. Returns `None` when the line is not covered by
    /// both the index and `line_heights`.
    ///
    /// Results are memoized. A change of viewport, divider or line count
    /// drops the cache on its own, but the heights themselves are not
    /// compared: after re-measuring lines call
    /// [`LyricIndex::invalidate_offsets`], or hand the heights over with
    /// [`LyricIndex::set_line_heights`] and query [`LyricIndex::offset_of`].
    pub fn compute_offset(
        &mut self,
        line_index: usize,
        line_heights: &[f32],
        divider_height: f32,
        viewport_height: f32,
    ) -> Option<f32> {
        if line_index >= self.timestamps.len() || line_index >= line_heights.len() {
            return None;
        }

        let layout = Layout::new(viewport_height, divider_height, line_heights.len());
        self.offsets.prepare(layout);
        self.offsets.extend_to(line_index, line_heights, layout)
    }

    /// Stores freshly measured line heights and drops every memoized offset.
    pub fn set_line_heights(&mut self, heights: Vec<f32>) {
        self.heights = heights;
        self.offsets.clear();
    }

    pub fn line_heights(&self) -> &[f32] {
        &self.heights
    }

    /// [`LyricIndex::compute_offset`] against the heights given to
    /// [`LyricIndex::set_line_heights`].
    pub fn offset_of(
        &mut self,
        line_index: usize,
        divider_height: f32,
        viewport_height: f32,
    ) -> Option<f32> {
        if line_index >= self.timestamps.len() || line_index >= self.heights.len() {
            return None;
        }

        let layout = Layout::new(viewport_height, divider_height, self.heights.len());
        self.offsets.prepare(layout);
        self.offsets.extend_to(line_index, &self.heights, layout)
    }

    /// Top and bottom scroll bounds: the offsets of the last and the first
    /// line.
    pub fn scroll_range(
        &mut self,
        line_heights: &[f32],
        divider_height: f32,
        viewport_height: f32,
    ) -> Option<(f32, f32)> {
        let last = self.timestamps.len().min(line_heights.len()).checked_sub(1)?;
        let bottom = self.compute_offset(last, line_heights, divider_height, viewport_height)?;
        let top = self.compute_offset(0, line_heights, divider_height, viewport_height)?;
        Some((bottom, top))
    }

    pub fn invalidate_offsets(&mut self) {
        self.offsets.clear();
    }

    /// Number of lines whose offset is currently memoized.
    pub fn cached_offsets(&self) -> usize {
        self.offsets.values.len()
    }

    /// Hit-tests a content-space `y` coordinate against lines stacked from the
    /// top with a divider between each pair.
    pub fn line_at_position(
        &self,
        y: f32,
        line_heights: &[f32],
        divider_height: f32,
    ) -> Option<usize> {
        if y < 0.0 {
            return None;
        }

        let mut top = 0.0_f32;
        for (index, height) in line_heights.iter().take(self.timestamps.len()).enumerate() {
            if y < top + height {
                return Some(index);
            }
            top += height + divider_height;
            if y < top {
                return None;
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    viewport_bits: u32,
    divider_bits: u32,
    line_count: usize,
}

impl Layout {
    fn new(viewport_height: f32, divider_height: f32, line_count: usize) -> Self {
        Self {
            viewport_bits: viewport_height.to_bits(),
            divider_bits: divider_height.to_bits(),
            line_count,
        }
    }

    fn viewport_height(self) -> f32 {
        f32::from_bits(self.viewport_bits)
    }

    fn divider_height(self) -> f32 {
        f32::from_bits(self.divider_bits)
    }
}

/// Memoized offsets for a prefix of the lines. `values[i]` exists once line
/// `i` has been computed.
#[derive(Debug, Clone, Default)]
struct OffsetCache {
    layout: Option<Layout>,
    values: Vec<f32>,
}

impl OffsetCache {
    fn prepare(&mut self, layout: Layout) {
        if self.layout != Some(layout) {
            self.values.clear();
            self.layout = Some(layout);
        }
    }

    fn clear(&mut self) {
        self.values.clear();
        self.layout = None;
    }

    fn extend_to(&mut self, target: usize, line_heights: &[f32], layout: Layout) -> Option<f32> {
        if self.values.is_empty() {
            self.values.push(layout.viewport_height() / 2.0);
        }

        while self.values.len() <= target {
            let index = self.values.len();
            let previous = *self.values.last()?;
            let step = (line_heights[index - 1] + line_heights[index]) / 2.0
                + layout.divider_height();
            self.values.push(previous - step);
        }

        self.values.get(target).copied()
    }
}
