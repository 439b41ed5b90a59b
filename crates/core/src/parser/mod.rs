//! LRC parser.
//!
//! Understands the line-synchronized flavour of the format:
//!
//! ```text
//! [ti:Song title]
//! [offset:+500]
//! [00:12.34]First line
//! [00:20.00][01:45.00]Repeated chorus line
//! [00:31.00]v1: <00:31.00>Word <00:31.40>by <00:31.90>word [bg:<00:32.10>echo]
//! ```
//!
//! Attribute tags are kept on the document, `offset` is the only one that
//! changes timing. Malformed tags are dropped without failing the parse.
//! Enhanced markup (word markers, singer prefix, background group) is taken
//! off the display text and kept on the line.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufRead, BufReader},
    path::Path,
    sync::LazyLock,
};

use regex::Regex;

use crate::{LyricDocument, LyricLine, LyricWord, LyricsError, Result};

const SECONDS_TO_MILLIS: f64 = 1000.0;
const MINUTES_TO_MILLIS: u64 = 60 * 1000;

/// `[key:value]` where the key carries no digit, which is what tells it apart
/// from a timestamp tag.
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\[\]:0-9]+):([^\]]*)\]").expect("valid attribute pattern")
});
/// A run of leading bracketed tags followed by the line text.
static LINE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:\[[^\]]*\])+)(.*)$").expect("valid line pattern"));
static TIME_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([0-9]+):([0-9]{2}(?:\.[0-9]+)?)\]").expect("valid time tag pattern")
});
/// Singer prefix: `v1:`, `v2:`, ... or a single `M:`, `F:`, `D:`.
static ACTOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?i:v)[0-9]+|[MFD]):\s*(.*)$").expect("valid actor pattern")
});
static BACKGROUND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[bg:([^\]]*)\]").expect("valid background pattern"));
static WORD_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([0-9]+):([0-9]{2}(?:\.[0-9]+)?)>").expect("valid word time pattern")
});
static CLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+):([0-9]{2}(?:\.[0-9]+)?)$").expect("valid clock pattern")
});

/// Parses LRC text held in memory. A leading byte order mark is ignored.
pub fn parse(text: &str) -> LyricDocument {
    let mut builder = DocumentBuilder::default();
    for line in text.lines() {
        builder.feed(line);
    }
    builder.finish()
}

/// Parses LRC text from any buffered reader.
///
/// Read failures, including invalid UTF-8, are returned to the caller and no
/// partial document is produced.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<LyricDocument> {
    let mut builder = DocumentBuilder::default();
    for line in reader.lines() {
        builder.feed(&line?);
    }
    Ok(builder.finish())
}

/// Parses a UTF-8 lyrics file, telling a missing file apart from a failed
/// read.
pub fn try_parse_from_file(path: impl AsRef<Path>) -> Result<LyricDocument> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| open_error(path, err))?;
    parse_reader(BufReader::new(file))
}

/// Reads a whole lyrics file into memory, for callers that both parse and
/// inspect the text. Errors are reported like [`try_parse_from_file`].
pub fn read_lyrics_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|err| open_error(path, err))
}

fn open_error(path: &Path, err: io::Error) -> LyricsError {
    match err.kind() {
        io::ErrorKind::NotFound => LyricsError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LyricsError::Io(err),
    }
}

/// Parses a UTF-8 lyrics file, falling back to an empty document when the
/// file is missing or unreadable.
///
/// Use [`try_parse_from_file`] when the reason matters.
pub fn parse_from_file(path: impl AsRef<Path>) -> LyricDocument {
    let path = path.as_ref();
    match try_parse_from_file(path) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read lyrics file");
            LyricDocument::default()
        }
    }
}

/// Returns `true` when `text` contains at least one timed line with some
/// text on it. Plain, unsynchronized lyrics return `false`.
pub fn looks_like_lrc(text: &str) -> bool {
    text.lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !ATTRIBUTE_PATTERN.is_match(line))
        .filter_map(|line| LINE_PATTERN.captures(line))
        .any(|caps| {
            let has_time = TIME_TAG_PATTERN.is_match(&caps[1]);
            has_time && !caps[2].trim().is_empty()
        })
}

/// Parses `mm:ss[.fff]` into milliseconds.
pub fn parse_clock_time(value: &str) -> Option<u64> {
    let caps = CLOCK_PATTERN.captures(value.trim())?;
    to_millis(&caps[1], &caps[2])
}

fn to_millis(minutes: &str, seconds: &str) -> Option<u64> {
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    let seconds_ms = (seconds * SECONDS_TO_MILLIS).round() as u64;
    minutes
        .checked_mul(MINUTES_TO_MILLIS)?
        .checked_add(seconds_ms)
}

#[derive(Default)]
struct DocumentBuilder {
    offset: i64,
    lines: Vec<LyricLine>,
    attributes: BTreeMap<String, String>,
}

impl DocumentBuilder {
    fn feed(&mut self, raw: &str) {
        let line = raw.trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            return;
        }

        if let Some(caps) = ATTRIBUTE_PATTERN.captures(line) {
            self.attribute(&caps[1], &caps[2]);
        } else if let Some(caps) = LINE_PATTERN.captures(line) {
            self.timed(&caps[1], caps[2].trim());
        }
    }

    fn attribute(&mut self, key: &str, value: &str) {
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            return;
        }

        if key == "offset" {
            match value.parse::<i64>() {
                Ok(offset) => self.offset = offset,
                Err(err) => tracing::debug!(value, error = %err, "ignoring malformed offset tag"),
            }
        } else {
            self.attributes.insert(key, value.to_string());
        }
    }

    fn timed(&mut self, tags: &str, text: &str) {
        let markup = LineMarkup::parse(text);
        for caps in TIME_TAG_PATTERN.captures_iter(tags) {
            match to_millis(&caps[1], &caps[2]) {
                Some(timestamp_millis) => self.lines.push(markup.to_line(timestamp_millis)),
                None => tracing::debug!(tag = &caps[0], "dropping malformed timestamp"),
            }
        }
    }

    fn finish(self) -> LyricDocument {
        let document =
            LyricDocument::new(self.offset, self.lines).with_attributes(self.attributes);
        tracing::debug!(
            lines = document.len(),
            offset = document.global_offset_millis,
            "parsed lyrics"
        );
        document
    }
}

/// Enhanced LRC content of a timed line, shared by all of its timestamps.
struct LineMarkup {
    text: String,
    words: Vec<LyricWord>,
    actor: Option<String>,
    background: Option<String>,
}

impl LineMarkup {
    fn parse(text: &str) -> Self {
        let (actor, text) = match ACTOR_PATTERN.captures(text) {
            Some(caps) => (
                Some(caps[1].to_string()),
                caps.get(2).map_or("", |body| body.as_str()),
            ),
            None => (None, text),
        };

        let mut words = Vec::new();
        let mut background = Vec::new();
        for caps in BACKGROUND_PATTERN.captures_iter(text) {
            let group = caps[1].trim();
            words.extend(timed_words(group, true));
            let plain = strip_word_times(group);
            if !plain.is_empty() {
                background.push(plain);
            }
        }

        let main = BACKGROUND_PATTERN.replace_all(text, "");
        let main = main.trim();
        let mut main_words = timed_words(main, false);
        main_words.append(&mut words);

        Self {
            text: strip_word_times(main),
            words: main_words,
            actor,
            background: (!background.is_empty()).then(|| background.join(" ")),
        }
    }

    fn to_line(&self, timestamp_millis: u64) -> LyricLine {
        LyricLine {
            timestamp_millis,
            text: self.text.clone(),
            words: self.words.clone(),
            actor: self.actor.clone(),
            background: self.background.clone(),
        }
    }
}

struct WordMarker {
    start: usize,
    end: usize,
    millis: Option<u64>,
}

/// Splits `<mm:ss.xx>word` runs. A word lasts until the next marker; blank
/// runs only close the previous word.
fn timed_words(text: &str, background: bool) -> Vec<LyricWord> {
    let markers: Vec<WordMarker> = WORD_TIME_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(WordMarker {
                start: whole.start(),
                end: whole.end(),
                millis: to_millis(&caps[1], &caps[2]),
            })
        })
        .collect();

    let mut words = Vec::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let next = markers.get(i + 1);
        let segment = &text[marker.end..next.map_or(text.len(), |next| next.start)];
        let Some(start_millis) = marker.millis else {
            tracing::debug!(word = segment, "dropping word with malformed time");
            continue;
        };
        if segment.trim().is_empty() {
            continue;
        }
        words.push(LyricWord {
            start_millis,
            end_millis: next.and_then(|next| next.millis),
            text: segment.to_string(),
            background,
        });
    }
    words
}

fn strip_word_times(text: &str) -> String {
    WORD_TIME_PATTERN.replace_all(text, "").trim().to_string()
}
