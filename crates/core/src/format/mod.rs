use std::fmt::Write;

use crate::{LyricDocument, LyricLine, LyricWord};

const MILLIS_PER_SECOND: u64 = 1000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;

/// Renders a position as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_time(millis: u64) -> String {
    let minutes = millis / MILLIS_PER_MINUTE;
    let seconds = (millis / MILLIS_PER_SECOND) % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Renders a position as an LRC time tag, `[mm:ss.xx]`.
pub fn format_timestamp(millis: u64) -> String {
    let mut out = String::with_capacity(10);
    write_timestamp(&mut out, millis);
    out
}

fn write_timestamp(out: &mut String, millis: u64) {
    write_time(out, millis, '[', ']');
}

fn write_word_time(out: &mut String, millis: u64) {
    write_time(out, millis, '<', '>');
}

fn write_time(out: &mut String, millis: u64, open: char, close: char) {
    let minutes = millis / MILLIS_PER_MINUTE;
    let seconds = (millis / MILLIS_PER_SECOND) % 60;
    let centis = (millis % MILLIS_PER_SECOND) / 10;
    // Writing into a String cannot fail.
    let _ = write!(out, "{open}{minutes:02}:{seconds:02}.{centis:02}{close}");
}

/// Line content after the time tag, enhanced markup included.
fn write_line_body(out: &mut String, line: &LyricLine) {
    if let Some(actor) = &line.actor {
        let _ = write!(out, "{actor}: ");
    }
    if line.is_word_synced() {
        write_words(out, line.main_words());
    } else {
        out.push_str(&line.text);
    }

    if let Some(background) = &line.background {
        out.push_str(" [bg:");
        if line.background_words().next().is_some() {
            write_words(out, line.background_words());
        } else {
            out.push_str(background);
        }
        out.push(']');
    }
}

/// A word's end is only written when the next word does not start there.
fn write_words<'a>(out: &mut String, words: impl Iterator<Item = &'a LyricWord>) {
    let mut open_end: Option<u64> = None;
    for word in words {
        if let Some(end) = open_end.filter(|&end| end != word.start_millis) {
            write_word_time(out, end);
        }
        write_word_time(out, word.start_millis);
        out.push_str(&word.text);
        open_end = word.end_millis;
    }
    if let Some(end) = open_end {
        write_word_time(out, end);
    }
}

/// Serializes a document back into LRC text.
///
/// Attribute tags come first, then one timed line per entry. Timestamps are
/// written with centisecond precision, word timings and background vocals in
/// enhanced LRC markup.
pub fn to_lrc_string(document: &LyricDocument) -> String {
    let capacity: usize = document
        .lines
        .iter()
        .map(|line| line.text.len() + 11)
        .sum();
    let mut out = String::with_capacity(capacity + 64);

    for (key, value) in &document.attributes {
        let _ = writeln!(out, "[{key}:{value}]");
    }
    if document.global_offset_millis != 0 {
        let _ = writeln!(out, "[offset:{}]", document.global_offset_millis);
    }
    for line in &document.lines {
        write_timestamp(&mut out, line.timestamp_millis);
        write_line_body(&mut out, line);
        out.push('\n');
    }

    out
}
