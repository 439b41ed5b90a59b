//! Core library for the Booming lyrics tooling.
//!
//! Turns LRC text into a time-ordered [`LyricDocument`] and answers the two
//! questions a synchronized lyrics display keeps asking: which line is active
//! at a playback position, and how far the list must scroll to center it.
//! Everything here is synchronous and works on in-memory data.

pub mod config;
pub mod error;
pub mod format;
pub mod index;
pub mod locate;
pub mod model;
pub mod parser;
pub mod timeline;

pub use config::{AppConfig, LayoutConfig, LyricsConfig};
pub use error::{LyricsError, Result};
pub use format::{format_time, format_timestamp, to_lrc_string};
pub use index::LyricIndex;
pub use locate::{find_lyrics_file, library_path, sidecar_path, write_lrc};
pub use model::{LyricDocument, LyricLine, LyricWord};
pub use parser::{
    looks_like_lrc, parse, parse_clock_time, parse_from_file, parse_reader, read_lyrics_file,
    try_parse_from_file,
};
pub use timeline::{DragMode, LineChange, LyricCursor, PlaybackClock, SeekCallback};
