use std::path::{Path, PathBuf};

use booming_lyrics_core::{
    find_lyrics_file, format_time, looks_like_lrc, parse, parse_clock_time, read_lyrics_file,
    AppConfig, LyricCursor, LyricDocument, LyricIndex, LyricsError, PlaybackClock,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> booming_lyrics_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Show { file, json } => run_show(&file, json),
        Commands::At { file, position } => run_at(&config, &file, &position),
        Commands::Offsets { file } => run_offsets(&config, &file),
        Commands::Find {
            audio,
            title,
            artist,
            library,
        } => run_find(&config, &audio, &title, &artist, library),
    }
}

fn load(file: &Path) -> booming_lyrics_core::Result<LyricDocument> {
    let raw = read_lyrics_file(file)?;
    let document = parse(&raw);
    if document.is_empty() {
        if raw.trim().is_empty() || looks_like_lrc(&raw) {
            tracing::warn!(?file, "file contains no timed lyrics");
        } else {
            tracing::warn!(?file, "file holds unsynchronized lyrics");
        }
    }
    Ok(document)
}

fn run_show(file: &Path, json: bool) -> booming_lyrics_core::Result<()> {
    let document = load(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    for (key, value) in &document.attributes {
        println!("{key:>8}: {value}");
    }
    if document.global_offset_millis != 0 {
        println!("{:>8}: {} ms", "offset", document.global_offset_millis);
    }
    for line in &document.lines {
        println!("{}  {}", format_time(line.timestamp_millis), line.text);
    }
    Ok(())
}

fn run_at(config: &AppConfig, file: &Path, position: &str) -> booming_lyrics_core::Result<()> {
    let position = parse_position(position)?;
    let mut cursor = LyricCursor::new(load(file)?).with_offset(config.lyrics.apply_offset);
    let clock = PlaybackClock::at(position);

    tracing::info!(position, lyric_time = cursor.lyric_time(&clock), "looking up active line");
    match cursor.tick(&clock) {
        Some(change) => {
            let document = cursor.document();
            let line = &document.lines[change.current];
            println!(
                "[{}] {} (line {} of {})",
                format_time(line.timestamp_millis),
                line.text,
                change.current + 1,
                document.len()
            );
        }
        None => println!("no lyrics"),
    }
    Ok(())
}

fn run_offsets(config: &AppConfig, file: &Path) -> booming_lyrics_core::Result<()> {
    let document = load(file)?;
    let layout = &config.layout;
    let mut index = LyricIndex::new(&document);
    index.set_line_heights(vec![layout.line_height; document.len()]);

    for (i, line) in document.lines.iter().enumerate() {
        let Some(offset) = index.offset_of(i, layout.divider_height, layout.viewport_height)
        else {
            break;
        };
        println!(
            "{i:>4}  {offset:>10.1}  {}  {}",
            format_time(line.timestamp_millis),
            line.text
        );
    }
    Ok(())
}

fn run_find(
    config: &AppConfig,
    audio: &Path,
    title: &str,
    artist: &str,
    library: Option<PathBuf>,
) -> booming_lyrics_core::Result<()> {
    let library = library.or_else(|| config.lyrics.library_root.clone());

    match find_lyrics_file(audio, library.as_deref(), title, artist) {
        Some(path) => {
            let document = load(&path)?;
            println!("{} ({} lines)", path.display(), document.len());
        }
        None => {
            tracing::info!(?audio, ?library, "no lyrics file found");
            println!("no lyrics found");
        }
    }
    Ok(())
}

/// Accepts `mm:ss[.ff]` or a plain number of milliseconds.
fn parse_position(value: &str) -> booming_lyrics_core::Result<u64> {
    parse_clock_time(value)
        .or_else(|| value.trim().parse().ok())
        .ok_or_else(|| LyricsError::msg(format!("invalid position `{value}`")))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect synchronized LRC lyrics", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every timed line of a lyrics file.
    Show {
        file: PathBuf,
        /// Emit the parsed document as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the line active at a playback position.
    At {
        file: PathBuf,
        /// Position as `mm:ss` or milliseconds.
        position: String,
    },
    /// Print the scroll offset of every line using the configured layout.
    Offsets { file: PathBuf },
    /// Locate the lyrics file belonging to an audio file.
    Find {
        audio: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
        /// Directory with `<title> - <artist>.lrc` files.
        #[arg(long)]
        library: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positions() {
        assert_eq!(parse_position("01:05").unwrap(), 65_000);
        assert_eq!(parse_position("1500").unwrap(), 1_500);
        assert!(parse_position("later").is_err());
    }

    #[test]
    fn loads_lyrics_and_plain_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let synced = dir.path().join("synced.lrc");
        std::fs::write(&synced, "\u{feff}[ti:Song]\n[00:01.00]<00:01.00>one <00:01.50>two\n")
            .unwrap();
        let plain = dir.path().join("plain.lrc");
        std::fs::write(&plain, "just words\n").unwrap();

        let document = load(&synced).unwrap();
        assert_eq!(document.title(), Some("Song"));
        assert_eq!(document.lines[0].text, "one two");
        assert!(load(&plain).unwrap().is_empty());
        assert!(load(&dir.path().join("missing.lrc"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
