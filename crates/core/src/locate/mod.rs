//! Where lyrics files live on disk.
//!
//! A lyrics file is looked up next to the audio file first (`song.mp3` →
//! `song.lrc`) and then in a library directory as `<title> - <artist>.lrc`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Result;

const LRC_EXTENSION: &str = "lrc";

/// `song.flac` → `song.lrc`, in the same directory.
pub fn sidecar_path(audio_path: impl AsRef<Path>) -> PathBuf {
    audio_path.as_ref().with_extension(LRC_EXTENSION)
}

/// `<root>/<title> - <artist>.lrc`. Path separators in the names are
/// replaced so the file always lands directly under `root`.
pub fn library_path(root: impl AsRef<Path>, title: &str, artist: &str) -> PathBuf {
    let name = format!("{} - {}.{LRC_EXTENSION}", clean(title), clean(artist));
    root.as_ref().join(name)
}

fn clean(name: &str) -> String {
    name.trim().replace(['/', '\\'], "_")
}

/// Returns the first existing lyrics file for a track.
pub fn find_lyrics_file(
    audio_path: impl AsRef<Path>,
    library_root: Option<&Path>,
    title: &str,
    artist: &str,
) -> Option<PathBuf> {
    let sidecar = sidecar_path(audio_path);
    if sidecar.is_file() {
        return Some(sidecar);
    }

    let candidate = library_path(library_root?, title, artist);
    candidate.is_file().then_some(candidate)
}

/// Writes LRC text, creating missing parent directories.
pub fn write_lrc(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote lyrics file");
    Ok(())
}
