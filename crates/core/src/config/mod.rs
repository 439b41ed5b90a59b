use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{LyricsError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub layout: LayoutConfig,
    pub lyrics: LyricsConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => LyricsError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LyricsError::Io(err),
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()
    }
}

/// Geometry used when computing scroll offsets outside a real display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub viewport_height: f32,
    pub divider_height: f32,
    /// Height assumed for every line when text is not measured.
    pub line_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_height: 600.0,
            divider_height: 16.0,
            line_height: 48.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("viewport_height", self.viewport_height),
            ("divider_height", self.divider_height),
            ("line_height", self.line_height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(LyricsError::Config(format!(
                    "`{name}` must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// Directory holding `<title> - <artist>.lrc` files.
    pub library_root: Option<PathBuf>,
    /// Honour `[offset:..]` tags when following playback.
    pub apply_offset: bool,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            library_root: None,
            apply_offset: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "layout": {{ "viewport_height": 800.0 }} }}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.layout.viewport_height, 800.0);
        assert_eq!(config.layout.divider_height, 16.0);
        assert!(config.lyrics.apply_offset);
        assert_eq!(config.lyrics.library_root, None);
    }

    #[test]
    fn rejects_negative_heights() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "layout": {{ "line_height": -1.0 }} }}"#).unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, LyricsError::Config(_)));
        assert!(format!("{err}").contains("line_height"));
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("none.json")).unwrap_err();
        assert!(err.is_not_found());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path).unwrap_err(), LyricsError::Json(_)));
    }
}
