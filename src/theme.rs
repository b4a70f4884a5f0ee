use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> ThemeMode {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    fn parse(raw: &str) -> Option<ThemeMode> {
        match raw.trim() {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }
}

/// The persisted light/dark preference. Read once when constructed,
/// written back on every toggle.
#[derive(Debug)]
pub struct ThemePreference {
    path: PathBuf,
    mode: ThemeMode,
}

impl ThemePreference {
    /// A missing or unrecognised file means light.
    pub fn load(path: &Path) -> Self {
        let mode = fs::read_to_string(path)
            .ok()
            .and_then(|raw| ThemeMode::parse(&raw))
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            mode,
        }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn toggle(&mut self) -> Result<ThemeMode> {
        self.mode = self.mode.toggled();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, self.mode.as_str())
            .with_context(|| format!("Failed to write theme preference to {}", self.path.display()))?;
        Ok(self.mode)
    }
}

/// Colors for one theme mode, handed to every render function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub highlight_bg: Color,
    pub error: Color,
    pub chart: Color,
}

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Palette {
                background: Color::Rgb(0xF3, 0xF4, 0xF6),
                text: Color::Rgb(0x37, 0x41, 0x51),
                dim: Color::Rgb(0x6B, 0x72, 0x80),
                accent: Color::Rgb(0x25, 0x63, 0xEB),
                highlight_bg: Color::Rgb(0xE5, 0xE7, 0xEB),
                error: Color::Rgb(0xDC, 0x26, 0x26),
                chart: Color::Rgb(0x3B, 0x82, 0xF6),
            },
            ThemeMode::Dark => Palette {
                background: Color::Rgb(0x11, 0x18, 0x27),
                text: Color::Rgb(0xF3, 0xF4, 0xF6),
                dim: Color::Rgb(0x9C, 0xA3, 0xAF),
                accent: Color::Rgb(0x60, 0xA5, 0xFA),
                highlight_bg: Color::Rgb(0x37, 0x41, 0x51),
                error: Color::Rgb(0xF8, 0x71, 0x71),
                chart: Color::Rgb(0x3B, 0x82, 0xF6),
            },
        }
    }

    /// Status badge color, matching the pipeline stage.
    pub fn status(&self, status: crate::models::JobStatus) -> Color {
        use crate::models::JobStatus;
        match status {
            JobStatus::Bookmarked => self.dim,
            JobStatus::Applying => Color::Yellow,
            JobStatus::Applied => Color::Cyan,
            JobStatus::Interviewing => Color::Magenta,
            JobStatus::Negotiating => Color::LightBlue,
            JobStatus::Accepted => Color::Green,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_to_light_without_file() {
        let dir = TempDir::new().unwrap();
        let pref = ThemePreference::load(&dir.path().join("theme"));
        assert_eq!(pref.mode(), ThemeMode::Light);
    }

    #[test]
    fn toggle_persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("theme");

        let mut pref = ThemePreference::load(&path);
        assert_eq!(pref.toggle().unwrap(), ThemeMode::Dark);
        assert_eq!(fs::read_to_string(&path).unwrap(), "dark");
        assert_eq!(ThemePreference::load(&path).mode(), ThemeMode::Dark);

        assert_eq!(pref.toggle().unwrap(), ThemeMode::Light);
        assert_eq!(ThemePreference::load(&path).mode(), ThemeMode::Light);
    }

    #[test]
    fn garbage_file_falls_back_to_light() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("theme");
        fs::write(&path, "purple").unwrap();
        assert_eq!(ThemePreference::load(&path).mode(), ThemeMode::Light);
    }

    #[test]
    fn palettes_differ_by_mode() {
        assert_ne!(
            Palette::for_mode(ThemeMode::Light).background,
            Palette::for_mode(ThemeMode::Dark).background
        );
    }
}
