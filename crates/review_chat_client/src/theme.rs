//! Dark/light theme preference and the terminal palette for each.

use colored::{ColoredString, Colorize};

use crate::prefs::PrefStore;

/// Preference key holding the theme.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Stored theme, or dark when absent or unrecognised.
    pub fn load(store: &PrefStore) -> Self {
        store
            .get(THEME_KEY)
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn persist(self, store: &PrefStore) {
        store.set(THEME_KEY, self.as_str());
    }

    pub fn palette(self) -> Palette {
        Palette { theme: self }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colours used by the terminal view.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    theme: Theme,
}

impl Palette {
    pub fn user(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => s.bright_cyan().bold(),
            Theme::Light => s.blue().bold(),
        }
    }

    pub fn assistant(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => s.bright_green().bold(),
            Theme::Light => s.green().bold(),
        }
    }

    pub fn muted(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => s.bright_black(),
            Theme::Light => s.dimmed(),
        }
    }

    pub fn badge(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => s.yellow(),
            Theme::Light => s.magenta(),
        }
    }

    pub fn error(&self, s: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => s.bright_red().bold(),
            Theme::Light => s.red().bold(),
        }
    }
}
