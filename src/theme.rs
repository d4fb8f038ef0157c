use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ThemeError;

/// The binary display mode persisted for the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The theme a toggle switches to.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Maps a `prefers-color-scheme: dark` match onto a theme.
    pub fn from_system(matches_dark: bool) -> Self {
        if matches_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ThemeError::Config(format!("unknown theme '{}'", other))),
        }
    }
}

/// What the toggle button shows: icon glyph, visible text and `aria-label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleLabels {
    pub icon: String,
    pub text: String,
    pub aria_label: String,
}

impl ToggleLabels {
    pub fn new(icon: &str, text: &str, aria_label: &str) -> Self {
        Self {
            icon: icon.to_string(),
            text: text.to_string(),
            aria_label: aria_label.to_string(),
        }
    }

    /// Button content offering a switch to light mode.
    pub fn offer_light() -> Self {
        Self::new("\u{2600}\u{fe0f}", "Modalità Chiara", "Passa alla modalità chiara")
    }

    /// Button content offering a switch to dark mode.
    pub fn offer_dark() -> Self {
        Self::new("\u{1f319}", "Modalità Scura", "Passa alla modalità scura")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_values() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
    }

    #[test]
    fn test_parse_rejects_unknown_and_case_variants() {
        assert!("Dark".parse::<Theme>().is_err());
        assert!("system".parse::<Theme>().is_err());
        assert!("".parse::<Theme>().is_err());
    }

    #[test]
    fn test_toggled_is_an_involution() {
        for theme in [Theme::Light, Theme::Dark] {
            assert_ne!(theme.toggled(), theme);
            assert_eq!(theme.toggled().toggled(), theme);
        }
    }

    #[test]
    fn test_from_system() {
        assert_eq!(Theme::from_system(true), Theme::Dark);
        assert_eq!(Theme::from_system(false), Theme::Light);
    }

    #[test]
    fn test_serde_uses_lowercase_literals() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        let parsed: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(parsed, Theme::Light);
    }

    #[test]
    fn test_default_labels_glyphs() {
        assert_eq!(ToggleLabels::offer_light().icon, "☀️");
        assert_eq!(ToggleLabels::offer_dark().icon, "🌙");
        assert_eq!(ToggleLabels::offer_dark().text, "Modalità Scura");
    }
}
