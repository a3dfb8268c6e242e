//! Named visual themes.
//!
//! A [`Theme`] is chosen once per run and read by every layout builder, so a
//! deck never mixes palettes. Colours are upper-case `RRGGBB` strings, the form
//! DrawingML `a:srgbClr` expects.

use crate::error::DeckError;
use serde::Serialize;

/// Palette, fonts and type sizes applied uniformly to a presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub name: &'static str,
    pub description: &'static str,
    pub background: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
    /// Text colour on primary/accent fills.
    pub on_accent: &'static str,
    pub title_font: &'static str,
    pub body_font: &'static str,
    /// Point sizes.
    pub title_size: u32,
    pub subtitle_size: u32,
    pub bullet_size: u32,
}

impl Theme {
    /// Colours cycled through chart series and pie slices.
    pub fn series_palette(&self) -> [&'static str; 6] {
        [
            self.primary,
            self.accent,
            self.secondary,
            "70AD47",
            "FFC000",
            "5B9BD5",
        ]
    }
}

pub const DEFAULT_THEME: &str = "professional";

static THEMES: &[Theme] = &[
    Theme {
        name: "professional",
        description: "Navy and steel blue on white, Calibri",
        background: "FFFFFF",
        primary: "1F3864",
        secondary: "2E75B6",
        accent: "C55A11",
        text: "262626",
        on_accent: "FFFFFF",
        title_font: "Calibri",
        body_font: "Calibri",
        title_size: 36,
        subtitle_size: 20,
        bullet_size: 20,
    },
    Theme {
        name: "modern",
        description: "Teal and violet with Segoe UI, clean and bright",
        background: "FAFAFA",
        primary: "00897B",
        secondary: "5E35B1",
        accent: "F4511E",
        text: "212121",
        on_accent: "FFFFFF",
        title_font: "Segoe UI Semibold",
        body_font: "Segoe UI",
        title_size: 38,
        subtitle_size: 20,
        bullet_size: 20,
    },
    Theme {
        name: "minimal",
        description: "Greyscale with a single blue accent, Helvetica",
        background: "FFFFFF",
        primary: "333333",
        secondary: "777777",
        accent: "0077CC",
        text: "333333",
        on_accent: "FFFFFF",
        title_font: "Helvetica",
        body_font: "Helvetica",
        title_size: 34,
        subtitle_size: 18,
        bullet_size: 18,
    },
    Theme {
        name: "dark",
        description: "Light text on charcoal, cyan accents",
        background: "1E1E1E",
        primary: "4FC3F7",
        secondary: "81C784",
        accent: "FFB74D",
        text: "EEEEEE",
        on_accent: "1E1E1E",
        title_font: "Arial",
        body_font: "Arial",
        title_size: 36,
        subtitle_size: 20,
        bullet_size: 20,
    },
    Theme {
        name: "vibrant",
        description: "Bold magenta and orange, Verdana",
        background: "FFFFFF",
        primary: "C2185B",
        secondary: "F57C00",
        accent: "7B1FA2",
        text: "2B2B2B",
        on_accent: "FFFFFF",
        title_font: "Verdana",
        body_font: "Verdana",
        title_size: 34,
        subtitle_size: 20,
        bullet_size: 18,
    },
];

/// All registered themes, in display order.
pub fn list_themes() -> &'static [Theme] {
    THEMES
}

/// Look up a theme by name (case-insensitive).
pub fn find_theme(name: &str) -> Result<&'static Theme, DeckError> {
    THEMES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| DeckError::UnknownTheme {
            name: name.to_string(),
            available: THEMES.iter().map(|t| t.name).collect::<Vec<_>>().join(", "),
        })
}
