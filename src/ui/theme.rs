//! Theme system for the console
//!
//! Provides:
//! - Theme struct with all UI colors
//! - Built-in presets (console, amber, nord, gruvbox)
//! - Hex color parsing
//!
//! Severity colours are fixed per level (see `case::Severity`) and are not
//! themed.

use ratatui::style::Color;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Main background color
    pub background: Color,
    /// Panel background (cards, feed, footer)
    pub panel: Color,
    /// Primary text color
    pub foreground: Color,
    /// Background for the selected case / view button
    pub selection_bg: Color,
    /// Text color for the selected case / view button
    pub selection_fg: Color,
    /// Accent color (borders, highlights)
    pub accent: Color,
    /// Dimmed text (captions, secondary info)
    pub dimmed: Color,
    /// More dimmed text (placeholders)
    pub dimmed_alt: Color,
    /// Mission status line (trip ETA, scanning, negotiation)
    pub status: Color,
    /// REC dot and error messages
    pub alert: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::console()
    }
}

impl Theme {
    /// Console theme - default, near-black with emerald accents
    pub fn console() -> Self {
        Self {
            background: Color::Rgb(10, 10, 15),      // #0a0a0f
            panel: Color::Rgb(22, 22, 30),           // #16161e
            foreground: Color::Rgb(255, 255, 255),   // #ffffff
            selection_bg: Color::Rgb(255, 255, 255), // #ffffff
            selection_fg: Color::Rgb(0, 0, 0),       // #000000
            accent: Color::Rgb(22, 241, 149),        // #16f195
            dimmed: Color::Rgb(153, 153, 160),       // #9999a0
            dimmed_alt: Color::Rgb(110, 110, 118),   // #6e6e76
            status: Color::Rgb(110, 231, 183),       // #6ee7b7 (emerald-300)
            alert: Color::Rgb(255, 75, 75),          // #ff4b4b
        }
    }

    /// Amber night-ops theme, low glare
    pub fn amber() -> Self {
        Self {
            background: Color::Rgb(12, 8, 2),        // #0c0802
            panel: Color::Rgb(28, 20, 6),            // #1c1406
            foreground: Color::Rgb(255, 191, 0),     // #ffbf00
            selection_bg: Color::Rgb(255, 191, 0),   // #ffbf00
            selection_fg: Color::Rgb(12, 8, 2),      // #0c0802
            accent: Color::Rgb(255, 140, 0),         // #ff8c00
            dimmed: Color::Rgb(179, 134, 0),         // #b38600
            dimmed_alt: Color::Rgb(115, 86, 0),      // #735600
            status: Color::Rgb(255, 214, 102),       // #ffd666
            alert: Color::Rgb(255, 75, 75),          // #ff4b4b
        }
    }

    /// Nord theme
    pub fn nord() -> Self {
        Self {
            background: Color::Rgb(46, 52, 64),      // #2e3440 (nord0)
            panel: Color::Rgb(59, 66, 82),           // #3b4252 (nord1)
            foreground: Color::Rgb(236, 239, 244),   // #eceff4 (nord6)
            selection_bg: Color::Rgb(136, 192, 208), // #88c0d0 (nord8)
            selection_fg: Color::Rgb(46, 52, 64),    // #2e3440 (nord0)
            accent: Color::Rgb(136, 192, 208),       // #88c0d0 (nord8)
            dimmed: Color::Rgb(216, 222, 233),       // #d8dee9 (nord4)
            dimmed_alt: Color::Rgb(76, 86, 106),     // #4c566a (nord3)
            status: Color::Rgb(163, 190, 140),       // #a3be8c (nord14)
            alert: Color::Rgb(191, 97, 106),         // #bf616a (nord11)
        }
    }

    /// Gruvbox dark theme
    pub fn gruvbox() -> Self {
        Self {
            background: Color::Rgb(40, 40, 40),      // #282828 (bg)
            panel: Color::Rgb(60, 56, 54),           // #3c3836 (bg1)
            foreground: Color::Rgb(235, 219, 178),   // #ebdbb2 (fg)
            selection_bg: Color::Rgb(235, 219, 178), // #ebdbb2 (fg)
            selection_fg: Color::Rgb(40, 40, 40),    // #282828 (bg)
            accent: Color::Rgb(215, 153, 33),        // #d79921 (yellow)
            dimmed: Color::Rgb(168, 153, 132),       // #a89984 (gray)
            dimmed_alt: Color::Rgb(146, 131, 116),   // #928374 (gray)
            status: Color::Rgb(152, 151, 26),        // #98971a (green)
            alert: Color::Rgb(204, 36, 29),          // #cc241d (red)
        }
    }

    /// Load theme from preset name
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "console" | "default" => Some(Self::console()),
            "amber" => Some(Self::amber()),
            "nord" => Some(Self::nord()),
            "gruvbox" | "gruvbox-dark" | "gruvbox_dark" => Some(Self::gruvbox()),
            _ => None,
        }
    }
}

/// Parse hex color string to Color
/// Supports: #rrggbb, #rgb, rrggbb, rgb
pub fn parse_hex_color(s: &str) -> Result<Color, ColorError> {
    let s = s.trim().trim_start_matches('#');

    if !s.is_ascii() {
        return Err(ColorError::InvalidHex);
    }

    match s.len() {
        // #rgb -> #rrggbb
        3 => {
            let r = u8::from_str_radix(&s[0..1], 16).map_err(|_| ColorError::InvalidHex)?;
            let g = u8::from_str_radix(&s[1..2], 16).map_err(|_| ColorError::InvalidHex)?;
            let b = u8::from_str_radix(&s[2..3], 16).map_err(|_| ColorError::InvalidHex)?;
            Ok(Color::Rgb(r * 17, g * 17, b * 17))
        }
        // #rrggbb
        6 => {
            let r = u8::from_str_radix(&s[0..2], 16).map_err(|_| ColorError::InvalidHex)?;
            let g = u8::from_str_radix(&s[2..4], 16).map_err(|_| ColorError::InvalidHex)?;
            let b = u8::from_str_radix(&s[4..6], 16).map_err(|_| ColorError::InvalidHex)?;
            Ok(Color::Rgb(r, g, b))
        }
        _ => Err(ColorError::InvalidLength),
    }
}

/// Color parsing error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorError {
    #[error("invalid color length (expected 3 or 6 hex chars)")]
    InvalidLength,
    #[error("invalid hex character")]
    InvalidHex,
}
