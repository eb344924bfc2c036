use once_cell::sync::Lazy;

use crate::display::MatchState;

/// RGBA color used for highlight styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Visual style applied to one highlight state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStyle {
    pub foreground: Color,
    pub background: Color,
    pub bold: bool,
    pub underline: bool,
}

impl MatchStyle {
    /// The ANSI SGR escape sequence selecting this style.
    pub fn sgr_sequence(&self) -> String {
        let mut sequence = String::from("\x1b[");
        if self.bold {
            sequence.push_str("1;");
        }
        if self.underline {
            sequence.push_str("4;");
        }
        let fg = self.foreground;
        let bg = self.background;
        sequence.push_str(&format!(
            "38;2;{};{};{};48;2;{};{};{}m",
            fg.r, fg.g, fg.b, bg.r, bg.g, bg.b
        ));
        sequence
    }
}

/// Styles for the two highlight states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPalette {
    pub active: MatchStyle,
    pub inactive: MatchStyle,
}

impl MatchPalette {
    pub fn style_for(&self, state: MatchState) -> &MatchStyle {
        match state {
            MatchState::Active => &self.active,
            MatchState::Inactive => &self.inactive,
        }
    }
}

static DEFAULT_PALETTE: Lazy<MatchPalette> = Lazy::new(|| MatchPalette {
    active: MatchStyle {
        foreground: Color {
            r: 0x00,
            g: 0x00,
            b: 0x00,
            a: 0xFF,
        },
        background: Color {
            r: 0xFF,
            g: 0x98,
            b: 0x00,
            a: 0xFF,
        },
        bold: true,
        underline: false,
    },
    inactive: MatchStyle {
        foreground: Color {
            r: 0x00,
            g: 0x00,
            b: 0x00,
            a: 0xFF,
        },
        background: Color {
            r: 0xFF,
            g: 0xEB,
            b: 0x3B,
            a: 0xFF,
        },
        bold: false,
        underline: false,
    },
});

/// The built-in palette: amber for the active match, yellow for the rest.
pub fn default_palette() -> &'static MatchPalette {
    &DEFAULT_PALETTE
}

#[derive(Debug, thiserror::Error)]
pub enum PaletteParseError {
    #[error("palette must be a JSON object")]
    InvalidPalette,
    #[error("palette entry '{0}' is missing")]
    MissingEntry(&'static str),
    #[error("palette entries must be objects")]
    InvalidEntry,
    #[error("invalid color '{value}': {reason}")]
    InvalidColor {
        value: String,
        reason: ColorParseError,
    },
    #[error("entries must contain foreground and background colors")]
    MissingColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorParseError {
    MissingHash,
    InvalidLength,
    InvalidHex,
}

impl std::fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorParseError::MissingHash => write!(f, "missing leading '#'"),
            ColorParseError::InvalidLength => write!(f, "expected 6 or 8 hex digits"),
            ColorParseError::InvalidHex => write!(f, "contains non-hex digits"),
        }
    }
}

/// Parses a palette from JSON of the form
/// `{"active": {"foreground": "#000000", "background": "#FF9800", …},
///   "inactive": {…}}`.
pub fn parse_match_palette(value: &serde_json::Value) -> Result<MatchPalette, PaletteParseError> {
    let map = value.as_object().ok_or(PaletteParseError::InvalidPalette)?;
    let active = map
        .get("active")
        .ok_or(PaletteParseError::MissingEntry("active"))?;
    let inactive = map
        .get("inactive")
        .ok_or(PaletteParseError::MissingEntry("inactive"))?;
    Ok(MatchPalette {
        active: parse_style(active)?,
        inactive: parse_style(inactive)?,
    })
}

fn parse_style(value: &serde_json::Value) -> Result<MatchStyle, PaletteParseError> {
    let map = value.as_object().ok_or(PaletteParseError::InvalidEntry)?;

    let foreground = required_color(map, "foreground")?;
    let background = required_color(map, "background")?;
    let bold = map
        .get("bold")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let underline = map
        .get("underline")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    Ok(MatchStyle {
        foreground,
        background,
        bold,
        underline,
    })
}

fn required_color(
    map: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<Color, PaletteParseError> {
    let raw = map
        .get(key)
        .and_then(|value| value.as_str())
        .ok_or(PaletteParseError::MissingColor)?;
    parse_color(raw).map_err(|reason| PaletteParseError::InvalidColor {
        value: raw.to_string(),
        reason,
    })
}

fn parse_color(input: &str) -> Result<Color, ColorParseError> {
    let hex = input
        .trim()
        .strip_prefix('#')
        .ok_or(ColorParseError::MissingHash)?;
    if hex.len() != 6 && hex.len() != 8 {
        return Err(ColorParseError::InvalidLength);
    }
    let mut components = [0u8; 4];
    for index in 0..(hex.len() / 2) {
        let slice = &hex[index * 2..index * 2 + 2];
        components[index] =
            u8::from_str_radix(slice, 16).map_err(|_| ColorParseError::InvalidHex)?;
    }
    if hex.len() == 6 {
        components[3] = 255;
    }
    Ok(Color {
        r: components[0],
        g: components[1],
        b: components[2],
        a: components[3],
    })
}
