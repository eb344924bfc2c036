mod display;
mod style;

pub use display::{annotate, render, DisplayDoc, DisplaySpan, MarkerSet, MatchState};
pub use style::{
    default_palette, parse_match_palette, Color, ColorParseError, MatchPalette, MatchStyle,
    PaletteParseError,
};
