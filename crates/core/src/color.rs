use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, SequencerError};

/// Four component floating point color. Components are conventionally in
/// `[0, 1]` but nothing here enforces that range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const CLEAR: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Component-wise linear interpolation. `t` is not clamped, so values
    /// outside `[0, 1]` extrapolate past either endpoint.
    pub fn lerp(a: Color, b: Color, t: f32) -> Color {
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(SequencerError::invalid(format!(
                "`{hex}` is not a #RRGGBB or #RRGGBBAA color"
            )));
        }

        let channel = |at: usize| -> Result<f32> {
            u8::from_str_radix(&digits[at..at + 2], 16)
                .map(|byte| byte as f32 / 255.0)
                .map_err(|_| SequencerError::invalid(format!("`{hex}` contains non-hex digits")))
        };

        let alpha = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Color::new(r, g, b, a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({:.3}, {:.3}, {:.3}, {:.3})",
            self.r, self.g, self.b, self.a
        )
    }
}

/// Accepted on-disk spellings of a color.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgba([f32; 4]),
    Rgb([f32; 3]),
    Fields {
        r: f32,
        g: f32,
        b: f32,
        #[serde(default = "opaque")]
        a: f32,
    },
}

fn opaque() -> f32 {
    1.0
}

impl TryFrom<ColorRepr> for Color {
    type Error = SequencerError;

    fn try_from(value: ColorRepr) -> Result<Self> {
        match value {
            ColorRepr::Hex(hex) => Color::from_hex(&hex),
            ColorRepr::Rgba(rgba) => Ok(rgba.into()),
            ColorRepr::Rgb([r, g, b]) => Ok(Color::rgb(r, g, b)),
            ColorRepr::Fields { r, g, b, a } => Ok(Color::new(r, g, b, a)),
        }
    }
}
