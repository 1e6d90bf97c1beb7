//! Palette storage and the pure resolution rules used by the sequencer.
//!
//! Palettes inside a [`PaletteSet`] may have different lengths. Reads go
//! through [`PaletteSet::full_palette`], which pads every palette to the
//! widest one so that consumers always see a stable slot count.

use serde::{Deserialize, Serialize};

use crate::Color;

/// One animation keyframe: an ordered list of colors.
pub type Palette = Vec<Color>;

/// Ordered sequence of palettes forming an animation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteSet {
    palettes: Vec<Palette>,
}

impl PaletteSet {
    pub fn new(palettes: Vec<Palette>) -> Self {
        Self { palettes }
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Raw palette at `index`, wrapped with floored modulo.
    pub fn get(&self, index: i64) -> Option<&Palette> {
        let index = self.normalize(index)?;
        self.palettes.get(index)
    }

    /// Maps any integer onto a valid slot. `None` for an empty set.
    pub fn normalize(&self, index: i64) -> Option<usize> {
        if self.palettes.is_empty() {
            return None;
        }
        Some(floored_mod(index, self.palettes.len() as i64) as usize)
    }

    /// Length of the widest palette in the set.
    pub fn max_palette_len(&self) -> usize {
        self.palettes.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Resolves the effective palette at `index`.
    ///
    /// The target palette's own colors come first. Slots it lacks are taken
    /// from the previous palette (which collapses to the target itself at
    /// index 0 when the sequence does not loop), and anything still missing
    /// up to [`max_palette_len`](Self::max_palette_len) comes from the first
    /// subsequent palette, wrapping around, that defines that slot. Slots no
    /// palette defines are the zero color.
    pub fn full_palette(&self, index: i64, looping: bool) -> Palette {
        let Some(current) = self.normalize(index) else {
            return Vec::new();
        };
        let count = self.palettes.len();

        let previous = if !looping && current == 0 {
            current
        } else {
            (current + count - 1) % count
        };

        let mut resolved = self.palettes[current].clone();
        let own = resolved.len();
        resolved.extend(self.palettes[previous].iter().skip(own).copied());

        let width = self.max_palette_len();
        for slot in resolved.len()..width {
            let color = (1..count)
                .map(|offset| &self.palettes[(current + offset) % count])
                .find_map(|palette| palette.get(slot).copied())
                .unwrap_or_default();
            resolved.push(color);
        }

        resolved
    }
}

impl From<Vec<Palette>> for PaletteSet {
    fn from(palettes: Vec<Palette>) -> Self {
        Self::new(palettes)
    }
}

/// Interpolates two color arrays slot by slot.
///
/// The overlapping prefix is blended with an unclamped `t`; trailing colors
/// of the longer array are appended unchanged.
pub fn lerp_colors(from: &[Color], to: &[Color], t: f32) -> Palette {
    let overlap = from.len().min(to.len());
    let mut blended: Palette = from
        .iter()
        .zip(to)
        .map(|(a, b)| Color::lerp(*a, *b, t))
        .collect();

    let tail = if from.len() > overlap { from } else { to };
    blended.extend_from_slice(&tail[overlap..]);
    blended
}

/// Modulo that never returns a negative value for a positive divisor.
pub fn floored_mod(value: i64, modulus: i64) -> i64 {
    value.rem_euclid(modulus)
}

/// Floating point counterpart of [`floored_mod`].
pub fn floored_mod_f32(value: f32, modulus: f32) -> f32 {
    ((value % modulus) + modulus) % modulus
}
