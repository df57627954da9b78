use std::ops::{Index, IndexMut};

use crate::foundation::error::{LxError, LxResult};
use crate::foundation::math::{constrain, mix_u8, unit_to_u8_weight};

/// Immutable grid geometry. Cell `i` sits at `row = i / width`, `column = i % width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> LxResult<Self> {
        if width == 0 || height == 0 {
            return Err(LxError::configuration(format!(
                "grid dimensions must be >= 1, got {width}x{height}"
            )));
        }
        if (width as usize).checked_mul(height as usize).is_none() {
            return Err(LxError::configuration("grid size overflows usize"));
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn total(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn row(self, i: usize) -> usize {
        i / self.width as usize
    }

    pub fn column(self, i: usize) -> usize {
        i % self.width as usize
    }

    pub fn index(self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width as usize);
        debug_assert!(y < self.height as usize);
        y * self.width as usize + x
    }

    /// Normalized column position in `[0, 1]`; 0.0 for single-column grids.
    pub fn xpos(self, i: usize) -> f64 {
        if self.width <= 1 {
            return 0.0;
        }
        self.column(i) as f64 / f64::from(self.width - 1)
    }

    /// Normalized row position in `[0, 1]`; 0.0 for single-row grids.
    pub fn ypos(self, i: usize) -> f64 {
        if self.height <= 1 {
            return 0.0;
        }
        self.row(i) as f64 / f64::from(self.height - 1)
    }

    pub fn midwidth(self) -> f64 {
        f64::from(self.width - 1) / 2.0
    }

    pub fn midheight(self) -> f64 {
        f64::from(self.height - 1) / 2.0
    }

    /// Index of the cell nearest the center (rounded toward the origin).
    pub fn center(self) -> usize {
        self.index(self.midwidth() as usize, self.midheight() as usize)
    }
}

/// Packed `0xAARRGGBB` color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(0xFF, r, g, b)
    }

    /// Build an opaque color from hue in degrees and saturation/brightness in `[0, 100]`.
    pub fn hsb(hue: f64, saturation: f64, brightness: f64) -> Self {
        let h = (if hue.is_finite() { hue.rem_euclid(360.0) } else { 0.0 }) / 60.0;
        let s = constrain(saturation / 100.0, 0.0, 1.0);
        let v = constrain(brightness / 100.0, 0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h.floor() as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        fn to_u8(v: f64) -> u8 {
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        }
        Self::rgb(to_u8(r + m), to_u8(g + m), to_u8(b + m))
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    pub const fn rgb_bytes(self) -> [u8; 3] {
        [self.r(), self.g(), self.b()]
    }

    fn max_channel(self) -> u8 {
        self.r().max(self.g()).max(self.b())
    }

    fn min_channel(self) -> u8 {
        self.r().min(self.g()).min(self.b())
    }

    /// HSB brightness in `[0, 100]`.
    pub fn brightness(self) -> f64 {
        f64::from(self.max_channel()) * 100.0 / 255.0
    }

    /// HSB saturation in `[0, 100]`.
    pub fn saturation(self) -> f64 {
        let max = self.max_channel();
        if max == 0 {
            return 0.0;
        }
        f64::from(max - self.min_channel()) * 100.0 / f64::from(max)
    }

    /// Scale brightness by `factor` in `[0, 1]`, keeping hue and saturation.
    pub fn scale_brightness(self, factor: f64) -> Self {
        let f = constrain(factor, 0.0, 1.0);
        let scale = |c: u8| (f64::from(c) * f).round() as u8;
        Self::argb(self.a(), scale(self.r()), scale(self.g()), scale(self.b()))
    }

    /// Channel-wise interpolation. `t <= 0` yields `self`, `t >= 1` yields `other`.
    pub fn lerp(self, other: Color, t: f64) -> Self {
        let tt = unit_to_u8_weight(t);
        Self::argb(
            mix_u8(self.a(), other.a(), tt),
            mix_u8(self.r(), other.r(), tt),
            mix_u8(self.g(), other.g(), tt),
            mix_u8(self.b(), other.b(), tt),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Color(#{:08X})", self.0)
    }
}

/// Fixed-length sequence of colors, one per grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorBuffer {
    colors: Vec<Color>,
}

impl ColorBuffer {
    pub fn new(len: usize) -> Self {
        Self::filled(len, Color::BLACK)
    }

    pub fn filled(len: usize, color: Color) -> Self {
        Self {
            colors: vec![color; len],
        }
    }

    pub fn from_colors(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Color> {
        self.colors.get(i).copied()
    }

    /// Write `color` at `i`; out-of-range writes are ignored.
    pub fn set(&mut self, i: usize, color: Color) {
        if let Some(slot) = self.colors.get_mut(i) {
            *slot = color;
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.colors.fill(color);
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.colors
    }

    pub fn as_mut_slice(&mut self) -> &mut [Color] {
        &mut self.colors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Color> {
        self.colors.iter()
    }

    /// Overwrite with `other`; both buffers must share a length.
    pub fn copy_from(&mut self, other: &ColorBuffer) {
        debug_assert_eq!(self.len(), other.len());
        self.colors.copy_from_slice(&other.colors);
    }
}

impl Index<usize> for ColorBuffer {
    type Output = Color;

    fn index(&self, i: usize) -> &Color {
        &self.colors[i]
    }
}

impl IndexMut<usize> for ColorBuffer {
    fn index_mut(&mut self, i: usize) -> &mut Color {
        &mut self.colors[i]
    }
}

impl<'a> IntoIterator for &'a ColorBuffer {
    type Item = &'a Color;
    type IntoIter = std::slice::Iter<'a, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
