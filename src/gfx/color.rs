//! RGBA colours clamped to the unit range.

use std::ops::Mul;

/// An RGBA colour whose channels always lie in `[0.0, 1.0]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

pub const SKY_BLUE: Color = Color::rgba_unchecked(0.529, 0.807, 0.921, 1.0);
pub const SUNLIGHT: Color = Color::rgba_unchecked(0.992, 0.984, 0.827, 1.0);
pub const WHITE: Color = Color::rgba_unchecked(1.0, 1.0, 1.0, 1.0);
pub const GREY: Color = Color::rgba_unchecked(0.5, 0.5, 0.5, 1.0);

fn clamp_channel(value: f32) -> f32 {
    // NaN collapses to 0.0 like any other out-of-range value
    if value >= 0.0 && value <= 1.0 {
        value
    } else if value > 1.0 {
        1.0
    } else {
        0.0
    }
}

impl Color {
    /// Creates a colour, clamping every channel into `[0.0, 1.0]`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: clamp_channel(r),
            g: clamp_channel(g),
            b: clamp_channel(b),
            a: clamp_channel(a),
        }
    }

    /// Opaque grey with all colour channels set to `level`.
    pub fn grey(level: f32) -> Self {
        Self::new(level, level, level, 1.0)
    }

    const fn rgba_unchecked(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color> for [f32; 4] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

impl From<Color> for wgpu::Color {
    fn from(color: Color) -> Self {
        wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        }
    }
}

/// Component-wise product.
impl Mul for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        Color::new(
            self.r * other.r,
            self.g * other.g,
            self.b * other.b,
            self.a * other.a,
        )
    }
}

/// Scales every channel (alpha included) by a strength factor.
impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, strength: f32) -> Color {
        Color::new(
            self.r * strength,
            self.g * strength,
            self.b * strength,
            self.a * strength,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_clamped() {
        let c = Color::new(1.5, -0.25, 0.5, f32::NAN);
        assert_eq!(c.to_array(), [1.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_color_products_stay_in_range() {
        let tinted = SKY_BLUE * SUNLIGHT;
        assert!((tinted.r - 0.529 * 0.992).abs() < 1e-6);
        assert_eq!(tinted.a, 1.0);

        let boosted = WHITE * 3.0;
        assert_eq!(boosted, WHITE);

        let dimmed = WHITE * 0.1;
        assert!((dimmed.g - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_grey_is_opaque() {
        assert_eq!(Color::grey(0.5), GREY);
    }
}
