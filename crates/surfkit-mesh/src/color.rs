//! Straight-alpha RGBA color and the blend used to stack layers.

/// A color with straight (non-premultiplied) alpha, all channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from an RGB triple.
    #[must_use]
    pub const fn opaque(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2], 1.0)
    }

    /// Blend `other` into `self` with the over operator.
    ///
    /// `self` is the front operand: the combined alpha is
    /// `(1 - a0) * a1 + a0`, so an opaque `self` is returned unchanged.
    /// When the combined alpha is at or below `f32::EPSILON` the result is
    /// `self`.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        let alpha = (1.0 - self.a) * other.a + self.a;
        if alpha <= f32::EPSILON {
            return self;
        }

        let weight = (1.0 - self.a) * other.a;
        Self {
            r: (weight * other.r + self.a * self.r) / alpha,
            g: (weight * other.g + self.a * self.g) / alpha,
            b: (weight * other.b + self.a * self.b) / alpha,
            a: alpha,
        }
    }

    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
