//! Noise functions for terrain generation.
//!
//! Closed-form periodic fields over world coordinates. Every function is pure and
//! total, so chunk generation and structure placement always agree on a column.

/// Scale/magnitude pair describing one noise octave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseLayer {
    /// Wavelength divisor applied to world coordinates
    pub scale: f64,
    /// Peak amplitude
    pub magnitude: f64,
}

impl NoiseLayer {
    pub const fn new(scale: f64, magnitude: f64) -> Self {
        Self { scale, magnitude }
    }

    /// Sample this layer as plain 2D noise.
    pub fn sample_2d(self, x: f64, z: f64) -> f64 {
        noise_2d(x, z, self.scale, self.magnitude)
    }

    /// Sample this layer as ridged 2D noise.
    pub fn sample_ridged(self, x: f64, z: f64) -> f64 {
        ridged_2d(x, z, self.scale, self.magnitude)
    }
}

/// Octaves summed by [`combined_height_noise`].
pub const HEIGHT_OCTAVES: [NoiseLayer; 3] = [
    NoiseLayer::new(100.0, 15.0),
    NoiseLayer::new(50.0, 7.0),
    NoiseLayer::new(25.0, 3.0),
];

/// Ridged layer added on top of the octaves.
pub const HEIGHT_RIDGE: NoiseLayer = NoiseLayer::new(200.0, 10.0);

/// `magnitude * sin(x/scale) * cos(z/scale)`.
#[inline]
pub fn noise_2d(x: f64, z: f64, scale: f64, magnitude: f64) -> f64 {
    magnitude * (x / scale).sin() * (z / scale).cos()
}

/// `magnitude * sin(x/scale) * cos(z/scale) * sin(y/scale)`.
#[inline]
pub fn noise_3d(x: f64, y: f64, z: f64, scale: f64, magnitude: f64) -> f64 {
    magnitude * (x / scale).sin() * (z / scale).cos() * (y / scale).sin()
}

/// Absolute value of the 2D field, producing sharp creases at the zero crossings.
#[inline]
pub fn ridged_2d(x: f64, z: f64, scale: f64, magnitude: f64) -> f64 {
    magnitude * ((x / scale).sin() * (z / scale).cos()).abs()
}

/// Base terrain elevation before biome shaping.
pub fn combined_height_noise(x: f64, z: f64) -> f64 {
    let octaves: f64 = HEIGHT_OCTAVES
        .iter()
        .map(|layer| layer.sample_2d(x, z))
        .sum();
    octaves + HEIGHT_RIDGE.sample_ridged(x, z)
}
