//! sRGB <-> linear lookup tables for a single configured gamma exponent.
//!
//! Both tables are built once and never mutated, so a single instance is
//! shared (behind an `Arc`) by every pipeline invocation.

use crate::error::PipelineError;

/// Lookup tables for one gamma exponent.
///
/// Values stay on the 0..=255 scale on both sides: `degamma` maps an sRGB
/// byte to a linear intensity, `encode` maps a truncated linear intensity
/// back to an sRGB byte.
#[derive(Debug, Clone)]
pub struct GammaTables {
    gamma: f32,
    degamma: [f32; 256],
    encode: [u8; 256],
}

impl GammaTables {
    /// Build the tables for `gamma`.
    ///
    /// Returns [`PipelineError::InvalidGamma`] for non-finite or
    /// non-positive exponents.
    pub fn new(gamma: f32) -> Result<Self, PipelineError> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(PipelineError::InvalidGamma(gamma));
        }

        let g = gamma as f64;
        let mut degamma = [0.0f32; 256];
        let mut encode = [0u8; 256];
        for i in 0..256 {
            let x = i as f64 / 255.0;
            degamma[i] = (x.powf(g) * 255.0) as f32;
            encode[i] = (x.powf(1.0 / g) * 255.0).clamp(0.0, 255.0) as u8;
        }

        Ok(Self {
            gamma,
            degamma,
            encode,
        })
    }

    #[inline]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Linear intensity of an sRGB byte, on the 0.0..=255.0 scale.
    #[inline]
    pub fn srgb_to_linear(&self, v: u8) -> f32 {
        self.degamma[v as usize]
    }

    /// sRGB byte for a linear intensity.
    ///
    /// The input is truncated and clamped to a table index, so the result is
    /// the nearest lower table entry rather than an exact inverse.
    #[inline]
    pub fn linear_to_srgb(&self, v: f32) -> u8 {
        let index = v.clamp(0.0, 255.0) as usize;
        self.encode[index]
    }
}
