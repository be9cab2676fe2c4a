//! Interpretation parameters.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Placement parameters for one decoration kind (leaves or flowers).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecorationParams {
    /// Base placement probability, 0-1.
    pub probability: f32,
    /// Density multiplier applied to the probability gate.
    pub density: f32,
    /// Smallest sampled scale.
    pub scale_min: f32,
    /// Largest sampled scale.
    pub scale_max: f32,
    /// Local offset from the attachment point, in cursor space.
    pub offset: Vec3,
    /// Number of visual variants the collaborator can choose from.
    pub variants: u32,
}

impl Default for DecorationParams {
    fn default() -> Self {
        Self {
            probability: 0.5,
            density: 1.0,
            scale_min: 0.8,
            scale_max: 1.2,
            offset: Vec3::ZERO,
            variants: 1,
        }
    }
}

/// Configuration for turtle interpretation.
///
/// Read-only during one interpretation pass; the caller may freely mutate it
/// between passes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TurtleConfig {
    /// Turning angle in degrees for `+`, `-`, `&`, `^`, `/`, `\`.
    pub angle: f32,
    /// Base segment length for `F` and `f`.
    pub step: f32,
    /// Base segment thickness.
    pub thickness: f32,
    /// Multiplier applied to the cursor length scale by `"`.
    pub length_taper: f32,
    /// Multiplier applied to the cursor thickness scale by `!`.
    pub thickness_taper: f32,
    /// Stochastic jitter fraction on drawn segment length.
    pub length_variation: f32,
    /// Stochastic jitter fraction on thickness tapering.
    pub thickness_variation: f32,
    /// Smallest curvature bend in degrees, for `~`.
    pub curvature_min: f32,
    /// Largest curvature bend in degrees, for `~`.
    pub curvature_max: f32,
    /// Leaf placement parameters, for `L`.
    pub leaf: DecorationParams,
    /// Flower placement parameters, for `O`.
    pub flower: DecorationParams,
    /// Turn on all three axes instead of only the plane.
    pub is_3d: bool,
    /// Randomize turn angles, segment lengths, and tapers.
    pub stochastic: bool,
    /// Whether `L` symbols place leaves.
    pub leaves_enabled: bool,
    /// Whether `O` symbols place flowers.
    pub flowers_enabled: bool,
    /// Distance within which two node positions are considered the same.
    pub dedup_epsilon: f32,
    /// Seed for the interpretation RNG.
    pub seed: u64,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            angle: 25.0,
            step: 1.0,
            thickness: 0.1,
            length_taper: 0.9,
            thickness_taper: 0.85,
            length_variation: 0.2,
            thickness_variation: 0.2,
            curvature_min: 0.0,
            curvature_max: 15.0,
            leaf: DecorationParams::default(),
            flower: DecorationParams::default(),
            is_3d: false,
            stochastic: false,
            leaves_enabled: true,
            flowers_enabled: true,
            dedup_epsilon: 0.01,
            seed: 0,
        }
    }
}

impl TurtleConfig {
    /// Sets the turning angle in degrees.
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Sets the base segment length.
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Sets the base segment thickness.
    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }

    /// Enables or disables three-axis turning.
    pub fn with_3d(mut self, is_3d: bool) -> Self {
        self.is_3d = is_3d;
        self
    }

    /// Enables or disables stochastic mode.
    pub fn with_stochastic(mut self, stochastic: bool) -> Self {
        self.stochastic = stochastic;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
