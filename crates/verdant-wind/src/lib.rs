//! Wind animation for branch trees.
//!
//! Each animation tick computes a small time-varying sway rotation — a
//! periodic component plus a smoothly-varying pseudo-random gust — and
//! propagates it from the roots down, composing each branch's sway onto its
//! parent's accumulated rotation so child sway rides on top of parent sway.
//!
//! Propagation is a pure function of time and tree structure: calling it
//! with increasing `time` values produces continuous animation, and no tree
//! nodes are allocated or removed.
//!
//! # Example
//!
//! ```
//! use verdant_turtle::{interpret, NullSink, TurtleConfig};
//! use verdant_wind::{Wind, WindParams};
//!
//! let mut result = interpret("F[+F][-F]", &TurtleConfig::default(), &mut NullSink);
//!
//! let wind = Wind::new(WindParams::default());
//! wind.propagate(&mut result.tree, 0.25);
//! ```

use glam::{EulerRot, Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use verdant_turtle::{BranchId, BranchTree};

/// Wind parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindParams {
    /// Sway amplitude in degrees.
    pub strength: f32,
    /// Sway frequency in cycles per second.
    pub frequency: f32,
    /// Gust amplitude in degrees, 0 disables gusting.
    pub gustiness: f32,
    /// Prevailing wind direction.
    pub direction: Vec3,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            strength: 0.5,
            frequency: 1.0,
            gustiness: 0.3,
            direction: Vec3::X,
        }
    }
}

impl WindParams {
    /// Still air: no sway at all.
    pub fn calm() -> Self {
        Self {
            strength: 0.0,
            frequency: 1.0,
            gustiness: 0.0,
            direction: Vec3::X,
        }
    }

    /// Gentle breeze with light gusting.
    pub fn breeze() -> Self {
        Self::default()
    }

    /// Strong, gusty wind.
    pub fn storm() -> Self {
        Self {
            strength: 2.0,
            frequency: 1.6,
            gustiness: 1.0,
            direction: Vec3::X,
        }
    }

    /// Sets the prevailing direction, normalized.
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = direction.normalize_or(Vec3::X);
        self
    }
}

/// Propagates time-varying sway over a [`BranchTree`].
#[derive(Debug, Clone, Copy)]
pub struct Wind {
    params: WindParams,
    gust_seed: i32,
}

impl Wind {
    /// Creates a wind propagator.
    pub fn new(params: WindParams) -> Self {
        Self {
            params,
            gust_seed: 0,
        }
    }

    /// Sets the gust noise seed.
    pub fn with_seed(mut self, seed: i32) -> Self {
        self.gust_seed = seed;
        self
    }

    /// Returns the wind parameters.
    pub fn params(&self) -> WindParams {
        self.params
    }

    /// Computes the per-branch sway rotation at `time`.
    pub fn sway(&self, time: f32) -> Quat {
        let p = self.params;
        let gust = perlin1(time * p.frequency, self.gust_seed) * p.gustiness;
        let sway_x = (time * p.frequency).sin() * p.strength + gust;
        let sway_y = (time * p.frequency * 0.5).cos() * p.strength * 0.7;

        Quat::from_euler(
            EulerRot::ZXY,
            0.0,
            sway_x.to_radians(),
            sway_y.to_radians(),
        )
    }

    /// Applies sway at `time` to every branch, starting from the roots.
    ///
    /// Each branch's orientation becomes its parent's accumulated rotation
    /// composed with the sway, so rotations compound along the path from the
    /// root. Branches removed mid-traversal are skipped along with their
    /// subtrees.
    pub fn propagate(&self, tree: &mut BranchTree, time: f32) {
        let sway = self.sway(time);
        for root in tree.roots() {
            apply_recursive(tree, root, sway, Quat::IDENTITY);
        }
    }
}

fn apply_recursive(tree: &mut BranchTree, id: BranchId, sway: Quat, accumulated: Quat) {
    let Some(branch) = tree.get_mut(id) else {
        return;
    };

    let rotation = (accumulated * sway).normalize();
    branch.orientation = rotation;

    let children: Vec<BranchId> = branch.children().to_vec();
    for child in children {
        apply_recursive(tree, child, sway, rotation);
    }
}

// 1-D gradient noise for the gust term. Permutation-table Perlin noise,
// smooth (C1) everywhere, returning values in [0, 1].

const PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn perm(x: i32, seed: i32) -> u8 {
    PERM[((x.wrapping_add(seed)) & 255) as usize]
}

#[inline]
fn grad1(hash: u8, x: f32) -> f32 {
    if hash & 1 != 0 { -x } else { x }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Samples 1-D Perlin noise at `x`, returning a value in [0, 1].
fn perlin1(x: f32, seed: i32) -> f32 {
    let xi = x.floor() as i32;
    let xf = x - x.floor();
    let u = fade(xf);

    let a = perm(xi, seed);
    let b = perm(xi + 1, seed);

    (lerp(grad1(a, xf), grad1(b, xf - 1.0), u) * 0.5 + 0.5).clamp(0.0, 1.0)
}
