//! The resumable turtle interpreter.
//!
//! Symbol set (open; anything else is reported as an unknown symbol):
//!
//! - `F`: move forward, drawing a segment
//! - `f`: move forward without drawing
//! - `+` / `-`: turn by the configured angle (planar mode turns about Z
//!   only; 3-D mode turns on all three axes)
//! - `|`: turn around (180 degrees)
//! - `&` / `^`: pitch down / up (3-D mode only)
//! - `\` / `/`: roll left / right (3-D mode only)
//! - `[` / `]`: save / restore cursor state and current branch
//! - `!`: taper thickness, `"`: taper length
//! - `~`: bend the heading within the configured curvature range
//! - `L` / `O`: place a leaf / flower, gated on probability times density
//!
//! In stochastic mode turn angles are sampled per axis from
//! `[-angle, angle]`, drawn lengths jitter by the length variation factor,
//! and thickness tapering jitters by the thickness variation factor.
//! Deterministic mode applies configured values exactly, so interpreting the
//! same string twice yields identical trees.

use std::f32::consts::PI;

use glam::{EulerRot, Quat, Vec3};
use thiserror::Error;

use crate::config::TurtleConfig;
use crate::sink::{Decoration, DecorationKind, RenderSink};
use crate::tree::{Branch, BranchId, BranchTree};

/// A non-fatal structural anomaly encountered during interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// A `]` with no matching `[`. Interpretation continues with the cursor
    /// unchanged.
    #[error("unmatched ']' at symbol {index}")]
    UnmatchedPop {
        /// Index of the offending symbol.
        index: usize,
    },

    /// A symbol with no assigned meaning. Skipped.
    #[error("unknown symbol '{symbol}' at {index}")]
    UnknownSymbol {
        /// The unrecognized symbol.
        symbol: char,
        /// Index of the offending symbol.
        index: usize,
    },
}

/// Outcome of one interpretation slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Symbols remain; call [`Interpreter::step`] again.
    InProgress,
    /// Every symbol has been consumed.
    Finished,
    /// The pass was cancelled; no further symbols will be consumed.
    Cancelled,
}

/// Everything produced by one interpretation pass.
#[derive(Debug, Clone)]
pub struct Interpretation {
    /// The branch forest.
    pub tree: BranchTree,
    /// Created branches, in creation order.
    pub branches: Vec<BranchId>,
    /// Leaf and flower placements, in emission order.
    pub decorations: Vec<Decoration>,
    /// Structural anomalies, in encounter order.
    pub warnings: Vec<Warning>,
}

/// Transient turtle cursor.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    position: Vec3,
    orientation: Quat,
    length_scale: f32,
    thickness_scale: f32,
}

impl Cursor {
    fn origin() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            length_scale: 1.0,
            thickness_scale: 1.0,
        }
    }
}

/// State saved by `[` and restored by `]`.
#[derive(Debug, Clone, Copy)]
struct SavedState {
    cursor: Cursor,
    branch: Option<BranchId>,
}

/// Interprets an L-system string slice by slice, building a [`BranchTree`].
///
/// Drive it with [`step`](Self::step) from a host loop, or use
/// [`run`](Self::run) / [`interpret`] to block until done.
#[derive(Debug)]
pub struct Interpreter {
    symbols: Vec<char>,
    next: usize,
    config: TurtleConfig,
    cursor: Cursor,
    stack: Vec<SavedState>,
    /// Pending segment endpoints; a segment materializes at two.
    buffer: Vec<Vec3>,
    current: Option<BranchId>,
    /// Start positions of materialized segments, for deduplication.
    markers: Vec<Vec3>,
    tree: BranchTree,
    branches: Vec<BranchId>,
    decorations: Vec<Decoration>,
    warnings: Vec<Warning>,
    rng: SimpleRng,
    cancelled: bool,
}

impl Interpreter {
    /// Creates an interpreter over `symbols`.
    pub fn new(symbols: &str, config: TurtleConfig) -> Self {
        let rng = SimpleRng::new(config.seed);
        Self {
            symbols: symbols.chars().collect(),
            next: 0,
            config,
            cursor: Cursor::origin(),
            stack: Vec::new(),
            buffer: vec![Vec3::ZERO],
            current: None,
            markers: Vec::new(),
            tree: BranchTree::new(),
            branches: Vec::new(),
            decorations: Vec::new(),
            warnings: Vec::new(),
            rng,
            cancelled: false,
        }
    }

    /// Returns `(consumed, total)` symbol counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.next, self.symbols.len())
    }

    /// Returns true once every symbol has been consumed.
    pub fn is_finished(&self) -> bool {
        self.next >= self.symbols.len()
    }

    /// Marks the pass as cancelled. Subsequent [`step`](Self::step) calls
    /// consume nothing.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Returns true if [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Returns the branches created so far, in creation order.
    pub fn branches(&self) -> &[BranchId] {
        &self.branches
    }

    /// Returns the partially-built tree.
    pub fn tree(&self) -> &BranchTree {
        &self.tree
    }

    /// Consumes up to `budget` symbols (at least one), reporting created
    /// geometry to `sink`.
    pub fn step(&mut self, sink: &mut dyn RenderSink, budget: usize) -> StepStatus {
        if self.cancelled {
            return StepStatus::Cancelled;
        }

        let end = self.next.saturating_add(budget.max(1)).min(self.symbols.len());
        while self.next < end {
            let index = self.next;
            let symbol = self.symbols[index];
            self.next += 1;
            self.exec(symbol, index, sink);
        }

        if self.is_finished() {
            StepStatus::Finished
        } else {
            StepStatus::InProgress
        }
    }

    /// Drives the interpreter to completion and returns the result.
    pub fn run(mut self, sink: &mut dyn RenderSink) -> Interpretation {
        while self.step(sink, usize::MAX) == StepStatus::InProgress {}
        self.finish()
    }

    /// Extracts the (possibly partial) result.
    pub fn finish(self) -> Interpretation {
        Interpretation {
            tree: self.tree,
            branches: self.branches,
            decorations: self.decorations,
            warnings: self.warnings,
        }
    }

    fn exec(&mut self, symbol: char, index: usize, sink: &mut dyn RenderSink) {
        match symbol {
            'F' => self.draw(sink),
            'f' => self.advance(),
            '+' => self.turn(1.0),
            '-' => self.turn(-1.0),
            '|' => self.rotate(Quat::from_rotation_z(PI)),
            '&' if self.config.is_3d => self.rotate_by_angle(Vec3::X, 1.0),
            '^' if self.config.is_3d => self.rotate_by_angle(Vec3::X, -1.0),
            '\\' if self.config.is_3d => self.rotate_by_angle(Vec3::Y, 1.0),
            '/' if self.config.is_3d => self.rotate_by_angle(Vec3::Y, -1.0),
            '[' => self.stack.push(SavedState {
                cursor: self.cursor,
                branch: self.current,
            }),
            ']' => self.pop(index),
            '!' => self.taper_thickness(),
            '"' => {
                self.cursor.length_scale *= self.config.length_taper;
            }
            '~' => self.curve(),
            'L' if self.config.leaves_enabled => self.decorate(DecorationKind::Leaf, sink),
            'O' if self.config.flowers_enabled => self.decorate(DecorationKind::Flower, sink),
            // Disabled decorations stay recognized no-ops.
            'L' | 'O' => {}
            _ => self.warnings.push(Warning::UnknownSymbol { symbol, index }),
        }
    }

    /// Moves forward and materializes a segment once two endpoints are
    /// buffered.
    fn draw(&mut self, sink: &mut dyn RenderSink) {
        let next_position = self.cursor.position + self.forward() * self.step_length();

        // Skip positions that already carry a node, so grammars revisiting a
        // point do not double geometry.
        if !self.node_exists_near(next_position) {
            self.buffer.push(next_position);
        }

        if self.buffer.len() == 2 {
            let start = self.buffer[0];
            let end = self.buffer[1];
            self.materialize(start, end, sink);
        }
    }

    fn materialize(&mut self, start: Vec3, end: Vec3, sink: &mut dyn RenderSink) {
        // Continuity test: only a segment growing out of the current
        // branch's end is its child; anything else starts a new chain.
        let parent = self.current.filter(|id| {
            self.tree
                .get(*id)
                .is_some_and(|b| b.end.distance(start) <= self.config.dedup_epsilon)
        });

        let thickness = self.config.thickness * self.cursor.thickness_scale;
        let id = self.tree.add(
            Branch::new(start, end, self.cursor.orientation, thickness),
            parent,
        );

        let render = sink.branch_created(id, start, end, thickness, parent);
        if let Some(branch) = self.tree.get_mut(id) {
            branch.set_render(render);
        }

        self.branches.push(id);
        self.markers.push(start);
        self.current = Some(id);
        self.cursor.position = end;
        self.buffer.clear();
        self.buffer.push(end);
    }

    /// Moves forward without drawing; the pending segment is abandoned.
    fn advance(&mut self) {
        let step = self.forward() * self.step_length();
        self.cursor.position += step;
        self.reset_buffer();
    }

    fn pop(&mut self, index: usize) {
        match self.stack.pop() {
            Some(saved) => {
                self.cursor = saved.cursor;
                self.current = saved.branch;
                self.reset_buffer();
            }
            None => self.warnings.push(Warning::UnmatchedPop { index }),
        }
    }

    fn turn(&mut self, sign: f32) {
        let angle = self.config.angle;
        let rotation = if self.config.is_3d {
            let (x, y, z) = if self.config.stochastic {
                (
                    self.rng.range(-angle, angle),
                    self.rng.range(-angle, angle),
                    self.rng.range(-angle, angle),
                )
            } else {
                (sign * angle, sign * angle, sign * angle)
            };
            Quat::from_euler(
                EulerRot::ZXY,
                z.to_radians(),
                x.to_radians(),
                y.to_radians(),
            )
        } else {
            let z = if self.config.stochastic {
                self.rng.range(-angle, angle)
            } else {
                -sign * angle
            };
            Quat::from_rotation_z(z.to_radians())
        };
        self.rotate(rotation);
    }

    fn rotate_by_angle(&mut self, axis: Vec3, sign: f32) {
        let rotation = Quat::from_axis_angle(axis, (sign * self.config.angle).to_radians());
        self.rotate(rotation);
    }

    fn rotate(&mut self, rotation: Quat) {
        self.cursor.orientation = (self.cursor.orientation * rotation).normalize();
    }

    fn taper_thickness(&mut self) {
        let mut factor = self.config.thickness_taper;
        if self.config.stochastic {
            factor *= 1.0 + self.rng.range(
                -self.config.thickness_variation,
                self.config.thickness_variation,
            );
        }
        self.cursor.thickness_scale = (self.cursor.thickness_scale * factor).max(0.0);
    }

    /// Bends the heading within the configured curvature range.
    fn curve(&mut self) {
        let min = self.config.curvature_min;
        let max = self.config.curvature_max;

        if self.config.stochastic {
            let bend = self.rng.range(min, max) * self.rng.sign();
            self.rotate(Quat::from_rotation_z(bend.to_radians()));
            if self.config.is_3d {
                let bend = self.rng.range(min, max) * self.rng.sign();
                self.rotate(Quat::from_rotation_x(bend.to_radians()));
            }
        } else {
            let mid = 0.5 * (min + max);
            self.rotate(Quat::from_rotation_z(mid.to_radians()));
        }
    }

    fn decorate(&mut self, kind: DecorationKind, sink: &mut dyn RenderSink) {
        let params = match kind {
            DecorationKind::Leaf => self.config.leaf,
            DecorationKind::Flower => self.config.flower,
        };

        let gate = params.probability * params.density;
        if self.rng.next_f32() >= gate {
            return;
        }

        let scale = self.rng.range(params.scale_min, params.scale_max);
        let variant = if params.variants > 1 {
            self.rng.next_u32() % params.variants
        } else {
            0
        };
        let rotation = self.cursor.orientation;
        let position = self.cursor.position + rotation * params.offset;

        let decoration = Decoration {
            kind,
            position,
            rotation,
            scale,
            variant,
            branch: self.current,
        };
        sink.decoration_placed(&decoration);
        self.decorations.push(decoration);
    }

    fn forward(&self) -> Vec3 {
        self.cursor.orientation * Vec3::Y
    }

    fn step_length(&mut self) -> f32 {
        let mut step = self.config.step * self.cursor.length_scale;
        if self.config.stochastic {
            step *= 1.0
                + self
                    .rng
                    .range(-self.config.length_variation, self.config.length_variation);
        }
        step
    }

    fn node_exists_near(&self, position: Vec3) -> bool {
        self.markers
            .iter()
            .any(|m| m.distance(position) < self.config.dedup_epsilon)
    }

    fn reset_buffer(&mut self) {
        self.buffer.clear();
        self.buffer.push(self.cursor.position);
    }
}

/// Interprets `symbols` to completion with the given config and sink.
pub fn interpret(symbols: &str, config: &TurtleConfig, sink: &mut dyn RenderSink) -> Interpretation {
    Interpreter::new(symbols, config.clone()).run(sink)
}

/// Seeded LCG for stochastic interpretation.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u64() as f64 / u64::MAX as f64) as f32
    }

    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    fn sign(&mut self) -> f32 {
        if self.next_u64() & 1 == 0 { 1.0 } else { -1.0 }
    }
}

impl std::fmt::Debug for SimpleRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleRng").finish_non_exhaustive()
    }
}
