//! Plant generation lifecycle.
//!
//! [`Plant`] ties the grammar engine, turtle interpreter, and wind
//! propagator together and enforces the resource model around them: at most
//! one growth pass is in flight at a time, growth is consumed in bounded
//! slices so a host loop stays responsive, an in-flight pass can be
//! cancelled with full teardown of partially-created geometry, and
//! regeneration destroys the previous tree before building the next one.
//!
//! Everything takes exclusive references, so wind ticks, pruning, and growth
//! slices are serialized by construction and can never interleave over the
//! shared tree.
//!
//! # Example
//!
//! ```
//! use verdant_lsystem::presets;
//! use verdant_plant::{Plant, PlantConfig};
//! use verdant_turtle::NullSink;
//!
//! let config = PlantConfig::from_system(&presets::simple_tree(), 3);
//!
//! let mut plant = Plant::new();
//! plant.grow(&config, &mut NullSink).unwrap();
//! assert!(!plant.tree().is_empty());
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use verdant_lsystem::{CapacityError, LSystem, Prune, Rule};
use verdant_turtle::{
    BranchId, BranchTree, Decoration, Interpreter, RenderSink, StepStatus, TurtleConfig, Warning,
};
use verdant_wind::Wind;

/// Everything one generation pass needs: the grammar and the turtle
/// parameters.
///
/// Read-only to the core while a pass runs; the caller may freely mutate it
/// between passes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlantConfig {
    /// The starting string.
    pub axiom: String,
    /// Production rules, in match-priority order.
    pub rules: Vec<Rule>,
    /// Number of rewrite passes.
    pub iterations: usize,
    /// Optional one-shot symbol removal during expansion.
    pub prune: Option<Prune>,
    /// Hard cap on expanded string length; `None` leaves growth unbounded.
    pub max_symbols: Option<usize>,
    /// Turtle interpretation parameters.
    pub turtle: TurtleConfig,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self::from_system(&verdant_lsystem::presets::simple_tree(), 4)
    }
}

impl PlantConfig {
    /// Builds a config from an existing [`LSystem`] definition.
    pub fn from_system(system: &LSystem, iterations: usize) -> Self {
        Self {
            axiom: system.axiom.clone(),
            rules: system.rules().to_vec(),
            iterations,
            prune: system.prune(),
            max_symbols: None,
            turtle: TurtleConfig::default(),
        }
    }

    /// Sets the turtle parameters.
    pub fn with_turtle(mut self, turtle: TurtleConfig) -> Self {
        self.turtle = turtle;
        self
    }

    /// Sets the expansion cap.
    pub fn with_max_symbols(mut self, max_symbols: usize) -> Self {
        self.max_symbols = Some(max_symbols);
        self
    }

    /// Returns the grammar part of this config as an [`LSystem`].
    pub fn system(&self) -> LSystem {
        let mut system = LSystem::new(&self.axiom);
        for rule in &self.rules {
            system = system.with_rule(rule.clone());
        }
        if let Some(prune) = self.prune {
            system = system.with_prune(prune);
        }
        system
    }
}

/// Error starting a growth pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrowthError {
    /// A growth pass is already in flight; it is left undisturbed.
    #[error("a growth pass is already in progress")]
    Busy,

    /// Expansion overflowed the configured symbol cap.
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

/// Outcome of one growth slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStatus {
    /// No growth pass is in flight.
    Idle,
    /// Symbols remain; call [`Plant::step_growth`] again.
    InProgress {
        /// Symbols consumed so far.
        consumed: usize,
        /// Total symbols in the pass.
        total: usize,
    },
    /// The pass completed and the new tree is installed.
    Finished,
}

/// A generated plant: the current branch tree plus at most one in-flight
/// growth pass.
#[derive(Debug, Default)]
pub struct Plant {
    tree: BranchTree,
    decorations: Vec<Decoration>,
    warnings: Vec<Warning>,
    growth: Option<Interpreter>,
}

impl Plant {
    /// Creates an empty plant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current branch tree.
    pub fn tree(&self) -> &BranchTree {
        &self.tree
    }

    /// Returns the current branch tree mutably, for collaborators that
    /// mirror positions into their own scene.
    pub fn tree_mut(&mut self) -> &mut BranchTree {
        &mut self.tree
    }

    /// Returns the decorations from the last completed pass.
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Returns the warnings from the last completed pass.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Returns true while a growth pass is in flight.
    pub fn is_growing(&self) -> bool {
        self.growth.is_some()
    }

    /// Starts a growth pass: expands the grammar, destroys the previous
    /// tree, and arms the interpreter.
    ///
    /// Returns [`GrowthError::Busy`] if a pass is already in flight; the
    /// in-flight pass and the current tree are left untouched in that case.
    pub fn begin_growth(
        &mut self,
        config: &PlantConfig,
        sink: &mut dyn RenderSink,
    ) -> Result<(), GrowthError> {
        if self.growth.is_some() {
            return Err(GrowthError::Busy);
        }

        let system = config.system();
        let symbols = match config.max_symbols {
            Some(max) => system.generate_bounded(config.iterations, max)?,
            None => system.generate(config.iterations),
        };

        self.clear(sink);
        self.growth = Some(Interpreter::new(&symbols, config.turtle.clone()));
        Ok(())
    }

    /// Consumes up to `budget` symbols of the in-flight pass. On the final
    /// slice the finished tree is installed and [`GrowthStatus::Finished`]
    /// is returned.
    pub fn step_growth(&mut self, sink: &mut dyn RenderSink, budget: usize) -> GrowthStatus {
        let Some(interpreter) = self.growth.as_mut() else {
            return GrowthStatus::Idle;
        };

        match interpreter.step(sink, budget) {
            StepStatus::InProgress => {
                let (consumed, total) = interpreter.progress();
                GrowthStatus::InProgress { consumed, total }
            }
            StepStatus::Finished | StepStatus::Cancelled => {
                if let Some(finished) = self.growth.take() {
                    let result = finished.finish();
                    self.tree = result.tree;
                    self.decorations = result.decorations;
                    self.warnings = result.warnings;
                }
                GrowthStatus::Finished
            }
        }
    }

    /// Abandons the in-flight pass, destroying every partially-created
    /// branch through the sink. No-op when nothing is growing.
    pub fn cancel_growth(&mut self, sink: &mut dyn RenderSink) {
        if let Some(mut interpreter) = self.growth.take() {
            interpreter.cancel();
            let mut partial = interpreter.finish();
            for removed in partial.tree.drain() {
                sink.branch_removed(removed.id, removed.render);
            }
        }
    }

    /// Runs a whole growth pass to completion.
    pub fn grow(
        &mut self,
        config: &PlantConfig,
        sink: &mut dyn RenderSink,
    ) -> Result<(), GrowthError> {
        self.begin_growth(config, sink)?;
        while matches!(
            self.step_growth(sink, usize::MAX),
            GrowthStatus::InProgress { .. }
        ) {}
        Ok(())
    }

    /// Removes a branch and its subtree, releasing render handles through
    /// the sink. Idempotent: pruning an already-removed branch is a no-op.
    pub fn prune(&mut self, id: BranchId, sink: &mut dyn RenderSink) -> Vec<BranchId> {
        let removed = self.tree.prune(id);
        for r in &removed {
            sink.branch_removed(r.id, r.render);
        }
        self.decorations.retain(|d| match d.branch {
            Some(branch) => self.tree.contains(branch),
            None => true,
        });
        removed.iter().map(|r| r.id).collect()
    }

    /// Applies one wind tick to the current tree.
    pub fn apply_wind(&mut self, wind: &Wind, time: f32) {
        wind.propagate(&mut self.tree, time);
    }

    fn clear(&mut self, sink: &mut dyn RenderSink) {
        for removed in self.tree.drain() {
            sink.branch_removed(removed.id, removed.render);
        }
        self.decorations.clear();
        self.warnings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use verdant_lsystem::presets;
    use verdant_turtle::{NullSink, RenderHandle, interpret};
    use verdant_wind::WindParams;

    /// Counts create/remove pairs and hands out sequential handles.
    #[derive(Debug, Default)]
    struct RecordingSink {
        created: Vec<BranchId>,
        removed: Vec<BranchId>,
        decorations: usize,
        next_handle: u64,
    }

    impl RenderSink for RecordingSink {
        fn branch_created(
            &mut self,
            id: BranchId,
            _start: Vec3,
            _end: Vec3,
            _thickness: f32,
            _parent: Option<BranchId>,
        ) -> Option<RenderHandle> {
            self.created.push(id);
            self.next_handle += 1;
            Some(RenderHandle(self.next_handle))
        }

        fn branch_removed(&mut self, id: BranchId, render: Option<RenderHandle>) {
            assert!(render.is_some(), "removed branch lost its handle");
            self.removed.push(id);
        }

        fn decoration_placed(&mut self, _decoration: &Decoration) {
            self.decorations += 1;
        }
    }

    fn tree_config() -> PlantConfig {
        PlantConfig::from_system(&presets::simple_tree(), 3)
    }

    #[test]
    fn test_grow_matches_direct_interpretation() {
        let config = tree_config();
        let mut plant = Plant::new();
        plant.grow(&config, &mut NullSink).unwrap();

        let symbols = config.system().generate(config.iterations);
        let direct = interpret(&symbols, &config.turtle, &mut NullSink);

        assert_eq!(plant.tree().len(), direct.tree.len());
        assert!(!plant.tree().is_empty());
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let config = tree_config();
        let mut plant = Plant::new();
        plant.begin_growth(&config, &mut NullSink).unwrap();
        let before = plant.is_growing();

        assert_eq!(
            plant.begin_growth(&config, &mut NullSink),
            Err(GrowthError::Busy)
        );
        assert_eq!(plant.is_growing(), before);

        // The original pass still runs to completion.
        while plant.step_growth(&mut NullSink, 64) != GrowthStatus::Finished {}
        assert!(!plant.tree().is_empty());
    }

    #[test]
    fn test_sliced_growth_installs_tree_at_finish() {
        let config = tree_config();
        let mut plant = Plant::new();
        plant.begin_growth(&config, &mut NullSink).unwrap();

        let mut saw_in_progress = false;
        loop {
            match plant.step_growth(&mut NullSink, 16) {
                GrowthStatus::InProgress { consumed, total } => {
                    saw_in_progress = true;
                    assert!(consumed <= total);
                    // The previous (empty) tree stays current mid-pass.
                    assert!(plant.tree().is_empty());
                }
                GrowthStatus::Finished => break,
                GrowthStatus::Idle => panic!("growth vanished"),
            }
        }

        assert!(saw_in_progress);
        assert!(!plant.tree().is_empty());
        assert_eq!(plant.step_growth(&mut NullSink, 16), GrowthStatus::Idle);
    }

    #[test]
    fn test_cancel_tears_down_partial_geometry() {
        let config = tree_config();
        let mut sink = RecordingSink::default();
        let mut plant = Plant::new();

        plant.begin_growth(&config, &mut sink).unwrap();
        plant.step_growth(&mut sink, 50);
        assert!(!sink.created.is_empty());

        plant.cancel_growth(&mut sink);

        assert!(!plant.is_growing());
        assert!(plant.tree().is_empty());
        assert_eq!(sink.created.len(), sink.removed.len());
    }

    #[test]
    fn test_regeneration_destroys_previous_tree() {
        let config = tree_config();
        let mut sink = RecordingSink::default();
        let mut plant = Plant::new();

        plant.grow(&config, &mut sink).unwrap();
        let first_pass = sink.created.len();
        assert!(sink.removed.is_empty());

        plant.grow(&config, &mut sink).unwrap();
        assert_eq!(sink.removed.len(), first_pass);
        assert_eq!(plant.tree().len(), first_pass);
    }

    #[test]
    fn test_capacity_overflow_surfaces() {
        let config = tree_config().with_max_symbols(10);
        let mut plant = Plant::new();

        let err = plant.grow(&config, &mut NullSink).unwrap_err();
        assert!(matches!(err, GrowthError::Capacity(_)));
        assert!(plant.tree().is_empty());
        assert!(!plant.is_growing());
    }

    #[test]
    fn test_prune_releases_handles() {
        let config = tree_config();
        let mut sink = RecordingSink::default();
        let mut plant = Plant::new();
        plant.grow(&config, &mut sink).unwrap();

        let roots = plant.tree().roots();
        let victim = plant.tree().get(roots[0]).unwrap().children()[0];
        sink.removed.clear();

        let removed = plant.prune(victim, &mut sink);

        assert!(!removed.is_empty());
        assert_eq!(removed.len(), sink.removed.len());
        assert!(!plant.tree().contains(victim));

        // Repeated clicks on the same branch are harmless.
        assert!(plant.prune(victim, &mut sink).is_empty());
    }

    #[test]
    fn test_prune_drops_attached_decorations() {
        let system = presets::flowering_shrub();
        let mut config = PlantConfig::from_system(&system, 3);
        config.turtle.leaf.probability = 1.0;
        config.turtle.flower.probability = 1.0;

        let mut plant = Plant::new();
        plant.grow(&config, &mut NullSink).unwrap();
        assert!(!plant.decorations().is_empty());

        for root in plant.tree().roots() {
            plant.prune(root, &mut NullSink);
        }

        assert!(plant.tree().is_empty());
        assert!(plant.decorations().is_empty());
    }

    #[test]
    fn test_wind_tick_moves_orientations() {
        let config = tree_config();
        let mut plant = Plant::new();
        plant.grow(&config, &mut NullSink).unwrap();

        let wind = Wind::new(WindParams::storm());
        plant.apply_wind(&wind, 0.8);

        let sway = wind.sway(0.8);
        for root in plant.tree().roots() {
            let orientation = plant.tree().get(root).unwrap().orientation;
            assert!(orientation.angle_between(sway) < 1e-5);
        }
    }
}
