//! Turtle-graphics interpretation of L-system strings into branch trees.
//!
//! The interpreter walks a symbol string left to right, maintaining a cursor
//! (position, orientation, length/thickness multipliers) and an explicit
//! save/restore stack for bracketed sub-branches. Drawing symbols materialize
//! [`Branch`] segments into an arena-backed [`BranchTree`] with parent/child
//! links; leaf and flower symbols emit [`Decoration`] placements. Structural
//! anomalies (unmatched `]`, unknown symbols) are collected as [`Warning`]s
//! rather than aborting.
//!
//! Interpretation is resumable: [`Interpreter::step`] consumes a bounded
//! number of symbols per call so a host loop can interleave slices with
//! rendering, and an in-flight pass can be cancelled.
//!
//! # Example
//!
//! ```
//! use verdant_turtle::{interpret, NullSink, TurtleConfig};
//!
//! let config = TurtleConfig::default().with_angle(25.0);
//! let result = interpret("F[+F][-F]F", &config, &mut NullSink);
//!
//! assert_eq!(result.tree.len(), 4);
//! assert!(result.warnings.is_empty());
//! ```

mod config;
mod interpreter;
mod sink;
mod tree;

pub use config::{DecorationParams, TurtleConfig};
pub use interpreter::{Interpretation, Interpreter, StepStatus, Warning, interpret};
pub use sink::{Decoration, DecorationKind, NullSink, RenderSink};
pub use tree::{Branch, BranchId, BranchTree, RemovedBranch, RenderHandle};
