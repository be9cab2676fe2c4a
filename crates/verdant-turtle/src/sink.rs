//! Observer interface for the render/scene collaborator.

use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::tree::{BranchId, RenderHandle};

/// Kind of decoration attached to a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecorationKind {
    /// A leaf placement.
    Leaf,
    /// A flower placement.
    Flower,
}

/// A leaf or flower placement emitted during interpretation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Decoration {
    /// What was placed.
    pub kind: DecorationKind,
    /// Placement position in tree-local space.
    pub position: Vec3,
    /// Placement rotation.
    pub rotation: Quat,
    /// Sampled uniform scale.
    pub scale: f32,
    /// Visual variant index.
    pub variant: u32,
    /// The branch the decoration is attached to, if any.
    pub branch: Option<BranchId>,
}

/// Events reported to the render/scene collaborator.
///
/// The core owns the structural tree; the collaborator owns the visuals and
/// mirrors these events into its own scene representation, handing opaque
/// handles back. Every method defaults to a no-op so implementors override
/// only what they need.
pub trait RenderSink {
    /// A branch segment was created. Returning a handle associates the
    /// branch with its visual representation.
    fn branch_created(
        &mut self,
        id: BranchId,
        start: Vec3,
        end: Vec3,
        thickness: f32,
        parent: Option<BranchId>,
    ) -> Option<RenderHandle> {
        let _ = (id, start, end, thickness, parent);
        None
    }

    /// A branch was removed; any bound visual should be released.
    fn branch_removed(&mut self, id: BranchId, render: Option<RenderHandle>) {
        let _ = (id, render);
    }

    /// A leaf or flower was placed.
    fn decoration_placed(&mut self, decoration: &Decoration) {
        let _ = decoration;
    }
}

/// A sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_returns_no_handle() {
        let mut sink = NullSink;
        let handle = sink.branch_created(
            BranchId::new(0),
            Vec3::ZERO,
            Vec3::Y,
            0.1,
            None,
        );
        assert_eq!(handle, None);
    }
}
