//! Branch segments and the arena-backed branch tree.

use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a branch in a [`BranchTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BranchId(pub u32);

impl BranchId {
    /// Creates a new branch ID.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle to a branch's externally-owned visual representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderHandle(pub u64);

/// A branch removed by [`BranchTree::prune`], with the render handle it
/// held so the caller can release the associated visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedBranch {
    /// The removed branch's ID.
    pub id: BranchId,
    /// The render handle the branch held, if any.
    pub render: Option<RenderHandle>,
}

/// One rendered branch segment.
#[derive(Debug, Clone)]
pub struct Branch {
    /// Start position in tree-local space.
    pub start: Vec3,
    /// End position in tree-local space.
    pub end: Vec3,
    /// Current orientation. Rewritten each tick by wind propagation.
    pub orientation: Quat,
    /// Segment thickness.
    pub thickness: f32,
    /// Parent branch (None for roots).
    pub parent: Option<BranchId>,
    /// Children in creation order.
    children: Vec<BranchId>,
    /// Handle to the collaborator-owned visual, if one was bound.
    render: Option<RenderHandle>,
}

impl Branch {
    /// Creates an unattached branch segment.
    pub fn new(start: Vec3, end: Vec3, orientation: Quat, thickness: f32) -> Self {
        Self {
            start,
            end,
            orientation,
            thickness,
            parent: None,
            children: Vec::new(),
            render: None,
        }
    }

    /// Returns the segment length.
    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Returns the children in creation order.
    pub fn children(&self) -> &[BranchId] {
        &self.children
    }

    /// Returns the bound render handle, if any.
    pub fn render(&self) -> Option<RenderHandle> {
        self.render
    }

    /// Binds or releases the render handle.
    pub fn set_render(&mut self, render: Option<RenderHandle>) {
        self.render = render;
    }
}

/// Arena of branch segments with parent/child links.
///
/// Removal tombstones the slot, so IDs stay stable for the lifetime of the
/// tree and lookups for removed branches return `None`. Every traversal goes
/// through [`get`](Self::get) and skips missing nodes instead of failing.
#[derive(Debug, Clone, Default)]
pub struct BranchTree {
    slots: Vec<Option<Branch>>,
}

impl BranchTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a branch, wiring it under `parent` when given, and returns its
    /// ID. A missing parent leaves the branch as a root.
    pub fn add(&mut self, mut branch: Branch, parent: Option<BranchId>) -> BranchId {
        let id = BranchId(self.slots.len() as u32);
        branch.parent = parent.filter(|p| self.get(*p).is_some());
        branch.children.clear();

        if let Some(parent_id) = branch.parent
            && let Some(parent) = self.get_mut(parent_id)
        {
            parent.children.push(id);
        }

        self.slots.push(Some(branch));
        id
    }

    /// Returns a branch by ID, or `None` if it was removed or never existed.
    pub fn get(&self, id: BranchId) -> Option<&Branch> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    /// Returns a mutable branch by ID.
    pub fn get_mut(&mut self, id: BranchId) -> Option<&mut Branch> {
        self.slots.get_mut(id.index()).and_then(|s| s.as_mut())
    }

    /// Returns true if the branch is still present.
    pub fn contains(&self, id: BranchId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of live branches.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns true if the tree has no live branches.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Returns the IDs of all root branches.
    pub fn roots(&self) -> Vec<BranchId> {
        self.iter()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Iterates over all live branches with their IDs.
    pub fn iter(&self) -> impl Iterator<Item = (BranchId, &Branch)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|b| (BranchId(i as u32), b)))
    }

    /// Removes `id` and its entire subtree, returning the removed branches
    /// (with their render handles) in depth-first order, `id` first.
    ///
    /// Only `id` itself is unregistered from its parent; descendants are
    /// removed as a unit. Pruning an already-removed or unknown ID is a
    /// no-op returning an empty set.
    pub fn prune(&mut self, id: BranchId) -> Vec<RemovedBranch> {
        if !self.contains(id) {
            return Vec::new();
        }

        if let Some(parent_id) = self.get(id).and_then(|b| b.parent)
            && let Some(parent) = self.get_mut(parent_id)
        {
            parent.children.retain(|c| *c != id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(branch) = self.slots.get_mut(current.index()).and_then(|s| s.take()) {
                stack.extend(branch.children.iter().rev().copied());
                removed.push(RemovedBranch {
                    id: current,
                    render: branch.render,
                });
            }
        }

        removed
    }

    /// Removes every branch, returning them like [`prune`](Self::prune) so
    /// the caller can release render handles.
    pub fn drain(&mut self) -> Vec<RemovedBranch> {
        let removed = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.as_ref().map(|b| RemovedBranch {
                    id: BranchId(i as u32),
                    render: b.render,
                })
            })
            .collect();
        self.slots.clear();
        removed
    }

    /// Removes every branch.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(y: f32) -> Branch {
        Branch::new(
            Vec3::new(0.0, y, 0.0),
            Vec3::new(0.0, y + 1.0, 0.0),
            Quat::IDENTITY,
            0.1,
        )
    }

    #[test]
    fn test_add_wires_parent_and_children() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        let a = tree.add(segment(1.0), Some(root));
        let b = tree.add(segment(1.0), Some(root));

        assert_eq!(tree.get(root).unwrap().children(), &[a, b]);
        assert_eq!(tree.get(a).unwrap().parent, Some(root));
        assert_eq!(tree.get(b).unwrap().parent, Some(root));
        assert_eq!(tree.roots(), vec![root]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_add_with_missing_parent_becomes_root() {
        let mut tree = BranchTree::new();
        let id = tree.add(segment(0.0), Some(BranchId::new(42)));

        assert_eq!(tree.get(id).unwrap().parent, None);
        assert_eq!(tree.roots(), vec![id]);
    }

    #[test]
    fn test_prune_removes_subtree() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        let mid = tree.add(segment(1.0), Some(root));
        let leaf_a = tree.add(segment(2.0), Some(mid));
        let leaf_b = tree.add(segment(2.0), Some(mid));
        let sibling = tree.add(segment(1.0), Some(root));

        let removed: Vec<BranchId> = tree.prune(mid).iter().map(|r| r.id).collect();

        assert_eq!(removed, vec![mid, leaf_a, leaf_b]);
        assert!(!tree.contains(mid));
        assert!(!tree.contains(leaf_a));
        assert!(!tree.contains(leaf_b));
        assert!(tree.contains(sibling));
        assert_eq!(tree.get(root).unwrap().children(), &[sibling]);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        let child = tree.add(segment(1.0), Some(root));

        assert_eq!(tree.prune(child).len(), 1);
        assert!(tree.prune(child).is_empty());
        assert!(tree.prune(BranchId::new(99)).is_empty());
    }

    #[test]
    fn test_prune_root() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        let child = tree.add(segment(1.0), Some(root));
        let other = tree.add(segment(0.0), None);

        let removed: Vec<BranchId> = tree.prune(root).iter().map(|r| r.id).collect();

        assert_eq!(removed, vec![root, child]);
        assert_eq!(tree.roots(), vec![other]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remaining_tree_stays_connected_after_prune() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        let a = tree.add(segment(1.0), Some(root));
        let b = tree.add(segment(2.0), Some(a));
        tree.add(segment(3.0), Some(b));
        tree.prune(b);

        for (id, branch) in tree.iter() {
            if let Some(parent) = branch.parent {
                assert!(tree.contains(parent));
            }
            for child in branch.children() {
                assert_eq!(tree.get(*child).unwrap().parent, Some(id));
            }
        }
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        tree.add(segment(1.0), Some(root));
        tree.clear();

        assert!(tree.is_empty());
        assert!(!tree.contains(root));
    }

    #[test]
    fn test_render_handle_binding() {
        let mut tree = BranchTree::new();
        let id = tree.add(segment(0.0), None);

        assert_eq!(tree.get(id).unwrap().render(), None);
        tree.get_mut(id).unwrap().set_render(Some(RenderHandle(7)));
        assert_eq!(tree.get(id).unwrap().render(), Some(RenderHandle(7)));
    }

    #[test]
    fn test_prune_returns_render_handles() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        let child = tree.add(segment(1.0), Some(root));
        tree.get_mut(child).unwrap().set_render(Some(RenderHandle(3)));

        let removed = tree.prune(child);
        assert_eq!(
            removed,
            vec![RemovedBranch {
                id: child,
                render: Some(RenderHandle(3)),
            }]
        );
    }

    #[test]
    fn test_drain_returns_everything() {
        let mut tree = BranchTree::new();
        let root = tree.add(segment(0.0), None);
        let child = tree.add(segment(1.0), Some(root));
        tree.get_mut(root).unwrap().set_render(Some(RenderHandle(1)));

        let removed = tree.drain();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].id, root);
        assert_eq!(removed[0].render, Some(RenderHandle(1)));
        assert_eq!(removed[1].id, child);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_length() {
        let branch = Branch::new(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY, 0.1);
        assert!((branch.length() - 2.0).abs() < 1e-6);
    }
}
