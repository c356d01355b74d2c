// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child lists: ordered insertion, removal, reordering, and index bookkeeping.
//!
//! A container keeps its children in paint order. In [`IndexMode::Dense`]
//! every child caches its own position, so [`DisplayTree::get_child_index`] is
//! O(1); in [`IndexMode::Sparse`] the cache is not maintained and lookups
//! search the list. [`DisplayTree::position_in`] is the only place that
//! chooses between the two.
//!
//! Mutating operations validate every argument before touching the tree. The
//! [`Host`] hooks they fire may mutate the tree again, so positions are
//! re-resolved after each hook.

use smallvec::SmallVec;

use crate::error::DisplayError;
use crate::host::Host;
use crate::tree::{DisplayTree, Node};
use crate::types::{IndexMode, NodeFlags, NodeId, NodeKind};

impl DisplayTree {
    /// Returns the number of children of a container.
    pub fn num_children(&self, container: NodeId) -> Result<usize, DisplayError> {
        Ok(self.container(container)?.children.len())
    }

    /// Returns true if `child` is a direct child of `container`.
    pub fn contains(&self, container: NodeId, child: NodeId) -> bool {
        self.is_alive(container) && self.parent_of(child) == Some(container)
    }

    /// Returns the child at `index`.
    pub fn get_child_at(&self, container: NodeId, index: usize) -> Result<NodeId, DisplayError> {
        let c = self.container(container)?;
        c.children
            .get(index)
            .copied()
            .ok_or(DisplayError::IndexOutOfRange {
                index,
                len: c.children.len(),
            })
    }

    /// Returns the first child, in paint order, whose name is `name`.
    pub fn get_child_by_name(
        &self,
        container: NodeId,
        name: &str,
    ) -> Result<Option<NodeId>, DisplayError> {
        let c = self.container(container)?;
        Ok(c.children
            .iter()
            .copied()
            .find(|&id| self.name(id) == Some(name)))
    }

    /// Returns the position of `child` in `container`.
    ///
    /// O(1) in [`IndexMode::Dense`], a linear search in [`IndexMode::Sparse`].
    pub fn get_child_index(&self, container: NodeId, child: NodeId) -> Result<usize, DisplayError> {
        self.container(container)?;
        self.owned_child(container, child)
    }

    /// Switch how a container maintains cached child indices.
    ///
    /// Switching to [`IndexMode::Dense`] rebuilds every cached index.
    pub fn set_index_mode(
        &mut self,
        container: NodeId,
        mode: IndexMode,
    ) -> Result<(), DisplayError> {
        self.container(container)?;
        let n = self.node_mut(container);
        n.flags.set(NodeFlags::SPARSE, mode == IndexMode::Sparse);
        if mode == IndexMode::Dense {
            let len = n.children.len();
            self.reindex(container, 0, len);
        }
        Ok(())
    }

    /// Append `child` to the end of `container`.
    ///
    /// If `child` is already a child of `container` it is moved to the end.
    pub fn add_child<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        child: NodeId,
    ) -> Result<NodeId, DisplayError> {
        let len = self.num_children(container)?;
        self.add_child_at(host, container, child, len)
    }

    /// Insert `child` into `container` at `index`.
    ///
    /// - Adding a node to itself fails with [`DisplayError::SelfContainment`].
    ///   Indirect cycles (adding an ancestor) are not detected. The caller must
    ///   not create one: ancestor walks such as [`DisplayTree::invalidate`],
    ///   which [`DisplayTree::set_child_index`] and the swaps run, never end on
    ///   a cyclic tree.
    /// - If `child` already belongs to `container` this is
    ///   [`DisplayTree::set_child_index`] and no hooks fire.
    /// - If `child` belongs to another container it is removed from there first
    ///   (firing that removal's hooks), so the caller never observes it ownerless.
    ///
    /// After the insertion, [`Host::on_added`] fires on `child`, followed by the
    /// stage-attach cascade when `container` is on stage.
    pub fn add_child_at<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<NodeId, DisplayError> {
        if child == container {
            return Err(DisplayError::SelfContainment);
        }
        if self.stage() == Some(child) {
            return Err(DisplayError::IllegalOperation("the stage cannot be a child"));
        }
        let len = self.list_container(container)?.children.len();
        let owner = self.live(child)?.parent;
        if owner == Some(container) {
            self.set_child_index(container, child, index)?;
            return Ok(child);
        }
        if index > len {
            return Err(DisplayError::IndexOutOfRange { index, len });
        }

        self.detach_from_owner(host, child);
        if !self.is_alive(container) || !self.is_alive(child) {
            log::debug!("add_child_at: {container:?} or {child:?} released by a removal hook");
            return Ok(child);
        }

        // Removal hooks may have shrunk this container.
        let len = self.node(container).children.len();
        if index > len {
            log::debug!("add_child_at: clamping index {index} to {len} after removal hooks");
        }
        self.splice_in(container, child, index.min(len));
        self.announce_added(host, container, child);
        Ok(child)
    }

    /// Remove `child` from `container`.
    pub fn remove_child<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        child: NodeId,
    ) -> Result<NodeId, DisplayError> {
        self.list_container(container)?;
        self.owned_child(container, child)?;
        Ok(self.detach_child(host, container, child))
    }

    /// Remove and return the child at `index`.
    ///
    /// [`Host::on_removed`] fires on the child before it is detached, followed
    /// by the stage-detach cascade when `container` is on stage. The child's
    /// parent, index, and stage are cleared afterwards.
    pub fn remove_child_at<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        index: usize,
    ) -> Result<NodeId, DisplayError> {
        let c = self.list_container(container)?;
        let Some(&child) = c.children.get(index) else {
            return Err(DisplayError::IndexOutOfRange {
                index,
                len: c.children.len(),
            });
        };
        Ok(self.detach_child(host, container, child))
    }

    /// Remove `end - begin` children starting at `begin`.
    ///
    /// The whole range is validated first (`begin <= end <= len`). The child
    /// currently at `begin` is then removed repeatedly, so the children that
    /// originally occupied `begin..end` go in left-to-right order. If hooks
    /// shrink the list below `begin`, removal stops early.
    pub fn remove_children<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        begin: usize,
        end: usize,
    ) -> Result<(), DisplayError> {
        let len = self.list_container(container)?.children.len();
        if begin > len || begin > end {
            return Err(DisplayError::IndexOutOfRange { index: begin, len });
        }
        if end > len {
            return Err(DisplayError::IndexOutOfRange { index: end, len });
        }
        for _ in begin..end {
            let Some(&child) = self.children_of(container).get(begin) else {
                log::debug!("remove_children: {container:?} shrank below {begin} during hooks");
                break;
            };
            self.detach_child(host, container, child);
        }
        Ok(())
    }

    /// Move `child` to `index` within `container`.
    ///
    /// `index` may equal the number of children, which moves the child to the
    /// end. Does nothing if the child is already at `index`. No hooks fire;
    /// only cached geometry is invalidated.
    pub fn set_child_index(
        &mut self,
        container: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), DisplayError> {
        let len = self.list_container(container)?.children.len();
        let current = self.owned_child(container, child)?;
        if current == index {
            return Ok(());
        }
        if index > len {
            return Err(DisplayError::IndexOutOfRange { index, len });
        }

        let children = &mut self.node_mut(container).children;
        children.remove(current);
        let target = index.min(children.len());
        children.insert(target, child);
        if !self.is_sparse(container) {
            self.reindex(container, current.min(target), current.max(target) + 1);
        }
        self.node_mut(child).flags.remove(NodeFlags::OWNED);
        self.invalidate(child);
        Ok(())
    }

    /// Exchange the positions of two children of `container`.
    pub fn swap_children(
        &mut self,
        container: NodeId,
        a: NodeId,
        b: NodeId,
    ) -> Result<(), DisplayError> {
        self.list_container(container)?;
        let i = self.owned_child(container, a)?;
        let j = self.owned_child(container, b)?;
        self.swap_children_at(container, i, j)
    }

    /// Exchange the children at positions `i` and `j` in O(1).
    ///
    /// Cached indices are swapped with the children. No hooks fire; both
    /// children's cached geometry is invalidated.
    pub fn swap_children_at(
        &mut self,
        container: NodeId,
        i: usize,
        j: usize,
    ) -> Result<(), DisplayError> {
        let len = self.list_container(container)?.children.len();
        for index in [i, j] {
            if index >= len {
                return Err(DisplayError::IndexOutOfRange { index, len });
            }
        }

        let children = &mut self.node_mut(container).children;
        children.swap(i, j);
        let (a, b) = (children[j], children[i]);
        for (id, index) in [(a, j), (b, i)] {
            let n = self.node_mut(id);
            n.index = Some(index);
            n.flags.remove(NodeFlags::OWNED);
        }
        self.invalidate(a);
        self.invalidate(b);
        Ok(())
    }

    // --- internals ---

    /// Position of `child` within `container`.
    ///
    /// This is the single place that honors the index mode: dense containers
    /// trust the cached index, sparse ones search.
    pub(crate) fn position_in(&self, container: NodeId, child: NodeId) -> Option<usize> {
        let c = self.node(container);
        if c.flags.contains(NodeFlags::SPARSE) {
            return c.children.iter().position(|&id| id == child);
        }
        let index = self.node(child).index;
        debug_assert!(
            index.and_then(|i| c.children.get(i)) == Some(&child),
            "dense index of {child:?} out of sync in {container:?}"
        );
        index
    }

    fn is_sparse(&self, container: NodeId) -> bool {
        self.node(container).flags.contains(NodeFlags::SPARSE)
    }

    /// Validate that `child` is live and owned by `container`; return its position.
    fn owned_child(&self, container: NodeId, child: NodeId) -> Result<usize, DisplayError> {
        if self.live(child)?.parent != Some(container) {
            return Err(DisplayError::WrongOwner);
        }
        self.position_in(container, child)
            .ok_or(DisplayError::WrongOwner)
    }

    /// Look up a container whose child list callers may mutate directly.
    ///
    /// Loaders are refused: their content goes through `load`/`unload`.
    pub(crate) fn list_container(&self, id: NodeId) -> Result<&Node, DisplayError> {
        let n = self.container(id)?;
        if n.kind == NodeKind::Loader {
            return Err(DisplayError::IllegalOperation(
                "loader content is managed with load and unload",
            ));
        }
        Ok(n)
    }

    /// Rewrite cached indices for positions `start..end`.
    fn reindex(&mut self, container: NodeId, start: usize, end: usize) {
        for pos in start..end {
            let id = self.node(container).children[pos];
            self.node_mut(id).index = Some(pos);
        }
    }

    /// Structural insertion; no hooks, no validation.
    pub(crate) fn splice_in(&mut self, container: NodeId, child: NodeId, index: usize) {
        let sparse = self.is_sparse(container);
        let stage = self.node(container).stage;
        let c = self.node_mut(container);
        c.children.insert(index, child);
        c.bounds = None;
        let len = c.children.len();
        if !sparse {
            self.reindex(container, index + 1, len);
        }

        let n = self.node_mut(child);
        n.flags.remove(NodeFlags::OWNED);
        n.parent = Some(container);
        n.index = Some(index);
        if n.stage != stage {
            self.propagate_stage(child, stage);
        }
        log::trace!("inserted {child:?} into {container:?} at {index}");
    }

    /// Structural removal of the child at `index`; no hooks, no validation.
    fn splice_out(&mut self, container: NodeId, index: usize) -> NodeId {
        let sparse = self.is_sparse(container);
        let c = self.node_mut(container);
        let child = c.children.remove(index);
        c.bounds = None;
        let len = c.children.len();
        if !sparse {
            self.reindex(container, index, len);
        }

        let n = self.node_mut(child);
        n.flags.remove(NodeFlags::OWNED);
        n.parent = None;
        n.index = None;
        if n.stage.is_some() {
            self.propagate_stage(child, None);
        }
        log::trace!("removed {child:?} from {container:?} at {index}");
        child
    }

    /// Fire the attach hooks for a freshly spliced child.
    pub(crate) fn announce_added<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        child: NodeId,
    ) {
        host.on_added(self, child);
        if self.parent_of(child) != Some(container) {
            log::debug!("{child:?} left {container:?} during on_added");
            return;
        }
        if self.stage_of(container).is_some() {
            self.add_to_stage(host, child);
        }
    }

    /// Remove an owned child, firing the removal hooks first.
    ///
    /// If a hook moves or removes the child, the removal it already went
    /// through stands and nothing more happens here.
    pub(crate) fn detach_child<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        container: NodeId,
        child: NodeId,
    ) -> NodeId {
        host.on_removed(self, child);
        if self.parent_of(child) != Some(container) {
            log::debug!("{child:?} left {container:?} during on_removed");
            return child;
        }
        if self.stage_of(container).is_some() {
            self.remove_from_stage(host, child);
            if self.parent_of(child) != Some(container) {
                log::debug!("{child:?} left {container:?} during stage detach");
                return child;
            }
        }
        match self.position_in(container, child) {
            Some(index) => {
                self.splice_out(container, index);
            }
            None => {
                log::warn!("{child:?} claims {container:?} as parent but is not listed");
                let n = self.node_mut(child);
                n.parent = None;
                n.index = None;
            }
        }
        child
    }

    /// Snapshot of a container's children, safe to iterate while mutating.
    pub(crate) fn child_snapshot(&self, id: NodeId) -> SmallVec<[NodeId; 16]> {
        self.children_of(id).iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Event, Recorder};
    use alloc::vec;
    use alloc::vec::Vec;
    use kurbo::Rect;

    /// Container with `n` leaf children added in order.
    fn container_with(tree: &mut DisplayTree, n: usize) -> (NodeId, Vec<NodeId>) {
        let c = tree.create_container();
        let kids: Vec<NodeId> = (0..n).map(|_| tree.create_leaf()).collect();
        for &k in &kids {
            tree.add_child(&mut (), c, k).unwrap();
        }
        (c, kids)
    }

    /// Every child's cached index matches its position.
    fn assert_dense(tree: &DisplayTree, c: NodeId) {
        for (i, &k) in tree.children_of(c).iter().enumerate() {
            assert_eq!(tree.cached_index(k), Some(i), "cached index of child {i}");
            assert_eq!(tree.get_child_index(c, k), Ok(i));
            assert_eq!(tree.parent_of(k), Some(c));
        }
    }

    #[test]
    fn add_child_at_shifts_indices() {
        let mut tree = DisplayTree::new();
        let (c, kids) = container_with(&mut tree, 2);
        let (a, cc) = (kids[0], kids[1]);
        let d = tree.create_leaf();

        assert_eq!(tree.add_child_at(&mut (), c, d, 0), Ok(d));
        assert_eq!(tree.children_of(c), &[d, a, cc]);
        assert_eq!(tree.get_child_index(c, d), Ok(0));
        assert_eq!(tree.get_child_index(c, a), Ok(1));
        assert_eq!(tree.get_child_index(c, cc), Ok(2));
        assert_dense(&tree, c);
    }

    #[test]
    fn add_child_at_every_position() {
        for i in 0..=3 {
            let mut tree = DisplayTree::new();
            let (c, _) = container_with(&mut tree, 3);
            let x = tree.create_leaf();
            tree.add_child_at(&mut (), c, x, i).unwrap();
            assert_eq!(tree.get_child_index(c, x), Ok(i));
            assert_eq!(tree.get_child_at(c, i), Ok(x));
            assert_dense(&tree, c);
        }
    }

    #[test]
    fn add_then_remove_restores_count() {
        let mut tree = DisplayTree::new();
        let (c, _) = container_with(&mut tree, 2);
        let x = tree.create_leaf();
        tree.add_child(&mut (), c, x).unwrap();
        assert_eq!(tree.num_children(c), Ok(3));
        assert_eq!(tree.remove_child(&mut (), c, x), Ok(x));
        assert_eq!(tree.num_children(c), Ok(2));
        assert_eq!(tree.parent_of(x), None);
        assert_eq!(tree.cached_index(x), None);
        assert!(!tree.contains(c, x));
    }

    #[test]
    fn remove_child_at_middle() {
        let mut tree = DisplayTree::new();
        let (c, kids) = container_with(&mut tree, 3);
        let (a, b, cc) = (kids[0], kids[1], kids[2]);

        assert_eq!(tree.remove_child_at(&mut (), c, 1), Ok(b));
        assert_eq!(tree.children_of(c), &[a, cc]);
        assert_eq!(tree.cached_index(a), Some(0));
        assert_eq!(tree.cached_index(cc), Some(1));
        assert_eq!(tree.parent_of(b), None);
    }

    #[test]
    fn self_containment_is_rejected() {
        let mut tree = DisplayTree::new();
        let (c, kids) = container_with(&mut tree, 1);
        assert_eq!(
            tree.add_child(&mut (), c, c),
            Err(DisplayError::SelfContainment)
        );
        assert_eq!(tree.children_of(c), kids.as_slice());
        assert_eq!(tree.parent_of(c), None);
    }

    #[test]
    fn out_of_range_leaves_tree_untouched() {
        let mut tree = DisplayTree::new();
        let (c, kids) = container_with(&mut tree, 2);
        let x = tree.create_leaf();

        assert_eq!(
            tree.get_child_at(c, 2),
            Err(DisplayError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            tree.remove_child_at(&mut (), c, 5),
            Err(DisplayError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(
            tree.add_child_at(&mut (), c, x, 3),
            Err(DisplayError::IndexOutOfRange { index: 3, len: 2 })
        );
        assert_eq!(
            tree.swap_children_at(c, 0, 2),
            Err(DisplayError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            tree.set_child_index(c, kids[0], 3),
            Err(DisplayError::IndexOutOfRange { index: 3, len: 2 })
        );
        assert_eq!(tree.children_of(c), kids.as_slice());
        assert_eq!(tree.parent_of(x), None);
        assert_dense(&tree, c);
    }

    #[test]
    fn failed_add_does_not_detach_from_previous_owner() {
        let mut tree = DisplayTree::new();
        let (a, kids) = container_with(&mut tree, 1);
        let (b, _) = container_with(&mut tree, 1);
        assert!(tree.add_child_at(&mut (), b, kids[0], 9).is_err());
        assert_eq!(tree.parent_of(kids[0]), Some(a));
    }

    #[test]
    fn wrong_owner() {
        let mut tree = DisplayTree::new();
        let (a, kids) = container_with(&mut tree, 2);
        let (b, others) = container_with(&mut tree, 1);
        let loose = tree.create_leaf();

        assert_eq!(tree.get_child_index(b, kids[0]), Err(DisplayError::WrongOwner));
        assert_eq!(
            tree.remove_child(&mut (), b, kids[0]),
            Err(DisplayError::WrongOwner)
        );
        assert_eq!(
            tree.set_child_index(b, loose, 0),
            Err(DisplayError::WrongOwner)
        );
        assert_eq!(
            tree.swap_children(a, kids[0], others[0]),
            Err(DisplayError::WrongOwner)
        );
        assert_eq!(tree.children_of(a), kids.as_slice());
    }

    #[test]
    fn stage_cannot_be_a_child() {
        let mut tree = DisplayTree::new();
        let stage = tree.create_stage();
        let c = tree.create_container();
        assert!(matches!(
            tree.add_child(&mut (), c, stage),
            Err(DisplayError::IllegalOperation(_))
        ));
        assert_eq!(tree.stage_of(stage), Some(stage));
    }

    #[test]
    fn leaves_cannot_own_children() {
        let mut tree = DisplayTree::new();
        let leaf = tree.create_leaf();
        let x = tree.create_leaf();
        assert_eq!(
            tree.add_child(&mut (), leaf, x),
            Err(DisplayError::NotAContainer(leaf))
        );
        assert_eq!(tree.num_children(leaf), Err(DisplayError::NotAContainer(leaf)));
    }

    #[test]
    fn reparent_between_containers() {
        let mut tree = DisplayTree::new();
        let (a, kids) = container_with(&mut tree, 3);
        let (b, _) = container_with(&mut tree, 1);
        let mut rec = Recorder::default();

        let moved = kids[1];
        tree.add_child(&mut rec, b, moved).unwrap();
        assert_eq!(tree.num_children(a), Ok(2));
        assert_eq!(tree.num_children(b), Ok(2));
        assert_eq!(tree.parent_of(moved), Some(b));
        assert_eq!(tree.get_child_index(b, moved), Ok(1));
        assert_dense(&tree, a);
        assert_dense(&tree, b);
        assert_eq!(rec.take(), vec![Event::Removed(moved), Event::Added(moved)]);
    }

    #[test]
    fn re_adding_to_same_container_moves_without_hooks() {
        let mut tree = DisplayTree::new();
        let (c, kids) = container_with(&mut tree, 3);
        let mut rec = Recorder::default();

        tree.add_child(&mut rec, c, kids[0]).unwrap();
        assert_eq!(tree.children_of(c), &[kids[1], kids[2], kids[0]]);
        tree.add_child_at(&mut rec, c, kids[0], 0).unwrap();
        assert_eq!(tree.children_of(c), kids.as_slice());
        assert!(rec.events.is_empty());
        assert_dense(&tree, c);
    }

    #[test]
    fn set_child_index_moves_both_directions() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 5);

        tree.set_child_index(c, k[1], 3).unwrap();
        assert_eq!(tree.children_of(c), &[k[0], k[2], k[3], k[1], k[4]]);
        assert_dense(&tree, c);

        tree.set_child_index(c, k[1], 0).unwrap();
        assert_eq!(tree.children_of(c), &[k[1], k[0], k[2], k[3], k[4]]);
        assert_dense(&tree, c);

        // Moving to `len` puts the child last.
        tree.set_child_index(c, k[1], 5).unwrap();
        assert_eq!(tree.children_of(c), &[k[0], k[2], k[3], k[4], k[1]]);
        assert_dense(&tree, c);
    }

    #[test]
    fn set_child_index_invalidates_geometry_only() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 2);
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        tree.set_bounds(c, r);
        tree.set_bounds(k[0], r);
        tree.set_owned(k[0], true);

        // No-op move keeps everything.
        tree.set_child_index(c, k[0], 0).unwrap();
        assert_eq!(tree.bounds(k[0]), Some(r));
        assert!(tree.is_owned(k[0]));

        tree.set_child_index(c, k[0], 1).unwrap();
        assert_eq!(tree.bounds(k[0]), None);
        assert_eq!(tree.bounds(c), None);
        assert!(!tree.is_owned(k[0]));
    }

    #[test]
    fn swap_children_at_ends() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 3);

        tree.swap_children_at(c, 0, 2).unwrap();
        assert_eq!(tree.children_of(c), &[k[2], k[1], k[0]]);
        assert_eq!(tree.cached_index(k[2]), Some(0));
        assert_eq!(tree.cached_index(k[0]), Some(2));
        assert_dense(&tree, c);
    }

    #[test]
    fn swap_children_by_node_keeps_attachment() {
        let mut tree = DisplayTree::new();
        let stage = tree.create_stage();
        let (c, k) = container_with(&mut tree, 3);
        tree.add_child(&mut (), stage, c).unwrap();

        tree.swap_children(c, k[0], k[1]).unwrap();
        assert_eq!(tree.children_of(c), &[k[1], k[0], k[2]]);
        assert_dense(&tree, c);
        // Still attached after reordering.
        assert_eq!(tree.stage_of(k[0]), Some(stage));
    }

    #[test]
    fn remove_children_takes_original_range() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 5);
        let mut rec = Recorder::default();

        tree.remove_children(&mut rec, c, 1, 4).unwrap();
        assert_eq!(tree.children_of(c), &[k[0], k[4]]);
        assert_eq!(
            rec.take(),
            vec![Event::Removed(k[1]), Event::Removed(k[2]), Event::Removed(k[3])]
        );
        assert_dense(&tree, c);

        tree.remove_children(&mut (), c, 0, 2).unwrap();
        assert_eq!(tree.num_children(c), Ok(0));
    }

    #[test]
    fn remove_children_validates_whole_range_first() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 3);
        assert_eq!(
            tree.remove_children(&mut (), c, 1, 4),
            Err(DisplayError::IndexOutOfRange { index: 4, len: 3 })
        );
        assert_eq!(
            tree.remove_children(&mut (), c, 2, 1),
            Err(DisplayError::IndexOutOfRange { index: 2, len: 3 })
        );
        assert_eq!(tree.children_of(c), k.as_slice());
        // Empty range is fine.
        tree.remove_children(&mut (), c, 3, 3).unwrap();
        assert_eq!(tree.num_children(c), Ok(3));
    }

    #[test]
    fn get_child_by_name_returns_first_match() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 3);
        tree.set_name(k[1], "label");
        tree.set_name(k[2], "label");
        assert_eq!(tree.get_child_by_name(c, "label"), Ok(Some(k[1])));
        assert_eq!(tree.get_child_by_name(c, "missing"), Ok(None));
    }

    #[test]
    fn sparse_mode_searches() {
        let mut tree = DisplayTree::new();
        let c = tree.create_container_with(crate::ContainerConfig::new().sparse());
        let k: Vec<NodeId> = (0..4).map(|_| tree.create_leaf()).collect();
        for &x in &k {
            tree.add_child_at(&mut (), c, x, 0).unwrap();
        }
        // Inserting at the front does not shift cached indices in sparse mode.
        assert_eq!(tree.cached_index(k[0]), Some(0));
        assert_eq!(tree.get_child_index(c, k[0]), Ok(3));
        assert_eq!(tree.get_child_index(c, k[3]), Ok(0));

        tree.remove_child_at(&mut (), c, 1).unwrap();
        tree.set_child_index(c, k[0], 0).unwrap();
        assert_eq!(tree.children_of(c), &[k[0], k[3], k[1]]);
        assert_eq!(tree.get_child_index(c, k[1]), Ok(2));
        assert_eq!(tree.remove_child(&mut (), c, k[3]), Ok(k[3]));
        assert_eq!(tree.children_of(c), &[k[0], k[1]]);
    }

    #[test]
    fn switching_to_dense_rebuilds_indices() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 3);
        tree.set_index_mode(c, IndexMode::Sparse).unwrap();
        let x = tree.create_leaf();
        tree.add_child_at(&mut (), c, x, 0).unwrap();
        assert_eq!(tree.cached_index(k[2]), Some(2), "stale in sparse mode");

        tree.set_index_mode(c, IndexMode::Dense).unwrap();
        assert_eq!(tree.index_mode(c), Some(IndexMode::Dense));
        assert_dense(&tree, c);
    }

    #[test]
    fn structural_changes_clear_owned_and_bounds() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 2);
        let r = Rect::new(0.0, 0.0, 5.0, 5.0);
        tree.set_bounds(c, r);
        tree.set_owned(k[0], true);
        tree.set_owned(k[1], true);

        tree.swap_children_at(c, 0, 1).unwrap();
        assert!(!tree.is_owned(k[0]) && !tree.is_owned(k[1]));
        assert_eq!(tree.bounds(c), None);

        tree.set_bounds(c, r);
        tree.set_owned(k[0], true);
        tree.remove_child(&mut (), c, k[0]).unwrap();
        assert!(!tree.is_owned(k[0]));
        assert_eq!(tree.bounds(c), None);
    }

    /// Removes the node it is told about as soon as it is added.
    struct Bouncer;

    impl Host for Bouncer {
        fn on_added(&mut self, tree: &mut DisplayTree, node: NodeId) {
            if let Some(parent) = tree.parent_of(node) {
                tree.remove_child(self, parent, node).unwrap();
            }
        }
    }

    #[test]
    fn hook_removes_node_being_added() {
        let mut tree = DisplayTree::new();
        let stage = tree.create_stage();
        let (c, k) = container_with(&mut tree, 2);
        tree.add_child(&mut (), stage, c).unwrap();
        let x = tree.create_leaf();

        assert_eq!(tree.add_child_at(&mut Bouncer, c, x, 1), Ok(x));
        assert_eq!(tree.parent_of(x), None);
        assert_eq!(tree.stage_of(x), None);
        assert_eq!(tree.children_of(c), k.as_slice());
        assert_dense(&tree, c);
    }

    /// Removes the first sibling whenever a node is about to be removed.
    struct SiblingEater {
        armed: bool,
    }

    impl Host for SiblingEater {
        fn on_removed(&mut self, tree: &mut DisplayTree, node: NodeId) {
            if !core::mem::take(&mut self.armed) {
                return;
            }
            let parent = tree.parent_of(node).unwrap();
            let first = tree.get_child_at(parent, 0).unwrap();
            if first != node {
                tree.remove_child(self, parent, first).unwrap();
            }
        }
    }

    #[test]
    fn hook_removes_sibling_during_removal() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 4);

        let removed = tree
            .remove_child_at(&mut SiblingEater { armed: true }, c, 2)
            .unwrap();
        assert_eq!(removed, k[2]);
        assert_eq!(tree.children_of(c), &[k[1], k[3]]);
        assert_dense(&tree, c);
    }

    #[test]
    fn hook_shrinks_list_during_bulk_remove() {
        let mut tree = DisplayTree::new();
        let (c, k) = container_with(&mut tree, 4);

        // The first removal also eats k[0], so the third pass finds nothing at 1.
        tree.remove_children(&mut SiblingEater { armed: true }, c, 1, 4)
            .unwrap();
        assert_eq!(tree.children_of(c), &[k[2]]);
        assert_dense(&tree, c);
    }
}
