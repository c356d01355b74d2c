// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage membership, destruction, broadcast subscriptions, and slot release.
//!
//! ## Stage
//!
//! The stage is the single root of everything that is displayed. A node is on
//! stage exactly when its parent is, so membership is never assigned directly:
//! inserting into an on-stage container attaches the whole subtree, removing
//! detaches it. The child-list operations update membership structurally and
//! then run the cascades here, which call [`Host::on_stage_attach`] or
//! [`Host::on_stage_detach`] for each subtree node in pre-order.
//!
//! ## Destruction
//!
//! [`DisplayTree::destroy`] is idempotent and cascades depth-first to every
//! descendant. It does not detach anything and fires no hooks; destroyed nodes
//! stay live until [`DisplayTree::release`] frees their slots.

use smallvec::SmallVec;

use crate::error::DisplayError;
use crate::host::Host;
use crate::tree::DisplayTree;
use crate::types::{BroadcastKinds, NodeFlags, NodeId, NodeKind};

type Stack = SmallVec<[NodeId; 16]>;

impl DisplayTree {
    /// Return the stage, creating it on first use.
    ///
    /// The stage is a container that is its own stage.
    pub fn create_stage(&mut self) -> NodeId {
        if let Some(stage) = self.stage.filter(|&s| self.is_alive(s)) {
            return stage;
        }
        let stage = self.alloc(NodeKind::Container, NodeFlags::default());
        self.node_mut(stage).stage = Some(stage);
        self.stage = Some(stage);
        log::debug!("created stage {stage:?}");
        stage
    }

    /// Returns the stage, if one was created and is still live.
    pub fn stage(&self) -> Option<NodeId> {
        self.stage.filter(|&s| self.is_alive(s))
    }

    /// Returns true if the node is reachable from the stage.
    pub fn is_on_stage(&self, id: NodeId) -> bool {
        self.stage_of(id).is_some()
    }

    /// Destroy a node and, depth-first, every descendant.
    ///
    /// The node is marked before its children are visited, so re-entrant calls
    /// see it as already destroyed. Its broadcast subscriptions are released
    /// after the children are done. Calling this again has no effect.
    pub fn destroy(&mut self, id: NodeId) {
        let mut stack: Stack = SmallVec::new();
        stack.push(id);
        let mut destroyed: Stack = SmallVec::new();
        while let Some(node) = stack.pop() {
            let Some(n) = self.node_opt_mut(node) else {
                continue;
            };
            if n.flags.contains(NodeFlags::DESTROYED) {
                continue;
            }
            n.flags.insert(NodeFlags::DESTROYED);
            stack.extend(n.children.iter().rev().copied());
            destroyed.push(node);
        }
        // Children before parents.
        for &node in destroyed.iter().rev() {
            self.release_broadcast_subscriptions(node);
        }
        if !destroyed.is_empty() {
            log::trace!("destroyed {} node(s) rooted at {id:?}", destroyed.len());
        }
    }

    /// Free the slots of a detached node and its whole subtree.
    ///
    /// Ids of released nodes become stale. Released nodes are not destroyed
    /// first; call [`DisplayTree::destroy`] beforehand if that matters.
    pub fn release(&mut self, id: NodeId) -> Result<(), DisplayError> {
        if self.live(id)?.parent.is_some() {
            return Err(DisplayError::IllegalOperation(
                "only detached nodes can be released",
            ));
        }
        let nodes = self.subtree(id);
        for &n in &nodes {
            self.subscriptions.remove(&n);
            self.free_slot(n);
        }
        if self.stage == Some(id) {
            self.stage = None;
        }
        log::debug!("released {} node(s) rooted at {id:?}", nodes.len());
        Ok(())
    }

    /// Subscribe a node to frame-level broadcasts.
    pub fn subscribe_broadcast(
        &mut self,
        id: NodeId,
        kinds: BroadcastKinds,
    ) -> Result<(), DisplayError> {
        if self.live(id)?.flags.contains(NodeFlags::DESTROYED) {
            return Err(DisplayError::IllegalOperation(
                "destroyed nodes cannot subscribe to broadcasts",
            ));
        }
        if !kinds.is_empty() {
            *self
                .subscriptions
                .entry(id)
                .or_insert(BroadcastKinds::empty()) |= kinds;
        }
        Ok(())
    }

    /// Drop some of a node's broadcast subscriptions.
    pub fn unsubscribe_broadcast(&mut self, id: NodeId, kinds: BroadcastKinds) {
        if let Some(current) = self.subscriptions.get_mut(&id) {
            current.remove(kinds);
            if current.is_empty() {
                self.subscriptions.remove(&id);
            }
        }
    }

    /// Drop all of a node's broadcast subscriptions.
    pub fn release_broadcast_subscriptions(&mut self, id: NodeId) {
        self.subscriptions.remove(&id);
    }

    /// Returns the broadcasts a node is subscribed to.
    pub fn broadcast_subscriptions(&self, id: NodeId) -> BroadcastKinds {
        self.subscriptions
            .get(&id)
            .copied()
            .unwrap_or(BroadcastKinds::empty())
    }

    /// Iterate the live nodes subscribed to any of `kinds`.
    ///
    /// The returned [`NodeId`]s are in an unspecified order.
    pub fn broadcast_targets(&self, kinds: BroadcastKinds) -> impl Iterator<Item = NodeId> + '_ {
        self.subscriptions
            .iter()
            .filter(move |(id, k)| k.intersects(kinds) && self.is_alive(**id))
            .map(|(id, _)| *id)
    }

    // --- internals ---

    /// Set the stage of `root` and every descendant. No hooks fire.
    pub(crate) fn propagate_stage(&mut self, root: NodeId, stage: Option<NodeId>) {
        let mut stack: Stack = SmallVec::new();
        stack.push(root);
        while let Some(id) = stack.pop() {
            let n = self.node_mut(id);
            n.stage = stage;
            stack.extend(n.children.iter().rev().copied());
        }
    }

    /// Stage-attach cascade for a subtree that was just attached.
    pub(crate) fn add_to_stage<H: Host + ?Sized>(&mut self, host: &mut H, root: NodeId) {
        for (id, seen) in self.stage_snapshot(root) {
            let Some(n) = self.node_opt_mut(id) else {
                continue;
            };
            // Skip nodes an earlier hook took off stage, or that a nested
            // cascade already announced.
            if n.stage_events != seen || n.stage_announced || n.stage.is_none() {
                continue;
            }
            n.stage_announced = true;
            n.stage_events = n.stage_events.wrapping_add(1);
            host.on_stage_attach(self, id);
        }
    }

    /// Stage-detach cascade for a subtree that is about to be detached.
    ///
    /// Only nodes whose attach was announced get a detach, once. A removal
    /// started from inside a detach hook finds the node already announced
    /// and goes straight to the structural removal.
    pub(crate) fn remove_from_stage<H: Host + ?Sized>(&mut self, host: &mut H, root: NodeId) {
        for (id, seen) in self.stage_snapshot(root) {
            let Some(n) = self.node_opt_mut(id) else {
                continue;
            };
            if n.stage_events != seen || !n.stage_announced {
                continue;
            }
            n.stage_announced = false;
            n.stage_events = n.stage_events.wrapping_add(1);
            host.on_stage_detach(self, id);
        }
    }

    /// Pre-order subtree of `root`, each node paired with its stage hook count.
    fn stage_snapshot(&self, root: NodeId) -> SmallVec<[(NodeId, u32); 16]> {
        self.subtree(root)
            .into_iter()
            .map(|id| (id, self.node(id).stage_events))
            .collect()
    }

    /// `root` and its descendants in pre-order.
    fn subtree(&self, root: NodeId) -> Stack {
        let mut out: Stack = SmallVec::new();
        let mut stack: Stack = SmallVec::new();
        stack.push(root);
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children_of(id).iter().rev().copied());
        }
        out
    }
}
