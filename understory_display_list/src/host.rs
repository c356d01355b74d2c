// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle hooks implemented by the embedding runtime.
//!
//! Structural operations on a [`DisplayTree`] take a `&mut H where H: Host`
//! and call back into it synchronously. Each hook receives the tree itself, so
//! a listener may mutate the structure while the operation is in flight: it
//! can remove a sibling, move the node somewhere else, or remove the very node
//! being added. Operations re-read ownership and positions after every hook
//! rather than trusting what they saw before it.
//!
//! ```rust
//! use understory_display_list::{DisplayTree, Host, NodeId};
//!
//! /// Keeps at most one child in any container it is attached to.
//! struct Exclusive;
//!
//! impl Host for Exclusive {
//!     fn on_added(&mut self, tree: &mut DisplayTree, node: NodeId) {
//!         let Some(parent) = tree.parent_of(node) else { return };
//!         while tree.num_children(parent).unwrap_or(0) > 1 {
//!             let _ = tree.remove_child_at(self, parent, 0);
//!         }
//!     }
//! }
//!
//! let mut tree = DisplayTree::new();
//! let root = tree.create_container();
//! let a = tree.create_leaf();
//! let b = tree.create_leaf();
//! tree.add_child(&mut Exclusive, root, a).unwrap();
//! tree.add_child(&mut Exclusive, root, b).unwrap();
//! assert_eq!(tree.children_of(root), &[b]);
//! ```
//!
//! `()` implements [`Host`] with every hook a no-op.

use crate::tree::DisplayTree;
use crate::types::NodeId;

/// Typed lifecycle callbacks.
///
/// All methods default to doing nothing.
pub trait Host {
    /// `node` was inserted into a container. Its parent, index, and stage are
    /// already set when this runs.
    fn on_added(&mut self, tree: &mut DisplayTree, node: NodeId) {
        let _ = (tree, node);
    }

    /// `node` is about to be removed from its container. It is still attached
    /// when this runs.
    fn on_removed(&mut self, tree: &mut DisplayTree, node: NodeId) {
        let _ = (tree, node);
    }

    /// `node` became reachable from the stage.
    fn on_stage_attach(&mut self, tree: &mut DisplayTree, node: NodeId) {
        let _ = (tree, node);
    }

    /// `node` is about to become unreachable from the stage. It is still on
    /// stage when this runs.
    fn on_stage_detach(&mut self, tree: &mut DisplayTree, node: NodeId) {
        let _ = (tree, node);
    }
}

impl Host for () {}

/// A hook invocation, as recorded by the test host.
#[cfg(test)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Added(NodeId),
    Removed(NodeId),
    StageAttach(NodeId),
    StageDetach(NodeId),
}

/// Host that records every hook call in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub(crate) events: alloc::vec::Vec<Event>,
}

#[cfg(test)]
impl Recorder {
    pub(crate) fn take(&mut self) -> alloc::vec::Vec<Event> {
        core::mem::take(&mut self.events)
    }
}

#[cfg(test)]
impl Host for Recorder {
    fn on_added(&mut self, _tree: &mut DisplayTree, node: NodeId) {
        self.events.push(Event::Added(node));
    }

    fn on_removed(&mut self, _tree: &mut DisplayTree, node: NodeId) {
        self.events.push(Event::Removed(node));
    }

    fn on_stage_attach(&mut self, _tree: &mut DisplayTree, node: NodeId) {
        self.events.push(Event::StageAttach(node));
    }

    fn on_stage_detach(&mut self, _tree: &mut DisplayTree, node: NodeId) {
        self.events.push(Event::StageDetach(node));
    }
}
