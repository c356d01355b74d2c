// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage: allocation, per-node state, and property accessors.

use alloc::{string::String, vec::Vec};
use hashbrown::HashMap;
use kurbo::Rect;

use crate::error::DisplayError;
use crate::types::{
    BroadcastKinds, ContainerConfig, IndexMode, NodeFlags, NodeId, NodeKind, TextSnapshot,
};

/// A retained display list: nodes, their ordered child lists, and stage membership.
///
/// Nodes live in slots addressed by generational [`NodeId`]s. A node's parent
/// is a plain id checked against the slot generation on every use, so it never
/// keeps the parent alive.
///
/// Structural mutations (see the child-list methods such as
/// [`DisplayTree::add_child_at`]) take a [`Host`](crate::Host) whose hooks are
/// called synchronously while the operation runs.
///
/// ## Example
///
/// ```rust
/// use understory_display_list::DisplayTree;
///
/// let mut tree = DisplayTree::new();
/// let root = tree.create_container();
/// let a = tree.create_leaf();
/// let b = tree.create_leaf();
///
/// tree.add_child(&mut (), root, a).unwrap();
/// tree.add_child_at(&mut (), root, b, 0).unwrap();
///
/// assert_eq!(tree.children_of(root), &[b, a]);
/// assert_eq!(tree.get_child_index(root, a), Ok(1));
/// assert_eq!(tree.parent_of(a), Some(root));
/// ```
pub struct DisplayTree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    pub(crate) free_list: Vec<usize>,
    pub(crate) stage: Option<NodeId>,
    pub(crate) subscriptions: HashMap<NodeId, BroadcastKinds>,
}

impl core::fmt::Debug for DisplayTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("DisplayTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("stage", &self.stage)
            .field("subscribers", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) generation: u32,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Cached position in the parent; `None` when not contained.
    pub(crate) index: Option<usize>,
    pub(crate) stage: Option<NodeId>,
    /// Whether the last stage hook fired for this node was an attach.
    pub(crate) stage_announced: bool,
    /// Number of stage hooks fired for this node so far.
    pub(crate) stage_events: u32,
    pub(crate) flags: NodeFlags,
    /// Cached geometry; `None` when unknown.
    pub(crate) bounds: Option<Rect>,
    pub(crate) name: String,
    /// Loaded content of a loader.
    pub(crate) content: Option<NodeId>,
}

impl Node {
    fn new(generation: u32, kind: NodeKind, flags: NodeFlags) -> Self {
        Self {
            generation,
            kind,
            parent: None,
            children: Vec::new(),
            index: None,
            stage: None,
            stage_announced: false,
            stage_events: 0,
            flags,
            bounds: None,
            name: String::new(),
            content: None,
        }
    }
}

impl DisplayTree {
    /// Create an empty display list with no stage.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            stage: None,
            subscriptions: HashMap::new(),
        }
    }

    /// Create a detached leaf node.
    pub fn create_leaf(&mut self) -> NodeId {
        self.alloc(NodeKind::Leaf, NodeFlags::default())
    }

    /// Create a detached container with the default [`ContainerConfig`].
    pub fn create_container(&mut self) -> NodeId {
        self.create_container_with(ContainerConfig::default())
    }

    /// Create a detached container with the given configuration.
    pub fn create_container_with(&mut self, config: ContainerConfig) -> NodeId {
        self.alloc(NodeKind::Container, config.flags())
    }

    /// Create a detached loader.
    ///
    /// A loader holds at most one child, its content, which is managed with
    /// [`DisplayTree::load`] and [`DisplayTree::unload`].
    pub fn create_loader(&mut self) -> NodeId {
        self.alloc(NodeKind::Loader, NodeFlags::default())
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, flags: NodeFlags) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind, flags));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, kind, flags)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Drop the slot of `id`, leaving its generation behind for stale checks.
    pub(crate) fn free_slot(&mut self, id: NodeId) {
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is live if its slot is occupied and the slot generation
    /// matches. Destroyed nodes stay live until released.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns the kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|n| n.kind)
    }

    /// Returns the parent of a live node, or `None` for detached nodes and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id)
            .and_then(|n| n.parent)
            .filter(|&p| self.is_alive(p))
    }

    /// Returns the cached index of a live node in its parent.
    ///
    /// This is the raw cached value; it only matches the node's position while
    /// the parent is in [`IndexMode::Dense`]. Use
    /// [`DisplayTree::get_child_index`] for the authoritative position.
    pub fn cached_index(&self, id: NodeId) -> Option<usize> {
        self.node_opt(id).and_then(|n| n.index)
    }

    /// Returns the stage a live node is attached to, if any.
    pub fn stage_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.stage)
    }

    /// Returns the flags of a live node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.flags)
    }

    /// Returns true if the node was destroyed. Stale ids report `false`.
    pub fn is_destroyed(&self, id: NodeId) -> bool {
        self.node_opt(id)
            .is_some_and(|n| n.flags.contains(NodeFlags::DESTROYED))
    }

    /// Returns true while an external owner's claim on the node is current.
    ///
    /// Every structural mutation that touches the node clears the claim.
    pub fn is_owned(&self, id: NodeId) -> bool {
        self.node_opt(id)
            .is_some_and(|n| n.flags.contains(NodeFlags::OWNED))
    }

    /// Record or drop an external owner's claim on the node.
    pub fn set_owned(&mut self, id: NodeId, owned: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.flags.set(NodeFlags::OWNED, owned);
        }
    }

    /// Returns the name of a live node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node_opt(id).map(|n| n.name.as_str())
    }

    /// Update the name of a live node.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.name = name.into();
        }
    }

    /// Returns the cached bounds of a live node, or `None` if unknown.
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).and_then(|n| n.bounds)
    }

    /// Store bounds computed by the geometry collaborator.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(n) = self.node_opt_mut(id) {
            n.bounds = Some(bounds);
        }
    }

    /// Forget the cached bounds of a node and of every ancestor.
    ///
    /// Does not terminate if the ancestors form a cycle; see
    /// [`DisplayTree::add_child_at`].
    pub fn invalidate(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(n) = current {
            let Some(node) = self.node_opt_mut(n) else {
                break;
            };
            node.bounds = None;
            current = node.parent;
        }
    }

    /// Get the children of a node in paint order, or an empty slice if the
    /// node is stale or a leaf.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Returns the index mode of a live container.
    pub fn index_mode(&self, container: NodeId) -> Option<IndexMode> {
        let n = self.node_opt(container)?;
        if !n.kind.is_container() {
            return None;
        }
        Some(if n.flags.contains(NodeFlags::SPARSE) {
            IndexMode::Sparse
        } else {
            IndexMode::Dense
        })
    }

    /// Returns whether children of the container take part in pointer interaction.
    pub fn mouse_children(&self, container: NodeId) -> Result<bool, DisplayError> {
        Ok(self
            .container(container)?
            .flags
            .contains(NodeFlags::MOUSE_CHILDREN))
    }

    /// Set whether children of the container take part in pointer interaction.
    pub fn set_mouse_children(
        &mut self,
        container: NodeId,
        enabled: bool,
    ) -> Result<(), DisplayError> {
        self.container(container)?;
        self.node_mut(container)
            .flags
            .set(NodeFlags::MOUSE_CHILDREN, enabled);
        Ok(())
    }

    /// Returns whether children of the container take part in tab navigation.
    pub fn tab_children(&self, container: NodeId) -> Result<bool, DisplayError> {
        Ok(self
            .container(container)?
            .flags
            .contains(NodeFlags::TAB_CHILDREN))
    }

    /// Set whether children of the container take part in tab navigation.
    pub fn set_tab_children(
        &mut self,
        container: NodeId,
        enabled: bool,
    ) -> Result<(), DisplayError> {
        self.container(container)?;
        self.node_mut(container)
            .flags
            .set(NodeFlags::TAB_CHILDREN, enabled);
        Ok(())
    }

    /// Static text snapshot of the container. Not supported; always fails with
    /// [`DisplayError::NotImplemented`] once the container is validated.
    pub fn text_snapshot(&self, container: NodeId) -> Result<TextSnapshot, DisplayError> {
        self.container(container)?;
        Err(DisplayError::NotImplemented("text_snapshot"))
    }

    // --- internals ---

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.node_opt(id).expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_opt_mut(id).expect("dangling NodeId")
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    /// Look up a live node or report it stale.
    pub(crate) fn live(&self, id: NodeId) -> Result<&Node, DisplayError> {
        self.node_opt(id).ok_or(DisplayError::StaleNode(id))
    }

    /// Look up a live node that owns a child list.
    pub(crate) fn container(&self, id: NodeId) -> Result<&Node, DisplayError> {
        let n = self.live(id)?;
        if !n.kind.is_container() {
            return Err(DisplayError::NotAContainer(id));
        }
        Ok(n)
    }
}
