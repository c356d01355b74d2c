// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the display list: node identifiers, kinds, flags, and container configuration.

/// Identifier for a node in the display list (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// What a node is allowed to hold.
///
/// This is the type check collaborators use to tell a general container apart
/// from a loader, whose single content slot is managed outside the public
/// child-list operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// A leaf node; it cannot own children.
    Leaf,
    /// A general container with an ordered child list.
    Container,
    /// A container that owns at most one child, its loaded content.
    Loader,
}

impl NodeKind {
    /// Whether nodes of this kind own a child list.
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Container | Self::Loader)
    }
}

/// How a container maintains the cached index of its children.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum IndexMode {
    /// Every child's cached index equals its position; lookups are O(1).
    #[default]
    Dense,
    /// Cached indices are not maintained; lookups search the child list.
    Sparse,
}

bitflags::bitflags! {
    /// Per-node state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node was destroyed. Never cleared once set.
        const DESTROYED      = 0b0000_0001;
        /// An external owner (for example a timeline) holds a claim on the node's
        /// position. Cleared by every structural mutation that touches the node.
        const OWNED          = 0b0000_0010;
        /// The container does not maintain cached child indices.
        const SPARSE         = 0b0000_0100;
        /// Children of this container take part in pointer interaction.
        const MOUSE_CHILDREN = 0b0000_1000;
        /// Children of this container take part in tab navigation.
        const TAB_CHILDREN   = 0b0001_0000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::MOUSE_CHILDREN | Self::TAB_CHILDREN
    }
}

bitflags::bitflags! {
    /// Frame-level broadcasts a node may subscribe to.
    ///
    /// Broadcasts are delivered to every subscriber regardless of its place in
    /// the tree, so subscriptions are held by the tree rather than by parents.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BroadcastKinds: u8 {
        /// Start of a frame.
        const ENTER_FRAME       = 0b0000_0001;
        /// Frame scripts are about to run.
        const FRAME_CONSTRUCTED = 0b0000_0010;
        /// End of a frame.
        const EXIT_FRAME        = 0b0000_0100;
        /// The stage is about to be rendered.
        const RENDER            = 0b0000_1000;
        /// The host gained focus.
        const ACTIVATE          = 0b0001_0000;
        /// The host lost focus.
        const DEACTIVATE        = 0b0010_0000;
    }
}

/// Initial settings for a new container.
///
/// ```rust
/// use understory_display_list::{ContainerConfig, DisplayTree, IndexMode};
///
/// let mut tree = DisplayTree::new();
/// let layer = tree.create_container_with(
///     ContainerConfig::new().sparse().mouse_children(false),
/// );
/// assert_eq!(tree.index_mode(layer), Some(IndexMode::Sparse));
/// assert_eq!(tree.mouse_children(layer).ok(), Some(false));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ContainerConfig {
    /// How cached child indices are maintained.
    pub index_mode: IndexMode,
    /// Initial value of [`NodeFlags::MOUSE_CHILDREN`].
    pub mouse_children: bool,
    /// Initial value of [`NodeFlags::TAB_CHILDREN`].
    pub tab_children: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            index_mode: IndexMode::Dense,
            mouse_children: true,
            tab_children: true,
        }
    }
}

impl ContainerConfig {
    /// Create the default configuration: dense indices, mouse and tab children enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use [`IndexMode::Sparse`].
    pub fn sparse(mut self) -> Self {
        self.index_mode = IndexMode::Sparse;
        self
    }

    /// Set whether children take part in pointer interaction.
    pub fn mouse_children(mut self, enabled: bool) -> Self {
        self.mouse_children = enabled;
        self
    }

    /// Set whether children take part in tab navigation.
    pub fn tab_children(mut self, enabled: bool) -> Self {
        self.tab_children = enabled;
        self
    }

    pub(crate) fn flags(self) -> NodeFlags {
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::SPARSE, self.index_mode == IndexMode::Sparse);
        flags.set(NodeFlags::MOUSE_CHILDREN, self.mouse_children);
        flags.set(NodeFlags::TAB_CHILDREN, self.tab_children);
        flags
    }
}

/// Static text captured from a container.
///
/// Producing a snapshot is not supported yet, so no value of this type can be
/// constructed; [`DisplayTree::text_snapshot`](crate::DisplayTree::text_snapshot)
/// always reports [`DisplayError::NotImplemented`](crate::DisplayError::NotImplemented).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSnapshot {}
