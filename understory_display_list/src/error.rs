// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by display list operations.

use crate::types::NodeId;

/// Failure of a display list operation.
///
/// Every error is reported before the operation mutates anything, so a failed
/// call leaves the tree exactly as it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    /// A node was added as a child of itself.
    #[error("a node cannot be added as a child of itself")]
    SelfContainment,
    /// An index argument was outside the range the operation accepts.
    #[error("index {index} is out of range for a container with {len} children")]
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// Number of children at the time of the call.
        len: usize,
    },
    /// A child (or pair of children) is not owned by the container.
    #[error("the node is not a child of this container")]
    WrongOwner,
    /// The accessor is not supported.
    #[error("`{0}` is not implemented")]
    NotImplemented(&'static str),
    /// The identifier refers to a released node.
    #[error("stale node id {0:?}")]
    StaleNode(NodeId),
    /// A child-list operation was issued on a leaf.
    #[error("node {0:?} cannot own children")]
    NotAContainer(NodeId),
    /// The operation is refused for this kind of node.
    #[error("illegal operation: {0}")]
    IllegalOperation(&'static str),
}
