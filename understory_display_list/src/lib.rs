// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_display_list --heading-base-level=0

//! Understory Display List: ordered child lists for a retained scene graph.
//!
//! This crate owns the structural side of a display list: which node contains
//! which, in what order, and what happens to a subtree when it is attached to
//! or detached from the stage or destroyed.
//!
//! - Each container keeps an ordered, indexable list of children. Order is paint order.
//! - A node has at most one parent. Inserting a node that already has one moves it.
//! - Positions are cached per child ([`IndexMode::Dense`]) or searched for
//!   ([`IndexMode::Sparse`]), chosen per container.
//! - Attaching to and detaching from the stage cascades through subtrees, as
//!   does [`DisplayTree::destroy`].
//!
//! ## Not a renderer
//!
//! Painting, hit testing, and bounds computation are left to other layers. The
//! tree only caches a bounds value per node and forgets it whenever the
//! structure around the node changes, so a geometry pass knows what to redo.
//!
//! ## Hooks and re-entrancy
//!
//! Mutations take a [`Host`] and call [`Host::on_added`], [`Host::on_removed`],
//! [`Host::on_stage_attach`], and [`Host::on_stage_detach`] synchronously. A
//! hook receives `&mut DisplayTree` and may change the structure further;
//! operations re-check ownership and positions after every hook, so a listener
//! removing the node that is being added is fine.
//!
//! ## API overview
//!
//! - [`DisplayTree`]: node storage plus all operations.
//! - [`NodeId`]: generational handle of a node.
//! - [`NodeKind`]: leaf, container, or loader (single content slot).
//! - [`NodeFlags`]: destroyed, owned, sparse, and interaction flags.
//! - [`ContainerConfig`]: initial settings for containers.
//! - [`DisplayError`]: why an operation was refused.
//!
//! Key operations:
//! - [`DisplayTree::add_child`] / [`DisplayTree::add_child_at`]
//! - [`DisplayTree::remove_child`] / [`DisplayTree::remove_child_at`] / [`DisplayTree::remove_children`]
//! - [`DisplayTree::get_child_at`] / [`DisplayTree::get_child_by_name`] / [`DisplayTree::get_child_index`]
//! - [`DisplayTree::set_child_index`] / [`DisplayTree::swap_children`] / [`DisplayTree::swap_children_at`]
//! - [`DisplayTree::load`] / [`DisplayTree::unload`] for loaders
//! - [`DisplayTree::create_stage`], [`DisplayTree::destroy`], [`DisplayTree::release`]
//!
//! ## Example
//!
//! ```rust
//! use understory_display_list::{DisplayTree, Host, NodeId};
//!
//! #[derive(Default)]
//! struct Log(Vec<&'static str>);
//!
//! impl Host for Log {
//!     fn on_added(&mut self, _: &mut DisplayTree, _: NodeId) {
//!         self.0.push("added");
//!     }
//!     fn on_stage_attach(&mut self, _: &mut DisplayTree, _: NodeId) {
//!         self.0.push("on stage");
//!     }
//! }
//!
//! let mut tree = DisplayTree::new();
//! let stage = tree.create_stage();
//! let panel = tree.create_container();
//! let mut log = Log::default();
//!
//! tree.add_child(&mut log, stage, panel).unwrap();
//! assert_eq!(log.0, ["added", "on stage"]);
//! assert!(tree.is_on_stage(panel));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod children;
mod error;
mod host;
mod lifecycle;
mod reparent;
mod tree;
mod types;

pub use error::DisplayError;
pub use host::Host;
pub use tree::DisplayTree;
pub use types::{
    BroadcastKinds, ContainerConfig, IndexMode, NodeFlags, NodeId, NodeKind, TextSnapshot,
};
