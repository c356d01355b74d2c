// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving children between owners, and the loader content slot.
//!
//! Inserting a node that already has a parent detaches it from that parent
//! first. Hooks fire on the old owner's side while the node is still attached
//! there, and on the new side once it is attached, so no hook sees it ownerless.
//!
//! A loader owns at most one child, its content, and remembers it in a
//! dedicated slot. Taking a node out of a loader always goes through
//! [`DisplayTree::release_content`], which keeps that slot consistent; the
//! public child-list removals refuse loaders outright.

use crate::error::DisplayError;
use crate::host::Host;
use crate::tree::DisplayTree;
use crate::types::{NodeId, NodeKind};

impl DisplayTree {
    /// Load `content` into `loader`, replacing what it held.
    ///
    /// The previous content is removed first (firing its removal hooks), then
    /// `content` is detached from any other owner and inserted. Returns the
    /// previous content. Loading the current content again does nothing.
    ///
    /// ```rust
    /// use understory_display_list::DisplayTree;
    ///
    /// let mut tree = DisplayTree::new();
    /// let loader = tree.create_loader();
    /// let first = tree.create_container();
    /// let second = tree.create_container();
    ///
    /// assert_eq!(tree.load(&mut (), loader, first), Ok(None));
    /// assert_eq!(tree.load(&mut (), loader, second), Ok(Some(first)));
    /// assert_eq!(tree.loader_content(loader), Some(second));
    /// assert_eq!(tree.parent_of(first), None);
    /// ```
    pub fn load<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        loader: NodeId,
        content: NodeId,
    ) -> Result<Option<NodeId>, DisplayError> {
        if content == loader {
            return Err(DisplayError::SelfContainment);
        }
        if self.stage() == Some(content) {
            return Err(DisplayError::IllegalOperation("the stage cannot be a child"));
        }
        let current = self.loader(loader)?.content;
        self.live(content)?;
        if current == Some(content) {
            return Ok(None);
        }

        let previous = self.unload(host, loader)?;
        self.detach_from_owner(host, content);
        if !self.is_alive(loader) || !self.is_alive(content) {
            log::debug!("load: {loader:?} or {content:?} released by a removal hook");
            return Ok(previous);
        }
        // A hook may have loaded something else meanwhile; the newest load wins.
        for stray in self.child_snapshot(loader) {
            self.release_content(host, loader, stray);
        }
        if !self.is_alive(loader)
            || !self.is_alive(content)
            || self.parent_of(content).is_some()
            || !self.children_of(loader).is_empty()
        {
            log::debug!("load: hooks changed {loader:?} or {content:?} while clearing it");
            return Ok(previous);
        }

        self.splice_in(loader, content, 0);
        self.node_mut(loader).content = Some(content);
        self.announce_added(host, loader, content);
        Ok(previous)
    }

    /// Remove the content of `loader`, returning it.
    pub fn unload<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        loader: NodeId,
    ) -> Result<Option<NodeId>, DisplayError> {
        let Some(content) = self.loader(loader)?.content else {
            return Ok(None);
        };
        self.release_content(host, loader, content);
        Ok(Some(content))
    }

    /// Returns the content of a live loader.
    pub fn loader_content(&self, loader: NodeId) -> Option<NodeId> {
        self.node_opt(loader).and_then(|n| n.content)
    }

    // --- internals ---

    fn loader(&self, id: NodeId) -> Result<&crate::tree::Node, DisplayError> {
        let n = self.live(id)?;
        if n.kind != NodeKind::Loader {
            return Err(DisplayError::IllegalOperation("node is not a loader"));
        }
        Ok(n)
    }

    /// Detach `child` from whatever owns it, using the owner's own removal routine.
    ///
    /// Loops because a removal hook may hand the child to yet another owner.
    pub(crate) fn detach_from_owner<H: Host + ?Sized>(&mut self, host: &mut H, child: NodeId) {
        while let Some(owner) = self.parent_of(child) {
            log::trace!("detaching {child:?} from {owner:?}");
            if self.node(owner).kind == NodeKind::Loader {
                self.release_content(host, owner, child);
            } else {
                self.detach_child(host, owner, child);
            }
        }
    }

    /// Removal routine for loaders: detach the child and clear the content slot.
    pub(crate) fn release_content<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        loader: NodeId,
        child: NodeId,
    ) {
        self.detach_child(host, loader, child);
        if self.parent_of(child) == Some(loader) {
            return;
        }
        if let Some(n) = self.node_opt_mut(loader)
            && n.content == Some(child)
        {
            n.content = None;
        }
    }
}
