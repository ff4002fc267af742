//! Graph Nodes
//!
//! One node per signal, memo and effect. A node only stores bookkeeping:
//! its kind, whether it is stale, and its edges. Values and closures live in
//! the reactive primitives that own the node id.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

/// Identity of a reactive primitive in the graph.
///
/// Ids are process-wide unique and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A signal. Only ever has dependents.
    Source,
    /// A memo: read by others, reads others.
    Derived,
    /// An effect. Reads others, never read.
    Effect,
}

/// How stale a computation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    Clean,
    /// Something upstream changed. Whether the direct inputs changed is only
    /// known after refreshing them.
    MaybeDirty,
    /// A direct input changed.
    Dirty,
}

/// Bookkeeping for one reactive primitive.
///
/// Edges are kept in subscription order, so change propagation is
/// deterministic.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    dirty: DirtyState,
    /// Upstream nodes read during the last run.
    dependencies: IndexSet<NodeId>,
    /// Downstream nodes that read this one.
    dependents: IndexSet<NodeId>,
}

impl Node {
    /// A node for an id its owner already holds.
    ///
    /// Computations start dirty so their first read runs them.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        let dirty = match kind {
            NodeKind::Source => DirtyState::Clean,
            NodeKind::Derived | NodeKind::Effect => DirtyState::Dirty,
        };
        Self {
            id,
            kind,
            dirty,
            dependencies: IndexSet::new(),
            dependents: IndexSet::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn is_clean(&self) -> bool {
        self.dirty == DirtyState::Clean
    }

    pub fn mark_clean(&mut self) {
        self.dirty = DirtyState::Clean;
    }

    /// Never downgrades a dirty node.
    pub fn mark_maybe_dirty(&mut self) {
        if self.is_clean() {
            self.dirty = DirtyState::MaybeDirty;
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = DirtyState::Dirty;
    }

    pub fn add_dependency(&mut self, id: NodeId) {
        self.dependencies.insert(id);
    }

    pub fn remove_dependency(&mut self, id: NodeId) {
        self.dependencies.shift_remove(&id);
    }

    pub fn dependencies(&self) -> &IndexSet<NodeId> {
        &self.dependencies
    }

    pub fn add_dependent(&mut self, id: NodeId) {
        self.dependents.insert(id);
    }

    pub fn remove_dependent(&mut self, id: NodeId) {
        self.dependents.shift_remove(&id);
    }

    pub fn dependents(&self) -> &IndexSet<NodeId> {
        &self.dependents
    }

    /// Drop every upstream edge, returning what was there.
    pub fn take_dependencies(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.dependencies)
    }
}

#[cfg(test)]
impl Node {
    pub(crate) fn source() -> Self {
        Self::new(NodeId::new(), NodeKind::Source)
    }

    pub(crate) fn derived() -> Self {
        Self::new(NodeId::new(), NodeKind::Derived)
    }

    pub(crate) fn effect() -> Self {
        Self::new(NodeId::new(), NodeKind::Effect)
    }
}
