//! Dependency Graph
//!
//! Edges between signals, memos and effects, kept apart from the values
//! themselves. An edge runs from what was read to whoever read it, and is
//! re-recorded every time a computation runs, so branches that are no longer
//! taken stop subscribing.
//!
//! The graph lives in a single [`UpdateScheduler`] owned by the thread's
//! runtime. Nodes are looked up by [`NodeId`], and both edge directions are
//! stored so a write can walk downstream and a rerun can unlink upstream.

mod node;
mod scheduler;

pub use node::{DirtyState, Node, NodeId, NodeKind};
pub use scheduler::UpdateScheduler;
