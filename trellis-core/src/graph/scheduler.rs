//! Change Propagation
//!
//! Owns every [`Node`] and the edges between them. A write to a signal is
//! turned into a list of stale nodes here; the runtime decides what to rerun.
//!
//! Propagation is two-colored. Direct readers of the written signal become
//! `Dirty`, anything further downstream only becomes `MaybeDirty`. The returned
//! list is ordered so that every node comes after the nodes it reads from.
//!
//! When the runtime pulls a `MaybeDirty` effect it first refreshes the memos it
//! reads; only a memo whose value actually changed marks its readers `Dirty`
//! through [`UpdateScheduler::mark_dependents_dirty`].

use std::collections::{HashMap, HashSet, VecDeque};

use super::node::{DirtyState, Node, NodeId, NodeKind};

/// The dependency graph.
#[derive(Debug)]
pub struct UpdateScheduler {
    nodes: HashMap<NodeId, Node>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Unlink and drop a node. Its neighbours forget it too.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&node_id)?;

        for dep_id in node.dependencies() {
            if let Some(dep) = self.nodes.get_mut(dep_id) {
                dep.remove_dependent(node_id);
            }
        }

        for dependent_id in node.dependents() {
            if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                dependent.remove_dependency(node_id);
            }
        }

        Some(node)
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn kind(&self, node_id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&node_id).map(Node::kind)
    }

    pub fn dirty_state(&self, node_id: NodeId) -> Option<DirtyState> {
        self.nodes.get(&node_id).map(Node::dirty_state)
    }

    pub fn mark_clean(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.mark_clean();
        }
    }

    pub fn mark_dirty(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.mark_dirty();
        }
    }

    /// Snapshot of a node's dependencies, in subscription order.
    pub fn dependencies_of(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependencies().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Record that `dependent` read `dependency`.
    ///
    /// Ignored unless both ends are registered.
    pub fn add_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if !self.nodes.contains_key(&dependency) || !self.nodes.contains_key(&dependent) {
            return;
        }
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            dep_node.add_dependent(dependent);
        }
        if let Some(dependent_node) = self.nodes.get_mut(&dependent) {
            dependent_node.add_dependency(dependency);
        }
    }

    /// Swap the full dependency set of `dependent` for the one collected by its
    /// latest run.
    pub fn replace_dependencies<I>(&mut self, dependent: NodeId, dependencies: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let previous = match self.nodes.get_mut(&dependent) {
            Some(node) => node.take_dependencies(),
            None => return,
        };

        for dep_id in previous {
            if let Some(dep) = self.nodes.get_mut(&dep_id) {
                dep.remove_dependent(dependent);
            }
        }

        for dep_id in dependencies {
            self.add_edge(dep_id, dependent);
        }
    }

    /// Color everything downstream of a written signal and return it, readers
    /// after what they read.
    pub fn mark_changed(&mut self, source_id: NodeId) -> Vec<NodeId> {
        let mut reached = Vec::new();
        let mut seen = HashSet::new();
        let mut frontier = VecDeque::new();

        if let Some(source) = self.nodes.get(&source_id) {
            for dependent_id in source.dependents() {
                frontier.push_back((*dependent_id, true));
            }
        }

        while let Some((node_id, direct)) = frontier.pop_front() {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                if direct {
                    node.mark_dirty();
                } else {
                    node.mark_maybe_dirty();
                }

                if !seen.insert(node_id) {
                    continue;
                }
                reached.push(node_id);
                frontier.extend(node.dependents().iter().map(|id| (*id, false)));
            }
        }

        self.topological_sort(reached)
    }

    /// Mark the direct dependents of a node whose output changed as dirty.
    ///
    /// Returns the effects among them that were clean before, which means no
    /// earlier propagation has queued them yet.
    pub fn mark_dependents_dirty(&mut self, node_id: NodeId) -> Vec<NodeId> {
        let dependents: Vec<NodeId> = match self.nodes.get(&node_id) {
            Some(node) => node.dependents().iter().copied().collect(),
            None => return Vec::new(),
        };

        let mut woken = Vec::new();
        for dependent_id in dependents {
            if let Some(dependent) = self.nodes.get_mut(&dependent_id) {
                if dependent.is_clean() && dependent.kind() == NodeKind::Effect {
                    woken.push(dependent_id);
                }
                dependent.mark_dirty();
            }
        }
        woken
    }

    /// Kahn's algorithm over the subgraph induced by `nodes`.
    fn topological_sort(&self, nodes: Vec<NodeId>) -> Vec<NodeId> {
        let members: HashSet<NodeId> = nodes.iter().copied().collect();
        let mut pending: HashMap<NodeId, usize> = nodes
            .iter()
            .filter_map(|id| {
                let node = self.nodes.get(id)?;
                let inside = node.dependencies().iter().filter(|d| members.contains(d)).count();
                Some((*id, inside))
            })
            .collect();

        let mut ready: VecDeque<NodeId> = nodes
            .iter()
            .copied()
            .filter(|id| pending.get(id) == Some(&0))
            .collect();
        let mut ordered = Vec::with_capacity(nodes.len());

        while let Some(node_id) = ready.pop_front() {
            ordered.push(node_id);
            let Some(node) = self.nodes.get(&node_id) else {
                continue;
            };
            for dependent_id in node.dependents() {
                if let Some(count) = pending.get_mut(dependent_id) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.push_back(*dependent_id);
                    }
                }
            }
        }

        ordered
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (UpdateScheduler, NodeId, NodeId, NodeId) {
        let mut scheduler = UpdateScheduler::new();
        let source_id = scheduler.add_node(Node::source());
        let derived1_id = scheduler.add_node(Node::derived());
        let derived2_id = scheduler.add_node(Node::derived());

        scheduler.add_edge(source_id, derived1_id);
        scheduler.add_edge(derived1_id, derived2_id);
        scheduler.mark_clean(derived1_id);
        scheduler.mark_clean(derived2_id);

        (scheduler, source_id, derived1_id, derived2_id)
    }

    #[test]
    fn add_and_remove_nodes() {
        let mut scheduler = UpdateScheduler::new();

        let id1 = scheduler.add_node(Node::source());
        let id2 = scheduler.add_node(Node::derived());
        scheduler.add_edge(id1, id2);

        assert_eq!(scheduler.node_count(), 2);

        assert!(scheduler.remove_node(id1).is_some());
        assert_eq!(scheduler.node_count(), 1);
        assert!(scheduler.get_node(id1).is_none());
        assert!(scheduler.dependencies_of(id2).is_empty());
    }

    #[test]
    fn add_edge_links_both_ends() {
        let mut scheduler = UpdateScheduler::new();

        let source_id = scheduler.add_node(Node::source());
        let derived_id = scheduler.add_node(Node::derived());

        scheduler.add_edge(source_id, derived_id);

        assert!(scheduler
            .get_node(source_id)
            .unwrap()
            .dependents()
            .contains(&derived_id));
        assert_eq!(scheduler.dependencies_of(derived_id), vec![source_id]);
    }

    #[test]
    fn edges_to_missing_nodes_are_ignored() {
        let mut scheduler = UpdateScheduler::new();
        let derived_id = scheduler.add_node(Node::derived());

        scheduler.add_edge(NodeId::new(), derived_id);

        assert!(scheduler.dependencies_of(derived_id).is_empty());
    }

    #[test]
    fn replace_dependencies_drops_stale_edges() {
        let mut scheduler = UpdateScheduler::new();
        let a = scheduler.add_node(Node::source());
        let b = scheduler.add_node(Node::source());
        let effect = scheduler.add_node(Node::effect());

        scheduler.replace_dependencies(effect, [a]);
        assert_eq!(scheduler.dependencies_of(effect), vec![a]);

        scheduler.replace_dependencies(effect, [b]);
        assert_eq!(scheduler.dependencies_of(effect), vec![b]);
        assert!(scheduler.get_node(a).unwrap().dependents().is_empty());
        assert!(scheduler.get_node(b).unwrap().dependents().contains(&effect));
    }

    #[test]
    fn mark_changed_propagates() {
        let (mut scheduler, source_id, derived1_id, derived2_id) = chain();

        let to_process = scheduler.mark_changed(source_id);

        assert_eq!(to_process.len(), 2);

        // They should be in topological order (derived1 before derived2)
        let pos1 = to_process.iter().position(|&id| id == derived1_id);
        let pos2 = to_process.iter().position(|&id| id == derived2_id);
        assert!(pos1 < pos2);

        // Only the direct dependent is known to be dirty
        assert_eq!(scheduler.dirty_state(derived1_id), Some(DirtyState::Dirty));
        assert_eq!(
            scheduler.dirty_state(derived2_id),
            Some(DirtyState::MaybeDirty)
        );
    }

    #[test]
    fn mark_dependents_dirty_reports_clean_effects() {
        let mut scheduler = UpdateScheduler::new();
        let derived = scheduler.add_node(Node::derived());
        let effect = scheduler.add_node(Node::effect());
        let downstream = scheduler.add_node(Node::derived());

        scheduler.add_edge(derived, effect);
        scheduler.add_edge(derived, downstream);
        scheduler.mark_clean(effect);

        let woken = scheduler.mark_dependents_dirty(derived);

        assert_eq!(woken, vec![effect]);
        assert_eq!(scheduler.dirty_state(effect), Some(DirtyState::Dirty));
        assert_eq!(scheduler.dirty_state(downstream), Some(DirtyState::Dirty));
    }
}
