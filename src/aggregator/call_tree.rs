//! Arena-backed call tree.
//!
//! Each node is one call path by function identity: entering the same
//! function again from the same position lands in the same node. Nodes
//! live in a `Vec` and refer to each other by index; a node stores its
//! parent's index and an ordered map from callee to child index.

use crate::parser::{CallTreePath, FunctionSite};
use std::collections::BTreeMap;

/// Index of a node in a [`CallTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
pub struct CallTreeNode {
    pub self_ticks: u64,
    pub call_count: u64,
    parent: Option<NodeId>,
    children: BTreeMap<FunctionSite, NodeId>,
}

impl CallTreeNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = (&FunctionSite, NodeId)> + '_ {
        self.children.iter().map(|(site, id)| (site, *id))
    }
}

#[derive(Debug, Clone)]
pub struct CallTree {
    nodes: Vec<CallTreeNode>,
}

impl Default for CallTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CallTree {
    /// A tree holding only the root ("outside any function")
    pub fn new() -> Self {
        Self {
            nodes: vec![CallTreeNode::default()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &CallTreeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CallTreeNode {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn child(&self, id: NodeId, site: &FunctionSite) -> Option<NodeId> {
        self.nodes[id.0].children.get(site).copied()
    }

    /// Child of `parent` for `site`, created on first use
    pub fn child_or_insert(&mut self, parent: NodeId, site: &FunctionSite) -> NodeId {
        if let Some(existing) = self.child(parent, site) {
            return existing;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(CallTreeNode {
            parent: Some(parent),
            ..Default::default()
        });
        self.nodes[parent.0].children.insert(site.clone(), id);
        id
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth-first flattening into (path from root, self ticks) entries,
    /// root first with an empty path, children in `FunctionSite` order.
    /// Iterative: deeply recursive traces make very deep trees.
    pub fn flatten(&self) -> Vec<CallTreePath> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut path: Vec<FunctionSite> = Vec::new();
        let mut pending: Vec<(NodeId, Option<&FunctionSite>, usize)> = vec![(self.root(), None, 0)];

        while let Some((id, site, depth)) = pending.pop() {
            path.truncate(depth);
            if let Some(site) = site {
                path.push(site.clone());
            }

            let node = self.node(id);
            out.push(CallTreePath {
                path: path.clone(),
                runtime: node.self_ticks,
                calls: node.call_count,
            });

            for (child_site, child) in node.children.iter().rev() {
                pending.push((*child, Some(child_site), path.len()));
            }
        }

        out
    }
}
