//! Flattened, dependency-ordered node traversal

use std::vec;

use super::graph::NodeGraph;
use super::node::{Node, NodeId};
use crate::error::GraphError;

/// One-pass iterator over nodes in execution order.
///
/// Context nodes are replaced by the nodes of their inner graph.
#[derive(Debug)]
pub struct OrderedNodes<'a> {
    entries: vec::IntoIter<(Option<NodeId>, &'a Node)>,
}

impl<'a> OrderedNodes<'a> {
    /// Yield each node together with the context node containing it
    pub fn with_parents(self) -> impl Iterator<Item = (Option<NodeId>, &'a Node)> {
        self.entries
    }
}

impl<'a> Iterator for OrderedNodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(_, node)| node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for OrderedNodes<'_> {}

impl NodeGraph {
    /// Nodes in dependency-safe order, context nodes expanded in place.
    ///
    /// With `skip_disabled`, muted and bypassed nodes are left out at both
    /// levels and a disabled context node is not expanded at all.
    pub fn ordered_nodes(&self, skip_disabled: bool) -> Result<OrderedNodes<'_>, GraphError> {
        let mut entries = Vec::with_capacity(self.nodes.len());

        for outer_id in self.execution_order()? {
            let outer = self.nodes.get(&outer_id).ok_or(GraphError::MissingNode(outer_id))?;
            if skip_disabled && outer.mode.is_disabled() {
                continue;
            }

            let Some(inner_graph) = outer.internal_graph() else {
                entries.push((None, outer));
                continue;
            };

            for inner_id in inner_graph.execution_order()? {
                let inner = inner_graph
                    .nodes
                    .get(&inner_id)
                    .ok_or(GraphError::MissingNode(inner_id))?;
                if skip_disabled && inner.mode.is_disabled() {
                    continue;
                }
                entries.push((Some(outer_id), inner));
            }
        }

        Ok(OrderedNodes {
            entries: entries.into_iter(),
        })
    }
}
