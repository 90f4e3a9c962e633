//! Node graph data structures and operations

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::node::{Node, NodeId};
use super::port::LinkId;
use crate::error::{ConversionError, GraphError};
use crate::settings::WidgetSettings;
use crate::widgets::convert;

/// A connection from an output slot to a named input socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub from_node: NodeId,
    pub from_slot: usize,
    pub to_node: NodeId,
    /// Inputs are addressed by name so links survive socket reordering
    pub to_input: String,
    #[serde(rename = "type")]
    pub link_type: String,
}

/// A graph containing nodes and their links
#[derive(Debug)]
pub struct NodeGraph {
    pub nodes: HashMap<NodeId, Node>,
    pub links: BTreeMap<LinkId, Link>,
    next_node_id: NodeId,
    next_link_id: LinkId,
    version: u64,
    dirty_foreground: bool,
    dirty_background: bool,
}

impl NodeGraph {
    /// Creates a new empty node graph
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            links: BTreeMap::new(),
            next_node_id: 0,
            next_link_id: 0,
            version: 0,
            dirty_foreground: false,
            dirty_background: false,
        }
    }

    /// Adds a node to the graph and returns its ID
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.next_node_id;
        node.id = id;
        self.nodes.insert(id, node);
        self.next_node_id += 1;
        self.bump_version();
        id
    }

    /// Removes a node and all its links.
    ///
    /// Type-level teardown runs through `NodeTypeRegistry::remove_node`.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let attached: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| link.from_node == node_id || link.to_node == node_id)
            .map(|link| link.id)
            .collect();
        for link_id in attached {
            self.disconnect(link_id);
        }

        let node = self.nodes.remove(&node_id)?;
        self.bump_version();
        Some(node)
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Link output `from_slot` of `from_node` into input `to_input` of `to_node`.
    ///
    /// An existing link on the input is replaced.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_slot: usize,
        to_node: NodeId,
        to_input: &str,
    ) -> Result<LinkId, GraphError> {
        if from_node == to_node {
            return Err(GraphError::SelfLink(from_node));
        }

        let source = self.nodes.get(&from_node).ok_or(GraphError::MissingNode(from_node))?;
        let output = source.outputs.get(from_slot).ok_or_else(|| GraphError::MissingSlot {
            node: from_node,
            direction: "output",
            slot: from_slot.to_string(),
        })?;
        let link_type = output.link_type.clone();

        let target = self.nodes.get(&to_node).ok_or(GraphError::MissingNode(to_node))?;
        let input = target.input(to_input).ok_or_else(|| GraphError::MissingSlot {
            node: to_node,
            direction: "input",
            slot: to_input.to_string(),
        })?;
        if !input.accepts(&link_type) {
            return Err(GraphError::IncompatibleTypes {
                from: link_type,
                to: input.link_type.clone(),
            });
        }

        if let Some(previous) = input.link {
            self.disconnect(previous);
        }

        let id = self.next_link_id;
        self.next_link_id += 1;

        if let Some(input) = self
            .nodes
            .get_mut(&to_node)
            .and_then(|node| node.inputs.iter_mut().find(|i| i.name == to_input))
        {
            input.link = Some(id);
        }
        if let Some(output) = self
            .nodes
            .get_mut(&from_node)
            .and_then(|node| node.outputs.get_mut(from_slot))
        {
            output.links.push(id);
        }

        self.links.insert(
            id,
            Link {
                id,
                from_node,
                from_slot,
                to_node,
                to_input: to_input.to_string(),
                link_type,
            },
        );
        debug!("Linked {}[{}] -> {}.{}", from_node, from_slot, to_node, to_input);
        self.bump_version();
        Ok(id)
    }

    /// Removes a link, clearing both of its endpoints
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.remove(&link_id)?;

        if let Some(input) = self
            .nodes
            .get_mut(&link.to_node)
            .and_then(|node| node.inputs.iter_mut().find(|i| i.link == Some(link_id)))
        {
            input.link = None;
        }
        if let Some(output) = self
            .nodes
            .get_mut(&link.from_node)
            .and_then(|node| node.outputs.get_mut(link.from_slot))
        {
            output.links.retain(|id| *id != link_id);
        }

        self.bump_version();
        Some(link)
    }

    /// Removes whatever link feeds the named input
    pub fn disconnect_input(&mut self, node_id: NodeId, input: &str) -> Option<Link> {
        let link_id = self.nodes.get(&node_id)?.input(input)?.link?;
        self.disconnect(link_id)
    }

    /// Change counter, bumped on every structural or value change
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Request a redraw of the foreground and/or background canvas layers
    pub fn set_dirty_canvas(&mut self, foreground: bool, background: bool) {
        self.dirty_foreground |= foreground;
        self.dirty_background |= background;
    }

    /// Pending redraw requests as `(foreground, background)`
    pub fn dirty_canvas(&self) -> (bool, bool) {
        (self.dirty_foreground, self.dirty_background)
    }

    /// Clear redraw requests after a frame was painted
    pub fn clear_dirty_canvas(&mut self) {
        self.dirty_foreground = false;
        self.dirty_background = false;
    }

    /// Dependency order of the nodes in this graph.
    ///
    /// Kahn's algorithm; among nodes that are ready at the same time the
    /// lowest id goes first, so the order is stable across runs.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut in_degree: HashMap<NodeId, usize> = self.nodes.keys().map(|id| (*id, 0)).collect();
        let mut adj_list: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for link in self.links.values() {
            if !self.nodes.contains_key(&link.from_node) {
                continue;
            }
            if let Some(degree) = in_degree.get_mut(&link.to_node) {
                *degree += 1;
                adj_list.entry(link.from_node).or_default().push(link.to_node);
            }
        }

        let mut ready: BinaryHeap<Reverse<NodeId>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| Reverse(*id))
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(Reverse(node_id)) = ready.pop() {
            result.push(node_id);

            for neighbor in adj_list.get(&node_id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(*neighbor));
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            warn!("Cycle detected in node graph");
            return Err(GraphError::Cycle);
        }
        Ok(result)
    }

    /// Converts a widget back from its input socket, dropping the socket's link first.
    ///
    /// The node-level checks run before the link is touched, so a failed call
    /// leaves both the node and its link as they were.
    pub fn convert_to_widget(
        &mut self,
        node_id: NodeId,
        name: &str,
        settings: &WidgetSettings,
    ) -> Result<(), ConversionError> {
        let node = self.nodes.get(&node_id).ok_or(ConversionError::MissingNode(node_id))?;
        let plan = convert::plan_restore(node, name)?;
        let link = node.inputs[plan.socket].link;

        if let Some(link) = link {
            self.disconnect(link);
        }
        let node = self.node_mut_or_missing(node_id)?;
        convert::apply_restore(node, name, plan, settings);
        self.bump_version();
        Ok(())
    }

    fn node_mut_or_missing(&mut self, node_id: NodeId) -> Result<&mut Node, ConversionError> {
        self.nodes.get_mut(&node_id).ok_or(ConversionError::MissingNode(node_id))
    }

    /// Build the execution prompt.
    ///
    /// One entry per enabled node in execution order, keyed by node id (inner
    /// nodes of a context as `outer:inner`), holding the node's class and its
    /// inputs: gated widget values plus `[source, slot]` pairs for links.
    /// Links whose source is not part of the prompt are left out.
    pub fn to_prompt(&self) -> Result<Map<String, Value>, GraphError> {
        let entries: Vec<(Option<NodeId>, &Node)> = self.ordered_nodes(true)?.with_parents().collect();
        let keys: Vec<String> = entries
            .iter()
            .map(|(parent, node)| prompt_key(*parent, node.id))
            .collect();

        let mut prompt = Map::new();
        for ((parent, node), key) in entries.iter().zip(&keys) {
            let graph = match parent {
                Some(outer) => self.nodes.get(outer).and_then(Node::internal_graph),
                None => Some(self),
            };

            let mut inputs = node.widget_inputs();
            for socket in &node.inputs {
                let Some(link) = socket.link.and_then(|id| graph.and_then(|g| g.links.get(&id))) else {
                    continue;
                };
                let source = prompt_key(*parent, link.from_node);
                if keys.contains(&source) {
                    inputs.insert(socket.name.clone(), json!([source, link.from_slot]));
                } else {
                    debug!("Dropping link into {}.{}: source {} is disabled", key, socket.name, source);
                }
            }

            prompt.insert(
                key.clone(),
                json!({
                    "class_type": node.type_name,
                    "inputs": inputs,
                }),
            );
        }
        Ok(prompt)
    }
}

fn prompt_key(parent: Option<NodeId>, node: NodeId) -> String {
    match parent {
        Some(outer) => format!("{}:{}", outer, node),
        None => node.to_string(),
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::port::{InputSocket, OutputSocket};
    use crate::widgets::builtin::ValueWidget;
    use crate::widgets::Widget;
    use egui::Pos2;
    use serde_json::json;

    fn source() -> Node {
        let mut node = Node::new(0, "Source", Pos2::ZERO);
        node.add_output(OutputSocket::new("value", "INT"));
        node
    }

    fn sink() -> Node {
        let mut node = Node::new(0, "Sink", Pos2::ZERO);
        node.add_input(InputSocket::new("value", "INT"));
        node.add_output(OutputSocket::new("value", "INT"));
        node
    }

    #[test]
    fn test_connect_sets_both_endpoints() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(source());
        let b = graph.add_node(sink());

        let link = graph.connect(a, 0, b, "value").unwrap();
        assert_eq!(graph.nodes[&b].inputs[0].link, Some(link));
        assert_eq!(graph.nodes[&a].outputs[0].links, vec![link]);

        graph.disconnect(link);
        assert!(!graph.nodes[&b].inputs[0].is_connected());
        assert!(graph.nodes[&a].outputs[0].links.is_empty());
    }

    #[test]
    fn test_connect_rejects_bad_links() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(source());
        let mut float_sink = Node::new(0, "FloatSink", Pos2::ZERO);
        float_sink.add_input(InputSocket::new("value", "FLOAT"));
        let b = graph.add_node(float_sink);

        assert_eq!(graph.connect(a, 0, a, "value"), Err(GraphError::SelfLink(a)));
        assert_eq!(graph.connect(a, 0, 99, "value"), Err(GraphError::MissingNode(99)));
        assert!(matches!(
            graph.connect(a, 0, b, "value"),
            Err(GraphError::IncompatibleTypes { .. })
        ));
        assert!(matches!(
            graph.connect(a, 3, b, "value"),
            Err(GraphError::MissingSlot { direction: "output", .. })
        ));
    }

    #[test]
    fn test_execution_order_follows_links_then_ids() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(sink());
        let b = graph.add_node(source());
        let c = graph.add_node(sink());
        graph.connect(b, 0, a, "value").unwrap();
        graph.connect(a, 0, c, "value").unwrap();

        assert_eq!(graph.execution_order().unwrap(), vec![b, a, c]);
    }

    #[test]
    fn test_execution_order_detects_cycles() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(sink());
        let b = graph.add_node(sink());
        graph.connect(a, 0, b, "value").unwrap();
        graph.connect(b, 0, a, "value").unwrap();

        assert_eq!(graph.execution_order(), Err(GraphError::Cycle));
    }

    #[test]
    fn test_remove_node_drops_links() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(source());
        let b = graph.add_node(sink());
        graph.connect(a, 0, b, "value").unwrap();

        assert!(graph.remove_node(a).is_some());
        assert!(graph.links.is_empty());
        assert!(!graph.nodes[&b].inputs[0].is_connected());
    }

    #[test]
    fn test_dirty_canvas_accumulates() {
        let mut graph = NodeGraph::new();
        graph.set_dirty_canvas(true, false);
        graph.set_dirty_canvas(false, true);
        assert_eq!(graph.dirty_canvas(), (true, true));
        graph.clear_dirty_canvas();
        assert_eq!(graph.dirty_canvas(), (false, false));
    }

    #[test]
    fn test_prompt_uses_links_and_widget_values() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(source());
        let mut target = sink();
        target.add_widget(Widget::new("scale", "FLOAT", json!(1.5), ValueWidget));
        let b = graph.add_node(target);
        graph.connect(a, 0, b, "value").unwrap();

        let prompt = graph.to_prompt().unwrap();
        assert_eq!(
            prompt[&b.to_string()],
            json!({
                "class_type": "Sink",
                "inputs": {"scale": 1.5, "value": [a.to_string(), 0]},
            })
        );
    }

    #[test]
    fn test_graph_convert_to_widget_disconnects_first() {
        let settings = WidgetSettings::default();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(source());
        let mut target = Node::new(0, "Target", Pos2::ZERO);
        target.add_widget(Widget::new("steps", "INT", json!(20), ValueWidget));
        let b = graph.add_node(target);

        convert::convert_to_input(graph.node_mut(b).unwrap(), "steps", &json!(["INT", {}]), &settings)
            .unwrap();
        let link = graph.connect(a, 0, b, "steps").unwrap();

        graph.convert_to_widget(b, "steps", &settings).unwrap();
        assert!(!graph.links.contains_key(&link));
        assert!(graph.nodes[&a].outputs[0].links.is_empty());
        assert!(graph.nodes[&b].inputs.is_empty());
        assert!(graph.nodes[&b].widgets[0].is_active());
    }

    #[test]
    fn test_graph_convert_to_widget_keeps_link_on_failure() {
        let settings = WidgetSettings::default();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(source());
        let mut target = Node::new(0, "Target", Pos2::ZERO);
        target.add_widget(Widget::new("steps", "INT", json!(20), ValueWidget));
        let b = graph.add_node(target);

        convert::convert_to_input(graph.node_mut(b).unwrap(), "steps", &json!(["INT", {}]), &settings)
            .unwrap();
        let link = graph.connect(a, 0, b, "steps").unwrap();
        graph.node_mut(b).unwrap().widgets[0]
            .linked_widgets
            .push("missing".to_string());
        let version = graph.version();

        assert_eq!(
            graph.convert_to_widget(b, "steps", &settings),
            Err(ConversionError::MissingWidget {
                node: b,
                name: "missing".to_string(),
            })
        );
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.nodes[&b].inputs[0].link, Some(link));
        assert_eq!(graph.nodes[&a].outputs[0].links, vec![link]);
        assert!(graph.nodes[&b].widgets[0].is_converted());
        assert_eq!(graph.version(), version);
    }
}
