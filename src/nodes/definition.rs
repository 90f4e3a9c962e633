//! Node type definitions and the registry that instantiates them
//!
//! A [`NodeDef`] is the declared schema of a node type as the backend reports
//! it. Registering one wraps it in a [`NodeTypeDef`] that extensions augment
//! with hooks; nodes are then created from the definition's inputs.

use std::collections::BTreeMap;

use egui::{Pos2, Vec2};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::NodeGraph;
use super::hooks::NodeTypeHooks;
use super::menu::MenuItem;
use super::node::{Node, NodeId};
use super::port::{InputSocket, OutputSocket, ANY_TYPE};
use crate::error::RegistryError;
use crate::extensions::ExtensionRegistry;
use crate::settings::WidgetSettings;
use crate::widgets::builtin;

/// Declared inputs, keyed by parameter name in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInputs {
    #[serde(default)]
    pub required: Map<String, Value>,
    #[serde(default)]
    pub optional: Map<String, Value>,
}

/// Schema of a node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input: NodeInputs,
    /// Output link types
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(default)]
    pub output_name: Vec<String>,
}

impl NodeDef {
    /// An empty definition with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_required(mut self, name: impl Into<String>, config: Value) -> Self {
        self.input.required.insert(name.into(), config);
        self
    }

    pub fn with_optional(mut self, name: impl Into<String>, config: Value) -> Self {
        self.input.optional.insert(name.into(), config);
        self
    }

    pub fn with_output(mut self, link_type: impl Into<String>, name: impl Into<String>) -> Self {
        self.output.push(link_type.into());
        self.output_name.push(name.into());
        self
    }

    /// Parse a map of definitions keyed by type name
    pub fn parse_object_info(json: &str) -> Result<Vec<NodeDef>, serde_json::Error> {
        let defs: BTreeMap<String, NodeDef> = serde_json::from_str(json)?;
        Ok(defs.into_values().collect())
    }

    /// Declared config of an input, required declarations first
    pub fn declared_config(&self, name: &str) -> Option<&Value> {
        self.input
            .required
            .get(name)
            .or_else(|| self.input.optional.get(name))
    }

    /// Declared kinds of the required inputs
    pub fn required_kinds(&self) -> impl Iterator<Item = &str> {
        self.input
            .required
            .values()
            .filter_map(|config| config.get(0).and_then(Value::as_str))
    }

    /// Title shown on nodes of this type
    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// A registered node type: its schema plus the hooks extensions attached
#[derive(Debug)]
pub struct NodeTypeDef {
    pub def: NodeDef,
    pub hooks: NodeTypeHooks,
}

impl NodeTypeDef {
    pub fn new(def: NodeDef) -> Self {
        Self {
            def,
            hooks: NodeTypeHooks::default(),
        }
    }
}

/// Registry of node types, instantiating nodes through the extensions
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    types: BTreeMap<String, NodeTypeDef>,
    extensions: ExtensionRegistry,
}

impl NodeTypeRegistry {
    pub fn new(extensions: ExtensionRegistry) -> Self {
        Self {
            types: BTreeMap::new(),
            extensions,
        }
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Register a node type, letting every extension augment it first
    pub fn register(&mut self, def: NodeDef) -> Result<&mut NodeTypeDef, RegistryError> {
        if self.types.contains_key(&def.name) {
            return Err(RegistryError::DuplicateNodeType(def.name));
        }

        let name = def.name.clone();
        let mut type_def = NodeTypeDef::new(def);
        for extension in self.extensions.iter() {
            extension.before_register_node_def(&mut type_def);
        }
        debug!("Registered node type {}", name);
        Ok(self.types.entry(name).or_insert(type_def))
    }

    /// Register every definition, stopping at the first duplicate
    pub fn register_all(&mut self, defs: impl IntoIterator<Item = NodeDef>) -> Result<usize, RegistryError> {
        let mut count = 0;
        for def in defs {
            self.register(def)?;
            count += 1;
        }
        info!("Registered {} node types", count);
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&NodeTypeDef> {
        self.types.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NodeTypeDef> {
        self.types.get_mut(name)
    }

    /// Registered type names in sorted order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Create a node by type name.
    ///
    /// Inputs with a widget kind become widgets (custom kinds through their
    /// extension factory), every other input becomes a socket. The type's
    /// `on_node_created` chain runs last.
    pub fn create_node(&self, type_name: &str, position: Pos2, settings: &WidgetSettings) -> Option<Node> {
        let Some(type_def) = self.types.get(type_name) else {
            warn!("Unknown node type: {}", type_name);
            return None;
        };
        let def = &type_def.def;

        let mut node = Node::new(0, type_name, position);
        node.title = def.title().to_string();

        let declared = def.input.required.iter().chain(&def.input.optional);
        for (name, config) in declared {
            let kind = config.get(0);
            if let Some(factory) = kind.and_then(Value::as_str).and_then(|k| self.extensions.widget_factory(k)) {
                let creation = factory(&node, name, config, settings);
                node.min_size = node.min_size.max(creation.min_size);
                node.add_widget(creation.widget);
            } else if let Some(widgets) = builtin::create_widgets(name, config) {
                for widget in widgets {
                    node.add_widget(widget);
                }
            } else {
                let link_type = kind.and_then(Value::as_str).unwrap_or(ANY_TYPE);
                node.add_input(InputSocket::new(name.clone(), link_type));
            }
        }

        for (index, link_type) in def.output.iter().enumerate() {
            let name = def.output_name.get(index).unwrap_or(link_type);
            node.add_output(OutputSocket::new(name.clone(), link_type.clone()));
        }

        node.set_size(node.compute_size(settings).max(Vec2::new(settings.min_node_width, 0.0)));
        node.layout_widgets(settings);
        type_def.hooks.on_node_created.call(&mut node);
        Some(node)
    }

    /// Remove a node from `graph`, running its type's `on_removed` chain
    pub fn remove_node(&self, graph: &mut NodeGraph, node_id: NodeId) -> Option<Node> {
        let mut node = graph.remove_node(node_id)?;
        match self.types.get(&node.type_name) {
            Some(type_def) => {
                type_def.hooks.on_removed.call(&mut node);
            }
            None => debug!("Removed node {} of unregistered type {}", node_id, node.type_name),
        }
        Some(node)
    }

    /// Context menu entries the node's type contributes
    pub fn menu_options(&self, node: &Node) -> Vec<MenuItem> {
        self.types
            .get(&node.type_name)
            .map(|type_def| type_def.hooks.extra_menu_options.options(node))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::hooks::{extend_prototype, LifecycleHook};
    use serde_json::json;

    fn sampler() -> NodeDef {
        NodeDef::named("KSampler")
            .with_required("model", json!(["MODEL"]))
            .with_required("seed", json!(["INT", {"default": 0, "min": 0, "control_after_generate": true}]))
            .with_required("sampler", json!([["euler", "ddim"]]))
            .with_optional("denoise", json!(["FLOAT", {"default": 1.0}]))
            .with_output("LATENT", "latent")
    }

    #[test]
    fn test_object_info_parses() {
        let json = r#"{
            "Invert": {
                "name": "Invert",
                "display_name": "Invert Color",
                "category": "utils/color",
                "input": {"required": {"color": ["COLOR"]}},
                "output": ["COLOR"],
                "output_name": ["color"]
            }
        }"#;
        let defs = NodeDef::parse_object_info(json).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].title(), "Invert Color");
        assert_eq!(defs[0].required_kinds().collect::<Vec<_>>(), vec!["COLOR"]);
        assert!(defs[0].input.optional.is_empty());
    }

    #[test]
    fn test_duplicate_node_type_rejected() {
        let mut registry = NodeTypeRegistry::default();
        registry.register(sampler()).unwrap();
        assert_eq!(
            registry.register(sampler()).err(),
            Some(RegistryError::DuplicateNodeType("KSampler".to_string()))
        );
    }

    #[test]
    fn test_create_node_builds_widgets_and_sockets() {
        let settings = WidgetSettings::default();
        let mut registry = NodeTypeRegistry::default();
        registry.register(sampler()).unwrap();

        let node = registry.create_node("KSampler", Pos2::ZERO, &settings).unwrap();
        let names: Vec<&str> = node.widgets.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["seed", "control_after_generate", "sampler", "denoise"]);
        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.inputs[0].link_type, "MODEL");
        assert_eq!(node.outputs[0].name, "latent");
        assert_eq!(node.widget("seed").unwrap().linked_widgets, vec!["control_after_generate"]);
        assert!(node.size.y >= node.compute_size(&settings).y);
    }

    #[test]
    fn test_created_and_removed_chains_run() {
        let settings = WidgetSettings::default();
        let mut registry = NodeTypeRegistry::default();
        registry.register(sampler()).unwrap();
        extend_prototype(registry.get_mut("KSampler"), LifecycleHook::NodeCreated, |node| {
            node.serialize_widgets = true;
        });
        extend_prototype(registry.get_mut("KSampler"), LifecycleHook::Removed, |node| {
            node.title = "removed".to_string();
        });

        let node = registry.create_node("KSampler", Pos2::ZERO, &settings).unwrap();
        assert!(node.serialize_widgets);

        let mut graph = NodeGraph::new();
        let id = graph.add_node(node);
        let removed = registry.remove_node(&mut graph, id).unwrap();
        assert_eq!(removed.title, "removed");
        assert!(graph.nodes.is_empty());
    }

    #[test]
    fn test_unknown_type_yields_none() {
        let registry = NodeTypeRegistry::default();
        assert!(registry.create_node("Missing", Pos2::ZERO, &WidgetSettings::default()).is_none());
    }
}
