//! Extension registry and the custom widget factories extensions supply

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use egui::Vec2;
use log::info;
use serde_json::Value;

use crate::error::RegistryError;
use crate::nodes::{Node, NodeTypeDef};
use crate::settings::WidgetSettings;
use crate::widgets::Widget;

/// Widget built by a custom factory, with the node area it needs
pub struct WidgetCreation {
    pub widget: Widget,
    pub min_size: Vec2,
}

/// Builds a widget for input `name` of `node` from its declared config
pub type CustomWidgetFactory =
    Arc<dyn Fn(&Node, &str, &Value, &WidgetSettings) -> WidgetCreation + Send + Sync>;

/// A bundle of custom widgets and node type augmentations
pub trait Extension: Send + Sync {
    /// Unique extension name
    fn name(&self) -> &str;

    /// Widget factories keyed by the kind tag they build
    fn custom_widgets(&self) -> Vec<(String, CustomWidgetFactory)> {
        Vec::new()
    }

    /// Called for every node type before it is registered
    fn before_register_node_def(&self, _node_type: &mut NodeTypeDef) {}
}

struct RegisteredWidget {
    extension: String,
    factory: CustomWidgetFactory,
}

/// Registered extensions and the widget kinds they own
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn Extension>>,
    widgets: BTreeMap<String, RegisteredWidget>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension.
    ///
    /// Fails without registering anything when the name is taken or one of
    /// its widget kinds is already supplied by another extension.
    pub fn register(&mut self, extension: impl Extension + 'static) -> Result<(), RegistryError> {
        let name = extension.name().to_string();
        if self.extensions.iter().any(|e| e.name() == name) {
            return Err(RegistryError::DuplicateExtension(name));
        }

        let widgets = extension.custom_widgets();
        for (kind, _) in &widgets {
            if let Some(existing) = self.widgets.get(kind) {
                return Err(RegistryError::DuplicateWidgetKind {
                    kind: kind.clone(),
                    extension: name,
                    owner: existing.extension.clone(),
                });
            }
        }

        for (kind, factory) in widgets {
            self.widgets.insert(
                kind,
                RegisteredWidget {
                    extension: name.clone(),
                    factory,
                },
            );
        }
        info!("Registered extension {}", name);
        self.extensions.push(Arc::new(extension));
        Ok(())
    }

    /// Factory for a custom widget kind
    pub fn widget_factory(&self, kind: &str) -> Option<&CustomWidgetFactory> {
        self.widgets.get(kind).map(|w| &w.factory)
    }

    pub fn is_custom_kind(&self, kind: &str) -> bool {
        self.widgets.contains_key(kind)
    }

    /// Custom widget kinds in sorted order
    pub fn custom_kinds(&self) -> impl Iterator<Item = &str> {
        self.widgets.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.iter().find(|e| e.name() == name)
    }

    /// Extensions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Extension>> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>())
            .field("widgets", &self.widgets.keys().collect::<Vec<_>>())
            .finish()
    }
}
