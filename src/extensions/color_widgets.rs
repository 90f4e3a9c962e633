//! The `nodle.widgets` extension: COLOR widgets and conversion menus

use std::sync::Arc;

use log::debug;
use serde_json::{json, Value};

use super::registry::{CustomWidgetFactory, Extension, WidgetCreation};
use crate::constants::color::KIND;
use crate::nodes::definition::NodeInputs;
use crate::nodes::hooks::{add_menu_handler, extend_prototype, LifecycleHook};
use crate::nodes::menu::{MenuAction, MenuItem};
use crate::nodes::{Node, NodeTypeDef};
use crate::settings::WidgetSettings;
use crate::widgets::{cleanup_node, ColorWidget};

/// Name the extension registers under
pub const EXTENSION_NAME: &str = "nodle.widgets";

/// Supplies the COLOR widget and augments node types that declare one
#[derive(Debug, Clone)]
pub struct ColorWidgetsExtension {
    settings: WidgetSettings,
    kinds: Vec<String>,
}

impl ColorWidgetsExtension {
    pub fn new(settings: WidgetSettings) -> Self {
        Self {
            settings,
            kinds: vec![KIND.to_string()],
        }
    }

    /// Widget kinds this extension owns
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    fn is_custom(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }
}

impl Default for ColorWidgetsExtension {
    fn default() -> Self {
        Self::new(WidgetSettings::default())
    }
}

/// Factory for `COLOR` inputs.
///
/// Starts from the declared default, falling back to the configured default
/// color when none (or an empty one) is declared.
pub fn create_color_widget(
    _node: &Node,
    name: &str,
    config: &Value,
    settings: &WidgetSettings,
) -> WidgetCreation {
    debug!("Creating color widget `{}`", name);
    let value = config
        .get(1)
        .and_then(|options| options.get("default"))
        .filter(|default| !default.is_null() && default.as_str() != Some(""))
        .cloned()
        .unwrap_or_else(|| Value::String(settings.default_color.clone()));

    WidgetCreation {
        widget: ColorWidget::create(name, value, settings),
        min_size: settings.color_min_size(),
    }
}

/// Conversion entries for the custom-kind widgets of `node`.
///
/// Active widgets offer `Convert {name} to input`, with the config taken
/// from the declared inputs or built from the widget itself. Converted ones
/// offer the way back. A separator follows each non-empty group.
pub fn conversion_menu(node: &Node, inputs: &NodeInputs, kinds: &[String]) -> Vec<MenuItem> {
    let mut to_input = Vec::new();
    let mut to_widget = Vec::new();

    for widget in node.widgets.iter().filter(|w| kinds.contains(&w.kind)) {
        if widget.is_converted() {
            to_widget.push(MenuItem::entry(
                format!("Convert {} to widget", widget.name),
                MenuAction::ConvertToWidget {
                    widget: widget.name.clone(),
                },
            ));
        } else if widget.is_active() {
            let config = inputs
                .required
                .get(&widget.name)
                .or_else(|| inputs.optional.get(&widget.name))
                .cloned()
                .unwrap_or_else(|| {
                    let options = if widget.options.is_null() {
                        json!({})
                    } else {
                        widget.options.clone()
                    };
                    json!([widget.kind, options])
                });
            to_input.push(MenuItem::entry(
                format!("Convert {} to input", widget.name),
                MenuAction::ConvertToInput {
                    widget: widget.name.clone(),
                    config,
                },
            ));
        }
    }

    let mut items = Vec::new();
    for group in [to_input, to_widget] {
        if !group.is_empty() {
            items.extend(group);
            items.push(MenuItem::Separator);
        }
    }
    items
}

impl Extension for ColorWidgetsExtension {
    fn name(&self) -> &str {
        EXTENSION_NAME
    }

    fn custom_widgets(&self) -> Vec<(String, CustomWidgetFactory)> {
        let factory: CustomWidgetFactory = Arc::new(create_color_widget);
        vec![(KIND.to_string(), factory)]
    }

    fn before_register_node_def(&self, node_type: &mut NodeTypeDef) {
        if !node_type.def.required_kinds().any(|kind| self.is_custom(kind)) {
            return;
        }
        debug!("Adding color widget hooks to {}", node_type.def.name);

        let settings = self.settings.clone();
        extend_prototype(Some(&mut *node_type), LifecycleHook::NodeCreated, move |node| {
            node.serialize_widgets = true;
            let size = node.compute_size(&settings);
            node.set_size(size);
        });
        extend_prototype(Some(&mut *node_type), LifecycleHook::Removed, cleanup_node);

        let inputs = node_type.def.input.clone();
        let kinds = self.kinds.clone();
        add_menu_handler(Some(node_type), move |node| conversion_menu(node, &inputs, &kinds));
    }
}
