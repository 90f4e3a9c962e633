//! Context menu items contributed by node type hooks

use log::debug;
use serde_json::Value;

use super::node::Node;
use crate::error::ConversionError;
use crate::settings::WidgetSettings;
use crate::widgets;

/// What a menu entry does when picked
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    /// Replace the widget with an input socket built from `config`
    ConvertToInput { widget: String, config: Value },
    /// Bring a converted widget back
    ConvertToWidget { widget: String },
    /// Host-defined command
    Command(String),
}

/// One row of a node's context menu
#[derive(Debug, Clone, PartialEq)]
pub enum MenuItem {
    Entry { content: String, action: MenuAction },
    Separator,
}

impl MenuItem {
    pub fn entry(content: impl Into<String>, action: MenuAction) -> Self {
        MenuItem::Entry {
            content: content.into(),
            action,
        }
    }

    /// Label of an entry; separators have none
    pub fn label(&self) -> Option<&str> {
        match self {
            MenuItem::Entry { content, .. } => Some(content),
            MenuItem::Separator => None,
        }
    }

    pub fn action(&self) -> Option<&MenuAction> {
        match self {
            MenuItem::Entry { action, .. } => Some(action),
            MenuItem::Separator => None,
        }
    }
}

impl Node {
    /// Apply a conversion picked from the context menu.
    ///
    /// Returns `Ok(false)` for host commands, which the node does not handle.
    /// Converting a linked input back should go through
    /// `NodeGraph::convert_to_widget` so the link is dropped as well.
    pub fn apply_menu_action(
        &mut self,
        action: &MenuAction,
        settings: &WidgetSettings,
    ) -> Result<bool, ConversionError> {
        match action {
            MenuAction::ConvertToInput { widget, config } => {
                widgets::convert_to_input(self, widget, config, settings)?;
                Ok(true)
            }
            MenuAction::ConvertToWidget { widget } => {
                widgets::convert_to_widget(self, widget, settings)?;
                Ok(true)
            }
            MenuAction::Command(command) => {
                debug!("Menu command `{}` left to the host", command);
                Ok(false)
            }
        }
    }
}
