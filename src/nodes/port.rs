//! Input and output sockets for node connections

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a link between two sockets
pub type LinkId = usize;

/// Link type that accepts any other type
pub const ANY_TYPE: &str = "*";

/// Back-reference from a socket to the widget it replaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRef {
    /// Name of the converted widget
    pub name: String,
    /// Declared config needed to rebuild the widget, e.g. `["INT", {"min": 0}]`
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

/// A connectable, typed input terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSocket {
    pub name: String,
    /// Type string used for link compatibility
    #[serde(rename = "type")]
    pub link_type: String,
    /// Incoming link, if connected
    pub link: Option<LinkId>,
    /// Present while this socket stands in for a converted widget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetRef>,
}

impl InputSocket {
    /// Creates a plain, unconnected input
    pub fn new(name: impl Into<String>, link_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link_type: link_type.into(),
            link: None,
            widget: None,
        }
    }

    /// Creates an input standing in for a converted widget
    pub fn for_widget(name: impl Into<String>, link_type: impl Into<String>, config: Value) -> Self {
        let name = name.into();
        Self {
            widget: Some(WidgetRef {
                name: name.clone(),
                config,
            }),
            ..Self::new(name, link_type)
        }
    }

    /// Checks if a link is attached
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Name of the widget this socket replaces, if any
    pub fn widget_name(&self) -> Option<&str> {
        self.widget.as_ref().map(|w| w.name.as_str())
    }

    /// Checks if an output of `output_type` may link into this socket
    pub fn accepts(&self, output_type: &str) -> bool {
        self.link_type == ANY_TYPE || output_type == ANY_TYPE || self.link_type == output_type
    }
}

/// An output terminal that may feed several inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSocket {
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: String,
    #[serde(default)]
    pub links: Vec<LinkId>,
}

impl OutputSocket {
    /// Creates an output with no links
    pub fn new(name: impl Into<String>, link_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link_type: link_type.into(),
            links: Vec::new(),
        }
    }
}
