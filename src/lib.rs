//! Nodle widgets library
//!
//! Node parameters shown either as inline widgets or as connectable input
//! sockets, a COLOR widget with a native picker, hook chains that let
//! extensions augment node types, and dependency-ordered node traversal.

pub mod color;
pub mod constants;
pub mod error;
pub mod extensions;
pub mod nodes;
pub mod settings;
pub mod widgets;

// Re-export commonly used types
pub use color::{ColorParser, CssColorParser, Rgb};
pub use error::{ConversionError, GraphError, PickerError, RegistryError, SettingsError};
pub use extensions::{ColorWidgetsExtension, Extension, ExtensionRegistry};
pub use nodes::{Node, NodeDef, NodeGraph, NodeId, NodeMode, NodeTypeRegistry};
pub use settings::WidgetSettings;
pub use widgets::{convert_to_input, convert_to_widget, Widget, WidgetMode};
