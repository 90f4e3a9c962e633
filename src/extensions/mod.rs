//! Extensions: custom widget kinds and node type augmentation

pub mod color_widgets;
pub mod registry;

pub use color_widgets::{ColorWidgetsExtension, EXTENSION_NAME};
pub use registry::{CustomWidgetFactory, Extension, ExtensionRegistry, WidgetCreation};
