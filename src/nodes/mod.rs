//! Node system - graph, node types, hooks and traversal

// Core node system modules
pub mod definition;
pub mod graph;
pub mod hooks;
pub mod menu;
pub mod node;
pub mod port;
pub mod traversal;

// Re-export core types
pub use definition::{NodeDef, NodeInputs, NodeTypeDef, NodeTypeRegistry};
pub use graph::{Link, NodeGraph};
pub use hooks::{add_menu_handler, extend_prototype, HookChain, LifecycleHook, MenuHook};
pub use menu::{MenuAction, MenuItem};
pub use node::{Node, NodeId, NodeMode, NodeType, SerializedNode};
pub use port::{InputSocket, LinkId, OutputSocket, WidgetRef};
pub use traversal::OrderedNodes;
