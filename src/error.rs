//! Error types for conversion, registration, graph and picker operations

use thiserror::Error;

use crate::nodes::NodeId;
use crate::widgets::picker::PickerId;

/// Errors raised by the widget/input conversion state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("node {0} does not exist")]
    MissingNode(NodeId),

    #[error("node {node} has no widget named `{name}`")]
    MissingWidget { node: NodeId, name: String },

    #[error("node {node} has no input socket for widget `{name}`")]
    MissingSocket { node: NodeId, name: String },

    #[error("node {node} already has an input named `{name}`")]
    SocketExists { node: NodeId, name: String },

    #[error("widget `{name}` is already converted to an input")]
    AlreadyConverted { name: String },

    #[error("widget `{name}` is not converted to an input")]
    NotConverted { name: String },

    #[error("widget `{name}` is permanently hidden")]
    PermanentlyHidden { name: String },

    #[error("invalid widget config {config}: {reason}")]
    InvalidConfig { config: String, reason: &'static str },
}

/// Errors raised while registering extensions and node types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("an extension named `{0}` is already registered")]
    DuplicateExtension(String),

    #[error("widget kind `{kind}` from `{extension}` is already supplied by `{owner}`")]
    DuplicateWidgetKind {
        kind: String,
        extension: String,
        owner: String,
    },

    #[error("a node type named `{0}` is already registered")]
    DuplicateNodeType(String),
}

/// Errors raised by graph operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("cycle detected in node graph")]
    Cycle,

    #[error("node {0} does not exist")]
    MissingNode(NodeId),

    #[error("cannot connect node {0} to itself")]
    SelfLink(NodeId),

    #[error("node {node} has no {direction} slot `{slot}`")]
    MissingSlot {
        node: NodeId,
        direction: &'static str,
        slot: String,
    },

    #[error("link type `{from}` is not compatible with input type `{to}`")]
    IncompatibleTypes { from: String, to: String },
}

/// Errors raised while delivering native picker events
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("no open picker session {0:?}")]
    UnknownSession(PickerId),

    #[error("picker target node {0} no longer exists")]
    NodeGone(NodeId),

    #[error("picker target widget `{name}` no longer exists on node {node}")]
    WidgetGone { node: NodeId, name: String },
}

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
