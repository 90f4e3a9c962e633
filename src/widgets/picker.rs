//! Ephemeral native color picker sessions
//!
//! A color widget never talks to the picker element directly. It asks
//! [`PickerSessions`] to open one, and the host feeds the element's events
//! back through [`PickerSessions::handle_event`]. Every session ends with the
//! element removed: on change, on cancel, and when the target has vanished.

use std::collections::HashMap;

use log::{debug, warn};
use serde_json::Value;

use crate::error::PickerError;
use crate::nodes::{NodeGraph, NodeId};

/// Handle of a native picker element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickerId(pub u64);

/// Host-side native color picker.
///
/// `open` creates an element positioned off-screen (only its popup is
/// visible), bound to `initial`, and activates it.
pub trait NativeColorPicker {
    fn open(&mut self, initial: &str) -> PickerId;

    /// Destroy the element created by `open`
    fn remove(&mut self, id: PickerId);
}

/// The widget a picker session writes back into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerTarget {
    pub node: NodeId,
    pub widget: String,
}

/// Events emitted by a native picker element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    /// The user committed a value
    Changed { id: PickerId, value: String },
    /// The popup was dismissed without a value
    Cancelled { id: PickerId },
}

impl PickerEvent {
    pub fn id(&self) -> PickerId {
        match self {
            PickerEvent::Changed { id, .. } | PickerEvent::Cancelled { id } => *id,
        }
    }
}

/// Open picker sessions keyed by element handle
#[derive(Debug, Default)]
pub struct PickerSessions {
    open: HashMap<PickerId, PickerTarget>,
}

impl PickerSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a picker for `target`, bound to `initial`
    pub fn open(
        &mut self,
        backend: &mut dyn NativeColorPicker,
        target: PickerTarget,
        initial: &str,
    ) -> PickerId {
        let id = backend.open(initial);
        debug!(
            "Opened color picker {:?} for node {} widget `{}`",
            id, target.node, target.widget
        );
        if let Some(stale) = self.open.insert(id, target) {
            warn!("Picker {:?} reused while still bound to `{}`", id, stale.widget);
        }
        id
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Target of an open session
    pub fn target(&self, id: PickerId) -> Option<&PickerTarget> {
        self.open.get(&id)
    }

    /// Deliver a picker event.
    ///
    /// On change the value is written into the target widget, the widget's
    /// callback runs, the graph version is bumped and the canvas marked
    /// dirty. The element is removed whatever the outcome.
    pub fn handle_event(
        &mut self,
        backend: &mut dyn NativeColorPicker,
        graph: &mut NodeGraph,
        event: PickerEvent,
    ) -> Result<(), PickerError> {
        let id = event.id();
        let target = self.open.remove(&id).ok_or(PickerError::UnknownSession(id))?;

        let result = match event {
            PickerEvent::Changed { value, .. } => Self::commit(graph, &target, value),
            PickerEvent::Cancelled { .. } => {
                debug!("Color picker {:?} cancelled", id);
                Ok(())
            }
        };

        backend.remove(id);
        result
    }

    /// Close every session targeting `node`, returning how many were closed
    pub fn release_node(&mut self, backend: &mut dyn NativeColorPicker, node: NodeId) -> usize {
        let stale: Vec<PickerId> = self
            .open
            .iter()
            .filter(|(_, target)| target.node == node)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.open.remove(id);
            backend.remove(*id);
        }
        stale.len()
    }

    fn commit(graph: &mut NodeGraph, target: &PickerTarget, value: String) -> Result<(), PickerError> {
        let node = graph
            .nodes
            .get_mut(&target.node)
            .ok_or(PickerError::NodeGone(target.node))?;
        let widget = node
            .widget_mut(&target.widget)
            .ok_or_else(|| PickerError::WidgetGone {
                node: target.node,
                name: target.widget.clone(),
            })?;

        debug!("Color picker set `{}` to {}", target.widget, value);
        widget.set_value(Value::String(value));

        graph.bump_version();
        graph.set_dirty_canvas(true, true);
        Ok(())
    }
}

/// Picker backend without a UI: records opened and removed elements.
///
/// Used by the headless demo and by tests to drive picker sessions.
#[derive(Debug, Default)]
pub struct HeadlessColorPicker {
    next_id: u64,
    /// Elements currently alive, with the value they were bound to
    pub alive: Vec<(PickerId, String)>,
    /// Elements removed so far
    pub removed: Vec<PickerId>,
}

impl HeadlessColorPicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NativeColorPicker for HeadlessColorPicker {
    fn open(&mut self, initial: &str) -> PickerId {
        let id = PickerId(self.next_id);
        self.next_id += 1;
        self.alive.push((id, initial.to_string()));
        id
    }

    fn remove(&mut self, id: PickerId) {
        self.alive.retain(|(alive, _)| *alive != id);
        self.removed.push(id);
    }
}
