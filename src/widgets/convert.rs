//! Widget <-> input socket conversion
//!
//! Every transition validates first and mutates last: a failed call leaves
//! the node's widgets, sockets and size untouched.

use std::collections::HashSet;

use log::{debug, error, warn};
use serde_json::Value;

use crate::constants::widget::COMBO;
use crate::error::ConversionError;
use crate::nodes::port::InputSocket;
use crate::nodes::Node;
use crate::settings::WidgetSettings;

use super::widget::WidgetMode;

/// Kind and link type derived from a widget config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetTypeInfo {
    pub kind: String,
    /// Type string used for link compatibility
    pub link_type: String,
}

/// Resolve the kind and link type declared by `config`.
///
/// `["INT", {..}]` is kind `INT` linking as `INT`. A first element listing
/// the allowed values is a `COMBO` whose link type is the values joined by
/// commas, so only sockets offering exactly that set can connect.
pub fn resolve_widget_type(config: &Value) -> Result<WidgetTypeInfo, ConversionError> {
    let invalid = |reason| ConversionError::InvalidConfig {
        config: config.to_string(),
        reason,
    };

    match config.get(0) {
        Some(Value::String(kind)) => Ok(WidgetTypeInfo {
            kind: kind.clone(),
            link_type: kind.clone(),
        }),
        Some(Value::Array(choices)) => {
            let link_type = choices
                .iter()
                .map(|choice| match choice {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",");
            Ok(WidgetTypeInfo {
                kind: COMBO.to_string(),
                link_type,
            })
        }
        Some(_) => Err(invalid("first element must be a kind or a list of choices")),
        None => Err(invalid("expected a non-empty array")),
    }
}

/// Check that `name` can leave the active state, reporting misuse
fn require_active(node: &Node, name: &str) -> Result<usize, ConversionError> {
    let index = node.widget_index(name).ok_or_else(|| ConversionError::MissingWidget {
        node: node.id,
        name: name.to_string(),
    })?;

    let err = match node.widgets[index].mode() {
        WidgetMode::Active(_) => return Ok(index),
        WidgetMode::ConvertedToInput { .. } => ConversionError::AlreadyConverted {
            name: name.to_string(),
        },
        WidgetMode::Hidden { .. } => ConversionError::PermanentlyHidden {
            name: name.to_string(),
        },
    };
    error!("Cannot convert `{}` on node {}: {}", name, node.id, err);
    Err(err)
}

/// Widgets that change mode with `primary`, with the suffix each one gets.
///
/// Every linked widget is tagged with the name of the widget that pulled it
/// in. `accept` decides which modes may take part; widgets it rejects are
/// reported as `Err` by `reject`.
fn collect_cascade(
    node: &Node,
    primary: usize,
    accept: impl Fn(&WidgetMode) -> bool,
    reject: impl Fn(&str) -> ConversionError,
) -> Result<Vec<(usize, String)>, ConversionError> {
    let mut cascade = vec![(primary, String::new())];
    let mut seen = HashSet::from([primary]);
    let mut next = 0;

    while next < cascade.len() {
        let parent = &node.widgets[cascade[next].0];
        for linked in &parent.linked_widgets {
            let index = node.widget_index(linked).ok_or_else(|| ConversionError::MissingWidget {
                node: node.id,
                name: linked.clone(),
            })?;
            if !seen.insert(index) {
                continue;
            }
            if !accept(node.widgets[index].mode()) {
                return Err(reject(linked));
            }
            cascade.push((index, format!(":{}", parent.name)));
        }
        next += 1;
    }
    Ok(cascade)
}

/// Replace widget `name` with an input socket.
///
/// The widget and its linked widgets keep their behavior inside the
/// converted state. The new socket carries `config` so the widget can be
/// rebuilt elsewhere. Rows shift down one slot and the node never shrinks.
pub fn convert_to_input(
    node: &mut Node,
    name: &str,
    config: &Value,
    settings: &WidgetSettings,
) -> Result<(), ConversionError> {
    let primary = require_active(node, name)?;
    if node.input(name).is_some() {
        return Err(ConversionError::SocketExists {
            node: node.id,
            name: name.to_string(),
        });
    }
    let cascade = collect_cascade(
        node,
        primary,
        |mode| matches!(mode, WidgetMode::Active(_)),
        |linked| ConversionError::AlreadyConverted {
            name: linked.to_string(),
        },
    )?;
    let info = resolve_widget_type(config).inspect_err(|err| {
        error!("Cannot convert `{}` on node {}: {}", name, node.id, err);
    })?;

    let previous = node.size;
    for (index, suffix) in cascade {
        node.widgets[index].enter_converted(suffix);
    }
    node.add_input(InputSocket::for_widget(name, info.link_type, config.clone()));
    node.shift_widgets(settings.slot_height);
    node.grow_to_fit(previous, settings);

    debug!("Converted `{}` on node {} to a {} input", name, node.id, info.kind);
    Ok(())
}

/// A validated restore of a converted widget
#[derive(Debug)]
pub(crate) struct RestorePlan {
    /// Index of the socket standing in for the widget
    pub(crate) socket: usize,
    cascade: Vec<(usize, String)>,
}

/// Check that widget `name` can come back from its socket, without touching the node
pub(crate) fn plan_restore(node: &Node, name: &str) -> Result<RestorePlan, ConversionError> {
    let primary = node.widget_index(name).ok_or_else(|| ConversionError::MissingWidget {
        node: node.id,
        name: name.to_string(),
    })?;
    let misuse = match node.widgets[primary].mode() {
        WidgetMode::ConvertedToInput { .. } => None,
        WidgetMode::Active(_) => Some(ConversionError::NotConverted {
            name: name.to_string(),
        }),
        WidgetMode::Hidden { .. } => Some(ConversionError::PermanentlyHidden {
            name: name.to_string(),
        }),
    };
    if let Some(err) = misuse {
        error!("Cannot restore `{}` on node {}: {}", name, node.id, err);
        return Err(err);
    }

    let socket = node
        .input_index_for_widget(name)
        .ok_or_else(|| ConversionError::MissingSocket {
            node: node.id,
            name: name.to_string(),
        })?;
    let cascade = collect_cascade(
        node,
        primary,
        |mode| matches!(mode, WidgetMode::ConvertedToInput { .. }),
        |linked| ConversionError::NotConverted {
            name: linked.to_string(),
        },
    )?;
    Ok(RestorePlan { socket, cascade })
}

/// Carry out a restore checked by [`plan_restore`] on the same node
pub(crate) fn apply_restore(node: &mut Node, name: &str, plan: RestorePlan, settings: &WidgetSettings) {
    if node.inputs[plan.socket].is_connected() {
        warn!("Removing linked input `{}` from node {}", name, node.id);
    }

    let previous = node.size;
    for (index, _) in plan.cascade {
        node.widgets[index].restore();
    }
    node.remove_input(plan.socket);
    node.shift_widgets(-settings.slot_height);
    node.grow_to_fit(previous, settings);

    debug!("Restored widget `{}` on node {}", name, node.id);
}

/// Bring widget `name` back from its input socket.
///
/// Removes the socket found by widget-name lookup. A link still attached to
/// it is not touched here; `NodeGraph::convert_to_widget` drops it first.
pub fn convert_to_widget(
    node: &mut Node,
    name: &str,
    settings: &WidgetSettings,
) -> Result<(), ConversionError> {
    let plan = plan_restore(node, name)?;
    apply_restore(node, name, plan, settings);
    Ok(())
}

/// Hide widget `name` and its linked widgets for good.
///
/// The rows take no space, no socket is added and nothing offers a way back.
pub fn hide_widget_for_good(node: &mut Node, name: &str) -> Result<(), ConversionError> {
    let primary = require_active(node, name)?;
    let cascade = collect_cascade(
        node,
        primary,
        |mode| matches!(mode, WidgetMode::Active(_)),
        |linked| ConversionError::AlreadyConverted {
            name: linked.to_string(),
        },
    )?;

    for (index, suffix) in cascade {
        node.widgets[index].enter_hidden(suffix);
    }
    debug!("Hid widget `{}` on node {} for good", name, node.id);
    Ok(())
}

/// Bring widget modes in line with the node's sockets after loading.
///
/// Active widgets that a saved socket stands in for become converted (the
/// socket already exists). Converted widgets without a socket are restored.
/// Returns how many widgets changed mode.
pub fn reconcile_widgets(node: &mut Node) -> usize {
    let mut changed = 0;

    let backed: Vec<String> = node
        .inputs
        .iter()
        .filter_map(InputSocket::widget_name)
        .map(str::to_string)
        .collect();

    for name in &backed {
        let Some(primary) = node.widget_index(name) else {
            warn!("Input `{}` on node {} has no matching widget", name, node.id);
            continue;
        };
        if !node.widgets[primary].is_active() {
            continue;
        }
        let accept_active = |mode: &WidgetMode| matches!(mode, WidgetMode::Active(_));
        match collect_cascade(node, primary, accept_active, |linked| {
            ConversionError::AlreadyConverted {
                name: linked.to_string(),
            }
        }) {
            Ok(cascade) => {
                changed += cascade.len();
                for (index, suffix) in cascade {
                    node.widgets[index].enter_converted(suffix);
                }
            }
            Err(err) => warn!("Skipping `{}` on node {}: {}", name, node.id, err),
        }
    }

    // Primary widgets left converted without a socket
    let orphaned: Vec<usize> = node
        .widgets
        .iter()
        .enumerate()
        .filter(|(_, w)| {
            matches!(w.mode(), WidgetMode::ConvertedToInput { suffix, .. } if suffix.is_empty())
        })
        .filter(|(_, w)| node.input_for_widget(&w.name).is_none())
        .map(|(index, _)| index)
        .collect();
    for primary in orphaned {
        let accept_converted = |mode: &WidgetMode| matches!(mode, WidgetMode::ConvertedToInput { .. });
        if let Ok(cascade) = collect_cascade(node, primary, accept_converted, |linked| {
            ConversionError::NotConverted {
                name: linked.to_string(),
            }
        }) {
            changed += cascade.len();
            for (index, _) in cascade {
                node.widgets[index].restore();
            }
        }
    }

    if changed > 0 {
        debug!("Reconciled {} widgets on node {}", changed, node.id);
    }
    changed
}
