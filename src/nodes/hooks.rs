//! Lifecycle and menu hooks on node type definitions
//!
//! Several extensions may augment the same node type. Instead of wrapping the
//! previous hook in a new closure, each hook point is an ordered list of
//! handlers: chaining appends, calling runs every handler in registration
//! order. Handlers must not trigger the conversion transition that invoked
//! them; the chain does not guard against re-entrancy.

use std::fmt;

use log::error;

use super::definition::NodeTypeDef;
use super::menu::MenuItem;
use super::node::Node;

/// A handler in a [`HookChain`]
pub type Handler<A, R> = Box<dyn Fn(&mut A) -> R + Send + Sync>;

/// A menu provider in a [`MenuHook`]
pub type MenuProvider = Box<dyn Fn(&Node) -> Vec<MenuItem> + Send + Sync>;

/// Ordered list of handlers sharing one argument.
///
/// The chain's result is the first handler's result; later handlers
/// contribute side effects only.
pub struct HookChain<A: ?Sized, R = ()> {
    handlers: Vec<Handler<A, R>>,
}

impl<A: ?Sized, R> HookChain<A, R> {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Append a handler
    pub fn chain(&mut self, handler: impl Fn(&mut A) -> R + Send + Sync + 'static) -> &mut Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Run every handler; returns the first handler's result, `None` if empty
    pub fn call(&self, arg: &mut A) -> Option<R> {
        let mut handlers = self.handlers.iter();
        let first = (handlers.next()?)(arg);
        for handler in handlers {
            handler(arg);
        }
        Some(first)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<A: ?Sized, R> Default for HookChain<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized, R> fmt::Debug for HookChain<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Ordered list of context menu providers; their items are concatenated
#[derive(Default)]
pub struct MenuHook {
    providers: Vec<MenuProvider>,
}

impl MenuHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider
    pub fn chain(
        &mut self,
        provider: impl Fn(&Node) -> Vec<MenuItem> + Send + Sync + 'static,
    ) -> &mut Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Items of every provider, in registration order
    pub fn options(&self, node: &Node) -> Vec<MenuItem> {
        self.providers.iter().flat_map(|provider| provider(node)).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for MenuHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuHook")
            .field("providers", &self.providers.len())
            .finish()
    }
}

/// Lifecycle hook points of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleHook {
    /// Runs once a node of the type has been instantiated
    NodeCreated,
    /// Runs when a node of the type is removed from its graph
    Removed,
}

/// Hooks attached to a node type definition
#[derive(Debug, Default)]
pub struct NodeTypeHooks {
    pub on_node_created: HookChain<Node>,
    pub on_removed: HookChain<Node>,
    pub extra_menu_options: MenuHook,
}

impl NodeTypeHooks {
    pub fn lifecycle_mut(&mut self, hook: LifecycleHook) -> &mut HookChain<Node> {
        match hook {
            LifecycleHook::NodeCreated => &mut self.on_node_created,
            LifecycleHook::Removed => &mut self.on_removed,
        }
    }
}

/// Chain `handler` onto a lifecycle hook of `target`.
///
/// Logs an error and returns `false` without touching anything when the
/// target is absent.
pub fn extend_prototype(
    target: Option<&mut NodeTypeDef>,
    hook: LifecycleHook,
    handler: impl Fn(&mut Node) + Send + Sync + 'static,
) -> bool {
    let Some(def) = target else {
        error!("Could not extend undefined node type ({:?})", hook);
        return false;
    };
    def.hooks.lifecycle_mut(hook).chain(handler);
    true
}

/// Chain a context menu provider onto `target`
pub fn add_menu_handler(
    target: Option<&mut NodeTypeDef>,
    provider: impl Fn(&Node) -> Vec<MenuItem> + Send + Sync + 'static,
) -> bool {
    let Some(def) = target else {
        error!("Could not add a menu handler to an undefined node type");
        return false;
    };
    def.hooks.extra_menu_options.chain(provider);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::definition::NodeDef;
    use crate::nodes::menu::MenuAction;
    use egui::Pos2;
    use pretty_assertions::assert_eq;

    fn entry(label: &str) -> MenuItem {
        MenuItem::entry(label, MenuAction::Command(label.to_string()))
    }

    fn def() -> NodeTypeDef {
        NodeTypeDef::new(NodeDef::named("Test"))
    }

    #[test]
    fn test_chain_returns_first_result_and_runs_all() {
        let mut chain: HookChain<Vec<u32>, u32> = HookChain::new();
        chain.chain(|log| {
            log.push(1);
            10
        });
        chain.chain(|log| {
            log.push(2);
            20
        });
        chain.chain(|log| {
            log.push(3);
            30
        });

        let mut log = Vec::new();
        assert_eq!(chain.call(&mut log), Some(10));
        assert_eq!(log, vec![1, 2, 3]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_empty_chain_returns_none() {
        let chain: HookChain<u32, u32> = HookChain::new();
        assert_eq!(chain.call(&mut 0), None);
    }

    #[test]
    fn test_menu_items_concatenate_in_order() {
        let mut def = def();
        def.hooks.extra_menu_options.chain(|_| vec![entry("original")]);
        assert!(add_menu_handler(Some(&mut def), |_| vec![entry("first")]));
        assert!(add_menu_handler(Some(&mut def), |_| vec![entry("second"), entry("third")]));

        let node = Node::new(0, "Test", Pos2::ZERO);
        let labels: Vec<String> = def
            .hooks
            .extra_menu_options
            .options(&node)
            .iter()
            .filter_map(|item| item.label().map(str::to_string))
            .collect();
        assert_eq!(labels, vec!["original", "first", "second", "third"]);
    }

    #[test]
    fn test_extend_prototype_chains_lifecycle() {
        let mut def = def();
        assert!(extend_prototype(Some(&mut def), LifecycleHook::NodeCreated, |node| {
            node.title.push('1')
        }));
        assert!(extend_prototype(Some(&mut def), LifecycleHook::NodeCreated, |node| {
            node.title.push('2')
        }));

        let mut node = Node::new(0, "Test", Pos2::ZERO);
        node.title.clear();
        def.hooks.on_node_created.call(&mut node);
        assert_eq!(node.title, "12");
        assert!(def.hooks.on_removed.is_empty());
    }

    #[test]
    fn test_absent_target_is_a_no_op() {
        assert!(!extend_prototype(None, LifecycleHook::Removed, |_| {}));
        assert!(!add_menu_handler(None, |_| Vec::new()));
    }
}
