//! Stack of open elements with the WHATWG scope queries.
//!
//! Scope flavor is chosen by the calling algorithm (an InBody end-tag path
//! picks button scope for `p`, list-item scope for `li`, and so on); it is
//! not a property of the tag name.

use dom::name::Ns;
use dom::node::{same_node, NodeRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Default,
    ListItem,
    Button,
    Table,
    Select,
}

#[derive(Debug, Default)]
pub(crate) struct OpenElements {
    items: Vec<NodeRef>,
    max_depth: u32,
}

impl OpenElements {
    pub(crate) fn push(&mut self, node: NodeRef) {
        self.items.push(node);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
    }

    pub(crate) fn pop(&mut self) -> Option<NodeRef> {
        self.items.pop()
    }

    pub(crate) fn current(&self) -> Option<NodeRef> {
        self.items.last().cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<NodeRef> {
        self.items.get(index).cloned()
    }

    pub(crate) fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub(crate) fn position_of(&self, node: &NodeRef) -> Option<usize> {
        self.items.iter().position(|n| same_node(n, node))
    }

    pub(crate) fn contains(&self, node: &NodeRef) -> bool {
        self.position_of(node).is_some()
    }

    pub(crate) fn remove(&mut self, node: &NodeRef) {
        if let Some(index) = self.position_of(node) {
            self.items.remove(index);
        }
    }

    pub(crate) fn insert_at(&mut self, index: usize, node: NodeRef) {
        self.items.insert(index, node);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
    }

    pub(crate) fn replace(&mut self, index: usize, node: NodeRef) {
        self.items[index] = node;
    }

    /// Index of the last (deepest) HTML element named `local`.
    pub(crate) fn last_index_of_html(&self, local: &str) -> Option<usize> {
        self.items.iter().rposition(|n| n.is_html_element(local))
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, NodeRef> {
        self.items.iter()
    }

    pub(crate) fn has_template(&self) -> bool {
        self.items.iter().any(|n| n.is_html_element("template"))
    }

    /// Pop until an HTML element named `local` has been popped.
    pub(crate) fn pop_until_html(&mut self, local: &str) -> Option<NodeRef> {
        while let Some(node) = self.items.pop() {
            if node.is_html_element(local) {
                return Some(node);
            }
        }
        None
    }

    /// Pop until one of `names` (HTML namespace) has been popped.
    pub(crate) fn pop_until_one_of(&mut self, names: &[&str]) -> Option<NodeRef> {
        while let Some(node) = self.items.pop() {
            if names.iter().any(|n| node.is_html_element(n)) {
                return Some(node);
            }
        }
        None
    }

    /// Pop until `node` itself has been popped.
    pub(crate) fn pop_until_node(&mut self, node: &NodeRef) {
        while let Some(popped) = self.items.pop() {
            if same_node(&popped, node) {
                return;
            }
        }
    }

    // --- scope queries ----------------------------------------------------

    pub(crate) fn has_in_scope(&self, local: &str, scope: Scope) -> bool {
        self.find_in_scope(local, scope).is_some()
    }

    pub(crate) fn find_in_scope(&self, local: &str, scope: Scope) -> Option<NodeRef> {
        for node in self.items.iter().rev() {
            if node.is_html_element(local) {
                return Some(node.clone());
            }
            if is_scope_boundary(node, scope) {
                return None;
            }
        }
        None
    }

    /// Scope check for a specific element (the adoption agency needs node
    /// identity, not name matching).
    pub(crate) fn has_node_in_scope(&self, target: &NodeRef, scope: Scope) -> bool {
        for node in self.items.iter().rev() {
            if same_node(node, target) {
                return true;
            }
            if is_scope_boundary(node, scope) {
                return false;
            }
        }
        false
    }

    /// True when any of `names` (HTML namespace) is in the given scope.
    pub(crate) fn has_any_in_scope(&self, names: &[&str], scope: Scope) -> bool {
        for node in self.items.iter().rev() {
            if names.iter().any(|n| node.is_html_element(n)) {
                return true;
            }
            if is_scope_boundary(node, scope) {
                return false;
            }
        }
        false
    }
}

fn is_scope_boundary(node: &NodeRef, scope: Scope) -> bool {
    let Some(el) = node.as_element() else {
        return false;
    };
    let local: &str = &el.name.local;
    match scope {
        Scope::Select => {
            // Inverted set: everything except optgroup/option terminates.
            !(el.name.ns == Some(Ns::Html) && matches!(local, "optgroup" | "option"))
        }
        Scope::Table => {
            el.name.ns == Some(Ns::Html) && matches!(local, "html" | "table" | "template")
        }
        Scope::Default | Scope::ListItem | Scope::Button => {
            let base = match &el.name.ns {
                Some(Ns::Html) => matches!(
                    local,
                    "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object"
                        | "template"
                ),
                Some(Ns::MathMl) => matches!(
                    local,
                    "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml"
                ),
                Some(Ns::Svg) => matches!(local, "foreignObject" | "desc" | "title"),
                _ => false,
            };
            if base {
                return true;
            }
            let html = el.name.ns == Some(Ns::Html);
            match scope {
                Scope::ListItem => html && matches!(local, "ol" | "ul"),
                Scope::Button => html && local == "button",
                _ => false,
            }
        }
    }
}
