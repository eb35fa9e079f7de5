//! NodeIterator and TreeWalker.
//!
//! The document keeps a weak registry of live node iterators so removal can
//! run the pre-removing adjustment; tree walkers hold no document state and
//! need no registration.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::DomError;
use crate::node::{following, preceding, same_node, NodeKind, NodeRef};

pub const SHOW_ALL: u32 = 0xFFFF_FFFF;
pub const SHOW_ELEMENT: u32 = 0x1;
pub const SHOW_ATTRIBUTE: u32 = 0x2;
pub const SHOW_TEXT: u32 = 0x4;
pub const SHOW_CDATA_SECTION: u32 = 0x8;
pub const SHOW_PROCESSING_INSTRUCTION: u32 = 0x40;
pub const SHOW_COMMENT: u32 = 0x80;
pub const SHOW_DOCUMENT: u32 = 0x100;
pub const SHOW_DOCUMENT_TYPE: u32 = 0x200;
pub const SHOW_DOCUMENT_FRAGMENT: u32 = 0x400;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterResult {
    Accept,
    Reject,
    Skip,
}

pub type NodeFilter = Rc<dyn Fn(&NodeRef) -> FilterResult>;

fn what_to_show_bit(kind: NodeKind) -> u32 {
    match kind {
        NodeKind::Element => SHOW_ELEMENT,
        NodeKind::Attr => SHOW_ATTRIBUTE,
        NodeKind::Text => SHOW_TEXT,
        NodeKind::CdataSection => SHOW_CDATA_SECTION,
        NodeKind::ProcessingInstruction => SHOW_PROCESSING_INSTRUCTION,
        NodeKind::Comment => SHOW_COMMENT,
        NodeKind::Document => SHOW_DOCUMENT,
        NodeKind::DocumentType => SHOW_DOCUMENT_TYPE,
        NodeKind::DocumentFragment => SHOW_DOCUMENT_FRAGMENT,
    }
}

fn filter_node(node: &NodeRef, what_to_show: u32, filter: &Option<NodeFilter>) -> FilterResult {
    if what_to_show & what_to_show_bit(node.kind()) == 0 {
        return FilterResult::Skip;
    }
    match filter {
        Some(f) => f(node),
        None => FilterResult::Accept,
    }
}

pub(crate) struct IteratorState {
    root: NodeRef,
    what_to_show: u32,
    filter: Option<NodeFilter>,
    reference: RefCell<NodeRef>,
    pointer_before: Cell<bool>,
}

/// Live node iterator; adjusted when ancestors of its reference are removed.
pub struct NodeIterator {
    state: Rc<IteratorState>,
}

impl NodeIterator {
    pub fn root(&self) -> NodeRef {
        self.state.root.clone()
    }

    pub fn reference_node(&self) -> NodeRef {
        self.state.reference.borrow().clone()
    }

    pub fn pointer_before_reference(&self) -> bool {
        self.state.pointer_before.get()
    }

    pub fn next_node(&self) -> Option<NodeRef> {
        self.traverse(true)
    }

    pub fn previous_node(&self) -> Option<NodeRef> {
        self.traverse(false)
    }

    fn traverse(&self, forward: bool) -> Option<NodeRef> {
        let mut node = self.state.reference.borrow().clone();
        let mut before = self.state.pointer_before.get();
        loop {
            if forward {
                if before {
                    before = false;
                } else {
                    node = following(&node, &self.state.root)?;
                }
            } else if before {
                node = preceding(&node, &self.state.root)?;
            } else {
                before = true;
            }
            if filter_node(&node, self.state.what_to_show, &self.state.filter)
                == FilterResult::Accept
            {
                *self.state.reference.borrow_mut() = node.clone();
                self.state.pointer_before.set(before);
                return Some(node);
            }
        }
    }
}

impl IteratorState {
    /// Pre-removing adjustment: keep the reference outside the subtree that
    /// is about to go away, preserving traversal position.
    pub(crate) fn pre_remove(&self, to_remove: &NodeRef) {
        let reference = self.reference.borrow().clone();
        if !to_remove.contains(&reference) || same_node(to_remove, &self.root) {
            return;
        }
        if self.pointer_before.get() {
            // The first node after the removed subtree, still inside root.
            let last = last_inclusive_descendant(to_remove);
            if let Some(next) = following(&last, &self.root) {
                *self.reference.borrow_mut() = next;
                return;
            }
            self.pointer_before.set(false);
        }
        let new_reference = match to_remove.previous_sibling() {
            Some(sibling) => last_inclusive_descendant(&sibling),
            None => to_remove
                .parent()
                .expect("pre-remove runs on attached nodes"),
        };
        *self.reference.borrow_mut() = new_reference;
    }
}

fn last_inclusive_descendant(node: &NodeRef) -> NodeRef {
    let mut current = node.clone();
    while let Some(last) = current.last_child() {
        current = last;
    }
    current
}

/// Notify every live iterator of `doc` that `node` is about to be removed.
pub(crate) fn pre_remove_iterators(doc: &NodeRef, node: &NodeRef) {
    let Some(data) = doc.as_document() else {
        return;
    };
    let mut registry = data.iterators.borrow_mut();
    registry.retain(|weak| match weak.upgrade() {
        Some(state) => {
            state.pre_remove(node);
            true
        }
        None => false,
    });
}

/// Stateful tree traversal; not live-adjusted.
pub struct TreeWalker {
    root: NodeRef,
    what_to_show: u32,
    filter: Option<NodeFilter>,
    current: RefCell<NodeRef>,
}

impl TreeWalker {
    pub fn root(&self) -> NodeRef {
        self.root.clone()
    }

    pub fn current_node(&self) -> NodeRef {
        self.current.borrow().clone()
    }

    pub fn set_current_node(&self, node: NodeRef) {
        *self.current.borrow_mut() = node;
    }

    fn accept(&self, node: &NodeRef) -> FilterResult {
        filter_node(node, self.what_to_show, &self.filter)
    }

    pub fn parent_node(&self) -> Option<NodeRef> {
        let mut node = self.current_node();
        while !same_node(&node, &self.root) {
            node = node.parent()?;
            if self.accept(&node) == FilterResult::Accept {
                self.set_current_node(node.clone());
                return Some(node);
            }
        }
        None
    }

    pub fn first_child(&self) -> Option<NodeRef> {
        self.traverse_children(true)
    }

    pub fn last_child(&self) -> Option<NodeRef> {
        self.traverse_children(false)
    }

    fn traverse_children(&self, first: bool) -> Option<NodeRef> {
        let start = self.current_node();
        let mut node = if first {
            start.first_child()?
        } else {
            start.last_child()?
        };
        loop {
            match self.accept(&node) {
                FilterResult::Accept => {
                    self.set_current_node(node.clone());
                    return Some(node);
                }
                FilterResult::Skip => {
                    // Descend into skipped containers.
                    if let Some(child) = if first { node.first_child() } else { node.last_child() }
                    {
                        node = child;
                        continue;
                    }
                }
                FilterResult::Reject => {}
            }
            // Sibling walk with climb-out bounded by the traversal start.
            loop {
                if let Some(sibling) = if first {
                    node.next_sibling()
                } else {
                    node.previous_sibling()
                } {
                    node = sibling;
                    break;
                }
                let parent = node.parent()?;
                if same_node(&parent, &start) || same_node(&parent, &self.root) {
                    return None;
                }
                node = parent;
            }
        }
    }

    pub fn next_sibling(&self) -> Option<NodeRef> {
        self.traverse_siblings(true)
    }

    pub fn previous_sibling(&self) -> Option<NodeRef> {
        self.traverse_siblings(false)
    }

    fn traverse_siblings(&self, forward: bool) -> Option<NodeRef> {
        let mut node = self.current_node();
        if same_node(&node, &self.root) {
            return None;
        }
        loop {
            let mut sibling = if forward {
                node.next_sibling()
            } else {
                node.previous_sibling()
            };
            while let Some(candidate) = sibling {
                match self.accept(&candidate) {
                    FilterResult::Accept => {
                        self.set_current_node(candidate.clone());
                        return Some(candidate);
                    }
                    FilterResult::Skip => {
                        let child = if forward {
                            candidate.first_child()
                        } else {
                            candidate.last_child()
                        };
                        if let Some(child) = child {
                            sibling = Some(child);
                            continue;
                        }
                    }
                    FilterResult::Reject => {}
                }
                sibling = if forward {
                    candidate.next_sibling()
                } else {
                    candidate.previous_sibling()
                };
            }
            node = node.parent()?;
            if same_node(&node, &self.root) {
                return None;
            }
            if self.accept(&node) == FilterResult::Accept {
                return None;
            }
        }
    }

    pub fn next_node(&self) -> Option<NodeRef> {
        let mut node = self.current_node();
        let mut result = FilterResult::Accept;
        loop {
            // Descend while the subtree is not rejected.
            while result != FilterResult::Reject {
                let Some(child) = node.first_child() else {
                    break;
                };
                node = child;
                result = self.accept(&node);
                if result == FilterResult::Accept {
                    self.set_current_node(node.clone());
                    return Some(node);
                }
            }
            // Climb to the next sibling, bounded by the root.
            let mut temporary = node.clone();
            loop {
                if same_node(&temporary, &self.root) {
                    return None;
                }
                if let Some(sibling) = temporary.next_sibling() {
                    node = sibling;
                    break;
                }
                temporary = temporary.parent()?;
            }
            result = self.accept(&node);
            if result == FilterResult::Accept {
                self.set_current_node(node.clone());
                return Some(node);
            }
        }
    }

    pub fn previous_node(&self) -> Option<NodeRef> {
        let mut node = self.current_node();
        while !same_node(&node, &self.root) {
            let mut sibling = node.previous_sibling();
            while let Some(candidate) = sibling {
                node = candidate;
                let mut result = self.accept(&node);
                while result != FilterResult::Reject {
                    let Some(last) = node.last_child() else {
                        break;
                    };
                    node = last;
                    result = self.accept(&node);
                }
                if result == FilterResult::Accept {
                    self.set_current_node(node.clone());
                    return Some(node);
                }
                sibling = node.previous_sibling();
            }
            if same_node(&node, &self.root) {
                return None;
            }
            node = node.parent()?;
            if self.accept(&node) == FilterResult::Accept {
                self.set_current_node(node.clone());
                return Some(node);
            }
        }
        None
    }
}

impl crate::node::Node {
    /// Create a live node iterator rooted at `root`.
    pub fn create_node_iterator(
        &self,
        root: &NodeRef,
        what_to_show: u32,
        filter: Option<NodeFilter>,
    ) -> Result<NodeIterator, DomError> {
        let doc = self.as_document().ok_or(DomError::InvalidNodeType)?;
        let state = Rc::new(IteratorState {
            root: root.clone(),
            what_to_show,
            filter,
            reference: RefCell::new(root.clone()),
            pointer_before: Cell::new(true),
        });
        doc.iterators.borrow_mut().push(Rc::downgrade(&state));
        Ok(NodeIterator { state })
    }

    pub fn create_tree_walker(
        &self,
        root: &NodeRef,
        what_to_show: u32,
        filter: Option<NodeFilter>,
    ) -> Result<TreeWalker, DomError> {
        if self.as_document().is_none() {
            return Err(DomError::InvalidNodeType);
        }
        Ok(TreeWalker {
            root: root.clone(),
            what_to_show,
            filter,
            current: RefCell::new(root.clone()),
        })
    }
}
