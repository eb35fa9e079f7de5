//! Node model: reference-counted handles over a tagged node payload.
//!
//! Ownership discipline:
//! - children are owning `Rc` handles in an ordered vector;
//! - parent and owner-document links are non-owning `Weak` back-references;
//! - the document owns itself (weak self-reference installed at creation).
//!
//! Invariants:
//! - a node has at most one parent, and appears exactly once in that parent's
//!   child vector;
//! - every node reachable from a document has that document as owner unless
//!   it has been adopted elsewhere;
//! - mutation never leaves a dangling parent link: removal clears the back
//!   reference before the owner releases the child.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::document::DocumentData;
use crate::element::ElementData;
use crate::name::{Ns, XMLNS_NS};

pub type NodeRef = Rc<Node>;

/// Node kind discriminator (DOM numeric node types).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element = 1,
    Attr = 2,
    Text = 3,
    CdataSection = 4,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
}

/// Character data payload shared by text, CDATA and comment nodes.
#[derive(Debug)]
pub struct CharData {
    pub data: RefCell<String>,
}

impl CharData {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: RefCell::new(data.into()),
        }
    }

    /// Length in Unicode scalar values (offset unit for ranges).
    pub fn len(&self) -> usize {
        self.data.borrow().chars().count()
    }
}

#[derive(Debug)]
pub struct PiData {
    pub target: String,
    pub data: RefCell<String>,
}

#[derive(Debug)]
pub struct DoctypeData {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

/// Tagged node payload; the discriminator replaces subclass checks.
pub enum NodeData {
    Document(DocumentData),
    DocumentFragment,
    DocumentType(DoctypeData),
    Element(ElementData),
    Text(CharData),
    CdataSection(CharData),
    Comment(CharData),
    ProcessingInstruction(PiData),
}

pub struct Node {
    pub(crate) data: NodeData,
    pub(crate) parent: RefCell<Weak<Node>>,
    pub(crate) children: RefCell<Vec<NodeRef>>,
    pub(crate) owner: RefCell<Weak<Node>>,
    pub(crate) self_weak: Weak<Node>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({:?}", self.kind())?;
        if let NodeData::Element(el) = &self.data {
            write!(f, " <{}>", el.name.qualified())?;
        }
        write!(f, ", {} children)", self.children.borrow().len())
    }
}

/// Document-position bitmask values.
pub mod position {
    pub const DISCONNECTED: u16 = 0x01;
    pub const PRECEDING: u16 = 0x02;
    pub const FOLLOWING: u16 = 0x04;
    pub const CONTAINS: u16 = 0x08;
    pub const CONTAINED_BY: u16 = 0x10;
    pub const IMPLEMENTATION_SPECIFIC: u16 = 0x20;
}

pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    Rc::ptr_eq(a, b)
}

impl Node {
    /// Allocate a node owned by `owner` (the document's weak self-reference).
    pub(crate) fn new(data: NodeData, owner: Weak<Node>) -> NodeRef {
        Rc::new_cyclic(|self_weak| Node {
            data,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            owner: RefCell::new(owner),
            self_weak: self_weak.clone(),
        })
    }

    /// Allocate a document node (owns itself).
    pub(crate) fn new_document(data: DocumentData) -> NodeRef {
        Rc::new_cyclic(|self_weak| Node {
            data: NodeData::Document(data),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            owner: RefCell::new(self_weak.clone()),
            self_weak: self_weak.clone(),
        })
    }

    pub fn handle(&self) -> NodeRef {
        self.self_weak
            .upgrade()
            .expect("live node has a self reference")
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Document(_) => NodeKind::Document,
            NodeData::DocumentFragment => NodeKind::DocumentFragment,
            NodeData::DocumentType(_) => NodeKind::DocumentType,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::CdataSection(_) => NodeKind::CdataSection,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
        }
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&DocumentData> {
        match &self.data {
            NodeData::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_doctype(&self) -> Option<&DoctypeData> {
        match &self.data {
            NodeData::DocumentType(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_char_data(&self) -> Option<&CharData> {
        match &self.data {
            NodeData::Text(cd) | NodeData::CdataSection(cd) | NodeData::Comment(cd) => Some(cd),
            _ => None,
        }
    }

    pub fn is_element_named(&self, ns: &Ns, local: &str) -> bool {
        self.as_element()
            .is_some_and(|el| el.name.ns.as_ref() == Some(ns) && &*el.name.local == local)
    }

    pub fn is_html_element(&self, local: &str) -> bool {
        self.is_element_named(&Ns::Html, local)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    // --- tree links -------------------------------------------------------

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade()
    }

    /// Owner document handle; for a document node this is the node itself.
    pub(crate) fn owner_doc(&self) -> NodeRef {
        self.owner
            .borrow()
            .upgrade()
            .expect("node outlived its owner document")
    }

    /// Public owner document: `None` for the document itself.
    pub fn owner_document(&self) -> Option<NodeRef> {
        if matches!(self.data, NodeData::Document(_)) {
            return None;
        }
        Some(self.owner_doc())
    }

    /// Snapshot of the child list (cheap handle clones).
    pub fn child_nodes(&self) -> Vec<NodeRef> {
        self.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<NodeRef> {
        self.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<NodeRef> {
        self.children.borrow().last().cloned()
    }

    pub fn child_at(&self, index: usize) -> Option<NodeRef> {
        self.children.borrow().get(index).cloned()
    }

    /// Position of this node in its parent's child vector.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let this = self.handle();
        let index = parent
            .children
            .borrow()
            .iter()
            .position(|c| same_node(c, &this));
        debug_assert!(index.is_some(), "parent link without child-list entry");
        index
    }

    pub fn next_sibling(&self) -> Option<NodeRef> {
        let parent = self.parent()?;
        let index = self.index_in_parent()?;
        parent.child_at(index + 1)
    }

    pub fn previous_sibling(&self) -> Option<NodeRef> {
        let parent = self.parent()?;
        let index = self.index_in_parent()?;
        index.checked_sub(1).and_then(|i| parent.child_at(i))
    }

    /// Node length as used by range boundary points: character count for
    /// character data, child count otherwise.
    pub fn length(&self) -> usize {
        match &self.data {
            NodeData::Text(cd) | NodeData::CdataSection(cd) | NodeData::Comment(cd) => cd.len(),
            NodeData::ProcessingInstruction(pi) => pi.data.borrow().chars().count(),
            NodeData::DocumentType(_) => 0,
            _ => self.children.borrow().len(),
        }
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(node) = current {
            depth += 1;
            current = node.parent();
        }
        depth
    }

    /// Tree root (self when detached).
    pub fn root(&self) -> NodeRef {
        let mut current = self.handle();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Inclusive-descendant check.
    pub fn contains(&self, other: &NodeRef) -> bool {
        let this = self.handle();
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if same_node(&node, &this) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    // --- data access ------------------------------------------------------

    pub fn node_value(&self) -> Option<String> {
        match &self.data {
            NodeData::Text(cd) | NodeData::CdataSection(cd) | NodeData::Comment(cd) => {
                Some(cd.data.borrow().clone())
            }
            NodeData::ProcessingInstruction(pi) => Some(pi.data.borrow().clone()),
            _ => None,
        }
    }

    pub fn text_content(&self) -> Option<String> {
        match &self.data {
            NodeData::Element(_) | NodeData::DocumentFragment => {
                let mut out = String::new();
                collect_descendant_text(&self.handle(), &mut out);
                Some(out)
            }
            NodeData::Text(cd) | NodeData::CdataSection(cd) | NodeData::Comment(cd) => {
                Some(cd.data.borrow().clone())
            }
            NodeData::ProcessingInstruction(pi) => Some(pi.data.borrow().clone()),
            NodeData::Document(_) | NodeData::DocumentType(_) => None,
        }
    }

    // --- comparisons ------------------------------------------------------

    pub fn is_equal_node(&self, other: &NodeRef) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        let equal_payload = match (&self.data, &other.data) {
            (NodeData::DocumentType(a), NodeData::DocumentType(b)) => {
                a.name == b.name && a.public_id == b.public_id && a.system_id == b.system_id
            }
            (NodeData::Element(a), NodeData::Element(b)) => a.equals_shallow(b),
            (NodeData::Text(a), NodeData::Text(b))
            | (NodeData::CdataSection(a), NodeData::CdataSection(b))
            | (NodeData::Comment(a), NodeData::Comment(b)) => *a.data.borrow() == *b.data.borrow(),
            (NodeData::ProcessingInstruction(a), NodeData::ProcessingInstruction(b)) => {
                a.target == b.target && *a.data.borrow() == *b.data.borrow()
            }
            (NodeData::Document(_), NodeData::Document(_))
            | (NodeData::DocumentFragment, NodeData::DocumentFragment) => true,
            _ => false,
        };
        if !equal_payload {
            return false;
        }
        let mine = self.child_nodes();
        let theirs = other.child_nodes();
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| a.is_equal_node(b))
    }

    pub fn compare_document_position(&self, other: &NodeRef) -> u16 {
        use position::*;
        let this = self.handle();
        if same_node(&this, other) {
            return 0;
        }
        let mut chain_a = inclusive_ancestors(&this);
        let mut chain_b = inclusive_ancestors(other);
        if !same_node(chain_a.last().expect("non-empty"), chain_b.last().expect("non-empty")) {
            // Disconnected: consistent, implementation-specific order via the
            // allocation addresses of the two roots.
            let addr_a = Rc::as_ptr(chain_a.last().expect("non-empty")) as usize;
            let addr_b = Rc::as_ptr(chain_b.last().expect("non-empty")) as usize;
            let order = if addr_a < addr_b { FOLLOWING } else { PRECEDING };
            return DISCONNECTED | IMPLEMENTATION_SPECIFIC | order;
        }
        if this.contains(other) {
            return CONTAINED_BY | FOLLOWING;
        }
        if other.contains(&this) {
            return CONTAINS | PRECEDING;
        }
        // Walk both chains root-first until they diverge, then compare the
        // sibling indices of the diverging ancestors.
        chain_a.reverse();
        chain_b.reverse();
        let mut i = 0;
        while i < chain_a.len() && i < chain_b.len() && same_node(&chain_a[i], &chain_b[i]) {
            i += 1;
        }
        debug_assert!(i < chain_a.len() && i < chain_b.len());
        let index_a = chain_a[i].index_in_parent().unwrap_or(0);
        let index_b = chain_b[i].index_in_parent().unwrap_or(0);
        if index_a < index_b { FOLLOWING } else { PRECEDING }
    }

    // --- namespace lookup -------------------------------------------------

    pub fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<String> {
        match &self.data {
            NodeData::Element(_) => locate_namespace(&self.handle(), prefix),
            NodeData::Document(_) => self
                .document_element()
                .and_then(|el| locate_namespace(&el, prefix)),
            NodeData::DocumentType(_) | NodeData::DocumentFragment => None,
            _ => self
                .parent()
                .and_then(|p| p.lookup_namespace_uri(prefix)),
        }
    }

    pub fn lookup_prefix(&self, namespace: &str) -> Option<String> {
        match &self.data {
            NodeData::Element(_) => locate_prefix(&self.handle(), namespace),
            NodeData::Document(_) => self
                .document_element()
                .and_then(|el| locate_prefix(&el, namespace)),
            NodeData::DocumentType(_) | NodeData::DocumentFragment => None,
            _ => self.parent().and_then(|p| p.lookup_prefix(namespace)),
        }
    }

    /// First element child of a document node.
    pub fn document_element(&self) -> Option<NodeRef> {
        self.children
            .borrow()
            .iter()
            .find(|c| c.as_element().is_some())
            .cloned()
    }
}

fn collect_descendant_text(node: &NodeRef, out: &mut String) {
    for child in node.child_nodes() {
        match &child.data {
            NodeData::Text(cd) | NodeData::CdataSection(cd) => out.push_str(&cd.data.borrow()),
            NodeData::Element(_) => collect_descendant_text(&child, out),
            _ => {}
        }
    }
}

pub fn inclusive_ancestors(node: &NodeRef) -> Vec<NodeRef> {
    let mut chain = vec![node.clone()];
    let mut current = node.parent();
    while let Some(parent) = current {
        current = parent.parent();
        chain.push(parent);
    }
    chain
}

fn locate_namespace(element: &NodeRef, prefix: Option<&str>) -> Option<String> {
    let el = element.as_element().expect("element node");
    if el.name.ns.is_some() && el.name.prefix.as_deref() == prefix {
        return Some(el.name.ns.as_ref().expect("checked").uri().to_string());
    }
    for attr in el.attributes() {
        let is_decl = match prefix {
            Some(p) => {
                attr.name.ns == Some(Ns::Xmlns)
                    && attr.name.prefix.as_deref() == Some("xmlns")
                    && &*attr.name.local == p
            }
            None => {
                attr.name.ns == Some(Ns::Xmlns)
                    && attr.name.prefix.is_none()
                    && &*attr.name.local == "xmlns"
            }
        };
        if is_decl {
            let value = attr.value();
            return (!value.is_empty()).then_some(value);
        }
    }
    element
        .parent()
        .filter(|p| p.as_element().is_some())
        .and_then(|p| locate_namespace(&p, prefix))
}

fn locate_prefix(element: &NodeRef, namespace: &str) -> Option<String> {
    let el = element.as_element().expect("element node");
    if let (Some(ns), Some(prefix)) = (&el.name.ns, &el.name.prefix) {
        if ns.uri() == namespace {
            return Some(prefix.to_string());
        }
    }
    for attr in el.attributes() {
        if attr.name.prefix.as_deref() == Some("xmlns")
            && attr.name.ns.as_ref().map(Ns::uri) == Some(XMLNS_NS)
            && attr.value() == namespace
        {
            return Some(attr.name.local.to_string());
        }
    }
    element
        .parent()
        .filter(|p| p.as_element().is_some())
        .and_then(|p| locate_prefix(&p, namespace))
}

/// Next node in tree order within `root`'s subtree (preorder successor).
pub fn following(node: &NodeRef, root: &NodeRef) -> Option<NodeRef> {
    if let Some(child) = node.first_child() {
        return Some(child);
    }
    let mut current = node.clone();
    loop {
        if same_node(&current, root) {
            return None;
        }
        if let Some(sibling) = current.next_sibling() {
            return Some(sibling);
        }
        current = current.parent()?;
    }
}

/// Previous node in tree order within `root`'s subtree.
pub fn preceding(node: &NodeRef, root: &NodeRef) -> Option<NodeRef> {
    if same_node(node, root) {
        return None;
    }
    match node.previous_sibling() {
        Some(mut current) => {
            while let Some(last) = current.last_child() {
                current = last;
            }
            Some(current)
        }
        None => node.parent(),
    }
}

/// Preorder iterator over the exclusive descendants of `root`.
pub fn descendants(root: &NodeRef) -> Descendants {
    Descendants {
        root: root.clone(),
        next: root.first_child(),
    }
}

pub struct Descendants {
    root: NodeRef,
    next: Option<NodeRef>,
}

impl Iterator for Descendants {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let current = self.next.take()?;
        self.next = following(&current, &self.root);
        Some(current)
    }
}
