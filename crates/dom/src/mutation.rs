//! Mutation algorithms: pre-insert, insert, remove, replace, adopt, clone,
//! normalize.
//!
//! Validation always runs before mutation, so a failed request never leaves
//! a partially mutated tree. Every tree mutation bumps the owner document's
//! generation counter, runs the kind-dispatched steps, and rewrites range
//! boundaries / node-iterator references as required.

use std::rc::Weak;

use crate::element::Attr;
use crate::error::DomError;
use crate::node::{descendants, same_node, Node, NodeData, NodeKind, NodeRef};
use crate::range::{adjust_for_data_replace, adjust_for_insertion, adjust_for_removal, for_each_range};
use crate::registry::ElementKind;
use crate::traversal::pre_remove_iterators;

impl Node {
    // --- public mutation surface -----------------------------------------

    pub fn append_child(&self, node: &NodeRef) -> Result<NodeRef, DomError> {
        self.pre_insert(node, None)
    }

    pub fn insert_before(
        &self,
        node: &NodeRef,
        child: Option<&NodeRef>,
    ) -> Result<NodeRef, DomError> {
        self.pre_insert(node, child)
    }

    /// DOM pre-insert: validate, adopt, insert, return `node`.
    pub fn pre_insert(&self, node: &NodeRef, child: Option<&NodeRef>) -> Result<NodeRef, DomError> {
        let parent = self.handle();
        ensure_pre_insert_validity(node, &parent, child)?;
        let mut reference = child.cloned();
        if let Some(r) = &reference {
            if same_node(r, node) {
                reference = node.next_sibling();
            }
        }
        adopt(node, &parent.owner_doc())?;
        insert(node, &parent, reference.as_ref());
        Ok(node.clone())
    }

    pub fn remove_child(&self, child: &NodeRef) -> Result<NodeRef, DomError> {
        let parent = self.handle();
        match child.parent() {
            Some(p) if same_node(&p, &parent) => {
                remove(child);
                Ok(child.clone())
            }
            _ => Err(DomError::NotFound),
        }
    }

    /// Remove this node from its parent (no-op when detached).
    pub fn detach(&self) {
        let node = self.handle();
        if node.parent().is_some() {
            remove(&node);
        }
    }

    pub fn replace_child(&self, node: &NodeRef, child: &NodeRef) -> Result<NodeRef, DomError> {
        let parent = self.handle();
        ensure_replace_validity(node, &parent, child)?;
        let mut reference = child.next_sibling();
        if let Some(r) = &reference {
            if same_node(r, node) {
                reference = node.next_sibling();
            }
        }
        adopt(node, &parent.owner_doc())?;
        if child.parent().is_some() {
            remove(child);
        }
        insert(node, &parent, reference.as_ref());
        Ok(child.clone())
    }

    /// Adopt `node` (and its subtree) into this document.
    pub fn adopt_node(&self, node: &NodeRef) -> Result<NodeRef, DomError> {
        if self.as_document().is_none() {
            return Err(DomError::InvalidNodeType);
        }
        adopt(node, &self.handle())?;
        Ok(node.clone())
    }

    /// Clone `node` into this document (the document is the clone's owner).
    pub fn import_node(&self, node: &NodeRef, deep: bool) -> Result<NodeRef, DomError> {
        if self.as_document().is_none() {
            return Err(DomError::InvalidNodeType);
        }
        if node.as_document().is_some() {
            return Err(DomError::NotSupported);
        }
        Ok(clone_node_into(node, &self.handle(), deep))
    }

    /// Shallow or deep copy owned by the same document.
    pub fn clone_node(&self, deep: bool) -> NodeRef {
        let node = self.handle();
        clone_node_into(&node, &node.owner_doc(), deep)
    }

    pub fn set_text_content(&self, text: &str) {
        match &self.data {
            NodeData::Element(_) | NodeData::DocumentFragment => {
                let parent = self.handle();
                let replacement = (!text.is_empty())
                    .then(|| parent.owner_doc().create_text_node(text));
                for child in parent.child_nodes() {
                    remove(&child);
                }
                if let Some(text_node) = replacement {
                    insert(&text_node, &parent, None);
                }
            }
            NodeData::Text(_)
            | NodeData::CdataSection(_)
            | NodeData::Comment(_)
            | NodeData::ProcessingInstruction(_) => {
                let len = self.length();
                let _ = self.replace_data(0, len, text);
            }
            NodeData::Document(_) | NodeData::DocumentType(_) => {}
        }
    }

    pub fn set_node_value(&self, value: &str) {
        if self.as_char_data().is_some()
            || matches!(self.data, NodeData::ProcessingInstruction(_))
        {
            let len = self.length();
            let _ = self.replace_data(0, len, value);
        }
    }

    /// Character-data replace: swap `count` scalar values at `offset` for
    /// `data`, rewriting range boundaries in this node.
    pub fn replace_data(&self, offset: usize, count: usize, data: &str) -> Result<(), DomError> {
        let storage = match &self.data {
            NodeData::Text(cd) | NodeData::CdataSection(cd) | NodeData::Comment(cd) => &cd.data,
            NodeData::ProcessingInstruction(pi) => &pi.data,
            _ => return Err(DomError::InvalidNodeType),
        };
        let length = storage.borrow().chars().count();
        if offset > length {
            return Err(DomError::IndexSize);
        }
        let count = count.min(length - offset);
        {
            let mut value = storage.borrow_mut();
            let byte_start = char_to_byte_index(&value, offset);
            let byte_end = char_to_byte_index(&value, offset + count);
            value.replace_range(byte_start..byte_end, data);
        }
        let node = self.handle();
        adjust_for_data_replace(
            &node.owner_doc(),
            &node,
            offset,
            count,
            data.chars().count(),
        );
        self.bump_generation();
        Ok(())
    }

    /// Merge adjacent Text descendants and drop empty ones. Idempotent;
    /// range boundary points keep their absolute positions.
    pub fn normalize(&self) {
        let root = self.handle();
        let doc = root.owner_doc();
        let text_nodes: Vec<NodeRef> = descendants(&root).filter(|n| n.is_text()).collect();
        for node in text_nodes {
            if node.parent().is_none() {
                continue; // already merged away
            }
            let mut length = node.length();
            if length == 0 {
                remove(&node);
                continue;
            }
            let mut run = Vec::new();
            let mut cursor = node.next_sibling();
            while let Some(sibling) = cursor {
                if !sibling.is_text() {
                    break;
                }
                cursor = sibling.next_sibling();
                run.push(sibling);
            }
            if run.is_empty() {
                continue;
            }
            let mut merged = String::new();
            for sibling in &run {
                let parent = sibling.parent().expect("run member is attached");
                let index = sibling.index_in_parent().expect("run member is attached");
                for_each_range(&doc, |range| {
                    for boundary in [&range.start, &range.end] {
                        let mut b = boundary.borrow_mut();
                        if same_node(&b.node, sibling) {
                            b.offset += length;
                            b.node = node.clone();
                        } else if same_node(&b.node, &parent) && b.offset == index {
                            b.node = node.clone();
                            b.offset = length;
                        }
                    }
                });
                let data = sibling.node_value().expect("text node has data");
                length += data.chars().count();
                merged.push_str(&data);
            }
            if let NodeData::Text(cd) = node.data() {
                cd.data.borrow_mut().push_str(&merged);
            }
            for sibling in run {
                remove(&sibling);
            }
        }
        self.bump_generation();
    }
}

fn char_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

// --- validation -----------------------------------------------------------

fn is_insertable(node: &NodeRef) -> bool {
    !matches!(node.kind(), NodeKind::Document | NodeKind::Attr)
}

fn ensure_common_validity(
    node: &NodeRef,
    parent: &NodeRef,
    child: Option<&NodeRef>,
) -> Result<(), DomError> {
    if !matches!(
        parent.kind(),
        NodeKind::Document | NodeKind::DocumentFragment | NodeKind::Element
    ) {
        return Err(DomError::HierarchyRequest);
    }
    if node.contains(&parent.handle()) {
        return Err(DomError::HierarchyRequest);
    }
    if let Some(child) = child {
        match child.parent() {
            Some(p) if same_node(&p, &parent.handle()) => {}
            _ => return Err(DomError::NotFound),
        }
    }
    if !is_insertable(node) {
        return Err(DomError::HierarchyRequest);
    }
    let text_like = matches!(node.kind(), NodeKind::Text | NodeKind::CdataSection);
    if text_like && parent.as_document().is_some() {
        return Err(DomError::HierarchyRequest);
    }
    if node.kind() == NodeKind::DocumentType && parent.as_document().is_none() {
        return Err(DomError::HierarchyRequest);
    }
    Ok(())
}

fn has_element_child(parent: &NodeRef) -> bool {
    parent.child_nodes().iter().any(|c| c.as_element().is_some())
}

fn doctype_follows(parent: &NodeRef, child: Option<&NodeRef>) -> bool {
    let Some(child) = child else {
        return false;
    };
    let children = parent.child_nodes();
    let index = child.index_in_parent().unwrap_or(children.len());
    children[index..]
        .iter()
        .any(|c| c.kind() == NodeKind::DocumentType)
}

fn element_precedes(parent: &NodeRef, child: &NodeRef) -> bool {
    let index = child.index_in_parent().unwrap_or(0);
    parent.child_nodes()[..index]
        .iter()
        .any(|c| c.as_element().is_some())
}

fn ensure_pre_insert_validity(
    node: &NodeRef,
    parent: &NodeRef,
    child: Option<&NodeRef>,
) -> Result<(), DomError> {
    ensure_common_validity(node, parent, child)?;
    if parent.as_document().is_none() {
        return Ok(());
    }
    match node.kind() {
        NodeKind::DocumentFragment => {
            let element_children = node
                .child_nodes()
                .iter()
                .filter(|c| c.as_element().is_some())
                .count();
            let has_text = node.child_nodes().iter().any(|c| c.is_text());
            if element_children > 1 || has_text {
                return Err(DomError::HierarchyRequest);
            }
            if element_children == 1
                && (has_element_child(parent)
                    || child.is_some_and(|c| c.kind() == NodeKind::DocumentType)
                    || doctype_follows(parent, child))
            {
                return Err(DomError::HierarchyRequest);
            }
        }
        NodeKind::Element => {
            if has_element_child(parent)
                || child.is_some_and(|c| c.kind() == NodeKind::DocumentType)
                || doctype_follows(parent, child)
            {
                return Err(DomError::HierarchyRequest);
            }
        }
        NodeKind::DocumentType => {
            let has_doctype = parent
                .child_nodes()
                .iter()
                .any(|c| c.kind() == NodeKind::DocumentType);
            let element_before = match child {
                Some(c) => element_precedes(parent, c),
                None => has_element_child(parent),
            };
            if has_doctype || element_before {
                return Err(DomError::HierarchyRequest);
            }
        }
        _ => {}
    }
    Ok(())
}

fn ensure_replace_validity(
    node: &NodeRef,
    parent: &NodeRef,
    child: &NodeRef,
) -> Result<(), DomError> {
    ensure_common_validity(node, parent, Some(child))?;
    if parent.as_document().is_none() {
        return Ok(());
    }
    let other_element_child = parent
        .child_nodes()
        .iter()
        .any(|c| c.as_element().is_some() && !same_node(c, child));
    match node.kind() {
        NodeKind::DocumentFragment => {
            let element_children = node
                .child_nodes()
                .iter()
                .filter(|c| c.as_element().is_some())
                .count();
            let has_text = node.child_nodes().iter().any(|c| c.is_text());
            if element_children > 1 || has_text {
                return Err(DomError::HierarchyRequest);
            }
            if element_children == 1
                && (other_element_child || doctype_follows(parent, child.next_sibling().as_ref()))
            {
                return Err(DomError::HierarchyRequest);
            }
        }
        NodeKind::Element => {
            if other_element_child || doctype_follows(parent, child.next_sibling().as_ref()) {
                return Err(DomError::HierarchyRequest);
            }
        }
        NodeKind::DocumentType => {
            let other_doctype = parent
                .child_nodes()
                .iter()
                .any(|c| c.kind() == NodeKind::DocumentType && !same_node(c, child));
            if other_doctype || element_precedes(parent, child) {
                return Err(DomError::HierarchyRequest);
            }
        }
        _ => {}
    }
    Ok(())
}

// --- insert / remove ------------------------------------------------------

/// DOM insert: splice `node` (or a fragment's children) into `parent`
/// before `child`, running range rewrites and insertion steps.
pub(crate) fn insert(node: &NodeRef, parent: &NodeRef, child: Option<&NodeRef>) {
    let nodes: Vec<NodeRef> = if node.kind() == NodeKind::DocumentFragment {
        node.child_nodes()
    } else {
        vec![node.clone()]
    };
    if nodes.is_empty() {
        return;
    }
    if node.kind() == NodeKind::DocumentFragment {
        for n in &nodes {
            remove(n);
        }
    }
    let index = child
        .and_then(|c| c.index_in_parent())
        .unwrap_or_else(|| parent.child_count());
    let doc = parent.owner_doc();
    adjust_for_insertion(&doc, parent, index, nodes.len());
    {
        let mut children = parent.children.borrow_mut();
        for (i, n) in nodes.iter().enumerate() {
            debug_assert!(n.parent().is_none(), "insert expects detached nodes");
            *n.parent.borrow_mut() = parent.self_weak.clone();
            children.insert(index + i, n.clone());
        }
    }
    parent.bump_generation();
    for n in &nodes {
        run_insertion_steps(n);
    }
}

/// DOM remove: splice `node` out of its parent, adjusting live iterators and
/// ranges first, then running removing steps.
pub(crate) fn remove(node: &NodeRef) {
    let Some(parent) = node.parent() else {
        return;
    };
    let index = node.index_in_parent().expect("attached node has an index");
    let doc = node.owner_doc();
    pre_remove_iterators(&doc, node);
    adjust_for_removal(&doc, node, &parent, index);
    {
        let mut children = parent.children.borrow_mut();
        let removed = children.remove(index);
        debug_assert!(same_node(&removed, node));
    }
    *node.parent.borrow_mut() = Weak::new();
    parent.bump_generation();
    run_removing_steps(node, &parent);
}

// --- adopt ----------------------------------------------------------------

/// DOM adopt: detach and re-home the whole subtree into `doc`.
pub(crate) fn adopt(node: &NodeRef, doc: &NodeRef) -> Result<(), DomError> {
    if node.as_document().is_some() {
        return Err(DomError::NotSupported);
    }
    if node.parent().is_some() {
        remove(node);
    }
    if same_node(&node.owner_doc(), doc) {
        return Ok(());
    }
    log::trace!(target: "dom", "adopting subtree into new owner document");
    adopt_subtree(node, doc);
    Ok(())
}

fn adopt_subtree(node: &NodeRef, doc: &NodeRef) {
    *node.owner.borrow_mut() = doc.self_weak.clone();
    if let Some(el) = node.as_element() {
        // Template contents move to the adopting document's own inert
        // template contents document.
        if el.kind == ElementKind::Template {
            if let Some(contents) = el.template_contents() {
                let inert = doc.template_contents_document();
                adopt_subtree(&contents, &inert);
            }
        }
    }
    for child in node.child_nodes() {
        adopt_subtree(&child, doc);
    }
}

// --- clone ----------------------------------------------------------------

/// Clone `node` with `doc` as the clone's owner document.
pub(crate) fn clone_node_into(node: &NodeRef, doc: &NodeRef, deep: bool) -> NodeRef {
    let copy = match node.data() {
        NodeData::Document(data) => {
            let clone = crate::document::Document::with_url(&data.url());
            if let Some(clone_data) = clone.as_document() {
                *clone_data.content_type.borrow_mut() = data.content_type.borrow().clone();
                *clone_data.charset.borrow_mut() = data.charset.borrow().clone();
                clone_data.set_mode(data.mode());
            }
            clone
        }
        NodeData::DocumentFragment => doc.create_document_fragment(),
        NodeData::DocumentType(dt) => doc.create_doctype(&dt.name, &dt.public_id, &dt.system_id),
        NodeData::Element(el) => {
            let clone = doc.create_element_raw(el.name.clone());
            for attr in el.attributes() {
                clone.push_attribute(Attr::new(attr.name.clone(), attr.value()));
            }
            // Cloning steps for templates: contents follow the deep flag.
            if deep && el.kind == ElementKind::Template {
                if let (Some(source), Some(target)) = (
                    el.template_contents(),
                    clone
                        .as_element()
                        .expect("clone is an element")
                        .template_contents(),
                ) {
                    let inert = target.owner_doc();
                    for child in source.child_nodes() {
                        let child_clone = clone_node_into(&child, &inert, true);
                        insert(&child_clone, &target, None);
                    }
                }
            }
            clone
        }
        NodeData::Text(cd) => doc.create_text_node(cd.data.borrow().clone()),
        NodeData::CdataSection(cd) => Node::new(
            NodeData::CdataSection(crate::node::CharData::new(cd.data.borrow().clone())),
            doc.self_weak.clone(),
        ),
        NodeData::Comment(cd) => doc.create_comment(cd.data.borrow().clone()),
        NodeData::ProcessingInstruction(pi) => doc
            .create_processing_instruction(&pi.target, pi.data.borrow().clone())
            .expect("existing target/data are valid"),
    };
    if deep {
        let target_doc = if copy.as_document().is_some() {
            copy.clone()
        } else {
            doc.clone()
        };
        for child in node.child_nodes() {
            let child_clone = clone_node_into(&child, &target_doc, true);
            insert(&child_clone, &copy, None);
        }
    }
    copy
}

// --- kind-dispatched steps ------------------------------------------------

fn subtree_affects_base_url(node: &NodeRef) -> bool {
    if node.is_html_element("base") {
        return true;
    }
    descendants(node).any(|n| n.is_html_element("base"))
}

fn run_insertion_steps(node: &NodeRef) {
    if subtree_affects_base_url(node) {
        node.owner_doc().refresh_base_url();
    }
}

fn run_removing_steps(node: &NodeRef, old_parent: &NodeRef) {
    if subtree_affects_base_url(node) {
        old_parent.owner_doc().refresh_base_url();
    }
}
