//! Ranges: (container, offset) boundary points kept stable across mutations.
//!
//! Offsets are in Unicode scalar values for character data and child indices
//! otherwise. The document keeps a weak registry of live ranges; insertion,
//! removal, character-data replacement and `normalize` rewrite boundary
//! points so absolute positions are preserved.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::DomError;
use crate::node::{same_node, NodeKind, NodeRef};

#[derive(Clone)]
pub struct Boundary {
    pub node: NodeRef,
    pub offset: usize,
}

pub struct RangeState {
    pub(crate) start: RefCell<Boundary>,
    pub(crate) end: RefCell<Boundary>,
}

/// A live range registered with its document.
#[derive(Clone)]
pub struct Range {
    state: Rc<RangeState>,
}

impl Range {
    /// Collapsed range at (document, 0); use `Document::create_range`.
    pub(crate) fn new(doc: &NodeRef) -> Range {
        let state = Rc::new(RangeState {
            start: RefCell::new(Boundary {
                node: doc.clone(),
                offset: 0,
            }),
            end: RefCell::new(Boundary {
                node: doc.clone(),
                offset: 0,
            }),
        });
        if let Some(data) = doc.as_document() {
            data.ranges.borrow_mut().push(Rc::downgrade(&state));
        }
        Range { state }
    }

    pub fn start_container(&self) -> NodeRef {
        self.state.start.borrow().node.clone()
    }

    pub fn start_offset(&self) -> usize {
        self.state.start.borrow().offset
    }

    pub fn end_container(&self) -> NodeRef {
        self.state.end.borrow().node.clone()
    }

    pub fn end_offset(&self) -> usize {
        self.state.end.borrow().offset
    }

    pub fn collapsed(&self) -> bool {
        let start = self.state.start.borrow();
        let end = self.state.end.borrow();
        same_node(&start.node, &end.node) && start.offset == end.offset
    }

    fn validate_boundary(node: &NodeRef, offset: usize) -> Result<(), DomError> {
        if node.kind() == NodeKind::DocumentType {
            return Err(DomError::InvalidNodeType);
        }
        if offset > node.length() {
            return Err(DomError::IndexSize);
        }
        Ok(())
    }

    pub fn set_start(&self, node: &NodeRef, offset: usize) -> Result<(), DomError> {
        Self::validate_boundary(node, offset)?;
        *self.state.start.borrow_mut() = Boundary {
            node: node.clone(),
            offset,
        };
        // Keep the invariant start <= end within one tree: collapse end onto
        // start when the new start would trail it.
        if self.boundary_out_of_order() {
            *self.state.end.borrow_mut() = self.state.start.borrow().clone();
        }
        Ok(())
    }

    pub fn set_end(&self, node: &NodeRef, offset: usize) -> Result<(), DomError> {
        Self::validate_boundary(node, offset)?;
        *self.state.end.borrow_mut() = Boundary {
            node: node.clone(),
            offset,
        };
        if self.boundary_out_of_order() {
            *self.state.start.borrow_mut() = self.state.end.borrow().clone();
        }
        Ok(())
    }

    pub fn select_node_contents(&self, node: &NodeRef) -> Result<(), DomError> {
        if node.kind() == NodeKind::DocumentType {
            return Err(DomError::InvalidNodeType);
        }
        *self.state.start.borrow_mut() = Boundary {
            node: node.clone(),
            offset: 0,
        };
        *self.state.end.borrow_mut() = Boundary {
            node: node.clone(),
            offset: node.length(),
        };
        Ok(())
    }

    pub fn select_node(&self, node: &NodeRef) -> Result<(), DomError> {
        let parent = node.parent().ok_or(DomError::InvalidNodeType)?;
        let index = node.index_in_parent().ok_or(DomError::InvalidNodeType)?;
        *self.state.start.borrow_mut() = Boundary {
            node: parent.clone(),
            offset: index,
        };
        *self.state.end.borrow_mut() = Boundary {
            node: parent,
            offset: index + 1,
        };
        Ok(())
    }

    pub fn collapse(&self, to_start: bool) {
        if to_start {
            *self.state.end.borrow_mut() = self.state.start.borrow().clone();
        } else {
            *self.state.start.borrow_mut() = self.state.end.borrow().clone();
        }
    }

    fn boundary_out_of_order(&self) -> bool {
        let start = self.state.start.borrow();
        let end = self.state.end.borrow();
        if !same_node(&start.node.root(), &end.node.root()) {
            return true;
        }
        boundary_position(&start, &end) == std::cmp::Ordering::Greater
    }
}

/// Relative order of two boundary points in the same tree.
fn boundary_position(a: &Boundary, b: &Boundary) -> std::cmp::Ordering {
    use crate::node::position;
    if same_node(&a.node, &b.node) {
        return a.offset.cmp(&b.offset);
    }
    let mask = a.node.compare_document_position(&b.node);
    if mask & position::CONTAINED_BY != 0 {
        // b is inside a: compare a.offset to the child chain index.
        let child_index = child_index_on_path(&a.node, &b.node);
        return if a.offset <= child_index {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Greater
        };
    }
    if mask & position::CONTAINS != 0 {
        let child_index = child_index_on_path(&b.node, &a.node);
        return if b.offset <= child_index {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Less
        };
    }
    if mask & position::FOLLOWING != 0 {
        std::cmp::Ordering::Less
    } else {
        std::cmp::Ordering::Greater
    }
}

/// Index, within `ancestor`'s child list, of the child on the path from
/// `ancestor` down to `descendant`.
fn child_index_on_path(ancestor: &NodeRef, descendant: &NodeRef) -> usize {
    let mut current = descendant.clone();
    loop {
        let parent = current.parent().expect("descendant has an ancestor path");
        if same_node(&parent, ancestor) {
            return current.index_in_parent().expect("child of parent");
        }
        current = parent;
    }
}

/// Run `f` over every live range registered with `doc`, pruning dead weaks.
pub(crate) fn for_each_range(doc: &NodeRef, mut f: impl FnMut(&RangeState)) {
    let Some(data) = doc.as_document() else {
        return;
    };
    let mut registry = data.ranges.borrow_mut();
    registry.retain(|weak| match weak.upgrade() {
        Some(state) => {
            f(&state);
            true
        }
        None => false,
    });
}

/// Boundary rewrites for an insertion of `count` nodes before index `index`
/// under `parent`.
pub(crate) fn adjust_for_insertion(doc: &NodeRef, parent: &NodeRef, index: usize, count: usize) {
    for_each_range(doc, |range| {
        for boundary in [&range.start, &range.end] {
            let mut b = boundary.borrow_mut();
            if same_node(&b.node, parent) && b.offset > index {
                b.offset += count;
            }
        }
    });
}

/// Boundary rewrites for the removal of `node` (at `index` under `parent`):
/// boundaries inside the removed subtree collapse to the removal point;
/// later sibling offsets shift down by one.
pub(crate) fn adjust_for_removal(doc: &NodeRef, node: &NodeRef, parent: &NodeRef, index: usize) {
    for_each_range(doc, |range| {
        for boundary in [&range.start, &range.end] {
            let mut b = boundary.borrow_mut();
            if node.contains(&b.node) {
                b.node = parent.clone();
                b.offset = index;
            } else if same_node(&b.node, parent) && b.offset > index {
                b.offset -= 1;
            }
        }
    });
}

/// Boundary rewrites for a character-data replacement in `node` replacing
/// `count` units at `offset` with `new_len` units.
pub(crate) fn adjust_for_data_replace(
    doc: &NodeRef,
    node: &NodeRef,
    offset: usize,
    count: usize,
    new_len: usize,
) {
    for_each_range(doc, |range| {
        for boundary in [&range.start, &range.end] {
            let mut b = boundary.borrow_mut();
            if !same_node(&b.node, node) {
                continue;
            }
            if b.offset > offset && b.offset <= offset + count {
                b.offset = offset;
            } else if b.offset > offset + count {
                b.offset = b.offset - count + new_len;
            }
        }
    });
}

impl crate::node::Node {
    /// Create a live range registered with this document.
    pub fn create_range(&self) -> Result<Range, DomError> {
        if self.as_document().is_none() {
            return Err(DomError::InvalidNodeType);
        }
        Ok(Range::new(&self.handle()))
    }
}
