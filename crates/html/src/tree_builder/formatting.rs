//! Active formatting elements and the adoption-agency algorithm.
//!
//! List entries keep the start-tag token they were created from, so
//! reconstruction and the adoption agency can re-create equivalent
//! elements. Markers fence caption/cell/template/applet boundaries.

use dom::name::Ns;
use dom::node::{same_node, NodeRef};

use super::{is_special, TreeBuilder};
use crate::error::ParseErrorCode;
use crate::token::TagToken;

#[derive(Clone)]
pub(crate) enum FmtEntry {
    Marker,
    Element { node: NodeRef, tag: TagToken },
}

#[derive(Default)]
pub(crate) struct ActiveFormatting {
    entries: Vec<FmtEntry>,
    max_depth: u32,
}

impl ActiveFormatting {
    pub(crate) fn push_marker(&mut self) {
        self.entries.push(FmtEntry::Marker);
        self.track_depth();
    }

    /// Push with the Noah's Ark clause: at most three equivalent entries
    /// (same name and attribute set) since the last marker; the earliest
    /// equivalent entry is dropped when a fourth arrives.
    pub(crate) fn push_element(&mut self, node: NodeRef, tag: TagToken) {
        let mut equivalent = Vec::new();
        for (index, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FmtEntry::Marker => break,
                FmtEntry::Element { tag: existing, .. } => {
                    if tags_equivalent(existing, &tag) {
                        equivalent.push(index);
                    }
                }
            }
        }
        if equivalent.len() >= 3 {
            let earliest = *equivalent.last().expect("non-empty");
            self.entries.remove(earliest);
        }
        self.entries.push(FmtEntry::Element { node, tag });
        self.track_depth();
    }

    pub(crate) fn clear_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if matches!(entry, FmtEntry::Marker) {
                break;
            }
        }
    }

    pub(crate) fn position_of(&self, node: &NodeRef) -> Option<usize> {
        self.entries.iter().position(
            |e| matches!(e, FmtEntry::Element { node: n, .. } if same_node(n, node)),
        )
    }

    pub(crate) fn contains(&self, node: &NodeRef) -> bool {
        self.position_of(node).is_some()
    }

    pub(crate) fn remove_node(&mut self, node: &NodeRef) {
        if let Some(index) = self.position_of(node) {
            self.entries.remove(index);
        }
    }

    /// Last entry with the given HTML tag name after the last marker.
    pub(crate) fn find_after_marker(&self, name: &str) -> Option<(usize, NodeRef, TagToken)> {
        for (index, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FmtEntry::Marker => return None,
                FmtEntry::Element { node, tag } => {
                    if node.is_html_element(name) {
                        return Some((index, node.clone(), tag.clone()));
                    }
                }
            }
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&FmtEntry> {
        self.entries.get(index)
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> FmtEntry {
        self.entries.remove(index)
    }

    pub(crate) fn insert_at(&mut self, index: usize, entry: FmtEntry) {
        self.entries.insert(index, entry);
        self.track_depth();
    }

    pub(crate) fn replace_at(&mut self, index: usize, entry: FmtEntry) {
        self.entries[index] = entry;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn track_depth(&mut self) {
        self.max_depth = self.max_depth.max(self.entries.len() as u32);
    }
}

/// Noah's-Ark equivalence: same tag name and the same attribute multiset.
fn tags_equivalent(a: &TagToken, b: &TagToken) -> bool {
    if a.name != b.name || a.attrs.len() != b.attrs.len() {
        return false;
    }
    a.attrs.iter().all(|attr| {
        b.attrs
            .iter()
            .any(|other| other.name == attr.name && other.value == attr.value)
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AdoptionResult {
    Handled,
    /// The subject was not a tracked formatting element; the caller falls
    /// back to the ordinary any-other-end-tag walk.
    RunAnyOtherEndTag,
}

impl TreeBuilder {
    /// Re-open formatting elements after a block boundary: clone entries
    /// back onto the tree until the list and the stack agree again.
    pub(crate) fn reconstruct_formatting(&mut self) {
        if self.formatting.is_empty() {
            return;
        }
        let last = self.formatting.len() - 1;
        match self.formatting.get(last) {
            Some(FmtEntry::Marker) => return,
            Some(FmtEntry::Element { node, .. }) => {
                if self.open.contains(node) {
                    return;
                }
            }
            None => return,
        }
        // Rewind to the first entry that needs re-creating.
        let mut entry = last;
        loop {
            if entry == 0 {
                break;
            }
            entry -= 1;
            let stop = match self.formatting.get(entry) {
                Some(FmtEntry::Marker) => true,
                Some(FmtEntry::Element { node, .. }) => self.open.contains(node),
                None => true,
            };
            if stop {
                entry += 1;
                break;
            }
        }
        loop {
            let tag = match self.formatting.get(entry) {
                Some(FmtEntry::Element { tag, .. }) => tag.clone(),
                _ => unreachable!("rewind stops on element entries"),
            };
            let element = self.insert_element(&tag);
            self.formatting.replace_at(
                entry,
                FmtEntry::Element {
                    node: element,
                    tag,
                },
            );
            if entry == self.formatting.len() - 1 {
                break;
            }
            entry += 1;
        }
    }

    /// The adoption-agency algorithm. Outer loop capped at 8 runs; the
    /// inner loop evicts stale formatting entries past 3 iterations.
    pub(crate) fn adoption_agency(&mut self, subject: &str) -> AdoptionResult {
        if let Some(current) = self.current_node() {
            if current.is_html_element(subject) && !self.formatting.contains(&current) {
                self.open.pop();
                return AdoptionResult::Handled;
            }
        }
        for _ in 0..8 {
            let Some((entry_index, fmt_element, fmt_tag)) =
                self.formatting.find_after_marker(subject)
            else {
                return AdoptionResult::RunAnyOtherEndTag;
            };
            let Some(stack_index) = self.open.position_of(&fmt_element) else {
                self.err(ParseErrorCode::MisnestedTag);
                self.formatting.remove_at(entry_index);
                return AdoptionResult::Handled;
            };
            if !self
                .open
                .has_node_in_scope(&fmt_element, super::stack::Scope::Default)
            {
                self.err(ParseErrorCode::MisnestedTag);
                return AdoptionResult::Handled;
            }
            if !self
                .current_node()
                .is_some_and(|n| same_node(&n, &fmt_element))
            {
                self.err(ParseErrorCode::MisnestedTag);
            }

            // Furthest block: the lowest special element above the
            // formatting element.
            let furthest_block = (stack_index + 1..self.open.len())
                .map(|i| self.open.get(i).expect("index in range"))
                .find(|n| is_special(n));
            let Some(furthest_block) = furthest_block else {
                // No furthest block: plain pop-and-forget.
                self.open.pop_until_node(&fmt_element);
                self.formatting.remove_at(entry_index);
                return AdoptionResult::Handled;
            };

            let common_ancestor = self
                .open
                .get(stack_index - 1)
                .expect("formatting element is never the stack root");
            let mut bookmark = entry_index;

            let mut node = furthest_block.clone();
            let mut last_node = furthest_block.clone();
            let mut node_pos = self
                .open
                .position_of(&furthest_block)
                .expect("furthest block is on the stack");
            let mut inner_counter = 0u32;
            loop {
                inner_counter += 1;
                // Next node walks toward the formatting element. A node the
                // algorithm removed keeps its old index so the walk
                // continues from the element that sat below it.
                if let Some(i) = self.open.position_of(&node) {
                    node_pos = i;
                }
                node_pos -= 1;
                node = self.open.get(node_pos).expect("stack root below");
                if same_node(&node, &fmt_element) {
                    break;
                }
                if inner_counter > 3 && self.formatting.contains(&node) {
                    self.formatting.remove_node(&node);
                }
                let Some(node_entry) = self.formatting.position_of(&node) else {
                    self.open.remove(&node);
                    continue;
                };
                let node_tag = match self.formatting.get(node_entry) {
                    Some(FmtEntry::Element { tag, .. }) => tag.clone(),
                    _ => unreachable!("position_of returns element entries"),
                };
                let replacement =
                    self.create_element_for_token(&node_tag, Ns::Html, &common_ancestor);
                self.formatting.replace_at(
                    node_entry,
                    FmtEntry::Element {
                        node: replacement.clone(),
                        tag: node_tag,
                    },
                );
                let node_stack_index = self
                    .open
                    .position_of(&node)
                    .expect("node still on the stack");
                self.open.replace(node_stack_index, replacement.clone());
                node = replacement;
                if same_node(&last_node, &furthest_block) {
                    bookmark = node_entry + 1;
                }
                last_node.detach();
                let _ = node.append_child(&last_node);
                last_node = node.clone();
            }

            // Re-home the chain below the common ancestor (foster-aware).
            last_node.detach();
            let loc = self.appropriate_place_for_adoption(&common_ancestor);
            self.insert_at(&loc, &last_node);

            // Fresh formatting element takes over the furthest block's
            // children.
            let new_element =
                self.create_element_for_token(&fmt_tag, Ns::Html, &furthest_block);
            for child in furthest_block.child_nodes() {
                child.detach();
                let _ = new_element.append_child(&child);
            }
            let _ = furthest_block.append_child(&new_element);

            let old_entry = self
                .formatting
                .position_of(&fmt_element)
                .expect("entry still present");
            self.formatting.remove_at(old_entry);
            let bookmark = if old_entry < bookmark { bookmark - 1 } else { bookmark };
            self.formatting.insert_at(
                bookmark,
                FmtEntry::Element {
                    node: new_element.clone(),
                    tag: fmt_tag,
                },
            );

            self.open.remove(&fmt_element);
            let fb_index = self
                .open
                .position_of(&furthest_block)
                .expect("furthest block stays on the stack");
            self.open.insert_at(fb_index + 1, new_element);
        }
        AdoptionResult::Handled
    }

    /// Adoption re-homing uses the table-group foster rules regardless of
    /// the foster-parenting flag.
    fn appropriate_place_for_adoption(&self, target: &NodeRef) -> super::InsertLoc {
        if ["table", "tbody", "tfoot", "thead", "tr"]
            .iter()
            .any(|n| target.is_html_element(n))
        {
            self.foster_parent_location()
        } else {
            let mut loc = super::InsertLoc {
                parent: target.clone(),
                before: None,
            };
            if let Some(contents) = target.as_element().and_then(|el| el.template_contents()) {
                loc.parent = contents;
            }
            loc
        }
    }
}
