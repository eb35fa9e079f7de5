//! Element payload, attributes and the class token list.
//!
//! Attributes are kept as an ordered vector to preserve source order; the
//! (namespace, local-name) pair is unique per element and an attr belongs to
//! at most one element at a time.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::DomError;
use crate::name::{is_valid_name, validate_and_extract, Ns, QualName};
use crate::node::{Node, NodeData, NodeRef};
use crate::registry::ElementKind;

pub struct ElementData {
    pub name: QualName,
    pub kind: ElementKind,
    pub(crate) attrs: RefCell<Vec<Rc<Attr>>>,
    /// `<template>` content fragment, owned by the inert template contents
    /// document. `None` for every other kind.
    pub(crate) template_contents: RefCell<Option<NodeRef>>,
}

impl ElementData {
    pub(crate) fn new(name: QualName, kind: ElementKind) -> Self {
        Self {
            name,
            kind,
            attrs: RefCell::new(Vec::new()),
            template_contents: RefCell::new(None),
        }
    }

    pub fn attributes(&self) -> Vec<Rc<Attr>> {
        self.attrs.borrow().clone()
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.borrow().len()
    }

    /// `<template>` content fragment (template elements only).
    pub fn template_contents(&self) -> Option<NodeRef> {
        self.template_contents.borrow().clone()
    }

    pub(crate) fn find_by_qualified(&self, qualified: &str) -> Option<Rc<Attr>> {
        self.attrs
            .borrow()
            .iter()
            .find(|a| a.matches_qualified(qualified))
            .cloned()
    }

    pub(crate) fn find_by_ns_local(&self, ns: Option<&Ns>, local: &str) -> Option<Rc<Attr>> {
        self.attrs
            .borrow()
            .iter()
            .find(|a| a.name.ns.as_ref() == ns && &*a.name.local == local)
            .cloned()
    }

    /// Shallow equality for `is_equal_node`: same expanded name and the same
    /// attribute set (order-insensitive, compared by namespace/local/value).
    pub(crate) fn equals_shallow(&self, other: &ElementData) -> bool {
        if self.name.ns != other.name.ns
            || self.name.prefix != other.name.prefix
            || self.name.local != other.name.local
        {
            return false;
        }
        let mine = self.attrs.borrow();
        let theirs = other.attrs.borrow();
        mine.len() == theirs.len()
            && mine.iter().all(|a| {
                other
                    .find_by_ns_local(a.name.ns.as_ref(), &a.name.local)
                    .is_some_and(|b| b.value() == a.value())
            })
    }
}

/// Attribute entry. Not a tree node: it lives in its owner element's ordered
/// attribute list and carries a back-reference to that element.
pub struct Attr {
    pub name: QualName,
    value: RefCell<String>,
    owner: RefCell<Weak<Node>>,
}

impl Attr {
    pub fn new(name: QualName, value: impl Into<String>) -> Rc<Attr> {
        Rc::new(Attr {
            name,
            value: RefCell::new(value.into()),
            owner: RefCell::new(Weak::new()),
        })
    }

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    /// Plain value store (also used for text-content assignment on attrs).
    pub fn set_value(&self, value: impl Into<String>) {
        *self.value.borrow_mut() = value.into();
        if let Some(owner) = self.owner_element() {
            owner.bump_generation();
        }
    }

    pub fn owner_element(&self) -> Option<NodeRef> {
        self.owner.borrow().upgrade()
    }

    pub(crate) fn set_owner(&self, owner: Option<&NodeRef>) {
        *self.owner.borrow_mut() = match owner {
            Some(node) => node.self_weak.clone(),
            None => Weak::new(),
        };
    }

    fn matches_qualified(&self, qualified: &str) -> bool {
        match &self.name.prefix {
            None => &*self.name.local == qualified,
            Some(prefix) => {
                qualified.len() == prefix.len() + 1 + self.name.local.len()
                    && qualified.starts_with(&**prefix)
                    && qualified.as_bytes()[prefix.len()] == b':'
                    && qualified.ends_with(&*self.name.local)
            }
        }
    }
}

impl Node {
    fn element_data(&self) -> Result<&ElementData, DomError> {
        self.as_element().ok_or(DomError::InvalidNodeType)
    }

    /// Lookup-name folding: HTML-namespace elements match attribute names
    /// case-insensitively via ASCII lowercasing of the argument.
    fn fold_lookup_name(&self, name: &str) -> String {
        let is_html = self
            .as_element()
            .is_some_and(|el| el.name.ns == Some(Ns::Html));
        if is_html && name.bytes().any(|b| b.is_ascii_uppercase()) {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let el = self.as_element()?;
        el.find_by_qualified(&self.fold_lookup_name(name))
            .map(|a| a.value())
    }

    pub fn get_attribute_ns(&self, ns: Option<&str>, local: &str) -> Option<String> {
        let el = self.as_element()?;
        let ns = match ns {
            Some("") | None => None,
            Some(uri) => Some(Ns::from_uri(uri)),
        };
        el.find_by_ns_local(ns.as_ref(), local).map(|a| a.value())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    pub fn has_attribute_ns(&self, ns: Option<&str>, local: &str) -> bool {
        self.get_attribute_ns(ns, local).is_some()
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        let el = self.element_data()?;
        if !is_valid_name(name) {
            return Err(DomError::InvalidCharacter);
        }
        let folded = self.fold_lookup_name(name);
        if let Some(existing) = el.find_by_qualified(&folded) {
            existing.set_value(value);
            return Ok(());
        }
        let attr = Attr::new(QualName::new(None, None, folded.as_str()), value);
        self.push_attribute(attr);
        Ok(())
    }

    pub fn set_attribute_ns(
        &self,
        ns: Option<&str>,
        qualified: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let el = self.element_data()?;
        let name = validate_and_extract(ns, qualified)?;
        if let Some(existing) = el.find_by_ns_local(name.ns.as_ref(), &name.local) {
            existing.set_value(value);
            return Ok(());
        }
        self.push_attribute(Attr::new(name, value));
        Ok(())
    }

    /// Append an attribute the tokenizer already canonicalized; the caller
    /// guarantees the (namespace, local) pair is not present.
    pub fn push_attribute(&self, attr: Rc<Attr>) {
        let el = self.as_element().expect("attribute on an element");
        debug_assert!(
            el.find_by_ns_local(attr.name.ns.as_ref(), &attr.name.local)
                .is_none(),
            "duplicate (namespace, local) attribute"
        );
        attr.set_owner(Some(&self.handle()));
        el.attrs.borrow_mut().push(attr);
        self.bump_generation();
    }

    pub fn remove_attribute(&self, name: &str) -> Option<Rc<Attr>> {
        let el = self.as_element()?;
        let folded = self.fold_lookup_name(name);
        let index = el
            .attrs
            .borrow()
            .iter()
            .position(|a| a.matches_qualified(&folded))?;
        let attr = el.attrs.borrow_mut().remove(index);
        attr.set_owner(None);
        self.bump_generation();
        Some(attr)
    }

    pub fn remove_attribute_ns(&self, ns: Option<&str>, local: &str) -> Option<Rc<Attr>> {
        let el = self.as_element()?;
        let ns = match ns {
            Some("") | None => None,
            Some(uri) => Some(Ns::from_uri(uri)),
        };
        let index = el
            .attrs
            .borrow()
            .iter()
            .position(|a| a.name.ns.as_ref() == ns.as_ref() && &*a.name.local == local)?;
        let attr = el.attrs.borrow_mut().remove(index);
        attr.set_owner(None);
        self.bump_generation();
        Some(attr)
    }

    // --- reflected attributes --------------------------------------------

    pub fn id(&self) -> String {
        self.get_attribute("id").unwrap_or_default()
    }

    pub fn set_id(&self, value: &str) -> Result<(), DomError> {
        self.set_attribute("id", value)
    }

    pub fn class_name(&self) -> String {
        self.get_attribute("class").unwrap_or_default()
    }

    pub fn class_list(&self) -> DomTokenList {
        DomTokenList {
            element: self.handle(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        !class.is_empty()
            && self
                .get_attribute("class")
                .is_some_and(|v| v.split_ascii_whitespace().any(|t| t == class))
    }

    /// CSS-selector entry points are deferred: the selector engine is an
    /// absent collaborator.
    pub fn matches(&self, _selectors: &str) -> Result<bool, DomError> {
        Err(DomError::NotSupported)
    }

    pub fn closest(&self, _selectors: &str) -> Result<Option<NodeRef>, DomError> {
        Err(DomError::NotSupported)
    }
}

/// Ordered set view over the `class` attribute. Mutations write straight
/// back through `set_attribute`, which handles invalidation.
pub struct DomTokenList {
    element: NodeRef,
}

impl DomTokenList {
    pub fn tokens(&self) -> Vec<String> {
        let mut seen = Vec::new();
        if let Some(value) = self.element.get_attribute("class") {
            for token in value.split_ascii_whitespace() {
                if !seen.iter().any(|t: &String| t == token) {
                    seen.push(token.to_string());
                }
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens().is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens().iter().any(|t| t == token)
    }

    pub fn add(&self, token: &str) -> Result<(), DomError> {
        validate_token(token)?;
        let mut tokens = self.tokens();
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
            self.write_back(&tokens)?;
        }
        Ok(())
    }

    pub fn remove(&self, token: &str) -> Result<(), DomError> {
        validate_token(token)?;
        let mut tokens = self.tokens();
        let before = tokens.len();
        tokens.retain(|t| t != token);
        if tokens.len() != before {
            self.write_back(&tokens)?;
        }
        Ok(())
    }

    pub fn toggle(&self, token: &str) -> Result<bool, DomError> {
        validate_token(token)?;
        if self.contains(token) {
            self.remove(token)?;
            Ok(false)
        } else {
            self.add(token)?;
            Ok(true)
        }
    }

    fn write_back(&self, tokens: &[String]) -> Result<(), DomError> {
        self.element.set_attribute("class", &tokens.join(" "))
    }
}

fn validate_token(token: &str) -> Result<(), DomError> {
    if token.is_empty() {
        return Err(DomError::Syntax);
    }
    if token.chars().any(|c| c.is_ascii_whitespace()) {
        return Err(DomError::InvalidCharacter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn element() -> (NodeRef, NodeRef) {
        let doc = Document::new_html();
        let el = doc.create_element("div").expect("element");
        (doc, el)
    }

    #[test]
    fn attribute_set_get_remove_round_trip() {
        let (_doc, el) = element();
        assert!(el.get_attribute("data-x").is_none());
        el.set_attribute("data-x", "1").expect("set");
        assert_eq!(el.get_attribute("data-x").as_deref(), Some("1"));
        el.set_attribute("DATA-X", "2").expect("set folds case");
        assert_eq!(el.get_attribute("data-x").as_deref(), Some("2"));
        assert_eq!(el.as_element().expect("element").attr_count(), 1);
        let removed = el.remove_attribute("data-x").expect("removed");
        assert!(removed.owner_element().is_none());
        assert!(!el.has_attribute("data-x"));
    }

    #[test]
    fn namespaced_attributes_do_not_collide_with_plain_ones() {
        let (_doc, el) = element();
        el.set_attribute("href", "a").expect("set");
        el.set_attribute_ns(Some(crate::name::XLINK_NS), "xlink:href", "b")
            .expect("set ns");
        assert_eq!(el.get_attribute("href").as_deref(), Some("a"));
        assert_eq!(
            el.get_attribute_ns(Some(crate::name::XLINK_NS), "href")
                .as_deref(),
            Some("b")
        );
        assert_eq!(el.get_attribute("xlink:href").as_deref(), Some("b"));
        assert_eq!(el.as_element().expect("element").attr_count(), 2);
    }

    #[test]
    fn invalid_attribute_names_are_rejected_before_mutation() {
        let (_doc, el) = element();
        assert_eq!(
            el.set_attribute("not valid", "x"),
            Err(DomError::InvalidCharacter)
        );
        assert_eq!(el.as_element().expect("element").attr_count(), 0);
    }

    #[test]
    fn class_list_round_trips_through_the_class_attribute() {
        let (_doc, el) = element();
        let list = el.class_list();
        list.add("a").expect("add");
        list.add("b").expect("add");
        list.add("a").expect("idempotent add");
        assert_eq!(el.get_attribute("class").as_deref(), Some("a b"));
        assert!(list.contains("b"));
        assert!(list.toggle("c").expect("toggle on"));
        assert!(!list.toggle("c").expect("toggle off"));
        list.remove("a").expect("remove");
        assert_eq!(el.get_attribute("class").as_deref(), Some("b"));
        assert_eq!(list.add(""), Err(DomError::Syntax));
        assert_eq!(list.add("a b"), Err(DomError::InvalidCharacter));
    }
}
