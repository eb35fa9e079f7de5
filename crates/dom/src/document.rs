//! Document state, node factories and document-level queries.
//!
//! There is no process-wide default document: every factory hangs off a
//! document handle, and standalone nodes are created through these methods.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::element::{Attr, ElementData};
use crate::error::DomError;
use crate::name::{is_valid_name, validate_and_extract, Ns, QualName};
use crate::node::{
    descendants, CharData, DoctypeData, Node, NodeData, NodeRef, PiData,
};
use crate::range::RangeState;
use crate::registry::{kind_for, ElementKind};
use crate::traversal::IteratorState;

/// Compatibility mode inferred from the doctype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompatMode {
    #[default]
    NoQuirks,
    LimitedQuirks,
    Quirks,
}

/// Pluggable URL joiner used for `<base href>` processing. The real URL
/// parser is an external collaborator; the default joiner covers absolute
/// and path-relative references well enough for base-URL bookkeeping.
pub trait UrlJoiner {
    fn join(&self, base: &str, reference: &str) -> Option<String>;
}

struct DefaultUrlJoiner;

impl UrlJoiner for DefaultUrlJoiner {
    fn join(&self, base: &str, reference: &str) -> Option<String> {
        if has_scheme(reference) {
            return Some(reference.to_string());
        }
        if !has_scheme(base) {
            return None;
        }
        if let Some(rest) = reference.strip_prefix("//") {
            let scheme_end = base.find(':').expect("scheme checked");
            return Some(format!("{}://{rest}", &base[..scheme_end]));
        }
        let authority_end = base
            .find("://")
            .map(|i| {
                base[i + 3..]
                    .find('/')
                    .map(|j| i + 3 + j)
                    .unwrap_or(base.len())
            })
            .unwrap_or_else(|| base.find(':').expect("scheme checked") + 1);
        if let Some(path) = reference.strip_prefix('/') {
            return Some(format!("{}/{path}", &base[..authority_end]));
        }
        let dir_end = base[authority_end..]
            .rfind('/')
            .map(|i| authority_end + i + 1)
            .unwrap_or(base.len());
        Some(format!("{}{reference}", &base[..dir_end]))
    }
}

fn has_scheme(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return false;
    };
    let scheme = &url[..colon];
    let mut bytes = scheme.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

const FLAG_INERT_TEMPLATE: u8 = 0x01;

pub struct DocumentData {
    pub content_type: RefCell<String>,
    pub charset: RefCell<String>,
    mode: Cell<CompatMode>,
    url: RefCell<String>,
    base_url: RefCell<Option<String>>,
    flags: Cell<u8>,
    /// Lazily created inert sibling document owning `<template>` contents.
    template_doc: RefCell<Option<NodeRef>>,
    /// Back-reference from an inert template contents document to its host.
    template_host: RefCell<Weak<Node>>,
    generation: Cell<u64>,
    pub(crate) iterators: RefCell<Vec<Weak<IteratorState>>>,
    pub(crate) ranges: RefCell<Vec<Weak<RangeState>>>,
    url_joiner: RefCell<Rc<dyn UrlJoiner>>,
}

impl std::fmt::Debug for DocumentData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentData")
            .field("content_type", &self.content_type.borrow())
            .field("mode", &self.mode.get())
            .field("url", &self.url.borrow())
            .finish_non_exhaustive()
    }
}

impl DocumentData {
    fn new(content_type: &str, url: &str) -> Self {
        Self {
            content_type: RefCell::new(content_type.to_string()),
            charset: RefCell::new("UTF-8".to_string()),
            mode: Cell::new(CompatMode::NoQuirks),
            url: RefCell::new(url.to_string()),
            base_url: RefCell::new(None),
            flags: Cell::new(0),
            template_doc: RefCell::new(None),
            template_host: RefCell::new(Weak::new()),
            generation: Cell::new(0),
            iterators: RefCell::new(Vec::new()),
            ranges: RefCell::new(Vec::new()),
            url_joiner: RefCell::new(Rc::new(DefaultUrlJoiner)),
        }
    }

    pub fn mode(&self) -> CompatMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: CompatMode) {
        self.mode.set(mode);
    }

    pub fn url(&self) -> String {
        self.url.borrow().clone()
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .borrow()
            .clone()
            .unwrap_or_else(|| self.url())
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn bump(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    /// Inert for forms/scripts: set on template contents documents.
    pub fn is_inert_template(&self) -> bool {
        self.flags.get() & FLAG_INERT_TEMPLATE != 0
    }

    pub fn set_url_joiner(&self, joiner: Rc<dyn UrlJoiner>) {
        *self.url_joiner.borrow_mut() = joiner;
    }
}

/// Document constructors.
pub struct Document;

impl Document {
    /// Empty HTML document (what the parser starts from).
    pub fn new() -> NodeRef {
        Self::with_url("about:blank")
    }

    pub fn with_url(url: &str) -> NodeRef {
        Node::new_document(DocumentData::new("text/html", url))
    }

    /// HTML document with the standard skeleton: doctype, html, head, body.
    pub fn new_html() -> NodeRef {
        let doc = Self::new();
        let doctype = doc.create_doctype("html", "", "");
        let html = doc.create_element("html").expect("known-valid name");
        let head = doc.create_element("head").expect("known-valid name");
        let body = doc.create_element("body").expect("known-valid name");
        doc.append_child(&doctype).expect("fresh document");
        doc.append_child(&html).expect("fresh document");
        html.append_child(&head).expect("fresh element");
        html.append_child(&body).expect("fresh element");
        doc
    }
}

impl Node {
    fn document_data(&self) -> Result<&DocumentData, DomError> {
        self.as_document().ok_or(DomError::InvalidNodeType)
    }

    /// Increment the owner document's mutation generation (invalidates live
    /// collection caches).
    pub(crate) fn bump_generation(&self) {
        if let Some(doc) = self.owner_doc().as_document() {
            doc.bump();
        }
    }

    // --- factories --------------------------------------------------------

    /// Create an HTML-namespace element via the registry. The local name is
    /// ASCII-lowercased for HTML documents before the registry lookup.
    pub fn create_element(&self, local: &str) -> Result<NodeRef, DomError> {
        self.document_data()?;
        if !is_valid_name(local) {
            return Err(DomError::InvalidCharacter);
        }
        let local = local.to_ascii_lowercase();
        Ok(self.create_element_raw(QualName::html(local.as_str())))
    }

    pub fn create_element_ns(
        &self,
        ns: Option<&str>,
        qualified: &str,
    ) -> Result<NodeRef, DomError> {
        self.document_data()?;
        let name = validate_and_extract(ns, qualified)?;
        Ok(self.create_element_raw(name))
    }

    /// Registry-backed creation for an already-validated qualified name.
    /// This is the single element creation path; the parser calls it with
    /// tokenizer-canonicalized names.
    pub fn create_element_raw(&self, name: QualName) -> NodeRef {
        debug_assert!(self.as_document().is_some(), "factory on a document");
        let kind = match &name.ns {
            Some(ns) => kind_for(ns, &name.local),
            None => ElementKind::HtmlUnknown,
        };
        let element = Node::new(
            NodeData::Element(ElementData::new(name, kind)),
            self.self_weak.clone(),
        );
        if kind == ElementKind::Template {
            let contents_doc = self.template_contents_document();
            let fragment = contents_doc.create_document_fragment();
            *element
                .as_element()
                .expect("just created an element")
                .template_contents
                .borrow_mut() = Some(fragment);
        }
        element
    }

    pub fn create_text_node(&self, data: impl Into<String>) -> NodeRef {
        debug_assert!(self.as_document().is_some(), "factory on a document");
        Node::new(NodeData::Text(CharData::new(data)), self.self_weak.clone())
    }

    pub fn create_comment(&self, data: impl Into<String>) -> NodeRef {
        debug_assert!(self.as_document().is_some(), "factory on a document");
        Node::new(
            NodeData::Comment(CharData::new(data)),
            self.self_weak.clone(),
        )
    }

    pub fn create_cdata_section(&self, data: impl Into<String>) -> Result<NodeRef, DomError> {
        let doc = self.document_data()?;
        if doc.content_type.borrow().as_str() == "text/html" {
            return Err(DomError::NotSupported);
        }
        let data = data.into();
        if data.contains("]]>") {
            return Err(DomError::InvalidCharacter);
        }
        Ok(Node::new(
            NodeData::CdataSection(CharData::new(data)),
            self.self_weak.clone(),
        ))
    }

    pub fn create_document_fragment(&self) -> NodeRef {
        debug_assert!(self.as_document().is_some(), "factory on a document");
        Node::new(NodeData::DocumentFragment, self.self_weak.clone())
    }

    pub fn create_processing_instruction(
        &self,
        target: &str,
        data: impl Into<String>,
    ) -> Result<NodeRef, DomError> {
        self.document_data()?;
        if !is_valid_name(target) {
            return Err(DomError::InvalidCharacter);
        }
        let data = data.into();
        if data.contains("?>") {
            return Err(DomError::InvalidCharacter);
        }
        Ok(Node::new(
            NodeData::ProcessingInstruction(PiData {
                target: target.to_string(),
                data: RefCell::new(data),
            }),
            self.self_weak.clone(),
        ))
    }

    pub fn create_doctype(&self, name: &str, public_id: &str, system_id: &str) -> NodeRef {
        debug_assert!(self.as_document().is_some(), "factory on a document");
        Node::new(
            NodeData::DocumentType(DoctypeData {
                name: name.to_string(),
                public_id: public_id.to_string(),
                system_id: system_id.to_string(),
            }),
            self.self_weak.clone(),
        )
    }

    pub fn create_attribute(&self, name: &str) -> Result<Rc<Attr>, DomError> {
        self.document_data()?;
        if !is_valid_name(name) {
            return Err(DomError::InvalidCharacter);
        }
        let local = if self.document_data()?.content_type.borrow().as_str() == "text/html" {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        Ok(Attr::new(QualName::new(None, None, local.as_str()), ""))
    }

    pub fn create_attribute_ns(
        &self,
        ns: Option<&str>,
        qualified: &str,
    ) -> Result<Rc<Attr>, DomError> {
        self.document_data()?;
        let name = validate_and_extract(ns, qualified)?;
        Ok(Attr::new(name, ""))
    }

    // --- template contents document --------------------------------------

    /// The per-document inert template contents document, created lazily.
    pub fn template_contents_document(&self) -> NodeRef {
        let doc = self.as_document().expect("document node");
        if let Some(existing) = doc.template_doc.borrow().clone() {
            return existing;
        }
        let inert = Document::new();
        {
            let inert_data = inert.as_document().expect("just created a document");
            inert_data.flags.set(inert_data.flags.get() | FLAG_INERT_TEMPLATE);
            *inert_data.template_host.borrow_mut() = self.self_weak.clone();
        }
        *doc.template_doc.borrow_mut() = Some(inert.clone());
        inert
    }

    // --- document queries -------------------------------------------------

    pub fn doctype(&self) -> Option<NodeRef> {
        self.children
            .borrow()
            .iter()
            .find(|c| c.as_doctype().is_some())
            .cloned()
    }

    /// `<body>` (or `<frameset>`) child of the document element.
    pub fn body(&self) -> Option<NodeRef> {
        let html = self.document_element()?;
        html.child_nodes()
            .into_iter()
            .find(|c| c.is_html_element("body") || c.is_html_element("frameset"))
    }

    pub fn head(&self) -> Option<NodeRef> {
        let html = self.document_element()?;
        html.child_nodes()
            .into_iter()
            .find(|c| c.is_html_element("head"))
    }

    /// First element in tree order whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeRef> {
        if id.is_empty() {
            return None;
        }
        let root = self.handle();
        descendants(&root).find(|n| {
            n.as_element().is_some() && n.get_attribute("id").as_deref() == Some(id)
        })
    }

    // --- base URL ---------------------------------------------------------

    pub fn url(&self) -> String {
        self.as_document().map(|d| d.url()).unwrap_or_default()
    }

    pub fn base_url(&self) -> String {
        self.as_document().map(|d| d.base_url()).unwrap_or_default()
    }

    /// Re-evaluate the document base URL from the first `<base href>` in
    /// tree order. Invoked by the `<base>` insertion/removing steps.
    pub(crate) fn refresh_base_url(&self) {
        let Some(doc) = self.as_document() else {
            return;
        };
        let root = self.handle();
        let base_href = descendants(&root).find_map(|n| {
            if n.is_html_element("base") {
                n.get_attribute("href")
            } else {
                None
            }
        });
        let resolved = base_href.and_then(|href| {
            let joiner = doc.url_joiner.borrow().clone();
            joiner.join(&doc.url(), href.trim())
        });
        *doc.base_url.borrow_mut() = resolved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_document_has_head_and_body() {
        let doc = Document::new_html();
        assert!(doc.doctype().is_some());
        let html = doc.document_element().expect("document element");
        assert!(html.is_html_element("html"));
        assert!(doc.head().expect("head").is_html_element("head"));
        assert!(doc.body().expect("body").is_html_element("body"));
    }

    #[test]
    fn create_element_folds_case_and_validates() {
        let doc = Document::new();
        let el = doc.create_element("DIV").expect("valid name");
        let data = el.as_element().expect("element");
        assert_eq!(&*data.name.local, "div");
        assert_eq!(data.kind, ElementKind::Div);
        assert_eq!(
            doc.create_element("1bad").err(),
            Some(DomError::InvalidCharacter)
        );
    }

    #[test]
    fn template_contents_live_in_the_inert_document() {
        let doc = Document::new();
        let template = doc.create_element("template").expect("valid name");
        let contents = template
            .as_element()
            .expect("element")
            .template_contents()
            .expect("template has contents");
        let inert = contents.owner_document().expect("fragment has an owner");
        assert!(inert.as_document().expect("document").is_inert_template());
        assert!(!std::rc::Rc::ptr_eq(&inert, &doc));
        // The inert document is shared across templates of one document.
        let second = doc.create_element("template").expect("valid name");
        let other = second
            .as_element()
            .expect("element")
            .template_contents()
            .expect("contents");
        assert!(std::rc::Rc::ptr_eq(
            &other.owner_document().expect("owner"),
            &inert
        ));
    }

    #[test]
    fn get_element_by_id_finds_first_in_tree_order() {
        let doc = Document::new_html();
        let body = doc.body().expect("body");
        let first = doc.create_element("div").expect("valid");
        first.set_id("x").expect("id");
        let second = doc.create_element("span").expect("valid");
        second.set_id("x").expect("id");
        body.append_child(&first).expect("append");
        body.append_child(&second).expect("append");
        let found = doc.get_element_by_id("x").expect("found");
        assert!(std::rc::Rc::ptr_eq(&found, &first));
        assert!(doc.get_element_by_id("").is_none());
        assert!(doc.get_element_by_id("missing").is_none());
    }

    #[test]
    fn default_url_joiner_handles_common_shapes() {
        let joiner = DefaultUrlJoiner;
        assert_eq!(
            joiner.join("http://a/b/c", "http://x/y").as_deref(),
            Some("http://x/y")
        );
        assert_eq!(
            joiner.join("http://a/b/c", "/root").as_deref(),
            Some("http://a/root")
        );
        assert_eq!(
            joiner.join("http://a/b/c", "d").as_deref(),
            Some("http://a/b/d")
        );
        assert_eq!(
            joiner.join("http://a/b/c", "//h/p").as_deref(),
            Some("http://h/p")
        );
        assert!(joiner.join("notaurl", "d").is_none());
    }
}
