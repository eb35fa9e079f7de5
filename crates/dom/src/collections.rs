//! Live collections: filtered views that never snapshot.
//!
//! Each collection caches its member list keyed on the owner document's
//! mutation generation; any tree or attribute mutation bumps the generation,
//! so the next access recomputes lazily.

use std::cell::RefCell;

use crate::name::Ns;
use crate::node::{descendants, Node, NodeRef};

#[derive(Clone)]
pub(crate) enum CollectionFilter {
    /// `get_elements_by_tag_name`: qualified-name match with `*` wildcard.
    /// HTML-namespace elements compare against the lowercased name.
    TagName { name: String, folded: String },
    /// `get_elements_by_tag_name_ns`: `*` wildcards namespace and local.
    TagNameNs {
        ns: Option<String>,
        ns_any: bool,
        local: String,
    },
    /// `get_elements_by_class_name`: every listed class must be present.
    ClassName { classes: Vec<String> },
    /// `children`: element children of the root only.
    Children,
    /// `<table>.rows`: section-ordered table rows.
    TableRows,
}

/// Live, lazily recomputed element collection.
pub struct HtmlCollection {
    root: NodeRef,
    filter: CollectionFilter,
    cache: RefCell<Option<(u64, Vec<NodeRef>)>>,
}

impl HtmlCollection {
    pub(crate) fn new(root: NodeRef, filter: CollectionFilter) -> Self {
        Self {
            root,
            filter,
            cache: RefCell::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.with_items(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current n-th matching element.
    pub fn item(&self, index: usize) -> Option<NodeRef> {
        self.with_items(|items| items.get(index).cloned())
    }

    pub fn to_vec(&self) -> Vec<NodeRef> {
        self.with_items(|items| items.to_vec())
    }

    fn with_items<R>(&self, f: impl FnOnce(&[NodeRef]) -> R) -> R {
        let generation = self
            .root
            .owner_doc()
            .as_document()
            .map(|d| d.generation())
            .unwrap_or(0);
        let mut cache = self.cache.borrow_mut();
        let stale = match &*cache {
            Some((cached_generation, _)) => *cached_generation != generation,
            None => true,
        };
        if stale {
            *cache = Some((generation, compute_members(&self.root, &self.filter)));
        }
        f(&cache.as_ref().expect("cache filled above").1)
    }
}

fn compute_members(root: &NodeRef, filter: &CollectionFilter) -> Vec<NodeRef> {
    match filter {
        CollectionFilter::Children => root
            .child_nodes()
            .into_iter()
            .filter(|c| c.as_element().is_some())
            .collect(),
        CollectionFilter::TableRows => table_rows_in_order(root),
        _ => descendants(root)
            .filter(|n| n.as_element().is_some() && matches_filter(n, filter))
            .collect(),
    }
}

fn matches_filter(node: &NodeRef, filter: &CollectionFilter) -> bool {
    let el = node.as_element().expect("filter runs on elements");
    match filter {
        CollectionFilter::TagName { name, folded } => {
            if name == "*" {
                return true;
            }
            let qualified = el.name.qualified();
            if el.name.ns == Some(Ns::Html) {
                qualified == *folded
            } else {
                qualified == *name
            }
        }
        CollectionFilter::TagNameNs { ns, ns_any, local } => {
            let local_matches = local == "*" || &*el.name.local == local;
            if !local_matches {
                return false;
            }
            if *ns_any {
                return true;
            }
            match (ns, &el.name.ns) {
                (None, None) => true,
                (Some(uri), Some(element_ns)) => element_ns.uri() == uri,
                _ => false,
            }
        }
        CollectionFilter::ClassName { classes } => {
            classes.iter().all(|class| node.has_class(class))
        }
        CollectionFilter::Children | CollectionFilter::TableRows => true,
    }
}

/// `<table>.rows` order: thead rows first, then direct and tbody rows in
/// tree order, then tfoot rows.
fn table_rows_in_order(table: &NodeRef) -> Vec<NodeRef> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();
    for child in table.child_nodes() {
        if child.is_html_element("tr") {
            body.push(child);
        } else if child.is_html_element("thead") {
            head.extend(child.child_nodes().into_iter().filter(|c| c.is_html_element("tr")));
        } else if child.is_html_element("tfoot") {
            foot.extend(child.child_nodes().into_iter().filter(|c| c.is_html_element("tr")));
        } else if child.is_html_element("tbody") {
            body.extend(child.child_nodes().into_iter().filter(|c| c.is_html_element("tr")));
        }
    }
    head.into_iter().chain(body).chain(foot).collect()
}

impl Node {
    pub fn get_elements_by_tag_name(&self, name: &str) -> HtmlCollection {
        HtmlCollection::new(
            self.handle(),
            CollectionFilter::TagName {
                name: name.to_string(),
                folded: name.to_ascii_lowercase(),
            },
        )
    }

    pub fn get_elements_by_tag_name_ns(&self, ns: Option<&str>, local: &str) -> HtmlCollection {
        let ns_any = ns == Some("*");
        let ns = match ns {
            Some("") | None => None,
            Some(uri) => Some(uri.to_string()),
        };
        HtmlCollection::new(
            self.handle(),
            CollectionFilter::TagNameNs {
                ns,
                ns_any,
                local: local.to_string(),
            },
        )
    }

    /// Elements carrying every class in the space-separated `classes` list.
    pub fn get_elements_by_class_name(&self, classes: &str) -> HtmlCollection {
        HtmlCollection::new(
            self.handle(),
            CollectionFilter::ClassName {
                classes: classes
                    .split_ascii_whitespace()
                    .map(str::to_string)
                    .collect(),
            },
        )
    }

    /// Live element-children collection.
    pub fn children(&self) -> HtmlCollection {
        HtmlCollection::new(self.handle(), CollectionFilter::Children)
    }
}
