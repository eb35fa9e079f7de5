//! DOM tree model: node kinds, mutation algorithms, element registry, live
//! collections, traversal helpers, ranges and serializers.
//!
//! The parsing pipeline lives in the `html` crate and drives this model
//! through the same public mutation surface user code calls.

pub mod collections;
pub mod document;
pub mod element;
pub mod error;
pub mod name;
pub mod node;
pub mod range;
pub mod registry;
pub mod serialize;
pub mod snapshot;
pub mod table;
pub mod traversal;

mod mutation;

pub use crate::collections::HtmlCollection;
pub use crate::document::{CompatMode, Document, DocumentData, UrlJoiner};
pub use crate::element::{Attr, DomTokenList, ElementData};
pub use crate::error::DomError;
pub use crate::name::{Ns, QualName};
pub use crate::node::{Node, NodeData, NodeKind, NodeRef};
pub use crate::range::Range;
pub use crate::registry::ElementKind;
pub use crate::serialize::{serialize_html, serialize_xml, SerializeOptions};
pub use crate::snapshot::snapshot;
pub use crate::traversal::{FilterResult, NodeFilter, NodeIterator, TreeWalker};
