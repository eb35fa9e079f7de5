//! Compact tree snapshots for tests and debugging.
//!
//! Output shape: `document( doctype(html), html( head, body( p( "a" ) ) ) )`.
//! Elements carry attributes inline as `name[k=v]`; non-HTML namespaces are
//! prefixed (`svg circle`, `math mi`).

use crate::name::Ns;
use crate::node::{NodeData, NodeRef};

/// Render the subtree rooted at `node` as a single-line snapshot.
pub fn snapshot(node: &NodeRef) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &NodeRef, out: &mut String) {
    match node.data() {
        NodeData::Document(_) => write_parent("document", node, out),
        NodeData::DocumentFragment => write_parent("fragment", node, out),
        NodeData::DocumentType(dt) => {
            out.push_str("doctype(");
            out.push_str(&dt.name);
            out.push(')');
        }
        NodeData::Element(el) => {
            let mut label = match &el.name.ns {
                Some(Ns::Svg) => format!("svg {}", el.name.local),
                Some(Ns::MathMl) => format!("math {}", el.name.local),
                _ => el.name.local.to_string(),
            };
            let attrs = el.attributes();
            if !attrs.is_empty() {
                label.push('[');
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        label.push(' ');
                    }
                    label.push_str(&attr.name.qualified());
                    label.push('=');
                    label.push_str(&attr.value());
                }
                label.push(']');
            }
            write_parent(&label, node, out);
        }
        NodeData::Text(cd) | NodeData::CdataSection(cd) => {
            out.push('"');
            out.push_str(&cd.data.borrow());
            out.push('"');
        }
        NodeData::Comment(cd) => {
            out.push_str("#comment(\"");
            out.push_str(&cd.data.borrow());
            out.push_str("\")");
        }
        NodeData::ProcessingInstruction(pi) => {
            out.push('?');
            out.push_str(&pi.target);
            out.push_str("(\"");
            out.push_str(&pi.data.borrow());
            out.push_str("\")");
        }
    }
}

fn write_parent(label: &str, node: &NodeRef, out: &mut String) {
    out.push_str(label);
    let children = node.child_nodes();
    if children.is_empty() {
        return;
    }
    out.push_str("( ");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_node(child, out);
    }
    out.push_str(" )");
}
