//! HTML and XML serialization.
//!
//! HTML serialization follows the fragment serialization rules: void
//! elements drop end tags and children, raw-text children are emitted
//! unescaped, and a leading newline in `pre`/`textarea`/`listing` text gets
//! an extra newline so parsing the output round-trips.

use memchr::{memchr, memchr3};

use crate::error::DomError;
use crate::name::{is_valid_name, Ns};
use crate::node::{Node, NodeData, NodeRef};
use crate::registry::{is_void, serializes_raw_text};

#[derive(Clone, Copy, Debug, Default)]
pub struct SerializeOptions {
    /// XML serialization fails on content that cannot be represented
    /// well-formed; ignored by the HTML serializer (which never fails).
    pub require_well_formed: bool,
}

/// Serialize to HTML text. Documents and fragments serialize their children;
/// any other node serializes itself.
pub fn serialize_html(node: &NodeRef, _options: SerializeOptions) -> String {
    let mut out = String::new();
    match node.data() {
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.child_nodes() {
                serialize_html_node(&child, &mut out);
            }
        }
        _ => serialize_html_node(node, &mut out),
    }
    out
}

fn serialize_html_node(node: &NodeRef, out: &mut String) {
    match node.data() {
        NodeData::Element(el) => {
            let tag_name: String = match el.name.ns {
                Some(Ns::Html) | Some(Ns::MathMl) | Some(Ns::Svg) => el.name.local.to_string(),
                _ => el.name.qualified(),
            };
            out.push('<');
            out.push_str(&tag_name);
            for attr in el.attributes() {
                out.push(' ');
                out.push_str(&html_attr_name(&attr.name));
                out.push('=');
                out.push('"');
                escape_into(&attr.value(), true, out);
                out.push('"');
            }
            out.push('>');
            let is_html = el.name.ns == Some(Ns::Html);
            if is_html && is_void(&el.name.local) {
                return;
            }
            if is_html && matches!(&*el.name.local, "pre" | "textarea" | "listing") {
                if let Some(first) = node.first_child() {
                    if let NodeData::Text(cd) = first.data() {
                        if cd.data.borrow().starts_with('\n') {
                            out.push('\n');
                        }
                    }
                }
            }
            // Template elements serialize their contents fragment.
            let children = match el.template_contents() {
                Some(contents) => contents.child_nodes(),
                None => node.child_nodes(),
            };
            let raw = is_html && serializes_raw_text(&el.name.local);
            for child in children {
                if raw {
                    if let Some(cd) = child.as_char_data() {
                        out.push_str(&cd.data.borrow());
                        continue;
                    }
                }
                serialize_html_node(&child, out);
            }
            out.push_str("</");
            out.push_str(&tag_name);
            out.push('>');
        }
        NodeData::Text(cd) | NodeData::CdataSection(cd) => {
            escape_into(&cd.data.borrow(), false, out);
        }
        NodeData::Comment(cd) => {
            out.push_str("<!--");
            out.push_str(&cd.data.borrow());
            out.push_str("-->");
        }
        NodeData::ProcessingInstruction(pi) => {
            out.push_str("<?");
            out.push_str(&pi.target);
            out.push(' ');
            out.push_str(&pi.data.borrow());
            out.push_str("?>");
        }
        NodeData::DocumentType(dt) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(&dt.name);
            if !dt.public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(&dt.public_id);
                out.push('"');
                if !dt.system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(&dt.system_id);
                    out.push('"');
                }
            } else if !dt.system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(&dt.system_id);
                out.push('"');
            }
            out.push('>');
        }
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.child_nodes() {
                serialize_html_node(&child, out);
            }
        }
    }
}

fn html_attr_name(name: &crate::name::QualName) -> String {
    match &name.ns {
        None => name.local.to_string(),
        Some(Ns::Xml) => format!("xml:{}", name.local),
        Some(Ns::XLink) => format!("xlink:{}", name.local),
        Some(Ns::Xmlns) => {
            if &*name.local == "xmlns" {
                "xmlns".to_string()
            } else {
                format!("xmlns:{}", name.local)
            }
        }
        Some(_) => name.qualified(),
    }
}

/// Escape text for HTML output. Attribute mode escapes `"`; text mode
/// escapes `<` and `>`. Both escape `&` and U+00A0.
fn escape_into(text: &str, attr_mode: bool, out: &mut String) {
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        // Fast scan for the next byte that can start an escape: `&`, the
        // mode-dependent pair, or the first byte of U+00A0 (0xC2).
        let found = if attr_mode {
            next_of(bytes, i, b'&', b'"', 0xC2)
        } else {
            match memchr3(b'&', b'<', b'>', &bytes[i..]) {
                Some(rel) => {
                    let nbsp = memchr(0xC2, &bytes[i..]);
                    Some(i + nbsp.map_or(rel, |n| n.min(rel)))
                }
                None => memchr(0xC2, &bytes[i..]).map(|rel| i + rel),
            }
        };
        let Some(pos) = found else {
            break;
        };
        let replacement = match bytes[pos] {
            b'&' => "&amp;",
            b'"' if attr_mode => "&quot;",
            b'<' if !attr_mode => "&lt;",
            b'>' if !attr_mode => "&gt;",
            0xC2 if bytes.get(pos + 1) == Some(&0xA0) => "&nbsp;",
            _ => {
                i = pos + 1;
                continue;
            }
        };
        out.push_str(&text[start..pos]);
        out.push_str(replacement);
        start = pos + if bytes[pos] == 0xC2 { 2 } else { 1 };
        i = start;
    }
    out.push_str(&text[start..]);
}

fn next_of(bytes: &[u8], from: usize, a: u8, b: u8, c: u8) -> Option<usize> {
    memchr3(a, b, c, &bytes[from..]).map(|rel| from + rel)
}

// --- XML -------------------------------------------------------------------

/// Serialize to XML text. With `require_well_formed`, content that cannot be
/// represented well-formed is rejected with a syntax error.
pub fn serialize_xml(node: &NodeRef, options: SerializeOptions) -> Result<String, DomError> {
    let mut out = String::new();
    match node.data() {
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.child_nodes() {
                serialize_xml_node(&child, options, &mut out)?;
            }
        }
        _ => serialize_xml_node(node, options, &mut out)?,
    }
    Ok(out)
}

fn serialize_xml_node(
    node: &NodeRef,
    options: SerializeOptions,
    out: &mut String,
) -> Result<(), DomError> {
    match node.data() {
        NodeData::Element(el) => {
            let tag_name = el.name.qualified();
            if options.require_well_formed && !is_valid_name(&tag_name) {
                return Err(DomError::Syntax);
            }
            out.push('<');
            out.push_str(&tag_name);
            for attr in el.attributes() {
                let attr_name = html_attr_name(&attr.name);
                if options.require_well_formed && !is_valid_name(&attr_name) {
                    return Err(DomError::Syntax);
                }
                out.push(' ');
                out.push_str(&attr_name);
                out.push_str("=\"");
                xml_escape_into(&attr.value(), true, out);
                out.push('"');
            }
            if node.child_count() == 0 {
                out.push_str("/>");
                return Ok(());
            }
            out.push('>');
            for child in node.child_nodes() {
                serialize_xml_node(&child, options, out)?;
            }
            out.push_str("</");
            out.push_str(&tag_name);
            out.push('>');
        }
        NodeData::Text(cd) => xml_escape_into(&cd.data.borrow(), false, out),
        NodeData::CdataSection(cd) => {
            let data = cd.data.borrow();
            if options.require_well_formed && data.contains("]]>") {
                return Err(DomError::Syntax);
            }
            out.push_str("<![CDATA[");
            out.push_str(&data);
            out.push_str("]]>");
        }
        NodeData::Comment(cd) => {
            let data = cd.data.borrow();
            if options.require_well_formed && (data.contains("--") || data.ends_with('-')) {
                return Err(DomError::Syntax);
            }
            out.push_str("<!--");
            out.push_str(&data);
            out.push_str("-->");
        }
        NodeData::ProcessingInstruction(pi) => {
            if options.require_well_formed
                && (pi.target.eq_ignore_ascii_case("xml") || pi.data.borrow().contains("?>"))
            {
                return Err(DomError::Syntax);
            }
            out.push_str("<?");
            out.push_str(&pi.target);
            out.push(' ');
            out.push_str(&pi.data.borrow());
            out.push_str("?>");
        }
        NodeData::DocumentType(dt) => {
            if options.require_well_formed
                && (dt.system_id.contains('"') && dt.system_id.contains('\''))
            {
                return Err(DomError::Syntax);
            }
            out.push_str("<!DOCTYPE ");
            out.push_str(&dt.name);
            if !dt.public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(&dt.public_id);
                out.push_str("\" \"");
                out.push_str(&dt.system_id);
                out.push('"');
            } else if !dt.system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(&dt.system_id);
                out.push('"');
            }
            out.push('>');
        }
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.child_nodes() {
                serialize_xml_node(&child, options, out)?;
            }
        }
    }
    Ok(())
}

fn xml_escape_into(text: &str, attr_mode: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr_mode => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

impl Node {
    pub fn serialize_html(&self, options: SerializeOptions) -> String {
        serialize_html(&self.handle(), options)
    }

    pub fn serialize_xml(&self, options: SerializeOptions) -> Result<String, DomError> {
        serialize_xml(&self.handle(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn escapes_text_and_attribute_values() {
        let doc = Document::new_html();
        let div = doc.create_element("div").expect("valid");
        div.set_attribute("title", "a\"b&c\u{a0}d<e").expect("set");
        div.append_child(&doc.create_text_node("x<y>&\u{a0}z"))
            .expect("append");
        let html = serialize_html(&div, SerializeOptions::default());
        assert_eq!(
            html,
            "<div title=\"a&quot;b&amp;c&nbsp;d<e\">x&lt;y&gt;&amp;&nbsp;z</div>"
        );
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let doc = Document::new_html();
        let br = doc.create_element("br").expect("valid");
        assert_eq!(serialize_html(&br, SerializeOptions::default()), "<br>");
    }

    #[test]
    fn raw_text_children_are_not_escaped() {
        let doc = Document::new_html();
        let style = doc.create_element("style").expect("valid");
        style
            .append_child(&doc.create_text_node("a > b { }"))
            .expect("append");
        assert_eq!(
            serialize_html(&style, SerializeOptions::default()),
            "<style>a > b { }</style>"
        );
    }

    #[test]
    fn pre_leading_newline_round_trips() {
        let doc = Document::new_html();
        let pre = doc.create_element("pre").expect("valid");
        pre.append_child(&doc.create_text_node("\nline")).expect("append");
        assert_eq!(
            serialize_html(&pre, SerializeOptions::default()),
            "<pre>\n\nline</pre>"
        );
    }

    #[test]
    fn doctype_legacy_ids_only_when_non_empty() {
        let doc = Document::new();
        let plain = doc.create_doctype("html", "", "");
        assert_eq!(
            serialize_html(&plain, SerializeOptions::default()),
            "<!DOCTYPE html>"
        );
        let legacy = doc.create_doctype("html", "-//W3C//DTD HTML 4.01//EN", "url");
        assert_eq!(
            serialize_html(&legacy, SerializeOptions::default()),
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"url\">"
        );
    }

    #[test]
    fn xml_serialization_checks_well_formedness() {
        let doc = Document::new_html();
        let comment = doc.create_comment("a--b");
        let strict = SerializeOptions {
            require_well_formed: true,
        };
        assert_eq!(serialize_xml(&comment, strict), Err(DomError::Syntax));
        assert_eq!(
            serialize_xml(&comment, SerializeOptions::default()).as_deref(),
            Ok("<!--a--b-->")
        );
        let empty = doc.create_element("br").expect("valid");
        assert_eq!(serialize_xml(&empty, strict).as_deref(), Ok("<br/>"));
    }
}
