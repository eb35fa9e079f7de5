//! Namespaces and qualified names.
//!
//! Invariant: HTML-namespace element and attribute locals are canonical ASCII
//! lowercase by the time they reach the DOM; the tokenizer folds them.

use std::fmt;
use std::sync::Arc;

use crate::error::DomError;

pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Element/attribute namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ns {
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    Xmlns,
    Other(Arc<str>),
}

impl Ns {
    pub fn from_uri(uri: &str) -> Ns {
        match uri {
            HTML_NS => Ns::Html,
            MATHML_NS => Ns::MathMl,
            SVG_NS => Ns::Svg,
            XLINK_NS => Ns::XLink,
            XML_NS => Ns::Xml,
            XMLNS_NS => Ns::Xmlns,
            other => Ns::Other(Arc::from(other)),
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Ns::Html => HTML_NS,
            Ns::MathMl => MATHML_NS,
            Ns::Svg => SVG_NS,
            Ns::XLink => XLINK_NS,
            Ns::Xml => XML_NS,
            Ns::Xmlns => XMLNS_NS,
            Ns::Other(uri) => uri,
        }
    }
}

/// Qualified name: optional namespace, optional prefix, interned local name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualName {
    pub ns: Option<Ns>,
    pub prefix: Option<Arc<str>>,
    pub local: Arc<str>,
}

impl QualName {
    pub fn new(ns: Option<Ns>, prefix: Option<Arc<str>>, local: impl Into<Arc<str>>) -> Self {
        Self {
            ns,
            prefix,
            local: local.into(),
        }
    }

    pub fn html(local: impl Into<Arc<str>>) -> Self {
        Self::new(Some(Ns::Html), None, local)
    }

    /// Derived qualified name: `prefix:local` when a prefix is present.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.to_string(),
        }
    }

    pub fn is_html(&self, local: &str) -> bool {
        self.ns == Some(Ns::Html) && &*self.local == local
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{prefix}:")?;
        }
        f.write_str(&self.local)
    }
}

/// XML `Name` production check (simplified to the name-start/name-char
/// classes the DOM validation path needs).
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !is_name_start_char(first) {
        return false;
    }
    chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    c == ':'
        || c == '_'
        || c.is_ascii_alphabetic()
        || matches!(c,
            '\u{C0}'..='\u{D6}'
            | '\u{D8}'..='\u{F6}'
            | '\u{F8}'..='\u{2FF}'
            | '\u{370}'..='\u{37D}'
            | '\u{37F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || c == '-'
        || c == '.'
        || c.is_ascii_digit()
        || matches!(c, '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// Validate and split a qualified name against a namespace, per the
/// "validate and extract" steps used by `create_element_ns` and
/// `create_attribute_ns`.
pub fn validate_and_extract(
    namespace: Option<&str>,
    qualified: &str,
) -> Result<QualName, DomError> {
    if !is_valid_name(qualified) {
        return Err(DomError::InvalidCharacter);
    }
    let namespace = match namespace {
        Some("") | None => None,
        Some(uri) => Some(uri),
    };
    let (prefix, local) = match qualified.split_once(':') {
        Some((p, l)) => {
            // A second colon would have been caught by the Name check only if
            // illegal chars were present; reject explicitly here.
            if p.is_empty() || l.is_empty() || l.contains(':') {
                return Err(DomError::InvalidCharacter);
            }
            (Some(p), l)
        }
        None => (None, qualified),
    };
    if prefix.is_some() && namespace.is_none() {
        return Err(DomError::Namespace);
    }
    if prefix == Some("xml") && namespace != Some(XML_NS) {
        return Err(DomError::Namespace);
    }
    if (qualified == "xmlns" || prefix == Some("xmlns")) && namespace != Some(XMLNS_NS) {
        return Err(DomError::Namespace);
    }
    if namespace == Some(XMLNS_NS) && qualified != "xmlns" && prefix != Some("xmlns") {
        return Err(DomError::Namespace);
    }
    Ok(QualName::new(
        namespace.map(Ns::from_uri),
        prefix.map(Arc::from),
        local,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_production_accepts_and_rejects() {
        assert!(is_valid_name("div"));
        assert!(is_valid_name("_x"));
        assert!(is_valid_name("a-b.c"));
        assert!(is_valid_name("svg:rect"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name("-x"));
        assert!(!is_valid_name("a b"));
        assert!(!is_valid_name("a<b"));
    }

    #[test]
    fn validate_and_extract_enforces_namespace_rules() {
        let name = validate_and_extract(Some(SVG_NS), "svg:rect").expect("valid");
        assert_eq!(name.ns, Some(Ns::Svg));
        assert_eq!(name.prefix.as_deref(), Some("svg"));
        assert_eq!(&*name.local, "rect");

        assert_eq!(
            validate_and_extract(None, "svg:rect"),
            Err(DomError::Namespace)
        );
        assert_eq!(
            validate_and_extract(Some(HTML_NS), "xml:lang"),
            Err(DomError::Namespace)
        );
        assert_eq!(
            validate_and_extract(Some(HTML_NS), "xmlns"),
            Err(DomError::Namespace)
        );
        assert!(validate_and_extract(Some(XMLNS_NS), "xmlns").is_ok());
        assert_eq!(
            validate_and_extract(Some(HTML_NS), "a:b:c"),
            Err(DomError::InvalidCharacter)
        );
    }

    #[test]
    fn qualified_name_includes_prefix() {
        let name = QualName::new(Some(Ns::Svg), Some(Arc::from("svg")), "rect");
        assert_eq!(name.qualified(), "svg:rect");
        assert_eq!(QualName::html("div").qualified(), "div");
    }
}
