//! Foreign content (SVG/MathML): namespace-aware dispatch, tag/attribute
//! adjustments, breakout back to HTML parsing.

use std::sync::Arc;

use dom::name::{Ns, QualName};
use dom::node::NodeRef;

use crate::error::ParseErrorCode;
use crate::token::{TagToken, Token};

use super::TreeBuilder;

/// SVG tag names whose canonical form is mixed-case.
static SVG_TAG_ADJUSTMENTS: &[(&str, &str)] = &[
    ("altglyph", "altGlyph"),
    ("altglyphdef", "altGlyphDef"),
    ("altglyphitem", "altGlyphItem"),
    ("animatecolor", "animateColor"),
    ("animatemotion", "animateMotion"),
    ("animatetransform", "animateTransform"),
    ("clippath", "clipPath"),
    ("feblend", "feBlend"),
    ("fecolormatrix", "feColorMatrix"),
    ("fecomponenttransfer", "feComponentTransfer"),
    ("fecomposite", "feComposite"),
    ("feconvolvematrix", "feConvolveMatrix"),
    ("fediffuselighting", "feDiffuseLighting"),
    ("fedisplacementmap", "feDisplacementMap"),
    ("fedistantlight", "feDistantLight"),
    ("fedropshadow", "feDropShadow"),
    ("feflood", "feFlood"),
    ("fefunca", "feFuncA"),
    ("fefuncb", "feFuncB"),
    ("fefuncg", "feFuncG"),
    ("fefuncr", "feFuncR"),
    ("fegaussianblur", "feGaussianBlur"),
    ("feimage", "feImage"),
    ("femerge", "feMerge"),
    ("femergenode", "feMergeNode"),
    ("femorphology", "feMorphology"),
    ("feoffset", "feOffset"),
    ("fepointlight", "fePointLight"),
    ("fespecularlighting", "feSpecularLighting"),
    ("fespotlight", "feSpotLight"),
    ("fetile", "feTile"),
    ("feturbulence", "feTurbulence"),
    ("foreignobject", "foreignObject"),
    ("glyphref", "glyphRef"),
    ("lineargradient", "linearGradient"),
    ("radialgradient", "radialGradient"),
    ("textpath", "textPath"),
];

/// SVG attribute names whose canonical form is mixed-case.
static SVG_ATTR_ADJUSTMENTS: &[(&str, &str)] = &[
    ("attributename", "attributeName"),
    ("attributetype", "attributeType"),
    ("basefrequency", "baseFrequency"),
    ("baseprofile", "baseProfile"),
    ("calcmode", "calcMode"),
    ("clippathunits", "clipPathUnits"),
    ("diffuseconstant", "diffuseConstant"),
    ("edgemode", "edgeMode"),
    ("filterunits", "filterUnits"),
    ("glyphref", "glyphRef"),
    ("gradienttransform", "gradientTransform"),
    ("gradientunits", "gradientUnits"),
    ("kernelmatrix", "kernelMatrix"),
    ("kernelunitlength", "kernelUnitLength"),
    ("keypoints", "keyPoints"),
    ("keysplines", "keySplines"),
    ("keytimes", "keyTimes"),
    ("lengthadjust", "lengthAdjust"),
    ("limitingconeangle", "limitingConeAngle"),
    ("markerheight", "markerHeight"),
    ("markerunits", "markerUnits"),
    ("markerwidth", "markerWidth"),
    ("maskcontentunits", "maskContentUnits"),
    ("maskunits", "maskUnits"),
    ("numoctaves", "numOctaves"),
    ("pathlength", "pathLength"),
    ("patterncontentunits", "patternContentUnits"),
    ("patterntransform", "patternTransform"),
    ("patternunits", "patternUnits"),
    ("pointsatx", "pointsAtX"),
    ("pointsaty", "pointsAtY"),
    ("pointsatz", "pointsAtZ"),
    ("preservealpha", "preserveAlpha"),
    ("preserveaspectratio", "preserveAspectRatio"),
    ("primitiveunits", "primitiveUnits"),
    ("refx", "refX"),
    ("refy", "refY"),
    ("repeatcount", "repeatCount"),
    ("repeatdur", "repeatDur"),
    ("requiredextensions", "requiredExtensions"),
    ("requiredfeatures", "requiredFeatures"),
    ("specularconstant", "specularConstant"),
    ("specularexponent", "specularExponent"),
    ("spreadmethod", "spreadMethod"),
    ("startoffset", "startOffset"),
    ("stddeviation", "stdDeviation"),
    ("stitchtiles", "stitchTiles"),
    ("surfacescale", "surfaceScale"),
    ("systemlanguage", "systemLanguage"),
    ("tablevalues", "tableValues"),
    ("targetx", "targetX"),
    ("targety", "targetY"),
    ("textlength", "textLength"),
    ("viewbox", "viewBox"),
    ("viewtarget", "viewTarget"),
    ("xchannelselector", "xChannelSelector"),
    ("ychannelselector", "yChannelSelector"),
    ("zoomandpan", "zoomAndPan"),
];

/// Start tags that break out of foreign content back into HTML.
static BREAKOUT_TAGS: &[&str] = &[
    "b", "big", "blockquote", "body", "br", "center", "code", "dd", "div", "dl", "dt", "em",
    "embed", "h1", "h2", "h3", "h4", "h5", "h6", "head", "hr", "i", "img", "li", "listing",
    "menu", "meta", "nobr", "ol", "p", "pre", "ruby", "s", "small", "span", "strong", "strike",
    "sub", "sup", "table", "tt", "u", "ul", "var",
];

pub(crate) fn is_mathml_text_integration_point(node: &NodeRef) -> bool {
    node.as_element().is_some_and(|el| {
        el.name.ns == Some(Ns::MathMl)
            && matches!(&*el.name.local, "mi" | "mo" | "mn" | "ms" | "mtext")
    })
}

pub(crate) fn is_html_integration_point(node: &NodeRef) -> bool {
    let Some(el) = node.as_element() else {
        return false;
    };
    match &el.name.ns {
        Some(Ns::Svg) => matches!(&*el.name.local, "foreignObject" | "desc" | "title"),
        Some(Ns::MathMl) if &*el.name.local == "annotation-xml" => node
            .get_attribute("encoding")
            .is_some_and(|v| {
                v.eq_ignore_ascii_case("text/html")
                    || v.eq_ignore_ascii_case("application/xhtml+xml")
            }),
        _ => false,
    }
}

/// Map a token attribute name to its adjusted qualified name for elements
/// in namespace `ns` (foreign xlink/xml/xmlns attributes, SVG camelCase).
pub(crate) fn adjusted_attr_name(ns: &Ns, name: &str) -> QualName {
    match name {
        "xlink:actuate" | "xlink:arcrole" | "xlink:href" | "xlink:role" | "xlink:show"
        | "xlink:title" | "xlink:type" => {
            let local = &name["xlink:".len()..];
            return QualName::new(Some(Ns::XLink), Some(Arc::from("xlink")), local);
        }
        "xml:lang" | "xml:space" => {
            let local = &name["xml:".len()..];
            return QualName::new(Some(Ns::Xml), Some(Arc::from("xml")), local);
        }
        "xmlns" => return QualName::new(Some(Ns::Xmlns), None, "xmlns"),
        "xmlns:xlink" => {
            return QualName::new(Some(Ns::Xmlns), Some(Arc::from("xmlns")), "xlink");
        }
        _ => {}
    }
    match ns {
        Ns::Svg => {
            if let Some((_, adjusted)) =
                SVG_ATTR_ADJUSTMENTS.iter().find(|(from, _)| *from == name)
            {
                return QualName::new(None, None, *adjusted);
            }
            QualName::new(None, None, name)
        }
        Ns::MathMl if name == "definitionurl" => QualName::new(None, None, "definitionURL"),
        _ => QualName::new(None, None, name),
    }
}

pub(crate) fn adjusted_svg_tag_name(name: &str) -> &str {
    SVG_TAG_ADJUSTMENTS
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

impl TreeBuilder {
    /// "In foreign content" processing.
    pub(crate) fn process_foreign(&mut self, token: Token) {
        match token {
            Token::Character('\0') => {
                self.err(ParseErrorCode::UnexpectedNullCharacter);
                self.insert_char('\u{FFFD}');
            }
            Token::Character(ch) if matches!(ch, '\t' | '\n' | '\x0C' | ' ') => {
                self.insert_char(ch);
            }
            Token::Character(ch) => {
                self.insert_char(ch);
                self.frameset_ok = false;
            }
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) => self.foreign_start_tag(tag),
            Token::EndTag(tag) => self.foreign_end_tag(tag),
            Token::EndOfStream => unreachable!("EOF always uses the HTML dispatch"),
        }
    }

    fn foreign_start_tag(&mut self, tag: TagToken) {
        let breakout = BREAKOUT_TAGS.contains(&tag.name.as_str())
            || (tag.name == "font"
                && tag
                    .attrs
                    .iter()
                    .any(|a| matches!(a.name.as_str(), "color" | "face" | "size")));
        if breakout {
            self.err(ParseErrorCode::UnexpectedToken);
            loop {
                let Some(current) = self.current_node() else {
                    break;
                };
                let back_to_html = current
                    .as_element()
                    .is_some_and(|el| el.name.ns == Some(Ns::Html))
                    || is_mathml_text_integration_point(&current)
                    || is_html_integration_point(&current);
                if back_to_html {
                    break;
                }
                self.open.pop();
            }
            self.process(Token::StartTag(tag));
            return;
        }

        let adjusted_ns = self
            .adjusted_current_node()
            .and_then(|n| n.as_element().and_then(|el| el.name.ns.clone()))
            .unwrap_or(Ns::Html);
        let mut tag = tag;
        if adjusted_ns == Ns::Svg {
            tag.name = adjusted_svg_tag_name(&tag.name).to_string();
        }
        let self_closing = tag.self_closing;
        self.insert_foreign_element(&tag, adjusted_ns);
        if self_closing {
            self.open.pop();
            self.acknowledge_self_closing();
        }
    }

    fn foreign_end_tag(&mut self, tag: TagToken) {
        let mut index = match self.open.len().checked_sub(1) {
            Some(i) => i,
            None => return,
        };
        let current_matches = self
            .current_node()
            .and_then(|n| n.as_element().map(|el| el.name.local.to_ascii_lowercase()))
            .is_some_and(|local| local == tag.name);
        if !current_matches {
            self.err(ParseErrorCode::MisnestedTag);
        }
        loop {
            if index == 0 {
                return;
            }
            let node = self.open.get(index).expect("index in range");
            let local_matches = node
                .as_element()
                .map(|el| el.name.local.to_ascii_lowercase() == tag.name)
                .unwrap_or(false);
            if local_matches {
                self.open.pop_until_node(&node);
                return;
            }
            index -= 1;
            let above = self.open.get(index).expect("index in range");
            if above
                .as_element()
                .is_some_and(|el| el.name.ns == Some(Ns::Html))
            {
                // Hand the token back to the HTML modes.
                let mode = self.mode;
                self.process_in_mode(mode, Token::EndTag(tag));
                return;
            }
        }
    }
}
