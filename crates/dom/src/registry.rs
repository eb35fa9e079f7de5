//! Element registry: (namespace, local name) → element kind.
//!
//! Creating an element always consults this table; behavior attached to an
//! element (base-URL re-evaluation, template contents, table row API) is
//! dispatched on the kind. Unknown HTML local names map to
//! `ElementKind::HtmlUnknown`; non-HTML namespaces use their own tables.

use crate::name::Ns;

/// Element kind discriminator, one variant per distinct behavior/interface.
///
/// Generic flow/phrasing elements (`b`, `nav`, `section`, …) all map to
/// `Html`; only names with per-kind behavior or a dedicated interface get
/// their own variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Html,
    HtmlUnknown,
    Anchor,
    Area,
    Base,
    Body,
    Br,
    Button,
    Canvas,
    Data,
    DataList,
    Details,
    Dialog,
    Div,
    DList,
    Embed,
    FieldSet,
    Font,
    Form,
    Frame,
    FrameSet,
    Head,
    Heading,
    Hr,
    HtmlRoot,
    IFrame,
    Image,
    Input,
    Label,
    Legend,
    Li,
    Link,
    Map,
    Menu,
    Meta,
    Meter,
    Mod,
    Object,
    OList,
    OptGroup,
    OptionEl,
    Output,
    Paragraph,
    Param,
    Picture,
    Pre,
    Progress,
    Quote,
    Script,
    Select,
    Slot,
    Source,
    Span,
    Style,
    Table,
    TableCaption,
    TableCell,
    TableCol,
    TableRow,
    TableSection,
    Template,
    TextArea,
    Time,
    Title,
    Track,
    UList,
    Video,
    Audio,
    Svg,
    SvgScript,
    MathMl,
    MathMlAnnotationXml,
}

/// Resolve the element kind for a (namespace, local name) pair.
pub fn kind_for(ns: &Ns, local: &str) -> ElementKind {
    match ns {
        Ns::Html => html_kind(local),
        Ns::Svg => match local {
            "script" => ElementKind::SvgScript,
            _ => ElementKind::Svg,
        },
        Ns::MathMl => match local {
            "annotation-xml" => ElementKind::MathMlAnnotationXml,
            _ => ElementKind::MathMl,
        },
        _ => ElementKind::HtmlUnknown,
    }
}

fn html_kind(local: &str) -> ElementKind {
    use ElementKind::*;
    match local {
        "a" => Anchor,
        "area" => Area,
        "audio" => Audio,
        "base" => Base,
        "blockquote" | "q" => Quote,
        "body" => Body,
        "br" => Br,
        "button" => Button,
        "canvas" => Canvas,
        "caption" => TableCaption,
        "col" | "colgroup" => TableCol,
        "data" => Data,
        "datalist" => DataList,
        "del" | "ins" => Mod,
        "details" => Details,
        "dialog" => Dialog,
        "div" => Div,
        "dl" => DList,
        "embed" => Embed,
        "fieldset" => FieldSet,
        "font" => Font,
        "form" => Form,
        "frame" => Frame,
        "frameset" => FrameSet,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Heading,
        "head" => Head,
        "hr" => Hr,
        "html" => HtmlRoot,
        "iframe" => IFrame,
        "img" => Image,
        "input" => Input,
        "label" => Label,
        "legend" => Legend,
        "li" => Li,
        "link" => Link,
        "map" => Map,
        "menu" => Menu,
        "meta" => Meta,
        "meter" => Meter,
        "object" => Object,
        "ol" => OList,
        "optgroup" => OptGroup,
        "option" => OptionEl,
        "output" => Output,
        "p" => Paragraph,
        "param" => Param,
        "picture" => Picture,
        "pre" | "listing" | "xmp" => Pre,
        "progress" => Progress,
        "script" => Script,
        "select" => Select,
        "slot" => Slot,
        "source" => Source,
        "span" => Span,
        "style" => Style,
        "table" => Table,
        "tbody" | "thead" | "tfoot" => TableSection,
        "td" | "th" => TableCell,
        "template" => Template,
        "textarea" => TextArea,
        "time" => Time,
        "title" => Title,
        "tr" => TableRow,
        "track" => Track,
        "ul" => UList,
        "video" => Video,
        // Known elements without per-kind behavior.
        "abbr" | "address" | "article" | "aside" | "b" | "bdi" | "bdo" | "big" | "center"
        | "cite" | "code" | "dd" | "dfn" | "dt" | "em" | "figcaption" | "figure" | "footer"
        | "header" | "hgroup" | "i" | "kbd" | "main" | "mark" | "marquee" | "nav" | "nobr"
        | "noembed" | "noframes" | "noscript" | "plaintext" | "rb" | "rp" | "rt" | "rtc"
        | "ruby" | "s" | "samp" | "search" | "section" | "small" | "strike" | "strong"
        | "sub" | "summary" | "sup" | "tt" | "u" | "var" | "wbr" | "basefont" | "bgsound"
        | "keygen" | "menuitem" | "dir" | "applet" | "acronym" | "isindex" | "nextid"
        | "spacer" => Html,
        _ => HtmlUnknown,
    }
}

/// Void elements: serialized with no end tag and no children.
pub fn is_void(local: &str) -> bool {
    matches!(
        local,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
            | "basefont"
            | "bgsound"
            | "frame"
            | "keygen"
            | "menuitem"
    )
}

/// Elements whose serialized children are emitted without escaping.
pub fn serializes_raw_text(local: &str) -> bool {
    matches!(
        local,
        "style" | "script" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_kinds() {
        assert_eq!(kind_for(&Ns::Html, "a"), ElementKind::Anchor);
        assert_eq!(kind_for(&Ns::Html, "table"), ElementKind::Table);
        assert_eq!(kind_for(&Ns::Html, "tbody"), ElementKind::TableSection);
        assert_eq!(kind_for(&Ns::Html, "b"), ElementKind::Html);
        assert_eq!(kind_for(&Ns::Html, "blink"), ElementKind::HtmlUnknown);
        assert_eq!(kind_for(&Ns::Svg, "rect"), ElementKind::Svg);
        assert_eq!(kind_for(&Ns::Svg, "script"), ElementKind::SvgScript);
        assert_eq!(kind_for(&Ns::MathMl, "mi"), ElementKind::MathMl);
        assert_eq!(
            kind_for(&Ns::MathMl, "annotation-xml"),
            ElementKind::MathMlAnnotationXml
        );
    }

    #[test]
    fn void_and_raw_text_sets_cover_legacy_names() {
        for name in ["br", "img", "keygen", "frame", "menuitem", "bgsound"] {
            assert!(is_void(name), "{name} must be void");
        }
        assert!(!is_void("div"));
        assert!(serializes_raw_text("script"));
        assert!(serializes_raw_text("noframes"));
        assert!(!serializes_raw_text("textarea"));
    }
}
