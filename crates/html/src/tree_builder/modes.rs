//! The insertion-mode handlers.
//!
//! Each mode is a function over (token, parser context): it inserts nodes,
//! manipulates the stacks, switches modes/tokenizer states, or reprocesses
//! the token under another mode (always finitely).

use dom::name::Ns;
use dom::node::{same_node, NodeRef};

use super::formatting::AdoptionResult;
use super::stack::Scope;
use super::{
    merge_missing_attrs, node_is_one_of, quirks, set_compat_mode, InsertionMode, TreeBuilder,
    FORMATTING_TAGS,
};
use crate::error::ParseErrorCode;
use crate::token::{TagToken, Token};
use crate::tokenizer::State;

fn is_ws(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

impl TreeBuilder {
    // --- the "before" modes ----------------------------------------------

    pub(super) fn mode_initial(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => {}
            Token::Comment(data) => {
                let doc = self.document();
                self.insert_comment(&data, Some(&doc));
            }
            Token::Doctype(dt) => {
                let doc = self.document();
                let doctype = doc.create_doctype(
                    dt.name.as_deref().unwrap_or(""),
                    dt.public_id.as_deref().unwrap_or(""),
                    dt.system_id.as_deref().unwrap_or(""),
                );
                let appended = doc.append_child(&doctype);
                debug_assert!(appended.is_ok());
                set_compat_mode(&doc, quirks::mode_for_doctype(&dt));
                self.switch_mode(InsertionMode::BeforeHtml);
            }
            other => {
                self.err(ParseErrorCode::UnexpectedToken);
                let doc = self.document();
                set_compat_mode(&doc, dom::CompatMode::Quirks);
                self.reprocess(InsertionMode::BeforeHtml, other);
            }
        }
    }

    pub(super) fn mode_before_html(&mut self, token: Token) {
        match token {
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::Comment(data) => {
                let doc = self.document();
                self.insert_comment(&data, Some(&doc));
            }
            Token::Character(ch) if is_ws(ch) => {}
            Token::StartTag(tag) if tag.name == "html" => {
                let doc = self.document();
                let element = self.create_element_for_token(&tag, Ns::Html, &doc);
                let appended = doc.append_child(&element);
                debug_assert!(appended.is_ok());
                self.open.push(element);
                self.switch_mode(InsertionMode::BeforeHead);
            }
            Token::EndTag(tag)
                if !matches!(tag.name.as_str(), "head" | "body" | "html" | "br") =>
            {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            other => {
                let doc = self.document();
                let element = doc.create_element_raw(dom::QualName::html("html"));
                let appended = doc.append_child(&element);
                debug_assert!(appended.is_ok());
                self.open.push(element);
                self.reprocess(InsertionMode::BeforeHead, other);
            }
        }
    }

    pub(super) fn mode_before_head(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => {}
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) if tag.name == "html" => {
                self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag));
            }
            Token::StartTag(tag) if tag.name == "head" => {
                let head = self.insert_element(&tag);
                self.head = Some(head);
                self.switch_mode(InsertionMode::InHead);
            }
            Token::EndTag(tag)
                if !matches!(tag.name.as_str(), "head" | "body" | "html" | "br") =>
            {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            other => {
                let head = self.insert_element(&TagToken::new("head"));
                self.head = Some(head);
                self.reprocess(InsertionMode::InHead, other);
            }
        }
    }

    pub(super) fn mode_in_head(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => self.insert_char(ch),
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) => self.in_head_start_tag(tag),
            Token::EndTag(tag) => match tag.name.as_str() {
                "head" => {
                    self.open.pop();
                    self.switch_mode(InsertionMode::AfterHead);
                }
                "template" => self.close_template(),
                "body" | "html" | "br" => {
                    self.open.pop();
                    self.reprocess(InsertionMode::AfterHead, Token::EndTag(tag));
                }
                _ => self.err(ParseErrorCode::UnexpectedToken),
            },
            other => {
                self.open.pop();
                self.reprocess(InsertionMode::AfterHead, other);
            }
        }
    }

    fn in_head_start_tag(&mut self, tag: TagToken) {
        match tag.name.as_str() {
            "html" => self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag)),
            "base" | "basefont" | "bgsound" | "link" | "meta" => {
                self.insert_element(&tag);
                self.open.pop();
                self.acknowledge_self_closing();
            }
            "title" => self.parse_generic_text(&tag, State::Rcdata),
            "noscript" if self.scripting => self.parse_generic_text(&tag, State::Rawtext),
            "noscript" => {
                self.insert_element(&tag);
                self.switch_mode(InsertionMode::InHeadNoscript);
            }
            "noframes" | "style" => self.parse_generic_text(&tag, State::Rawtext),
            "script" => self.parse_generic_text(&tag, State::ScriptData),
            "template" => {
                self.insert_element(&tag);
                self.formatting.push_marker();
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::InTemplate);
                self.template_modes.push(InsertionMode::InTemplate);
            }
            "head" => self.err(ParseErrorCode::UnexpectedToken),
            _ => {
                self.open.pop();
                self.reprocess(InsertionMode::AfterHead, Token::StartTag(tag));
            }
        }
    }

    fn close_template(&mut self) {
        if !self.open.has_template() {
            self.err(ParseErrorCode::UnexpectedToken);
            return;
        }
        self.generate_implied_end_tags_thoroughly();
        if !self
            .current_node()
            .is_some_and(|n| n.is_html_element("template"))
        {
            self.err(ParseErrorCode::MisnestedTag);
        }
        self.open.pop_until_html("template");
        self.formatting.clear_to_last_marker();
        self.template_modes.pop();
        self.reset_insertion_mode();
    }

    pub(super) fn mode_in_head_noscript(&mut self, token: Token) {
        match token {
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) if tag.name == "html" => {
                self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag));
            }
            Token::EndTag(tag) if tag.name == "noscript" => {
                self.open.pop();
                self.switch_mode(InsertionMode::InHead);
            }
            Token::Character(ch) if is_ws(ch) => self.insert_char(ch),
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style"
                ) =>
            {
                self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
            }
            Token::StartTag(tag) if matches!(tag.name.as_str(), "head" | "noscript") => {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            Token::EndTag(tag) if tag.name != "br" => {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            other => {
                self.err(ParseErrorCode::UnexpectedToken);
                self.open.pop();
                self.reprocess(InsertionMode::InHead, other);
            }
        }
    }

    pub(super) fn mode_after_head(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => self.insert_char(ch),
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) => match tag.name.as_str() {
                "html" => self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag)),
                "body" => {
                    self.insert_element(&tag);
                    self.frameset_ok = false;
                    self.switch_mode(InsertionMode::InBody);
                }
                "frameset" => {
                    self.insert_element(&tag);
                    self.switch_mode(InsertionMode::InFrameset);
                }
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                | "style" | "template" | "title" => {
                    self.err(ParseErrorCode::UnexpectedToken);
                    let head = self.head.clone().expect("head was inserted earlier");
                    self.open.push(head.clone());
                    self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
                    self.open.remove(&head);
                }
                "head" => self.err(ParseErrorCode::UnexpectedToken),
                _ => {
                    self.insert_element(&TagToken::new("body"));
                    self.reprocess(InsertionMode::InBody, Token::StartTag(tag));
                }
            },
            Token::EndTag(tag) => match tag.name.as_str() {
                "template" => self.process_in_mode(InsertionMode::InHead, Token::EndTag(tag)),
                "body" | "html" | "br" => {
                    self.insert_element(&TagToken::new("body"));
                    self.reprocess(InsertionMode::InBody, Token::EndTag(tag));
                }
                _ => self.err(ParseErrorCode::UnexpectedToken),
            },
            other => {
                self.insert_element(&TagToken::new("body"));
                self.reprocess(InsertionMode::InBody, other);
            }
        }
    }

    // --- in body ----------------------------------------------------------

    pub(super) fn mode_in_body(&mut self, token: Token) {
        match token {
            Token::Character('\0') => self.err(ParseErrorCode::UnexpectedNullCharacter),
            Token::Character(ch) if is_ws(ch) => {
                self.reconstruct_formatting();
                self.insert_char(ch);
            }
            Token::Character(ch) => {
                self.reconstruct_formatting();
                self.insert_char(ch);
                self.frameset_ok = false;
            }
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) => self.in_body_start_tag(tag),
            Token::EndTag(tag) => self.in_body_end_tag(tag),
            Token::EndOfStream => {
                if !self.template_modes.is_empty() {
                    self.process_in_mode(InsertionMode::InTemplate, Token::EndOfStream);
                    return;
                }
                let benign = [
                    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
                    "tbody", "td", "tfoot", "th", "thead", "tr", "body", "html",
                ];
                if self.open.iter().any(|n| !node_is_one_of(n, &benign)) {
                    self.err(ParseErrorCode::UnexpectedEndOfStream);
                }
                self.stop_parsing();
            }
        }
    }

    fn in_body_start_tag(&mut self, tag: TagToken) {
        match tag.name.as_str() {
            "html" => {
                self.err(ParseErrorCode::UnexpectedToken);
                if self.open.has_template() {
                    return;
                }
                if let Some(root) = self.open.get(0) {
                    merge_missing_attrs(&root, &tag);
                }
            }
            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
            | "style" | "template" | "title" => {
                self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
            }
            "body" => {
                self.err(ParseErrorCode::UnexpectedToken);
                let second = self.open.get(1);
                let valid = second.as_ref().is_some_and(|n| n.is_html_element("body"));
                if !valid || self.open.has_template() {
                    return;
                }
                self.frameset_ok = false;
                merge_missing_attrs(&second.expect("checked above"), &tag);
            }
            "frameset" => {
                self.err(ParseErrorCode::UnexpectedToken);
                let second = self.open.get(1);
                let valid = second.as_ref().is_some_and(|n| n.is_html_element("body"));
                if !valid || !self.frameset_ok {
                    return;
                }
                let body = second.expect("checked above");
                body.detach();
                while self.open.len() > 1 {
                    self.open.pop();
                }
                self.insert_element(&tag);
                self.switch_mode(InsertionMode::InFrameset);
            }
            "address" | "article" | "aside" | "blockquote" | "center" | "details" | "dialog"
            | "dir" | "div" | "dl" | "fieldset" | "figcaption" | "figure" | "footer"
            | "header" | "hgroup" | "main" | "menu" | "nav" | "ol" | "p" | "search"
            | "section" | "summary" | "ul" => {
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.insert_element(&tag);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                if self.current_node().is_some_and(|n| {
                    node_is_one_of(&n, &["h1", "h2", "h3", "h4", "h5", "h6"])
                }) {
                    self.err(ParseErrorCode::MisnestedTag);
                    self.open.pop();
                }
                self.insert_element(&tag);
            }
            "pre" | "listing" => {
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.insert_element(&tag);
                self.ignore_next_lf = true;
                self.frameset_ok = false;
            }
            "form" => {
                if self.form.is_some() && !self.open.has_template() {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                let element = self.insert_element(&tag);
                if !self.open.has_template() {
                    self.form = Some(element);
                }
            }
            "li" => {
                self.frameset_ok = false;
                self.implied_list_item_closure(&["li"]);
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.insert_element(&tag);
            }
            "dd" | "dt" => {
                self.frameset_ok = false;
                self.implied_list_item_closure(&["dd", "dt"]);
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.insert_element(&tag);
            }
            "plaintext" => {
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.insert_element(&tag);
                self.tokenizer.set_state(State::Plaintext);
            }
            "button" => {
                if self.open.has_in_scope("button", Scope::Default) {
                    self.err(ParseErrorCode::MisnestedTag);
                    self.generate_implied_end_tags(None);
                    self.open.pop_until_html("button");
                }
                self.reconstruct_formatting();
                self.insert_element(&tag);
                self.frameset_ok = false;
            }
            "a" => {
                if let Some((_, node, _)) = self.formatting.find_after_marker("a") {
                    self.err(ParseErrorCode::MisnestedTag);
                    self.adoption_agency("a");
                    self.formatting.remove_node(&node);
                    self.open.remove(&node);
                }
                self.reconstruct_formatting();
                let element = self.insert_element(&tag);
                self.formatting.push_element(element, tag);
            }
            "b" | "big" | "code" | "em" | "font" | "i" | "s" | "small" | "strike"
            | "strong" | "tt" | "u" => {
                self.reconstruct_formatting();
                let element = self.insert_element(&tag);
                self.formatting.push_element(element, tag);
            }
            "nobr" => {
                self.reconstruct_formatting();
                if self.open.has_in_scope("nobr", Scope::Default) {
                    self.err(ParseErrorCode::MisnestedTag);
                    self.adoption_agency("nobr");
                    self.reconstruct_formatting();
                }
                let element = self.insert_element(&tag);
                self.formatting.push_element(element, tag);
            }
            "applet" | "marquee" | "object" => {
                self.reconstruct_formatting();
                self.insert_element(&tag);
                self.formatting.push_marker();
                self.frameset_ok = false;
            }
            "table" => {
                let quirky = self
                    .document()
                    .as_document()
                    .is_some_and(|d| d.mode() == dom::CompatMode::Quirks);
                if !quirky && self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.insert_element(&tag);
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::InTable);
            }
            "area" | "br" | "embed" | "img" | "keygen" | "wbr" => {
                self.reconstruct_formatting();
                self.insert_element(&tag);
                self.open.pop();
                self.acknowledge_self_closing();
                self.frameset_ok = false;
            }
            "input" => {
                self.reconstruct_formatting();
                self.insert_element(&tag);
                self.open.pop();
                self.acknowledge_self_closing();
                let hidden = tag
                    .attr("type")
                    .is_some_and(|v| v.eq_ignore_ascii_case("hidden"));
                if !hidden {
                    self.frameset_ok = false;
                }
            }
            "param" | "source" | "track" => {
                self.insert_element(&tag);
                self.open.pop();
                self.acknowledge_self_closing();
            }
            "hr" => {
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.insert_element(&tag);
                self.open.pop();
                self.acknowledge_self_closing();
                self.frameset_ok = false;
            }
            "image" => {
                self.err(ParseErrorCode::UnexpectedToken);
                let mut retagged = tag;
                retagged.name = "img".to_string();
                self.process(Token::StartTag(retagged));
            }
            "textarea" => {
                self.insert_element(&tag);
                self.ignore_next_lf = true;
                self.tokenizer.set_state(State::Rcdata);
                self.original_mode = Some(self.mode_now());
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::Text);
            }
            "xmp" => {
                if self.open.has_in_scope("p", Scope::Button) {
                    self.close_p_element();
                }
                self.reconstruct_formatting();
                self.frameset_ok = false;
                self.parse_generic_text(&tag, State::Rawtext);
            }
            "iframe" => {
                self.frameset_ok = false;
                self.parse_generic_text(&tag, State::Rawtext);
            }
            "noembed" => self.parse_generic_text(&tag, State::Rawtext),
            "noscript" if self.scripting => self.parse_generic_text(&tag, State::Rawtext),
            "select" => {
                self.reconstruct_formatting();
                self.insert_element(&tag);
                self.frameset_ok = false;
                let mode = self.mode_now();
                let next = if matches!(
                    mode,
                    InsertionMode::InTable
                        | InsertionMode::InCaption
                        | InsertionMode::InTableBody
                        | InsertionMode::InRow
                        | InsertionMode::InCell
                ) {
                    InsertionMode::InSelectInTable
                } else {
                    InsertionMode::InSelect
                };
                self.switch_mode(next);
            }
            "optgroup" | "option" => {
                if self
                    .current_node()
                    .is_some_and(|n| n.is_html_element("option"))
                {
                    self.open.pop();
                }
                self.reconstruct_formatting();
                self.insert_element(&tag);
            }
            "rb" | "rtc" => {
                if self.open.has_in_scope("ruby", Scope::Default) {
                    self.generate_implied_end_tags(None);
                    if !self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("ruby"))
                    {
                        self.err(ParseErrorCode::MisnestedTag);
                    }
                }
                self.insert_element(&tag);
            }
            "rp" | "rt" => {
                if self.open.has_in_scope("ruby", Scope::Default) {
                    self.generate_implied_end_tags(Some("rtc"));
                    let ok = self.current_node().is_some_and(|n| {
                        n.is_html_element("ruby") || n.is_html_element("rtc")
                    });
                    if !ok {
                        self.err(ParseErrorCode::MisnestedTag);
                    }
                }
                self.insert_element(&tag);
            }
            "math" => {
                self.reconstruct_formatting();
                let self_closing = tag.self_closing;
                self.insert_foreign_element(&tag, Ns::MathMl);
                if self_closing {
                    self.open.pop();
                    self.acknowledge_self_closing();
                }
            }
            "svg" => {
                self.reconstruct_formatting();
                let self_closing = tag.self_closing;
                self.insert_foreign_element(&tag, Ns::Svg);
                if self_closing {
                    self.open.pop();
                    self.acknowledge_self_closing();
                }
            }
            "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td" | "tfoot"
            | "th" | "thead" | "tr" => {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            _ => {
                self.reconstruct_formatting();
                self.insert_element(&tag);
            }
        }
    }

    /// The li/dd/dt closure walk shared by the list-item start tags.
    fn implied_list_item_closure(&mut self, names: &[&str]) {
        let stack: Vec<NodeRef> = self.open.iter().rev().cloned().collect();
        for node in stack {
            if let Some(name) = names.iter().find(|n| node.is_html_element(n)) {
                self.generate_implied_end_tags(Some(name));
                if !self.current_node().is_some_and(|n| n.is_html_element(name)) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_html(name);
                break;
            }
            if super::is_special(&node)
                && !node_is_one_of(&node, &["address", "div", "p"])
            {
                break;
            }
        }
    }

    fn in_body_end_tag(&mut self, tag: TagToken) {
        let name = tag.name.as_str();
        match name {
            "body" => {
                if !self.open.has_in_scope("body", Scope::Default) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.check_leftover_open_elements();
                self.switch_mode(InsertionMode::AfterBody);
            }
            "html" => {
                if !self.open.has_in_scope("body", Scope::Default) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.check_leftover_open_elements();
                self.reprocess(InsertionMode::AfterBody, Token::EndTag(tag));
            }
            "address" | "article" | "aside" | "blockquote" | "button" | "center"
            | "details" | "dialog" | "dir" | "div" | "dl" | "fieldset" | "figcaption"
            | "figure" | "footer" | "header" | "hgroup" | "listing" | "main" | "menu"
            | "nav" | "ol" | "pre" | "search" | "section" | "summary" | "ul" => {
                if !self.open.has_in_scope(name, Scope::Default) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node().is_some_and(|n| n.is_html_element(name)) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_html(name);
            }
            "form" => self.close_form_element(),
            "p" => {
                if !self.open.has_in_scope("p", Scope::Button) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    self.insert_element(&TagToken::new("p"));
                }
                self.close_p_element();
            }
            "li" => {
                if !self.open.has_in_scope("li", Scope::ListItem) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.generate_implied_end_tags(Some("li"));
                if !self.current_node().is_some_and(|n| n.is_html_element("li")) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_html("li");
            }
            "dd" | "dt" => {
                if !self.open.has_in_scope(name, Scope::Default) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.generate_implied_end_tags(Some(name));
                if !self.current_node().is_some_and(|n| n.is_html_element(name)) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_html(name);
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let headings = ["h1", "h2", "h3", "h4", "h5", "h6"];
                if !self.open.has_any_in_scope(&headings, Scope::Default) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node().is_some_and(|n| n.is_html_element(name)) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_one_of(&headings);
            }
            _ if FORMATTING_TAGS.contains(&name) => {
                if self.adoption_agency(name) == AdoptionResult::RunAnyOtherEndTag {
                    self.any_other_end_tag(name);
                }
            }
            "applet" | "marquee" | "object" => {
                if !self.open.has_in_scope(name, Scope::Default) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node().is_some_and(|n| n.is_html_element(name)) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_html(name);
                self.formatting.clear_to_last_marker();
            }
            "br" => {
                self.err(ParseErrorCode::UnexpectedToken);
                self.reconstruct_formatting();
                self.insert_element(&TagToken::new("br"));
                self.open.pop();
                self.frameset_ok = false;
            }
            "template" => self.close_template(),
            _ => self.any_other_end_tag(name),
        }
    }

    fn check_leftover_open_elements(&mut self) {
        let benign = [
            "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc", "tbody",
            "td", "tfoot", "th", "thead", "tr", "body", "html",
        ];
        if self.open.iter().any(|n| !node_is_one_of(n, &benign)) {
            self.err(ParseErrorCode::MisnestedTag);
        }
    }

    fn close_form_element(&mut self) {
        if !self.open.has_template() {
            let node = self.form.take();
            let Some(node) = node.filter(|n| {
                self.open.has_node_in_scope(n, Scope::Default)
            }) else {
                self.err(ParseErrorCode::UnexpectedToken);
                return;
            };
            self.generate_implied_end_tags(None);
            if !self.current_node().is_some_and(|n| same_node(&n, &node)) {
                self.err(ParseErrorCode::MisnestedTag);
            }
            self.open.remove(&node);
        } else {
            if !self.open.has_in_scope("form", Scope::Default) {
                self.err(ParseErrorCode::UnexpectedToken);
                return;
            }
            self.generate_implied_end_tags(None);
            if !self
                .current_node()
                .is_some_and(|n| n.is_html_element("form"))
            {
                self.err(ParseErrorCode::MisnestedTag);
            }
            self.open.pop_until_html("form");
        }
    }

    /// The "any other end tag" walk: close a matching open element, or give
    /// up at a special one.
    pub(super) fn any_other_end_tag(&mut self, name: &str) {
        let stack: Vec<NodeRef> = self.open.iter().rev().cloned().collect();
        for node in stack {
            if node.is_html_element(name) {
                self.generate_implied_end_tags(Some(name));
                if !self.current_node().is_some_and(|n| same_node(&n, &node)) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_node(&node);
                return;
            }
            if super::is_special(&node) {
                self.err(ParseErrorCode::UnexpectedToken);
                return;
            }
        }
    }

    // --- text mode --------------------------------------------------------

    pub(super) fn mode_text(&mut self, token: Token) {
        match token {
            Token::Character(ch) => self.insert_char(ch),
            Token::EndOfStream => {
                self.err(ParseErrorCode::UnexpectedEndOfStream);
                self.open.pop();
                let original = self.take_original_mode();
                self.reprocess(original, Token::EndOfStream);
            }
            Token::EndTag(_) => {
                // `</script>` would re-enter the scripting host here;
                // execution is out of scope, so every end tag just closes.
                self.open.pop();
                let original = self.take_original_mode();
                self.switch_mode(original);
            }
            _ => unreachable!("tokenizer emits only characters and end tags in text"),
        }
    }

    fn take_original_mode(&mut self) -> InsertionMode {
        self.original_mode
            .take()
            .expect("text mode always parks the original mode")
    }

    // --- tables -----------------------------------------------------------

    pub(super) fn mode_in_table(&mut self, token: Token) {
        match token {
            Token::Character(_)
                if self.current_node().is_some_and(|n| {
                    node_is_one_of(&n, &["table", "tbody", "tfoot", "thead", "tr"])
                }) =>
            {
                self.pending_table_text.clear();
                self.original_mode = Some(self.mode_now());
                self.reprocess(InsertionMode::InTableText, token);
            }
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) => self.in_table_start_tag(tag),
            Token::EndTag(tag) => match tag.name.as_str() {
                "table" => {
                    if !self.open.has_in_scope("table", Scope::Table) {
                        self.err(ParseErrorCode::UnexpectedToken);
                        return;
                    }
                    self.open.pop_until_html("table");
                    self.reset_insertion_mode();
                }
                "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot"
                | "th" | "thead" | "tr" => self.err(ParseErrorCode::UnexpectedToken),
                "template" => self.process_in_mode(InsertionMode::InHead, Token::EndTag(tag)),
                _ => self.in_table_anything_else(Token::EndTag(tag)),
            },
            Token::EndOfStream => {
                self.process_in_mode(InsertionMode::InBody, Token::EndOfStream)
            }
            other => self.in_table_anything_else(other),
        }
    }

    fn in_table_start_tag(&mut self, tag: TagToken) {
        match tag.name.as_str() {
            "caption" => {
                self.clear_stack_to_context(&["table"]);
                self.formatting.push_marker();
                self.insert_element(&tag);
                self.switch_mode(InsertionMode::InCaption);
            }
            "colgroup" => {
                self.clear_stack_to_context(&["table"]);
                self.insert_element(&tag);
                self.switch_mode(InsertionMode::InColumnGroup);
            }
            "col" => {
                self.clear_stack_to_context(&["table"]);
                self.insert_element(&TagToken::new("colgroup"));
                self.reprocess(InsertionMode::InColumnGroup, Token::StartTag(tag));
            }
            "tbody" | "tfoot" | "thead" => {
                self.clear_stack_to_context(&["table"]);
                self.insert_element(&tag);
                self.switch_mode(InsertionMode::InTableBody);
            }
            "td" | "th" | "tr" => {
                self.clear_stack_to_context(&["table"]);
                self.insert_element(&TagToken::new("tbody"));
                self.reprocess(InsertionMode::InTableBody, Token::StartTag(tag));
            }
            "table" => {
                self.err(ParseErrorCode::MisnestedTag);
                if !self.open.has_in_scope("table", Scope::Table) {
                    return;
                }
                self.open.pop_until_html("table");
                self.reset_insertion_mode();
                self.process(Token::StartTag(tag));
            }
            "style" | "script" | "template" => {
                self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
            }
            "input" => {
                let hidden = tag
                    .attr("type")
                    .is_some_and(|v| v.eq_ignore_ascii_case("hidden"));
                if !hidden {
                    self.in_table_anything_else(Token::StartTag(tag));
                    return;
                }
                self.err(ParseErrorCode::UnexpectedToken);
                self.insert_element(&tag);
                self.open.pop();
                self.acknowledge_self_closing();
            }
            "form" => {
                self.err(ParseErrorCode::UnexpectedToken);
                if self.open.has_template() || self.form.is_some() {
                    return;
                }
                let element = self.insert_element(&tag);
                self.form = Some(element);
                self.open.pop();
            }
            _ => self.in_table_anything_else(Token::StartTag(tag)),
        }
    }

    /// Anything else in a table: parse error, then in-body rules with
    /// foster parenting enabled.
    fn in_table_anything_else(&mut self, token: Token) {
        self.err(ParseErrorCode::UnexpectedToken);
        self.foster_parenting = true;
        self.process_in_mode(InsertionMode::InBody, token);
        self.foster_parenting = false;
    }

    pub(super) fn mode_in_table_text(&mut self, token: Token) {
        match token {
            Token::Character('\0') => self.err(ParseErrorCode::UnexpectedNullCharacter),
            Token::Character(ch) => self.pending_table_text.push(ch),
            other => {
                let pending = std::mem::take(&mut self.pending_table_text);
                if pending.iter().any(|ch| !is_ws(*ch)) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    self.foster_parenting = true;
                    for ch in pending {
                        // In-body character handling, foster-aware.
                        self.reconstruct_formatting();
                        self.insert_char(ch);
                        if !is_ws(ch) {
                            self.frameset_ok = false;
                        }
                    }
                    self.foster_parenting = false;
                } else {
                    for ch in pending {
                        self.insert_char(ch);
                    }
                }
                let original = self.take_original_mode();
                self.reprocess(original, other);
            }
        }
    }

    pub(super) fn mode_in_caption(&mut self, token: Token) {
        match token {
            Token::EndTag(tag) if tag.name == "caption" => {
                self.close_caption();
            }
            Token::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr"
                ) =>
            {
                if !self.open.has_in_scope("caption", Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.close_caption();
                self.process(Token::StartTag(tag));
            }
            Token::EndTag(tag) if tag.name == "table" => {
                if !self.open.has_in_scope("caption", Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.close_caption();
                self.process(Token::EndTag(tag));
            }
            Token::EndTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "body" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr"
                ) =>
            {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            other => self.process_in_mode(InsertionMode::InBody, other),
        }
    }

    fn close_caption(&mut self) {
        if !self.open.has_in_scope("caption", Scope::Table) {
            self.err(ParseErrorCode::UnexpectedToken);
            return;
        }
        self.generate_implied_end_tags(None);
        if !self
            .current_node()
            .is_some_and(|n| n.is_html_element("caption"))
        {
            self.err(ParseErrorCode::MisnestedTag);
        }
        self.open.pop_until_html("caption");
        self.formatting.clear_to_last_marker();
        self.switch_mode(InsertionMode::InTable);
    }

    pub(super) fn mode_in_column_group(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => self.insert_char(ch),
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) if tag.name == "html" => {
                self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag));
            }
            Token::StartTag(tag) if tag.name == "col" => {
                self.insert_element(&tag);
                self.open.pop();
                self.acknowledge_self_closing();
            }
            Token::EndTag(tag) if tag.name == "colgroup" => {
                if !self
                    .current_node()
                    .is_some_and(|n| n.is_html_element("colgroup"))
                {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.open.pop();
                self.switch_mode(InsertionMode::InTable);
            }
            Token::EndTag(tag) if tag.name == "col" => {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            Token::StartTag(tag) if tag.name == "template" => {
                self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
            }
            Token::EndTag(tag) if tag.name == "template" => {
                self.process_in_mode(InsertionMode::InHead, Token::EndTag(tag));
            }
            Token::EndOfStream => {
                self.process_in_mode(InsertionMode::InBody, Token::EndOfStream)
            }
            other => {
                if !self
                    .current_node()
                    .is_some_and(|n| n.is_html_element("colgroup"))
                {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.open.pop();
                self.reprocess(InsertionMode::InTable, other);
            }
        }
    }

    pub(super) fn mode_in_table_body(&mut self, token: Token) {
        match token {
            Token::StartTag(tag) if tag.name == "tr" => {
                self.clear_stack_to_context(&["tbody", "tfoot", "thead"]);
                self.insert_element(&tag);
                self.switch_mode(InsertionMode::InRow);
            }
            Token::StartTag(tag) if matches!(tag.name.as_str(), "th" | "td") => {
                self.err(ParseErrorCode::UnexpectedToken);
                self.clear_stack_to_context(&["tbody", "tfoot", "thead"]);
                self.insert_element(&TagToken::new("tr"));
                self.reprocess(InsertionMode::InRow, Token::StartTag(tag));
            }
            Token::EndTag(tag)
                if matches!(tag.name.as_str(), "tbody" | "tfoot" | "thead") =>
            {
                if !self.open.has_in_scope(&tag.name, Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.clear_stack_to_context(&["tbody", "tfoot", "thead"]);
                self.open.pop();
                self.switch_mode(InsertionMode::InTable);
            }
            Token::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead"
                ) =>
            {
                self.close_table_body_then(Token::StartTag(tag));
            }
            Token::EndTag(tag) if tag.name == "table" => {
                self.close_table_body_then(Token::EndTag(tag));
            }
            Token::EndTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr"
                ) =>
            {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            other => self.process_in_mode(InsertionMode::InTable, other),
        }
    }

    fn close_table_body_then(&mut self, token: Token) {
        if !self
            .open
            .has_any_in_scope(&["tbody", "thead", "tfoot"], Scope::Table)
        {
            self.err(ParseErrorCode::UnexpectedToken);
            return;
        }
        self.clear_stack_to_context(&["tbody", "tfoot", "thead"]);
        self.open.pop();
        self.reprocess(InsertionMode::InTable, token);
    }

    pub(super) fn mode_in_row(&mut self, token: Token) {
        match token {
            Token::StartTag(tag) if matches!(tag.name.as_str(), "th" | "td") => {
                self.clear_stack_to_context(&["tr"]);
                self.insert_element(&tag);
                self.switch_mode(InsertionMode::InCell);
                self.formatting.push_marker();
            }
            Token::EndTag(tag) if tag.name == "tr" => {
                if !self.open.has_in_scope("tr", Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.clear_stack_to_context(&["tr"]);
                self.open.pop();
                self.switch_mode(InsertionMode::InTableBody);
            }
            Token::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr"
                ) =>
            {
                self.close_row_then(Token::StartTag(tag));
            }
            Token::EndTag(tag) if tag.name == "table" => {
                self.close_row_then(Token::EndTag(tag));
            }
            Token::EndTag(tag)
                if matches!(tag.name.as_str(), "tbody" | "tfoot" | "thead") =>
            {
                if !self.open.has_in_scope(&tag.name, Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.close_row_then(Token::EndTag(tag));
            }
            Token::EndTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th"
                ) =>
            {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            other => self.process_in_mode(InsertionMode::InTable, other),
        }
    }

    fn close_row_then(&mut self, token: Token) {
        if !self.open.has_in_scope("tr", Scope::Table) {
            self.err(ParseErrorCode::UnexpectedToken);
            return;
        }
        self.clear_stack_to_context(&["tr"]);
        self.open.pop();
        self.reprocess(InsertionMode::InTableBody, token);
    }

    pub(super) fn mode_in_cell(&mut self, token: Token) {
        match token {
            Token::EndTag(tag) if matches!(tag.name.as_str(), "td" | "th") => {
                let name = tag.name.as_str();
                if !self.open.has_in_scope(name, Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node().is_some_and(|n| n.is_html_element(name)) {
                    self.err(ParseErrorCode::MisnestedTag);
                }
                self.open.pop_until_html(name);
                self.formatting.clear_to_last_marker();
                self.switch_mode(InsertionMode::InRow);
            }
            Token::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr"
                ) =>
            {
                if !self.open.has_any_in_scope(&["td", "th"], Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.close_cell();
                self.process(Token::StartTag(tag));
            }
            Token::EndTag(tag)
                if matches!(tag.name.as_str(), "body" | "caption" | "col" | "colgroup"
                    | "html") =>
            {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            Token::EndTag(tag)
                if matches!(tag.name.as_str(), "table" | "tbody" | "tfoot" | "thead" | "tr") =>
            {
                if !self.open.has_in_scope(&tag.name, Scope::Table) {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.close_cell();
                self.process(Token::EndTag(tag));
            }
            other => self.process_in_mode(InsertionMode::InBody, other),
        }
    }

    fn close_cell(&mut self) {
        self.generate_implied_end_tags(None);
        if !self.current_node().is_some_and(|n| {
            n.is_html_element("td") || n.is_html_element("th")
        }) {
            self.err(ParseErrorCode::MisnestedTag);
        }
        self.open.pop_until_one_of(&["td", "th"]);
        self.formatting.clear_to_last_marker();
        self.switch_mode(InsertionMode::InRow);
    }

    // --- select -----------------------------------------------------------

    pub(super) fn mode_in_select(&mut self, token: Token) {
        match token {
            Token::Character('\0') => self.err(ParseErrorCode::UnexpectedNullCharacter),
            Token::Character(ch) => self.insert_char(ch),
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) => match tag.name.as_str() {
                "html" => self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag)),
                "option" => {
                    if self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("option"))
                    {
                        self.open.pop();
                    }
                    self.insert_element(&tag);
                }
                "optgroup" => {
                    if self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("option"))
                    {
                        self.open.pop();
                    }
                    if self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("optgroup"))
                    {
                        self.open.pop();
                    }
                    self.insert_element(&tag);
                }
                "hr" => {
                    if self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("option"))
                    {
                        self.open.pop();
                    }
                    if self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("optgroup"))
                    {
                        self.open.pop();
                    }
                    self.insert_element(&tag);
                    self.open.pop();
                    self.acknowledge_self_closing();
                }
                "select" => {
                    self.err(ParseErrorCode::MisnestedTag);
                    if !self.open.has_in_scope("select", Scope::Select) {
                        return;
                    }
                    self.open.pop_until_html("select");
                    self.reset_insertion_mode();
                }
                "input" | "keygen" | "textarea" => {
                    self.err(ParseErrorCode::MisnestedTag);
                    if !self.open.has_in_scope("select", Scope::Select) {
                        return;
                    }
                    self.open.pop_until_html("select");
                    self.reset_insertion_mode();
                    self.process(Token::StartTag(tag));
                }
                "script" | "template" => {
                    self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
                }
                _ => self.err(ParseErrorCode::UnexpectedToken),
            },
            Token::EndTag(tag) => match tag.name.as_str() {
                "optgroup" => {
                    let current_is_option = self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("option"));
                    if current_is_option
                        && self
                            .open
                            .get(self.open.len().saturating_sub(2))
                            .is_some_and(|n| n.is_html_element("optgroup"))
                    {
                        self.open.pop();
                    }
                    if self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("optgroup"))
                    {
                        self.open.pop();
                    } else {
                        self.err(ParseErrorCode::UnexpectedToken);
                    }
                }
                "option" => {
                    if self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("option"))
                    {
                        self.open.pop();
                    } else {
                        self.err(ParseErrorCode::UnexpectedToken);
                    }
                }
                "select" => {
                    if !self.open.has_in_scope("select", Scope::Select) {
                        self.err(ParseErrorCode::UnexpectedToken);
                        return;
                    }
                    self.open.pop_until_html("select");
                    self.reset_insertion_mode();
                }
                "template" => self.process_in_mode(InsertionMode::InHead, Token::EndTag(tag)),
                _ => self.err(ParseErrorCode::UnexpectedToken),
            },
            Token::EndOfStream => {
                self.process_in_mode(InsertionMode::InBody, Token::EndOfStream)
            }
        }
    }

    pub(super) fn mode_in_select_in_table(&mut self, token: Token) {
        const TABLE_PARTS: &[&str] = &[
            "caption", "table", "tbody", "tfoot", "thead", "tr", "td", "th",
        ];
        match token {
            Token::StartTag(tag) if TABLE_PARTS.contains(&tag.name.as_str()) => {
                self.err(ParseErrorCode::MisnestedTag);
                self.open.pop_until_html("select");
                self.reset_insertion_mode();
                self.process(Token::StartTag(tag));
            }
            Token::EndTag(tag) if TABLE_PARTS.contains(&tag.name.as_str()) => {
                self.err(ParseErrorCode::MisnestedTag);
                if !self.open.has_in_scope(&tag.name, Scope::Table) {
                    return;
                }
                self.open.pop_until_html("select");
                self.reset_insertion_mode();
                self.process(Token::EndTag(tag));
            }
            other => self.process_in_mode(InsertionMode::InSelect, other),
        }
    }

    // --- templates --------------------------------------------------------

    pub(super) fn mode_in_template(&mut self, token: Token) {
        match token {
            Token::Character(_) | Token::Comment(_) | Token::Doctype(_) => {
                self.process_in_mode(InsertionMode::InBody, token);
            }
            Token::StartTag(tag) => match tag.name.as_str() {
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                | "style" | "template" | "title" => {
                    self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
                }
                "caption" | "colgroup" | "tbody" | "tfoot" | "thead" => {
                    self.retarget_template_mode(InsertionMode::InTable, Token::StartTag(tag));
                }
                "col" => {
                    self.retarget_template_mode(
                        InsertionMode::InColumnGroup,
                        Token::StartTag(tag),
                    );
                }
                "tr" => {
                    self.retarget_template_mode(
                        InsertionMode::InTableBody,
                        Token::StartTag(tag),
                    );
                }
                "td" | "th" => {
                    self.retarget_template_mode(InsertionMode::InRow, Token::StartTag(tag));
                }
                _ => self.retarget_template_mode(InsertionMode::InBody, Token::StartTag(tag)),
            },
            Token::EndTag(tag) if tag.name == "template" => {
                self.process_in_mode(InsertionMode::InHead, Token::EndTag(tag));
            }
            Token::EndTag(tag) => {
                self.err(ParseErrorCode::UnexpectedToken);
            }
            Token::EndOfStream => {
                if !self.open.has_template() {
                    self.stop_parsing();
                    return;
                }
                self.err(ParseErrorCode::UnexpectedEndOfStream);
                self.open.pop_until_html("template");
                self.formatting.clear_to_last_marker();
                self.template_modes.pop();
                self.reset_insertion_mode();
                self.process(Token::EndOfStream);
            }
        }
    }

    fn retarget_template_mode(&mut self, mode: InsertionMode, token: Token) {
        self.template_modes.pop();
        self.template_modes.push(mode);
        self.reprocess(mode, token);
    }

    // --- after body / frameset -------------------------------------------

    pub(super) fn mode_after_body(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => {
                self.process_in_mode(InsertionMode::InBody, Token::Character(ch));
            }
            Token::Comment(data) => {
                let root = self.open.get(0);
                if let Some(root) = root {
                    self.insert_comment(&data, Some(&root));
                }
            }
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) if tag.name == "html" => {
                self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag));
            }
            Token::EndTag(tag) if tag.name == "html" => {
                if self.context.is_some() {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.switch_mode(InsertionMode::AfterAfterBody);
            }
            Token::EndOfStream => self.stop_parsing(),
            other => {
                self.err(ParseErrorCode::UnexpectedToken);
                self.reprocess(InsertionMode::InBody, other);
            }
        }
    }

    pub(super) fn mode_in_frameset(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => self.insert_char(ch),
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) => match tag.name.as_str() {
                "html" => self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag)),
                "frameset" => {
                    self.insert_element(&tag);
                }
                "frame" => {
                    self.insert_element(&tag);
                    self.open.pop();
                    self.acknowledge_self_closing();
                }
                "noframes" => self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag)),
                _ => self.err(ParseErrorCode::UnexpectedToken),
            },
            Token::EndTag(tag) if tag.name == "frameset" => {
                if self
                    .current_node()
                    .is_some_and(|n| n.is_html_element("html"))
                {
                    self.err(ParseErrorCode::UnexpectedToken);
                    return;
                }
                self.open.pop();
                if self.context.is_none()
                    && !self
                        .current_node()
                        .is_some_and(|n| n.is_html_element("frameset"))
                {
                    self.switch_mode(InsertionMode::AfterFrameset);
                }
            }
            Token::EndTag(_) => self.err(ParseErrorCode::UnexpectedToken),
            Token::EndOfStream => {
                if !self
                    .current_node()
                    .is_some_and(|n| n.is_html_element("html"))
                {
                    self.err(ParseErrorCode::UnexpectedEndOfStream);
                }
                self.stop_parsing();
            }
            Token::Character(_) => self.err(ParseErrorCode::UnexpectedToken),
        }
    }

    pub(super) fn mode_after_frameset(&mut self, token: Token) {
        match token {
            Token::Character(ch) if is_ws(ch) => self.insert_char(ch),
            Token::Comment(data) => self.insert_comment(&data, None),
            Token::Doctype(_) => self.err(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) if tag.name == "html" => {
                self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag));
            }
            Token::EndTag(tag) if tag.name == "html" => {
                self.switch_mode(InsertionMode::AfterAfterFrameset);
            }
            Token::StartTag(tag) if tag.name == "noframes" => {
                self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
            }
            Token::EndOfStream => self.stop_parsing(),
            _ => self.err(ParseErrorCode::UnexpectedToken),
        }
    }

    pub(super) fn mode_after_after_body(&mut self, token: Token) {
        match token {
            Token::Comment(data) => {
                let doc = self.document();
                self.insert_comment(&data, Some(&doc));
            }
            Token::Doctype(_) => {
                self.process_in_mode(InsertionMode::InBody, token);
            }
            Token::Character(ch) if is_ws(ch) => {
                self.process_in_mode(InsertionMode::InBody, Token::Character(ch));
            }
            Token::StartTag(tag) if tag.name == "html" => {
                self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag));
            }
            Token::EndOfStream => self.stop_parsing(),
            other => {
                self.err(ParseErrorCode::UnexpectedToken);
                self.reprocess(InsertionMode::InBody, other);
            }
        }
    }

    pub(super) fn mode_after_after_frameset(&mut self, token: Token) {
        match token {
            Token::Comment(data) => {
                let doc = self.document();
                self.insert_comment(&data, Some(&doc));
            }
            Token::Doctype(_) => {
                self.process_in_mode(InsertionMode::InBody, token);
            }
            Token::Character(ch) if is_ws(ch) => {
                self.process_in_mode(InsertionMode::InBody, Token::Character(ch));
            }
            Token::StartTag(tag) if tag.name == "html" => {
                self.process_in_mode(InsertionMode::InBody, Token::StartTag(tag));
            }
            Token::StartTag(tag) if tag.name == "noframes" => {
                self.process_in_mode(InsertionMode::InHead, Token::StartTag(tag));
            }
            Token::EndOfStream => self.stop_parsing(),
            _ => self.err(ParseErrorCode::UnexpectedToken),
        }
    }

    fn mode_now(&self) -> InsertionMode {
        self.mode
    }
}
