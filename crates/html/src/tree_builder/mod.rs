//! Tree constructor: insertion-mode state machines driving the DOM.
//!
//! The builder owns the tokenizer (cooperative coroutines: one token is
//! pulled, processed, and control returns to the tokenizer) and may switch
//! its state (RAWTEXT/RCDATA/script data/PLAINTEXT) or CDATA permission
//! from the adjusted current node. Reprocessing dispatches the same token
//! under a different mode and always terminates.

use dom::element::Attr;
use dom::name::{Ns, QualName};
use dom::node::NodeRef;
use dom::{CompatMode, Document};

use crate::error::{ErrorOrigin, ParseErrorCode, ParseLog};
use crate::token::{TagToken, Token};
use crate::tokenizer::{State, Tokenizer};

mod foreign;
mod formatting;
mod modes;
mod quirks;
mod stack;
#[cfg(test)]
mod tests;

use formatting::ActiveFormatting;
use stack::OpenElements;

/// The 23 insertion modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    InTemplate,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
}

/// Elements that terminate an "any other end tag" walk and gate implied
/// closures ("special" category).
pub(crate) fn is_special(node: &NodeRef) -> bool {
    let Some(el) = node.as_element() else {
        return false;
    };
    let local: &str = &el.name.local;
    match &el.name.ns {
        Some(Ns::Html) => matches!(
            local,
            "address" | "applet" | "area" | "article" | "aside" | "base" | "basefont"
                | "bgsound" | "blockquote" | "body" | "br" | "button" | "caption" | "center"
                | "col" | "colgroup" | "dd" | "details" | "dir" | "div" | "dl" | "dt" | "embed"
                | "fieldset" | "figcaption" | "figure" | "footer" | "form" | "frame"
                | "frameset" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "header"
                | "hgroup" | "hr" | "html" | "iframe" | "img" | "input" | "keygen" | "li"
                | "link" | "listing" | "main" | "marquee" | "menu" | "meta" | "nav" | "noembed"
                | "noframes" | "noscript" | "object" | "ol" | "p" | "param" | "plaintext"
                | "pre" | "script" | "search" | "section" | "select" | "source" | "style"
                | "summary" | "table" | "tbody" | "td" | "template" | "textarea" | "tfoot"
                | "th" | "thead" | "title" | "tr" | "track" | "ul" | "wbr" | "xmp"
        ),
        Some(Ns::MathMl) => {
            matches!(local, "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml")
        }
        Some(Ns::Svg) => matches!(local, "foreignObject" | "desc" | "title"),
        _ => false,
    }
}

pub(crate) const FORMATTING_TAGS: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt",
    "u",
];

pub(crate) const IMPLIED_END_TAGS: &[&str] =
    &["dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc"];

struct InsertLoc {
    parent: NodeRef,
    before: Option<NodeRef>,
}

pub(crate) struct TreeBuilder {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) log: ParseLog,
    doc: NodeRef,
    mode: InsertionMode,
    original_mode: Option<InsertionMode>,
    template_modes: Vec<InsertionMode>,
    open: OpenElements,
    formatting: ActiveFormatting,
    head: Option<NodeRef>,
    form: Option<NodeRef>,
    frameset_ok: bool,
    scripting: bool,
    context: Option<NodeRef>,
    foster_parenting: bool,
    pending_table_text: Vec<char>,
    ignore_next_lf: bool,
    pending_ack: bool,
    paused: bool,
    stopped: bool,
}

impl TreeBuilder {
    pub(crate) fn new_document(tokenizer: Tokenizer, log: ParseLog, url: &str, scripting: bool) -> Self {
        let doc = Document::with_url(url);
        Self {
            tokenizer,
            log,
            doc,
            mode: InsertionMode::Initial,
            original_mode: None,
            template_modes: Vec::new(),
            open: OpenElements::default(),
            formatting: ActiveFormatting::default(),
            head: None,
            form: None,
            frameset_ok: true,
            scripting,
            context: None,
            foster_parenting: false,
            pending_table_text: Vec::new(),
            ignore_next_lf: false,
            pending_ack: false,
            paused: false,
            stopped: false,
        }
    }

    /// Fragment parsing: parse against `context`, collecting the results
    /// under a synthetic root in a fresh document.
    pub(crate) fn new_fragment(
        mut tokenizer: Tokenizer,
        log: ParseLog,
        context: &NodeRef,
        scripting: bool,
    ) -> Self {
        seed_tokenizer_for_context(&mut tokenizer, context);
        let mut builder = Self::new_document(tokenizer, log, "about:blank", scripting);
        let context_doc = doc_of(context);
        if let Some(data) = context_doc.as_document() {
            if let Some(doc_data) = builder.doc.as_document() {
                doc_data.set_mode(data.mode());
            }
        }
        let root = builder.doc.create_element_raw(QualName::html("html"));
        builder
            .doc
            .append_child(&root)
            .expect("fresh document accepts a root");
        builder.open.push(root);
        builder.context = Some(context.clone());
        if context.is_html_element("template") {
            builder.template_modes.push(InsertionMode::InTemplate);
        }
        builder.form = nearest_form_ancestor(context);
        builder.reset_insertion_mode();
        builder
    }

    pub(crate) fn document(&self) -> NodeRef {
        self.doc.clone()
    }

    pub(crate) fn feed_str(&mut self, text: &str) {
        self.tokenizer.input.push_str(text, &mut self.log);
    }

    pub(crate) fn feed_bytes(&mut self, bytes: &[u8]) {
        self.tokenizer.input.push_bytes(bytes, &mut self.log);
    }

    pub(crate) fn finish_input(&mut self) {
        self.tokenizer.input.finish();
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Pump tokens until stopped, paused, or out of input. Returns true
    /// when parsing has stopped.
    pub(crate) fn run(&mut self) -> bool {
        while !self.stopped {
            if self.paused {
                return false;
            }
            self.sync_tokenizer_flags();
            let Some(token) = self.tokenizer.next_token(&mut self.log) else {
                self.update_counters();
                return self.stopped;
            };
            self.process_token(token);
        }
        self.update_counters();
        true
    }

    fn update_counters(&mut self) {
        let depth = self.open.max_depth();
        let chars = self.tokenizer.input.position() as u64;
        let counters = &mut self.log.counters;
        counters.chars_consumed = chars;
        counters.max_open_elements_depth = counters.max_open_elements_depth.max(depth);
        counters.max_active_formatting_depth = counters
            .max_active_formatting_depth
            .max(self.formatting.max_depth());
    }

    /// CDATA sections are only permitted while the adjusted current node is
    /// in a foreign namespace.
    fn sync_tokenizer_flags(&mut self) {
        let allow = self
            .adjusted_current_node()
            .and_then(|n| n.as_element().map(|el| el.name.ns != Some(Ns::Html)))
            .unwrap_or(false);
        self.tokenizer.set_allow_cdata(allow);
    }

    fn process_token(&mut self, token: Token) {
        if self.ignore_next_lf {
            self.ignore_next_lf = false;
            if matches!(token, Token::Character('\n')) {
                return;
            }
        }
        let self_closing_start = matches!(&token, Token::StartTag(tag) if tag.self_closing);
        self.pending_ack = self_closing_start;
        self.process(token);
        if self.pending_ack {
            self.err(ParseErrorCode::UnexpectedSolidusInTag);
            self.pending_ack = false;
        }
    }

    fn acknowledge_self_closing(&mut self) {
        self.pending_ack = false;
    }

    /// Token dispatch: foreign-content rules apply unless the adjusted
    /// current node hands control back to the HTML modes.
    pub(crate) fn process(&mut self, token: Token) {
        if self.stopped {
            return;
        }
        if self.use_html_dispatch(&token) {
            self.process_in_mode(self.mode, token);
        } else {
            self.process_foreign(token);
        }
    }

    fn use_html_dispatch(&self, token: &Token) -> bool {
        let Some(node) = self.adjusted_current_node() else {
            return true;
        };
        let Some(el) = node.as_element() else {
            return true;
        };
        if el.name.ns == Some(Ns::Html) {
            return true;
        }
        if token == &Token::EndOfStream {
            return true;
        }
        let local: &str = &el.name.local;
        let mathml_text = el.name.ns == Some(Ns::MathMl)
            && matches!(local, "mi" | "mo" | "mn" | "ms" | "mtext");
        if mathml_text {
            match token {
                Token::StartTag(tag) if tag.name != "mglyph" && tag.name != "malignmark" => {
                    return true;
                }
                Token::Character(_) => return true,
                _ => {}
            }
        }
        if el.name.ns == Some(Ns::MathMl) && local == "annotation-xml" {
            if let Token::StartTag(tag) = token {
                if tag.name == "svg" {
                    return true;
                }
            }
        }
        if foreign::is_html_integration_point(&node) {
            match token {
                Token::StartTag(_) | Token::Character(_) => return true,
                _ => {}
            }
        }
        false
    }

    pub(crate) fn process_in_mode(&mut self, mode: InsertionMode, token: Token) {
        log::trace!(target: "html.tree_builder", "{mode:?} <- {token:?}");
        match mode {
            InsertionMode::Initial => self.mode_initial(token),
            InsertionMode::BeforeHtml => self.mode_before_html(token),
            InsertionMode::BeforeHead => self.mode_before_head(token),
            InsertionMode::InHead => self.mode_in_head(token),
            InsertionMode::InHeadNoscript => self.mode_in_head_noscript(token),
            InsertionMode::AfterHead => self.mode_after_head(token),
            InsertionMode::InBody => self.mode_in_body(token),
            InsertionMode::Text => self.mode_text(token),
            InsertionMode::InTable => self.mode_in_table(token),
            InsertionMode::InTableText => self.mode_in_table_text(token),
            InsertionMode::InCaption => self.mode_in_caption(token),
            InsertionMode::InColumnGroup => self.mode_in_column_group(token),
            InsertionMode::InTableBody => self.mode_in_table_body(token),
            InsertionMode::InRow => self.mode_in_row(token),
            InsertionMode::InCell => self.mode_in_cell(token),
            InsertionMode::InSelect => self.mode_in_select(token),
            InsertionMode::InSelectInTable => self.mode_in_select_in_table(token),
            InsertionMode::InTemplate => self.mode_in_template(token),
            InsertionMode::AfterBody => self.mode_after_body(token),
            InsertionMode::InFrameset => self.mode_in_frameset(token),
            InsertionMode::AfterFrameset => self.mode_after_frameset(token),
            InsertionMode::AfterAfterBody => self.mode_after_after_body(token),
            InsertionMode::AfterAfterFrameset => self.mode_after_after_frameset(token),
        }
    }

    pub(crate) fn reprocess(&mut self, mode: InsertionMode, token: Token) {
        self.mode = mode;
        self.process(token);
    }

    pub(crate) fn err(&mut self, code: ParseErrorCode) {
        let position = self.tokenizer.input.position();
        self.log.report(ErrorOrigin::TreeBuilder, code, position);
    }

    // --- node/stack accessors ---------------------------------------------

    pub(crate) fn current_node(&self) -> Option<NodeRef> {
        self.open.current()
    }

    /// Context element in fragment parsing while the stack holds only the
    /// synthetic root; the current node otherwise.
    pub(crate) fn adjusted_current_node(&self) -> Option<NodeRef> {
        if self.open.len() == 1 {
            if let Some(context) = &self.context {
                return Some(context.clone());
            }
        }
        self.open.current()
    }

    fn html_root(&self) -> Option<NodeRef> {
        self.open.get(0)
    }

    // --- insertion --------------------------------------------------------

    /// The adjusted insertion location, honoring foster parenting and
    /// template content redirection.
    fn appropriate_place(&self, override_target: Option<&NodeRef>) -> InsertLoc {
        let target = override_target
            .cloned()
            .or_else(|| self.current_node())
            .unwrap_or_else(|| self.doc.clone());
        let mut loc = if self.foster_parenting && is_table_group(&target) {
            self.foster_parent_location()
        } else {
            InsertLoc {
                parent: target,
                before: None,
            }
        };
        let template_contents = loc
            .parent
            .as_element()
            .and_then(|el| el.template_contents());
        if let Some(contents) = template_contents {
            loc = InsertLoc {
                parent: contents,
                before: None,
            };
        }
        loc
    }

    fn foster_parent_location(&self) -> InsertLoc {
        let last_template = self.open.last_index_of_html("template");
        let last_table = self.open.last_index_of_html("table");
        match (last_template, last_table) {
            (Some(t), table) if table.map_or(true, |i| t > i) => {
                let template = self.open.get(t).expect("index from stack");
                let contents = template
                    .as_element()
                    .and_then(|el| el.template_contents())
                    .expect("template elements carry contents");
                InsertLoc {
                    parent: contents,
                    before: None,
                }
            }
            (_, None) => InsertLoc {
                parent: self.html_root().unwrap_or_else(|| self.doc.clone()),
                before: None,
            },
            (_, Some(i)) => {
                let table = self.open.get(i).expect("index from stack");
                match table.parent() {
                    Some(parent) => InsertLoc {
                        parent,
                        before: Some(table),
                    },
                    None => InsertLoc {
                        parent: self.open.get(i - 1).expect("table is never the root"),
                        before: None,
                    },
                }
            }
        }
    }

    fn insert_at(&mut self, loc: &InsertLoc, node: &NodeRef) {
        let result = match &loc.before {
            Some(reference) => loc.parent.insert_before(node, Some(reference)),
            None => loc.parent.append_child(node),
        };
        debug_assert!(result.is_ok(), "parser-driven insertion cannot fail");
    }

    /// Create an element for a token. Foreign attributes arrive
    /// pre-adjusted as qualified names.
    pub(crate) fn create_element_for_token(
        &self,
        tag: &TagToken,
        ns: Ns,
        intended_parent: &NodeRef,
    ) -> NodeRef {
        let doc = doc_of(intended_parent);
        let element = doc.create_element_raw(QualName::new(Some(ns.clone()), None, &*tag.name));
        for attr in &tag.attrs {
            let name = foreign::adjusted_attr_name(&ns, &attr.name);
            if element
                .as_element()
                .expect("just created an element")
                .attributes()
                .iter()
                .any(|a| a.name == name)
            {
                continue;
            }
            element.push_attribute(Attr::new(name, attr.value.clone()));
        }
        element
    }

    /// Insert an HTML element for a token and push it on the stack.
    pub(crate) fn insert_element(&mut self, tag: &TagToken) -> NodeRef {
        self.insert_foreign_element(tag, Ns::Html)
    }

    pub(crate) fn insert_foreign_element(&mut self, tag: &TagToken, ns: Ns) -> NodeRef {
        let loc = self.appropriate_place(None);
        let element = self.create_element_for_token(tag, ns, &loc.parent);
        self.insert_at(&loc, &element);
        self.open.push(element.clone());
        element
    }

    /// Insert a character, merging into an adjacent text node.
    pub(crate) fn insert_char(&mut self, ch: char) {
        let loc = self.appropriate_place(None);
        if loc.parent.as_document().is_some() {
            return; // characters are dropped at the document level
        }
        let previous = match &loc.before {
            Some(reference) => reference.previous_sibling(),
            None => loc.parent.last_child(),
        };
        if let Some(prev) = previous {
            if let Some(cd) = prev.as_char_data() {
                if prev.is_text() {
                    cd.data.borrow_mut().push(ch);
                    return;
                }
            }
        }
        let text = doc_of(&loc.parent).create_text_node(ch.to_string());
        self.insert_at(&loc, &text);
    }

    pub(crate) fn insert_comment(&mut self, data: &str, target: Option<&NodeRef>) {
        let loc = match target {
            Some(parent) => InsertLoc {
                parent: parent.clone(),
                before: None,
            },
            None => self.appropriate_place(None),
        };
        let comment = doc_of(&loc.parent).create_comment(data);
        self.insert_at(&loc, &comment);
    }

    // --- mode plumbing ----------------------------------------------------

    pub(crate) fn switch_mode(&mut self, mode: InsertionMode) {
        self.mode = mode;
    }

    /// RAWTEXT/RCDATA excursion: insert, flip the tokenizer, park the mode.
    pub(crate) fn parse_generic_text(&mut self, tag: &TagToken, state: State) {
        self.insert_element(tag);
        self.tokenizer.set_state(state);
        self.original_mode = Some(self.mode);
        self.mode = InsertionMode::Text;
    }

    pub(crate) fn generate_implied_end_tags(&mut self, except: Option<&str>) {
        while let Some(node) = self.current_node() {
            let is_implied = node
                .as_element()
                .filter(|el| el.name.ns == Some(Ns::Html))
                .is_some_and(|el| IMPLIED_END_TAGS.contains(&&*el.name.local));
            if is_implied && except.is_none_or(|name| !node.is_html_element(name)) {
                self.open.pop();
            } else {
                break;
            }
        }
    }

    pub(crate) fn generate_implied_end_tags_thoroughly(&mut self) {
        while let Some(node) = self.current_node() {
            let is_implied = node
                .as_element()
                .filter(|el| el.name.ns == Some(Ns::Html))
                .is_some_and(|el| {
                    IMPLIED_END_TAGS.contains(&&*el.name.local)
                        || matches!(
                            &*el.name.local,
                            "caption" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead"
                                | "tr"
                        )
                });
            if is_implied {
                self.open.pop();
            } else {
                break;
            }
        }
    }

    pub(crate) fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"));
        if !self.current_node().is_some_and(|n| n.is_html_element("p")) {
            self.err(ParseErrorCode::MisnestedTag);
        }
        self.open.pop_until_html("p");
    }

    /// Clear the stack back to a table/table-body/row context.
    pub(crate) fn clear_stack_to_context(&mut self, context: &[&str]) {
        while let Some(node) = self.current_node() {
            let keep = context.iter().any(|n| node.is_html_element(n))
                || node.is_html_element("template")
                || node.is_html_element("html");
            if keep {
                break;
            }
            self.open.pop();
        }
    }

    pub(crate) fn reset_insertion_mode(&mut self) {
        for (index, node) in self.open.iter().enumerate().rev() {
            let last = index == 0;
            let node = if last && self.context.is_some() {
                self.context.clone().expect("checked")
            } else {
                node.clone()
            };
            let Some(el) = node.as_element() else {
                continue;
            };
            if el.name.ns != Some(Ns::Html) {
                continue;
            }
            match &*el.name.local {
                "select" => {
                    let mut mode = InsertionMode::InSelect;
                    if !last {
                        for ancestor in self.open.iter().take(index).rev() {
                            if ancestor.is_html_element("template") {
                                break;
                            }
                            if ancestor.is_html_element("table") {
                                mode = InsertionMode::InSelectInTable;
                                break;
                            }
                        }
                    }
                    self.mode = mode;
                    return;
                }
                "td" | "th" if !last => {
                    self.mode = InsertionMode::InCell;
                    return;
                }
                "tr" => {
                    self.mode = InsertionMode::InRow;
                    return;
                }
                "tbody" | "thead" | "tfoot" => {
                    self.mode = InsertionMode::InTableBody;
                    return;
                }
                "caption" => {
                    self.mode = InsertionMode::InCaption;
                    return;
                }
                "colgroup" => {
                    self.mode = InsertionMode::InColumnGroup;
                    return;
                }
                "table" => {
                    self.mode = InsertionMode::InTable;
                    return;
                }
                "template" => {
                    self.mode = *self
                        .template_modes
                        .last()
                        .expect("template on stack implies a template mode");
                    return;
                }
                "head" if !last => {
                    self.mode = InsertionMode::InHead;
                    return;
                }
                "body" => {
                    self.mode = InsertionMode::InBody;
                    return;
                }
                "frameset" => {
                    self.mode = InsertionMode::InFrameset;
                    return;
                }
                "html" => {
                    self.mode = if self.head.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    };
                    return;
                }
                _ => {}
            }
            if last {
                self.mode = InsertionMode::InBody;
                return;
            }
        }
        self.mode = InsertionMode::InBody;
    }

    /// Stop parsing: pop everything; the tree survives, the run ends.
    pub(crate) fn stop_parsing(&mut self) {
        while self.open.pop().is_some() {}
        self.stopped = true;
    }
}

/// Fragment parsing seeds the tokenizer from the context element: RAWTEXT /
/// RCDATA / script-data / PLAINTEXT contexts start in the matching state.
fn seed_tokenizer_for_context(tokenizer: &mut Tokenizer, context: &NodeRef) {
    if let Some(el) = context.as_element() {
        if el.name.ns == Some(Ns::Html) {
            let state = match &*el.name.local {
                "title" | "textarea" => Some(State::Rcdata),
                "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(State::Rawtext),
                "script" => Some(State::ScriptData),
                "plaintext" => Some(State::Plaintext),
                _ => None,
            };
            if let Some(state) = state {
                tokenizer.set_state(state);
            }
            tokenizer.set_last_start_tag(&el.name.local);
        }
    }
}

fn nearest_form_ancestor(node: &NodeRef) -> Option<NodeRef> {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if n.is_html_element("form") {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

pub(crate) fn doc_of(node: &NodeRef) -> NodeRef {
    node.owner_document().unwrap_or_else(|| node.handle())
}

fn is_table_group(node: &NodeRef) -> bool {
    ["table", "tbody", "tfoot", "thead", "tr"]
        .iter()
        .any(|n| node.is_html_element(n))
}

pub(crate) fn set_compat_mode(doc: &NodeRef, mode: CompatMode) {
    if let Some(data) = doc.as_document() {
        data.set_mode(mode);
    }
}

pub(crate) fn merge_missing_attrs(element: &NodeRef, tag: &TagToken) {
    for attr in &tag.attrs {
        if !element.has_attribute(&attr.name) {
            let _ = element.set_attribute(&attr.name, &attr.value);
        }
    }
}

pub(crate) fn node_is_one_of(node: &NodeRef, names: &[&str]) -> bool {
    names.iter().any(|n| node.is_html_element(n))
}
