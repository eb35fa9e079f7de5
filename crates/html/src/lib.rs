//! HTML parsing pipeline: code-point input stream, tokenizer and tree
//! constructor, driving the `dom` crate's document model.
//!
//! Entry points:
//! - [`parse_document`] — whole-document parsing to end of stream.
//! - [`parse_fragment`] — fragment parsing against a context element.
//! - [`ParseSession`] — streaming byte/text feeds with explicit pumping and
//!   a pause flag for a future scripting host.

mod entities;
mod input;
mod token;

pub mod error;
pub mod tokenizer;

mod tree_builder;

pub use crate::error::{
    ErrorOrigin, ErrorPolicy, ParseCounters, ParseError, ParseErrorCode, ParseLog,
};
pub use crate::input::CodePointStream;
pub use crate::token::{Attribute, DoctypeToken, TagToken, Token};

use dom::node::NodeRef;
use dom::DomError;

use crate::tokenizer::Tokenizer;
use crate::tree_builder::TreeBuilder;

/// Parser configuration.
#[derive(Clone, Debug)]
pub struct ParserOptions {
    /// Scripting flag: changes `<noscript>` parsing.
    pub scripting_enabled: bool,
    /// Document URL recorded on the created document.
    pub url: Option<String>,
    /// Parse-error tracking policy.
    pub errors: ErrorPolicy,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            scripting_enabled: false,
            url: None,
            errors: ErrorPolicy::default(),
        }
    }
}

impl ParserOptions {
    fn log(&self) -> ParseLog {
        ParseLog::new(self.errors)
    }

    fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("about:blank")
    }
}

/// Parse a complete HTML document from decoded text.
pub fn parse_document(html: &str, options: &ParserOptions) -> NodeRef {
    let mut session = ParseSession::new(options);
    session.push_str(html);
    session.finish().document
}

/// Parse a complete HTML document from bytes (UTF-8 with replacement).
pub fn parse_document_bytes(html: &[u8], options: &ParserOptions) -> NodeRef {
    let mut session = ParseSession::new(options);
    session.push_bytes(html);
    session.finish().document
}

/// Fragment parsing: parse `html` against `context` and return a document
/// fragment owned by the context's document.
pub fn parse_fragment(
    html: &str,
    context: &NodeRef,
    options: &ParserOptions,
) -> Result<NodeRef, DomError> {
    if context.as_element().is_none() {
        return Err(DomError::InvalidNodeType);
    }
    let mut log = options.log();
    let mut stream = CodePointStream::new();
    stream.push_str(html, &mut log);
    stream.finish();
    let tokenizer = Tokenizer::new(stream);
    let mut builder = TreeBuilder::new_fragment(tokenizer, log, context, options.scripting_enabled);
    builder.run();
    let root = builder
        .document()
        .document_element()
        .expect("fragment parsing creates a root");
    let context_doc = context
        .owner_document()
        .unwrap_or_else(|| context.handle());
    let fragment = context_doc.create_document_fragment();
    for child in root.child_nodes() {
        fragment.append_child(&child)?;
    }
    Ok(fragment)
}

/// Finished parse: the tree plus the run's error records and counters.
pub struct ParseOutput {
    pub document: NodeRef,
    pub errors: Vec<ParseError>,
    pub counters: ParseCounters,
}

/// Streaming parse session.
///
/// The tokenizer and tree constructor run as cooperative coroutines inside
/// `pump`; feeds never block, and a paused session returns control to the
/// caller between tokens without consuming more input.
pub struct ParseSession {
    builder: TreeBuilder,
    finished_input: bool,
}

impl ParseSession {
    pub fn new(options: &ParserOptions) -> Self {
        let tokenizer = Tokenizer::new(CodePointStream::new());
        let builder = TreeBuilder::new_document(
            tokenizer,
            options.log(),
            options.url(),
            options.scripting_enabled,
        );
        Self {
            builder,
            finished_input: false,
        }
    }

    /// Feed decoded text; tokens are not consumed until `pump`.
    pub fn push_str(&mut self, text: &str) {
        debug_assert!(!self.finished_input, "push after finish");
        self.builder.feed_str(text);
    }

    /// Feed raw bytes (incremental UTF-8 decode with carry).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(!self.finished_input, "push after finish");
        self.builder.feed_bytes(bytes);
    }

    /// Drive the pipeline until it needs more input, stops, or pauses.
    /// Returns true once parsing has stopped.
    pub fn pump(&mut self) -> bool {
        self.builder.run()
    }

    /// Pause flag: while set, `pump` returns without consuming tokens.
    pub fn set_paused(&mut self, paused: bool) {
        self.builder.set_paused(paused);
    }

    pub fn document(&self) -> NodeRef {
        self.builder.document()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.builder.log.errors
    }

    pub fn counters(&self) -> ParseCounters {
        self.builder.log.counters
    }

    /// Mark end of input, run to completion and take the result.
    pub fn finish(mut self) -> ParseOutput {
        self.builder.finish_input();
        self.finished_input = true;
        self.builder.set_paused(false);
        self.builder.run();
        debug_assert!(self.builder.is_stopped(), "EOF stops the tree builder");
        ParseOutput {
            document: self.builder.document(),
            errors: std::mem::take(&mut self.builder.log.errors),
            counters: self.builder.log.counters,
        }
    }
}
