//! Token model.
//!
//! Character tokens carry one code point each (consumers batch if they
//! want). Doctype names and identifiers distinguish "missing" from empty.
//! End tags can carry attributes and a self-closing flag — both are parse
//! errors, but stay representable.

/// Ordered attribute pair. The tokenizer lowercases names and drops later
/// duplicates before the token is emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagToken {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub self_closing: bool,
    /// Set by the tree constructor when it honors the self-closing flag;
    /// an unacknowledged flag is a parse error.
    pub self_closing_acknowledged: bool,
}

impl TagToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            self_closing: false,
            self_closing_acknowledged: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctypeToken {
    pub name: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub force_quirks: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Character(char),
    Comment(String),
    Doctype(DoctypeToken),
    StartTag(TagToken),
    EndTag(TagToken),
    EndOfStream,
}

impl Token {
    pub fn is_whitespace(&self) -> bool {
        matches!(
            self,
            Token::Character('\t' | '\n' | '\x0C' | '\r' | ' ')
        )
    }
}
