//! Soft parse errors and instrumentation counters.
//!
//! Parse errors never abort parsing and are never propagated as `Err`; they
//! are collected out-of-band under a bounded policy.

/// Where a parse error was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorOrigin {
    Tokenizer,
    TreeBuilder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorCode {
    AbruptClosingOfEmptyComment,
    AbruptDoctypePublicIdentifier,
    AbruptDoctypeSystemIdentifier,
    AbsenceOfDigitsInNumericCharacterReference,
    CdataInHtmlContent,
    CharacterReferenceOutsideUnicodeRange,
    ControlCharacterReference,
    DuplicateAttribute,
    EndTagWithAttributes,
    EndTagWithTrailingSolidus,
    EofBeforeTagName,
    EofInCdata,
    EofInComment,
    EofInDoctype,
    EofInScriptHtmlCommentLikeText,
    EofInTag,
    IncorrectlyClosedComment,
    IncorrectlyOpenedComment,
    InvalidCharacterSequenceAfterDoctypeName,
    InvalidFirstCharacterOfTagName,
    MissingAttributeValue,
    MissingDoctypeName,
    MissingDoctypePublicIdentifier,
    MissingDoctypeSystemIdentifier,
    MissingEndTagName,
    MissingQuoteBeforeDoctypePublicIdentifier,
    MissingQuoteBeforeDoctypeSystemIdentifier,
    MissingSemicolonAfterCharacterReference,
    MissingWhitespaceAfterDoctypePublicKeyword,
    MissingWhitespaceAfterDoctypeSystemKeyword,
    MissingWhitespaceBeforeDoctypeName,
    MissingWhitespaceBetweenAttributes,
    MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
    NestedComment,
    NoncharacterInInputStream,
    NullCharacterReference,
    SurrogateCharacterReference,
    UnexpectedCharacterAfterDoctypeSystemIdentifier,
    UnexpectedCharacterInAttributeName,
    UnexpectedCharacterInUnquotedAttributeValue,
    UnexpectedEqualsSignBeforeAttributeName,
    UnexpectedNullCharacter,
    UnexpectedQuestionMarkInsteadOfTagName,
    UnexpectedSolidusInTag,
    UnknownNamedCharacterReference,
    // Tree-construction errors share one coarse code family.
    UnexpectedToken,
    UnexpectedDoctype,
    UnexpectedEndOfStream,
    MisnestedTag,
}

/// One recorded parse error. Positions are code-point offsets into the
/// preprocessed (newline-normalized) input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub origin: ErrorOrigin,
    pub code: ParseErrorCode,
    pub position: usize,
}

/// Bounded error-tracking policy: counters always increment; stored records
/// are capped with oldest-first drop.
#[derive(Clone, Copy, Debug)]
pub struct ErrorPolicy {
    pub track: bool,
    pub max_stored: usize,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            track: true,
            max_stored: 128,
        }
    }
}

/// Instrumentation counters for one parse run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseCounters {
    pub tokens_emitted: u64,
    pub parse_errors: u64,
    pub chars_consumed: u64,
    pub max_open_elements_depth: u32,
    pub max_active_formatting_depth: u32,
}

/// Shared error sink + counters for one parse run (tokenizer and tree
/// builder both report here).
#[derive(Debug, Default)]
pub struct ParseLog {
    pub policy: ErrorPolicy,
    pub errors: Vec<ParseError>,
    pub counters: ParseCounters,
}

impl ParseLog {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            errors: Vec::new(),
            counters: ParseCounters::default(),
        }
    }

    pub fn report(&mut self, origin: ErrorOrigin, code: ParseErrorCode, position: usize) {
        self.counters.parse_errors += 1;
        log::trace!(target: "html.parse_error", "{origin:?}: {code:?} @{position}");
        if !self.policy.track {
            return;
        }
        if self.errors.len() == self.policy.max_stored {
            self.errors.remove(0);
        }
        self.errors.push(ParseError {
            origin,
            code,
            position,
        });
    }
}
