//! Markup-declaration states: comments, doctypes, CDATA sections.

use super::{State, Step, Tokenizer};
use crate::error::{ParseErrorCode, ParseLog};

/// Multi-character lookahead outcome; `Incomplete` keeps chunk-equivalence
/// by waiting for more input instead of committing to a partial keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ahead {
    Matched,
    NoMatch,
    Incomplete,
}

impl Tokenizer {
    fn lookahead_keyword(&self, keyword: &str, case_insensitive: bool) -> Ahead {
        for (i, expected) in keyword.chars().enumerate() {
            match self.input.peek(i) {
                None => {
                    return if self.input.end_of_stream_marked() {
                        Ahead::NoMatch
                    } else {
                        Ahead::Incomplete
                    };
                }
                Some(ch) => {
                    let matches = if case_insensitive {
                        ch.eq_ignore_ascii_case(&expected)
                    } else {
                        ch == expected
                    };
                    if !matches {
                        return Ahead::NoMatch;
                    }
                }
            }
        }
        Ahead::Matched
    }

    fn consume_chars(&mut self, n: usize) {
        self.input.seek_relative(n as isize);
    }

    pub(super) fn state_markup_declaration_open(&mut self, log: &mut ParseLog) -> Step {
        match self.lookahead_keyword("--", false) {
            Ahead::Matched => {
                self.consume_chars(2);
                self.comment.clear();
                self.switch(State::CommentStart);
                return Step::Progress;
            }
            Ahead::Incomplete => return Step::NeedMoreInput,
            Ahead::NoMatch => {}
        }
        match self.lookahead_keyword("doctype", true) {
            Ahead::Matched => {
                self.consume_chars(7);
                self.switch(State::Doctype);
                return Step::Progress;
            }
            Ahead::Incomplete => return Step::NeedMoreInput,
            Ahead::NoMatch => {}
        }
        match self.lookahead_keyword("[CDATA[", false) {
            Ahead::Matched => {
                self.consume_chars(7);
                if self.allow_cdata {
                    self.switch(State::CdataSection);
                } else {
                    self.error(log, ParseErrorCode::CdataInHtmlContent);
                    self.comment.clear();
                    self.comment.push_str("[CDATA[");
                    self.switch(State::BogusComment);
                }
                return Step::Progress;
            }
            Ahead::Incomplete => return Step::NeedMoreInput,
            Ahead::NoMatch => {}
        }
        self.error(log, ParseErrorCode::IncorrectlyOpenedComment);
        self.comment.clear();
        self.switch(State::BogusComment);
        Step::Progress
    }

    pub(super) fn state_bogus_comment(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_comment();
            }
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.comment.push('\u{FFFD}');
            }
            Some(ch) => self.comment.push(ch),
            None => {
                self.emit_current_comment();
                self.emit_eof();
            }
        }
        Step::Progress
    }

    // --- comments ---------------------------------------------------------

    pub(super) fn state_comment_start(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => self.switch(State::CommentStartDash),
            Some('>') => {
                self.error(log, ParseErrorCode::AbruptClosingOfEmptyComment);
                self.switch(State::Data);
                self.emit_current_comment();
            }
            _ => self.reconsume(c, State::Comment),
        }
        Step::Progress
    }

    pub(super) fn state_comment_start_dash(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => self.switch(State::CommentEnd),
            Some('>') => {
                self.error(log, ParseErrorCode::AbruptClosingOfEmptyComment);
                self.switch(State::Data);
                self.emit_current_comment();
            }
            Some(_) => {
                self.comment.push('-');
                self.reconsume(c, State::Comment);
            }
            None => {
                self.error(log, ParseErrorCode::EofInComment);
                self.emit_current_comment();
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_comment(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('<') => {
                self.comment.push('<');
                self.switch(State::CommentLessThanSign);
            }
            Some('-') => self.switch(State::CommentEndDash),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.comment.push('\u{FFFD}');
            }
            Some(ch) => self.comment.push(ch),
            None => {
                self.error(log, ParseErrorCode::EofInComment);
                self.emit_current_comment();
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_comment_less_than_sign(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('!') => {
                self.comment.push('!');
                self.switch(State::CommentLessThanSignBang);
            }
            Some('<') => self.comment.push('<'),
            _ => self.reconsume(c, State::Comment),
        }
        Step::Progress
    }

    pub(super) fn state_comment_less_than_sign_bang(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => self.switch(State::CommentLessThanSignBangDash),
            _ => self.reconsume(c, State::Comment),
        }
        Step::Progress
    }

    pub(super) fn state_comment_less_than_sign_bang_dash(
        &mut self,
        _log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('-') => self.switch(State::CommentLessThanSignBangDashDash),
            _ => self.reconsume(c, State::CommentEndDash),
        }
        Step::Progress
    }

    pub(super) fn state_comment_less_than_sign_bang_dash_dash(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('>') | None => self.reconsume(c, State::CommentEnd),
            Some(_) => {
                self.error(log, ParseErrorCode::NestedComment);
                self.reconsume(c, State::CommentEnd);
            }
        }
        Step::Progress
    }

    pub(super) fn state_comment_end_dash(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => self.switch(State::CommentEnd),
            Some(_) => {
                self.comment.push('-');
                self.reconsume(c, State::Comment);
            }
            None => {
                self.error(log, ParseErrorCode::EofInComment);
                self.emit_current_comment();
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_comment_end(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_comment();
            }
            Some('!') => self.switch(State::CommentEndBang),
            Some('-') => self.comment.push('-'),
            Some(_) => {
                self.comment.push_str("--");
                self.reconsume(c, State::Comment);
            }
            None => {
                self.error(log, ParseErrorCode::EofInComment);
                self.emit_current_comment();
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_comment_end_bang(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => {
                self.comment.push_str("--!");
                self.switch(State::CommentEndDash);
            }
            Some('>') => {
                self.error(log, ParseErrorCode::IncorrectlyClosedComment);
                self.switch(State::Data);
                self.emit_current_comment();
            }
            Some(_) => {
                self.comment.push_str("--!");
                self.reconsume(c, State::Comment);
            }
            None => {
                self.error(log, ParseErrorCode::EofInComment);
                self.emit_current_comment();
                self.emit_eof();
            }
        }
        Step::Progress
    }

    // --- doctypes ---------------------------------------------------------

    fn doctype_eof(&mut self, log: &mut ParseLog) {
        self.error(log, ParseErrorCode::EofInDoctype);
        self.doctype.force_quirks = true;
        self.emit_current_doctype();
        self.emit_eof();
    }

    pub(super) fn state_doctype(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => self.switch(State::BeforeDoctypeName),
            Some('>') => self.reconsume(c, State::BeforeDoctypeName),
            Some(_) => {
                self.error(log, ParseErrorCode::MissingWhitespaceBeforeDoctypeName);
                self.reconsume(c, State::BeforeDoctypeName);
            }
            None => {
                self.doctype = Default::default();
                self.doctype_eof(log);
            }
        }
        Step::Progress
    }

    pub(super) fn state_before_doctype_name(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {}
            Some(ch) if ch.is_ascii_uppercase() => {
                self.doctype = Default::default();
                self.doctype.name = Some(ch.to_ascii_lowercase().to_string());
                self.switch(State::DoctypeName);
            }
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.doctype = Default::default();
                self.doctype.name = Some('\u{FFFD}'.to_string());
                self.switch(State::DoctypeName);
            }
            Some('>') => {
                self.error(log, ParseErrorCode::MissingDoctypeName);
                self.doctype = Default::default();
                self.doctype.force_quirks = true;
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(ch) => {
                self.doctype = Default::default();
                self.doctype.name = Some(ch.to_string());
                self.switch(State::DoctypeName);
            }
            None => {
                self.doctype = Default::default();
                self.doctype_eof(log);
            }
        }
        Step::Progress
    }

    pub(super) fn state_doctype_name(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => self.switch(State::AfterDoctypeName),
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(ch) if ch.is_ascii_uppercase() => {
                self.doctype
                    .name
                    .get_or_insert_with(String::new)
                    .push(ch.to_ascii_lowercase());
            }
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.doctype
                    .name
                    .get_or_insert_with(String::new)
                    .push('\u{FFFD}');
            }
            Some(ch) => {
                self.doctype.name.get_or_insert_with(String::new).push(ch);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_after_doctype_name(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {}
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(_) => {
                // Keyword matching happens on the unconsumed tail.
                self.reconsume(c, State::AfterDoctypeName);
                match self.lookahead_keyword("public", true) {
                    Ahead::Matched => {
                        self.consume_chars(6);
                        self.switch(State::AfterDoctypePublicKeyword);
                        return Step::Progress;
                    }
                    Ahead::Incomplete => return Step::NeedMoreInput,
                    Ahead::NoMatch => {}
                }
                match self.lookahead_keyword("system", true) {
                    Ahead::Matched => {
                        self.consume_chars(6);
                        self.switch(State::AfterDoctypeSystemKeyword);
                        return Step::Progress;
                    }
                    Ahead::Incomplete => return Step::NeedMoreInput,
                    Ahead::NoMatch => {}
                }
                self.error(
                    log,
                    ParseErrorCode::InvalidCharacterSequenceAfterDoctypeName,
                );
                self.doctype.force_quirks = true;
                self.switch(State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_after_doctype_public_keyword(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {
                self.switch(State::BeforeDoctypePublicIdentifier)
            }
            Some('"') => {
                self.error(
                    log,
                    ParseErrorCode::MissingWhitespaceAfterDoctypePublicKeyword,
                );
                self.doctype.public_id = Some(String::new());
                self.switch(State::DoctypePublicIdentifierDoubleQuoted);
            }
            Some('\'') => {
                self.error(
                    log,
                    ParseErrorCode::MissingWhitespaceAfterDoctypePublicKeyword,
                );
                self.doctype.public_id = Some(String::new());
                self.switch(State::DoctypePublicIdentifierSingleQuoted);
            }
            Some('>') => {
                self.error(log, ParseErrorCode::MissingDoctypePublicIdentifier);
                self.doctype.force_quirks = true;
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(_) => {
                self.error(
                    log,
                    ParseErrorCode::MissingQuoteBeforeDoctypePublicIdentifier,
                );
                self.doctype.force_quirks = true;
                self.reconsume(c, State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_before_doctype_public_identifier(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {}
            Some('"') => {
                self.doctype.public_id = Some(String::new());
                self.switch(State::DoctypePublicIdentifierDoubleQuoted);
            }
            Some('\'') => {
                self.doctype.public_id = Some(String::new());
                self.switch(State::DoctypePublicIdentifierSingleQuoted);
            }
            Some('>') => {
                self.error(log, ParseErrorCode::MissingDoctypePublicIdentifier);
                self.doctype.force_quirks = true;
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(_) => {
                self.error(
                    log,
                    ParseErrorCode::MissingQuoteBeforeDoctypePublicIdentifier,
                );
                self.doctype.force_quirks = true;
                self.reconsume(c, State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_doctype_public_identifier_quoted(
        &mut self,
        log: &mut ParseLog,
        quote: char,
    ) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch == quote => self.switch(State::AfterDoctypePublicIdentifier),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.doctype
                    .public_id
                    .get_or_insert_with(String::new)
                    .push('\u{FFFD}');
            }
            Some('>') => {
                self.error(log, ParseErrorCode::AbruptDoctypePublicIdentifier);
                self.doctype.force_quirks = true;
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(ch) => {
                self.doctype
                    .public_id
                    .get_or_insert_with(String::new)
                    .push(ch);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_after_doctype_public_identifier(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {
                self.switch(State::BetweenDoctypePublicAndSystemIdentifiers)
            }
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some('"') => {
                self.error(
                    log,
                    ParseErrorCode::MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
                );
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierDoubleQuoted);
            }
            Some('\'') => {
                self.error(
                    log,
                    ParseErrorCode::MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
                );
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierSingleQuoted);
            }
            Some(_) => {
                self.error(
                    log,
                    ParseErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                );
                self.doctype.force_quirks = true;
                self.reconsume(c, State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_between_doctype_public_and_system_identifiers(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {}
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some('"') => {
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierDoubleQuoted);
            }
            Some('\'') => {
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierSingleQuoted);
            }
            Some(_) => {
                self.error(
                    log,
                    ParseErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                );
                self.doctype.force_quirks = true;
                self.reconsume(c, State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_after_doctype_system_keyword(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {
                self.switch(State::BeforeDoctypeSystemIdentifier)
            }
            Some('"') => {
                self.error(
                    log,
                    ParseErrorCode::MissingWhitespaceAfterDoctypeSystemKeyword,
                );
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierDoubleQuoted);
            }
            Some('\'') => {
                self.error(
                    log,
                    ParseErrorCode::MissingWhitespaceAfterDoctypeSystemKeyword,
                );
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierSingleQuoted);
            }
            Some('>') => {
                self.error(log, ParseErrorCode::MissingDoctypeSystemIdentifier);
                self.doctype.force_quirks = true;
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(_) => {
                self.error(
                    log,
                    ParseErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                );
                self.doctype.force_quirks = true;
                self.reconsume(c, State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_before_doctype_system_identifier(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {}
            Some('"') => {
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierDoubleQuoted);
            }
            Some('\'') => {
                self.doctype.system_id = Some(String::new());
                self.switch(State::DoctypeSystemIdentifierSingleQuoted);
            }
            Some('>') => {
                self.error(log, ParseErrorCode::MissingDoctypeSystemIdentifier);
                self.doctype.force_quirks = true;
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(_) => {
                self.error(
                    log,
                    ParseErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                );
                self.doctype.force_quirks = true;
                self.reconsume(c, State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_doctype_system_identifier_quoted(
        &mut self,
        log: &mut ParseLog,
        quote: char,
    ) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch == quote => self.switch(State::AfterDoctypeSystemIdentifier),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.doctype
                    .system_id
                    .get_or_insert_with(String::new)
                    .push('\u{FFFD}');
            }
            Some('>') => {
                self.error(log, ParseErrorCode::AbruptDoctypeSystemIdentifier);
                self.doctype.force_quirks = true;
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(ch) => {
                self.doctype
                    .system_id
                    .get_or_insert_with(String::new)
                    .push(ch);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_after_doctype_system_identifier(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') => {}
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some(_) => {
                self.error(
                    log,
                    ParseErrorCode::UnexpectedCharacterAfterDoctypeSystemIdentifier,
                );
                // Force-quirks stays untouched here.
                self.reconsume(c, State::BogusDoctype);
            }
            None => self.doctype_eof(log),
        }
        Step::Progress
    }

    pub(super) fn state_bogus_doctype(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('>') => {
                self.switch(State::Data);
                self.emit_current_doctype();
            }
            Some('\0') => self.error(log, ParseErrorCode::UnexpectedNullCharacter),
            Some(_) => {}
            None => {
                self.emit_current_doctype();
                self.emit_eof();
            }
        }
        Step::Progress
    }

    // --- CDATA sections ---------------------------------------------------

    pub(super) fn state_cdata_section(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(']') => self.switch(State::CdataSectionBracket),
            Some(ch) => self.emit_char(ch),
            None => {
                self.error(log, ParseErrorCode::EofInCdata);
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_cdata_section_bracket(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(']') => self.switch(State::CdataSectionEnd),
            _ => {
                self.emit_char(']');
                self.reconsume(c, State::CdataSection);
            }
        }
        Step::Progress
    }

    pub(super) fn state_cdata_section_end(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(']') => self.emit_char(']'),
            Some('>') => self.switch(State::Data),
            _ => {
                self.emit_str("]]");
                self.reconsume(c, State::CdataSection);
            }
        }
        Step::Progress
    }
}
