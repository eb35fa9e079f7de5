//! Character-reference states: named and numeric references.
//!
//! Named references resolve longest-match-wins against the table in
//! `entities.rs`. The attribute-value exception applies: a legacy
//! (semicolon-less) match inside an attribute value followed by `=` or an
//! alphanumeric stays literal. Numeric references run through the WHATWG
//! error/remap table before flushing.

use super::{State, Step, Tokenizer};
use crate::entities;
use crate::error::{ParseErrorCode, ParseLog};

/// Windows-1252 remappings for numeric references in the C1 window.
static C1_REMAP: &[(u32, char)] = &[
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

impl Tokenizer {
    pub(super) fn state_character_reference(&mut self, _log: &mut ParseLog) -> Step {
        self.temp_buffer.clear();
        self.temp_buffer.push('&');
        self.suppress_ambiguous_error = false;
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_alphanumeric() => {
                self.reconsume(c, State::NamedCharacterReference);
            }
            Some('#') => {
                self.temp_buffer.push('#');
                self.switch(State::NumericCharacterReference);
            }
            _ => {
                self.flush_char_ref();
                self.reconsume(c, self.return_state);
            }
        }
        Step::Progress
    }

    /// Batch state: the name is matched by lookahead over the unconsumed
    /// tail, so chunk boundaries wait for enough input instead of guessing.
    pub(super) fn state_named_character_reference(&mut self, log: &mut ParseLog) -> Step {
        let max = entities::max_name_len();
        let mut candidate = String::new();
        let mut i = 0;
        loop {
            match self.input.peek(i) {
                Some(ch) if ch.is_ascii_alphanumeric() => {
                    candidate.push(ch);
                    i += 1;
                    if i >= max {
                        break;
                    }
                }
                Some(';') => {
                    candidate.push(';');
                    break;
                }
                Some(_) => break,
                None => {
                    if !self.input.end_of_stream_marked() {
                        return Step::NeedMoreInput;
                    }
                    break;
                }
            }
        }
        match entities::longest_match(&candidate) {
            Some((name, replacement)) => {
                let semicolon_terminated = name.ends_with(';');
                if self.in_attribute_value() && !semicolon_terminated {
                    // Historical quirk: a legacy match followed by `=` or an
                    // alphanumeric stays literal inside attribute values.
                    match self.input.peek(name.chars().count()) {
                        None if !self.input.end_of_stream_marked() => {
                            return Step::NeedMoreInput;
                        }
                        Some(next) if next == '=' || next.is_ascii_alphanumeric() => {
                            self.input.seek_relative(name.chars().count() as isize);
                            self.temp_buffer.push_str(name);
                            self.flush_char_ref();
                            self.switch(self.return_state);
                            return Step::Progress;
                        }
                        _ => {}
                    }
                }
                self.input.seek_relative(name.chars().count() as isize);
                if !semicolon_terminated {
                    self.error(log, ParseErrorCode::MissingSemicolonAfterCharacterReference);
                }
                self.temp_buffer.clear();
                self.temp_buffer.push_str(replacement);
                self.flush_char_ref();
                self.switch(self.return_state);
            }
            None => {
                // Unknown name: report once here (the ambiguous-ampersand
                // tail consumes the rest of the run without re-reporting).
                if candidate.chars().next().is_some_and(|ch| ch.is_ascii_alphanumeric()) {
                    self.error(log, ParseErrorCode::UnknownNamedCharacterReference);
                    self.suppress_ambiguous_error = true;
                }
                self.flush_char_ref();
                self.switch(State::AmbiguousAmpersand);
            }
        }
        Step::Progress
    }

    pub(super) fn state_ambiguous_ampersand(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_alphanumeric() => {
                if self.in_attribute_value() {
                    self.attr_value.push(ch);
                } else {
                    self.emit_char(ch);
                }
            }
            Some(';') => {
                if !self.suppress_ambiguous_error {
                    self.error(log, ParseErrorCode::UnknownNamedCharacterReference);
                }
                self.reconsume(c, self.return_state);
            }
            _ => self.reconsume(c, self.return_state),
        }
        Step::Progress
    }

    pub(super) fn state_numeric_character_reference(&mut self, _log: &mut ParseLog) -> Step {
        self.char_ref_code = 0;
        let c = self.consume();
        match c {
            Some(ch @ ('x' | 'X')) => {
                self.temp_buffer.push(ch);
                self.switch(State::HexadecimalCharacterReferenceStart);
            }
            _ => self.reconsume(c, State::DecimalCharacterReferenceStart),
        }
        Step::Progress
    }

    pub(super) fn state_hexadecimal_character_reference_start(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_hexdigit() => {
                self.reconsume(c, State::HexadecimalCharacterReference);
            }
            _ => {
                self.error(
                    log,
                    ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference,
                );
                self.flush_char_ref();
                self.reconsume(c, self.return_state);
            }
        }
        Step::Progress
    }

    pub(super) fn state_decimal_character_reference_start(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_digit() => {
                self.reconsume(c, State::DecimalCharacterReference);
            }
            _ => {
                self.error(
                    log,
                    ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference,
                );
                self.flush_char_ref();
                self.reconsume(c, self.return_state);
            }
        }
        Step::Progress
    }

    pub(super) fn state_hexadecimal_character_reference(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_hexdigit() => {
                let digit = ch.to_digit(16).expect("hex digit checked");
                self.char_ref_code = self.char_ref_code.saturating_mul(16).saturating_add(digit);
            }
            Some(';') => self.switch(State::NumericCharacterReferenceEnd),
            _ => {
                self.error(log, ParseErrorCode::MissingSemicolonAfterCharacterReference);
                self.reconsume(c, State::NumericCharacterReferenceEnd);
            }
        }
        Step::Progress
    }

    pub(super) fn state_decimal_character_reference(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_digit() => {
                let digit = ch.to_digit(10).expect("decimal digit checked");
                self.char_ref_code = self.char_ref_code.saturating_mul(10).saturating_add(digit);
            }
            Some(';') => self.switch(State::NumericCharacterReferenceEnd),
            _ => {
                self.error(log, ParseErrorCode::MissingSemicolonAfterCharacterReference);
                self.reconsume(c, State::NumericCharacterReferenceEnd);
            }
        }
        Step::Progress
    }

    /// Consumes nothing: validates/remaps the accumulated code and flushes.
    pub(super) fn state_numeric_character_reference_end(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let mut code = self.char_ref_code;
        if code == 0 {
            self.error(log, ParseErrorCode::NullCharacterReference);
            code = 0xFFFD;
        } else if code > 0x10FFFF {
            self.error(log, ParseErrorCode::CharacterReferenceOutsideUnicodeRange);
            code = 0xFFFD;
        } else if (0xD800..=0xDFFF).contains(&code) {
            self.error(log, ParseErrorCode::SurrogateCharacterReference);
            code = 0xFFFD;
        } else if (0xFDD0..=0xFDEF).contains(&code) || (code & 0xFFFE) == 0xFFFE {
            self.error(log, ParseErrorCode::NoncharacterInInputStream);
        } else if code == 0x0D || (is_control(code) && !is_ascii_whitespace_code(code)) {
            self.error(log, ParseErrorCode::ControlCharacterReference);
            if let Some((_, remapped)) = C1_REMAP.iter().find(|(from, _)| *from == code) {
                code = *remapped as u32;
            }
        }
        let ch = char::from_u32(code).unwrap_or('\u{FFFD}');
        self.temp_buffer.clear();
        self.temp_buffer.push(ch);
        self.flush_char_ref();
        self.switch(self.return_state);
        Step::Progress
    }
}

fn is_control(code: u32) -> bool {
    (0x7F..=0x9F).contains(&code) || code < 0x20
}

fn is_ascii_whitespace_code(code: u32) -> bool {
    matches!(code, 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}
