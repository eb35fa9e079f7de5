//! RCDATA, RAWTEXT and script-data states, including the script-data
//! escape/double-escape machinery.
//!
//! The temporary buffer does the end-tag matching here: transitions out of
//! these states are gated on the *appropriate end tag* check (the last
//! emitted start tag's name), never on the open-elements stack. Double
//! escaping tracks the literal buffer contents equalling `"script"`.

use super::{State, Step, Tokenizer};
use crate::error::{ParseErrorCode, ParseLog};

impl Tokenizer {
    pub(super) fn state_rcdata(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('&') => {
                self.return_state = State::Rcdata;
                self.switch(State::CharacterReference);
            }
            Some('<') => self.switch(State::RcdataLessThanSign),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => self.emit_char(ch),
            None => self.emit_eof(),
        }
        Step::Progress
    }

    pub(super) fn state_rawtext(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('<') => self.switch(State::RawtextLessThanSign),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => self.emit_char(ch),
            None => self.emit_eof(),
        }
        Step::Progress
    }

    pub(super) fn state_script_data(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('<') => self.switch(State::ScriptDataLessThanSign),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => self.emit_char(ch),
            None => self.emit_eof(),
        }
        Step::Progress
    }

    // --- RCDATA/RAWTEXT end-tag matching ----------------------------------

    pub(super) fn state_rcdata_less_than_sign(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('/') => {
                self.temp_buffer.clear();
                self.switch(State::RcdataEndTagOpen);
            }
            _ => {
                self.emit_char('<');
                self.reconsume(c, State::Rcdata);
            }
        }
        Step::Progress
    }

    pub(super) fn state_rcdata_end_tag_open(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.start_tag_token(true);
                self.reconsume(c, State::RcdataEndTagName);
            }
            _ => {
                self.emit_str("</");
                self.reconsume(c, State::Rcdata);
            }
        }
        Step::Progress
    }

    pub(super) fn state_rcdata_end_tag_name(&mut self, log: &mut ParseLog) -> Step {
        self.rawtext_like_end_tag_name(log, State::Rcdata)
    }

    pub(super) fn state_rawtext_less_than_sign(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('/') => {
                self.temp_buffer.clear();
                self.switch(State::RawtextEndTagOpen);
            }
            _ => {
                self.emit_char('<');
                self.reconsume(c, State::Rawtext);
            }
        }
        Step::Progress
    }

    pub(super) fn state_rawtext_end_tag_open(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.start_tag_token(true);
                self.reconsume(c, State::RawtextEndTagName);
            }
            _ => {
                self.emit_str("</");
                self.reconsume(c, State::Rawtext);
            }
        }
        Step::Progress
    }

    pub(super) fn state_rawtext_end_tag_name(&mut self, log: &mut ParseLog) -> Step {
        self.rawtext_like_end_tag_name(log, State::Rawtext)
    }

    /// Shared RCDATA/RAWTEXT/script-data end-tag-name handling. On anything
    /// other than an appropriate end tag the buffered `</name` re-emits as
    /// text and the machine drops back to `fallback`.
    fn rawtext_like_end_tag_name(&mut self, log: &mut ParseLog, fallback: State) -> Step {
        let c = self.consume();
        match c {
            Some('\t' | '\n' | '\x0C' | ' ') if self.is_appropriate_end_tag() => {
                self.switch(State::BeforeAttributeName);
            }
            Some('/') if self.is_appropriate_end_tag() => {
                self.switch(State::SelfClosingStartTag);
            }
            Some('>') if self.is_appropriate_end_tag() => {
                self.switch(State::Data);
                self.emit_current_tag(log);
            }
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.tag_name.push(ch.to_ascii_lowercase());
                self.temp_buffer.push(ch);
            }
            _ => {
                self.emit_str("</");
                let buffered = std::mem::take(&mut self.temp_buffer);
                self.emit_str(&buffered);
                self.reconsume(c, fallback);
            }
        }
        Step::Progress
    }

    // --- script data ------------------------------------------------------

    pub(super) fn state_script_data_less_than_sign(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('/') => {
                self.temp_buffer.clear();
                self.switch(State::ScriptDataEndTagOpen);
            }
            Some('!') => {
                self.switch(State::ScriptDataEscapeStart);
                self.emit_str("<!");
            }
            _ => {
                self.emit_char('<');
                self.reconsume(c, State::ScriptData);
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_end_tag_open(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.start_tag_token(true);
                self.reconsume(c, State::ScriptDataEndTagName);
            }
            _ => {
                self.emit_str("</");
                self.reconsume(c, State::ScriptData);
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_end_tag_name(&mut self, log: &mut ParseLog) -> Step {
        self.rawtext_like_end_tag_name(log, State::ScriptData)
    }

    pub(super) fn state_script_data_escape_start(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => {
                self.switch(State::ScriptDataEscapeStartDash);
                self.emit_char('-');
            }
            _ => self.reconsume(c, State::ScriptData),
        }
        Step::Progress
    }

    pub(super) fn state_script_data_escape_start_dash(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => {
                self.switch(State::ScriptDataEscapedDashDash);
                self.emit_char('-');
            }
            _ => self.reconsume(c, State::ScriptData),
        }
        Step::Progress
    }

    pub(super) fn state_script_data_escaped(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => {
                self.switch(State::ScriptDataEscapedDash);
                self.emit_char('-');
            }
            Some('<') => self.switch(State::ScriptDataEscapedLessThanSign),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => self.emit_char(ch),
            None => {
                self.error(log, ParseErrorCode::EofInScriptHtmlCommentLikeText);
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_escaped_dash(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => {
                self.switch(State::ScriptDataEscapedDashDash);
                self.emit_char('-');
            }
            Some('<') => self.switch(State::ScriptDataEscapedLessThanSign),
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.switch(State::ScriptDataEscaped);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => {
                self.switch(State::ScriptDataEscaped);
                self.emit_char(ch);
            }
            None => {
                self.error(log, ParseErrorCode::EofInScriptHtmlCommentLikeText);
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_escaped_dash_dash(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => self.emit_char('-'),
            Some('<') => self.switch(State::ScriptDataEscapedLessThanSign),
            Some('>') => {
                self.switch(State::ScriptData);
                self.emit_char('>');
            }
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.switch(State::ScriptDataEscaped);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => {
                self.switch(State::ScriptDataEscaped);
                self.emit_char(ch);
            }
            None => {
                self.error(log, ParseErrorCode::EofInScriptHtmlCommentLikeText);
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_escaped_less_than_sign(
        &mut self,
        _log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('/') => {
                self.temp_buffer.clear();
                self.switch(State::ScriptDataEscapedEndTagOpen);
            }
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.temp_buffer.clear();
                self.emit_char('<');
                self.reconsume(c, State::ScriptDataDoubleEscapeStart);
            }
            _ => {
                self.emit_char('<');
                self.reconsume(c, State::ScriptDataEscaped);
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_escaped_end_tag_open(
        &mut self,
        _log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.start_tag_token(true);
                self.reconsume(c, State::ScriptDataEscapedEndTagName);
            }
            _ => {
                self.emit_str("</");
                self.reconsume(c, State::ScriptDataEscaped);
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_escaped_end_tag_name(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        self.rawtext_like_end_tag_name(log, State::ScriptDataEscaped)
    }

    pub(super) fn state_script_data_double_escape_start(
        &mut self,
        _log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some(ch @ ('\t' | '\n' | '\x0C' | ' ' | '/' | '>')) => {
                let next = if self.temp_buffer == "script" {
                    State::ScriptDataDoubleEscaped
                } else {
                    State::ScriptDataEscaped
                };
                self.switch(next);
                self.emit_char(ch);
            }
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.temp_buffer.push(ch.to_ascii_lowercase());
                self.emit_char(ch);
            }
            _ => self.reconsume(c, State::ScriptDataEscaped),
        }
        Step::Progress
    }

    pub(super) fn state_script_data_double_escaped(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => {
                self.switch(State::ScriptDataDoubleEscapedDash);
                self.emit_char('-');
            }
            Some('<') => {
                self.switch(State::ScriptDataDoubleEscapedLessThanSign);
                self.emit_char('<');
            }
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => self.emit_char(ch),
            None => {
                self.error(log, ParseErrorCode::EofInScriptHtmlCommentLikeText);
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_double_escaped_dash(&mut self, log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some('-') => {
                self.switch(State::ScriptDataDoubleEscapedDashDash);
                self.emit_char('-');
            }
            Some('<') => {
                self.switch(State::ScriptDataDoubleEscapedLessThanSign);
                self.emit_char('<');
            }
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.switch(State::ScriptDataDoubleEscaped);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => {
                self.switch(State::ScriptDataDoubleEscaped);
                self.emit_char(ch);
            }
            None => {
                self.error(log, ParseErrorCode::EofInScriptHtmlCommentLikeText);
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_double_escaped_dash_dash(
        &mut self,
        log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('-') => self.emit_char('-'),
            Some('<') => {
                self.switch(State::ScriptDataDoubleEscapedLessThanSign);
                self.emit_char('<');
            }
            Some('>') => {
                self.switch(State::ScriptData);
                self.emit_char('>');
            }
            Some('\0') => {
                self.error(log, ParseErrorCode::UnexpectedNullCharacter);
                self.switch(State::ScriptDataDoubleEscaped);
                self.emit_char('\u{FFFD}');
            }
            Some(ch) => {
                self.switch(State::ScriptDataDoubleEscaped);
                self.emit_char(ch);
            }
            None => {
                self.error(log, ParseErrorCode::EofInScriptHtmlCommentLikeText);
                self.emit_eof();
            }
        }
        Step::Progress
    }

    pub(super) fn state_script_data_double_escaped_less_than_sign(
        &mut self,
        _log: &mut ParseLog,
    ) -> Step {
        let c = self.consume();
        match c {
            Some('/') => {
                self.temp_buffer.clear();
                self.switch(State::ScriptDataDoubleEscapeEnd);
                self.emit_char('/');
            }
            _ => self.reconsume(c, State::ScriptDataDoubleEscaped),
        }
        Step::Progress
    }

    pub(super) fn state_script_data_double_escape_end(&mut self, _log: &mut ParseLog) -> Step {
        let c = self.consume();
        match c {
            Some(ch @ ('\t' | '\n' | '\x0C' | ' ' | '/' | '>')) => {
                let next = if self.temp_buffer == "script" {
                    State::ScriptDataEscaped
                } else {
                    State::ScriptDataDoubleEscaped
                };
                self.switch(next);
                self.emit_char(ch);
            }
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.temp_buffer.push(ch.to_ascii_lowercase());
                self.emit_char(ch);
            }
            _ => self.reconsume(c, State::ScriptDataDoubleEscaped),
        }
        Step::Progress
    }
}
