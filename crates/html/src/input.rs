//! Code-point input stream.
//!
//! Pre-processes decoded text into a positionally addressable sequence of
//! Unicode scalar values: `CR LF` and lone `CR` become `LF`; noncharacters
//! and C0/C1 controls are reported as parse errors but preserved. Byte input
//! decodes incrementally (UTF-8 with a carry buffer) so chunked feeds match
//! a single feed exactly.
//!
//! The stream is cooperative: the tokenizer reconsumes by seeking back
//! exactly one code point.

use crate::error::{ErrorOrigin, ParseErrorCode, ParseLog};

#[derive(Debug, Default)]
pub struct CodePointStream {
    buffer: Vec<char>,
    cursor: usize,
    /// Carry for an incomplete UTF-8 suffix across byte chunks.
    carry: Vec<u8>,
    /// Pending CR at a chunk boundary (swallows a following LF).
    pending_cr: bool,
    end_of_stream: bool,
}

impl CodePointStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot construction from decoded text (marks end of stream).
    pub fn from_str(text: &str, log: &mut ParseLog) -> Self {
        let mut stream = Self::new();
        stream.push_str(text, log);
        stream.finish();
        stream
    }

    /// Append decoded text, applying newline normalization.
    pub fn push_str(&mut self, text: &str, log: &mut ParseLog) {
        debug_assert!(!self.end_of_stream, "push after end of stream");
        for ch in text.chars() {
            self.push_char(ch, log);
        }
    }

    /// Append raw bytes (UTF-8). The carry buffer keeps multi-byte
    /// sequences split across chunk boundaries; invalid sequences decode to
    /// U+FFFD and make progress.
    pub fn push_bytes(&mut self, bytes: &[u8], log: &mut ParseLog) {
        debug_assert!(!self.end_of_stream, "push after end of stream");
        if bytes.is_empty() {
            return;
        }
        let mut decoded = String::new();
        let mut carry = std::mem::take(&mut self.carry);
        push_utf8_chunk(&mut decoded, &mut carry, bytes);
        self.carry = carry;
        self.push_str(&decoded, log);
    }

    fn push_char(&mut self, ch: char, log: &mut ParseLog) {
        if self.pending_cr {
            self.pending_cr = false;
            self.buffer.push('\n');
            if ch == '\n' {
                return;
            }
        }
        if ch == '\r' {
            self.pending_cr = true;
            return;
        }
        if is_noncharacter(ch) {
            log.report(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::NoncharacterInInputStream,
                self.buffer.len(),
            );
        }
        self.buffer.push(ch);
    }

    /// Mark end of stream, flushing a trailing CR or incomplete UTF-8
    /// sequence (lossily) first.
    pub fn finish(&mut self) {
        if self.pending_cr {
            self.pending_cr = false;
            self.buffer.push('\n');
        }
        if !self.carry.is_empty() {
            self.carry.clear();
            self.buffer.push('\u{FFFD}');
        }
        self.end_of_stream = true;
    }

    pub fn end_of_stream_marked(&self) -> bool {
        self.end_of_stream
    }

    /// Current position (code points consumed).
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// `None` at the end of available input; callers distinguish "need more
    /// input" from true EOF via `is_at_end`.
    pub fn next(&mut self) -> Option<char> {
        let ch = self.buffer.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(ch)
    }

    /// Look ahead `n` code points without consuming (`peek(0)` is the next
    /// code point).
    pub fn peek(&self, n: usize) -> Option<char> {
        self.buffer.get(self.cursor + n).copied()
    }

    /// Seek relative to the cursor; supports the tokenizer's one-code-point
    /// reconsume and lookahead rollback.
    pub fn seek_relative(&mut self, delta: isize) {
        let target = self.cursor as isize + delta;
        debug_assert!(target >= 0 && target as usize <= self.buffer.len());
        self.cursor = target.clamp(0, self.buffer.len() as isize) as usize;
    }

    /// True end of input: every buffered code point consumed and the stream
    /// was marked finished.
    pub fn is_at_end(&self) -> bool {
        self.end_of_stream && self.cursor >= self.buffer.len()
    }

    /// Case-insensitive match of `keyword` at the cursor; consumes on match.
    pub fn eat_ignore_ascii_case(&mut self, keyword: &str) -> bool {
        let mut i = 0;
        for expected in keyword.chars() {
            match self.peek(i) {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => i += 1,
                _ => return false,
            }
        }
        self.cursor += i;
        true
    }

    /// Exact match of `keyword` at the cursor; consumes on match.
    pub fn eat(&mut self, keyword: &str) -> bool {
        let mut i = 0;
        for expected in keyword.chars() {
            if self.peek(i) != Some(expected) {
                return false;
            }
            i += 1;
        }
        self.cursor += i;
        true
    }
}

/// Unicode noncharacters (preserved in the stream, reported as errors).
fn is_noncharacter(ch: char) -> bool {
    let cp = ch as u32;
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}

/// Append a byte chunk to `text`, using `carry` to handle UTF-8 sequences
/// split across chunk boundaries. `carry` only ever holds an incomplete
/// suffix (at most 3 bytes).
fn push_utf8_chunk(text: &mut String, carry: &mut Vec<u8>, bytes: &[u8]) {
    let mut remaining = bytes;
    while !carry.is_empty() && !remaining.is_empty() {
        let expected_len = utf8_seq_len(carry[0]);
        if expected_len == 0 {
            text.push('\u{FFFD}');
            carry.remove(0);
            continue;
        }
        let needed = expected_len.saturating_sub(carry.len());
        if remaining.len() < needed {
            carry.extend_from_slice(remaining);
            return;
        }
        let mut scratch = [0u8; 8];
        let carry_len = carry.len();
        scratch[..carry_len].copy_from_slice(carry);
        scratch[carry_len..carry_len + needed].copy_from_slice(&remaining[..needed]);
        carry.clear();
        decode_bytes(text, carry, &scratch[..carry_len + needed]);
        remaining = &remaining[needed..];
        // decode_bytes may have re-carried a suffix of the scratch bytes;
        // that can only happen when `remaining` is now empty.
    }
    if !remaining.is_empty() {
        decode_bytes(text, carry, remaining);
    }
}

fn utf8_seq_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_bytes(text: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                text.push_str(s);
                break;
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                if valid_up_to > 0 {
                    text.push_str(
                        std::str::from_utf8(&bytes[..valid_up_to]).expect("valid UTF-8 prefix"),
                    );
                }
                match e.error_len() {
                    Some(len) => {
                        text.push('\u{FFFD}');
                        bytes = &bytes[valid_up_to + len..];
                    }
                    None => {
                        carry.extend_from_slice(&bytes[valid_up_to..]);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(text: &str) -> (CodePointStream, ParseLog) {
        let mut log = ParseLog::default();
        let s = CodePointStream::from_str(text, &mut log);
        (s, log)
    }

    #[test]
    fn normalizes_line_endings() {
        let (mut s, _) = stream("a\r\nb\rc\nd");
        let collected: String = std::iter::from_fn(|| s.next()).collect();
        assert_eq!(collected, "a\nb\nc\nd");
    }

    #[test]
    fn cr_at_chunk_boundary_still_collapses() {
        let mut log = ParseLog::default();
        let mut s = CodePointStream::new();
        s.push_str("a\r", &mut log);
        s.push_str("\nb", &mut log);
        s.finish();
        let collected: String = std::iter::from_fn(|| s.next()).collect();
        assert_eq!(collected, "a\nb");
    }

    #[test]
    fn byte_chunks_split_mid_sequence_decode_like_one_feed() {
        let mut log = ParseLog::default();
        let mut s = CodePointStream::new();
        let bytes = "π×€".as_bytes();
        for chunk in bytes.chunks(1) {
            s.push_bytes(chunk, &mut log);
        }
        s.finish();
        let collected: String = std::iter::from_fn(|| s.next()).collect();
        assert_eq!(collected, "π×€");
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let mut log = ParseLog::default();
        let mut s = CodePointStream::new();
        s.push_bytes(&[b'a', 0xFF, b'b'], &mut log);
        s.finish();
        let collected: String = std::iter::from_fn(|| s.next()).collect();
        assert_eq!(collected, "a\u{FFFD}b");
    }

    #[test]
    fn trailing_incomplete_sequence_is_flushed_on_finish() {
        let mut log = ParseLog::default();
        let mut s = CodePointStream::new();
        s.push_bytes(&[0xE2, 0x82], &mut log);
        s.finish();
        let collected: String = std::iter::from_fn(|| s.next()).collect();
        assert_eq!(collected, "\u{FFFD}");
    }

    #[test]
    fn noncharacters_are_reported_but_preserved() {
        let (mut s, log) = stream("a\u{FDD0}b");
        assert_eq!(log.counters.parse_errors, 1);
        let collected: String = std::iter::from_fn(|| s.next()).collect();
        assert_eq!(collected, "a\u{FDD0}b");
    }

    #[test]
    fn seek_relative_supports_reconsume() {
        let (mut s, _) = stream("ab");
        assert_eq!(s.next(), Some('a'));
        s.seek_relative(-1);
        assert_eq!(s.next(), Some('a'));
        assert_eq!(s.next(), Some('b'));
        assert!(s.is_at_end());
    }
}
