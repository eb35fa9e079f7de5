use super::{State, Tokenizer};
use crate::error::{ParseErrorCode, ParseLog};
use crate::input::CodePointStream;
use crate::token::Token;

fn tokenizer_for(input: &str) -> (Tokenizer, ParseLog) {
    let mut log = ParseLog::default();
    let stream = CodePointStream::from_str(input, &mut log);
    (Tokenizer::new(stream), log)
}

fn drain(tokenizer: &mut Tokenizer, log: &mut ParseLog) -> Vec<Token> {
    let mut out = Vec::new();
    while let Some(token) = tokenizer.next_token(log) {
        let is_eof = token == Token::EndOfStream;
        out.push(token);
        if is_eof {
            break;
        }
    }
    out
}

fn tokenize(input: &str) -> (Vec<Token>, ParseLog) {
    let (mut tokenizer, mut log) = tokenizer_for(input);
    let tokens = drain(&mut tokenizer, &mut log);
    (tokens, log)
}

fn text_of(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Character(ch) => Some(*ch),
            _ => None,
        })
        .collect()
}

fn has_error(log: &ParseLog, code: ParseErrorCode) -> bool {
    log.errors.iter().any(|e| e.code == code)
}

#[test]
fn start_tag_names_and_attributes_fold_to_lowercase() {
    let (tokens, _) = tokenize("<DIV CLASS=\"a\" Id=b disabled>");
    let Token::StartTag(tag) = &tokens[0] else {
        panic!("expected a start tag, got {:?}", tokens[0]);
    };
    assert_eq!(tag.name, "div");
    assert_eq!(tag.attr("class"), Some("a"));
    assert_eq!(tag.attr("id"), Some("b"));
    assert_eq!(tag.attr("disabled"), Some(""));
    assert!(!tag.self_closing);
}

#[test]
fn duplicate_attributes_drop_the_later_one() {
    let (tokens, log) = tokenize("<a href='x' href='y'>");
    let Token::StartTag(tag) = &tokens[0] else {
        panic!("expected a start tag");
    };
    assert_eq!(tag.attrs.len(), 1);
    assert_eq!(tag.attr("href"), Some("x"));
    assert!(has_error(&log, ParseErrorCode::DuplicateAttribute));
}

#[test]
fn end_tag_with_attributes_is_an_error_but_representable() {
    let (tokens, log) = tokenize("</div class='x'>");
    let Token::EndTag(tag) = &tokens[0] else {
        panic!("expected an end tag");
    };
    assert_eq!(tag.name, "div");
    assert_eq!(tag.attr("class"), Some("x"));
    assert!(has_error(&log, ParseErrorCode::EndTagWithAttributes));
}

#[test]
fn entity_scenarios_from_data_state() {
    let (tokens, log) = tokenize("&amp;&#65;&notafragment");
    assert_eq!(text_of(&tokens), "&A&notafragment");
    assert!(has_error(&log, ParseErrorCode::UnknownNamedCharacterReference));
}

#[test]
fn legacy_entity_resolves_in_data_with_missing_semicolon_error() {
    let (tokens, log) = tokenize("&copyx");
    assert_eq!(text_of(&tokens), "\u{A9}x");
    assert!(has_error(
        &log,
        ParseErrorCode::MissingSemicolonAfterCharacterReference
    ));
}

#[test]
fn legacy_entity_in_attribute_followed_by_alnum_stays_literal() {
    let (tokens, _) = tokenize("<a href=\"?a=b&copy=1&copyz\">");
    let Token::StartTag(tag) = &tokens[0] else {
        panic!("expected a start tag");
    };
    // Both `&copy=` and `&copyz` hit the historical exception.
    assert_eq!(tag.attr("href"), Some("?a=b&copy=1&copyz"));
}

#[test]
fn legacy_entity_in_attribute_at_value_end_resolves() {
    let (tokens, log) = tokenize("<a href=\"&copy\">");
    let Token::StartTag(tag) = &tokens[0] else {
        panic!("expected a start tag");
    };
    assert_eq!(tag.attr("href"), Some("\u{A9}"));
    assert!(has_error(
        &log,
        ParseErrorCode::MissingSemicolonAfterCharacterReference
    ));
}

#[test]
fn numeric_references_validate_and_remap() {
    let (tokens, _) = tokenize("&#x41;&#66;");
    assert_eq!(text_of(&tokens), "AB");

    let (tokens, log) = tokenize("&#x80;");
    assert_eq!(text_of(&tokens), "\u{20AC}");
    assert!(has_error(&log, ParseErrorCode::ControlCharacterReference));

    let (tokens, log) = tokenize("&#0;");
    assert_eq!(text_of(&tokens), "\u{FFFD}");
    assert!(has_error(&log, ParseErrorCode::NullCharacterReference));

    let (tokens, log) = tokenize("&#xD800;");
    assert_eq!(text_of(&tokens), "\u{FFFD}");
    assert!(has_error(&log, ParseErrorCode::SurrogateCharacterReference));

    let (tokens, log) = tokenize("&#x110000;");
    assert_eq!(text_of(&tokens), "\u{FFFD}");
    assert!(has_error(
        &log,
        ParseErrorCode::CharacterReferenceOutsideUnicodeRange
    ));
}

#[test]
fn doctype_fields_distinguish_missing_from_empty() {
    let (tokens, _) = tokenize("<!DOCTYPE html PUBLIC \"pub\" \"sys\">");
    let Token::Doctype(dt) = &tokens[0] else {
        panic!("expected a doctype");
    };
    assert_eq!(dt.name.as_deref(), Some("html"));
    assert_eq!(dt.public_id.as_deref(), Some("pub"));
    assert_eq!(dt.system_id.as_deref(), Some("sys"));
    assert!(!dt.force_quirks);

    let (tokens, log) = tokenize("<!DOCTYPE>");
    let Token::Doctype(dt) = &tokens[0] else {
        panic!("expected a doctype");
    };
    assert_eq!(dt.name, None);
    assert!(dt.force_quirks);
    assert!(has_error(&log, ParseErrorCode::MissingDoctypeName));
}

#[test]
fn comment_edge_cases() {
    let (tokens, log) = tokenize("<!-->");
    assert_eq!(tokens[0], Token::Comment(String::new()));
    assert!(has_error(&log, ParseErrorCode::AbruptClosingOfEmptyComment));

    let (tokens, log) = tokenize("<!--a--!>");
    assert_eq!(tokens[0], Token::Comment("a".to_string()));
    assert!(has_error(&log, ParseErrorCode::IncorrectlyClosedComment));

    let (tokens, log) = tokenize("<!--x<!--y-->");
    assert_eq!(tokens[0], Token::Comment("x<!--y".to_string()));
    assert!(has_error(&log, ParseErrorCode::NestedComment));

    let (tokens, _) = tokenize("<!--a-b--c-->");
    assert_eq!(tokens[0], Token::Comment("a-b--c".to_string()));
}

#[test]
fn rcdata_exits_only_on_the_appropriate_end_tag() {
    let mut log = ParseLog::default();
    let stream = CodePointStream::from_str("x</span>y</title>", &mut log);
    let mut tokenizer = Tokenizer::new(stream);
    tokenizer.set_state(State::Rcdata);
    tokenizer.set_last_start_tag("title");
    let tokens = drain(&mut tokenizer, &mut log);
    assert_eq!(text_of(&tokens), "x</span>y");
    assert!(tokens
        .iter()
        .any(|t| matches!(t, Token::EndTag(tag) if tag.name == "title")));
}

#[test]
fn script_data_double_escape_hides_the_inner_close_tag() {
    let mut log = ParseLog::default();
    let stream =
        CodePointStream::from_str("<!--<script>a</script>-->x</script>", &mut log);
    let mut tokenizer = Tokenizer::new(stream);
    tokenizer.set_state(State::ScriptData);
    tokenizer.set_last_start_tag("script");
    let tokens = drain(&mut tokenizer, &mut log);
    // The inner `</script>` is swallowed by double escaping; only the final
    // one emits an end tag.
    assert_eq!(text_of(&tokens), "<!--<script>a</script>-->x");
    let end_tags = tokens
        .iter()
        .filter(|t| matches!(t, Token::EndTag(_)))
        .count();
    assert_eq!(end_tags, 1);
}

#[test]
fn plaintext_never_ends() {
    let mut log = ParseLog::default();
    let stream = CodePointStream::from_str("</plaintext><a>", &mut log);
    let mut tokenizer = Tokenizer::new(stream);
    tokenizer.set_state(State::Plaintext);
    let tokens = drain(&mut tokenizer, &mut log);
    assert_eq!(text_of(&tokens), "</plaintext><a>");
}

#[test]
fn cdata_needs_foreign_content_permission() {
    let (tokens, log) = tokenize("<![CDATA[x]]>");
    assert_eq!(tokens[0], Token::Comment("[CDATA[x]]".to_string()));
    assert!(has_error(&log, ParseErrorCode::CdataInHtmlContent));

    let mut log = ParseLog::default();
    let stream = CodePointStream::from_str("<![CDATA[a]]b]]>", &mut log);
    let mut tokenizer = Tokenizer::new(stream);
    tokenizer.set_allow_cdata(true);
    let tokens = drain(&mut tokenizer, &mut log);
    assert_eq!(text_of(&tokens), "a]]b");
}

#[test]
fn chunked_feeds_match_a_single_feed() {
    fn run(chunks: &[&str]) -> Vec<Token> {
        let mut log = ParseLog::default();
        let mut stream = CodePointStream::new();
        stream.push_str(chunks[0], &mut log);
        let mut tokenizer = Tokenizer::new(stream);
        let mut out = drain(&mut tokenizer, &mut log);
        for chunk in &chunks[1..] {
            tokenizer.input.push_str(chunk, &mut log);
            out.extend(drain(&mut tokenizer, &mut log));
        }
        tokenizer.input.finish();
        out.extend(drain(&mut tokenizer, &mut log));
        out
    }

    let whole = run(&["<div class='x'>a&amp;b<!--c--></div>"]);
    for split in [3usize, 7, 12, 20, 26] {
        let input = "<div class='x'>a&amp;b<!--c--></div>";
        let (a, b) = input.split_at(split);
        let chunked = run(&[a, b]);
        assert_eq!(whole, chunked, "split at {split} must not change tokens");
    }
}

#[test]
fn eof_inside_a_tag_reports_and_stops() {
    let (tokens, log) = tokenize("<div class=");
    assert_eq!(tokens, vec![Token::EndOfStream]);
    assert!(has_error(&log, ParseErrorCode::EofInTag));
}
