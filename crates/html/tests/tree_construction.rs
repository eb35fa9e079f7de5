//! End-to-end acceptance scenarios: input markup against expected tree
//! shapes, plus serializer round-trips and the streaming session contract.

use dom::serialize::{serialize_html, SerializeOptions};
use dom::snapshot::snapshot;
use dom::Document;
use html::{parse_document, ParseSession, ParserOptions};

fn parse(input: &str) -> String {
    snapshot(&parse_document(input, &ParserOptions::default()))
}

#[test]
fn adoption_agency_scenario() {
    assert_eq!(
        parse("<!DOCTYPE html><html><head><title>x</title></head><body><p>a<b>b<i>c</p></b>d"),
        "document( doctype(html), html( head( title( \"x\" ) ), \
         body( p( \"a\", b( \"b\", i( \"c\" ) ) ), i( \"d\" ) ) ) )"
    );
}

#[test]
fn implicit_tbody_scenario() {
    assert_eq!(
        parse("<!DOCTYPE html><table><tr><td>x<td>y</table>"),
        "document( doctype(html), html( head, \
         body( table( tbody( tr( td( \"x\" ), td( \"y\" ) ) ) ) ) ) )"
    );
}

#[test]
fn paragraph_closed_before_table_scenario() {
    assert_eq!(
        parse("<!DOCTYPE html><p>x<table>"),
        "document( doctype(html), html( head, body( p( \"x\" ), table ) ) )"
    );
}

#[test]
fn select_options_scenario() {
    assert_eq!(
        parse("<!DOCTYPE html><select><option>a<option>b</select>"),
        "document( doctype(html), html( head, \
         body( select( option( \"a\" ), option( \"b\" ) ) ) ) )"
    );
}

#[test]
fn entity_scenario_in_body_text() {
    let doc = parse_document(
        "<!DOCTYPE html><body>&amp;&#65;&notafragment",
        &ParserOptions::default(),
    );
    let body = doc.body().expect("body");
    assert_eq!(body.text_content().as_deref(), Some("&A&notafragment"));
}

#[test]
fn programmatic_build_then_serialize() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    body.append_child(&doc.create_element("a").expect("valid name"))
        .expect("append");
    let serialized = serialize_html(&doc, SerializeOptions::default());
    assert!(
        serialized.contains("<body><a></a></body>"),
        "unexpected serialization: {serialized}"
    );
    assert!(serialized.starts_with("<!DOCTYPE html>"));
}

#[test]
fn serialize_then_reparse_is_tree_equivalent() {
    let inputs = [
        "<!DOCTYPE html><p class=\"a\">x<b>y</b></p>",
        "<!DOCTYPE html><table><tr><td>1<td>2</table>",
        "<!DOCTYPE html><pre>\nkeep</pre>",
        "<!DOCTYPE html><ul><li>a<li>b</ul><!--done-->",
        "<!DOCTYPE html><p>a&nbsp;b &amp; c</p>",
    ];
    for input in inputs {
        let first = parse_document(input, &ParserOptions::default());
        let serialized = serialize_html(&first, SerializeOptions::default());
        let second = parse_document(&serialized, &ParserOptions::default());
        assert_eq!(
            snapshot(&first),
            snapshot(&second),
            "round-trip changed the tree for {input}"
        );
    }
}

#[test]
fn parsing_is_deterministic() {
    let input = "<!DOCTYPE html><div id=a><p>x<table><tr><td>y</table><svg><circle/></svg>";
    let a = snapshot(&parse_document(input, &ParserOptions::default()));
    let b = snapshot(&parse_document(input, &ParserOptions::default()));
    assert_eq!(a, b);
}

#[test]
fn every_node_shares_the_owner_document() {
    let doc = parse_document(
        "<!DOCTYPE html><div><p>a</p><!--c--><table><tr><td>x</td></tr></table></div>",
        &ParserOptions::default(),
    );
    for node in dom::node::descendants(&doc) {
        assert!(std::rc::Rc::ptr_eq(
            &node.owner_document().expect("owner"),
            &doc
        ));
    }
}

#[test]
fn streaming_session_matches_single_shot() {
    let input = "<!DOCTYPE html><p class='a'>x&amp;y<table><tr><td>z</table>";
    let whole = snapshot(&parse_document(input, &ParserOptions::default()));
    for chunk_size in [1usize, 2, 3, 7, 13] {
        let mut session = ParseSession::new(&ParserOptions::default());
        let bytes = input.as_bytes();
        for chunk in bytes.chunks(chunk_size) {
            session.push_bytes(chunk);
            session.pump();
        }
        let output = session.finish();
        assert_eq!(
            snapshot(&output.document),
            whole,
            "chunk size {chunk_size} changed the tree"
        );
    }
}

#[test]
fn paused_session_holds_back_tokens() {
    let mut session = ParseSession::new(&ParserOptions::default());
    session.push_str("<!DOCTYPE html><p>x</p>");
    session.set_paused(true);
    assert!(!session.pump(), "a paused session must not finish");
    assert!(session.document().document_element().is_none());
    session.set_paused(false);
    session.pump();
    assert!(session.document().document_element().is_some());
    let output = session.finish();
    assert_eq!(
        snapshot(&output.document),
        "document( doctype(html), html( head, body( p( \"x\" ) ) ) )"
    );
}

#[test]
fn parse_errors_are_collected_not_fatal() {
    let mut session = ParseSession::new(&ParserOptions::default());
    session.push_str("<p>a</wrong></p><b href=1 href=2>");
    let output = session.finish();
    assert!(!output.errors.is_empty());
    assert!(output.counters.parse_errors as usize >= output.errors.len());
    assert!(output.document.body().is_some());
}

#[test]
fn error_storage_is_bounded_by_policy() {
    let mut options = ParserOptions::default();
    options.errors.max_stored = 4;
    let noisy = "</x>".repeat(50);
    let mut session = ParseSession::new(&options);
    session.push_str("<!DOCTYPE html><body>");
    session.push_str(&noisy);
    let output = session.finish();
    assert_eq!(output.errors.len(), 4);
    assert!(output.counters.parse_errors >= 50);
}

#[test]
fn document_url_is_recorded() {
    let options = ParserOptions {
        url: Some("http://example.com/".to_string()),
        ..ParserOptions::default()
    };
    let doc = parse_document("<!DOCTYPE html>", &options);
    assert_eq!(doc.url(), "http://example.com/");
}
