use dom::snapshot::snapshot;

use crate::{parse_document, parse_fragment, ParserOptions};

fn parse(html: &str) -> String {
    let doc = parse_document(html, &ParserOptions::default());
    snapshot(&doc)
}

fn body_of(html: &str) -> String {
    let doc = parse_document(html, &ParserOptions::default());
    snapshot(&doc.body().expect("document has a body"))
}

#[test]
fn minimal_document_gets_the_implied_skeleton() {
    assert_eq!(parse(""), "document( html( head, body ) )");
    assert_eq!(parse("hi"), "document( html( head, body( \"hi\" ) ) )");
}

#[test]
fn doctype_and_explicit_skeleton() {
    assert_eq!(
        parse("<!DOCTYPE html><html><head></head><body>x</body></html>"),
        "document( doctype(html), html( head, body( \"x\" ) ) )"
    );
}

#[test]
fn head_contents_stay_in_head() {
    assert_eq!(
        parse("<title>t</title><p>x"),
        "document( html( head( title( \"t\" ) ), body( p( \"x\" ) ) ) )"
    );
}

#[test]
fn implicit_tbody_is_inserted() {
    assert_eq!(
        body_of("<table><tr><td>x<td>y</table>"),
        "body( table( tbody( tr( td( \"x\" ), td( \"y\" ) ) ) ) )"
    );
}

#[test]
fn paragraph_closes_before_table() {
    assert_eq!(
        body_of("<!DOCTYPE html><p>x<table>"),
        "body( p( \"x\" ), table )"
    );
    // Quirks mode keeps the table inside the paragraph.
    assert_eq!(body_of("<p>x<table>"), "body( p( \"x\", table ) )");
}

#[test]
fn options_close_each_other() {
    assert_eq!(
        body_of("<select><option>a<option>b</select>"),
        "body( select( option( \"a\" ), option( \"b\" ) ) )"
    );
}

#[test]
fn misnested_formatting_recovers_via_adoption_agency() {
    assert_eq!(
        parse("<!DOCTYPE html><html><head><title>x</title></head><body><p>a<b>b<i>c</p></b>d"),
        "document( doctype(html), html( head( title( \"x\" ) ), \
         body( p( \"a\", b( \"b\", i( \"c\" ) ) ), i( \"d\" ) ) ) )"
    );
}

#[test]
fn adoption_agency_reparents_across_a_block() {
    // The classic <b><p> case: the block is the furthest block and gets a
    // cloned <b> wrapping its contents.
    assert_eq!(
        body_of("<b>1<p>2</b>3"),
        "body( b( \"1\" ), p( b( \"2\" ), \"3\" ) )"
    );
}

#[test]
fn stray_p_end_tag_inserts_an_empty_paragraph() {
    assert_eq!(body_of("x</p>"), "body( \"x\", p )");
}

#[test]
fn foster_parenting_moves_stray_table_text_out() {
    assert_eq!(
        body_of("<table>x<tr><td>y</table>"),
        "body( \"x\", table( tbody( tr( td( \"y\" ) ) ) ) )"
    );
}

#[test]
fn list_items_imply_their_end_tags() {
    assert_eq!(
        body_of("<ul><li>a<li>b</ul>"),
        "body( ul( li( \"a\" ), li( \"b\" ) ) )"
    );
    assert_eq!(
        body_of("<dl><dt>t<dd>d</dl>"),
        "body( dl( dt( \"t\" ), dd( \"d\" ) ) )"
    );
}

#[test]
fn headings_do_not_nest() {
    assert_eq!(
        body_of("<h1>a<h2>b"),
        "body( h1( \"a\" ), h2( \"b\" ) )"
    );
}

#[test]
fn formatting_elements_reconstruct_after_an_implied_close() {
    assert_eq!(
        body_of("<p>1<b>2<p>3"),
        "body( p( \"1\", b( \"2\" ) ), p( b( \"3\" ) ) )"
    );
}

#[test]
fn noahs_ark_limits_reconstructed_clones() {
    let out = body_of("<b><b><b><b>x");
    assert_eq!(out, "body( b( b( b( b( \"x\" ) ) ) ) )");
    // Four identical entries collapse to three on reconstruction.
    let out = body_of("<p><b><b><b><b></p>x");
    assert_eq!(out, "body( p( b( b( b( b ) ) ) ), b( b( b( \"x\" ) ) ) )");
}

#[test]
fn raw_text_elements_swallow_markup() {
    assert_eq!(
        parse("<style>a<b{}</style>"),
        "document( html( head( style( \"a<b{}\" ) ), body ) )"
    );
    assert_eq!(
        parse("<body><script>if (a<b) x();</script>"),
        "document( html( head, body( script( \"if (a<b) x();\" ) ) ) )"
    );
}

#[test]
fn textarea_swallows_leading_newline() {
    assert_eq!(
        body_of("<textarea>\nx</textarea>"),
        "body( textarea( \"x\" ) )"
    );
    assert_eq!(body_of("<pre>\nx</pre>"), "body( pre( \"x\" ) )");
}

#[test]
fn comments_land_where_they_appear() {
    assert_eq!(
        parse("<!--a--><html><body><!--b-->"),
        "document( #comment(\"a\"), html( head, body( #comment(\"b\") ) ) )"
    );
}

#[test]
fn svg_subtree_keeps_its_namespace_and_case() {
    assert_eq!(
        body_of("<svg><foreignobject><p>x</p></foreignobject></svg>"),
        "body( svg svg( svg foreignObject( p( \"x\" ) ) ) )"
    );
}

#[test]
fn math_annotation_xml_is_an_html_island() {
    assert_eq!(
        body_of("<math><mi><b>x</b></mi></math>"),
        "body( math math( math mi( b( \"x\" ) ) ) )"
    );
}

#[test]
fn breakout_tags_leave_foreign_content() {
    assert_eq!(body_of("<svg><p>x"), "body( svg svg, p( \"x\" ) )");
    assert_eq!(
        body_of("<svg><circle r=1></svg>y"),
        "body( svg svg( svg circle[r=1] ), \"y\" )"
    );
}

#[test]
fn template_contents_are_parsed_into_the_inert_fragment() {
    let doc = parse_document(
        "<template><tr><td>x</td></tr></template>",
        &ParserOptions::default(),
    );
    let template = doc
        .get_elements_by_tag_name("template")
        .item(0)
        .expect("template parsed");
    assert_eq!(template.child_count(), 0);
    let contents = template
        .as_element()
        .expect("element")
        .template_contents()
        .expect("template has contents");
    assert_eq!(snapshot(&contents), "fragment( tr( td( \"x\" ) ) )");
    let inert = contents.owner_document().expect("owner");
    assert!(inert.as_document().expect("document").is_inert_template());
}

#[test]
fn frameset_replaces_an_empty_body() {
    assert_eq!(
        parse("<frameset><frame></frameset>"),
        "document( html( head, frameset( frame ) ) )"
    );
}

#[test]
fn plaintext_consumes_the_rest_of_the_input() {
    assert_eq!(
        body_of("<plaintext></plaintext><b>"),
        "body( plaintext( \"</plaintext><b>\" ) )"
    );
}

#[test]
fn quirks_mode_is_set_from_the_doctype() {
    use dom::CompatMode;
    let doc = parse_document("<!DOCTYPE html><p>x", &ParserOptions::default());
    assert_eq!(doc.as_document().expect("doc").mode(), CompatMode::NoQuirks);
    let doc = parse_document("<p>x", &ParserOptions::default());
    assert_eq!(doc.as_document().expect("doc").mode(), CompatMode::Quirks);
    let doc = parse_document(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 3.2//EN\"><p>x",
        &ParserOptions::default(),
    );
    assert_eq!(doc.as_document().expect("doc").mode(), CompatMode::Quirks);
}

#[test]
fn fragment_parsing_honors_the_context_element() {
    let doc = dom::Document::new_html();
    let tr_context = doc.create_element("tr").expect("valid name");
    let fragment =
        parse_fragment("<td>a<td>b", &tr_context, &ParserOptions::default()).expect("fragment");
    assert_eq!(
        snapshot(&fragment),
        "fragment( td( \"a\" ), td( \"b\" ) )"
    );

    let div_context = doc.create_element("div").expect("valid name");
    let fragment =
        parse_fragment("<p>x<p>y", &div_context, &ParserOptions::default()).expect("fragment");
    assert_eq!(snapshot(&fragment), "fragment( p( \"x\" ), p( \"y\" ) )");

    // RCDATA context: markup stays text.
    let title_context = doc.create_element("title").expect("valid name");
    let fragment =
        parse_fragment("<b>x</b>", &title_context, &ParserOptions::default()).expect("fragment");
    assert_eq!(snapshot(&fragment), "fragment( \"<b>x</b>\" )");
}

#[test]
fn fragment_nodes_are_owned_by_the_context_document() {
    let doc = dom::Document::new_html();
    let context = doc.create_element("div").expect("valid name");
    let fragment = parse_fragment("<span>x</span>", &context, &ParserOptions::default())
        .expect("fragment");
    let span = fragment.first_child().expect("span child");
    assert!(std::rc::Rc::ptr_eq(
        &span.owner_document().expect("owner"),
        &doc
    ));
}
