//! Mutation-algorithm contracts: validation ordering, adoption, cloning,
//! normalize, live collections, iterators and ranges.

use std::rc::Rc;

use dom::node::{descendants, position, NodeRef};
use dom::traversal::{FilterResult, SHOW_ELEMENT, SHOW_TEXT};
use dom::{Document, DomError};

fn build_paragraph(doc: &NodeRef) -> NodeRef {
    let p = doc.create_element("p").expect("valid name");
    p.append_child(&doc.create_text_node("hello"))
        .expect("fresh node");
    p
}

#[test]
fn append_child_reparents_and_keeps_links_consistent() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let a = doc.create_element("div").expect("valid");
    let b = doc.create_element("div").expect("valid");
    body.append_child(&a).expect("append");
    body.append_child(&b).expect("append");

    let child = build_paragraph(&doc);
    a.append_child(&child).expect("append");
    assert!(Rc::ptr_eq(&child.parent().expect("parent"), &a));

    // Re-inserting under b detaches from a first.
    b.append_child(&child).expect("move");
    assert_eq!(a.child_count(), 0);
    assert!(Rc::ptr_eq(&child.parent().expect("parent"), &b));
    assert_eq!(child.index_in_parent(), Some(0));
}

#[test]
fn pre_insert_validation_runs_before_any_mutation() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let outer = doc.create_element("div").expect("valid");
    let inner = doc.create_element("div").expect("valid");
    body.append_child(&outer).expect("append");
    outer.append_child(&inner).expect("append");

    // Inserting an ancestor under its descendant must fail untouched.
    assert_eq!(
        inner.append_child(&outer).err(),
        Some(DomError::HierarchyRequest)
    );
    assert!(Rc::ptr_eq(&inner.parent().expect("parent"), &outer));

    // Reference child not under the target parent.
    let stray = doc.create_element("span").expect("valid");
    assert_eq!(
        body.insert_before(&stray, Some(&inner)).err(),
        Some(DomError::NotFound)
    );
    assert!(stray.parent().is_none());

    // Text directly under a document.
    let text = doc.create_text_node("x");
    assert_eq!(doc.append_child(&text).err(), Some(DomError::HierarchyRequest));

    // Second element child of a document.
    let extra_root = doc.create_element("html").expect("valid");
    assert_eq!(
        doc.append_child(&extra_root).err(),
        Some(DomError::HierarchyRequest)
    );
}

#[test]
fn fragment_insertion_moves_children_as_a_group() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let marker = doc.create_element("hr").expect("valid");
    body.append_child(&marker).expect("append");

    let fragment = doc.create_document_fragment();
    let x = doc.create_element("i").expect("valid");
    let y = doc.create_element("u").expect("valid");
    fragment.append_child(&x).expect("append");
    fragment.append_child(&y).expect("append");

    body.insert_before(&fragment, Some(&marker)).expect("insert");
    assert_eq!(fragment.child_count(), 0);
    let children = body.child_nodes();
    assert!(Rc::ptr_eq(&children[0], &x));
    assert!(Rc::ptr_eq(&children[1], &y));
    assert!(Rc::ptr_eq(&children[2], &marker));
}

#[test]
fn replace_child_returns_the_old_child() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let old = doc.create_element("p").expect("valid");
    let new = doc.create_element("div").expect("valid");
    body.append_child(&old).expect("append");
    let returned = body.replace_child(&new, &old).expect("replace");
    assert!(Rc::ptr_eq(&returned, &old));
    assert!(old.parent().is_none());
    assert!(Rc::ptr_eq(&new.parent().expect("parent"), &body));
}

#[test]
fn adoption_rehomes_every_descendant() {
    let doc_a = Document::new_html();
    let doc_b = Document::new_html();
    let subtree = doc_a.create_element("div").expect("valid");
    subtree
        .append_child(&build_paragraph(&doc_a))
        .expect("append");
    doc_a.body().expect("body").append_child(&subtree).expect("append");

    doc_b.adopt_node(&subtree).expect("adopt");
    assert!(subtree.parent().is_none());
    for node in std::iter::once(subtree.clone()).chain(descendants(&subtree)) {
        assert!(Rc::ptr_eq(
            &node.owner_document().expect("owner"),
            &doc_b
        ));
    }
    // Documents cannot be adopted.
    assert_eq!(doc_b.adopt_node(&doc_a).err(), Some(DomError::NotSupported));
}

#[test]
fn import_node_clones_into_the_target_document() {
    let doc_a = Document::new_html();
    let doc_b = Document::new_html();
    let div = doc_a.create_element("div").expect("valid");
    div.set_attribute("id", "d").expect("set");
    div.append_child(&doc_a.create_text_node("x")).expect("append");

    let copy = doc_b.import_node(&div, true).expect("import");
    assert!(!Rc::ptr_eq(&copy, &div));
    assert!(Rc::ptr_eq(&copy.owner_document().expect("owner"), &doc_b));
    assert_eq!(copy.get_attribute("id").as_deref(), Some("d"));
    assert_eq!(copy.text_content().as_deref(), Some("x"));
    // The original is untouched.
    assert!(Rc::ptr_eq(&div.owner_document().expect("owner"), &doc_a));
}

#[test]
fn deep_clone_copies_template_contents() {
    let doc = Document::new_html();
    let template = doc.create_element("template").expect("valid");
    let contents = template
        .as_element()
        .expect("element")
        .template_contents()
        .expect("contents");
    let inert_doc = contents.owner_document().expect("owner");
    contents
        .append_child(&inert_doc.create_text_node("inside"))
        .expect("append");

    let shallow = template.clone_node(false);
    let shallow_contents = shallow
        .as_element()
        .expect("element")
        .template_contents()
        .expect("contents");
    assert_eq!(shallow_contents.child_count(), 0);

    let deep = template.clone_node(true);
    let deep_contents = deep
        .as_element()
        .expect("element")
        .template_contents()
        .expect("contents");
    assert_eq!(deep_contents.text_content().as_deref(), Some("inside"));
}

#[test]
fn normalize_merges_text_runs_and_is_idempotent() {
    let doc = Document::new_html();
    let div = doc.create_element("div").expect("valid");
    div.append_child(&doc.create_text_node("a")).expect("append");
    div.append_child(&doc.create_text_node("")).expect("append");
    div.append_child(&doc.create_text_node("b")).expect("append");
    div.append_child(&doc.create_element("br").expect("valid"))
        .expect("append");
    div.append_child(&doc.create_text_node("c")).expect("append");
    div.append_child(&doc.create_text_node("d")).expect("append");

    div.normalize();
    assert_eq!(div.child_count(), 3);
    assert_eq!(div.first_child().expect("text").node_value().as_deref(), Some("ab"));
    assert_eq!(div.last_child().expect("text").node_value().as_deref(), Some("cd"));

    let before = dom::snapshot(&div);
    div.normalize();
    assert_eq!(dom::snapshot(&div), before, "normalize must be idempotent");
}

#[test]
fn normalize_rewrites_range_boundaries() {
    let doc = Document::new_html();
    let div = doc.create_element("div").expect("valid");
    doc.body().expect("body").append_child(&div).expect("append");
    let first = doc.create_text_node("ab");
    let second = doc.create_text_node("cd");
    div.append_child(&first).expect("append");
    div.append_child(&second).expect("append");

    let range = doc.create_range().expect("range");
    range.set_start(&second, 1).expect("boundary");
    range.set_end(&second, 2).expect("boundary");

    div.normalize();
    // "cd" merged after "ab": offsets shift by the length of "ab".
    assert!(Rc::ptr_eq(&range.start_container(), &first));
    assert_eq!(range.start_offset(), 3);
    assert_eq!(range.end_offset(), 4);
}

#[test]
fn range_boundaries_track_sibling_insertions_and_removals() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let a = doc.create_element("p").expect("valid");
    let b = doc.create_element("p").expect("valid");
    body.append_child(&a).expect("append");
    body.append_child(&b).expect("append");

    let range = doc.create_range().expect("range");
    range.set_start(&body, 1).expect("boundary");
    range.set_end(&body, 2).expect("boundary");

    // Insert before index 0: both boundaries shift right.
    let inserted = doc.create_element("hr").expect("valid");
    body.insert_before(&inserted, Some(&a)).expect("insert");
    assert_eq!(range.start_offset(), 2);
    assert_eq!(range.end_offset(), 3);

    // Removing the first child shifts boundaries back.
    body.remove_child(&inserted).expect("remove");
    assert_eq!(range.start_offset(), 1);
    assert_eq!(range.end_offset(), 2);

    // A boundary inside a removed subtree collapses to the removal point.
    let inner_text = doc.create_text_node("xyz");
    a.append_child(&inner_text).expect("append");
    range.set_start(&inner_text, 1).expect("boundary");
    body.remove_child(&a).expect("remove");
    assert!(Rc::ptr_eq(&range.start_container(), &body));
    assert_eq!(range.start_offset(), 0);
}

#[test]
fn node_iterator_reference_survives_subtree_removal() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let first = doc.create_element("section").expect("valid");
    let second = doc.create_element("article").expect("valid");
    let inner = doc.create_element("p").expect("valid");
    second.append_child(&inner).expect("append");
    body.append_child(&first).expect("append");
    body.append_child(&second).expect("append");

    let iterator = doc
        .create_node_iterator(&body, SHOW_ELEMENT, None)
        .expect("iterator");
    // The root itself is the first result; then walk into the subtree that
    // is about to disappear.
    let root_hit = iterator.next_node().expect("root");
    assert!(Rc::ptr_eq(&root_hit, &body));
    iterator.next_node().expect("section");
    iterator.next_node().expect("article");
    let reached = iterator.next_node().expect("p");
    assert!(Rc::ptr_eq(&reached, &inner));

    body.remove_child(&second).expect("remove");
    // The reference was re-pointed just before the removed subtree.
    assert!(Rc::ptr_eq(&iterator.reference_node(), &first));
    assert!(iterator.next_node().is_none());
    let back = iterator.previous_node().expect("first");
    assert!(Rc::ptr_eq(&back, &first));
}

#[test]
fn tree_walker_applies_filters() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let keep = doc.create_element("div").expect("valid");
    let skip = doc.create_element("aside").expect("valid");
    let nested = doc.create_element("div").expect("valid");
    skip.append_child(&nested).expect("append");
    body.append_child(&keep).expect("append");
    body.append_child(&skip).expect("append");

    let walker = doc
        .create_tree_walker(
            &body,
            SHOW_ELEMENT,
            Some(std::rc::Rc::new(|node: &NodeRef| {
                if node.is_html_element("aside") {
                    FilterResult::Skip
                } else {
                    FilterResult::Accept
                }
            })),
        )
        .expect("walker");

    let first = walker.next_node().expect("div");
    assert!(Rc::ptr_eq(&first, &keep));
    // The skipped aside is transparent: its child is still reachable.
    let second = walker.next_node().expect("nested div");
    assert!(Rc::ptr_eq(&second, &nested));
    assert!(walker.next_node().is_none());
}

#[test]
fn node_iterator_what_to_show_masks_kinds() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let p = doc.create_element("p").expect("valid");
    p.append_child(&doc.create_text_node("t")).expect("append");
    body.append_child(&p).expect("append");

    let iterator = doc
        .create_node_iterator(&body, SHOW_TEXT, None)
        .expect("iterator");
    let only = iterator.next_node().expect("text");
    assert_eq!(only.node_value().as_deref(), Some("t"));
    assert!(iterator.next_node().is_none());
}

#[test]
fn live_collections_reflect_mutations_without_snapshotting() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let list = doc.get_elements_by_tag_name("p");
    assert_eq!(list.len(), 0);

    let p1 = doc.create_element("p").expect("valid");
    body.append_child(&p1).expect("append");
    assert_eq!(list.len(), 1);

    let div = doc.create_element("div").expect("valid");
    let p2 = doc.create_element("p").expect("valid");
    div.append_child(&p2).expect("append");
    body.append_child(&div).expect("append");
    assert_eq!(list.len(), 2);
    assert!(Rc::ptr_eq(&list.item(1).expect("nested p"), &p2));

    body.remove_child(&p1).expect("remove");
    assert_eq!(list.len(), 1);

    // Class collections invalidate on attribute writes too.
    let by_class = doc.get_elements_by_class_name("x");
    assert_eq!(by_class.len(), 0);
    p2.set_attribute("class", "x y").expect("set");
    assert_eq!(by_class.len(), 1);
}

#[test]
fn document_position_and_equality() {
    let doc = Document::new_html();
    let body = doc.body().expect("body");
    let a = doc.create_element("p").expect("valid");
    let b = doc.create_element("p").expect("valid");
    body.append_child(&a).expect("append");
    body.append_child(&b).expect("append");

    assert_eq!(
        a.compare_document_position(&b) & position::FOLLOWING,
        position::FOLLOWING
    );
    assert_eq!(
        b.compare_document_position(&a) & position::PRECEDING,
        position::PRECEDING
    );
    let mask = body.compare_document_position(&a);
    assert_eq!(mask & position::CONTAINED_BY, position::CONTAINED_BY);
    assert!(body.contains(&a));
    assert!(!a.contains(&body.handle()));

    assert!(a.is_equal_node(&b));
    b.set_attribute("id", "x").expect("set");
    assert!(!a.is_equal_node(&b));

    let detached = doc.create_element("p").expect("valid");
    let mask = a.compare_document_position(&detached);
    assert_eq!(mask & position::DISCONNECTED, position::DISCONNECTED);
}

#[test]
fn text_content_replaces_all_children() {
    let doc = Document::new_html();
    let div = doc.create_element("div").expect("valid");
    div.append_child(&build_paragraph(&doc)).expect("append");
    assert_eq!(div.text_content().as_deref(), Some("hello"));

    div.set_text_content("new");
    assert_eq!(div.child_count(), 1);
    assert!(div.first_child().expect("child").is_text());
    assert_eq!(div.text_content().as_deref(), Some("new"));

    div.set_text_content("");
    assert_eq!(div.child_count(), 0);
}

#[test]
fn base_element_updates_the_document_base_url() {
    let doc = Document::with_url("http://example.com/dir/page.html");
    let html = doc.create_element("html").expect("valid");
    let head = doc.create_element("head").expect("valid");
    doc.append_child(&html).expect("append");
    html.append_child(&head).expect("append");
    assert_eq!(doc.base_url(), "http://example.com/dir/page.html");

    let base = doc.create_element("base").expect("valid");
    base.set_attribute("href", "../other/").expect("set");
    head.append_child(&base).expect("append");
    assert_eq!(doc.base_url(), "http://example.com/dir/../other/");

    head.remove_child(&base).expect("remove");
    assert_eq!(doc.base_url(), "http://example.com/dir/page.html");
}

#[test]
fn lookup_namespace_walks_ancestors() {
    let doc = Document::new_html();
    let svg = doc
        .create_element_ns(Some(dom::name::SVG_NS), "svg")
        .expect("valid");
    let rect = doc
        .create_element_ns(Some(dom::name::SVG_NS), "rect")
        .expect("valid");
    svg.append_child(&rect).expect("append");
    assert_eq!(
        rect.lookup_namespace_uri(None).as_deref(),
        Some(dom::name::SVG_NS)
    );
    let html = doc.document_element().expect("root");
    assert_eq!(
        html.lookup_namespace_uri(None).as_deref(),
        Some(dom::name::HTML_NS)
    );
}
