use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use html::{parse_document, ParserOptions};

fn build_page(paragraphs: usize) -> String {
    let mut page = String::from(
        "<!DOCTYPE html><html><head><title>bench</title>\
         <style>p { margin: 0 }</style></head><body>",
    );
    for i in 0..paragraphs {
        page.push_str("<div class=\"row\"><p id=\"p");
        page.push_str(&i.to_string());
        page.push_str("\">text &amp; <b>more <i>text</i></b> here</p></div>");
    }
    page.push_str("<table>");
    for _ in 0..(paragraphs / 10).max(1) {
        page.push_str("<tr><td>a<td>b<td>c");
    }
    page.push_str("</table></body></html>");
    page
}

fn parse_benches(c: &mut Criterion) {
    let options = ParserOptions::default();
    for size in [50usize, 500] {
        let page = build_page(size);
        let mut group = c.benchmark_group("parse_document");
        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_function(format!("{size}_paragraphs"), |b| {
            b.iter(|| black_box(parse_document(black_box(&page), &options)))
        });
        group.finish();
    }
}

fn serialize_benches(c: &mut Criterion) {
    let options = ParserOptions::default();
    let page = build_page(200);
    let doc = parse_document(&page, &options);
    c.bench_function("serialize_html", |b| {
        b.iter(|| {
            black_box(dom::serialize_html(
                black_box(&doc),
                dom::SerializeOptions::default(),
            ))
        })
    });
}

criterion_group!(benches, parse_benches, serialize_benches);
criterion_main!(benches);
