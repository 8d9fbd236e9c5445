use criterion::{black_box, criterion_group, criterion_main, Criterion};
use segue::engine::classify::{is_external, is_navigable};
use segue::renderer::{Element, HtmlParser, SelectorList};

fn sample_page(items: usize) -> String {
    let list: String = (0..items)
        .map(|i| format!("<li><a href=\"/post/{i}\">Post {i}</a></li>"))
        .collect();
    format!(
        "<!DOCTYPE html><html><head><title>Archive</title></head>\
         <body><header><nav>{list}</nav></header><main id=\"main\"><ul>{list}</ul></main></body></html>"
    )
}

/// Fragment extraction from fetched documents
fn benchmark_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let parser = HtmlParser::new();

    for items in [10, 200] {
        let page = sample_page(items);
        group.bench_function(format!("extract_{items}_links"), |b| {
            b.iter(|| parser.extract(black_box(&page), "main"))
        });
    }

    group.finish();
}

/// Link classification done on every click and hover
fn benchmark_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    let current = "https://site.test/blog/index.html";

    group.bench_function("is_external", |b| {
        b.iter(|| {
            is_external(black_box("../about.html#team"), current)
                && is_external(black_box("https://elsewhere.test/"), current)
        })
    });

    let blacklist = SelectorList::parse(".no-smoothState, [data-external]").unwrap_or_default();
    let anchor = Element::new("a")
        .with_attr("href", "/blog/post")
        .with_attr("class", "card link");
    group.bench_function("is_navigable", |b| {
        b.iter(|| {
            is_navigable(
                black_box("https://site.test/blog/post"),
                current,
                blacklist.matches(&anchor),
                false,
                None,
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_extraction, benchmark_classification);
criterion_main!(benches);
