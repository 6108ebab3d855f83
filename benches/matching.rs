//! Performance benchmarks for textsnip
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use textsnip::{Config, Query, Snipper, SnippetOptions, TokenList};

/// Build a synthetic document with the phrase planted at intervals.
fn sample_document(words: usize) -> String {
    let mut doc = String::with_capacity(words * 8);
    for i in 0..words {
        if i % 250 == 249 {
            doc.push_str("united states ");
        } else {
            doc.push_str(&format!("word{} ", i % 97));
        }
    }
    doc
}

fn bench_query_compile(c: &mut Criterion) {
    let cfg = Config::default();
    let queries = [
        "simple",
        "two words",
        "\"exact phrase\"",
        "+required -excluded neutral",
        "color:brown (fox OR hound) \"lazy dog\"~3",
        "wild* card* query*",
    ];

    let mut group = c.benchmark_group("query_compile");
    for query in queries {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, q| {
            b.iter(|| Query::compile(black_box(q), &cfg).unwrap());
        });
    }
    group.finish();
}

fn bench_tokenize(c: &mut Criterion) {
    let cfg = Config::default();
    let query = Query::compile("\"united states\"", &cfg).unwrap();

    let mut group = c.benchmark_group("tokenize");
    for words in [1_000usize, 10_000, 50_000] {
        let doc = sample_document(words);
        group.bench_with_input(BenchmarkId::from_parameter(words), &doc, |b, doc| {
            b.iter(|| TokenList::new(black_box(doc), &query).len());
        });
    }
    group.finish();
}

fn bench_snip(c: &mut Criterion) {
    let cfg = Config::default();
    let query = Query::compile("\"united states\"", &cfg).unwrap();
    let doc = sample_document(10_000);

    let opts = SnippetOptions {
        occur: 3,
        context: 12,
        as_sentences: true,
        ..Default::default()
    };

    c.bench_function("snip_10k_words", |b| {
        let snipper = Snipper::with_options(&query, opts.clone());
        b.iter(|| snipper.snip(black_box(&doc)));
    });
}

fn bench_html_regex(c: &mut Criterion) {
    let cfg = Config::default();
    let query = Query::compile("\"united states\"", &cfg).unwrap();
    let pair = query.regex_for("united states").unwrap();
    let html = "<p>the <b>united</b> <i>states</i> of america</p>".repeat(100);

    c.bench_function("html_regex_scan", |b| {
        b.iter(|| pair.html.find_iter(black_box(&html)).count());
    });
}

criterion_group!(
    benches,
    bench_query_compile,
    bench_tokenize,
    bench_snip,
    bench_html_regex
);
criterion_main!(benches);
