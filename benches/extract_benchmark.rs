//! Benchmarks for passage extraction.
//!
//! Run with: cargo bench
//!
//! These benchmarks run on synthetic documents built in memory.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use unquote::{Document, ExtractOptions, TextRun, TextStyle};

/// Build a document where every fourth paragraph holds a bold passage and
/// every tenth passage spans two paragraphs.
fn create_test_document(paragraph_count: usize) -> Document {
    let mut doc = Document::new("YY-bench");
    let symbol = TextStyle::bold().with_font("Symbol");

    for i in 0..paragraph_count {
        let runs = match i % 4 {
            0 if i % 40 == 0 => vec![
                TextRun::new("Opening prose "),
                TextRun::bold("\u{201C}a passage that "),
                TextRun::styled("continues", TextStyle::bold().with_italic()),
            ],
            1 if i % 40 == 1 => vec![
                TextRun::bold("on the next line.\u{201D}"),
                TextRun::new(" (Yirma'yah / Jeremiah 31:31-32 - in part)"),
            ],
            0 => vec![
                TextRun::new("He said "),
                TextRun::bold("\u{201C}I will "),
                TextRun::styled("Yahowah", symbol.clone()),
                TextRun::bold(" praise th\u{F065}\u{201D}"),
                TextRun::new(" (Mizmowr / Song / Psalm 29:2)"),
            ],
            _ => vec![TextRun::new(
                "Ordinary commentary with \u{201C}plain quotes\u{201D} and no citation at all.",
            )],
        };
        doc.push_runs(runs);
    }

    doc
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let options = ExtractOptions::default();

    for paragraph_count in [100, 1_000, 10_000].iter() {
        let doc = create_test_document(*paragraph_count);

        group.bench_function(format!("{}_paragraphs", paragraph_count), |b| {
            b.iter(|| unquote::extract_passages(black_box(&doc), &options));
        });
    }

    group.finish();
}

fn bench_citation(c: &mut Criterion) {
    c.bench_function("parse_citation", |b| {
        b.iter(|| {
            unquote::parse_citation(black_box(
                "Yirma'yah / Yah Uplifts / Jeremiah 31:31-32 - in part",
            ))
        });
    });
}

fn bench_consolidate(c: &mut Criterion) {
    let markup = "<b>one </b><b>two </b><b><span class=\"Symbol\">x</span></b><b><span class=\"Symbol\">y</span></b><i>z</i><i>w</i>"
        .repeat(50);

    c.bench_function("consolidate", |b| {
        b.iter(|| unquote::consolidate(black_box(&markup)));
    });
}

criterion_group!(benches, bench_extraction, bench_citation, bench_consolidate);
criterion_main!(benches);
