//! Projection cost on long wrapped lines.
//!
//! Run with: `cargo bench --package core-model --bench projection_bench`

use core_model::{CursorProjector, FoldTable, ViewCursor, ViewOptions};
use core_text::{Buffer, Position};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn long_lines(lines: usize, len: usize) -> Buffer {
    let line: String = "fn step(\tctx) { wrap(日本); }"
        .chars()
        .cycle()
        .take(len)
        .collect();
    let text = vec![line; lines].join("\n");
    Buffer::from_str("bench", &text)
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_end_of_buffer");
    for len in [80usize, 1_000, 10_000] {
        let buf = long_lines(200, len);
        let folds = FoldTable::new();
        let opts = ViewOptions {
            columns: 80,
            ..ViewOptions::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let mut p = CursorProjector::new(&buf, &folds, opts, false);
                black_box(p.resolve(Position::new(199, len - 1)))
            })
        });
    }
    group.finish();
}

fn bench_sticky_walk(c: &mut Criterion) {
    let buf = long_lines(500, 400);
    let mut folds = FoldTable::new();
    for head in (10..500).step_by(50) {
        let _ = folds.create(head, head + 20);
    }
    let opts = ViewOptions {
        columns: 60,
        ..ViewOptions::default()
    };
    c.bench_function("sticky_walk_down", |b| {
        b.iter(|| {
            let mut p = CursorProjector::new(&buf, &folds, opts, false);
            let mut cur = ViewCursor::origin();
            let mut line = 0;
            while line < 499 {
                line = p.line_below(line, 1);
                p.goto_screen_col_buffer_line(&mut cur, 150, line);
            }
            black_box(cur)
        })
    });
}

criterion_group!(benches, bench_resolve, bench_sticky_walk);
criterion_main!(benches);
