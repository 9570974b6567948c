//! Benchmarks for the command interpreter.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sylvan::command::parse;
use sylvan::document::Document;
use sylvan::session::Session;
use sylvan::tree::{Language, Subtree};

fn wide_document(width: usize) -> Document {
    let children = (0..width)
        .map(|i| Subtree::text("num", i.to_string()))
        .collect();
    let root = Subtree::branch("program", children);
    Document::from_subtree(Arc::new(Language::example()), &root).unwrap()
}

fn bench_parse_commands(c: &mut Criterion) {
    let source = "[mark parent shell put-right [goto-mark take right put-last] loop parent first unmark] atomic";
    c.bench_function("parse_commands", |b| {
        b.iter(|| parse(black_box(source)).unwrap())
    });
}

fn bench_loop_to_rightmost(c: &mut Criterion) {
    let doc = wide_document(500);
    c.bench_function("loop_to_rightmost", |b| {
        b.iter(|| {
            let mut session = Session::new(doc.clone());
            session.eval(black_box("child rightmost")).unwrap();
        })
    });
}

fn bench_edit_and_undo(c: &mut Criterion) {
    let doc = wide_document(100);
    c.bench_function("edit_and_undo", |b| {
        b.iter(|| {
            let mut session = Session::new(doc.clone());
            for _ in 0..20 {
                session.eval("child delete").unwrap();
                session.eval("undo").unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    bench_parse_commands,
    bench_loop_to_rightmost,
    bench_edit_and_undo
);
criterion_main!(benches);
