use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use net_ledger::prelude::*;

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(vec![
            TagSchema::new("edge", ElementKind::Edge, vec![]),
            TagSchema::new("lane", ElementKind::Lane, vec![]),
            TagSchema::new("busStop", ElementKind::Additional, vec![]),
            TagSchema::new("poly", ElementKind::Shape, vec![]),
            TagSchema::new("taz", ElementKind::TazElement, vec![]),
            TagSchema::new("trip", ElementKind::DemandElement, vec![]),
            TagSchema::new("edgeData", ElementKind::GenericData, vec![]),
        ])
        .unwrap(),
    )
}

const TAGS: [&str; 7] = ["edge", "lane", "busStop", "poly", "taz", "trip", "edgeData"];

fn created(net: &mut Network, tag: &str) -> ElementId {
    let id = net.create_element(tag).unwrap();
    Change::create(net, id).unwrap().redo(net).unwrap();
    id
}

/// Undo/redo cycle of one creating change whose capture fans out across all
/// seven kinds, n parents per kind. Each iteration is state-neutral.
fn bench_link_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_fanout");
    for &n in &[1usize, 8, 64] {
        let mut net = Network::new(schema());
        let mut parents = Vec::with_capacity(7 * n);
        for tag in TAGS {
            for _ in 0..n {
                parents.push(created(&mut net, tag));
            }
        }
        let subject = net.create_element("trip").unwrap();
        for &p in &parents {
            net.declare_parent(subject, p).unwrap();
        }
        let mut change = Change::create(&net, subject).unwrap();
        change.redo(&mut net).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(7 * n), &n, |b, _| {
            b.iter(|| {
                change.undo(&mut net).unwrap();
                change.redo(&mut net).unwrap();
            })
        });
    }
    group.finish();
}

/// Full unwind and replay of a recorded history through the stack.
fn bench_history_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_cycle");
    for &entries in &[32usize, 256] {
        let mut net = Network::new(schema());
        let mut stack = UndoStack::new();
        let edge = net.create_element("edge").unwrap();
        stack
            .add(Change::create(&net, edge).unwrap(), &mut net)
            .unwrap();
        for i in 1..entries {
            let lane = net.create_element("lane").unwrap();
            net.declare_parent(lane, edge).unwrap();
            if i % 4 == 0 {
                stack.begin("lane pair");
                stack
                    .add(Change::create(&net, lane).unwrap(), &mut net)
                    .unwrap();
                let extra = net.create_element("lane").unwrap();
                net.declare_parent(extra, edge).unwrap();
                stack
                    .add(Change::create(&net, extra).unwrap(), &mut net)
                    .unwrap();
                stack.end().unwrap();
            } else {
                stack
                    .add(Change::create(&net, lane).unwrap(), &mut net)
                    .unwrap();
            }
        }

        group.bench_with_input(BenchmarkId::from_parameter(entries), &entries, |b, _| {
            b.iter(|| {
                while stack.can_undo() {
                    stack.undo(&mut net).unwrap();
                }
                while stack.can_redo() {
                    stack.redo(&mut net).unwrap();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_link_fanout, bench_history_cycle);
criterion_main!(benches);
