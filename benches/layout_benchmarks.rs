use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mentorgraph::layout::LayoutInput;
use mentorgraph::{filter, spider_layout, Dataset, FilterCriteria, LayoutConfig, LayoutEngine, Mentee, Mentor, RelationshipGraph};
use std::sync::Arc;

/// Synthetic dataset: `mentors` mentors, four mentees each, every fifth mentee unassigned
fn dataset(mentors: usize) -> Dataset {
    let mentor_list = (0..mentors)
        .map(|i| Mentor::new(format!("m{}", i), format!("Mentor {}", i)).with_university(format!("Uni {}", i % 7)))
        .collect();
    let mentee_list = (0..mentors * 4)
        .map(|i| {
            let mentee = Mentee::new(format!("e{}", i), format!("Mentee {}", i));
            if i % 5 == 0 {
                mentee
            } else {
                mentee.with_mentor(format!("m{}", i % mentors).as_str())
            }
        })
        .collect();
    Dataset::new(mentor_list, mentee_list)
}

/// Benchmark relationship graph construction
fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");

    for size in [10, 100, 1000].iter() {
        let data = Arc::new(dataset(*size));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let graph = RelationshipGraph::build(Arc::clone(&data));
                criterion::black_box(graph.statistics());
            });
        });
    }
    group.finish();
}

/// Benchmark free-text filtering
fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_search");
    let criteria = FilterCriteria::search("uni 3");

    for size in [10, 100, 1000].iter() {
        let data = dataset(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let view = filter(&data.mentors, &data.mentees, &criteria);
                criterion::black_box(view.len());
            });
        });
    }
    group.finish();
}

/// Benchmark a full spider layout pass
fn bench_spider_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("spider_layout");
    let config = LayoutConfig::default();

    for size in [10, 100, 1000].iter() {
        let data = dataset(*size);
        let view = filter(&data.mentors, &data.mentees, &FilterCriteria::default());
        let input = LayoutInput::from_view(&view);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let layout = spider_layout(&input, &config);
                criterion::black_box(layout.node_count());
            });
        });
    }
    group.finish();
}

/// Benchmark the unchanged-view check that lets refreshes skip re-layout
fn bench_unchanged_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_unchanged_update");

    for size in [10, 100, 1000].iter() {
        let data = dataset(*size);
        let view = filter(&data.mentors, &data.mentees, &FilterCriteria::default());
        let mut engine = LayoutEngine::default();
        engine.update(&view);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                criterion::black_box(engine.update(&view));
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_graph_build,
    bench_filter,
    bench_spider_layout,
    bench_unchanged_update
);
criterion_main!(benches);
