use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::ops::ControlFlow;
use std::sync::Arc;
use trellis_testing::{TestObject, Timeline};
use trellis_ui::{
    find_object_at_position_matching, visit_before, walk_visible_object_tree, Canvas,
    CanvasObject, CanvasOptions, NodeView, ObjectRef, Point, Size,
};

const SECTION_COUNT: usize = 4;
const ROWS_PER_SECTION_SAMPLES: &[usize] = &[16, 64, 256];
const ROW_HEIGHT: f32 = 24.0;
const ROOT_SIZE: Size = Size {
    width: 1080.0,
    height: 1920.0,
};

/// Sections of rows, each row holding a label and a button. Every section is
/// a scroll view so the walk also tracks clips.
fn build_content(sections: usize, rows_per_section: usize) -> ObjectRef {
    let section_height = rows_per_section as f32 * ROW_HEIGHT;
    let children = (0..sections)
        .map(|section| {
            let rows = (0..rows_per_section)
                .map(|row| {
                    let label = TestObject::builder(format!("label {section}-{row}"))
                        .size(200.0, ROW_HEIGHT)
                        .min_size(100.0, ROW_HEIGHT)
                        .build();
                    let button = TestObject::builder(format!("button {section}-{row}"))
                        .at(200.0, 0.0)
                        .size(80.0, ROW_HEIGHT)
                        .focusable()
                        .build();
                    TestObject::builder(format!("row {section}-{row}"))
                        .at(0.0, row as f32 * ROW_HEIGHT)
                        .size(ROOT_SIZE.width, ROW_HEIGHT)
                        .children(vec![label.object(), button.object()])
                        .build()
                        .object()
                })
                .collect();
            TestObject::builder(format!("section {section}"))
                .at(0.0, section as f32 * section_height)
                .size(ROOT_SIZE.width, section_height)
                .children(rows)
                .scroll()
                .build()
                .object()
        })
        .collect();
    TestObject::builder("root")
        .size(ROOT_SIZE.width, ROOT_SIZE.height)
        .children(children)
        .build()
        .object()
}

fn object_count(sections: usize, rows_per_section: usize) -> usize {
    1 + sections * (1 + rows_per_section * 3)
}

fn bench_visible_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_visible");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        let timeline = Timeline::new();
        let content = build_content(SECTION_COUNT, rows);
        group.bench_with_input(
            BenchmarkId::new("objects", object_count(SECTION_COUNT, rows)),
            &content,
            |b, content| {
                b.iter(|| {
                    let mut visited = 0usize;
                    let mut visitor = visit_before(|_: &ObjectRef, _, _, _| {
                        visited += 1;
                        ControlFlow::Continue(())
                    });
                    walk_visible_object_tree(content, timeline.caches(), &mut visitor);
                    drop(visitor);
                    black_box(visited);
                });
            },
        );
    }
    group.finish();
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_test");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        let timeline = Timeline::new();
        let roots = vec![build_content(SECTION_COUNT, rows)];
        let point = Point::new(220.0, rows as f32 * ROW_HEIGHT * 2.5);
        group.bench_with_input(
            BenchmarkId::new("objects", object_count(SECTION_COUNT, rows)),
            &roots,
            |b, roots| {
                b.iter(|| {
                    let hit = find_object_at_position_matching(
                        point,
                        |object| object.as_focusable().is_some(),
                        None,
                        roots,
                        timeline.caches(),
                    );
                    black_box(hit.is_some());
                });
            },
        );
    }
    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_tree_reconcile");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        let timeline = Timeline::new();
        let mut canvas = Canvas::new(Arc::clone(timeline.caches()), CanvasOptions::default());
        canvas.set_content(build_content(SECTION_COUNT, rows));
        canvas.resize(ROOT_SIZE);
        // Warm up so steady-state reconciliation is measured.
        canvas.ensure_min_size();

        group.bench_function(
            BenchmarkId::new("objects", object_count(SECTION_COUNT, rows)),
            |b| {
                b.iter(|| {
                    let mut nodes = 0usize;
                    let mut visitor = (
                        |_: &mut NodeView<'_>, _: Point| nodes += 1,
                        |_: &mut NodeView<'_>| {},
                    );
                    canvas.walk_trees(&mut visitor);
                    drop(visitor);
                    black_box(nodes);
                });
            },
        );
    }
    group.finish();
}

fn bench_ensure_min_size(c: &mut Criterion) {
    let timeline = Timeline::new();
    let mut canvas = Canvas::new(Arc::clone(timeline.caches()), CanvasOptions::default());
    canvas.set_content(build_content(SECTION_COUNT, 64));
    canvas.resize(ROOT_SIZE);

    c.bench_function("ensure_min_size_steady", |b| {
        b.iter(|| black_box(canvas.ensure_min_size()));
    });
}

criterion_group!(
    walk,
    bench_visible_walk,
    bench_hit_test,
    bench_reconcile,
    bench_ensure_min_size
);
criterion_main!(walk);
