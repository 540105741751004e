//! Overlay Performance Benchmarks
//!
//! Recompute and hit-test cost on large annotation sets.
//!
//! Run with: `cargo bench --bench overlay_performance`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use redline::annotations::{Annotation, AnnotationStatus, AnnotationType};
use redline::events::NoopListener;
use redline::geometry::{to_normalized, NormalizedRect, PageSize, PixelRect};
use redline::outline::{guess_section, OutlineEntry, OutlineIndex};
use redline::overlay::{OverlayEngine, RecomputeReason};

const PAGE: PageSize = PageSize {
    width_px: 612.0,
    height_px: 792.0,
};

/// `per_page` annotations on each of `pages` pages, staggered so they overlap
fn annotations(pages: u32, per_page: u32) -> Vec<Annotation> {
    let mut out = Vec::with_capacity((pages * per_page) as usize);
    for page in 1..=pages {
        for i in 0..per_page {
            let offset = (i % 20) as f64 * 4.0;
            out.push(Annotation {
                id: Uuid::new_v4(),
                document_id: "bench".to_string(),
                page_number: page,
                position: NormalizedRect::new(page, 5.0 + offset / 2.0, offset, 40.0, 6.0),
                highlighted_text: String::new(),
                comment_text: String::new(),
                annotation_type: AnnotationType::Comment,
                status: AnnotationStatus::Proposed,
                section_label: None,
                author_id: "bench".to_string(),
                created_at: Utc.timestamp_opt(1_700_000_000 + (page * per_page + i) as i64, 0).unwrap(),
            });
        }
    }
    out
}

fn engine_with(pages: u32, per_page: u32, rendered: u32) -> OverlayEngine {
    let mut engine = OverlayEngine::new(Arc::new(NoopListener), Duration::from_millis(300));
    engine.load_document("bench", annotations(pages, per_page));
    for page in 1..=rendered {
        engine.page_rendered(page, PAGE);
    }
    engine.on_animation_frame();
    engine
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_recompute");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    let mut visible = engine_with(500, 20, 3);
    group.bench_function("10k_annotations_3_rendered_pages", |b| {
        b.iter(|| {
            visible.request_recompute(RecomputeReason::ViewportChanged);
            black_box(visible.on_animation_frame())
        })
    });

    let mut everything = engine_with(500, 20, 500);
    group.bench_function("10k_annotations_all_pages_rendered", |b| {
        b.iter(|| {
            everything.request_recompute(RecomputeReason::ViewportChanged);
            black_box(everything.on_animation_frame())
        })
    });

    group.finish();
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_hit_test");
    group.measurement_time(Duration::from_secs(10));

    let engine = engine_with(50, 200, 50);
    let snapshot = engine.snapshot();
    group.bench_function("200_overlapping_rects", |b| {
        b.iter(|| black_box(snapshot.hit_test(black_box(25), 150.0, 40.0)))
    });

    group.finish();
}

fn bench_geometry_and_sections(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");

    let rect = PixelRect {
        x1: 72.0,
        y1: 100.0,
        x2: 540.0,
        y2: 130.0,
        page_width_px: PAGE.width_px,
        page_height_px: PAGE.height_px,
        page_number: 7,
    };
    group.bench_function("to_normalized", |b| b.iter(|| black_box(to_normalized(black_box(&rect)))));

    let index = OutlineIndex::new(
        (1..=2000u32)
            .map(|i| OutlineEntry::new(&format!("Section {}", i), i / 2 + 1))
            .collect(),
    );
    group.bench_function("guess_section_2000_entries", |b| {
        b.iter(|| black_box(guess_section(&index, black_box(640), Some(0.7))))
    });

    group.finish();
}

criterion_group!(benches, bench_recompute, bench_hit_test, bench_geometry_and_sections);
criterion_main!(benches);
