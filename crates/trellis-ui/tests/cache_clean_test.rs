use std::sync::Arc;
use trellis_testing::{init_test_logging, mins, secs, TestWidget, Timeline};
use trellis_ui::{CanvasId, Caches, RasterImage};

fn destroyed(widgets: &[Arc<TestWidget>]) -> usize {
    widgets.iter().map(|w| w.stats().destroyed()).sum()
}

fn assert_lens(caches: &Caches, svgs: usize, renderers: usize, canvases: usize) {
    assert_eq!(caches.svgs().len(), svgs, "svg entries");
    assert_eq!(caches.renderers().len(), renderers, "renderer entries");
    assert_eq!(caches.canvases().len(), canvases, "canvas entries");
}

/// Two batches of 20 widgets, svgs and canvas associations created at 10:10
/// and 10:20, then swept through the rate limiter step by step.
#[test]
fn sweep_follows_rate_limit_and_expiry() {
    init_test_logging();
    let timeline = Timeline::new();
    let caches = Arc::clone(timeline.caches());
    let canvas = CanvasId::next();
    let image = Arc::new(RasterImage::new(1, 1));

    let mut widgets = Vec::new();
    let mut associated = Vec::new();
    for k in 0..2u64 {
        timeline.at(mins(10) + secs(10 + k * 10));
        for i in 0..20u32 {
            caches
                .svgs()
                .set(format!("{k}{i}"), Arc::clone(&image), i, i + 1);
            let widget = TestWidget::simple();
            caches.renderers().renderer(&widget.object());
            widgets.push(widget);
            let other = TestWidget::simple();
            caches.canvases().set_canvas_for_object(&other.object(), canvas);
            associated.push(other);
        }
    }
    let now = |offset| Some(timeline.clock().instant_at(offset));

    // Nothing has expired yet.
    timeline.set_last_clean(mins(10) + secs(20));
    assert!(!caches.clean(false));
    assert_lens(&caches, 40, 40, 40);
    assert_eq!(destroyed(&widgets), 0);

    timeline.at(mins(10) + secs(30));
    assert!(caches.clean(true));
    assert_eq!(caches.last_clean(), now(mins(10) + secs(30)));
    assert_lens(&caches, 40, 40, 40);

    // Without a refresh the task interval applies; with one only the floor.
    timeline.at(mins(10) + secs(42));
    assert!(!caches.clean(false));
    assert_eq!(caches.last_clean(), now(mins(10) + secs(30)));
    assert!(caches.clean(true));
    assert_eq!(caches.last_clean(), now(mins(10) + secs(42)));

    timeline.at(mins(10) + secs(45));
    assert!(!caches.clean(true));
    assert!(caches.has_skipped_refresh_clean());
    assert_eq!(caches.last_clean(), now(mins(10) + secs(42)));

    timeline.at(mins(10) + secs(53));
    assert!(caches.clean(true));
    assert!(!caches.has_skipped_refresh_clean());
    assert_eq!(caches.last_clean(), now(mins(10) + secs(53)));
    assert_lens(&caches, 40, 40, 40);
    assert_eq!(destroyed(&widgets), 0);

    // A plain sweep drops only svgs.
    timeline.set_last_clean(mins(10) + secs(11));
    timeline.at(mins(11) + secs(12));
    assert!(caches.clean(false));
    assert_lens(&caches, 20, 40, 40);

    timeline.at(mins(11) + secs(42));
    assert!(caches.clean(false));
    assert_lens(&caches, 0, 40, 40);
    assert_eq!(destroyed(&widgets), 0);

    // A refresh sweep also drops renderers and canvas associations.
    timeline.set_last_clean(mins(10) + secs(11));
    timeline.at(mins(11) + secs(11));
    assert!(caches.clean(true));
    assert_lens(&caches, 0, 20, 20);
    assert_eq!(destroyed(&widgets), 20);
    assert!(widgets[..20].iter().all(|w| w.stats().destroyed() == 1));

    timeline.at(mins(11) + secs(22));
    assert!(caches.clean(true));
    assert_lens(&caches, 0, 0, 0);
    assert_eq!(destroyed(&widgets), 40);
}

#[test]
fn skipped_refresh_clean_is_honoured_by_next_plain_clean() {
    let timeline = Timeline::new();
    let caches = timeline.caches();

    timeline.set_last_clean(mins(13) + secs(10));
    timeline.at(mins(13) + secs(10));
    assert!(!caches.has_skipped_refresh_clean());

    let widget = TestWidget::simple();
    caches.renderers().renderer(&widget.object());

    timeline.at(mins(13) + secs(15));
    assert!(!caches.clean(true));
    assert!(caches.has_skipped_refresh_clean());
    assert_eq!(caches.renderers().len(), 1);

    timeline.at(mins(14) + secs(21));
    assert!(caches.clean(false));
    assert!(!caches.has_skipped_refresh_clean());
    assert_eq!(
        caches.last_clean(),
        Some(timeline.clock().instant_at(mins(14) + secs(21)))
    );
    assert_eq!(caches.renderers().len(), 0);
    assert_eq!(widget.stats().destroyed(), 1);
}

#[test]
fn clean_canvas_drops_only_that_canvas() {
    let timeline = Timeline::new();
    let caches = timeline.caches();
    let first = CanvasId::next();
    let second = CanvasId::next();

    let mut widgets = Vec::new();
    for (canvas, count) in [(first, 20), (second, 22)] {
        for _ in 0..count {
            let widget = TestWidget::simple();
            caches.renderers().renderer(&widget.object());
            caches.canvases().set_canvas_for_object(&widget.object(), canvas);
            widgets.push(widget);
        }
    }
    assert_eq!(caches.renderers().len(), 42);
    assert_eq!(caches.canvases().len(), 42);

    caches.clean_canvas(first);
    assert_eq!(caches.renderers().len(), 22);
    assert_eq!(caches.canvases().len(), 22);
    assert_eq!(caches.canvases().count_for(second), 22);
    assert_eq!(destroyed(&widgets), 20);

    caches.clean_canvas(second);
    assert_eq!(caches.renderers().len(), 0);
    assert_eq!(caches.canvases().len(), 0);
    assert_eq!(destroyed(&widgets), 42);
}

#[test]
fn canvas_teardown_keeps_a_skipped_refresh_for_the_next_sweep() {
    let timeline = Timeline::new();
    let caches = timeline.caches();
    let closed = CanvasId::next();

    let widget = TestWidget::simple();
    caches.renderers().renderer(&widget.object());

    timeline.set_last_clean(mins(13) + secs(10));
    timeline.at(mins(13) + secs(15));
    assert!(!caches.clean(true));
    assert!(caches.has_skipped_refresh_clean());

    timeline.at(mins(13) + secs(21));
    caches.clean_canvas(closed);
    assert!(caches.has_skipped_refresh_clean());
    assert_eq!(caches.renderers().len(), 1);

    assert!(caches.clean(false));
    assert!(!caches.has_skipped_refresh_clean());
    assert_eq!(caches.renderers().len(), 0);
    assert_eq!(widget.stats().destroyed(), 1);
}
