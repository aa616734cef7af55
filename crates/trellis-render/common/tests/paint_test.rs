use std::sync::Arc;
use trellis_render_common::{paint_canvas, repaint, FrameOutcome};
use trellis_testing::{init_test_logging, PaintOp, RecordingPainter, TestObject, Timeline};
use trellis_ui::{Canvas, CanvasOptions, ObjectId, Point, Size};

#[test]
fn nested_scrollables_open_and_close_clips_in_pairs() {
    init_test_logging();
    let timeline = Timeline::new();
    let mut canvas = Canvas::new(Arc::clone(timeline.caches()), CanvasOptions::default());

    let item = TestObject::builder("item").at(5.0, 5.0).size(10.0, 10.0).build();
    let inner = TestObject::builder("inner")
        .at(25.0, 0.0)
        .size(50.0, 50.0)
        .children(vec![item.object()])
        .scroll()
        .build();
    let after = TestObject::leaf("after", 10.0, 10.0);
    let outer = TestObject::builder("outer")
        .at(5.0, 25.0)
        .size(100.0, 100.0)
        .children(vec![inner.object()])
        .scroll()
        .build();
    let root = TestObject::container("root", vec![outer.object(), after.object()]);
    canvas.set_content(root.object());

    let (mut painter, log) = RecordingPainter::new();
    paint_canvas(&mut canvas, &mut painter);

    let id = |o: &Arc<TestObject>| ObjectId::of(&o.object());
    assert_eq!(
        log.ops(),
        vec![
            PaintOp::Clear,
            PaintOp::Paint { object: id(&root), position: Point::ZERO },
            PaintOp::StartClipping {
                position: Point::new(5.0, 25.0),
                size: Size::new(100.0, 100.0),
            },
            PaintOp::Paint { object: id(&outer), position: Point::new(5.0, 25.0) },
            PaintOp::StartClipping {
                position: Point::new(30.0, 25.0),
                size: Size::new(50.0, 50.0),
            },
            PaintOp::Paint { object: id(&inner), position: Point::new(30.0, 25.0) },
            PaintOp::Paint { object: id(&item), position: Point::new(35.0, 30.0) },
            PaintOp::StartClipping {
                position: Point::new(5.0, 25.0),
                size: Size::new(100.0, 100.0),
            },
            PaintOp::StopClipping,
            PaintOp::Paint { object: id(&after), position: Point::ZERO },
        ]
    );
}

#[test]
fn repaint_paints_only_when_dirty() {
    let timeline = Timeline::new();
    let mut canvas = Canvas::new(Arc::clone(timeline.caches()), CanvasOptions::default());
    let (painter, log) = RecordingPainter::new();
    canvas.set_painter(Box::new(painter));
    let leaf = TestObject::leaf("leaf", 10.0, 10.0);
    canvas.set_content(TestObject::container("root", vec![leaf.object()]).object());
    canvas.resize(Size::new(100.0, 100.0));

    let first = repaint(&mut canvas);
    assert!(first.painted);
    assert_eq!(log.painted().len(), 2);
    assert!(canvas.painter().is_some());

    log.clear();
    assert_eq!(repaint(&mut canvas), FrameOutcome::default());
    assert!(log.ops().is_empty());

    canvas.refresh(&leaf.object());
    let refreshed = repaint(&mut canvas);
    assert!(refreshed.painted);
    assert_eq!(refreshed.drained, 1);
    assert_eq!(log.freed(), vec![(ObjectId::of(&leaf.object()), None)]);
    assert_eq!(log.painted_at(&leaf.object()), Some(Point::ZERO));
}

#[test]
fn repaint_without_painter_still_clears_the_frame() {
    let timeline = Timeline::new();
    let mut canvas = Canvas::new(Arc::clone(timeline.caches()), CanvasOptions::default());
    canvas.set_content(TestObject::leaf("leaf", 1.0, 1.0).object());

    let outcome = repaint(&mut canvas);
    assert!(!outcome.painted);
    assert!(!canvas.is_dirty());
}
