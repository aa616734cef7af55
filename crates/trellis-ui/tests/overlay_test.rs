use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use trellis_testing::{TestObject, Timeline};
use trellis_ui::{same_object, CanvasObject, DeviceKind, OverlayStack, Point, Rect, Size};

fn stack() -> (OverlayStack, Arc<AtomicUsize>) {
    let timeline = Timeline::new();
    let mut stack = OverlayStack::new(Arc::clone(timeline.caches()), DeviceKind::Desktop);
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    stack.set_on_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (stack, changes)
}

#[test]
fn removing_an_overlay_drops_everything_above_it() {
    let (mut stack, changes) = stack();
    let overlays: Vec<_> = (1..=5)
        .map(|i| TestObject::leaf(format!("o{i}"), 10.0, 10.0))
        .collect();
    for overlay in &overlays {
        stack.add(overlay.object(), Rect::from_size(Size::new(100.0, 100.0)));
    }
    assert_eq!(stack.len(), 5);
    assert!(same_object(stack.top().unwrap(), &overlays[4].object()));
    assert_eq!(changes.load(Ordering::SeqCst), 5);

    assert!(stack.remove(&overlays[1].object()));
    assert_eq!(stack.len(), 1);
    assert!(same_object(stack.top().unwrap(), &overlays[0].object()));
    assert_eq!(stack.list_focus_managers().count(), 1);
    assert_eq!(changes.load(Ordering::SeqCst), 6);

    assert!(!stack.remove(&overlays[3].object()));
    assert_eq!(changes.load(Ordering::SeqCst), 6);

    assert!(stack.remove(&overlays[0].object()));
    assert!(stack.is_empty());
    assert!(stack.top().is_none());
    assert!(stack.top_focus_manager().is_none());
}

#[test]
fn entries_keep_object_focus_and_tree_together() {
    let (mut stack, _) = stack();
    let first = TestObject::leaf("first", 10.0, 10.0);
    let second = TestObject::leaf("second", 10.0, 10.0);
    stack.add(first.object(), Rect::default());
    stack.add(second.object(), Rect::default());

    for entry in stack.entries() {
        assert!(same_object(entry.object(), entry.focus_manager().content()));
        assert!(same_object(entry.object(), entry.render_tree().root_object()));
    }
    let listed = stack.list();
    assert!(same_object(&listed[0], &first.object()));
    assert!(same_object(&listed[1], &second.object()));
    assert!(same_object(
        stack.top_focus_manager().unwrap().content(),
        &second.object()
    ));
}

#[test]
fn full_screen_overlay_fills_interactive_area() {
    let (mut stack, _) = stack();
    let popup = TestObject::builder("popup")
        .size(10.0, 10.0)
        .fills_interactive_area()
        .build();
    let plain = TestObject::builder("plain").at(3.0, 4.0).size(10.0, 10.0).build();
    let area = Rect::from_origin_size(Point::new(0.0, 24.0), Size::new(320.0, 456.0));

    stack.add(popup.object(), area);
    stack.add(plain.object(), area);

    assert_eq!(popup.position(), Point::new(0.0, 24.0));
    assert_eq!(popup.size(), Size::new(320.0, 456.0));
    assert_eq!(plain.position(), Point::new(3.0, 4.0));
    assert_eq!(plain.size(), Size::new(10.0, 10.0));
}
