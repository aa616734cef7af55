use std::sync::Arc;
use trellis_testing::{TestObject, Timeline};
use trellis_ui::{same_object, DeviceKind, FocusManager, FocusOutcome, ObjectRef};

fn focusable(name: &str) -> Arc<TestObject> {
    TestObject::builder(name).size(10.0, 10.0).focusable().build()
}

fn manager(content: &Arc<TestObject>, device: DeviceKind) -> FocusManager {
    let timeline = Timeline::new();
    FocusManager::new(content.object(), Arc::clone(timeline.caches()), device)
}

fn is(actual: Option<ObjectRef>, expected: &Arc<TestObject>) -> bool {
    actual.is_some_and(|actual| same_object(&actual, &expected.object()))
}

#[test]
fn focus_next_and_previous_wrap_around() {
    let a = focusable("a");
    let b = focusable("b");
    let c = focusable("c");
    let content = TestObject::container("root", vec![a.object(), b.object(), c.object()]);
    let mut focus = manager(&content, DeviceKind::Desktop);

    assert!(is(focus.focus_next(), &a));
    assert!(is(focus.focus_next(), &b));
    assert!(is(focus.focus_next(), &c));
    assert!(is(focus.focus_next(), &a));
    assert!(is(focus.focused(), &a));

    assert!(is(focus.focus_previous(), &c));
    assert!(is(focus.focus_previous(), &b));
}

#[test]
fn focus_chain_skips_disabled_and_hidden() {
    let a = focusable("a");
    let b = TestObject::builder("b").focusable().disabled(true).build();
    let hidden = TestObject::builder("hidden").focusable().hidden().build();
    let c = focusable("c");
    let plain = TestObject::leaf("label", 5.0, 5.0);
    let content = TestObject::container(
        "root",
        vec![a.object(), b.object(), hidden.object(), plain.object(), c.object()],
    );
    let mut focus = manager(&content, DeviceKind::Desktop);

    assert!(is(focus.focus_next(), &a));
    assert!(is(focus.focus_next(), &c));
    assert!(is(focus.focus_next(), &a));
}

#[test]
fn empty_chain_clears_focus() {
    let content = TestObject::container("root", vec![TestObject::leaf("x", 1.0, 1.0).object()]);
    let mut focus = manager(&content, DeviceKind::Desktop);
    assert!(focus.focus_next().is_none());
    assert!(focus.focused().is_none());
}

#[test]
fn focus_outcomes() {
    let a = focusable("a");
    let label = TestObject::leaf("label", 5.0, 5.0);
    let nested = focusable("nested");
    let group = TestObject::builder("group")
        .children(vec![nested.object()])
        .hidden()
        .build();
    let content = TestObject::container("root", vec![a.object(), label.object(), group.object()]);
    let outsider = focusable("outsider");
    let mut focus = manager(&content, DeviceKind::Desktop);

    assert_eq!(focus.focus(Some(&outsider.object())), FocusOutcome::Unreachable);
    assert_eq!(focus.focus(Some(&nested.object())), FocusOutcome::Deferred);
    assert!(focus.focused().is_none());
    assert_eq!(focus.focus(Some(&label.object())), FocusOutcome::Ignored);
    assert!(focus.focused().is_none());

    assert_eq!(focus.focus(Some(&a.object())), FocusOutcome::Focused);
    assert!(is(focus.focused(), &a));
    assert_eq!(focus.focus(None), FocusOutcome::Focused);
    assert!(focus.focused().is_none());
    assert!(!FocusOutcome::Unreachable.is_accepted());
    assert!(FocusOutcome::Deferred.is_accepted());
}

#[test]
fn disabled_selectable_text_is_focusable_on_desktop_only() {
    let text = TestObject::builder("text")
        .focusable()
        .selectable_text()
        .disabled(true)
        .build();
    let entry = TestObject::builder("entry").focusable().disabled(true).build();
    let content = TestObject::container("root", vec![text.object(), entry.object()]);

    let mut desktop = manager(&content, DeviceKind::Desktop);
    assert_eq!(desktop.focus(Some(&entry.object())), FocusOutcome::Ignored);
    assert_eq!(desktop.focus(Some(&text.object())), FocusOutcome::Focused);

    let mut mobile = manager(&content, DeviceKind::Mobile);
    assert_eq!(mobile.focus(Some(&text.object())), FocusOutcome::Ignored);
    assert!(mobile.focused().is_none());
}

#[test]
fn moving_focus_notifies_both_objects() {
    let a = focusable("a");
    let b = focusable("b");
    let content = TestObject::container("root", vec![a.object(), b.object()]);
    let mut focus = manager(&content, DeviceKind::Desktop);

    focus.focus(Some(&a.object()));
    assert_eq!(a.focus_gained_count(), 1);

    // Refocusing the same object is a no-op.
    focus.focus(Some(&a.object()));
    assert_eq!(a.focus_gained_count(), 1);

    focus.focus(Some(&b.object()));
    assert_eq!(a.focus_lost_count(), 1);
    assert_eq!(b.focus_gained_count(), 1);

    focus.focus_lost();
    assert_eq!(b.focus_lost_count(), 1);
    focus.focus_gained();
    assert_eq!(b.focus_gained_count(), 2);

    focus.focus(None);
    assert_eq!(b.focus_lost_count(), 2);
}
