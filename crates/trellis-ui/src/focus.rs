//! Keyboard focus within one region of a canvas.

use crate::cache::Caches;
use crate::object::{is_disabled, ObjectId, ObjectRef, WeakObjectRef};
use crate::walker::{
    reverse_walk_visible_object_tree, visit_before, walk_complete_object_tree,
    walk_visible_object_tree, ObjectVisitor,
};
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use trellis_ui_graphics::{Point, Size};

/// Form factor of the device, used by the disabled-text focus rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceKind {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceKind {
    pub fn is_mobile(self) -> bool {
        self == DeviceKind::Mobile
    }
}

/// Result of [`FocusManager::focus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusOutcome {
    /// The target is not part of this region. Nothing changed.
    Unreachable,
    /// The target sits below a hidden ancestor. Accepted, nothing changed.
    Deferred,
    /// The target cannot take focus right now. Accepted, nothing changed.
    Ignored,
    /// The target is (now) focused, or focus was cleared.
    Focused,
}

impl FocusOutcome {
    /// True when the region owns the target, whether or not focus moved.
    pub fn is_accepted(self) -> bool {
        self != FocusOutcome::Unreachable
    }
}

/// Tracks the focused object of one region and moves focus along walk order.
pub struct FocusManager {
    content: ObjectRef,
    caches: Arc<Caches>,
    device: DeviceKind,
    focused: Option<WeakObjectRef>,
}

impl FocusManager {
    pub fn new(content: ObjectRef, caches: Arc<Caches>, device: DeviceKind) -> Self {
        Self {
            content,
            caches,
            device,
            focused: None,
        }
    }

    pub fn content(&self) -> &ObjectRef {
        &self.content
    }

    /// Focuses `target`, or clears focus when `target` is `None`.
    pub fn focus(&mut self, target: Option<&ObjectRef>) -> FocusOutcome {
        let Some(target) = target else {
            self.set_focused(None);
            return FocusOutcome::Focused;
        };

        match self.reachability(target) {
            Reach::NotFound => return FocusOutcome::Unreachable,
            Reach::Hidden => return FocusOutcome::Deferred,
            Reach::Visible => {}
        }
        if target.as_focusable().is_none() {
            return FocusOutcome::Ignored;
        }
        if is_disabled(target.as_ref()) {
            let copyable = target.as_selectable_text().is_some() && !self.device.is_mobile();
            if !copyable {
                return FocusOutcome::Ignored;
            }
        }
        self.set_focused(Some(target.clone()));
        FocusOutcome::Focused
    }

    pub fn focused(&self) -> Option<ObjectRef> {
        self.focused.as_ref().and_then(Weak::upgrade)
    }

    /// Moves focus to the next enabled focusable, wrapping to the first.
    pub fn focus_next(&mut self) -> Option<ObjectRef> {
        let next = self.next_in_chain(false);
        self.set_focused(next.clone());
        next
    }

    /// Moves focus to the previous enabled focusable, wrapping to the last.
    pub fn focus_previous(&mut self) -> Option<ObjectRef> {
        let previous = self.next_in_chain(true);
        self.set_focused(previous.clone());
        previous
    }

    /// Tells the focused object that its region gained focus.
    pub fn focus_gained(&self) {
        if let Some(focused) = self.focused() {
            if let Some(focusable) = focused.as_focusable() {
                focusable.focus_gained();
            }
        }
    }

    /// Tells the focused object that its region lost focus.
    pub fn focus_lost(&self) {
        if let Some(focused) = self.focused() {
            if let Some(focusable) = focused.as_focusable() {
                focusable.focus_lost();
            }
        }
    }

    fn set_focused(&mut self, object: Option<ObjectRef>) {
        let current = self.focused();
        let same = match (&current, &object) {
            (Some(a), Some(b)) => ObjectId::of(a) == ObjectId::of(b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        if let Some(old) = current.as_ref().and_then(|o| o.as_focusable()) {
            old.focus_lost();
        }
        self.focused = object.as_ref().map(Arc::downgrade);
        if let Some(new) = object.as_ref().and_then(|o| o.as_focusable()) {
            new.focus_gained();
        }
    }

    fn reachability(&self, target: &ObjectRef) -> Reach {
        let mut visitor = ReachVisitor {
            target: ObjectId::of(target),
            hidden_ancestor: None,
            hidden: false,
        };
        if !walk_complete_object_tree(&self.content, &self.caches, &mut visitor) {
            Reach::NotFound
        } else if visitor.hidden {
            Reach::Hidden
        } else {
            Reach::Visible
        }
    }

    fn next_in_chain(&self, reverse: bool) -> Option<ObjectRef> {
        let current = self.focused().map(|o| ObjectId::of(&o));
        let mut found = current.is_none();
        let mut next: Option<ObjectRef> = None;
        let mut visitor = visit_before(|object: &ObjectRef, _: Point, _: Point, _: Size| {
            if is_disabled(object.as_ref()) || object.as_focusable().is_none() {
                return ControlFlow::Continue(());
            }
            if found {
                next = Some(object.clone());
                return ControlFlow::Break(());
            }
            if next.is_none() {
                next = Some(object.clone());
            }
            if Some(ObjectId::of(object)) == current {
                found = true;
            }
            ControlFlow::Continue(())
        });
        if reverse {
            reverse_walk_visible_object_tree(&self.content, &self.caches, &mut visitor);
        } else {
            walk_visible_object_tree(&self.content, &self.caches, &mut visitor);
        }
        drop(visitor);
        next
    }
}

enum Reach {
    NotFound,
    Hidden,
    Visible,
}

struct ReachVisitor {
    target: ObjectId,
    hidden_ancestor: Option<ObjectId>,
    hidden: bool,
}

impl ObjectVisitor for ReachVisitor {
    fn before_children(
        &mut self,
        object: &ObjectRef,
        _position: Point,
        _clip_position: Point,
        _clip_size: Size,
    ) -> ControlFlow<()> {
        let id = ObjectId::of(object);
        if self.hidden_ancestor.is_none() && !object.visible() {
            self.hidden_ancestor = Some(id);
        }
        if id == self.target {
            self.hidden = self.hidden_ancestor.is_some();
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn after_children(&mut self, object: &ObjectRef, _parent: Option<&ObjectRef>) {
        if self.hidden_ancestor == Some(ObjectId::of(object)) {
            self.hidden_ancestor = None;
        }
    }
}
