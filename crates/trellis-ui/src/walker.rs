//! Depth-first traversal of the object graph.
//!
//! Walks report each object's absolute position and the clip rectangle that
//! applies to it. Containers contribute their child list; widgets contribute
//! the objects of their (cached) renderer.

use crate::cache::Caches;
use crate::object::{children_of, ObjectId, ObjectRef};
use std::ops::ControlFlow;
use trellis_ui_graphics::{Point, Rect, Size};

/// Callbacks invoked by the walk functions.
///
/// Breaking from [`ObjectVisitor::before_children`] cancels the walk: the
/// object's children and its own `after_children` are skipped, but every
/// ancestor still receives `after_children` on the way back up.
pub trait ObjectVisitor {
    fn before_children(
        &mut self,
        _object: &ObjectRef,
        _position: Point,
        _clip_position: Point,
        _clip_size: Size,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn after_children(&mut self, _object: &ObjectRef, _parent: Option<&ObjectRef>) {}
}

/// Adapts a pair of closures into an [`ObjectVisitor`].
pub struct FnVisitor<B, A> {
    pub before: B,
    pub after: A,
}

impl<B, A> ObjectVisitor for FnVisitor<B, A>
where
    B: FnMut(&ObjectRef, Point, Point, Size) -> ControlFlow<()>,
    A: FnMut(&ObjectRef, Option<&ObjectRef>),
{
    fn before_children(
        &mut self,
        object: &ObjectRef,
        position: Point,
        clip_position: Point,
        clip_size: Size,
    ) -> ControlFlow<()> {
        (self.before)(object, position, clip_position, clip_size)
    }

    fn after_children(&mut self, object: &ObjectRef, parent: Option<&ObjectRef>) {
        (self.after)(object, parent)
    }
}

type NoAfter = fn(&ObjectRef, Option<&ObjectRef>);

/// A visitor with only a pre-order callback.
pub fn visit_before<B>(before: B) -> FnVisitor<B, NoAfter>
where
    B: FnMut(&ObjectRef, Point, Point, Size) -> ControlFlow<()>,
{
    FnVisitor {
        before,
        after: |_, _| {},
    }
}

#[derive(Clone, Copy)]
struct Walk {
    reverse: bool,
    require_visible: bool,
}

/// Walks visible objects front to back. Returns true if the walk was cancelled.
pub fn walk_visible_object_tree<V>(root: &ObjectRef, caches: &Caches, visitor: &mut V) -> bool
where
    V: ObjectVisitor + ?Sized,
{
    let walk = Walk {
        reverse: false,
        require_visible: true,
    };
    walk_object(root, None, Point::ZERO, None, walk, caches, visitor)
}

/// Walks visible objects with children visited last to first.
pub fn reverse_walk_visible_object_tree<V>(
    root: &ObjectRef,
    caches: &Caches,
    visitor: &mut V,
) -> bool
where
    V: ObjectVisitor + ?Sized,
{
    let walk = Walk {
        reverse: true,
        require_visible: true,
    };
    walk_object(root, None, Point::ZERO, None, walk, caches, visitor)
}

/// Walks every object regardless of visibility.
pub fn walk_complete_object_tree<V>(root: &ObjectRef, caches: &Caches, visitor: &mut V) -> bool
where
    V: ObjectVisitor + ?Sized,
{
    let walk = Walk {
        reverse: false,
        require_visible: false,
    };
    walk_object(root, None, Point::ZERO, None, walk, caches, visitor)
}

fn walk_object<V>(
    object: &ObjectRef,
    parent: Option<&ObjectRef>,
    offset: Point,
    clip: Option<Rect>,
    walk: Walk,
    caches: &Caches,
    visitor: &mut V,
) -> bool
where
    V: ObjectVisitor + ?Sized,
{
    if walk.require_visible && !object.visible() {
        return false;
    }
    let position = object.position() + offset;
    let children = children_of(object, caches);

    let clip = if object.as_scrollable().is_some() {
        let own = Rect::from_origin_size(position, object.size());
        Some(match clip {
            Some(outer) => outer.intersect(&own),
            None => own,
        })
    } else {
        clip
    };
    let (clip_position, clip_size) = match clip {
        Some(rect) => (rect.origin(), rect.size()),
        None => (Point::ZERO, Size::UNBOUNDED),
    };

    if visitor
        .before_children(object, position, clip_position, clip_size)
        .is_break()
    {
        return true;
    }

    let mut cancelled = false;
    let count = children.len();
    for i in 0..count {
        let child = if walk.reverse {
            &children[count - 1 - i]
        } else {
            &children[i]
        };
        if walk_object(child, Some(object), position, clip, walk, caches, visitor) {
            cancelled = true;
            break;
        }
    }

    visitor.after_children(object, parent);
    cancelled
}

/// Absolute position of `object` within the first of `trees` containing it.
///
/// Returns the origin when no tree contains the object.
pub fn absolute_position_for_object(
    object: &ObjectRef,
    trees: &[ObjectRef],
    caches: &Caches,
) -> Point {
    let target = ObjectId::of(object);
    let mut found = Point::ZERO;
    let mut visitor = visit_before(|walked: &ObjectRef, position, _, _| {
        if ObjectId::of(walked) == target {
            found = position;
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    for tree in trees {
        if walk_visible_object_tree(tree, caches, &mut visitor) {
            break;
        }
    }
    found
}

/// Result of a hit test.
#[derive(Clone)]
pub struct Hit {
    pub object: ObjectRef,
    /// The hit point relative to the object's origin.
    pub position: Point,
    /// 1-based index of the root the object was found under, 0 for an overlay.
    pub layer: usize,
}

struct HitVisitor<M> {
    point: Point,
    matches: M,
    found: Option<(ObjectRef, Point)>,
}

impl<M: FnMut(&ObjectRef) -> bool> ObjectVisitor for HitVisitor<M> {
    fn before_children(
        &mut self,
        object: &ObjectRef,
        position: Point,
        clip_position: Point,
        clip_size: Size,
    ) -> ControlFlow<()> {
        let point = self.point;
        let clip = Rect::from_origin_size(clip_position, clip_size);
        let bounds = Rect::from_origin_size(position, object.size());
        if object.visible()
            && clip.contains(point.x, point.y)
            && bounds.contains(point.x, point.y)
            && (self.matches)(object)
        {
            // Later hits paint above earlier ones.
            self.found = Some((object.clone(), point - position));
        }
        ControlFlow::Continue(())
    }
}

/// Finds the topmost visible object under `point` accepted by `matches`.
///
/// When `overlay` is given only that tree is searched. Otherwise each of
/// `roots` is searched in order until one yields a match.
pub fn find_object_at_position_matching(
    point: Point,
    matches: impl FnMut(&ObjectRef) -> bool,
    overlay: Option<&ObjectRef>,
    roots: &[ObjectRef],
    caches: &Caches,
) -> Option<Hit> {
    let mut visitor = HitVisitor {
        point,
        matches,
        found: None,
    };

    let mut layer = 0;
    if let Some(overlay) = overlay {
        walk_visible_object_tree(overlay, caches, &mut visitor);
    } else {
        for root in roots {
            layer += 1;
            walk_visible_object_tree(root, caches, &mut visitor);
            if visitor.found.is_some() {
                break;
            }
        }
    }

    visitor.found.map(|(object, position)| Hit {
        object,
        position,
        layer,
    })
}
