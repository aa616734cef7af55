//! Nested clip regions for scrollable content.

use smallvec::SmallVec;
use trellis_ui_graphics::{Point, Rect, Size};

/// One level of a [`ClipStack`], always contained in every level below it.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ClipItem {
    pub position: Point,
    pub size: Size,
}

impl ClipItem {
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

impl From<Rect> for ClipItem {
    fn from(rect: Rect) -> Self {
        ClipItem {
            position: rect.origin(),
            size: rect.size(),
        }
    }
}

/// Stack of clip rectangles. An empty stack means no clipping.
#[derive(Clone, Debug, Default)]
pub struct ClipStack {
    items: SmallVec<[ClipItem; 4]>,
}

impl ClipStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the intersection of the requested rectangle and the current top.
    pub fn push(&mut self, position: Point, size: Size) -> ClipItem {
        let requested = Rect::from_origin_size(position, size);
        let item = match self.items.last() {
            Some(top) => ClipItem::from(top.rect().intersect(&requested)),
            None => ClipItem { position, size },
        };
        self.items.push(item);
        item
    }

    pub fn pop(&mut self) -> Option<ClipItem> {
        self.items.pop()
    }

    pub fn top(&self) -> Option<ClipItem> {
        self.items.last().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_onto_empty_keeps_request() {
        let mut stack = ClipStack::new();
        let item = stack.push(Point::new(-5.0, 3.0), Size::new(10.0, 20.0));
        assert_eq!(item.position, Point::new(-5.0, 3.0));
        assert_eq!(item.size, Size::new(10.0, 20.0));
        assert_eq!(stack.top(), Some(item));
    }

    #[test]
    fn push_intersects_with_top() {
        let mut stack = ClipStack::new();
        stack.push(Point::new(5.0, 25.0), Size::new(100.0, 100.0));
        let item = stack.push(Point::new(25.0, 0.0), Size::new(50.0, 50.0));
        assert_eq!(item.position, Point::new(25.0, 25.0));
        assert_eq!(item.size, Size::new(50.0, 25.0));
    }

    #[test]
    fn push_past_far_edge_is_clipped() {
        let mut stack = ClipStack::new();
        stack.push(Point::new(0.0, 0.0), Size::new(50.0, 50.0));
        let item = stack.push(Point::new(40.0, 10.0), Size::new(30.0, 100.0));
        assert_eq!(item.position, Point::new(40.0, 10.0));
        assert_eq!(item.size, Size::new(10.0, 40.0));
    }

    #[test]
    fn pop_returns_what_push_returned() {
        let mut stack = ClipStack::new();
        let a = stack.push(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
        let b = stack.push(Point::new(10.0, 10.0), Size::new(20.0, 20.0));
        let c = stack.push(Point::new(15.0, 0.0), Size::new(100.0, 12.0));
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some(c));
        assert_eq!(stack.pop(), Some(b));
        assert_eq!(stack.top(), Some(a));
        assert_eq!(stack.pop(), Some(a));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }
}
