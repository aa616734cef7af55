//! Persistent shadow tree reconciled against the object graph on every walk.
//!
//! Nodes live in an arena owned by the tree. A walk reuses the node found at
//! each position when it still describes the same object and allocates a new
//! one otherwise. Nodes not reached by a walk are freed afterwards, dropping
//! whatever paint data the backend attached to them.

use crate::cache::Caches;
use crate::object::{ObjectId, ObjectRef, WeakObjectRef};
use crate::walker::{walk_visible_object_tree, ObjectVisitor};
use std::any::Any;
use std::ops::ControlFlow;
use std::sync::Arc;
use trellis_ui_graphics::{Point, Size};

/// Paint data slot contents. Owned by the backend that stored it.
pub type PaintData = Box<dyn Any + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

struct RenderNode {
    object_id: ObjectId,
    object: WeakObjectRef,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    min_size: Size,
    paint_data: Option<PaintData>,
    generation: u64,
}

/// A node as seen by a [`RenderVisitor`] during a walk.
pub struct NodeView<'a> {
    id: NodeId,
    object: &'a ObjectRef,
    parent_object: Option<ObjectRef>,
    node: &'a mut RenderNode,
}

impl<'a> NodeView<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn object(&self) -> &ObjectRef {
        self.object
    }

    /// Object of the parent node, `None` at the root.
    pub fn parent_object(&self) -> Option<&ObjectRef> {
        self.parent_object.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    /// Minimum size recorded by the last min-size pass.
    pub fn min_size(&self) -> Size {
        self.node.min_size
    }

    pub fn set_min_size(&mut self, size: Size) {
        self.node.min_size = size;
    }

    pub fn paint_data(&self) -> Option<&PaintData> {
        self.node.paint_data.as_ref()
    }

    pub fn set_paint_data(&mut self, data: Option<PaintData>) -> Option<PaintData> {
        std::mem::replace(&mut self.node.paint_data, data)
    }
}

/// Callbacks for [`RenderTree::walk`].
pub trait RenderVisitor {
    fn before_children(&mut self, _node: &mut NodeView<'_>, _position: Point) {}
    fn after_children(&mut self, _node: &mut NodeView<'_>) {}
}

impl<B, A> RenderVisitor for (B, A)
where
    B: FnMut(&mut NodeView<'_>, Point),
    A: FnMut(&mut NodeView<'_>),
{
    fn before_children(&mut self, node: &mut NodeView<'_>, position: Point) {
        (self.0)(node, position)
    }

    fn after_children(&mut self, node: &mut NodeView<'_>) {
        (self.1)(node)
    }
}

/// Render-cache tree for one region (content, menu, window head or overlay).
pub struct RenderTree {
    root_object: ObjectRef,
    nodes: Vec<Option<RenderNode>>,
    free: Vec<usize>,
    root: NodeId,
    generation: u64,
}

impl RenderTree {
    pub fn new(root_object: ObjectRef) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            generation: 0,
            root_object: Arc::clone(&root_object),
        };
        tree.root = tree.alloc(None, &root_object);
        tree
    }

    pub fn root_object(&self) -> &ObjectRef {
        &self.root_object
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Walks the visible objects under the root, reconciling nodes, and calls
    /// `visitor` for every node in walk order.
    pub fn walk<V>(&mut self, caches: &Caches, visitor: &mut V)
    where
        V: RenderVisitor + ?Sized,
    {
        self.generation += 1;
        let root_object = Arc::clone(&self.root_object);
        let root = self.root;
        let generation = self.generation;
        if let Some(node) = self.node_mut(root) {
            node.generation = generation;
        }

        let mut reconciler = Reconciler {
            tree: self,
            visitor,
            node: Some(root),
            parent: None,
            prev: None,
        };
        walk_visible_object_tree(&root_object, caches, &mut reconciler);
        self.prune();
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.first_child
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.next_sibling
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        let mut cursor = self.first_child(node);
        while let Some(child) = cursor {
            children.push(child);
            cursor = self.next_sibling(child);
        }
        children
    }

    pub fn object(&self, node: NodeId) -> Option<ObjectRef> {
        self.node(node)?.object.upgrade()
    }

    pub fn min_size(&self, node: NodeId) -> Option<Size> {
        self.node(node).map(|n| n.min_size)
    }

    pub fn paint_data(&self, node: NodeId) -> Option<&PaintData> {
        self.node(node)?.paint_data.as_ref()
    }

    /// The node currently describing `object`, if any.
    pub fn node_for(&self, object: &ObjectRef) -> Option<NodeId> {
        let id = ObjectId::of(object);
        self.nodes.iter().enumerate().find_map(|(index, slot)| {
            slot.as_ref()
                .filter(|node| node.object_id == id)
                .map(|_| NodeId(index))
        })
    }

    fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, parent: Option<NodeId>, object: &ObjectRef) -> NodeId {
        let node = RenderNode {
            object_id: ObjectId::of(object),
            object: Arc::downgrade(object),
            parent,
            first_child: None,
            next_sibling: None,
            min_size: Size::ZERO,
            paint_data: None,
            generation: self.generation,
        };
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Frees nodes the last walk did not reach and unlinks them.
    fn prune(&mut self) {
        let generation = self.generation;
        let mut freed = 0;
        for index in 0..self.nodes.len() {
            let stale = matches!(&self.nodes[index], Some(node) if node.generation != generation);
            if stale {
                self.nodes[index] = None;
                self.free.push(index);
                freed += 1;
            }
        }
        if freed == 0 {
            return;
        }
        let live = |nodes: &[Option<RenderNode>], link: Option<NodeId>| {
            link.filter(|id| nodes.get(id.0).is_some_and(Option::is_some))
        };
        for index in 0..self.nodes.len() {
            let (first_child, next_sibling) = match &self.nodes[index] {
                Some(node) => (
                    live(self.nodes.as_slice(), node.first_child),
                    live(self.nodes.as_slice(), node.next_sibling),
                ),
                None => continue,
            };
            if let Some(node) = self.nodes[index].as_mut() {
                node.first_child = first_child;
                node.next_sibling = next_sibling;
            }
        }
        log::trace!("render tree pruned {freed} nodes");
    }
}

/// Drives a [`RenderVisitor`] while keeping the arena in step with the walk.
struct Reconciler<'t, V: ?Sized> {
    tree: &'t mut RenderTree,
    visitor: &'t mut V,
    node: Option<NodeId>,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
}

impl<'t, V: RenderVisitor + ?Sized> Reconciler<'t, V> {
    fn parent_of(&self, id: Option<NodeId>) -> Option<NodeId> {
        id.and_then(|id| self.tree.node(id)).and_then(|n| n.parent)
    }

    fn view_and_call(
        &mut self,
        id: NodeId,
        object: &ObjectRef,
        call: impl FnOnce(&mut V, &mut NodeView<'_>),
    ) {
        let parent_object = self.parent_of(Some(id)).and_then(|p| self.tree.object(p));
        let Some(node) = self.tree.node_mut(id) else {
            return;
        };
        let mut view = NodeView {
            id,
            object,
            parent_object,
            node,
        };
        call(&mut *self.visitor, &mut view);
    }
}

impl<'t, V: RenderVisitor + ?Sized> ObjectVisitor for Reconciler<'t, V> {
    fn before_children(
        &mut self,
        object: &ObjectRef,
        position: Point,
        _clip_position: Point,
        _clip_size: Size,
    ) -> ControlFlow<()> {
        let object_id = ObjectId::of(object);
        if let Some(current) = self.node {
            let matches = self
                .tree
                .node(current)
                .is_some_and(|n| n.object_id == object_id);
            if !matches {
                if let Some(parent) = self.parent.and_then(|p| self.tree.node_mut(p)) {
                    if parent.first_child == Some(current) {
                        parent.first_child = None;
                    }
                }
                self.node = None;
            }
        }

        let id = match self.node {
            Some(id) => id,
            None => {
                let id = self.tree.alloc(self.parent, object);
                let parent_has_child = self
                    .parent
                    .and_then(|p| self.tree.node(p))
                    .is_some_and(|p| p.first_child.is_some());
                if !parent_has_child {
                    if let Some(parent) = self.parent.and_then(|p| self.tree.node_mut(p)) {
                        parent.first_child = Some(id);
                    }
                } else if let Some(prev) = self.prev.and_then(|p| self.tree.node_mut(p)) {
                    prev.next_sibling = Some(id);
                }
                id
            }
        };
        let generation = self.tree.generation;
        if let Some(node) = self.tree.node_mut(id) {
            node.generation = generation;
        }
        if self.prev.is_some() && self.parent_of(self.prev) != self.parent {
            self.prev = None;
        }

        self.view_and_call(id, object, |visitor, view| {
            visitor.before_children(view, position)
        });

        self.parent = Some(id);
        self.node = self.tree.first_child(id);
        ControlFlow::Continue(())
    }

    fn after_children(&mut self, object: &ObjectRef, _parent: Option<&ObjectRef>) {
        let Some(id) = self.parent else {
            return;
        };
        self.parent = self.parent_of(Some(id));
        if self.prev.is_some() && self.parent_of(self.prev) != self.parent {
            if let Some(prev) = self.prev.and_then(|p| self.tree.node_mut(p)) {
                prev.next_sibling = None;
            }
        }

        self.view_and_call(id, object, |visitor, view| visitor.after_children(view));

        self.prev = Some(id);
        self.node = self.tree.next_sibling(id);
    }
}
