use std::sync::Arc;

use crate::error::{Path, Segment};
use crate::metadata::ClassDef;
use crate::types::TypeDescriptor;

/// A handle to a node of a [`DecodeContext`]. Handles never own the node
/// they refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(usize);

/// One in-progress value.
#[derive(Debug)]
pub struct Node {
    ty: TypeDescriptor,
    declaring: Option<Arc<ClassDef>>,
    parent: Option<NodeId>,
    segment: Option<Segment>,
}

impl Node {
    /// The value's resolved type.
    #[must_use]
    pub const fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// The enclosing value.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// If this value's type is a generic user class, the argument bound to
    /// the type parameter `name`. A class used without arguments binds every
    /// parameter to the unconstrained type.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<TypeDescriptor> {
        let index = self.declaring.as_ref()?.type_param_index(name)?;
        Some(self.ty.argument_or_any(index))
    }
}

/// The chain of in-progress values of one decode call.
///
/// Nodes live in an arena and refer to their parent by [`NodeId`]. Nodes are
/// released in stack order as each value completes.
#[derive(Debug, Default)]
pub struct DecodeContext {
    nodes: Vec<Node>,
}

impl DecodeContext {
    /// Returns an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a value nested inside the current one.
    pub fn enter(
        &mut self,
        ty: TypeDescriptor,
        declaring: Option<Arc<ClassDef>>,
        segment: Option<Segment>,
    ) -> NodeId {
        let parent = self.current();
        self.nodes.push(Node {
            ty,
            declaring,
            parent,
            segment,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Completes the value `id` and every value nested inside it.
    pub fn exit(&mut self, id: NodeId) {
        self.nodes.truncate(id.0);
    }

    /// The innermost in-progress value.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.nodes.len().checked_sub(1).map(NodeId)
    }

    /// Returns the node for `id`, if it is still in progress.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// The number of in-progress values.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    fn segments_from(&self, start: Option<NodeId>) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut cursor = start;
        while let Some(node) = cursor.and_then(|id| self.node(id)) {
            if let Some(segment) = &node.segment {
                segments.push(segment.clone());
            }
            cursor = node.parent;
        }
        segments.reverse();
        segments
    }

    /// The path of the innermost in-progress value.
    #[must_use]
    pub fn path(&self) -> Path {
        self.segments_from(self.current()).into_iter().collect()
    }

    /// The path of a child of the innermost value that has not been entered.
    #[must_use]
    pub fn path_with(&self, child: Option<&Segment>) -> Path {
        let mut segments = self.segments_from(self.current());
        segments.extend(child.cloned());
        segments.into_iter().collect()
    }
}
