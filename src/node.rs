//! The grouping tree node and the traversal contract.
//!
//! A `Node` is either a real filesystem entry (a leaf) or a synthetic
//! grouping key (a decimal year, month, or day). Children are held in an
//! ordered `Vec`; the depth-first walk visits siblings in reverse insertion
//! order, which is the sibling order the printed tree and the placement
//! engine observe.

use crate::dates::GroupDate;

/// A node in the grouping tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Entry name for leaves; a decimal date component for synthetic nodes.
    pub name: String,
    /// The captured date, stored on synthetic nodes too for provenance.
    pub date: GroupDate,
    children: Vec<Node>,
}

impl Node {
    /// Creates a node with no children.
    pub fn new(name: impl Into<String>, date: GroupDate) -> Self {
        Self {
            name: name.into(),
            date,
            children: Vec::new(),
        }
    }

    /// Adds a child unconditionally. Callers that need unique names per
    /// level use [`Node::child_or_insert`] instead.
    pub fn add_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Returns true if this node has at least one child.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// The children in insertion order. Traversal order is the reverse.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Linear scan of the immediate children (not recursive) for an exact
    /// name match.
    pub fn find_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns the child with the given name, inserting a new one dated
    /// `date` if absent. This get-or-create is what guarantees at most one
    /// synthetic node per distinct grouping key at each level.
    pub fn child_or_insert(&mut self, name: &str, date: GroupDate) -> &mut Node {
        let position = match self.children.iter().position(|child| child.name == name) {
            Some(position) => position,
            None => {
                self.children.push(Node::new(name, date));
                self.children.len() - 1
            }
        };
        &mut self.children[position]
    }

    /// Depth-first walk: the visitor sees this node, then each child
    /// recurses at `depth + 1`. Children are visited newest-first;
    /// `is_last` is true for the final sibling a visitor will see at its
    /// level.
    pub fn visit(&self, visitor: &mut dyn NodeVisitor, depth: usize, is_last: bool) {
        visitor.visit(self, depth, is_last);
        let count = self.children.len();
        for (offset, child) in self.children.iter().rev().enumerate() {
            child.visit(visitor, depth + 1, offset + 1 == count);
        }
    }
}

/// The single capability every tree walker implements.
pub trait NodeVisitor {
    /// Called once per node. `depth` is 0 for the root and grows by one
    /// per hop; `is_last` marks the final sibling in traversal order.
    fn visit(&mut self, node: &Node, depth: usize, is_last: bool);
}

/// Fans a single walk out to several visitors, node by node, in order.
pub struct MultiVisitor<'a> {
    visitors: Vec<&'a mut dyn NodeVisitor>,
}

impl<'a> MultiVisitor<'a> {
    pub fn new(visitors: Vec<&'a mut dyn NodeVisitor>) -> Self {
        Self { visitors }
    }
}

impl NodeVisitor for MultiVisitor<'_> {
    fn visit(&mut self, node: &Node, depth: usize, is_last: bool) {
        for visitor in self.visitors.iter_mut() {
            visitor.visit(node, depth, is_last);
        }
    }
}
