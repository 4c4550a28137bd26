//! Immutable concrete-syntax-tree arena.
//!
//! The external parser produces a raw syntax tree which the AST builders
//! traverse. Instead of a shared mutable cursor, the tree is
//! stored as an arena of nodes with child-id lists: builders recurse over
//! `&[NodeId]` slices and never mutate traversal state, so there is no
//! depth-balance invariant to maintain and no rewind step in destructuring.
//!
//! Node kinds are plain strings. The builders match kind names and byte
//! ranges only; no grammar-specific recognition happens here.

/// Index of a node in the [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single concrete-syntax-tree node: a kind name, a byte range into the
/// original source, and the ids of its children in source order.
///
/// Leaf nodes (tokens such as `,`, `[`, keywords, numbers, identifiers) have
/// no children; their text is recovered by slicing the source with the byte
/// range.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SyntaxNode {
    kind: String,
    start: usize,
    end: usize,
    children: Vec<NodeId>,
}

/// An immutable concrete syntax tree.
///
/// Produced once by [`TreeBuilder`] and then only read. All queries are by
/// [`NodeId`]; the root is the first node the builder opened.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Returns the root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the syntactic kind name of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].kind
    }

    /// Returns the byte offset where the node's span starts.
    #[must_use]
    pub fn start(&self, id: NodeId) -> usize {
        self.nodes[id.index()].start
    }

    /// Returns the byte offset just past the node's span.
    #[must_use]
    pub fn end(&self, id: NodeId) -> usize {
        self.nodes[id.index()].end
    }

    /// Returns the node's children in source order (empty for tokens).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Returns the source text spanned by the node.
    ///
    /// Falls back to the empty string if the recorded span does not lie on
    /// char boundaries of `source`, rather than panicking on foreign input.
    #[must_use]
    pub fn text<'s>(&self, id: NodeId, source: &'s str) -> &'s str {
        let node = &self.nodes[id.index()];
        source.get(node.start..node.end).unwrap_or("")
    }
}

/// Builder for [`SyntaxTree`], the seam the external concrete parser plugs
/// into.
///
/// Usage follows the usual green-tree builder protocol: `start_node` opens an
/// interior node, `token` records a leaf with an explicit byte range, and
/// `finish_node` closes the innermost open node, computing its span from its
/// children.
///
/// Trees are capped at `u32::MAX` nodes, the range of [`NodeId`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<SyntaxNode>,
    stack: Vec<NodeId>,
    /// High-water byte offset, used to give childless interior nodes
    /// (e.g. an empty `ParamList`) a zero-length span at the current point.
    offset: usize,
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an interior node. Its byte range is derived from its children
    /// when [`Self::finish_node`] is called.
    pub fn start_node(&mut self, kind: impl Into<String>) {
        let id = self.push(SyntaxNode {
            kind: kind.into(),
            start: self.offset,
            end: self.offset,
            children: Vec::new(),
        });
        self.stack.push(id);
    }

    /// Records a leaf token with an explicit byte range.
    pub fn token(&mut self, kind: impl Into<String>, start: usize, end: usize) {
        self.push(SyntaxNode {
            kind: kind.into(),
            start,
            end,
            children: Vec::new(),
        });
        self.offset = self.offset.max(end);
    }

    /// Closes the innermost open node, setting its span to cover its children.
    pub fn finish_node(&mut self) {
        let Some(id) = self.stack.pop() else {
            debug_assert!(false, "finish_node without matching start_node");
            return;
        };
        let children = self.nodes[id.index()].children.clone();
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            self.nodes[id.index()].start = self.nodes[first.index()].start;
            self.nodes[id.index()].end = self.nodes[last.index()].end;
        }
    }

    /// Consumes the builder and returns the finished tree.
    #[must_use]
    pub fn finish(self) -> SyntaxTree {
        debug_assert!(self.stack.is_empty(), "unbalanced start_node/finish_node");
        SyntaxTree { nodes: self.nodes }
    }

    fn push(&mut self, node: SyntaxNode) -> NodeId {
        debug_assert!(self.nodes.len() < u32::MAX as usize, "node count exceeds NodeId capacity");
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        if let Some(&parent) = self.stack.last() {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }
}
