use super::{Delimiter, DelimiterId};
use serde::{Deserialize, Serialize};
use texlint_syntax::{LinePositionTable, Position, Token};

/// Index of a node in a [`DocumentTree`]. The root is always `NodeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Default)]
struct Node {
    start: Option<DelimiterId>,
    end: Option<DelimiterId>,
    children: Vec<NodeId>,
}

/// The nesting of environments and groups, stored as an arena.
///
/// The stack holds the path from the root to the innermost open node.
/// Opening pushes a new child of the current node; closing pops it and
/// records the delimiter that closed it. The root has no start delimiter
/// and is never popped.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            stack: vec![NodeId(0)],
        }
    }

    pub fn open(&mut self, start: DelimiterId) {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            start: Some(start),
            ..Node::default()
        });
        let parent = self.current();
        self.nodes[parent.0].children.push(id);
        self.stack.push(id);
    }

    /// Pops the current node, returning its start delimiter. Returns `None`
    /// at the root.
    pub fn close(&mut self, end: Option<DelimiterId>) -> Option<DelimiterId> {
        if self.stack.len() == 1 {
            return None;
        }
        let node = self.stack.pop()?;
        self.nodes[node.0].end = end;
        self.nodes[node.0].start
    }

    fn nth_previous(&self, n: usize) -> Option<NodeId> {
        let len = self.stack.len();
        if n >= len {
            return None;
        }
        self.stack.get(len - n - 1).copied()
    }

    pub fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId(0))
    }

    /// Start delimiter of the innermost open node.
    pub fn current_delimiter(&self) -> Option<DelimiterId> {
        self.nodes[self.current().0].start
    }

    /// Start delimiter of the node enclosing the innermost one.
    pub fn previous_delimiter(&self) -> Option<DelimiterId> {
        self.nth_previous(1).and_then(|n| self.nodes[n.0].start)
    }

    /// Number of open nodes, not counting the root.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// One context per outermost node whose start delimiter is in math mode.
    pub fn contexts(&self, delimiters: &[Delimiter], lines: &LinePositionTable) -> Vec<Context> {
        let mut contexts = Vec::new();
        self.collect_contexts(NodeId(0), delimiters, lines, &mut contexts);
        contexts
    }

    fn collect_contexts(
        &self,
        id: NodeId,
        delimiters: &[Delimiter],
        lines: &LinePositionTable,
        out: &mut Vec<Context>,
    ) {
        let node = &self.nodes[id.0];
        let start = node
            .start
            .and_then(|id| delimiters.get(id.0))
            .filter(|d| d.math_mode.is_inside());
        if let Some(start) = start {
            let end = node
                .end
                .and_then(|id| delimiters.get(id.0))
                .map(|d| token_end(d.end_token(), lines));
            out.push(Context {
                kind: ContextKind::Math,
                range: ContextRange {
                    start: token_start(&start.token, lines),
                    end,
                },
            });
            return;
        }
        for &child in self.children(id) {
            self.collect_contexts(child, delimiters, lines, out);
        }
    }
}

fn token_start(token: &Token, lines: &LinePositionTable) -> Position {
    Position::new(token.line, lines.column(token.line, token.start()))
}

fn token_end(token: &Token, lines: &LinePositionTable) -> Position {
    let end = token.end().max(token.start() + 1);
    Position::new(token.line, lines.column(token.line, end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Math,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRange {
    pub start: Position,
    /// Absent when the region is still open at the end of the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
}

/// A maximal math-mode region of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(rename = "type")]
    pub kind: ContextKind,
    pub range: ContextRange,
}
