//! Tree-sitter based Apex parser front-end.
//!
//! Apex shares its statement and expression syntax with Java, so the
//! tree-sitter Java grammar is used to build the concrete parse tree.
//! Apex-only syntax is first lowered into Java shapes of the same length
//! (see [`lowering`]). Anything still outside the grammar comes back as
//! ERROR nodes, which the engine walks past without producing mutants.

pub mod lowering;
pub mod queries;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser as TsParser, Tree};

use crate::core::{Error, Result};

/// Thread-safe Apex parser.
pub struct ApexParser {
    parser: Mutex<Option<TsParser>>,
}

impl Default for ApexParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ApexParser {
    /// Create a new parser. The grammar is loaded lazily on first use.
    pub fn new() -> Self {
        Self {
            parser: Mutex::new(None),
        }
    }

    /// Parse Apex source text.
    pub fn parse(&self, source: &str) -> Result<ParseResult> {
        self.parse_named("<source>", source)
    }

    /// Parse Apex source text, using `name` in error messages.
    ///
    /// The tree is built from the lowered text; [`ParseResult::source`]
    /// keeps the original, which has identical offsets.
    pub fn parse_named(&self, name: &str, source: &str) -> Result<ParseResult> {
        let lowered = lowering::lower(source);
        let tree = {
            let mut guard = self.parser.lock();
            if guard.is_none() {
                let mut p = TsParser::new();
                p.set_language(&tree_sitter_java::LANGUAGE.into())
                    .map_err(|e| Error::Parse {
                        source_name: name.to_string(),
                        message: e.to_string(),
                    })?;
                *guard = Some(p);
            }
            let parser = guard.as_mut().ok_or_else(|| Error::Parse {
                source_name: name.to_string(),
                message: "parser unavailable".to_string(),
            })?;

            parser.parse(&lowered, None).ok_or_else(|| Error::Parse {
                source_name: name.to_string(),
                message: "Failed to parse source".to_string(),
            })?
        };

        let token_starts = collect_token_starts(&tree);

        Ok(ParseResult {
            tree: Arc::new(tree),
            source: source.to_string(),
            name: name.to_string(),
            token_starts,
        })
    }
}

/// Position of one lexical token in the source.
///
/// `stop_offset` is inclusive: the token covers
/// `source[start_offset..=stop_offset]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPosition {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column (0-indexed, in bytes).
    pub column: u32,
    /// Ordinal of the token in source order.
    pub token_index: usize,
    /// Byte offset of the first character.
    pub start_offset: usize,
    /// Byte offset of the last character.
    pub stop_offset: usize,
}

/// Result of parsing a source unit.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed syntax tree.
    pub tree: Arc<Tree>,
    /// Original source content.
    pub source: String,
    /// Name used in diagnostics.
    pub name: String,
    /// Start byte of every leaf token, in source order.
    token_starts: Vec<usize>,
}

impl ParseResult {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node.
    pub fn node_text(&self, node: &Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Text from the start of `start` to the end of `end`.
    pub fn range_text(&self, start: &Node<'_>, end: &Node<'_>) -> &str {
        self.source
            .get(start.start_byte()..end.end_byte())
            .unwrap_or("")
    }

    /// Ordinal of the token starting at (or enclosing) `byte`.
    pub fn token_index_at(&self, byte: usize) -> usize {
        match self.token_starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// Position of the first token of `node`.
    pub fn start_token(&self, node: &Node<'_>) -> TokenPosition {
        self.token_position(&first_leaf(*node))
    }

    /// Position of the last token of `node`.
    pub fn end_token(&self, node: &Node<'_>) -> TokenPosition {
        self.token_position(&last_leaf(*node))
    }

    fn token_position(&self, leaf: &Node<'_>) -> TokenPosition {
        let start = leaf.start_position();
        TokenPosition {
            line: start.row as u32 + 1,
            column: start.column as u32,
            token_index: self.token_index_at(leaf.start_byte()),
            start_offset: leaf.start_byte(),
            stop_offset: leaf.end_byte().saturating_sub(1).max(leaf.start_byte()),
        }
    }

    /// Whether the tree contains syntax errors.
    pub fn has_errors(&self) -> bool {
        self.root_node().has_error()
    }
}

/// Line (1-indexed) on which a node starts.
pub fn start_line(node: &Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// Walk to the first leaf beneath `node`.
pub fn first_leaf(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while let Some(child) = current.child(0) {
        current = child;
    }
    current
}

/// Walk to the last leaf beneath `node`.
pub fn last_leaf(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while current.child_count() > 0 {
        match current.child(current.child_count() - 1) {
            Some(child) => current = child,
            None => break,
        }
    }
    current
}

/// Find the nearest ancestor (or self) whose kind is in `kinds`.
pub fn find_ancestor<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = Some(node);
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Named children of a node, collected.
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children of a node, collected.
pub fn children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn collect_token_starts(tree: &Tree) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut cursor = tree.walk();

    loop {
        let node = cursor.node();
        if node.child_count() == 0 && node.end_byte() > node.start_byte() {
            starts.push(node.start_byte());
        }

        if cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                starts.sort_unstable();
                starts.dedup();
                return starts;
            }
        }
    }
}
