//! Tree-sitter based CST parser for C++ source code.
//!
//! Provides precise byte-range information for safe code rewriting.

use tree_sitter::{Node, Parser, Tree};

/// A parsed CST tree together with the source it was parsed from.
pub struct CstTree {
    tree: Tree,
    /// Original source code
    pub source: String,
}

impl CstTree {
    /// Root node of the CST
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Extract a slice of source code by byte range.
    ///
    /// Returns an empty string for ranges that are out of bounds or split a
    /// character.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.source.get(start..end).unwrap_or("")
    }

    /// Source text covered by `node`
    #[must_use]
    pub fn text(&self, node: Node<'_>) -> &str {
        self.slice(node.start_byte(), node.end_byte())
    }

    /// Whether the parser had to recover from syntax errors anywhere
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.root().has_error()
    }

    /// Find all nodes of a specific kind, in document order
    #[must_use]
    pub fn find_by_kind(&self, kind: &str) -> Vec<Node<'_>> {
        let mut result = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if node.kind() == kind {
                result.push(node);
            }
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        result
    }
}

impl std::fmt::Debug for CstTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CstTree")
            .field("root", &self.root().kind())
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// Error during CST parsing
#[derive(Debug, thiserror::Error)]
pub enum CstError {
    /// Failed to create parser
    #[error("Failed to create CST parser: {0}")]
    ParserCreation(String),
    /// Failed to parse source
    #[error("Failed to parse source as C++")]
    ParseFailed,
}

/// Tree-sitter based CST parser
pub struct CstParser {
    parser: Parser,
}

impl CstParser {
    /// Create a new CST parser for C++
    ///
    /// # Errors
    /// Returns error if parser creation fails
    pub fn new() -> Result<Self, CstError> {
        let mut parser = Parser::new();

        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|e| CstError::ParserCreation(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Parse source code into a CST
    ///
    /// # Errors
    /// Returns error if parsing fails
    pub fn parse(&mut self, source: &str) -> Result<CstTree, CstError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(CstError::ParseFailed)?;

        Ok(CstTree {
            tree,
            source: source.to_owned(),
        })
    }
}
