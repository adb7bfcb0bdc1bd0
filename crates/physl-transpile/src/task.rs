//! Tasks: a source function bundled with its parsed syntax tree.

use crate::ast::{Node, SyntaxNode};
use serde::{Deserialize, Serialize};

/// The original callable a task was built from.
///
/// Opaque to transpilers: they may read it for naming or diagnostics but the
/// syntax tree is the only thing they translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFn {
    name: String,
    source: String,
    line: usize,
}

impl SourceFn {
    pub fn new(name: impl Into<String>, source: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            line,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of the definition.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Line the definition starts on (1-based).
    pub fn line(&self) -> usize {
        self.line
    }
}

/// An immutable bundle of a source function and its syntax-tree root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    function: SourceFn,
    syntax_tree: SyntaxNode,
}

impl Task {
    pub fn new(function: SourceFn, syntax_tree: SyntaxNode) -> Self {
        Self {
            function,
            syntax_tree,
        }
    }

    /// Build a task from a hand-made tree, naming the function after the
    /// first `FunctionDef` found in it.
    pub fn from_tree(syntax_tree: SyntaxNode) -> Self {
        let name = syntax_tree
            .descendants()
            .find_map(|node| match &node.node {
                Node::FunctionDef(f) => Some(f.name.clone()),
                _ => None,
            })
            .unwrap_or_default();
        let line = syntax_tree.span.line;
        Self::new(SourceFn::new(name, String::new(), line), syntax_tree)
    }

    pub fn function(&self) -> &SourceFn {
        &self.function
    }

    pub fn syntax_tree(&self) -> &SyntaxNode {
        &self.syntax_tree
    }
}
