//! Traits for readers, visitors, transpilers and backends, and the errors
//! they report.

use crate::ast::{
    Assign, Attribute, AugAssign, BinOp, BoolOp, Call, ClassDef, Compare, Dict, For, FunctionDef,
    If, IfExp, Import, Lambda, Literal, Module, NodeKind, Slice, Span, Subscript, SyntaxNode, Try,
    UnaryOp, While, With,
};
use crate::config::{ConfigError, TranspileConfig};
use crate::task::Task;
use crate::transpiler::Construction;
use std::fmt;

/// Error that can occur when reading source code into a syntax tree.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported syntax at {span}: {kind}")]
    Unsupported { kind: String, span: Span },

    #[error("expected {expected}, got {got}")]
    UnexpectedNode { expected: String, got: String },

    #[error("no function named `{0}` in source")]
    FunctionNotFound(String),
}

/// Error that aborts a transpilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranspileError {
    /// No handler produced a fragment for this node.
    #[error("transformation rule for {kind} at {span} is not implemented")]
    UnimplementedTransformation { kind: NodeKind, span: Span },
}

impl TranspileError {
    pub fn unimplemented(node: &SyntaxNode) -> Self {
        TranspileError::UnimplementedTransformation {
            kind: node.kind(),
            span: node.span,
        }
    }

    /// Kind of the node that could not be transformed.
    pub fn kind(&self) -> NodeKind {
        match self {
            TranspileError::UnimplementedTransformation { kind, .. } => *kind,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TranspileError::UnimplementedTransformation { span, .. } => *span,
        }
    }
}

/// Any error surfaced by the crate's top-level entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Transpile(#[from] TranspileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no backend named `{0}`")]
    UnknownBackend(String),
}

/// A reader parses source code into a syntax tree rooted at a `Module`.
pub trait Reader: Send + Sync {
    /// Language identifier (e.g., "python").
    fn language(&self) -> &'static str;

    /// File extensions this reader handles (e.g., &["py"]).
    fn extensions(&self) -> &'static [&'static str];

    /// Parse source code into a syntax tree.
    fn read(&self, source: &str) -> Result<SyntaxNode, ReadError>;
}

/// Result of one handler: a fragment, or `None` when the handler has no rule
/// for the node it was given.
pub type Visit<F> = Result<Option<F>, TranspileError>;

/// Per-kind handlers, one for each [`NodeKind`].
///
/// Every handler defaults to "no result", which [`walk`](crate::walk) turns
/// into [`TranspileError::UnimplementedTransformation`]. A backend overrides
/// the handlers for the kinds it supports and recurses into children with
/// `walk`.
pub trait Visitor {
    /// What a single node translates to.
    type Fragment;

    fn visit_module(&mut self, _span: Span, _node: &Module) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_function_def(&mut self, _span: Span, _node: &FunctionDef) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_return(&mut self, _span: Span, _value: Option<&SyntaxNode>) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_assign(&mut self, _span: Span, _node: &Assign) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_aug_assign(&mut self, _span: Span, _node: &AugAssign) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_expr_stmt(&mut self, _span: Span, _expr: &SyntaxNode) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_if(&mut self, _span: Span, _node: &If) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_while(&mut self, _span: Span, _node: &While) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_for(&mut self, _span: Span, _node: &For) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_pass(&mut self, _span: Span) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_break(&mut self, _span: Span) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_continue(&mut self, _span: Span) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_try(&mut self, _span: Span, _node: &Try) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_with(&mut self, _span: Span, _node: &With) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_raise(&mut self, _span: Span, _exception: Option<&SyntaxNode>) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_class_def(&mut self, _span: Span, _node: &ClassDef) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_import(&mut self, _span: Span, _node: &Import) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_name(&mut self, _span: Span, _id: &str) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_constant(&mut self, _span: Span, _value: &Literal) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_bin_op(&mut self, _span: Span, _node: &BinOp) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_unary_op(&mut self, _span: Span, _node: &UnaryOp) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_compare(&mut self, _span: Span, _node: &Compare) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_bool_op(&mut self, _span: Span, _node: &BoolOp) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_call(&mut self, _span: Span, _node: &Call) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_attribute(&mut self, _span: Span, _node: &Attribute) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_subscript(&mut self, _span: Span, _node: &Subscript) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_slice(&mut self, _span: Span, _node: &Slice) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_list(&mut self, _span: Span, _items: &[SyntaxNode]) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_tuple(&mut self, _span: Span, _items: &[SyntaxNode]) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_dict(&mut self, _span: Span, _node: &Dict) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_if_exp(&mut self, _span: Span, _node: &IfExp) -> Visit<Self::Fragment> {
        Ok(None)
    }

    fn visit_lambda(&mut self, _span: Span, _node: &Lambda) -> Visit<Self::Fragment> {
        Ok(None)
    }
}

/// A transpiler: visitor state that holds a complete translation once
/// [`build_transpiler`](crate::build_transpiler) returns it.
///
/// `Display` renders the accumulated target representation.
pub trait Transpiler: Visitor + fmt::Display + Sized {
    /// Create empty target state. The [`Construction`] token can only be
    /// obtained inside `build_transpiler`, so every instance callers see has
    /// been through [`transpile`](Transpiler::transpile).
    fn new(cx: Construction<'_>) -> Self;

    /// Translate the task's syntax tree into the target state.
    fn transpile(&mut self, root: &SyntaxNode) -> Result<(), TranspileError>;
}

/// A transpiler behind a name, for lookup through the registry.
pub trait Backend: Send + Sync {
    /// Unique backend identifier (e.g., "physl").
    fn name(&self) -> &'static str;

    /// File extension for generated output (e.g., "physl").
    fn extension(&self) -> &'static str;

    /// Transpile a task and render the result.
    fn transpile(&self, task: &Task, config: &TranspileConfig) -> Result<String, TranspileError>;
}
