//! Structural equality for syntax trees.
//!
//! `structure_eq` compares trees ignoring surface hints: fields that locate a
//! node in its source but don't affect what the function computes.
//!
//! # Hint Fields (ignored during comparison)
//!
//! - `SyntaxNode::span`
//! - `ExceptHandler::span`
//!
//! # Core Fields (must match exactly)
//!
//! - All names, literals, operators
//! - Control flow structure
//! - Expression trees

use super::{ExceptHandler, Keyword, Node, SyntaxNode, WithItem};

/// Trait for structural equality comparison.
///
/// Unlike `PartialEq`, this ignores source positions, so a tree built by
/// hand compares equal to the same tree read from source.
pub trait StructureEq {
    /// Compare two values for structural equality.
    fn structure_eq(&self, other: &Self) -> bool;
}

impl StructureEq for SyntaxNode {
    fn structure_eq(&self, other: &Self) -> bool {
        self.node.structure_eq(&other.node)
    }
}

impl<T: StructureEq + ?Sized> StructureEq for Box<T> {
    fn structure_eq(&self, other: &Self) -> bool {
        (**self).structure_eq(&**other)
    }
}

impl<T: StructureEq> StructureEq for Option<T> {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.structure_eq(b),
            _ => false,
        }
    }
}

impl<T: StructureEq> StructureEq for [T] {
    fn structure_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.structure_eq(b))
    }
}

impl<T: StructureEq> StructureEq for Vec<T> {
    fn structure_eq(&self, other: &Self) -> bool {
        self.as_slice().structure_eq(other.as_slice())
    }
}

impl StructureEq for Node {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Module(a), Node::Module(b)) => a.body.structure_eq(&b.body),

            (Node::FunctionDef(a), Node::FunctionDef(b)) => {
                a.name == b.name && a.params == b.params && a.body.structure_eq(&b.body)
            }

            (Node::Return(a), Node::Return(b)) | (Node::Raise(a), Node::Raise(b)) => {
                a.structure_eq(b)
            }

            (Node::Assign(a), Node::Assign(b)) => {
                a.target.structure_eq(&b.target) && a.value.structure_eq(&b.value)
            }

            (Node::AugAssign(a), Node::AugAssign(b)) => {
                a.op == b.op && a.target.structure_eq(&b.target) && a.value.structure_eq(&b.value)
            }

            (Node::ExprStmt(a), Node::ExprStmt(b)) => a.structure_eq(b),

            (Node::If(a), Node::If(b)) => {
                a.test.structure_eq(&b.test)
                    && a.body.structure_eq(&b.body)
                    && a.orelse.structure_eq(&b.orelse)
            }

            (Node::While(a), Node::While(b)) => {
                a.test.structure_eq(&b.test) && a.body.structure_eq(&b.body)
            }

            (Node::For(a), Node::For(b)) => {
                a.target.structure_eq(&b.target)
                    && a.iter.structure_eq(&b.iter)
                    && a.body.structure_eq(&b.body)
            }

            (Node::Pass, Node::Pass) => true,
            (Node::Break, Node::Break) => true,
            (Node::Continue, Node::Continue) => true,

            (Node::Try(a), Node::Try(b)) => {
                a.body.structure_eq(&b.body)
                    && a.handlers.structure_eq(&b.handlers)
                    && a.finalbody.structure_eq(&b.finalbody)
            }

            (Node::With(a), Node::With(b)) => {
                a.items.structure_eq(&b.items) && a.body.structure_eq(&b.body)
            }

            (Node::ClassDef(a), Node::ClassDef(b)) => {
                a.name == b.name && a.bases.structure_eq(&b.bases) && a.body.structure_eq(&b.body)
            }

            // Imports carry no child nodes
            (Node::Import(a), Node::Import(b)) => a == b,

            (Node::Name(a), Node::Name(b)) => a == b,
            (Node::Constant(a), Node::Constant(b)) => a == b,

            (Node::BinOp(a), Node::BinOp(b)) => {
                a.op == b.op && a.left.structure_eq(&b.left) && a.right.structure_eq(&b.right)
            }

            (Node::UnaryOp(a), Node::UnaryOp(b)) => {
                a.op == b.op && a.operand.structure_eq(&b.operand)
            }

            (Node::Compare(a), Node::Compare(b)) => {
                a.ops == b.ops
                    && a.left.structure_eq(&b.left)
                    && a.comparators.structure_eq(&b.comparators)
            }

            (Node::BoolOp(a), Node::BoolOp(b)) => a.op == b.op && a.values.structure_eq(&b.values),

            (Node::Call(a), Node::Call(b)) => {
                a.func.structure_eq(&b.func)
                    && a.args.structure_eq(&b.args)
                    && a.keywords.structure_eq(&b.keywords)
            }

            (Node::Attribute(a), Node::Attribute(b)) => {
                a.attr == b.attr && a.value.structure_eq(&b.value)
            }

            (Node::Subscript(a), Node::Subscript(b)) => {
                a.value.structure_eq(&b.value) && a.index.structure_eq(&b.index)
            }

            (Node::Slice(a), Node::Slice(b)) => {
                a.lower.structure_eq(&b.lower)
                    && a.upper.structure_eq(&b.upper)
                    && a.step.structure_eq(&b.step)
            }

            (Node::List(a), Node::List(b)) | (Node::Tuple(a), Node::Tuple(b)) => a.structure_eq(b),

            (Node::Dict(a), Node::Dict(b)) => {
                a.entries.len() == b.entries.len()
                    && a.entries
                        .iter()
                        .zip(&b.entries)
                        .all(|((k1, v1), (k2, v2))| k1.structure_eq(k2) && v1.structure_eq(v2))
            }

            (Node::IfExp(a), Node::IfExp(b)) => {
                a.test.structure_eq(&b.test)
                    && a.body.structure_eq(&b.body)
                    && a.orelse.structure_eq(&b.orelse)
            }

            (Node::Lambda(a), Node::Lambda(b)) => {
                a.params == b.params && a.body.structure_eq(&b.body)
            }

            _ => false,
        }
    }
}

impl StructureEq for ExceptHandler {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.exception.structure_eq(&other.exception)
            && self.body.structure_eq(&other.body)
    }
}

impl StructureEq for WithItem {
    fn structure_eq(&self, other: &Self) -> bool {
        self.alias == other.alias && self.context.structure_eq(&other.context)
    }
}

impl StructureEq for Keyword {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value.structure_eq(&other.value)
    }
}
