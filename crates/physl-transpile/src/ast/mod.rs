//! Syntax tree for Python functions.
//!
//! Every node is a [`SyntaxNode`]: a source [`Span`] plus a [`Node`], the
//! closed set of kinds the readers produce and the backends dispatch on.
//! Field names follow Python's `ast` module so the tree reads like the
//! source it came from.
//!
//! # Surface hints
//!
//! Spans are surface hints: they locate a node for diagnostics and position
//! tags but do not change what the node means. [`StructureEq`] compares trees
//! while ignoring them.

mod structure_eq;

pub use structure_eq::StructureEq;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of a node: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A node in the syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub span: Span,
    pub node: Node,
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    // Statements
    Module(Module),
    FunctionDef(FunctionDef),
    Return(Option<Box<SyntaxNode>>),
    Assign(Assign),
    AugAssign(AugAssign),
    ExprStmt(Box<SyntaxNode>),
    If(If),
    While(While),
    For(For),
    Pass,
    Break,
    Continue,
    Try(Try),
    With(With),
    Raise(Option<Box<SyntaxNode>>),
    ClassDef(ClassDef),
    Import(Import),

    // Expressions
    Name(String),
    Constant(Literal),
    BinOp(BinOp),
    UnaryOp(UnaryOp),
    Compare(Compare),
    BoolOp(BoolOp),
    Call(Call),
    Attribute(Attribute),
    Subscript(Subscript),
    Slice(Slice),
    List(Vec<SyntaxNode>),
    Tuple(Vec<SyntaxNode>),
    Dict(Dict),
    IfExp(IfExp),
    Lambda(Lambda),
}

/// Field-less discriminant of [`Node`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Module,
    FunctionDef,
    Return,
    Assign,
    AugAssign,
    ExprStmt,
    If,
    While,
    For,
    Pass,
    Break,
    Continue,
    Try,
    With,
    Raise,
    ClassDef,
    Import,
    Name,
    Constant,
    BinOp,
    UnaryOp,
    Compare,
    BoolOp,
    Call,
    Attribute,
    Subscript,
    Slice,
    List,
    Tuple,
    Dict,
    IfExp,
    Lambda,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::FunctionDef => "FunctionDef",
            NodeKind::Return => "Return",
            NodeKind::Assign => "Assign",
            NodeKind::AugAssign => "AugAssign",
            NodeKind::ExprStmt => "Expr",
            NodeKind::If => "If",
            NodeKind::While => "While",
            NodeKind::For => "For",
            NodeKind::Pass => "Pass",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Try => "Try",
            NodeKind::With => "With",
            NodeKind::Raise => "Raise",
            NodeKind::ClassDef => "ClassDef",
            NodeKind::Import => "Import",
            NodeKind::Name => "Name",
            NodeKind::Constant => "Constant",
            NodeKind::BinOp => "BinOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::Compare => "Compare",
            NodeKind::BoolOp => "BoolOp",
            NodeKind::Call => "Call",
            NodeKind::Attribute => "Attribute",
            NodeKind::Subscript => "Subscript",
            NodeKind::Slice => "Slice",
            NodeKind::List => "List",
            NodeKind::Tuple => "Tuple",
            NodeKind::Dict => "Dict",
            NodeKind::IfExp => "IfExp",
            NodeKind::Lambda => "Lambda",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    pub target: Box<SyntaxNode>,
    pub value: Box<SyntaxNode>,
}

/// `target op= value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugAssign {
    pub target: Box<SyntaxNode>,
    pub op: Operator,
    pub value: Box<SyntaxNode>,
}

/// `if test: body else: orelse`. An `elif` is a nested `If` as the sole
/// statement of `orelse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    pub test: Box<SyntaxNode>,
    pub body: Vec<SyntaxNode>,
    pub orelse: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct While {
    pub test: Box<SyntaxNode>,
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct For {
    pub target: Box<SyntaxNode>,
    pub iter: Box<SyntaxNode>,
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Try {
    pub body: Vec<SyntaxNode>,
    pub handlers: Vec<ExceptHandler>,
    pub finalbody: Vec<SyntaxNode>,
}

/// `except exception as name: body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    pub span: Span,
    pub exception: Option<SyntaxNode>,
    pub name: Option<String>,
    pub body: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct With {
    pub items: Vec<WithItem>,
    pub body: Vec<SyntaxNode>,
}

/// `context as alias`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithItem {
    pub context: SyntaxNode,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<SyntaxNode>,
    pub body: Vec<SyntaxNode>,
}

/// `import a as b` when `module` is `None`, `from module import a as b`
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub module: Option<String>,
    pub names: Vec<Alias>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinOp {
    pub left: Box<SyntaxNode>,
    pub op: Operator,
    pub right: Box<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryOp {
    pub op: UnaryOperator,
    pub operand: Box<SyntaxNode>,
}

/// Chained comparison: `left ops[0] comparators[0] ops[1] comparators[1] ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compare {
    pub left: Box<SyntaxNode>,
    pub ops: Vec<CmpOp>,
    pub comparators: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolOp {
    pub op: BoolOperator,
    pub values: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub func: Box<SyntaxNode>,
    pub args: Vec<SyntaxNode>,
    pub keywords: Vec<Keyword>,
}

/// Keyword argument `name=value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    pub value: SyntaxNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub value: Box<SyntaxNode>,
    pub attr: String,
}

/// `value[index]`. A multi-dimensional index is a `Tuple`, a range a `Slice`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscript {
    pub value: Box<SyntaxNode>,
    pub index: Box<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub lower: Option<Box<SyntaxNode>>,
    pub upper: Option<Box<SyntaxNode>>,
    pub step: Option<Box<SyntaxNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dict {
    pub entries: Vec<(SyntaxNode, SyntaxNode)>,
}

/// `body if test else orelse`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfExp {
    pub test: Box<SyntaxNode>,
    pub body: Box<SyntaxNode>,
    pub orelse: Box<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Box<SyntaxNode>,
}

/// Literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Binary arithmetic and bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mult => "*",
            Operator::MatMult => "@",
            Operator::Div => "/",
            Operator::FloorDiv => "//",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitAnd => "&",
        }
    }

    /// Parse an operator symbol. Accepts the augmented form (`+=`) as well.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol.strip_suffix('=').unwrap_or(symbol) {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mult,
            "@" => Operator::MatMult,
            "/" => Operator::Div,
            "//" => Operator::FloorDiv,
            "%" => Operator::Mod,
            "**" => Operator::Pow,
            "<<" => Operator::LShift,
            ">>" => Operator::RShift,
            "|" => Operator::BitOr,
            "^" => Operator::BitXor,
            "&" => Operator::BitAnd,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Invert,
    Not,
    UAdd,
    USub,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Invert => "~",
            UnaryOperator::Not => "not",
            UnaryOperator::UAdd => "+",
            UnaryOperator::USub => "-",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "~" => Some(UnaryOperator::Invert),
            "not" => Some(UnaryOperator::Not),
            "+" => Some(UnaryOperator::UAdd),
            "-" => Some(UnaryOperator::USub),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }

    /// Parse a comparison operator. Multi-word operators may arrive with
    /// arbitrary whitespace between the words.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let words: Vec<&str> = symbol.split_whitespace().collect();
        let op = match words.as_slice() {
            ["=="] => CmpOp::Eq,
            ["!="] => CmpOp::NotEq,
            ["<"] => CmpOp::Lt,
            ["<="] => CmpOp::LtE,
            [">"] => CmpOp::Gt,
            [">="] => CmpOp::GtE,
            ["is"] => CmpOp::Is,
            ["is", "not"] => CmpOp::IsNot,
            ["in"] => CmpOp::In,
            ["not", "in"] => CmpOp::NotIn,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOperator {
    And,
    Or,
}

impl BoolOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            BoolOperator::And => "and",
            BoolOperator::Or => "or",
        }
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Module(_) => NodeKind::Module,
            Node::FunctionDef(_) => NodeKind::FunctionDef,
            Node::Return(_) => NodeKind::Return,
            Node::Assign(_) => NodeKind::Assign,
            Node::AugAssign(_) => NodeKind::AugAssign,
            Node::ExprStmt(_) => NodeKind::ExprStmt,
            Node::If(_) => NodeKind::If,
            Node::While(_) => NodeKind::While,
            Node::For(_) => NodeKind::For,
            Node::Pass => NodeKind::Pass,
            Node::Break => NodeKind::Break,
            Node::Continue => NodeKind::Continue,
            Node::Try(_) => NodeKind::Try,
            Node::With(_) => NodeKind::With,
            Node::Raise(_) => NodeKind::Raise,
            Node::ClassDef(_) => NodeKind::ClassDef,
            Node::Import(_) => NodeKind::Import,
            Node::Name(_) => NodeKind::Name,
            Node::Constant(_) => NodeKind::Constant,
            Node::BinOp(_) => NodeKind::BinOp,
            Node::UnaryOp(_) => NodeKind::UnaryOp,
            Node::Compare(_) => NodeKind::Compare,
            Node::BoolOp(_) => NodeKind::BoolOp,
            Node::Call(_) => NodeKind::Call,
            Node::Attribute(_) => NodeKind::Attribute,
            Node::Subscript(_) => NodeKind::Subscript,
            Node::Slice(_) => NodeKind::Slice,
            Node::List(_) => NodeKind::List,
            Node::Tuple(_) => NodeKind::Tuple,
            Node::Dict(_) => NodeKind::Dict,
            Node::IfExp(_) => NodeKind::IfExp,
            Node::Lambda(_) => NodeKind::Lambda,
        }
    }
}

impl SyntaxNode {
    pub fn new(node: Node) -> Self {
        Self {
            span: Span::default(),
            node,
        }
    }

    /// Set the source position of this node.
    pub fn at(self, line: usize, column: usize) -> Self {
        self.with_span(Span::new(line, column))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        match &self.node {
            Node::Module(m) => out.extend(&m.body),
            Node::FunctionDef(f) => out.extend(&f.body),
            Node::Return(value) | Node::Raise(value) => out.extend(value.as_deref()),
            Node::Assign(a) => {
                out.push(&*a.target);
                out.push(&*a.value);
            }
            Node::AugAssign(a) => {
                out.push(&*a.target);
                out.push(&*a.value);
            }
            Node::ExprStmt(e) => out.push(&**e),
            Node::If(i) => {
                out.push(&*i.test);
                out.extend(&i.body);
                out.extend(&i.orelse);
            }
            Node::While(w) => {
                out.push(&*w.test);
                out.extend(&w.body);
            }
            Node::For(f) => {
                out.push(&*f.target);
                out.push(&*f.iter);
                out.extend(&f.body);
            }
            Node::Pass | Node::Break | Node::Continue => {}
            Node::Try(t) => {
                out.extend(&t.body);
                for handler in &t.handlers {
                    out.extend(&handler.exception);
                    out.extend(&handler.body);
                }
                out.extend(&t.finalbody);
            }
            Node::With(w) => {
                out.extend(w.items.iter().map(|item| &item.context));
                out.extend(&w.body);
            }
            Node::ClassDef(c) => {
                out.extend(&c.bases);
                out.extend(&c.body);
            }
            Node::Import(_) | Node::Name(_) | Node::Constant(_) => {}
            Node::BinOp(b) => {
                out.push(&*b.left);
                out.push(&*b.right);
            }
            Node::UnaryOp(u) => out.push(&*u.operand),
            Node::Compare(c) => {
                out.push(&*c.left);
                out.extend(&c.comparators);
            }
            Node::BoolOp(b) => out.extend(&b.values),
            Node::Call(c) => {
                out.push(&*c.func);
                out.extend(&c.args);
                out.extend(c.keywords.iter().map(|kw| &kw.value));
            }
            Node::Attribute(a) => out.push(&*a.value),
            Node::Subscript(s) => {
                out.push(&*s.value);
                out.push(&*s.index);
            }
            Node::Slice(s) => {
                out.extend(s.lower.as_deref());
                out.extend(s.upper.as_deref());
                out.extend(s.step.as_deref());
            }
            Node::List(items) | Node::Tuple(items) => out.extend(items),
            Node::Dict(d) => {
                for (key, value) in &d.entries {
                    out.push(key);
                    out.push(value);
                }
            }
            Node::IfExp(i) => {
                out.push(&*i.test);
                out.push(&*i.body);
                out.push(&*i.orelse);
            }
            Node::Lambda(l) => out.push(&*l.body),
        }
        out
    }

    /// This node and every node below it, pre-order.
    pub fn descendants(&self) -> impl Iterator<Item = &SyntaxNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().into_iter().rev());
            Some(node)
        })
    }

    // Builders

    pub fn module(body: Vec<SyntaxNode>) -> Self {
        Self::new(Node::Module(Module { body }))
    }

    pub fn function(name: impl Into<String>, params: Vec<String>, body: Vec<SyntaxNode>) -> Self {
        Self::new(Node::FunctionDef(FunctionDef {
            name: name.into(),
            params,
            body,
        }))
    }

    pub fn return_stmt(value: Option<SyntaxNode>) -> Self {
        Self::new(Node::Return(value.map(Box::new)))
    }

    pub fn assign(target: SyntaxNode, value: SyntaxNode) -> Self {
        Self::new(Node::Assign(Assign {
            target: Box::new(target),
            value: Box::new(value),
        }))
    }

    pub fn aug_assign(target: SyntaxNode, op: Operator, value: SyntaxNode) -> Self {
        Self::new(Node::AugAssign(AugAssign {
            target: Box::new(target),
            op,
            value: Box::new(value),
        }))
    }

    pub fn expr_stmt(expr: SyntaxNode) -> Self {
        Self::new(Node::ExprStmt(Box::new(expr)))
    }

    pub fn if_stmt(test: SyntaxNode, body: Vec<SyntaxNode>, orelse: Vec<SyntaxNode>) -> Self {
        Self::new(Node::If(If {
            test: Box::new(test),
            body,
            orelse,
        }))
    }

    pub fn while_loop(test: SyntaxNode, body: Vec<SyntaxNode>) -> Self {
        Self::new(Node::While(While {
            test: Box::new(test),
            body,
        }))
    }

    pub fn for_loop(target: SyntaxNode, iter: SyntaxNode, body: Vec<SyntaxNode>) -> Self {
        Self::new(Node::For(For {
            target: Box::new(target),
            iter: Box::new(iter),
            body,
        }))
    }

    pub fn pass() -> Self {
        Self::new(Node::Pass)
    }

    pub fn break_stmt() -> Self {
        Self::new(Node::Break)
    }

    pub fn continue_stmt() -> Self {
        Self::new(Node::Continue)
    }

    pub fn raise(exception: Option<SyntaxNode>) -> Self {
        Self::new(Node::Raise(exception.map(Box::new)))
    }

    pub fn name(id: impl Into<String>) -> Self {
        Self::new(Node::Name(id.into()))
    }

    pub fn constant(value: Literal) -> Self {
        Self::new(Node::Constant(value))
    }

    pub fn none() -> Self {
        Self::constant(Literal::None)
    }

    pub fn bool(value: bool) -> Self {
        Self::constant(Literal::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Literal::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::constant(Literal::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(Literal::Str(value.into()))
    }

    pub fn bin_op(left: SyntaxNode, op: Operator, right: SyntaxNode) -> Self {
        Self::new(Node::BinOp(BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }))
    }

    pub fn unary(op: UnaryOperator, operand: SyntaxNode) -> Self {
        Self::new(Node::UnaryOp(UnaryOp {
            op,
            operand: Box::new(operand),
        }))
    }

    pub fn compare(left: SyntaxNode, rest: Vec<(CmpOp, SyntaxNode)>) -> Self {
        let (ops, comparators) = rest.into_iter().unzip();
        Self::new(Node::Compare(Compare {
            left: Box::new(left),
            ops,
            comparators,
        }))
    }

    pub fn bool_op(op: BoolOperator, values: Vec<SyntaxNode>) -> Self {
        Self::new(Node::BoolOp(BoolOp { op, values }))
    }

    pub fn call(func: SyntaxNode, args: Vec<SyntaxNode>) -> Self {
        Self::call_with_keywords(func, args, Vec::new())
    }

    pub fn call_with_keywords(func: SyntaxNode, args: Vec<SyntaxNode>, keywords: Vec<Keyword>) -> Self {
        Self::new(Node::Call(Call {
            func: Box::new(func),
            args,
            keywords,
        }))
    }

    pub fn attribute(value: SyntaxNode, attr: impl Into<String>) -> Self {
        Self::new(Node::Attribute(Attribute {
            value: Box::new(value),
            attr: attr.into(),
        }))
    }

    pub fn subscript(value: SyntaxNode, index: SyntaxNode) -> Self {
        Self::new(Node::Subscript(Subscript {
            value: Box::new(value),
            index: Box::new(index),
        }))
    }

    pub fn slice(lower: Option<SyntaxNode>, upper: Option<SyntaxNode>, step: Option<SyntaxNode>) -> Self {
        Self::new(Node::Slice(Slice {
            lower: lower.map(Box::new),
            upper: upper.map(Box::new),
            step: step.map(Box::new),
        }))
    }

    pub fn list(items: Vec<SyntaxNode>) -> Self {
        Self::new(Node::List(items))
    }

    pub fn tuple(items: Vec<SyntaxNode>) -> Self {
        Self::new(Node::Tuple(items))
    }

    pub fn dict(entries: Vec<(SyntaxNode, SyntaxNode)>) -> Self {
        Self::new(Node::Dict(Dict { entries }))
    }

    pub fn if_exp(test: SyntaxNode, body: SyntaxNode, orelse: SyntaxNode) -> Self {
        Self::new(Node::IfExp(IfExp {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        }))
    }

    pub fn lambda(params: Vec<String>, body: SyntaxNode) -> Self {
        Self::new(Node::Lambda(Lambda {
            params,
            body: Box::new(body),
        }))
    }
}

impl Keyword {
    pub fn new(name: impl Into<String>, value: SyntaxNode) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_function() -> SyntaxNode {
        SyntaxNode::module(vec![SyntaxNode::function(
            "add",
            vec!["a".into(), "b".into()],
            vec![SyntaxNode::return_stmt(Some(SyntaxNode::bin_op(
                SyntaxNode::name("a"),
                Operator::Add,
                SyntaxNode::name("b"),
            )))],
        )])
    }

    #[test]
    fn test_children_in_source_order() {
        let node = SyntaxNode::if_stmt(
            SyntaxNode::name("x"),
            vec![SyntaxNode::pass()],
            vec![SyntaxNode::break_stmt()],
        );
        let kinds: Vec<_> = node.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::Name, NodeKind::Pass, NodeKind::Break]);
    }

    #[test]
    fn test_descendants_preorder() {
        let tree = add_function();
        let kinds: Vec<_> = tree.descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Module,
                NodeKind::FunctionDef,
                NodeKind::Return,
                NodeKind::BinOp,
                NodeKind::Name,
                NodeKind::Name,
            ]
        );
    }

    #[test]
    fn test_slice_children_skip_missing_parts() {
        let node = SyntaxNode::slice(None, Some(SyntaxNode::int(3)), None);
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn test_kind_names_follow_python_ast() {
        assert_eq!(SyntaxNode::expr_stmt(SyntaxNode::int(1)).kind().to_string(), "Expr");
        assert_eq!(NodeKind::FunctionDef.to_string(), "FunctionDef");
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::from_symbol("+="), Some(Operator::Add));
        assert_eq!(Operator::from_symbol("//"), Some(Operator::FloorDiv));
        assert_eq!(Operator::from_symbol("and"), None);
        assert_eq!(CmpOp::from_symbol("not  in"), Some(CmpOp::NotIn));
        assert_eq!(CmpOp::from_symbol("is not"), Some(CmpOp::IsNot));
        assert_eq!(UnaryOperator::from_symbol("not"), Some(UnaryOperator::Not));
    }

    #[test]
    fn test_span_display() {
        let node = SyntaxNode::name("x").at(3, 4);
        assert_eq!(node.span.to_string(), "3:4");
    }
}
