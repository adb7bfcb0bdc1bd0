//! S-expression backend.
//!
//! Emits the syntax tree as nested JSON arrays, `[head, args...]`, with
//! namespaced heads for operators (`math.add`, `cmp.lt`, `logic.and`).
//! Identifiers are `["var", name]` so they cannot be confused with string
//! constants, which are plain JSON strings.

use crate::ast::*;
use crate::config::TranspileConfig;
use crate::task::Task;
use crate::traits::{Backend, TranspileError, Transpiler, Visit, Visitor};
use crate::transpiler::{Construction, build_transpiler_with, walk, walk_all};
use serde_json::{Map, Value, json};
use std::fmt;

/// Static instance of the s-expression backend for registry.
pub static SEXPR_BACKEND: SexprBackend = SexprBackend;

/// S-expression backend implementing the Backend trait.
pub struct SexprBackend;

impl Backend for SexprBackend {
    fn name(&self) -> &'static str {
        "sexpr"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn transpile(&self, task: &Task, config: &TranspileConfig) -> Result<String, TranspileError> {
        build_transpiler_with::<SexprTranspiler>(task, config).map(|t| t.to_string())
    }
}

/// Builds a JSON s-expression for a task.
#[derive(Debug)]
pub struct SexprTranspiler {
    pretty: bool,
    output: Value,
}

impl SexprTranspiler {
    /// The translated tree.
    pub fn value(&self) -> &Value {
        &self.output
    }

    fn body(&mut self, stmts: &[SyntaxNode]) -> Result<Value, TranspileError> {
        Ok(Value::Array(walk_all(self, stmts)?))
    }

    fn optional(&mut self, node: Option<&SyntaxNode>) -> Result<Value, TranspileError> {
        match node {
            Some(node) => walk(self, node),
            None => Ok(Value::Null),
        }
    }

    /// `[head, items...]`
    fn form(head: &str, items: Vec<Value>) -> Value {
        let mut form = Vec::with_capacity(items.len() + 1);
        form.push(Value::from(head));
        form.extend(items);
        Value::Array(form)
    }
}

impl Transpiler for SexprTranspiler {
    fn new(cx: Construction<'_>) -> Self {
        Self {
            pretty: cx.config().pretty(),
            output: Value::Null,
        }
    }

    fn transpile(&mut self, root: &SyntaxNode) -> Result<(), TranspileError> {
        self.output = walk(self, root)?;
        Ok(())
    }
}

impl fmt::Display for SexprTranspiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pretty {
            write!(f, "{:#}", self.output)
        } else {
            write!(f, "{}", self.output)
        }
    }
}

fn operator_head(op: Operator) -> &'static str {
    match op {
        Operator::Add => "math.add",
        Operator::Sub => "math.sub",
        Operator::Mult => "math.mul",
        Operator::MatMult => "math.matmul",
        Operator::Div => "math.div",
        Operator::FloorDiv => "math.floordiv",
        Operator::Mod => "math.mod",
        Operator::Pow => "math.pow",
        Operator::LShift => "bit.shl",
        Operator::RShift => "bit.shr",
        Operator::BitOr => "bit.or",
        Operator::BitXor => "bit.xor",
        Operator::BitAnd => "bit.and",
    }
}

fn unary_head(op: UnaryOperator) -> &'static str {
    match op {
        UnaryOperator::Invert => "bit.not",
        UnaryOperator::Not => "logic.not",
        UnaryOperator::UAdd => "math.pos",
        UnaryOperator::USub => "math.neg",
    }
}

fn compare_head(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "cmp.eq",
        CmpOp::NotEq => "cmp.ne",
        CmpOp::Lt => "cmp.lt",
        CmpOp::LtE => "cmp.le",
        CmpOp::Gt => "cmp.gt",
        CmpOp::GtE => "cmp.ge",
        CmpOp::Is => "cmp.is",
        CmpOp::IsNot => "cmp.is_not",
        CmpOp::In => "cmp.in",
        CmpOp::NotIn => "cmp.not_in",
    }
}

impl Visitor for SexprTranspiler {
    type Fragment = Value;

    fn visit_module(&mut self, _span: Span, node: &Module) -> Visit<Value> {
        let body = walk_all(self, &node.body)?;
        Ok(Some(Self::form("module", body)))
    }

    fn visit_function_def(&mut self, _span: Span, node: &FunctionDef) -> Visit<Value> {
        let body = self.body(&node.body)?;
        Ok(Some(json!(["std.fn", node.name, node.params, body])))
    }

    fn visit_return(&mut self, _span: Span, value: Option<&SyntaxNode>) -> Visit<Value> {
        let value = self.optional(value)?;
        Ok(Some(json!(["return", value])))
    }

    fn visit_assign(&mut self, _span: Span, node: &Assign) -> Visit<Value> {
        let target = walk(self, &node.target)?;
        let value = walk(self, &node.value)?;
        Ok(Some(json!(["set", target, value])))
    }

    fn visit_aug_assign(&mut self, _span: Span, node: &AugAssign) -> Visit<Value> {
        let target = walk(self, &node.target)?;
        let value = walk(self, &node.value)?;
        let updated = json!([operator_head(node.op), target, value]);
        Ok(Some(json!(["set", target, updated])))
    }

    fn visit_expr_stmt(&mut self, _span: Span, expr: &SyntaxNode) -> Visit<Value> {
        walk(self, expr).map(Some)
    }

    fn visit_if(&mut self, _span: Span, node: &If) -> Visit<Value> {
        let test = walk(self, &node.test)?;
        let body = self.body(&node.body)?;
        let orelse = self.body(&node.orelse)?;
        Ok(Some(json!(["if", test, body, orelse])))
    }

    fn visit_while(&mut self, _span: Span, node: &While) -> Visit<Value> {
        let test = walk(self, &node.test)?;
        let body = self.body(&node.body)?;
        Ok(Some(json!(["while", test, body])))
    }

    fn visit_for(&mut self, _span: Span, node: &For) -> Visit<Value> {
        let target = walk(self, &node.target)?;
        let iter = walk(self, &node.iter)?;
        let body = self.body(&node.body)?;
        Ok(Some(json!(["for", target, iter, body])))
    }

    fn visit_pass(&mut self, _span: Span) -> Visit<Value> {
        Ok(Some(json!(["pass"])))
    }

    fn visit_break(&mut self, _span: Span) -> Visit<Value> {
        Ok(Some(json!(["break"])))
    }

    fn visit_continue(&mut self, _span: Span) -> Visit<Value> {
        Ok(Some(json!(["continue"])))
    }

    fn visit_try(&mut self, _span: Span, node: &Try) -> Visit<Value> {
        let body = self.body(&node.body)?;
        let mut handlers = Vec::with_capacity(node.handlers.len());
        for handler in &node.handlers {
            let exception = self.optional(handler.exception.as_ref())?;
            let handler_body = self.body(&handler.body)?;
            handlers.push(json!(["except", exception, handler.name, handler_body]));
        }
        let finalbody = self.body(&node.finalbody)?;
        Ok(Some(json!(["try", body, handlers, finalbody])))
    }

    fn visit_with(&mut self, _span: Span, node: &With) -> Visit<Value> {
        let mut items = Vec::with_capacity(node.items.len());
        for item in &node.items {
            let context = walk(self, &item.context)?;
            items.push(json!([context, item.alias]));
        }
        let body = self.body(&node.body)?;
        Ok(Some(json!(["with", items, body])))
    }

    fn visit_raise(&mut self, _span: Span, exception: Option<&SyntaxNode>) -> Visit<Value> {
        let exception = self.optional(exception)?;
        Ok(Some(json!(["raise", exception])))
    }

    fn visit_class_def(&mut self, _span: Span, node: &ClassDef) -> Visit<Value> {
        let bases = self.body(&node.bases)?;
        let body = self.body(&node.body)?;
        Ok(Some(json!(["class", node.name, bases, body])))
    }

    fn visit_import(&mut self, _span: Span, node: &Import) -> Visit<Value> {
        let names: Vec<Value> = node
            .names
            .iter()
            .map(|alias| json!([alias.name, alias.alias]))
            .collect();
        Ok(Some(json!(["import", node.module, names])))
    }

    fn visit_name(&mut self, _span: Span, id: &str) -> Visit<Value> {
        Ok(Some(json!(["var", id])))
    }

    fn visit_constant(&mut self, _span: Span, value: &Literal) -> Visit<Value> {
        let value = match value {
            Literal::None => Value::Null,
            Literal::Bool(b) => Value::from(*b),
            Literal::Int(n) => Value::from(*n),
            // NaN and infinities have no JSON form and become null
            Literal::Float(x) => Value::from(*x),
            Literal::Str(s) => Value::from(s.as_str()),
        };
        Ok(Some(value))
    }

    fn visit_bin_op(&mut self, _span: Span, node: &BinOp) -> Visit<Value> {
        let left = walk(self, &node.left)?;
        let right = walk(self, &node.right)?;
        Ok(Some(json!([operator_head(node.op), left, right])))
    }

    fn visit_unary_op(&mut self, _span: Span, node: &UnaryOp) -> Visit<Value> {
        let operand = walk(self, &node.operand)?;
        Ok(Some(json!([unary_head(node.op), operand])))
    }

    fn visit_compare(&mut self, _span: Span, node: &Compare) -> Visit<Value> {
        let mut items = vec![walk(self, &node.left)?];
        for (op, comparator) in node.ops.iter().zip(&node.comparators) {
            items.push(json!([compare_head(*op), walk(self, comparator)?]));
        }
        Ok(Some(Self::form("compare", items)))
    }

    fn visit_bool_op(&mut self, _span: Span, node: &BoolOp) -> Visit<Value> {
        let head = match node.op {
            BoolOperator::And => "logic.and",
            BoolOperator::Or => "logic.or",
        };
        let values = walk_all(self, &node.values)?;
        Ok(Some(Self::form(head, values)))
    }

    fn visit_call(&mut self, _span: Span, node: &Call) -> Visit<Value> {
        let func = walk(self, &node.func)?;
        let args = walk_all(self, &node.args)?;
        let mut keywords = Map::new();
        for keyword in &node.keywords {
            keywords.insert(keyword.name.clone(), walk(self, &keyword.value)?);
        }
        Ok(Some(json!(["call", func, args, keywords])))
    }

    fn visit_attribute(&mut self, _span: Span, node: &Attribute) -> Visit<Value> {
        let value = walk(self, &node.value)?;
        Ok(Some(json!(["attr", value, node.attr])))
    }

    fn visit_subscript(&mut self, _span: Span, node: &Subscript) -> Visit<Value> {
        let value = walk(self, &node.value)?;
        let index = walk(self, &node.index)?;
        Ok(Some(json!(["index", value, index])))
    }

    fn visit_slice(&mut self, _span: Span, node: &Slice) -> Visit<Value> {
        let lower = self.optional(node.lower.as_deref())?;
        let upper = self.optional(node.upper.as_deref())?;
        let step = self.optional(node.step.as_deref())?;
        Ok(Some(json!(["slice", lower, upper, step])))
    }

    fn visit_list(&mut self, _span: Span, items: &[SyntaxNode]) -> Visit<Value> {
        let items = walk_all(self, items)?;
        Ok(Some(Self::form("list", items)))
    }

    fn visit_tuple(&mut self, _span: Span, items: &[SyntaxNode]) -> Visit<Value> {
        let items = walk_all(self, items)?;
        Ok(Some(Self::form("tuple", items)))
    }

    fn visit_dict(&mut self, _span: Span, node: &Dict) -> Visit<Value> {
        let mut entries = Vec::with_capacity(node.entries.len());
        for (key, value) in &node.entries {
            entries.push(json!([walk(self, key)?, walk(self, value)?]));
        }
        Ok(Some(Self::form("dict", entries)))
    }

    fn visit_if_exp(&mut self, _span: Span, node: &IfExp) -> Visit<Value> {
        let test = walk(self, &node.test)?;
        let body = walk(self, &node.body)?;
        let orelse = walk(self, &node.orelse)?;
        Ok(Some(json!(["if", test, body, orelse])))
    }

    fn visit_lambda(&mut self, _span: Span, node: &Lambda) -> Visit<Value> {
        let body = walk(self, &node.body)?;
        Ok(Some(json!(["lambda", node.params, body])))
    }
}
