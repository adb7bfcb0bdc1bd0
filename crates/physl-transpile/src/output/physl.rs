//! PhySL backend.
//!
//! Emits a Python function as PhySL, the expression language Phylanx
//! compiles into execution trees: `define(f, a, block(...))`, `__add(a, b)`,
//! `for_each(lambda(i, ...), xs)` and so on.
//!
//! PhySL has no exceptions, classes, imports or early loop exits, so `Try`,
//! `With`, `Raise`, `ClassDef`, `Import`, `Break` and `Continue` have no rule
//! here and abort the transpilation. Operators without a PhySL primitive
//! (`//`, bit operations, `in`, `is`, `~`) do the same.

use crate::ast::*;
use crate::config::TranspileConfig;
use crate::task::Task;
use crate::traits::{Backend, TranspileError, Transpiler, Visit, Visitor};
use crate::transpiler::{Construction, build_transpiler_with, walk, walk_all};
use std::collections::HashSet;
use std::fmt;

/// Static instance of the PhySL backend for registry.
pub static PHYSL_BACKEND: PhyslBackend = PhyslBackend;

/// PhySL backend implementing the Backend trait.
pub struct PhyslBackend;

impl Backend for PhyslBackend {
    fn name(&self) -> &'static str {
        "physl"
    }

    fn extension(&self) -> &'static str {
        "physl"
    }

    fn transpile(&self, task: &Task, config: &TranspileConfig) -> Result<String, TranspileError> {
        build_transpiler_with::<PhyslTranspiler>(task, config).map(|t| t.to_string())
    }
}

/// Module aliases whose attributes name PhySL primitives directly.
const MODULE_ALIASES: &[&str] = &["np", "numpy"];

/// Translates a task into PhySL source.
#[derive(Debug)]
pub struct PhyslTranspiler {
    annotate: bool,
    /// Names defined in each enclosing function, innermost last.
    scopes: Vec<HashSet<String>>,
    output: String,
}

impl Transpiler for PhyslTranspiler {
    fn new(cx: Construction<'_>) -> Self {
        Self {
            annotate: cx.config().annotate_positions(),
            scopes: vec![HashSet::new()],
            output: String::new(),
        }
    }

    fn transpile(&mut self, root: &SyntaxNode) -> Result<(), TranspileError> {
        self.output = walk(self, root)?;
        Ok(())
    }
}

impl fmt::Display for PhyslTranspiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}

impl PhyslTranspiler {
    /// `name`, or `name$line$column` when positions are annotated.
    fn tag(&self, name: &str, span: Span) -> String {
        if self.annotate {
            format!("{}${}${}", name, span.line, span.column)
        } else {
            name.to_string()
        }
    }

    fn apply(&self, primitive: &str, span: Span, args: Vec<String>) -> String {
        format!("{}({})", self.tag(primitive, span), args.join(", "))
    }

    /// A statement list: bare when it holds one statement, a `block` otherwise.
    fn body(&mut self, span: Span, stmts: &[SyntaxNode]) -> Result<String, TranspileError> {
        let mut parts = walk_all(self, stmts)?;
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(self.apply("block", span, parts))
        }
    }

    /// Run `f` with a fresh scope holding `names`.
    fn scoped<T>(
        &mut self,
        names: &[String],
        f: impl FnOnce(&mut Self) -> Result<T, TranspileError>,
    ) -> Result<T, TranspileError> {
        self.scopes.push(names.iter().cloned().collect());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Record `name` in the innermost scope. Returns false if it was there.
    fn declare(&mut self, name: &str) -> bool {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.to_string()),
            None => true,
        }
    }

    fn undeclare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.remove(name);
        }
    }

    fn params(&self, names: &[String], span: Span) -> Vec<String> {
        names.iter().map(|name| self.tag(name, span)).collect()
    }

    fn is_module_alias(node: &SyntaxNode) -> bool {
        matches!(&node.node, Node::Name(id) if MODULE_ALIASES.contains(&id.as_str()))
    }
}

fn binary_primitive(op: Operator) -> Option<&'static str> {
    match op {
        Operator::Add => Some("__add"),
        Operator::Sub => Some("__sub"),
        Operator::Mult => Some("__mul"),
        Operator::Div => Some("__div"),
        Operator::Mod => Some("__mod"),
        Operator::MatMult => Some("dot"),
        Operator::Pow => Some("power"),
        Operator::FloorDiv
        | Operator::LShift
        | Operator::RShift
        | Operator::BitOr
        | Operator::BitXor
        | Operator::BitAnd => None,
    }
}

fn compare_primitive(op: CmpOp) -> Option<&'static str> {
    match op {
        CmpOp::Eq => Some("__eq"),
        CmpOp::NotEq => Some("__ne"),
        CmpOp::Lt => Some("__lt"),
        CmpOp::LtE => Some("__le"),
        CmpOp::Gt => Some("__gt"),
        CmpOp::GtE => Some("__ge"),
        CmpOp::Is | CmpOp::IsNot | CmpOp::In | CmpOp::NotIn => None,
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl Visitor for PhyslTranspiler {
    type Fragment = String;

    fn visit_module(&mut self, _span: Span, node: &Module) -> Visit<String> {
        Ok(Some(walk_all(self, &node.body)?.join("\n")))
    }

    fn visit_function_def(&mut self, span: Span, node: &FunctionDef) -> Visit<String> {
        self.declare(&node.name);
        let body = self.scoped(&node.params, |this| this.body(span, &node.body))?;

        let mut args = vec![self.tag(&node.name, span)];
        args.extend(self.params(&node.params, span));
        args.push(body);
        Ok(Some(self.apply("define", span, args)))
    }

    fn visit_return(&mut self, _span: Span, value: Option<&SyntaxNode>) -> Visit<String> {
        match value {
            Some(value) => walk(self, value).map(Some),
            None => Ok(Some("nil".into())),
        }
    }

    fn visit_assign(&mut self, span: Span, node: &Assign) -> Visit<String> {
        let value = walk(self, &node.value)?;
        match &node.target.node {
            Node::Name(id) => {
                let primitive = if self.declare(id) { "define" } else { "store" };
                let target = self.tag(id, node.target.span);
                Ok(Some(self.apply(primitive, span, vec![target, value])))
            }
            Node::Subscript(_) => {
                let target = walk(self, &node.target)?;
                Ok(Some(self.apply("store", span, vec![target, value])))
            }
            _ => Ok(None),
        }
    }

    fn visit_aug_assign(&mut self, span: Span, node: &AugAssign) -> Visit<String> {
        let Some(primitive) = binary_primitive(node.op) else {
            return Ok(None);
        };
        if !matches!(node.target.node, Node::Name(_) | Node::Subscript(_)) {
            return Ok(None);
        }

        let target = walk(self, &node.target)?;
        let value = walk(self, &node.value)?;
        let updated = self.apply(primitive, span, vec![target.clone(), value]);
        Ok(Some(self.apply("store", span, vec![target, updated])))
    }

    fn visit_expr_stmt(&mut self, _span: Span, expr: &SyntaxNode) -> Visit<String> {
        walk(self, expr).map(Some)
    }

    fn visit_if(&mut self, span: Span, node: &If) -> Visit<String> {
        let mut args = vec![walk(self, &node.test)?, self.body(span, &node.body)?];
        if !node.orelse.is_empty() {
            args.push(self.body(span, &node.orelse)?);
        }
        Ok(Some(self.apply("if", span, args)))
    }

    fn visit_while(&mut self, span: Span, node: &While) -> Visit<String> {
        let test = walk(self, &node.test)?;
        let body = self.body(span, &node.body)?;
        Ok(Some(self.apply("while", span, vec![test, body])))
    }

    fn visit_for(&mut self, span: Span, node: &For) -> Visit<String> {
        let Node::Name(variable) = &node.target.node else {
            return Ok(None);
        };
        let iter = walk(self, &node.iter)?;
        // The lambda binds the loop variable for the body only. Other names
        // assigned in the body still belong to the function.
        let fresh = self.declare(variable);
        let body = self.body(span, &node.body);
        if fresh {
            self.undeclare(variable);
        }
        let body = body?;

        let lambda = self.apply(
            "lambda",
            span,
            vec![self.tag(variable, node.target.span), body],
        );
        Ok(Some(self.apply("for_each", span, vec![lambda, iter])))
    }

    fn visit_pass(&mut self, _span: Span) -> Visit<String> {
        Ok(Some("nil".into()))
    }

    fn visit_name(&mut self, span: Span, id: &str) -> Visit<String> {
        Ok(Some(self.tag(id, span)))
    }

    fn visit_constant(&mut self, _span: Span, value: &Literal) -> Visit<String> {
        let text = match value {
            Literal::None => "nil".to_string(),
            Literal::Bool(true) => "true".to_string(),
            Literal::Bool(false) => "false".to_string(),
            Literal::Int(n) => n.to_string(),
            Literal::Float(x) => format!("{:?}", x),
            Literal::Str(s) => quote(s),
        };
        Ok(Some(text))
    }

    fn visit_bin_op(&mut self, span: Span, node: &BinOp) -> Visit<String> {
        let Some(primitive) = binary_primitive(node.op) else {
            return Ok(None);
        };
        let left = walk(self, &node.left)?;
        let right = walk(self, &node.right)?;
        Ok(Some(self.apply(primitive, span, vec![left, right])))
    }

    fn visit_unary_op(&mut self, span: Span, node: &UnaryOp) -> Visit<String> {
        let operand = walk(self, &node.operand)?;
        let text = match node.op {
            UnaryOperator::USub => self.apply("__minus", span, vec![operand]),
            UnaryOperator::Not => self.apply("__not", span, vec![operand]),
            UnaryOperator::UAdd => operand,
            UnaryOperator::Invert => return Ok(None),
        };
        Ok(Some(text))
    }

    fn visit_compare(&mut self, span: Span, node: &Compare) -> Visit<String> {
        let Some(primitives) = node
            .ops
            .iter()
            .map(|op| compare_primitive(*op))
            .collect::<Option<Vec<_>>>()
        else {
            return Ok(None);
        };

        let mut operands = vec![walk(self, &node.left)?];
        operands.extend(walk_all(self, &node.comparators)?);

        // a < b < c is (a < b) and (b < c)
        let mut parts: Vec<String> = primitives
            .iter()
            .zip(operands.windows(2))
            .map(|(primitive, pair)| self.apply(primitive, span, pair.to_vec()))
            .collect();

        if parts.len() == 1 {
            Ok(Some(parts.remove(0)))
        } else {
            Ok(Some(self.apply("__and", span, parts)))
        }
    }

    fn visit_bool_op(&mut self, span: Span, node: &BoolOp) -> Visit<String> {
        let values = walk_all(self, &node.values)?;
        let primitive = match node.op {
            BoolOperator::And => "__and",
            BoolOperator::Or => "__or",
        };
        Ok(Some(self.apply(primitive, span, values)))
    }

    fn visit_call(&mut self, _span: Span, node: &Call) -> Visit<String> {
        let (callee, mut args) = match &node.func.node {
            Node::Name(id) => (self.tag(id, node.func.span), Vec::new()),
            // np.zeros(n) is the primitive zeros(n)
            Node::Attribute(attr) if Self::is_module_alias(&attr.value) => {
                (self.tag(&attr.attr, node.func.span), Vec::new())
            }
            // a.dot(b) is dot(a, b)
            Node::Attribute(attr) => {
                let receiver = walk(self, &attr.value)?;
                (self.tag(&attr.attr, node.func.span), vec![receiver])
            }
            _ => return Ok(None),
        };

        args.extend(walk_all(self, &node.args)?);
        for keyword in &node.keywords {
            let value = walk(self, &keyword.value)?;
            let name = self.tag(&keyword.name, keyword.value.span);
            args.push(self.apply("__arg", keyword.value.span, vec![name, value]));
        }

        Ok(Some(format!("{}({})", callee, args.join(", "))))
    }

    fn visit_attribute(&mut self, span: Span, node: &Attribute) -> Visit<String> {
        if Self::is_module_alias(&node.value) {
            return Ok(Some(self.tag(&node.attr, span)));
        }
        let value = walk(self, &node.value)?;
        Ok(Some(self.apply(&node.attr, span, vec![value])))
    }

    fn visit_subscript(&mut self, span: Span, node: &Subscript) -> Visit<String> {
        let mut args = vec![walk(self, &node.value)?];
        match &node.index.node {
            Node::Tuple(indices) => args.extend(walk_all(self, indices)?),
            _ => args.push(walk(self, &node.index)?),
        }
        Ok(Some(self.apply("slice", span, args)))
    }

    fn visit_slice(&mut self, span: Span, node: &Slice) -> Visit<String> {
        let mut part = |bound: &Option<Box<SyntaxNode>>| match bound {
            Some(bound) => walk(&mut *self, bound),
            None => Ok("nil".to_string()),
        };
        let mut args = vec![part(&node.lower)?, part(&node.upper)?];
        if node.step.is_some() {
            args.push(part(&node.step)?);
        }
        Ok(Some(self.apply("list", span, args)))
    }

    fn visit_list(&mut self, span: Span, items: &[SyntaxNode]) -> Visit<String> {
        let items = walk_all(self, items)?;
        Ok(Some(self.apply("list", span, items)))
    }

    fn visit_tuple(&mut self, span: Span, items: &[SyntaxNode]) -> Visit<String> {
        self.visit_list(span, items)
    }

    fn visit_dict(&mut self, span: Span, node: &Dict) -> Visit<String> {
        let mut pairs = Vec::with_capacity(node.entries.len());
        for (key, value) in &node.entries {
            let key = walk(self, key)?;
            let value = walk(self, value)?;
            pairs.push(self.apply("list", span, vec![key, value]));
        }
        Ok(Some(self.apply("dict", span, pairs)))
    }

    fn visit_if_exp(&mut self, span: Span, node: &IfExp) -> Visit<String> {
        let test = walk(self, &node.test)?;
        let body = walk(self, &node.body)?;
        let orelse = walk(self, &node.orelse)?;
        Ok(Some(self.apply("if", span, vec![test, body, orelse])))
    }

    fn visit_lambda(&mut self, span: Span, node: &Lambda) -> Visit<String> {
        let body = self.scoped(&node.params, |this| walk(this, &node.body))?;
        let mut args = self.params(&node.params, span);
        args.push(body);
        Ok(Some(self.apply("lambda", span, args)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::build_transpiler;

    fn function(params: &[&str], body: Vec<SyntaxNode>) -> Task {
        Task::from_tree(SyntaxNode::module(vec![SyntaxNode::function(
            "f",
            params.iter().map(|p| p.to_string()).collect(),
            body,
        )]))
    }

    fn emit(task: &Task) -> String {
        build_transpiler::<PhyslTranspiler>(task).unwrap().to_string()
    }

    #[test]
    fn test_literal_body() {
        let task = function(&[], vec![SyntaxNode::return_stmt(Some(SyntaxNode::int(1)))]);
        assert_eq!(emit(&task), "define(f, 1)");
    }

    #[test]
    fn test_define_then_store() {
        let task = function(
            &["a"],
            vec![
                SyntaxNode::assign(SyntaxNode::name("x"), SyntaxNode::name("a")),
                SyntaxNode::assign(
                    SyntaxNode::name("x"),
                    SyntaxNode::bin_op(SyntaxNode::name("x"), Operator::Mult, SyntaxNode::int(2)),
                ),
                SyntaxNode::aug_assign(SyntaxNode::name("x"), Operator::Sub, SyntaxNode::int(1)),
                SyntaxNode::return_stmt(Some(SyntaxNode::name("x"))),
            ],
        );
        insta::assert_snapshot!(
            emit(&task),
            @"define(f, a, block(define(x, a), store(x, __mul(x, 2)), store(x, __sub(x, 1)), x))"
        );
    }

    #[test]
    fn test_parameter_assignment_is_store() {
        let task = function(
            &["a"],
            vec![SyntaxNode::assign(SyntaxNode::name("a"), SyntaxNode::int(0))],
        );
        assert_eq!(emit(&task), "define(f, a, store(a, 0))");
    }

    #[test]
    fn test_control_flow() {
        let task = function(
            &["n"],
            vec![
                SyntaxNode::assign(SyntaxNode::name("total"), SyntaxNode::int(0)),
                SyntaxNode::for_loop(
                    SyntaxNode::name("i"),
                    SyntaxNode::call(SyntaxNode::name("range"), vec![SyntaxNode::name("n")]),
                    vec![SyntaxNode::if_stmt(
                        SyntaxNode::compare(
                            SyntaxNode::name("i"),
                            vec![(CmpOp::Gt, SyntaxNode::int(2))],
                        ),
                        vec![SyntaxNode::aug_assign(
                            SyntaxNode::name("total"),
                            Operator::Add,
                            SyntaxNode::name("i"),
                        )],
                        vec![SyntaxNode::pass()],
                    )],
                ),
                SyntaxNode::while_loop(
                    SyntaxNode::bool(false),
                    vec![SyntaxNode::expr_stmt(SyntaxNode::call(
                        SyntaxNode::name("cout"),
                        vec![SyntaxNode::string("never")],
                    ))],
                ),
                SyntaxNode::return_stmt(Some(SyntaxNode::name("total"))),
            ],
        );
        insta::assert_snapshot!(
            emit(&task),
            @r#"define(f, n, block(define(total, 0), for_each(lambda(i, if(__gt(i, 2), store(total, __add(total, i)), nil)), range(n)), while(false, cout("never")), total))"#
        );
    }

    #[test]
    fn test_loop_variable_is_local_to_lambda() {
        let task = function(
            &["xs"],
            vec![
                SyntaxNode::for_loop(
                    SyntaxNode::name("i"),
                    SyntaxNode::name("xs"),
                    vec![SyntaxNode::assign(SyntaxNode::name("last"), SyntaxNode::name("i"))],
                ),
                SyntaxNode::assign(SyntaxNode::name("i"), SyntaxNode::int(0)),
                SyntaxNode::assign(SyntaxNode::name("last"), SyntaxNode::name("i")),
            ],
        );
        insta::assert_snapshot!(
            emit(&task),
            @"define(f, xs, block(for_each(lambda(i, define(last, i)), xs), define(i, 0), store(last, i)))"
        );
    }

    #[test]
    fn test_chained_comparison() {
        let task = function(
            &["x"],
            vec![SyntaxNode::return_stmt(Some(SyntaxNode::compare(
                SyntaxNode::int(0),
                vec![
                    (CmpOp::LtE, SyntaxNode::name("x")),
                    (CmpOp::Lt, SyntaxNode::int(10)),
                ],
            )))],
        );
        assert_eq!(emit(&task), "define(f, x, __and(__le(0, x), __lt(x, 10)))");
    }

    #[test]
    fn test_numpy_calls_and_keywords() {
        let task = function(
            &["a", "b"],
            vec![SyntaxNode::return_stmt(Some(SyntaxNode::call_with_keywords(
                SyntaxNode::attribute(SyntaxNode::name("np"), "sum"),
                vec![SyntaxNode::call(
                    SyntaxNode::attribute(SyntaxNode::name("a"), "dot"),
                    vec![SyntaxNode::name("b")],
                )],
                vec![Keyword::new("axis", SyntaxNode::int(0))],
            )))],
        );
        assert_eq!(emit(&task), "define(f, a, b, sum(dot(a, b), __arg(axis, 0)))");
    }

    #[test]
    fn test_subscripts_and_collections() {
        let task = function(
            &["x"],
            vec![
                SyntaxNode::assign(
                    SyntaxNode::subscript(SyntaxNode::name("x"), SyntaxNode::int(0)),
                    SyntaxNode::list(vec![SyntaxNode::float(1.5), SyntaxNode::none()]),
                ),
                SyntaxNode::return_stmt(Some(SyntaxNode::subscript(
                    SyntaxNode::name("x"),
                    SyntaxNode::tuple(vec![
                        SyntaxNode::slice(Some(SyntaxNode::int(1)), None, None),
                        SyntaxNode::unary(UnaryOperator::USub, SyntaxNode::int(1)),
                    ]),
                ))),
            ],
        );
        insta::assert_snapshot!(
            emit(&task),
            @"define(f, x, block(store(slice(x, 0), list(1.5, nil)), slice(x, list(1, nil), __minus(1))))"
        );
    }

    #[test]
    fn test_lambda_and_conditional_expression() {
        let task = function(
            &["c"],
            vec![SyntaxNode::return_stmt(Some(SyntaxNode::if_exp(
                SyntaxNode::name("c"),
                SyntaxNode::lambda(vec!["y".into()], SyntaxNode::name("y")),
                SyntaxNode::dict(vec![(SyntaxNode::string("k"), SyntaxNode::bool(true))]),
            )))],
        );
        assert_eq!(
            emit(&task),
            r#"define(f, c, if(c, lambda(y, y), dict(list("k", true))))"#
        );
    }

    #[test]
    fn test_annotated_positions() {
        let task = Task::from_tree(
            SyntaxNode::module(vec![SyntaxNode::function(
                "f",
                vec!["a".into()],
                vec![SyntaxNode::return_stmt(Some(
                    SyntaxNode::bin_op(
                        SyntaxNode::name("a").at(2, 11),
                        Operator::Add,
                        SyntaxNode::int(1).at(2, 15),
                    )
                    .at(2, 11),
                ))
                .at(2, 4)],
            )
            .at(1, 0)])
            .at(1, 0),
        );
        let config = TranspileConfig {
            annotate_positions: Some(true),
            ..Default::default()
        };
        let output = PHYSL_BACKEND.transpile(&task, &config).unwrap();
        assert_eq!(output, "define$1$0(f$1$0, a$1$0, __add$2$11(a$2$11, 1))");
    }

    #[test]
    fn test_unsupported_statement_fails() {
        let task = function(
            &[],
            vec![SyntaxNode::while_loop(
                SyntaxNode::bool(true),
                vec![SyntaxNode::break_stmt().at(3, 8)],
            )],
        );
        let err = build_transpiler::<PhyslTranspiler>(&task).unwrap_err();
        assert_eq!(err.kind(), NodeKind::Break);
        assert_eq!(err.span(), Span::new(3, 8));
    }

    #[test]
    fn test_unsupported_operator_fails() {
        let task = function(
            &["a"],
            vec![SyntaxNode::return_stmt(Some(SyntaxNode::bin_op(
                SyntaxNode::name("a"),
                Operator::FloorDiv,
                SyntaxNode::int(2),
            )))],
        );
        let err = build_transpiler::<PhyslTranspiler>(&task).unwrap_err();
        assert_eq!(err.kind(), NodeKind::BinOp);
    }

    #[test]
    fn test_backend_metadata() {
        assert_eq!(PHYSL_BACKEND.name(), "physl");
        assert_eq!(PHYSL_BACKEND.extension(), "physl");
    }
}
