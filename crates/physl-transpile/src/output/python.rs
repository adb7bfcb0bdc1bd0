//! Python backend.
//!
//! Emits a task's syntax tree back as Python source. Every node kind has a
//! rule, so this backend never reports an unimplemented transformation; it
//! is the reference for checking what the reader produced.

use crate::ast::*;
use crate::config::TranspileConfig;
use crate::task::Task;
use crate::traits::{Backend, TranspileError, Transpiler, Visit, Visitor};
use crate::transpiler::{Construction, build_transpiler_with, walk, walk_all};
use std::fmt::{self, Write};

/// Static instance of the Python backend for registry.
pub static PYTHON_BACKEND: PythonBackend = PythonBackend;

/// Python backend implementing the Backend trait.
pub struct PythonBackend;

impl Backend for PythonBackend {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extension(&self) -> &'static str {
        "py"
    }

    fn transpile(&self, task: &Task, config: &TranspileConfig) -> Result<String, TranspileError> {
        build_transpiler_with::<PythonTranspiler>(task, config).map(|t| t.to_string())
    }
}

/// Emits a syntax tree as Python source code.
///
/// Statement fragments carry no leading indentation; enclosing blocks
/// indent every line of their children by one level.
#[derive(Debug)]
pub struct PythonTranspiler {
    output: String,
    indent: String,
}

impl Transpiler for PythonTranspiler {
    fn new(cx: Construction<'_>) -> Self {
        Self {
            output: String::new(),
            indent: " ".repeat(cx.config().indent_width()),
        }
    }

    fn transpile(&mut self, root: &SyntaxNode) -> Result<(), TranspileError> {
        self.output = walk(self, root)?;
        Ok(())
    }
}

impl fmt::Display for PythonTranspiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}

impl PythonTranspiler {
    /// An indented suite. Empty suites become `pass`.
    fn block(&mut self, stmts: &[SyntaxNode]) -> Result<String, TranspileError> {
        let mut fragments = walk_all(self, stmts)?;
        if fragments.is_empty() {
            fragments.push("pass".to_string());
        }

        let mut out = String::new();
        for (i, line) in fragments.iter().flat_map(|f| f.lines()).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if !line.is_empty() {
                out.push_str(&self.indent);
            }
            out.push_str(line);
        }
        Ok(out)
    }

    fn header(&mut self, head: &str, body: &[SyntaxNode]) -> Result<String, TranspileError> {
        Ok(format!("{}:\n{}", head, self.block(body)?))
    }

    fn list(&mut self, nodes: &[SyntaxNode]) -> Result<String, TranspileError> {
        Ok(walk_all(self, nodes)?.join(", "))
    }

    fn write_string(out: &mut String, s: &str) {
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
    }
}

impl Visitor for PythonTranspiler {
    type Fragment = String;

    fn visit_module(&mut self, _span: Span, node: &Module) -> Visit<String> {
        let mut out = String::new();
        for fragment in walk_all(self, &node.body)? {
            out.push_str(&fragment);
            out.push('\n');
        }
        Ok(Some(out))
    }

    fn visit_function_def(&mut self, _span: Span, node: &FunctionDef) -> Visit<String> {
        let head = format!("def {}({})", node.name, node.params.join(", "));
        self.header(&head, &node.body).map(Some)
    }

    fn visit_return(&mut self, _span: Span, value: Option<&SyntaxNode>) -> Visit<String> {
        match value {
            Some(value) => Ok(Some(format!("return {}", walk(self, value)?))),
            None => Ok(Some("return".into())),
        }
    }

    fn visit_assign(&mut self, _span: Span, node: &Assign) -> Visit<String> {
        let target = walk(self, &node.target)?;
        let value = walk(self, &node.value)?;
        Ok(Some(format!("{} = {}", target, value)))
    }

    fn visit_aug_assign(&mut self, _span: Span, node: &AugAssign) -> Visit<String> {
        let target = walk(self, &node.target)?;
        let value = walk(self, &node.value)?;
        Ok(Some(format!("{} {}= {}", target, node.op.symbol(), value)))
    }

    fn visit_expr_stmt(&mut self, _span: Span, expr: &SyntaxNode) -> Visit<String> {
        walk(self, expr).map(Some)
    }

    fn visit_if(&mut self, _span: Span, node: &If) -> Visit<String> {
        let head = format!("if {}", walk(self, &node.test)?);
        let mut out = self.header(&head, &node.body)?;

        match node.orelse.as_slice() {
            [] => {}
            // else: if ... folds back into elif
            [nested] if nested.kind() == NodeKind::If => {
                out.push_str("\nel");
                out.push_str(&walk(self, nested)?);
            }
            orelse => {
                out.push('\n');
                out.push_str(&self.header("else", orelse)?);
            }
        }
        Ok(Some(out))
    }

    fn visit_while(&mut self, _span: Span, node: &While) -> Visit<String> {
        let head = format!("while {}", walk(self, &node.test)?);
        self.header(&head, &node.body).map(Some)
    }

    fn visit_for(&mut self, _span: Span, node: &For) -> Visit<String> {
        let head = format!(
            "for {} in {}",
            walk(self, &node.target)?,
            walk(self, &node.iter)?
        );
        self.header(&head, &node.body).map(Some)
    }

    fn visit_pass(&mut self, _span: Span) -> Visit<String> {
        Ok(Some("pass".into()))
    }

    fn visit_break(&mut self, _span: Span) -> Visit<String> {
        Ok(Some("break".into()))
    }

    fn visit_continue(&mut self, _span: Span) -> Visit<String> {
        Ok(Some("continue".into()))
    }

    fn visit_try(&mut self, _span: Span, node: &Try) -> Visit<String> {
        let mut out = self.header("try", &node.body)?;
        for handler in &node.handlers {
            let mut head = String::from("except");
            if let Some(exception) = &handler.exception {
                let _ = write!(head, " {}", walk(self, exception)?);
            }
            if let Some(name) = &handler.name {
                let _ = write!(head, " as {}", name);
            }
            out.push('\n');
            out.push_str(&self.header(&head, &handler.body)?);
        }
        if !node.finalbody.is_empty() {
            out.push('\n');
            out.push_str(&self.header("finally", &node.finalbody)?);
        }
        Ok(Some(out))
    }

    fn visit_with(&mut self, _span: Span, node: &With) -> Visit<String> {
        let mut items = Vec::with_capacity(node.items.len());
        for item in &node.items {
            let mut text = walk(self, &item.context)?;
            if let Some(alias) = &item.alias {
                let _ = write!(text, " as {}", alias);
            }
            items.push(text);
        }
        let head = format!("with {}", items.join(", "));
        self.header(&head, &node.body).map(Some)
    }

    fn visit_raise(&mut self, _span: Span, exception: Option<&SyntaxNode>) -> Visit<String> {
        match exception {
            Some(exception) => Ok(Some(format!("raise {}", walk(self, exception)?))),
            None => Ok(Some("raise".into())),
        }
    }

    fn visit_class_def(&mut self, _span: Span, node: &ClassDef) -> Visit<String> {
        let head = if node.bases.is_empty() {
            format!("class {}", node.name)
        } else {
            format!("class {}({})", node.name, self.list(&node.bases)?)
        };
        self.header(&head, &node.body).map(Some)
    }

    fn visit_import(&mut self, _span: Span, node: &Import) -> Visit<String> {
        let names: Vec<String> = node
            .names
            .iter()
            .map(|alias| match &alias.alias {
                Some(as_name) => format!("{} as {}", alias.name, as_name),
                None => alias.name.clone(),
            })
            .collect();
        let text = match &node.module {
            Some(module) => format!("from {} import {}", module, names.join(", ")),
            None => format!("import {}", names.join(", ")),
        };
        Ok(Some(text))
    }

    fn visit_name(&mut self, _span: Span, id: &str) -> Visit<String> {
        Ok(Some(id.to_string()))
    }

    fn visit_constant(&mut self, _span: Span, value: &Literal) -> Visit<String> {
        let mut out = String::new();
        match value {
            Literal::None => out.push_str("None"),
            Literal::Bool(true) => out.push_str("True"),
            Literal::Bool(false) => out.push_str("False"),
            Literal::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Literal::Float(x) => {
                let _ = write!(out, "{:?}", x);
            }
            Literal::Str(s) => Self::write_string(&mut out, s),
        }
        Ok(Some(out))
    }

    fn visit_bin_op(&mut self, _span: Span, node: &BinOp) -> Visit<String> {
        let left = walk(self, &node.left)?;
        let right = walk(self, &node.right)?;
        Ok(Some(format!("({} {} {})", left, node.op.symbol(), right)))
    }

    fn visit_unary_op(&mut self, _span: Span, node: &UnaryOp) -> Visit<String> {
        let operand = walk(self, &node.operand)?;
        let text = match node.op {
            UnaryOperator::Not => format!("(not {})", operand),
            op => format!("({}{})", op.symbol(), operand),
        };
        Ok(Some(text))
    }

    fn visit_compare(&mut self, _span: Span, node: &Compare) -> Visit<String> {
        let mut out = format!("({}", walk(self, &node.left)?);
        for (op, comparator) in node.ops.iter().zip(&node.comparators) {
            let _ = write!(out, " {} {}", op.symbol(), walk(self, comparator)?);
        }
        out.push(')');
        Ok(Some(out))
    }

    fn visit_bool_op(&mut self, _span: Span, node: &BoolOp) -> Visit<String> {
        let separator = format!(" {} ", node.op.keyword());
        Ok(Some(format!("({})", walk_all(self, &node.values)?.join(&separator))))
    }

    fn visit_call(&mut self, _span: Span, node: &Call) -> Visit<String> {
        let mut args = walk_all(self, &node.args)?;
        for keyword in &node.keywords {
            args.push(format!("{}={}", keyword.name, walk(self, &keyword.value)?));
        }
        Ok(Some(format!("{}({})", walk(self, &node.func)?, args.join(", "))))
    }

    fn visit_attribute(&mut self, _span: Span, node: &Attribute) -> Visit<String> {
        Ok(Some(format!("{}.{}", walk(self, &node.value)?, node.attr)))
    }

    fn visit_subscript(&mut self, _span: Span, node: &Subscript) -> Visit<String> {
        let value = walk(self, &node.value)?;
        // x[a, b] rather than x[(a, b)], which is invalid when a part is a slice
        let index = match &node.index.node {
            Node::Tuple(items) if !items.is_empty() => self.list(items)?,
            _ => walk(self, &node.index)?,
        };
        Ok(Some(format!("{}[{}]", value, index)))
    }

    fn visit_slice(&mut self, _span: Span, node: &Slice) -> Visit<String> {
        let mut part = |bound: &Option<Box<SyntaxNode>>| match bound {
            Some(bound) => walk(&mut *self, bound),
            None => Ok(String::new()),
        };
        let mut out = format!("{}:{}", part(&node.lower)?, part(&node.upper)?);
        if node.step.is_some() {
            let _ = write!(out, ":{}", part(&node.step)?);
        }
        Ok(Some(out))
    }

    fn visit_list(&mut self, _span: Span, items: &[SyntaxNode]) -> Visit<String> {
        Ok(Some(format!("[{}]", self.list(items)?)))
    }

    fn visit_tuple(&mut self, _span: Span, items: &[SyntaxNode]) -> Visit<String> {
        let text = match items {
            [single] => format!("({},)", walk(self, single)?),
            _ => format!("({})", self.list(items)?),
        };
        Ok(Some(text))
    }

    fn visit_dict(&mut self, _span: Span, node: &Dict) -> Visit<String> {
        let mut entries = Vec::with_capacity(node.entries.len());
        for (key, value) in &node.entries {
            entries.push(format!("{}: {}", walk(self, key)?, walk(self, value)?));
        }
        Ok(Some(format!("{{{}}}", entries.join(", "))))
    }

    fn visit_if_exp(&mut self, _span: Span, node: &IfExp) -> Visit<String> {
        // Python ternary: body if test else orelse
        let body = walk(self, &node.body)?;
        let test = walk(self, &node.test)?;
        let orelse = walk(self, &node.orelse)?;
        Ok(Some(format!("({} if {} else {})", body, test, orelse)))
    }

    fn visit_lambda(&mut self, _span: Span, node: &Lambda) -> Visit<String> {
        let body = walk(self, &node.body)?;
        if node.params.is_empty() {
            Ok(Some(format!("(lambda: {})", body)))
        } else {
            Ok(Some(format!("(lambda {}: {})", node.params.join(", "), body)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::build_transpiler;

    fn emit(body: Vec<SyntaxNode>) -> String {
        let task = Task::from_tree(SyntaxNode::module(vec![SyntaxNode::function(
            "f",
            vec!["a".into(), "b".into()],
            body,
        )]));
        build_transpiler::<PythonTranspiler>(&task).unwrap().to_string()
    }

    #[test]
    fn test_function_definition() {
        let output = emit(vec![SyntaxNode::return_stmt(Some(SyntaxNode::bin_op(
            SyntaxNode::name("a"),
            Operator::Add,
            SyntaxNode::name("b"),
        )))]);
        insta::assert_snapshot!(output.trim_end(), @r"
        def f(a, b):
            return (a + b)
        ");
    }

    #[test]
    fn test_empty_body_is_pass() {
        assert_eq!(emit(vec![]), "def f(a, b):\n    pass\n");
    }

    #[test]
    fn test_elif_chain() {
        let output = emit(vec![SyntaxNode::if_stmt(
            SyntaxNode::compare(SyntaxNode::name("a"), vec![(CmpOp::Lt, SyntaxNode::int(0))]),
            vec![SyntaxNode::return_stmt(Some(SyntaxNode::int(-1)))],
            vec![SyntaxNode::if_stmt(
                SyntaxNode::compare(SyntaxNode::name("a"), vec![(CmpOp::Eq, SyntaxNode::int(0))]),
                vec![SyntaxNode::return_stmt(Some(SyntaxNode::int(0)))],
                vec![SyntaxNode::return_stmt(Some(SyntaxNode::int(1)))],
            )],
        )]);
        insta::assert_snapshot!(output.trim_end(), @r"
        def f(a, b):
            if (a < 0):
                return -1
            elif (a == 0):
                return 0
            else:
                return 1
        ");
    }

    #[test]
    fn test_nested_loops() {
        let output = emit(vec![SyntaxNode::for_loop(
            SyntaxNode::name("i"),
            SyntaxNode::name("a"),
            vec![SyntaxNode::while_loop(
                SyntaxNode::bool(true),
                vec![
                    SyntaxNode::aug_assign(SyntaxNode::name("b"), Operator::Mult, SyntaxNode::name("i")),
                    SyntaxNode::break_stmt(),
                ],
            )],
        )]);
        insta::assert_snapshot!(output.trim_end(), @r"
        def f(a, b):
            for i in a:
                while True:
                    b *= i
                    break
        ");
    }

    #[test]
    fn test_try_and_with() {
        let task = Task::from_tree(SyntaxNode::module(vec![SyntaxNode::function(
            "f",
            vec![],
            vec![SyntaxNode::new(Node::Try(Try {
                body: vec![SyntaxNode::new(Node::With(With {
                    items: vec![WithItem {
                        context: SyntaxNode::call(
                            SyntaxNode::name("open"),
                            vec![SyntaxNode::string("x")],
                        ),
                        alias: Some("fh".into()),
                    }],
                    body: vec![SyntaxNode::pass()],
                }))],
                handlers: vec![ExceptHandler {
                    span: Span::default(),
                    exception: Some(SyntaxNode::name("OSError")),
                    name: Some("e".into()),
                    body: vec![SyntaxNode::raise(None)],
                }],
                finalbody: vec![SyntaxNode::continue_stmt()],
            }))],
        )]));
        let output = build_transpiler::<PythonTranspiler>(&task).unwrap().to_string();
        insta::assert_snapshot!(output.trim_end(), @r#"
        def f():
            try:
                with open("x") as fh:
                    pass
            except OSError as e:
                raise
            finally:
                continue
        "#);
    }

    #[test]
    fn test_expressions() {
        let output = emit(vec![
            SyntaxNode::assign(
                SyntaxNode::name("x"),
                SyntaxNode::subscript(
                    SyntaxNode::name("a"),
                    SyntaxNode::tuple(vec![
                        SyntaxNode::slice(Some(SyntaxNode::int(1)), None, None),
                        SyntaxNode::slice(None, None, Some(SyntaxNode::int(2))),
                    ]),
                ),
            ),
            SyntaxNode::expr_stmt(SyntaxNode::call_with_keywords(
                SyntaxNode::attribute(SyntaxNode::name("np"), "sum"),
                vec![SyntaxNode::tuple(vec![SyntaxNode::name("x")])],
                vec![Keyword::new("axis", SyntaxNode::int(0))],
            )),
            SyntaxNode::return_stmt(Some(SyntaxNode::if_exp(
                SyntaxNode::unary(UnaryOperator::Not, SyntaxNode::name("b")),
                SyntaxNode::dict(vec![(SyntaxNode::string("k"), SyntaxNode::float(0.5))]),
                SyntaxNode::lambda(vec![], SyntaxNode::none()),
            ))),
        ]);
        insta::assert_snapshot!(output.trim_end(), @r#"
        def f(a, b):
            x = a[1:, ::2]
            np.sum((x,), axis=0)
            return ({"k": 0.5} if (not b) else (lambda: None))
        "#);
    }

    #[test]
    fn test_unary_operand_is_grouped() {
        let negated = SyntaxNode::unary(UnaryOperator::USub, SyntaxNode::name("a"));
        let output = emit(vec![
            SyntaxNode::expr_stmt(SyntaxNode::attribute(negated.clone(), "real")),
            SyntaxNode::return_stmt(Some(SyntaxNode::bin_op(
                negated,
                Operator::Pow,
                SyntaxNode::int(2),
            ))),
        ]);
        insta::assert_snapshot!(output.trim_end(), @r"
        def f(a, b):
            (-a).real
            return ((-a) ** 2)
        ");
    }

    #[test]
    fn test_custom_indent_width() {
        let task = Task::from_tree(SyntaxNode::module(vec![SyntaxNode::function(
            "f",
            vec![],
            vec![SyntaxNode::pass()],
        )]));
        let config = TranspileConfig {
            indent_width: Some(2),
            ..Default::default()
        };
        let output = PYTHON_BACKEND.transpile(&task, &config).unwrap();
        assert_eq!(output, "def f():\n  pass\n");
    }

    #[test]
    fn test_string_escapes() {
        let output = emit(vec![SyntaxNode::return_stmt(Some(SyntaxNode::string(
            "say \"hi\"\n",
        )))]);
        assert!(output.contains(r#"return "say \"hi\"\n""#));
    }
}
