//! Tree-sitter based Python reader.

use crate::ast::Node as Node_;
use crate::ast::*;
use crate::task::{SourceFn, Task};
use crate::traits::{ReadError, Reader};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Static instance of the Python reader for registry.
pub static PYTHON_READER: PythonReader = PythonReader;

/// Python reader using tree-sitter.
pub struct PythonReader;

impl Reader for PythonReader {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn read(&self, source: &str) -> Result<SyntaxNode, ReadError> {
        read_python(source)
    }
}

/// Parse Python source into a `Module` syntax tree.
pub fn read_python(source: &str) -> Result<SyntaxNode, ReadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_python::language().into())
        .map_err(|err| ReadError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ReadError::Parse("failed to parse".into()))?;

    let ctx = ReadContext::new(source);
    ctx.read_module(&tree)
}

/// One task per top-level function definition in `source`.
pub fn tasks_from_source(source: &str) -> Result<Vec<Task>, ReadError> {
    let module = read_python(source)?;
    let body = match module.node {
        Node_::Module(Module { body }) => body,
        other => {
            return Err(ReadError::UnexpectedNode {
                expected: "Module".into(),
                got: other.kind().to_string(),
            });
        }
    };

    // A definition's text runs until the next top-level statement
    let starts: Vec<usize> = body.iter().map(|stmt| stmt.span.line).collect();
    let mut tasks = Vec::new();
    for (i, stmt) in body.into_iter().enumerate() {
        let name = match &stmt.node {
            Node_::FunctionDef(f) => f.name.clone(),
            _ => continue,
        };
        let line = stmt.span.line;
        let text = source_lines(source, line, starts.get(i + 1).copied());
        let root = SyntaxNode::module(vec![stmt]).at(line, 0);
        tasks.push(Task::new(SourceFn::new(name, text, line), root));
    }
    debug!(tasks = tasks.len(), "read python module");
    Ok(tasks)
}

/// The task for the top-level function called `name`.
pub fn task_for(source: &str, name: &str) -> Result<Task, ReadError> {
    tasks_from_source(source)?
        .into_iter()
        .find(|task| task.function().name() == name)
        .ok_or_else(|| ReadError::FunctionNotFound(name.to_string()))
}

/// Lines `start..end` (1-based, end exclusive), trailing blank lines dropped.
fn source_lines(source: &str, start: usize, end: Option<usize>) -> String {
    let lines: Vec<&str> = source
        .lines()
        .skip(start.saturating_sub(1))
        .take(end.map_or(usize::MAX, |end| end.saturating_sub(start)))
        .collect();
    let keep = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);
    lines[..keep].join("\n")
}

struct ReadContext<'a> {
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn span(node: Node) -> Span {
        let point = node.start_position();
        Span::new(point.row + 1, point.column)
    }

    fn unsupported(node: Node) -> ReadError {
        ReadError::Unsupported {
            kind: node.kind().to_string(),
            span: Self::span(node),
        }
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>, ReadError> {
        node.child_by_field_name(name)
            .ok_or_else(|| ReadError::Parse(format!("{} missing {}", node.kind(), name)))
    }

    fn read_module(&self, tree: &Tree) -> Result<SyntaxNode, ReadError> {
        let root = tree.root_node();

        if root.has_error() {
            return Err(ReadError::Parse("syntax error in source".into()));
        }

        Ok(SyntaxNode::module(self.read_block(root)?).at(1, 0))
    }

    /// Statements directly under `node` (a module or block).
    fn read_block(&self, node: Node) -> Result<Vec<SyntaxNode>, ReadError> {
        let mut stmts = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            if let Some(stmt) = self.read_stmt(child)? {
                stmts.push(stmt);
            }
        }

        Ok(stmts)
    }

    fn read_stmt(&self, node: Node) -> Result<Option<SyntaxNode>, ReadError> {
        let span = Self::span(node);
        let stmt = match node.kind() {
            "comment" => return Ok(None),

            "expression_statement" => self.read_expression_statement(node)?,

            // Newer grammars hoist these out of `expression_statement`
            "assignment" => self.read_assignment(node)?,
            "augmented_assignment" => self.read_augmented_assignment(node)?,

            "function_definition" => self.read_function_definition(node)?,

            // Decorators are dropped; the definition stands alone
            "decorated_definition" => {
                let definition = self.field(node, "definition")?;
                return self.read_stmt(definition);
            }

            "return_statement" => {
                let value = self.first_named_child(node).map(|n| self.read_expr(n)).transpose()?;
                SyntaxNode::return_stmt(value)
            }

            "if_statement" => self.read_if_statement(node)?,
            "while_statement" => self.read_while_statement(node)?,
            "for_statement" => self.read_for_statement(node)?,

            "pass_statement" => SyntaxNode::pass(),
            "break_statement" => SyntaxNode::break_stmt(),
            "continue_statement" => SyntaxNode::continue_stmt(),

            "try_statement" => self.read_try_statement(node)?,
            "with_statement" => self.read_with_statement(node)?,

            "raise_statement" => {
                if node.child_by_field_name("cause").is_some() {
                    return Err(Self::unsupported(node));
                }
                let exception = self.first_named_child(node).map(|n| self.read_expr(n)).transpose()?;
                SyntaxNode::raise(exception)
            }

            "class_definition" => self.read_class_definition(node)?,

            "import_statement" => self.read_import(node, None)?,
            "import_from_statement" => {
                let module = self.field(node, "module_name")?;
                self.read_import(node, Some(self.node_text(module).to_string()))?
            }

            kind if kind.ends_with("_statement") => return Err(Self::unsupported(node)),

            // Bare expression at statement level: `g(x)`, `a, b`
            _ => SyntaxNode::expr_stmt(self.read_expr(node)?),
        };
        Ok(Some(SyntaxNode { span, ..stmt }))
    }

    fn first_named_child<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment");
        found
    }

    fn read_expression_statement(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let mut cursor = node.walk();
        let children: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect();

        match children.as_slice() {
            [single] if single.kind() == "assignment" => self.read_assignment(*single),
            [single] if single.kind() == "augmented_assignment" => {
                self.read_augmented_assignment(*single)
            }
            [single] => Ok(SyntaxNode::expr_stmt(self.read_expr(*single)?)),
            // `a, b` at statement level
            many => {
                let items = many
                    .iter()
                    .map(|child| self.read_expr(*child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SyntaxNode::expr_stmt(SyntaxNode::tuple(items).with_span(Self::span(node))))
            }
        }
    }

    fn read_assignment(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let left = self.field(node, "left")?;
        // `x: int` without a value declares nothing we can translate
        let right = node
            .child_by_field_name("right")
            .ok_or_else(|| Self::unsupported(node))?;

        // Chained assignment `a = b = 1`
        if right.kind() == "assignment" {
            return Err(Self::unsupported(right));
        }

        let target = self.read_target(left)?;
        let value = self.read_expr(right)?;
        Ok(SyntaxNode::assign(target, value))
    }

    fn read_augmented_assignment(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let left = self.field(node, "left")?;
        let right = self.field(node, "right")?;
        let op_node = self.field(node, "operator")?;

        let op_text = self.node_text(op_node);
        let op = Operator::from_symbol(op_text)
            .ok_or_else(|| ReadError::Parse(format!("unknown augmented op: {}", op_text)))?;

        Ok(SyntaxNode::aug_assign(
            self.read_target(left)?,
            op,
            self.read_expr(right)?,
        ))
    }

    /// Assignment and loop targets.
    fn read_target(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        match node.kind() {
            "pattern_list" | "tuple_pattern" => {
                let items = self.read_named_children(node, Self::read_target)?;
                Ok(SyntaxNode::tuple(items).with_span(Self::span(node)))
            }
            "list_pattern" => {
                let items = self.read_named_children(node, Self::read_target)?;
                Ok(SyntaxNode::list(items).with_span(Self::span(node)))
            }
            _ => self.read_expr(node),
        }
    }

    fn read_function_definition(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let name = self.field(node, "name")?;
        let body = self.field(node, "body")?;

        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.read_parameters(p))
            .transpose()?
            .unwrap_or_default();

        Ok(SyntaxNode::function(
            self.node_text(name),
            params,
            self.read_block(body)?,
        ))
    }

    fn read_parameters(&self, node: Node) -> Result<Vec<String>, ReadError> {
        let mut params = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    params.push(self.node_text(child).to_string());
                }
                "typed_parameter" => {
                    // Name first, type annotation ignored
                    match self.first_named_child(child) {
                        Some(name) if name.kind() == "identifier" => {
                            params.push(self.node_text(name).to_string());
                        }
                        _ => return Err(Self::unsupported(child)),
                    }
                }
                "comment" => {}
                // Defaults, *args, **kwargs, bare `*` and `/`
                _ => return Err(Self::unsupported(child)),
            }
        }

        Ok(params)
    }

    fn read_if_statement(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let test = self.read_expr(self.field(node, "condition")?)?;
        let body = self.read_block(self.field(node, "consequence")?)?;

        let mut cursor = node.walk();
        let alternatives: Vec<Node> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();

        // Fold `elif` chains into nested ifs, innermost last
        let mut orelse = Vec::new();
        for alt in alternatives.into_iter().rev() {
            match alt.kind() {
                "else_clause" => {
                    orelse = self.read_block(self.field(alt, "body")?)?;
                }
                "elif_clause" => {
                    let elif_test = self.read_expr(self.field(alt, "condition")?)?;
                    let elif_body = self.read_block(self.field(alt, "consequence")?)?;
                    let nested = SyntaxNode::if_stmt(elif_test, elif_body, orelse)
                        .with_span(Self::span(alt));
                    orelse = vec![nested];
                }
                _ => return Err(Self::unsupported(alt)),
            }
        }

        Ok(SyntaxNode::if_stmt(test, body, orelse))
    }

    fn read_while_statement(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        if let Some(alt) = node.child_by_field_name("alternative") {
            return Err(Self::unsupported(alt));
        }
        let test = self.read_expr(self.field(node, "condition")?)?;
        let body = self.read_block(self.field(node, "body")?)?;
        Ok(SyntaxNode::while_loop(test, body))
    }

    fn read_for_statement(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        if let Some(alt) = node.child_by_field_name("alternative") {
            return Err(Self::unsupported(alt));
        }
        let target = self.read_target(self.field(node, "left")?)?;
        let iter = self.read_expr(self.field(node, "right")?)?;
        let body = self.read_block(self.field(node, "body")?)?;
        Ok(SyntaxNode::for_loop(target, iter, body))
    }

    fn read_try_statement(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let body = self.read_block(self.field(node, "body")?)?;
        let mut handlers = Vec::new();
        let mut finalbody = Vec::new();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "except_clause" => handlers.push(self.read_except_clause(child)?),
                "finally_clause" => {
                    let block = self
                        .block_child(child)
                        .ok_or_else(|| ReadError::Parse("finally_clause missing block".into()))?;
                    finalbody = self.read_block(block)?;
                }
                "block" | "comment" => {}
                // try/else, except*
                _ => return Err(Self::unsupported(child)),
            }
        }

        Ok(SyntaxNode::new(Node_::Try(Try {
            body,
            handlers,
            finalbody,
        })))
    }

    fn block_child<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "block");
        found
    }

    fn read_except_clause(&self, node: Node) -> Result<ExceptHandler, ReadError> {
        let mut exception = None;
        let mut name = None;
        let mut body = Vec::new();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "block" => body = self.read_block(child)?,
                "comment" => {}
                // `except E as e` in grammars that wrap it in a pattern
                "as_pattern" => {
                    let (value, alias) = self.read_as_pattern(child)?;
                    exception = Some(value);
                    name = alias;
                }
                _ if exception.is_none() => exception = Some(self.read_expr(child)?),
                _ if name.is_none() => name = Some(self.node_text(child).to_string()),
                _ => return Err(Self::unsupported(child)),
            }
        }

        Ok(ExceptHandler {
            span: Self::span(node),
            exception,
            name,
            body,
        })
    }

    /// `value as alias`
    fn read_as_pattern(&self, node: Node) -> Result<(SyntaxNode, Option<String>), ReadError> {
        let value = self
            .first_named_child(node)
            .ok_or_else(|| ReadError::Parse("as_pattern missing value".into()))?;
        let alias = node
            .child_by_field_name("alias")
            .map(|alias| self.node_text(alias).to_string());
        Ok((self.read_expr(value)?, alias))
    }

    fn read_with_statement(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let body = self.read_block(self.field(node, "body")?)?;
        let mut items = Vec::new();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "with_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for item in child.named_children(&mut clause_cursor) {
                if item.kind() != "with_item" {
                    continue;
                }
                let value = self.field(item, "value")?;
                let (context, alias) = if value.kind() == "as_pattern" {
                    self.read_as_pattern(value)?
                } else {
                    (self.read_expr(value)?, None)
                };
                items.push(WithItem { context, alias });
            }
        }

        Ok(SyntaxNode::new(Node_::With(With { items, body })))
    }

    fn read_class_definition(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let name = self.field(node, "name")?;
        let body = self.read_block(self.field(node, "body")?)?;
        let bases = match node.child_by_field_name("superclasses") {
            Some(list) => match self.read_arguments(list)? {
                (bases, keywords) if keywords.is_empty() => bases,
                // `metaclass=M` and other class keywords
                _ => return Err(Self::unsupported(list)),
            },
            None => Vec::new(),
        };

        Ok(SyntaxNode::new(Node_::ClassDef(ClassDef {
            name: self.node_text(name).to_string(),
            bases,
            body,
        })))
    }

    fn read_import(&self, node: Node, module: Option<String>) -> Result<SyntaxNode, ReadError> {
        let mut names = Vec::new();

        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            match child.kind() {
                "dotted_name" => names.push(Alias {
                    name: self.node_text(child).to_string(),
                    alias: None,
                }),
                "aliased_import" => {
                    let name = self.field(child, "name")?;
                    let alias = self.field(child, "alias")?;
                    names.push(Alias {
                        name: self.node_text(name).to_string(),
                        alias: Some(self.node_text(alias).to_string()),
                    });
                }
                _ => return Err(Self::unsupported(child)),
            }
        }

        // `from m import *`
        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import")
        {
            names.push(Alias {
                name: "*".into(),
                alias: None,
            });
        }

        Ok(SyntaxNode::new(Node_::Import(Import { module, names })))
    }

    fn read_named_children(
        &self,
        node: Node,
        read: fn(&Self, Node) -> Result<SyntaxNode, ReadError>,
    ) -> Result<Vec<SyntaxNode>, ReadError> {
        let mut items = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            if child.kind() != "comment" {
                items.push(read(self, child)?);
            }
        }

        Ok(items)
    }

    fn read_expr(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let span = Self::span(node);
        let expr = match node.kind() {
            "identifier" => SyntaxNode::name(self.node_text(node)),

            // Literals
            "integer" => SyntaxNode::int(self.read_integer(node)?),
            "float" => {
                let text = self.node_text(node).replace('_', "");
                let value: f64 = text.parse().map_err(|_| Self::unsupported(node))?;
                SyntaxNode::float(value)
            }
            "string" => SyntaxNode::string(self.read_string(node)?),
            "concatenated_string" => {
                let mut value = String::new();
                let mut cursor = node.walk();
                for part in node.named_children(&mut cursor) {
                    if part.kind() == "string" {
                        value.push_str(&self.read_string(part)?);
                    }
                }
                SyntaxNode::string(value)
            }
            "true" => SyntaxNode::bool(true),
            "false" => SyntaxNode::bool(false),
            "none" => SyntaxNode::none(),

            // Operators
            "binary_operator" => {
                let left = self.field(node, "left")?;
                let right = self.field(node, "right")?;
                let op_text = self.node_text(self.field(node, "operator")?);
                let op = Operator::from_symbol(op_text)
                    .ok_or_else(|| ReadError::Parse(format!("unknown binary op: {}", op_text)))?;
                SyntaxNode::bin_op(self.read_expr(left)?, op, self.read_expr(right)?)
            }
            "comparison_operator" => self.read_comparison_operator(node)?,
            "boolean_operator" => self.read_boolean_operator(node)?,
            "unary_operator" => {
                let arg = self.field(node, "argument")?;
                let op_text = self.node_text(self.field(node, "operator")?);
                let op = UnaryOperator::from_symbol(op_text)
                    .ok_or_else(|| ReadError::Parse(format!("unknown unary op: {}", op_text)))?;
                SyntaxNode::unary(op, self.read_expr(arg)?)
            }
            "not_operator" => {
                let arg = self.field(node, "argument")?;
                SyntaxNode::unary(UnaryOperator::Not, self.read_expr(arg)?)
            }

            "call" => self.read_call(node)?,

            "attribute" => {
                let object = self.field(node, "object")?;
                let attr = self.field(node, "attribute")?;
                SyntaxNode::attribute(self.read_expr(object)?, self.node_text(attr))
            }

            "subscript" => self.read_subscript(node)?,
            "slice" => self.read_slice(node)?,

            "list" => SyntaxNode::list(self.read_named_children(node, Self::read_expr)?),
            "tuple" | "tuple_expression" | "expression_list" => {
                SyntaxNode::tuple(self.read_named_children(node, Self::read_expr)?)
            }
            "dictionary" => self.read_dictionary(node)?,

            "parenthesized_expression" => {
                let inner = self.first_named_child(node).ok_or_else(|| {
                    ReadError::Parse("parenthesized_expression missing inner".into())
                })?;
                // Parentheses carry no node of their own
                return self.read_expr(inner);
            }

            "conditional_expression" => {
                let mut cursor = node.walk();
                let parts: Vec<Node> = node
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() != "comment")
                    .collect();
                let [body, test, orelse] = parts.as_slice() else {
                    return Err(ReadError::Parse(
                        "conditional_expression needs 3 parts".into(),
                    ));
                };
                SyntaxNode::if_exp(
                    self.read_expr(*test)?,
                    self.read_expr(*body)?,
                    self.read_expr(*orelse)?,
                )
            }

            "lambda" => {
                let body = self.field(node, "body")?;
                let params = node
                    .child_by_field_name("parameters")
                    .map(|p| self.read_parameters(p))
                    .transpose()?
                    .unwrap_or_default();
                SyntaxNode::lambda(params, self.read_expr(body)?)
            }

            _ => return Err(Self::unsupported(node)),
        };
        Ok(expr.with_span(span))
    }

    fn read_integer(&self, node: Node) -> Result<i64, ReadError> {
        let text = self.node_text(node).replace('_', "");
        let lower = text.to_ascii_lowercase();
        let parsed = if let Some(hex) = lower.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else if let Some(oct) = lower.strip_prefix("0o") {
            i64::from_str_radix(oct, 8)
        } else if let Some(bin) = lower.strip_prefix("0b") {
            i64::from_str_radix(bin, 2)
        } else {
            lower.parse()
        };
        parsed.map_err(|_| Self::unsupported(node))
    }

    fn read_string(&self, node: Node) -> Result<String, ReadError> {
        let text = self.node_text(node);
        let prefix_len = text
            .find(|c: char| c == '"' || c == '\'')
            .ok_or_else(|| ReadError::Parse(format!("malformed string: {}", text)))?;
        let prefix = text[..prefix_len].to_ascii_lowercase();

        // f-strings and bytes have no literal equivalent
        if prefix.contains('f') || prefix.contains('b') {
            return Err(Self::unsupported(node));
        }

        let quoted = &text[prefix_len..];
        let quote = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
            &quoted[..3]
        } else {
            &quoted[..1]
        };
        let inner = quoted
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .ok_or_else(|| ReadError::Parse(format!("malformed string: {}", text)))?;

        if prefix.contains('r') {
            Ok(inner.to_string())
        } else {
            Ok(unescape(inner))
        }
    }

    fn read_comparison_operator(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            if child.is_named() {
                operands.push(self.read_expr(child)?);
            } else {
                let op_text = self.node_text(child);
                let op = CmpOp::from_symbol(op_text)
                    .ok_or_else(|| ReadError::Parse(format!("unknown comparison op: {}", op_text)))?;
                ops.push(op);
            }
        }

        if operands.len() < 2 || operands.len() != ops.len() + 1 {
            return Err(ReadError::Parse(
                "comparison needs an operator between each operand".into(),
            ));
        }

        let mut operands = operands.into_iter();
        let left = operands.next().ok_or_else(|| {
            ReadError::Parse("comparison missing left operand".into())
        })?;
        Ok(SyntaxNode::compare(left, ops.into_iter().zip(operands).collect()))
    }

    fn read_boolean_operator(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let left = self.field(node, "left")?;
        let right = self.field(node, "right")?;
        let op = match self.node_text(self.field(node, "operator")?) {
            "and" => BoolOperator::And,
            "or" => BoolOperator::Or,
            other => {
                return Err(ReadError::Parse(format!("unknown boolean op: {}", other)));
            }
        };

        // `a and b and c` is one operation over three values
        let mut values = Vec::new();
        let left_expr = self.read_expr(left)?;
        match left_expr.node {
            Node_::BoolOp(inner) if left.kind() == "boolean_operator" && inner.op == op => {
                values.extend(inner.values);
            }
            node => values.push(SyntaxNode {
                span: left_expr.span,
                node,
            }),
        }
        values.push(self.read_expr(right)?);

        Ok(SyntaxNode::bool_op(op, values))
    }

    fn read_call(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let function = self.field(node, "function")?;
        let arguments = self.field(node, "arguments")?;

        if arguments.kind() != "argument_list" {
            // f(x for x in xs)
            return Err(Self::unsupported(arguments));
        }

        let (args, keywords) = self.read_arguments(arguments)?;
        Ok(SyntaxNode::call_with_keywords(
            self.read_expr(function)?,
            args,
            keywords,
        ))
    }

    fn read_arguments(&self, node: Node) -> Result<(Vec<SyntaxNode>, Vec<Keyword>), ReadError> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {}
                "keyword_argument" => {
                    let name = self.field(child, "name")?;
                    let value = self.field(child, "value")?;
                    keywords.push(Keyword::new(self.node_text(name), self.read_expr(value)?));
                }
                "list_splat" | "dictionary_splat" => return Err(Self::unsupported(child)),
                _ => args.push(self.read_expr(child)?),
            }
        }

        Ok((args, keywords))
    }

    fn read_subscript(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let value = self.read_expr(self.field(node, "value")?)?;

        let mut cursor = node.walk();
        let indices: Vec<Node> = node
            .children_by_field_name("subscript", &mut cursor)
            .collect();

        let index = match indices.as_slice() {
            [] => return Err(ReadError::Parse("subscript missing subscript".into())),
            [single] => self.read_expr(*single)?,
            // x[i, j]
            many => {
                let items = many
                    .iter()
                    .map(|child| self.read_expr(*child))
                    .collect::<Result<Vec<_>, _>>()?;
                SyntaxNode::tuple(items).with_span(Self::span(many[0]))
            }
        };

        Ok(SyntaxNode::subscript(value, index))
    }

    fn read_slice(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let mut parts: [Option<SyntaxNode>; 3] = [None, None, None];
        let mut colons = 0;
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            if child.kind() == ":" {
                colons += 1;
            } else if child.is_named() && child.kind() != "comment" {
                let slot = parts
                    .get_mut(colons)
                    .ok_or_else(|| ReadError::Parse("slice has too many parts".into()))?;
                *slot = Some(self.read_expr(child)?);
            }
        }

        let [lower, upper, step] = parts;
        Ok(SyntaxNode::slice(lower, upper, step))
    }

    fn read_dictionary(&self, node: Node) -> Result<SyntaxNode, ReadError> {
        let mut entries = Vec::new();
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "pair" => {
                    let key = self.field(child, "key")?;
                    let value = self.field(child, "value")?;
                    entries.push((self.read_expr(key)?, self.read_expr(value)?));
                }
                "comment" => {}
                _ => return Err(Self::unsupported(child)),
            }
        }

        Ok(SyntaxNode::dict(entries))
    }
}

/// Resolve backslash escapes in a non-raw string body.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Line continuation
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(source: &str) -> Vec<SyntaxNode> {
        match read_python(source).unwrap().node {
            Node_::Module(m) => m.body,
            other => panic!("expected Module, got {:?}", other.kind()),
        }
    }

    fn only_expr(source: &str) -> SyntaxNode {
        match body(source).remove(0).node {
            Node_::ExprStmt(expr) => *expr,
            other => panic!("expected Expr, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_simple_assignment() {
        let stmts = body("x = 42");
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].structure_eq(&SyntaxNode::assign(
            SyntaxNode::name("x"),
            SyntaxNode::int(42)
        )));
    }

    #[test]
    fn test_spans_are_recorded() {
        let stmts = body("\n\nx = 42");
        assert_eq!(stmts[0].span, Span::new(3, 0));
        match &stmts[0].node {
            Node_::Assign(a) => assert_eq!(a.value.span, Span::new(3, 4)),
            other => panic!("expected Assign, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_function_declaration() {
        let stmts = body("def add(a, b, c: int):\n    return a + b");
        match &stmts[0].node {
            Node_::FunctionDef(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params, vec!["a", "b", "c"]);
                assert_eq!(f.body.len(), 1);
            }
            other => panic!("expected FunctionDef, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_default_parameter_is_unsupported() {
        let err = read_python("def f(a, b=2):\n    return a + b\n").unwrap_err();
        match err {
            ReadError::Unsupported { kind, span } => {
                assert_eq!(kind, "default_parameter");
                assert_eq!(span, Span::new(1, 9));
            }
            other => panic!("expected Unsupported, got {other}"),
        }
        assert!(matches!(
            read_python("g = lambda x=1: x"),
            Err(ReadError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_function_body_statements() {
        let stmts = body("def f(xs):\n    i = 0\n    i += 1\n    g(xs)\n    return i, xs\n");
        let expected = SyntaxNode::function(
            "f",
            vec!["xs".into()],
            vec![
                SyntaxNode::assign(SyntaxNode::name("i"), SyntaxNode::int(0)),
                SyntaxNode::aug_assign(SyntaxNode::name("i"), Operator::Add, SyntaxNode::int(1)),
                SyntaxNode::expr_stmt(SyntaxNode::call(
                    SyntaxNode::name("g"),
                    vec![SyntaxNode::name("xs")],
                )),
                SyntaxNode::return_stmt(Some(SyntaxNode::tuple(vec![
                    SyntaxNode::name("i"),
                    SyntaxNode::name("xs"),
                ]))),
            ],
        );
        assert!(stmts[0].structure_eq(&expected), "{:?}", stmts[0]);
    }

    #[test]
    fn test_statement_spans() {
        let stmts = body("def f():\n    i = 0\n    g(i)\n");
        match &stmts[0].node {
            Node_::FunctionDef(f) => {
                assert_eq!(f.body[0].span, Span::new(2, 4));
                assert_eq!(f.body[1].span, Span::new(3, 4));
                assert_eq!(f.body[1].kind(), NodeKind::ExprStmt);
            }
            other => panic!("expected FunctionDef, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_tuple_statement_and_unpacking() {
        let stmts = body("a, b = b, a\na, b");
        let expected = SyntaxNode::assign(
            SyntaxNode::tuple(vec![SyntaxNode::name("a"), SyntaxNode::name("b")]),
            SyntaxNode::tuple(vec![SyntaxNode::name("b"), SyntaxNode::name("a")]),
        );
        assert!(stmts[0].structure_eq(&expected));
        assert!(stmts[1].structure_eq(&SyntaxNode::expr_stmt(SyntaxNode::tuple(vec![
            SyntaxNode::name("a"),
            SyntaxNode::name("b"),
        ]))));
    }

    #[test]
    fn test_class_keywords_are_unsupported() {
        assert!(matches!(
            read_python("class C(Base, metaclass=M):\n    pass\n"),
            Err(ReadError::Unsupported { kind, .. }) if kind == "argument_list"
        ));
        let stmts = body("class C(Base):\n    pass\n");
        assert_eq!(stmts[0].kind(), NodeKind::ClassDef);
    }

    #[test]
    fn test_decorator_is_dropped() {
        let stmts = body("@Phylanx\ndef f():\n    return 1");
        assert_eq!(stmts[0].kind(), NodeKind::FunctionDef);
        assert_eq!(stmts[0].span, Span::new(2, 0));
    }

    #[test]
    fn test_elif_chain_nests() {
        let stmts = body("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3");
        let expected = SyntaxNode::if_stmt(
            SyntaxNode::name("a"),
            vec![SyntaxNode::assign(SyntaxNode::name("x"), SyntaxNode::int(1))],
            vec![SyntaxNode::if_stmt(
                SyntaxNode::name("b"),
                vec![SyntaxNode::assign(SyntaxNode::name("x"), SyntaxNode::int(2))],
                vec![SyntaxNode::assign(SyntaxNode::name("x"), SyntaxNode::int(3))],
            )],
        );
        assert!(stmts[0].structure_eq(&expected));
    }

    #[test]
    fn test_chained_comparison() {
        let expr = only_expr("0 < x <= 10");
        let expected = SyntaxNode::compare(
            SyntaxNode::int(0),
            vec![
                (CmpOp::Lt, SyntaxNode::name("x")),
                (CmpOp::LtE, SyntaxNode::int(10)),
            ],
        );
        assert!(expr.structure_eq(&expected));
    }

    #[test]
    fn test_not_in_comparison() {
        let expr = only_expr("x not in xs");
        match expr.node {
            Node_::Compare(c) => assert_eq!(c.ops, vec![CmpOp::NotIn]),
            other => panic!("expected Compare, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_boolean_operators_flatten() {
        let expr = only_expr("a and b and c");
        match expr.node {
            Node_::BoolOp(b) => {
                assert_eq!(b.op, BoolOperator::And);
                assert_eq!(b.values.len(), 3);
            }
            other => panic!("expected BoolOp, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_call_with_keywords() {
        let expr = only_expr("np.sum(x, axis=0)");
        let expected = SyntaxNode::call_with_keywords(
            SyntaxNode::attribute(SyntaxNode::name("np"), "sum"),
            vec![SyntaxNode::name("x")],
            vec![Keyword::new("axis", SyntaxNode::int(0))],
        );
        assert!(expr.structure_eq(&expected));
    }

    #[test]
    fn test_subscript_and_slice() {
        let expr = only_expr("x[1:, ::2]");
        let expected = SyntaxNode::subscript(
            SyntaxNode::name("x"),
            SyntaxNode::tuple(vec![
                SyntaxNode::slice(Some(SyntaxNode::int(1)), None, None),
                SyntaxNode::slice(None, None, Some(SyntaxNode::int(2))),
            ]),
        );
        assert!(expr.structure_eq(&expected));
    }

    #[test]
    fn test_literals() {
        assert!(only_expr("0x1F").structure_eq(&SyntaxNode::int(31)));
        assert!(only_expr("1_000").structure_eq(&SyntaxNode::int(1000)));
        assert!(only_expr("2.5").structure_eq(&SyntaxNode::float(2.5)));
        assert!(only_expr("'a\\tb'").structure_eq(&SyntaxNode::string("a\tb")));
        assert!(only_expr("r'a\\tb'").structure_eq(&SyntaxNode::string("a\\tb")));
        assert!(only_expr("None").structure_eq(&SyntaxNode::none()));
    }

    #[test]
    fn test_unsupported_construct() {
        let err = read_python("def f():\n    global x\n").unwrap_err();
        match err {
            ReadError::Unsupported { kind, span } => {
                assert_eq!(kind, "global_statement");
                assert_eq!(span, Span::new(2, 4));
            }
            other => panic!("expected Unsupported, got {other}"),
        }
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            read_python("def f(:\n"),
            Err(ReadError::Parse(_))
        ));
    }

    #[test]
    fn test_try_statement() {
        let stmts = body("try:\n    f()\nexcept ValueError as e:\n    g(e)\nfinally:\n    h()");
        match &stmts[0].node {
            Node_::Try(t) => {
                assert_eq!(t.body.len(), 1);
                assert_eq!(t.handlers.len(), 1);
                assert_eq!(t.handlers[0].name.as_deref(), Some("e"));
                assert_eq!(t.finalbody.len(), 1);
            }
            other => panic!("expected Try, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_imports() {
        let stmts = body("import numpy as np\nfrom math import sqrt");
        assert_eq!(
            stmts[0].node,
            Node_::Import(Import {
                module: None,
                names: vec![Alias {
                    name: "numpy".into(),
                    alias: Some("np".into()),
                }],
            })
        );
        assert_eq!(
            stmts[1].node,
            Node_::Import(Import {
                module: Some("math".into()),
                names: vec![Alias {
                    name: "sqrt".into(),
                    alias: None,
                }],
            })
        );
    }

    #[test]
    fn test_tasks_from_source() {
        let source = "import numpy as np\n\ndef f(x):\n    return x\n\n\ndef g():\n    return 2\n";
        let tasks = tasks_from_source(source).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].function().name(), "f");
        assert_eq!(tasks[0].function().line(), 3);
        assert_eq!(tasks[0].function().source(), "def f(x):\n    return x");
        assert_eq!(tasks[1].function().source(), "def g():\n    return 2");
        assert_eq!(tasks[1].syntax_tree().kind(), NodeKind::Module);
    }

    #[test]
    fn test_task_for_missing_function() {
        let err = task_for("def f():\n    pass\n", "g").unwrap_err();
        assert!(matches!(err, ReadError::FunctionNotFound(name) if name == "g"));
    }
}
