//! Dispatch engine.
//!
//! [`walk`] routes one node to the handler for its kind and turns a missing
//! handler into [`TranspileError::UnimplementedTransformation`].
//! [`build_transpiler`] is the only way to obtain a transpiler: it creates
//! the backend state and runs the whole translation before returning, so a
//! caller either gets a complete translation or an error, never an instance
//! in between.

use crate::ast::{Node, SyntaxNode};
use crate::config::TranspileConfig;
use crate::task::{SourceFn, Task};
use crate::traits::{TranspileError, Transpiler, Visitor};
use std::fmt;
use tracing::{debug, debug_span, trace};

/// Proof that a transpiler is being created by [`build_transpiler`].
///
/// Carries the task and configuration the backend may read while setting
/// up its state.
pub struct Construction<'a> {
    task: &'a Task,
    config: &'a TranspileConfig,
}

impl<'a> Construction<'a> {
    pub fn task(&self) -> &'a Task {
        self.task
    }

    pub fn function(&self) -> &'a SourceFn {
        self.task.function()
    }

    pub fn config(&self) -> &'a TranspileConfig {
        self.config
    }
}

/// Dispatch `node` to the visitor's handler for its kind.
///
/// A handler returning `None` means there is no rule for this node; the
/// whole traversal aborts with an error naming it.
pub fn walk<V: Visitor + ?Sized>(
    visitor: &mut V,
    node: &SyntaxNode,
) -> Result<V::Fragment, TranspileError> {
    trace!(kind = %node.kind(), span = %node.span, "walk");
    let span = node.span;
    let fragment = match &node.node {
        Node::Module(n) => visitor.visit_module(span, n),
        Node::FunctionDef(n) => visitor.visit_function_def(span, n),
        Node::Return(value) => visitor.visit_return(span, value.as_deref()),
        Node::Assign(n) => visitor.visit_assign(span, n),
        Node::AugAssign(n) => visitor.visit_aug_assign(span, n),
        Node::ExprStmt(expr) => visitor.visit_expr_stmt(span, expr),
        Node::If(n) => visitor.visit_if(span, n),
        Node::While(n) => visitor.visit_while(span, n),
        Node::For(n) => visitor.visit_for(span, n),
        Node::Pass => visitor.visit_pass(span),
        Node::Break => visitor.visit_break(span),
        Node::Continue => visitor.visit_continue(span),
        Node::Try(n) => visitor.visit_try(span, n),
        Node::With(n) => visitor.visit_with(span, n),
        Node::Raise(exception) => visitor.visit_raise(span, exception.as_deref()),
        Node::ClassDef(n) => visitor.visit_class_def(span, n),
        Node::Import(n) => visitor.visit_import(span, n),
        Node::Name(id) => visitor.visit_name(span, id),
        Node::Constant(value) => visitor.visit_constant(span, value),
        Node::BinOp(n) => visitor.visit_bin_op(span, n),
        Node::UnaryOp(n) => visitor.visit_unary_op(span, n),
        Node::Compare(n) => visitor.visit_compare(span, n),
        Node::BoolOp(n) => visitor.visit_bool_op(span, n),
        Node::Call(n) => visitor.visit_call(span, n),
        Node::Attribute(n) => visitor.visit_attribute(span, n),
        Node::Subscript(n) => visitor.visit_subscript(span, n),
        Node::Slice(n) => visitor.visit_slice(span, n),
        Node::List(items) => visitor.visit_list(span, items),
        Node::Tuple(items) => visitor.visit_tuple(span, items),
        Node::Dict(n) => visitor.visit_dict(span, n),
        Node::IfExp(n) => visitor.visit_if_exp(span, n),
        Node::Lambda(n) => visitor.visit_lambda(span, n),
    }?;
    fragment.ok_or_else(|| TranspileError::unimplemented(node))
}

/// Walk each node in order, stopping at the first failure.
pub fn walk_all<V: Visitor + ?Sized>(
    visitor: &mut V,
    nodes: &[SyntaxNode],
) -> Result<Vec<V::Fragment>, TranspileError> {
    nodes.iter().map(|node| walk(&mut *visitor, node)).collect()
}

/// A transpiler that has translated its whole task.
#[derive(Debug)]
pub struct Transpiled<'t, T> {
    task: &'t Task,
    transpiler: T,
}

impl<'t, T> Transpiled<'t, T> {
    pub fn task(&self) -> &'t Task {
        self.task
    }

    pub fn function(&self) -> &'t SourceFn {
        self.task.function()
    }

    pub fn transpiler(&self) -> &T {
        &self.transpiler
    }

    pub fn into_inner(self) -> T {
        self.transpiler
    }
}

impl<T: fmt::Display> fmt::Display for Transpiled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.transpiler.fmt(f)
    }
}

/// Create a transpiler for `task` with default configuration and run it.
pub fn build_transpiler<T: Transpiler>(task: &Task) -> Result<Transpiled<'_, T>, TranspileError> {
    build_transpiler_with(task, &TranspileConfig::default())
}

/// Create a transpiler for `task` and run it over the task's syntax tree.
pub fn build_transpiler_with<'t, T: Transpiler>(
    task: &'t Task,
    config: &TranspileConfig,
) -> Result<Transpiled<'t, T>, TranspileError> {
    let _span = debug_span!(
        "transpile",
        function = task.function().name(),
        backend = std::any::type_name::<T>()
    )
    .entered();

    let root = task.syntax_tree();
    debug!(nodes = root.descendants().count(), "transpiling");

    let mut transpiler = T::new(Construction { task, config });
    if let Err(err) = transpiler.transpile(root) {
        debug!(error = %err, "transpilation failed");
        return Err(err);
    }

    Ok(Transpiled { task, transpiler })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDef, Literal, Module, NodeKind, Span};
    use crate::traits::Visit;

    /// Handles functions whose bodies are integer literals, nothing else.
    #[derive(Debug)]
    struct Literals {
        function: String,
        visits: usize,
        output: String,
    }

    impl Visitor for Literals {
        type Fragment = String;

        fn visit_module(&mut self, _span: Span, node: &Module) -> Visit<String> {
            self.visits += 1;
            Ok(Some(walk_all(self, &node.body)?.join("\n")))
        }

        fn visit_function_def(&mut self, _span: Span, node: &FunctionDef) -> Visit<String> {
            self.visits += 1;
            Ok(Some(walk_all(self, &node.body)?.join("; ")))
        }

        fn visit_return(&mut self, _span: Span, value: Option<&SyntaxNode>) -> Visit<String> {
            self.visits += 1;
            value.map(|v| walk(self, v)).transpose()
        }

        fn visit_expr_stmt(&mut self, _span: Span, expr: &SyntaxNode) -> Visit<String> {
            self.visits += 1;
            walk(self, expr).map(Some)
        }

        fn visit_constant(&mut self, _span: Span, value: &Literal) -> Visit<String> {
            self.visits += 1;
            match value {
                Literal::Int(n) => Ok(Some(n.to_string())),
                _ => Ok(None),
            }
        }
    }

    impl Transpiler for Literals {
        fn new(cx: Construction<'_>) -> Self {
            Self {
                function: cx.function().name().to_string(),
                visits: 0,
                output: String::new(),
            }
        }

        fn transpile(&mut self, root: &SyntaxNode) -> Result<(), TranspileError> {
            self.output = walk(self, root)?;
            Ok(())
        }
    }

    impl fmt::Display for Literals {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.output)
        }
    }

    fn task_returning(value: SyntaxNode) -> Task {
        Task::from_tree(SyntaxNode::module(vec![SyntaxNode::function(
            "f",
            vec![],
            vec![SyntaxNode::return_stmt(Some(value))],
        )]))
    }

    #[test]
    fn test_literal_function() {
        let task = task_returning(SyntaxNode::int(1));
        let transpiled = build_transpiler::<Literals>(&task).unwrap();
        assert_eq!(transpiled.to_string(), "1");
        assert_eq!(transpiled.function().name(), "f");
        assert_eq!(transpiled.transpiler().function, "f");
    }

    #[test]
    fn test_missing_handler_names_node() {
        let task = Task::from_tree(SyntaxNode::module(vec![SyntaxNode::function(
            "f",
            vec![],
            vec![SyntaxNode::while_loop(SyntaxNode::bool(true), vec![SyntaxNode::pass()]).at(2, 4)],
        )]));
        let err = build_transpiler::<Literals>(&task).unwrap_err();
        assert_eq!(
            err,
            TranspileError::UnimplementedTransformation {
                kind: NodeKind::While,
                span: Span::new(2, 4),
            }
        );
        assert_eq!(
            err.to_string(),
            "transformation rule for While at 2:4 is not implemented"
        );
    }

    #[test]
    fn test_failure_propagates_from_nested_walk() {
        let task = task_returning(SyntaxNode::bin_op(
            SyntaxNode::int(1),
            crate::ast::Operator::Add,
            SyntaxNode::int(2),
        ));
        let err = build_transpiler::<Literals>(&task).unwrap_err();
        assert_eq!(err.kind(), NodeKind::BinOp);
    }

    #[test]
    fn test_handler_declining_is_unimplemented() {
        let task = task_returning(SyntaxNode::string("one").at(1, 11));
        let err = build_transpiler::<Literals>(&task).unwrap_err();
        assert_eq!(err.kind(), NodeKind::Constant);
        assert_eq!(err.span(), Span::new(1, 11));
    }

    #[test]
    fn test_walk_all_stops_at_first_failure() {
        let task = task_returning(SyntaxNode::int(0));
        let mut literals = build_transpiler::<Literals>(&task).unwrap().into_inner();
        let nodes = vec![
            SyntaxNode::int(1),
            SyntaxNode::while_loop(SyntaxNode::bool(true), vec![]),
            SyntaxNode::string("x"),
        ];
        let err = walk_all(&mut literals, &nodes).unwrap_err();
        assert_eq!(err.kind(), NodeKind::While);
    }

    #[test]
    fn test_each_node_visited_once() {
        let task = task_returning(SyntaxNode::int(7));
        let transpiled = build_transpiler::<Literals>(&task).unwrap();
        let nodes = task.syntax_tree().descendants().count();
        assert_eq!(transpiled.transpiler().visits, nodes);
    }

    #[test]
    fn test_walk_is_deterministic() {
        let task = task_returning(SyntaxNode::int(3));
        let before = task.syntax_tree().clone();
        let mut literals = build_transpiler::<Literals>(&task).unwrap().into_inner();

        let first = walk(&mut literals, task.syntax_tree()).unwrap();
        let second = walk(&mut literals, task.syntax_tree()).unwrap();
        assert_eq!(first, second);
        assert_eq!(task.syntax_tree(), &before);
    }

    #[test]
    fn test_instances_are_independent() {
        let one = task_returning(SyntaxNode::int(1));
        let two = task_returning(SyntaxNode::int(2));
        let a = build_transpiler::<Literals>(&one).unwrap();
        let b = build_transpiler::<Literals>(&two).unwrap();
        assert_eq!(a.to_string(), "1");
        assert_eq!(b.to_string(), "2");
    }
}
