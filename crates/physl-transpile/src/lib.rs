//! Visitor-dispatch transpilation of Python functions.
//!
//! `physl-transpile` parses a Python function into a syntax tree, bundles it
//! as a [`Task`], and hands it to a backend that rewrites every node into the
//! target language. The main target is PhySL, the expression language
//! Phylanx compiles into execution trees.
//!
//! # Architecture
//!
//! ```text
//! Python source          Task                  Backends
//! ─────────────    ─────────────────    ─────────────────────
//!                                    ┌─> physl   define(f, x, ...)
//! def f(x): ... ─> SourceFn + tree ──┼─> python  def f(x): ...
//!  (input/)          (task.rs)       └─> sexpr   ["std.fn", ...]
//! ```
//!
//! Each backend is a [`Visitor`] with one handler per node kind. [`walk`]
//! dispatches a node to its handler; a handler that returns `None` has no rule
//! for that node and the translation aborts with
//! [`TranspileError::UnimplementedTransformation`] naming the node's kind and
//! position. [`build_transpiler`] is the only way to get a transpiler, and it
//! returns either a fully translated instance or that error.
//!
//! # Example
//!
//! ```ignore
//! use physl_transpile::{PhyslTranspiler, build_transpiler, task_for};
//!
//! let task = task_for("def add(a, b):\n    return a + b\n", "add")?;
//! let physl = build_transpiler::<PhyslTranspiler>(&task)?;
//! assert_eq!(physl.to_string(), "define(add, a, b, __add(a, b))");
//! ```

pub mod ast;
pub mod config;
pub mod input;
pub mod output;
pub mod registry;
pub mod task;
pub mod traits;
pub mod transpiler;

// Re-exports: syntax tree
pub use ast::{Literal, Node, NodeKind, Span, StructureEq, SyntaxNode};

// Re-exports: tasks and configuration
pub use config::{ConfigError, TranspileConfig};
pub use task::{SourceFn, Task};

// Re-exports: traits and errors
pub use traits::{Backend, Error, ReadError, Reader, TranspileError, Transpiler, Visit, Visitor};

// Re-exports: dispatch
pub use transpiler::{
    Construction, Transpiled, build_transpiler, build_transpiler_with, walk, walk_all,
};

// Re-exports: registry
pub use registry::{
    backend_for_name, backends, reader_for_extension, reader_for_language, readers,
    register_backend, register_reader, transpile,
};

// Re-exports: built-in readers
#[cfg(feature = "read-python")]
pub use input::{PYTHON_READER, PythonReader, read_python, task_for, tasks_from_source};

// Re-exports: built-in backends
#[cfg(feature = "write-physl")]
pub use output::{PHYSL_BACKEND, PhyslBackend, PhyslTranspiler};
#[cfg(feature = "write-python")]
pub use output::{PYTHON_BACKEND, PythonBackend, PythonTranspiler};
#[cfg(feature = "write-sexpr")]
pub use output::{SEXPR_BACKEND, SexprBackend, SexprTranspiler};
