//! Input readers - parse source code into syntax trees and tasks.

#[cfg(feature = "read-python")]
pub mod python;

#[cfg(feature = "read-python")]
pub use python::{PYTHON_READER, PythonReader, read_python, task_for, tasks_from_source};
