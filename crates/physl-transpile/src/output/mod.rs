//! Output backends - translate tasks into target source.

#[cfg(feature = "write-physl")]
pub mod physl;
#[cfg(feature = "write-python")]
pub mod python;
#[cfg(feature = "write-sexpr")]
pub mod sexpr;

#[cfg(feature = "write-physl")]
pub use physl::{PHYSL_BACKEND, PhyslBackend, PhyslTranspiler};
#[cfg(feature = "write-python")]
pub use python::{PYTHON_BACKEND, PythonBackend, PythonTranspiler};
#[cfg(feature = "write-sexpr")]
pub use sexpr::{SEXPR_BACKEND, SexprBackend, SexprTranspiler};
