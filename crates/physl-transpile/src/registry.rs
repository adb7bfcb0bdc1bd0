//! Registry for readers and backends.

use crate::config::TranspileConfig;
use crate::task::Task;
use crate::traits::{Backend, Error, Reader};
use std::sync::{OnceLock, RwLock};

/// Global reader registry.
static READERS: RwLock<Vec<&'static dyn Reader>> = RwLock::new(Vec::new());
static READERS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Global backend registry.
static BACKENDS: RwLock<Vec<&'static dyn Backend>> = RwLock::new(Vec::new());
static BACKENDS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Register a custom reader.
pub fn register_reader(reader: &'static dyn Reader) {
    READERS.write().unwrap().push(reader);
}

/// Register a custom backend. Backends registered later do not shadow
/// earlier ones with the same name.
pub fn register_backend(backend: &'static dyn Backend) {
    BACKENDS.write().unwrap().push(backend);
}

fn init_readers() {
    READERS_INITIALIZED.get_or_init(|| {
        #[cfg(feature = "read-python")]
        {
            register_reader(&crate::input::python::PYTHON_READER);
        }
    });
}

fn init_backends() {
    BACKENDS_INITIALIZED.get_or_init(|| {
        #[cfg(feature = "write-physl")]
        {
            register_backend(&crate::output::physl::PHYSL_BACKEND);
        }
        #[cfg(feature = "write-python")]
        {
            register_backend(&crate::output::python::PYTHON_BACKEND);
        }
        #[cfg(feature = "write-sexpr")]
        {
            register_backend(&crate::output::sexpr::SEXPR_BACKEND);
        }
    });
}

/// Get a reader by language name.
pub fn reader_for_language(lang: &str) -> Option<&'static dyn Reader> {
    init_readers();
    READERS
        .read()
        .unwrap()
        .iter()
        .find(|r| r.language() == lang)
        .copied()
}

/// Get a reader by file extension.
pub fn reader_for_extension(ext: &str) -> Option<&'static dyn Reader> {
    init_readers();
    READERS
        .read()
        .unwrap()
        .iter()
        .find(|r| r.extensions().contains(&ext))
        .copied()
}

/// Get a backend by name.
pub fn backend_for_name(name: &str) -> Option<&'static dyn Backend> {
    init_backends();
    BACKENDS
        .read()
        .unwrap()
        .iter()
        .find(|b| b.name() == name)
        .copied()
}

/// Get all registered readers.
pub fn readers() -> Vec<&'static dyn Reader> {
    init_readers();
    READERS.read().unwrap().clone()
}

/// Get all registered backends.
pub fn backends() -> Vec<&'static dyn Backend> {
    init_backends();
    BACKENDS.read().unwrap().clone()
}

/// Translate `task` with the backend registered as `name`.
pub fn transpile(name: &str, task: &Task, config: &TranspileConfig) -> Result<String, Error> {
    let backend = backend_for_name(name).ok_or_else(|| Error::UnknownBackend(name.to_string()))?;
    Ok(backend.transpile(task, config)?)
}
