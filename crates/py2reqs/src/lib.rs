//! Derive the external packages a Python program needs from the imports
//! reachable from its entry file.

pub mod classifier;
pub mod collector;
pub mod config;
pub mod error;
pub mod import_extractor;
pub mod import_graph;
pub mod module_path;
pub mod requirements;
pub mod stdlib_detection;
pub mod types;

pub use collector::DependencyCollector;
pub use error::{ErrorKind, Py2ReqsError};
pub use import_extractor::{ImportsExtractor, extract_imports};
pub use types::{ModuleKind, ModuleLocation};
