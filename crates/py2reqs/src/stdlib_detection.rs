//! Standard library detection utilities
//!
//! Single source of truth for deciding whether a module name belongs to the
//! Python standard library.

use ruff_python_stdlib::sys;

/// Name of the compiler-directive module, handled apart from the stdlib tables
pub const FUTURE_MODULE: &str = "__future__";

/// Check if a module name represents a Python standard library module
///
/// This uses ruff's stdlib database and handles both direct matches and
/// submodules (e.g., both "os" and "os.path" are recognized).
///
/// # Arguments
/// * `module_name` - The module name to check
/// * `python_version` - The Python 3 minor version (e.g., 10 for Python 3.10)
pub fn is_stdlib_module(module_name: &str, python_version: u8) -> bool {
    // __future__ is not part of ruff's is_known_standard_library
    if module_name == FUTURE_MODULE {
        return true;
    }

    if sys::is_known_standard_library(python_version, module_name) {
        return true;
    }

    module_name
        .split('.')
        .next()
        .is_some_and(|top_level| sys::is_known_standard_library(python_version, top_level))
}
