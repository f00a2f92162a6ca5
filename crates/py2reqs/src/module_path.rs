//! Conversions between file-system paths and dotted Python module paths.

use std::path::{Component, Path, PathBuf};

use log::warn;

use crate::error::{Py2ReqsError, Result};

/// File name that turns a directory into a regular package
pub const PACKAGE_INIT: &str = "__init__.py";

const PACKAGE_INIT_STEM: &str = "__init__";
const PYTHON_EXTENSION: &str = "py";

/// Canonicalize a path, falling back to its absolute form when it cannot be resolved
pub fn normalize_path(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(e) => {
            warn!("Failed to canonicalize path {}: {}", path.display(), e);
            std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
        }
    }
}

/// Convert the path of a Python file or package directory into the absolute
/// path of the file that implements it.
///
/// Directories are rewritten to their `__init__.py`. The result is not checked
/// for existence after the rewrite, so a namespace directory yields a path
/// that does not exist.
pub fn python_file_path(path: &Path) -> Result<PathBuf> {
    let mut file_path = path
        .canonicalize()
        .map_err(|_| Py2ReqsError::FileNotFound(normalize_path(path)))?;

    if file_path.is_dir() {
        file_path.push(PACKAGE_INIT);
    }

    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    if extension != PYTHON_EXTENSION {
        return Err(Py2ReqsError::NotAPythonFile {
            extension: extension.to_owned(),
            path: file_path,
        });
    }

    Ok(file_path)
}

/// Derive the dotted module path of `file_path` inside `package_root`.
///
/// The package root's own name is the outermost segment: `pkg/sub/mod.py`
/// under root `pkg` is `pkg.sub.mod`, and `pkg/__init__.py` is `pkg`.
/// Both paths are taken as given; pass normalized paths to get stable results.
pub fn file_to_module(file_path: &Path, package_root: &Path) -> Result<String> {
    let namespace_base = package_root.parent().unwrap_or(package_root);
    module_from_base(file_path, namespace_base).ok_or_else(|| Py2ReqsError::NotInPackageRoot {
        path: file_path.to_path_buf(),
        package_root: package_root.to_path_buf(),
    })
}

/// Dotted path of `file_path` relative to the directory whose children are
/// top-level names. Returns `None` when the file's directory is outside `base`.
pub(crate) fn module_from_base(file_path: &Path, base: &Path) -> Option<String> {
    let parent = file_path.parent().unwrap_or_else(|| Path::new(""));
    let mut parts = dotted_parts(parent, base)?;

    if let Some(stem) = file_path.file_stem().and_then(|s| s.to_str())
        && stem != PACKAGE_INIT_STEM
    {
        parts.push(stem.to_owned());
    }

    Some(parts.join("."))
}

/// Directory segments of `dir` below `base`, or `None` when `dir` is not inside it
pub(crate) fn dotted_parts(dir: &Path, base: &Path) -> Option<Vec<String>> {
    let relative = dir.strip_prefix(base).ok()?;
    Some(
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect(),
    )
}

/// Every strict ancestor package of a module, outermost first.
///
/// `a.b.c.d` yields `["a", "a.b", "a.b.c"]`; a single segment yields nothing.
pub fn module_parents(full_module_name: &str) -> Vec<String> {
    full_module_name
        .match_indices('.')
        .map(|(index, _)| full_module_name[..index].to_owned())
        .collect()
}

/// First segment of a dotted module path
pub fn top_level_name(full_module_name: &str) -> &str {
    full_module_name
        .split_once('.')
        .map_or(full_module_name, |(top, _)| top)
}
