//! Extraction of absolute module paths from one Python file.
//!
//! Every `import` and `from ... import` statement in the file, including those
//! nested in functions, classes and `try`/`if` blocks, is resolved to an
//! absolute dotted module path. Relative imports and `from` imports of sibling
//! packages are anchored at the package root, whose own name becomes the
//! outermost segment. Ancestor packages of every resolved module are appended
//! at the end, because importing `a.b.c` initializes `a` and `a.b` first.

use std::path::{Path, PathBuf};

use log::{debug, trace};
use ruff_python_ast::{
    Stmt, StmtImport, StmtImportFrom,
    visitor::{Visitor, walk_stmt},
};
use ruff_python_parser::parse_module;
use rustc_hash::FxHashSet;

use crate::{
    error::{Py2ReqsError, Result},
    module_path::{dotted_parts, module_from_base, module_parents, normalize_path, python_file_path},
};

/// An import statement as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportStatement {
    /// `import a.b` (one per alias)
    Import { name: String },
    /// `from ..a.b import c, d`
    ImportFrom {
        module: Option<String>,
        names: Vec<String>,
        level: u32,
    },
}

/// Collects import statements in source order
#[derive(Debug, Default)]
struct ImportStatementCollector {
    statements: Vec<ImportStatement>,
}

impl<'a> Visitor<'a> for ImportStatementCollector {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Import(StmtImport { names, .. }) => {
                for alias in names {
                    self.statements.push(ImportStatement::Import {
                        name: alias.name.as_str().to_owned(),
                    });
                }
            }
            Stmt::ImportFrom(StmtImportFrom {
                module,
                names,
                level,
                ..
            }) => {
                self.statements.push(ImportStatement::ImportFrom {
                    module: module.as_ref().map(|m| m.as_str().to_owned()),
                    names: names
                        .iter()
                        .map(|alias| alias.name.as_str().to_owned())
                        .collect(),
                    level: *level,
                });
            }
            _ => {}
        }

        walk_stmt(self, stmt);
    }
}

/// How a non-relative `from X.Y import Z` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingResolution {
    /// `X/Y` or `X/Y.py` exists next to the importing file
    LocalSibling,
    /// No such sibling; `X.Y` is a global module
    ExternalReference,
}

/// Imports of a single Python file, resolved to absolute module paths.
///
/// The list keeps statement order and duplicates; ancestor packages that were
/// not imported literally are appended after all statements.
#[derive(Debug)]
pub struct ImportsExtractor {
    /// The analyzed file (a directory input is rewritten to its `__init__.py`)
    file_path: PathBuf,
    /// Directory every resolved path must stay inside
    package_root: PathBuf,
    /// Directory whose children are top-level module names
    namespace_base: PathBuf,
    /// Dotted module path of the analyzed file
    module_name: String,
    modules: Vec<String>,
}

impl ImportsExtractor {
    /// Extract the imports of `path`, a Python file or package directory.
    ///
    /// `package_root` defaults to the current working directory and must
    /// contain `path`.
    pub fn new(path: impl AsRef<Path>, package_root: Option<&Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Py2ReqsError::EmptyPath);
        }

        let package_root = validate_package_root(package_root.unwrap_or_else(|| Path::new(".")))?;
        let namespace_base = package_root
            .parent()
            .unwrap_or(&package_root)
            .to_path_buf();
        Self::extract(path, package_root, namespace_base)
    }

    /// Extract the imports of a loose script that lives directly inside an
    /// application directory.
    ///
    /// The application directory itself is the namespace base, so sibling
    /// packages resolve as top-level names.
    pub fn for_script(path: impl AsRef<Path>, app_dir: &Path) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Py2ReqsError::EmptyPath);
        }

        let app_dir = validate_package_root(app_dir)?;
        Self::extract(path, app_dir.clone(), app_dir)
    }

    fn extract(path: &Path, package_root: PathBuf, namespace_base: PathBuf) -> Result<Self> {
        let resolved = normalize_path(path);
        if !resolved.starts_with(&package_root) {
            return Err(Py2ReqsError::NotInPackageRoot {
                path: resolved,
                package_root,
            });
        }

        let file_path = python_file_path(&resolved)?;
        let module_name = module_from_base(&file_path, &namespace_base).ok_or_else(|| {
            Py2ReqsError::NotInPackageRoot {
                path: file_path.clone(),
                package_root: package_root.clone(),
            }
        })?;

        let source = std::fs::read_to_string(&file_path).map_err(|source| Py2ReqsError::Io {
            path: file_path.clone(),
            source,
        })?;
        let parsed = parse_module(&source).map_err(|e| Py2ReqsError::Parse {
            path: file_path.clone(),
            message: e.to_string(),
        })?;

        let mut collector = ImportStatementCollector::default();
        collector.visit_body(&parsed.syntax().body);

        let mut extractor = Self {
            file_path,
            package_root,
            namespace_base,
            module_name,
            modules: Vec::with_capacity(collector.statements.len()),
        };

        for statement in &collector.statements {
            if let Some(module) = extractor.resolve_statement(statement)? {
                trace!("{}: {statement:?} -> {module}", extractor.module_name);
                extractor.modules.push(module);
            }
        }
        extractor.add_module_parents();

        debug!(
            "Extracted {} imports from {} ({})",
            extractor.modules.len(),
            extractor.file_path.display(),
            extractor.module_name
        );
        Ok(extractor)
    }

    fn resolve_statement(&self, statement: &ImportStatement) -> Result<Option<String>> {
        match statement {
            ImportStatement::Import { name } => Ok(Some(name.clone())),
            ImportStatement::ImportFrom {
                module,
                level: 0,
                ..
            } => {
                let module = module.as_deref().ok_or_else(|| Py2ReqsError::InvalidImport {
                    path: self.file_path.clone(),
                    reason: "absolute 'from' import without a module".to_owned(),
                })?;
                Ok(Some(self.resolve_absolute_from(module)?))
            }
            ImportStatement::ImportFrom {
                module,
                names,
                level,
            } => self.resolve_relative_from(module.as_deref(), names, *level),
        }
    }

    /// `from X.Y import Z`: a local sibling is anchored at the file's package,
    /// anything else is a global module kept as written
    fn resolve_absolute_from(&self, module: &str) -> Result<String> {
        match self.sibling_resolution(module) {
            SiblingResolution::LocalSibling => {
                let parts = self.dotted_dir(self.file_dir())?;
                Ok(join_module(parts, module))
            }
            SiblingResolution::ExternalReference => Ok(module.to_owned()),
        }
    }

    fn sibling_resolution(&self, module: &str) -> SiblingResolution {
        let local_path: PathBuf = module.split('.').collect();
        let maybe_folder = self.file_dir().join(&local_path);
        let maybe_file = maybe_folder.with_extension("py");

        if maybe_folder.exists() || maybe_file.exists() {
            SiblingResolution::LocalSibling
        } else {
            SiblingResolution::ExternalReference
        }
    }

    /// `from ..pkg import x` and `from .. import x`.
    ///
    /// Without a module only the first imported name is used.
    fn resolve_relative_from(
        &self,
        module: Option<&str>,
        names: &[String],
        level: u32,
    ) -> Result<Option<String>> {
        let beyond_root = || Py2ReqsError::RelativeImportBeyondRoot {
            path: self.file_path.clone(),
            level,
        };

        let ancestor = self
            .file_dir()
            .ancestors()
            .nth(level as usize - 1)
            .ok_or_else(beyond_root)?;
        let parts = dotted_parts(ancestor, &self.namespace_base).ok_or_else(beyond_root)?;

        match module.or_else(|| names.first().map(String::as_str)) {
            // `from . import *` initializes the package itself
            Some("*") | None if parts.is_empty() => Ok(None),
            Some("*") | None => Ok(Some(parts.join("."))),
            Some(suffix) => Ok(Some(join_module(parts, suffix))),
        }
    }

    fn add_module_parents(&mut self) {
        let mut seen: FxHashSet<String> = self.modules.iter().cloned().collect();
        for index in 0..self.modules.len() {
            for parent in module_parents(&self.modules[index]) {
                if seen.insert(parent.clone()) {
                    self.modules.push(parent);
                }
            }
        }
    }

    fn file_dir(&self) -> &Path {
        self.file_path.parent().unwrap_or(&self.namespace_base)
    }

    fn dotted_dir(&self, dir: &Path) -> Result<Vec<String>> {
        dotted_parts(dir, &self.namespace_base).ok_or_else(|| Py2ReqsError::NotInPackageRoot {
            path: self.file_path.clone(),
            package_root: self.package_root.clone(),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn into_modules(self) -> Vec<String> {
        self.modules
    }
}

/// Resolved imports of `path`, see [`ImportsExtractor::new`]
pub fn extract_imports(path: impl AsRef<Path>, package_root: Option<&Path>) -> Result<Vec<String>> {
    ImportsExtractor::new(path, package_root).map(ImportsExtractor::into_modules)
}

fn validate_package_root(package_root: &Path) -> Result<PathBuf> {
    if !package_root.exists() {
        return Err(Py2ReqsError::PackageRootNotFound(package_root.to_path_buf()));
    }
    if !package_root.is_dir() {
        return Err(Py2ReqsError::PackageRootNotADirectory(
            package_root.to_path_buf(),
        ));
    }
    Ok(normalize_path(package_root))
}

fn join_module(mut parts: Vec<String>, suffix: &str) -> String {
    parts.push(suffix.to_owned());
    parts.join(".")
}
