//! Worklist traversal over the local files reachable from an entry point.
//!
//! Each processed file has its imports extracted and classified. Third-party
//! and builtin modules only update the global sets; application modules are
//! located and their files queued until the worklist drains. The visited set
//! only grows, which keeps cyclic imports from being processed twice.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, trace};
use rustc_hash::FxHashSet;

use crate::{
    classifier::{FileSystemClassifier, ModuleClassifier},
    config::Config,
    error::{Py2ReqsError, Result},
    import_extractor::ImportsExtractor,
    module_path::{normalize_path, python_file_path, top_level_name},
    types::{ModuleKind, ModuleLocation},
};

/// How a file's imports are anchored, derived from the application directories
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolutionAnchor {
    /// The file belongs to the package rooted here
    Package(PathBuf),
    /// A loose script directly inside this application directory
    Script(PathBuf),
    /// Outside every application directory; the working directory is the root
    WorkingDirectory,
}

/// Collects the dependency graph reachable from one or more entry files
#[derive(Debug)]
pub struct DependencyCollector<C = FileSystemClassifier> {
    classifier: C,
    app_dirs: Vec<PathBuf>,
    /// Third-party top-level modules
    third_party: IndexSet<String>,
    /// Standard library and `__future__` top-level modules
    builtins: IndexSet<String>,
    /// Top-level modules within the application directories
    local: IndexSet<String>,
    /// Files passed to `collect_dependencies`
    entry_points: IndexSet<PathBuf>,
    /// Files waiting to be processed
    worklist: IndexSet<PathBuf>,
    /// Files that have been processed
    visited: FxHashSet<PathBuf>,
    /// Sorted, deduplicated imports of every processed file
    dependencies: IndexMap<PathBuf, Vec<String>>,
    /// Local modules mapped to the file (or namespace directory) implementing them
    local_module_paths: IndexMap<String, PathBuf>,
}

impl DependencyCollector<FileSystemClassifier> {
    /// Create a collector with the default file-system classifier.
    ///
    /// An empty `app_dirs` means the current working directory.
    pub fn new<P: AsRef<Path>>(app_dirs: &[P]) -> Result<Self> {
        Self::with_classifier(app_dirs, FileSystemClassifier::default())
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = FileSystemClassifier::from_config(config)?;
        Self::with_classifier(&config.app_dirs(), classifier)
    }
}

impl<C: ModuleClassifier> DependencyCollector<C> {
    pub fn with_classifier<P: AsRef<Path>>(app_dirs: &[P], classifier: C) -> Result<Self> {
        let app_dirs = if app_dirs.is_empty() {
            vec![validate_app_dir(Path::new("."))?]
        } else {
            app_dirs
                .iter()
                .map(|dir| validate_app_dir(dir.as_ref()))
                .collect::<Result<Vec<_>>>()?
        };
        debug!("Application directories: {app_dirs:?}");

        Ok(Self {
            classifier,
            app_dirs,
            third_party: IndexSet::new(),
            builtins: IndexSet::new(),
            local: IndexSet::new(),
            entry_points: IndexSet::new(),
            worklist: IndexSet::new(),
            visited: FxHashSet::default(),
            dependencies: IndexMap::new(),
            local_module_paths: IndexMap::new(),
        })
    }

    /// Package root of a source path, inferred from the application directories.
    ///
    /// For `app/package1/module1.py` with `app` registered the root is
    /// `app/package1`; `app/script1.py` is a loose script with no root, and so
    /// is any path outside every application directory.
    pub fn find_package_root(&self, source_path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        match self.resolution_anchor(source_path.as_ref())? {
            ResolutionAnchor::Package(root) => Ok(Some(root)),
            ResolutionAnchor::Script(_) | ResolutionAnchor::WorkingDirectory => Ok(None),
        }
    }

    fn resolution_anchor(&self, source_path: &Path) -> Result<ResolutionAnchor> {
        let path = normalize_path(source_path);
        if !path.exists() {
            return Err(Py2ReqsError::PathNotFound(path));
        }

        for app_dir in &self.app_dirs {
            let Ok(relative) = path.strip_prefix(app_dir) else {
                continue;
            };

            let mut components = relative.components();
            let Some(first) = components.next() else {
                return Err(Py2ReqsError::PathIsAppDir(source_path.to_path_buf()));
            };

            if components.next().is_none() && path.is_file() {
                return Ok(ResolutionAnchor::Script(app_dir.clone()));
            }
            return Ok(ResolutionAnchor::Package(app_dir.join(first)));
        }

        Ok(ResolutionAnchor::WorkingDirectory)
    }

    /// Collect the dependencies of a Python file or package directory and of
    /// every local module it reaches.
    ///
    /// Files are drained from the worklist in no particular order; the
    /// resulting sets do not depend on that order. Calling this again with
    /// another entry point extends the same graph.
    pub fn collect_dependencies(&mut self, source_path: impl AsRef<Path>) -> Result<()> {
        let source_path = source_path.as_ref();
        let entry = python_file_path(source_path)?;
        // the raw path, so an application directory is not taken for its `__init__.py`
        self.resolution_anchor(source_path)?;
        info!("Collecting dependencies of {}", entry.display());

        self.entry_points.insert(entry.clone());
        if !self.visited.contains(&entry) {
            self.worklist.insert(entry);
        }

        while let Some(path) = self.worklist.pop() {
            self.process_path(&path)?;
        }

        debug!(
            "Visited {} files: {} local, {} third-party, {} builtin modules",
            self.visited.len(),
            self.local.len(),
            self.third_party.len(),
            self.builtins.len()
        );
        Ok(())
    }

    /// Extract and classify the imports of one file, queueing new local files.
    ///
    /// A file that was already processed is left untouched.
    pub fn process_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let source_path = path.as_ref();
        let path = python_file_path(source_path)?;
        if self.visited.contains(&path) {
            trace!("Already processed {}", path.display());
            return Ok(());
        }

        let anchor = self.resolution_anchor(source_path)?;
        debug!("Processing {}", path.display());
        self.visited.insert(path.clone());
        self.worklist.shift_remove(&path);

        let extractor = match anchor {
            ResolutionAnchor::Package(root) => ImportsExtractor::new(&path, Some(&root))?,
            ResolutionAnchor::Script(app_dir) => ImportsExtractor::for_script(&path, &app_dir)?,
            ResolutionAnchor::WorkingDirectory => ImportsExtractor::new(&path, None)?,
        };
        let modules = extractor.into_modules();

        let mut sorted = modules.clone();
        sorted.sort();
        sorted.dedup();
        self.dependencies.insert(path, sorted);

        for module in &modules {
            self.process_module(module)?;
        }
        Ok(())
    }

    /// Route one imported module by the kind of its top-level package
    fn process_module(&mut self, full_module_name: &str) -> Result<()> {
        let top_module_name = top_level_name(full_module_name);
        let import_type = self.classifier.classify(top_module_name, &self.app_dirs);
        trace!("Full name: {full_module_name}; Top name: {top_module_name}; Type: {import_type}");

        match import_type {
            ModuleKind::ThirdParty => {
                self.third_party.insert(top_module_name.to_owned());
            }
            ModuleKind::StandardLibrary | ModuleKind::Future => {
                self.builtins.insert(top_module_name.to_owned());
            }
            ModuleKind::FirstParty => {
                self.add_local_module(full_module_name)?;
                self.local.insert(top_module_name.to_owned());
            }
        }
        Ok(())
    }

    /// Locate the file implementing an application module and queue it
    fn add_local_module(&mut self, full_module_name: &str) -> Result<()> {
        let location = self
            .classifier
            .locate_application_module(full_module_name, &self.app_dirs)
            .ok_or_else(|| Py2ReqsError::UnresolvedModule {
                module: full_module_name.to_owned(),
                app_dirs: self
                    .app_dirs
                    .iter()
                    .map(|dir| dir.display().to_string())
                    .collect(),
            })?;

        self.local_module_paths
            .entry(full_module_name.to_owned())
            .or_insert_with(|| location.path().to_path_buf());

        match location {
            ModuleLocation::File(file) => {
                if !self.visited.contains(&file) && self.worklist.insert(file.clone()) {
                    trace!("Module path: {}", file.display());
                }
            }
            ModuleLocation::NamespacePackage(dir) => {
                trace!("Namespace package {full_module_name} at {}", dir.display());
            }
        }
        Ok(())
    }

    pub fn app_dirs(&self) -> &[PathBuf] {
        &self.app_dirs
    }

    pub fn third_party(&self) -> &IndexSet<String> {
        &self.third_party
    }

    pub fn builtins(&self) -> &IndexSet<String> {
        &self.builtins
    }

    pub fn local(&self) -> &IndexSet<String> {
        &self.local
    }

    pub fn entry_points(&self) -> &IndexSet<PathBuf> {
        &self.entry_points
    }

    pub fn visited_files(&self) -> &FxHashSet<PathBuf> {
        &self.visited
    }

    pub fn dependencies(&self) -> &IndexMap<PathBuf, Vec<String>> {
        &self.dependencies
    }

    pub fn local_module_paths(&self) -> &IndexMap<String, PathBuf> {
        &self.local_module_paths
    }
}

fn validate_app_dir(folder: &Path) -> Result<PathBuf> {
    if !folder.exists() {
        return Err(Py2ReqsError::AppDirNotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(Py2ReqsError::AppDirNotADirectory(folder.to_path_buf()));
    }
    Ok(normalize_path(folder))
}
