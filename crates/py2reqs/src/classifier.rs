use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use crate::{
    config::Config,
    error::Result,
    module_path::{PACKAGE_INIT, normalize_path},
    stdlib_detection::{FUTURE_MODULE, is_stdlib_module},
    types::{ModuleKind, ModuleLocation},
};

/// Decides where a module comes from and, for application modules, which file
/// implements it.
pub trait ModuleClassifier {
    /// Classify a top-level module name against the application directories
    fn classify(&self, top_level_name: &str, app_dirs: &[PathBuf]) -> ModuleKind;

    /// Find the file (or namespace directory) implementing a dotted module
    /// inside the application directories
    fn locate_application_module(
        &self,
        full_module_name: &str,
        app_dirs: &[PathBuf],
    ) -> Option<ModuleLocation>;
}

/// Classifier backed by the file system and ruff's standard library tables.
///
/// Classifications are cached per top-level name, so one classifier serves a
/// single set of application directories.
#[derive(Debug, Clone)]
pub struct FileSystemClassifier {
    /// Python 3 minor version for stdlib classification
    python_version: u8,
    known_first_party: IndexSet<String>,
    known_third_party: IndexSet<String>,
    classification_cache: RefCell<IndexMap<String, ModuleKind>>,
}

impl Default for FileSystemClassifier {
    fn default() -> Self {
        Self::new(Config::DEFAULT_PYTHON_VERSION)
    }
}

impl FileSystemClassifier {
    pub fn new(python_version: u8) -> Self {
        Self {
            python_version,
            known_first_party: IndexSet::new(),
            known_third_party: IndexSet::new(),
            classification_cache: RefCell::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            python_version: config.python_version()?,
            known_first_party: config.known_first_party.clone(),
            known_third_party: config.known_third_party.clone(),
            classification_cache: RefCell::default(),
        })
    }

    pub fn python_version(&self) -> u8 {
        self.python_version
    }

    /// Resolve a module within a specific directory.
    ///
    /// Intermediate segments must be directories. The last segment is checked
    /// in order as a package (`foo/__init__.py`), a module file (`foo.py`) and
    /// a namespace package (`foo/`).
    fn resolve_in_directory(&self, root: &Path, name_parts: &[&str]) -> Option<ModuleLocation> {
        let (last, intermediate) = name_parts.split_last()?;

        let mut current_path = root.to_path_buf();
        for part in intermediate {
            current_path.push(part);
            if !current_path.is_dir() {
                return None;
            }
        }

        let package_init = current_path.join(last).join(PACKAGE_INIT);
        if package_init.is_file() {
            trace!("Found package at: {package_init:?}");
            return Some(ModuleLocation::File(normalize_path(&package_init)));
        }

        let module_file = current_path.join(format!("{last}.py"));
        if module_file.is_file() {
            trace!("Found module file at: {module_file:?}");
            return Some(ModuleLocation::File(normalize_path(&module_file)));
        }

        let namespace_dir = current_path.join(last);
        if namespace_dir.is_dir() {
            trace!("Found namespace package at: {namespace_dir:?}");
            return Some(ModuleLocation::NamespacePackage(normalize_path(
                &namespace_dir,
            )));
        }

        None
    }
}

impl ModuleClassifier for FileSystemClassifier {
    fn classify(&self, top_level_name: &str, app_dirs: &[PathBuf]) -> ModuleKind {
        if let Some(&cached) = self.classification_cache.borrow().get(top_level_name) {
            return cached;
        }

        let import_type = if top_level_name == FUTURE_MODULE {
            ModuleKind::Future
        } else if self.known_first_party.contains(top_level_name) {
            ModuleKind::FirstParty
        } else if self.known_third_party.contains(top_level_name) {
            ModuleKind::ThirdParty
        } else {
            let is_stdlib = is_stdlib_module(top_level_name, self.python_version);
            let local = app_dirs
                .iter()
                .find_map(|dir| self.resolve_in_directory(dir, &[top_level_name]));

            // Application directories come first on sys.path, so a local module
            // or package shadows the stdlib; a namespace portion does not
            match local {
                Some(ModuleLocation::File(_)) => ModuleKind::FirstParty,
                Some(ModuleLocation::NamespacePackage(_)) if !is_stdlib => ModuleKind::FirstParty,
                _ if is_stdlib => ModuleKind::StandardLibrary,
                _ => ModuleKind::ThirdParty,
            }
        };

        debug!("Classified '{top_level_name}' as {import_type}");
        self.classification_cache
            .borrow_mut()
            .insert(top_level_name.to_owned(), import_type);
        import_type
    }

    fn locate_application_module(
        &self,
        full_module_name: &str,
        app_dirs: &[PathBuf],
    ) -> Option<ModuleLocation> {
        let name_parts: Vec<&str> = full_module_name
            .split('.')
            .filter(|s| !s.is_empty())
            .collect();

        app_dirs
            .iter()
            .find_map(|dir| self.resolve_in_directory(dir, &name_parts))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use tempfile::TempDir;

    use super::*;

    fn create_test_file(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    #[test]
    fn test_classification() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        create_test_file(&root.join("mymodule.py"), "")?;
        create_test_file(&root.join("mypackage/__init__.py"), "")?;

        let config = Config {
            known_first_party: IndexSet::from(["known_first".to_owned()]),
            known_third_party: IndexSet::from(["requests".to_owned()]),
            ..Config::default()
        };
        let classifier = FileSystemClassifier::from_config(&config)?;
        let app_dirs = vec![root];

        assert_eq!(classifier.classify("os", &app_dirs), ModuleKind::StandardLibrary);
        assert_eq!(classifier.classify("sys", &app_dirs), ModuleKind::StandardLibrary);
        assert_eq!(classifier.classify("__future__", &app_dirs), ModuleKind::Future);
        assert_eq!(classifier.classify("mymodule", &app_dirs), ModuleKind::FirstParty);
        assert_eq!(classifier.classify("mypackage", &app_dirs), ModuleKind::FirstParty);
        assert_eq!(classifier.classify("known_first", &app_dirs), ModuleKind::FirstParty);
        assert_eq!(classifier.classify("requests", &app_dirs), ModuleKind::ThirdParty);
        assert_eq!(classifier.classify("pandas", &app_dirs), ModuleKind::ThirdParty);

        // cached by name
        create_test_file(&app_dirs[0].join("pandas.py"), "")?;
        assert_eq!(classifier.classify("pandas", &app_dirs), ModuleKind::ThirdParty);

        Ok(())
    }

    #[test]
    fn test_local_package_shadows_stdlib() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        create_test_file(&root.join("email/__init__.py"), "")?;

        let classifier = FileSystemClassifier::default();
        assert_eq!(
            classifier.classify("email", &[root]),
            ModuleKind::FirstParty
        );
        assert_eq!(
            FileSystemClassifier::default().classify("email", &[]),
            ModuleKind::StandardLibrary
        );
        Ok(())
    }

    #[test]
    fn test_namespace_dir_does_not_shadow_stdlib() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        create_test_file(&root.join("logging/handlers_extra.py"), "")?;
        create_test_file(&root.join("plugins/loader.py"), "")?;

        let classifier = FileSystemClassifier::default();
        let app_dirs = vec![root];
        assert_eq!(
            classifier.classify("logging", &app_dirs),
            ModuleKind::StandardLibrary
        );
        // a namespace portion with no stdlib counterpart is still local
        assert_eq!(
            classifier.classify("plugins", &app_dirs),
            ModuleKind::FirstParty
        );
        Ok(())
    }

    #[test]
    fn test_locate_application_module() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        create_test_file(&root.join("myapp/__init__.py"), "")?;
        create_test_file(&root.join("myapp/utils/__init__.py"), "")?;
        create_test_file(&root.join("myapp/utils/helpers.py"), "")?;
        create_test_file(&root.join("myapp/shadow.py"), "")?;
        create_test_file(&root.join("myapp/shadow/__init__.py"), "")?;
        fs::create_dir_all(root.join("myapp/namespace/inner"))?;

        let classifier = FileSystemClassifier::default();
        let app_dirs = vec![root.clone()];

        assert_eq!(
            classifier.locate_application_module("myapp", &app_dirs),
            Some(ModuleLocation::File(root.join("myapp/__init__.py")))
        );
        assert_eq!(
            classifier.locate_application_module("myapp.utils.helpers", &app_dirs),
            Some(ModuleLocation::File(root.join("myapp/utils/helpers.py")))
        );
        // A package wins over a module file of the same name
        assert_eq!(
            classifier.locate_application_module("myapp.shadow", &app_dirs),
            Some(ModuleLocation::File(root.join("myapp/shadow/__init__.py")))
        );
        assert_eq!(
            classifier.locate_application_module("myapp.namespace", &app_dirs),
            Some(ModuleLocation::NamespacePackage(root.join("myapp/namespace")))
        );
        assert_eq!(
            classifier.locate_application_module("myapp.missing", &app_dirs),
            None
        );
        assert_eq!(
            classifier.locate_application_module("myapp.utils.helpers.deeper", &app_dirs),
            None
        );
        Ok(())
    }

    #[test]
    fn test_search_order_across_app_dirs() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        create_test_file(&root.join("first/helper.py"), "")?;
        create_test_file(&root.join("second/helper.py"), "")?;

        let classifier = FileSystemClassifier::default();
        let app_dirs = vec![root.join("first"), root.join("second")];
        assert_eq!(
            classifier.locate_application_module("helper", &app_dirs),
            Some(ModuleLocation::File(root.join("first/helper.py")))
        );
        Ok(())
    }
}
