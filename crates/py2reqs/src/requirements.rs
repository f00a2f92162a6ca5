//! Rendering of the collected dependencies.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::{
    classifier::ModuleClassifier,
    collector::DependencyCollector,
    error::{Py2ReqsError, Result},
};

/// `requirements.txt` content: one package per line, sorted, case preserved
pub fn render_requirements(third_party: &IndexSet<String>) -> String {
    let mut names: Vec<&str> = third_party.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.iter().fold(String::new(), |mut out, name| {
        out.push_str(name);
        out.push('\n');
        out
    })
}

/// Everything a collector learned, in a serializable shape
#[derive(Debug, Serialize)]
pub struct DependencyReport {
    pub third_party: Vec<String>,
    pub builtins: Vec<String>,
    pub local: Vec<String>,
    pub dependencies: IndexMap<String, Vec<String>>,
}

impl DependencyReport {
    pub fn from_collector<C: ModuleClassifier>(collector: &DependencyCollector<C>) -> Self {
        let mut dependencies: IndexMap<String, Vec<String>> = collector
            .dependencies()
            .iter()
            .map(|(path, modules)| (path.display().to_string(), modules.clone()))
            .collect();
        dependencies.sort_keys();

        Self {
            third_party: sorted(collector.third_party()),
            builtins: sorted(collector.builtins()),
            local: sorted(collector.local()),
            dependencies,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Py2ReqsError::Render(e.to_string()))
    }
}

fn sorted(names: &IndexSet<String>) -> Vec<String> {
    let mut names: Vec<String> = names.iter().cloned().collect();
    names.sort();
    names
}

/// Write rendered output, creating missing parent directories
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let io_error = |source| Py2ReqsError::Io {
        path: PathBuf::from(path),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, contents).map_err(io_error)
}
