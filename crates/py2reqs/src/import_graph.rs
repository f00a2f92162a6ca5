//! File-level import graph of the local modules visited by a collector.
//!
//! Import cycles are legal in Python, so they are reported rather than
//! rejected.

use std::path::{Path, PathBuf};

use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};
use rustc_hash::FxHashMap;

use crate::{classifier::ModuleClassifier, collector::DependencyCollector};

#[derive(Debug, Default)]
pub struct ImportGraph {
    graph: DiGraph<PathBuf, ()>,
    node_indices: FxHashMap<PathBuf, NodeIndex>,
}

impl ImportGraph {
    /// Link every visited file to the local files implementing its imports
    pub fn from_collector<C: ModuleClassifier>(collector: &DependencyCollector<C>) -> Self {
        let mut graph = Self::default();

        for file in collector.dependencies().keys() {
            graph.add_file(file);
        }

        for (file, modules) in collector.dependencies() {
            let from = graph.node_indices[file];
            for module in modules {
                let Some(target) = collector.local_module_paths().get(module) else {
                    continue;
                };
                // a package lists itself when its `__init__.py` imports a submodule
                if let Some(&to) = graph.node_indices.get(target)
                    && to != from
                    && !graph.graph.contains_edge(from, to)
                {
                    graph.graph.add_edge(from, to, ());
                }
            }
        }

        log::debug!(
            "Import graph has {} files and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    fn add_file(&mut self, file: &Path) -> NodeIndex {
        if let Some(&index) = self.node_indices.get(file) {
            return index;
        }
        let index = self.graph.add_node(file.to_path_buf());
        self.node_indices.insert(file.to_path_buf(), index);
        index
    }

    /// Groups of files that import each other, each sorted by path
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut cycles: Vec<Vec<PathBuf>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut files: Vec<PathBuf> = component
                    .into_iter()
                    .map(|index| self.graph[index].clone())
                    .collect();
                files.sort();
                files
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Local files imported directly by `file`
    pub fn imports_of(&self, file: &Path) -> Vec<&Path> {
        let Some(&index) = self.node_indices.get(file) else {
            return Vec::new();
        };
        let mut imports: Vec<&Path> = self
            .graph
            .neighbors(index)
            .map(|neighbor| self.graph[neighbor].as_path())
            .collect();
        imports.sort();
        imports
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_two_file_cycle() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let app = temp_dir.path().canonicalize()?;
        fs::create_dir_all(app.join("pkg"))?;
        fs::write(app.join("pkg/__init__.py"), "")?;
        fs::write(app.join("pkg/a.py"), "from . import b\n")?;
        fs::write(app.join("pkg/b.py"), "from .a import helper\n")?;
        fs::write(app.join("main.py"), "import pkg.a\nimport os\n")?;

        let mut collector = DependencyCollector::new(&[&app])?;
        collector.collect_dependencies(app.join("main.py"))?;
        let graph = ImportGraph::from_collector(&collector);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(
            graph.cycles(),
            vec![vec![app.join("pkg/a.py"), app.join("pkg/b.py")]]
        );
        let init = app.join("pkg/__init__.py");
        let module_a = app.join("pkg/a.py");
        assert_eq!(
            graph.imports_of(&app.join("main.py")),
            vec![init.as_path(), module_a.as_path()]
        );
        Ok(())
    }

    #[test]
    fn test_package_importing_its_submodule_is_not_a_cycle() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let app = temp_dir.path().canonicalize()?;
        fs::create_dir_all(app.join("pkg"))?;
        fs::write(app.join("pkg/__init__.py"), "from .core import run\n")?;
        fs::write(app.join("pkg/core.py"), "import json\n")?;

        let mut collector = DependencyCollector::new(&[&app])?;
        collector.collect_dependencies(app.join("pkg"))?;
        assert_eq!(
            collector.dependencies()[&app.join("pkg/__init__.py")],
            vec!["pkg", "pkg.core"]
        );

        let graph = ImportGraph::from_collector(&collector);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.cycles().is_empty());
        let core = app.join("pkg/core.py");
        assert_eq!(
            graph.imports_of(&app.join("pkg/__init__.py")),
            vec![core.as_path()]
        );
        Ok(())
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let app = temp_dir.path().canonicalize()?;
        fs::write(app.join("main.py"), "import util\n")?;
        fs::write(app.join("util.py"), "import json\n")?;

        let mut collector = DependencyCollector::new(&[&app])?;
        collector.collect_dependencies(app.join("main.py"))?;
        let graph = ImportGraph::from_collector(&collector);

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.cycles().is_empty());
        Ok(())
    }
}
