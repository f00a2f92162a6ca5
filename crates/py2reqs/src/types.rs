//! Shared type definitions for the py2reqs crate
//!
//! This module contains the classification types used by both the classifier
//! and the dependency collector.

use std::path::{Path, PathBuf};

/// Classification of a top-level module based on its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Python standard library modules (e.g., os, sys, json)
    StandardLibrary,

    /// The `__future__` pseudo-module
    Future,

    /// Third-party packages installed via pip/conda (e.g., numpy, requests)
    ThirdParty,

    /// First-party modules that live in one of the application directories
    FirstParty,
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandardLibrary => write!(f, "stdlib"),
            Self::Future => write!(f, "future"),
            Self::ThirdParty => write!(f, "third-party"),
            Self::FirstParty => write!(f, "first-party"),
        }
    }
}

/// Where an application module lives on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleLocation {
    /// A module file or a package's `__init__.py`
    File(PathBuf),
    /// A directory without `__init__.py`
    NamespacePackage(PathBuf),
}

impl ModuleLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::NamespacePackage(path) => path,
        }
    }
}
