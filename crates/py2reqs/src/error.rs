//! Error types shared by the resolver, extractor and collector.
//!
//! Every variant renders with a fixed leading phrase so callers can match on
//! the message prefix, and each maps to an [`ErrorKind`] for coarse handling.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Py2ReqsError> = std::result::Result<T, E>;

/// Coarse category of a [`Py2ReqsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller passed a path or source that cannot be analyzed
    InvalidInput,
    /// Package roots, application directories or config values are unusable
    InvalidConfiguration,
    /// Reading a source file or writing output failed
    Io,
    /// A source file is not valid Python
    Parse,
    /// An application module has no implementing file
    Unresolved,
    /// The collected dependencies could not be rendered
    Render,
}

#[derive(Debug, Error)]
pub enum Py2ReqsError {
    #[error("Empty path.")]
    EmptyPath,

    #[error("File {} does not exist.", .0.display())]
    FileNotFound(PathBuf),

    #[error("Not a Python file {} with extension '{extension}'.", .path.display())]
    NotAPythonFile { path: PathBuf, extension: String },

    #[error("Package root folder '{}' does not exist.", .0.display())]
    PackageRootNotFound(PathBuf),

    #[error("Package root '{}' is not a folder.", .0.display())]
    PackageRootNotADirectory(PathBuf),

    #[error(
        "Path '{}' is not located in the package root '{}'.",
        .path.display(),
        .package_root.display()
    )]
    NotInPackageRoot { path: PathBuf, package_root: PathBuf },

    #[error("Application directory '{}' does not exist.", .0.display())]
    AppDirNotFound(PathBuf),

    #[error("Application directory '{}' is not a directory.", .0.display())]
    AppDirNotADirectory(PathBuf),

    #[error("Path '{}' does not exist.", .0.display())]
    PathNotFound(PathBuf),

    #[error("Path '{}' is one of the application directories.", .0.display())]
    PathIsAppDir(PathBuf),

    #[error(
        "Relative import at level {level} in {} goes beyond the package root.",
        .path.display()
    )]
    RelativeImportBeyondRoot { path: PathBuf, level: u32 },

    #[error("Invalid import in {}: {reason}", .path.display())]
    InvalidImport { path: PathBuf, reason: String },

    #[error("Unresolved application module '{module}' in {}.", .app_dirs.join(", "))]
    UnresolvedModule { module: String, app_dirs: Vec<String> },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to render report: {0}")]
    Render(String),
}

impl Py2ReqsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPath
            | Self::FileNotFound(_)
            | Self::NotAPythonFile { .. }
            | Self::PathNotFound(_)
            | Self::RelativeImportBeyondRoot { .. }
            | Self::InvalidImport { .. } => ErrorKind::InvalidInput,
            Self::PackageRootNotFound(_)
            | Self::PackageRootNotADirectory(_)
            | Self::NotInPackageRoot { .. }
            | Self::AppDirNotFound(_)
            | Self::AppDirNotADirectory(_)
            | Self::PathIsAppDir(_)
            | Self::InvalidConfig(_) => ErrorKind::InvalidConfiguration,
            Self::UnresolvedModule { .. } => ErrorKind::Unresolved,
            Self::Io { .. } => ErrorKind::Io,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Render(_) => ErrorKind::Render,
        }
    }
}
