//! Hierarchical configuration loading.
//!
//! Sources are applied in order, later ones overriding earlier ones:
//! defaults, the user config file, the project config (`py2reqs.toml` or
//! `[tool.py2reqs]` in `pyproject.toml`), an explicit `--config` file, and
//! `PY2REQS_*` environment variables. CLI flags are applied by the binary.

use std::path::{Path, PathBuf};

use etcetera::{BaseStrategy, choose_base_strategy};
use indexmap::IndexSet;
use log::debug;
use serde::Deserialize;

use crate::error::{Py2ReqsError, Result};

const CONFIG_FILE_NAME: &str = "py2reqs.toml";
const PYPROJECT_FILE_NAME: &str = "pyproject.toml";

const ENV_SRC: &str = "PY2REQS_SRC";
const ENV_KNOWN_FIRST_PARTY: &str = "PY2REQS_KNOWN_FIRST_PARTY";
const ENV_KNOWN_THIRD_PARTY: &str = "PY2REQS_KNOWN_THIRD_PARTY";
const ENV_TARGET_VERSION: &str = "PY2REQS_TARGET_VERSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Application directories; empty means the current working directory
    pub src: Vec<PathBuf>,
    /// Top-level names always treated as application modules
    pub known_first_party: IndexSet<String>,
    /// Top-level names always treated as third-party packages
    pub known_third_party: IndexSet<String>,
    /// Target Python version, e.g. `py310` or `3.10`
    pub target_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src: Vec::new(),
            known_first_party: IndexSet::new(),
            known_third_party: IndexSet::new(),
            target_version: "py310".to_owned(),
        }
    }
}

/// Partial configuration as written in a TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    src: Option<Vec<PathBuf>>,
    known_first_party: Option<Vec<String>>,
    known_third_party: Option<Vec<String>>,
    target_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    py2reqs: Option<ConfigFile>,
}

impl Config {
    pub const DEFAULT_PYTHON_VERSION: u8 = 10;

    /// Load configuration from every source, with an optional explicit file
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config) = user_config_path()
            && user_config.is_file()
        {
            debug!("Loading user config from {}", user_config.display());
            config.merge(load_config_file(&user_config)?);
        }

        if let Some(project_config) = load_project_config(Path::new("."))? {
            config.merge(project_config);
        }

        if let Some(path) = config_path {
            if !path.is_file() {
                return Err(Py2ReqsError::InvalidConfig(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            debug!("Loading config from {}", path.display());
            config.merge(load_config_file(path)?);
        }

        config.apply_env_vars();
        Ok(config)
    }

    /// Override fields with the values present in a config file
    fn merge(&mut self, file: ConfigFile) {
        if let Some(src) = file.src {
            self.src = src;
        }
        if let Some(names) = file.known_first_party {
            self.known_first_party = names.into_iter().collect();
        }
        if let Some(names) = file.known_third_party {
            self.known_third_party = names.into_iter().collect();
        }
        if let Some(version) = file.target_version {
            self.target_version = version;
        }
    }

    fn apply_env_vars(&mut self) {
        if let Some(src) = std::env::var_os(ENV_SRC) {
            self.src = std::env::split_paths(&src)
                .filter(|path| !path.as_os_str().is_empty())
                .collect();
            debug!("{ENV_SRC} overrides src: {:?}", self.src);
        }
        if let Ok(names) = std::env::var(ENV_KNOWN_FIRST_PARTY) {
            self.known_first_party = split_names(&names);
        }
        if let Ok(names) = std::env::var(ENV_KNOWN_THIRD_PARTY) {
            self.known_third_party = split_names(&names);
        }
        if let Ok(version) = std::env::var(ENV_TARGET_VERSION) {
            self.target_version = version;
        }
    }

    /// Python 3 minor version for the standard library tables
    pub fn python_version(&self) -> Result<u8> {
        let version = self.target_version.trim();
        let minor = version
            .strip_prefix("py3")
            .or_else(|| version.strip_prefix("3."))
            .ok_or_else(|| {
                Py2ReqsError::InvalidConfig(format!("unsupported target version '{version}'"))
            })?;

        minor.parse::<u8>().map_err(|_| {
            Py2ReqsError::InvalidConfig(format!("unsupported target version '{version}'"))
        })
    }

    /// Application directories, defaulting to the current working directory
    pub fn app_dirs(&self) -> Vec<PathBuf> {
        if self.src.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.src.clone()
        }
    }
}

fn split_names(names: &str) -> IndexSet<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn user_config_path() -> Option<PathBuf> {
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("py2reqs").join(CONFIG_FILE_NAME))
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Py2ReqsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        Py2ReqsError::InvalidConfig(format!("failed to parse '{}': {e}", path.display()))
    })
}

/// `py2reqs.toml` wins over `[tool.py2reqs]` in `pyproject.toml`
fn load_project_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_file = dir.join(CONFIG_FILE_NAME);
    if config_file.is_file() {
        debug!("Loading project config from {}", config_file.display());
        return load_config_file(&config_file).map(Some);
    }

    let pyproject = dir.join(PYPROJECT_FILE_NAME);
    if pyproject.is_file() {
        let content = read_to_string(&pyproject)?;
        let parsed: PyProject = toml::from_str(&content).map_err(|e| {
            Py2ReqsError::InvalidConfig(format!("failed to parse '{}': {e}", pyproject.display()))
        })?;
        if let Some(config) = parsed.tool.and_then(|tool| tool.py2reqs) {
            debug!("Loading [tool.py2reqs] from {}", pyproject.display());
            return Ok(Some(config));
        }
    }

    Ok(None)
}
