//! On-disk fixture tree shared by the integration tests.
//!
//! ```text
//! package1/__init__.py
//! package1/absolute.py
//! package1/absolute_indented.py
//! package1/absolute_from.py
//! package1/module1.py
//! package1/requirements.txt
//! package1/subpackage1/__init__.py
//! package1/subpackage1/module2.py
//! package1/subpackage1/module3.py
//! package1/subpackage1/module4.py
//! package2/__init__.py
//! package2/module10.py
//! ```

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

pub const PACKAGE1_INIT: &str = "from .subpackage1.module4 import foo4\n";

pub const SUBPACKAGE1_INIT: &str = r#"from .module3 import foo3 as bar3


def foo():
    bar3()
"#;

pub const ABSOLUTE_IMPORTS: &str = "import os\nimport pandas\n";

pub const ABSOLUTE_IMPORTS_INDENTED: &str = r#"try:
    import this as foo
except ImportError:
    import that as foo
"#;

pub const ABSOLUTE_IMPORTS_FROM: &str = "from os import getcwd\nfrom pandas import DataFrame\n";

pub const MODULE1: &str = r#"# import subpackage.__init__.py and trigger relative imports in module2
from subpackage1 import foo
from subpackage1.module2 import foo2


def foo1():
    foo()
    foo2()
"#;

pub const MODULE2_RELATIVE_IMPORTS_FROM: &str = r#"# relative imports
from . import module3
from .. import subpackage1
from .module4 import foo4
from ..module1 import foo1
from ..subpackage1.module4 import bar4


def foo2():
    bar4()
"#;

pub const MODULE3: &str = r#"# imported by module2 and subpackage1/__init__.py
def foo3():
    pass
"#;

pub const MODULE4: &str = r#"# imported by module2 and package1/__init__.py
def foo4():
    pass


def bar4():
    pass
"#;

pub const MODULE10: &str = r#"# package1 can be a 3rd party or same party to package2
from package1.subpackage1 import foo4


def foo10():
    foo4()
"#;

/// Fixture files keyed by a short name, relative to the fixture root
pub const FIXTURE_FILES: &[(&str, &str, &str)] = &[
    ("package1_init", "package1/__init__.py", PACKAGE1_INIT),
    ("package1_requirements", "package1/requirements.txt", "pandas\n"),
    ("package1_absolute", "package1/absolute.py", ABSOLUTE_IMPORTS),
    (
        "package1_indented",
        "package1/absolute_indented.py",
        ABSOLUTE_IMPORTS_INDENTED,
    ),
    (
        "package1_absolute_from",
        "package1/absolute_from.py",
        ABSOLUTE_IMPORTS_FROM,
    ),
    ("package1_module1", "package1/module1.py", MODULE1),
    (
        "package1_subpackage1_init",
        "package1/subpackage1/__init__.py",
        SUBPACKAGE1_INIT,
    ),
    (
        "package1_module2",
        "package1/subpackage1/module2.py",
        MODULE2_RELATIVE_IMPORTS_FROM,
    ),
    ("package1_module3", "package1/subpackage1/module3.py", MODULE3),
    ("package1_module4", "package1/subpackage1/module4.py", MODULE4),
    ("package2_init", "package2/__init__.py", ""),
    ("package2_module10", "package2/module10.py", MODULE10),
];

/// A fixture tree written into a temporary directory
pub struct Fixture {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let root = temp_dir
            .path()
            .canonicalize()
            .expect("failed to canonicalize temp dir");

        for (_, relative, content) in FIXTURE_FILES {
            write_file(&root.join(relative), content);
        }

        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// The directory holding `package1` and `package2`
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package1(&self) -> PathBuf {
        self.root.join("package1")
    }

    pub fn package2(&self) -> PathBuf {
        self.root.join("package2")
    }

    /// Absolute path of a fixture file by its short name
    pub fn path(&self, name: &str) -> PathBuf {
        let (_, relative, _) = FIXTURE_FILES
            .iter()
            .find(|(key, _, _)| *key == name)
            .unwrap_or_else(|| panic!("unknown fixture file {name}"));
        self.root.join(relative)
    }

    pub fn paths(&self, names: &[&str]) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = names.iter().map(|name| self.path(name)).collect();
        paths.sort();
        paths
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create fixture directory");
    }
    fs::write(path, content).expect("failed to write fixture file");
}
