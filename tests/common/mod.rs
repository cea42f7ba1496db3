// Shared helpers for integration tests.
//
// Provides a temporary home directory plus template root and builds engine
// contexts over them with non-interactive capabilities, so each test runs
// isolated from the real home and terminal.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotpilot_cli::engine::Context;
use dotpilot_cli::exec::Executor;
use dotpilot_cli::logging::Logger;
use dotpilot_cli::prompt::AutoPrompt;
use dotpilot_cli::template::TemplateTree;

/// Hostname selecting the machine tier in every sandbox.
pub const HOST: &str = "box";

/// Executor for a machine with no external tools installed.
#[derive(Debug, Default)]
pub struct NoTools;

impl Executor for NoTools {
    fn which(&self, _program: &str) -> bool {
        false
    }

    fn run_interactive(&self, program: &str, _args: &[OsString]) -> anyhow::Result<bool> {
        anyhow::bail!("unexpected run of {program}")
    }
}

/// An isolated home directory and template root backed by a
/// [`tempfile::TempDir`].
pub struct Sandbox {
    dir: tempfile::TempDir,
    /// Logger shared by every context built from this sandbox.
    pub log: Arc<Logger>,
}

impl Sandbox {
    /// Create empty `home/` and `root/` directories.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("home")).expect("create home");
        std::fs::create_dir_all(dir.path().join("root")).expect("create root");
        Self {
            dir,
            log: Arc::new(Logger::new()),
        }
    }

    /// Home directory.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Template root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("root")
    }

    /// Write a template file at `rel` (relative to the root).
    pub fn template(&self, rel: &str, content: &str) -> PathBuf {
        write(&self.root().join(rel), content)
    }

    /// Write a live file at `rel` (relative to home).
    pub fn live(&self, rel: &str, content: &str) -> PathBuf {
        write(&self.home().join(rel), content)
    }

    /// Context for `environment` on [`HOST`]; prompts are answered with
    /// `answer`.
    pub fn ctx(&self, environment: Option<&str>, answer: bool) -> Context {
        let tree = TemplateTree::new(self.root(), environment.map(String::from), HOST.into());
        self.ctx_with(tree, answer)
    }

    /// Context over an arbitrary `tree` with this sandbox's home.
    pub fn ctx_with(&self, tree: TemplateTree, answer: bool) -> Context {
        Context::new(
            self.home(),
            tree,
            self.log.clone(),
            Arc::new(AutoPrompt(answer)),
            Arc::new(NoTools),
        )
    }

    /// Directory holding both `home/` and `root/`.
    pub fn base(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

fn write(path: &Path, content: &str) -> PathBuf {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    std::fs::write(path, content).expect("write file");
    path.to_path_buf()
}

/// Contents of `path`, following symlinks.
pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read file")
}

/// Every symlink under `dir` with its target, relative to `dir`, sorted.
pub fn links_under(dir: &Path) -> Vec<(PathBuf, PathBuf)> {
    let mut links: Vec<(PathBuf, PathBuf)> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path_is_symlink())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).expect("under dir").to_path_buf();
            let target = std::fs::read_link(e.path()).expect("read link");
            (rel, target)
        })
        .collect();
    links.sort();
    links
}

/// Names of every file in `dir` containing `marker`, sorted.
pub fn names_containing(dir: &Path, marker: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains(marker))
        .collect();
    names.sort();
    names
}
