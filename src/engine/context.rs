use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::exec::Executor;
use crate::logging::Log;
use crate::prompt::Prompt;
use crate::template::TemplateTree;

/// Shared context for engine operations.
pub struct Context {
    /// User's home directory (live tree root).
    pub home: PathBuf,
    /// Template tree for the active environment and host.
    pub tree: TemplateTree,
    /// Logger for output and summary recording.
    pub log: Arc<dyn Log>,
    /// Confirmation and menu capability.
    pub prompt: Arc<dyn Prompt>,
    /// External tool capability (merge tools, diff viewers, editors).
    pub executor: Arc<dyn Executor>,
    /// Editor command line from `$EDITOR`, if set.
    pub editor: Option<String>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("home", &self.home)
            .field("tree", &self.tree)
            .field("log", &"<dyn Log>")
            .field("prompt", &"<dyn Prompt>")
            .field("executor", &"<dyn Executor>")
            .field("editor", &self.editor)
            .finish()
    }
}

impl Context {
    /// Create a context with no editor configured.
    #[must_use]
    pub fn new(
        home: PathBuf,
        tree: TemplateTree,
        log: Arc<dyn Log>,
        prompt: Arc<dyn Prompt>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            home,
            tree,
            log,
            prompt,
            executor,
            editor: None,
        }
    }

    /// Use `editor` for manual conflict edits.
    #[must_use]
    pub fn with_editor(mut self, editor: Option<String>) -> Self {
        self.editor = editor.filter(|e| !e.trim().is_empty());
        self
    }

    /// Home-relative form of `path` (unchanged when outside home).
    #[must_use]
    pub fn home_relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.home).unwrap_or(path)
    }

    /// Short display form: `~/.vimrc` for paths under home.
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.home).map_or_else(
            |_| path.display().to_string(),
            |rel| format!("~/{}", rel.display()),
        )
    }
}
