//! Terminal interaction used by diff confirmation and interactive resolution.
use anyhow::Result;
use dialoguer::{Confirm, Select};

/// User-facing question/answer capability.
///
/// The engine asks through this trait so batch runs and tests never touch
/// the real terminal.
pub trait Prompt: Send + Sync {
    /// Display a block of text (diffs, headers).
    fn show(&self, text: &str);

    /// Ask a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;

    /// Ask the user to pick one of `items`; returns the chosen index.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read.
    fn select(&self, question: &str, items: &[&str]) -> Result<usize>;
}

/// [`Prompt`] backed by the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    #[allow(clippy::print_stdout)]
    fn show(&self, text: &str) {
        println!("{text}");
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()?)
    }

    fn select(&self, question: &str, items: &[&str]) -> Result<usize> {
        Ok(Select::new()
            .with_prompt(question)
            .items(items)
            .default(0)
            .interact()?)
    }
}

/// [`Prompt`] that answers every confirmation with a fixed value and never
/// selects; used when no terminal interaction is allowed.
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompt(pub bool);

impl Prompt for AutoPrompt {
    fn show(&self, _text: &str) {}

    fn confirm(&self, _question: &str, _default: bool) -> Result<bool> {
        Ok(self.0)
    }

    fn select(&self, question: &str, _items: &[&str]) -> Result<usize> {
        anyhow::bail!("cannot answer '{question}' without a terminal")
    }
}
