use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::engine::{self, ConflictRecord, Context};
use crate::logging::Logger;
use crate::prompt::AutoPrompt;
use crate::resources::LiveBinding;

/// Run the conflicts command: list diverged live paths with their diffs.
///
/// # Errors
///
/// Returns an error if the template root is missing or the state file
/// cannot be read.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let ctx = setup.context(log, Arc::new(AutoPrompt(false)));

    let conflicts = engine::detect_conflicts(&ctx)?;
    if conflicts.is_empty() {
        log.info("No conflicts detected");
        return Ok(());
    }

    log.stage(&format!("Detected {} conflicts", conflicts.len()));
    for record in &conflicts {
        println!("{}", render(&ctx, record));
    }
    log.info("run 'dotpilot resolve' to settle them");
    Ok(())
}

/// One conflict as shown to the user: header line, then the diff.
fn render(ctx: &Context, record: &ConflictRecord) -> String {
    let mut out = format!("{} [{}] ", ctx.display(&record.live), record.tier);
    match &record.binding {
        LiveBinding::LinkedStale { current } => {
            let _ = write!(out, "links to {}", current.display());
        }
        _ => out.push_str("local file differs from template"),
    }
    out.push('\n');
    out.push_str(&record.diff);
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::test_helpers::Fixture;

    #[test]
    fn renders_foreign_conflict() {
        let fx = Fixture::new();
        fx.template("envs/work/.config/git/config", "[user]\nname = work\n");
        fx.live(".config/git/config", "[user]\nname = home\n");
        let ctx = fx.ctx();
        let record = engine::detect_conflicts(&ctx).unwrap().remove(0);

        insta::assert_snapshot!(render(&ctx, &record).trim_end(), @r"
        ~/.config/git/config [env:work] local file differs from template
        - name = home
        + name = work
        ");
    }

    #[cfg(unix)]
    #[test]
    fn renders_stale_link_target() {
        let fx = Fixture::new();
        let old = fx.template("common/.vimrc", "A");
        fx.template("machine/box/.vimrc", "B");
        std::fs::create_dir_all(fx.home()).unwrap();
        std::os::unix::fs::symlink(&old, fx.home().join(".vimrc")).unwrap();
        let ctx = fx.ctx();
        let record = engine::detect_conflicts(&ctx).unwrap().remove(0);

        let text = render(&ctx, &record);
        assert!(text.starts_with(&format!(
            "~/.vimrc [machine:box] links to {}\n",
            old.display()
        )));
    }
}
