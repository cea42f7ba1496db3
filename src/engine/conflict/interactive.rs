//! Per-conflict menu: resolve, inspect, edit, or skip.
use anyhow::{Context as _, Result};

use super::ConflictRecord;
use super::resolve::{Resolution, backup_both, keep_local, keep_remote, merge, relink, write_content};
use crate::engine::Context;
use crate::exec::{DIFF_TOOLS, locate, locate_editor};
use crate::resources::diff::file_diff_lossy;

/// Menu entries, in the order they are offered.
pub(super) const MENU: [&str; 7] = [
    "Keep local version",
    "Keep remote version",
    "Merge changes (requires merge tool)",
    "View diff in external tool",
    "Edit file manually",
    "Keep both versions (create backup)",
    "Skip this conflict",
];

/// Ask until a terminal choice is made.
///
/// Viewing and editing return to the menu; a failure there is logged and
/// the menu is offered again.  Out-of-range answers are re-asked.
pub(super) fn resolve_interactive(ctx: &Context, record: &ConflictRecord) -> Result<Resolution> {
    let shown = ctx.display(&record.live);
    ctx.prompt
        .show(&format!("\nConflict detected for {shown}\nDiff:\n{}", record.diff));

    loop {
        let choice = ctx
            .prompt
            .select("How would you like to resolve this conflict?", &MENU)?;
        match choice {
            0 => return keep_local(ctx, record),
            1 => return keep_remote(ctx, record),
            2 => return merge(ctx, record),
            3 => {
                if let Err(e) = view_external(ctx, record) {
                    ctx.log
                        .error(&format!("failed to view diff in external tool: {e:#}"));
                }
            }
            4 => {
                if let Err(e) = edit_manually(ctx, record) {
                    ctx.log.error(&format!("failed to edit file manually: {e:#}"));
                }
            }
            5 => return backup_both(ctx, record),
            6 => {
                ctx.log.info(&format!("skipping conflict for {shown}"));
                return Ok(Resolution::Skipped);
            }
            _ => ctx.prompt.show("Invalid choice, please try again"),
        }
    }
}

/// Open the pair in a diff viewer, or print the positional diff.
fn view_external(ctx: &Context, record: &ConflictRecord) -> Result<()> {
    let Some(tool) = locate(ctx.executor.as_ref(), DIFF_TOOLS) else {
        ctx.prompt.show(&format!(
            "Diff between {} and {}:\n{}",
            record.live.display(),
            record.template.display(),
            file_diff_lossy(&record.live, &record.template)
        ));
        return Ok(());
    };
    ctx.log.debug(&format!("viewing diff with {tool}"));
    // `diff -u` exits non-zero whenever the files differ.
    tool.run(
        ctx.executor.as_ref(),
        &[record.live.as_path(), record.template.as_path()],
    )?;
    Ok(())
}

/// Edit a scratch copy of the template and optionally adopt it.
fn edit_manually(ctx: &Context, record: &ConflictRecord) -> Result<()> {
    let editor = locate_editor(ctx.executor.as_ref(), ctx.editor.as_deref())
        .context("no editor found, please set the EDITOR environment variable")?;

    let scratch = tempfile::Builder::new()
        .prefix("dotpilot-edit-")
        .tempfile()
        .context("creating edit file")?;
    write_content(&record.template, scratch.path())?;

    ctx.log.info(&format!(
        "opening {} in {editor}",
        scratch.path().display()
    ));
    if !editor.run(ctx.executor.as_ref(), &[scratch.path()])? {
        anyhow::bail!("{editor} exited with an error");
    }

    if ctx.prompt.confirm("Use this edited version?", false)? {
        write_content(scratch.path(), &record.template)?;
        relink(record)?;
        ctx.log.info(&format!(
            "applied edited version to {}",
            ctx.display(&record.live)
        ));
    } else {
        ctx.log.info("edited version discarded");
    }
    Ok(())
}
