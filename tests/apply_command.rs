#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for layered application.
//!
//! These tests drive [`engine::apply`] over a temporary home directory and
//! template tree and check the properties callers rely on: later tiers win,
//! a second run changes nothing, one bad entry does not stop the rest, and
//! the same tree always produces the same links.

mod common;

use std::path::{Path, PathBuf};

use common::*;
use dotpilot_cli::config::{self, TrackingList};
use dotpilot_cli::template::{TemplateTree, TierSkips};
use dotpilot_cli::engine::{self, ReconcileOptions};
use dotpilot_cli::logging::Outcome;

fn opts() -> ReconcileOptions {
    ReconcileOptions {
        backup: true,
        diff_prompt: false,
        dry_run: false,
    }
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

#[test]
fn machine_beats_environment_beats_common() {
    let sb = Sandbox::new();
    sb.template("common/.vimrc", "common");
    sb.template("envs/work/.vimrc", "work");
    sb.template("machine/box/.vimrc", "box");
    sb.template("common/.zshrc", "zsh");
    sb.template("envs/work/.config/git/config", "git");
    sb.template("envs/work/.gitconfig", "reserved");

    let mut tracking = TrackingList::default();
    engine::apply(&sb.ctx(Some("work"), false), opts(), &mut tracking).unwrap();

    assert_eq!(read(&sb.home().join(".vimrc")), "box");
    assert_eq!(read(&sb.home().join(".zshrc")), "zsh");
    assert_eq!(read(&sb.home().join(".config/git/config")), "git");
    assert!(!sb.home().join(".gitconfig").exists());
}

#[test]
fn other_environments_are_ignored() {
    let sb = Sandbox::new();
    sb.template("common/.vimrc", "common");
    sb.template("envs/home/.vimrc", "home");

    let mut tracking = TrackingList::default();
    engine::apply(&sb.ctx(Some("work"), false), opts(), &mut tracking).unwrap();

    assert_eq!(read(&sb.home().join(".vimrc")), "common");
}

#[test]
fn environment_tier_applies_over_common_without_machine_tier() {
    let sb = Sandbox::new();
    sb.template("common/.config/app/settings", "common");
    sb.template("envs/work/.config/app/settings", "work");

    let mut tracking = TrackingList::default();
    engine::apply(&sb.ctx(Some("work"), false), opts(), &mut tracking).unwrap();

    assert_eq!(read(&sb.home().join(".config/app/settings")), "work");
    assert_eq!(
        std::fs::read_link(sb.home().join(".config/app/settings")).unwrap(),
        sb.root().join("envs/work/.config/app/settings")
    );
    assert!(tracking.contains(&PathBuf::from(".config/app/settings")));
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn skipped_machine_tier_is_neither_linked_nor_scanned() {
    let sb = Sandbox::new();
    sb.template("common/.vimrc", "common");
    sb.template("machine/box/.vimrc", "box");
    sb.template("machine/box/.xinitrc", "x");
    sb.live(".xinitrc", "local");
    let skip = TierSkips {
        machine: true,
        ..TierSkips::default()
    };
    let tree = TemplateTree::new(sb.root(), None, HOST.into()).with_skips(skip);
    let ctx = sb.ctx_with(tree, false);

    let mut tracking = TrackingList::default();
    engine::apply(&ctx, opts(), &mut tracking).unwrap();

    assert_eq!(read(&sb.home().join(".vimrc")), "common");
    assert_eq!(read(&sb.home().join(".xinitrc")), "local");
    assert!(engine::detect_conflicts(&ctx).unwrap().is_empty());

    let full = sb.ctx(None, false);
    assert_eq!(engine::detect_conflicts(&full).unwrap().len(), 2);
}

#[test]
fn directory_at_a_file_path_is_kept_and_reported() {
    let sb = Sandbox::new();
    sb.template("common/.vimrc", "file");
    sb.live(".vimrc/keep", "mine");

    let mut tracking = TrackingList::default();
    let report = engine::apply(&sb.ctx(None, false), opts(), &mut tracking).unwrap();

    assert!(report.is_clean());
    assert_eq!(read(&sb.home().join(".vimrc/keep")), "mine");
    let skipped: Vec<_> = sb
        .log
        .entries()
        .into_iter()
        .filter(|e| e.outcome == Outcome::Skipped)
        .collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].path, "~/.vimrc");
    assert_eq!(
        skipped[0].detail.as_deref(),
        Some("a directory exists at the live path")
    );
}

#[test]
fn relative_root_links_resolve_from_home() {
    let sb = Sandbox::new();
    sb.template("common/.vimrc", "common");
    let root = config::resolve_root(Some(Path::new("root")), &sb.home(), &sb.base());
    let ctx = sb.ctx_with(TemplateTree::new(root, None, HOST.into()), false);

    let mut tracking = TrackingList::default();
    let first = engine::apply(&ctx, opts(), &mut tracking).unwrap();
    let second = engine::apply(&ctx, opts(), &mut tracking).unwrap();

    let live = sb.home().join(".vimrc");
    assert!(std::fs::read_link(&live).unwrap().is_absolute());
    assert_eq!(read(&live), "common");
    assert_eq!(first.stats.changed, 1);
    assert_eq!(second.stats.changed, 0);
}

#[test]
fn second_apply_changes_nothing() {
    let sb = Sandbox::new();
    sb.template("common/.vimrc", "A");
    sb.template("common/.config/nvim/init.lua", "lua");
    sb.template("machine/box/.ssh/config", "ssh");
    sb.live(".vimrc", "B");

    let ctx = sb.ctx(Some("work"), false);
    let mut tracking = TrackingList::default();
    let first = engine::apply(&ctx, opts(), &mut tracking).unwrap();
    assert!(first.is_clean());
    assert!(first.stats.changed > 0);
    let links = links_under(&sb.home());
    let backups = names_containing(&sb.home(), "dotpilot.bak");
    let tracked: Vec<PathBuf> = tracking.iter().map(PathBuf::from).collect();

    let second = engine::apply(&ctx, opts(), &mut tracking).unwrap();

    assert_eq!(second.stats.changed, 0);
    assert_eq!(second.stats.already_ok, first.stats.changed);
    assert_eq!(links_under(&sb.home()), links);
    assert_eq!(names_containing(&sb.home(), "dotpilot.bak"), backups);
    assert_eq!(backups.len(), 1);
    assert_eq!(tracking.iter().map(PathBuf::from).collect::<Vec<_>>(), tracked);
}

// ---------------------------------------------------------------------------
// Totality and determinism
// ---------------------------------------------------------------------------

#[test]
fn a_bad_entry_does_not_stop_the_walk() {
    let sb = Sandbox::new();
    sb.template("common/.config/a/file", "a");
    sb.template("common/.zshrc", "zsh");
    // A regular file where the template needs a directory.
    sb.live(".config", "not a directory");

    let mut tracking = TrackingList::default();
    let report = engine::apply(&sb.ctx(None, false), opts(), &mut tracking).unwrap();

    assert!(!report.is_clean());
    assert_eq!(read(&sb.home().join(".zshrc")), "zsh");
    assert_eq!(read(&sb.home().join(".config")), "not a directory");
}

#[test]
fn same_tree_yields_same_links() {
    let build = || {
        let sb = Sandbox::new();
        sb.template("common/.vimrc", "A");
        sb.template("common/.config/git/config", "git");
        sb.template("envs/work/.config/git/config", "work");
        sb.template("machine/box/.tmux.conf", "tmux");
        let mut tracking = TrackingList::default();
        engine::apply(&sb.ctx(Some("work"), false), opts(), &mut tracking).unwrap();
        let links: Vec<(PathBuf, PathBuf)> = links_under(&sb.home())
            .into_iter()
            .map(|(rel, target)| (rel, target.strip_prefix(sb.root()).unwrap().to_path_buf()))
            .collect();
        (links, tracking.iter().map(PathBuf::from).collect::<Vec<_>>())
    };

    let (first_links, first_tracked) = build();
    let (second_links, second_tracked) = build();

    assert_eq!(first_links, second_links);
    assert_eq!(first_tracked, second_tracked);
    assert_eq!(
        first_links,
        vec![
            (
                PathBuf::from(".config/git/config"),
                PathBuf::from("envs/work/.config/git/config")
            ),
            (PathBuf::from(".tmux.conf"), PathBuf::from("machine/box/.tmux.conf")),
            (PathBuf::from(".vimrc"), PathBuf::from("common/.vimrc")),
        ]
    );
}

#[test]
fn declined_prompt_leaves_file_alone() {
    let sb = Sandbox::new();
    sb.template("common/.vimrc", "A");
    let live = sb.live(".vimrc", "B");

    let mut tracking = TrackingList::default();
    let report = engine::apply(
        &sb.ctx(None, false),
        ReconcileOptions {
            diff_prompt: true,
            ..opts()
        },
        &mut tracking,
    )
    .unwrap();

    assert_eq!(report.stats.skipped, 1);
    assert_eq!(read(&live), "B");
    assert!(!live.symlink_metadata().unwrap().file_type().is_symlink());
    assert!(tracking.is_empty());
}

#[test]
fn missing_root_is_reported() {
    let sb = Sandbox::new();
    std::fs::remove_dir(sb.root()).unwrap();

    let mut tracking = TrackingList::default();
    let err = engine::apply(&sb.ctx(None, false), opts(), &mut tracking).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<dotpilot_cli::error::DotpilotError>(),
        Some(dotpilot_cli::error::DotpilotError::NotInitialized(_))
    ));
}
