//! CommitTrigger against real throwaway git repositories

use std::path::Path;
use std::process::Command;

use rflocal_common::{CommitTrigger, Error, DEFAULT_TRIGGER};
use tempfile::TempDir;

fn git_available() -> bool {
    which::which("git").is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn empty_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    git(dir.path(), &["init", "--quiet"]);
    git(dir.path(), &["config", "user.name", "Test Runner"]);
    git(dir.path(), &["config", "user.email", "tests@example.com"]);
    git(dir.path(), &["config", "commit.gpgSign", "false"]);
    dir
}

fn repo_with_commit(message: &str) -> TempDir {
    let dir = empty_repo();
    git(dir.path(), &["commit", "--quiet", "--allow-empty", "-m", message]);
    dir
}

#[test]
fn test_reads_last_commit() {
    if !git_available() {
        return;
    }
    let repo = repo_with_commit("foo barred baz");
    let trigger = CommitTrigger::with_dir(DEFAULT_TRIGGER, repo.path()).unwrap();
    assert_eq!(trigger.last_commit(), "foo barred baz");
}

#[test]
fn test_last_commit_is_subject_only() {
    if !git_available() {
        return;
    }
    let repo = repo_with_commit("subject line @rainforest #smoke\n\nbody #ignored");
    let trigger = CommitTrigger::with_dir(DEFAULT_TRIGGER, repo.path()).unwrap();
    assert_eq!(trigger.last_commit(), "subject line @rainforest #smoke");
    assert_eq!(trigger.extract_tags(), vec!["smoke"]);
}

#[test]
fn test_refresh_picks_up_new_commit() {
    if !git_available() {
        return;
    }
    let repo = repo_with_commit("first");
    let mut trigger = CommitTrigger::with_dir(DEFAULT_TRIGGER, repo.path()).unwrap();
    assert!(!trigger.is_triggered());

    git(repo.path(), &["commit", "--quiet", "--allow-empty", "-m", "@rainforest #foo, #bar"]);
    trigger.refresh_last_commit().unwrap();
    assert!(trigger.is_triggered());
    assert_eq!(trigger.extract_tags(), vec!["foo", "bar"]);
}

#[test]
fn test_repository_without_commits() {
    if !git_available() {
        return;
    }
    let repo = empty_repo();
    let err = CommitTrigger::with_dir(DEFAULT_TRIGGER, repo.path()).unwrap_err();
    match err {
        Error::Repository { output, .. } => assert!(!output.is_empty()),
        other => panic!("expected repository error, got {other:?}"),
    }
}

#[test]
fn test_not_a_repository() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let err = CommitTrigger::with_dir(DEFAULT_TRIGGER, dir.path()).unwrap_err();
    assert!(matches!(err, Error::Repository { .. }));
}

#[test]
fn test_single_remote() {
    if !git_available() {
        return;
    }
    let repo = repo_with_commit("lol");
    git(repo.path(), &["remote", "add", "lol", "git@github.com:example/rflocal.git"]);
    let trigger = CommitTrigger::with_dir(DEFAULT_TRIGGER, repo.path()).unwrap();
    assert_eq!(trigger.remote_url().unwrap(), "git@github.com:example/rflocal.git");
}

#[test]
fn test_first_added_remote_wins() {
    if !git_available() {
        return;
    }
    let repo = repo_with_commit("lol");
    git(repo.path(), &["remote", "add", "zzz", "git@github.com:example/first.git"]);
    git(repo.path(), &["remote", "add", "aaa", "git@github.com:example/second.git"]);
    let trigger = CommitTrigger::with_dir(DEFAULT_TRIGGER, repo.path()).unwrap();

    assert_eq!(trigger.remote_url().unwrap(), "git@github.com:example/first.git");
    let remotes = trigger.remotes().unwrap();
    assert_eq!(remotes.len(), 2);
    assert_eq!(remotes[1].name, "aaa");
}

#[test]
fn test_missing_remote() {
    if !git_available() {
        return;
    }
    let repo = repo_with_commit("lol");
    let trigger = CommitTrigger::with_dir(DEFAULT_TRIGGER, repo.path()).unwrap();
    assert!(matches!(trigger.remote_url(), Err(Error::NoRemote)));
}
