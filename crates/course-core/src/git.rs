//! Git adapter.
//!
//! The tool only needs a small, fixed command surface from git, so this is a
//! thin wrapper around `git` subprocess calls behind the [`VersionControl`]
//! trait. The trait is the seam the repository model is tested through.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, instrument};

use crate::error::{CourseError, Result};

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    /// Path of the changed file, relative to the repository root.
    pub path: PathBuf,
}

impl StatusEntry {
    /// True when either the index or the worktree column reports the file
    /// as modified. Content is irrelevant; this mirrors what git reports.
    pub fn is_modified(&self) -> bool {
        self.code.contains('M')
    }
}

/// A named remote with its fetch URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub fetch_url: String,
}

/// Version-control operations the repository model consumes.
pub trait VersionControl {
    /// Directory the collaborator is bound to.
    fn workdir(&self) -> &Path;

    /// Is `workdir` inside a git working tree?
    fn is_work_tree(&self) -> Result<bool>;

    /// Absolute top-level directory of the working tree.
    fn top_level(&self) -> Result<PathBuf>;

    /// Current working-tree status, including untracked files.
    fn status(&self) -> Result<Vec<StatusEntry>>;

    /// Remotes with their fetch URLs.
    fn remotes(&self) -> Result<Vec<Remote>>;

    /// Current branch name.
    fn current_branch(&self) -> Result<String>;

    /// Stage a single file.
    fn add(&self, path: &Path) -> Result<()>;

    /// Commit staged changes with a message.
    fn commit(&self, message: &str) -> Result<()>;

    /// Push a branch to a named remote.
    fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Pull a branch from a named remote.
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;
}

/// [`VersionControl`] implementation that spawns the `git` binary.
#[derive(Debug, Clone)]
pub struct GitClient {
    workdir: PathBuf,
}

impl GitClient {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Clone `url` into `target`. There is no working tree yet, so this is
    /// not part of the trait surface.
    #[instrument(skip_all, fields(url))]
    pub fn clone_repo(url: &str, target: &Path) -> Result<()> {
        debug!(url, target = %target.display(), "cloning repository");
        let output = Command::new("git")
            .args(["clone", url])
            .arg(target)
            .output()?;

        check_status("clone", &output)
    }

    /// Register a new remote on this working tree.
    pub fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        let output = self.run(&["remote", "add", name, url])?;
        check_status("remote add", &output)
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        check_status(&args.join(" "), &output)?;
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(?args, "running git");
        Ok(Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()?)
    }
}

fn check_status(what: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(CourseError::Git {
        message: format!("git {} failed: {}", what, stderr.trim()),
    })
}

impl VersionControl for GitClient {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_work_tree(&self) -> Result<bool> {
        // Exits non-zero outside a repository; that is an answer, not an error.
        let output = self.run(&["rev-parse", "--is-inside-work-tree"])?;
        Ok(output.status.success()
            && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    #[instrument(skip_all)]
    fn top_level(&self) -> Result<PathBuf> {
        let out = self.run_capture(&["rev-parse", "--show-toplevel"])?;
        let root = PathBuf::from(out.trim());
        debug!(root = %root.display(), "resolved repository root");
        Ok(root)
    }

    fn status(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run_capture(&["status", "--porcelain=v1"])?;
        let mut entries = Vec::new();
        for line in out.lines() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_status_line(line)?);
        }
        Ok(entries)
    }

    fn remotes(&self) -> Result<Vec<Remote>> {
        let out = self.run_capture(&["remote", "-v"])?;
        let mut remotes = Vec::new();
        for line in out.lines() {
            if let Some(remote) = parse_remote_line(line) {
                remotes.push(remote);
            }
        }
        Ok(remotes)
    }

    fn current_branch(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.trim().to_string();
        if name == "HEAD" {
            return Err(CourseError::Git {
                message: "detached HEAD (check out a branch first)".to_string(),
            });
        }
        Ok(name)
    }

    fn add(&self, path: &Path) -> Result<()> {
        let output = Command::new("git")
            .arg("add")
            .arg(path)
            .current_dir(&self.workdir)
            .output()?;
        check_status("add", &output)
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run_checked(&["commit", "-m", message])?;
        Ok(())
    }

    #[instrument(skip_all, fields(remote, branch))]
    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        debug!(remote, branch, "pushing");
        self.run_checked(&["push", remote, branch])?;
        Ok(())
    }

    #[instrument(skip_all, fields(remote, branch))]
    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        debug!(remote, branch, "pulling");
        self.run_checked(&["pull", remote, branch])?;
        Ok(())
    }
}

fn parse_status_line(line: &str) -> Result<StatusEntry> {
    if let Some(path) = line.strip_prefix("?? ") {
        return Ok(StatusEntry {
            code: "??".to_string(),
            path: PathBuf::from(unquote_path(path.trim())),
        });
    }
    if line.len() < 4 {
        return Err(CourseError::Git {
            message: format!("unexpected porcelain line: '{line}'"),
        });
    }
    let code = line[..2].to_string();
    let mut path = line[3..].trim();
    // Renames and copies report "old -> new"; the new path is the one on
    // disk. Other codes keep the path verbatim, arrows and all.
    if code.contains('R') || code.contains('C') {
        if let Some((_, new)) = path.split_once(" -> ") {
            path = new.trim();
        }
    }
    Ok(StatusEntry {
        code,
        path: PathBuf::from(unquote_path(path)),
    })
}

/// Git C-quotes paths containing spaces or special characters. Undo the
/// quoting and the common escapes; octal escapes (non-ASCII bytes) are left
/// verbatim, chapter slugs are expected to be plain ASCII.
fn unquote_path(path: &str) -> String {
    let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return path.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_remote_line(line: &str) -> Option<Remote> {
    // Format: "<name>\t<url> (fetch|push)"; only fetch entries are kept.
    if !line.ends_with("(fetch)") {
        return None;
    }
    let (name, rest) = line.split_once('\t')?;
    let url = rest.trim_end_matches("(fetch)").trim();
    Some(Remote {
        name: name.to_string(),
        fetch_url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_worktree_modified_line() {
        let e = parse_status_line(" M chapters/intro/student.js").unwrap();
        assert_eq!(e.code, " M");
        assert_eq!(e.path, PathBuf::from("chapters/intro/student.js"));
        assert!(e.is_modified());
    }

    #[test]
    fn parses_staged_modified_line() {
        let e = parse_status_line("M  chapters/intro/student.js").unwrap();
        assert!(e.is_modified());
    }

    #[test]
    fn parses_untracked_line() {
        let e = parse_status_line("?? notes.txt").unwrap();
        assert_eq!(e.code, "??");
        assert!(!e.is_modified());
    }

    #[test]
    fn added_files_are_not_modified() {
        let e = parse_status_line("A  chapters/basics/student.js").unwrap();
        assert!(!e.is_modified());
    }

    #[test]
    fn rename_line_uses_new_path() {
        let e = parse_status_line("R  old.js -> new.js").unwrap();
        assert_eq!(e.path, PathBuf::from("new.js"));
    }

    #[test]
    fn quoted_path_with_spaces_is_unquoted() {
        let e = parse_status_line(" M \"chapters/tall en logica/student.js\"").unwrap();
        assert_eq!(e.path, PathBuf::from("chapters/tall en logica/student.js"));
        assert!(e.is_modified());
    }

    #[test]
    fn quoted_untracked_path_is_unquoted() {
        let e = parse_status_line("?? \"my notes.txt\"").unwrap();
        assert_eq!(e.path, PathBuf::from("my notes.txt"));
    }

    #[test]
    fn escaped_quote_inside_quoted_path() {
        let e = parse_status_line(" M \"say \\\"hi\\\".js\"").unwrap();
        assert_eq!(e.path, PathBuf::from("say \"hi\".js"));
    }

    #[test]
    fn arrow_in_path_is_not_a_rename_for_modified_code() {
        let e = parse_status_line(" M chapters/a -> b/student.js").unwrap();
        assert_eq!(e.path, PathBuf::from("chapters/a -> b/student.js"));
    }

    #[test]
    fn quoted_rename_uses_new_path() {
        let e = parse_status_line("R  \"old a.js\" -> \"new a.js\"").unwrap();
        assert_eq!(e.path, PathBuf::from("new a.js"));
    }

    #[test]
    fn rejects_garbage_line() {
        assert!(parse_status_line("x").is_err());
    }

    #[test]
    fn parses_fetch_remote_line() {
        let r = parse_remote_line("upstream\thttps://example.org/course.git (fetch)").unwrap();
        assert_eq!(r.name, "upstream");
        assert_eq!(r.fetch_url, "https://example.org/course.git");
    }

    #[test]
    fn skips_push_remote_line() {
        assert!(parse_remote_line("origin\tgit@example.org:me/fork.git (push)").is_none());
    }
}
