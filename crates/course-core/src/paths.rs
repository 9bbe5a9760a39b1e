use std::path::Path;

use crate::error::{CourseError, Result};

/// Directory under the repository root that holds all chapters
pub const CHAPTERS_DIR: &str = "chapters";

/// The student's solution file inside a chapter
pub const SOLUTION_FILE: &str = "student.js";

/// The browser-based test definition inside a chapter
pub const TESTS_FILE: &str = "tests.html";

/// Files that must all be present for a directory to count as a chapter
pub const MARKER_FILES: &[&str] = &[SOLUTION_FILE, TESTS_FILE, "bundle.js"];

/// Normalize a path to forward slashes so the rules below work for both
/// POSIX and Windows-style inputs.
fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Path of `candidate` relative to `root`, forward-slash normalized.
///
/// Returns `None` when `candidate` is not under `root` (or is `root` itself).
/// The prefix match is component-aware: `rootx/...` is not under `root`.
fn relative_to(candidate: &Path, root: &Path) -> Option<String> {
    let candidate = normalize(candidate);
    let root = normalize(root);
    let root = root.trim_end_matches('/');

    let rest = candidate.strip_prefix(root)?;
    let rest = rest.strip_prefix('/')?;
    let rest = rest.trim_end_matches('/');

    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Extract the chapter id from `candidate` when its path relative to `root`
/// has exactly the `chapters/<id>` shape: one non-empty segment, no deeper
/// nesting. Anything else (the `chapters` directory itself, siblings of it,
/// nested subdirectories) is not a chapter.
pub fn chapter_segment(candidate: &Path, root: &Path) -> Option<String> {
    let relative = relative_to(candidate, root)?;
    let mut segments = relative.split('/');

    if segments.next()? != CHAPTERS_DIR {
        return None;
    }
    let id = segments.next()?;
    if id.is_empty() || segments.next().is_some() {
        return None;
    }

    Some(id.to_string())
}

/// A directory is a chapter iff it sits exactly one level below `chapters/`
/// and all marker files exist directly inside it. Partial marker presence
/// means the chapter is still being scaffolded and stays invisible.
pub fn is_chapter_directory(candidate: &Path, root: &Path) -> bool {
    if chapter_segment(candidate, root).is_none() {
        return false;
    }

    MARKER_FILES
        .iter()
        .all(|marker| candidate.join(marker).is_file())
}

/// Derive the chapter id for a path already known to live under `chapters/`.
///
/// Errors with `InvalidChapterPath` when the remainder after `chapters/` is
/// empty or still contains a separator. Discovery only hands over
/// single-segment paths, so this triggering means the layout is corrupted
/// and callers must treat it as fatal.
pub fn chapter_id_from_path(candidate: &Path, root: &Path) -> Result<String> {
    let invalid = || CourseError::InvalidChapterPath {
        path: candidate.to_path_buf(),
    };

    let relative = relative_to(candidate, root).ok_or_else(invalid)?;
    let id = relative
        .strip_prefix(CHAPTERS_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(invalid)?;

    if id.is_empty() || id.contains('/') {
        return Err(invalid());
    }

    Ok(id.to_string())
}
