use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::chapter::Chapter;
use crate::error::{CourseError, Result};
use crate::git::{GitClient, Remote, StatusEntry, VersionControl};
use crate::paths;

/// The student's working copy of the coursework repository.
///
/// Owns the version-control collaborator and caches the two directories
/// everything else hangs off: the working tree's root and `root/chapters`.
/// Both are resolved at most once per process; the working tree does not
/// move mid-run.
pub struct Repository {
    vcs: Box<dyn VersionControl>,
    root: OnceCell<PathBuf>,
    chapters_root: OnceCell<PathBuf>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("chapters_root", &self.chapters_root)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open the repository containing `dir`, or fail with `NotARepository`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_vcs(Box::new(GitClient::new(dir)))
    }

    /// Open over an arbitrary version-control collaborator.
    pub fn with_vcs(vcs: Box<dyn VersionControl>) -> Result<Self> {
        if !vcs.is_work_tree()? {
            return Err(CourseError::NotARepository {
                path: vcs.workdir().to_path_buf(),
            });
        }
        Ok(Self {
            vcs,
            root: OnceCell::new(),
            chapters_root: OnceCell::new(),
        })
    }

    pub(crate) fn vcs(&self) -> &dyn VersionControl {
        self.vcs.as_ref()
    }

    /// Absolute root of the working tree. Resolved once, then cached.
    pub fn root_dir(&self) -> Result<&Path> {
        self.root
            .get_or_try_init(|| self.vcs.top_level())
            .map(PathBuf::as_path)
    }

    /// `root/chapters`, cached alongside the root.
    pub fn chapters_dir(&self) -> Result<&Path> {
        self.chapters_root
            .get_or_try_init(|| Ok(self.root_dir()?.join(paths::CHAPTERS_DIR)))
            .map(PathBuf::as_path)
    }

    /// Expected directory for a chapter id. Pure construction; the directory
    /// need not exist.
    pub fn chapter_dir(&self, id: &str) -> Result<PathBuf> {
        Ok(self.chapters_dir()?.join(id))
    }

    /// All chapters: immediate subdirectories of `root/chapters` that pass
    /// the classifier. Enumeration order is whatever the filesystem yields;
    /// callers wanting determinism sort by id.
    ///
    /// A missing `chapters/` directory or an unreadable candidate just means
    /// fewer chapters, never a failed discovery.
    #[instrument(skip_all)]
    pub fn chapters(&self) -> Result<Vec<Chapter<'_>>> {
        let root = self.root_dir()?.to_path_buf();
        let chapters_dir = self.chapters_dir()?;

        let chapters: Vec<Chapter<'_>> = WalkDir::new(chapters_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| paths::is_chapter_directory(entry.path(), &root))
            .filter_map(|entry| entry.file_name().to_str().map(String::from))
            .map(|id| Chapter::new(self, id))
            .collect();

        debug!(count = chapters.len(), "chapters discovered");
        Ok(chapters)
    }

    /// Resolve the chapter at `path`.
    ///
    /// `Ok(None)` when `path` is simply not a chapter directory; that is an
    /// expected outcome, not a failure. `InvalidChapterPath` when the path
    /// sits under `chapters/` but does not reduce to a single-segment id.
    pub fn chapter_from_path(&self, path: &Path) -> Result<Option<Chapter<'_>>> {
        let root = self.root_dir()?.to_path_buf();

        if !paths::is_chapter_directory(path, &root) {
            debug!(path = %path.display(), "not a chapter directory");
            return Ok(None);
        }

        let id = paths::chapter_id_from_path(path, &root)?;
        debug!(id = %id, "chapter resolved from path");
        Ok(Some(Chapter::new(self, id)))
    }

    /// Snapshot of the absolute paths git currently reports as modified.
    ///
    /// Re-derived on every call: commits made earlier in the same run change
    /// the answer. Paths are joined onto the same cached root used for
    /// chapter path construction, so membership tests compare like with like.
    pub fn modified_paths(&self) -> Result<BTreeSet<PathBuf>> {
        let root = self.root_dir()?.to_path_buf();
        let modified = self
            .vcs
            .status()?
            .into_iter()
            .filter(StatusEntry::is_modified)
            .map(|entry| root.join(entry.path))
            .collect();
        debug!(?modified, "modified files");
        Ok(modified)
    }

    /// Raw working-tree status, for the `status` passthrough command.
    pub fn status(&self) -> Result<Vec<StatusEntry>> {
        self.vcs.status()
    }

    /// Push the current branch to the student's fork.
    pub fn push_origin(&self) -> Result<()> {
        let branch = self.vcs.current_branch()?;
        self.vcs.push("origin", &branch)
    }

    /// Pull the current branch from the shared course repository.
    pub fn pull_upstream(&self) -> Result<()> {
        let branch = self.vcs.current_branch()?;
        self.vcs.pull("upstream", &branch)
    }

    /// Check that the `upstream` remote exists and, when an expected URL is
    /// configured, that its fetch URL matches. Only synchronizing commands
    /// call this; local commands work without any remotes.
    pub fn verify_upstream(&self, expected_url: Option<&str>) -> Result<()> {
        let remotes = self.vcs.remotes()?;
        let upstream: &Remote = remotes
            .iter()
            .find(|remote| remote.name == "upstream")
            .ok_or(CourseError::MissingUpstreamRemote)?;

        if let Some(expected) = expected_url {
            if upstream.fetch_url != expected {
                return Err(CourseError::WrongUpstreamUrl {
                    found: upstream.fetch_url.clone(),
                    expected: expected.to_string(),
                });
            }
        }
        Ok(())
    }
}
