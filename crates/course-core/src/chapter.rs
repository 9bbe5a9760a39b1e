use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::paths::{SOLUTION_FILE, TESTS_FILE};
use crate::repository::Repository;
use crate::runner::{TestReport, TestRunner};

/// Outcome of [`Chapter::commit_solution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Committed {
    /// The solution was staged and committed.
    Committed,
    /// Nothing to commit; the solution file was not modified.
    Skipped,
}

/// One exercise unit, identified by its directory name under `chapters/`.
///
/// Borrows the repository it belongs to; a chapter never outlives or
/// mutates it. The id is an opaque key; the only structure it carries is
/// the discovery rule that produced it.
pub struct Chapter<'repo> {
    repository: &'repo Repository,
    id: String,
}

impl<'repo> Chapter<'repo> {
    pub(crate) fn new(repository: &'repo Repository, id: String) -> Self {
        Self { repository, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `root/chapters/<id>`.
    pub fn path(&self) -> Result<PathBuf> {
        self.repository.chapter_dir(&self.id)
    }

    /// Absolute path of a file directly inside this chapter.
    pub fn file_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.path()?.join(name))
    }

    /// Whether git currently reports the solution file as modified.
    ///
    /// A membership test against a fresh modification snapshot, not a
    /// content diff: whatever git lists as modified counts, even if the
    /// content round-tripped back to identical bytes.
    pub fn is_modified(&self) -> Result<bool> {
        let solution = self.file_path(SOLUTION_FILE)?;
        let modified = self.repository.modified_paths()?;
        let result = modified.contains(&solution);
        debug!(id = %self.id, modified = result, "modification check");
        Ok(result)
    }

    /// Run this chapter's test suite through the external harness and hand
    /// back its report untouched.
    #[instrument(skip_all, fields(id = %self.id))]
    pub fn run_tests(&self, runner: &dyn TestRunner) -> Result<TestReport> {
        let tests = self.file_path(TESTS_FILE)?;
        debug!(tests = %tests.display(), "running chapter tests");
        runner.run(&tests)
    }

    /// Stage and commit the solution file when modified; do nothing when it
    /// is not. Safe to repeat: once the commit clears git's status, the next
    /// invocation skips.
    #[instrument(skip_all, fields(id = %self.id))]
    pub fn commit_solution(&self) -> Result<Committed> {
        if !self.is_modified()? {
            debug!("solution unchanged, nothing to commit");
            return Ok(Committed::Skipped);
        }

        let solution = self.file_path(SOLUTION_FILE)?;
        let message = format!("{}/{}", self.id, SOLUTION_FILE);
        debug!(%message, "committing solution");

        self.repository.vcs().add(&solution)?;
        self.repository.vcs().commit(&message)?;
        Ok(Committed::Committed)
    }
}
