//! Hand-written fakes and fixtures shared by the unit tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::Result;
use crate::git::{Remote, StatusEntry, VersionControl};
use crate::paths::{CHAPTERS_DIR, MARKER_FILES};
use crate::runner::{SectionScore, TestReport, TestRunner};

/// Create `root/chapters/<id>` with all marker files and return its path.
pub(crate) fn chapter_tree(root: &Path, id: &str) -> PathBuf {
    let dir = root.join(CHAPTERS_DIR).join(id);
    fs::create_dir_all(&dir).unwrap();
    for marker in MARKER_FILES {
        fs::write(dir.join(marker), "").unwrap();
    }
    dir
}

/// In-memory [`VersionControl`] with recorded effects.
///
/// Modified paths are relative to the root, like git reports them. A commit
/// clears the staged paths from the modified list, mimicking how a real
/// commit cleans the status output.
pub(crate) struct FakeVcs {
    root: PathBuf,
    work_tree: bool,
    pub modified: Rc<RefCell<Vec<PathBuf>>>,
    pub untracked: RefCell<Vec<PathBuf>>,
    pub remotes: RefCell<Vec<Remote>>,
    staged: RefCell<Vec<PathBuf>>,
    pub commits: Rc<RefCell<Vec<String>>>,
    pub pushes: Rc<RefCell<Vec<(String, String)>>>,
    pub pulls: Rc<RefCell<Vec<(String, String)>>>,
    pub top_level_calls: Rc<RefCell<u32>>,
}

impl FakeVcs {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            work_tree: true,
            modified: Rc::new(RefCell::new(Vec::new())),
            untracked: RefCell::new(Vec::new()),
            remotes: RefCell::new(Vec::new()),
            staged: RefCell::new(Vec::new()),
            commits: Rc::new(RefCell::new(Vec::new())),
            pushes: Rc::new(RefCell::new(Vec::new())),
            pulls: Rc::new(RefCell::new(Vec::new())),
            top_level_calls: Rc::new(RefCell::new(0)),
        }
    }

    /// A location that is not inside any working tree.
    pub fn detached() -> Self {
        let mut fake = Self::new(Path::new("/nowhere"));
        fake.work_tree = false;
        fake
    }

    pub fn mark_modified(&self, relative: &str) {
        self.modified.borrow_mut().push(PathBuf::from(relative));
    }

    pub fn mark_untracked(&self, relative: &str) {
        self.untracked.borrow_mut().push(PathBuf::from(relative));
    }

    pub fn add_remote(&self, name: &str, url: &str) {
        self.remotes.borrow_mut().push(Remote {
            name: name.to_string(),
            fetch_url: url.to_string(),
        });
    }
}

impl VersionControl for FakeVcs {
    fn workdir(&self) -> &Path {
        &self.root
    }

    fn is_work_tree(&self) -> Result<bool> {
        Ok(self.work_tree)
    }

    fn top_level(&self) -> Result<PathBuf> {
        *self.top_level_calls.borrow_mut() += 1;
        Ok(self.root.clone())
    }

    fn status(&self) -> Result<Vec<StatusEntry>> {
        let mut entries: Vec<StatusEntry> = self
            .modified
            .borrow()
            .iter()
            .map(|path| StatusEntry {
                code: " M".to_string(),
                path: path.clone(),
            })
            .collect();
        entries.extend(self.untracked.borrow().iter().map(|path| StatusEntry {
            code: "??".to_string(),
            path: path.clone(),
        }));
        Ok(entries)
    }

    fn remotes(&self) -> Result<Vec<Remote>> {
        Ok(self.remotes.borrow().clone())
    }

    fn current_branch(&self) -> Result<String> {
        Ok("master".to_string())
    }

    fn add(&self, path: &Path) -> Result<()> {
        self.staged.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.commits.borrow_mut().push(message.to_string());
        let staged: Vec<PathBuf> = self.staged.borrow_mut().drain(..).collect();
        self.modified
            .borrow_mut()
            .retain(|relative| !staged.contains(&self.root.join(relative)));
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.pushes
            .borrow_mut()
            .push((remote.to_string(), branch.to_string()));
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.pulls
            .borrow_mut()
            .push((remote.to_string(), branch.to_string()));
        Ok(())
    }
}

/// [`TestRunner`] returning a canned report and recording requested paths.
pub(crate) struct FakeRunner {
    report: TestReport,
    pub requested: RefCell<Vec<PathBuf>>,
}

impl FakeRunner {
    pub fn scoring(section: &str, grade: u32, maximum: u32) -> Self {
        let mut results = BTreeMap::new();
        results.insert(section.to_string(), SectionScore { grade, maximum });
        Self {
            report: TestReport { results },
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl TestRunner for FakeRunner {
    fn run(&self, tests_html: &Path) -> Result<TestReport> {
        self.requested.borrow_mut().push(tests_html.to_path_buf());
        Ok(self.report.clone())
    }
}
