pub mod chapter;
pub mod config;
pub mod error;
pub mod git;
pub mod paths;
pub mod repository;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use chapter::{Chapter, Committed};
pub use config::Config;
pub use error::{CourseError, Result};
pub use git::{GitClient, Remote, StatusEntry, VersionControl};
pub use repository::Repository;
pub use runner::{ProcessRunner, SectionScore, TestReport, TestRunner};
