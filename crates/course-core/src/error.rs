use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("Not inside a git repository: {path}")]
    NotARepository { path: PathBuf },

    #[error("Not a chapter directory: {path}")]
    NotAChapterDirectory { path: PathBuf },

    #[error("Path inside chapters/ does not form a valid chapter id: {path}")]
    InvalidChapterPath { path: PathBuf },

    #[error("No 'upstream' remote configured for this repository")]
    MissingUpstreamRemote,

    #[error("Remote 'upstream' points to {found}, expected {expected}")]
    WrongUpstreamUrl { found: String, expected: String },

    #[error("Git error: {message}")]
    Git { message: String },

    #[error("Test harness not found: {command} (is it installed and on PATH?)")]
    RunnerNotFound { command: String },

    #[error("Test harness failed: {message}")]
    RunnerFailed { message: String },

    #[error("Could not parse test report: {message}")]
    ReportParse { message: String },

    #[error("Could not parse {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CourseError>;

impl CourseError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotARepository { .. } => 2,
            Self::NotAChapterDirectory { .. } => 3,
            Self::MissingUpstreamRemote | Self::WrongUpstreamUrl { .. } => 4,
            Self::InvalidChapterPath { .. } => 5,
            Self::Git { .. } => 6,
            Self::RunnerNotFound { .. } | Self::RunnerFailed { .. } | Self::ReportParse { .. } => 7,
            _ => 1,
        }
    }
}
