use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions that stop a run before a meaningful report can be written.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("unreadable archive {}: {reason}", .path.display())]
    Archive { path: PathBuf, reason: String },
    #[error("no CSV file found in archive {}", .0.display())]
    NoCsvInArchive(PathBuf),
    #[error("input {name} is not valid UTF-8 text")]
    Encoding { name: String },
    #[error("no cadastral numbers found in {0}")]
    NoIdentifiers(String),
    #[error("failed to set up registry client: {0}")]
    LookupSetup(String),
    #[error("failed to write report {}: {reason}", .path.display())]
    Report { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}
