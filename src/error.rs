use std::{io, path::PathBuf};

use thiserror::Error;

/// What exceeded its configured maximum length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Key,
    Value,
    Row,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Token::Key => "key",
            Token::Value => "value",
            Token::Row => "row",
        })
    }
}

/// Every failure is fatal for the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed row at byte {offset}: {reason}")]
    MalformedRow { offset: u64, reason: String },

    #[error("{token} at byte {offset} exceeds the {limit}-byte limit")]
    ParseOverflow {
        offset: u64,
        token: Token,
        limit: usize,
    },

    #[error("worker for bytes {start}..{end} panicked")]
    WorkerPanicked { start: u64, end: u64 },

    #[error("aborted after another worker failed")]
    Aborted,
}

impl Error {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Error::MalformedRow {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
