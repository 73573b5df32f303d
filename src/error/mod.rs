mod from;

use std::{fmt::Display, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage URL `{0}` is invalid")]
    InvalidStorageUrl(String),

    #[error("`{0}` is not a directory")]
    FileIsNotDirectory(PathBuf),

    #[error("`{0}` does not exist")]
    FileDoesNotExist(PathBuf),

    #[error("failed to compress `{path}`: {message}")]
    Compression { path: PathBuf, message: String },

    #[error("upload of `{path}` was rejected with status {status}")]
    UploadRejected { path: String, status: u16 },

    #[error("failed to create remote directory `{path}` (status {status})")]
    RemoteDirectory { path: String, status: u16 },

    #[error("failed to send notification: {0}")]
    Notification(String),

    #[error("a backup run is already in progress")]
    RunInProgress,

    #[error("{failed} of {total} directories were not backed up completely")]
    IncompleteBackup { failed: usize, total: usize },

    #[error("{source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(AnyError),
}

#[derive(Error, Debug)]
pub struct AnyError(anyhow::Error);

impl Display for AnyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error {
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(AnyError(error.into()))
    }

    /// Marks an error raised while producing volumes as fatal for one
    /// directory only.
    pub fn compression<P: Into<PathBuf>>(path: P, error: Error) -> Self {
        match error {
            err @ Error::Compression { .. } => err,
            err => Error::Compression {
                path: path.into(),
                message: err.to_string(),
            },
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Other(AnyError(error))
    }
}
