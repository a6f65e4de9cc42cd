use std::borrow::Cow;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::escape::DecodeError;

#[derive(Debug)]
pub enum RuntimeErrorKind {
    FloatingPointError,
    SegmentationFault
}

impl RuntimeErrorKind {
    pub fn from_signal(signal: i32) -> Option<Self> {
        match signal {
            libc::SIGFPE => Some(Self::FloatingPointError),
            libc::SIGSEGV => Some(Self::SegmentationFault),
            _ => None
        }
    }
}

impl Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match &self {
            Self::FloatingPointError    => "FloatingPointError",
            Self::SegmentationFault     => "SegmentationFault"
        };
        f.write_str(str)?;
        Ok(())
    }
}

/// Every way a judge run can end without a pass/fail comparison.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),

    #[error("argument <{0}> is not valid UTF-8")]
    InvalidArgument(&'static str),

    #[error("cannot read source {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode literal: {0}")]
    Decode(#[from] DecodeError),

    #[error("interpreter `{0}` not found in PATH")]
    InterpreterNotFound(String),

    #[error("failed to launch program: {0}")]
    Launch(#[source] io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("program raised {0}")]
    Raised(String),

    #[error("program terminated by signal ({0})")]
    RuntimeError(RuntimeErrorKind),

    #[error("program exited with status {0}")]
    ReturnNonZero(i32),
}

impl JudgeError {
    /// Short tag printed after `e` in the verdict line.
    pub fn kind(&self) -> Cow<'_, str> {
        let label = match self {
            Self::MissingArgument(_) => "UsageError",
            Self::InvalidArgument(_) => "UnicodeEncodeError",
            Self::Source { source, .. } => io_kind(source),
            Self::Decode(_) => "UnicodeDecodeError",
            Self::InterpreterNotFound(_) => "InterpreterNotFound",
            Self::Launch(_) | Self::Io(_) => "OSError",
            Self::Raised(name) => return Cow::Borrowed(name.as_str()),
            Self::RuntimeError(kind) => return Cow::Owned(kind.to_string()),
            Self::ReturnNonZero(_) => "ReturnNonZero",
        };
        Cow::Borrowed(label)
    }
}

fn io_kind(err: &io::Error) -> &'static str {
    if err.raw_os_error() == Some(libc::EISDIR) {
        return "IsADirectoryError";
    }
    match err.kind() {
        io::ErrorKind::NotFound => "FileNotFoundError",
        io::ErrorKind::PermissionDenied => "PermissionError",
        _ => "OSError",
    }
}
