use std::path::PathBuf;

/// Errors raised while compiling or loading log files.
///
/// None of these are retried; each needs the operator to fix the input
/// (decompress, strip control characters) before a rerun can succeed.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{count} compressed log file(s) found, first is {}", .first.display())]
    CompressedInput { first: PathBuf, count: usize },

    #[error("malformed log data in {}{}: {source}", .path.display(), line_suffix(.line))]
    MalformedLog {
        path: PathBuf,
        /// 1-based line number; `None` for whole-file documents
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to emit record: {0}")]
    Sink(#[source] std::io::Error),
}

impl CompileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// File the error refers to, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::CompressedInput { first, .. } => Some(first),
            Self::MalformedLog { path, .. } | Self::Io { path, .. } => Some(path),
            Self::NotADirectory(path) => Some(path),
            Self::Sink(_) => None,
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(" line {n}")).unwrap_or_default()
}

/// Argument errors from the record filter, detected before any scan
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("there is no log data to filter")]
    MissingInput,

    #[error("no field name was provided")]
    MissingField,

    #[error("no value was provided")]
    MissingValue,
}
