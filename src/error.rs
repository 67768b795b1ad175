//! Error enum
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// Out-of-range ratio, unknown split method, malformed option.
    InvalidArgument(String),
    /// No `alignments/**/segments.csv` under the dataset.
    NoDataFound(PathBuf),
    /// A column required by the requested operation is missing.
    Schema(String),
    /// Merge source does not exist.
    SourceNotFound(PathBuf),
    Io(std::io::Error),
    Csv(csv::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    WalkDir(walkdir::Error),
    Persist(tempfile::PersistError),
    Serde(serde_json::Error),
    Fetch(String),
    Transcode(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::NoDataFound(path) => write!(f, "no segment tables found under {:?}", path),
            Error::Schema(msg) => write!(f, "schema error: {msg}"),
            Error::SourceNotFound(path) => write!(f, "source dataset not found: {:?}", path),
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Csv(e) => write!(f, "csv error: {e}"),
            Error::Glob(e) => write!(f, "glob error: {e}"),
            Error::GlobPattern(e) => write!(f, "glob pattern error: {e}"),
            Error::WalkDir(e) => write!(f, "directory walk error: {e}"),
            Error::Persist(e) => write!(f, "could not persist file: {e}"),
            Error::Serde(e) => write!(f, "catalog error: {e}"),
            Error::Fetch(msg) => write!(f, "fetch failed: {msg}"),
            Error::Transcode(msg) => write!(f, "transcoding failed: {msg}"),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Error {
        Error::Csv(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Error {
        Error::WalkDir(e)
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(e: tempfile::PersistError) -> Error {
        Error::Persist(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
