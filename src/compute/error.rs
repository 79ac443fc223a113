use std::io;
use std::path::PathBuf;

/// Errors raised while producing, scoring or persisting candidates.
///
/// Generator exhaustion and cancellation are not errors; they surface as
/// `Ok(None)` from the generator and as worker exit reasons.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Candidate has no player records")]
    EmptyCandidate,
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Draft generator failed: {0}")]
    Generator(String),
    #[error("Stat extraction failed: {0}")]
    Extractor(String),
}

impl SearchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
