use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("received empty project ({project_id}) or session ({session_id})")]
    EmptySession {
        project_id: String,
        session_id: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The NLU service answered with a non-success status.
    #[error("nlu service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("nlu query timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Short label for metrics and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptySession { .. } => "empty_session",
            Self::Http(_) => "http",
            Self::Service { .. } => "service",
            Self::Timeout(_) => "timeout",
        }
    }
}
