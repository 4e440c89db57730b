use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The homeserver answered with a Matrix error body.
    #[error("homeserver returned {status} {errcode}: {message}")]
    Matrix {
        status: u16,
        errcode: String,
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("invalid homeserver url: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// The access token was revoked or never valid; retrying is pointless.
    #[must_use]
    pub fn is_unknown_token(&self) -> bool {
        matches!(self, Self::Matrix { errcode, .. } if errcode == "M_UNKNOWN_TOKEN")
            || matches!(self, Self::Matrix { status: 401, .. })
    }

    /// Server-requested wait before the next request, if rate limited.
    #[must_use]
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::Matrix { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }
}

impl From<Error> for yuta_channels::Error {
    fn from(err: Error) -> Self {
        yuta_channels::Error::external("matrix", err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
