use std::path::PathBuf;

/// Configuration errors. Every variant is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no config file found (searched: {searched})")]
    NotFound { searched: String },

    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error(r#"must supply a "username", a "homeserverurl", and an "accesstoken" or "password""#)]
    MissingCredentials,

    #[error("invalid homeserverurl {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("homeserverurl {url:?} must use http or https, not {scheme:?}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("client #{index} ({account}): {source}")]
    InvalidClient {
        index: usize,
        account: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Message(String),
}

impl yuta_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

yuta_common::impl_context!();
