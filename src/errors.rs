use reqwest::StatusCode;

use crate::response::ProblemDetails;

/// Error type returned by interceptors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to obtain access token: {0}")]
    Credential(#[from] CredentialError),
    #[error("invalid interceptor: {0}")]
    InvalidInterceptor(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("interceptor #{step} ({name}) failed: {source}")]
    Interceptor {
        step: usize,
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to decode {status} response body: {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("api returned {status}")]
    Api {
        status: StatusCode,
        problem: Option<ProblemDetails>,
        body: String,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures while exchanging client credentials for a bearer token.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("token endpoint unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("failed to parse token response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("token endpoint returned an empty access token")]
    EmptyAccessToken,
    #[error("token endpoint returned an unusable expires_in of {0}s")]
    InvalidExpiresIn(u64),
}

impl CredentialError {
    /// The issuer refused the client credentials.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, CredentialError::Rejected { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    /// The credentials are valid but lack the privileges for a token.
    pub fn is_insufficient_privileges(&self) -> bool {
        matches!(self, CredentialError::Rejected { status, .. } if *status == StatusCode::FORBIDDEN)
    }
}

impl Error {
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Error::Credential(_))
    }

    /// Status code of the HTTP response that produced this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Credential(CredentialError::Rejected { status, .. }) => Some(*status),
            Error::Decode { status, .. } | Error::Api { status, .. } => Some(*status),
            Error::Transport(err) => err.status(),
            _ => None,
        }
    }
}
