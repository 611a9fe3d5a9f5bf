use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::Error;

/// RFC 7807 problem details returned by the API on failure.
///
/// Fields outside the standard set are kept in `extensions`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl ProblemDetails {
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}

/// A fully read HTTP response classified by status code.
///
/// On 2xx `data` holds the decoded body; otherwise `error` holds the problem
/// details when the body could be decoded. The raw body is always kept.
#[derive(Clone, Debug)]
pub struct Response<T> {
    status: StatusCode,
    headers: HeaderMap,
    raw_body: Vec<u8>,
    data: Option<T>,
    error: Option<ProblemDetails>,
}

impl<T: DeserializeOwned> Response<T> {
    /// Reads the whole body of `raw` and classifies it.
    pub async fn parse(raw: reqwest::Response) -> Result<Self, Error> {
        let status = raw.status();
        let headers = raw.headers().clone();
        let body = raw.bytes().await.map_err(Error::Transport)?;
        Self::from_parts(status, headers, body.to_vec())
    }

    /// A success body that does not decode into `T` is an error. An error
    /// body that is not problem details is kept only as raw bytes.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, raw_body: Vec<u8>) -> Result<Self, Error> {
        let mut response = Self {
            status,
            headers,
            raw_body,
            data: None,
            error: None,
        };

        if status.is_success() {
            response.data = response.decode_success()?;
        } else if !response.body_is_blank() {
            match serde_json::from_slice::<ProblemDetails>(&response.raw_body) {
                Ok(problem) => response.error = Some(problem),
                Err(err) => debug!(status = %status, error = %err, "error body is not problem details"),
            }
        }
        Ok(response)
    }

    fn decode_success(&self) -> Result<Option<T>, Error> {
        if self.body_is_blank() {
            // Bodiless success (e.g. 204) decodes as `null` when `T` allows it.
            return Ok(serde_json::from_value(Value::Null).ok());
        }
        serde_json::from_slice(&self.raw_body)
            .map(Some)
            .map_err(|source| Error::Decode {
                status: self.status,
                source,
            })
    }
}

impl<T> Response<T> {
    fn body_is_blank(&self) -> bool {
        self.raw_body.iter().all(u8::is_ascii_whitespace)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_error(&self) -> bool {
        !self.status.is_success()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error(&self) -> Option<&ProblemDetails> {
        self.error.as_ref()
    }

    /// Turns an error response into `Error::Api`, for callers that prefer
    /// `?` over branching on the status.
    pub fn into_result(self) -> Result<Option<T>, Error> {
        if self.is_success() {
            return Ok(self.data);
        }
        Err(Error::Api {
            status: self.status,
            body: String::from_utf8_lossy(&self.raw_body).into_owned(),
            problem: self.error,
        })
    }
}
