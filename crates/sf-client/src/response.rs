//! Buffered HTTP responses.
//!
//! The body is read exactly once when the response arrives. Both the error
//! translator and the JSON decoder work from that buffer.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// A fully received response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub(crate) fn new(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for 201 Created and 204 No Content, which carry no body
    /// to decode.
    pub fn is_bodyless_success(&self) -> bool {
        matches!(self.status, 201 | 204)
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The raw buffered body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into the raw body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| {
            Error::with_source(
                ErrorKind::Decode("response body is not valid UTF-8".to_string()),
                e,
            )
        })
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    /// Deserialize the body as JSON unless the status is 201 or 204, in which
    /// case no decoding is attempted and `None` is returned.
    pub fn json_opt<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if self.is_bodyless_success() {
            return Ok(None);
        }
        self.json().map(Some)
    }

    /// Get API usage limits from response headers.
    pub fn api_usage(&self) -> Option<ApiUsage> {
        // Format: "api-usage=25/15000"
        let info = self.header("sforce-limit-info")?;

        info.split(',').find_map(|part| {
            let usage = part.trim().strip_prefix("api-usage=")?;
            let (used, limit) = usage.split_once('/')?;
            Some(ApiUsage {
                used: used.parse().ok()?,
                limit: limit.parse().ok()?,
            })
        })
    }
}

/// API usage information from response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiUsage {
    /// Number of API calls used.
    pub used: u64,
    /// Total API call limit.
    pub limit: u64,
}

impl ApiUsage {
    /// Get the remaining API calls.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Get the usage percentage.
    pub fn percentage(&self) -> f64 {
        if self.limit == 0 {
            100.0
        } else {
            (self.used as f64 / self.limit as f64) * 100.0
        }
    }

    /// Returns true if API usage is above the given percentage threshold.
    pub fn is_above_threshold(&self, threshold_percent: f64) -> bool {
        self.percentage() >= threshold_percent
    }
}
