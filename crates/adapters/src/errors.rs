// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the conagg authors

use thiserror::Error;

/// Errors from any of the external service adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned unexpected status {status} for {url}")]
    UnexpectedStatus { service: &'static str, url: String, status: u16 },

    #[error("failed to decode {service} response body: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("credential file error: {0}")]
    Io(#[from] std::io::Error),
}
