//! Sending requests. [`Transport`] is the seam tests and alternative
//! clients plug into; [`BlockingTransport`] is the default.

use std::time::Duration;

use http::HeaderMap;
use reqwest::blocking::Client;
use url::Url;

use crate::error::Result;

/// An outgoing request with a JSON body.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: http::Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> Result<Response>;
}

/// A `reqwest` blocking client.
///
/// Must not be created or used from inside an async runtime; call it from
/// a plain thread or `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct BlockingTransport {
    client: Client,
}

impl BlockingTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for BlockingTransport {
    fn send(&self, request: Request) -> Result<Response> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(Response { status, body })
    }
}
