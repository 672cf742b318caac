//! HTTP sink for harvested assets.
//!
//! Each record is sent to a URL rendered from the asset. By default the
//! body is the asset as JSON. With a script configured, the script sees the
//! asset as `asset` and decides what to send by calling `sink(map)` zero or
//! more times:
//!
//! ```lua
//! sink({ details = { some_key = asset.urn, another_key = asset.name } })
//! ```
//!
//! Any status other than the configured success code is an error; 5xx
//! responses are retryable.

pub mod config;
pub mod error;
pub mod sink;
pub mod template;
pub mod transport;

pub use config::HttpSinkConfig;
pub use error::{Error, Result};
pub use sink::HttpSink;
pub use template::UrlTemplate;
pub use transport::{BlockingTransport, Request, Response, Transport};
