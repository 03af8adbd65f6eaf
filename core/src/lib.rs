//! Blocking JSON-over-HTTP client scoped to a single host.
//!
//! # Overview
//! [`HttpClient`] sends requests to one `scheme://host[:port]` target. Bodies
//! are JSON by default; [`Payload::Raw`] streams bytes verbatim instead.
//! Responses are either decoded into a caller-supplied value
//! ([`RestClient::send`]) or returned as a live [`ResponseStream`]
//! ([`RestClient::send_stream`]).
//!
//! # Design
//! - A 4xx/5xx status is an ordinary result. Only statuses registered with
//!   [`RestClient::set_error_constructor`] become errors, built by the
//!   caller's constructor from the request and response.
//! - Errors that occur before a response exists carry no status
//!   ([`ClientError::status`] returns `None`).
//! - No retries, timeouts, or authentication; each call is one round-trip.

pub mod client;
pub mod config;
pub mod error;
pub mod http;

pub use client::{HttpClient, RestClient};
pub use config::ClientConfig;
pub use error::{BoxError, ClientError};
pub use http::{ErrorResponse, HttpMethod, JsonBody, ParseMethodError, Payload, ResponseStream, SentRequest};
