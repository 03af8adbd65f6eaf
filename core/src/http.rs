//! Request and response descriptors shared by the client and its hooks.
//!
//! # Design
//! `Payload` is a closed set of send modes, so the client matches on it
//! exhaustively instead of inspecting values at runtime. The response-side
//! types wrap `ureq` body readers; dropping one releases its connection.

use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use ureq::BodyReader;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }

    pub(crate) fn to_http(self) -> ureq::http::Method {
        match self {
            HttpMethod::Get => ureq::http::Method::GET,
            HttpMethod::Head => ureq::http::Method::HEAD,
            HttpMethod::Post => ureq::http::Method::POST,
            HttpMethod::Put => ureq::http::Method::PUT,
            HttpMethod::Patch => ureq::http::Method::PATCH,
            HttpMethod::Delete => ureq::http::Method::DELETE,
            HttpMethod::Options => ureq::http::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported HTTP method: {0}")]
pub struct ParseMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

/// A value that can be encoded as a JSON request body.
///
/// Implemented for every `Serialize` type; exists so `Payload` can hold a
/// borrowed value without a type parameter.
pub trait JsonBody {
    fn to_json_vec(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + ?Sized> JsonBody for T {
    fn to_json_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Request body for a single call.
pub enum Payload<'a> {
    /// No body.
    Empty,
    /// Bytes streamed verbatim, with no content-type assumption.
    Raw(Box<dyn Read + Send + 'a>),
    /// A value serialized to JSON before anything is sent.
    Json(&'a dyn JsonBody),
}

impl<'a> Payload<'a> {
    pub fn raw(reader: impl Read + Send + 'a) -> Self {
        Payload::Raw(Box::new(reader))
    }

    pub fn json<T: Serialize>(value: &'a T) -> Self {
        Payload::Json(value)
    }

    pub(crate) fn mode(&self) -> &'static str {
        match self {
            Payload::Empty => "empty",
            Payload::Raw(_) => "raw",
            Payload::Json(_) => "json",
        }
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload::{}", self.mode())
    }
}

/// The request that produced a response, as seen by an error constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub method: HttpMethod,
    pub url: String,
}

/// A response whose status matched the custom-error set.
///
/// Handed to the error constructor by mutable reference; the client drops it,
/// closing the body, as soon as the constructor returns.
pub struct ErrorResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    body: BodyReader<'static>,
}

impl ErrorResponse {
    pub(crate) fn new(status: u16, headers: Vec<(String, String)>, body: BodyReader<'static>) -> Self {
        Self { status, headers, body }
    }

    pub fn body(&mut self) -> &mut dyn Read {
        &mut self.body
    }

    pub fn read_to_string(&mut self) -> io::Result<String> {
        let mut out = String::new();
        self.body.read_to_string(&mut out)?;
        Ok(out)
    }

    pub fn read_json<T: DeserializeOwned>(&mut self) -> serde_json::Result<T> {
        serde_json::from_reader(&mut self.body)
    }
}

impl fmt::Debug for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A live response body owned by the caller.
///
/// The underlying connection is released on drop or [`ResponseStream::close`].
pub struct ResponseStream {
    status: u16,
    headers: Vec<(String, String)>,
    body: BodyReader<'static>,
}

impl ResponseStream {
    pub(crate) fn new(status: u16, headers: Vec<(String, String)>, body: BodyReader<'static>) -> Self {
        Self { status, headers, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn close(self) {}
}

impl Read for ResponseStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

impl fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
