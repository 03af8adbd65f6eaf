//! Blocking HTTP client scoped to a single host.
//!
//! # Design
//! `HttpClient` holds an immutable [`ClientConfig`], a reusable `ureq::Agent`,
//! and one optional custom-error hook. Each call is one synchronous
//! round-trip, split into three steps:
//! - `request` turns the [`Payload`] into a body (serializing JSON before any I/O),
//! - `request_raw` sends it and applies the custom-error hook,
//! - `send` / `send_stream` either decode the body or hand it to the caller.
//!
//! The hook is replaced wholesale behind an `RwLock` and read by cloning its
//! `Arc`, so a client can be shared across threads while the hook changes.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use ureq::http::{self, HeaderMap};
use ureq::{Agent, AsSendBody, SendBody};

use crate::config::ClientConfig;
use crate::error::{BoxError, ClientError};
use crate::http::{ErrorResponse, HttpMethod, Payload, ResponseStream, SentRequest};

/// The operations every REST client transport provides.
pub trait RestClient {
    /// Send `payload` to `path` and decode the JSON response into `into`.
    ///
    /// With `into` set to `None` the body is drained without decoding, so a
    /// malformed body is never an error. The body is closed before returning.
    fn send<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Payload<'_>,
        into: Option<&mut R>,
    ) -> Result<u16, ClientError>;

    /// Send `payload` to `path` and return the response body unread.
    ///
    /// The caller owns the stream; dropping it releases the connection.
    fn send_stream(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Payload<'_>,
    ) -> Result<(u16, ResponseStream), ClientError>;

    /// Route responses whose status is in `status_codes` through `constructor`.
    ///
    /// Replaces any previous set and constructor. An empty set disables
    /// custom errors, so every status is returned as an ordinary response.
    fn set_error_constructor<F>(&self, status_codes: impl IntoIterator<Item = u16>, constructor: F)
    where
        F: Fn(&SentRequest, &mut ErrorResponse) -> BoxError + Send + Sync + 'static;

    /// [`RestClient::send`] without a decode target.
    fn send_discarding(&self, method: HttpMethod, path: &str, payload: Payload<'_>) -> Result<u16, ClientError> {
        self.send(method, path, payload, None::<&mut IgnoredAny>)
    }
}

type Constructor = dyn Fn(&SentRequest, &mut ErrorResponse) -> BoxError + Send + Sync;

struct CustomErrors {
    status_codes: HashSet<u16>,
    construct: Box<Constructor>,
}

/// `RestClient` over blocking HTTP/1.1.
pub struct HttpClient {
    config: ClientConfig,
    agent: Agent,
    custom_errors: RwLock<Option<Arc<CustomErrors>>>,
}

impl HttpClient {
    pub fn new(host: &str, port: u16, use_tls: bool) -> Self {
        Self::from_config(ClientConfig::new(host, port, use_tls))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(config, agent)
    }

    /// Use a caller-built agent. It must be configured with
    /// `http_status_as_error(false)`, otherwise 4xx/5xx responses surface as
    /// transport errors instead of statuses.
    pub fn with_agent(config: ClientConfig, agent: Agent) -> Self {
        Self {
            config,
            agent,
            custom_errors: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn full_path(&self, path: &str) -> String {
        self.config.full_path(path)
    }

    /// Equivalent to setting an empty status set.
    pub fn clear_error_constructor(&self) {
        *self.custom_errors.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn custom_errors(&self) -> Option<Arc<CustomErrors>> {
        self.custom_errors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Payload<'_>,
    ) -> Result<(u16, ResponseStream), ClientError> {
        tracing::trace!(%method, path, mode = payload.mode(), "encoding payload");
        match payload {
            Payload::Empty => self.request_raw(method, path, ()),
            Payload::Raw(mut reader) => self.request_raw(method, path, SendBody::from_reader(&mut reader)),
            Payload::Json(value) => {
                let body = value.to_json_vec().map_err(ClientError::Serialization)?;
                self.request_raw(method, path, body)
            }
        }
    }

    fn request_raw(
        &self,
        method: HttpMethod,
        path: &str,
        body: impl AsSendBody,
    ) -> Result<(u16, ResponseStream), ClientError> {
        let url = self.full_path(path);
        let request = http::Request::builder()
            .method(method.to_http())
            .uri(url.as_str())
            .body(body)
            .map_err(|source| ClientError::InvalidRequest {
                method,
                url: url.clone(),
                source,
            })?;

        tracing::debug!(%method, %url, "sending request");
        let response = self.agent.run(request).map_err(|source| ClientError::Transport {
            method,
            url: url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let body = response.into_body().into_reader();
        tracing::debug!(%method, %url, status, "response received");

        if let Some(custom) = self.custom_errors().filter(|c| c.status_codes.contains(&status)) {
            let sent = SentRequest { method, url };
            let mut response = ErrorResponse::new(status, headers, body);
            let source = (custom.construct)(&sent, &mut response);
            drop(response);
            tracing::debug!(%method, url = %sent.url, status, "custom error constructed");
            return Err(ClientError::Custom { status, source });
        }

        Ok((status, ResponseStream::new(status, headers, body)))
    }
}

impl RestClient for HttpClient {
    fn send<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Payload<'_>,
        into: Option<&mut R>,
    ) -> Result<u16, ClientError> {
        let (status, mut stream) = self.request(method, path, payload)?;
        if let Some(target) = into {
            // Only the first JSON value is decoded; anything after it is drained.
            let mut de = serde_json::Deserializer::from_reader(&mut stream);
            *target = R::deserialize(&mut de).map_err(|source| ClientError::Decode { status, source })?;
        }
        if let Err(err) = io::copy(&mut stream, &mut io::sink()) {
            tracing::debug!(status, error = %err, "response body not fully drained");
        }
        Ok(status)
    }

    fn send_stream(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Payload<'_>,
    ) -> Result<(u16, ResponseStream), ClientError> {
        self.request(method, path, payload)
    }

    fn set_error_constructor<F>(&self, status_codes: impl IntoIterator<Item = u16>, constructor: F)
    where
        F: Fn(&SentRequest, &mut ErrorResponse) -> BoxError + Send + Sync + 'static,
    {
        let status_codes: HashSet<u16> = status_codes.into_iter().collect();
        let custom = if status_codes.is_empty() {
            None
        } else {
            Some(Arc::new(CustomErrors {
                status_codes,
                construct: Box::new(constructor),
            }))
        };
        *self.custom_errors.write().unwrap_or_else(PoisonError::into_inner) = custom;
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<u16> = self
            .custom_errors()
            .map(|c| c.status_codes.iter().copied().collect())
            .unwrap_or_default();
        codes.sort_unstable();
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("custom_error_status_codes", &codes)
            .finish_non_exhaustive()
    }
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
