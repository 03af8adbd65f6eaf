//! Scripted HTTP server for exercising `restclient` over real sockets.
//!
//! # Design
//! Routes are a table of [`Endpoint`] values keyed by method and path, all
//! served from one fallback handler. Every request that reaches the server is
//! recorded before routing, so tests can assert what the client sent, or
//! that it sent nothing at all.

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

pub use axum::http::{Method, StatusCode, Uri};

/// Canonical response document served by most scripted endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResponse {
    pub response: String,
}

impl TestResponse {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

/// Request document endpoints can insist on receiving.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRequest {
    pub query: String,
}

/// What an endpoint writes back.
#[derive(Clone, Debug)]
pub enum Reply {
    Json(serde_json::Value),
    Text(String),
    /// Sends the request body back unchanged.
    Echo,
}

#[derive(Clone, Debug)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    /// Reject (500) any request whose body is not a `TestRequest`.
    pub expect_request: bool,
    pub reply: Reply,
}

impl Endpoint {
    pub fn json(method: Method, path: &str, status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            method,
            path: path.to_string(),
            status,
            expect_request: false,
            reply: Reply::Json(body),
        }
    }

    pub fn text(method: Method, path: &str, status: StatusCode, body: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            status,
            expect_request: false,
            reply: Reply::Text(body.to_string()),
        }
    }

    pub fn echo(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            status: StatusCode::OK,
            expect_request: false,
            reply: Reply::Echo,
        }
    }

    pub fn expecting_request(mut self) -> Self {
        self.expect_request = true;
        self
    }
}

/// A request as the server saw it.
#[derive(Clone, Debug)]
pub struct Received {
    pub method: Method,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug)]
struct Inner {
    routes: HashMap<(Method, String), Endpoint>,
    received: RwLock<Vec<Received>>,
}

#[derive(Clone, Debug)]
pub struct ServerState(Arc<Inner>);

impl ServerState {
    pub fn new(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        let routes = endpoints
            .into_iter()
            .map(|e| ((e.method.clone(), e.path.clone()), e))
            .collect();
        Self(Arc::new(Inner {
            routes,
            received: RwLock::new(Vec::new()),
        }))
    }

    pub async fn received(&self) -> Vec<Received> {
        self.0.received.read().await.clone()
    }

    /// Same as [`ServerState::received`] for callers outside the runtime.
    /// Panics when called from async context.
    pub fn received_blocking(&self) -> Vec<Received> {
        self.0.received.blocking_read().clone()
    }
}

pub fn app(state: ServerState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

pub async fn run(listener: TcpListener, state: ServerState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn dispatch(State(state): State<ServerState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    tracing::debug!(%method, %path, bytes = body.len(), "request received");

    state.0.received.write().await.push(Received {
        method: method.clone(),
        path: path.clone(),
        body: body.to_vec(),
    });

    let Some(endpoint) = state.0.routes.get(&(method.clone(), path.clone())) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no route for {method} {path}") })),
        )
            .into_response();
    };

    if endpoint.expect_request {
        if let Err(err) = serde_json::from_slice::<TestRequest>(&body) {
            tracing::warn!(%path, error = %err, "rejecting malformed request body");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Error decoding http request: {err}") })),
            )
                .into_response();
        }
    }

    match &endpoint.reply {
        Reply::Json(value) => (endpoint.status, Json(value.clone())).into_response(),
        Reply::Text(text) => (endpoint.status, text.clone()).into_response(),
        Reply::Echo => (endpoint.status, body).into_response(),
    }
}

/// A server running on its own thread, bound to a random local port.
#[derive(Clone, Debug)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub state: ServerState,
}

impl RunningServer {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.received_blocking()
    }
}

/// Bind `127.0.0.1:0` and serve `endpoints` from a background thread.
///
/// The listener is bound before this returns, so clients may connect
/// immediately. The server lives until the process exits.
pub fn spawn(endpoints: impl IntoIterator<Item = Endpoint>) -> std::io::Result<RunningServer> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    let state = ServerState::new(endpoints);
    let served = state.clone();
    std::thread::spawn(move || -> std::io::Result<()> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(async move {
            let listener = TcpListener::from_std(std_listener)?;
            run(listener, served).await
        })
    });

    Ok(RunningServer { addr, state })
}
