use mock_server::{Endpoint, Method, ServerState, StatusCode, TestResponse};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");

    let hello = serde_json::to_value(TestResponse::new("something")).map_err(std::io::Error::other)?;
    let state = ServerState::new([
        Endpoint::json(Method::GET, "/hello", StatusCode::OK, hello),
        Endpoint::echo(Method::POST, "/echo"),
        Endpoint::text(Method::GET, "/bad", StatusCode::BAD_REQUEST, "bad request"),
    ]);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_server::run(listener, state).await
}
