use mock_server::ServerConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let config = ServerConfig {
        token: std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
        api_prefix: std::env::var("API_PREFIX").is_ok_and(|v| v == "1" || v == "true"),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, auth = config.token.is_some(), api_prefix = config.api_prefix, "listening");
    mock_server::run_with(listener, config).await
}
