use std::sync::Arc;

use mock_server::Stub;
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    let stubs = vec![
        Stub::get("/user-one").reply_json(200, &json!({ "name": "fred" })),
        Stub::post("/user-two")
            .with_form(&[("token", "foo")])
            .reply_json(200, &json!({ "name": "sarah" })),
        Stub::get("/user-three").reply_json(200, &json!({ "name": "sam" })),
        Stub::get("/user-four").reply(200, "jill"),
        Stub::get("/user-five").reply(500, "BANG"),
    ];

    tracing::info!(%addr, stubs = stubs.len(), "listening");
    mock_server::run(listener, Arc::new(RwLock::new(stubs))).await
}
