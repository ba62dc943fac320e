//! Shared fixtures for the integration tests

#![allow(dead_code)]

use conference_gateway::{GatewayConfig, RequestGateway};
use std::time::Duration;
use tokio::net::TcpListener;

/// Gateway with its own cache pointed at `base_url`.
pub fn gateway(base_url: &str) -> RequestGateway {
    gateway_with(GatewayConfig::for_environment(conference_gateway::Environment::Test).with_base_url(base_url))
}

pub fn gateway_with(config: GatewayConfig) -> RequestGateway {
    RequestGateway::isolated(&config).expect("Failed to build gateway")
}

/// Starts a server that accepts connections and never answers.
pub async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind silent server");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

/// Returns a base URL on which nothing is listening.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{}", addr)
}

pub fn short_ttl(base_url: &str, ttl: Duration) -> RequestGateway {
    gateway_with(
        GatewayConfig::for_environment(conference_gateway::Environment::Test)
            .with_base_url(base_url)
            .with_cache_ttl(ttl),
    )
}
