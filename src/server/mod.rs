//! Live preview: the page on one port, the push channel on another.

mod routes;
mod socket;
mod state;
mod watch;

pub use state::AppState;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tower_http::trace::TraceLayer;

use crate::config::Ports;

pub async fn serve(state: AppState, ports: Ports) -> Result<()> {
    let page = routes::router()
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());
    let push = socket::router().with_state(state);

    let page_addr = SocketAddr::from(([127, 0, 0, 1], ports.http));
    let push_addr = SocketAddr::from(([127, 0, 0, 1], ports.socket));

    let page_listener = tokio::net::TcpListener::bind(page_addr)
        .await
        .with_context(|| format!("Failed to listen on {}", page_addr))?;
    let push_listener = tokio::net::TcpListener::bind(push_addr)
        .await
        .with_context(|| format!("Failed to listen on {}", push_addr))?;

    println!("{} http://localhost:{}", "Serving".green(), ports.http);
    tracing::info!(%page_addr, %push_addr, "listening");

    tokio::try_join!(
        async { axum::serve(page_listener, page).await.context("page server failed") },
        async { axum::serve(push_listener, push).await.context("push server failed") },
    )?;

    Ok(())
}
