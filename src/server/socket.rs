//! Push channel for live preview
//!
//! Every connection gets its own watch on the source file. After each
//! settled change the file is re-read and the full state is sent; nothing is
//! sent on connect, since the page already carries the initial state.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::any,
};

use crate::server::state::{AppState, Subscription};
use crate::server::watch::SourceWatch;

pub fn router() -> Router<AppState> {
    Router::new().route("/", any(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let watch = SourceWatch::new(state.source(), state.watch_debounce());
        match watch {
            Ok(watch) => {
                let subscription = state.subscribe();
                Subscriber {
                    socket,
                    watch,
                    state,
                    _subscription: subscription,
                }
                .run()
                .await
            }
            Err(e) => tracing::warn!("could not watch {}: {:#}", state.source().display(), e),
        }
    })
}

struct Subscriber {
    socket: WebSocket,
    watch: SourceWatch,
    state: AppState,
    _subscription: Subscription,
}

impl Subscriber {
    async fn run(mut self) {
        tracing::debug!(active = self.state.subscribers(), "subscriber connected");

        loop {
            tokio::select! {
                changed = self.watch.recv() => {
                    if changed.is_none() {
                        break;
                    }
                    self.watch.settle().await;
                    if !self.push().await {
                        break;
                    }
                }
                incoming = self.socket.recv() => match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("socket error: {}", e);
                        break;
                    }
                },
            }
        }

        tracing::debug!("subscriber disconnected; watch released");
    }

    /// Send the current state. Returns false once the client is gone.
    async fn push(&mut self) -> bool {
        let message = match self.state.state_update() {
            Ok(message) => message,
            Err(e) => {
                // Mid-save reads can fail; the next change retries
                tracing::warn!("skipping update: {}", e);
                return true;
            }
        };

        self.socket.send(Message::Text(message.into())).await.is_ok()
    }
}
