//! Page endpoint

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use mw_core::state::{SOCKET_URL_VAR, script_assign};
use mw_core::{RenderState, template::render_view};
use serde::Serialize;

use crate::server::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(page))
}

/// GET / - The current view with its initial state and push channel address
async fn page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let source = state.load()?;
    let view = state.representation(&source.document)?;

    let render_state = RenderState::build(&source.document, &source.raw_text);
    let socket_script = script_assign(SOCKET_URL_VAR, &serde_json::to_string(state.socket_url())?);
    let html = render_view(state.templates(), view, &render_state, &socket_script)?;

    Ok(Html(html))
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {:#}", self.0);
        let body = Json(ErrorResponse {
            error: format!("{:#}", self.0),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
