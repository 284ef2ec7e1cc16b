use crate::state::AppState;
use axum::Router;
use axum::routing::post;

pub mod correlator;
pub mod dispatcher;
pub mod dto;
pub mod events;
pub mod handler;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(handler::upload))
}
