use crate::error::ServerResult;
use crate::routes::ok;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use std::sync::Arc;

/// Returns a random Chuck Norris joke
pub async fn random_chucknorris(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let joke = state.datasets.chucknorris.random_item()?;
    Ok(ok(joke))
}

/// Returns all Chuck Norris jokes
pub async fn all_chucknorris(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    Ok(ok(state.datasets.chucknorris.items().to_vec()))
}

/// Returns a random dad joke
pub async fn random_dadjoke(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let joke = state.datasets.dadjokes.random_item()?;
    Ok(ok(joke))
}

/// Returns all dad jokes
pub async fn all_dadjokes(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    Ok(ok(state.datasets.dadjokes.items().to_vec()))
}

/// Returns a random programming joke
pub async fn random_programming(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let joke = state.datasets.programming.random_item()?;
    Ok(ok(joke))
}

/// Returns all programming jokes
pub async fn all_programming(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    Ok(ok(state.datasets.programming.items().to_vec()))
}
