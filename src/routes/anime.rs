use crate::error::{ServerError, ServerResult};
use crate::routes::ok;
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use std::sync::Arc;

/// Returns a random anime quote
pub async fn random_quote(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let quote = state.datasets.anime.random_item()?;
    Ok(ok(quote))
}

/// Returns all anime quotes
pub async fn all_quotes(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    Ok(ok(state.datasets.anime.items().to_vec()))
}

/// Returns an anime quote by ID
pub async fn quote_by_id(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let id: u32 = id
        .parse()
        .map_err(|_| ServerError::BadRequest("Invalid quote ID".to_string()))?;
    let quote = state.datasets.anime.item_by_id(id)?;
    Ok(ok(quote))
}

/// Returns anime quotes by category
pub async fn quotes_by_category(
    State(state): State<Arc<ServerState>>,
    Path(category): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let quotes = state.datasets.anime.items_by_field("category", &category);
    if quotes.is_empty() {
        return Err(ServerError::NoMatches(
            "No anime quotes found for this category".to_string(),
        ));
    }
    Ok(ok(quotes))
}

/// Returns quotes from a specific anime
pub async fn quotes_by_show(
    State(state): State<Arc<ServerState>>,
    Path(show): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let quotes = state.datasets.anime.items_by_field("anime", &show);
    if quotes.is_empty() {
        return Err(ServerError::NoMatches(
            "No quotes found for this anime".to_string(),
        ));
    }
    Ok(ok(quotes))
}

/// Returns quotes by a specific character
pub async fn quotes_by_character(
    State(state): State<Arc<ServerState>>,
    Path(character): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let quotes = state.datasets.anime.items_by_field("character", &character);
    if quotes.is_empty() {
        return Err(ServerError::NoMatches(
            "No quotes found for this character".to_string(),
        ));
    }
    Ok(ok(quotes))
}
