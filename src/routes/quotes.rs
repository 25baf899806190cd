use crate::error::{ServerError, ServerResult};
use crate::routes::ok;
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use std::sync::Arc;

/// Returns a random quote
pub async fn random_quote(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let quote = state.datasets.quotes.random_item()?;
    Ok(ok(quote))
}

/// Returns all quotes
pub async fn all_quotes(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    Ok(ok(state.datasets.quotes.items().to_vec()))
}

/// Returns a quote by ID
pub async fn quote_by_id(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let id: u32 = id
        .parse()
        .map_err(|_| ServerError::BadRequest("Invalid quote ID".to_string()))?;
    let quote = state.datasets.quotes.item_by_id(id)?;
    Ok(ok(quote))
}

/// Returns quotes by category
pub async fn quotes_by_category(
    State(state): State<Arc<ServerState>>,
    Path(category): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let quotes = state.datasets.quotes.items_by_field("category", &category);
    if quotes.is_empty() {
        return Err(ServerError::NoMatches(
            "No quotes found for this category".to_string(),
        ));
    }
    Ok(ok(quotes))
}

/// Returns quotes by author
pub async fn quotes_by_author(
    State(state): State<Arc<ServerState>>,
    Path(author): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let quotes = state.datasets.quotes.items_by_field("author", &author);
    if quotes.is_empty() {
        return Err(ServerError::NoMatches(
            "No quotes found for this author".to_string(),
        ));
    }
    Ok(ok(quotes))
}
