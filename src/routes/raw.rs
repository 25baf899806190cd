//! Raw embedded dataset blobs, served verbatim as JSON.

use crate::dataset::embedded;
use axum::http::header;
use axum::response::IntoResponse;

fn raw_json(bytes: &'static [u8]) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], bytes)
}

pub async fn quotes_json() -> impl IntoResponse {
    raw_json(embedded::QUOTES)
}

pub async fn anime_json() -> impl IntoResponse {
    raw_json(embedded::ANIME)
}

pub async fn chucknorris_json() -> impl IntoResponse {
    raw_json(embedded::CHUCKNORRIS)
}

pub async fn dadjokes_json() -> impl IntoResponse {
    raw_json(embedded::DADJOKES)
}

pub async fn programming_json() -> impl IntoResponse {
    raw_json(embedded::PROGRAMMING)
}
