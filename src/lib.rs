//! Quotes API - HTTP REST service for curated quote and joke collections
//!
//! This crate serves five statically embedded content categories (general
//! quotes, anime quotes, Chuck Norris jokes, dad jokes, programming jokes)
//! over a read-mostly JSON API, plus a bearer-token protected admin surface
//! for runtime key/value settings. It provides:
//!
//! - **Dataset stores**: immutable per-category collections loaded once at
//!   startup, queried by random draw, id, or field value
//! - **Settings cache**: typed in-memory settings over an embedded
//!   durability log, mutable at runtime through the admin API
//! - **Credential store**: a persisted admin identity with argon2id password
//!   hashing and a long-lived bearer token
//! - **Auth gate**: bearer-token middleware guarding the admin routes
//! - **Rate limiting**: token-bucket tiers (global / api / admin)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use quotes_api::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     quotes_api::server::run(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health`, `GET /healthz` - Liveness probes
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/v1/random` - Random quote
//! - `GET /api/v1/quotes[/{id}|/category/{category}|/author/{author}]`
//! - `GET /api/v1/anime[/random|/{id}|/category/..|/show/..|/character/..]`
//! - `GET /api/v1/chucknorris[/random]`
//! - `GET /api/v1/dadjokes[/random]`
//! - `GET /api/v1/programming[/random]`
//! - `GET /api/v1/status` - Version and dataset counts
//!
//! ## Protected Endpoints (Bearer Token Required)
//!
//! - `GET /api/v1/admin/settings` - List all settings
//! - `POST /api/v1/admin/settings` - Upsert a setting
//! - `DELETE /api/v1/admin/settings/{key}` - Delete a setting

pub mod bootstrap;
pub mod config;
pub mod dataset;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod settings;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, run};
pub use state::ServerState;
