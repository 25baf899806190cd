//! Quotes API server binary.

use quotes_api::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::load()?;
    quotes_api::server::run(config).await
}
