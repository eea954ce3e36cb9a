use std::sync::Arc;

use anyhow::Context;

use fundcrm_api::config::ApiConfig;
use fundcrm_api::middleware::StaticTokenAuthenticator;
use fundcrm_infra::{InMemoryAssociations, TransactionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fundcrm_observability::init();

    let config = ApiConfig::from_env()?;
    let txn = TransactionConfig::from_env()?;
    tracing::info!(
        max_attempts = txn.retry.max_attempts,
        max_commit_attempts = txn.retry.max_commit_attempts,
        "transaction retry policy"
    );
    let seed = config.load_seed()?;

    let authenticator = StaticTokenAuthenticator::from_tokens(&seed.tokens);
    if authenticator.is_empty() {
        tracing::warn!("no dev tokens configured; every protected request will be rejected");
    }
    let associations = InMemoryAssociations::from_links(seed.associations).context("loading associations")?;
    tracing::info!(tokens = authenticator.len(), links = associations.len(), "seed loaded");

    let app = fundcrm_api::app::build_app(Arc::new(authenticator), Arc::new(associations));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
