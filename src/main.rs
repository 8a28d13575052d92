use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::info;

use fyssa::config::Config;
use fyssa::core::dispatcher::TaskDispatcher;
use fyssa::core::lifecycle::LifecycleManager;
use fyssa::core::llm::openai::OpenAiProvider;
use fyssa::core::store::RequestStore;
use fyssa::interfaces::relay::RelayServer;
use fyssa::interfaces::web::ApiServer;
use fyssa::logging;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "fyssa.toml".to_string());
    let config = Config::load(&config_path)?;

    let store = RequestStore::open(&config.website.db_path)?;
    let dispatcher = TaskDispatcher::new(store.clone(), &config.website);
    let provider = Arc::new(OpenAiProvider::new(config.llm.clone()));

    let mut lifecycle = LifecycleManager::new();
    lifecycle.attach(Arc::new(Mutex::new(ApiServer::new(
        store,
        dispatcher,
        &config.website,
    ))));
    lifecycle.attach(Arc::new(Mutex::new(RelayServer::new(
        provider,
        &config.relay,
    ))));
    lifecycle.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");
    lifecycle.shutdown().await?;
    Ok(())
}
