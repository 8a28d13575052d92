mod handlers;
mod router;

pub use router::build_api_router;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::WebsiteConfig;
use crate::core::dispatcher::TaskDispatcher;
use crate::core::lifecycle::LifecycleComponent;
use crate::core::store::RequestStore;

#[derive(Clone)]
pub struct AppState {
    pub store: RequestStore,
    pub dispatcher: TaskDispatcher,
    pub webhook_secret: String,
}

/// The website-facing HTTP service: task submission plus webhook receivers.
pub struct ApiServer {
    state: AppState,
    host: String,
    port: u16,
}

impl ApiServer {
    pub fn new(store: RequestStore, dispatcher: TaskDispatcher, config: &WebsiteConfig) -> Self {
        Self {
            state: AppState {
                store,
                dispatcher,
                webhook_secret: config.webhook_secret.clone(),
            },
            host: config.host.clone(),
            port: config.port,
        }
    }
}

#[async_trait]
impl LifecycleComponent for ApiServer {
    async fn on_init(&mut self) -> Result<()> {
        info!("Website API initializing...");
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let state = self.state.clone();
        let addr = format!("{}:{}", self.host, self.port);

        tokio::spawn(async move {
            let app = build_api_router(state);
            if let Ok(listener) = tokio::net::TcpListener::bind(&addr).await {
                info!("Website API running at http://{addr}");
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!("Website API crashed: {}", e);
                }
            } else {
                tracing::error!("Website API failed to bind {addr}");
            }
        });
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("Website API shutting down...");
        Ok(())
    }
}
