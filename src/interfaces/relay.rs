use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::RelayConfig;
use crate::core::lifecycle::LifecycleComponent;
use crate::core::llm::LlmProvider;
use crate::core::relay::{RelayState, build_relay_router};

/// The agent-side HTTP service: accepts tasks, talks to the LLM provider,
/// posts completion callbacks.
pub struct RelayServer {
    state: RelayState,
    host: String,
    port: u16,
}

impl RelayServer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &RelayConfig) -> Self {
        Self {
            state: RelayState::new(provider, config.webhook_secret.clone()),
            host: config.host.clone(),
            port: config.port,
        }
    }
}

#[async_trait]
impl LifecycleComponent for RelayServer {
    async fn on_init(&mut self) -> Result<()> {
        info!("Agent relay initializing...");
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let state = self.state.clone();
        let addr = format!("{}:{}", self.host, self.port);

        tokio::spawn(async move {
            let app = build_relay_router(state);
            if let Ok(listener) = tokio::net::TcpListener::bind(&addr).await {
                info!("Agent relay running at http://{addr}");
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!("Agent relay crashed: {}", e);
                }
            } else {
                tracing::error!("Agent relay failed to bind {addr}");
            }
        });
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("Agent relay shutting down...");
        Ok(())
    }
}
