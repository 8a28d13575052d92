use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WebsiteConfig;
use crate::core::store::RequestStore;
use crate::core::store::types::TaskKind;
use crate::error::ApiError;

/// Wire format of one task handed to the agent relay.
#[derive(Debug, Serialize)]
pub struct AgentTask<'a> {
    pub request_id: &'a str,
    pub kind: TaskKind,
    pub payload: &'a str,
    /// Where the relay posts the completion callback.
    pub webhook_url: String,
}

/// Website-side entry point: persist a pending record, then forward the
/// task to the agent endpoint. One outbound call per submission, no retry.
#[derive(Clone)]
pub struct TaskDispatcher {
    store: RequestStore,
    client: Client,
    agent_endpoint: String,
    callback_base_url: String,
}

impl TaskDispatcher {
    pub fn new(store: RequestStore, config: &WebsiteConfig) -> Self {
        Self {
            store,
            client: Client::new(),
            agent_endpoint: config.agent_endpoint.clone(),
            callback_base_url: config.callback_base_url(),
        }
    }

    /// Validate the kind, create the record, forward to the agent endpoint.
    ///
    /// If the outbound call fails the record stays pending: the agent side
    /// may still pick the task up out-of-band, and reconciliation of stuck
    /// records is an operational concern, not ours.
    pub async fn submit(
        &self,
        kind: &str,
        requester: &str,
        payload: &str,
    ) -> Result<String, ApiError> {
        let kind: TaskKind = kind.parse()?;
        let request_id = Uuid::new_v4().to_string();

        self.store
            .create_request(&request_id, kind, requester, payload)
            .await?;

        let task = AgentTask {
            request_id: &request_id,
            kind,
            payload,
            webhook_url: self.webhook_url_for(kind, &request_id),
        };

        match self
            .client
            .post(&self.agent_endpoint)
            .json(&task)
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => {
                info!(
                    "Dispatched {} task {} to agent endpoint",
                    kind, request_id
                );
                Ok(request_id)
            }
            Ok(res) => {
                warn!(
                    "Agent endpoint rejected task {}: {}",
                    request_id,
                    res.status()
                );
                Err(ApiError::DispatchFailed(format!(
                    "agent endpoint returned {}",
                    res.status()
                )))
            }
            Err(e) => {
                warn!("Agent endpoint unreachable for task {}: {}", request_id, e);
                Err(ApiError::DispatchFailed(e.to_string()))
            }
        }
    }

    /// The original site gives each kind its own callback route; grading
    /// callbacks carry the id in the body instead of the path.
    fn webhook_url_for(&self, kind: TaskKind, request_id: &str) -> String {
        match kind {
            TaskKind::Chat => format!("{}/api/ai-webhook/{}/", self.callback_base_url, request_id),
            TaskKind::ExamGeneration => format!(
                "{}/api/exam-webhook/{}/",
                self.callback_base_url, request_id
            ),
            TaskKind::Grading => format!("{}/api/grading-webhook/", self.callback_base_url),
        }
    }
}
