pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The only boundary to the actual intelligence. Everything behind it is an
/// opaque remote service.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// A scripted provider for tests. Returns pre-defined replies in order, or
/// fails every call with a fixed message.
pub struct ScriptedProvider {
    replies: Vec<String>,
    failure: Option<String>,
    index: std::sync::atomic::AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            failure: None,
            index: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            replies: Vec::new(),
            failure: Some(message.into()),
            index: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String> {
        if let Some(msg) = &self.failure {
            return Err(anyhow::anyhow!("{msg}"));
        }
        let i = self
            .index
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.replies
            .get(i)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("ScriptedProvider: no more replies (called {} times)", i + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_provider_returns_replies_in_order() {
        let provider = ScriptedProvider::new(vec!["a".into(), "b".into()]);
        assert_eq!(provider.generate(&[]).await.unwrap(), "a");
        assert_eq!(provider.generate(&[]).await.unwrap(), "b");
        assert!(provider.generate(&[]).await.is_err());
    }

    #[tokio::test]
    async fn failing_provider_always_errors() {
        let provider = ScriptedProvider::failing("quota exceeded");
        let err = provider.generate(&[]).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}
