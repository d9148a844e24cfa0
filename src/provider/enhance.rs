use anyhow::{bail, Result};
use std::time::Duration;
use tokio::time::sleep;

/// Asynchronous "improve this text" collaborator for system prompts
#[async_trait::async_trait]
pub trait PromptEnhancer: Send + Sync {
    /// Return an improved version of the prompt; the caller decides whether
    /// to apply it
    async fn enhance(&self, prompt: &str) -> Result<String>;
}

/// Simulated prompt optimizer: waits, then appends a fixed capability list
#[derive(Debug, Clone)]
pub struct CannedEnhancer {
    /// Simulated optimization latency
    pub delay: Duration,
}

impl Default for CannedEnhancer {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
        }
    }
}

#[async_trait::async_trait]
impl PromptEnhancer for CannedEnhancer {
    async fn enhance(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            bail!("Cannot enhance an empty prompt");
        }

        sleep(self.delay).await;

        Ok(format!(
            "{prompt}\n\n\
             Enhanced with advanced conversational abilities:\n\
             - Contextual awareness and memory retention\n\
             - Adaptive communication style based on user preferences\n\
             - Proactive information gathering and clarification\n\
             - Emotional intelligence and empathy in responses\n\
             - Professional expertise in relevant domains\n\
             - Clear, structured responses with actionable insights"
        ))
    }
}
