use super::ResponseProvider;
use crate::session::{Message, Role};
use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;

const VOICE_REPLY: &str = "Hello! I'd be happy to help you learn about our services. \
We offer comprehensive AI-powered solutions for business automation and customer engagement.";

const TEXT_REPLY: &str = "Thank you for your message. I understand your inquiry and \
I'm here to provide detailed assistance with any questions you might have.";

/// Stand-in conversational backend with fixed latency and canned replies
///
/// Picks its reply (and delay) from whether the latest user message arrived
/// through the voice path, matching how a spoken exchange feels slower than
/// a typed one.
#[derive(Debug, Clone)]
pub struct CannedResponder {
    /// Simulated latency for replies to voice messages
    pub voice_delay: Duration,

    /// Simulated latency for replies to typed messages
    pub text_delay: Duration,
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self {
            voice_delay: Duration::from_millis(1000),
            text_delay: Duration::from_millis(800),
        }
    }
}

impl CannedResponder {
    /// Responder with identical latency on both paths, for tests and demos
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            voice_delay: delay,
            text_delay: delay,
        }
    }
}

#[async_trait::async_trait]
impl ResponseProvider for CannedResponder {
    async fn generate_reply(&self, context: &[Message]) -> Result<String> {
        let voice_origin = context
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.voice_origin)
            .unwrap_or(false);

        if voice_origin {
            sleep(self.voice_delay).await;
            Ok(VOICE_REPLY.to_string())
        } else {
            sleep(self.text_delay).await;
            Ok(TEXT_REPLY.to_string())
        }
    }
}
