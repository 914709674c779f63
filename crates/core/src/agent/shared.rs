use std::sync::Arc;

use lingua_model::{Response, Result};
use tokio::sync::{Mutex, MutexGuard};

use super::{Agent, Attachment};
use crate::Context;

/// An [`Agent`] that can be used from several tasks.
///
/// Turns are taken one at a time: a `chat` waits for the one in flight to
/// finish, so every turn sees the transcript left by the previous one.
#[derive(Clone)]
pub struct SharedAgent {
    inner: Arc<Mutex<Agent>>,
}

impl SharedAgent {
    /// Wraps `agent`.
    #[inline]
    pub fn new(agent: Agent) -> Self {
        Self {
            inner: Arc::new(Mutex::new(agent)),
        }
    }

    /// Waits for any turn in flight, then takes a turn.
    pub async fn chat<S, I>(
        &self,
        ctx: &Context,
        text: S,
        attachments: I,
    ) -> Result<Response>
    where
        S: Into<String>,
        I: IntoIterator<Item = Attachment>,
    {
        let mut agent = self.inner.lock().await;
        agent.chat(ctx, text, attachments).await
    }

    /// Locks the agent, e.g. to read the transcript or change settings.
    #[inline]
    pub async fn lock(&self) -> MutexGuard<'_, Agent> {
        self.inner.lock().await
    }
}

impl From<Agent> for SharedAgent {
    #[inline]
    fn from(agent: Agent) -> Self {
        Self::new(agent)
    }
}
