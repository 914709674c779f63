mod builder;
mod shared;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use lingua_model::{
    File, Image, OptionSet, Provider, Request, Response, Result, Tool,
    Transport, Turn,
};

use crate::Context;
use crate::conversation::{Conversation, Window};
use crate::dispatcher::prompt;
pub use builder::AgentBuilder;
pub use shared::SharedAgent;

/// Something sent along with a user message.
#[derive(Clone, Debug, PartialEq)]
pub enum Attachment {
    /// An image.
    Image(Image),
    /// A file previously uploaded to the agent's provider.
    File(File),
}

impl From<Image> for Attachment {
    #[inline]
    fn from(image: Image) -> Self {
        Self::Image(image)
    }
}

impl From<File> for Attachment {
    #[inline]
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

/// An agent instance, which maintains a transcript against one provider.
///
/// Every [`chat`](Agent::chat) replays the transcript (subject to the
/// configured [`Window`]) together with the system prompt and the new user
/// message. The exchange is recorded only if it succeeds: a failed or
/// cancelled turn leaves the transcript exactly as it was, so the turn can
/// simply be retried.
///
/// Turns mutate the transcript, hence `&mut self`. Callers that need to
/// share one agent between tasks should use [`SharedAgent`], which takes
/// turns one at a time.
pub struct Agent {
    provider: Provider,
    transport: Arc<dyn Transport>,
    system_prompt: Option<String>,
    options: OptionSet,
    tools: Vec<Tool>,
    window: Window,
    conversation: Conversation,
}

impl Agent {
    /// Sends a user message and records the exchange on success.
    pub async fn chat<S, I>(
        &mut self,
        ctx: &Context,
        text: S,
        attachments: I,
    ) -> Result<Response>
    where
        S: Into<String>,
        I: IntoIterator<Item = Attachment>,
    {
        let mut user = Turn::user(text);
        for attachment in attachments {
            match attachment {
                Attachment::Image(image) => user.images.push(image),
                Attachment::File(file) => user.files.push(file),
            }
        }

        let mut request = Request::new(user.text.clone())
            .with_options(self.options.clone())
            .with_history(self.conversation.history(self.window).to_vec());
        request.system = self.system_prompt.clone();
        request.images = user.images.clone();
        request.files = user.files.clone();
        request.tools = self.tools.clone();

        let response =
            prompt(ctx, self.transport.as_ref(), &self.provider, &request)
                .await?;
        self.conversation.push_exchange(user, &response);
        trace!("transcript has {} turns", self.conversation.len());
        Ok(response)
    }

    /// Replaces the system prompt used from the next turn on.
    #[inline]
    pub fn set_system_prompt<S: Into<String>>(&mut self, system_prompt: S) {
        self.system_prompt = Some(system_prompt.into());
    }

    /// Returns the current system prompt.
    #[inline]
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Changes how much history is replayed.
    #[inline]
    pub fn set_window(&mut self, window: Window) {
        self.window = window;
    }

    /// Returns the recorded conversation.
    #[inline]
    pub fn transcript(&self) -> &Conversation {
        &self.conversation
    }

    /// Forgets every recorded turn. The system prompt is kept.
    #[inline]
    pub fn reset(&mut self) {
        self.conversation.clear();
    }

    /// Returns the provider this agent talks to.
    #[inline]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}
