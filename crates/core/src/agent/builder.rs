use std::sync::Arc;

use lingua_model::{OptionSet, Provider, Result, Tool, Transport};

use super::Agent;
use crate::conversation::{Conversation, Window};
use crate::http::{HttpTransport, TransportConfig};

/// [`Agent`] builder.
pub struct AgentBuilder {
    provider: Provider,
    transport: Option<Arc<dyn Transport>>,
    system_prompt: Option<String>,
    options: OptionSet,
    tools: Vec<Tool>,
    window: Window,
}

impl AgentBuilder {
    /// Creates a new builder for the specified provider.
    #[inline]
    pub fn with_provider(provider: Provider) -> Self {
        Self {
            provider,
            transport: None,
            system_prompt: None,
            options: OptionSet::default(),
            tools: vec![],
            window: Window::default(),
        }
    }

    /// Sets the transport. Without one, an [`HttpTransport`] with the
    /// default configuration is created.
    #[inline]
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets a transport shared with other callers.
    #[inline]
    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, system_prompt: S) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Sets the options applied to every turn.
    #[inline]
    pub fn with_options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    /// Registers a tool the model may call.
    #[inline]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Sets the history window.
    #[inline]
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Result<Agent> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&TransportConfig::default())?),
        };
        Ok(Agent {
            provider: self.provider,
            transport,
            system_prompt: self.system_prompt,
            options: self.options,
            tools: self.tools,
            window: self.window,
            conversation: Conversation::default(),
        })
    }
}
