//! Shared role agent base
//!
//! Every concrete role wraps a [`RoleAgent`]: a name, a system preamble,
//! a backend configuration, and a handle to the shared request manager.
//! The name doubles as the cancellation scope, so cancelling an agent
//! aborts exactly the requests it submitted.

use mentor_llm::{GenerationConfig, Message};
use mentor_request::{AgentStatus, Priority, RequestManager, RequestOptions, TextStream};

use crate::error::Result;

/// Per-call options surfaced to role methods
///
/// A deliberate subset of the manager's request options; timeouts and
/// retry limits stay centralized in the manager configuration.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    /// Queuing class
    pub priority: Priority,
    /// When false, the call pre-empts the agent's other requests
    pub cancellable: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            priority: Priority::Normal,
            cancellable: true,
        }
    }
}

impl CallOptions {
    /// Jump the queue
    pub fn high_priority(mut self) -> Self {
        self.priority = Priority::High;
        self
    }

    /// Pre-empt the agent's other requests on submission
    pub fn exclusive(mut self) -> Self {
        self.cancellable = false;
        self
    }
}

/// One named tutoring persona bound to a backend configuration
pub struct RoleAgent {
    name: String,
    preamble: String,
    config: GenerationConfig,
    manager: RequestManager,
}

impl RoleAgent {
    /// Create an agent with the given name and system preamble
    pub fn new(
        name: impl Into<String>,
        preamble: impl Into<String>,
        config: GenerationConfig,
        manager: RequestManager,
    ) -> Self {
        Self {
            name: name.into(),
            preamble: preamble.into(),
            config,
            manager,
        }
    }

    /// The agent's name, which scopes its requests in the manager
    pub fn name(&self) -> &str {
        &self.name
    }

    fn system_message(&self, context: Option<&str>) -> Message {
        match context {
            Some(context) => Message::system(format!("{}\n\nContext: {}", self.preamble, context)),
            None => Message::system(self.preamble.clone()),
        }
    }

    fn request_options(&self, options: CallOptions) -> RequestOptions {
        let mut request = self.manager.default_options();
        request.priority = options.priority;
        request.cancellable = options.cancellable;
        request
    }

    /// Send a conversation through the manager and return the response text
    ///
    /// The system preamble (with optional context appended) is prepended to
    /// the message list.
    pub async fn call(
        &self,
        messages: Vec<Message>,
        context: Option<&str>,
        options: CallOptions,
    ) -> Result<String> {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(self.system_message(context));
        all.extend(messages);

        let response = self
            .manager
            .submit(&self.name, all, &self.config, self.request_options(options))
            .await?;
        Ok(response.content)
    }

    /// Stream a conversation's response text chunk by chunk
    pub fn stream(&self, messages: Vec<Message>, context: Option<&str>) -> TextStream {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(self.system_message(context));
        all.extend(messages);

        self.manager.submit_stream(
            &self.name,
            all,
            &self.config,
            self.request_options(CallOptions::default()),
        )
    }

    /// Cancel every outstanding request this agent has submitted
    pub fn cancel(&self) {
        self.manager.cancel_agent_requests(&self.name);
    }

    /// Current processing status
    pub fn status(&self) -> AgentStatus {
        self.manager.agent_status(&self.name)
    }
}
