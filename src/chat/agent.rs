//! Persona chat agent with retry and an optional multi-turn conversation.

use super::backend::{GenerativeBackend, Turn};
use super::persona::Persona;
use crate::error::Result;
use crate::retry::{RetryOutcome, RetryPolicy};
use tracing::{debug, info};

/// Reply produced by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    Text(String),
    /// Every attempt hit a rate limit or quota error
    CapacityExhausted { attempts: u32 },
}

/// Turns exchanged so far in an open conversation.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

pub struct ChatAgent<B> {
    backend: B,
    persona: Persona,
    retry: RetryPolicy,
    conversation: Option<Conversation>,
}

impl<B: GenerativeBackend> ChatAgent<B> {
    pub fn new(backend: B, persona: Persona, retry: RetryPolicy) -> Self {
        Self {
            backend,
            persona,
            retry,
            conversation: None,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open a new conversation, discarding any previous one.
    pub fn start_conversation(&mut self) {
        info!(persona = %self.persona.name, "conversation started");
        self.conversation = Some(Conversation::default());
    }

    /// Close the conversation and return its turns.
    pub fn end_conversation(&mut self) -> Option<Conversation> {
        self.conversation.take()
    }

    pub fn in_conversation(&self) -> bool {
        self.conversation.is_some()
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Single-shot persona answer; never touches the conversation.
    pub async fn ask(&self, prompt: &str) -> Result<AgentReply> {
        let turns = [Turn::user(self.persona.first_turn_prompt(prompt))];
        self.complete(&turns).await
    }

    /// Send a message, inside the open conversation if there is one.
    ///
    /// The conversation only grows when the backend answers; a failed or
    /// exhausted send leaves it unchanged.
    pub async fn send(&mut self, message: &str) -> Result<AgentReply> {
        let Some(conversation) = self.conversation.as_ref() else {
            return self.ask(message).await;
        };

        let prompt = if conversation.is_empty() {
            self.persona.first_turn_prompt(message)
        } else {
            self.persona.follow_up_prompt(message)
        };
        let mut turns = conversation.turns.clone();
        turns.push(Turn::user(prompt));

        let reply = self.complete(&turns).await?;
        if let (AgentReply::Text(text), Some(conversation)) = (&reply, self.conversation.as_mut()) {
            turns.push(Turn::model(text.clone()));
            conversation.turns = turns;
        }
        Ok(reply)
    }

    async fn complete(&self, turns: &[Turn]) -> Result<AgentReply> {
        debug!(turns = turns.len(), "requesting completion");
        let report = self.retry.execute(|| self.backend.generate(turns)).await;
        match report.outcome {
            RetryOutcome::Completed(text) => Ok(AgentReply::Text(text)),
            RetryOutcome::Exhausted { attempts, .. } => Ok(AgentReply::CapacityExhausted { attempts }),
            RetryOutcome::Failed(err) => Err(err),
        }
    }
}
