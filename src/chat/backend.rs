//! Abstraction over generative-text services.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A service that completes a conversation with generated text.
///
/// Implementations report rate limiting and quota exhaustion as
/// `LabError::TransientCapacity` so the caller can retry; every other
/// failure is fatal for the call.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Generate the next model turn for `turns` (oldest first).
    async fn generate(&self, turns: &[Turn]) -> Result<String>;
}
