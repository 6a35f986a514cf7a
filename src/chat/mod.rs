//! Persona chat client for generative-text services.

pub mod agent;
pub mod backend;
pub mod gemini;
pub mod persona;

pub use agent::{AgentReply, ChatAgent, Conversation};
pub use backend::{GenerativeBackend, Role, Turn};
pub use gemini::{ChatConfig, GeminiClient};
pub use persona::Persona;
