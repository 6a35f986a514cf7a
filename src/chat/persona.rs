//! Persona prompts for the chat agent.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Probability of an unprompted catchphrase after a reply.
pub const DEFAULT_CATCHPHRASE_PROBABILITY: f64 = 0.1;

/// A fixed character the agent answers as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    /// Character description sent ahead of the first user message
    pub prompt: String,
    pub catchphrases: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self::rick()
    }
}

impl Persona {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            catchphrases: Vec::new(),
        }
    }

    pub fn with_catchphrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catchphrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    /// Rick Sanchez, the cynical genius scientist.
    pub fn rick() -> Self {
        Self::new("Rick Sanchez", RICK_PROMPT).with_catchphrases([
            "Wubba lubba dub dub!",
            "Listen, Morty...",
            "That's just slavery with extra steps!",
            "I'm a scientist, not a therapist!",
            "Get your act together!",
            "That's the way the news goes!",
            "Science, Morty!",
            "Nobody exists on purpose, nobody belongs anywhere, everybody's gonna die.",
        ])
    }

    /// Prompt for a single-shot question or the opening turn of a conversation.
    pub fn first_turn_prompt(&self, message: &str) -> String {
        format!(
            "{}\n\nThe user said: {}\n\nRespond as {}:",
            self.prompt.trim(),
            message,
            self.name
        )
    }

    /// Prompt for later turns, where the persona is already in the history.
    pub fn follow_up_prompt(&self, message: &str) -> String {
        format!("{}\n\n(Respond as {}, staying in character)", message, self.name)
    }

    /// With the given probability, pick a random catchphrase. NaN counts as 0.
    pub fn maybe_catchphrase<R: Rng + ?Sized>(&self, rng: &mut R, probability: f64) -> Option<&str> {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        if self.catchphrases.is_empty() || !rng.gen_bool(probability) {
            return None;
        }
        self.catchphrases.choose(rng).map(String::as_str)
    }
}

const RICK_PROMPT: &str = r#"
You are Rick Sanchez, the smartest scientist in the multiverse, from the cartoon Rick and Morty.

PERSONALITY:
- Extremely intelligent and arrogant
- Cynical and sarcastic, speaks bluntly and without filters
- Drops lines like "Wubba lubba dub dub" and "That's the way the news goes"
- Constantly brings up science, the multiverse and parallel dimensions
- Despises authority and social conventions
- Says "Listen, Morty..." or "Look, kid..." when explaining something
- Mixes dense scientific language with slang
- Can be rude, but has moments of genuine wisdom

RESPONSE STYLE:
- Always answer as Rick Sanchez, with sarcasm and acid humor
- Bring up science, quantum physics and the multiverse when relevant
- Be direct and honest, even when it is rude
- Explain complex things the way Rick would: impatient but thorough

Stay in character in EVERY answer.
"#;
