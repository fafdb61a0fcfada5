//! Narrative text enhancement.
//!
//! The engine asks an external text service to dress up room descriptions
//! and NPC dialogue. Those calls are strictly optional: every one is
//! time-bounded and falls back to deterministic template text, so the game
//! state machine never blocks on the text service and never fails with it.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use textgen::{Request, TextGen};
use tracing::warn;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
const SYSTEM_PROMPT: &str =
    "You write terse, atmospheric flavor text for a text-mode dungeon crawl. \
     Two or three sentences, no markup, no questions to the player.";

/// Source of narrative text.
enum Source {
    /// Live text service.
    Remote(TextGen),
    /// Canned responses, consumed in order; used by tests.
    Scripted(Mutex<VecDeque<String>>),
    /// No service configured; always fall back.
    Disabled,
}

/// Narrative provider with mandatory timeout and deterministic fallback.
pub struct Narrator {
    source: Source,
    timeout: Duration,
}

impl Narrator {
    /// A narrator backed by the live text service.
    pub fn remote(client: TextGen) -> Self {
        Self {
            source: Source::Remote(client),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A narrator that always produces the deterministic fallback.
    pub fn disabled() -> Self {
        Self {
            source: Source::Disabled,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A narrator that replays canned lines, then falls back when empty.
    pub fn scripted(lines: Vec<String>) -> Self {
        Self {
            source: Source::Scripted(Mutex::new(lines.into())),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from the environment: remote when `TEXTGEN_BASE_URL` is set,
    /// otherwise disabled.
    pub fn from_env() -> Self {
        match TextGen::from_env() {
            Ok(client) => Self::remote(client),
            Err(_) => Self::disabled(),
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enrich a room description on first visit. Returns the template text
    /// unchanged when the service is off, slow, or failing.
    pub async fn enhance_room(&self, name: &str, base_description: &str, difficulty: u8) -> String {
        let prompt = format!(
            "Rewrite this dungeon room description, keeping its substance. \
             Room: {name}. Danger tier {difficulty} of 5. Current text: {base_description}"
        );
        self.generate(&prompt, base_description).await
    }

    /// Generate a line of NPC dialogue. Returns the NPC's canned fallback
    /// line when the service is off, slow, or failing.
    pub async fn npc_dialogue(
        &self,
        npc_name: &str,
        personality: &str,
        player_message: &str,
        room_name: &str,
        fallback: &str,
    ) -> String {
        let prompt = format!(
            "In one or two sentences of spoken dialogue, {npc_name} ({personality}) \
             responds to a traveler in the {room_name} who says: \"{player_message}\""
        );
        self.generate(&prompt, fallback).await
    }

    async fn generate(&self, prompt: &str, fallback: &str) -> String {
        match &self.source {
            Source::Disabled => fallback.to_string(),
            Source::Scripted(queue) => queue
                .lock()
                .expect("scripted narrator mutex poisoned")
                .pop_front()
                .unwrap_or_else(|| fallback.to_string()),
            Source::Remote(client) => {
                let request = Request::new(prompt).with_system(SYSTEM_PROMPT);
                match tokio::time::timeout(self.timeout, client.complete(request)).await {
                    Ok(Ok(completion)) if !completion.text.trim().is_empty() => {
                        completion.text.trim().to_string()
                    }
                    Ok(Ok(_)) => {
                        warn!("text service returned empty completion; using fallback");
                        fallback.to_string()
                    }
                    Ok(Err(error)) => {
                        warn!(%error, "text service call failed; using fallback");
                        fallback.to_string()
                    }
                    Err(_) => {
                        warn!(timeout = ?self.timeout, "text service call timed out; using fallback");
                        fallback.to_string()
                    }
                }
            }
        }
    }
}
