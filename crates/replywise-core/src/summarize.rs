//! Thread summaries with action items.

use replywise_thread::Message;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generation::{GenerationCapability, GenerationSession, PromptOptions, open_session};
use crate::language::{Language, detect_language};
use crate::prompt::{action_items_probe_prompt, action_items_prompt, summary_prompt};
use crate::Result;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You summarize email threads accurately and briefly. You never invent facts.";

/// Bullet prefixes stripped from action item lines.
const BULLETS: &[char] = &['-', '*', '•'];

/// Summary of a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    /// A few sentences.
    pub summary: String,
    /// Open tasks, one per entry. Empty when the model said there are none.
    pub action_items: Vec<String>,
}

/// Summarizes threads with a generation capability.
pub struct Summarizer<'a> {
    capability: &'a dyn GenerationCapability,
    options: PromptOptions,
}

impl<'a> Summarizer<'a> {
    /// Creates a summarizer with default sampling options.
    #[must_use]
    pub fn new(capability: &'a dyn GenerationCapability) -> Self {
        Self {
            capability,
            options: PromptOptions::default(),
        }
    }

    /// Replaces the sampling options.
    #[must_use]
    pub const fn with_options(mut self, options: PromptOptions) -> Self {
        self.options = options;
        self
    }

    /// Summarizes `messages`.
    ///
    /// The model is first asked whether any action items exist; they are
    /// only extracted when the answer starts with "yes". An empty thread
    /// gives an empty summary without touching the capability.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability is unavailable or a prompt fails.
    pub async fn summarize(&self, messages: &[Message]) -> Result<ThreadSummary> {
        if messages.is_empty() {
            return Ok(ThreadSummary::default());
        }
        let language = detect_language(messages.iter().map(|m| m.body_text.as_str()));

        let mut session = open_session(self.capability, SUMMARY_SYSTEM_PROMPT).await?;
        let result = self.run(session.as_mut(), messages, language).await;
        session.destroy().await;
        result
    }

    async fn run(
        &self,
        session: &mut dyn GenerationSession,
        messages: &[Message],
        language: Language,
    ) -> Result<ThreadSummary> {
        let summary = session
            .prompt(&summary_prompt(messages, language), &self.options)
            .await?
            .trim()
            .to_string();

        let probe = session
            .prompt(&action_items_probe_prompt(messages), &self.options)
            .await?;
        let action_items = if answer_is_yes(&probe) {
            let listing = session
                .prompt(&action_items_prompt(messages, language), &self.options)
                .await?;
            parse_items(&listing)
        } else {
            Vec::new()
        };
        debug!("Summarized thread with {} action item(s)", action_items.len());

        Ok(ThreadSummary {
            summary,
            action_items,
        })
    }
}

// Prefix match only: "Yes, but none really" still counts as yes.
fn answer_is_yes(answer: &str) -> bool {
    answer
        .trim_start()
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("yes"))
}

fn parse_items(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(|line| {
            let line = line.trim();
            let unnumbered = line
                .split_once(['.', ')'])
                .filter(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                .map_or(line, |(_, rest)| rest);
            unnumbered.trim_start_matches(BULLETS).trim().to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}
