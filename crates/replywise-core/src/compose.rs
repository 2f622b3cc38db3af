//! The drafting pipeline.
//!
//! One request runs end to end: preferences are loaded fresh, the thread is
//! analyzed, a single generation session is opened, and attempts are made
//! until the [`RetryPolicy`] accepts a draft or hands the decision to the
//! user. The session is always destroyed before returning.

use replywise_thread::{Extraction, Message, Participant, Warning};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conversation::{ConversationState, analyze};
use crate::generation::{GenerationCapability, GenerationSession, PromptOptions, open_session};
use crate::language::{Language, detect_language};
use crate::preferences::{PreferencesStore, Tone, UserPreferences, load_preferences};
use crate::prompt::{PromptInput, compose_prompt, subject_prompt, system_prompt};
use crate::retry::{Attempt, Decision, MAX_ATTEMPTS, RetryPolicy};
use crate::validation::{
    Issue, IssueKind, ValidationContext, ValidationResult, repair_signature_with, validate_with,
};
use crate::Result;

/// Default number of recent messages quoted into the prompt.
pub const DEFAULT_CONTEXT_MESSAGES: usize = 5;

/// Composer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Attempts per request, the first included.
    pub max_attempts: u32,
    /// Recent messages quoted into the prompt.
    pub context_messages: usize,
    /// Sampling options for every prompt.
    pub prompt_options: PromptOptions,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            context_messages: DEFAULT_CONTEXT_MESSAGES,
            prompt_options: PromptOptions::default(),
        }
    }
}

/// Whether the draft answers a thread or starts a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComposeMode {
    /// Reply within the thread.
    #[default]
    Reply,
    /// A new conversation; a subject line is generated too.
    New,
}

/// One drafting request.
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    /// Thread messages, oldest first. Ignored for [`ComposeMode::New`].
    pub messages: Vec<Message>,
    /// The signed-in user, if known.
    pub local_user: Option<Participant>,
    /// Index of the message being replied to.
    pub anchor: Option<usize>,
    /// What the user wants to say.
    pub intent: String,
    /// Tone for this request; falls back to the stored preference.
    pub tone: Option<Tone>,
    /// Reply or new conversation.
    pub mode: ComposeMode,
    /// Notices carried over from extraction.
    pub warnings: Vec<String>,
}

impl ComposeRequest {
    /// A reply to an extracted thread.
    #[must_use]
    pub fn reply(extraction: Extraction, anchor: Option<usize>, intent: impl Into<String>) -> Self {
        Self {
            warnings: extraction.warnings.iter().map(ToString::to_string).collect(),
            messages: extraction.messages,
            local_user: extraction.local_user,
            anchor,
            intent: intent.into(),
            tone: None,
            mode: ComposeMode::Reply,
        }
    }

    /// A new conversation.
    #[must_use]
    pub fn new_conversation(local_user: Option<Participant>, intent: impl Into<String>) -> Self {
        Self {
            local_user,
            intent: intent.into(),
            mode: ComposeMode::New,
            ..Self::default()
        }
    }

    /// Overrides the tone.
    #[must_use]
    pub const fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = Some(tone);
        self
    }
}

/// A generated draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// The e-mail body.
    pub body: String,
    /// Subject line, for new conversations.
    pub subject: Option<String>,
    /// Who the draft is addressed to, when known.
    pub recipient: Option<Participant>,
    /// Attempts used.
    pub attempts: u32,
    /// Degraded-path notices for the user.
    pub warnings: Vec<String>,
}

/// Result of a compose request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// The draft passed validation.
    Ready(Draft),
    /// Validation still failed after the last attempt. The user must choose
    /// to use the draft anyway or abandon it.
    NeedsConfirmation {
        /// The last draft.
        draft: Draft,
        /// Errors found in it.
        issues: Vec<Issue>,
    },
}

impl ComposeOutcome {
    /// The draft, regardless of validity.
    #[must_use]
    pub const fn draft(&self) -> &Draft {
        match self {
            Self::Ready(draft) | Self::NeedsConfirmation { draft, .. } => draft,
        }
    }

    /// Whether the user has to confirm before the draft is used.
    #[must_use]
    pub const fn needs_confirmation(&self) -> bool {
        matches!(self, Self::NeedsConfirmation { .. })
    }

    /// Applies the user's choice. A ready draft is always returned;
    /// a draft needing confirmation only when `use_anyway` is set.
    #[must_use]
    pub fn confirm(self, use_anyway: bool) -> Option<Draft> {
        match self {
            Self::Ready(draft) => Some(draft),
            Self::NeedsConfirmation { draft, .. } => use_anyway.then_some(draft),
        }
    }
}

/// Drafts e-mails with a generation capability.
pub struct Composer<'a> {
    capability: &'a dyn GenerationCapability,
    preferences: &'a dyn PreferencesStore,
    config: ComposerConfig,
}

impl<'a> Composer<'a> {
    /// Creates a composer with default settings.
    #[must_use]
    pub fn new(
        capability: &'a dyn GenerationCapability,
        preferences: &'a dyn PreferencesStore,
    ) -> Self {
        Self {
            capability,
            preferences,
            config: ComposerConfig::default(),
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub const fn with_config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current settings.
    #[must_use]
    pub const fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Runs one request.
    ///
    /// # Errors
    ///
    /// Returns an error if preferences cannot be loaded, the capability is
    /// unavailable, or generation fails. Validation failures are not errors;
    /// they surface as [`ComposeOutcome::NeedsConfirmation`].
    pub async fn compose(&self, request: ComposeRequest) -> Result<ComposeOutcome> {
        let preferences = load_preferences(self.preferences).await?;
        let plan = Plan::new(&request, preferences, self.config.context_messages);

        let mut session = open_session(self.capability, &system_prompt(&plan.preferences)).await?;
        let result = self.run(session.as_mut(), &plan).await;
        session.destroy().await;
        debug!("Generation session destroyed");
        result
    }

    async fn run(&self, session: &mut dyn GenerationSession, plan: &Plan<'_>) -> Result<ComposeOutcome> {
        let policy = RetryPolicy::new(self.config.max_attempts);
        let options = &self.config.prompt_options;
        let mut attempt = Attempt::first();

        let (body, issues) = loop {
            let prompt = compose_prompt(&plan.prompt_input(attempt));
            let raw = session.prompt(&prompt, options).await?;
            let (body, validation) = plan.check(raw.trim());

            for issue in validation.warnings() {
                warn!("Draft attempt {}: {issue}", attempt.number());
            }

            match policy.decide(attempt, &validation) {
                Decision::Accept => break (body, None),
                Decision::Retry(next) => {
                    info!(
                        "Draft attempt {} failed validation, retrying with stricter prompt",
                        attempt.number()
                    );
                    attempt = next;
                }
                Decision::AskUser(errors) => {
                    warn!(
                        "Draft still invalid after {} attempt(s), asking the user",
                        attempt.number()
                    );
                    break (body, Some(errors));
                }
            }
        };

        let subject = if plan.request.mode == ComposeMode::New {
            let prompt = subject_prompt(&body, &plan.request.intent, plan.language);
            let raw = session.prompt(&prompt, options).await?;
            Some(clean_subject(&raw))
        } else {
            None
        };

        let draft = Draft {
            body,
            subject,
            recipient: plan.recipient().cloned(),
            attempts: attempt.number(),
            warnings: plan.warnings.clone(),
        };
        Ok(match issues {
            None => ComposeOutcome::Ready(draft),
            Some(issues) => ComposeOutcome::NeedsConfirmation { draft, issues },
        })
    }
}

/// Per-request values derived once before the attempt loop.
struct Plan<'r> {
    request: &'r ComposeRequest,
    preferences: UserPreferences,
    state: ConversationState,
    context: &'r [Message],
    language: Language,
    tone: Tone,
    sender_name: Option<String>,
    warnings: Vec<String>,
}

impl<'r> Plan<'r> {
    fn new(request: &'r ComposeRequest, preferences: UserPreferences, context_messages: usize) -> Self {
        let local_email = request.local_user.as_ref().map(|p| p.email.as_str());
        let (state, thread) = match request.mode {
            ComposeMode::New => (ConversationState::starter(), &request.messages[..0]),
            ComposeMode::Reply => (
                analyze(&request.messages, local_email, request.anchor),
                request.messages.as_slice(),
            ),
        };

        let upto = state.target_index.map_or(0, |i| i + 1);
        let context = &thread[upto.saturating_sub(context_messages)..upto];
        let language = detect_language(
            context
                .iter()
                .map(|m| m.body_text.as_str())
                .chain(std::iter::once(request.intent.as_str())),
        );

        let mut warnings = request.warnings.clone();
        if request.local_user.is_none() {
            let unresolved = Warning::LocalUserUnresolved.message();
            if !warnings.contains(&unresolved) {
                warnings.push(unresolved);
            }
        }
        if state.recipient_is_placeholder() {
            warnings.push("Could not determine who this reply goes to; check the greeting".to_string());
        }

        let sender_name = preferences
            .signature_name()
            .map(str::to_string)
            .or_else(|| request.local_user.as_ref().map(|p| p.display_name.clone()));
        debug!(
            "Compose plan: situation {:?}, language {language}, {} context message(s)",
            state.situation(),
            context.len()
        );

        Self {
            request,
            tone: request.tone.unwrap_or(preferences.tone),
            preferences,
            state,
            context,
            language,
            sender_name,
            warnings,
        }
    }

    fn recipient(&self) -> Option<&Participant> {
        self.state
            .recipient
            .as_ref()
            .filter(|_| !self.state.recipient_is_placeholder())
    }

    fn prompt_input(&self, attempt: Attempt) -> PromptInput<'_> {
        PromptInput {
            state: &self.state,
            preferences: &self.preferences,
            local_user: self.request.local_user.as_ref(),
            context: self.context,
            intent: &self.request.intent,
            tone: self.tone,
            attempt: attempt.number(),
            language: self.language,
        }
    }

    fn validation_context(&self) -> ValidationContext<'_> {
        let recipient = self.recipient();
        ValidationContext {
            local_user_email: self
                .request
                .local_user
                .as_ref()
                .map_or("", |p| p.email.as_str()),
            local_user_name: self.sender_name.as_deref(),
            recipient_email: recipient.map_or("", |p| p.email.as_str()),
            recipient_name: recipient.map(|p| p.display_name.as_str()),
            intent: &self.request.intent,
        }
    }

    /// Validates a draft, repairing a signature written with the
    /// recipient's name when the sender's name is known.
    fn check(&self, text: &str) -> (String, ValidationResult) {
        let ctx = self.validation_context();
        let result = validate_with(text, &ctx);
        if !result.has(IssueKind::WrongSignature) {
            return (text.to_string(), result);
        }
        let Some(name) = ctx.local_user_name else {
            return (text.to_string(), result);
        };
        let repaired = repair_signature_with(text, name, &ctx);
        info!("Repaired signature signed with the recipient's name");
        let result = validate_with(&repaired, &ctx);
        (repaired, result)
    }
}

fn clean_subject(raw: &str) -> String {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or_default().trim();
    let line = match line.get(..8) {
        Some(head) if head.eq_ignore_ascii_case("subject:") => line[8..].trim_start(),
        _ => line,
    };
    line.trim_matches(|c| c == '"' || c == '\'' || c == '*').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_subject() {
        assert_eq!(clean_subject("Subject: Lunch on Friday?\n"), "Lunch on Friday?");
        assert_eq!(clean_subject("\n\"Quarterly numbers\"\nextra"), "Quarterly numbers");
        assert_eq!(clean_subject("**Intro call**"), "Intro call");
        assert_eq!(clean_subject(""), "");
    }

    #[test]
    fn test_confirm() {
        let draft = Draft {
            body: "Hi".into(),
            ..Draft::default()
        };
        assert_eq!(
            ComposeOutcome::Ready(draft.clone()).confirm(false),
            Some(draft.clone())
        );

        let pending = ComposeOutcome::NeedsConfirmation {
            draft: draft.clone(),
            issues: Vec::new(),
        };
        assert!(pending.needs_confirmation());
        assert_eq!(pending.clone().confirm(true), Some(draft));
        assert_eq!(pending.confirm(false), None);
    }

    #[test]
    fn test_new_conversation_request() {
        let request = ComposeRequest::new_conversation(None, "invite the team").with_tone(Tone::Formal);
        assert_eq!(request.mode, ComposeMode::New);
        assert_eq!(request.tone, Some(Tone::Formal));
        assert!(request.messages.is_empty());
    }

    #[test]
    fn test_context_window_ends_at_target() {
        let messages: Vec<Message> = (0..8)
            .map(|i| {
                Message::new(&format!("p{i}@x.com"), "")
                    .map(|m| m.with_body(format!("body {i}")))
            })
            .collect::<replywise_thread::Result<_>>()
            .unwrap_or_default();
        let request = ComposeRequest {
            messages,
            anchor: Some(6),
            ..ComposeRequest::default()
        };
        let plan = Plan::new(&request, UserPreferences::default(), 3);
        let bodies: Vec<&str> = plan.context.iter().map(|m| m.body_text.as_str()).collect();
        assert_eq!(bodies, vec!["body 4", "body 5", "body 6"]);
    }
}
