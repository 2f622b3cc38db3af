//! Prompt assembly.
//!
//! Every function here is pure: the same inputs give the same text. The
//! caller decides which prompt to send and when.

use replywise_thread::{Message, Participant};

use crate::conversation::{ConversationState, Situation};
use crate::language::Language;
use crate::preferences::{Tone, UserPreferences};

/// Header of the block naming who the message goes to.
pub const RECIPIENT_IDENTITY_HEADER: &str = "RECIPIENT IDENTITY";

/// Header of the preamble added on retries.
pub const STRICT_IDENTITY_HEADER: &str = "STRICT IDENTITY RULES";

/// Label used for the user's own messages in quoted context.
const SELF_LABEL: &str = "You";

/// Everything the compose prompt depends on.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    /// Analyzer output.
    pub state: &'a ConversationState,
    /// The user's stored preferences.
    pub preferences: &'a UserPreferences,
    /// The local user, when the extractor found them.
    pub local_user: Option<&'a Participant>,
    /// Recent messages to quote, oldest first.
    pub context: &'a [Message],
    /// What the user asked for.
    pub intent: &'a str,
    /// Tone for this request.
    pub tone: Tone,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Language to write in.
    pub language: Language,
}

impl PromptInput<'_> {
    /// Name the draft is signed with.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        self.preferences
            .signature_name()
            .or_else(|| self.local_user.map(|p| p.display_name.as_str()))
            .unwrap_or("the user")
    }
}

/// Session-level instructions.
#[must_use]
pub fn system_prompt(preferences: &UserPreferences) -> String {
    let mut prompt = String::from(
        "You are an email writing assistant. You write emails on behalf of the user, \
         in the first person, as if the user wrote them.",
    );
    if let Some(name) = preferences.signature_name() {
        prompt.push_str(&format!(" The user's name is {name}."));
    }
    prompt.push_str(
        " You never write as the recipient, never greet the user, and never refer to the \
         user in the third person. You output only the requested text, with no commentary.",
    );
    prompt
}

/// Builds the prompt for one drafting attempt.
#[must_use]
pub fn compose_prompt(input: &PromptInput<'_>) -> String {
    let state = input.state;
    let sender = input.sender_name();
    let recipient = state.recipient.as_ref().filter(|_| !state.recipient_is_placeholder());
    let mut prompt = String::new();

    if input.attempt >= 2 {
        prompt.push_str(&strict_identity_rules(sender, input.local_user, recipient));
        prompt.push('\n');
    }

    prompt.push_str("TASK:\n");
    prompt.push_str(&task_line(state, input.intent));
    prompt.push_str("\n\n");

    prompt.push_str("SENDER (you are writing as this person):\n");
    prompt.push_str(&format!("- Name: {sender}\n"));
    if let Some(user) = input.local_user {
        prompt.push_str(&format!("- Email: {}\n", user.email));
    }
    prompt.push('\n');

    if !state.conversation_starter {
        match recipient {
            Some(recipient) => prompt.push_str(&format!(
                "{RECIPIENT_IDENTITY_HEADER}:\n- Name: {name}\n- Email: {email}\n\
                 - Greet {name} by name. Do not sign with this name.\n\n",
                name = recipient.display_name,
                email = recipient.email,
            )),
            None => prompt.push_str(
                "The recipient could not be identified. Use a greeting without a name.\n\n",
            ),
        }
    }

    if !input.context.is_empty() {
        prompt.push_str("THREAD (oldest first):\n");
        prompt.push_str(&format_thread(input.context));
        prompt.push('\n');
    }

    let prefs = input.preferences;
    prompt.push_str(&format!(
        "STYLE:\n- {}\n- {}\n",
        input.tone.instruction(),
        prefs.length.instruction()
    ));
    if !prefs.greetings.is_empty() {
        prompt.push_str(&format!("- Preferred greetings: {}\n", prefs.greetings.join(" / ")));
    }
    if !prefs.closings.is_empty() {
        prompt.push_str(&format!("- Preferred closings: {}\n", prefs.closings.join(" / ")));
    }
    prompt.push_str(&format!(
        "- Sign the email as {sender}.\n- Write in {}.\n",
        input.language
    ));
    prompt.push_str(
        "- Output only the email body. No subject line, no placeholders in square brackets.\n",
    );

    prompt
}

/// Builds the prompt for a subject line of a new conversation.
#[must_use]
pub fn subject_prompt(body: &str, intent: &str, language: Language) -> String {
    format!(
        "Write a subject line for the email below. Use at most eight words, in {language}. \
         Output only the subject text, without quotes or a \"Subject:\" prefix.\n\n\
         Purpose: {intent}\n\nEMAIL:\n{body}\n"
    )
}

/// Builds the prompt for a short thread summary.
#[must_use]
pub fn summary_prompt(messages: &[Message], language: Language) -> String {
    format!(
        "Summarize this email thread in two or three sentences, in {language}. \
         Mention who asked for what. Output only the summary.\n\n{}",
        format_thread(messages)
    )
}

/// Builds the yes/no question asked before extracting action items.
#[must_use]
pub fn action_items_probe_prompt(messages: &[Message]) -> String {
    format!(
        "Does this email thread contain any action items, requests or deadlines for the \
         reader? Answer with only \"yes\" or \"no\".\n\n{}",
        format_thread(messages)
    )
}

/// Builds the prompt listing action items.
#[must_use]
pub fn action_items_prompt(messages: &[Message], language: Language) -> String {
    format!(
        "List the action items in this email thread, in {language}. Write one item per \
         line, each starting with \"- \". Output only the list.\n\n{}",
        format_thread(messages)
    )
}

fn task_line(state: &ConversationState, intent: &str) -> String {
    let intent = intent.trim();
    let recipient = state
        .recipient
        .as_ref()
        .filter(|_| !state.recipient_is_placeholder())
        .map_or("the recipient", |r| r.display_name.as_str());
    let base = match state.situation() {
        Situation::ConversationStarter => "Write a new email that starts a conversation.".to_string(),
        Situation::FollowUp => format!(
            "You sent the last messages in this thread and {recipient} has not replied. \
             Write another polite follow-up to {recipient}."
        ),
        Situation::AwaitingReply => format!(
            "You sent the latest message in this thread and are waiting for {recipient} to \
             reply. Write a follow-up to {recipient}."
        ),
        Situation::RespondingTo => {
            let author = state
                .responding_to
                .as_ref()
                .map_or(recipient, |p| p.display_name.as_str());
            format!("Write a reply to the latest message from {author}.")
        }
    };
    if intent.is_empty() {
        base
    } else {
        format!("{base}\nThe user wants to say: {intent}")
    }
}

fn strict_identity_rules(
    sender: &str,
    local_user: Option<&Participant>,
    recipient: Option<&Participant>,
) -> String {
    let you = local_user.map_or_else(
        || sender.to_string(),
        |user| format!("{sender} <{}>", user.email),
    );
    let mut block = format!(
        "{STRICT_IDENTITY_HEADER} (the previous draft mixed up sender and recipient):\n\
         - You are {you}. Write as {sender}.\n\
         - Never greet {sender}. Never mention {sender} in the third person.\n"
    );
    if let Some(recipient) = recipient {
        let name = &recipient.display_name;
        block.push_str(&format!(
            "- The email is addressed to {name} <{}>.\n- Greet {name}. Never sign as {name}.\n",
            recipient.email
        ));
    }
    block.push_str(&format!("- The last line of the email is the signature: {sender}.\n"));
    block
}

/// Formats messages as quoted context, labelling the user's own messages.
#[must_use]
pub fn format_thread(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| {
            let label = if message.is_authored_by_local_user {
                SELF_LABEL
            } else {
                message.sender_display_name.as_str()
            };
            format!("--- From: {label}\n{}\n", message.body_text.trim())
        })
        .collect()
}
