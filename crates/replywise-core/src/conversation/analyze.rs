//! Recipient resolution cascade.

use replywise_thread::address::{ADDRESS_PREFIX, fallback_name, normalize_email, same_address};
use replywise_thread::{Message, Participant};
use tracing::{debug, warn};

use super::model::{ConversationState, PLACEHOLDER_RECIPIENT, RecipientSource};

/// Characters that betray a display name scraped from the wrong place.
const STRAY_NAME_MARKERS: &[char] = &['<', '>', '(', ')', '[', ']', '"', '\'', ',', ';', ':', '-'];

/// Analyzes a thread.
///
/// `anchor` is the index of the message being replied to; when it is `None`
/// or out of range the last message is used. The function is pure: the same
/// inputs always give the same state.
#[must_use]
pub fn analyze(
    messages: &[Message],
    local_user: Option<&str>,
    anchor: Option<usize>,
) -> ConversationState {
    let Some(last_index) = messages.len().checked_sub(1) else {
        return ConversationState::starter();
    };

    let target_index = anchor.filter(|&i| i < messages.len()).unwrap_or(last_index);
    let target = &messages[target_index];

    let last_sender_was_user = target.is_authored_by_local_user;
    let is_follow_up_by_user = last_sender_was_user
        && target_index
            .checked_sub(1)
            .is_some_and(|prev| messages[prev].is_authored_by_local_user);
    let awaiting_reply = last_sender_was_user && target_index == last_index;

    let (recipient, source) = resolve_recipient(messages, target, local_user);
    debug!(
        "Recipient {} resolved via {}",
        recipient.email,
        source.as_str()
    );

    ConversationState {
        target_index: Some(target_index),
        target: Some(target.clone()),
        conversation_starter: false,
        last_sender_was_user,
        is_follow_up_by_user,
        awaiting_reply,
        responding_to: (!last_sender_was_user).then(|| target.sender_participant()),
        recipient: Some(recipient),
        recipient_source: Some(source),
    }
}

fn resolve_recipient(
    messages: &[Message],
    target: &Message,
    local_user: Option<&str>,
) -> (Participant, RecipientSource) {
    let is_valid = |candidate: &Participant| {
        !candidate.email.trim().is_empty()
            && !local_user.is_some_and(|user| same_address(&candidate.email, user))
    };
    let not_user = |email: &str| !local_user.is_some_and(|user| same_address(email, user));

    let primary = if target.is_authored_by_local_user {
        let chosen = match local_user {
            Some(user) => target
                .recipients
                .first_other_than(user)
                .or_else(|| target.recipients.first()),
            None => target.recipients.first(),
        };
        chosen.cloned().map(|p| (p, RecipientSource::TargetRecipient))
    } else {
        Some((target.sender_participant(), RecipientSource::TargetSender))
    };

    if let Some((candidate, source)) = primary.filter(|(p, _)| is_valid(p)) {
        return (normalize(candidate), source);
    }

    // A message the user did not write counts through its sender; anything
    // else (including unmarked messages from the user's own address) counts
    // through its recipients.
    if let Some(candidate) = messages.iter().find_map(|message| {
        if !message.is_authored_by_local_user && not_user(&message.sender) {
            Some(message.sender_participant())
        } else {
            message
                .recipients
                .iter()
                .find(|p| not_user(&p.email))
                .cloned()
        }
    }) && is_valid(&candidate)
    {
        return (normalize(candidate), RecipientSource::ThreadSearch);
    }

    if let Some(candidate) = target
        .recipients
        .iter()
        .find(|p| not_user(&p.email))
        .cloned()
        && is_valid(&candidate)
    {
        return (normalize(candidate), RecipientSource::TargetRecipientFallback);
    }

    if !target.is_authored_by_local_user && !target.sender.trim().is_empty() {
        return (
            normalize(target.sender_participant()),
            RecipientSource::TargetSenderLastResort,
        );
    }

    warn!("No recipient found anywhere in the thread; using placeholder");
    (
        normalize(Participant {
            email: PLACEHOLDER_RECIPIENT.to_string(),
            display_name: String::new(),
        }),
        RecipientSource::Placeholder,
    )
}

/// Lowercases the address and repairs a suspicious display name.
fn normalize(participant: Participant) -> Participant {
    let email = normalize_email(&participant.email).unwrap_or_else(|| {
        let raw = participant.email.trim();
        raw.get(..ADDRESS_PREFIX.len())
            .filter(|head| head.eq_ignore_ascii_case(ADDRESS_PREFIX))
            .map_or(raw, |_| &raw[ADDRESS_PREFIX.len()..])
            .to_lowercase()
    });

    let name = participant.display_name.trim();
    let suspicious = name.contains('@')
        || name.starts_with(STRAY_NAME_MARKERS)
        || name.chars().count() < 2;

    let display_name = if suspicious {
        fallback_name(&email)
    } else {
        name.to_string()
    };

    Participant {
        email,
        display_name,
    }
}
