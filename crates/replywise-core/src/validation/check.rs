//! The individual checks run over a generated draft.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::model::{IntentCategory, Issue, IssueKind, ValidationResult};
use super::names::{alternation, has_closing, name_variants, signature_window, word_pattern};

/// Minimum length, in characters, before a draft without first-person
/// pronouns is reported.
const FIRST_PERSON_MIN_CHARS: usize = 50;

fn first_person_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:i|me|my|mine|myself|we|us|our|ours)\b").ok())
        .as_ref()
}

fn bracket_slot_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\[\]\n]+\]|\{\{[^{}\n]*\}\}").ok())
        .as_ref()
}

fn subject_line_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^\s*subject\s*:").ok())
        .as_ref()
}

/// Who the draft is from and to, and what the user asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    /// Address of the person the draft is written for.
    pub local_user_email: &'a str,
    /// Their display name, when known.
    pub local_user_name: Option<&'a str>,
    /// Address of the person the draft is written to.
    pub recipient_email: &'a str,
    /// Their display name, when known.
    pub recipient_name: Option<&'a str>,
    /// The user's free-text request.
    pub intent: &'a str,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context from addresses alone.
    #[must_use]
    pub const fn new(local_user_email: &'a str, recipient_email: &'a str, intent: &'a str) -> Self {
        Self {
            local_user_email,
            local_user_name: None,
            recipient_email,
            recipient_name: None,
            intent,
        }
    }

    /// Sets the local user's display name.
    #[must_use]
    pub const fn with_local_name(mut self, name: &'a str) -> Self {
        self.local_user_name = Some(name);
        self
    }

    /// Sets the recipient's display name.
    #[must_use]
    pub const fn with_recipient_name(mut self, name: &'a str) -> Self {
        self.recipient_name = Some(name);
        self
    }
}

/// Validates `text` using names derived from the two addresses.
#[must_use]
pub fn validate(text: &str, local_user: &str, recipient: &str, intent: &str) -> ValidationResult {
    validate_with(text, &ValidationContext::new(local_user, recipient, intent))
}

/// Validates `text` against every check and collects all findings.
#[must_use]
pub fn validate_with(text: &str, ctx: &ValidationContext<'_>) -> ValidationResult {
    let recipient_names = name_variants(ctx.recipient_email, ctx.recipient_name);
    let all_user_names = name_variants(ctx.local_user_email, ctx.local_user_name);
    // Names shared with the recipient say nothing about who is addressed.
    let user_names: Vec<String> = all_user_names
        .iter()
        .filter(|n| !recipient_names.contains(n))
        .cloned()
        .collect();

    let mut issues = Vec::new();
    check_self_greeting(text, &user_names, &mut issues);
    check_third_person(text, &user_names, &mut issues);
    check_first_person(text, &mut issues);
    check_intent_markers(text, ctx.intent, &mut issues);
    check_placeholders(text, &mut issues);
    check_signature(text, &all_user_names, &recipient_names, &mut issues);
    check_subject_line(text, &mut issues);

    let result = ValidationResult::from_issues(issues);
    debug!(
        "Validated draft: {} error(s), {} warning(s)",
        result.errors().count(),
        result.warnings().count()
    );
    result
}

fn check_self_greeting(text: &str, user_names: &[String], issues: &mut Vec<Issue>) {
    let Some(names) = alternation(user_names) else {
        return;
    };
    let Ok(re) = Regex::new(&format!(r"(?i)\b(?:dear|hi|hello|hey)\s+(?:{names})\b")) else {
        return;
    };
    if let Some(found) = re.find(text) {
        issues.push(Issue::error(
            IssueKind::SelfGreeting,
            format!("Greets the sender instead of the recipient: \"{}\"", found.as_str()),
        ));
    }
}

fn check_third_person(text: &str, user_names: &[String], issues: &mut Vec<Issue>) {
    let Some(names) = alternation(user_names) else {
        return;
    };
    let Ok(re) = Regex::new(&format!(r"(?i)\b(?:{names})\s+(?:will|can)\b")) else {
        return;
    };
    if let Some(found) = re.find(text) {
        issues.push(Issue::error(
            IssueKind::ThirdPersonSelfReference,
            format!("Refers to the sender in the third person: \"{}\"", found.as_str()),
        ));
    }
}

fn check_first_person(text: &str, issues: &mut Vec<Issue>) {
    if text.chars().count() <= FIRST_PERSON_MIN_CHARS {
        return;
    }
    if first_person_pattern().is_some_and(|re| !re.is_match(text)) {
        issues.push(Issue::warning(
            IssueKind::NoFirstPerson,
            "No first-person pronoun found",
        ));
    }
}

fn check_intent_markers(text: &str, intent: &str, issues: &mut Vec<Issue>) {
    let lower = text.to_lowercase();
    for category in IntentCategory::detect(intent) {
        if !category.output_markers().iter().any(|m| lower.contains(m)) {
            issues.push(Issue::warning(
                IssueKind::MissingIntentMarkers(category),
                format!("Request asks for {} but the draft does not say so", category.label()),
            ));
        }
    }
}

fn check_placeholders(text: &str, issues: &mut Vec<Issue>) {
    let Some(re) = bracket_slot_pattern() else {
        return;
    };
    // Markdown links (`[label](url)`) are not slots.
    let slot = re
        .find_iter(text)
        .find(|m| !text[m.end()..].starts_with('('));
    if let Some(slot) = slot {
        issues.push(Issue::error(
            IssueKind::Placeholder,
            format!("Contains an unfilled placeholder: {}", slot.as_str()),
        ));
    }
}

// A signature line matching a name the user shares with the recipient
// counts as the user's.
fn check_signature(
    text: &str,
    user_names: &[String],
    recipient_names: &[String],
    issues: &mut Vec<Issue>,
) {
    let Some(recipient_re) = word_pattern(recipient_names) else {
        return;
    };
    let lines: Vec<&str> = text.lines().collect();
    let window = signature_window(&lines);

    let signed_by_recipient = window.clone().any(|i| {
        recipient_re.is_match(lines[i])
            && (has_closing(lines[i]) || (i > window.start && has_closing(lines[i - 1])))
    });
    if !signed_by_recipient {
        return;
    }

    let sign_off_start = window
        .clone()
        .find(|&i| has_closing(lines[i]))
        .unwrap_or(window.start);
    let user_signed = word_pattern(user_names)
        .is_some_and(|re| lines[sign_off_start..window.end].iter().any(|l| re.is_match(l)));
    if !user_signed {
        issues.push(Issue::error(
            IssueKind::WrongSignature,
            "Signed with the recipient's name instead of the sender's",
        ));
    }
}

fn check_subject_line(text: &str, issues: &mut Vec<Issue>) {
    if subject_line_pattern().is_some_and(|re| re.is_match(text)) {
        issues.push(Issue::error(
            IssueKind::SubjectLine,
            "Contains a subject line; the body must not",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOB: &str = "bob@x.com";
    const ALICE: &str = "alice@x.com";

    #[test]
    fn test_clean_reply_is_valid() {
        let text = "Hi Alice,\n\nThanks for the update. I will review the numbers tomorrow.\n\nBest,\nBob";
        let result = validate(text, BOB, ALICE, "reply");
        assert!(result.is_valid, "{:?}", result.issues);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_dear_local_part_is_error() {
        let result = validate("Dear bob, I hope you are well.", BOB, ALICE, "");
        assert!(!result.is_valid);
        assert!(result.has(IssueKind::SelfGreeting));
        assert!(result.issues[0].message.contains("Dear bob"));
    }

    #[test]
    fn test_greeting_mid_text_is_found() {
        let result = validate("Ok.\nHello Bob!\nI can do that.", BOB, ALICE, "");
        assert!(result.has(IssueKind::SelfGreeting));
    }

    #[test]
    fn test_greeting_needs_whole_word() {
        let result = validate("Hi Bobby, I agree.", BOB, ALICE, "");
        assert!(!result.has(IssueKind::SelfGreeting));
    }

    #[test]
    fn test_third_person_reference() {
        let result = validate("Hi Alice, Bob will send the file. I agree.", BOB, ALICE, "");
        assert!(result.has(IssueKind::ThirdPersonSelfReference));
    }

    #[test]
    fn test_missing_first_person_is_warning() {
        let text = "The report is attached and the numbers look correct overall.";
        let result = validate(text, BOB, ALICE, "");
        assert!(result.is_valid);
        assert!(result.has(IssueKind::NoFirstPerson));

        let short = validate("Sounds good.", BOB, ALICE, "");
        assert!(!short.has(IssueKind::NoFirstPerson));
    }

    #[test]
    fn test_intent_markers() {
        let text = "Hi Alice, I wanted to ask about the invoice.\nBest,\nBob";
        let result = validate(text, BOB, ALICE, "follow up on the invoice");
        assert!(result.is_valid);
        assert!(result.has(IssueKind::MissingIntentMarkers(IntentCategory::FollowUp)));

        let text = "Hi Alice, I am following up on the invoice.\nBest,\nBob";
        let result = validate(text, BOB, ALICE, "follow up on the invoice");
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_placeholders() {
        let result = validate("Hi Alice, I will call on [DATE].", BOB, ALICE, "");
        assert!(result.has(IssueKind::Placeholder));

        let result = validate("Hi Alice, I said {{time}} works.", BOB, ALICE, "");
        assert!(result.has(IssueKind::Placeholder));

        let result = validate("Hi Alice, see [the doc](https://x.com).", BOB, ALICE, "");
        assert!(!result.has(IssueKind::Placeholder));
    }

    #[test]
    fn test_subject_line() {
        let result = validate("Subject: Lunch\n\nHi Alice, I am free.", BOB, ALICE, "");
        assert!(result.has(IssueKind::SubjectLine));

        let result = validate("Hi Alice, the subject: lunch. I am free.", BOB, ALICE, "");
        assert!(!result.has(IssueKind::SubjectLine));
    }

    #[test]
    fn test_swapped_identity_reports_both_errors() {
        let text = "Dear Bob,\n...\nSincerely,\nAlice";
        let result = validate(text, BOB, ALICE, "");
        assert!(!result.is_valid);
        assert!(result.has(IssueKind::SelfGreeting));
        assert!(result.has(IssueKind::WrongSignature));
    }

    #[test]
    fn test_signature_inline_with_closing() {
        let text = "Hi Bob... no wait.\nI will be there.\nThanks, Alice";
        let result = validate(text, "carol@x.com", ALICE, "");
        assert!(result.has(IssueKind::WrongSignature));
    }

    #[test]
    fn test_recipient_mentioned_in_body_is_not_signature() {
        let text = "Hi Alice,\nI spoke with Alice's manager.\nBest regards,\nBob";
        let result = validate(text, BOB, ALICE, "");
        assert!(!result.has(IssueKind::WrongSignature));
    }

    #[test]
    fn test_shared_first_name_signature_is_the_users() {
        let ctx = ValidationContext::new("alice@a.com", "alice@b.com", "")
            .with_local_name("Alice")
            .with_recipient_name("Alice Jones");
        let result = validate_with("Hi Alice,\nI agree with the plan.\nBest,\nAlice", &ctx);
        assert!(result.is_valid, "{:?}", result.issues);
        assert!(!result.has(IssueKind::WrongSignature));
    }

    #[test]
    fn test_recipient_full_name_signature() {
        let ctx = ValidationContext::new("bob@a.com", "alice@b.com", "")
            .with_local_name("Bob")
            .with_recipient_name("Alice Jones");
        let result = validate_with("Hi,\nI agree with the plan.\nBest,\nAlice Jones", &ctx);
        assert!(result.has(IssueKind::WrongSignature));
    }

    #[test]
    fn test_display_names_are_used() {
        let ctx = ValidationContext::new("b.k@x.com", "a.z@x.com", "")
            .with_local_name("Robert King")
            .with_recipient_name("Alicia Zed");
        let result = validate_with("Hello Robert, I think so.\nCheers,\nAlicia", &ctx);
        assert!(result.has(IssueKind::SelfGreeting));
        assert!(result.has(IssueKind::WrongSignature));
    }
}
