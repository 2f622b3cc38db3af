//! Validation data model.

use serde::{Deserialize, Serialize};

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The draft must not be used as-is.
    Error,
    /// Worth logging; never blocks.
    Warning,
}

/// Kinds of intent whose wording can be checked in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentCategory {
    /// Chasing an earlier message.
    FollowUp,
    /// Expressing gratitude.
    Thanks,
    /// Apologising.
    Apology,
}

impl IntentCategory {
    /// Words in the user's request that signal this intent.
    #[must_use]
    pub const fn intent_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::FollowUp => &["follow up", "follow-up", "following up", "checking in", "remind", "nudge"],
            Self::Thanks => &["thank", "appreciat", "grateful", "gratitude"],
            Self::Apology => &["apolog", "sorry", "regret"],
        }
    }

    /// Phrases at least one of which should appear in the output.
    #[must_use]
    pub const fn output_markers(&self) -> &'static [&'static str] {
        match self {
            Self::FollowUp => &[
                "follow up",
                "following up",
                "follow-up",
                "checking in",
                "check in",
                "circling back",
                "touch base",
                "reminder",
                "wanted to check",
                "haven't heard",
            ],
            Self::Thanks => &["thank", "appreciate", "grateful", "gratitude"],
            Self::Apology => &["sorry", "apolog", "regret"],
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FollowUp => "follow-up",
            Self::Thanks => "thanks",
            Self::Apology => "apology",
        }
    }

    /// Intents implied by the user's request text.
    #[must_use]
    pub fn detect(intent: &str) -> Vec<Self> {
        let lower = intent.to_lowercase();
        [Self::FollowUp, Self::Thanks, Self::Apology]
            .into_iter()
            .filter(|category| {
                category
                    .intent_keywords()
                    .iter()
                    .any(|keyword| lower.contains(keyword))
            })
            .collect()
    }
}

/// What a validation issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// The draft greets the user.
    SelfGreeting,
    /// The draft talks about the user in the third person.
    ThirdPersonSelfReference,
    /// No first-person pronoun anywhere.
    NoFirstPerson,
    /// The requested intent is not reflected in the wording.
    MissingIntentMarkers(IntentCategory),
    /// An unfilled template slot.
    Placeholder,
    /// Signed with the recipient's name.
    WrongSignature,
    /// A subject line leaked into the body.
    SubjectLine,
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// How serious it is.
    pub severity: Severity,
    /// What it is about.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    /// Creates an error-severity issue.
    #[must_use]
    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    /// Creates a warning-severity issue.
    #[must_use]
    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
        }
    }

    /// Whether this issue blocks the draft.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// All findings for one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `false` iff at least one issue is an error.
    pub is_valid: bool,
    /// Findings in check order.
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// Builds a result, deriving validity from the issues.
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            is_valid: !issues.iter().any(Issue::is_error),
            issues,
        }
    }

    /// Error-severity issues.
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    /// Warning-severity issues.
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Whether an issue of `kind` was found.
    #[must_use]
    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}
