//! Retry policy for drafting.
//!
//! Each attempt is generated and validated. A clean draft is accepted; a
//! draft with errors is retried with a stricter prompt until the attempt
//! budget runs out, after which the user decides.

use serde::{Deserialize, Serialize};

use crate::validation::{Issue, ValidationResult};

/// Default number of attempts, the first included.
pub const MAX_ATTEMPTS: u32 = 2;

/// A 1-based attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Attempt(u32);

impl Attempt {
    /// The first attempt.
    #[must_use]
    pub const fn first() -> Self {
        Self(1)
    }

    /// The attempt number, starting at 1.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.0
    }

    /// Whether this attempt should use the stricter prompt.
    #[must_use]
    pub const fn is_retry(self) -> bool {
        self.0 >= 2
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// What to do after validating an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The draft passed.
    Accept,
    /// Generate again.
    Retry(Attempt),
    /// Out of attempts: show these errors and let the user choose.
    AskUser(Vec<Issue>),
}

/// Bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts allowed, the first included. Values below 1 act as 1.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` attempts.
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Decides the next step for `attempt` given its validation result.
    #[must_use]
    pub fn decide(&self, attempt: Attempt, result: &ValidationResult) -> Decision {
        if result.is_valid {
            Decision::Accept
        } else if attempt.number() < self.max_attempts.max(1) {
            Decision::Retry(attempt.next())
        } else {
            Decision::AskUser(result.errors().cloned().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::IssueKind;

    fn failing() -> ValidationResult {
        ValidationResult::from_issues(vec![
            Issue::error(IssueKind::WrongSignature, "signed as recipient"),
            Issue::warning(IssueKind::NoFirstPerson, "no pronoun"),
        ])
    }

    #[test]
    fn test_valid_draft_is_accepted() {
        let policy = RetryPolicy::default();
        let ok = ValidationResult::from_issues(Vec::new());
        assert_eq!(policy.decide(Attempt::first(), &ok), Decision::Accept);
    }

    #[test]
    fn test_retries_once_then_asks() {
        let policy = RetryPolicy::default();
        let first = Attempt::first();
        let Decision::Retry(second) = policy.decide(first, &failing()) else {
            panic!("expected a retry");
        };
        assert_eq!(second.number(), 2);
        assert!(second.is_retry());

        match policy.decide(second, &failing()) {
            Decision::AskUser(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].kind, IssueKind::WrongSignature);
            }
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn test_zero_budget_acts_as_one() {
        let policy = RetryPolicy::new(0);
        assert!(matches!(
            policy.decide(Attempt::first(), &failing()),
            Decision::AskUser(_)
        ));
    }
}
