//! Signature repair.

use tracing::debug;

use super::check::ValidationContext;
use super::names::{has_closing, name_variants, signature_window, word_pattern};

/// Replaces a signature written with the recipient's name by `correct_name`.
///
/// Only the trailing signature area is touched. A line holding nothing but
/// the recipient's name is removed; a closing line that also carries the name
/// ("Thanks, Alice") keeps the closing and loses the name. The correct name
/// is then appended once. When the recipient's name is not found the text is
/// returned unchanged.
///
/// This is a heuristic and the result still goes to a human for review.
#[must_use]
pub fn repair_signature(text: &str, correct_name: &str, recipient_email: &str) -> String {
    repair_with_names(text, correct_name, &name_variants(recipient_email, None))
}

/// Like [`repair_signature`], but also recognises the recipient's display
/// name from `ctx`, matching the names [`validate_with`] looks for.
///
/// [`validate_with`]: super::validate_with
#[must_use]
pub fn repair_signature_with(text: &str, correct_name: &str, ctx: &ValidationContext<'_>) -> String {
    repair_with_names(
        text,
        correct_name,
        &name_variants(ctx.recipient_email, ctx.recipient_name),
    )
}

fn repair_with_names(text: &str, correct_name: &str, recipient_names: &[String]) -> String {
    let Some(recipient_re) = word_pattern(recipient_names) else {
        return text.to_string();
    };

    let lines: Vec<&str> = text.lines().collect();
    let window = signature_window(&lines);
    let mut repaired: Vec<String> = lines[..window.end].iter().map(ToString::to_string).collect();
    let mut changed = false;

    for i in window.rev() {
        let line = lines[i];
        if !recipient_re.is_match(line) {
            continue;
        }
        let without_name = recipient_re.replace_all(line, "");
        let rest = without_name.trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation());
        if rest.is_empty() {
            repaired.remove(i);
            changed = true;
        } else if has_closing(line) {
            let closing = without_name.trim_end_matches(|c: char| c.is_whitespace() || c == ',');
            repaired[i] = format!("{},", closing.trim_start());
            changed = true;
        }
    }

    if !changed {
        return text.to_string();
    }

    let correct_name = correct_name.trim();
    let already_signed = repaired
        .iter()
        .rev()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| l.trim() == correct_name);
    if !correct_name.is_empty() && !already_signed {
        repaired.push(correct_name.to_string());
    }

    debug!("Repaired signature for {correct_name}");
    repaired.join("\n")
}
