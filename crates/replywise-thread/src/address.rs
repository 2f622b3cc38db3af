//! E-mail address and display-name normalisation.
//!
//! Webmail pages expose addresses through attributes, hover cards and
//! free text. Everything that leaves this module is lowercased and trimmed so
//! comparisons elsewhere can stay case-insensitive by construction.

use std::sync::OnceLock;

use regex::Regex;

/// Prefix some pages put in front of addresses in attributes and links.
pub const ADDRESS_PREFIX: &str = "mailto:";

/// Fallback used when neither a display name nor a local part is available.
pub const UNKNOWN_NAME: &str = "Unknown";

fn email_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").ok())
        .as_ref()
}

fn angle_remnant_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>?|>").ok()).as_ref()
}

/// Returns the first e-mail address found in `text`, lowercased.
#[must_use]
pub fn find_email(text: &str) -> Option<String> {
    email_pattern()?
        .find(text)
        .map(|m| m.as_str().to_lowercase())
}

/// Returns every e-mail address found in `text`, lowercased, in order of
/// appearance. Duplicates are kept.
#[must_use]
pub fn find_emails(text: &str) -> Vec<String> {
    email_pattern()
        .map(|re| {
            re.find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

/// Normalises a raw address value.
///
/// Strips a leading `mailto:`, surrounding angle brackets and whitespace, and
/// lowercases the result. Returns `None` when no address can be found.
#[must_use]
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_prefix = match trimmed.get(..ADDRESS_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(ADDRESS_PREFIX) => &trimmed[ADDRESS_PREFIX.len()..],
        _ => trimmed,
    };
    find_email(without_prefix)
}

/// Returns the part of an address before the first `@`.
///
/// For a value without `@` the whole (trimmed) value is returned.
#[must_use]
pub fn local_part(email: &str) -> &str {
    let email = email.trim();
    email.split_once('@').map_or(email, |(local, _)| local)
}

/// Case-insensitive address comparison.
#[must_use]
pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Cleans a display name scraped from the page.
///
/// Angle-bracket remnants are removed and whitespace collapsed. The name is
/// rejected when it is empty, shorter than two characters, contains `@`, or
/// equals the address itself; the address's local part is used instead.
/// The result is never empty and never contains `@`.
#[must_use]
pub fn clean_display_name(raw: &str, email: &str) -> String {
    let stripped = angle_remnant_pattern()
        .map_or_else(|| raw.replace(['<', '>'], " "), |re| re.replace_all(raw, " ").into_owned());
    let collapsed = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = collapsed.trim_matches(|c| c == '"' || c == '\'').trim();

    let rejected = collapsed.chars().count() < 2
        || collapsed.contains('@')
        || same_address(collapsed, email);

    if rejected {
        fallback_name(email)
    } else {
        collapsed.to_string()
    }
}

/// Display name derived from an address when nothing better is known.
#[must_use]
pub fn fallback_name(email: &str) -> String {
    let local = local_part(email).trim();
    if local.is_empty() || local.contains('@') {
        UNKNOWN_NAME.to_string()
    } else {
        local.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_email_in_text() {
        assert_eq!(
            find_email("Alice Smith <Alice.Smith@Example.com>"),
            Some("alice.smith@example.com".to_string())
        );
        assert_eq!(find_email("no address here"), None);
    }

    #[test]
    fn test_find_emails_keeps_order() {
        let found = find_emails("to: b@x.com, A@x.com; c@y.org");
        assert_eq!(found, vec!["b@x.com", "a@x.com", "c@y.org"]);
    }

    #[test]
    fn test_normalize_strips_prefix() {
        assert_eq!(
            normalize_email("  MAILTO:<Bob@X.com> "),
            Some("bob@x.com".to_string())
        );
        assert_eq!(normalize_email("mailto:"), None);
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("bob@x.com"), "bob");
        assert_eq!(local_part("bob"), "bob");
        assert_eq!(local_part(""), "");
    }

    #[test]
    fn test_clean_display_name_strips_brackets() {
        assert_eq!(
            clean_display_name("  Alice   Smith <alice@x.com>", "alice@x.com"),
            "Alice Smith"
        );
    }

    #[test]
    fn test_clean_display_name_rejections() {
        assert_eq!(clean_display_name("", "alice@x.com"), "alice");
        assert_eq!(clean_display_name("A", "alice@x.com"), "alice");
        assert_eq!(clean_display_name("alice@x.com", "alice@x.com"), "alice");
        assert_eq!(clean_display_name("me@elsewhere.org", "alice@x.com"), "alice");
        assert_eq!(clean_display_name("", ""), UNKNOWN_NAME);
    }

    #[test]
    fn test_clean_display_name_strips_quotes() {
        assert_eq!(clean_display_name("\"Bob Jones\"", "bob@x.com"), "Bob Jones");
    }
}
