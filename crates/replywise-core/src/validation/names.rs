//! Name matching helpers shared by the checks and the repair pass.

use regex::Regex;
use replywise_thread::address::local_part;

/// Lines at the end of a draft treated as the signature area.
pub const SIGNATURE_LINES: usize = 4;

/// Closing words and phrases, lowercase.
pub const CLOSINGS: &[&str] = &[
    "best regards",
    "kind regards",
    "warm regards",
    "regards",
    "best wishes",
    "best",
    "sincerely",
    "thanks",
    "thank you",
    "many thanks",
    "cheers",
    "warmly",
    "yours truly",
    "yours",
    "respectfully",
    "take care",
    "all the best",
];

/// Lowercase names a person might be called by: the address's local part,
/// its first segment, and (when given) the display name and its first word.
/// Variants shorter than two characters are dropped.
pub fn name_variants(email: &str, display_name: Option<&str>) -> Vec<String> {
    let local = local_part(email).to_lowercase();
    let first_segment = local
        .split(['.', '_', '-', '+'])
        .next()
        .unwrap_or_default()
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_string();

    let mut variants = vec![local, first_segment];
    if let Some(name) = display_name {
        let name = name.trim().to_lowercase();
        if let Some(first) = name.split_whitespace().next() {
            variants.push(first.to_string());
        }
        variants.push(name);
    }

    let mut unique = Vec::new();
    for variant in variants {
        if variant.chars().count() >= 2 && !variant.contains('@') && !unique.contains(&variant) {
            unique.push(variant);
        }
    }
    unique
}

/// Escaped regex alternation of `words`, longest first so a full name wins
/// over its first word.
pub fn alternation(words: &[String]) -> Option<String> {
    if words.is_empty() {
        return None;
    }
    let mut sorted: Vec<&String> = words.iter().collect();
    sorted.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    Some(
        sorted
            .into_iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

/// Case-insensitive whole-word pattern matching any of `words`.
pub fn word_pattern(words: &[String]) -> Option<Regex> {
    let alternatives = alternation(words)?;
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).ok()
}

/// Whether `line` contains a closing word or phrase.
pub fn has_closing(line: &str) -> bool {
    let lower = line.to_lowercase();
    CLOSINGS.iter().any(|closing| {
        lower.match_indices(closing).any(|(start, matched)| {
            let before = lower[..start].chars().next_back();
            let after = lower[start + matched.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
    })
}

/// Index range (into `lines`) of the trailing signature window, skipping
/// trailing blank lines.
pub fn signature_window(lines: &[&str]) -> std::ops::Range<usize> {
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(0, |i| i + 1);
    end.saturating_sub(SIGNATURE_LINES)..end
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_variants() {
        assert_eq!(
            name_variants("Alice.Smith42@x.com", Some("Alice Smith")),
            vec!["alice.smith42", "alice", "alice smith"]
        );
        assert_eq!(name_variants("j@x.com", None), Vec::<String>::new());
    }

    #[test]
    fn test_word_pattern_respects_boundaries() {
        let re = word_pattern(&["bob".to_string()]).unwrap();
        assert!(re.is_match("Thanks, Bob"));
        assert!(!re.is_match("Bobby"));
        assert!(word_pattern(&[]).is_none());
    }

    #[test]
    fn test_alternation_prefers_longer_names() {
        let names = vec!["alicia".to_string(), "alicia zed".to_string()];
        assert_eq!(alternation(&names).as_deref(), Some("alicia zed|alicia"));
        let re = word_pattern(&names).unwrap();
        assert_eq!(re.find("Cheers, Alicia Zed").unwrap().as_str(), "Alicia Zed");
    }

    #[test]
    fn test_has_closing() {
        assert!(has_closing("Best regards,"));
        assert!(has_closing("Thanks, Alice"));
        assert!(!has_closing("Bestow the award"));
    }

    #[test]
    fn test_signature_window_skips_blank_tail() {
        let lines = vec!["a", "b", "c", "d", "e", "", "  "];
        assert_eq!(signature_window(&lines), 1..5);
        assert_eq!(signature_window(&["x"]), 0..1);
        assert_eq!(signature_window(&[]), 0..0);
    }
}
