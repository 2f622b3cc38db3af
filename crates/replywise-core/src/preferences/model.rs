//! Preference data model.

use serde::{Deserialize, Serialize};

/// Maximum greeting or closing phrases kept.
pub const MAX_PHRASES: usize = 3;

/// Writing tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Plain and balanced.
    #[default]
    Neutral,
    /// Warm and casual.
    Friendly,
    /// Professional.
    Formal,
    /// As short as possible.
    Concise,
}

impl Tone {
    /// Instruction sentence for the prompt.
    #[must_use]
    pub const fn instruction(&self) -> &'static str {
        match self {
            Self::Neutral => "Use a clear, neutral tone.",
            Self::Friendly => "Use a warm, friendly and approachable tone.",
            Self::Formal => "Use a formal, professional tone.",
            Self::Concise => "Be direct and concise; leave out pleasantries.",
        }
    }
}

/// Target length of the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    /// A few sentences.
    Short,
    /// One or two paragraphs.
    #[default]
    Average,
    /// Several paragraphs.
    Long,
}

impl Length {
    /// Instruction sentence for the prompt.
    #[must_use]
    pub const fn instruction(&self) -> &'static str {
        match self {
            Self::Short => "Keep it short: two to four sentences.",
            Self::Average => "Keep it to one or two short paragraphs.",
            Self::Long => "Write a thorough reply of several paragraphs.",
        }
    }
}

/// Persisted writing preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Name used to sign messages.
    pub display_name: String,
    /// Preferred greeting phrases (at most [`MAX_PHRASES`]).
    pub greetings: Vec<String>,
    /// Preferred closing phrases (at most [`MAX_PHRASES`]).
    pub closings: Vec<String>,
    /// Default tone.
    pub tone: Tone,
    /// Target length.
    pub length: Length,
}

impl UserPreferences {
    /// Trims text fields, drops empty phrases and caps phrase lists.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.display_name = self.display_name.split_whitespace().collect::<Vec<_>>().join(" ");
        self.greetings = clean_phrases(self.greetings);
        self.closings = clean_phrases(self.closings);
        self
    }

    /// Display name, if the user set one.
    #[must_use]
    pub fn signature_name(&self) -> Option<&str> {
        let name = self.display_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

fn clean_phrases(phrases: Vec<String>) -> Vec<String> {
    phrases
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_PHRASES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_values_are_lowercase() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"tone": "formal", "length": "short"}"#).unwrap_or_default();
        assert_eq!(prefs.tone, Tone::Formal);
        assert_eq!(prefs.length, Length::Short);
        assert_eq!(
            serde_json::to_value(Tone::Concise).ok(),
            Some(serde_json::Value::from("concise"))
        );
    }

    #[test]
    fn test_normalized_caps_phrases() {
        let prefs = UserPreferences {
            display_name: "  Bob   Builder ".to_string(),
            greetings: vec![" Hi ".into(), String::new(), "Hello".into(), "Hey".into(), "Yo".into()],
            closings: vec!["Cheers".into()],
            ..UserPreferences::default()
        }
        .normalized();

        assert_eq!(prefs.display_name, "Bob Builder");
        assert_eq!(prefs.greetings, vec!["Hi", "Hello", "Hey"]);
        assert_eq!(prefs.closings, vec!["Cheers"]);
        assert_eq!(prefs.signature_name(), Some("Bob Builder"));
    }

    #[test]
    fn test_signature_name_empty() {
        assert_eq!(UserPreferences::default().signature_name(), None);
    }
}
