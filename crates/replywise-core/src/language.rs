//! Language detection from message text.
//!
//! A deterministic character scan: no model, no dictionary. Non-Latin
//! scripts are identified by Unicode block; Latin text with enough accented
//! letters is assigned to the Romance language whose characteristic letters
//! dominate. Everything else is English.

use serde::{Deserialize, Serialize};

/// Minimum characters of a script before it counts as a signal.
const MIN_SCRIPT_CHARS: usize = 2;

/// Minimum accented Latin letters before the Romance heuristic applies.
const MIN_ACCENTED_CHARS: usize = 3;

/// Languages the prompt can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Default when nothing else is detected.
    #[default]
    English,
    /// Han characters without kana.
    Chinese,
    /// Kana, possibly mixed with Han.
    Japanese,
    /// Hangul.
    Korean,
    /// Cyrillic.
    Russian,
    /// Arabic script.
    Arabic,
    /// Hebrew script.
    Hebrew,
    /// Greek script.
    Greek,
    /// Devanagari.
    Hindi,
    /// Latin with Spanish markers.
    Spanish,
    /// Latin with French markers.
    French,
    /// Latin with Portuguese markers.
    Portuguese,
    /// Latin with Italian markers.
    Italian,
}

impl Language {
    /// English name used in prompts.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::Russian => "Russian",
            Self::Arabic => "Arabic",
            Self::Hebrew => "Hebrew",
            Self::Greek => "Greek",
            Self::Hindi => "Hindi",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::Portuguese => "Portuguese",
            Self::Italian => "Italian",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
struct ScriptCounts {
    han: usize,
    kana: usize,
    hangul: usize,
    cyrillic: usize,
    arabic: usize,
    hebrew: usize,
    greek: usize,
    devanagari: usize,
}

impl ScriptCounts {
    fn add(&mut self, c: char) {
        match c {
            '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' => self.kana += 1,
            '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' => self.han += 1,
            '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' => self.hangul += 1,
            '\u{0400}'..='\u{04FF}' => self.cyrillic += 1,
            '\u{0600}'..='\u{06FF}' => self.arabic += 1,
            '\u{0590}'..='\u{05FF}' => self.hebrew += 1,
            '\u{0370}'..='\u{03FF}' => self.greek += 1,
            '\u{0900}'..='\u{097F}' => self.devanagari += 1,
            _ => {}
        }
    }

    fn strongest(&self) -> Option<Language> {
        let japanese = if self.kana > 0 { self.kana + self.han } else { 0 };
        let chinese = if self.kana > 0 { 0 } else { self.han };
        [
            (Language::Japanese, japanese),
            (Language::Chinese, chinese),
            (Language::Korean, self.hangul),
            (Language::Russian, self.cyrillic),
            (Language::Arabic, self.arabic),
            (Language::Hebrew, self.hebrew),
            (Language::Greek, self.greek),
            (Language::Hindi, self.devanagari),
        ]
        .into_iter()
        .filter(|&(_, count)| count >= MIN_SCRIPT_CHARS)
        .fold(None, |best: Option<(Language, usize)>, candidate| match best {
            Some((_, best_count)) if best_count >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(language, _)| language)
    }
}

/// Weights of accented letters per Romance language. Letters unique to one
/// language weigh more than shared ones; `é` is common to all four and
/// carries no signal.
fn romance_weights(c: char) -> [(Language, usize); 4] {
    let (es, fr, pt, it) = match c {
        'ñ' | '¿' | '¡' => (3, 0, 0, 0),
        'í' | 'ú' | 'á' => (1, 0, 1, 0),
        'ó' => (1, 0, 1, 1),
        'ã' | 'õ' => (0, 0, 3, 0),
        'ç' | 'â' | 'ê' | 'ô' => (0, 1, 1, 0),
        'î' | 'û' | 'ë' | 'ï' | 'œ' => (0, 3, 0, 0),
        'è' | 'ù' => (0, 1, 0, 1),
        'à' => (0, 1, 1, 1),
        'ì' | 'ò' => (0, 0, 0, 3),
        _ => (0, 0, 0, 0),
    };
    [
        (Language::Spanish, es),
        (Language::French, fr),
        (Language::Portuguese, pt),
        (Language::Italian, it),
    ]
}

fn romance_guess(text: &str) -> Option<Language> {
    let mut scores = [
        (Language::Spanish, 0usize),
        (Language::French, 0),
        (Language::Portuguese, 0),
        (Language::Italian, 0),
    ];
    let mut accented = 0;
    for c in text.chars().flat_map(char::to_lowercase) {
        let weights = romance_weights(c);
        if weights.iter().any(|&(_, w)| w > 0) {
            accented += 1;
        }
        for (slot, (_, weight)) in scores.iter_mut().zip(weights) {
            slot.1 += weight;
        }
    }
    if accented < MIN_ACCENTED_CHARS {
        return None;
    }
    scores
        .into_iter()
        .fold(None, |best: Option<(Language, usize)>, candidate| match best {
            Some((_, best_score)) if best_score >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(language, _)| language)
}

/// Detects the dominant language across several texts.
pub fn detect_language<'a>(texts: impl IntoIterator<Item = &'a str>) -> Language {
    let combined: String = texts.into_iter().collect::<Vec<_>>().join("\n");
    let mut counts = ScriptCounts::default();
    for c in combined.chars() {
        counts.add(c);
    }
    counts
        .strongest()
        .or_else(|| romance_guess(&combined))
        .unwrap_or_default()
}
