//! Keyword, length and punctuation based style classification.
//!
//! Each dimension is an ordered rule table: the first predicate that matches
//! the text features decides the value, otherwise the table's fallback applies.

use tracing::debug;

use super::model::{
    ConcernLevel, EmotionalTone, EnergyLevel, Formality, Openness, TechnicalLevel, Verbosity,
    WritingStyle,
};

/// Numeric surface features of one message, or a recency-weighted blend of
/// several.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextFeatures {
    pub words: f64,
    pub avg_word_len: f64,
    pub exclamations: f64,
    pub questions: f64,
    pub shouted_words: f64,
    pub first_person: f64,
    pub positive: f64,
    pub negative: f64,
    pub anxious: f64,
    pub formal: f64,
    pub casual: f64,
    pub technical: f64,
    pub personal: f64,
    pub concern: f64,
    pub low_energy: f64,
    pub high_energy: f64,
}

const POSITIVE_TERMS: &[&str] = &[
    "good", "great", "happy", "love", "glad", "awesome", "fantastic", "amazing", "excited",
    "thanks", "thank you", "bene", "benissimo", "felice", "contento", "contenta", "ottimo",
    "grazie", "fantastico", "bello",
];
const NEGATIVE_TERMS: &[&str] = &[
    "bad", "sad", "tired", "hate", "frustrated", "angry", "annoyed", "awful", "terrible",
    "difficult", "hard", "male", "triste", "stanco", "stanca", "odio", "frustrato",
    "frustrata", "arrabbiato", "arrabbiata", "difficile", "not good", "non bene",
];
const ANXIOUS_TERMS: &[&str] = &[
    "worried", "nervous", "anxious", "afraid", "scared", "unsure", "stressed", "overwhelmed",
    "not sure", "preoccupato", "preoccupata", "ansia", "ansioso", "ansiosa", "paura",
    "nervoso", "nervosa", "non so", "agitato", "agitata",
];
const FORMAL_TERMS: &[&str] = &[
    "please", "would", "could", "kindly", "regards", "dear", "sincerely", "gentile",
    "cortesemente", "vorrei", "potrebbe", "la ringrazio", "buongiorno", "buonasera",
];
const CASUAL_TERMS: &[&str] = &[
    "hey", "yeah", "lol", "cool", "gonna", "wanna", "yep", "nope", "ciao", "dai", "boh",
    "tipo", "ok", "okay", "haha", "ahah",
];
const TECHNICAL_TERMS: &[&str] = &[
    "macro", "macros", "protein", "calories", "vo2", "vo2max", "hypertrophy", "bmr", "tdee",
    "rpe", "reps", "sets", "cardio", "interval", "intervals", "deficit", "carbs", "heart rate",
    "metabolism", "proteine", "calorie", "ipertrofia", "ripetizioni", "carboidrati",
    "metabolismo", "frequenza cardiaca", "hiit",
];
const PERSONAL_TERMS: &[&str] = &[
    "family", "wife", "husband", "kids", "children", "partner", "i feel", "honestly",
    "to be honest", "because", "my job", "work", "famiglia", "moglie", "marito", "figli",
    "mi sento", "sinceramente", "perché", "perche", "lavoro",
];
const CONCERN_TERMS: &[&str] = &[
    "pain", "injury", "injured", "hurt", "hurts", "doctor", "surgery", "problem", "worried",
    "afraid", "scared", "dolore", "infortunio", "medico", "operazione", "problema",
    "preoccupato", "preoccupata", "paura", "male al",
];
const LOW_ENERGY_TERMS: &[&str] = &[
    "tired", "exhausted", "sleepy", "meh", "drained", "stanco", "stanca", "sfinito", "sfinita",
    "esausto", "esausta", "boh",
];
const HIGH_ENERGY_TERMS: &[&str] = &[
    "excited", "pumped", "can't wait", "let's go", "motivated", "ready", "carico", "carica",
    "non vedo l'ora", "motivato", "motivata", "gasato", "gasata",
];
const FIRST_PERSON_TERMS: &[&str] = &[
    "i", "i'm", "i've", "me", "my", "mine", "myself", "io", "mi", "mio", "mia", "miei", "mie",
    "sono", "ho",
];

/// Lowercased words joined by single spaces and padded, so whole-word and
/// whole-phrase lookups are plain substring searches.
fn padded_words(text: &str) -> (String, Vec<String>) {
    let normalized: String = text
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' => '\'',
            c => c,
        })
        .collect();
    let words: Vec<String> = normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    (format!(" {} ", words.join(" ")), words)
}

fn count_terms(padded: &str, terms: &[&str]) -> f64 {
    terms
        .iter()
        .map(|term| padded.matches(&format!(" {term} ")).count())
        .sum::<usize>() as f64
}

impl TextFeatures {
    pub fn from_text(text: &str) -> Self {
        let (padded, words) = padded_words(text);
        let word_count = words.len();
        let letters: usize = words.iter().map(|w| w.chars().count()).sum();
        let shouted = text
            .split_whitespace()
            .filter(|w| {
                let letters: Vec<char> = w.chars().filter(|c| c.is_alphabetic()).collect();
                letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
            })
            .count();

        Self {
            words: word_count as f64,
            avg_word_len: if word_count == 0 {
                0.0
            } else {
                letters as f64 / word_count as f64
            },
            exclamations: text.matches('!').count() as f64,
            questions: text.matches('?').count() as f64,
            shouted_words: shouted as f64,
            first_person: count_terms(&padded, FIRST_PERSON_TERMS),
            positive: count_terms(&padded, POSITIVE_TERMS),
            negative: count_terms(&padded, NEGATIVE_TERMS),
            anxious: count_terms(&padded, ANXIOUS_TERMS),
            formal: count_terms(&padded, FORMAL_TERMS),
            casual: count_terms(&padded, CASUAL_TERMS),
            technical: count_terms(&padded, TECHNICAL_TERMS),
            personal: count_terms(&padded, PERSONAL_TERMS),
            concern: count_terms(&padded, CONCERN_TERMS),
            low_energy: count_terms(&padded, LOW_ENERGY_TERMS),
            high_energy: count_terms(&padded, HIGH_ENERGY_TERMS),
        }
    }

    /// Weighted average of several feature sets. Weights need not sum to one.
    fn blend(weighted: &[(TextFeatures, f64)]) -> Self {
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Self::default();
        }
        let avg = |get: fn(&TextFeatures) -> f64| {
            weighted.iter().map(|(f, w)| get(f) * w).sum::<f64>() / total
        };
        Self {
            words: avg(|f| f.words),
            avg_word_len: avg(|f| f.avg_word_len),
            exclamations: avg(|f| f.exclamations),
            questions: avg(|f| f.questions),
            shouted_words: avg(|f| f.shouted_words),
            first_person: avg(|f| f.first_person),
            positive: avg(|f| f.positive),
            negative: avg(|f| f.negative),
            anxious: avg(|f| f.anxious),
            formal: avg(|f| f.formal),
            casual: avg(|f| f.casual),
            technical: avg(|f| f.technical),
            personal: avg(|f| f.personal),
            concern: avg(|f| f.concern),
            low_energy: avg(|f| f.low_energy),
            high_energy: avg(|f| f.high_energy),
        }
    }
}

/// An ordered `(predicate, result)` pair.
type Rule<T> = (fn(&TextFeatures) -> bool, T);

fn classify<T: Copy>(rules: &[Rule<T>], features: &TextFeatures, fallback: T) -> T {
    rules
        .iter()
        .find(|(predicate, _)| predicate(features))
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

static VERBOSITY_RULES: &[Rule<Verbosity>] = &[
    (|f| f.words <= 5.0, Verbosity::Brief),
    (|f| f.words <= 25.0, Verbosity::Moderate),
];

static TONE_RULES: &[Rule<EmotionalTone>] = &[
    (
        |f| f.anxious >= 1.0 && f.anxious >= f.positive,
        EmotionalTone::Anxious,
    ),
    (|f| f.negative > f.positive, EmotionalTone::Negative),
    (|f| f.positive > f.negative, EmotionalTone::Positive),
    (
        |f| f.exclamations >= 1.0 && f.negative == 0.0,
        EmotionalTone::Positive,
    ),
];

static FORMALITY_RULES: &[Rule<Formality>] = &[
    (|f| f.formal >= 1.0 && f.formal > f.casual, Formality::Formal),
    (|f| f.casual >= 1.0 && f.casual > f.formal, Formality::Casual),
    (|f| f.shouted_words >= 1.0, Formality::Casual),
];

static TECHNICAL_RULES: &[Rule<TechnicalLevel>] = &[
    (|f| f.technical >= 2.0, TechnicalLevel::Advanced),
    (
        |f| f.technical >= 1.0 || f.avg_word_len >= 6.5,
        TechnicalLevel::Intermediate,
    ),
];

static OPENNESS_RULES: &[Rule<Openness>] = &[
    (|f| f.personal >= 2.0, Openness::Open),
    (|f| f.words > 40.0 && f.first_person >= 3.0, Openness::Open),
    (|f| f.words <= 5.0 && f.personal == 0.0, Openness::Reserved),
];

static ENERGY_RULES: &[Rule<EnergyLevel>] = &[
    (|f| f.words <= 3.0 && f.exclamations == 0.0, EnergyLevel::Low),
    (|f| f.low_energy >= 1.0 && f.high_energy == 0.0, EnergyLevel::Low),
    (|f| f.exclamations >= 2.0 || f.shouted_words >= 2.0, EnergyLevel::High),
    (
        |f| f.exclamations >= 1.0 && (f.high_energy >= 1.0 || f.positive >= 1.0),
        EnergyLevel::High,
    ),
];

static CONCERN_RULES: &[Rule<ConcernLevel>] = &[
    (|f| f.concern >= 2.0, ConcernLevel::High),
    (|f| f.concern >= 1.0 && f.anxious >= 1.0, ConcernLevel::High),
    (|f| f.concern >= 1.0 || f.anxious >= 1.0, ConcernLevel::Moderate),
];

/// Infers a [`WritingStyle`] from user text. Total and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleAnalyzer;

impl StyleAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify a single message. Blank input yields the default style.
    pub fn analyze(&self, text: &str) -> WritingStyle {
        if text.trim().is_empty() {
            return WritingStyle::default();
        }
        self.classify(&TextFeatures::from_text(text))
    }

    /// Classify a conversation history, oldest first. Later messages weigh
    /// more (linear weights 1, 2, 3, ...). Blank entries are ignored.
    pub fn analyze_history<S: AsRef<str>>(&self, history: &[S]) -> WritingStyle {
        let weighted: Vec<(TextFeatures, f64)> = history
            .iter()
            .map(|s| s.as_ref())
            .filter(|text| !text.trim().is_empty())
            .enumerate()
            .map(|(i, text)| (TextFeatures::from_text(text), (i + 1) as f64))
            .collect();
        if weighted.is_empty() {
            return WritingStyle::default();
        }
        self.classify(&TextFeatures::blend(&weighted))
    }

    /// Apply every rule table to one feature snapshot.
    pub fn classify(&self, features: &TextFeatures) -> WritingStyle {
        let style = WritingStyle {
            verbosity: classify(VERBOSITY_RULES, features, Verbosity::Detailed),
            emotional_tone: classify(TONE_RULES, features, EmotionalTone::Neutral),
            formality: classify(FORMALITY_RULES, features, Formality::Neutral),
            technical_level: classify(TECHNICAL_RULES, features, TechnicalLevel::Basic),
            openness: classify(OPENNESS_RULES, features, Openness::Moderate),
            energy_level: classify(ENERGY_RULES, features, EnergyLevel::Medium),
            concern_level: classify(CONCERN_RULES, features, ConcernLevel::Low),
        };
        debug!(
            verbosity = %style.verbosity,
            tone = %style.emotional_tone,
            energy = %style.energy_level,
            concern = %style.concern_level,
            "Writing style classified"
        );
        style
    }
}
