//! Field extractors: pure `text -> Option<value>` functions keyed by field name.
//!
//! Extraction is conservative: a recognized pattern carrying an implausible
//! value (age 250, weight 900 kg) is rejected, never guessed. Supports
//! English and Italian phrasing.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use super::engine::ExtractedData;

/// Extracts one field's value from raw user text.
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Option<Value>;
}

impl<F> FieldExtractor for F
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn extract(&self, text: &str) -> Option<Value> {
        self(text)
    }
}

/// Registry of field extractors, composed by the checklist engine.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn FieldExtractor>>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("fields", &self.fields())
            .finish()
    }
}

impl ExtractorRegistry {
    /// Create a registry with no extractors (for testing).
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in coaching field extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("first_name", Arc::new(extract_first_name));
        registry.register("age", Arc::new(extract_age));
        registry.register("height", Arc::new(extract_height));
        registry.register("weight", Arc::new(extract_weight));
        registry.register("goal", Arc::new(KeywordExtractor::new(GOAL_TABLE)));
        registry.register(
            "activity_level",
            Arc::new(KeywordExtractor::new(ACTIVITY_TABLE)),
        );
        registry.register("training_days", Arc::new(extract_training_days));
        registry.register("sleep_hours", Arc::new(extract_sleep_hours));
        registry.register("mood_score", Arc::new(extract_mood_score));
        registry.register("workout_done", Arc::new(extract_yes_no));
        registry.register("motivation", Arc::new(FreeTextExtractor::new(4)));
        registry.register("barriers", Arc::new(FreeTextExtractor::new(4)));
        registry.register("medical_notes", Arc::new(extract_medical_notes));

        registry.alias("name", "first_name");
        registry.alias("height_cm", "height");
        registry.alias("weight_kg", "weight");
        registry.alias("primary_goal", "goal");
        registry.alias("current_goal", "goal");
        registry.alias("sleep", "sleep_hours");
        registry.alias("mood", "mood_score");
        registry
    }

    /// Register (or replace) the extractor for a field.
    pub fn register(&mut self, field: impl Into<String>, extractor: Arc<dyn FieldExtractor>) {
        self.extractors.insert(field.into(), extractor);
    }

    /// Make `alias` resolve to the extractor registered for `target`.
    /// Returns false if `target` is unknown.
    pub fn alias(&mut self, alias: &str, target: &str) -> bool {
        match self.extractors.get(target).cloned() {
            Some(extractor) => {
                self.extractors.insert(alias.to_string(), extractor);
                true
            }
            None => false,
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.extractors.contains_key(field)
    }

    /// Registered field names, sorted.
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the extractor of every requested field over `text`.
    ///
    /// Only successfully recognized fields appear in the result.
    pub fn extract(&self, text: &str, fields: &[String]) -> ExtractedData {
        let mut extracted = ExtractedData::new();
        if text.trim().is_empty() {
            return extracted;
        }
        for field in fields {
            if let Some(extractor) = self.extractors.get(field)
                && let Some(value) = extractor.extract(text)
            {
                extracted.insert(field.clone(), value);
            }
        }
        extracted
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Whole-word (or whole-phrase) containment on an already-lowercased haystack.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(phrase) {
        let begin = start + pos;
        let end = begin + phrase.len();
        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = begin + phrase.chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Lowercased text with surrounding whitespace and punctuation removed.
fn normalized(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_lowercase()
}

/// The message is nothing but an integer ("35", "7.").
fn lone_integer(text: &str) -> Option<i64> {
    normalized(text).parse::<i64>().ok()
}

fn plausible(field: &str, value: f64, min: f64, max: f64) -> Option<f64> {
    if (min..=max).contains(&value) {
        Some(value)
    } else {
        debug!(field, value, "Rejected implausible extracted value");
        None
    }
}

// ── Name ────────────────────────────────────────────────────────────

static NAME_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:mi chiamo|my name is|my name's|il mio nome è|il mio nome e'|call me|chiamami)\s+([\p{L}][\p{L}'\-]*)",
    )
    .unwrap()
});

static NAME_INTRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:i am|i'm|io sono|sono)\s+([\p{L}][\p{L}'\-]*)").unwrap()
});

/// Words that follow "I'm" / "sono" or stand alone without being a name.
const NAME_STOPWORDS: &[&str] = &[
    "yes", "no", "ok", "okay", "si", "sì", "ciao", "hello", "hi", "hey", "thanks", "grazie",
    "bene", "fine", "good", "great", "tired", "stanco", "stanca", "here", "qui", "not", "non",
    "a", "an", "the", "very", "really", "so", "just", "sure", "happy", "felice", "ready",
    "pronto", "pronta", "sorry", "well", "male", "meglio", "better", "worse", "peggio", "from",
    "di", "da", "in", "at", "un", "una", "going", "trying", "looking", "interested", "new",
    "back", "still", "also", "anche", "molto", "abbastanza", "busy", "sad", "triste",
];

/// Adjectives and nationalities that read like a capitalized name after
/// "I'm" / "sono".
const INTRO_NON_NAMES: &[&str] = &[
    "italian", "italiano", "italiana", "english", "british", "american", "french", "francese",
    "german", "tedesco", "tedesca", "spanish", "spagnolo", "spagnola", "irish", "scottish",
    "canadian", "australian", "european", "vegan", "vegano", "vegana", "vegetarian",
    "vegetariano", "vegetariana", "married", "sposato", "sposata", "single", "divorced",
    "retired", "pensionato", "pensionata", "pregnant", "incinta", "fit", "sporty", "sportivo",
    "sportiva", "overweight", "sovrappeso", "nervous", "worried", "excited", "curious",
    "alright", "okay", "unemployed", "disoccupato", "disoccupata", "student", "studente",
    "studentessa",
];

fn normalize_name(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    if raw.chars().count() < 2 || NAME_STOPWORDS.contains(&lower.as_str()) {
        return None;
    }
    if raw.chars().all(|c| !c.is_uppercase()) {
        let mut chars = raw.chars();
        let first = chars.next()?;
        return Some(first.to_uppercase().chain(chars).collect());
    }
    Some(raw.to_string())
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Extract a first name from "Mi chiamo Francesco", "I'm Ada", or a lone
/// capitalized word.
pub fn extract_first_name(text: &str) -> Option<Value> {
    if let Some(caps) = NAME_PHRASE.captures(text) {
        return normalize_name(&caps[1]).map(Value::String);
    }
    if let Some(caps) = NAME_INTRO.captures(text) {
        let word = &caps[1];
        if starts_uppercase(word) && !INTRO_NON_NAMES.contains(&word.to_lowercase().as_str()) {
            return normalize_name(word).map(Value::String);
        }
    }
    let trimmed = text
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim();
    if !trimmed.is_empty()
        && !trimmed.contains(char::is_whitespace)
        && starts_uppercase(trimmed)
        && trimmed.chars().all(|c| c.is_alphabetic() || c == '\'' || c == '-')
        && !INTRO_NON_NAMES.contains(&trimmed.to_lowercase().as_str())
    {
        return normalize_name(trimmed).map(Value::String);
    }
    None
}

// ── Age ─────────────────────────────────────────────────────────────

static AGE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:anni|years?\s*old|yrs?\s*old|yo|y/o)\b").unwrap()
});

static AGE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:age|aged|età|eta|i am|i'm)\s*(?:is\s*|:\s*|di\s*)?(\d{1,3})(\s*(?:(?:cm|kg|kgs|m|metri|lbs?|chili|kili|ore|hours?|minuti|minutes?|min|giorni|days?|volte|times|figli|kids|children)\b|%|/))?",
    )
    .unwrap()
});

/// Extract an age in years, plausible range [10, 120].
pub fn extract_age(text: &str) -> Option<Value> {
    let mut candidates: Vec<f64> = Vec::new();
    for caps in AGE_UNIT.captures_iter(text) {
        if let Some(v) = parse_decimal(&caps[1]) {
            candidates.push(v);
        }
    }
    for caps in AGE_KEYWORD.captures_iter(text) {
        if caps.get(2).is_some() {
            continue;
        }
        if let Some(v) = parse_decimal(&caps[1]) {
            candidates.push(v);
        }
    }
    if candidates.is_empty()
        && let Some(v) = lone_integer(text)
    {
        candidates.push(v as f64);
    }
    candidates
        .into_iter()
        .find_map(|v| plausible("age", v, 10.0, 120.0))
        .map(|v| json!(v as i64))
}

// ── Height ──────────────────────────────────────────────────────────

static HEIGHT_CM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{2,3}(?:[.,]\d)?)\s*(?:cm|centimetri|centimeters?|centimetres?)\b")
        .unwrap()
});

static HEIGHT_M: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([12][.,]\d{1,2})\s*(?:m|mt|metri|metro|meters?|metres?)\b").unwrap()
});

static HEIGHT_FT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b([4-7])\s*(?:'|ft|feet|foot)\s*(\d{1,2})?\s*(?:"|''|in|inches)?"#)
        .unwrap()
});

static HEIGHT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:alto|alta|altezza|height|tall)\D{0,12}?(\d{3})\b").unwrap()
});

/// Extract a height in whole centimeters, plausible range [100, 250].
pub fn extract_height(text: &str) -> Option<Value> {
    let cm = HEIGHT_CM
        .captures(text)
        .and_then(|c| parse_decimal(&c[1]))
        .or_else(|| {
            HEIGHT_M
                .captures(text)
                .and_then(|c| parse_decimal(&c[1]))
                .map(|m| m * 100.0)
        })
        .or_else(|| {
            HEIGHT_FT.captures(text).and_then(|c| {
                let feet = parse_decimal(&c[1])?;
                let inches = c.get(2).and_then(|m| parse_decimal(m.as_str())).unwrap_or(0.0);
                Some(feet * 30.48 + inches * 2.54)
            })
        })
        .or_else(|| HEIGHT_KEYWORD.captures(text).and_then(|c| parse_decimal(&c[1])))?;

    plausible("height", cm, 100.0, 250.0).map(|v| json!(v.round() as i64))
}

// ── Weight ──────────────────────────────────────────────────────────

static WEIGHT_KG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{2,3}(?:[.,]\d{1,2})?)\s*(?:kg|kgs|kilos?|kilograms?|kilogrammi|chili|chilo)\b",
    )
    .unwrap()
});

static WEIGHT_LB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{2,3}(?:[.,]\d{1,2})?)\s*(?:lbs?|pounds?|libbre)\b").unwrap()
});

static WEIGHT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:peso|pesa|weigh|weighs|weight)\D{0,12}?(\d{2,3}(?:[.,]\d)?)\b").unwrap()
});

/// Extract a body weight in kilograms (one decimal), plausible range [30, 300].
pub fn extract_weight(text: &str) -> Option<Value> {
    let kg = WEIGHT_KG
        .captures(text)
        .and_then(|c| parse_decimal(&c[1]))
        .or_else(|| {
            WEIGHT_LB
                .captures(text)
                .and_then(|c| parse_decimal(&c[1]))
                .map(|lb| lb * 0.453_592)
        })
        .or_else(|| WEIGHT_KEYWORD.captures(text).and_then(|c| parse_decimal(&c[1])))?;

    plausible("weight", kg, 30.0, 300.0).map(|v| json!(round1(v)))
}

// ── Training days ───────────────────────────────────────────────────

static TRAINING_DAYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(?:days?|giorni|times|volte)\b").unwrap()
});

static TRAINING_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(one|two|three|four|five|six|seven|una|uno|due|tre|quattro|cinque|sei|sette)\s+(?:days?|giorni|times|volte)\b",
    )
    .unwrap()
});

const NUMBER_WORDS: &[(&str, i64)] = &[
    ("one", 1), ("una", 1), ("uno", 1), ("two", 2), ("due", 2), ("three", 3), ("tre", 3),
    ("four", 4), ("quattro", 4), ("five", 5), ("cinque", 5), ("six", 6), ("sei", 6),
    ("seven", 7), ("sette", 7),
];

/// Extract weekly training days, plausible range [0, 7]. An explicit count
/// wins over "never" or "every day" elsewhere in the answer.
pub fn extract_training_days(text: &str) -> Option<Value> {
    let lower = text.to_lowercase();
    let counted = TRAINING_DAYS
        .captures(text)
        .and_then(|c| parse_decimal(&c[1]))
        .or_else(|| {
            TRAINING_WORDS.captures(&lower).and_then(|c| {
                NUMBER_WORDS
                    .iter()
                    .find(|(word, _)| *word == &c[1])
                    .map(|(_, n)| *n as f64)
            })
        });
    if let Some(days) = counted {
        return plausible("training_days", days, 0.0, 7.0).map(|v| json!(v as i64));
    }
    if contains_phrase(&lower, "once") {
        return Some(json!(1));
    }
    if contains_phrase(&lower, "twice") {
        return Some(json!(2));
    }
    if ["every day", "daily", "ogni giorno", "tutti i giorni"]
        .iter()
        .any(|p| contains_phrase(&lower, p))
    {
        return Some(json!(7));
    }
    if ["never", "mai", "i don't train", "non mi alleno"]
        .iter()
        .any(|p| contains_phrase(&lower, p))
    {
        return Some(json!(0));
    }
    None
}

// ── Sleep ───────────────────────────────────────────────────────────

static SLEEP_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}(?:[.,]\d)?)\s*(?:hours?|hrs?|ore|h)\b").unwrap()
});

/// Extract nightly sleep in hours, plausible range [2, 14].
pub fn extract_sleep_hours(text: &str) -> Option<Value> {
    let hours = SLEEP_HOURS
        .captures(text)
        .and_then(|c| parse_decimal(&c[1]))?;
    plausible("sleep_hours", hours, 2.0, 14.0).map(|v| json!(round1(v)))
}

// ── Mood ────────────────────────────────────────────────────────────

static MOOD_SCALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(?:/|su|out of)\s*10\b").unwrap()
});

/// Mood keywords in match order; negated forms come before the words
/// they contain.
const MOOD_TABLE: &[(i64, &[&str])] = &[
    (1, &["terrible", "awful", "horrible", "malissimo", "uno schifo", "a pezzi"]),
    (6, &["not bad", "not too bad", "non male", "niente male"]),
    (3, &["not good", "not great", "non bene", "bad", "male", "giù", "down", "tired", "stanco", "stanca"]),
    (9, &["fantastic", "amazing", "great", "excellent", "benissimo", "ottimo", "alla grande"]),
    (7, &["good", "bene", "pretty good", "abbastanza bene"]),
    (5, &["ok", "okay", "so so", "così così", "normale", "fine"]),
];

/// Extract a 1-10 mood score from "7/10" or a mood word.
pub fn extract_mood_score(text: &str) -> Option<Value> {
    if let Some(caps) = MOOD_SCALE.captures(text) {
        let score = parse_decimal(&caps[1])?;
        return plausible("mood_score", score, 1.0, 10.0).map(|v| json!(v as i64));
    }
    if let Some(n) = lone_integer(text) {
        return plausible("mood_score", n as f64, 1.0, 10.0).map(|v| json!(v as i64));
    }
    let lower = text.to_lowercase();
    MOOD_TABLE
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| contains_phrase(&lower, p)))
        .map(|(score, _)| json!(score))
}

// ── Yes / no ────────────────────────────────────────────────────────

/// Set phrases that contain "no" without answering no.
const NEUTRAL_PHRASES: &[&str] = &[
    "no problem", "no worries", "no doubt", "nessun problema",
];
const NO_PHRASES: &[&str] = &[
    "nope", "not yet", "didn't", "did not", "skipped", "non ancora", "non l'ho fatto",
    "saltato", "saltata", "niente",
];
const YES_PHRASES: &[&str] = &[
    "yes", "yeah", "yep", "sì", "si", "done", "fatto", "fatta", "certo", "of course", "i did",
    "trained", "allenato", "allenata",
];

/// A bare "no" opening the answer or one of its clauses.
fn leading_no(lower: &str) -> bool {
    lower
        .split([',', '.', ';', '!', '?'])
        .filter_map(|clause| clause.split_whitespace().next())
        .any(|word| word == "no")
}

/// Extract a yes/no answer. Negative answers win.
pub fn extract_yes_no(text: &str) -> Option<Value> {
    let mut lower = text.to_lowercase();
    for phrase in NEUTRAL_PHRASES {
        lower = lower.replace(phrase, " ");
    }
    if leading_no(&lower) || NO_PHRASES.iter().any(|p| contains_phrase(&lower, p)) {
        return Some(Value::Bool(false));
    }
    if YES_PHRASES.iter().any(|p| contains_phrase(&lower, p)) {
        return Some(Value::Bool(true));
    }
    None
}

// ── Medical notes ───────────────────────────────────────────────────

const NOTHING_TO_REPORT: &[&str] = &[
    "none", "nothing", "no", "nessuno", "nessuna", "niente", "nulla",
];
const NOTHING_TO_REPORT_PHRASES: &[&str] = &[
    "no injuries", "no injury", "no problems", "no issues", "no conditions",
    "nessun problema", "nessun infortunio", "niente di particolare", "nothing relevant",
    "nothing special",
];

/// Extract medical notes: `"none"` for explicit negatives, otherwise the
/// free-text description (at least three words).
pub fn extract_medical_notes(text: &str) -> Option<Value> {
    let norm = normalized(text);
    let lower = text.to_lowercase();
    if NOTHING_TO_REPORT.contains(&norm.as_str())
        || NOTHING_TO_REPORT_PHRASES
            .iter()
            .any(|p| contains_phrase(&lower, p))
    {
        return Some(json!("none"));
    }
    FreeTextExtractor::new(3).extract(text)
}

// ── Generic extractors ──────────────────────────────────────────────

/// Maps keyword phrases to a categorical value; first matching row wins.
pub struct KeywordExtractor {
    table: &'static [(&'static str, &'static [&'static str])],
}

impl KeywordExtractor {
    pub fn new(table: &'static [(&'static str, &'static [&'static str])]) -> Self {
        Self { table }
    }
}

impl FieldExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> Option<Value> {
        let lower = text.to_lowercase();
        self.table
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| contains_phrase(&lower, p)))
            .map(|(value, _)| json!(value))
    }
}

/// Accepts the whole answer as text once it is long enough to be meaningful.
pub struct FreeTextExtractor {
    min_words: usize,
}

impl FreeTextExtractor {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }
}

impl FieldExtractor for FreeTextExtractor {
    fn extract(&self, text: &str) -> Option<Value> {
        let trimmed = text.trim();
        if trimmed.split_whitespace().count() >= self.min_words {
            Some(Value::String(trimmed.to_string()))
        } else {
            None
        }
    }
}

const GOAL_TABLE: &[(&str, &[&str])] = &[
    (
        "weight_loss",
        &["lose weight", "losing weight", "weight loss", "slim down", "fat loss", "burn fat",
          "dimagrire", "perdere peso", "dimagrimento"],
    ),
    (
        "muscle_gain",
        &["build muscle", "gain muscle", "muscle", "muscles", "bulk", "massa", "muscoli",
          "tonificare", "tone up", "get stronger", "stronger", "forza"],
    ),
    (
        "endurance",
        &["run", "running", "marathon", "endurance", "stamina", "correre", "resistenza",
          "maratona"],
    ),
    (
        "health",
        &["health", "healthy", "healthier", "salute", "stare bene", "feel better",
          "sentirmi meglio"],
    ),
    ("stress", &["stress", "relax", "anxiety", "calm", "ansia", "rilassarmi"]),
];

const ACTIVITY_TABLE: &[(&str, &[&str])] = &[
    (
        "sedentary",
        &["sedentary", "sedentario", "sedentaria", "desk job", "sit all day", "seduto",
          "seduta", "barely move"],
    ),
    (
        "light",
        &["not much", "not very", "a little", "poco", "rarely", "raramente", "lightly"],
    ),
    (
        "active",
        &["very active", "molto attivo", "molto attiva", "athlete", "every day", "ogni giorno",
          "tutti i giorni", "intense"],
    ),
    (
        "moderate",
        &["moderately", "moderate", "moderato", "moderata", "a few times", "sometimes",
          "a volte", "qualche volta", "walk", "cammino", "active", "attivo", "attiva"],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn name_from_italian_phrase() {
        assert_eq!(extract_first_name("Mi chiamo Francesco"), Some(json!("Francesco")));
        assert_eq!(extract_first_name("ciao, mi chiamo giulia!"), Some(json!("Giulia")));
    }

    #[test]
    fn name_from_english_phrases() {
        assert_eq!(extract_first_name("Hi, my name is Ada"), Some(json!("Ada")));
        assert_eq!(extract_first_name("I'm Marco and I want to get fit"), Some(json!("Marco")));
        assert_eq!(extract_first_name("Luca"), Some(json!("Luca")));
    }

    #[test]
    fn name_rejects_non_names() {
        assert_eq!(extract_first_name("I'm tired today"), None);
        assert_eq!(extract_first_name("I'm Tired"), None);
        assert_eq!(extract_first_name("Yes"), None);
        assert_eq!(extract_first_name("sono stanco"), None);
        assert_eq!(extract_first_name("I am 30 years old"), None);
        assert_eq!(extract_first_name("I'm Italian"), None);
        assert_eq!(extract_first_name("Sono Vegana"), None);
        assert_eq!(extract_first_name("Married"), None);
    }

    #[test]
    fn age_patterns() {
        assert_eq!(extract_age("ho 34 anni"), Some(json!(34)));
        assert_eq!(extract_age("I'm 29 years old"), Some(json!(29)));
        assert_eq!(extract_age("age: 41"), Some(json!(41)));
        assert_eq!(extract_age("52"), Some(json!(52)));
    }

    #[test]
    fn age_rejects_implausible_and_units() {
        assert_eq!(extract_age("I am 250 years old"), None);
        assert_eq!(extract_age("I'm 5 years old"), None);
        assert_eq!(extract_age("I am 180 cm tall"), None);
        assert_eq!(extract_age("I'm 75 kg"), None);
    }

    #[test]
    fn age_ignores_words_starting_like_units() {
        assert_eq!(extract_age("I'm 28 mostly fit, 2 kids"), Some(json!(28)));
        assert_eq!(extract_age("I am 35 married with 2 kids"), Some(json!(35)));
        assert_eq!(extract_age("I'm 40 my goal is 75 kg"), Some(json!(40)));
        assert_eq!(extract_age("I'm 30% body fat"), None);
    }

    #[test]
    fn height_units() {
        assert_eq!(extract_height("sono alto 182 cm"), Some(json!(182)));
        assert_eq!(extract_height("1,75 m"), Some(json!(175)));
        assert_eq!(extract_height("I'm 1.68m"), Some(json!(168)));
        assert_eq!(extract_height("5'11\""), Some(json!(180)));
        assert_eq!(extract_height("height 170"), Some(json!(170)));
        assert_eq!(extract_height("900 cm"), None);
    }

    #[test]
    fn weight_units() {
        assert_eq!(extract_weight("peso 72 kg"), Some(json!(72.0)));
        assert_eq!(extract_weight("about 80,5 chili"), Some(json!(80.5)));
        assert_eq!(extract_weight("165 lbs"), Some(json!(74.8)));
        assert_eq!(extract_weight("my weight is 68"), Some(json!(68.0)));
        assert_eq!(extract_weight("900 kg"), None);
    }

    #[test]
    fn keyword_tables() {
        let goal = KeywordExtractor::new(GOAL_TABLE);
        assert_eq!(goal.extract("vorrei dimagrire un po'"), Some(json!("weight_loss")));
        assert_eq!(goal.extract("I want to build muscle"), Some(json!("muscle_gain")));
        assert_eq!(goal.extract("nothing in particular"), None);

        let activity = KeywordExtractor::new(ACTIVITY_TABLE);
        assert_eq!(activity.extract("I have a desk job"), Some(json!("sedentary")));
        assert_eq!(activity.extract("not very active honestly"), Some(json!("light")));
        assert_eq!(activity.extract("sono molto attivo"), Some(json!("active")));
        assert_eq!(activity.extract("I walk a lot"), Some(json!("moderate")));
    }

    #[test]
    fn training_days_patterns() {
        assert_eq!(extract_training_days("3 days a week"), Some(json!(3)));
        assert_eq!(extract_training_days("due volte a settimana"), Some(json!(2)));
        assert_eq!(extract_training_days("every day"), Some(json!(7)));
        assert_eq!(extract_training_days("never"), Some(json!(0)));
        assert_eq!(extract_training_days("12 days"), None);
        assert_eq!(extract_training_days("never more than 2 days"), Some(json!(2)));
        assert_eq!(extract_training_days("once a week"), Some(json!(1)));
    }

    #[test]
    fn sleep_and_mood() {
        assert_eq!(extract_sleep_hours("dormo 7 ore"), Some(json!(7.0)));
        assert_eq!(extract_sleep_hours("about 6.5 hours"), Some(json!(6.5)));
        assert_eq!(extract_sleep_hours("20 hours"), None);

        assert_eq!(extract_mood_score("8/10"), Some(json!(8)));
        assert_eq!(extract_mood_score("7"), Some(json!(7)));
        assert_eq!(extract_mood_score("not great today"), Some(json!(3)));
        assert_eq!(extract_mood_score("great!"), Some(json!(9)));
        assert_eq!(extract_mood_score("not bad"), Some(json!(6)));
        assert_eq!(extract_mood_score("15/10"), None);
    }

    #[test]
    fn yes_no_prefers_negative() {
        assert_eq!(extract_yes_no("yes, done"), Some(json!(true)));
        assert_eq!(extract_yes_no("not yet"), Some(json!(false)));
        assert_eq!(extract_yes_no("maybe later"), None);
        assert_eq!(extract_yes_no("No, not today"), Some(json!(false)));
        assert_eq!(extract_yes_no("I was tired. no, I skipped it"), Some(json!(false)));
    }

    #[test]
    fn yes_no_ignores_set_phrases() {
        assert_eq!(extract_yes_no("no problem, I did it"), Some(json!(true)));
        assert_eq!(extract_yes_no("no worries, done"), Some(json!(true)));
        assert_eq!(extract_yes_no("I have no idea"), None);
    }

    #[test]
    fn medical_notes() {
        assert_eq!(extract_medical_notes("None."), Some(json!("none")));
        assert_eq!(extract_medical_notes("nessun problema"), Some(json!("none")));
        assert_eq!(
            extract_medical_notes("bad left knee from skiing"),
            Some(json!("bad left knee from skiing"))
        );
        assert_eq!(extract_medical_notes("knee"), None);
    }

    #[test]
    fn registry_returns_only_recognized_fields() {
        let registry = ExtractorRegistry::with_defaults();
        let out = registry.extract(
            "Mi chiamo Francesco e ho 34 anni",
            &fields(&["first_name", "age", "weight"]),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out["first_name"], json!("Francesco"));
        assert_eq!(out["age"], json!(34));
    }

    #[test]
    fn registry_empty_text_extracts_nothing() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.extract("   ", &fields(&["first_name", "age"])).is_empty());
    }

    #[test]
    fn registry_aliases_and_custom_extractors() {
        let mut registry = ExtractorRegistry::with_defaults();
        let out = registry.extract("my name is Ada", &fields(&["name"]));
        assert_eq!(out["name"], json!("Ada"));

        assert!(!registry.alias("nickname", "unknown_field"));
        registry.register(
            "favorite_sport",
            Arc::new(|text: &str| text.to_lowercase().contains("tennis").then(|| json!("tennis"))),
        );
        assert!(registry.has("favorite_sport"));
        let out = registry.extract("I love Tennis", &fields(&["favorite_sport"]));
        assert_eq!(out["favorite_sport"], json!("tennis"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let registry = ExtractorRegistry::with_defaults();
        let wanted = fields(&["first_name", "age", "height", "weight"]);
        let text = "I'm Ada, 31 years old, 1.70 m and 60 kg";
        assert_eq!(registry.extract(text, &wanted), registry.extract(text, &wanted));
    }
}
