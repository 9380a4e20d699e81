//! Writing-style value types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Brief,
    #[default]
    Moderate,
    Detailed,
}

impl_label!(Verbosity {
    Brief => "brief",
    Moderate => "moderate",
    Detailed => "detailed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    Positive,
    #[default]
    Neutral,
    Negative,
    Anxious,
}

impl_label!(EmotionalTone {
    Positive => "positive",
    Neutral => "neutral",
    Negative => "negative",
    Anxious => "anxious",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    Casual,
    #[default]
    Neutral,
    Formal,
}

impl_label!(Formality {
    Casual => "casual",
    Neutral => "neutral",
    Formal => "formal",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalLevel {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

impl_label!(TechnicalLevel {
    Basic => "basic",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Openness {
    Reserved,
    #[default]
    Moderate,
    Open,
}

impl_label!(Openness {
    Reserved => "reserved",
    Moderate => "moderate",
    Open => "open",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl_label!(EnergyLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcernLevel {
    #[default]
    Low,
    Moderate,
    High,
}

impl_label!(ConcernLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
});

/// Surface classification of how the user writes.
///
/// Always derived from text, never stored as ground truth. The default is the
/// "moderate/neutral" style returned for empty input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct WritingStyle {
    pub verbosity: Verbosity,
    pub emotional_tone: EmotionalTone,
    pub formality: Formality,
    pub technical_level: TechnicalLevel,
    pub openness: Openness,
    pub energy_level: EnergyLevel,
    pub concern_level: ConcernLevel,
}

impl WritingStyle {
    /// The user seems uneasy; sensitive topics should wait.
    pub fn is_low_comfort(&self) -> bool {
        self.concern_level == ConcernLevel::High || self.emotional_tone == EmotionalTone::Anxious
    }
}
