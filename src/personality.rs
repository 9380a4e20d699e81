//! Personality classification derived from writing style.
//!
//! A profile only adapts phrasing; it never changes what information a
//! checklist requires. Every dimension is computed from the same
//! [`WritingStyle`] snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::style::{
    ConcernLevel, EmotionalTone, EnergyLevel, Formality, Openness, TechnicalLevel, Verbosity,
    WritingStyle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityType {
    Analytical,
    Emotional,
    Social,
    #[default]
    Practical,
}

impl_label!(PersonalityType {
    Analytical => "analytical",
    Emotional => "emotional",
    Social => "social",
    Practical => "practical",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationPreference {
    Direct,
    Detailed,
    Supportive,
    #[default]
    Conversational,
}

impl_label!(CommunicationPreference {
    Direct => "direct",
    Detailed => "detailed",
    Supportive => "supportive",
    Conversational => "conversational",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotivationStyle {
    #[default]
    AchievementOriented,
    RelationshipOriented,
    ProcessOriented,
    ReassuranceSeeking,
}

impl_label!(MotivationStyle {
    AchievementOriented => "achievement_oriented",
    RelationshipOriented => "relationship_oriented",
    ProcessOriented => "process_oriented",
    ReassuranceSeeking => "reassurance_seeking",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SupportLevel {
    #[default]
    Low,
    Moderate,
    High,
}

impl_label!(SupportLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InformationProcessing {
    #[default]
    Sequential,
    BigPicture,
    DetailOriented,
}

impl_label!(InformationProcessing {
    Sequential => "sequential",
    BigPicture => "big_picture",
    DetailOriented => "detail_oriented",
});

/// Communication and motivation preferences inferred from style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PersonalityProfile {
    pub personality_type: PersonalityType,
    pub communication_preference: CommunicationPreference,
    pub motivation_style: MotivationStyle,
    pub support_needs: SupportLevel,
    pub information_processing: InformationProcessing,
}

type Rule<T> = (fn(&WritingStyle) -> bool, T);

fn first_match<T: Copy>(rules: &[Rule<T>], style: &WritingStyle, fallback: T) -> T {
    rules
        .iter()
        .find(|(predicate, _)| predicate(style))
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

fn distressed(style: &WritingStyle) -> bool {
    matches!(
        style.emotional_tone,
        EmotionalTone::Negative | EmotionalTone::Anxious
    )
}

/// Primary type, in priority order analytical, emotional, social.
static TYPE_RULES: &[Rule<PersonalityType>] = &[
    (
        |s| s.technical_level == TechnicalLevel::Advanced,
        PersonalityType::Analytical,
    ),
    (
        |s| {
            s.technical_level == TechnicalLevel::Intermediate
                && s.verbosity == Verbosity::Detailed
                && s.emotional_tone == EmotionalTone::Neutral
        },
        PersonalityType::Analytical,
    ),
    (|s| s.concern_level == ConcernLevel::High, PersonalityType::Emotional),
    (
        |s| distressed(s) && s.openness != Openness::Reserved,
        PersonalityType::Emotional,
    ),
    (
        |s| s.openness == Openness::Open && s.formality == Formality::Casual,
        PersonalityType::Social,
    ),
    (
        |s| s.energy_level == EnergyLevel::High && s.emotional_tone == EmotionalTone::Positive,
        PersonalityType::Social,
    ),
];

static COMMUNICATION_RULES: &[Rule<CommunicationPreference>] = &[
    (
        |s| distressed(s) || s.concern_level == ConcernLevel::High,
        CommunicationPreference::Supportive,
    ),
    (|s| s.verbosity == Verbosity::Brief, CommunicationPreference::Direct),
    (
        |s| s.technical_level == TechnicalLevel::Advanced || s.verbosity == Verbosity::Detailed,
        CommunicationPreference::Detailed,
    ),
];

static MOTIVATION_RULES: &[Rule<MotivationStyle>] = &[
    (
        |s| s.emotional_tone == EmotionalTone::Anxious || s.concern_level == ConcernLevel::High,
        MotivationStyle::ReassuranceSeeking,
    ),
    (
        |s| s.openness == Openness::Open && s.formality != Formality::Formal,
        MotivationStyle::RelationshipOriented,
    ),
    (
        |s| s.technical_level != TechnicalLevel::Basic && s.verbosity == Verbosity::Detailed,
        MotivationStyle::ProcessOriented,
    ),
];

static SUPPORT_RULES: &[Rule<SupportLevel>] = &[
    (
        |s| distressed(s) || s.concern_level == ConcernLevel::High,
        SupportLevel::High,
    ),
    (
        |s| s.concern_level == ConcernLevel::Moderate || s.energy_level == EnergyLevel::Low,
        SupportLevel::Moderate,
    ),
];

static PROCESSING_RULES: &[Rule<InformationProcessing>] = &[
    (
        |s| s.technical_level == TechnicalLevel::Advanced || s.verbosity == Verbosity::Detailed,
        InformationProcessing::DetailOriented,
    ),
    (|s| s.verbosity == Verbosity::Brief, InformationProcessing::BigPicture),
];

/// Maps a [`WritingStyle`] to a [`PersonalityProfile`]. Pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalityMapper;

impl PersonalityMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map(&self, style: &WritingStyle) -> PersonalityProfile {
        let profile = PersonalityProfile {
            personality_type: first_match(TYPE_RULES, style, PersonalityType::Practical),
            communication_preference: first_match(
                COMMUNICATION_RULES,
                style,
                CommunicationPreference::Conversational,
            ),
            motivation_style: first_match(
                MOTIVATION_RULES,
                style,
                MotivationStyle::AchievementOriented,
            ),
            support_needs: first_match(SUPPORT_RULES, style, SupportLevel::Low),
            information_processing: first_match(
                PROCESSING_RULES,
                style,
                InformationProcessing::Sequential,
            ),
        };
        debug!(
            personality = %profile.personality_type,
            communication = %profile.communication_preference,
            support = %profile.support_needs,
            "Personality mapped"
        );
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleAnalyzer;

    fn style() -> WritingStyle {
        WritingStyle::default()
    }

    #[test]
    fn default_style_is_practical() {
        let profile = PersonalityMapper::new().map(&style());
        assert_eq!(profile.personality_type, PersonalityType::Practical);
        assert_eq!(
            profile.communication_preference,
            CommunicationPreference::Conversational
        );
        assert_eq!(profile.support_needs, SupportLevel::Low);
    }

    #[test]
    fn analytical_wins_priority() {
        let s = WritingStyle {
            technical_level: TechnicalLevel::Advanced,
            emotional_tone: EmotionalTone::Anxious,
            openness: Openness::Open,
            formality: Formality::Casual,
            ..style()
        };
        let profile = PersonalityMapper::new().map(&s);
        assert_eq!(profile.personality_type, PersonalityType::Analytical);
        // Other dimensions still see the anxiety.
        assert_eq!(profile.support_needs, SupportLevel::High);
        assert_eq!(profile.motivation_style, MotivationStyle::ReassuranceSeeking);
    }

    #[test]
    fn emotional_before_social() {
        let s = WritingStyle {
            emotional_tone: EmotionalTone::Negative,
            openness: Openness::Open,
            formality: Formality::Casual,
            ..style()
        };
        assert_eq!(
            PersonalityMapper::new().map(&s).personality_type,
            PersonalityType::Emotional
        );

        let reserved = WritingStyle {
            emotional_tone: EmotionalTone::Negative,
            openness: Openness::Reserved,
            ..style()
        };
        assert_eq!(
            PersonalityMapper::new().map(&reserved).personality_type,
            PersonalityType::Practical
        );
    }

    #[test]
    fn social_from_open_casual_or_upbeat() {
        let open = WritingStyle {
            openness: Openness::Open,
            formality: Formality::Casual,
            ..style()
        };
        assert_eq!(PersonalityMapper::new().map(&open).personality_type, PersonalityType::Social);

        let upbeat = WritingStyle {
            energy_level: EnergyLevel::High,
            emotional_tone: EmotionalTone::Positive,
            ..style()
        };
        assert_eq!(
            PersonalityMapper::new().map(&upbeat).personality_type,
            PersonalityType::Social
        );
    }

    #[test]
    fn brief_users_prefer_direct_big_picture() {
        let s = WritingStyle {
            verbosity: Verbosity::Brief,
            ..style()
        };
        let profile = PersonalityMapper::new().map(&s);
        assert_eq!(profile.communication_preference, CommunicationPreference::Direct);
        assert_eq!(profile.information_processing, InformationProcessing::BigPicture);
    }

    #[test]
    fn mapping_is_pure_over_analyzed_text() {
        let analyzer = StyleAnalyzer::new();
        let mapper = PersonalityMapper::new();
        let s = analyzer.analyze("I track my macros and TDEE every day, what protein target?");
        assert_eq!(mapper.map(&s), mapper.map(&s));
        assert_eq!(mapper.map(&s).personality_type, PersonalityType::Analytical);
    }

    #[test]
    fn display_matches_serde() {
        for t in [
            PersonalityType::Analytical,
            PersonalityType::Emotional,
            PersonalityType::Social,
            PersonalityType::Practical,
        ] {
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{t}\""));
        }
        let m = MotivationStyle::ReassuranceSeeking;
        assert_eq!(serde_json::to_string(&m).unwrap(), format!("\"{m}\""));
    }
}
