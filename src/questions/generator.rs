//! Question rendering: template selection per personality, then tone.

use crate::flow::{ConversationState, InteractionStyle};
use crate::personality::{PersonalityProfile, PersonalityType};
use crate::style::WritingStyle;

use super::selector::{Candidate, CandidateKind};
use super::tone::{ToneAdjuster, ToneContext};

/// Phrasings of one topic, one per personality type.
struct Variants {
    topic: &'static str,
    analytical: &'static str,
    emotional: &'static str,
    practical: &'static str,
    social: &'static str,
}

impl Variants {
    fn pick(&self, personality: PersonalityType) -> &'static str {
        match personality {
            PersonalityType::Analytical => self.analytical,
            PersonalityType::Emotional => self.emotional,
            PersonalityType::Practical => self.practical,
            PersonalityType::Social => self.social,
        }
    }
}

static FIELD_PROMPTS: &[Variants] = &[
    Variants {
        topic: "first_name",
        analytical: "What name should I use for you?",
        emotional: "I'd love to get to know you. What's your name?",
        practical: "What's your name?",
        social: "Let's start with introductions. What should I call you?",
    },
    Variants {
        topic: "age",
        analytical: "How old are you? Age helps me calibrate your training load.",
        emotional: "Would you mind telling me how old you are?",
        practical: "How old are you?",
        social: "How old are you, if you don't mind me asking?",
    },
    Variants {
        topic: "height",
        analytical: "What is your height, in cm or feet and inches?",
        emotional: "Could you share how tall you are?",
        practical: "How tall are you?",
        social: "How tall are you?",
    },
    Variants {
        topic: "weight",
        analytical: "What is your current weight, in kg or lbs?",
        emotional: "If you're comfortable sharing, what do you weigh at the moment?",
        practical: "What's your current weight?",
        social: "What do you weigh at the moment, roughly?",
    },
    Variants {
        topic: "goal",
        analytical: "Which outcome matters most: weight loss, muscle gain, endurance or overall health?",
        emotional: "What would make you feel proud a few months from now?",
        practical: "What's your main goal?",
        social: "What are you hoping we achieve together?",
    },
    Variants {
        topic: "motivation",
        analytical: "What is driving this goal right now?",
        emotional: "Why does this goal matter to you?",
        practical: "What's pushing you to start now?",
        social: "What got you thinking about this, and who's cheering you on?",
    },
    Variants {
        topic: "activity_level",
        analytical: "How would you rate your weekly activity: sedentary, light, moderate or very active?",
        emotional: "How does a normal week feel for your body, mostly sitting or on the move?",
        practical: "How active are you day to day?",
        social: "What does a typical week look like for you, activity-wise?",
    },
    Variants {
        topic: "training_days",
        analytical: "How many days per week can you commit to training?",
        emotional: "How many days a week feel realistic for you without stress?",
        practical: "How many days a week can you train?",
        social: "How many days a week could we plan workouts for?",
    },
    Variants {
        topic: "sleep_hours",
        analytical: "How many hours do you sleep on average?",
        emotional: "How has your sleep been, roughly how many hours a night?",
        practical: "How many hours do you sleep?",
        social: "How many hours of sleep do you usually get?",
    },
    Variants {
        topic: "medical_notes",
        analytical: "Are there injuries or medical conditions I should account for?",
        emotional: "Is there anything about your health you'd like me to keep in mind?",
        practical: "Any injuries or health issues I should know about?",
        social: "Anything health-wise I should know before we plan together?",
    },
    Variants {
        topic: "mood_score",
        analytical: "On a scale from 1 to 10, how is your mood today?",
        emotional: "How are you feeling today, from 1 to 10?",
        practical: "Mood today, from 1 to 10?",
        social: "How's your day going, from 1 to 10?",
    },
    Variants {
        topic: "workout_done",
        analytical: "Did you complete today's workout?",
        emotional: "Did you manage to move a bit today?",
        practical: "Workout done today?",
        social: "Did you get your workout in today?",
    },
    Variants {
        topic: "barriers",
        analytical: "What were the main obstacles to your routine?",
        emotional: "What made it hard to keep going lately?",
        practical: "What got in the way?",
        social: "What's been getting in the way lately?",
    },
];

static CONVERSATION_PROMPTS: &[Variants] = &[
    Variants {
        topic: "rapport",
        analytical: "Tell me a bit about your current routine.",
        emotional: "How are you feeling about starting this journey?",
        practical: "What would you like to get out of our sessions?",
        social: "Tell me a little about yourself!",
    },
    Variants {
        topic: "wellbeing",
        analytical: "How has your week been overall?",
        emotional: "How are you doing, really?",
        practical: "How's everything going?",
        social: "How have things been with you lately?",
    },
];

fn lookup(table: &'static [Variants], topic: &str) -> Option<&'static Variants> {
    table.iter().find(|v| v.topic == topic)
}

/// Human-readable label for a field name.
pub fn field_label(field: &str) -> String {
    match field {
        "first_name" | "name" => "first name".to_string(),
        "mood_score" | "mood" => "mood from 1 to 10".to_string(),
        "workout_done" => "whether you trained today".to_string(),
        "training_days" => "training days per week".to_string(),
        "medical_notes" => "injuries or health conditions".to_string(),
        "sleep_hours" | "sleep" => "usual hours of sleep".to_string(),
        other => other.replace('_', " "),
    }
}

/// `a`, `a and b`, `a, b and c`.
pub fn join_labels(labels: &[String]) -> String {
    match labels {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Renders a [`Candidate`] into a personalized question.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionGenerator {
    tone: ToneAdjuster,
}

impl QuestionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the phrasing for `candidate`, then run the tone pipeline.
    pub fn render(
        &self,
        candidate: &Candidate,
        profile: &PersonalityProfile,
        style: &WritingStyle,
        state: &ConversationState,
        interaction: &InteractionStyle,
    ) -> String {
        let raw = self.template(candidate, profile.personality_type);
        let ctx = ToneContext {
            profile,
            style,
            state,
            interaction,
            sensitive: candidate.sensitive,
        };
        self.tone.adjust(&raw, &ctx)
    }

    /// Template selection only, before tone adjustment.
    pub fn template(&self, candidate: &Candidate, personality: PersonalityType) -> String {
        match candidate.kind {
            CandidateKind::Warmup | CandidateKind::Followup => {
                lookup(CONVERSATION_PROMPTS, &candidate.topic)
                    .map(|v| v.pick(personality).to_string())
                    .unwrap_or_else(|| {
                        format!(
                            "Is there anything else on your mind about {}?",
                            candidate.topic.replace('_', " ")
                        )
                    })
            }
            _ => self.check_template(candidate, personality),
        }
    }

    /// A single missing field uses its personality variant on the first ask
    /// and rotates through the check's example questions on re-asks. Several
    /// missing fields use the example questions directly.
    fn check_template(&self, candidate: &Candidate, personality: PersonalityType) -> String {
        let examples = &candidate.example_questions;
        let rotated = |offset: u32| -> Option<String> {
            if examples.is_empty() {
                None
            } else {
                let index = offset as usize % examples.len();
                Some(examples[index].clone())
            }
        };

        match candidate.missing_fields.as_slice() {
            [] => rotated(candidate.attempt).unwrap_or_else(|| "Anything else to add?".into()),
            [field] => {
                let variant = lookup(FIELD_PROMPTS, field).map(|v| v.pick(personality).to_string());
                match (candidate.attempt, variant) {
                    (0, Some(text)) => text,
                    (n, variant) => rotated(n.saturating_sub(1))
                        .or(variant)
                        .unwrap_or_else(|| format!("Could you tell me your {}?", field_label(field))),
                }
            }
            fields => match rotated(candidate.attempt) {
                Some(text) => text,
                None => fields
                    .iter()
                    .map(|f| {
                        lookup(FIELD_PROMPTS, f)
                            .map(|v| v.pick(personality).to_string())
                            .unwrap_or_else(|| format!("Could you tell me your {}?", field_label(f)))
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            },
        }
    }
}
