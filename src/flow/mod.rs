//! Conversation flow: phase, engagement and delivery style for each turn.

pub mod manager;
pub mod state;

pub use manager::{FlowManager, InteractionStyle, Pace, Priority, QuestionStyle, Tone};
pub use state::{ConversationPhase, ConversationState, Engagement};
