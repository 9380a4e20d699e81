//! Question selection, rendering and tone adjustment.

pub mod generator;
pub mod responses;
pub mod selector;
pub mod tone;

pub use generator::{QuestionGenerator, field_label, join_labels};
pub use responses::{APOLOGY, ResponseComposer};
pub use selector::{
    Candidate, CandidateKind, QuestionSelector, QuestionType, SelectionInput, critical_fields,
};
pub use tone::{ToneAdjuster, ToneContext};
