//! Writing-style inference from surface features of user text.

pub mod analyzer;
pub mod model;

pub use analyzer::{StyleAnalyzer, TextFeatures};
pub use model::{
    ConcernLevel, EmotionalTone, EnergyLevel, Formality, Openness, TechnicalLevel, Verbosity,
    WritingStyle,
};
