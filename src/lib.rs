//! Coach Assist: checklist-driven coaching conversations.

/// `as_str()` and `Display` for a fieldless enum from a variant → label list.
macro_rules! impl_label {
    ($ty:ty { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod checklist;
pub mod config;
pub mod error;
pub mod flow;
pub mod knowledge;
pub mod llm;
pub mod orchestrator;
pub mod personality;
pub mod questions;
pub mod routes;
pub mod session;
pub mod store;
pub mod style;
