//! Checklist system: the deterministic progress tracker behind every session.
//!
//! A checklist is a hierarchy of phases, tasks and checks. Tasks may depend on
//! other tasks; checks move `pending → in_progress → completed` and at most
//! one check is `in_progress` at a time. Extracted fields land in the session
//! [`Facts`] at each check's context path.

pub mod engine;
pub mod extract;
pub mod facts;
pub mod model;
pub mod templates;

pub use engine::{ChecklistEngine, ChecklistInstance, ExtractedData};
pub use extract::{ExtractorRegistry, FieldExtractor};
pub use facts::Facts;
pub use model::{Check, CheckState, Checklist, Phase, Task};
pub use templates::{BuiltinTemplates, ChecklistType, DirectoryTemplates, TemplateSource};
