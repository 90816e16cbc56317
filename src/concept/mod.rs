//! The privacy concept generator: extract study data, let the user review it, generate a
//! concept and export it as a document.

mod controller;
mod ticker;
mod types;

pub use controller::{ConceptData, ConceptError, ConceptStep, ConceptWizard, INPUT_EXTENSIONS};
pub use ticker::{StatusTicker, EXTRACTION_MESSAGES, TICK_PERIOD};
pub use types::{join_list, split_list, ExtractedStudyData, FlagField, ListField, TextField};
