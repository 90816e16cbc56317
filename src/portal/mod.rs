//! The document upload portal: categories, form validation, submission and step control.

pub mod categories;
pub mod controller;
pub mod form;
pub mod submission;
pub mod validation;

pub use categories::{
    ActiveFlags, CategoryDefinition, CategoryError, CategoryRegistry, FileCategory, Flag,
    Requirement,
};
pub use controller::{PortalController, PortalError, WorkflowStep};
pub use form::{FormState, Institution, ProjectType};
pub use submission::{SubmissionFailure, SubmissionReceipt};
pub use validation::{validate, ValidationReport};
