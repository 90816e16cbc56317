use super::categories::CategoryRegistry;
use super::form::{FormState, Institution, ProjectType};
use super::validation::{validate, ValidationReport};
use crate::service::{ServiceError, TaggedFile, UploadRequest, UploadResponse};
use thiserror::Error;

pub const NOT_COMPLETED: &str = "The upload was not completed successfully.";
pub const CONNECTION_FAILURE: &str = "Connection error: the connection to the server could not \
     be established. Please check your internet connection.";
pub const GENERIC_FAILURE: &str = "An error occurred during the upload. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Server timestamp, kept verbatim.
    pub timestamp: String,
    pub message: Option<String>,
    pub project_id: Option<String>,
    pub files_uploaded: Option<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionFailure {
    #[error("the form has {} error(s)", .0.errors.len())]
    Invalid(ValidationReport),
    #[error("{0}")]
    Rejected(String),
    #[error("{}", CONNECTION_FAILURE)]
    Connection,
    #[error("{0}")]
    Failed(String),
}

impl SubmissionFailure {
    /// What the form shows for this failure.
    pub fn messages(&self) -> Vec<String> {
        match self {
            SubmissionFailure::Invalid(report) => report.errors.clone(),
            other => vec![other.to_string()],
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        match self {
            SubmissionFailure::Invalid(report) => report.warnings.clone(),
            _ => Vec::new(),
        }
    }
}

/// Everything the coordinator reads from the portal when submitting.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub form: &'a FormState,
    pub categories: &'a CategoryRegistry,
    pub institution: Institution,
    pub project_type: Option<ProjectType>,
}

impl<'a> Submission<'a> {
    /// Validates and, when the form is clean, builds the upload payload.
    pub fn prepare(&self, upload_timestamp: String) -> Result<UploadRequest, SubmissionFailure> {
        let report = validate(self.form, self.categories, &self.form.active_flags());
        if !report.is_valid() {
            tracing::warn!(errors = report.errors.len(), "form validation failed");
            return Err(SubmissionFailure::Invalid(report));
        }

        let files = self
            .categories
            .iter()
            .flat_map(|category| {
                category.files.iter().map(|file| TaggedFile {
                    category: category.key().to_string(),
                    file: file.clone(),
                })
            })
            .collect();

        Ok(UploadRequest {
            email: self.form.email.clone(),
            uploader_name: self.form.uploader_name.clone(),
            project_title: self.form.project_title.clone(),
            project_details: self.form.project_details.clone(),
            institution: self.institution,
            project_type: self.project_type,
            is_prospective_study: self.form.is_prospective_study,
            upload_timestamp,
            files,
        })
    }
}

pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Maps what the upload service returned onto a receipt or a user-facing failure.
pub fn interpret(
    outcome: Result<UploadResponse, ServiceError>,
) -> Result<SubmissionReceipt, SubmissionFailure> {
    match outcome {
        Ok(response) if response.success => {
            tracing::info!(timestamp = %response.timestamp, "upload accepted");
            Ok(SubmissionReceipt {
                timestamp: response.timestamp,
                message: response.message,
                project_id: response.project_id,
                files_uploaded: response.files_uploaded,
            })
        }
        Ok(response) => {
            tracing::warn!(?response, "upload returned success=false");
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| NOT_COMPLETED.to_string());
            Err(SubmissionFailure::Rejected(message))
        }
        Err(err) if err.is_connectivity() => {
            tracing::error!(error = ?err, "upload could not reach the server");
            Err(SubmissionFailure::Connection)
        }
        Err(err) => {
            tracing::error!(error = ?err, "upload failed");
            let message = err.to_string();
            if message.trim().is_empty() {
                Err(SubmissionFailure::Failed(GENERIC_FAILURE.to_string()))
            } else {
                Err(SubmissionFailure::Failed(message))
            }
        }
    }
}
