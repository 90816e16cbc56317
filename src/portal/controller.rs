use super::categories::{CategoryError, CategoryRegistry};
use super::form::{FormState, Institution, ProjectType};
use super::submission::{
    interpret, now_timestamp, Submission, SubmissionFailure, SubmissionReceipt,
};
use crate::files::{AttachedFile, FileFilter, FileStatus};
use crate::service::{ServiceError, UploadRequest, UploadResponse, UploadService};
use crate::wizard::{Wizard, WizardError, WizardStep};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Institution,
    ProjectType,
    Form,
    ExistingProject,
    Confirmation,
}

impl WizardStep for WorkflowStep {
    fn initial() -> Self {
        WorkflowStep::Institution
    }

    fn allows(from: Self, to: Self) -> bool {
        use WorkflowStep::*;
        matches!(
            (from, to),
            (Institution, ProjectType)
                | (ProjectType, Form)
                | (ProjectType, ExistingProject)
                | (ProjectType, Institution)
                | (Form, ProjectType)
                | (ExistingProject, ProjectType)
                | (Form, Confirmation)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortalError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Submission(#[from] SubmissionFailure),
}

#[derive(Debug, Clone)]
pub struct PortalData {
    pub institution: Option<Institution>,
    pub project_type: Option<ProjectType>,
    pub form: FormState,
    pub categories: CategoryRegistry,
    pub receipt: Option<SubmissionReceipt>,
}

/// Drives the document portal: institution, project type, form, confirmation.
#[derive(Debug, Clone)]
pub struct PortalController {
    wizard: Wizard<WorkflowStep, PortalData>,
    filter: FileFilter,
    default_institution: Institution,
}

impl Default for PortalController {
    fn default() -> Self {
        Self::new(
            CategoryRegistry::default(),
            FileFilter::default(),
            Institution::University,
        )
    }
}

impl PortalController {
    pub fn new(
        categories: CategoryRegistry,
        filter: FileFilter,
        default_institution: Institution,
    ) -> Self {
        Self {
            wizard: Wizard::new(PortalData {
                institution: None,
                project_type: None,
                form: FormState::default(),
                categories,
                receipt: None,
            }),
            filter,
            default_institution,
        }
    }

    pub fn step(&self) -> WorkflowStep {
        self.wizard.step()
    }

    pub fn institution(&self) -> Option<Institution> {
        self.wizard.payload().institution
    }

    pub fn project_type(&self) -> Option<ProjectType> {
        self.wizard.payload().project_type
    }

    pub fn form(&self) -> &FormState {
        &self.wizard.payload().form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.wizard.payload_mut().form
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.wizard.payload().categories
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    pub fn errors(&self) -> &[String] {
        self.wizard.errors()
    }

    pub fn warnings(&self) -> &[String] {
        self.wizard.warnings()
    }

    pub fn is_submitting(&self) -> bool {
        self.wizard.is_in_flight()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.wizard.payload().receipt.as_ref()
    }

    /// Picking an institution clears any project type chosen before.
    pub fn select_institution(&mut self, institution: Institution) -> Result<(), PortalError> {
        self.wizard.require_step(WorkflowStep::Institution)?;
        self.wizard.transition(WorkflowStep::ProjectType)?;
        let data = self.wizard.payload_mut();
        data.institution = Some(institution);
        data.project_type = None;
        Ok(())
    }

    pub fn select_project_type(&mut self, project_type: ProjectType) -> Result<(), PortalError> {
        self.wizard.require_step(WorkflowStep::ProjectType)?;
        let next = match project_type {
            ProjectType::New => WorkflowStep::Form,
            ProjectType::Existing => WorkflowStep::ExistingProject,
        };
        self.wizard.transition(next)?;
        self.wizard.payload_mut().project_type = Some(project_type);
        Ok(())
    }

    /// Only the form and the existing-project page lead back to the project type.
    pub fn back_to_project_type(&mut self) -> Result<(), PortalError> {
        self.ensure_idle()?;
        match self.step() {
            WorkflowStep::Form | WorkflowStep::ExistingProject => {}
            from => {
                return Err(WizardError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("{:?}", WorkflowStep::ProjectType),
                }
                .into())
            }
        }
        self.wizard.transition(WorkflowStep::ProjectType)?;
        self.wizard.payload_mut().project_type = None;
        Ok(())
    }

    pub fn back_to_institution(&mut self) -> Result<(), PortalError> {
        self.ensure_idle()?;
        self.wizard.require_step(WorkflowStep::ProjectType)?;
        self.wizard.transition(WorkflowStep::Institution)?;
        let data = self.wizard.payload_mut();
        data.institution = None;
        data.project_type = None;
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.wizard.is_in_flight() {
            Err(WizardError::Busy)
        } else {
            Ok(())
        }
    }

    pub fn add_files(
        &mut self,
        category: &str,
        files: Vec<AttachedFile>,
    ) -> Result<Vec<FileStatus>, PortalError> {
        let filter = &self.filter;
        let statuses = self
            .wizard
            .payload_mut()
            .categories
            .add_files(category, files, filter)?;
        Ok(statuses)
    }

    pub fn add_folder(
        &mut self,
        category: &str,
        folder: &Path,
    ) -> Result<Vec<FileStatus>, PortalError> {
        tracing::info!(category, folder = %folder.display(), "attaching folder");
        let files = self.filter.collect_folder(folder);
        self.add_files(category, files)
    }

    pub fn remove_file(&mut self, category: &str, index: usize) -> Result<AttachedFile, PortalError> {
        Ok(self
            .wizard
            .payload_mut()
            .categories
            .remove_file(category, index)?)
    }

    /// Validates the form and marks the submission as running.
    ///
    /// Validation failures replace the error list and leave the portal idle, so nothing is sent.
    pub fn begin_submit(&mut self) -> Result<UploadRequest, PortalError> {
        self.wizard.require_step(WorkflowStep::Form)?;
        self.ensure_idle()?;

        let data = self.wizard.payload();
        let submission = Submission {
            form: &data.form,
            categories: &data.categories,
            institution: data.institution.unwrap_or(self.default_institution),
            project_type: data.project_type,
        };

        match submission.prepare(now_timestamp()) {
            Ok(request) => {
                tracing::info!(
                    email = %request.email,
                    title = %request.project_title,
                    institution = request.institution.as_str(),
                    project_type = ?request.project_type,
                    categories = data.categories.iter().count(),
                    total_files = request.files.len(),
                    "starting form submission"
                );
                self.wizard.begin_operation()?;
                self.wizard.clear_messages();
                Ok(request)
            }
            Err(failure) => {
                self.wizard
                    .set_messages(failure.messages(), failure.warnings());
                Err(failure.into())
            }
        }
    }

    /// Applies the upload outcome. The submitting flag is cleared on every path.
    pub fn complete_submit(
        &mut self,
        outcome: Result<UploadResponse, ServiceError>,
    ) -> Result<(), PortalError> {
        self.wizard.finish_operation();
        let result = interpret(outcome);
        tracing::info!("form submission finished");

        match result {
            Ok(receipt) => {
                self.wizard.transition(WorkflowStep::Confirmation)?;
                self.wizard.clear_messages();
                self.wizard.payload_mut().receipt = Some(receipt);
                Ok(())
            }
            Err(failure) => {
                self.wizard.set_messages(failure.messages(), Vec::new());
                Err(failure.into())
            }
        }
    }

    pub async fn submit(&mut self, service: &dyn UploadService) -> Result<(), PortalError> {
        let request = self.begin_submit()?;
        let outcome = service.upload(&request).await;
        self.complete_submit(outcome)
    }

    /// Starts another upload after a confirmation, keeping the category definitions.
    pub fn new_upload(&mut self) -> Result<(), PortalError> {
        self.wizard.require_step(WorkflowStep::Confirmation)?;
        let mut categories = self.wizard.payload().categories.clone();
        categories.clear_files();
        self.wizard.reset_to(
            WorkflowStep::ProjectType,
            PortalData {
                institution: Some(self.default_institution),
                project_type: None,
                form: FormState::default(),
                categories,
                receipt: None,
            },
        )?;
        Ok(())
    }
}
