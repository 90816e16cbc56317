use crate::concept::ExtractedStudyData;
use crate::files::{AttachStatus, FileStatus};
use crate::service::{ServiceError, UploadResponse};
use derivative::Derivative;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};

pub type Outcome<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    Portal,
    Concept,
}

/// Front-end state that is not part of either wizard: pending requests and attach reports.
#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct UiState {
    pub screen: Screen,
    pub file_statuses: Vec<FileStatus>,
    pub show_details: bool,
    pub notice: Option<String>,
    #[derivative(Debug = "ignore")]
    pub upload_receiver: Option<Receiver<Outcome<UploadResponse>>>,
    #[derivative(Debug = "ignore")]
    pub extract_receiver: Option<Receiver<Outcome<ExtractedStudyData>>>,
    #[derivative(Debug = "ignore")]
    pub generate_receiver: Option<Receiver<Outcome<String>>>,
    #[derivative(Debug = "ignore")]
    pub export_receiver: Option<(PathBuf, Receiver<Outcome<Vec<u8>>>)>,
}

impl UiState {
    pub fn clear_reports(&mut self) {
        self.file_statuses.clear();
        self.show_details = false;
        self.notice = None;
    }

    /// Forgets the concept generator's requests; their outcomes are never applied.
    pub fn drop_concept_requests(&mut self) {
        self.extract_receiver = None;
        self.generate_receiver = None;
        self.export_receiver = None;
    }

    pub fn has_pending(&self) -> bool {
        self.upload_receiver.is_some()
            || self.extract_receiver.is_some()
            || self.generate_receiver.is_some()
            || self.export_receiver.is_some()
    }

    pub fn skipped_count(&self) -> usize {
        self.file_statuses
            .iter()
            .filter(|s| matches!(s.status, AttachStatus::Skipped(_)))
            .count()
    }

    pub fn get_status_text(&self) -> String {
        let attached = self.file_statuses.len() - self.skipped_count();
        format!(
            "✅ Attached: {} | ⏩ Skipped: {}",
            attached,
            self.skipped_count()
        )
    }
}

/// Takes the finished outcome out of `slot`, if there is one.
///
/// A dropped sender means the request task died; that is reported as a failure so the wizard
/// leaves its busy state.
pub fn poll<T>(slot: &mut Option<Receiver<Outcome<T>>>) -> Option<Outcome<T>> {
    let receiver = slot.as_ref()?;
    let outcome = match receiver.try_recv() {
        Ok(outcome) => outcome,
        Err(TryRecvError::Empty) => return None,
        Err(TryRecvError::Disconnected) => Err(ServiceError::Other(
            "the request was interrupted".to_string(),
        )),
    };
    *slot = None;
    Some(outcome)
}
