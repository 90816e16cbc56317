use super::ticker::{StatusTicker, EXTRACTION_MESSAGES, TICK_PERIOD};
use super::types::{ExtractedStudyData, FlagField, ListField, TextField};
use crate::files::{AttachedFile, FileFilter, FileStatus};
use crate::service::{ConceptService, ExtractRequest, ServiceError};
use crate::wizard::{Wizard, WizardError, WizardStep};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::runtime::Handle;

/// File types the extraction service can read.
pub const INPUT_EXTENSIONS: [&str; 4] = ["pdf", "docx", "doc", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptStep {
    Input,
    Review,
    Result,
}

impl WizardStep for ConceptStep {
    fn initial() -> Self {
        ConceptStep::Input
    }

    fn allows(from: Self, to: Self) -> bool {
        use ConceptStep::*;
        matches!(
            (from, to),
            (Input, Review) | (Review, Input) | (Review, Result) | (Result, Review)
        )
    }
}

#[derive(Debug, Error)]
pub enum ConceptError {
    #[error("Please upload a file or enter text.")]
    EmptyInput,
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("Analysis failed: {}", .0.detail())]
    Extraction(#[source] ServiceError),
    #[error("Generation failed: {}", .0.detail())]
    Generation(#[source] ServiceError),
    #[error("Download failed: {}", .0.detail())]
    Export(#[source] ServiceError),
    #[error("no input file at position {0}")]
    NoSuchFile(usize),
    #[error("Could not save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ConceptData {
    pub files: Vec<AttachedFile>,
    pub manual_text: String,
    pub extracted: Option<ExtractedStudyData>,
    pub markdown: Option<String>,
    pub saved_to: Option<PathBuf>,
}

/// Drives the concept generator: input, review of the extracted data, generated result.
#[derive(Debug)]
pub struct ConceptWizard {
    wizard: Wizard<ConceptStep, ConceptData>,
    filter: FileFilter,
    ticker: Option<StatusTicker>,
}

impl Default for ConceptWizard {
    fn default() -> Self {
        Self::new(FileFilter::default())
    }
}

impl ConceptWizard {
    /// Only the size limit and ignore patterns of `portal_filter` are kept.
    pub fn new(portal_filter: FileFilter) -> Self {
        Self {
            wizard: Wizard::default(),
            filter: portal_filter.with_extensions(&INPUT_EXTENSIONS),
            ticker: None,
        }
    }

    pub fn step(&self) -> ConceptStep {
        self.wizard.step()
    }

    pub fn errors(&self) -> &[String] {
        self.wizard.errors()
    }

    pub fn is_busy(&self) -> bool {
        self.wizard.is_in_flight()
    }

    pub fn files(&self) -> &[AttachedFile] {
        &self.wizard.payload().files
    }

    pub fn manual_text(&self) -> &str {
        &self.wizard.payload().manual_text
    }

    pub fn manual_text_mut(&mut self) -> &mut String {
        &mut self.wizard.payload_mut().manual_text
    }

    pub fn data(&self) -> Option<&ExtractedStudyData> {
        self.wizard.payload().extracted.as_ref()
    }

    pub fn markdown(&self) -> Option<&str> {
        self.wizard.payload().markdown.as_deref()
    }

    pub fn saved_to(&self) -> Option<&Path> {
        self.wizard.payload().saved_to.as_deref()
    }

    /// Current ticker message while an extraction runs.
    pub fn status_message(&self) -> Option<&'static str> {
        self.ticker.as_ref().map(|t| t.message())
    }

    /// Replaces the selected input files with the ones the filter accepts.
    pub fn set_files(&mut self, files: Vec<AttachedFile>) -> Vec<FileStatus> {
        let (accepted, statuses) = self.filter.partition(files);
        self.wizard.payload_mut().files = accepted;
        statuses
    }

    pub fn remove_file(&mut self, index: usize) -> Result<AttachedFile, ConceptError> {
        let files = &mut self.wizard.payload_mut().files;
        if index >= files.len() {
            return Err(ConceptError::NoSuchFile(index));
        }
        Ok(files.remove(index))
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.wizard.is_in_flight() {
            Err(WizardError::Busy)
        } else {
            Ok(())
        }
    }

    /// Checks that there is something to analyse and marks the extraction as running.
    pub fn begin_extract(&mut self) -> Result<ExtractRequest, ConceptError> {
        self.wizard.require_step(ConceptStep::Input)?;
        self.ensure_idle()?;

        let data = self.wizard.payload();
        if data.files.is_empty() && data.manual_text.trim().is_empty() {
            let err = ConceptError::EmptyInput;
            self.wizard.set_error(err.to_string());
            return Err(err);
        }

        let request = ExtractRequest {
            files: data.files.clone(),
            manual_text: Some(data.manual_text.clone()).filter(|t| !t.trim().is_empty()),
        };

        self.wizard.begin_operation()?;
        self.wizard.clear_messages();
        if let Ok(handle) = Handle::try_current() {
            self.ticker = Some(StatusTicker::start(
                &handle,
                &EXTRACTION_MESSAGES,
                TICK_PERIOD,
            ));
        }
        tracing::info!(
            files = request.files.len(),
            has_text = request.manual_text.is_some(),
            "starting extraction"
        );
        Ok(request)
    }

    pub fn complete_extract(
        &mut self,
        outcome: Result<ExtractedStudyData, ServiceError>,
    ) -> Result<(), ConceptError> {
        self.wizard.finish_operation();
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }

        match outcome {
            Ok(extracted) => {
                tracing::info!(title = %extracted.study_title, "extraction succeeded");
                self.wizard.require_step(ConceptStep::Input)?;
                self.wizard.transition(ConceptStep::Review)?;
                self.wizard.clear_messages();
                let data = self.wizard.payload_mut();
                data.extracted = Some(extracted);
                data.markdown = None;
                data.saved_to = None;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = ?err, "extraction failed");
                let err = ConceptError::Extraction(err);
                self.wizard.set_error(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn extract(&mut self, service: &dyn ConceptService) -> Result<(), ConceptError> {
        let request = self.begin_extract()?;
        let outcome = service.extract(&request).await;
        self.complete_extract(outcome)
    }

    fn data_mut(&mut self) -> Result<&mut ExtractedStudyData, ConceptError> {
        self.wizard.require_step(ConceptStep::Review)?;
        self.wizard
            .payload_mut()
            .extracted
            .as_mut()
            .ok_or(ConceptError::Wizard(WizardError::MissingData(
                "no extracted study data",
            )))
    }

    pub fn set_text(&mut self, field: TextField, value: &str) -> Result<(), ConceptError> {
        self.data_mut()?.set_text(field, value);
        Ok(())
    }

    /// Re-splits comma-separated text into the list on every edit.
    pub fn set_list_text(&mut self, field: ListField, text: &str) -> Result<(), ConceptError> {
        self.data_mut()?.set_list_text(field, text);
        Ok(())
    }

    pub fn set_flag(&mut self, field: FlagField, value: bool) -> Result<(), ConceptError> {
        self.data_mut()?.set_flag(field, value);
        Ok(())
    }

    /// Review goes back to input, result goes back to review.
    pub fn back(&mut self) -> Result<(), ConceptError> {
        self.ensure_idle()?;
        let previous = match self.step() {
            ConceptStep::Input => ConceptStep::Input,
            ConceptStep::Review => ConceptStep::Input,
            ConceptStep::Result => ConceptStep::Review,
        };
        self.wizard.transition(previous)?;
        self.wizard.clear_messages();
        Ok(())
    }

    pub fn begin_generate(&mut self) -> Result<ExtractedStudyData, ConceptError> {
        self.wizard.require_step(ConceptStep::Review)?;
        self.ensure_idle()?;
        let data = self
            .data()
            .cloned()
            .ok_or(WizardError::MissingData("no extracted study data"))?;
        self.wizard.begin_operation()?;
        self.wizard.clear_messages();
        tracing::info!(title = %data.study_title, "generating concept");
        Ok(data)
    }

    /// Failures leave the wizard on review with the error shown.
    pub fn complete_generate(
        &mut self,
        outcome: Result<String, ServiceError>,
    ) -> Result<(), ConceptError> {
        self.wizard.finish_operation();
        match outcome {
            Ok(markdown) => {
                tracing::info!(length = markdown.len(), "concept generated");
                self.wizard.require_step(ConceptStep::Review)?;
                self.wizard.transition(ConceptStep::Result)?;
                let data = self.wizard.payload_mut();
                data.markdown = Some(markdown);
                data.saved_to = None;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = ?err, "generation failed");
                let err = ConceptError::Generation(err);
                self.wizard.set_error(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn generate(&mut self, service: &dyn ConceptService) -> Result<(), ConceptError> {
        let data = self.begin_generate()?;
        let outcome = service.generate(&data).await;
        self.complete_generate(outcome)
    }

    pub fn begin_export(&mut self) -> Result<String, ConceptError> {
        self.wizard.require_step(ConceptStep::Result)?;
        self.ensure_idle()?;
        let markdown = self
            .markdown()
            .map(str::to_string)
            .ok_or(WizardError::MissingData("no generated concept"))?;
        self.wizard.begin_operation()?;
        self.wizard.clear_messages();
        Ok(markdown)
    }

    /// Writes the exported document to `destination`. Failures keep the wizard on the result.
    pub fn complete_export(
        &mut self,
        outcome: Result<Vec<u8>, ServiceError>,
        destination: &Path,
    ) -> Result<PathBuf, ConceptError> {
        self.wizard.finish_operation();

        let saved = outcome.map_err(ConceptError::Export).and_then(|bytes| {
            std::fs::write(destination, &bytes).map_err(|source| ConceptError::Save {
                path: destination.to_path_buf(),
                source,
            })
        });

        match saved {
            Ok(()) => {
                tracing::info!(path = %destination.display(), "document saved");
                self.wizard.payload_mut().saved_to = Some(destination.to_path_buf());
                Ok(destination.to_path_buf())
            }
            Err(err) => {
                tracing::error!(error = ?err, "export failed");
                self.wizard.set_error(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn export(
        &mut self,
        service: &dyn ConceptService,
        destination: &Path,
    ) -> Result<PathBuf, ConceptError> {
        let markdown = self.begin_export()?;
        let outcome = service.export_docx(&markdown).await;
        self.complete_export(outcome, destination)
    }

    /// Throws away the session. Refused while a request is still running.
    pub fn reset(&mut self) -> Result<(), ConceptError> {
        self.wizard
            .reset_to(ConceptStep::Input, ConceptData::default())?;
        self.ticker = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubConcept {
        extract_calls: AtomicUsize,
        fail_generate: bool,
        fail_export: bool,
    }

    fn sample() -> ExtractedStudyData {
        ExtractedStudyData {
            study_title: "Sepsis registry".to_string(),
            study_type: "prospective".to_string(),
            data_types: vec!["vital signs".to_string()],
            data_sources: vec!["Orbis".to_string()],
            pseudonymization_usage: true,
            ..Default::default()
        }
    }

    #[async_trait]
    impl ConceptService for StubConcept {
        async fn extract(
            &self,
            _request: &ExtractRequest,
        ) -> Result<ExtractedStudyData, ServiceError> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            Ok(sample())
        }

        async fn generate(&self, data: &ExtractedStudyData) -> Result<String, ServiceError> {
            if self.fail_generate {
                return Err(ServiceError::Status {
                    operation: "Generation",
                    status: 500,
                    message: "model unavailable".to_string(),
                });
            }
            Ok(format!("# {}\n", data.study_title))
        }

        async fn export_docx(&self, markdown: &str) -> Result<Vec<u8>, ServiceError> {
            if self.fail_export {
                return Err(ServiceError::Connection("refused".to_string()));
            }
            Ok(markdown.as_bytes().to_vec())
        }
    }

    async fn in_review(stub: &StubConcept) -> ConceptWizard {
        let mut wizard = ConceptWizard::default();
        wizard.manual_text_mut().push_str("Study protocol text");
        wizard.extract(stub).await.unwrap();
        wizard
    }

    #[tokio::test]
    async fn empty_input_is_rejected_locally() {
        let stub = StubConcept::default();
        let mut wizard = ConceptWizard::default();
        wizard.manual_text_mut().push_str("   ");

        let err = wizard.extract(&stub).await.unwrap_err();

        assert!(matches!(err, ConceptError::EmptyInput));
        assert_eq!(stub.extract_calls.load(Ordering::SeqCst), 0);
        assert_eq!(wizard.step(), ConceptStep::Input);
        assert_eq!(wizard.errors(), [ConceptError::EmptyInput.to_string()]);
    }

    #[tokio::test]
    async fn extraction_moves_to_review_and_stops_ticker() {
        let mut wizard = ConceptWizard::default();
        wizard.set_files(vec![AttachedFile::new("/p/antrag.pdf", 10)]);

        let request = wizard.begin_extract().unwrap();
        assert_eq!(request.files.len(), 1);
        assert_eq!(request.manual_text, None);
        assert!(wizard.is_busy());
        assert_eq!(wizard.status_message(), Some(EXTRACTION_MESSAGES[0]));

        wizard.complete_extract(Ok(sample())).unwrap();
        assert_eq!(wizard.step(), ConceptStep::Review);
        assert_eq!(wizard.status_message(), None);
        assert!(!wizard.is_busy());
        assert_eq!(wizard.data(), Some(&sample()));
    }

    #[tokio::test]
    async fn failed_extraction_stays_on_input() {
        let mut wizard = ConceptWizard::default();
        wizard.manual_text_mut().push_str("text");
        wizard.begin_extract().unwrap();

        let err = wizard
            .complete_extract(Err(ServiceError::Status {
                operation: "Extraction",
                status: 500,
                message: "parser crashed".to_string(),
            }))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Analysis failed: parser crashed"
        );
        assert_eq!(wizard.step(), ConceptStep::Input);
        assert_eq!(wizard.status_message(), None);
        assert_eq!(wizard.manual_text(), "text");
    }

    #[test]
    fn input_filter_only_takes_documents() {
        let mut wizard = ConceptWizard::default();
        let statuses = wizard.set_files(vec![
            AttachedFile::new("/p/a.docx", 1),
            AttachedFile::new("/p/b.png", 1),
        ]);
        assert_eq!(statuses.len(), 2);
        assert_eq!(wizard.files().len(), 1);
        assert!(matches!(wizard.remove_file(5), Err(ConceptError::NoSuchFile(5))));
        assert_eq!(wizard.remove_file(0).unwrap().name, "a.docx");
    }

    #[tokio::test]
    async fn review_edits_update_the_record() {
        let stub = StubConcept::default();
        let mut wizard = in_review(&stub).await;

        wizard
            .set_list_text(ListField::DataTypes, "a, b,  c")
            .unwrap();
        wizard.set_text(TextField::PatientCount, "120").unwrap();
        wizard
            .set_flag(FlagField::ExternalDataSharing, true)
            .unwrap();

        let data = wizard.data().unwrap();
        assert_eq!(data.data_types, vec!["a", "b", "c"]);
        assert_eq!(data.list_text(ListField::DataTypes), "a, b, c");
        assert_eq!(data.patient_count, "120");
        assert!(data.external_data_sharing);
    }

    #[tokio::test]
    async fn generate_then_navigate_back() {
        let stub = StubConcept::default();
        let mut wizard = in_review(&stub).await;

        wizard.generate(&stub).await.unwrap();
        assert_eq!(wizard.step(), ConceptStep::Result);
        assert_eq!(wizard.markdown(), Some("# Sepsis registry\n"));

        wizard.back().unwrap();
        assert_eq!(wizard.step(), ConceptStep::Review);
        wizard.back().unwrap();
        assert_eq!(wizard.step(), ConceptStep::Input);
        assert!(wizard.back().is_err());
    }

    #[tokio::test]
    async fn generation_failure_stays_on_review() {
        let stub = StubConcept {
            fail_generate: true,
            ..Default::default()
        };
        let mut wizard = in_review(&stub).await;

        assert!(wizard.generate(&stub).await.is_err());
        assert_eq!(wizard.step(), ConceptStep::Review);
        assert!(!wizard.is_busy());
        assert_eq!(
            wizard.errors(),
            ["Generation failed: model unavailable".to_string()]
        );
    }

    #[tokio::test]
    async fn export_writes_the_document() {
        let stub = StubConcept::default();
        let mut wizard = in_review(&stub).await;
        wizard.generate(&stub).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(crate::service::EXPORT_FILE_NAME);

        let saved = wizard.export(&stub, &target).await.unwrap();

        assert_eq!(saved, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"# Sepsis registry\n");
        assert_eq!(wizard.saved_to(), Some(target.as_path()));
    }

    #[tokio::test]
    async fn export_failure_stays_on_result() {
        let stub = StubConcept {
            fail_export: true,
            ..Default::default()
        };
        let mut wizard = in_review(&stub).await;
        wizard.generate(&stub).await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = wizard
            .export(&stub, &dir.path().join("out.docx"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConceptError::Export(_)));
        assert_eq!(wizard.step(), ConceptStep::Result);
        assert!(!wizard.is_busy());
        assert_eq!(wizard.errors().len(), 1);
    }

    #[test]
    fn skipping_forward_is_not_possible() {
        let mut wizard = ConceptWizard::default();
        assert!(wizard.begin_generate().is_err());
        assert!(wizard.begin_export().is_err());
        assert!(wizard.set_text(TextField::StudyTitle, "x").is_err());
    }

    #[tokio::test]
    async fn reset_discards_everything() {
        let stub = StubConcept::default();
        let mut wizard = in_review(&stub).await;
        wizard.reset().unwrap();
        assert_eq!(wizard.step(), ConceptStep::Input);
        assert!(wizard.data().is_none());
        assert_eq!(wizard.manual_text(), "");
    }

    #[tokio::test]
    async fn reset_is_refused_while_extracting() {
        let mut wizard = ConceptWizard::default();
        wizard.manual_text_mut().push_str("protocol");
        wizard.begin_extract().unwrap();

        assert!(matches!(
            wizard.reset(),
            Err(ConceptError::Wizard(WizardError::Busy))
        ));
        assert!(wizard.is_busy());
        assert!(matches!(
            wizard.begin_extract(),
            Err(ConceptError::Wizard(WizardError::Busy))
        ));
        assert_eq!(wizard.manual_text(), "protocol");

        wizard.complete_extract(Ok(sample())).unwrap();
        wizard.reset().unwrap();
        assert_eq!(wizard.step(), ConceptStep::Input);
        assert!(wizard.data().is_none());
        assert!(!wizard.is_busy());
    }

    #[test]
    fn late_generation_does_not_store_markdown_off_review() {
        let mut wizard = ConceptWizard::default();
        assert!(wizard.complete_generate(Ok("# stale".to_string())).is_err());
        assert_eq!(wizard.step(), ConceptStep::Input);
        assert_eq!(wizard.markdown(), None);
    }

    #[tokio::test]
    async fn late_extraction_does_not_pull_result_back() {
        let stub = StubConcept::default();
        let mut wizard = in_review(&stub).await;
        wizard.generate(&stub).await.unwrap();

        let stale = ExtractedStudyData {
            study_title: "stale".to_string(),
            ..Default::default()
        };
        assert!(wizard.complete_extract(Ok(stale)).is_err());
        assert_eq!(wizard.step(), ConceptStep::Result);
        assert_eq!(wizard.data().unwrap().study_title, "Sepsis registry");
    }
}
