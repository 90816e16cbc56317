mod state;
mod ui;

use crate::concept::ConceptWizard;
use crate::config::PortalConfig;
use crate::files::AttachedFile;
use crate::portal::PortalController;
use crate::service::{ConceptService, PortalClient, UploadService};
use eframe::{egui, App};
pub use state::{poll, Screen, UiState};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

pub struct PortalApp {
    portal: PortalController,
    concept: ConceptWizard,
    client: Arc<PortalClient>,
    runtime: Runtime,
    state: UiState,
}

impl PortalApp {
    pub fn new(config: &PortalConfig) -> anyhow::Result<Self> {
        tracing::info!(api_base = %config.api_base, "initializing privacy portal");
        Ok(Self {
            portal: config.portal()?,
            concept: ConceptWizard::new(config.file_filter()),
            client: Arc::new(config.client()),
            runtime: Runtime::new()?,
            state: UiState::default(),
        })
    }

    pub fn go_home(&mut self) {
        if self.state.screen == Screen::Concept {
            if let Err(e) = self.concept.reset() {
                tracing::warn!(error = %e, "cannot leave the concept generator yet");
                return;
            }
            self.state.drop_concept_requests();
        }
        self.state.clear_reports();
        self.state.screen = Screen::Home;
    }

    fn paths_to_files(paths: &[PathBuf]) -> Vec<AttachedFile> {
        paths
            .iter()
            .filter_map(|path| match AttachedFile::from_path(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot attach file");
                    None
                }
            })
            .collect()
    }

    pub fn attach_files(&mut self, category: &str, paths: &[PathBuf]) {
        let files = Self::paths_to_files(paths);
        match self.portal.add_files(category, files) {
            Ok(statuses) => self.state.file_statuses = statuses,
            Err(e) => self.state.notice = Some(e.to_string()),
        }
    }

    pub fn attach_folder(&mut self, category: &str, folder: &Path) {
        match self.portal.add_folder(category, folder) {
            Ok(statuses) => self.state.file_statuses = statuses,
            Err(e) => self.state.notice = Some(e.to_string()),
        }
    }

    pub fn select_concept_files(&mut self, paths: &[PathBuf]) {
        let files = Self::paths_to_files(paths);
        self.state.file_statuses = self.concept.set_files(files);
    }

    pub fn start_submit(&mut self) {
        let request = match self.portal.begin_submit() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "submission not started");
                return;
            }
        };

        let (sender, receiver) = std_mpsc::channel();
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let outcome = client.upload(&request).await;
            let _ = sender.send(outcome);
        });
        self.state.upload_receiver = Some(receiver);
    }

    pub fn start_extract(&mut self) {
        // the status ticker is spawned on the current runtime
        let _guard = self.runtime.enter();
        let request = match self.concept.begin_extract() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "extraction not started");
                return;
            }
        };

        let (sender, receiver) = std_mpsc::channel();
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let outcome = client.extract(&request).await;
            let _ = sender.send(outcome);
        });
        self.state.extract_receiver = Some(receiver);
    }

    pub fn start_generate(&mut self) {
        let data = match self.concept.begin_generate() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "generation not started");
                return;
            }
        };

        let (sender, receiver) = std_mpsc::channel();
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let outcome = client.generate(&data).await;
            let _ = sender.send(outcome);
        });
        self.state.generate_receiver = Some(receiver);
    }

    pub fn start_export(&mut self, destination: PathBuf) {
        let markdown = match self.concept.begin_export() {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::warn!(error = %e, "export not started");
                return;
            }
        };

        let (sender, receiver) = std_mpsc::channel();
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let outcome = client.export_docx(&markdown).await;
            let _ = sender.send(outcome);
        });
        self.state.export_receiver = Some((destination, receiver));
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        if let Some(outcome) = poll(&mut self.state.upload_receiver) {
            if let Err(e) = self.portal.complete_submit(outcome) {
                tracing::warn!(error = %e, "submission failed");
            }
        }

        if let Some(outcome) = poll(&mut self.state.extract_receiver) {
            match self.concept.complete_extract(outcome) {
                Ok(()) => self.state.notice = Some("Analysis successful!".to_string()),
                Err(e) => tracing::warn!(error = %e, "extraction failed"),
            }
        }

        if let Some(outcome) = poll(&mut self.state.generate_receiver) {
            if let Err(e) = self.concept.complete_generate(outcome) {
                tracing::warn!(error = %e, "generation failed");
            }
        }

        if let Some((destination, receiver)) = self.state.export_receiver.take() {
            let mut slot = Some(receiver);
            match poll(&mut slot) {
                Some(outcome) => match self.concept.complete_export(outcome, &destination) {
                    Ok(path) => {
                        self.state.notice = Some(format!("Saved to {}", path.display()));
                    }
                    Err(e) => tracing::warn!(error = %e, "export failed"),
                },
                None => {
                    if let Some(receiver) = slot {
                        self.state.export_receiver = Some((destination, receiver));
                    }
                }
            }
        }

        if self.state.has_pending() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}

impl App for PortalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
