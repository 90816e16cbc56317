use super::{PortalApp, Screen};
use crate::concept::{ConceptStep, FlagField, ListField, TextField, INPUT_EXTENSIONS};
use crate::files::AttachStatus;
use crate::portal::{Institution, ProjectType, WorkflowStep};
use crate::service::EXPORT_FILE_NAME;
use crate::utils::file_size::{format_size, total_size};
use eframe::egui::{self, Color32, RichText};
use rfd::FileDialog;

const ACCENT: Color32 = Color32::from_rgb(37, 99, 235);
const ERROR: Color32 = Color32::from_rgb(220, 50, 50);
const WARNING: Color32 = Color32::from_rgb(217, 119, 6);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);
const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);

struct CategoryView {
    key: String,
    label: String,
    required: bool,
    conditional: bool,
    files: Vec<(String, u64)>,
}

fn render_messages(ui: &mut egui::Ui, errors: &[String], warnings: &[String]) {
    if errors.is_empty() && warnings.is_empty() {
        return;
    }
    ui.add_space(10.0);
    ui.group(|ui| {
        for error in errors {
            ui.colored_label(ERROR, format!("⚠ {}", error));
        }
        for warning in warnings {
            ui.colored_label(WARNING, format!("ℹ {}", warning));
        }
    });
}

impl PortalApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                match self.state.screen {
                    Screen::Home => self.render_home(ui),
                    Screen::Portal => self.render_portal(ui),
                    Screen::Concept => self.render_concept(ui, ctx),
                }
                ui.add_space(20.0);
            });
        });
    }

    fn render_home(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Data Protection Portal");
            ui.add_space(5.0);
            ui.label(
                RichText::new("Submit privacy documents or draft a privacy concept")
                    .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
            ui.add_space(30.0);

            let upload = egui::Button::new("📤 Upload documents").min_size(egui::vec2(260.0, 40.0));
            if ui.add(upload).clicked() {
                self.state.screen = Screen::Portal;
            }
            ui.add_space(10.0);
            let concept = egui::Button::new("🪄 Privacy concept generator")
                .min_size(egui::vec2(260.0, 40.0));
            if ui.add(concept).clicked() {
                self.state.screen = Screen::Concept;
            }
        });
    }

    fn render_back_home(&mut self, ui: &mut egui::Ui) {
        if ui.button("⬅ Home").clicked() {
            self.go_home();
        }
        ui.add_space(10.0);
    }

    fn render_portal(&mut self, ui: &mut egui::Ui) {
        match self.portal.step() {
            WorkflowStep::Institution => {
                self.render_back_home(ui);
                ui.heading("Select your institution");
                ui.add_space(10.0);
                for institution in [Institution::University, Institution::Clinic] {
                    if ui.button(institution.display_name()).clicked() {
                        if let Err(e) = self.portal.select_institution(institution) {
                            tracing::warn!(error = %e, "cannot select institution");
                        }
                    }
                }
            }
            WorkflowStep::ProjectType => {
                if ui.button("⬅ Back").clicked() {
                    if let Err(e) = self.portal.back_to_institution() {
                        tracing::warn!(error = %e, "cannot go back");
                    }
                    return;
                }
                if let Some(institution) = self.portal.institution() {
                    ui.label(
                        RichText::new(institution.display_name())
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                }
                ui.heading("What would you like to submit?");
                ui.add_space(10.0);
                if ui.button("🆕 New project").clicked() {
                    if let Err(e) = self.portal.select_project_type(ProjectType::New) {
                        tracing::warn!(error = %e, "cannot select project type");
                    }
                }
                if ui.button("📂 Existing project").clicked() {
                    if let Err(e) = self.portal.select_project_type(ProjectType::Existing) {
                        tracing::warn!(error = %e, "cannot select project type");
                    }
                }
            }
            WorkflowStep::Form => self.render_form(ui),
            WorkflowStep::ExistingProject => {
                if ui.button("⬅ Back").clicked() {
                    if let Err(e) = self.portal.back_to_project_type() {
                        tracing::warn!(error = %e, "cannot go back");
                    }
                    return;
                }
                ui.heading("Existing project");
                ui.add_space(10.0);
                ui.label(
                    "Documents for projects that were already submitted are updated by the \
                     data protection office. Please reply to the confirmation email of your \
                     original submission and attach the changed documents.",
                );
            }
            WorkflowStep::Confirmation => self.render_confirmation(ui),
        }
    }

    fn render_form(&mut self, ui: &mut egui::Ui) {
        let submitting = self.portal.is_submitting();

        ui.add_enabled_ui(!submitting, |ui| {
            if ui.button("⬅ Back").clicked() {
                if let Err(e) = self.portal.back_to_project_type() {
                    tracing::warn!(error = %e, "cannot go back");
                }
            }
        });
        if self.portal.step() != WorkflowStep::Form {
            return;
        }

        ui.heading("New project");
        ui.add_space(10.0);

        ui.group(|ui| {
            let form = self.portal.form_mut();
            egui::Grid::new("project_form")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Email *");
                    ui.add(
                        egui::TextEdit::singleline(&mut form.email)
                            .hint_text("name@example.org"),
                    );
                    ui.end_row();

                    ui.label("Your name");
                    ui.text_edit_singleline(&mut form.uploader_name);
                    ui.end_row();

                    ui.label("Project title *");
                    ui.text_edit_singleline(&mut form.project_title);
                    ui.end_row();

                    ui.label("Project details");
                    ui.add(egui::TextEdit::multiline(&mut form.project_details).desired_rows(3));
                    ui.end_row();
                });
            ui.add_space(5.0);
            ui.checkbox(&mut form.is_prospective_study, "Prospective study");
        });

        ui.add_space(15.0);
        ui.label("Note: files in a folder's .gitignore are skipped when attaching a folder");
        ui.add_space(5.0);

        let flags = self.portal.form().active_flags();
        let views: Vec<CategoryView> = self
            .portal
            .categories()
            .iter()
            .map(|category| CategoryView {
                key: category.key().to_string(),
                label: category.label().to_string(),
                required: category.is_required(&flags),
                conditional: category.definition.requirement.is_conditional(),
                files: category
                    .files
                    .iter()
                    .map(|f| (f.name.clone(), f.size))
                    .collect(),
            })
            .collect();
        let extensions: Vec<String> = self.portal.filter().allowed_extensions().to_vec();

        let mut to_remove = None;
        for view in &views {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    let title = if view.required {
                        format!("{} *", view.label)
                    } else {
                        view.label.clone()
                    };
                    ui.strong(title);
                    if view.conditional && !view.required {
                        ui.colored_label(MUTED, "(required for prospective studies)");
                    }
                });

                ui.horizontal(|ui| {
                    if ui.button("📎 Add files").clicked() {
                        if let Some(paths) = FileDialog::new()
                            .add_filter("Documents", &extensions[..])
                            .pick_files()
                        {
                            self.attach_files(&view.key, &paths);
                        }
                    }
                    if ui.button("📁 Add folder").clicked() {
                        if let Some(folder) = FileDialog::new().pick_folder() {
                            self.attach_folder(&view.key, &folder);
                        }
                    }
                });

                for (index, (name, size)) in view.files.iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(format!("📄 {} ({})", name, format_size(*size)));
                        if ui.small_button("✖").clicked() {
                            to_remove = Some((view.key.clone(), index));
                        }
                    });
                }
            });
            ui.add_space(5.0);
        }

        if let Some((key, index)) = to_remove {
            if let Err(e) = self.portal.remove_file(&key, index) {
                tracing::warn!(error = %e, "cannot remove file");
            }
        }

        self.render_file_statuses(ui);

        let sizes: Vec<u64> = views
            .iter()
            .flat_map(|v| v.files.iter().map(|(_, size)| *size))
            .collect();
        ui.add_space(10.0);
        ui.label(format!(
            "{} file(s), {}",
            sizes.len(),
            format_size(total_size(&sizes))
        ));

        render_messages(ui, self.portal.errors(), self.portal.warnings());

        ui.add_space(15.0);
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!submitting, |ui| {
                let button = egui::Button::new("📤 Submit").min_size(egui::vec2(200.0, 40.0));
                if ui.add(button).clicked() {
                    self.start_submit();
                }
            });
            if submitting {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label("Uploading...");
                });
            }
        });
    }

    fn render_file_statuses(&mut self, ui: &mut egui::Ui) {
        if let Some(notice) = &self.state.notice {
            ui.colored_label(ACCENT, notice);
        }
        if self.state.file_statuses.is_empty() {
            return;
        }

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.label(self.state.get_status_text());
            let toggle = if self.state.show_details {
                "Hide Details"
            } else {
                "Show Details"
            };
            if ui.small_button(toggle).clicked() {
                self.state.show_details = !self.state.show_details;
            }
        });

        if self.state.show_details {
            egui::Frame::none()
                .fill(ui.style().visuals.extreme_bg_color)
                .show(ui, |ui| {
                    for status in &self.state.file_statuses {
                        match &status.status {
                            AttachStatus::Attached => {
                                ui.colored_label(SUCCESS, format!("✅ {}", status.name));
                            }
                            AttachStatus::Skipped(reason) => {
                                ui.colored_label(
                                    MUTED,
                                    format!("⏩ {} - {}", status.name, reason),
                                );
                            }
                        }
                    }
                });
        }
    }

    fn render_confirmation(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading(RichText::new("✅ Upload complete").color(SUCCESS));
            ui.add_space(10.0);
            if let Some(receipt) = self.portal.receipt() {
                ui.label(format!("Received at {}", receipt.timestamp));
                if let Some(project_id) = &receipt.project_id {
                    ui.label(format!("Project ID: {}", project_id));
                }
                if let Some(count) = receipt.files_uploaded {
                    ui.label(format!("{} file(s) stored", count));
                }
                if let Some(message) = &receipt.message {
                    ui.label(message);
                }
            }
            ui.add_space(10.0);
            ui.label("A confirmation has been sent to your email address.");
            ui.add_space(20.0);

            if ui.button("🔄 New upload").clicked() {
                self.state.clear_reports();
                if let Err(e) = self.portal.new_upload() {
                    tracing::warn!(error = %e, "cannot start a new upload");
                }
            }
            if ui.button("⬅ Home").clicked() {
                self.go_home();
            }
        });
    }

    fn render_concept(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        match self.concept.step() {
            ConceptStep::Input => self.render_concept_input(ui),
            ConceptStep::Review => self.render_concept_review(ui),
            ConceptStep::Result => self.render_concept_result(ui, ctx),
        }
        render_messages(ui, self.concept.errors(), &[]);
    }

    fn render_concept_input(&mut self, ui: &mut egui::Ui) {
        let busy = self.concept.is_busy();
        ui.add_enabled_ui(!busy, |ui| self.render_back_home(ui));

        ui.heading("Upload research proposal");
        ui.label("Upload your proposal (PDF, DOCX) or paste its text.");
        ui.add_space(10.0);

        ui.group(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                if ui.button("📎 Select files").clicked() {
                    if let Some(paths) = FileDialog::new()
                        .add_filter("Proposal", &INPUT_EXTENSIONS[..])
                        .pick_files()
                    {
                        self.select_concept_files(&paths);
                    }
                }
            });

            let mut to_remove = None;
            for (index, file) in self.concept.files().iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(format!("📄 {} ({})", file.name, format_size(file.size)));
                    if ui.small_button("✖").clicked() {
                        to_remove = Some(index);
                    }
                });
            }
            if let Some(index) = to_remove {
                if let Err(e) = self.concept.remove_file(index) {
                    tracing::warn!(error = %e, "cannot remove file");
                }
            }
        });

        self.render_file_statuses(ui);

        ui.add_space(10.0);
        ui.label("or paste the text");
        ui.add_enabled(
            !busy,
            egui::TextEdit::multiline(self.concept.manual_text_mut())
                .desired_rows(8)
                .desired_width(f32::INFINITY)
                .hint_text("Paste the text of your research proposal here..."),
        );

        ui.add_space(15.0);
        ui.vertical_centered(|ui| {
            if busy {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label(self.concept.status_message().unwrap_or("Analysing..."));
                });
            } else {
                let button =
                    egui::Button::new("🪄 Analyse proposal").min_size(egui::vec2(220.0, 40.0));
                if ui.add(button).clicked() {
                    self.state.clear_reports();
                    self.start_extract();
                }
            }
        });
    }

    fn render_concept_review(&mut self, ui: &mut egui::Ui) {
        let busy = self.concept.is_busy();
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                if ui.button("⬅ Back").clicked() {
                    if let Err(e) = self.concept.back() {
                        tracing::warn!(error = %e, "cannot go back");
                    }
                }
                let label = if busy { "Generating..." } else { "Generate concept ➡" };
                if ui.button(label).clicked() {
                    self.start_generate();
                }
            });
            if busy {
                ui.add(egui::Spinner::new());
            }
        });
        if self.concept.step() != ConceptStep::Review {
            return;
        }

        ui.add_space(10.0);
        ui.heading("Review extracted data");
        ui.label("Please check the extracted data. Every field can be edited.");
        ui.add_space(10.0);

        let Some(data) = self.concept.data().cloned() else {
            return;
        };

        egui::Grid::new("study_data")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .striped(true)
            .show(ui, |ui| {
                for field in TextField::ALL {
                    ui.label(field.label());
                    let mut value = data.text(field).to_string();
                    let edit = if field.is_multiline() {
                        egui::TextEdit::multiline(&mut value).desired_rows(2)
                    } else {
                        egui::TextEdit::singleline(&mut value)
                    };
                    if ui.add(edit.desired_width(400.0)).changed() {
                        if let Err(e) = self.concept.set_text(field, &value) {
                            tracing::warn!(error = %e, "cannot edit field");
                        }
                    }
                    ui.end_row();
                }

                for field in ListField::ALL {
                    ui.label(field.label());
                    let mut value = data.list_text(field);
                    let edit = egui::TextEdit::multiline(&mut value)
                        .desired_rows(2)
                        .desired_width(400.0)
                        .hint_text("comma separated");
                    if ui.add(edit).changed() {
                        if let Err(e) = self.concept.set_list_text(field, &value) {
                            tracing::warn!(error = %e, "cannot edit field");
                        }
                    }
                    ui.end_row();
                }

                for field in FlagField::ALL {
                    ui.label("");
                    let mut value = data.flag(field);
                    if ui.checkbox(&mut value, field.label()).changed() {
                        if let Err(e) = self.concept.set_flag(field, value) {
                            tracing::warn!(error = %e, "cannot edit field");
                        }
                    }
                    ui.end_row();
                }
            });
    }

    fn render_concept_result(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let busy = self.concept.is_busy();
        let Some(markdown) = self.concept.markdown().map(str::to_string) else {
            return;
        };

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                if ui.button("⬅ Back").clicked() {
                    if let Err(e) = self.concept.back() {
                        tracing::warn!(error = %e, "cannot go back");
                    }
                }
                if ui.button("⬇ Download as DOCX").clicked() {
                    if let Some(path) = FileDialog::new()
                        .set_file_name(EXPORT_FILE_NAME)
                        .add_filter("Word document", &["docx"])
                        .save_file()
                    {
                        self.state.clear_reports();
                        self.start_export(path);
                    }
                }
                if ui.button("📋 Copy").clicked() {
                    ctx.output_mut(|o| o.copied_text = markdown.clone());
                    self.state.notice = Some("Copied to clipboard".to_string());
                }
            });
            if busy {
                ui.add(egui::Spinner::new());
            }
        });

        if let Some(notice) = &self.state.notice {
            ui.colored_label(ACCENT, notice);
        }
        if let Some(path) = self.concept.saved_to().map(|p| p.to_path_buf()) {
            if ui.link("Open saved document").clicked() {
                if let Err(e) = open::that(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to open document");
                }
            }
        }

        ui.add_space(10.0);
        ui.heading("Privacy concept");
        egui::Frame::none()
            .fill(ui.style().visuals.extreme_bg_color)
            .inner_margin(12.0)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .id_source("concept_markdown")
                    .max_height(400.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(&markdown).monospace());
                    });
            });

        ui.add_space(10.0);
        ui.group(|ui| {
            ui.strong("Next steps");
            ui.label("• Download the document (.docx).");
            ui.label("• Open it in Word and check the formatting.");
            ui.label("• Add details that were missing from the proposal.");
            ui.label("• Submit it together with your ethics application.");
        });
    }
}
