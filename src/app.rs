use crate::classifier::{Attachment, ClassifierClient};
use crate::event::AppEvent;
use crate::theme::Theme;
use crate::workspace::Workspace;
use chrono::{DateTime, Local, Utc};
use eframe::egui::{self, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

const COPY_FEEDBACK: Duration = Duration::from_secs(2);

enum SidebarAction {
    Select(u64),
    Delete(u64),
}

pub struct MailSiftApp {
    rx: Receiver<AppEvent>,
    classifier: ClassifierClient,
    workspace: Workspace,
    theme: Theme,
    email_text: String,
    attachment: Option<Attachment>,
    is_classifying: bool,
    error_message: Option<String>,
    diagnostics_log: Vec<String>,
    sidebar_open: bool,
    copied_at: Option<Instant>,
}

impl MailSiftApp {
    pub fn new(rx: Receiver<AppEvent>, classifier: ClassifierClient, workspace: Workspace) -> Self {
        Self {
            rx,
            classifier,
            workspace,
            theme: Theme::default(),
            email_text: String::new(),
            attachment: None,
            is_classifying: false,
            error_message: None,
            diagnostics_log: Vec::new(),
            sidebar_open: true,
            copied_at: None,
        }
    }

    pub fn apply_theme(&self, ctx: &egui::Context) {
        self.theme.apply_visuals(ctx);
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.diagnostics_log.push(format!("[{stamp}] {}", message.into()));
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, Some(ctx)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, ctx: Option<&egui::Context>) {
        match event {
            AppEvent::AnalysisReady(analysis) => {
                self.is_classifying = false;
                self.error_message = None;
                self.log_diagnostic(format!("analysis ready: {}", analysis.classification));
                self.workspace.present(analysis);
            }
            AppEvent::AnalysisFailed(message) => {
                self.is_classifying = false;
                self.log_diagnostic(format!("classification failed: {message}"));
                self.error_message = Some(message);
            }
        }

        if let Some(ctx) = ctx {
            ctx.request_repaint();
        }
    }

    fn submit(&mut self) {
        if self.is_classifying {
            return;
        }
        if self.email_text.trim().is_empty() && self.attachment.is_none() {
            return;
        }

        self.is_classifying = true;
        self.error_message = None;
        self.log_diagnostic("sample submitted for classification");
        self.classifier
            .submit(self.email_text.clone(), self.attachment.clone());
    }

    fn save_current(&mut self) {
        if let Some(id) = self.workspace.save_current(Utc::now().to_rfc3339()) {
            self.log_diagnostic(format!("analysis saved as record {id}"));
        }
    }

    fn select_record(&mut self, id: u64) {
        if self.workspace.select(id) {
            if let Some(analysis) = self.workspace.state().displayed() {
                self.email_text = analysis.original_text.clone();
            }
            self.error_message = None;
        }
    }

    fn delete_record(&mut self, id: u64) {
        let reset = self.workspace.delete(id, &self.email_text);
        if reset {
            self.email_text.clear();
            self.attachment = None;
            self.error_message = None;
            self.copied_at = None;
        }
        self.log_diagnostic(format!("record {id} deleted"));
    }

    fn clear_workspace(&mut self) {
        self.workspace.clear();
        self.email_text.clear();
        self.attachment = None;
        self.error_message = None;
        self.copied_at = None;
    }

    fn pick_attachment(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Email files", &["txt", "pdf"])
            .pick_file()
        else {
            return;
        };

        match std::fs::read(&path) {
            Ok(bytes) => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| "attachment".to_string());
                self.attachment = Some(Attachment { file_name, bytes });
            }
            Err(err) => {
                self.error_message = Some(format!("Could not read {}: {err}", path.display()));
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("MailSift");
                ui.separator();

                let toggle_label = if self.sidebar_open {
                    "Hide saved"
                } else {
                    "Show saved"
                };
                if ui.button(toggle_label).clicked() {
                    self.sidebar_open = !self.sidebar_open;
                }

                if ui.button("Clear workspace").clicked() {
                    self.clear_workspace();
                }
            });
        });
    }

    fn render_sidebar(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        let mut action: Option<SidebarAction> = None;

        egui::SidePanel::left("saved_panel")
            .resizable(true)
            .default_width(260.0)
            .show_animated(ctx, self.sidebar_open, |ui| {
                ui.heading("Saved analyses");
                ui.separator();

                if self.workspace.record_count() == 0 {
                    ui.label(RichText::new("No saved analyses yet").color(theme.text_muted));
                    return;
                }

                ScrollArea::vertical().id_salt("saved_list").show(ui, |ui| {
                    for record in self.workspace.entries_newest_first() {
                        theme.sidebar_entry_frame().show(ui, |ui| {
                            // Select and delete are separate widgets; a single
                            // click can only ever land on one of them.
                            ui.horizontal(|ui| {
                                ui.vertical(|ui| {
                                    if ui
                                        .button(RichText::new(&record.title).strong())
                                        .clicked()
                                    {
                                        action = Some(SidebarAction::Select(record.id));
                                    }
                                    ui.label(
                                        RichText::new(&record.classification)
                                            .color(theme.accent_primary),
                                    );
                                    ui.label(
                                        RichText::new(format_record_date(&record.date))
                                            .color(theme.text_muted)
                                            .small(),
                                    );
                                });
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Min),
                                    |ui| {
                                        if ui.small_button("Delete").clicked() {
                                            action = Some(SidebarAction::Delete(record.id));
                                        }
                                    },
                                );
                            });
                        });
                        ui.add_space(theme.spacing_8 / 2.0);
                    }
                });
            });

        match action {
            Some(SidebarAction::Select(id)) => self.select_record(id),
            Some(SidebarAction::Delete(id)) => self.delete_record(id),
            None => {}
        }
    }

    fn render_central(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical().id_salt("workspace_scroll").show(ui, |ui| {
                ui.heading("Classify an email");
                ui.add_space(theme.spacing_8);

                theme.card_frame().show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.email_text)
                            .desired_rows(6)
                            .desired_width(f32::INFINITY)
                            .hint_text("Paste the email text here..."),
                    );

                    ui.horizontal(|ui| {
                        if ui.button("Attach file...").clicked() {
                            self.pick_attachment();
                        }
                        if let Some(file_name) = self
                            .attachment
                            .as_ref()
                            .map(|attachment| attachment.file_name.clone())
                        {
                            ui.label(RichText::new(file_name).color(theme.text_muted));
                            if ui.small_button("Remove").clicked() {
                                self.attachment = None;
                            }
                        }
                    });

                    ui.horizontal(|ui| {
                        let has_content =
                            !self.email_text.trim().is_empty() || self.attachment.is_some();
                        let clicked = ui
                            .add_enabled(
                                !self.is_classifying && has_content,
                                egui::Button::new("Classify"),
                            )
                            .clicked();

                        if self.is_classifying {
                            ui.spinner();
                            ui.label(RichText::new("Analyzing...").color(theme.text_muted));
                        }

                        if clicked {
                            self.submit();
                        }
                    });

                    if let Some(message) = self.error_message.clone() {
                        ui.colored_label(theme.danger, message);
                    }
                });

                let displayed = self.workspace.state().displayed().cloned();
                if let Some(analysis) = displayed {
                    let unsaved = self.workspace.state().is_unsaved();

                    ui.add_space(theme.spacing_8);
                    theme.card_frame().show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.heading("Analysis");
                            if unsaved {
                                ui.label(
                                    RichText::new("not saved").color(theme.text_muted).small(),
                                );
                            }
                        });
                        ui.separator();

                        ui.horizontal(|ui| {
                            ui.label(RichText::new("Classification:").color(theme.text_muted));
                            ui.label(
                                RichText::new(&analysis.classification)
                                    .color(theme.accent_primary)
                                    .strong(),
                            );
                        });
                        ui.horizontal(|ui| {
                            ui.label(RichText::new("Title:").color(theme.text_muted));
                            ui.strong(&analysis.title);
                        });

                        ui.label(RichText::new("Suggested response").color(theme.text_muted));
                        ui.label(&analysis.response);

                        ui.horizontal(|ui| {
                            let copied = self
                                .copied_at
                                .is_some_and(|at| at.elapsed() < COPY_FEEDBACK);
                            let copy_label = if copied {
                                RichText::new("Copied!").color(theme.success)
                            } else {
                                RichText::new("Copy response")
                            };
                            if ui
                                .add_enabled(!copied, egui::Button::new(copy_label))
                                .clicked()
                            {
                                ui.ctx().copy_text(analysis.response.clone());
                                self.copied_at = Some(Instant::now());
                            }
                            if copied {
                                ui.ctx().request_repaint_after(COPY_FEEDBACK);
                            }

                            if unsaved && ui.button("Save analysis").clicked() {
                                self.save_current();
                            }
                        });
                    });
                }

                ui.add_space(theme.spacing_8);
                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(90.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in &self.diagnostics_log {
                                    ui.label(
                                        RichText::new(entry).color(theme.text_muted).small(),
                                    );
                                }
                            });
                    });
            });
        });
    }
}

impl eframe::App for MailSiftApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);
        self.render_top_bar(ctx);
        self.render_sidebar(ctx);
        self.render_central(ctx);
    }
}

fn format_record_date(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(parsed) => parsed.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string(),
        Err(_) => date.to_string(),
    }
}
