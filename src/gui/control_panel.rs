//! Control Panel Widget
//! Left side panel with file selection, prediction inputs and progress.

use crate::data::DateRange;
use crate::forecast::ProgressReporter;
use crate::gui::validation::{InputField, PredictionInputs, ValidationError};
use chrono::{Local, NaiveDate};
use egui::{Color32, RichText};
use egui_extras::DatePickerButton;
use std::path::PathBuf;

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const OK_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

/// Left side control panel with file selection and prediction controls.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub start_date: NaiveDate,
    pub horizon_text: String,
    /// Dates the picker is restricted to
    pub date_range: Option<DateRange>,
    pub columns: Vec<String>,
    pub error: Option<ValidationError>,
    pub progress: ProgressReporter,
    pub status: String,
    pub is_running: bool,
    date_clamped: bool,
}

impl ControlPanel {
    pub fn new(default_horizon: usize) -> Self {
        Self {
            csv_path: None,
            start_date: Local::now().date_naive(),
            horizon_text: default_horizon.to_string(),
            date_range: None,
            columns: Vec::new(),
            error: None,
            progress: ProgressReporter::new(),
            status: "Ready".to_string(),
            is_running: false,
            date_clamped: false,
        }
    }

    /// Restrict the date picker to a freshly loaded dataset.
    pub fn set_dataset_info(&mut self, range: Option<DateRange>, columns: Vec<String>) {
        self.date_range = range;
        if let Some(range) = range {
            self.start_date = range.first;
        }
        self.columns = columns;
        self.date_clamped = false;
        self.error = None;
    }

    pub fn clear_dataset_info(&mut self) {
        self.date_range = None;
        self.columns.clear();
    }

    pub fn inputs(&self) -> PredictionInputs {
        PredictionInputs {
            csv_path: self.csv_path.clone(),
            start_date: self.start_date,
            horizon_text: self.horizon_text.clone(),
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn field_error(&self, field: InputField) -> Option<&ValidationError> {
        self.error.as_ref().filter(|e| e.field() == field)
    }

    fn show_field_error(&self, ui: &mut egui::Ui, field: InputField) {
        if let Some(err) = self.field_error(field) {
            ui.label(RichText::new(err.to_string()).size(11.0).color(ERROR_COLOR));
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌦 Weather Prediction")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data File Section =====
        ui.label(RichText::new("📁 Select Data File").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    let path_color = if self.csv_path.is_some() {
                        ui.visuals().text_color()
                    } else {
                        Color32::GRAY
                    };
                    ui.label(RichText::new(&path_text).size(12.0).color(path_color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.is_running, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseCsv;
                            }
                        });
                    });
                });
            });
        self.show_field_error(ui, InputField::DataFile);

        if !self.columns.is_empty() {
            ui.label(
                RichText::new(format!("Columns: {}", self.columns.join(", ")))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Prediction Inputs =====
        let label_width = 120.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Select Start Date:"));
            ui.add(
                DatePickerButton::new(&mut self.start_date)
                    .id_salt("start_date")
                    .format("%d-%m-%Y"),
            );
        });
        if let Some(range) = self.date_range {
            let clamped = range.clamp(self.start_date);
            if clamped != self.start_date {
                self.start_date = clamped;
                self.date_clamped = true;
            }
            ui.label(
                RichText::new(format!(
                    "Data covers {} to {}",
                    range.first.format("%d-%m-%Y"),
                    range.last.format("%d-%m-%Y")
                ))
                .size(11.0)
                .color(Color32::GRAY),
            );
            if self.date_clamped {
                ui.label(
                    RichText::new("Date moved inside the data range")
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            }
        }
        self.show_field_error(ui, InputField::StartDate);

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Number of Days:"));
            ui.add(
                egui::TextEdit::singleline(&mut self.horizon_text)
                    .desired_width(80.0)
                    .hint_text("days"),
            );
        });
        self.show_field_error(ui, InputField::Horizon);

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!self.is_running, |ui| {
                let button = egui::Button::new(RichText::new("▶ Start Prediction").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::StartPrediction;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(self.is_running, |ui| {
                let cancel = egui::Button::new(RichText::new("⏹ Cancel").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(cancel).clicked() {
                    action = ControlPanelAction::Cancel;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        if self.progress.is_visible() {
            ui.horizontal(|ui| {
                ui.label(RichText::new(self.progress.label()).size(12.0));
                ui.label(RichText::new(format!("{}%", self.progress.percent())).size(12.0));
            });
            ui.add(egui::ProgressBar::new(self.progress.fraction()).animate(true));
            ui.add_space(5.0);
        }

        let status_color = if self.status.contains("Error") || self.status.contains("failed") {
            ERROR_COLOR
        } else if self.status.contains("Complete") {
            OK_COLOR
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    StartPrediction,
    Cancel,
}
