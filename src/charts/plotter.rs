//! Chart Plotter Module
//! Draws composed forecast subplots using egui_plot.

use crate::charts::{date_from_plot_x, Subplot};
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

pub const ACTUAL_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const FORECAST_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const NOTE_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Link group shared by every subplot's date axis.
pub const SHARED_X_AXIS: &str = "forecast_x";

/// Draws forecast charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw one subplot: title, optional note, then the plot itself.
    pub fn draw_subplot(ui: &mut egui::Ui, subplot: &Subplot, height: f32) {
        ui.label(RichText::new(&subplot.title).size(15.0).strong());
        if let Some(note) = &subplot.note {
            ui.label(RichText::new(note).size(11.0).color(NOTE_COLOR));
        }

        let actual_count = subplot.actual.len();
        Plot::new(format!("forecast_{}_{}", subplot.row, subplot.col))
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .link_axis(egui::Id::new(SHARED_X_AXIS), [true, false])
            .x_axis_label("Date")
            .x_axis_formatter(|mark, _range| {
                date_from_plot_x(mark.value)
                    .map(|d| d.format("%d-%m-%Y").to_string())
                    .unwrap_or_default()
            })
            .label_formatter(|name, value| {
                let date = date_from_plot_x(value.x)
                    .map(|d| d.format("%d-%m-%Y").to_string())
                    .unwrap_or_default();
                if name.is_empty() {
                    format!("{date}\n{:.2}", value.y)
                } else {
                    format!("{name}\n{date}\n{:.2}", value.y)
                }
            })
            .show(ui, |plot_ui| {
                if actual_count > 0 {
                    plot_ui.points(
                        Points::new(PlotPoints::from(subplot.actual.clone()))
                            .radius(2.5)
                            .color(ACTUAL_COLOR)
                            .name("Actual"),
                    );
                }

                if !subplot.forecast.is_empty() {
                    let name = match subplot.method {
                        Some(method) => format!("Prediction ({method})"),
                        None => "Prediction".to_string(),
                    };
                    plot_ui.line(
                        Line::new(PlotPoints::from(subplot.forecast.clone()))
                            .color(FORECAST_COLOR)
                            .width(2.0)
                            .name(name),
                    );
                }
            });
    }
}
