//! Chart Viewer Widget
//! Scrollable central panel showing the forecast subplot grid.

use crate::charts::{ChartComposition, ChartPlotter};
use egui::{RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const PLOT_HEIGHT: f32 = 260.0;
const MIN_CARD_WIDTH: f32 = 280.0;

/// Scrollable chart grid. Rows match the composition's grid rows.
#[derive(Default)]
pub struct ChartViewer {
    pub composition: Option<ChartComposition>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.composition = None;
    }

    pub fn set_composition(&mut self, composition: ChartComposition) {
        self.composition = Some(composition);
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        let Some(chart) = self.composition.as_ref().filter(|c| !c.is_empty()) else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Forecast").size(20.0));
            });
            return;
        };

        let cols = chart.shape.cols;
        let card_width = ((ui.available_width() - CHART_SPACING * (cols as f32 + 1.0))
            / cols as f32)
            .max(MIN_CARD_WIDTH);
        // Title and note lines sit above each plot
        let row_height = PLOT_HEIGHT + 70.0 + CHART_SPACING;

        ScrollArea::both()
            .auto_shrink([false, false])
            .show_rows(ui, row_height, chart.shape.rows, |ui, row_range| {
                for row in row_range {
                    ui.horizontal(|ui| {
                        for subplot in chart.row(row) {
                            egui::Frame::none()
                                .rounding(8.0)
                                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                                .inner_margin(10.0)
                                .show(ui, |ui| {
                                    ui.set_width(card_width - 20.0);
                                    ui.vertical(|ui| {
                                        ChartPlotter::draw_subplot(ui, subplot, PLOT_HEIGHT);
                                    });
                                });
                            ui.add_space(CHART_SPACING);
                        }
                    });
                    ui.add_space(CHART_SPACING);
                }
            });
    }
}
