//! Weather Prediction Main Application
//! Main window with control panel and forecast chart viewer.

use crate::charts::ChartComposer;
use crate::config::AppConfig;
use crate::data::{DataLoader, Dataset};
use crate::forecast::{
    CancelToken, ColumnForecast, EtsModel, ForecastOutcome, ForecastRequest, ForecastRunner,
    RunError,
};
use crate::gui::validation::validate;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete(Dataset),
    Error(String),
}

/// Prediction events from background thread
#[derive(Debug)]
enum RunEvent {
    ColumnDone { index: usize, name: String },
    Complete(Vec<ColumnForecast>),
    Cancelled,
    Failed(String),
}

/// Send an event to the UI thread and wake it up.
fn notify<T>(tx: &Sender<T>, ctx: &egui::Context, event: T) {
    let _ = tx.send(event);
    ctx.request_repaint();
}

/// Main application window. Holds all UI and run state.
pub struct WeatherApp {
    config: AppConfig,
    dataset: Option<Arc<Dataset>>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    // Async prediction
    run_rx: Option<Receiver<RunEvent>>,
    cancel: Option<CancelToken>,
}

impl WeatherApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            control_panel: ControlPanel::new(config.default_horizon),
            chart_viewer: ChartViewer::new(),
            config,
            dataset: None,
            load_rx: None,
            is_loading: false,
            run_rx: None,
            cancel: None,
        }
    }

    fn is_running(&self) -> bool {
        self.run_rx.is_some()
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self, ctx: &egui::Context) {
        if self.is_loading || self.is_running() {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(ctx, path);
        }
    }

    fn start_loading(&mut self, ctx: &egui::Context, path: PathBuf) {
        self.chart_viewer.clear();
        self.dataset = None;
        self.control_panel.clear_dataset_info();
        self.control_panel.error = None;
        self.control_panel.csv_path = Some(path.clone());
        self.control_panel.set_status("Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let ctx = ctx.clone();

        // Load CSV in background thread
        thread::spawn(move || {
            let result = match DataLoader::load_csv(&path) {
                Ok(dataset) => LoadResult::Complete(dataset),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to load CSV");
                    LoadResult::Error(e.to_string())
                }
            };
            notify(&tx, &ctx, result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(dataset)) => {
                let columns = dataset.metric_names();
                let mut status = format!(
                    "Loaded {} rows, {} columns",
                    dataset.row_count(),
                    columns.len()
                );
                if !dataset.skipped_columns.is_empty() {
                    status.push_str(&format!(
                        " (skipped non-numeric: {})",
                        dataset.skipped_columns.join(", ")
                    ));
                }
                self.control_panel
                    .set_dataset_info(dataset.date_range(), columns);
                self.control_panel.set_status(status);
                self.dataset = Some(Arc::new(dataset));
                self.is_loading = false;
            }
            Ok(LoadResult::Error(e)) => {
                self.control_panel.set_status(format!("Error: {e}"));
                self.is_loading = false;
            }
            Err(TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                self.control_panel
                    .set_status("Error: CSV loading stopped unexpectedly");
                self.is_loading = false;
            }
        }
    }

    /// Validate inputs and start the prediction thread
    fn start_prediction(&mut self, ctx: &egui::Context) {
        if self.is_running() {
            return;
        }
        if self.is_loading {
            self.control_panel.set_status("Still loading CSV file...");
            return;
        }

        let inputs = self.control_panel.inputs();
        let request = match validate(&inputs, self.dataset.as_deref(), &self.config) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "invalid prediction input");
                self.control_panel.set_status(format!("Error: {e}"));
                self.control_panel.error = Some(e);
                return;
            }
        };
        let Some(dataset) = self.dataset.clone() else {
            return;
        };

        self.control_panel.error = None;
        self.chart_viewer.clear();
        self.control_panel.progress.start(dataset.metrics().len());
        self.control_panel.is_running = true;
        self.control_panel.set_status("Running predictions...");

        let (tx, rx) = channel();
        self.run_rx = Some(rx);
        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());

        let model = EtsModel::new(self.config.seasonal_period, self.config.min_model_points);
        let ctx = ctx.clone();

        thread::spawn(move || {
            Self::run_prediction(tx, ctx, model, dataset, request, cancel);
        });
    }

    /// Run the forecast (called from background thread)
    fn run_prediction(
        tx: Sender<RunEvent>,
        ctx: egui::Context,
        model: EtsModel,
        dataset: Arc<Dataset>,
        request: ForecastRequest,
        cancel: CancelToken,
    ) {
        let runner = ForecastRunner::new(model);
        let result = runner.run(&dataset, &request, &cancel, |index, name| {
            notify(
                &tx,
                &ctx,
                RunEvent::ColumnDone {
                    index,
                    name: name.to_string(),
                },
            );
        });

        let event = match result {
            Ok(results) => RunEvent::Complete(results),
            Err(RunError::Cancelled) => RunEvent::Cancelled,
            Err(e) => {
                error!(error = %e, "prediction failed");
                RunEvent::Failed(e.to_string())
            }
        };
        notify(&tx, &ctx, event);
    }

    fn handle_cancel(&mut self) {
        if let Some(cancel) = &self.cancel {
            info!("cancelling prediction");
            cancel.cancel();
            self.control_panel.set_status("Cancelling...");
        }
    }

    fn finish_run(&mut self) {
        self.run_rx = None;
        self.cancel = None;
    }

    /// Drain prediction events
    fn check_run_events(&mut self) {
        let Some(rx) = self.run_rx.take() else {
            return;
        };

        loop {
            let event = match rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => {
                    self.run_rx = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    error!("prediction thread exited without a result");
                    RunEvent::Failed("prediction stopped unexpectedly".to_string())
                }
            };

            let finished = apply_run_event(
                &mut self.control_panel,
                &mut self.chart_viewer,
                self.config.grid_columns,
                event,
            );
            if finished {
                self.finish_run();
                return;
            }
        }
    }
}

/// Apply one prediction event to the panel and viewer. Returns `true` once
/// the run is over.
fn apply_run_event(
    panel: &mut ControlPanel,
    viewer: &mut ChartViewer,
    grid_columns: usize,
    event: RunEvent,
) -> bool {
    match event {
        RunEvent::ColumnDone { index, name } => {
            panel.progress.advance();
            panel.set_status(format!("Finished column {} ({})", index + 1, name));
            return false;
        }
        RunEvent::Complete(results) => {
            let failed = results
                .iter()
                .filter(|r| !matches!(r.outcome, ForecastOutcome::Forecast(_)))
                .count();
            let composition = ChartComposer::compose(&results, grid_columns);
            let count = composition.subplots.len();
            viewer.set_composition(composition);
            panel.progress.finish();
            let status = if failed == 0 {
                format!("Complete! {count} charts ready")
            } else {
                format!("Complete! {count} charts ready, {failed} without forecast")
            };
            panel.set_status(status);
        }
        RunEvent::Cancelled => {
            panel.progress.reset();
            panel.set_status("Prediction cancelled");
        }
        RunEvent::Failed(e) => {
            panel.progress.reset();
            panel.set_status(format!("Error: {e}"));
        }
    }
    panel.is_running = false;
    true
}

impl eframe::App for WeatherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_run_events();

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(320.0)
            .max_width(380.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(ctx),
                        ControlPanelAction::StartPrediction => self.start_prediction(ctx),
                        ControlPanelAction::Cancel => self.handle_cancel(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ActualSeries;
    use crate::forecast::{future_dates, ForecastMethod, ForecastSeries, ProgressReporter};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn column(name: &str) -> ColumnForecast {
        ColumnForecast {
            name: name.to_string(),
            actual: ActualSeries {
                dates: vec![date(1), date(2)],
                values: vec![10.0, 11.0],
            },
            outcome: ForecastOutcome::Forecast(ForecastSeries {
                dates: future_dates(date(2), 3),
                values: vec![11.5; 3],
                method: ForecastMethod::Naive,
            }),
        }
    }

    fn running_panel(columns: usize) -> ControlPanel {
        let mut panel = ControlPanel::new(10);
        panel.progress.start(columns);
        panel.is_running = true;
        panel
    }

    fn done(index: usize, name: &str) -> RunEvent {
        RunEvent::ColumnDone {
            index,
            name: name.to_string(),
        }
    }

    #[test]
    fn progress_follows_finished_columns() {
        let mut panel = running_panel(3);
        let mut viewer = ChartViewer::new();
        assert_eq!(panel.progress.label(), "Graph 1/4");
        assert_eq!(panel.progress.percent(), 25);

        assert!(!apply_run_event(&mut panel, &mut viewer, 3, done(1, "Humidity")));
        assert_eq!(panel.progress.label(), "Graph 2/4");
        assert_eq!(panel.progress.percent(), 50);
        assert_eq!(panel.status, "Finished column 2 (Humidity)");

        assert!(!apply_run_event(&mut panel, &mut viewer, 3, done(0, "Temperature")));
        assert_eq!(panel.progress.percent(), 75);
        assert!(panel.progress.is_visible());
        assert!(panel.is_running);
        assert!(viewer.composition.is_none());
    }

    #[test]
    fn completion_shows_charts_at_full_progress() {
        let mut panel = running_panel(2);
        let mut viewer = ChartViewer::new();

        apply_run_event(&mut panel, &mut viewer, 3, done(0, "Temperature"));
        let results = vec![
            column("Temperature"),
            ColumnForecast {
                outcome: ForecastOutcome::NoData,
                ..column("Humidity")
            },
        ];
        assert!(apply_run_event(&mut panel, &mut viewer, 3, RunEvent::Complete(results)));

        assert_eq!(panel.progress.percent(), 100);
        assert!(!panel.progress.is_visible());
        assert!(!panel.is_running);
        assert_eq!(panel.status, "Complete! 2 charts ready, 1 without forecast");
        let composition = viewer.composition.as_ref().unwrap();
        assert_eq!(composition.subplots.len(), 2);
        assert_eq!(composition.subplots[0].title, "Temperature");
    }

    #[test]
    fn cancel_and_failure_reset_progress() {
        let mut panel = running_panel(2);
        let mut viewer = ChartViewer::new();
        apply_run_event(&mut panel, &mut viewer, 3, done(0, "Temperature"));

        assert!(apply_run_event(&mut panel, &mut viewer, 3, RunEvent::Cancelled));
        assert_eq!(panel.progress, ProgressReporter::default());
        assert_eq!(panel.status, "Prediction cancelled");
        assert!(!panel.is_running);
        assert!(viewer.composition.is_none());

        let mut panel = running_panel(2);
        let failed = RunEvent::Failed("prediction stopped unexpectedly".into());
        assert!(apply_run_event(&mut panel, &mut viewer, 3, failed));
        assert_eq!(panel.progress.percent(), 0);
        assert!(!panel.progress.is_visible());
        assert_eq!(panel.status, "Error: prediction stopped unexpectedly");
        assert!(!panel.is_running);
    }
}
