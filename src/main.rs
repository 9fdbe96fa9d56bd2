//! Weathercast - CSV Weather Forecast Viewer
//!
//! Loads daily weather measurements from CSV and charts a forecast per column.

mod charts;
mod config;
mod data;
mod forecast;
mod gui;

use config::AppConfig;
use eframe::egui;
use gui::WeatherApp;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        error!("falling back to default configuration: {e:#}");
        AppConfig::default()
    });
    info!(?config, "starting Weathercast");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Weather Prediction"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Weather Prediction",
        options,
        Box::new(|cc| Ok(Box::new(WeatherApp::new(cc, config)))),
    )
}
