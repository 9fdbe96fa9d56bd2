//! Charts module - forecast chart layout and drawing

mod layout;
mod plotter;

pub use layout::{date_from_plot_x, ChartComposer, ChartComposition, Subplot};
pub use plotter::ChartPlotter;
