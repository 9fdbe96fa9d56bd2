//! Data module - CSV loading and the in-memory dataset

mod dataset;
mod loader;

pub use dataset::{ActualSeries, Dataset, DatasetError, DateRange, MetricColumn};
pub use loader::DataLoader;
