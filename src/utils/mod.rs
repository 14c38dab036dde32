//! Utility functions and types

pub mod data_loader;
pub mod logging;

pub use data_loader::{DataLoader, DataSaver};
pub use logging::{LoggingContext, RunLogGuard};
