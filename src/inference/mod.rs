//! Inference module
//!
//! Serves single-customer premium predictions from the persisted
//! transformer/model pair, and keeps an optional log of what was served.

mod engine;
mod record_store;

pub use engine::InferenceEngine;
pub use record_store::{RecordStore, StoredRecord};
