//! # DCCN Common Library
//!
//! Shared code for the DCCN conference services:
//! - Domain records and the submission status lifecycle
//! - Review statistics, filters and mailing lists over a conference snapshot
//! - Message rendering and CSV export
//! - SQLite persistence and the state-changing workflow
//! - Configuration loading and the event bus

pub mod config;
pub mod countries;
pub mod db;
pub mod error;
pub mod events;
pub mod export;
pub mod filters;
pub mod mailing;
pub mod model;
pub mod notifier;
pub mod snapshot;
pub mod stats;
pub mod time;
pub mod workflow;

pub use error::{Error, Result};
pub use events::{DccnEvent, EventBus};
pub use snapshot::{ConferenceSnapshot, SubmissionView};
pub use workflow::Workflow;
