pub mod config;
pub mod constants;
pub mod dates;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod ownership;
pub mod parser;
pub mod server;
pub mod storage;
pub mod types;

// Use cases and ports, plus their outbound adapters
pub mod app;
pub mod infra;

pub use config::{Config, SportProfile};
pub use error::{Result, SyncError};
pub use parser::parse_schedule;
pub use types::{AvailabilityModel, BookingRecord, Slot, SlotStatus, Sport, SyncOutcome};
