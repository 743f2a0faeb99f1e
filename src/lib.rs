//! Publishes a clan's current war to a Google spreadsheet.
//!
//! War data is read from the Clash of Clans API, formatted into one roster
//! table per side and written to the configured ranges, either on demand
//! through `GET /update` or on a fixed schedule.

pub mod api_client;
pub mod api_models;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod server;
pub mod sheets;
