pub mod auth;
pub mod config;
pub mod error;
pub mod ledger;
pub mod reports;
pub mod router;
pub mod scoring;
pub mod sync;
pub mod telemetry;
