pub mod config;
pub mod rating;
pub mod telemetry;
