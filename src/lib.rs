pub mod aggregator;
pub mod cli;
pub mod config;
pub mod mock;
pub mod telemetry;
pub mod web;
