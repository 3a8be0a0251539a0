//! Command-line front end for pwngrid-rs
//!
//! Replays a monitor-mode capture through the engine, persists what it finds
//! as NDJSON and, on request, runs one advertisement and one
//! deauthentication cycle against a radio that only logs.

pub mod args;
pub mod radio;
pub mod run;
pub mod services;
pub mod store;

pub use args::Cli;
pub use run::{run, RunSummary};
