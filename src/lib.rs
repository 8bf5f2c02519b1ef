//! Taskify - a personal task manager that turns free-form text into tasks
//!
//! This library provides the core functionality for Taskify, including:
//! - Natural-language and remote parsing of raw text into tasks
//! - Reminder scheduling with at most one pending notification per task
//! - The shared task store read by the widget process
//! - The ingestion pipeline that ties them together
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use taskify::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod reminder;
pub mod store;
pub mod widget;

#[cfg(test)]
mod testing;
