// Core data models for Taskify
// These structs represent the domain entities

pub mod task;
pub mod filter;

pub use task::*;
pub use filter::*;
