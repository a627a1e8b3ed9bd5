//! CLI command implementations
//!
//! This module re-exports all CLI command functions.

mod config_management;
mod console;
mod identity;
mod peers;
mod serve;
mod transfer;

pub use config_management::*;
pub use console::ConsoleHandler;
pub use identity::*;
pub use peers::*;
pub use serve::*;
pub use transfer::*;
