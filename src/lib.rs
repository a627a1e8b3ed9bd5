//! LocalDrop - Share files with peers on the local network
//!
//! Peers find each other through UDP broadcasts and push files and
//! directories to one another over TCP.
//!
//! # Architecture
//! - `core`: Peers, file expansion, progress and event handler traits
//! - `transfer`: TCP session protocol, sender, receiver and transfer log
//! - `discovery`: On-demand discovery and hello/bye announcements
//! - `node`: A running node tying everything together
//! - `interfaces`: Command-line front end
//! - `config`: Configuration management
//! - `system`: Logging, panic reporting and shutdown

pub mod cli;
pub mod config;
pub mod core;
pub mod discovery;
pub mod errors;
pub mod interfaces;
pub mod node;
pub mod system;
pub mod transfer;
pub mod utils;

pub use errors::{LocalDropError, Result};
pub use node::Node;
