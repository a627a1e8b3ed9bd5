//! System-level modules
//!
//! - Logging initialization
//! - Panic reporting
//! - Shutdown signal handling

pub mod logging;
pub mod panic_handler;
pub mod shutdown;

pub use logging::init_logging;
pub use panic_handler::{RunMode, install_panic_hook};
pub use shutdown::listen_for_shutdown;
