mod r#impl;
mod structs;

pub use r#impl::{config_path, get_config, init_config, update_config};
pub use structs::*;
