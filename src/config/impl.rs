use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use parking_lot::{RwLock, const_rwlock};

use super::{StaticConfig, resolve_config_path};
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();
static CONFIG_PATH: RwLock<Option<PathBuf>> = const_rwlock(None);

/// Get the global configuration instance
///
/// Falls back to in-memory defaults when `init_config` was never called.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads from `path` when given, otherwise from the platform config file.
/// A missing file means in-memory defaults.
pub fn init_config(path: Option<&Path>) -> Result<Arc<StaticConfig>> {
    let config = StaticConfig::load(path)?;
    config.validate()?;
    *CONFIG_PATH.write() = Some(resolve_config_path(path));

    let config = Arc::new(config);
    match CONFIG.get() {
        Some(swap) => swap.store(config.clone()),
        None => {
            let _ = CONFIG.set(ArcSwap::new(config.clone()));
            // lost a race: make sure our value wins
            if let Some(swap) = CONFIG.get() {
                swap.store(config.clone());
            }
        }
    }
    Ok(config)
}

/// Path the configuration is read from and saved to
pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .clone()
        .unwrap_or_else(|| resolve_config_path(None))
}

/// Replace the global configuration and persist it
pub fn update_config<F>(mutate: F) -> Result<Arc<StaticConfig>>
where
    F: FnOnce(&mut StaticConfig),
{
    let mut next = (*get_config()).clone();
    mutate(&mut next);
    next.validate()?;
    next.save_to_file(config_path())?;

    let next = Arc::new(next);
    if let Some(swap) = CONFIG.get() {
        swap.store(next.clone());
    }
    Ok(next)
}
