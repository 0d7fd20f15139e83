//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logger setup
//! - Wall-clock time
//! - Key/value storage (LocalStorage on web, JSON files natively)

/// Environment variable naming the native storage directory
pub const DATA_DIR_ENV: &str = "VAULT_GUARDIAN_DATA_DIR";

/// Install the logger for this target
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Already installed
    }
}

/// Install the logger for this target (honors `RUST_LOG`, defaults to info)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn unix_time_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn unix_time_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}

/// Read a stored value
#[cfg(target_arch = "wasm32")]
pub fn storage_read(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

/// Store a value. Returns false if the write failed.
#[cfg(target_arch = "wasm32")]
pub fn storage_write(key: &str, value: &str) -> bool {
    local_storage().is_some_and(|s| s.set_item(key, value).is_ok())
}

#[cfg(target_arch = "wasm32")]
pub fn storage_remove(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn storage_path(key: &str) -> std::path::PathBuf {
    let dir = std::env::var_os(DATA_DIR_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    dir.join(format!("{key}.json"))
}

/// Read a stored value
#[cfg(not(target_arch = "wasm32"))]
pub fn storage_read(key: &str) -> Option<String> {
    std::fs::read_to_string(storage_path(key)).ok()
}

/// Store a value. Returns false if the write failed.
#[cfg(not(target_arch = "wasm32"))]
pub fn storage_write(key: &str, value: &str) -> bool {
    let path = storage_path(key);
    match std::fs::write(&path, value) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not write {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn storage_remove(key: &str) {
    let _ = std::fs::remove_file(storage_path(key));
}
