//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; later calls are no-ops. Tests and demo
/// binaries share this entry point.
pub fn init() {
    let _ = env_logger::builder()
        .is_test(cfg!(test))
        .try_init();
}
