//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
pub fn init() {
    // Tests and embedding hosts may have installed a logger already
    let _ = env_logger::builder().try_init();
}
