//! Captrix - screen recording with automatic zoom and pan.
//!
//! This is the recording core of the Captrix application: the virtual camera
//! that follows user activity, the frame compositor, and the recording
//! session state machine. Capture, input hooks, encoding and the UI are
//! provided by the host through the traits in [`capture`], [`recorder::sink`]
//! and [`persistence`].

pub mod capture;
pub mod compositor;
pub mod persistence;
pub mod recorder;
pub mod settings;
pub mod utils;
pub mod zoom;

pub use recorder::{Recorder, RecorderServices, RecordingOptions, RecordingState};
pub use settings::{AppSettings, ZoomSettings};
pub use utils::{AppError, AppResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
///
/// Reads `RUST_LOG`, defaulting to debug output for this crate. Safe to call
/// more than once; later calls are ignored.
pub fn init_logging() {
    let initialized = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "captrix=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if initialized.is_ok() {
        tracing::info!("Starting Captrix v{}", env!("CARGO_PKG_VERSION"));
    }
}
