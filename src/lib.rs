//! # WatchVis: Live Watcher Visualization Client
//!
//! A desktop client that mirrors the watcher state of an embedded
//! audio/sensor board: it reconciles a local set of UI control groups
//! against periodic `list` snapshots from the board, pushes user edits
//! back as discrete commands, and renders live binary sample buffers as
//! fading traces.
//!
//! ## Architecture
//!
//! - **Sync**: [`sync::WatcherSync`] owns the name-keyed control groups
//!   and maps user edits to outgoing commands, with echo suppression for
//!   remote-driven updates
//! - **Decode**: [`decode`] is the pure buffer stage - timestamp
//!   reconstruction, monitor/trace classification, staleness gating
//! - **Frontend**: [`frontend::WatchVisApp`] renders the control table
//!   and trace canvas with eframe/egui
//! - **Host**: [`host`] bridges the UI to the transport that owns the
//!   actual board session; [`host::mock`] simulates a board for
//!   development
//! - **Protocol**: [`protocol`] defines the JSON control messages in
//!   both directions
//!
//! ## Example
//!
//! ```ignore
//! use watchvis_rs::{config::{AppConfig, AppState}, frontend::WatchVisApp, host};
//!
//! fn main() -> eframe::Result<()> {
//!     let (bridge, endpoint) = host::channel();
//!     // hand `endpoint` to the transport (or host::mock::MockHost)
//!     eframe::run_native(
//!         "WatchVis",
//!         eframe::NativeOptions::default(),
//!         Box::new(|cc| {
//!             Ok(Box::new(WatchVisApp::new(
//!                 cc,
//!                 bridge,
//!                 AppConfig::load_or_default(),
//!                 AppState::load_or_default(),
//!             )))
//!         }),
//!     )
//! }
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod frontend;
pub mod host;
pub mod protocol;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, AppState};
pub use decode::{Classified, FrameBuffer, KindMemory};
pub use error::{Result, WatchVisError};
pub use frontend::WatchVisApp;
pub use protocol::{ClientMessage, ControlEnvelope, WatcherCommand};
pub use sync::{ControlGroup, GroupEdit, WatcherSync};
pub use types::{WatcherDescriptor, WatcherKind};
