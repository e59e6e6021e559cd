//! WatchVis - Main Entry Point
//!
//! Desktop client for live watcher visualization and control of an
//! embedded audio/sensor board.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use watchvis_rs::{
    config::{self, AppConfig, AppState},
    frontend::WatchVisApp,
    host,
};

fn main() -> eframe::Result<()> {
    // Initialize logging: stderr plus a daily rolling file in the app
    // data directory when it is available
    let file_layer = config::ensure_app_data_dir().ok().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "watchvis.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
            guard,
        )
    });
    let _log_guard = match file_layer {
        Some((layer, guard)) => {
            tracing_subscriber::registry()
                .with(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("info,watchvis_rs=debug")),
                )
                .with(tracing_subscriber::fmt::layer())
                .with(layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("info,watchvis_rs=debug")),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();
            None
        }
    };

    tracing::info!("Starting WatchVis");

    let app_state = AppState::load_or_default();
    let config = AppConfig::load_or_default();

    // Create the host bridge and hand the endpoint to the transport
    let (bridge, endpoint) = host::channel();

    #[cfg(feature = "mock-host")]
    let _host_handle = watchvis_rs::host::mock::MockHost::spawn(endpoint);
    #[cfg(not(feature = "mock-host"))]
    drop(endpoint);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 480.0])
            .with_title("WatchVis"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "WatchVis",
        native_options,
        Box::new(|cc| Ok(Box::new(WatchVisApp::new(cc, bridge, config, app_state)))),
    );

    tracing::info!("Shutting down...");

    result
}
