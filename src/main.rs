use anyhow::{Result, anyhow};
use facilitate_studio::app::EditorApp;
use facilitate_studio::config::EditorConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config_path = EditorConfig::default_path();
    let (config, load_err) = match EditorConfig::load_or_default(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (EditorConfig::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    if let Some(e) = load_err {
        warn!("using default settings: {e}");
    }
    info!(path = %config_path.display(), "starting Facilitate Studio");

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Facilitate Studio")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Facilitate Studio",
        native_options,
        Box::new(|cc| Ok(Box::new(EditorApp::new(cc, config, config_path)))),
    )
    .map_err(|e| anyhow!("editor window failed: {e}"))
}
