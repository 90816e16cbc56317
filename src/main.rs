use eframe::CreationContext;
use privacy_portal::app::PortalApp;
use privacy_portal::config::PortalConfig;
use std::path::PathBuf;

const CONFIG_ENV: &str = "PORTAL_CONFIG";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "privacy_portal=info".into()),
        )
        .init();

    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = PortalConfig::load(config_path.as_deref())?;
    let app = PortalApp::new(&config)?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([720.0, 760.0])
            .with_min_inner_size([480.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Privacy Portal",
        options,
        Box::new(move |_cc: &CreationContext| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the window: {e}"))
}
