mod analysis;
mod app;
mod config;
#[cfg(test)]
mod testing;
mod utils;

use analysis::{AnalysisService, HttpAnalysisService};
use app::SheetChecker;
use config::AppConfig;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::sync::Arc;

fn init_logging(config: &AppConfig) {
    let log_config = ConfigBuilder::new()
        .add_filter_ignore_str("wgpu")
        .add_filter_ignore_str("naga")
        .add_filter_ignore_str("winit")
        .build();
    if let Err(e) = TermLogger::init(
        config.log_level_filter(),
        log_config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logger: {}", e);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, warnings) = AppConfig::load();
    init_logging(&config);
    for warning in &warnings {
        log::warn!("{}", warning);
    }
    log::info!(
        "Service {} (timeout {:?}), downloads in {:?}",
        config.service_url,
        config.request_timeout(),
        config.resolved_download_dir()
    );

    let service: Arc<dyn AnalysisService> = Arc::new(HttpAnalysisService::new(
        config.service_url.clone(),
        config.request_timeout(),
    )?);
    let download_dir = config.resolved_download_dir();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([760.0, 720.0])
            .with_min_inner_size([480.0, 520.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Analyse de fichiers Excel",
        options,
        Box::new(move |cc| Box::new(SheetChecker::new(cc, service, download_dir))),
    )?;
    Ok(())
}
