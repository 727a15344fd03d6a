// GUI entry point for photo-matting
// Two-pane preview with Open File / Cutout / Settings actions

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;
use log::{error, info};
use std::sync::Arc;

mod app;
mod fonts;
mod preview;

use app::MattingApp;
use photo_matting::backend::{Backend, NativeBackend};
use photo_matting::{AppConfig, MattingView, RemoveBgClient};

fn build_view() -> anyhow::Result<MattingView> {
    let config = AppConfig::load()?;
    let client = RemoveBgClient::new(config.api_endpoint.clone(), config.request_timeout())?;
    info!("Matting endpoint: {}", client.endpoint());
    let backend: Arc<dyn Backend> = Arc::new(NativeBackend::new(client));
    Ok(MattingView::new(backend, config.settings_store()))
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let view = match build_view() {
        Ok(view) => view,
        Err(err) => {
            error!("Failed to start: {:#}", err);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Photo Matting",
        options,
        Box::new(|cc| Ok(Box::new(MattingApp::new(cc, view)))),
    )
}
