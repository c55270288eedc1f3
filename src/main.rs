mod app;
mod config;
mod draw;
mod error;
mod layers;
mod layout;
mod logging;
mod model;
mod propagate;
mod shape;
mod visualization;

use eframe::egui;

use app::VisualizerApp;
use config::Settings;

fn main() -> anyhow::Result<()> {
    logging::init_tracing()?;
    let settings = Settings::load()?;

    let title = settings.window.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size([settings.window.width, settings.window.height])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(VisualizerApp::new(cc, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run {}: {}", title, e))
}
