use eframe::egui;
use tracing::{info, warn};

use crate::config::Settings;
use crate::draw::{Canvas, plan};
use crate::visualization::Visualization;

const EXAMPLE_MODEL: &str = include_str!("../assets/example_model.json");

/// Presentation state. This is the only place anything is mutated after startup.
pub struct VisualizerApp {
    settings: Settings,
    visualization: Option<Visualization>,
    pasted_json: String,
    status: Option<String>,
    /// Last width the canvas was given, used when a model is loaded.
    display_width: f32,
}

impl VisualizerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        let display_width = settings.window.width;
        Self {
            settings,
            visualization: None,
            pasted_json: String::new(),
            status: None,
            display_width,
        }
    }

    /// Replaces the current visualization, or keeps it and reports why the new one failed.
    fn load(&mut self, source: &str, json: &str) {
        match Visualization::from_json(json, &self.settings.layout, self.display_width) {
            Ok(vis) => {
                info!(source, blocks = vis.blocks.len(), "model ready");
                self.visualization = Some(vis);
                self.status = None;
            }
            Err(err) => {
                warn!(source, error = %err, "failed to load model");
                self.status = Some(format!("{}: {}", source, err));
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            let source = file
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| file.name.clone());
            let text = if let Some(bytes) = &file.bytes {
                String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
            } else if let Some(path) = &file.path {
                std::fs::read_to_string(path).map_err(|e| e.to_string())
            } else {
                Err("dropped file has no contents".to_string())
            };
            match text {
                Ok(json) => self.load(&source, &json),
                Err(err) => {
                    warn!(source = %source, error = %err, "failed to read dropped file");
                    self.status = Some(format!("{}: {}", source, err));
                }
            }
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading(egui::RichText::new(&self.settings.window.title).size(48.0));
            ui.label("take a peek at your model's inner workings");
            ui.add_space(12.0);
            ui.label("drop a Keras model JSON file anywhere in the window");
            ui.label("or");
            if ui.button("load an example").clicked() {
                self.load("example", EXAMPLE_MODEL);
            }
        });

        egui::CollapsingHeader::new("paste model JSON")
            .default_open(false)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.pasted_json)
                        .code_editor()
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                );
                if ui.button("load").clicked() {
                    let json = self.pasted_json.clone();
                    self.load("pasted JSON", &json);
                }
            });

        if let Some(status) = &self.status {
            ui.colored_label(egui::Color32::DARK_RED, status.as_str());
        }
    }

    fn draw_model(&mut self, ui: &mut egui::Ui) {
        let width = ui.available_width();
        if width > 0.0 {
            self.display_width = width;
        }

        let Some(vis) = self.visualization.as_mut() else {
            return;
        };
        if let Err(err) = vis.relayout(&self.settings.layout, self.display_width) {
            warn!(error = %err, "relayout failed, keeping previous scale");
        }

        if let Some(name) = &vis.name {
            ui.vertical_centered(|ui| ui.label(egui::RichText::new(name).strong()));
        }

        let plan = plan(&vis.blocks, &vis.layout, &self.settings.style, self.display_width);
        let (response, painter) = ui.allocate_painter(plan.size, egui::Sense::hover());
        Canvas::new(&painter, response.rect.min.to_vec2(), &self.settings.style)
            .paint(&plan, &vis.blocks);
    }
}

impl eframe::App for VisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                self.draw_controls(ui);
                ui.separator();
                self.draw_model(ui);
            });
        });

        if ctx.input(|i| !i.raw.hovered_files.is_empty()) {
            let screen = ctx.screen_rect();
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Foreground,
                egui::Id::new("drop_overlay"),
            ));
            painter.rect_filled(screen, 0.0, egui::Color32::from_black_alpha(160));
            painter.text(
                screen.center(),
                egui::Align2::CENTER_CENTER,
                "drop to load",
                egui::FontId::proportional(32.0),
                egui::Color32::WHITE,
            );
        }
    }
}
