use tracing::info;

use crate::config::LayoutSettings;
use crate::error::VisualizerError;
use crate::layout::Layout;
use crate::model::parse_model;
use crate::propagate::propagate;
use crate::shape::{Block, Shape};

/// Everything the renderer needs for one loaded model.
#[derive(Debug, Clone, PartialEq)]
pub struct Visualization {
    pub name: Option<String>,
    pub blocks: Vec<Block>,
    pub layout: Layout,
    /// Display width the layout was computed for.
    pub display_width: f32,
}

impl Visualization {
    /// Parses, propagates and lays out a model document in one step.
    pub fn from_json(
        json: &str,
        settings: &LayoutSettings,
        display_width: f32,
    ) -> Result<Self, VisualizerError> {
        let model = parse_model(json)?;
        let blocks = propagate(Shape::UNKNOWN, &model.layers)?;
        let layout = Layout::compute(&blocks, settings, display_width)?;
        info!(
            name = model.name.as_deref().unwrap_or("unnamed"),
            layers = model.layers.len(),
            blocks = blocks.len(),
            multiplier = layout.multiplier,
            "loaded model"
        );
        Ok(Self {
            name: model.name,
            blocks,
            layout,
            display_width,
        })
    }

    /// Recomputes the layout when the display width changed.
    pub fn relayout(
        &mut self,
        settings: &LayoutSettings,
        display_width: f32,
    ) -> Result<(), VisualizerError> {
        if (self.display_width - display_width).abs() < 0.5 {
            return Ok(());
        }
        self.layout = Layout::compute(&self.blocks, settings, display_width)?;
        self.display_width = display_width;
        Ok(())
    }
}
