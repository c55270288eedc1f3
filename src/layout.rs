use tracing::debug;

use crate::config::{LayoutSettings, ScaleAxis};
use crate::error::VisualizerError;
use crate::shape::{Block, Shape};

/// Scale and canvas size for drawing a block sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Pixels per shape unit.
    pub multiplier: f32,
    /// Vertical pixels needed to draw every block, arrow and label.
    pub canvas_height: u32,
}

impl Layout {
    pub fn compute(
        blocks: &[Block],
        settings: &LayoutSettings,
        display_width: f32,
    ) -> Result<Self, VisualizerError> {
        let target = display_width * settings.min_block_fraction;
        let multiplier = compute_multiplier(blocks, settings.scale_axis, target)?;
        let canvas_height = compute_canvas_extent(blocks, multiplier, settings);
        debug!(multiplier, canvas_height, display_width, "computed layout");
        Ok(Self {
            multiplier,
            canvas_height,
        })
    }
}

fn extent(shape: &Shape, axis: ScaleAxis) -> usize {
    match axis {
        ScaleAxis::Width => shape.width,
        ScaleAxis::Height => shape.height,
        ScaleAxis::Depth => shape.depth,
    }
}

/// Returns the multiplier that maps the smallest extent along `axis` to `target_min_pixels`.
///
/// The minimum is taken over every block, so an unknown-shape block makes the layout degenerate.
pub fn compute_multiplier(
    blocks: &[Block],
    axis: ScaleAxis,
    target_min_pixels: f32,
) -> Result<f32, VisualizerError> {
    if blocks.is_empty() {
        return Err(VisualizerError::degenerate("no blocks to lay out"));
    }
    if !(target_min_pixels.is_finite() && target_min_pixels > 0.0) {
        return Err(VisualizerError::degenerate(format!(
            "target block size {} is not positive",
            target_min_pixels
        )));
    }

    // min_by_key keeps the first minimum on ties
    let smallest = blocks
        .iter()
        .min_by_key(|b| extent(&b.shape, axis))
        .ok_or_else(|| VisualizerError::degenerate("no blocks to lay out"))?;

    let min = extent(&smallest.shape, axis);
    if min == 0 {
        return Err(VisualizerError::degenerate(format!(
            "block `{}` {} has a zero {:?} extent",
            smallest.label, smallest.shape, axis
        )));
    }

    Ok(target_min_pixels / min as f32)
}

/// Vertical pixels needed for `blocks`: their scaled height plus depth, plus fixed spacing.
pub fn compute_canvas_extent(
    blocks: &[Block],
    multiplier: f32,
    settings: &LayoutSettings,
) -> u32 {
    let units: f64 = blocks
        .iter()
        .map(|b| b.shape.height as f64 + b.shape.depth as f64)
        .sum();
    let total = units * multiplier as f64
        + settings.block_spacing as f64 * blocks.len() as f64
        + settings.base_margin as f64;
    total.ceil().clamp(1.0, u32::MAX as f64) as u32
}
