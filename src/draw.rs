use std::f32::consts::FRAC_PI_4;

use eframe::egui;
use egui::epaint::TextShape;

use crate::config::StyleSettings;
use crate::layout::Layout;
use crate::shape::Block;

/// Gap between the top of the canvas and the first cube's top face.
const TOP_MARGIN: f32 = 50.0;
/// Gap between a cube's front face and the first arrow below it.
const CUBE_GAP: f32 = 80.0;
const SIDE_MARGIN: f32 = 40.0;

/// A cube to draw: front-face top-left corner plus scaled extents, all in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CubePlacement {
    pub origin: egui::Pos2,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub block: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub from: egui::Pos2,
    pub to: egui::Pos2,
}

/// Canvas-local positions for every cube, arrow and transition label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    pub cubes: Vec<CubePlacement>,
    pub arrows: Vec<Arrow>,
    pub labels: Vec<(egui::Pos2, String)>,
    pub size: egui::Vec2,
}

/// Lays the blocks out top to bottom, centered on the wider of `min_width` and the widest cube.
pub fn plan(blocks: &[Block], layout: &Layout, style: &StyleSettings, min_width: f32) -> Plan {
    let m = layout.multiplier;
    let fs = style.font_size;
    let extents: Vec<(f32, f32, f32)> = blocks
        .iter()
        .map(|b| {
            if b.shape.is_unknown() {
                let p = style.placeholder_size;
                (p * m, p * m, p * m)
            } else {
                (
                    b.shape.width as f32 * m,
                    b.shape.height as f32 * m,
                    b.shape.depth as f32 * m,
                )
            }
        })
        .collect();

    let widest = extents.iter().map(|(w, _, d)| w + d).fold(0.0, f32::max);
    let width = min_width.max(widest + 2.0 * (SIDE_MARGIN + fs));
    let cx = width / 2.0;

    let mut result = Plan::default();
    let mut y = TOP_MARGIN + extents.first().map_or(0.0, |e| e.2);

    for (i, &(w, h, d)) in extents.iter().enumerate() {
        result.cubes.push(CubePlacement {
            origin: egui::pos2(cx - (w + d) / 2.0, y),
            width: w,
            height: h,
            depth: d,
            block: i,
        });
        y += h + CUBE_GAP;

        if let Some(next) = blocks.get(i + 1) {
            result.arrows.push(Arrow {
                from: egui::pos2(cx, y),
                to: egui::pos2(cx, y + style.arrow_length),
            });
            y += style.arrow_length;
            result.labels.push((egui::pos2(cx, y + fs + 10.0), next.label.clone()));
            y += fs * 2.0 + 10.0;
            result.arrows.push(Arrow {
                from: egui::pos2(cx, y),
                to: egui::pos2(cx, y + style.arrow_length),
            });
            y += style.arrow_length;
            y += extents[i + 1].2 + fs * 2.0;
        }
    }

    let height = (y + TOP_MARGIN).max(layout.canvas_height as f32);
    result.size = egui::vec2(width, height);
    result
}

/// Paints a `Plan` with its canvas-local coordinates offset by `offset`.
pub struct Canvas<'a> {
    painter: &'a egui::Painter,
    offset: egui::Vec2,
    style: &'a StyleSettings,
    ink: egui::Color32,
}

impl<'a> Canvas<'a> {
    pub fn new(painter: &'a egui::Painter, offset: egui::Vec2, style: &'a StyleSettings) -> Self {
        Self {
            painter,
            offset,
            style,
            ink: egui::Color32::BLACK,
        }
    }

    pub fn paint(&self, plan: &Plan, blocks: &[Block]) {
        for cube in &plan.cubes {
            if let Some(block) = blocks.get(cube.block) {
                self.cube(cube, block, plan.size.x / 2.0);
            }
        }
        for arrow in &plan.arrows {
            self.arrow(arrow);
        }
        for (pos, label) in &plan.labels {
            self.text(*pos, label, egui::Align2::CENTER_BOTTOM);
        }
    }

    fn font(&self) -> egui::FontId {
        egui::FontId::monospace(self.style.font_size)
    }

    fn text(&self, pos: egui::Pos2, text: &str, anchor: egui::Align2) {
        self.painter
            .text(pos + self.offset, anchor, text, self.font(), self.ink);
    }

    fn cube(&self, cube: &CubePlacement, block: &Block, center_x: f32) {
        let o = cube.origin + self.offset;
        let (w, h, d) = (cube.width, cube.height, cube.depth);
        let stroke = egui::Stroke::new(1.0, self.ink);
        let p = |dx: f32, dy: f32| o + egui::vec2(dx, dy);

        self.painter.add(egui::Shape::closed_line(
            vec![p(0.0, 0.0), p(d, -d), p(d + w, -d), p(d + w, -d + h), p(w, h), p(0.0, h)],
            stroke,
        ));
        self.painter
            .add(egui::Shape::line(vec![p(0.0, 0.0), p(w, 0.0), p(w, h)], stroke));
        self.painter.line_segment([p(w, 0.0), p(d + w, -d)], stroke);

        let shape = block.shape;
        let (width, height, depth) = if shape.is_unknown() {
            ("?".to_string(), "?".to_string(), "?".to_string())
        } else {
            (
                shape.width.to_string(),
                shape.height.to_string(),
                shape.depth.to_string(),
            )
        };
        let fs = self.style.font_size;
        let o_local = cube.origin;

        self.text(o_local + egui::vec2(w / 2.0, h + fs), &width, egui::Align2::CENTER_BOTTOM);
        self.text(
            o_local + egui::vec2(-fs, h / 2.0 + fs / 2.0),
            &height,
            egui::Align2::CENTER_BOTTOM,
        );
        self.depth_label(o + egui::vec2(w, h), d, &depth);
        self.text(
            egui::pos2(center_x, o_local.y + h + fs * 3.0),
            &shape.to_string(),
            egui::Align2::CENTER_BOTTOM,
        );
    }

    /// Writes `text` along the receding bottom-right edge, rotated 45° counter-clockwise.
    fn depth_label(&self, corner: egui::Pos2, d: f32, text: &str) {
        let rot = egui::emath::Rot2::from_angle(-FRAC_PI_4);
        let along = d / FRAC_PI_4.sin() / 2.0;
        let center = corner + rot * egui::vec2(along, self.style.font_size / 2.0);

        let galley = self.painter.layout_no_wrap(text.to_string(), self.font(), self.ink);
        let pos = center - rot * (galley.size() / 2.0);
        self.painter
            .add(TextShape::new(pos, galley, self.ink).with_angle(-FRAC_PI_4));
    }

    fn arrow(&self, arrow: &Arrow) {
        let from = arrow.from + self.offset;
        let to = arrow.to + self.offset;
        let head = self.style.arrow_head;
        self.painter
            .line_segment([from, to], egui::Stroke::new(3.0, self.ink));
        self.painter.add(egui::Shape::convex_polygon(
            vec![
                to + egui::vec2(-head / 2.0, -head),
                to + egui::vec2(head / 2.0, -head),
                to,
            ],
            self.ink,
            egui::Stroke::new(3.0, self.ink),
        ));
    }
}
