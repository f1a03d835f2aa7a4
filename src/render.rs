//! Compositor: turns engine state into an ordered list of draw commands.
//!
//! [`compose`] is pure. It reads the raster dimensions, viewport, and
//! annotations and returns [`DrawCmd`]s; [`crate::paint`] replays them on a
//! browser canvas. Draw order is raster, zones, the polygon in progress,
//! then markers, so zone fills never cover a marker.
//!
//! Everything between `SetTransform` and `ResetTransform` is in map space.
//! Stroke widths, handle radii, and label fonts are divided by the scale so
//! they stay the same size on screen at every zoom level.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::camera::{Point, Viewport};
use crate::config::EngineConfig;
use crate::doc::{AnnotationStore, Vertex};
use crate::raster::RasterImage;

// ── Palette ─────────────────────────────────────────────────────

pub const PLACEHOLDER_BG: &str = "#111";
pub const PLACEHOLDER_FG: &str = "#fff";
pub const PLACEHOLDER_FONT: &str = "14px monospace";
pub const PLACEHOLDER_TEXT: &str = "No map loaded.";

pub const ZONE_FILL: &str = "rgba(255,0,0,0.25)";
pub const ZONE_STROKE: &str = "red";
pub const HANDLE_FILL: &str = "rgba(255,255,255,0.9)";
pub const HANDLE_STROKE: &str = "black";
pub const DRAWING_COLOR: &str = "orange";
pub const MARKER_FILL: &str = "lime";
pub const LABEL_COLOR: &str = "#fff";

/// Placeholder text baseline, in screen pixels.
const PLACEHOLDER_AT: Point = Point { x: 10.0, y: 30.0 };

/// Label offset from the marker center, in handle radii.
const LABEL_OFFSET: f64 = 1.6;

/// Stroke color and width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
}

/// One canvas drawing step.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Clear the whole surface (screen space).
    Clear { width: f64, height: f64 },
    /// Fill an axis-aligned rectangle.
    FillRect { x: f64, y: f64, width: f64, height: f64, color: &'static str },
    /// Draw a line of text with its baseline at `(x, y)`.
    Text { text: String, x: f64, y: f64, font: String, color: &'static str },
    /// Enter map space: `screen = map * scale + offset`.
    SetTransform { scale: f64, offset: Point },
    /// Return to screen space.
    ResetTransform,
    /// Draw the map bitmap with its top-left corner at the map origin.
    DrawRaster { width: u32, height: u32 },
    /// A polyline, closed into a polygon when `closed` is set.
    Path { points: Vec<Point>, closed: bool, fill: Option<&'static str>, stroke: Option<Stroke> },
    /// A filled circle with an optional outline.
    Circle { center: Point, radius: f64, fill: &'static str, stroke: Option<Stroke> },
}

/// Read-only view of everything the compositor needs.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// `None` until a map has been decoded and uploaded.
    pub raster: Option<&'a RasterImage>,
    pub viewport: &'a Viewport,
    pub store: &'a AnnotationStore,
    pub config: &'a EngineConfig,
    /// Surface size in CSS pixels.
    pub width: f64,
    pub height: f64,
}

/// Produce the draw commands for one frame.
#[must_use]
pub fn compose(scene: &Scene<'_>) -> Vec<DrawCmd> {
    let mut cmds = vec![DrawCmd::Clear { width: scene.width, height: scene.height }];

    let Some(raster) = scene.raster else {
        cmds.push(DrawCmd::FillRect {
            x: 0.0,
            y: 0.0,
            width: scene.width,
            height: scene.height,
            color: PLACEHOLDER_BG,
        });
        cmds.push(DrawCmd::Text {
            text: PLACEHOLDER_TEXT.to_owned(),
            x: PLACEHOLDER_AT.x,
            y: PLACEHOLDER_AT.y,
            font: PLACEHOLDER_FONT.to_owned(),
            color: PLACEHOLDER_FG,
        });
        return cmds;
    };

    let scale = scene.viewport.scale;
    let line_width = scene.config.line_width_px / scale;
    let handle_radius = scene.config.handle_radius_px / scale;
    let handle_stroke = Some(Stroke { color: HANDLE_STROKE, width: line_width / 2.0 });

    cmds.push(DrawCmd::SetTransform { scale, offset: scene.viewport.offset });
    cmds.push(DrawCmd::DrawRaster { width: raster.width, height: raster.height });

    for zone in scene.store.zones() {
        cmds.push(DrawCmd::Path {
            points: map_points(&zone.vertices),
            closed: true,
            fill: Some(ZONE_FILL),
            stroke: Some(Stroke { color: ZONE_STROKE, width: line_width }),
        });
        for v in &zone.vertices {
            cmds.push(DrawCmd::Circle { center: v.map, radius: handle_radius, fill: HANDLE_FILL, stroke: handle_stroke });
        }
    }

    if let Some(drawing) = scene.store.drawing() {
        cmds.push(DrawCmd::Path {
            points: map_points(drawing),
            closed: false,
            fill: None,
            stroke: Some(Stroke { color: DRAWING_COLOR, width: line_width }),
        });
        for v in drawing {
            cmds.push(DrawCmd::Circle { center: v.map, radius: handle_radius, fill: DRAWING_COLOR, stroke: None });
        }
    }

    let font = format!("{}px monospace", scene.config.label_font_px / scale);
    for marker in scene.store.markers() {
        cmds.push(DrawCmd::Circle { center: marker.map, radius: handle_radius, fill: MARKER_FILL, stroke: handle_stroke });
        cmds.push(DrawCmd::Text {
            text: marker.name.clone(),
            x: marker.map.x + handle_radius * LABEL_OFFSET,
            y: marker.map.y - handle_radius * LABEL_OFFSET,
            font: font.clone(),
            color: LABEL_COLOR,
        });
    }

    cmds.push(DrawCmd::ResetTransform);
    cmds
}

fn map_points(vertices: &[Vertex]) -> Vec<Point> {
    vertices.iter().map(|v| v.map).collect()
}
