//! Canvas backend: replays [`DrawCmd`]s onto a 2D context.
//!
//! This module and [`crate::engine::Engine`] are the only places that touch
//! `web_sys`. All fallible `Canvas2D` calls propagate errors via
//! `Result<(), JsValue>`; the caller decides what to do with them.

use std::f64::consts::TAU;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::raster::RasterImage;
use crate::render::{DrawCmd, Stroke};

/// Replay `cmds` onto `ctx`.
///
/// `raster` is the off-screen canvas holding the current map bitmap; when
/// it is `None`, `DrawRaster` is skipped. `dpr` is the device pixel ratio.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn paint(
    ctx: &CanvasRenderingContext2d,
    cmds: &[DrawCmd],
    raster: Option<&HtmlCanvasElement>,
    dpr: f64,
) -> Result<(), JsValue> {
    for cmd in cmds {
        match cmd {
            DrawCmd::Clear { width, height } => {
                ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
                ctx.clear_rect(0.0, 0.0, *width, *height);
            }
            DrawCmd::FillRect { x, y, width, height, color } => {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(*x, *y, *width, *height);
            }
            DrawCmd::Text { text, x, y, font, color } => {
                ctx.set_font(font);
                ctx.set_fill_style_str(color);
                ctx.fill_text(text, *x, *y)?;
            }
            DrawCmd::SetTransform { scale, offset } => {
                let s = scale * dpr;
                ctx.set_transform(s, 0.0, 0.0, s, offset.x * dpr, offset.y * dpr)?;
            }
            DrawCmd::ResetTransform => ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?,
            DrawCmd::DrawRaster { .. } => {
                if let Some(bitmap) = raster {
                    ctx.draw_image_with_html_canvas_element(bitmap, 0.0, 0.0)?;
                }
            }
            DrawCmd::Path { points, closed, fill, stroke } => {
                let Some((first, rest)) = points.split_first() else {
                    continue;
                };
                ctx.begin_path();
                ctx.move_to(first.x, first.y);
                for p in rest {
                    ctx.line_to(p.x, p.y);
                }
                if *closed {
                    ctx.close_path();
                }
                finish_shape(ctx, *fill, *stroke);
            }
            DrawCmd::Circle { center, radius, fill, stroke } => {
                ctx.begin_path();
                ctx.arc(center.x, center.y, *radius, 0.0, TAU)?;
                finish_shape(ctx, Some(*fill), *stroke);
            }
        }
    }
    Ok(())
}

fn finish_shape(ctx: &CanvasRenderingContext2d, fill: Option<&str>, stroke: Option<Stroke>) {
    if let Some(color) = fill {
        ctx.set_fill_style_str(color);
        ctx.fill();
    }
    if let Some(stroke) = stroke {
        ctx.set_line_width(stroke.width);
        ctx.set_stroke_style_str(stroke.color);
        ctx.stroke();
    }
}

/// Upload an RGBA raster into a fresh off-screen canvas.
///
/// # Errors
///
/// Returns `Err` when there is no document, the 2D context is unavailable,
/// or the pixel buffer does not match the dimensions.
pub fn upload_raster(raster: &RasterImage) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_width(raster.width);
    canvas.set_height(raster.height);

    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into()?;
    let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(&raster.rgba), raster.width, raster.height)?;
    ctx.put_image_data(&image, 0.0, 0.0)?;
    Ok(canvas)
}
