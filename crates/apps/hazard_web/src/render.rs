use foundation::color::Rgb;
use foundation::math::Vec2;
use layers::{ARC_COLOR, HIGHLIGHT_COLOR, LayerStyle};
use scene::{ProjectedMap, ProjectedRegion};
use viewport::{ArcOverlay, ViewportTransform};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule};

use crate::state::{CHOROPLETH_LAYER_ID, HoverTarget, POINT_LAYER_ID, RenderSnapshot};

const CANVAS_CLEAR: &str = "#eef2f6";
const POINT_OUTLINE: &str = "rgba(255,255,255,0.9)";
const HOVER_WIDTH_PX: f64 = 2.0;
const FOCUS_WIDTH_PX: f64 = 1.5;
const ARC_WIDTH_PX: f64 = 2.0;
const ARC_SEGMENTS: usize = 48;

/// Draws one frame. Region geometry is drawn in map space under the
/// viewport transform; points and the arc overlay in screen space so they
/// keep their pixel size at any zoom.
pub fn render_map(
    ctx: &CanvasRenderingContext2d,
    map: &ProjectedMap,
    snap: &RenderSnapshot,
    style: &LayerStyle,
) -> Result<(), JsValue> {
    let w = snap.width.max(1.0);
    let h = snap.height.max(1.0);
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_global_alpha(1.0);
    ctx_set_fill_style(ctx, CANVAS_CLEAR);
    ctx.fill_rect(0.0, 0.0, w, h);

    for &layer in &snap.layer_order {
        if layer == CHOROPLETH_LAYER_ID {
            draw_regions(ctx, map, snap, style)?;
        } else if layer == POINT_LAYER_ID {
            draw_points(ctx, snap, &snap.transform);
        }
    }
    Ok(())
}

/// Region fills and outlines in map space, then the arc overlay that belongs
/// to the focused region.
fn draw_regions(
    ctx: &CanvasRenderingContext2d,
    map: &ProjectedMap,
    snap: &RenderSnapshot,
    style: &LayerStyle,
) -> Result<(), JsValue> {
    let t = snap.transform;
    ctx.set_transform(t.k, 0.0, 0.0, t.k, t.x, t.y)?;
    let px = 1.0 / t.k.max(1e-9);
    ctx.set_line_join("round");

    if style.visible {
        ctx.set_global_alpha(style.opacity.clamp(0.0, 1.0));
        ctx_set_stroke_style(ctx, &style.stroke.to_hex());
        ctx.set_line_width(style.stroke_width * px);
        for fill in &snap.choropleth.fills {
            let Some(region) = map.get(fill.index) else {
                continue;
            };
            trace_region(ctx, region);
            ctx_set_fill_style(ctx, &fill.fill.to_hex());
            ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
            ctx.stroke();
        }
        ctx.set_global_alpha(1.0);
    }

    if let Some(region) = snap.focused.and_then(|i| map.get(i)) {
        outline(ctx, region, ARC_COLOR, FOCUS_WIDTH_PX * px);
    }
    if let Some(HoverTarget::Region(i)) = snap.hovered {
        if let Some(region) = map.get(i) {
            outline(ctx, region, HIGHLIGHT_COLOR, HOVER_WIDTH_PX * px);
        }
    }

    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    if let Some(overlay) = &snap.overlay {
        draw_arc(ctx, overlay, &t);
    }
    Ok(())
}

fn trace_region(ctx: &CanvasRenderingContext2d, region: &ProjectedRegion) {
    ctx.begin_path();
    for ring in region.polygons.iter().flatten() {
        let Some((first, rest)) = ring.split_first() else {
            continue;
        };
        ctx.move_to(first.x, first.y);
        for p in rest {
            ctx.line_to(p.x, p.y);
        }
        ctx.close_path();
    }
}

fn outline(ctx: &CanvasRenderingContext2d, region: &ProjectedRegion, color: Rgb, width: f64) {
    trace_region(ctx, region);
    ctx_set_stroke_style(ctx, &color.to_hex());
    ctx.set_line_width(width);
    ctx.stroke();
}

fn draw_arc(ctx: &CanvasRenderingContext2d, overlay: &ArcOverlay, t: &ViewportTransform) {
    let (t0, t1) = overlay.visible_range();
    if t1 - t0 <= 0.0 {
        return;
    }
    let samples = overlay.path.sample(t0, t1, ARC_SEGMENTS);
    let screen: Vec<Vec2> = samples.into_iter().map(|p| t.apply(p)).collect();
    let Some((first, rest)) = screen.split_first() else {
        return;
    };
    ctx_set_stroke_style(ctx, &ARC_COLOR.to_hex());
    ctx.set_line_width(ARC_WIDTH_PX);
    ctx.set_line_cap("round");
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();
}

fn draw_points(ctx: &CanvasRenderingContext2d, snap: &RenderSnapshot, t: &ViewportTransform) {
    let hovered = match snap.hovered {
        Some(HoverTarget::Point(i)) => Some(i),
        _ => None,
    };
    ctx_set_stroke_style(ctx, POINT_OUTLINE);
    ctx.set_line_width(1.0);
    for mark in &snap.points.marks {
        let p = t.apply(mark.position);
        let r = if hovered == Some(mark.index) {
            snap.point_radius * 1.8
        } else {
            snap.point_radius
        };
        ctx.begin_path();
        let _ = ctx.arc(p.x, p.y, r, 0.0, std::f64::consts::TAU);
        ctx_set_fill_style(ctx, &mark.color.to_hex());
        ctx.fill();
        ctx.stroke();
    }
}

fn ctx_set_fill_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(value),
    );
}

fn ctx_set_stroke_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(value),
    );
}
