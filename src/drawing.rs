//! Brush rasterisation into the mask buffers.

use rmat_view::PixelRect;

use crate::mask::{HiddenRaster, MaskArea, MaskModel, MaskViewMode};
use crate::model::{Tool, ToolKind, round_half_up};

/// Image-space rectangle `(x0, y0, x1, y1)`.
pub type WorldBounds = (f64, f64, f64, f64);

/// One brush application on a mask-local rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub region: PixelRect,
    pub kind: ToolKind,
    /// Class written by the draw tool
    pub class: u8,
    /// Colour painted into the hidden raster
    pub colour: [u8; 4],
}

/// Image pixel under a world-space cursor.
pub fn cursor_pixel(cursor: (f64, f64)) -> (i64, i64) {
    (round_half_up(cursor.0), round_half_up(cursor.1))
}

/// Mask-local pixels covered by the brush at `cursor`.
///
/// The square brush is clipped to the part of the image visible in the
/// ports and then to the mask. Returns `None` if nothing is left.
pub fn brush_region(
    cursor: (f64, f64),
    tool: &Tool,
    visible: WorldBounds,
    area: MaskArea,
) -> Option<PixelRect> {
    let (cx, cy) = cursor_pixel(cursor);
    let size = i64::from(tool.rounded_size());
    let offset = tool.offset();

    let x_start = (cx + offset).max(round_half_up(visible.0)) - i64::from(area.x0);
    let y_start = (cy + offset).max(round_half_up(visible.1)) - i64::from(area.y0);
    let x_end = (cx + offset + size).min(round_half_up(visible.2)) - i64::from(area.x0);
    let y_end = (cy + offset + size).min(round_half_up(visible.3)) - i64::from(area.y0);

    let shape = area.shape();
    let x_start = x_start.max(0);
    let y_start = y_start.max(0);
    let x_end = x_end.min(i64::from(shape.width));
    let y_end = y_end.min(i64::from(shape.height));
    if x_end <= x_start || y_end <= y_start {
        return None;
    }

    Some(PixelRect::from_corners(
        x_start as u32,
        y_start as u32,
        x_end as u32,
        y_end as u32,
    ))
}

/// Write a stroke into the buffers and patch the hidden raster.
///
/// The eraser only clears user provenance; labels stay as they are. In the
/// final and user views the touched rectangle of the raster is cleared and,
/// unless erasing, filled with the stroke colour. Returns the rectangle the
/// mask layers need to redraw, if any.
pub fn user_draws_on_mask(
    model: &mut MaskModel,
    raster: &mut HiddenRaster,
    mode: MaskViewMode,
    stroke: &Stroke,
) -> Option<PixelRect> {
    if stroke.kind == ToolKind::Move {
        return None;
    }
    let shape = model.shape();
    for (x, y) in stroke.region.pixels() {
        if x >= shape.width || y >= shape.height {
            continue;
        }
        let index = shape.index(x, y);
        if stroke.kind == ToolKind::Eraser {
            model.user_mask[index] = 0;
        } else {
            model.mask[index] = stroke.class;
            model.user_mask[index] = 1;
        }
    }

    match mode {
        MaskViewMode::Final | MaskViewMode::User => {
            raster.clear_rect(stroke.region);
            if stroke.kind != ToolKind::Eraser {
                raster.fill_rect(stroke.region, stroke.colour);
            }
            Some(stroke.region)
        }
        MaskViewMode::Errors => None,
    }
}
