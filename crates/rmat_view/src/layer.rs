//! Drawable layers stacked inside a viewport.
//!
//! The set of layers is closed: RGB raster, external map, mask and preview.
//! They share one interface (render, size/position/location changes) and are
//! dispatched through the [`Layer`] enum.

use image::{Rgba, RgbaImage};

use crate::filters::ImageFilters;
use crate::geometry::PixelRect;
use crate::source::SourceCache;
use crate::transform::Transform;

/// Brush footprint colour on the preview layer.
pub const BRUSH_COLOUR: [u8; 4] = [150, 150, 150, 128];
/// Colour of the mask-area boundary.
pub const BOUNDARY_COLOUR: [u8; 4] = [255, 0, 0, 255];
/// Dash pattern of the mask-area boundary: on, off (canvas pixels).
pub const BOUNDARY_DASH: (u32, u32) = (5, 15);
/// Default external map embed endpoint.
pub const DEFAULT_MAP_URL: &str = "https://www.bing.com/maps/embed";

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Tag of a layer variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Rgb,
    ExternalMap,
    Mask,
    Preview,
}

/// Read-only view of the composed mask raster.
#[derive(Debug, Clone, Copy)]
pub struct MaskOverlay<'a> {
    /// Hidden raster, one pixel per mask pixel
    pub raster: &'a RgbaImage,
    /// Position of the mask area inside the image
    pub origin: (u32, u32),
    /// Whether the mask is currently shown
    pub visible: bool,
}

/// Cursor and tool state drawn by the preview layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewState {
    /// Cursor position in image coordinates
    pub cursor: (f64, f64),
    /// Brush edge length in image pixels
    pub tool_size: u32,
    /// Offset of the brush's top-left corner relative to the cursor
    pub tool_offset: i64,
    /// Mask-editable sub-rectangle of the image
    pub mask_area: PixelRect,
}

/// Shared state every layer may read while rendering.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub filters: &'a ImageFilters,
    pub sources: &'a SourceCache,
    pub overlay: Option<MaskOverlay<'a>>,
    pub preview: Option<&'a PreviewState>,
    /// Number of ports in the active group
    pub port_count: usize,
}

/// Size and location an external map is asked to show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRequest {
    pub width: u32,
    pub height: u32,
    pub location: (f64, f64),
}

/// Raster layer showing a view's source through the port transform.
#[derive(Debug)]
pub struct RgbLayer {
    view: String,
    canvas: RgbaImage,
    pending: bool,
}

/// Opaque external map. It only knows what to ask for.
#[derive(Debug)]
pub struct MapLayer {
    base_url: String,
    request: MapRequest,
    url: String,
    refreshes: u32,
}

/// Blits the hidden mask raster.
#[derive(Debug)]
pub struct MaskLayer {
    canvas: RgbaImage,
}

/// Brush footprint and mask boundary; receives the port's pointer input.
#[derive(Debug)]
pub struct PreviewLayer {
    canvas: RgbaImage,
}

#[derive(Debug)]
pub enum Layer {
    Rgb(RgbLayer),
    ExternalMap(MapLayer),
    Mask(MaskLayer),
    Preview(PreviewLayer),
}

impl Layer {
    /// Build a layer of the given kind for a view.
    pub fn new(kind: LayerKind, view: &str, map_url: &str, location: (f64, f64)) -> Self {
        match kind {
            LayerKind::Rgb => Layer::Rgb(RgbLayer {
                view: view.to_string(),
                canvas: RgbaImage::new(0, 0),
                pending: false,
            }),
            LayerKind::ExternalMap => {
                let mut layer = MapLayer {
                    base_url: map_url.to_string(),
                    request: MapRequest {
                        width: 0,
                        height: 0,
                        location,
                    },
                    url: String::new(),
                    refreshes: 0,
                };
                layer.refresh();
                Layer::ExternalMap(layer)
            }
            LayerKind::Mask => Layer::Mask(MaskLayer {
                canvas: RgbaImage::new(0, 0),
            }),
            LayerKind::Preview => Layer::Preview(PreviewLayer {
                canvas: RgbaImage::new(0, 0),
            }),
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Rgb(_) => LayerKind::Rgb,
            Layer::ExternalMap(_) => LayerKind::ExternalMap,
            Layer::Mask(_) => LayerKind::Mask,
            Layer::Preview(_) => LayerKind::Preview,
        }
    }

    /// Redraw after the transform or any shared state changed.
    pub fn render(&mut self, transform: &Transform, ctx: &RenderContext<'_>) {
        match self {
            Layer::Rgb(layer) => layer.render(transform, ctx),
            Layer::ExternalMap(_) => {}
            Layer::Mask(layer) => layer.render(transform, ctx, None),
            Layer::Preview(layer) => layer.render(transform, ctx),
        }
    }

    pub fn size_changed(&mut self, width: u32, height: u32) {
        match self {
            Layer::Rgb(RgbLayer { canvas, .. })
            | Layer::Mask(MaskLayer { canvas })
            | Layer::Preview(PreviewLayer { canvas }) => {
                *canvas = RgbaImage::new(width, height);
            }
            Layer::ExternalMap(layer) => {
                layer.request.width = width;
                layer.request.height = height;
                layer.refresh();
            }
        }
    }

    /// Ports move as a whole; no variant draws position-dependent content.
    pub fn position_changed(&mut self, x: u32, y: u32) {
        log::trace!("{:?} layer moved to ({}, {})", self.kind(), x, y);
    }

    pub fn image_location_changed(&mut self, location: (f64, f64)) {
        if let Layer::ExternalMap(layer) = self {
            layer.request.location = location;
            layer.refresh();
        }
    }

    /// Drawn pixels of canvas-backed layers.
    pub fn canvas(&self) -> Option<&RgbaImage> {
        match self {
            Layer::Rgb(RgbLayer { canvas, .. })
            | Layer::Mask(MaskLayer { canvas })
            | Layer::Preview(PreviewLayer { canvas }) => Some(canvas),
            Layer::ExternalMap(_) => None,
        }
    }

    /// Whether the layer is waiting for its source to finish loading.
    pub fn is_pending(&self) -> bool {
        matches!(self, Layer::Rgb(RgbLayer { pending: true, .. }))
    }

    /// Name of the view whose source this layer draws, if any.
    pub fn source_view(&self) -> Option<&str> {
        match self {
            Layer::Rgb(layer) => Some(&layer.view),
            _ => None,
        }
    }

    /// Whether pointer events on this port are routed through this layer.
    pub fn receives_pointer(&self) -> bool {
        matches!(self, Layer::Preview(_))
    }

    pub fn as_map(&self) -> Option<&MapLayer> {
        match self {
            Layer::ExternalMap(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_mask_mut(&mut self) -> Option<&mut MaskLayer> {
        match self {
            Layer::Mask(layer) => Some(layer),
            _ => None,
        }
    }
}

impl RgbLayer {
    fn render(&mut self, transform: &Transform, ctx: &RenderContext<'_>) {
        let Some(source) = ctx.sources.get(&self.view) else {
            // Drawn again once the source cache reports completion.
            self.pending = true;
            return;
        };
        self.pending = false;

        let Some(inverse) = transform.inverse() else {
            return;
        };
        let (width, height) = (source.width(), source.height());
        for (px, py, pixel) in self.canvas.enumerate_pixels_mut() {
            let (wx, wy) = inverse.to_canvas(f64::from(px) + 0.5, f64::from(py) + 0.5);
            *pixel = match world_to_index(wx, wy, width, height) {
                Some((sx, sy)) => Rgba(ctx.filters.apply(source.get_pixel(sx, sy).0)),
                None => TRANSPARENT,
            };
        }
    }
}

impl MapLayer {
    /// Rebuild the embed URL; the embedding UI reloads whenever it changes.
    fn refresh(&mut self) {
        let (lat, lon) = self.request.location;
        self.url = format!(
            "{}?h={}&w={}&cp={}~{}&lvl=12&typ=d&sty=a&src=SHELL&FORM=MBEDV8",
            self.base_url, self.request.height, self.request.width, lat, lon
        );
        self.refreshes += 1;
        log::debug!("External map refresh #{}: {}", self.refreshes, self.url);
    }

    pub fn request(&self) -> MapRequest {
        self.request
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }
}

impl MaskLayer {
    /// Blit the overlay. With `region` (mask-local) only canvas pixels that
    /// can show that region are touched.
    pub fn render(
        &mut self,
        transform: &Transform,
        ctx: &RenderContext<'_>,
        region: Option<PixelRect>,
    ) {
        let Some(overlay) = ctx.overlay else {
            return;
        };
        let Some(inverse) = transform.inverse() else {
            return;
        };

        let canvas_rect = PixelRect::new(0, 0, self.canvas.width(), self.canvas.height());
        let target = match region {
            None => canvas_rect,
            Some(region) => {
                let world = region.offset(overlay.origin.0, overlay.origin.1);
                world_rect_on_canvas(transform, &world, &canvas_rect)
            }
        };

        let (ox, oy) = (f64::from(overlay.origin.0), f64::from(overlay.origin.1));
        let (width, height) = (overlay.raster.width(), overlay.raster.height());
        for (px, py) in target.pixels() {
            let pixel = if overlay.visible {
                let (wx, wy) = inverse.to_canvas(f64::from(px) + 0.5, f64::from(py) + 0.5);
                match world_to_index(wx - ox, wy - oy, width, height) {
                    Some((mx, my)) => *overlay.raster.get_pixel(mx, my),
                    None => TRANSPARENT,
                }
            } else {
                TRANSPARENT
            };
            self.canvas.put_pixel(px, py, pixel);
        }
    }
}

impl PreviewLayer {
    fn render(&mut self, transform: &Transform, ctx: &RenderContext<'_>) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = TRANSPARENT;
        }
        let Some(preview) = ctx.preview else {
            return;
        };
        let Some(inverse) = transform.inverse() else {
            return;
        };

        // Brush footprint
        let bx = preview.cursor.0 + preview.tool_offset as f64;
        let by = preview.cursor.1 + preview.tool_offset as f64;
        let size = f64::from(preview.tool_size);
        for (px, py, pixel) in self.canvas.enumerate_pixels_mut() {
            let (wx, wy) = inverse.to_canvas(f64::from(px) + 0.5, f64::from(py) + 0.5);
            if wx >= bx && wx < bx + size && wy >= by && wy < by + size {
                *pixel = blend_over(*pixel, Rgba(BRUSH_COLOUR));
            }
        }

        // Dashed mask-area boundary
        let line_width = if ctx.port_count < 2 { 3 } else { 2 };
        let area = preview.mask_area;
        let (x0, y0) = transform.to_canvas(f64::from(area.x), f64::from(area.y));
        let (x1, y1) = transform.to_canvas(f64::from(area.right()), f64::from(area.bottom()));
        let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)];

        let mut travelled = 0u32;
        for edge in corners.windows(2) {
            let (sx, sy) = edge[0];
            let (ex, ey) = edge[1];
            let length = ((ex - sx).abs().max((ey - sy).abs())).round() as u32;
            for step in 0..length {
                let t = f64::from(step) / f64::from(length.max(1));
                let (cx, cy) = (sx + (ex - sx) * t, sy + (ey - sy) * t);
                if (travelled + step) % (BOUNDARY_DASH.0 + BOUNDARY_DASH.1) < BOUNDARY_DASH.0 {
                    self.stamp(cx, cy, line_width);
                }
            }
            travelled += length;
        }
    }

    fn stamp(&mut self, cx: f64, cy: f64, line_width: i64) {
        let half = line_width / 2;
        let (cx, cy) = (cx.floor() as i64, cy.floor() as i64);
        for dy in -half..(line_width - half) {
            for dx in -half..(line_width - half) {
                let (x, y) = (cx + dx, cy + dy);
                if x >= 0
                    && y >= 0
                    && (x as u64) < u64::from(self.canvas.width())
                    && (y as u64) < u64::from(self.canvas.height())
                {
                    self.canvas.put_pixel(x as u32, y as u32, Rgba(BOUNDARY_COLOUR));
                }
            }
        }
    }
}

/// Index of the pixel containing a world point, if inside `width x height`.
fn world_to_index(wx: f64, wy: f64, width: u32, height: u32) -> Option<(u32, u32)> {
    if wx < 0.0 || wy < 0.0 {
        return None;
    }
    let (x, y) = (wx.floor(), wy.floor());
    if x >= f64::from(width) || y >= f64::from(height) {
        return None;
    }
    Some((x as u32, y as u32))
}

/// Canvas pixels covered by a world rectangle, clipped to `canvas`.
fn world_rect_on_canvas(transform: &Transform, world: &PixelRect, canvas: &PixelRect) -> PixelRect {
    let (x0, y0) = transform.to_canvas(f64::from(world.x), f64::from(world.y));
    let (x1, y1) = transform.to_canvas(f64::from(world.right()), f64::from(world.bottom()));
    let clamp_x = |v: f64| v.clamp(0.0, f64::from(canvas.width)) as u32;
    let clamp_y = |v: f64| v.clamp(0.0, f64::from(canvas.height)) as u32;
    PixelRect::from_corners(
        clamp_x(x0.min(x1).floor()),
        clamp_y(y0.min(y1).floor()),
        clamp_x(x0.max(x1).ceil()),
        clamp_y(y0.max(y1).ceil()),
    )
}

/// Porter-Duff "over" of `top` onto `bottom`.
pub fn blend_over(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let ta = f32::from(top[3]) / 255.0;
    if ta <= 0.0 {
        return bottom;
    }
    let ba = f32::from(bottom[3]) / 255.0;
    let out_a = ta + ba * (1.0 - ta);
    let channel = |t: u8, b: u8| {
        let c = (f32::from(t) * ta + f32::from(b) * ba * (1.0 - ta)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        (out_a * 255.0).round() as u8,
    ])
}
