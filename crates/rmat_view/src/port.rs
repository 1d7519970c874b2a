//! One on-screen tile: a stack of layers sharing a transform.

use image::{Rgba, RgbaImage};

use crate::geometry::PixelRect;
use crate::layer::{blend_over, Layer, LayerKind, RenderContext};
use crate::transform::Transform;
use crate::view::View;

/// Per-port controls shown when the control bar is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct PortControls {
    /// Position of this port in the group
    pub position: usize,
    /// View currently shown
    pub selected: String,
    /// Every view the picker offers
    pub options: Vec<String>,
    pub description: Option<String>,
    /// Whether the remove button is enabled
    pub can_remove: bool,
}

#[derive(Debug)]
pub struct ViewPort {
    pub id: usize,
    pub view: View,
    layers: Vec<Layer>,
    size: u32,
    position: (u32, u32),
    transform: Transform,
}

impl ViewPort {
    pub fn new(id: usize, view: View) -> Self {
        Self {
            id,
            view,
            layers: Vec::new(),
            size: 0,
            position: (0, 0),
            transform: Transform::identity(),
        }
    }

    /// Append a layer on top of the stack.
    pub fn add_layer(&mut self, mut layer: Layer) {
        layer.size_changed(self.size, self.size);
        layer.position_changed(self.position.0, self.position.1);
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn has_layer(&self, kind: LayerKind) -> bool {
        self.layers.iter().any(|l| l.kind() == kind)
    }

    /// Whether pointer events on this port should reach the editor.
    pub fn receives_pointer(&self) -> bool {
        self.layers.iter().any(Layer::receives_pointer)
    }

    /// Ports are square; `size` is the edge length in canvas pixels.
    pub fn set_size(&mut self, size: u32) {
        if self.size == size {
            return;
        }
        self.size = size;
        for layer in &mut self.layers {
            layer.size_changed(size, size);
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_position(&mut self, x: u32, y: u32) {
        self.position = (x, y);
        for layer in &mut self.layers {
            layer.position_changed(x, y);
        }
    }

    pub fn position(&self) -> (u32, u32) {
        self.position
    }

    pub fn image_location_changed(&mut self, location: (f64, f64)) {
        for layer in &mut self.layers {
            layer.image_location_changed(location);
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Render every layer, or only those of `kind`.
    pub fn render(&mut self, kind: Option<LayerKind>, ctx: &RenderContext<'_>) {
        let transform = self.transform;
        for layer in &mut self.layers {
            if kind.is_none_or(|k| layer.kind() == k) {
                layer.render(&transform, ctx);
            }
        }
    }

    /// Redraw the part of the mask layers showing a mask-local rectangle.
    pub fn render_mask_region(&mut self, region: PixelRect, ctx: &RenderContext<'_>) {
        let transform = self.transform;
        for layer in &mut self.layers {
            if let Some(mask) = layer.as_mask_mut() {
                mask.render(&transform, ctx, Some(region));
            }
        }
    }

    /// Re-render RGB layers drawing one of `views` that are still pending.
    pub fn refresh_pending(&mut self, views: &[String], ctx: &RenderContext<'_>) -> bool {
        let transform = self.transform;
        let mut refreshed = false;
        for layer in &mut self.layers {
            let waiting = layer.is_pending()
                && layer
                    .source_view()
                    .is_some_and(|v| views.iter().any(|ready| ready == v));
            if waiting {
                layer.render(&transform, ctx);
                refreshed = true;
            }
        }
        refreshed
    }

    /// Flatten canvas layers bottom to top.
    pub fn composite(&self) -> RgbaImage {
        let mut out = RgbaImage::from_pixel(self.size, self.size, Rgba([0, 0, 0, 0]));
        for canvas in self.layers.iter().filter_map(Layer::canvas) {
            if canvas.dimensions() != out.dimensions() {
                continue;
            }
            for (dst, src) in out.pixels_mut().zip(canvas.pixels()) {
                *dst = blend_over(*dst, *src);
            }
        }
        out
    }

    pub fn controls(&self, position: usize, catalog: &[View], port_count: usize) -> PortControls {
        PortControls {
            position,
            selected: self.view.name.clone(),
            options: catalog.iter().map(|v| v.name.clone()).collect(),
            description: self.view.description.clone(),
            can_remove: port_count > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ImageFilters;
    use crate::layer::{MaskOverlay, DEFAULT_MAP_URL};
    use crate::source::SourceCache;
    use crate::view::ViewKind;

    fn layer(kind: LayerKind) -> Layer {
        Layer::new(kind, "rgb", DEFAULT_MAP_URL, (0.0, 0.0))
    }

    #[test]
    fn test_layers_follow_port_size() {
        let mut port = ViewPort::new(0, View::new("rgb", ViewKind::Image));
        port.set_size(16);
        port.add_layer(layer(LayerKind::Rgb));
        port.set_size(32);

        let canvas = port.layers()[0].canvas().expect("canvas layer");
        assert_eq!(canvas.dimensions(), (32, 32));
        assert_eq!(port.composite().dimensions(), (32, 32));
    }

    #[test]
    fn test_composite_stacks_in_insertion_order() {
        let filters = ImageFilters::new();
        let mut sources = SourceCache::new();
        sources.insert_ready("rgb", RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])));
        let raster = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        let mut port = ViewPort::new(0, View::new("rgb", ViewKind::Image));
        port.set_size(4);
        port.add_layer(layer(LayerKind::Rgb));
        port.add_layer(layer(LayerKind::Mask));

        let ctx = RenderContext {
            filters: &filters,
            sources: &sources,
            overlay: Some(MaskOverlay {
                raster: &raster,
                origin: (0, 0),
                visible: true,
            }),
            preview: None,
            port_count: 1,
        };
        port.render(None, &ctx);
        assert_eq!(port.composite().get_pixel(1, 1).0, [0, 0, 255, 255]);

        let hidden = RenderContext {
            overlay: Some(MaskOverlay {
                raster: &raster,
                origin: (0, 0),
                visible: false,
            }),
            ..ctx
        };
        port.render(Some(LayerKind::Mask), &hidden);
        assert_eq!(port.composite().get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_pointer_needs_preview_layer() {
        let mut port = ViewPort::new(0, View::new("aerial", ViewKind::ExternalMap));
        port.add_layer(layer(LayerKind::ExternalMap));
        assert!(!port.receives_pointer());

        port.add_layer(layer(LayerKind::Preview));
        assert!(port.receives_pointer());
    }

    #[test]
    fn test_controls() {
        let catalog = vec![
            View::new("rgb", ViewKind::Image).with_description("True colour"),
            View::new("aerial", ViewKind::ExternalMap),
        ];
        let port = ViewPort::new(3, catalog[0].clone());
        let controls = port.controls(0, &catalog, 1);
        assert_eq!(controls.selected, "rgb");
        assert_eq!(controls.options, ["rgb", "aerial"]);
        assert_eq!(controls.description.as_deref(), Some("True colour"));
        assert!(!controls.can_remove);
    }
}
