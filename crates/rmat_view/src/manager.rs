//! View manager: catalog, groups, ports and the transform they share.
//!
//! Every port of the active group shows the same part of the image. Pan and
//! zoom are computed on the first port and mirrored onto the others.

use crate::error::{Result, ViewError};
use crate::filters::ImageFilters;
use crate::geometry::PixelRect;
use crate::layer::{Layer, LayerKind, MaskOverlay, PreviewState, RenderContext, DEFAULT_MAP_URL};
use crate::port::{PortControls, ViewPort};
use crate::source::SourceCache;
use crate::transform::Transform;
use crate::view::{View, ViewGroup, ViewKind, DEFAULT_GROUP};

/// Vertical space kept free for toolbars below the ports.
pub const DEFAULT_RESERVED_HEIGHT: u32 = 100;

/// Decides whether a standard layer is attached to a view.
pub type LayerPredicate = Box<dyn Fn(&View) -> bool>;

/// Called after the shown group changed, e.g. to persist it.
pub type GroupChangedCallback = Box<dyn Fn(&ViewGroup)>;

struct StandardLayer {
    kind: LayerKind,
    accepts: LayerPredicate,
}

pub struct ViewManager {
    views: Vec<View>,
    groups: Vec<ViewGroup>,
    current_group: String,
    standard_layers: Vec<StandardLayer>,
    ports: Vec<ViewPort>,
    next_port_id: usize,

    image_shape: (u32, u32),
    image_location: (f64, f64),
    filters: ImageFilters,
    sources: SourceCache,

    window: (u32, u32),
    port_size: u32,
    reserved_height: u32,
    map_url: String,
    controls_visible: bool,
    on_group_changed: Option<GroupChangedCallback>,
}

impl ViewManager {
    /// Create a manager over a view catalog. A `default` group listing every
    /// view is added when `groups` has none.
    pub fn new(views: Vec<View>, mut groups: Vec<ViewGroup>) -> Self {
        if !groups.iter().any(|g| g.name == DEFAULT_GROUP) {
            let all = views.iter().map(|v| v.name.clone()).collect();
            groups.insert(0, ViewGroup::new(DEFAULT_GROUP, all));
        }
        Self {
            views,
            groups,
            current_group: DEFAULT_GROUP.to_string(),
            standard_layers: Vec::new(),
            ports: Vec::new(),
            next_port_id: 0,
            image_shape: (1, 1),
            image_location: (0.0, 0.0),
            filters: ImageFilters::new(),
            sources: SourceCache::new(),
            window: (0, 0),
            port_size: 1,
            reserved_height: DEFAULT_RESERVED_HEIGHT,
            map_url: DEFAULT_MAP_URL.to_string(),
            controls_visible: false,
            on_group_changed: None,
        }
    }

    /// The layer set every editor uses: RGB and mask and preview on image
    /// views, the external map on map views.
    pub fn with_default_layers(mut self) -> Self {
        self.add_standard_layer(LayerKind::Rgb, Box::new(View::is_image));
        self.add_standard_layer(
            LayerKind::ExternalMap,
            Box::new(|v: &View| v.kind == ViewKind::ExternalMap),
        );
        self.add_standard_layer(LayerKind::Mask, Box::new(View::is_image));
        self.add_standard_layer(LayerKind::Preview, Box::new(View::is_image));
        self
    }

    pub fn set_reserved_height(&mut self, reserved_height: u32) {
        self.reserved_height = reserved_height;
    }

    pub fn set_map_url(&mut self, map_url: &str) {
        self.map_url = map_url.to_string();
    }

    pub fn set_on_group_changed(&mut self, callback: GroupChangedCallback) {
        self.on_group_changed = Some(callback);
    }

    /// Register a layer attached to every port whose view `accepts`.
    /// Layers stack in registration order.
    pub fn add_standard_layer(&mut self, kind: LayerKind, accepts: LayerPredicate) {
        self.standard_layers.push(StandardLayer { kind, accepts });
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn groups(&self) -> &[ViewGroup] {
        &self.groups
    }

    pub fn current_group(&self) -> &str {
        &self.current_group
    }

    fn group_index(&self, name: &str) -> Result<usize> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .ok_or_else(|| ViewError::UnknownGroup(name.to_string()))
    }

    /// Views of the active group, in port order.
    pub fn current_views(&self) -> Vec<&View> {
        self.ports.iter().map(|p| &p.view).collect()
    }

    pub fn ports(&self) -> &[ViewPort] {
        &self.ports
    }

    pub fn port(&self, index: usize) -> Option<&ViewPort> {
        self.ports.get(index)
    }

    /// Every layer of `kind` across the active ports.
    pub fn layers(&self, kind: LayerKind) -> impl Iterator<Item = &Layer> + '_ {
        self.ports
            .iter()
            .flat_map(|p| p.layers().iter())
            .filter(move |l| l.kind() == kind)
    }

    pub fn filters(&self) -> &ImageFilters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut ImageFilters {
        &mut self.filters
    }

    pub fn sources(&self) -> &SourceCache {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut SourceCache {
        &mut self.sources
    }

    pub fn image_shape(&self) -> (u32, u32) {
        self.image_shape
    }

    /// Switch to a new image: drop cached sources and reset every view.
    pub fn set_image(&mut self, image_id: &str, image_shape: (u32, u32)) {
        log::info!(
            "Showing image '{}' ({}x{})",
            image_id,
            image_shape.0,
            image_shape.1
        );
        self.sources.set_image(image_id);
        self.image_shape = (image_shape.0.max(1), image_shape.1.max(1));
        self.request_sources();
        self.reset_views();
    }

    pub fn set_image_location(&mut self, location: (f64, f64)) {
        self.image_location = location;
        for port in &mut self.ports {
            port.image_location_changed(location);
        }
    }

    /// Rebuild the ports for group `name`, keeping the current pan/zoom.
    pub fn show_group(&mut self, name: &str) -> Result<()> {
        let index = self.group_index(name)?;
        let group = &self.groups[index];

        let mut views = Vec::with_capacity(group.len());
        for view_name in &group.views {
            let view = self
                .view(view_name)
                .ok_or_else(|| ViewError::UnknownView(view_name.clone()))?;
            views.push(view.clone());
        }

        let captured = self.ports.first().map(|p| *p.transform());

        self.ports.clear();
        for view in views {
            let mut port = ViewPort::new(self.next_port_id, view);
            self.next_port_id += 1;
            for standard in &self.standard_layers {
                if (standard.accepts)(&port.view) {
                    port.add_layer(Layer::new(
                        standard.kind,
                        &port.view.name,
                        &self.map_url,
                        self.image_location,
                    ));
                }
            }
            self.ports.push(port);
        }
        self.current_group = name.to_string();
        log::debug!("Showing view group '{}' ({} ports)", name, self.ports.len());

        self.layout();
        let viewport = self.viewport();
        let transform = match captured {
            Some(t) => t.constrain(viewport, self.image_extent()),
            None => Transform::fit(viewport, self.image_extent()),
        };
        self.apply_transform(transform);
        self.request_sources();

        if let Some(callback) = &self.on_group_changed {
            callback(&self.groups[index]);
        }
        Ok(())
    }

    /// Show the group after the current one, wrapping around.
    pub fn show_next_group(&mut self) -> Result<()> {
        let current = self.group_index(&self.current_group).unwrap_or(0);
        let next = (current + 1) % self.groups.len().max(1);
        let name = self.groups[next].name.clone();
        self.show_group(&name)
    }

    /// Lay the ports out for a window of `width x height`.
    pub fn update_size(&mut self, width: u32, height: u32) {
        self.window = (width, height);
        self.layout();
        let viewport = self.viewport();
        if let Some(current) = self.ports.first().map(|p| *p.transform()) {
            self.apply_transform(current.constrain(viewport, self.image_extent()));
        }
    }

    /// Ports never shrink below one pixel, so the shared transform stays
    /// invertible even when the window is shorter than the reserved height.
    fn layout(&mut self) {
        let count = self.ports.len().max(1) as f64;
        let per_port = (f64::from(self.window.0) / count).round() as u32;
        let size = per_port
            .min(self.window.1.saturating_sub(self.reserved_height))
            .max(1);
        self.port_size = size;
        for (column, port) in self.ports.iter_mut().enumerate() {
            port.set_size(size);
            port.set_position(size * column as u32, 0);
        }
    }

    pub fn port_size(&self) -> u32 {
        self.port_size
    }

    fn viewport(&self) -> (f64, f64) {
        (f64::from(self.port_size), f64::from(self.port_size))
    }

    fn image_extent(&self) -> (f64, f64) {
        (f64::from(self.image_shape.0), f64::from(self.image_shape.1))
    }

    fn apply_transform(&mut self, transform: Transform) {
        for port in &mut self.ports {
            port.set_transform(transform);
        }
    }

    /// Transform shared by every port.
    pub fn transform(&self) -> Transform {
        self.ports
            .first()
            .map(|p| *p.transform())
            .unwrap_or_default()
    }

    /// Insert a view into the active group and rebuild its ports.
    pub fn add_view(&mut self, name: &str, position: Option<usize>) -> Result<()> {
        self.ensure_known(name)?;
        let index = self.group_index(&self.current_group)?;
        self.groups[index].insert(position, name);
        let current = self.current_group.clone();
        self.show_group(&current)
    }

    pub fn replace_view(&mut self, position: usize, name: &str) -> Result<()> {
        self.ensure_known(name)?;
        let index = self.group_index(&self.current_group)?;
        self.groups[index].replace(position, name)?;
        let current = self.current_group.clone();
        self.show_group(&current)
    }

    pub fn remove_view(&mut self, position: usize) -> Result<()> {
        let index = self.group_index(&self.current_group)?;
        self.groups[index].remove(position)?;
        let current = self.current_group.clone();
        self.show_group(&current)
    }

    fn ensure_known(&self, name: &str) -> Result<()> {
        match self.view(name) {
            Some(_) => Ok(()),
            None => Err(ViewError::UnknownView(name.to_string())),
        }
    }

    fn request_sources(&mut self) {
        for port in &self.ports {
            if let Some(view) = port.layers().iter().find_map(Layer::source_view) {
                self.sources.ensure_requested(view);
            }
        }
    }

    /// Render every port, or only layers of `kind`.
    pub fn render(
        &mut self,
        kind: Option<LayerKind>,
        overlay: Option<MaskOverlay<'_>>,
        preview: Option<&PreviewState>,
    ) {
        let ctx = RenderContext {
            filters: &self.filters,
            sources: &self.sources,
            overlay,
            preview,
            port_count: self.ports.len(),
        };
        for port in &mut self.ports {
            port.render(kind, &ctx);
        }
    }

    /// Redraw only the mask pixels inside a mask-local rectangle.
    pub fn render_mask_region(&mut self, region: PixelRect, overlay: MaskOverlay<'_>) {
        if region.is_empty() {
            return;
        }
        let ctx = RenderContext {
            filters: &self.filters,
            sources: &self.sources,
            overlay: Some(overlay),
            preview: None,
            port_count: self.ports.len(),
        };
        for port in &mut self.ports {
            port.render_mask_region(region, &ctx);
        }
    }

    /// Drain source completions and redraw the layers that were waiting.
    pub fn poll_sources(&mut self) -> Vec<String> {
        let ready = self.sources.poll();
        if ready.is_empty() {
            return ready;
        }
        let ctx = RenderContext {
            filters: &self.filters,
            sources: &self.sources,
            overlay: None,
            preview: None,
            port_count: self.ports.len(),
        };
        for port in &mut self.ports {
            port.refresh_pending(&ready, &ctx);
        }
        ready
    }

    /// Pan every port by a world-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let moved = self
            .transform()
            .pan(dx, dy)
            .constrain(self.viewport(), self.image_extent());
        self.apply_transform(moved);
    }

    /// Zoom every port around a world-space anchor.
    pub fn zoom(&mut self, factor: f64, anchor: (f64, f64)) {
        let zoomed = self
            .transform()
            .zoom(factor, anchor)
            .constrain(self.viewport(), self.image_extent());
        self.apply_transform(zoomed);
    }

    /// Put every port back to the default fit.
    pub fn reset_views(&mut self) {
        let fit = Transform::fit(self.viewport(), self.image_extent());
        self.apply_transform(fit);
    }

    /// Map a canvas point of port `index` into image coordinates.
    pub fn pointer_to_world(&self, index: usize, canvas: (f64, f64)) -> Option<(f64, f64)> {
        self.ports
            .get(index)
            .map(|p| p.transform().to_world(canvas.0, canvas.1))
    }

    /// Image-space rectangle `(x0, y0, x1, y1)` visible in the ports.
    pub fn visible_world_bounds(&self) -> (f64, f64, f64, f64) {
        let t = self.transform();
        let size = f64::from(self.port_size);
        let (x0, y0) = t.to_world(0.0, 0.0);
        let (x1, y1) = t.to_world(size, size);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    pub fn show_controls(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    pub fn toggle_controls(&mut self) {
        self.controls_visible = !self.controls_visible;
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    /// Controls of every port; empty while hidden.
    pub fn controls(&self) -> Vec<PortControls> {
        if !self.controls_visible {
            return Vec::new();
        }
        let count = self.ports.len();
        self.ports
            .iter()
            .enumerate()
            .map(|(i, p)| p.controls(i, &self.views, count))
            .collect()
    }
}
