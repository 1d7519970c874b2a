//! View-transform and compositing engine.
//!
//! A [`ViewManager`] shows the views of one named [`ViewGroup`] side by side,
//! one [`ViewPort`] per view. Every port stacks a fixed set of [`Layer`]s and
//! all ports share the same [`Transform`], so panning or zooming one of them
//! moves every other port in lockstep.
//!
//! The crate knows nothing about labels or classes. Whoever owns the mask
//! hands in a read-only [`MaskOverlay`] and the brush [`PreviewState`] at
//! render time.

pub mod error;
pub mod filters;
pub mod geometry;
pub mod layer;
pub mod manager;
pub mod port;
pub mod source;
pub mod transform;
pub mod view;

pub use error::{Result, ViewError};
pub use filters::ImageFilters;
pub use geometry::PixelRect;
pub use layer::{Layer, LayerKind, MapRequest, MaskOverlay, PreviewState, RenderContext};
pub use manager::{LayerPredicate, ViewManager};
pub use port::{PortControls, ViewPort};
pub use source::{ImageSourceLoader, SourceCache, SourceEvent, SourceState};
pub use transform::{fit_scale, wheel_zoom_factor, Transform};
pub use view::{View, ViewGroup, ViewKind, DEFAULT_GROUP};
