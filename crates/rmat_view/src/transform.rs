//! Affine canvas/world coordinate mapping.
//!
//! Every viewport owns one [`Transform`] that maps image (world) coordinates
//! onto its canvas pixels. Pan and zoom compose onto the existing matrix the
//! way a 2D canvas context does, and [`Transform::constrain`] keeps the image
//! covering the whole viewport afterwards.

/// Wheel zoom base: each wheel notch scales by this factor.
pub const ZOOM_STEP: f64 = 1.1;

/// Slack used when comparing scaled image extents against viewport extents.
const COVER_EPSILON: f64 = 1e-9;

/// 2D affine matrix `[a c e; b d f; 0 0 1]`.
///
/// A world point `(x, y)` maps to the canvas point
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    /// Create a transform from its six matrix components.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity transform (scale 1, no translation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Uniform scale without translation.
    pub fn from_scale(scale: f64) -> Self {
        Self::new(scale, 0.0, 0.0, scale, 0.0, 0.0)
    }

    /// Default view: the smallest uniform scale at which the image covers
    /// the viewport, anchored at the image's top-left corner.
    pub fn fit(viewport: (f64, f64), image: (f64, f64)) -> Self {
        Self::from_scale(fit_scale(viewport, image))
    }

    /// Matrix product `self * other` (apply `other` first, then `self`).
    pub fn multiply(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Post-multiply a translation.
    pub fn translate(&self, dx: f64, dy: f64) -> Transform {
        self.multiply(&Transform::new(1.0, 0.0, 0.0, 1.0, dx, dy))
    }

    /// Post-multiply a (possibly non-uniform) scale.
    pub fn scale(&self, sx: f64, sy: f64) -> Transform {
        self.multiply(&Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0))
    }

    /// Matrix determinant.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse matrix, or `None` if the transform is singular.
    pub fn inverse(&self) -> Option<Transform> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Transform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Map a world (image) point onto the canvas.
    pub fn to_canvas(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            self.a * wx + self.c * wy + self.e,
            self.b * wx + self.d * wy + self.f,
        )
    }

    /// Map a canvas point back into world (image) coordinates.
    ///
    /// A singular transform cannot occur after [`Transform::constrain`];
    /// should one be passed anyway, the point is returned unchanged.
    pub fn to_world(&self, cx: f64, cy: f64) -> (f64, f64) {
        match self.inverse() {
            Some(inv) => inv.to_canvas(cx, cy),
            None => (cx, cy),
        }
    }

    /// Shift the view by a world-space delta.
    pub fn pan(&self, dx: f64, dy: f64) -> Transform {
        self.translate(dx, dy)
    }

    /// Scale by `factor` while keeping the world point `anchor` fixed on
    /// the canvas.
    pub fn zoom(&self, factor: f64, anchor: (f64, f64)) -> Transform {
        self.translate(anchor.0, anchor.1)
            .scale(factor, factor)
            .translate(-anchor.0, -anchor.1)
    }

    /// Apply the cover policy for an `image` shown in a `viewport`.
    ///
    /// If the image would become smaller than the viewport on either axis,
    /// the transform falls back to [`Transform::fit`]. Afterwards the
    /// translation is clamped so that no canvas pixel lies outside the image.
    /// An empty viewport leaves the transform unchanged.
    pub fn constrain(&self, viewport: (f64, f64), image: (f64, f64)) -> Transform {
        let (vw, vh) = viewport;
        let (iw, ih) = image;
        if vw <= 0.0 || vh <= 0.0 {
            return *self;
        }

        let mut t = *self;
        if t.a * iw < vw - COVER_EPSILON || t.d * ih < vh - COVER_EPSILON {
            t = Transform::fit(viewport, image);
        }

        let (left, top) = t.to_canvas(0.0, 0.0);
        if left > 0.0 {
            t.e -= left;
        }
        if top > 0.0 {
            t.f -= top;
        }

        let (right, bottom) = t.to_canvas(iw, ih);
        if right < vw {
            t.e -= right - vw;
        }
        if bottom < vh {
            t.f -= bottom - vh;
        }

        t
    }

    /// Horizontal scale component.
    pub fn scale_x(&self) -> f64 {
        self.a
    }

    /// Vertical scale component.
    pub fn scale_y(&self) -> f64 {
        self.d
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Smallest uniform scale at which `image` covers `viewport`.
pub fn fit_scale(viewport: (f64, f64), image: (f64, f64)) -> f64 {
    let sx = viewport.0 / image.0.max(1.0);
    let sy = viewport.1 / image.1.max(1.0);
    sx.max(sy)
}

/// Zoom factor for a mouse wheel delta, clamped to one notch per event.
pub fn wheel_zoom_factor(delta: f64) -> f64 {
    ZOOM_STEP.powf(delta.clamp(-1.0, 1.0))
}
