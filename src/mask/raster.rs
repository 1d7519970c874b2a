//! Offscreen raster of the mask in the current view mode.
//!
//! Ports never read the label buffers; they blit this raster instead. Bulk
//! changes repaint it with [`HiddenRaster::reload`], brush strokes patch the
//! touched rectangle only.

use image::{Rgba, RgbaImage};
use rmat_view::PixelRect;

use crate::constants::{ERROR_COLOURS, TRANSPARENT};
use crate::mask::model::{MaskModel, MaskShape, MaskViewMode};
use crate::model::MaskClass;

#[derive(Debug, Clone)]
pub struct HiddenRaster {
    image: RgbaImage,
}

impl HiddenRaster {
    pub fn new(shape: MaskShape) -> Self {
        Self {
            image: RgbaImage::from_pixel(shape.width, shape.height, Rgba(TRANSPARENT)),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Repaint every pixel from the model.
    pub fn reload(&mut self, model: &MaskModel, mode: MaskViewMode, classes: &[MaskClass]) {
        let shape = model.shape();
        if self.image.dimensions() != (shape.width, shape.height) {
            self.image = RgbaImage::new(shape.width, shape.height);
        }

        let (values, palette) = mode_values_and_palette(model, mode, classes);
        for (pixel, value) in self.image.pixels_mut().zip(values) {
            *pixel = Rgba(
                palette
                    .get(value as usize)
                    .copied()
                    .unwrap_or(TRANSPARENT),
            );
        }
        log::trace!("Hidden raster repainted in {:?} mode", mode);
    }

    /// Make `rect` (mask-local) transparent.
    pub fn clear_rect(&mut self, rect: PixelRect) {
        self.fill_rect(rect, TRANSPARENT);
    }

    /// Paint `rect` (mask-local) with one colour.
    pub fn fill_rect(&mut self, rect: PixelRect, colour: [u8; 4]) {
        let (width, height) = self.image.dimensions();
        for (x, y) in rect.pixels() {
            if x < width && y < height {
                self.image.put_pixel(x, y, Rgba(colour));
            }
        }
    }
}

/// Per-pixel palette indices and the palette for a view mode.
///
/// - final: class index into the class colours
/// - user: class index + 1 on user pixels, 0 (transparent) elsewhere; the
///   palette uses each class's user colour
/// - errors: the error mark into transparent/green/red
fn mode_values_and_palette(
    model: &MaskModel,
    mode: MaskViewMode,
    classes: &[MaskClass],
) -> (Vec<u8>, Vec<[u8; 4]>) {
    match mode {
        MaskViewMode::Final => (
            model.mask.clone(),
            classes.iter().map(|c| c.colour).collect(),
        ),
        MaskViewMode::User => {
            let values = model
                .mask
                .iter()
                .zip(&model.user_mask)
                .map(|(&label, &user)| if user != 0 { label.saturating_add(1) } else { 0 })
                .collect();
            let palette = std::iter::once(TRANSPARENT)
                .chain(classes.iter().map(MaskClass::user_display_colour))
                .collect();
            (values, palette)
        }
        MaskViewMode::Errors => (model.errors.clone(), ERROR_COLOURS.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<MaskClass> {
        vec![
            MaskClass::new("clear", [255, 255, 255, 0]).with_user_colour([0, 255, 255, 70]),
            MaskClass::new("cloud", [255, 255, 0, 70]),
        ]
    }

    fn model() -> MaskModel {
        let mut model = MaskModel::empty(MaskShape::new(2, 2));
        model.mask = vec![0, 1, 1, 0];
        model.user_mask = vec![1, 1, 0, 0];
        model.errors = vec![0, 1, 2, 0];
        model
    }

    #[test]
    fn test_final_mode_uses_class_colours() {
        let mut raster = HiddenRaster::new(MaskShape::new(2, 2));
        raster.reload(&model(), MaskViewMode::Final, &classes());
        assert_eq!(raster.image().get_pixel(1, 0).0, [255, 255, 0, 70]);
        assert_eq!(raster.image().get_pixel(0, 1).0, [255, 255, 0, 70]);
        assert_eq!(raster.image().get_pixel(0, 0).0, [255, 255, 255, 0]);
    }

    #[test]
    fn test_user_mode_shows_only_user_pixels() {
        let mut raster = HiddenRaster::new(MaskShape::new(2, 2));
        raster.reload(&model(), MaskViewMode::User, &classes());
        assert_eq!(raster.image().get_pixel(0, 0).0, [0, 255, 255, 70]);
        assert_eq!(raster.image().get_pixel(1, 0).0, [255, 255, 0, 70]);
        assert_eq!(raster.image().get_pixel(0, 1).0, TRANSPARENT);
    }

    #[test]
    fn test_errors_mode_palette() {
        let mut raster = HiddenRaster::new(MaskShape::new(2, 2));
        raster.reload(&model(), MaskViewMode::Errors, &classes());
        assert_eq!(raster.image().get_pixel(0, 0).0, ERROR_COLOURS[0]);
        assert_eq!(raster.image().get_pixel(1, 0).0, ERROR_COLOURS[1]);
        assert_eq!(raster.image().get_pixel(0, 1).0, ERROR_COLOURS[2]);
    }

    #[test]
    fn test_fill_and_clear_rect() {
        let mut raster = HiddenRaster::new(MaskShape::new(4, 4));
        raster.fill_rect(PixelRect::new(1, 1, 2, 2), [1, 2, 3, 4]);
        assert_eq!(raster.image().get_pixel(2, 2).0, [1, 2, 3, 4]);
        assert_eq!(raster.image().get_pixel(3, 3).0, TRANSPARENT);

        raster.clear_rect(PixelRect::new(2, 2, 5, 5));
        assert_eq!(raster.image().get_pixel(2, 2).0, TRANSPARENT);
        assert_eq!(raster.image().get_pixel(1, 1).0, [1, 2, 3, 4]);
    }
}
