//! Flattened per-pixel label buffers.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_CLASS_PIXELS;

/// Mask width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskShape {
    pub width: u32,
    pub height: u32,
}

impl MaskShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels, i.e. the length of every mask buffer.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of `(x, y)`, row-major.
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Editable rectangle `[x0, x1) x [y0, y1)` of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskArea {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl MaskArea {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn shape(&self) -> MaskShape {
        MaskShape::new(self.x1.saturating_sub(self.x0), self.y1.saturating_sub(self.y0))
    }

    pub fn origin(&self) -> (u32, u32) {
        (self.x0, self.y0)
    }
}

/// Outcome of the last prediction round for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorMark {
    Unevaluated = 0,
    Correct = 1,
    Incorrect = 2,
}

/// Which buffer the hidden raster shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskViewMode {
    /// Class colour of every pixel
    #[default]
    Final,
    /// Only user-labelled pixels
    User,
    /// Evaluation result of the last prediction
    Errors,
}

/// Per-class user pixel counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelCounts {
    pub per_class: Vec<usize>,
    pub total: usize,
}

impl PixelCounts {
    /// Classes with more than [`MIN_CLASS_PIXELS`] user pixels.
    pub fn qualifying_classes(&self) -> Vec<u8> {
        self.per_class
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > MIN_CLASS_PIXELS)
            .map(|(class, _)| class as u8)
            .collect()
    }
}

/// Mask, user provenance and evaluation buffers of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskModel {
    shape: MaskShape,
    /// Class index per pixel
    pub mask: Vec<u8>,
    /// 1 where a human set the label
    pub user_mask: Vec<u8>,
    /// [`ErrorMark`] values of the last prediction round
    pub errors: Vec<u8>,
}

impl MaskModel {
    /// All-zero buffers of `shape`.
    pub fn empty(shape: MaskShape) -> Self {
        let len = shape.len();
        Self {
            shape,
            mask: vec![0; len],
            user_mask: vec![0; len],
            errors: vec![0; len],
        }
    }

    /// Adopt loaded buffers; errors start unevaluated.
    pub fn from_parts(shape: MaskShape, mask: Vec<u8>, user_mask: Vec<u8>) -> Self {
        let len = shape.len();
        Self {
            shape,
            errors: vec![0; len],
            mask,
            user_mask,
        }
    }

    pub fn shape(&self) -> MaskShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn is_user_pixel(&self, index: usize) -> bool {
        self.user_mask.get(index).is_some_and(|&u| u != 0)
    }

    pub fn clear_errors(&mut self) {
        self.errors.fill(ErrorMark::Unevaluated as u8);
    }

    /// Count user pixels per class. Labels outside `0..n_classes` are ignored.
    pub fn user_pixel_counts(&self, n_classes: usize) -> PixelCounts {
        let mut per_class = vec![0; n_classes];
        for (&label, &user) in self.mask.iter().zip(&self.user_mask) {
            if user == 0 {
                continue;
            }
            if let Some(count) = per_class.get_mut(label as usize) {
                *count += 1;
            }
        }
        let total = per_class.iter().sum();
        PixelCounts { per_class, total }
    }

    /// Classes that pass the prediction gate.
    pub fn qualifying_classes(&self, n_classes: usize) -> Vec<u8> {
        self.user_pixel_counts(n_classes).qualifying_classes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_model() {
        let model = MaskModel::empty(MaskShape::new(3, 2));
        assert_eq!(model.len(), 6);
        assert!(model.mask.iter().all(|&v| v == 0));
        assert!(model.errors.iter().all(|&v| v == 0));
        assert_eq!(model.shape().index(2, 1), 5);
    }

    #[test]
    fn test_user_pixel_counts() {
        let mut model = MaskModel::empty(MaskShape::new(4, 4));
        for i in 0..11 {
            model.mask[i] = 1;
            model.user_mask[i] = 1;
        }
        // Labelled by prediction only
        model.mask[12] = 2;
        // Out of range class is ignored
        model.mask[13] = 7;
        model.user_mask[13] = 1;
        model.user_mask[14] = 1;

        let counts = model.user_pixel_counts(3);
        assert_eq!(counts.per_class, [1, 11, 0]);
        assert_eq!(counts.total, 12);
        assert_eq!(counts.qualifying_classes(), [1]);
    }

    #[test]
    fn test_mask_area_shape() {
        let area = MaskArea::new(10, 20, 74, 68);
        assert_eq!(area.shape(), MaskShape::new(64, 48));
        assert_eq!(area.origin(), (10, 20));
    }
}
