//! Train/held-out split of the user-labelled pixels.

use crate::assist::rng::Lcg;
use crate::backend::{ModelSettings, PredictRequest};
use crate::config::AiConfig;
use crate::mask::{MaskModel, PixelCounts};
use crate::model::round_half_up;

/// User pixels routed to training or kept back for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSplit {
    /// Classes that passed the gate, ascending
    pub classes: Vec<u8>,
    /// User pixel counts at sampling time
    pub counts: PixelCounts,
    /// Training quota per class index; zero for classes that did not qualify
    pub quotas: Vec<usize>,
    pub train_pixels: Vec<u32>,
    pub train_labels: Vec<u8>,
    pub held_out_pixels: Vec<u32>,
    pub held_out_labels: Vec<u8>,
}

impl TrainingSplit {
    /// Sample the training set, or `None` if fewer than two classes have
    /// enough user pixels.
    ///
    /// Candidates are visited in an order shuffled with the configured seed.
    /// Each one goes to training until its class's quota
    /// `min(round(count * train_ratio), max_train_pixels)` is used up and is
    /// held out afterwards.
    pub fn sample(model: &MaskModel, n_classes: usize, config: &AiConfig) -> Option<Self> {
        let counts = model.user_pixel_counts(n_classes);
        let classes = counts.qualifying_classes();
        if classes.len() < 2 {
            log::warn!(
                "Prediction needs two classes with enough pixels, found {}",
                classes.len()
            );
            return None;
        }

        let mut quotas = vec![0usize; n_classes];
        for &class in &classes {
            let count = counts.per_class[class as usize];
            let share = round_half_up(count as f64 * config.train_ratio).max(0) as usize;
            quotas[class as usize] = share.min(config.max_train_pixels);
        }

        let mut candidates: Vec<(u32, u8)> = model
            .mask
            .iter()
            .zip(&model.user_mask)
            .enumerate()
            .filter(|(_, (label, user))| **user != 0 && is_qualifying(&classes, **label))
            .map(|(index, (&label, _))| (index as u32, label))
            .collect();
        Lcg::new(config.seed).shuffle(&mut candidates);

        let mut taken = vec![0usize; n_classes];
        let mut split = Self {
            classes,
            counts,
            quotas,
            train_pixels: Vec::new(),
            train_labels: Vec::new(),
            held_out_pixels: Vec::new(),
            held_out_labels: Vec::new(),
        };
        for (index, label) in candidates {
            let class = label as usize;
            if taken[class] < split.quotas[class] {
                taken[class] += 1;
                split.train_pixels.push(index);
                split.train_labels.push(label);
            } else {
                split.held_out_pixels.push(index);
                split.held_out_labels.push(label);
            }
        }

        log::info!(
            "Sampled {} training and {} held-out pixels over {} classes",
            split.train_pixels.len(),
            split.held_out_pixels.len(),
            split.classes.len()
        );
        Some(split)
    }

    /// Training pixels of `class`.
    pub fn train_count(&self, class: u8) -> usize {
        self.train_labels.iter().filter(|&&l| l == class).count()
    }

    /// Held-out pixels of `class`.
    pub fn held_out_count(&self, class: u8) -> usize {
        self.held_out_labels.iter().filter(|&&l| l == class).count()
    }

    /// Request body carrying only the training pixels.
    pub fn to_request(&self, config: &AiConfig) -> PredictRequest {
        PredictRequest {
            user_pixels: self.train_pixels.clone(),
            user_labels: self.train_labels.clone(),
            ai_config: ModelSettings::from(config),
        }
    }
}

fn is_qualifying(classes: &[u8], label: u8) -> bool {
    classes.binary_search(&label).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MaskShape;

    /// 4x4 mask with 11 user pixels of class 0 and 5 of class 1.
    fn unbalanced() -> MaskModel {
        let mut model = MaskModel::empty(MaskShape::new(4, 4));
        model.user_mask.fill(1);
        for label in model.mask.iter_mut().skip(11) {
            *label = 1;
        }
        model
    }

    fn config(train_ratio: f64, max_train_pixels: usize) -> AiConfig {
        AiConfig {
            train_ratio,
            max_train_pixels,
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_gate_needs_two_classes() {
        assert!(TrainingSplit::sample(&unbalanced(), 2, &config(0.5, 1000)).is_none());
        assert!(
            TrainingSplit::sample(&MaskModel::empty(MaskShape::new(4, 4)), 2, &AiConfig::default())
                .is_none()
        );
    }

    #[test]
    fn test_quota_and_routing() {
        let mut model = MaskModel::empty(MaskShape::new(8, 4));
        for i in 0..11 {
            model.mask[i] = 0;
            model.user_mask[i] = 1;
        }
        for i in 11..26 {
            model.mask[i] = 2;
            model.user_mask[i] = 1;
        }
        // Class 1 stays under the threshold and is excluded entirely
        for i in 26..30 {
            model.mask[i] = 1;
            model.user_mask[i] = 1;
        }

        let split = TrainingSplit::sample(&model, 3, &config(0.5, 7)).expect("two classes");
        assert_eq!(split.classes, [0, 2]);
        assert_eq!(split.quotas, [6, 0, 7]);
        assert_eq!(split.train_count(0), 6);
        assert_eq!(split.train_count(2), 7);
        assert_eq!(split.held_out_count(0), 5);
        assert_eq!(split.held_out_count(2), 8);
        assert_eq!(split.train_count(1) + split.held_out_count(1), 0);
        assert!(split.train_pixels.iter().all(|&p| model.is_user_pixel(p as usize)));
    }

    #[test]
    fn test_split_is_reproducible() {
        let mut model = MaskModel::empty(MaskShape::new(8, 8));
        for (i, label) in model.mask.iter_mut().enumerate() {
            *label = (i % 2) as u8;
        }
        model.user_mask.fill(1);

        let a = TrainingSplit::sample(&model, 2, &AiConfig::default()).expect("two classes");
        let b = TrainingSplit::sample(&model, 2, &AiConfig::default()).expect("two classes");
        assert_eq!(a, b);

        let other_seed = AiConfig {
            seed: 7,
            ..AiConfig::default()
        };
        let c = TrainingSplit::sample(&model, 2, &other_seed).expect("two classes");
        assert_ne!(a.train_pixels, c.train_pixels);
        assert_eq!(a.train_pixels.len(), c.train_pixels.len());
    }

    #[test]
    fn test_request_carries_training_pixels_only() {
        let mut model = MaskModel::empty(MaskShape::new(6, 4));
        model.user_mask.fill(1);
        for label in model.mask.iter_mut().skip(12) {
            *label = 1;
        }
        let cfg = config(0.5, 1000);
        let split = TrainingSplit::sample(&model, 2, &cfg).expect("two classes");
        let request = split.to_request(&cfg);
        assert_eq!(request.user_pixels, split.train_pixels);
        assert_eq!(request.user_labels.len(), 12);
        assert!(
            request
                .user_pixels
                .iter()
                .all(|p| !split.held_out_pixels.contains(p))
        );
    }
}
