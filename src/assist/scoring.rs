//! Evaluation of a prediction against the held-out user pixels.

use ndarray::Array2;

use crate::assist::sampling::TrainingSplit;
use crate::mask::{ErrorMark, MaskModel};
use crate::model::{MaskClass, round_half_up};

/// Shown when no class is worse than the others.
pub const DEFAULT_RECOMMENDATION: &str = "Draw more training pixels!";

/// Accuracy of one class on its held-out pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassAccuracy {
    pub class: u8,
    pub true_positives: u64,
    pub held_out: u64,
    /// `true_positives / held_out`, zero without held-out pixels
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Rows are user labels, columns predicted labels
    pub confusion: Array2<u64>,
    pub accuracies: Vec<ClassAccuracy>,
    /// `C * prod(acc) / sum(acc)` over the C qualifying classes
    pub score: f64,
    /// Held-out pixels the prediction got wrong
    pub incorrect: Vec<u32>,
}

impl Evaluation {
    /// Score `prediction` on the held-out pixels of `split`. Training pixels
    /// never count.
    pub fn score(split: &TrainingSplit, prediction: &[u8], n_classes: usize) -> Self {
        let mut confusion = Array2::<u64>::zeros((n_classes, n_classes));
        let mut true_positives = vec![0u64; n_classes];
        let mut held_out = vec![0u64; n_classes];
        let mut incorrect = Vec::new();

        for (&pixel, &truth) in split.held_out_pixels.iter().zip(&split.held_out_labels) {
            let truth = truth as usize;
            held_out[truth] += 1;
            let Some(&predicted) = prediction.get(pixel as usize) else {
                incorrect.push(pixel);
                continue;
            };
            if let Some(cell) = confusion.get_mut((truth, predicted as usize)) {
                *cell += 1;
            }
            if predicted as usize == truth {
                true_positives[truth] += 1;
            } else {
                incorrect.push(pixel);
            }
        }

        let accuracies: Vec<ClassAccuracy> = split
            .classes
            .iter()
            .map(|&class| {
                let c = class as usize;
                let accuracy = if held_out[c] == 0 {
                    0.0
                } else {
                    true_positives[c] as f64 / held_out[c] as f64
                };
                ClassAccuracy {
                    class,
                    true_positives: true_positives[c],
                    held_out: held_out[c],
                    accuracy,
                }
            })
            .collect();

        let product: f64 = accuracies.iter().map(|a| a.accuracy).product();
        let sum: f64 = accuracies.iter().map(|a| a.accuracy).sum();
        let score = if sum > 0.0 {
            accuracies.len() as f64 * product / sum
        } else {
            0.0
        };

        Self {
            confusion,
            accuracies,
            score,
            incorrect,
        }
    }

    /// Score as a whole percentage.
    pub fn percent(&self) -> i64 {
        round_half_up(self.score * 100.0)
    }

    /// Class with the lowest accuracy below 1, if any.
    pub fn worst_class(&self) -> Option<u8> {
        let mut worst: Option<&ClassAccuracy> = None;
        for candidate in &self.accuracies {
            let limit = worst.map_or(1.0, |w| w.accuracy);
            if candidate.accuracy < limit {
                worst = Some(candidate);
            }
        }
        worst.map(|w| w.class)
    }

    /// Advice on where more training pixels would help.
    pub fn recommendation(&self, classes: &[MaskClass]) -> String {
        match self.worst_class().and_then(|c| classes.get(c as usize)) {
            Some(class) => format!("Could you provide more training pixels for {}?", class.name),
            None => DEFAULT_RECOMMENDATION.to_string(),
        }
    }

    /// Rebuild the error buffer: incorrect held-out pixels are marked,
    /// everything else stays unevaluated.
    pub fn mark_errors(&self, model: &mut MaskModel) {
        model.clear_errors();
        for &pixel in &self.incorrect {
            if let Some(mark) = model.errors.get_mut(pixel as usize) {
                *mark = ErrorMark::Incorrect as u8;
            }
        }
    }
}
