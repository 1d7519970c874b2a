//! Prediction assistance: sampling user pixels and scoring the result.
//!
//! A round samples the user-labelled pixels into a training and a held-out
//! set ([`TrainingSplit`]), sends the training set to the predictor and scores
//! the returned labels on the held-out set ([`Evaluation`]).

mod rng;
mod sampling;
mod scoring;

pub use rng::Lcg;
pub use sampling::TrainingSplit;
pub use scoring::{ClassAccuracy, DEFAULT_RECOMMENDATION, Evaluation};
