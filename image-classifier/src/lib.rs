//! # image-classifier
//!
//! Preprocessing and ranking for single-image classification.
//!
//! The crate turns a decoded image into the normalized tensor a classification model
//! expects (see [`prepare`]) and turns the model's raw score vector into the top-K
//! labeled predictions (see [`rank`]). Running the model is left to an
//! [`InferenceEngine`](service::InferenceEngine) supplied by the caller; the
//! [`service`] module glues the three steps together.

pub mod labels;
pub mod prepare;
pub mod providers;
pub mod rank;
pub mod service;
pub mod tensor;

pub use labels::{LabelError, LabelTable};
pub use prepare::{preprocess, Normalization, PrepareConfig, PrepareError, Resize};
pub use rank::{rank_top_k, Prediction, RankError};
