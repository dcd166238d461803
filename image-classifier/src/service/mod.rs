//! Contains the classifier that glues preprocessing, inference and ranking together.
//!
//! The classifier is created using a [`ClassifierBuilder`], which can be created using
//! [`ClassifierBuilder::new`], or directly from an already loaded [`LabelTable`] with
//! [`Classifier::new`].
//!
//! Inference itself is delegated to an [`InferenceEngine`]. Use [`Classifier::prepare`] and
//! [`Classifier::rank`] if you want to drive the engine yourself, otherwise
//! [`Classifier::classify`] runs the whole pipeline and reports how long each step took.
pub mod utility;

use std::{
    error::Error,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use image::{DynamicImage, ImageError};
use log::debug;
use ndarray::Array4;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;

use crate::{
    labels::{LabelError, LabelTable},
    prepare::{prepare_image_with_provider, PrepareConfig, PrepareError},
    providers::{DefaultProvider, Provider},
    rank::{rank_top_k, Prediction, RankError, DEFAULT_TOP_K},
};

pub type EngineError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("The input is invalid: {0}")]
    InvalidInput(#[from] ImageError),
    #[error("The image could not be prepared: {0}")]
    Prepare(#[from] PrepareError),
    #[error("The inference engine failed: {0}")]
    Inference(EngineError),
    #[error("The scores could not be ranked: {0}")]
    Rank(#[from] RankError),
    #[error("The labels could not be loaded: {0}")]
    Labels(#[from] LabelError),
    #[error("The thread pool could not be created: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),
}

/// Runs a classification model on a prepared tensor and returns one raw score per class.
pub trait InferenceEngine {
    fn infer(&self, input: &Array4<f32>) -> Result<Vec<f32>, EngineError>;
}

impl<F> InferenceEngine for F
where
    F: Fn(&Array4<f32>) -> Result<Vec<f32>, EngineError>,
{
    fn infer(&self, input: &Array4<f32>) -> Result<Vec<f32>, EngineError> {
        self(input)
    }
}

#[derive(Clone, Debug)]
pub struct ClassifierBuilder {
    labels_path: PathBuf,
    config: Config,
}

pub struct Classifier {
    labels: LabelTable,
    config: Config,
    thread_pool: ThreadPool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub num_threads: usize,
    pub top_k: usize,
    pub prepare: PrepareConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: 1,
            top_k: DEFAULT_TOP_K,
            prepare: PrepareConfig::unit_range(),
        }
    }
}

/// Outcome of a classification request.
#[derive(Clone, Debug)]
pub struct Classification {
    pub predictions: Vec<Prediction>,
    /// Time spent resizing and normalizing the image.
    pub preprocess_time: Duration,
    pub inference_time: Duration,
}

impl ClassifierBuilder {
    pub fn new(labels_path: PathBuf) -> Self {
        Self {
            labels_path,
            config: Config::default(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Classifier, ServiceError> {
        let labels = LabelTable::open(self.labels_path.as_path())?;
        Classifier::new(labels, self.config)
    }
}

impl Classifier {
    pub fn new(labels: LabelTable, config: Config) -> Result<Self, ServiceError> {
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()?;
        Ok(Self {
            labels,
            config,
            thread_pool,
        })
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn current_config(&self) -> Config {
        self.config.clone()
    }

    /// Resizes and normalizes an image with the default execution provider.
    pub fn prepare(&self, image: &DynamicImage) -> Result<Array4<f32>, ServiceError> {
        self.prepare_with_provider::<DefaultProvider>(image)
    }

    /// Resizes and normalizes an image with the chosen execution provider.
    pub fn prepare_with_provider<P: Provider>(
        &self,
        image: &DynamicImage,
    ) -> Result<Array4<f32>, ServiceError> {
        let tensor =
            prepare_image_with_provider::<P>(&self.thread_pool, image, &self.config.prepare)?;
        Ok(tensor)
    }

    /// Ranks a score vector with the configured number of predictions.
    pub fn rank(&self, scores: &[f32]) -> Result<Vec<Prediction>, ServiceError> {
        Ok(rank_top_k(scores, &self.labels, self.config.top_k)?)
    }

    /// Prepares the image, runs the engine on it and ranks the scores.
    pub fn classify<E>(
        &self,
        engine: &E,
        image: &DynamicImage,
    ) -> Result<Classification, ServiceError>
    where
        E: InferenceEngine + ?Sized,
    {
        let start = Instant::now();
        let input = self.prepare(image)?;
        let preprocess_time = start.elapsed();
        debug!(
            "Prepared tensor {:?} in {:?}",
            input.shape(),
            preprocess_time
        );

        let start = Instant::now();
        let scores = engine.infer(&input).map_err(ServiceError::Inference)?;
        let inference_time = start.elapsed();
        debug!("Inferred {} scores in {:?}", scores.len(), inference_time);

        let predictions = self.rank(&scores)?;
        Ok(Classification {
            predictions,
            preprocess_time,
            inference_time,
        })
    }

    /// Reads an image file and classifies it.
    pub fn classify_path<E, P>(&self, engine: &E, path: P) -> Result<Classification, ServiceError>
    where
        E: InferenceEngine + ?Sized,
        P: AsRef<Path>,
    {
        let image = utility::read_image(path)?;
        self.classify(engine, &image)
    }
}
