use std::{path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand};
use image_classifier::{
    prepare::{Normalization, PrepareConfig, Resize},
    tensor::Layout,
};
use strum::Display;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resize and normalize images into model input tensors.
    Prepare(PrepareArgs),
    /// Rank the raw scores produced by a model.
    Rank(RankArgs),
}

#[derive(clap::Args, Debug)]
pub struct PrepareArgs {
    /// Input image path.
    /// Example: --input /path/to/image1.jpg --input /path/to/image2.jpg
    #[arg(short, long, required = true)]
    pub input: Vec<PathBuf>,

    /// Preprocessing profile.
    /// Supported profiles: unit-range (bilinear 224x224, [0, 1]), thumbnail (center crop 244x244, mean/std), native (no resize)
    /// Default: unit-range
    #[arg(short, long, default_value = "unit-range")]
    pub profile: Profile,

    /// Override the normalization of the profile.
    /// Supported values: shift-by-ratio (c/255 - mean/std), standardize ((c/255 - mean)/std), unit-range (c/255)
    #[arg(short, long)]
    pub normalization: Option<NormalizationArg>,

    /// Axis order of the tensor.
    /// Supported values: nwhc, nhwc, nchw
    /// Default: nwhc
    #[arg(short, long, default_value = "nwhc")]
    pub layout: LayoutArg,

    /// Number of threads used to normalize a single image. Must be greater than 0 and less than 65536.
    /// Example: --threads 8
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Directory where every tensor is written as raw little-endian f32 values,
    /// one `<image name>.f32` file per input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct RankArgs {
    /// JSON file with the raw scores of a model, as an array of numbers.
    /// Example: --scores output.json
    #[arg(long)]
    pub scores: PathBuf,

    /// Label file, either an ImageNet class index (.json) or one label per line.
    #[arg(short, long)]
    pub labels: PathBuf,

    /// Number of top classes to show. Must be greater than 0 and less or equal than 1000.
    /// Example: --show 10
    #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub show: u16,

    /// Apply a softmax to the scores before ranking, to show probabilities.
    #[arg(long)]
    pub softmax: bool,
}

impl PrepareArgs {
    pub fn prepare_config(&self) -> PrepareConfig {
        let mut config = match self.profile {
            Profile::UnitRange => PrepareConfig::unit_range(),
            Profile::Thumbnail => PrepareConfig::thumbnail(),
            Profile::Native => PrepareConfig {
                resize: Resize::None,
                ..Default::default()
            },
        };
        if let Some(normalization) = &self.normalization {
            config.normalization = match normalization {
                NormalizationArg::ShiftByRatio => Normalization::imagenet_shift_by_ratio(),
                NormalizationArg::Standardize => Normalization::imagenet_standardize(),
                NormalizationArg::UnitRange => Normalization::UnitRange,
            };
        }
        config.layout = match self.layout {
            LayoutArg::Nwhc => Layout::Nwhc,
            LayoutArg::Nhwc => Layout::Nhwc,
            LayoutArg::Nchw => Layout::Nchw,
        };
        config
    }
}

#[derive(Debug, Clone, Display)]
pub enum Profile {
    #[strum(serialize = "unit-range")]
    UnitRange,
    #[strum(serialize = "thumbnail")]
    Thumbnail,
    #[strum(serialize = "native")]
    Native,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unit-range" => Ok(Self::UnitRange),
            "thumbnail" => Ok(Self::Thumbnail),
            "native" => Ok(Self::Native),
            _ => Err(format!("Invalid profile name: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Display)]
pub enum NormalizationArg {
    #[strum(serialize = "shift-by-ratio")]
    ShiftByRatio,
    #[strum(serialize = "standardize")]
    Standardize,
    #[strum(serialize = "unit-range")]
    UnitRange,
}

impl FromStr for NormalizationArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shift-by-ratio" => Ok(Self::ShiftByRatio),
            "standardize" => Ok(Self::Standardize),
            "unit-range" => Ok(Self::UnitRange),
            _ => Err(format!("Invalid normalization: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Display)]
pub enum LayoutArg {
    #[strum(serialize = "nwhc")]
    Nwhc,
    #[strum(serialize = "nhwc")]
    Nhwc,
    #[strum(serialize = "nchw")]
    Nchw,
}

impl FromStr for LayoutArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nwhc" => Ok(Self::Nwhc),
            "nhwc" => Ok(Self::Nhwc),
            "nchw" => Ok(Self::Nchw),
            _ => Err(format!("Invalid layout: {}", s)),
        }
    }
}
