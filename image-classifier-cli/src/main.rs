use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use clap::Parser;
use image_classifier::{
    labels::{LabelError, LabelTable},
    prepare::prepare_image_with_provider,
    providers::DefaultProvider,
    rank::{rank_top_k, softmax, Prediction},
    service::{utility::read_image, ServiceError},
    PrepareError, RankError,
};
use log::info;
use ndarray::Array4;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

mod cli;
use cli::{Args, Command, PrepareArgs, RankArgs};
use thiserror::Error;

#[derive(Debug, Error)]
enum AppError {
    #[error("Could not decode image -> {0}")]
    CouldNotDecodeImage(ServiceError),
    #[error("Could not prepare image -> {0}")]
    CouldNotPrepareImage(PrepareError),
    #[error("Could not load labels -> {0}")]
    CouldNotLoadLabels(LabelError),
    #[error("Could not read scores -> {0}")]
    CouldNotReadScores(std::io::Error),
    #[error("Scores must be a JSON array of numbers -> {0}")]
    InvalidScores(serde_json::Error),
    #[error("Could not rank scores -> {0}")]
    CouldNotRank(RankError),
    #[error("Could not write output -> {0}")]
    CouldNotWriteOutput(std::io::Error),
    #[error("Runtime failure -> {0}")]
    RuntimeFailure(ThreadPoolBuildError),
}

fn main() {
    if let Err(e) = exec_program() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn exec_program() -> Result<(), AppError> {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Command::Prepare(prepare_args) => exec_prepare(prepare_args),
        Command::Rank(rank_args) => exec_rank(rank_args),
    }
}

fn exec_prepare(args: PrepareArgs) -> Result<(), AppError> {
    let config = args.prepare_config();
    let num_threads: usize = args.threads.into();

    info!("Input image path: {:?}", args.input);
    info!("Profile: {}", args.profile);
    info!("Prepare config: {:?}", config);
    info!("Number of threads: {}", num_threads);

    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(AppError::RuntimeFailure)?;

    for (i, path) in args.input.iter().enumerate() {
        let image = read_image(path).map_err(AppError::CouldNotDecodeImage)?;

        let start = Instant::now();
        let tensor =
            prepare_image_with_provider::<DefaultProvider>(&thread_pool, &image, &config)
                .map_err(AppError::CouldNotPrepareImage)?;
        let elapsed = start.elapsed();

        println!("Image #{}: {}", i + 1, path.display());
        print_tensor_summary(&tensor);
        println!("  Resize & Normalization: {}ms", elapsed.as_millis());

        if let Some(output_dir) = &args.output {
            let output_path = output_path(output_dir, path, i);
            write_raw_tensor(&tensor, &output_path).map_err(AppError::CouldNotWriteOutput)?;
            println!("  Written to {}", output_path.display());
        }
    }
    Ok(())
}

fn exec_rank(args: RankArgs) -> Result<(), AppError> {
    let ranking_len: usize = args.show.into();

    info!("Scores path: {:?}", args.scores);
    info!("Labels path: {:?}", args.labels);
    info!(
        "Number of top infered class scores to show: {}",
        ranking_len
    );

    let labels = LabelTable::open(&args.labels).map_err(AppError::CouldNotLoadLabels)?;
    let predictions = rank_score_file(&args.scores, &labels, ranking_len, args.softmax)?;
    print_predictions(&predictions, args.softmax);

    Ok(())
}

/// Reads a JSON array of scores and ranks it, optionally as softmax probabilities.
fn rank_score_file(
    scores_path: &Path,
    labels: &LabelTable,
    k: usize,
    apply_softmax: bool,
) -> Result<Vec<Prediction>, AppError> {
    let file = File::open(scores_path).map_err(AppError::CouldNotReadScores)?;
    let scores: Vec<f32> =
        serde_json::from_reader(BufReader::new(file)).map_err(AppError::InvalidScores)?;
    let scores = if apply_softmax {
        softmax(&scores)
    } else {
        scores
    };

    rank_top_k(&scores, labels, k).map_err(AppError::CouldNotRank)
}

fn print_tensor_summary(tensor: &Array4<f32>) {
    let min = tensor.iter().copied().fold(f32::INFINITY, f32::min);
    let max = tensor.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    println!("  shape: {:?}", tensor.shape());
    println!(
        "  values: min {:.4}, max {:.4}, mean {:.4}",
        min,
        max,
        tensor.mean().unwrap_or(f32::NAN)
    );
}

fn print_predictions(predictions: &[Prediction], as_probability: bool) {
    println!("Classification:");
    for line in prediction_lines(predictions, as_probability) {
        println!("{line}");
    }
}

fn prediction_lines(predictions: &[Prediction], as_probability: bool) -> Vec<String> {
    predictions
        .iter()
        .map(|prediction| {
            if as_probability {
                format!(
                    "  \u{2022} {} ({:.2} %)",
                    prediction.label,
                    prediction.score * 100_f32
                )
            } else {
                format!("  \u{2022} {} ({:.4})", prediction.label, prediction.score)
            }
        })
        .collect()
}

/// `<output_dir>/<image file stem>.f32`, falling back to the input position for paths
/// without a file name.
fn output_path(output_dir: &Path, input: &Path, position: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("image-{}", position + 1));
    output_dir.join(format!("{stem}.f32"))
}

fn write_raw_tensor(tensor: &Array4<f32>, path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    // iter() walks the logical (row-major) order whatever the memory layout
    for value in tensor.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    use image_classifier::{labels::LabelTable, tensor::Layout};
    use ndarray::Array4;

    use super::{output_path, prediction_lines, rank_score_file, write_raw_tensor, AppError};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "image-classifier-cli-{}-{}",
            std::process::id(),
            name
        ))
    }

    fn pets() -> LabelTable {
        ["cat", "dog", "bird"].into_iter().collect()
    }

    #[test]
    fn output_file_is_named_after_the_image() {
        let path = output_path(Path::new("out"), Path::new("photos/cat.jpg"), 0);
        assert_eq!(path, Path::new("out").join("cat.f32"));

        let path = output_path(Path::new("out"), Path::new("/"), 2);
        assert_eq!(path, Path::new("out").join("image-3.f32"));
    }

    #[test]
    fn raw_tensor_is_little_endian_in_logical_order() {
        // 2x2 image, every value encodes its own position
        let tensor = Layout::Nchw.arrange(Array4::from_shape_fn((1, 2, 2, 3), |(_, x, y, c)| {
            (x * 100 + y * 10 + c) as f32
        }));
        assert_eq!(tensor.shape(), &[1, 3, 2, 2]);

        let path = temp_path("tensor.f32");
        write_raw_tensor(&tensor, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::remove_file(&path).ok();

        let values = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect::<Vec<_>>();
        assert_eq!(values.len(), 12);
        // channel-major: the red channel of (0,0) (1,0) (0,1) (1,1) comes first
        assert_eq!(&values[..5], &[0.0, 100.0, 10.0, 110.0, 1.0]);
        assert_eq!(values, tensor.iter().copied().collect::<Vec<_>>());

        // a permuted view is still written in its logical order
        let transposed = tensor.clone().permuted_axes([0, 1, 3, 2]);
        write_raw_tensor(&transposed, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(&bytes[4..8], &transposed[[0, 0, 0, 1]].to_le_bytes());
    }

    #[test]
    fn rank_a_score_file() {
        let path = temp_path("scores.json");
        fs::write(&path, "[0.1, 0.9, 0.3]").unwrap();

        let predictions = rank_score_file(&path, &pets(), 2, false).unwrap();
        assert_eq!(
            prediction_lines(&predictions, false),
            vec!["  \u{2022} dog (0.9000)", "  \u{2022} bird (0.3000)"]
        );

        let probabilities = rank_score_file(&path, &pets(), 3, true).unwrap();
        fs::remove_file(&path).ok();
        let sum: f32 = probabilities.iter().map(|p| p.score).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(probabilities[0].label, "dog");
        assert!(prediction_lines(&probabilities, true)[0].ends_with(" %)"));
    }

    #[test]
    fn bad_score_files_are_reported() {
        let path = temp_path("bad-scores.json");
        fs::write(&path, r#"{"scores": [1.0]}"#).unwrap();
        let result = rank_score_file(&path, &pets(), 1, false);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AppError::InvalidScores(_))));

        let result = rank_score_file(&temp_path("missing.json"), &pets(), 1, false);
        assert!(matches!(result, Err(AppError::CouldNotReadScores(_))));

        let path = temp_path("short-scores.json");
        fs::write(&path, "[1.0, 2.0]").unwrap();
        let result = rank_score_file(&path, &pets(), 1, false);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AppError::CouldNotRank(_))));
    }
}
