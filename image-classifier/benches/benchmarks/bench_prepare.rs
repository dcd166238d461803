use criterion::{black_box, criterion_group, Criterion};
use image::{Rgb, RgbImage};
use image_classifier::prepare::{preprocess_with_provider, PrepareConfig};
use image_classifier::providers::{NaiveProvider, ParNaiveProvider};
use rayon::ThreadPoolBuilder;

fn bench_preprocess_224(c: &mut Criterion) {
    let image = RgbImage::from_fn(224, 224, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let config = PrepareConfig::default();
    let single = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let multi = ThreadPoolBuilder::new().num_threads(4).build().unwrap();

    let mut group = c.benchmark_group("Preprocess 224x224");
    group.bench_function("Naive", |b| {
        b.iter(|| {
            preprocess_with_provider::<NaiveProvider>(&single, black_box(&image), &config).unwrap()
        })
    });
    group.bench_function("ParNaive 4 threads", |b| {
        b.iter(|| {
            preprocess_with_provider::<ParNaiveProvider>(&multi, black_box(&image), &config)
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(preprocessing, bench_preprocess_224);
