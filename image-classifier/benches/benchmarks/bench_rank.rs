use criterion::{black_box, criterion_group, Criterion};
use image_classifier::{labels::LabelTable, rank::rank_top_k};

fn bench_rank_imagenet(c: &mut Criterion) {
    let labels = (0..1000)
        .map(|i| format!("class {i}"))
        .collect::<LabelTable>();
    let scores = (0..1000)
        .map(|i| ((i * 389) % 1000) as f32 / 1000.0)
        .collect::<Vec<_>>();

    c.bench_function("Rank top 5 of 1000", |b| {
        b.iter(|| rank_top_k(black_box(&scores), &labels, 5).unwrap())
    });
}

criterion_group!(ranking, bench_rank_imagenet);
