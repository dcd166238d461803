use benchmarks::{bench_prepare::preprocessing, bench_rank::ranking};
use criterion::criterion_main;
mod benchmarks;

criterion_main!(preprocessing, ranking);
