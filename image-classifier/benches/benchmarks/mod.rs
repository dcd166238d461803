pub mod bench_prepare;
pub mod bench_rank;
