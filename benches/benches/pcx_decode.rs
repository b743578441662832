//! Benchmark suite for PCX decoding
//!
//! Measures RLE decompression on synthetic images with different run lengths.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use div2_benches::{generate_pcx, generate_pixels};
use div2_types::file::pcx;
use std::hint::black_box;

/// Benchmark full PCX decoding (validation, RLE, palette)
fn bench_decode(c: &mut Criterion) {
	let mut group = c.benchmark_group("pcx_decode");

	for (name, width, height, run) in [
		("noise_320x200", 320u16, 200u16, 1usize),
		("runs_320x200", 320, 200, 16),
		("flat_640x480", 640, 480, 63),
	] {
		let data = generate_pcx(width, height, run).unwrap();
		group.throughput(Throughput::Elements(u64::from(width) * u64::from(height)));
		group.bench_with_input(BenchmarkId::new("decode", name), &data, |b, data| {
			b.iter(|| black_box(pcx::decode(black_box(data))));
		});
	}

	group.finish();
}

/// Benchmark the raw RLE loop without header checks
fn bench_rle(c: &mut Criterion) {
	let mut group = c.benchmark_group("pcx_rle");

	let pixels = generate_pixels(640, 480, 8);
	let mut compressed = Vec::new();
	pcx::compress_rle(&pixels, &mut compressed);

	group.throughput(Throughput::Bytes(pixels.len() as u64));
	group.bench_function("decompress", |b| {
		b.iter(|| black_box(pcx::decompress_rle(black_box(&compressed), pixels.len())));
	});
	group.bench_function("compress", |b| {
		b.iter(|| {
			let mut output = Vec::with_capacity(pixels.len());
			pcx::compress_rle(black_box(&pixels), &mut output);
			black_box(output)
		});
	});

	group.finish();
}

criterion_group!(benches, bench_decode, bench_rle);
criterion_main!(benches);
