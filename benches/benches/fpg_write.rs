//! Benchmark suite for FPG packages
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml --bench fpg_write

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use div2_benches::{generate_pcx, generate_pixels};
use div2_types::file::fpg::File;
use div2_types::file::map::Bitmap;
use div2_types::file::pal::Palette;
use std::hint::black_box;

fn package_of_bitmaps(count: i32) -> File {
	let mut fpg = File::new(Palette::grayscale());
	for id in 1..=count {
		let bitmap = Bitmap::from_pixels(64, 64, generate_pixels(64, 64, id as usize))
			.unwrap_or_else(|_| Bitmap::new(64, 64));
		let _ = fpg.add_bitmap(bitmap, id, "bench", &[]);
	}
	fpg
}

/// Benchmark serialization of already indexed entries
fn bench_write(c: &mut Criterion) {
	let mut group = c.benchmark_group("fpg_write");

	let fpg = package_of_bitmaps(100);
	group.throughput(Throughput::Elements(100));
	group.bench_function("bitmaps_100", |b| {
		b.iter(|| black_box(fpg.to_bytes()));
	});

	let bytes = fpg.to_bytes().unwrap_or_default();
	group.bench_function("read_100", |b| {
		b.iter(|| black_box(File::from_bytes(black_box(&bytes))));
	});

	group.finish();
}

/// Benchmark resolution of PCX buffers against a different palette
fn bench_resolve(c: &mut Criterion) {
	let mut group = c.benchmark_group("fpg_resolve");

	let mut fpg = File::new(Palette::black());
	for id in 1..=16 {
		let _ = fpg.add_buffer(generate_pcx(64, 64, id as usize).unwrap(), id, "", &[]);
	}

	group.throughput(Throughput::Elements(16));
	group.bench_function("pcx_16", |b| {
		b.iter(|| black_box(fpg.resolve()));
	});

	group.finish();
}

criterion_group!(benches, bench_write, bench_resolve);
criterion_main!(benches);
