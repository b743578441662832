//! Benchmark helper utilities for div2-rs
//!
//! This module provides generators for synthetic images so the benchmarks do
//! not depend on game assets being present on disk.

use div2_types::file::map::Bitmap;
use div2_types::file::pal::Palette;
use div2_types::file::{DivFileError, IndexedImage, pcx};

/// Generates pixels with horizontal runs of `run` identical bytes.
///
/// Long runs model flat backgrounds, `run == 1` models noisy artwork where
/// RLE barely helps.
pub fn generate_pixels(width: u16, height: u16, run: usize) -> Vec<u8> {
	let run = run.max(1);
	(0..width as usize * height as usize)
		.map(|i| ((i / run) * 31 % 256) as u8)
		.collect()
}

/// Generates an RLE compressed PCX file.
pub fn generate_pcx(width: u16, height: u16, run: usize) -> Result<Vec<u8>, DivFileError> {
	let bitmap = Bitmap::from_pixels(width, height, generate_pixels(width, height, run))
		.unwrap_or_else(|_| Bitmap::new(width, height));
	pcx::encode(&IndexedImage::new(bitmap, Palette::grayscale()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_generated_pcx_decodes() {
		let data = generate_pcx(33, 17, 5).unwrap();
		let image = pcx::decode(&data).unwrap();
		assert_eq!(image.pixels(), generate_pixels(33, 17, 5).as_slice());
	}
}
