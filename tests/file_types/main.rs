//! Test file types for `div2-rs`

mod fpg;
mod import;
mod map;

use std::path::PathBuf;

use div2_rs::file::map::Bitmap;
use div2_rs::file::pal::Palette;
use div2_rs::file::IndexedImage;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Creates an empty scratch directory unique to this test process.
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("div2_rs_{name}_{}", std::process::id()));
	let _ = std::fs::remove_dir_all(&dir);
	std::fs::create_dir_all(&dir).unwrap();
	dir
}

/// Random image over a grayscale palette.
pub(crate) fn random_image(seed: u64, width: u16, height: u16) -> IndexedImage {
	let mut rng = SmallRng::seed_from_u64(seed);
	let pixels = (0..width as usize * height as usize).map(|_| rng.random()).collect();
	IndexedImage::new(Bitmap::from_pixels(width, height, pixels).unwrap(), Palette::grayscale())
}

/// Encodes an 8-bit PNG with the `png` crate.
pub(crate) fn encode_png(
	width: u32,
	height: u32,
	color: png::ColorType,
	palette: Option<Vec<u8>>,
	data: &[u8],
) -> Vec<u8> {
	let mut output = Vec::new();
	let mut encoder = png::Encoder::new(&mut output, width, height);
	encoder.set_color(color);
	encoder.set_depth(png::BitDepth::Eight);
	if let Some(palette) = palette {
		encoder.set_palette(palette);
	}
	let mut writer = encoder.write_header().unwrap();
	writer.write_image_data(data).unwrap();
	writer.finish().unwrap();
	output
}
