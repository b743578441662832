//! Decoded 256-colour image, the common result of the PCX and PNG importers.

use std::fmt;

use crate::file::map::Bitmap;
use crate::file::pal::Palette;

/// Indexed image with its own palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
	bitmap: Bitmap,
	palette: Palette,
}

impl IndexedImage {
	/// Bundles a bitmap with the palette its indices refer to.
	pub fn new(bitmap: Bitmap, palette: Palette) -> Self {
		Self {
			bitmap,
			palette,
		}
	}

	/// Image width in pixels.
	pub fn width(&self) -> u16 {
		self.bitmap.width()
	}

	/// Image height in pixels.
	pub fn height(&self) -> u16 {
		self.bitmap.height()
	}

	/// Palette indices, row-major.
	pub fn pixels(&self) -> &[u8] {
		self.bitmap.pixels()
	}

	/// The pixel buffer.
	pub fn bitmap(&self) -> &Bitmap {
		&self.bitmap
	}

	/// The palette.
	pub fn palette(&self) -> &Palette {
		&self.palette
	}

	/// Splits the image into bitmap and palette.
	pub fn into_parts(self) -> (Bitmap, Palette) {
		(self.bitmap, self.palette)
	}

	/// Re-indexes the pixels against another palette.
	///
	/// Each source index is mapped once to the closest colour of `target`;
	/// index 0 (transparent in the engine) always stays 0.
	pub fn remap(&self, target: &Palette) -> Bitmap {
		if &self.palette == target {
			return self.bitmap.clone();
		}

		let mut table = [0u8; 256];
		for (index, slot) in table.iter_mut().enumerate().skip(1) {
			*slot = target.nearest(self.palette.get(index as u8).to_rgb8());
		}
		self.bitmap.map_pixels(|index| table[index as usize])
	}
}

impl fmt::Display for IndexedImage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Indexed image {}x{}", self.width(), self.height())
	}
}
