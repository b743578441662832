//! Raw indexed pixel buffer of a MAP or FPG entry.

use std::fmt::Display;
use std::io::{Read, Write};

use crate::file::primitive::read_vec;
use crate::file::{DivFileError, FileType};

/// Indexed pixels bound to `width × height`.
///
/// The buffer length always equals `width * height`; pixel values are palette
/// indices and are not otherwise constrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
	width: u16,
	height: u16,
	pixels: Vec<u8>,
}

impl Bitmap {
	/// Creates a zero-filled bitmap.
	pub fn new(width: u16, height: u16) -> Self {
		Self {
			width,
			height,
			pixels: vec![0; width as usize * height as usize],
		}
	}

	/// Wraps an existing pixel buffer.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::BitmapSizeMismatch`] if `pixels.len()` is not
	/// `width * height`.
	pub fn from_pixels(width: u16, height: u16, pixels: Vec<u8>) -> Result<Self, DivFileError> {
		let expected = width as usize * height as usize;
		if pixels.len() != expected {
			return Err(DivFileError::BitmapSizeMismatch {
				file_type: FileType::Map,
				width,
				height,
				expected,
				actual: pixels.len(),
			});
		}
		Ok(Self {
			width,
			height,
			pixels,
		})
	}

	/// Reads exactly `width * height` pixels.
	pub fn from_reader<R: Read>(
		reader: &mut R,
		width: u16,
		height: u16,
	) -> Result<Self, DivFileError> {
		let pixels = read_vec(reader, width as usize * height as usize)?;
		Ok(Self {
			width,
			height,
			pixels,
		})
	}

	/// Width in pixels.
	#[inline]
	pub fn width(&self) -> u16 {
		self.width
	}

	/// Height in pixels.
	#[inline]
	pub fn height(&self) -> u16 {
		self.height
	}

	/// Number of bytes in the pixel buffer.
	#[inline]
	pub fn byte_len(&self) -> usize {
		self.pixels.len()
	}

	/// Pixel buffer, row-major.
	#[inline]
	pub fn pixels(&self) -> &[u8] {
		&self.pixels
	}

	/// Consumes the bitmap and returns the pixel buffer.
	pub fn into_pixels(self) -> Vec<u8> {
		self.pixels
	}

	/// Gets the pixel value at (x, y), or `None` outside the bitmap.
	pub fn pixel(&self, x: u16, y: u16) -> Option<u8> {
		if x >= self.width || y >= self.height {
			return None;
		}
		Some(self.pixels[y as usize * self.width as usize + x as usize])
	}

	/// Returns an iterator over rows of pixels.
	pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
		// chunks_exact panics on 0
		self.pixels.chunks_exact((self.width as usize).max(1))
	}

	/// Builds a new bitmap of the same size with every pixel passed through `f`.
	pub(crate) fn map_pixels(&self, f: impl Fn(u8) -> u8) -> Self {
		Self {
			width: self.width,
			height: self.height,
			pixels: self.pixels.iter().map(|&p| f(p)).collect(),
		}
	}

	/// Writes the pixel buffer.
	pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		writer.write_all(&self.pixels)?;
		Ok(())
	}
}

impl Display for Bitmap {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Bitmap {}x{} ({} bytes)", self.width, self.height, self.pixels.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn test_new_is_zero_filled() {
		let bitmap = Bitmap::new(4, 3);
		assert_eq!(bitmap.byte_len(), 12);
		assert!(bitmap.pixels().iter().all(|&p| p == 0));
	}

	#[test]
	fn test_from_pixels_checks_length() {
		assert!(Bitmap::from_pixels(2, 2, vec![1, 2, 3, 4]).is_ok());
		let err = Bitmap::from_pixels(2, 2, vec![1, 2, 3]).unwrap_err();
		assert_eq!(err.kind(), crate::file::ErrorKind::Range);
	}

	#[test]
	fn test_from_reader_consumes_exactly() {
		let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5, 6, 7]);
		let bitmap = Bitmap::from_reader(&mut cursor, 3, 2).unwrap();
		assert_eq!(bitmap.pixels(), &[1, 2, 3, 4, 5, 6]);
		assert_eq!(cursor.position(), 6);

		let mut short = Cursor::new(vec![1, 2]);
		assert!(Bitmap::from_reader(&mut short, 3, 2).is_err());
	}

	#[test]
	fn test_pixel_access() {
		let bitmap = Bitmap::from_pixels(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
		assert_eq!(bitmap.pixel(2, 1), Some(5));
		assert_eq!(bitmap.pixel(3, 0), None);
		assert_eq!(bitmap.rows().count(), 2);
	}
}
