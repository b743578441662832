//! PCX import support (8-bit, 256 colour images only).
//!
//! ## Layout
//!
//! A 128-byte header (signature `0x0A`, version 0-5, encoding, 8 bits per
//! pixel, the `u16` window at `0x04`, one plane at `0x41`, bytes per line at
//! `0x42`) is followed by the pixel stream. The file ends with the `0x0C`
//! marker and 768 bytes of 8-bit RGB palette.
//!
//! ## RLE
//!
//! A byte with both top bits set (`0xC0`) is a run header: its low six bits
//! give the run length and the following byte is the value to repeat. Any
//! other byte is a literal pixel. Encoders must write literals `>= 0xC0` as
//! runs of one; this decoder relies on that and does not try to tell an
//! unescaped high literal apart from a run header.

use log::{debug, warn};

use crate::file::indexed::IndexedImage;
use crate::file::map::Bitmap;
use crate::file::pal::{Palette, constants::COLOR_TABLE_SIZE};
use crate::file::primitive::is_bit_set;
use crate::file::{DivFileError, FileType};

/// PCX constants.
pub mod constants {
	/// Size of the fixed header
	pub const HEADER_SIZE: usize = 128;

	/// First byte of every PCX file
	pub const SIGNATURE: u8 = 0x0A;

	/// Highest supported version byte
	pub const MAX_VERSION: u8 = 5;

	/// Encoding byte for raw pixel data
	pub const ENCODING_NONE: u8 = 0;

	/// Encoding byte for RLE pixel data
	pub const ENCODING_RLE: u8 = 1;

	/// Bits per pixel of a 256 colour image
	pub const BPP_8: u8 = 8;

	/// Marker preceding the trailing 256 colour palette
	pub const PALETTE_MARKER: u8 = 0x0C;

	/// Size of the trailing palette block including the marker
	pub const PALETTE_BLOCK_SIZE: usize = super::COLOR_TABLE_SIZE + 1;

	/// Mask of the run header bits
	pub const RLE_RUN_MASK: u8 = 0xC0;

	/// Mask of the run length bits
	pub const RLE_COUNT_MASK: u8 = 0x3F;

	/// Longest run a single header can describe
	pub const MAX_RUN: usize = RLE_COUNT_MASK as usize;

	/// Offsets of header fields
	pub const VERSION_OFFSET: usize = 1;
	/// Encoding byte
	pub const ENCODING_OFFSET: usize = 2;
	/// Bits per pixel byte
	pub const BPP_OFFSET: usize = 3;
	/// Window (`xmin`, `ymin`, `xmax`, `ymax`)
	pub const WINDOW_OFFSET: usize = 4;
	/// Horizontal DPI
	pub const DPI_OFFSET: usize = 12;
	/// Number of colour planes
	pub const PLANES_OFFSET: usize = 65;
	/// Scanline stride
	pub const BYTES_PER_LINE_OFFSET: usize = 66;
	/// Palette interpretation
	pub const PALETTE_INFO_OFFSET: usize = 68;
}

/// Returns `true` for a run header byte (both top bits set).
#[inline]
pub const fn is_run_header(value: u8) -> bool {
	is_bit_set(value, 7) && is_bit_set(value, 6)
}

#[inline]
fn u16_at(data: &[u8], offset: usize) -> u16 {
	u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Checks whether `buffer` is an 8-bit, 256 colour PCX image.
pub fn is_indexed256(buffer: &[u8]) -> bool {
	if buffer.len() < constants::HEADER_SIZE + constants::PALETTE_BLOCK_SIZE {
		return false;
	}

	buffer[0] == constants::SIGNATURE
		&& buffer[constants::VERSION_OFFSET] <= constants::MAX_VERSION
		&& matches!(
			buffer[constants::ENCODING_OFFSET],
			constants::ENCODING_NONE | constants::ENCODING_RLE
		) && buffer[constants::BPP_OFFSET] == constants::BPP_8
		&& buffer[constants::PLANES_OFFSET] <= 1
		&& buffer[buffer.len() - constants::PALETTE_BLOCK_SIZE] == constants::PALETTE_MARKER
}

/// Decompresses a PCX RLE stream until `expected` bytes are produced.
///
/// Returns the decoded bytes and how many input bytes were consumed.
///
/// # Errors
///
/// Returns [`DivFileError::Malformed`] if the input ends before `expected`
/// bytes are produced or a run goes past `expected`.
pub fn decompress_rle(data: &[u8], expected: usize) -> Result<(Vec<u8>, usize), DivFileError> {
	let mut output = Vec::with_capacity(expected);
	let mut pos = 0;

	while output.len() < expected {
		let Some(&value) = data.get(pos) else {
			return Err(DivFileError::malformed(
				FileType::Pcx,
				format!("RLE stream ended after {} of {} bytes", output.len(), expected),
			));
		};
		pos += 1;

		if is_run_header(value) {
			let count = (value & constants::RLE_COUNT_MASK) as usize;
			let Some(&pixel) = data.get(pos) else {
				return Err(DivFileError::malformed(FileType::Pcx, "RLE run header without value"));
			};
			pos += 1;

			if output.len() + count > expected {
				return Err(DivFileError::malformed(
					FileType::Pcx,
					format!("RLE run of {count} overflows the {expected} byte plane"),
				));
			}
			output.resize(output.len() + count, pixel);
		} else {
			output.push(value);
		}
	}

	Ok((output, pos))
}

/// Compresses a scanline with PCX RLE.
///
/// Runs are capped at 63 bytes and literals with both top bits set are
/// always written as runs of one.
pub fn compress_rle(line: &[u8], output: &mut Vec<u8>) {
	let mut i = 0;
	while i < line.len() {
		let value = line[i];
		let run = line[i..].iter().take(constants::MAX_RUN).take_while(|&&v| v == value).count();

		if run > 1 || is_run_header(value) {
			output.push(constants::RLE_RUN_MASK | run as u8);
			output.push(value);
		} else {
			output.push(value);
		}
		i += run;
	}
}

/// Reads the trailing 256 colour palette.
pub fn read_palette(buffer: &[u8]) -> Result<Palette, DivFileError> {
	if buffer.len() < constants::PALETTE_BLOCK_SIZE {
		return Err(DivFileError::insufficient_data(
			FileType::Pcx,
			constants::PALETTE_BLOCK_SIZE,
			buffer.len(),
		));
	}

	let block = &buffer[buffer.len() - constants::PALETTE_BLOCK_SIZE..];
	if block[0] != constants::PALETTE_MARKER {
		return Err(DivFileError::NotIndexed {
			file_type: FileType::Pcx,
			reason: "256 colour palette marker not found".to_string(),
		});
	}
	Palette::from_rgb8(&block[1..], FileType::Pcx)
}

/// Decodes an 8-bit, 256 colour PCX image.
///
/// # Errors
///
/// - [`DivFileError::NotIndexed`] if [`is_indexed256`] rejects the buffer
/// - [`DivFileError::Malformed`] if the window or pixel stream is invalid
pub fn decode(buffer: &[u8]) -> Result<IndexedImage, DivFileError> {
	if !is_indexed256(buffer) {
		return Err(DivFileError::NotIndexed {
			file_type: FileType::Pcx,
			reason: "the PCX image is not a 256 color image".to_string(),
		});
	}

	if buffer[constants::PLANES_OFFSET] == 0 {
		warn!("PCX header declares 0 colour planes, assuming 1");
	}

	let xmin = u16_at(buffer, constants::WINDOW_OFFSET);
	let ymin = u16_at(buffer, constants::WINDOW_OFFSET + 2);
	let xmax = u16_at(buffer, constants::WINDOW_OFFSET + 4);
	let ymax = u16_at(buffer, constants::WINDOW_OFFSET + 6);
	if xmax < xmin || ymax < ymin {
		return Err(DivFileError::malformed(
			FileType::Pcx,
			format!("invalid window ({xmin}, {ymin}) - ({xmax}, {ymax})"),
		));
	}
	let width = u32::from(xmax - xmin) + 1;
	let height = u32::from(ymax - ymin) + 1;
	let (Ok(width), Ok(height)) = (u16::try_from(width), u16::try_from(height)) else {
		return Err(DivFileError::malformed(FileType::Pcx, "image dimensions exceed 65535"));
	};

	let stride = match u16_at(buffer, constants::BYTES_PER_LINE_OFFSET) {
		0 => width as usize,
		n => n as usize,
	};
	if stride < width as usize {
		return Err(DivFileError::malformed(
			FileType::Pcx,
			format!("bytes per line {stride} shorter than width {width}"),
		));
	}

	let data = &buffer[constants::HEADER_SIZE..buffer.len() - constants::PALETTE_BLOCK_SIZE];
	let plane_size = stride * height as usize;
	let plane = if buffer[constants::ENCODING_OFFSET] == constants::ENCODING_RLE {
		decompress_rle(data, plane_size)?.0
	} else {
		if data.len() < plane_size {
			return Err(DivFileError::insufficient_data(FileType::Pcx, plane_size, data.len()));
		}
		data[..plane_size].to_vec()
	};

	let pixels = if stride == width as usize {
		plane
	} else {
		plane.chunks_exact(stride).flat_map(|line| &line[..width as usize]).copied().collect()
	};

	let palette = read_palette(buffer)?;
	debug!("Decoded PCX image {width}x{height} (stride {stride})");

	Ok(IndexedImage::new(Bitmap::from_pixels(width, height, pixels)?, palette))
}

/// Encodes an indexed image as an RLE compressed, version 5 PCX file.
///
/// # Errors
///
/// Returns [`DivFileError::OutOfRange`] for an image with no columns or no
/// rows, which the PCX window cannot describe.
pub fn encode(image: &IndexedImage) -> Result<Vec<u8>, DivFileError> {
	let width = image.width();
	let height = image.height();
	for (what, value) in [("image width", width), ("image height", height)] {
		if value == 0 {
			return Err(DivFileError::OutOfRange {
				file_type: FileType::Pcx,
				what,
				value: 0,
				limit: u16::MAX as usize,
			});
		}
	}
	// Scanlines are padded to an even number of bytes
	let stride = (width as usize + 1) & !1;

	let mut header = [0u8; constants::HEADER_SIZE];
	header[0] = constants::SIGNATURE;
	header[constants::VERSION_OFFSET] = constants::MAX_VERSION;
	header[constants::ENCODING_OFFSET] = constants::ENCODING_RLE;
	header[constants::BPP_OFFSET] = constants::BPP_8;
	header[constants::WINDOW_OFFSET + 4..constants::WINDOW_OFFSET + 6]
		.copy_from_slice(&(width - 1).to_le_bytes());
	header[constants::WINDOW_OFFSET + 6..constants::WINDOW_OFFSET + 8]
		.copy_from_slice(&(height - 1).to_le_bytes());
	header[constants::DPI_OFFSET..constants::DPI_OFFSET + 2].copy_from_slice(&72u16.to_le_bytes());
	header[constants::DPI_OFFSET + 2..constants::DPI_OFFSET + 4]
		.copy_from_slice(&72u16.to_le_bytes());
	header[constants::PLANES_OFFSET] = 1;
	header[constants::BYTES_PER_LINE_OFFSET..constants::BYTES_PER_LINE_OFFSET + 2]
		.copy_from_slice(&(stride as u16).to_le_bytes());
	header[constants::PALETTE_INFO_OFFSET] = 1;

	let mut data = header.to_vec();
	let mut line = vec![0u8; stride];
	for row in image.bitmap().rows().take(height as usize) {
		line[..row.len()].copy_from_slice(row);
		compress_rle(&line, &mut data);
	}

	data.push(constants::PALETTE_MARKER);
	data.extend_from_slice(&image.palette().to_rgb8());
	Ok(data)
}
