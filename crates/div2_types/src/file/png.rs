//! PNG import support.
//!
//! DIV2 only understands 8-bit indexed images. An indexed PNG in canonical
//! layout has its `PLTE` chunk right after `IHDR`, which puts the chunk at a
//! fixed offset:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  ------------------------------------------
//! 0       8     PNG signature
//! 8       25    IHDR chunk (length, type, 13 data bytes, CRC)
//! 33      4     PLTE length (u32 BE)
//! 37      4     "PLTE"
//! 41      n     n / 3 RGB triplets, 8-bit channels
//! ```
//!
//! [`normalize_indexed`] rewrites any indexed PNG (including 1, 2 and 4-bit
//! ones) into that layout. Non-indexed images can only be brought into a
//! package palette through [`remap_to_palette`].

use std::collections::HashMap;
use std::io::Cursor;

use ::png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use log::{debug, trace};

use crate::file::indexed::IndexedImage;
use crate::file::map::Bitmap;
use crate::file::pal::Palette;
use crate::file::primitive::read_u32_be;
use crate::file::{DivFileError, FileType, pcx};

/// PNG constants.
pub mod constants {
	/// PNG file signature
	pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

	/// Offset of the `PLTE` chunk in a canonical indexed PNG
	pub const PLTE_OFFSET: usize = 33;

	/// Chunk type of the palette chunk
	pub const PLTE_TYPE: [u8; 4] = *b"PLTE";

	/// Size of a chunk length plus chunk type
	pub const CHUNK_PREFIX_SIZE: usize = 8;
}

/// Returns the raw `PLTE` payload of a canonical indexed PNG.
///
/// # Errors
///
/// Returns [`DivFileError::InsufficientData`] if the buffer is too short, and
/// [`DivFileError::NotIndexed`] if there is no `PLTE` chunk at offset 33.
pub fn extract_palette_chunk(buffer: &[u8]) -> Result<Vec<u8>, DivFileError> {
	let data_start = constants::PLTE_OFFSET + constants::CHUNK_PREFIX_SIZE;
	if buffer.len() < data_start {
		return Err(DivFileError::insufficient_data(FileType::Png, data_start, buffer.len()));
	}

	let chunk_type = &buffer[constants::PLTE_OFFSET + 4..data_start];
	if chunk_type != constants::PLTE_TYPE {
		return Err(DivFileError::NotIndexed {
			file_type: FileType::Png,
			reason: format!("expected PLTE chunk at offset 33, found {chunk_type:02X?}"),
		});
	}

	let length = read_u32_be(&mut &buffer[constants::PLTE_OFFSET..])? as usize;
	let data_end = data_start + length;
	if buffer.len() < data_end {
		return Err(DivFileError::insufficient_data(FileType::Png, data_end, buffer.len()));
	}
	Ok(buffer[data_start..data_end].to_vec())
}

/// Extracts the palette of a canonical indexed PNG.
pub fn palette_from_png(buffer: &[u8]) -> Result<Palette, DivFileError> {
	let chunk = extract_palette_chunk(buffer)?;
	Palette::from_rgb8(&chunk, FileType::Png)
}

/// Returns `true` if `buffer` is a PNG with `PLTE` right after `IHDR`.
pub fn is_canonical(buffer: &[u8]) -> bool {
	buffer.starts_with(&constants::SIGNATURE) && extract_palette_chunk(buffer).is_ok()
}

struct RawIndexed {
	width: u16,
	height: u16,
	pixels: Vec<u8>,
	palette: Vec<u8>,
}

/// Decodes an indexed PNG into one byte per pixel.
fn read_indexed(buffer: &[u8]) -> Result<RawIndexed, DivFileError> {
	let mut decoder = Decoder::new(Cursor::new(buffer));
	decoder.set_transformations(Transformations::IDENTITY);
	let mut reader = decoder.read_info()?;

	let info = reader.info();
	if info.color_type != ColorType::Indexed {
		return Err(DivFileError::NotIndexed {
			file_type: FileType::Png,
			reason: format!("color type {:?} is not indexed", info.color_type),
		});
	}
	let palette = info.palette.as_deref().map(<[u8]>::to_vec).ok_or_else(|| {
		DivFileError::malformed(FileType::Png, "indexed image without PLTE chunk")
	})?;
	let (Ok(width), Ok(height)) = (u16::try_from(info.width), u16::try_from(info.height)) else {
		return Err(DivFileError::malformed(
			FileType::Png,
			format!("image of {}x{} exceeds 65535 pixels per side", info.width, info.height),
		));
	};

	let mut data = vec![0u8; reader.output_buffer_size()];
	let frame = reader.next_frame(&mut data)?;
	let pixels = unpack_indices(&data, frame.line_size, width, height, frame.bit_depth);

	Ok(RawIndexed {
		width,
		height,
		pixels,
		palette,
	})
}

/// Expands packed scanlines to one index per byte.
fn unpack_indices(data: &[u8], line_size: usize, width: u16, height: u16, depth: BitDepth) -> Vec<u8> {
	let bits = match depth {
		BitDepth::One => 1,
		BitDepth::Two => 2,
		BitDepth::Four => 4,
		BitDepth::Eight | BitDepth::Sixteen => 8,
	};
	let width = width as usize;
	if bits == 8 {
		return data
			.chunks(line_size)
			.take(height as usize)
			.flat_map(|line| &line[..width])
			.copied()
			.collect();
	}

	let per_byte = 8 / bits;
	let mask = (1u8 << bits) - 1;
	let mut pixels = Vec::with_capacity(width * height as usize);
	for line in data.chunks(line_size).take(height as usize) {
		for x in 0..width {
			let shift = 8 - bits * (x % per_byte + 1);
			pixels.push((line[x / per_byte] >> shift) & mask);
		}
	}
	pixels
}

fn encode_indexed(raw: &RawIndexed) -> Result<Vec<u8>, DivFileError> {
	let mut output = Vec::new();
	let mut encoder = Encoder::new(&mut output, u32::from(raw.width), u32::from(raw.height));
	encoder.set_color(ColorType::Indexed);
	encoder.set_depth(BitDepth::Eight);
	encoder.set_palette(raw.palette.clone());
	let mut writer = encoder.write_header()?;
	writer.write_image_data(&raw.pixels)?;
	writer.finish()?;
	Ok(output)
}

/// Rewrites an indexed PNG as 8-bit indexed with `PLTE` right after `IHDR`.
///
/// # Errors
///
/// Returns [`DivFileError::NotIndexed`] if the image is not palette based.
pub fn normalize_indexed(buffer: &[u8]) -> Result<Vec<u8>, DivFileError> {
	let raw = read_indexed(buffer)?;
	encode_indexed(&raw)
}

/// Decodes an indexed PNG into pixels and palette.
pub fn decode_indexed(buffer: &[u8]) -> Result<IndexedImage, DivFileError> {
	let raw = read_indexed(buffer)?;
	let palette = if is_canonical(buffer) {
		palette_from_png(buffer)?
	} else {
		debug!("PNG palette is not at the canonical offset, using decoded PLTE");
		Palette::from_rgb8(&raw.palette, FileType::Png)?
	};

	Ok(IndexedImage::new(Bitmap::from_pixels(raw.width, raw.height, raw.pixels)?, palette))
}

/// Converts any supported image into pixels indexed against `palette`.
///
/// Indexed PCX and PNG images are remapped colour by colour. Every other
/// format goes through the `image` crate: fully transparent pixels become
/// index 0, the rest the closest palette colour.
pub fn remap_to_palette(buffer: &[u8], palette: &Palette) -> Result<Bitmap, DivFileError> {
	if pcx::is_indexed256(buffer) {
		return Ok(pcx::decode(buffer)?.remap(palette));
	}
	if buffer.starts_with(&constants::SIGNATURE) {
		match decode_indexed(buffer) {
			Ok(image) => return Ok(image.remap(palette)),
			Err(DivFileError::NotIndexed { .. }) => {}
			Err(e) => return Err(e),
		}
	}

	let rgba = image::load_from_memory(buffer)?.to_rgba8();
	let (Ok(width), Ok(height)) = (u16::try_from(rgba.width()), u16::try_from(rgba.height()))
	else {
		return Err(DivFileError::malformed(
			FileType::Png,
			format!("image of {}x{} exceeds 65535 pixels per side", rgba.width(), rgba.height()),
		));
	};

	let mut cache: HashMap<[u8; 3], u8> = HashMap::new();
	let pixels = rgba
		.pixels()
		.map(|pixel| {
			let [r, g, b, a] = pixel.0;
			if a == 0 {
				0
			} else {
				*cache.entry([r, g, b]).or_insert_with(|| palette.nearest([r, g, b]))
			}
		})
		.collect();
	trace!("Remapped {width}x{height} true colour image ({} distinct colours)", cache.len());

	Bitmap::from_pixels(width, height, pixels)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::ErrorKind;

	fn encode_png(
		width: u32,
		height: u32,
		color: ColorType,
		depth: BitDepth,
		palette: Option<Vec<u8>>,
		data: &[u8],
	) -> Vec<u8> {
		let mut output = Vec::new();
		let mut encoder = Encoder::new(&mut output, width, height);
		encoder.set_color(color);
		encoder.set_depth(depth);
		if let Some(palette) = palette {
			encoder.set_palette(palette);
		}
		let mut writer = encoder.write_header().unwrap();
		writer.write_image_data(data).unwrap();
		writer.finish().unwrap();
		output
	}

	#[test]
	fn test_extract_three_color_palette() {
		let palette = vec![255, 0, 0, 0, 255, 0, 0, 0, 255];
		let png =
			encode_png(2, 2, ColorType::Indexed, BitDepth::Eight, Some(palette.clone()), &[0, 1, 2, 1]);

		assert!(is_canonical(&png));
		let chunk = extract_palette_chunk(&png).unwrap();
		assert_eq!(chunk.len(), 9);
		assert_eq!(chunk, palette);

		let decoded = palette_from_png(&png).unwrap();
		assert_eq!(decoded.get(2).b(), 63);
		assert_eq!(decoded.get(3).b(), 0);
	}

	#[test]
	fn test_rgb_png_is_rejected() {
		let png = encode_png(1, 1, ColorType::Rgb, BitDepth::Eight, None, &[10, 20, 30]);
		assert_eq!(extract_palette_chunk(&png).unwrap_err().kind(), ErrorKind::Format);
		assert_eq!(decode_indexed(&png).unwrap_err().kind(), ErrorKind::Format);
		assert_eq!(normalize_indexed(&png).unwrap_err().kind(), ErrorKind::Format);
	}

	#[test]
	fn test_short_buffer() {
		let err = extract_palette_chunk(&constants::SIGNATURE).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Format);
	}

	#[test]
	fn test_normalize_four_bit() {
		// 3 pixels per row at 4 bits: 0x12, 0x30
		let palette = vec![0, 0, 0, 64, 64, 64, 128, 128, 128, 252, 252, 252];
		let png = encode_png(3, 2, ColorType::Indexed, BitDepth::Four, Some(palette), &[
			0x12, 0x30, 0x32, 0x10,
		]);

		let normalized = normalize_indexed(&png).unwrap();
		assert!(is_canonical(&normalized));
		let image = decode_indexed(&normalized).unwrap();
		assert_eq!((image.width(), image.height()), (3, 2));
		assert_eq!(image.pixels(), &[1, 2, 3, 3, 2, 1]);
		assert_eq!(image.palette().get(3).r(), 63);
	}

	#[test]
	fn test_remap_true_color() {
		// opaque red, transparent green
		let png = encode_png(2, 1, ColorType::Rgba, BitDepth::Eight, None, &[
			255, 0, 0, 255, 0, 255, 0, 0,
		]);
		let palette = Palette::from_rgb8(&[0, 0, 0, 0, 255, 0, 255, 0, 0], FileType::Png).unwrap();

		let bitmap = remap_to_palette(&png, &palette).unwrap();
		assert_eq!(bitmap.pixels(), &[2, 0]);
	}

	#[test]
	fn test_remap_indexed_is_identity_on_same_palette() {
		let rgb = vec![0, 0, 0, 255, 255, 255];
		let png = encode_png(2, 1, ColorType::Indexed, BitDepth::Eight, Some(rgb.clone()), &[1, 0]);
		let palette = Palette::from_rgb8(&rgb, FileType::Png).unwrap();

		assert_eq!(remap_to_palette(&png, &palette).unwrap().pixels(), &[1, 0]);
	}
}
