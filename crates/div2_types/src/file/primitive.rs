//! Low level helpers shared by every codec.
//!
//! Fixed-length ASCII fields, single bit manipulation and little-endian
//! integer reads on top of [`std::io::Read`].

use std::io::{self, Read};

use crate::file::{DivFileError, FileType};

/// Normalizes `text` to the value a `len` byte ASCII field reads back as.
///
/// The text ends at the first NUL, characters outside the ASCII range become
/// `?` and at most `len` characters are kept.
pub fn to_ascii_field(text: &str, len: usize) -> String {
	text.chars()
		.take_while(|&c| c != '\0')
		.map(|c| if c.is_ascii() { c } else { '?' })
		.take(len)
		.collect()
}

/// Encodes `text` as a fixed-length, NUL padded ASCII field.
///
/// The content is [`to_ascii_field`] applied to `text`.
pub fn to_fixed_ascii(text: &str, len: usize) -> Vec<u8> {
	let mut bytes = to_ascii_field(text, len).into_bytes();
	bytes.resize(len, 0);
	bytes
}

/// Truncates `text` to `len` characters or right-pads it with spaces.
pub fn pad_fixed(text: &str, len: usize) -> String {
	let mut fixed: String = text.chars().take(len).collect();
	let count = fixed.chars().count();
	fixed.extend(std::iter::repeat_n(' ', len - count));
	fixed
}

/// Reads an ASCII string up to the first NUL byte (or the whole slice).
///
/// Bytes outside the ASCII range are replaced with `?`.
pub fn read_null_terminated(bytes: &[u8]) -> String {
	let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
	bytes[..end].iter().map(|&b| if b.is_ascii() { b as char } else { '?' }).collect()
}

/// Returns `true` if `bit` (0-7) is set in `value`.
#[inline]
pub const fn is_bit_set(value: u8, bit: u8) -> bool {
	bit < 8 && value & (1 << bit) != 0
}

/// Sets or clears `bit` (0-7) in `value`.
///
/// # Errors
///
/// Returns [`DivFileError::OutOfRange`] when `bit` is greater than 7.
pub fn set_bit(value: u8, bit: u8, on: bool, file_type: FileType) -> Result<u8, DivFileError> {
	if bit > 7 {
		return Err(DivFileError::OutOfRange {
			file_type,
			what: "bit index",
			value: bit as usize,
			limit: 7,
		});
	}
	Ok(if on { value | (1 << bit) } else { value & !(1 << bit) })
}

/// Reads a little-endian `u16`.
pub fn read_u16_le<R: Read>(reader: &mut R) -> io::Result<u16> {
	let mut buf = [0u8; 2];
	reader.read_exact(&mut buf)?;
	Ok(u16::from_le_bytes(buf))
}

/// Reads a little-endian `i16`.
pub fn read_i16_le<R: Read>(reader: &mut R) -> io::Result<i16> {
	let mut buf = [0u8; 2];
	reader.read_exact(&mut buf)?;
	Ok(i16::from_le_bytes(buf))
}

/// Reads a little-endian `u32`.
pub fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
	let mut buf = [0u8; 4];
	reader.read_exact(&mut buf)?;
	Ok(u32::from_le_bytes(buf))
}

/// Reads a big-endian `u32`.
pub fn read_u32_be<R: Read>(reader: &mut R) -> io::Result<u32> {
	let mut buf = [0u8; 4];
	reader.read_exact(&mut buf)?;
	Ok(u32::from_be_bytes(buf))
}

/// Reads a little-endian `i32`.
pub fn read_i32_le<R: Read>(reader: &mut R) -> io::Result<i32> {
	let mut buf = [0u8; 4];
	reader.read_exact(&mut buf)?;
	Ok(i32::from_le_bytes(buf))
}

/// Reads a little-endian `i32`, or `None` if the stream is already at its end.
///
/// A stream ending in the middle of the value is an
/// [`io::ErrorKind::UnexpectedEof`] error.
pub fn try_read_i32_le<R: Read>(reader: &mut R) -> io::Result<Option<i32>> {
	let mut buf = [0u8; 4];
	let mut filled = 0;
	while filled < buf.len() {
		match reader.read(&mut buf[filled..]) {
			Ok(0) => break,
			Ok(n) => filled += n,
			Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
			Err(e) => return Err(e),
		}
	}

	match filled {
		0 => Ok(None),
		4 => Ok(Some(i32::from_le_bytes(buf))),
		_ => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated 32-bit field")),
	}
}

/// Reads exactly `len` bytes into a new buffer.
pub fn read_vec<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
	let mut buf = vec![0u8; len];
	reader.read_exact(&mut buf)?;
	Ok(buf)
}
