//! FPG register, one image inside a package.

use std::fmt;
use std::io::{Read, Write};

use log::trace;

use crate::file::map::{Bitmap, CONTROL_POINT_SIZE, ControlPointList, CountWidth, check_graph_id};
use crate::file::primitive::{
	pad_fixed, read_i32_le, read_null_terminated, to_ascii_field, to_fixed_ascii, try_read_i32_le,
};
use crate::file::record::Record;
use crate::file::{DivFileError, FileType};

use super::constants::{DESCRIPTION_LENGTH, FILENAME_LENGTH, REGISTER_HEADER_SIZE};

/// Fixed part of a register, everything before the control point count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterHeader {
	/// Graph id
	pub graph_id: i32,
	/// Total register size in bytes, header and count included
	pub length: i32,
	/// Description, at most 32 characters
	pub description: String,
	/// Source file name, at most 12 characters
	pub filename: String,
	/// Image width
	pub width: i32,
	/// Image height
	pub height: i32,
}

impl Record for RegisterHeader {
	// The i32 control point count completes the 64-byte register header
	const SIZE: usize = REGISTER_HEADER_SIZE - 4;

	fn read_from<R: Read>(reader: &mut R) -> Result<Self, DivFileError> {
		let graph_id = read_i32_le(reader)?;
		let length = read_i32_le(reader)?;
		let mut description = [0u8; DESCRIPTION_LENGTH];
		reader.read_exact(&mut description)?;
		let mut filename = [0u8; FILENAME_LENGTH];
		reader.read_exact(&mut filename)?;
		let width = read_i32_le(reader)?;
		let height = read_i32_le(reader)?;

		Ok(Self {
			graph_id,
			length,
			description: read_null_terminated(&description),
			filename: read_null_terminated(&filename),
			width,
			height,
		})
	}

	fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		writer.write_all(&self.graph_id.to_le_bytes())?;
		writer.write_all(&self.length.to_le_bytes())?;
		writer.write_all(&to_fixed_ascii(&self.description, DESCRIPTION_LENGTH))?;
		writer.write_all(&to_fixed_ascii(&self.filename, FILENAME_LENGTH))?;
		writer.write_all(&self.width.to_le_bytes())?;
		writer.write_all(&self.height.to_le_bytes())?;
		Ok(())
	}
}

/// A resolved package entry, ready to be serialized.
///
/// The register length is always derived from the content, see
/// [`Register::length`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
	graph_id: i32,
	description: String,
	filename: String,
	control_points: ControlPointList,
	bitmap: Bitmap,
}

impl Register {
	/// Creates a register.
	///
	/// Description and filename are stored as they will be written: ASCII,
	/// at most 32 and 12 characters.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::GraphIdOutOfRange`] unless `graph_id` is in `[1, 999]`.
	pub fn new(
		graph_id: i32,
		description: &str,
		filename: &str,
		control_points: ControlPointList,
		bitmap: Bitmap,
	) -> Result<Self, DivFileError> {
		check_graph_id(graph_id, FileType::Fpg)?;
		Ok(Self {
			graph_id,
			description: to_ascii_field(description, DESCRIPTION_LENGTH),
			filename: to_ascii_field(filename, FILENAME_LENGTH),
			control_points,
			bitmap,
		})
	}

	/// Graph id.
	pub fn graph_id(&self) -> i32 {
		self.graph_id
	}

	/// Description.
	pub fn description(&self) -> &str {
		&self.description
	}

	/// Source file name.
	pub fn filename(&self) -> &str {
		&self.filename
	}

	/// Control points.
	pub fn control_points(&self) -> &ControlPointList {
		&self.control_points
	}

	/// Pixels.
	pub fn bitmap(&self) -> &Bitmap {
		&self.bitmap
	}

	/// Splits the register into its control points and bitmap.
	pub fn into_parts(self) -> (ControlPointList, Bitmap) {
		(self.control_points, self.bitmap)
	}

	/// Serialized size: 64 + 4 × points + pixels.
	pub fn length(&self) -> usize {
		REGISTER_HEADER_SIZE + CONTROL_POINT_SIZE * self.control_points.len() + self.bitmap.byte_len()
	}

	/// Builds the fixed header for this register.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::OutOfRange`] if the register is larger than
	/// `i32::MAX` bytes.
	pub fn header(&self) -> Result<RegisterHeader, DivFileError> {
		let length = i32::try_from(self.length()).map_err(|_| DivFileError::OutOfRange {
			file_type: FileType::Fpg,
			what: "register length",
			value: self.length(),
			limit: i32::MAX as usize,
		})?;

		Ok(RegisterHeader {
			graph_id: self.graph_id,
			length,
			description: self.description.clone(),
			filename: self.filename.clone(),
			width: i32::from(self.bitmap.width()),
			height: i32::from(self.bitmap.height()),
		})
	}

	/// Writes the register body: control point count, points and pixels.
	pub fn write_body<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		self.control_points.write_to(writer, CountWidth::DoubleWord)?;
		self.bitmap.write_to(writer)
	}

	/// Writes the whole register.
	pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		self.header()?.write_to(writer)?;
		self.write_body(writer)
	}

	/// Reads the next register, or `None` at a clean end of stream.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::Malformed`] if the graph id or dimensions are
	/// out of range, or if the stored length does not match
	/// `64 + 4 × points + width × height`.
	pub fn read_next<R: Read>(reader: &mut R) -> Result<Option<Self>, DivFileError> {
		let Some(graph_id) = try_read_i32_le(reader)? else {
			return Ok(None);
		};
		let prefix = graph_id.to_le_bytes();
		let header = RegisterHeader::read_from(&mut prefix.as_slice().chain(reader.by_ref()))?;

		if check_graph_id(header.graph_id, FileType::Fpg).is_err() {
			return Err(DivFileError::malformed(
				FileType::Fpg,
				format!("register graph id {} outside [1, 999]", header.graph_id),
			));
		}
		let (Ok(width), Ok(height)) = (u16::try_from(header.width), u16::try_from(header.height))
		else {
			return Err(DivFileError::malformed(
				FileType::Fpg,
				format!("graph {} has invalid size {}x{}", graph_id, header.width, header.height),
			));
		};

		let control_points = ControlPointList::from_reader(reader, CountWidth::DoubleWord, FileType::Fpg)?;
		let fixed = REGISTER_HEADER_SIZE + CONTROL_POINT_SIZE * control_points.len();
		let pixel_count = usize::try_from(header.length).ok().and_then(|len| len.checked_sub(fixed));
		let expected = width as usize * height as usize;
		if pixel_count != Some(expected) {
			return Err(DivFileError::malformed(
				FileType::Fpg,
				format!(
					"graph {graph_id}: length {} does not match {width}x{height} with {} control points",
					header.length,
					control_points.len()
				),
			));
		}

		let bitmap = Bitmap::from_reader(reader, width, height)?;
		trace!("Read FPG register {graph_id} ({width}x{height}, {} bytes)", header.length);

		Ok(Some(Self {
			graph_id,
			description: header.description,
			filename: header.filename,
			control_points,
			bitmap,
		}))
	}
}

impl fmt::Display for Register {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Graph {:03}: {:>5}x{:<5} {} {} ({} control points, {} bytes)",
			self.graph_id,
			self.bitmap.width(),
			self.bitmap.height(),
			pad_fixed(&self.description, DESCRIPTION_LENGTH),
			pad_fixed(&self.filename, FILENAME_LENGTH),
			self.control_points.len(),
			self.length()
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::ErrorKind;
	use crate::file::map::ControlPoint;
	use std::io::Cursor;

	fn sample() -> Register {
		let points = ControlPointList::from_points(&[ControlPoint::new(4, 5)], FileType::Fpg).unwrap();
		let bitmap = Bitmap::from_pixels(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
		Register::new(12, "enemy", "ENEMY_SPRITE.PNG", points, bitmap).unwrap()
	}

	#[test]
	fn test_length_is_derived() {
		let register = sample();
		assert_eq!(register.length(), 64 + 4 + 6);
		assert_eq!(register.filename(), "ENEMY_SPRITE");

		let mut data = Vec::new();
		register.write_to(&mut data).unwrap();
		assert_eq!(data.len(), register.length());
		assert_eq!(&data[4..8], &74i32.to_le_bytes());
	}

	#[test]
	fn test_read_next() {
		let mut data = Vec::new();
		sample().write_to(&mut data).unwrap();

		let mut cursor = Cursor::new(data);
		assert_eq!(Register::read_next(&mut cursor).unwrap(), Some(sample()));
		assert_eq!(Register::read_next(&mut cursor).unwrap(), None);
	}

	#[test]
	fn test_length_mismatch() {
		let mut data = Vec::new();
		sample().write_to(&mut data).unwrap();
		data[4..8].copy_from_slice(&80i32.to_le_bytes());

		let err = Register::read_next(&mut Cursor::new(data)).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Format);
	}

	#[test]
	fn test_truncated_register() {
		let mut data = Vec::new();
		sample().write_to(&mut data).unwrap();
		data.truncate(30);

		assert!(Register::read_next(&mut Cursor::new(data)).is_err());
	}

	#[test]
	fn test_non_ascii_text_survives_reload() {
		let bitmap = Bitmap::new(2, 2);
		let register =
			Register::new(3, "Ñu azul", "ÁRBOL.PNG", ControlPointList::new(), bitmap).unwrap();
		assert_eq!(register.description(), "?u azul");
		assert_eq!(register.filename(), "?RBOL.PNG");

		let mut data = Vec::new();
		register.write_to(&mut data).unwrap();
		let loaded = Register::read_next(&mut Cursor::new(data)).unwrap();
		assert_eq!(loaded, Some(register));
	}

	#[test]
	fn test_invalid_graph_id() {
		let bitmap = Bitmap::new(1, 1);
		let err = Register::new(0, "", "", ControlPointList::new(), bitmap).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Range);
	}
}
