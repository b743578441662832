//! Control points attached to an image.
//!
//! Each point is stored as two little-endian `i16` values. The list is
//! prefixed by its length, a `u16` in MAP files and an `i32` in FPG
//! registers (see [`CountWidth`]).

use std::fmt::Display;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::file::primitive::{read_i16_le, read_i32_le, read_u16_le};
use crate::file::{DivFileError, FileType};

/// Maximum number of control points per image
pub const MAX_CONTROL_POINTS: usize = 1000;

/// Size of one serialized control point in bytes
pub const CONTROL_POINT_SIZE: usize = 4;

/// A 2D anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ControlPoint {
	/// X coordinate
	pub x: i16,
	/// Y coordinate
	pub y: i16,
}

impl ControlPoint {
	/// Creates a new control point.
	pub const fn new(x: i16, y: i16) -> Self {
		Self {
			x,
			y,
		}
	}
}

impl Display for ControlPoint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{:04}.{:04}]", self.x, self.y)
	}
}

/// Width of the length prefix of a serialized list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountWidth {
	/// `u16` count (MAP files)
	Word,
	/// `i32` count (FPG registers)
	DoubleWord,
}

impl CountWidth {
	/// Size of the count field in bytes.
	pub const fn size(self) -> usize {
		match self {
			CountWidth::Word => 2,
			CountWidth::DoubleWord => 4,
		}
	}
}

/// Ordered list of at most [`MAX_CONTROL_POINTS`] control points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ControlPointList {
	points: Vec<ControlPoint>,
}

impl ControlPointList {
	/// Creates an empty list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a list from existing points.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::OutOfRange`] when more than
	/// [`MAX_CONTROL_POINTS`] points are given.
	pub fn from_points(points: &[ControlPoint], file_type: FileType) -> Result<Self, DivFileError> {
		let mut list = Self::new();
		for &point in points {
			list.push(point, file_type)?;
		}
		Ok(list)
	}

	/// Appends a point.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::OutOfRange`] when the list is full.
	pub fn push(&mut self, point: ControlPoint, file_type: FileType) -> Result<(), DivFileError> {
		if self.points.len() >= MAX_CONTROL_POINTS {
			return Err(DivFileError::OutOfRange {
				file_type,
				what: "control point count",
				value: self.points.len() + 1,
				limit: MAX_CONTROL_POINTS,
			});
		}
		self.points.push(point);
		Ok(())
	}

	/// Removes and returns the point at `index`.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::IndexOutOfRange`] when `index` is past the end.
	pub fn remove(&mut self, index: usize, file_type: FileType) -> Result<ControlPoint, DivFileError> {
		if index >= self.points.len() {
			return Err(DivFileError::IndexOutOfRange {
				file_type,
				index,
				total: self.points.len(),
			});
		}
		Ok(self.points.remove(index))
	}

	/// Removes every point.
	pub fn clear(&mut self) {
		self.points.clear();
	}

	/// Returns the point at `index`.
	#[inline]
	pub fn get(&self, index: usize) -> Option<&ControlPoint> {
		self.points.get(index)
	}

	/// Number of points.
	#[inline]
	pub fn len(&self) -> usize {
		self.points.len()
	}

	/// Returns `true` if the list holds no point.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	/// Returns the points as a slice.
	#[inline]
	pub fn as_slice(&self) -> &[ControlPoint] {
		&self.points
	}

	/// Returns an iterator over the points.
	pub fn iter(&self) -> std::slice::Iter<'_, ControlPoint> {
		self.points.iter()
	}

	/// Serialized size with a `width` count prefix.
	pub fn encoded_len(&self, width: CountWidth) -> usize {
		width.size() + self.points.len() * CONTROL_POINT_SIZE
	}

	/// Reads a count-prefixed list.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::Malformed`] when the stored count is negative or
	/// above [`MAX_CONTROL_POINTS`].
	pub fn from_reader<R: Read>(
		reader: &mut R,
		width: CountWidth,
		file_type: FileType,
	) -> Result<Self, DivFileError> {
		let count = match width {
			CountWidth::Word => i64::from(read_u16_le(reader)?),
			CountWidth::DoubleWord => i64::from(read_i32_le(reader)?),
		};
		if !(0..=MAX_CONTROL_POINTS as i64).contains(&count) {
			return Err(DivFileError::malformed(
				file_type,
				format!("control point count {count} outside [0, {MAX_CONTROL_POINTS}]"),
			));
		}

		let mut points = Vec::with_capacity(count as usize);
		for _ in 0..count {
			let x = read_i16_le(reader)?;
			let y = read_i16_le(reader)?;
			points.push(ControlPoint::new(x, y));
		}
		Ok(Self {
			points,
		})
	}

	/// Writes the list with a `width` count prefix.
	pub fn write_to<W: Write>(&self, writer: &mut W, width: CountWidth) -> Result<(), DivFileError> {
		// len() never exceeds MAX_CONTROL_POINTS, both casts are lossless
		match width {
			CountWidth::Word => writer.write_all(&(self.points.len() as u16).to_le_bytes())?,
			CountWidth::DoubleWord => writer.write_all(&(self.points.len() as i32).to_le_bytes())?,
		}
		for point in &self.points {
			writer.write_all(&point.x.to_le_bytes())?;
			writer.write_all(&point.y.to_le_bytes())?;
		}
		Ok(())
	}
}

impl Display for ControlPointList {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.points.is_empty() {
			return write!(f, "No control points");
		}
		writeln!(f, "Control points:")?;
		for (i, point) in self.points.iter().enumerate() {
			write!(f, "{i:03}:{point} ")?;
			if (i + 1) % 6 == 0 {
				writeln!(f)?;
			}
		}
		Ok(())
	}
}

impl<'a> IntoIterator for &'a ControlPointList {
	type Item = &'a ControlPoint;
	type IntoIter = std::slice::Iter<'a, ControlPoint>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
