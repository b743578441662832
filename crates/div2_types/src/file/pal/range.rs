//! Colour range table (cyclic ranges used by the engine's palette effects).
//!
//! ```text
//! ColorRange (36 bytes)
//! +0x00  1   num_colors   colours in the range (8, 16 or 32)
//! +0x01  1   kind         0 = direct, 1/2/4 = edited every n colours
//! +0x02  1   fixed        0 = cyclic, 1 = fixed
//! +0x03  1   black        colour index used as black
//! +0x04  32  colors       palette indices of the range
//! ```
//!
//! The table always holds 16 ranges (576 bytes).

use std::io::{Read, Write};

use crate::file::DivFileError;

/// Number of palette indices stored per range
pub const RANGE_COLORS: usize = 32;

/// Size of one serialized range in bytes
pub const RANGE_SIZE: usize = 4 + RANGE_COLORS;

/// Number of ranges in a table
pub const RANGE_COUNT: usize = 16;

/// Size of a serialized table in bytes
pub const TABLE_SIZE: usize = RANGE_SIZE * RANGE_COUNT;

/// A single colour range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorRange {
	/// Number of colours used from `colors`
	pub num_colors: u8,
	/// Range type (0 = direct)
	pub kind: u8,
	/// Whether the range is fixed rather than cyclic
	pub fixed: bool,
	/// Index of the colour used as black
	pub black: u8,
	/// Palette indices of the range
	pub colors: [u8; RANGE_COLORS],
}

impl ColorRange {
	/// Creates the default range starting at palette index `start`.
	pub fn starting_at(start: u8) -> Self {
		let mut colors = [0u8; RANGE_COLORS];
		for (offset, color) in colors.iter_mut().enumerate() {
			*color = start.wrapping_add(offset as u8);
		}
		Self {
			num_colors: 16,
			kind: 0,
			fixed: false,
			black: 0,
			colors,
		}
	}

	/// Parses a range from its 36-byte form.
	pub fn from_bytes(data: &[u8; RANGE_SIZE]) -> Self {
		let mut colors = [0u8; RANGE_COLORS];
		colors.copy_from_slice(&data[4..]);
		Self {
			num_colors: data[0],
			kind: data[1],
			fixed: data[2] != 0,
			black: data[3],
			colors,
		}
	}

	/// Converts the range to its 36-byte form.
	pub fn to_bytes(&self) -> [u8; RANGE_SIZE] {
		let mut bytes = [0u8; RANGE_SIZE];
		bytes[0] = self.num_colors;
		bytes[1] = self.kind;
		bytes[2] = u8::from(self.fixed);
		bytes[3] = self.black;
		bytes[4..].copy_from_slice(&self.colors);
		bytes
	}
}

/// The 16-entry colour range table stored after a palette.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorRangeTable {
	ranges: [ColorRange; RANGE_COUNT],
}

impl ColorRangeTable {
	/// Returns the ranges.
	pub fn ranges(&self) -> &[ColorRange; RANGE_COUNT] {
		&self.ranges
	}

	/// Returns a copy of this table with range `index` replaced.
	///
	/// Returns `None` when `index` is not below [`RANGE_COUNT`].
	pub fn with_range(&self, index: usize, range: ColorRange) -> Option<Self> {
		let mut ranges = self.ranges;
		*ranges.get_mut(index)? = range;
		Some(Self {
			ranges,
		})
	}

	/// Reads a table (576 bytes).
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DivFileError> {
		let mut ranges = [ColorRange::starting_at(0); RANGE_COUNT];
		for range in &mut ranges {
			let mut raw = [0u8; RANGE_SIZE];
			reader.read_exact(&mut raw)?;
			*range = ColorRange::from_bytes(&raw);
		}
		Ok(Self {
			ranges,
		})
	}

	/// Writes the table.
	pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		for range in &self.ranges {
			writer.write_all(&range.to_bytes())?;
		}
		Ok(())
	}
}

impl Default for ColorRangeTable {
	/// Ranges of 16 consecutive colours, range `i` starting at index `16 * i`.
	fn default() -> Self {
		let mut ranges = [ColorRange::starting_at(0); RANGE_COUNT];
		for (i, range) in ranges.iter_mut().enumerate() {
			*range = ColorRange::starting_at((i * 16) as u8);
		}
		Self {
			ranges,
		}
	}
}
