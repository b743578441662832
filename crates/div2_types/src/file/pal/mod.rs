//! `.PAL` palette support.
//!
//! DIV2 palettes hold 256 colours in VGA-native 6-bit channels (0-63). The
//! same colour block appears in three contexts:
//!
//! | Context          | Layout                                        |
//! |------------------|-----------------------------------------------|
//! | `.PAL` file      | header (8) + colours (768) + ranges (576)     |
//! | `.MAP` / `.FPG`  | colours (768) + ranges (576), no own header   |
//! | PCX / PNG import | colours only, converted from 8-bit channels   |
//!
//! Which one applies is chosen by the caller through [`PaletteMode`], never
//! inferred from the data.
//!
//! # Examples
//!
//! ```no_run
//! use div2_types::file::pal::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pal = File::open("DIV.PAL")?;
//! let black = pal.palette()[0];
//! println!("colour 0 = {black}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use crate::file::header::{FormatKind, Header};
use crate::file::{DivFileError, FileType, write_atomic};

pub mod range;

pub use range::{ColorRange, ColorRangeTable};

/// Palette constants.
pub mod constants {
	/// Number of colours in a palette
	pub const COLOR_COUNT: usize = 256;

	/// Size of the colour block in bytes
	pub const COLOR_TABLE_SIZE: usize = COLOR_COUNT * 3;

	/// Largest channel value (6-bit)
	pub const MAX_CHANNEL: u8 = 63;

	/// Size of a complete `.PAL` file
	pub const FILE_SIZE: usize =
		crate::file::header::HEADER_SIZE + COLOR_TABLE_SIZE + super::range::TABLE_SIZE;
}

/// RGB colour with 6-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
	r: u8,
	g: u8,
	b: u8,
}

impl Color {
	/// Creates a colour, clamping every channel to `[0, 63]`.
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		const fn clamp(v: u8) -> u8 {
			if v > constants::MAX_CHANNEL { constants::MAX_CHANNEL } else { v }
		}
		Self {
			r: clamp(r),
			g: clamp(g),
			b: clamp(b),
		}
	}

	/// Creates a colour from 8-bit channels by dropping the two low bits.
	pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
		Self::new(r >> 2, g >> 2, b >> 2)
	}

	/// Red channel (0-63)
	pub const fn r(&self) -> u8 {
		self.r
	}

	/// Green channel (0-63)
	pub const fn g(&self) -> u8 {
		self.g
	}

	/// Blue channel (0-63)
	pub const fn b(&self) -> u8 {
		self.b
	}

	/// Expands the colour to 8-bit channels.
	///
	/// `from_rgb8(to_rgb8(c)) == c` for every colour.
	pub const fn to_rgb8(&self) -> [u8; 3] {
		const fn expand(v: u8) -> u8 {
			(v << 2) | (v >> 4)
		}
		[expand(self.r), expand(self.g), expand(self.b)]
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
	}
}

/// 256-colour palette.
///
/// A palette is a plain value: it is never edited in place once built, a
/// different palette is a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette {
	colors: [Color; constants::COLOR_COUNT],
}

impl Palette {
	/// Total palette size
	pub const PALETTE_SIZE: usize = constants::COLOR_COUNT;

	/// Creates a palette where every colour is black.
	pub fn black() -> Self {
		Self {
			colors: [Color::default(); constants::COLOR_COUNT],
		}
	}

	/// Creates a 64-step grey ramp repeated over the 256 entries.
	pub fn grayscale() -> Self {
		let mut colors = [Color::default(); constants::COLOR_COUNT];
		for (i, color) in colors.iter_mut().enumerate() {
			let v = (i >> 2) as u8;
			*color = Color::new(v, v, v);
		}
		Self {
			colors,
		}
	}

	/// Builds a palette from exactly 256 colours.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::OutOfRange`] if `colors` does not hold 256 entries.
	pub fn from_colors(colors: &[Color]) -> Result<Self, DivFileError> {
		let colors: [Color; constants::COLOR_COUNT] =
			colors.try_into().map_err(|_| DivFileError::OutOfRange {
				file_type: FileType::Pal,
				what: "palette length",
				value: colors.len(),
				limit: constants::COLOR_COUNT,
			})?;
		Ok(Self {
			colors,
		})
	}

	/// Builds a palette from raw 6-bit `R, G, B` triplets (768 bytes).
	pub fn from_bytes(data: &[u8]) -> Result<Self, DivFileError> {
		let mut reader = Cursor::new(data);
		Self::from_reader(&mut reader)
	}

	/// Reads the 768-byte colour block. Channels above 63 are clamped.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DivFileError> {
		let mut raw = [0u8; constants::COLOR_TABLE_SIZE];
		reader.read_exact(&mut raw)?;

		let mut colors = [Color::default(); constants::COLOR_COUNT];
		for (color, rgb) in colors.iter_mut().zip(raw.chunks_exact(3)) {
			*color = Color::new(rgb[0], rgb[1], rgb[2]);
		}
		Ok(Self {
			colors,
		})
	}

	/// Builds a palette from 8-bit `R, G, B` triplets, as found in PCX and PNG files.
	///
	/// Fewer than 256 triplets are allowed; the missing entries are black.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::Malformed`] if the length is not a multiple of 3
	/// or holds more than 256 colours.
	pub fn from_rgb8(data: &[u8], file_type: FileType) -> Result<Self, DivFileError> {
		if data.len() % 3 != 0 || data.len() > constants::COLOR_TABLE_SIZE {
			return Err(DivFileError::malformed(
				file_type,
				format!("palette of {} bytes is not a list of up to 256 RGB triplets", data.len()),
			));
		}

		let mut colors = [Color::default(); constants::COLOR_COUNT];
		for (color, rgb) in colors.iter_mut().zip(data.chunks_exact(3)) {
			*color = Color::from_rgb8(rgb[0], rgb[1], rgb[2]);
		}
		Ok(Self {
			colors,
		})
	}

	/// Gets a color by index.
	#[inline]
	pub fn get(&self, index: u8) -> Color {
		self.colors[index as usize]
	}

	/// Returns a reference to the color array.
	#[inline]
	pub fn colors(&self) -> &[Color; constants::COLOR_COUNT] {
		&self.colors
	}

	/// Returns an iterator over palette colors.
	pub fn iter(&self) -> impl Iterator<Item = &Color> {
		self.colors.iter()
	}

	/// Converts the palette to its raw 768-byte form.
	pub fn to_bytes(&self) -> Vec<u8> {
		self.colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
	}

	/// Converts the palette to 8-bit `R, G, B` triplets.
	pub fn to_rgb8(&self) -> Vec<u8> {
		self.colors.iter().flat_map(Color::to_rgb8).collect()
	}

	/// Writes the 768-byte colour block.
	pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		writer.write_all(&self.to_bytes())?;
		Ok(())
	}

	/// Returns the index of the colour closest to an 8-bit RGB value.
	///
	/// Distance is squared euclidean on the expanded 8-bit channels; ties
	/// resolve to the lowest index.
	pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
		let mut best = 0usize;
		let mut best_distance = u32::MAX;
		for (index, color) in self.colors.iter().enumerate() {
			let expanded = color.to_rgb8();
			let distance: u32 = expanded
				.iter()
				.zip(rgb.iter())
				.map(|(&a, &b)| {
					let d = a.abs_diff(b) as u32;
					d * d
				})
				.sum();
			if distance < best_distance {
				best = index;
				best_distance = distance;
				if distance == 0 {
					break;
				}
			}
		}
		best as u8
	}
}

impl Default for Palette {
	fn default() -> Self {
		Self::black()
	}
}

impl fmt::Display for Palette {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let distinct: std::collections::HashSet<_> = self.colors.iter().collect();
		write!(f, "Palette: {} colors ({} distinct)", self.colors.len(), distinct.len())
	}
}

impl std::ops::Index<u8> for Palette {
	type Output = Color;

	fn index(&self, index: u8) -> &Self::Output {
		&self.colors[index as usize]
	}
}

/// Where a palette block is read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteMode {
	/// Standalone `.PAL` file: header, colours and ranges
	File,
	/// Palette block inside a MAP or FPG: colours and ranges, no header
	Block,
	/// Bare colour block without ranges
	ColorsOnly,
}

/// Decodes a palette according to `mode`.
///
/// The range table is returned for [`PaletteMode::File`] and
/// [`PaletteMode::Block`], and is `None` for [`PaletteMode::ColorsOnly`].
pub fn decode<R: Read>(
	reader: &mut R,
	mode: PaletteMode,
) -> Result<(Palette, Option<ColorRangeTable>), DivFileError> {
	if mode == PaletteMode::File {
		Header::from_reader(reader, FormatKind::Pal)?;
	}

	let palette = Palette::from_reader(reader)?;
	let ranges = match mode {
		PaletteMode::ColorsOnly => None,
		PaletteMode::File | PaletteMode::Block => Some(ColorRangeTable::from_reader(reader)?),
	};
	Ok((palette, ranges))
}

/// Encodes a palette according to `mode`.
///
/// When the mode carries ranges and `ranges` is `None`, the default table is written.
pub fn encode<W: Write>(
	writer: &mut W,
	palette: &Palette,
	ranges: Option<&ColorRangeTable>,
	mode: PaletteMode,
) -> Result<(), DivFileError> {
	if mode == PaletteMode::File {
		Header::new(FormatKind::Pal).write_to(writer)?;
	}

	palette.write_to(writer)?;
	match (mode, ranges) {
		(PaletteMode::ColorsOnly, _) => {}
		(_, Some(ranges)) => ranges.write_to(writer)?,
		(_, None) => ColorRangeTable::default().write_to(writer)?,
	}
	Ok(())
}

/// Standalone `.PAL` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct File {
	palette: Palette,
	ranges: ColorRangeTable,
}

impl File {
	/// Creates a `.PAL` file from a palette and the default range table.
	pub fn new(palette: Palette) -> Self {
		Self {
			palette,
			ranges: ColorRangeTable::default(),
		}
	}

	/// Creates a `.PAL` file from a palette and a range table.
	pub fn with_ranges(palette: Palette, ranges: ColorRangeTable) -> Self {
		Self {
			palette,
			ranges,
		}
	}

	/// Opens a `.PAL` file from the specified path.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, DivFileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Validates if the buffer starts with a `.PAL` header.
	pub fn validate(data: &[u8]) -> bool {
		Header::validate(data, FormatKind::Pal)
	}

	/// Loads a `.PAL` file from a byte slice.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DivFileError> {
		if data.len() < constants::FILE_SIZE {
			return Err(DivFileError::insufficient_data(
				FileType::Pal,
				constants::FILE_SIZE,
				data.len(),
			));
		}
		Self::from_reader(&mut Cursor::new(data))
	}

	/// Loads a `.PAL` file from any reader.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DivFileError> {
		let (palette, ranges) = decode(reader, PaletteMode::File)?;
		Ok(Self {
			palette,
			ranges: ranges.unwrap_or_default(),
		})
	}

	/// Returns the palette.
	pub fn palette(&self) -> &Palette {
		&self.palette
	}

	/// Returns the range table.
	pub fn ranges(&self) -> &ColorRangeTable {
		&self.ranges
	}

	/// Splits the file into its palette and range table.
	pub fn into_parts(self) -> (Palette, ColorRangeTable) {
		(self.palette, self.ranges)
	}

	/// Writes the file to any writer.
	pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		encode(writer, &self.palette, Some(&self.ranges), PaletteMode::File)
	}

	/// Serializes the file to bytes.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut data = Vec::with_capacity(constants::FILE_SIZE);
		// Writing into a Vec cannot fail
		let _ = self.to_writer(&mut data);
		data
	}

	/// Saves the file, replacing `path` only once the whole file is written.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DivFileError> {
		write_atomic(path, |writer| self.to_writer(writer))
	}
}

impl fmt::Display for File {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "PAL File: {}", self.palette)
	}
}
