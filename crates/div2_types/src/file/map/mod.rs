//! `.MAP` file format support.
//!
//! A MAP file is a single 256 colour image with its own palette, an optional
//! list of control points and a short description.
//!
//! # File Structure
//!
//! ```text
//! Offset  Size       Field          Description
//! ------  ---------  -------------  ------------------------------------
//! 0x00    8          header         "map" + 1A 0D 0A 00 + version
//! 0x08    2          width          u16 LE
//! 0x0A    2          height         u16 LE
//! 0x0C    4          graph_id       u32 LE, 1-999
//! 0x10    32         description    ASCII, NUL padded
//! 0x30    768        palette        256 × RGB, 6-bit channels
//! 0x330   576        ranges         16 colour ranges
//! 0x570   2          point_count    u16 LE
//! 0x572   4 × n      points         (x, y) as i16 LE
//! ...     w × h      pixels         palette indices, row-major
//! ```
//!
//! When a MAP is stored inside an FPG package only the control points and the
//! pixels are kept, with an `i32` point count; see
//! [`File::from_embedded_reader`].
//!
//! # Examples
//!
//! ```no_run
//! use div2_types::file::map::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pcx = std::fs::read("SHIP.PCX")?;
//!
//! let mut map = File::new();
//! map.set_graph_id(100)?;
//! map.set_description("Player ship");
//! map.import_pcx(&pcx)?;
//! map.save("SHIP.MAP")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::file::header::{FormatKind, HEADER_SIZE, Header};
use crate::file::indexed::IndexedImage;
use crate::file::pal::{self, ColorRangeTable, Palette, PaletteMode};
use crate::file::primitive::{
	read_null_terminated, read_u16_le, read_u32_le, to_ascii_field, to_fixed_ascii,
};
use crate::file::record::Record;
use crate::file::{DivFileError, FileType, pcx, png, write_atomic};

pub mod bitmap;
pub mod control_point;

pub use bitmap::Bitmap;
pub use control_point::{
	CONTROL_POINT_SIZE, ControlPoint, ControlPointList, CountWidth, MAX_CONTROL_POINTS,
};

/// MAP file constants.
pub mod constants {
	/// Size of the info block including the file header
	pub const INFO_SIZE: usize = 48;

	/// Length of the description field
	pub const DESCRIPTION_LENGTH: usize = 32;

	/// Smallest valid graph id
	pub const GRAPH_ID_MIN: i32 = 1;

	/// Largest valid graph id
	pub const GRAPH_ID_MAX: i32 = 999;
}

/// Checks that `graph_id` lies in `[1, 999]`.
pub(crate) fn check_graph_id(graph_id: i32, file_type: FileType) -> Result<(), DivFileError> {
	if (constants::GRAPH_ID_MIN..=constants::GRAPH_ID_MAX).contains(&graph_id) {
		Ok(())
	} else {
		Err(DivFileError::GraphIdOutOfRange {
			file_type,
			graph_id,
		})
	}
}

/// Fixed info block at the start of a MAP file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInfo {
	/// File header
	pub header: Header,
	/// Image width
	pub width: u16,
	/// Image height
	pub height: u16,
	/// Graph id, stored unsigned on disk
	pub graph_id: u32,
	/// Description, at most 32 characters
	pub description: String,
}

impl Record for MapInfo {
	const SIZE: usize = constants::INFO_SIZE;

	fn read_from<R: Read>(reader: &mut R) -> Result<Self, DivFileError> {
		let header = Header::from_reader(reader, FormatKind::Map)?;
		let width = read_u16_le(reader)?;
		let height = read_u16_le(reader)?;
		let graph_id = read_u32_le(reader)?;
		let mut description = [0u8; constants::DESCRIPTION_LENGTH];
		reader.read_exact(&mut description)?;

		Ok(Self {
			header,
			width,
			height,
			graph_id,
			description: read_null_terminated(&description),
		})
	}

	fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		self.header.write_to(writer)?;
		writer.write_all(&self.width.to_le_bytes())?;
		writer.write_all(&self.height.to_le_bytes())?;
		writer.write_all(&self.graph_id.to_le_bytes())?;
		writer.write_all(&to_fixed_ascii(&self.description, constants::DESCRIPTION_LENGTH))?;
		Ok(())
	}
}

/// MAP file structure.
///
/// The palette is optional in memory: a MAP read out of an FPG package has no
/// palette of its own until one is attached with
/// [`set_shared_palette`](Self::set_shared_palette), and cannot be written as
/// a standalone file before that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
	graph_id: i32,
	description: String,
	palette: Option<Arc<Palette>>,
	ranges: Option<ColorRangeTable>,
	control_points: ControlPointList,
	bitmap: Option<Bitmap>,
}

impl Default for File {
	fn default() -> Self {
		Self::new()
	}
}

impl File {
	/// Creates an empty MAP with graph id 1, no palette and no pixels.
	pub fn new() -> Self {
		Self {
			graph_id: constants::GRAPH_ID_MIN,
			description: String::new(),
			palette: None,
			ranges: None,
			control_points: ControlPointList::new(),
			bitmap: None,
		}
	}

	/// Opens a MAP file from the specified path.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, DivFileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Validates if the buffer starts with a MAP header.
	pub fn validate(data: &[u8]) -> bool {
		Header::validate(data, FormatKind::Map)
	}

	/// Loads a MAP file from a byte slice.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DivFileError> {
		if data.len() < HEADER_SIZE {
			return Err(DivFileError::insufficient_data(FileType::Map, HEADER_SIZE, data.len()));
		}
		Self::from_reader(&mut Cursor::new(data))
	}

	/// Loads a standalone MAP file from any reader.
	///
	/// # Errors
	///
	/// - Format errors if the header is not a MAP header or the control point
	///   count is invalid
	/// - [`DivFileError::IOError`] if the stream ends early
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DivFileError> {
		let info = MapInfo::read_from(reader)?;
		let (palette, ranges) = pal::decode(reader, PaletteMode::Block)?;
		let control_points = ControlPointList::from_reader(reader, CountWidth::Word, FileType::Map)?;
		let bitmap = Bitmap::from_reader(reader, info.width, info.height)?;

		debug!(
			"Loaded MAP {}x{} (graph {}, {} control points)",
			info.width,
			info.height,
			info.graph_id,
			control_points.len()
		);

		Ok(Self {
			graph_id: info.graph_id as i32,
			description: info.description,
			palette: Some(Arc::new(palette)),
			ranges,
			control_points,
			bitmap: Some(bitmap),
		})
	}

	/// Loads the body of a MAP stored inside a package.
	///
	/// Reads an `i32` control point count, the points and `width × height`
	/// pixels. The result has no palette, and graph id and description keep
	/// their defaults; the caller fills them from the package register.
	pub fn from_embedded_reader<R: Read>(
		reader: &mut R,
		width: u16,
		height: u16,
	) -> Result<Self, DivFileError> {
		let control_points =
			ControlPointList::from_reader(reader, CountWidth::DoubleWord, FileType::Fpg)?;
		let bitmap = Bitmap::from_reader(reader, width, height)?;

		Ok(Self {
			control_points,
			bitmap: Some(bitmap),
			..Self::new()
		})
	}

	/// Returns the graph id.
	pub fn graph_id(&self) -> i32 {
		self.graph_id
	}

	/// Sets the graph id.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::GraphIdOutOfRange`] unless `graph_id` is in
	/// `[1, 999]`; the current id is kept.
	pub fn set_graph_id(&mut self, graph_id: i32) -> Result<(), DivFileError> {
		check_graph_id(graph_id, FileType::Map)?;
		self.graph_id = graph_id;
		Ok(())
	}

	/// Returns the description.
	pub fn description(&self) -> &str {
		&self.description
	}

	/// Sets the description.
	///
	/// The value is stored as it will be written: ASCII only, non-ASCII
	/// characters replaced with `?`, at most 32 characters.
	pub fn set_description(&mut self, description: &str) {
		self.description = to_ascii_field(description, constants::DESCRIPTION_LENGTH);
	}

	/// Returns the palette, if any.
	pub fn palette(&self) -> Option<&Arc<Palette>> {
		self.palette.as_ref()
	}

	/// Returns the colour range table, if any.
	///
	/// `None` means the default table is written.
	pub fn ranges(&self) -> Option<&ColorRangeTable> {
		self.ranges.as_ref()
	}

	/// Returns the control points.
	pub fn control_points(&self) -> &ControlPointList {
		&self.control_points
	}

	/// Returns the control points for editing.
	pub fn control_points_mut(&mut self) -> &mut ControlPointList {
		&mut self.control_points
	}

	/// Returns the bitmap, if any.
	pub fn bitmap(&self) -> Option<&Bitmap> {
		self.bitmap.as_ref()
	}

	/// Image width, 0 when no bitmap is set.
	pub fn width(&self) -> u16 {
		self.bitmap.as_ref().map_or(0, Bitmap::width)
	}

	/// Image height, 0 when no bitmap is set.
	pub fn height(&self) -> u16 {
		self.bitmap.as_ref().map_or(0, Bitmap::height)
	}

	/// Replaces pixels and palette with a decoded image.
	///
	/// The colour range table is reset to the default one.
	pub fn import_indexed(&mut self, image: IndexedImage) {
		let (bitmap, palette) = image.into_parts();
		debug!("Imported {} into MAP {}", bitmap, self.graph_id);
		self.bitmap = Some(bitmap);
		self.palette = Some(Arc::new(palette));
		self.ranges = None;
	}

	/// Imports an 8-bit PCX image.
	pub fn import_pcx(&mut self, buffer: &[u8]) -> Result<(), DivFileError> {
		let image = pcx::decode(buffer)?;
		self.import_indexed(image);
		Ok(())
	}

	/// Imports an indexed PNG image.
	pub fn import_png(&mut self, buffer: &[u8]) -> Result<(), DivFileError> {
		let image = png::decode_indexed(buffer)?;
		self.import_indexed(image);
		Ok(())
	}

	/// Adopts the palette and colour ranges of a `.PAL` file.
	///
	/// Pixels are kept as they are, they are not remapped.
	pub fn import_palette(&mut self, pal: pal::File) {
		let (palette, ranges) = pal.into_parts();
		self.palette = Some(Arc::new(palette));
		self.ranges = Some(ranges);
	}

	/// Attaches a palette owned by someone else, usually an FPG package.
	pub fn set_shared_palette(&mut self, palette: Arc<Palette>) {
		self.palette = Some(palette);
	}

	/// Returns the image as pixels plus palette.
	pub fn to_indexed_image(&self) -> Result<IndexedImage, DivFileError> {
		let (palette, bitmap) = self.parts()?;
		Ok(IndexedImage::new(bitmap.clone(), palette.as_ref().clone()))
	}

	fn parts(&self) -> Result<(&Arc<Palette>, &Bitmap), DivFileError> {
		let palette = self.palette.as_ref().ok_or(DivFileError::MissingComponent {
			file_type: FileType::Map,
			missing: "palette",
		})?;
		let bitmap = self.bitmap.as_ref().ok_or(DivFileError::MissingComponent {
			file_type: FileType::Map,
			missing: "bitmap",
		})?;
		Ok((palette, bitmap))
	}

	/// Writes the MAP as a standalone file.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::MissingComponent`] if no palette or no bitmap is
	/// set; nothing is written in that case.
	pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		let (palette, bitmap) = self.parts()?;

		let info = MapInfo {
			header: Header::new(FormatKind::Map),
			width: bitmap.width(),
			height: bitmap.height(),
			graph_id: self.graph_id as u32,
			description: self.description.clone(),
		};
		info.write_to(writer)?;
		pal::encode(writer, palette, self.ranges.as_ref(), PaletteMode::Block)?;
		self.control_points.write_to(writer, CountWidth::Word)?;
		bitmap.write_to(writer)
	}

	/// Serializes the MAP to bytes.
	pub fn to_bytes(&self) -> Result<Vec<u8>, DivFileError> {
		let mut data = Vec::new();
		self.to_writer(&mut data)?;
		Ok(data)
	}

	/// Saves the MAP, replacing `path` only once the whole file is written.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DivFileError> {
		self.parts()?;
		write_atomic(path, |writer| self.to_writer(writer))
	}
}

impl fmt::Display for File {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "MAP File:")?;
		writeln!(f, "  Width: {}", self.width())?;
		writeln!(f, "  Height: {}", self.height())?;
		writeln!(f, "  Graph Id: {}", self.graph_id)?;
		writeln!(f, "  Description: {}", self.description)?;
		match &self.palette {
			Some(palette) => writeln!(f, "  {palette}")?,
			None => writeln!(f, "  No palette")?,
		}
		write!(f, "  {}", self.control_points)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::ErrorKind;
	use rand::rngs::SmallRng;
	use rand::{Rng, SeedableRng};

	fn random_map(rng: &mut SmallRng) -> File {
		let width = rng.random_range(1..64u16);
		let height = rng.random_range(1..64u16);
		let pixels = (0..width as usize * height as usize).map(|_| rng.random()).collect();

		let mut map = File::new();
		map.set_graph_id(rng.random_range(1..=999)).unwrap();
		map.set_description("random test image");
		for _ in 0..rng.random_range(0..20) {
			map.control_points_mut()
				.push(ControlPoint::new(rng.random(), rng.random()), FileType::Map)
				.unwrap();
		}
		map.import_indexed(IndexedImage::new(
			Bitmap::from_pixels(width, height, pixels).unwrap(),
			Palette::grayscale(),
		));
		map
	}

	#[test]
	fn test_graph_id_bounds() {
		let mut map = File::new();
		assert_eq!(map.set_graph_id(0).unwrap_err().kind(), ErrorKind::Range);
		assert_eq!(map.set_graph_id(1000).unwrap_err().kind(), ErrorKind::Range);
		assert_eq!(map.graph_id(), 1);

		map.set_graph_id(1).unwrap();
		map.set_graph_id(999).unwrap();
		assert_eq!(map.graph_id(), 999);
	}

	#[test]
	fn test_description_truncated() {
		let mut map = File::new();
		map.set_description(&"x".repeat(40));
		assert_eq!(map.description().len(), 32);
	}

	#[test]
	fn test_non_ascii_description_roundtrip() {
		let mut map = File::new();
		map.set_description("Nave ñandú");
		assert_eq!(map.description(), "Nave ?and?");
		map.import_indexed(IndexedImage::new(Bitmap::new(2, 2), Palette::grayscale()));

		let loaded = File::from_bytes(&map.to_bytes().unwrap()).unwrap();
		assert_eq!(loaded.description(), map.description());
	}

	#[test]
	fn test_roundtrip() {
		let mut rng = SmallRng::seed_from_u64(0x0D1F_0002);
		for _ in 0..8 {
			let map = random_map(&mut rng);
			let bytes = map.to_bytes().unwrap();
			assert!(File::validate(&bytes));

			let loaded = File::from_bytes(&bytes).unwrap();
			assert_eq!(loaded.graph_id(), map.graph_id());
			assert_eq!(loaded.description(), map.description());
			assert_eq!(loaded.control_points(), map.control_points());
			assert_eq!(loaded.bitmap(), map.bitmap());
			assert_eq!(loaded.palette(), map.palette());
		}
	}

	#[test]
	fn test_layout() {
		let mut map = File::new();
		map.set_graph_id(7).unwrap();
		map.control_points_mut().push(ControlPoint::new(1, 2), FileType::Map).unwrap();
		map.import_indexed(IndexedImage::new(
			Bitmap::from_pixels(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap(),
			Palette::grayscale(),
		));

		let bytes = map.to_bytes().unwrap();
		assert_eq!(&bytes[0..3], b"map");
		assert_eq!(&bytes[8..12], &[3, 0, 2, 0]);
		assert_eq!(&bytes[12..16], &[7, 0, 0, 0]);
		let points = constants::INFO_SIZE + 768 + 576;
		assert_eq!(&bytes[points..points + 2], &[1, 0]);
		assert_eq!(bytes.len(), points + 2 + 4 + 6);
		assert_eq!(&bytes[bytes.len() - 6..], &[1, 2, 3, 4, 5, 6]);
	}

	#[test]
	fn test_write_requires_palette_and_bitmap() {
		let map = File::new();
		assert_eq!(map.to_bytes().unwrap_err().kind(), ErrorKind::InvalidState);

		let mut body = Vec::new();
		body.extend_from_slice(&0i32.to_le_bytes());
		body.extend_from_slice(&[9, 9, 9, 9]);
		let mut embedded = File::from_embedded_reader(&mut Cursor::new(body), 2, 2).unwrap();
		assert!(embedded.palette().is_none());
		assert_eq!(embedded.to_bytes().unwrap_err().kind(), ErrorKind::InvalidState);

		embedded.set_shared_palette(Arc::new(Palette::grayscale()));
		assert!(embedded.to_bytes().is_ok());
	}

	#[test]
	fn test_rejects_other_headers() {
		let mut rng = SmallRng::seed_from_u64(1);
		let mut bytes = random_map(&mut rng).to_bytes().unwrap();
		bytes[0..3].copy_from_slice(b"fpg");
		assert!(!File::validate(&bytes));
		assert_eq!(File::from_bytes(&bytes).unwrap_err().kind(), ErrorKind::Format);
	}

	#[test]
	fn test_import_palette_keeps_pixels() {
		let mut rng = SmallRng::seed_from_u64(2);
		let mut map = random_map(&mut rng);
		let pixels = map.bitmap().cloned();

		map.import_palette(pal::File::new(Palette::black()));
		assert_eq!(map.bitmap().cloned(), pixels);
		assert_eq!(map.palette().map(|p| p.as_ref()), Some(&Palette::black()));
		assert_eq!(map.ranges(), Some(&ColorRangeTable::default()));
	}
}
