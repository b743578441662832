//! `.FPG` package support.
//!
//! An FPG package holds up to 999 images sharing one palette, each identified
//! by its graph id.
//!
//! # File Structure
//!
//! The `"fpg"` header, palette and range table are laid out as in a PAL
//! file. Registers follow at offset `0x548` until the end of the file:
//!
//! ```text
//! Size   Field         Description
//! -----  ------------  ------------------------------------------
//! 4      graph_id      i32 LE, 1-999
//! 4      length        i32 LE, 64 + 4 × points + width × height
//! 32     description   ASCII, NUL padded
//! 12     filename      ASCII, NUL padded
//! 4      width         i32 LE
//! 4      height        i32 LE
//! 4      point_count   i32 LE
//! 4 × n  points        (x, y) as i16 LE
//! w × h  pixels        palette indices, row-major
//! ```
//!
//! Entries are kept as [`ImportDefinition`]s and only decoded when the
//! package is written, so adding a PNG file to a package is cheap until
//! [`File::save`] is called.
//!
//! # Examples
//!
//! ```no_run
//! use div2_types::file::{fpg, pal};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut package = fpg::File::from_pal(pal::File::open("DIV.PAL")?);
//! package.add_path("hero.png", 1, "Hero", &[])?;
//! package.add_path("enemy.png", 2, "Enemy", &[])?;
//! package.save("GAME.FPG")?;
//!
//! let ship = package.to_map(1)?;
//! ship.save("HERO.MAP")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::file::header::{FormatKind, HEADER_SIZE, Header};
use crate::file::map::{self, Bitmap, ControlPoint, ControlPointList, check_graph_id};
use crate::file::pal::{self, ColorRangeTable, Palette, PaletteMode};
use crate::file::{DivFileError, FileType, write_atomic};

pub mod definition;
pub mod register;

pub use definition::{ImportDefinition, ImportMetadata, ImportSource};
pub use register::{Register, RegisterHeader};

/// FPG file constants.
pub mod constants {
	/// Size of the fixed register header, control point count included
	pub const REGISTER_HEADER_SIZE: usize = 64;

	/// Length of the register description field
	pub const DESCRIPTION_LENGTH: usize = 32;

	/// Length of the register filename field
	pub const FILENAME_LENGTH: usize = 12;
}

/// FPG package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
	palette: Arc<Palette>,
	ranges: ColorRangeTable,
	entries: Vec<ImportDefinition>,
}

impl File {
	/// Creates an empty package using `palette` and the default range table.
	pub fn new(palette: Palette) -> Self {
		Self::with_ranges(palette, ColorRangeTable::default())
	}

	/// Creates an empty package with an explicit range table.
	pub fn with_ranges(palette: Palette, ranges: ColorRangeTable) -> Self {
		Self {
			palette: Arc::new(palette),
			ranges,
			entries: Vec::new(),
		}
	}

	/// Creates an empty package using the palette and ranges of a `.PAL` file.
	pub fn from_pal(pal: pal::File) -> Self {
		let (palette, ranges) = pal.into_parts();
		Self::with_ranges(palette, ranges)
	}

	/// Opens an FPG file from the specified path.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, DivFileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Validates if the buffer starts with an FPG header.
	pub fn validate(data: &[u8]) -> bool {
		Header::validate(data, FormatKind::Fpg)
	}

	/// Loads an FPG file from a byte slice.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DivFileError> {
		if data.len() < HEADER_SIZE {
			return Err(DivFileError::insufficient_data(FileType::Fpg, HEADER_SIZE, data.len()));
		}
		Self::from_reader(&mut Cursor::new(data))
	}

	/// Loads an FPG file from any reader.
	///
	/// Registers are read until the stream ends; each one becomes an entry
	/// with an [`ImportSource::Bitmap`] source.
	///
	/// # Errors
	///
	/// - Format errors for a bad header, an invalid register or a graph id
	///   used twice
	/// - [`DivFileError::IOError`] if the stream ends inside a register
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DivFileError> {
		Header::from_reader(reader, FormatKind::Fpg)?;
		let (palette, ranges) = pal::decode(reader, PaletteMode::Block)?;
		let mut file = Self::with_ranges(palette, ranges.unwrap_or_default());

		while let Some(register) = Register::read_next(reader)? {
			if let Some(index) = file.position(register.graph_id()) {
				return Err(DivFileError::malformed(
					FileType::Fpg,
					format!("graph id {} stored twice (first at entry {index})", register.graph_id()),
				));
			}
			file.entries.push(register.into());
		}

		debug!("Loaded FPG with {} entries", file.entries.len());
		Ok(file)
	}

	/// Returns the shared palette.
	pub fn palette(&self) -> &Arc<Palette> {
		&self.palette
	}

	/// Returns the colour range table.
	pub fn ranges(&self) -> &ColorRangeTable {
		&self.ranges
	}

	/// Returns the entries in insertion order.
	pub fn entries(&self) -> &[ImportDefinition] {
		&self.entries
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if the package has no entry.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns an iterator over the entries.
	pub fn iter(&self) -> std::slice::Iter<'_, ImportDefinition> {
		self.entries.iter()
	}

	fn position(&self, graph_id: i32) -> Option<usize> {
		self.entries.iter().position(|entry| entry.graph_id() == graph_id)
	}

	/// Adds an entry.
	///
	/// # Errors
	///
	/// - [`DivFileError::GraphIdOutOfRange`] unless the graph id is in `[1, 999]`
	/// - [`DivFileError::DuplicateGraphId`] if an entry already uses the graph
	///   id; that entry is left unchanged
	pub fn add_entry(&mut self, definition: ImportDefinition) -> Result<(), DivFileError> {
		let graph_id = definition.graph_id();
		check_graph_id(graph_id, FileType::Fpg)?;
		if let Some(index) = self.position(graph_id) {
			return Err(DivFileError::DuplicateGraphId {
				file_type: FileType::Fpg,
				graph_id,
				index,
			});
		}

		debug!("Adding FPG entry {definition}");
		self.entries.push(definition);
		Ok(())
	}

	fn add_source(
		&mut self,
		source: ImportSource,
		graph_id: i32,
		description: &str,
		control_points: &[ControlPoint],
	) -> Result<(), DivFileError> {
		let definition = ImportDefinition::new(graph_id, source)
			.with_description(description)
			.with_control_points(ControlPointList::from_points(control_points, FileType::Fpg)?);
		self.add_entry(definition)
	}

	/// Adds encoded image bytes (PNG, PCX, ...) as an entry.
	pub fn add_buffer(
		&mut self,
		buffer: Vec<u8>,
		graph_id: i32,
		description: &str,
		control_points: &[ControlPoint],
	) -> Result<(), DivFileError> {
		self.add_source(ImportSource::Buffer(buffer), graph_id, description, control_points)
	}

	/// Adds an image file as an entry. The file is read when the package is written.
	pub fn add_path(
		&mut self,
		path: impl Into<PathBuf>,
		graph_id: i32,
		description: &str,
		control_points: &[ControlPoint],
	) -> Result<(), DivFileError> {
		self.add_source(ImportSource::File(path.into()), graph_id, description, control_points)
	}

	/// Adds pixels already indexed against the package palette.
	pub fn add_bitmap(
		&mut self,
		bitmap: Bitmap,
		graph_id: i32,
		description: &str,
		control_points: &[ControlPoint],
	) -> Result<(), DivFileError> {
		self.add_source(ImportSource::Bitmap(bitmap), graph_id, description, control_points)
	}

	/// Adds image files described by their sidecar `.json` metadata, in order.
	///
	/// Stops at the first failure; entries added before it are kept.
	/// Returns the number of entries added.
	pub fn add_with_sidecars<I, P>(&mut self, paths: I) -> Result<usize, DivFileError>
	where
		I: IntoIterator<Item = P>,
		P: AsRef<Path>,
	{
		let mut added = 0;
		for path in paths {
			self.add_entry(ImportDefinition::from_sidecar(path)?)?;
			added += 1;
		}
		info!("Added {added} entries from sidecar metadata");
		Ok(added)
	}

	/// Removes and returns the entry at `index`.
	pub fn remove_entry(&mut self, index: usize) -> Result<ImportDefinition, DivFileError> {
		if index >= self.entries.len() {
			return Err(DivFileError::IndexOutOfRange {
				file_type: FileType::Fpg,
				index,
				total: self.entries.len(),
			});
		}
		Ok(self.entries.remove(index))
	}

	/// Removes and returns the entry with `graph_id`.
	pub fn remove_by_graph_id(&mut self, graph_id: i32) -> Result<ImportDefinition, DivFileError> {
		let index = self.position(graph_id).ok_or(DivFileError::GraphIdNotFound {
			file_type: FileType::Fpg,
			graph_id,
		})?;
		Ok(self.entries.remove(index))
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Returns the first entry with `graph_id`.
	pub fn find_by_graph_id(&self, graph_id: i32) -> Result<&ImportDefinition, DivFileError> {
		self.entries.iter().find(|entry| entry.graph_id() == graph_id).ok_or(
			DivFileError::GraphIdNotFound {
				file_type: FileType::Fpg,
				graph_id,
			},
		)
	}

	/// Decodes every entry against the package palette, in insertion order.
	pub fn resolve(&self) -> Result<Vec<Register>, DivFileError> {
		self.entries.iter().map(|entry| entry.resolve(&self.palette)).collect()
	}

	/// Extracts an entry as a standalone MAP sharing the package palette.
	pub fn to_map(&self, graph_id: i32) -> Result<map::File, DivFileError> {
		let register = self.find_by_graph_id(graph_id)?.resolve(&self.palette)?;

		let mut body = Vec::with_capacity(register.length());
		register.write_body(&mut body)?;
		let bitmap = register.bitmap();
		let mut map =
			map::File::from_embedded_reader(&mut Cursor::new(body), bitmap.width(), bitmap.height())?;
		map.set_graph_id(register.graph_id())?;
		map.set_description(register.description());
		map.set_shared_palette(Arc::clone(&self.palette));
		Ok(map)
	}

	/// Writes the package.
	///
	/// Every entry is resolved before the first byte is written.
	///
	/// # Errors
	///
	/// Returns [`DivFileError::EmptyPackage`] if there is no entry, or the
	/// first error raised while resolving an entry.
	pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		if self.entries.is_empty() {
			return Err(DivFileError::EmptyPackage {
				file_type: FileType::Fpg,
			});
		}

		let registers = self.resolve()?;
		Header::new(FormatKind::Fpg).write_to(writer)?;
		pal::encode(writer, &self.palette, Some(&self.ranges), PaletteMode::Block)?;
		for register in &registers {
			register.write_to(writer)?;
		}
		debug!("Wrote FPG with {} registers", registers.len());
		Ok(())
	}

	/// Serializes the package to bytes.
	pub fn to_bytes(&self) -> Result<Vec<u8>, DivFileError> {
		let mut data = Vec::new();
		self.to_writer(&mut data)?;
		Ok(data)
	}

	/// Saves the package, replacing `path` only once the whole file is written.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DivFileError> {
		if self.entries.is_empty() {
			return Err(DivFileError::EmptyPackage {
				file_type: FileType::Fpg,
			});
		}
		write_atomic(path, |writer| self.to_writer(writer))
	}
}

impl fmt::Display for File {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "FPG File: {} entries", self.entries.len())?;
		writeln!(f, "  {}", self.palette)?;
		for entry in &self.entries {
			writeln!(f, "  {entry}")?;
		}
		Ok(())
	}
}

impl<'a> IntoIterator for &'a File {
	type Item = &'a ImportDefinition;
	type IntoIter = std::slice::Iter<'a, ImportDefinition>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
