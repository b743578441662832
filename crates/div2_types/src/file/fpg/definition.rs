//! Pending package entries and their sidecar metadata.

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::file::map::{Bitmap, ControlPoint, ControlPointList};
use crate::file::pal::Palette;
use crate::file::primitive::to_ascii_field;
use crate::file::{DivFileError, FileType, png};

use super::constants::{DESCRIPTION_LENGTH, FILENAME_LENGTH};

use super::register::Register;

/// Where the pixels of an entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
	/// Encoded image bytes (PNG, PCX or anything the `image` crate reads)
	Buffer(Vec<u8>),
	/// Path to an encoded image, read when the package is written
	File(PathBuf),
	/// Pixels already indexed against the package palette
	Bitmap(Bitmap),
}

impl fmt::Display for ImportSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ImportSource::Buffer(buffer) => write!(f, "buffer ({} bytes)", buffer.len()),
			ImportSource::File(path) => write!(f, "file {}", path.display()),
			ImportSource::Bitmap(bitmap) => write!(f, "{bitmap}"),
		}
	}
}

/// Metadata stored next to an image as `<name>.json`.
///
/// ```json
/// {
///   "graph_id": 10,
///   "description": "Player idle",
///   "control_points": [{ "x": 16, "y": 31 }],
///   "width": 32,
///   "height": 32
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMetadata {
	/// Graph id of the entry
	#[serde(alias = "GraphId")]
	pub graph_id: i32,
	/// Optional description
	#[serde(default, alias = "Description")]
	pub description: String,
	/// Optional control points
	#[serde(default, alias = "ControlPoints")]
	pub control_points: Vec<ControlPoint>,
	/// Expected image width
	#[serde(default, alias = "Width", skip_serializing_if = "Option::is_none")]
	pub width: Option<u16>,
	/// Expected image height
	#[serde(default, alias = "Height", skip_serializing_if = "Option::is_none")]
	pub height: Option<u16>,
}

/// An entry waiting to be added to a package.
///
/// The source is only decoded when the package is written, see
/// [`ImportDefinition::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDefinition {
	graph_id: i32,
	description: String,
	filename: String,
	control_points: ControlPointList,
	expected_size: Option<(u16, u16)>,
	source: ImportSource,
}

impl ImportDefinition {
	/// Creates a definition without description or control points.
	///
	/// The graph id is checked when the definition is added to a package.
	/// File sources record their base name as the register file name.
	pub fn new(graph_id: i32, source: ImportSource) -> Self {
		let filename = match &source {
			ImportSource::File(path) => path
				.file_name()
				.map(|name| to_ascii_field(&name.to_string_lossy(), FILENAME_LENGTH))
				.unwrap_or_default(),
			ImportSource::Buffer(_) | ImportSource::Bitmap(_) => String::new(),
		};

		Self {
			graph_id,
			description: String::new(),
			filename,
			control_points: ControlPointList::new(),
			expected_size: None,
			source,
		}
	}

	/// Sets the description, normalized to at most 32 ASCII characters.
	pub fn with_description(mut self, description: &str) -> Self {
		self.description = to_ascii_field(description, DESCRIPTION_LENGTH);
		self
	}

	/// Sets the register file name, normalized to at most 12 ASCII characters.
	pub fn with_filename(mut self, filename: &str) -> Self {
		self.filename = to_ascii_field(filename, FILENAME_LENGTH);
		self
	}

	/// Sets the control points.
	pub fn with_control_points(mut self, control_points: ControlPointList) -> Self {
		self.control_points = control_points;
		self
	}

	/// Requires the resolved image to have the given size.
	pub fn with_expected_size(mut self, width: u16, height: u16) -> Self {
		self.expected_size = Some((width, height));
		self
	}

	/// Builds a definition for `image_path` from its sidecar `<stem>.json`.
	///
	/// # Errors
	///
	/// - [`DivFileError::MetadataNotFound`] if the sidecar file does not exist
	/// - [`DivFileError::Metadata`] if it is not valid metadata
	/// - [`DivFileError::OutOfRange`] if it lists more than 1000 control points
	pub fn from_sidecar(image_path: impl AsRef<Path>) -> Result<Self, DivFileError> {
		let image_path = image_path.as_ref();
		let sidecar = image_path.with_extension("json");
		if !sidecar.is_file() {
			return Err(DivFileError::MetadataNotFound {
				file_type: FileType::Fpg,
				path: sidecar.display().to_string(),
			});
		}

		let metadata: ImportMetadata = serde_json::from_str(&std::fs::read_to_string(&sidecar)?)?;
		debug!("Loaded metadata for {} from {}", image_path.display(), sidecar.display());
		Self::from_metadata(ImportSource::File(image_path.to_path_buf()), metadata)
	}

	/// Builds a definition from parsed metadata.
	pub fn from_metadata(source: ImportSource, metadata: ImportMetadata) -> Result<Self, DivFileError> {
		let mut definition = Self::new(metadata.graph_id, source)
			.with_description(&metadata.description)
			.with_control_points(ControlPointList::from_points(&metadata.control_points, FileType::Fpg)?);
		if let (Some(width), Some(height)) = (metadata.width, metadata.height) {
			definition = definition.with_expected_size(width, height);
		}
		Ok(definition)
	}

	/// Graph id.
	pub fn graph_id(&self) -> i32 {
		self.graph_id
	}

	/// Description.
	pub fn description(&self) -> &str {
		&self.description
	}

	/// Register file name.
	pub fn filename(&self) -> &str {
		&self.filename
	}

	/// Control points.
	pub fn control_points(&self) -> &ControlPointList {
		&self.control_points
	}

	/// Pixel source.
	pub fn source(&self) -> &ImportSource {
		&self.source
	}

	/// Decodes the source against `palette` and builds the register.
	pub fn resolve(&self, palette: &Palette) -> Result<Register, DivFileError> {
		let bitmap = match &self.source {
			ImportSource::Buffer(buffer) => png::remap_to_palette(buffer, palette)?,
			ImportSource::File(path) => png::remap_to_palette(&std::fs::read(path)?, palette)?,
			ImportSource::Bitmap(bitmap) => bitmap.clone(),
		};

		if let Some((width, height)) = self.expected_size
			&& (bitmap.width(), bitmap.height()) != (width, height)
		{
			return Err(DivFileError::malformed(
				FileType::Fpg,
				format!(
					"graph {} is {}x{}, metadata declares {width}x{height}",
					self.graph_id,
					bitmap.width(),
					bitmap.height()
				),
			));
		}

		Register::new(
			self.graph_id,
			&self.description,
			&self.filename,
			self.control_points.clone(),
			bitmap,
		)
	}
}

impl From<Register> for ImportDefinition {
	fn from(register: Register) -> Self {
		let graph_id = register.graph_id();
		let description = register.description().to_string();
		let filename = register.filename().to_string();
		let (control_points, bitmap) = register.into_parts();

		Self::new(graph_id, ImportSource::Bitmap(bitmap))
			.with_description(&description)
			.with_filename(&filename)
			.with_control_points(control_points)
	}
}

impl fmt::Display for ImportDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Graph {:03} \"{}\" from {} ({} control points)",
			self.graph_id,
			self.description,
			self.source,
			self.control_points.len()
		)
	}
}
