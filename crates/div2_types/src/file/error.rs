//! Error types for file format parsing and manipulation.

use std::fmt;

use thiserror::Error;

/// File format an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
	/// Standalone palette file (`.PAL`)
	Pal,
	/// Single image file (`.MAP`)
	Map,
	/// Image package file (`.FPG`)
	Fpg,
	/// PCX import source
	Pcx,
	/// PNG import source
	Png,
}

impl fmt::Display for FileType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			FileType::Pal => "PAL",
			FileType::Map => "MAP",
			FileType::Fpg => "FPG",
			FileType::Pcx => "PCX",
			FileType::Png => "PNG",
		};
		f.write_str(name)
	}
}

/// Broad classification of a [`DivFileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Malformed or unsupported input data
	Format,
	/// Argument outside its allowed range, or a capacity/uniqueness violation
	Range,
	/// Lookup without a match
	NotFound,
	/// Operation not possible in the current state of the object
	InvalidState,
	/// Underlying stream or file access failure
	Io,
}

/// Unified error type for every DIV2 file format in this crate.
#[derive(Debug, Error)]
pub enum DivFileError {
	/// Not enough data to parse
	#[error("{file_type}: insufficient data: expected {expected} bytes, got {actual} bytes")]
	InsufficientData {
		/// Format being parsed
		file_type: FileType,
		/// Expected number of bytes
		expected: usize,
		/// Actual number of bytes
		actual: usize,
	},

	/// Format signature did not match
	#[error("{file_type}: invalid signature: {actual:02X?}")]
	InvalidSignature {
		/// Format being parsed
		file_type: FileType,
		/// Signature bytes found in the data
		actual: Vec<u8>,
	},

	/// Version byte outside the supported range
	#[error("{file_type}: unsupported version {version}")]
	UnsupportedVersion {
		/// Format being parsed
		file_type: FileType,
		/// Version found in the data
		version: u8,
	},

	/// Source image is not a 256 colour indexed image
	#[error("{file_type}: {reason}")]
	NotIndexed {
		/// Format being parsed
		file_type: FileType,
		/// What was wrong with the image
		reason: String,
	},

	/// Structurally invalid data
	#[error("{file_type}: malformed data: {reason}")]
	Malformed {
		/// Format being parsed
		file_type: FileType,
		/// Description of the problem
		reason: String,
	},

	/// Graph id outside `[1, 999]`
	#[error("{file_type}: graph id {graph_id} out of range [1, 999]")]
	GraphIdOutOfRange {
		/// Format being built
		file_type: FileType,
		/// Rejected graph id
		graph_id: i32,
	},

	/// Graph id already used in the package
	#[error("{file_type}: graph id {graph_id} already in use (entry index {index})")]
	DuplicateGraphId {
		/// Format being built
		file_type: FileType,
		/// Rejected graph id
		graph_id: i32,
		/// Index of the entry already owning the id
		index: usize,
	},

	/// Value outside its allowed range
	#[error("{file_type}: {what} {value} out of range (limit {limit})")]
	OutOfRange {
		/// Format being built
		file_type: FileType,
		/// Name of the checked quantity
		what: &'static str,
		/// Rejected value
		value: usize,
		/// Allowed limit
		limit: usize,
	},

	/// Pixel buffer length does not match the dimensions
	#[error("{file_type}: bitmap of {width}x{height} needs {expected} pixels, got {actual}")]
	BitmapSizeMismatch {
		/// Format being built
		file_type: FileType,
		/// Bitmap width
		width: u16,
		/// Bitmap height
		height: u16,
		/// Expected pixel count
		expected: usize,
		/// Supplied pixel count
		actual: usize,
	},

	/// No entry with the given graph id
	#[error("{file_type}: graph id {graph_id} not found")]
	GraphIdNotFound {
		/// Format being searched
		file_type: FileType,
		/// Requested graph id
		graph_id: i32,
	},

	/// Index outside the collection
	#[error("{file_type}: index {index} out of range (total: {total})")]
	IndexOutOfRange {
		/// Format being searched
		file_type: FileType,
		/// Requested index
		index: usize,
		/// Collection length
		total: usize,
	},

	/// Companion metadata file missing for an import
	#[error("{file_type}: metadata file {path} not found")]
	MetadataNotFound {
		/// Format being built
		file_type: FileType,
		/// Expected metadata path
		path: String,
	},

	/// Required part of the object is not set
	#[error("{file_type}: cannot write, {missing} is not set")]
	MissingComponent {
		/// Format being written
		file_type: FileType,
		/// Name of the missing part
		missing: &'static str,
	},

	/// Package without entries
	#[error("{file_type}: package does not contain any entry")]
	EmptyPackage {
		/// Format being written
		file_type: FileType,
	},

	/// IO error
	#[error(transparent)]
	IOError(#[from] std::io::Error),

	/// PNG decoder error
	#[error(transparent)]
	PngDecoding(#[from] png::DecodingError),

	/// PNG encoder error
	#[error(transparent)]
	PngEncoding(#[from] png::EncodingError),

	/// Image library error
	#[error(transparent)]
	Image(#[from] image::ImageError),

	/// Sidecar metadata error
	#[error(transparent)]
	Metadata(#[from] serde_json::Error),
}

impl DivFileError {
	/// Shorthand for [`DivFileError::InsufficientData`].
	pub fn insufficient_data(file_type: FileType, expected: usize, actual: usize) -> Self {
		Self::InsufficientData {
			file_type,
			expected,
			actual,
		}
	}

	/// Shorthand for [`DivFileError::Malformed`].
	pub fn malformed(file_type: FileType, reason: impl Into<String>) -> Self {
		Self::Malformed {
			file_type,
			reason: reason.into(),
		}
	}

	/// Returns the broad classification of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::InsufficientData { .. }
			| Self::InvalidSignature { .. }
			| Self::UnsupportedVersion { .. }
			| Self::NotIndexed { .. }
			| Self::Malformed { .. }
			| Self::PngDecoding(_)
			| Self::Metadata(_) => ErrorKind::Format,
			Self::Image(err) => match err {
				image::ImageError::IoError(_) => ErrorKind::Io,
				_ => ErrorKind::Format,
			},
			Self::PngEncoding(err) => match err {
				png::EncodingError::IoError(_) => ErrorKind::Io,
				_ => ErrorKind::Format,
			},
			Self::GraphIdOutOfRange { .. }
			| Self::DuplicateGraphId { .. }
			| Self::OutOfRange { .. }
			| Self::BitmapSizeMismatch { .. } => ErrorKind::Range,
			Self::GraphIdNotFound { .. }
			| Self::IndexOutOfRange { .. }
			| Self::MetadataNotFound { .. } => ErrorKind::NotFound,
			Self::MissingComponent { .. }
			| Self::EmptyPackage { .. } => ErrorKind::InvalidState,
			Self::IOError(_) => ErrorKind::Io,
		}
	}
}
