//! Common file signature shared by PAL, MAP and FPG files.
//!
//! ```text
//! Offset  Size  Field      Description
//! ------  ----  ---------  ---------------------------------
//! 0x00    3     id         "pal", "map" or "fpg"
//! 0x03    4     magic      1A 0D 0A 00
//! 0x07    1     version    format version (always 0)
//! ```

use std::fmt::Display;
use std::io::{Read, Write};
use std::ops::RangeInclusive;

use crate::file::{DivFileError, FileType};

/// Size of the signature block in bytes
pub const HEADER_SIZE: usize = 8;

/// Bytes following the format id (MS-DOS EOF, CR, LF, NUL)
pub const MAGIC: [u8; 4] = [0x1A, 0x0D, 0x0A, 0x00];

/// Versions accepted by the readers
pub const SUPPORTED_VERSIONS: RangeInclusive<u8> = 0..=0;

/// Format carrying a signature block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
	/// Palette file
	Pal,
	/// Single image file
	Map,
	/// Image package
	Fpg,
}

impl FormatKind {
	/// Returns the 3-byte ASCII id of the format.
	pub const fn id(self) -> [u8; 3] {
		match self {
			FormatKind::Pal => *b"pal",
			FormatKind::Map => *b"map",
			FormatKind::Fpg => *b"fpg",
		}
	}

	/// Returns the matching [`FileType`] for error reporting.
	pub const fn file_type(self) -> FileType {
		match self {
			FormatKind::Pal => FileType::Pal,
			FormatKind::Map => FileType::Map,
			FormatKind::Fpg => FileType::Fpg,
		}
	}

	/// Detects which format a buffer starts with, if any.
	pub fn detect(bytes: &[u8]) -> Option<Self> {
		[FormatKind::Pal, FormatKind::Map, FormatKind::Fpg]
			.into_iter()
			.find(|&kind| Header::validate(bytes, kind))
	}
}

impl Display for FormatKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.file_type())
	}
}

/// Signature block of a DIV2 file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
	kind: FormatKind,
	version: u8,
}

impl Header {
	/// Size of the header in bytes
	pub const SIZE: usize = HEADER_SIZE;

	/// Creates a header for `kind` with the current version.
	pub const fn new(kind: FormatKind) -> Self {
		Self {
			kind,
			version: *SUPPORTED_VERSIONS.end(),
		}
	}

	/// Returns the format of this header.
	pub fn kind(&self) -> FormatKind {
		self.kind
	}

	/// Returns the version byte.
	pub fn version(&self) -> u8 {
		self.version
	}

	/// Checks whether `bytes` starts with a valid signature for `kind`.
	///
	/// Never fails; callers decide how to escalate a `false`.
	pub fn validate(bytes: &[u8], kind: FormatKind) -> bool {
		bytes.len() >= HEADER_SIZE
			&& bytes[0..3] == kind.id()
			&& bytes[3..7] == MAGIC
			&& SUPPORTED_VERSIONS.contains(&bytes[7])
	}

	/// Parses a header for `kind` from the given byte slice.
	pub fn from_bytes(data: &[u8], kind: FormatKind) -> Result<Self, DivFileError> {
		let file_type = kind.file_type();
		if data.len() < HEADER_SIZE {
			return Err(DivFileError::insufficient_data(file_type, HEADER_SIZE, data.len()));
		}

		if data[0..3] != kind.id() || data[3..7] != MAGIC {
			return Err(DivFileError::InvalidSignature {
				file_type,
				actual: data[0..7].to_vec(),
			});
		}

		let version = data[7];
		if !SUPPORTED_VERSIONS.contains(&version) {
			return Err(DivFileError::UnsupportedVersion {
				file_type,
				version,
			});
		}

		Ok(Self {
			kind,
			version,
		})
	}

	/// Reads and checks a header for `kind`.
	pub fn from_reader<R: Read>(reader: &mut R, kind: FormatKind) -> Result<Self, DivFileError> {
		let mut buffer = [0u8; HEADER_SIZE];
		reader.read_exact(&mut buffer)?;
		Self::from_bytes(&buffer, kind)
	}

	/// Converts the header to bytes.
	pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
		let mut bytes = [0u8; HEADER_SIZE];
		bytes[0..3].copy_from_slice(&self.kind.id());
		bytes[3..7].copy_from_slice(&MAGIC);
		bytes[7] = self.version;
		bytes
	}

	/// Writes the header.
	pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError> {
		writer.write_all(&self.to_bytes())?;
		Ok(())
	}
}

impl Display for Header {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} header (version {})", self.kind, self.version)
	}
}
