//! Fixed-size binary records.

use std::io::{Read, Write};

use crate::file::DivFileError;

/// A record with a fixed on-disk size.
///
/// The MAP info block and the FPG register header are both records; the
/// variable-length data that follows them (control points, pixels) is read by
/// the owning codec.
pub trait Record: Sized {
	/// Serialized size in bytes
	const SIZE: usize;

	/// Reads exactly [`Self::SIZE`] bytes and decodes the record.
	fn read_from<R: Read>(reader: &mut R) -> Result<Self, DivFileError>;

	/// Writes exactly [`Self::SIZE`] bytes.
	fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), DivFileError>;
}
