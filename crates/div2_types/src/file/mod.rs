//! File type support for `div2-rs` project.

use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

mod error;

pub mod fpg;
pub mod header;
pub mod indexed;
pub mod map;
pub mod pal;
pub mod pcx;
pub mod png;
pub mod primitive;
pub mod record;

// Re-export unified error type
pub use error::{DivFileError, ErrorKind, FileType};

// Re-export main file types
pub use fpg::{File as FpgFile, ImportDefinition, ImportMetadata, ImportSource, Register};
pub use header::{FormatKind, Header};
pub use indexed::IndexedImage;
pub use map::{Bitmap, ControlPoint, ControlPointList, File as MapFile};
pub use pal::{Color, ColorRange, ColorRangeTable, File as PalFile, Palette, PaletteMode};
pub use record::Record;

/// Writes a file through a sibling temporary file renamed over `path` on success.
///
/// The temporary file is removed if `write` or any filesystem step fails, and
/// `path` is left untouched.
pub(crate) fn write_atomic<P, F>(path: P, write: F) -> Result<(), DivFileError>
where
	P: AsRef<Path>,
	F: FnOnce(&mut BufWriter<fs::File>) -> Result<(), DivFileError>,
{
	let path = path.as_ref();
	let file_name = path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
	let mut temp_name = OsString::from(".");
	temp_name.push(file_name);
	temp_name.push(".tmp");
	let temp_path = path.with_file_name(temp_name);

	let result = write_temp(&temp_path, write).and_then(|()| Ok(fs::rename(&temp_path, path)?));
	if result.is_err() {
		// Best effort, the original error is what matters
		let _ = fs::remove_file(&temp_path);
	}
	result
}

fn write_temp<F>(temp_path: &Path, write: F) -> Result<(), DivFileError>
where
	F: FnOnce(&mut BufWriter<fs::File>) -> Result<(), DivFileError>,
{
	let mut writer = BufWriter::new(fs::File::create(temp_path)?);
	write(&mut writer)?;
	writer.flush()?;
	writer.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()?;
	Ok(())
}
