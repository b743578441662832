//! Prelude module for `div2_types`.
//!
//! This module provides a convenient way to import commonly used types, traits, and constants.
//!
//! # Examples
//!
//! ```no_run
//! use div2_types::prelude::*;
//!
//! // Now you can use all common types directly
//! let palette = Palette::grayscale();
//! let package = FpgFile::new(palette);
//! ```

// File module types
#[doc(inline)]
pub use crate::file::{
	// Images
	Bitmap,

	// Palette types
	Color,
	ColorRange,
	ColorRangeTable,
	ControlPoint,
	ControlPointList,
	DivFileError,
	ErrorKind,
	FileType,

	// Headers
	FormatKind,

	// FPG types
	FpgFile,
	Header,
	ImportDefinition,
	ImportMetadata,
	ImportSource,
	IndexedImage,

	// MAP types
	MapFile,
	PalFile,
	Palette,
	PaletteMode,
	Record,
	Register,
};

// Re-export the file module for advanced usage
#[doc(inline)]
pub use crate::file;
