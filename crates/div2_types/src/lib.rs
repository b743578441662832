//! This crate provides core data types and file format support for the `div2-rs` project.
//!
//! # File Formats
//!
//! - **PAL**: 256 colour palette with 6-bit channels and 16 colour ranges
//! - **MAP**: Single indexed image with description and control points
//! - **FPG**: Package of up to 999 indexed images sharing one palette
//! - **PCX**: 8-bit RLE images, imported into MAP and FPG files
//! - **PNG**: Indexed PNG palette extraction and true colour remapping
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```no_run
//! use div2_types::prelude::*;
//!
//! # fn main() -> Result<(), DivFileError> {
//! let pal = PalFile::open("DIV.PAL")?;
//! let mut package = FpgFile::from_pal(pal);
//! package.add_path("ship.png", 1, "Ship", &[ControlPoint::new(16, 16)])?;
//! package.save("SHIPS.FPG")?;
//! # Ok(())
//! # }
//! ```
//!
//! Or use explicit paths:
//!
//! ```no_run
//! use div2_types::file::map;
//!
//! # fn main() -> Result<(), div2_types::file::DivFileError> {
//! let map = map::File::open("SHIP.MAP")?;
//! println!("{map}");
//! # Ok(())
//! # }
//! ```

pub mod file;

/// `use div2_types::prelude::*;` to import commonly used items.
pub mod prelude;
