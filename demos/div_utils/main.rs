//! DIV2 asset CLI Utility
//!
//! A command-line tool for inspecting and building DIV Games Studio 2 assets.
//!
//! # Features
//!
//! - **info**: Display information about a PAL, MAP or FPG file
//! - **pcx2map**: Convert an 8-bit PCX image into a MAP file
//! - **png2map**: Convert an indexed PNG image into a MAP file
//! - **build-fpg**: Build an FPG package from images with JSON sidecar metadata
//! - **extract**: Extract one entry of an FPG package as a MAP or PNG file
//!
//! # Sidecar Format
//!
//! Each image passed to `build-fpg` needs a JSON file with the same name:
//! ```json
//! {
//!   "graph_id": 1,
//!   "description": "Player",
//!   "control_points": [{ "x": 16, "y": 31 }]
//! }
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Show file information
//! cargo run --example div_utils -- info GAME.FPG
//!
//! # Convert a PCX image
//! cargo run --example div_utils -- pcx2map SHIP.PCX SHIP.MAP --graph-id 100
//!
//! # Build a package, the palette can also come from DIV_PALETTE
//! cargo run --example div_utils -- build-fpg GAME.FPG sprites/*.png -p DIV.PAL
//!
//! # Extract graph 100 as PNG
//! cargo run --example div_utils -- extract GAME.FPG 100 ship.png
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use div2_rs::prelude::*;
use env_logger::Env;
use log::{info, warn};

#[derive(Parser)]
#[command(name = "div_utils")]
#[command(author = "div2-rs project")]
#[command(version)]
#[command(about = "DIV2 asset utility - inspect PAL/MAP/FPG files and build packages", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Display information about a PAL, MAP or FPG file
	Info {
		/// Input file path
		#[arg(value_name = "INPUT")]
		input: PathBuf,

		/// Dump the raw header bytes
		#[arg(long)]
		header: bool,
	},

	/// Convert an 8-bit PCX image to a MAP file
	Pcx2map {
		/// Input PCX file path
		#[arg(value_name = "INPUT_PCX")]
		input: PathBuf,

		/// Output MAP file path
		#[arg(value_name = "OUTPUT_MAP")]
		output: PathBuf,

		#[command(flatten)]
		meta: MapMeta,
	},

	/// Convert an indexed PNG image to a MAP file
	Png2map {
		/// Input PNG file path
		#[arg(value_name = "INPUT_PNG")]
		input: PathBuf,

		/// Output MAP file path
		#[arg(value_name = "OUTPUT_MAP")]
		output: PathBuf,

		#[command(flatten)]
		meta: MapMeta,
	},

	/// Build an FPG package from images with JSON sidecar files
	BuildFpg {
		/// Output FPG file path
		#[arg(value_name = "OUTPUT_FPG")]
		output: PathBuf,

		/// Input images, each with a `<name>.json` sidecar
		#[arg(value_name = "IMAGES", required = true)]
		inputs: Vec<PathBuf>,

		/// Palette shared by every image in the package
		#[arg(short, long, value_name = "PALETTE", env = "DIV_PALETTE")]
		palette: PathBuf,
	},

	/// Extract an FPG entry as a MAP, or as a PNG when the output ends in `.png`
	Extract {
		/// Input FPG file path
		#[arg(value_name = "INPUT_FPG")]
		input: PathBuf,

		/// Graph id to extract
		#[arg(value_name = "GRAPH_ID")]
		graph_id: i32,

		/// Output file path
		#[arg(value_name = "OUTPUT")]
		output: PathBuf,
	},
}

#[derive(clap::Args)]
struct MapMeta {
	/// Graph id stored in the MAP (1-999)
	#[arg(short, long, default_value_t = 1)]
	graph_id: i32,

	/// Description stored in the MAP (32 characters maximum)
	#[arg(short, long, default_value = "")]
	description: String,

	/// Palette file to use instead of the image palette
	#[arg(short, long, value_name = "PALETTE")]
	palette: Option<PathBuf>,
}

fn main() -> Result<()> {
	// Initialize logger with default level set to info if RUST_LOG is not set
	env_logger::init_from_env(Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	match cli.command {
		Commands::Info {
			input,
			header,
		} => cmd_info(&input, header),
		Commands::Pcx2map {
			input,
			output,
			meta,
		} => cmd_to_map(&input, &output, &meta, MapFile::import_pcx),
		Commands::Png2map {
			input,
			output,
			meta,
		} => cmd_to_map(&input, &output, &meta, MapFile::import_png),
		Commands::BuildFpg {
			output,
			inputs,
			palette,
		} => cmd_build_fpg(&output, &inputs, &palette),
		Commands::Extract {
			input,
			graph_id,
			output,
		} => cmd_extract(&input, graph_id, &output),
	}
}

fn cmd_info(input: &Path, header: bool) -> Result<()> {
	let data = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
	let Some(kind) = FormatKind::detect(&data) else {
		bail!("{} is not a PAL, MAP or FPG file", input.display());
	};

	info!("{}: {} file, {} bytes", input.display(), kind, data.len());
	if header {
		info!("Header: {}", hex::encode(&data[..Header::SIZE]));
	}

	match kind {
		FormatKind::Pal => info!("{}", PalFile::from_bytes(&data)?),
		FormatKind::Map => info!("{}", MapFile::from_bytes(&data)?),
		FormatKind::Fpg => {
			let fpg = FpgFile::from_bytes(&data)?;
			info!("{fpg}");
			for register in fpg.resolve()? {
				info!("  {register}");
			}
		}
	}
	Ok(())
}

fn cmd_to_map(
	input: &Path,
	output: &Path,
	meta: &MapMeta,
	import: fn(&mut MapFile, &[u8]) -> Result<(), DivFileError>,
) -> Result<()> {
	let data = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;

	let mut map = MapFile::new();
	map.set_graph_id(meta.graph_id)?;
	map.set_description(&meta.description);
	if map.description() != meta.description {
		warn!("Description stored as \"{}\"", map.description());
	}
	import(&mut map, &data).with_context(|| format!("cannot import {}", input.display()))?;

	if let Some(palette) = &meta.palette {
		// Re-index against the requested palette before adopting it
		let pal = PalFile::open(palette)?;
		let image = map.to_indexed_image()?;
		map.import_indexed(IndexedImage::new(image.remap(pal.palette()), pal.palette().clone()));
		map.import_palette(pal);
	}

	map.save(output)?;
	info!("Wrote {} ({}x{})", output.display(), map.width(), map.height());
	Ok(())
}

fn cmd_build_fpg(output: &Path, inputs: &[PathBuf], palette: &Path) -> Result<()> {
	let pal = PalFile::open(palette)
		.with_context(|| format!("cannot open palette {}", palette.display()))?;

	let mut fpg = FpgFile::from_pal(pal);
	fpg.add_with_sidecars(inputs)?;
	fpg.save(output)?;
	info!("Wrote {} with {} entries", output.display(), fpg.len());
	Ok(())
}

fn cmd_extract(input: &Path, graph_id: i32, output: &Path) -> Result<()> {
	let fpg = FpgFile::open(input)?;
	let map = fpg.to_map(graph_id)?;

	let is_png = output
		.extension()
		.is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
	if is_png {
		let image = map.to_indexed_image()?;
		let file = fs::File::create(output)?;
		let mut encoder = png::Encoder::new(
			std::io::BufWriter::new(file),
			u32::from(image.width()),
			u32::from(image.height()),
		);
		encoder.set_color(png::ColorType::Indexed);
		encoder.set_depth(png::BitDepth::Eight);
		encoder.set_palette(image.palette().to_rgb8());
		let mut writer = encoder.write_header()?;
		writer.write_image_data(image.pixels())?;
		writer.finish()?;
	} else {
		map.save(output)?;
	}

	info!("Extracted graph {} ({}x{}) to {}", graph_id, map.width(), map.height(), output.display());
	Ok(())
}
