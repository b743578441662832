use div2_rs::file::fpg::{File as FpgFile, ImportDefinition, ImportMetadata, ImportSource};
use div2_rs::file::map::{Bitmap, ControlPoint};
use div2_rs::file::pal::{File as PalFile, Palette};
use div2_rs::file::{ErrorKind, pcx};
use log::info;

use crate::{encode_png, random_image, scratch_dir};

/// Palette whose first colours are black, red, green and blue.
fn primary_palette() -> Palette {
	Palette::from_rgb8(&[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255], div2_rs::file::FileType::Pal)
		.unwrap()
}

#[test_log::test]
fn fpg_from_mixed_sources() {
	let dir = scratch_dir("fpg_mixed");
	let path = dir.join("MIXED.FPG");

	// RGB image using exact palette colours
	let rgb = encode_png(3, 1, png::ColorType::Rgb, None, &[255, 0, 0, 0, 255, 0, 0, 0, 255]);
	// Indexed image with its own palette order: blue, red
	let indexed = encode_png(2, 1, png::ColorType::Indexed, Some(vec![0, 0, 255, 255, 0, 0]), &[0, 1]);

	let mut fpg = FpgFile::new(primary_palette());
	fpg.add_buffer(rgb, 1, "rgb", &[ControlPoint::new(1, 0)]).unwrap();
	fpg.add_buffer(indexed, 2, "indexed", &[]).unwrap();
	fpg.add_bitmap(Bitmap::from_pixels(1, 2, vec![3, 2]).unwrap(), 3, "raw", &[]).unwrap();
	fpg.save(&path).unwrap();

	let loaded = FpgFile::open(&path).unwrap();
	info!("{loaded}");
	assert_eq!(loaded.len(), 3);
	let registers = loaded.resolve().unwrap();
	assert_eq!(registers[0].bitmap().pixels(), &[1, 2, 3]);
	assert_eq!(registers[0].control_points().len(), 1);
	// Index 0 of the source stays transparent
	assert_eq!(registers[1].bitmap().pixels(), &[0, 1]);
	assert_eq!(registers[2].bitmap().pixels(), &[3, 2]);
	assert_eq!(loaded.find_by_graph_id(2).unwrap().description(), "indexed");

	std::fs::remove_dir_all(dir).unwrap();
}

#[test_log::test]
fn fpg_roundtrip_keeps_order_and_content() {
	let mut fpg = FpgFile::from_pal(PalFile::new(Palette::grayscale()));
	for (seed, id) in [(1, 500), (2, 3), (3, 999), (4, 1)] {
		let image = random_image(seed, 16 + seed as u16, 8);
		fpg.add_buffer(pcx::encode(&image).unwrap(), id, &format!("entry {id}"), &[]).unwrap();
	}

	let bytes = fpg.to_bytes().unwrap();
	let loaded = FpgFile::from_bytes(&bytes).unwrap();
	let original = fpg.resolve().unwrap();
	let reread = loaded.resolve().unwrap();
	assert_eq!(reread, original);
	assert_eq!(loaded.to_bytes().unwrap(), bytes);
}

#[test_log::test]
fn duplicate_graph_id_keeps_existing_entry() {
	let mut fpg = FpgFile::new(Palette::grayscale());
	fpg.add_bitmap(Bitmap::new(2, 2), 42, "original", &[]).unwrap();

	let err = fpg
		.add_entry(ImportDefinition::new(42, ImportSource::Bitmap(Bitmap::new(1, 1))))
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Range);
	assert_eq!(fpg.len(), 1);
	assert_eq!(fpg.find_by_graph_id(42).unwrap().description(), "original");
}

#[test_log::test]
fn unreadable_entry_aborts_write() {
	let dir = scratch_dir("fpg_unreadable");
	let path = dir.join("BROKEN.FPG");

	let mut fpg = FpgFile::new(Palette::grayscale());
	fpg.add_bitmap(Bitmap::new(1, 1), 1, "", &[]).unwrap();
	fpg.add_path(dir.join("missing.png"), 2, "", &[]).unwrap();

	let err = fpg.save(&path).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Io);
	assert!(!path.exists());

	std::fs::remove_dir_all(dir).unwrap();
}

#[test_log::test]
fn sidecar_import() {
	let dir = scratch_dir("fpg_sidecar");
	let palette = primary_palette();

	for (name, id, pixels) in [("b.png", 20, [0u8, 0, 255]), ("a.png", 10, [255, 0, 0])] {
		let image = dir.join(name);
		std::fs::write(&image, encode_png(1, 1, png::ColorType::Rgb, None, &pixels)).unwrap();
		let metadata = ImportMetadata {
			graph_id: id,
			description: name.to_uppercase(),
			control_points: vec![ControlPoint::new(0, 0)],
			width: Some(1),
			height: Some(1),
		};
		std::fs::write(image.with_extension("json"), serde_json::to_string_pretty(&metadata).unwrap())
			.unwrap();
	}

	let mut fpg = FpgFile::new(palette);
	let added = fpg.add_with_sidecars([dir.join("b.png"), dir.join("a.png")]).unwrap();
	assert_eq!(added, 2);
	assert_eq!(fpg.entries()[0].graph_id(), 20);
	assert_eq!(fpg.entries()[1].filename(), "a.png");

	let registers = fpg.resolve().unwrap();
	assert_eq!(registers[0].bitmap().pixels(), &[3]);
	assert_eq!(registers[1].bitmap().pixels(), &[1]);

	let map = fpg.to_map(10).unwrap();
	assert_eq!(map.description(), "A.PNG");

	std::fs::write(dir.join("c.png"), b"not used").unwrap();
	let err = fpg.add_with_sidecars([dir.join("c.png")]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
	assert_eq!(fpg.len(), 2);

	std::fs::remove_dir_all(dir).unwrap();
}
