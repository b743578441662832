use div2_rs::file::header::FormatKind;
use div2_rs::file::map::{ControlPoint, File as MapFile};
use div2_rs::file::pal::{ColorRangeTable, File as PalFile, Palette};
use div2_rs::file::{ErrorKind, FileType, pcx};
use log::info;

use crate::{random_image, scratch_dir};

#[test_log::test]
fn map_save_and_open() {
	let dir = scratch_dir("map_save");
	let path = dir.join("TEST.MAP");

	let mut map = MapFile::new();
	map.set_graph_id(321).unwrap();
	map.set_description("integration test map");
	map.control_points_mut().push(ControlPoint::new(10, 20), FileType::Map).unwrap();
	map.control_points_mut().push(ControlPoint::new(-1, 0), FileType::Map).unwrap();
	map.import_indexed(random_image(11, 40, 25));
	map.save(&path).unwrap();

	let data = std::fs::read(&path).unwrap();
	assert_eq!(FormatKind::detect(&data), Some(FormatKind::Map));

	let loaded = MapFile::open(&path).unwrap();
	info!("{loaded}");
	assert_eq!(loaded.graph_id(), 321);
	assert_eq!(loaded.description(), "integration test map");
	assert_eq!(loaded.control_points(), map.control_points());
	assert_eq!(loaded.bitmap(), map.bitmap());
	assert_eq!(loaded.to_indexed_image().unwrap(), map.to_indexed_image().unwrap());

	std::fs::remove_dir_all(dir).unwrap();
}

#[test_log::test]
fn failed_save_leaves_no_file() {
	let dir = scratch_dir("map_failed_save");
	let path = dir.join("EMPTY.MAP");

	let err = MapFile::new().save(&path).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidState);
	assert!(!path.exists());
	assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

	std::fs::remove_dir_all(dir).unwrap();
}

#[test_log::test]
fn pcx_to_map() {
	let image = random_image(12, 31, 9);
	let pcx = pcx::encode(&image).unwrap();

	let mut map = MapFile::new();
	map.import_pcx(&pcx).unwrap();
	let bytes = map.to_bytes().unwrap();

	let loaded = MapFile::from_bytes(&bytes).unwrap();
	assert_eq!(loaded.width(), 31);
	assert_eq!(loaded.height(), 9);
	assert_eq!(loaded.bitmap().unwrap().pixels(), image.pixels());
	assert_eq!(loaded.palette().unwrap().as_ref(), image.palette());
	assert_eq!(loaded.ranges(), Some(&ColorRangeTable::default()));
}

#[test_log::test]
fn palette_file_feeds_map() {
	let dir = scratch_dir("pal_file");
	let pal_path = dir.join("GRAY.PAL");
	PalFile::new(Palette::grayscale()).save(&pal_path).unwrap();
	assert_eq!(std::fs::metadata(&pal_path).unwrap().len(), 1352);

	let mut map = MapFile::new();
	map.import_indexed(random_image(13, 4, 4));
	map.import_palette(PalFile::open(&pal_path).unwrap());
	let loaded = MapFile::from_bytes(&map.to_bytes().unwrap()).unwrap();
	assert_eq!(loaded.palette().unwrap().as_ref(), &Palette::grayscale());

	std::fs::remove_dir_all(dir).unwrap();
}

#[test_log::test]
fn truncated_map_is_rejected() {
	let mut map = MapFile::new();
	map.import_indexed(random_image(14, 8, 8));
	let bytes = map.to_bytes().unwrap();

	assert!(MapFile::from_bytes(&bytes[..bytes.len() - 1]).is_err());
	assert_eq!(MapFile::from_bytes(&bytes[..4]).unwrap_err().kind(), ErrorKind::Format);
}
