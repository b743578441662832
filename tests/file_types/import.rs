use div2_rs::file::pal::Palette;
use div2_rs::file::{ErrorKind, map::File as MapFile, pcx, png as div_png};

use crate::{encode_png, random_image};

#[test_log::test]
fn png_palette_extraction() {
	let rgb: Vec<u8> = (0..=255u8).flat_map(|i| [i, 255 - i, i / 2]).collect();
	let data = encode_png(4, 1, png::ColorType::Indexed, Some(rgb.clone()), &[0, 64, 128, 255]);

	assert_eq!(div_png::extract_palette_chunk(&data).unwrap(), rgb);
	let palette = div_png::palette_from_png(&data).unwrap();
	assert_eq!(palette, Palette::from_rgb8(&rgb, div2_rs::file::FileType::Png).unwrap());

	let mut map = MapFile::new();
	map.import_png(&data).unwrap();
	assert_eq!(map.bitmap().unwrap().pixels(), &[0, 64, 128, 255]);
}

#[test_log::test]
fn pcx_palette_is_six_bit() {
	let image = random_image(21, 10, 10);
	let decoded = pcx::decode(&pcx::encode(&image).unwrap()).unwrap();
	assert_eq!(decoded.palette().colors().len(), 256);
	assert!(decoded.palette().iter().all(|c| c.r() <= 63 && c.g() <= 63 && c.b() <= 63));
}

#[test_log::test]
fn non_indexed_sources_are_rejected() {
	let rgb = encode_png(1, 1, png::ColorType::Rgb, None, &[1, 2, 3]);
	let mut map = MapFile::new();
	assert_eq!(map.import_png(&rgb).unwrap_err().kind(), ErrorKind::Format);
	assert_eq!(map.import_pcx(&rgb).unwrap_err().kind(), ErrorKind::Format);
	assert!(map.bitmap().is_none());
}
