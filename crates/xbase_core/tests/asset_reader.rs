use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Read};
use std::sync::Arc;
use xbase_core::asset::{DecodeKind, MemoryAssetStore};
use xbase_core::{AssetError, AssetReader};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut image = RgbaImage::new(width, height);
    image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn fixture_store() -> Arc<MemoryAssetStore> {
    let mut store = MemoryAssetStore::new()
        .with_asset("fonts/zh.ttf", vec![7u8; 1024])
        .with_asset("text/greeting.txt", "你好, world 🍎\nsecond line")
        .with_asset("text/latin1.txt", vec![0x63, 0x61, 0x66, 0xE9])
        .with_asset("config/app.properties", "# app\nname=xbase\nversion = 1.0\n")
        .with_asset("config/bad.properties", "key=\\uZZZZ")
        .with_asset("images/dot.png", png_bytes(2, 3))
        .with_asset("images/not-an-image.png", "plain text");
    store.insert_broken("broken.bin", vec![1u8; 2000]);
    Arc::new(store)
}

fn reader_for(store: &Arc<MemoryAssetStore>) -> AssetReader {
    AssetReader::new(store.clone())
}

#[test]
fn existing_font_reports_size_and_exists() {
    let store = fixture_store();
    let reader = reader_for(&store);

    assert!(reader.exists("fonts/zh.ttf"));
    assert_eq!(reader.size_of("fonts/zh.ttf").unwrap(), 1024);
    assert_eq!(store.handle_stats().open_handles(), 0);
}

#[test]
fn list_paths_returns_children_and_empty_for_missing_dirs() {
    let store = fixture_store();
    let reader = reader_for(&store);

    assert_eq!(
        reader.list_paths("").unwrap(),
        vec!["broken.bin", "config", "fonts", "images", "text"]
    );
    assert_eq!(
        reader.list_paths("config/").unwrap(),
        vec!["app.properties", "bad.properties"]
    );
    assert!(reader.list_paths("nope").unwrap().is_empty());
}

#[test]
fn missing_asset_is_absent_everywhere_without_panicking() {
    let store = fixture_store();
    let reader = reader_for(&store);

    assert!(!reader.exists("missing.txt"));
    assert!(reader.read_text("missing.txt").unwrap_err().is_not_found());
    assert!(reader.read_bytes("missing.txt").unwrap_err().is_not_found());
    assert!(reader.read_config("missing.txt").unwrap_err().is_not_found());
    assert!(reader.read_image("missing.txt").unwrap_err().is_not_found());
    assert!(reader.open_stream("missing.txt").unwrap_err().is_not_found());
    assert!(reader.size_of("missing.txt").unwrap_err().is_not_found());
    assert!(reader.read_text("missing.txt").ok().is_none());
    assert_eq!(store.handle_stats().opened, 0);
}

#[test]
fn read_text_round_trips_multibyte_content() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let text = reader.read_text("text/greeting.txt").unwrap();
    assert_eq!(text, "你好, world 🍎\nsecond line");
}

#[test]
fn read_text_rejects_invalid_utf8_as_decode_error() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let err = reader.read_text("text/latin1.txt").unwrap_err();
    assert!(matches!(
        err,
        AssetError::Decode {
            kind: DecodeKind::Text,
            ..
        }
    ));
    assert_eq!(store.handle_stats().open_handles(), 0);
}

#[test]
fn read_bytes_drains_past_the_buffer_size() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let bytes = reader.read_bytes("fonts/zh.ttf").unwrap();
    assert_eq!(bytes.len(), 1024);
    assert!(bytes.iter().all(|byte| *byte == 7));

    let mut store = MemoryAssetStore::new();
    let large: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    store.insert("large.bin", large.clone());
    let reader = AssetReader::new(Arc::new(store));
    assert_eq!(reader.read_bytes("large.bin").unwrap(), large);
}

#[test]
fn read_config_returns_exactly_the_written_pairs() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let props = reader.read_config("config/app.properties").unwrap();
    assert_eq!(props.len(), 2);
    assert_eq!(props.get("name"), Some("xbase"));
    assert_eq!(props.get("version"), Some("1.0"));
}

#[test]
fn read_config_closes_stream_when_parsing_fails() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let err = reader.read_config("config/bad.properties").unwrap_err();
    assert!(matches!(
        err,
        AssetError::Decode {
            kind: DecodeKind::Properties,
            ..
        }
    ));
    let stats = store.handle_stats();
    assert_eq!((stats.opened, stats.closed), (1, 1));
}

#[test]
fn read_image_decodes_png_and_rejects_garbage() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let image = reader.read_image("images/dot.png").unwrap();
    assert_eq!(image.dimensions(), (2, 3));
    assert_eq!(image.get_pixel(0, 0), Rgba([255, 0, 0, 255]));

    let err = reader.read_image("images/not-an-image.png").unwrap_err();
    assert_eq!(err.code(), "decode_error");
    assert_eq!(store.handle_stats().open_handles(), 0);
}

#[test]
fn io_failure_mid_read_is_io_error_and_still_closes() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let err = reader.read_bytes("broken.bin").unwrap_err();
    assert!(matches!(err, AssetError::Io { .. }));
    assert!(reader.read_text("broken.bin").is_err());
    assert!(reader.read_image("broken.bin").is_err());
    assert!(reader.size_of("broken.bin").is_err());

    let stats = store.handle_stats();
    assert_eq!(stats.opened, 3);
    assert_eq!(stats.closed, 3);
}

#[test]
fn every_read_helper_closes_exactly_once() {
    let store = fixture_store();
    let reader = reader_for(&store);

    reader.read_bytes("fonts/zh.ttf").unwrap();
    reader.read_text("text/greeting.txt").unwrap();
    reader.read_config("config/app.properties").unwrap();
    reader.read_image("images/dot.png").unwrap();
    assert!(reader.exists("fonts/zh.ttf"));

    let stats = store.handle_stats();
    assert_eq!(stats.opened, 5);
    assert_eq!(stats.closed, 5);
}

#[test]
fn open_stream_is_owned_by_caller_until_dropped() {
    let store = fixture_store();
    let reader = reader_for(&store);

    let mut stream = reader.open_stream("text/greeting.txt").unwrap();
    assert_eq!(stream.path(), "text/greeting.txt");
    let mut head = [0u8; 3];
    stream.read_exact(&mut head).unwrap();
    assert_eq!(&head, "你".as_bytes());
    assert_eq!(store.handle_stats().open_handles(), 1);

    stream.close();
    let stats = store.handle_stats();
    assert_eq!((stats.opened, stats.closed), (1, 1));
}

#[test]
fn invalid_paths_are_rejected_before_touching_the_store() {
    let store = fixture_store();
    let reader = reader_for(&store);

    for path in ["../fonts/zh.ttf", "/fonts/zh.ttf", ""] {
        assert!(matches!(
            reader.read_bytes(path),
            Err(AssetError::InvalidPath(_))
        ));
        assert!(!reader.exists(path));
    }
    assert!(matches!(
        reader.list_paths("../"),
        Err(AssetError::InvalidPath(_))
    ));
    assert_eq!(store.handle_stats().opened, 0);
}

#[test]
fn colons_and_backslashes_inside_asset_names_are_readable() {
    let mut store = MemoryAssetStore::new().with_asset("logs/12:30.txt", "lunch");
    store.insert("win\\notes.txt", "crlf\r\n");
    let store = Arc::new(store);
    let reader = reader_for(&store);

    assert!(reader.exists("logs/12:30.txt"));
    assert_eq!(reader.read_text("logs/12:30.txt").unwrap(), "lunch");
    assert_eq!(reader.list_paths("logs").unwrap(), vec!["12:30.txt"]);

    assert_eq!(reader.read_text("win/notes.txt").unwrap(), "crlf\r\n");
    assert_eq!(reader.read_text("win\\notes.txt").unwrap(), "crlf\r\n");
    assert!(matches!(
        reader.read_text("C:/logs/12:30.txt"),
        Err(AssetError::InvalidPath(_))
    ));
}
