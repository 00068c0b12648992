use std::path::PathBuf;

use super::*;
use crate::assets::decode::{PNG_MIME, encode_png, to_data_url};

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(normalize_rel_path("a/./b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("./").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn loads_data_urls_without_touching_disk() {
    let png = encode_png(&[255, 0, 0, 255, 0, 255, 0, 255], 2, 1).unwrap();
    let url = to_data_url(PNG_MIME, &png);

    let loader = FsImageLoader::new("does-not-exist");
    let img = loader.load(&url).unwrap();
    assert_eq!((img.width, img.height), (2, 1));
    assert_eq!(&img.rgba8_premul[0..4], &[255, 0, 0, 255]);
}

#[test]
fn loads_relative_files_from_root() {
    let dir = PathBuf::from("target").join("loader_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let png = encode_png(&[0, 0, 255, 255], 1, 1).unwrap();
    std::fs::write(dir.join("blue.png"), png).unwrap();

    let loader = FsImageLoader::new(&dir);
    let img = loader.load("blue.png").unwrap();
    assert_eq!(img.rgba8_premul.as_slice(), &[0, 0, 255, 255]);

    let err = loader.load("missing.png").unwrap_err();
    assert!(err.to_string().contains("failed to read image"));
}
