use std::collections::HashSet;
use std::fs;

use skytiles::catalog::{build_face_tree, read_catalog};
use skytiles::tiles::{collect_tiles, write_tiles};
use skytiles::{BuildConfig, CubeFace, QuadtreeError};

fn catalog_line(id: usize, ra: f64, dec: f64, mag: f64) -> String {
    let mut fields = vec![String::new(); 17];
    fields[0] = id.to_string();
    fields[1] = id.to_string();
    fields[7] = ra.to_string();
    fields[8] = dec.to_string();
    fields[9] = "20.0".to_string();
    fields[13] = mag.to_string();
    fields[16] = "0.5".to_string();
    fields.join(",")
}

/// Stars spread around the sky, magnitudes cycling from bright to faint.
fn synthetic_catalog(count: usize) -> String {
    let mut lines = vec!["StarID,HIP,HD,HR,Gliese,BayerFlamsteed,ProperName,RA,Dec,\
                          Distance,PMRA,PMDec,RV,Mag,AbsMag,Spectrum,ColorIndex"
        .to_string()];
    lines.push(catalog_line(0, 0.0, 0.0, -26.7));
    for i in 1..=count {
        let ra = (i * 37 % 240) as f64 / 10.0;
        let dec = (i * 53 % 170) as f64 - 85.0;
        let mag = (i * 7 % 90) as f64 / 10.0 - 1.0;
        lines.push(catalog_line(i, ra, dec, mag));
    }
    lines.join("\n")
}

#[test]
fn catalog_to_tiles() {
    let config = BuildConfig {
        capacity: 20,
        ..BuildConfig::default()
    };
    let faces = read_catalog(synthetic_catalog(600).as_bytes(), config.min_magnitude).unwrap();
    let star_total: usize = faces.values().map(Vec::len).sum();
    assert_eq!(star_total, 600);

    let dir = std::env::temp_dir().join(format!("skytiles-pipeline-{}", std::process::id()));
    let mut names = HashSet::new();
    let mut tiled = 0;
    for (face, stars) in faces {
        let count = stars.len();
        let tree = build_face_tree(stars, &config).unwrap();
        assert_eq!(tree.len(), count);

        let tiles = collect_tiles(&tree, face);
        for tile in &tiles {
            assert!(!tile.stars.is_empty());
            assert!(tile.stars.len() <= config.capacity);
            assert_eq!(tile.brightest, tile.stars[0].mag);
            // Brightest-first insertion keeps every tile sorted.
            assert!(tile.stars.windows(2).all(|w| w[0].mag <= w[1].mag));
            assert!(names.insert(tile.file_name()), "duplicate tile {}", tile.file_name());
            tiled += tile.stars.len();
        }
        write_tiles(&dir, &tiles).unwrap();
    }
    assert_eq!(tiled, 600);

    let written = fs::read_dir(&dir).unwrap().count();
    assert_eq!(written, names.len());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn coincident_stars_fail_the_build() {
    let config = BuildConfig {
        capacity: 2,
        max_depth: 4,
        ..BuildConfig::default()
    };
    let text: Vec<String> = (0..50).map(|i| catalog_line(i, 3.0, 10.0, 5.0)).collect();
    let mut faces = read_catalog(text.join("\n").as_bytes(), config.min_magnitude).unwrap();
    assert_eq!(faces.len(), 1);
    let (_, stars) = faces.pop_first().unwrap();

    let err = build_face_tree(stars, &config).err().unwrap();
    assert_eq!(err, QuadtreeError::MaxDepthExceeded { max_depth: 4 });
}

#[test]
fn faces_display_as_axis_and_sign() {
    let names: Vec<String> = [
        CubeFace::X0,
        CubeFace::X1,
        CubeFace::Y0,
        CubeFace::Y1,
        CubeFace::Z0,
        CubeFace::Z1,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_eq!(names, vec!["x0", "x1", "y0", "y1", "z0", "z1"]);
}
