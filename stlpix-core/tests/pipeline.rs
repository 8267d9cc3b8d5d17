use nalgebra::Vector3;
use std::fs;
use tempfile::TempDir;

use stlpix_core::geometry::{box_mesh, cube};
use stlpix_core::stl::{encode_ascii_stl, encode_binary_stl};
use stlpix_core::{render_stl_file, RenderError, RenderOptions, StlError, ViewAngles};

fn small_options() -> RenderOptions {
    RenderOptions {
        size: 64,
        ..RenderOptions::default()
    }
}

#[test]
fn test_short_binary_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("short.stl");
    let output = dir.path().join("out/short.png");
    fs::write(&input, [0u8; 40]).unwrap();

    let err = render_stl_file(&input, &output, &small_options()).unwrap_err();
    assert!(matches!(err, RenderError::Stl(StlError::TooSmall { len: 40 })));
    assert!(err.to_string().starts_with("ParseError"));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_reports_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("nope.stl");
    let err = render_stl_file(&input, dir.path().join("x.png"), &small_options()).unwrap_err();
    match err {
        RenderError::Io { path, .. } => assert_eq!(path, input),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_options_write_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("cube.stl");
    let output = dir.path().join("cube.png");
    fs::write(&input, encode_binary_stl(&cube(1.0)).unwrap()).unwrap();

    let options = RenderOptions {
        margin: 1.5,
        ..small_options()
    };
    let err = render_stl_file(&input, &output, &options).unwrap_err();
    assert!(matches!(err, RenderError::InvalidOption(_)));
    assert!(!output.exists());
}

#[test]
fn test_ascii_and_binary_render_identically() {
    let dir = TempDir::new().unwrap();
    let mesh = box_mesh(Vector3::new(1.0, 0.5, 0.25));
    let ascii = dir.path().join("box_ascii.stl");
    let binary = dir.path().join("box_binary.stl");
    fs::write(&ascii, encode_ascii_stl("box", &mesh)).unwrap();
    fs::write(&binary, encode_binary_stl(&mesh).unwrap()).unwrap();

    let a_png = dir.path().join("a.png");
    let b_png = dir.path().join("b.png");
    let a_stats = render_stl_file(&ascii, &a_png, &small_options()).unwrap();
    let b_stats = render_stl_file(&binary, &b_png, &small_options()).unwrap();

    assert_eq!(a_stats, b_stats);
    assert_eq!(fs::read(&a_png).unwrap(), fs::read(&b_png).unwrap());
}

#[test]
fn test_cube_render_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("cube.stl");
    fs::write(&input, encode_binary_stl(&cube(1.0)).unwrap()).unwrap();

    let options = RenderOptions {
        size: 80,
        ground_grid: Some(Default::default()),
        axes: Some(Default::default()),
        ..RenderOptions::default()
    };
    let first = dir.path().join("renders/deep/first.png");
    let second = dir.path().join("renders/second.png");
    let stats = render_stl_file(&input, &first, &options).unwrap();
    render_stl_file(&input, &second, &options).unwrap();

    assert_eq!(stats.faces, 12);
    assert!(stats.drawn > 0);
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let image = image::open(&first).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (80, 80));
    assert_ne!(image.get_pixel(40, 40), &options.background);
}

#[test]
fn test_unit_cube_file_matches_baseline() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("unit_cube.stl");
    let output = dir.path().join("unit_cube.png");
    fs::write(&input, encode_binary_stl(&cube(0.5)).unwrap()).unwrap();

    let options = RenderOptions {
        size: 128,
        view: ViewAngles::new(-35.0, -35.0),
        fov_deg: 35.0,
        margin: 0.6,
        two_sided: true,
        auto_upright: false,
        ..RenderOptions::default()
    };
    render_stl_file(&input, &output, &options).unwrap();

    let image = image::open(&output).unwrap().to_rgb8();
    let bg = options.background;
    let background = image.pixels().filter(|p| **p == bg).count();
    let (xs, ys): (Vec<u32>, Vec<u32>) = image
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != bg)
        .map(|(x, y, _)| (x, y))
        .unzip();

    assert_eq!(background, 12132);
    assert_eq!(xs.len(), 4252);
    let rect = (
        *xs.iter().min().unwrap(),
        *ys.iter().min().unwrap(),
        *xs.iter().max().unwrap(),
        *ys.iter().max().unwrap(),
    );
    assert_eq!(rect, (23, 19, 102, 106));
}
