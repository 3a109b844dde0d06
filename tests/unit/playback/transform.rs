use image::Rgba;

use super::*;

fn strip() -> RgbaImage {
    // 2x1: red, blue
    RgbaImage::from_fn(2, 1, |x, _| {
        if x == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    })
}

#[test]
fn rotation_parses_quarter_turns_only() {
    assert_eq!(Rotation::from_degrees(90).unwrap(), Rotation::Cw90);
    assert_eq!(Rotation::from_degrees(270).unwrap(), Rotation::Cw270);
    assert!(Rotation::from_degrees(45).is_err());
    assert!(Rotation::from_degrees(0).is_err());
}

#[test]
fn rotate_90_turns_rows_into_columns() {
    let src = strip();
    let out = rotate(Rotation::Cw90)(&src);
    assert_eq!(out.dimensions(), (1, 2));
    assert_eq!(*out.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*out.get_pixel(0, 1), Rgba([0, 0, 255, 255]));
    // Input untouched.
    assert_eq!(src, strip());
}

#[test]
fn rotate_180_reverses() {
    let out = rotate(Rotation::Cw180)(&strip());
    assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
}

#[test]
fn fill_produces_exact_target_size() {
    let src = RgbaImage::from_pixel(10, 4, Rgba([9, 9, 9, 255]));
    let out = fill(4, 4)(&src);
    assert_eq!(out.dimensions(), (4, 4));
    assert_eq!(*out.get_pixel(2, 2), Rgba([9, 9, 9, 255]));

    let out = fill(8, 2)(&RgbaImage::new(0, 0));
    assert_eq!(out.dimensions(), (8, 2));
}
