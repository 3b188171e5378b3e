//! Assertion helpers for tests.

use std::fs::File;
use std::path::Path;

use eink_pipeline::{Canvas, PixelFormat};
use pretty_assertions::assert_eq;

/// Decode an RGBA snapshot written by the simulator.
pub fn read_snapshot(path: &Path) -> (u32, u32, Vec<u8>) {
    let file = File::open(path).expect("snapshot exists");
    let mut reader = png::Decoder::new(file).read_info().expect("valid PNG");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("PNG frame");
    assert_eq!(info.color_type, png::ColorType::Rgba);
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}

/// Assert every pixel of an ARGB surface is pure black or pure white.
pub fn assert_black_and_white(surface: &Canvas) {
    assert_eq!(surface.format(), PixelFormat::Argb8888);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let value = surface.pixel(x, y);
            assert!(
                value == 0xff000000 || value == 0xffffffff,
                "pixel ({x}, {y}) is {value:08x}, expected black or white"
            );
        }
    }
}

/// Fraction of white pixels in the rectangle (x, y, w, h) of an ARGB
/// surface.
pub fn white_fraction(surface: &Canvas, x: u32, y: u32, w: u32, h: u32) -> f32 {
    let mut white = 0;
    for py in y..y + h {
        for px in x..x + w {
            if surface.pixel(px, py) == 0xffffffff {
                white += 1;
            }
        }
    }
    white as f32 / (w * h) as f32
}
