//! Test fixtures and constants.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};

/// Simulated panel sizes
pub mod panels {
    /// Small 4:3 panel
    pub const SMALL: (u32, u32) = (64, 48);

    /// Portrait panel
    pub const PORTRAIT: (u32, u32) = (30, 60);
}

/// Write a uniform grey PNG and return its path.
pub fn grey_png(dir: &Path, name: &str, width: u32, height: u32, level: u8) -> PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(width, height, Luma([level]))
        .save(&path)
        .expect("write grey fixture");
    path
}

/// Write a horizontal black-to-white ramp as an RGB PNG.
pub fn ramp_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let image = RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / (width - 1).max(1)) as u8;
        Rgb([v, v, v])
    });
    image.save(&path).expect("write ramp fixture");
    path
}

/// YAML configuration for the simulator with a snapshot path.
pub fn simulator_yaml(width: u32, height: u32, snapshot: &Path) -> String {
    format!(
        "display:\n  backend: sim\n  width: {width}\n  height: {height}\n  snapshot: {}\n",
        snapshot.display()
    )
}
