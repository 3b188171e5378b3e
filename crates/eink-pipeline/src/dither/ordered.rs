//! Ordered dithering threshold maps.

/// Constant added on top of every map entry.
pub const DEFAULT_BIAS: i32 = 10;

/// 4x4 Bayer map for monochrome panels.
#[rustfmt::skip]
pub const BAYER_4: [[i8; 4]; 4] = [
    [-128,    0,  -96,   32],
    [  64,  -64,   96,  -32],
    [ -80,   48, -112,   16],
    [ 112,  -16,   80,  -48],
];

/// 6x6 map for colour-filter-array panels, tuned so that each of the three
/// subpixel colours sees its own spread of thresholds.
#[rustfmt::skip]
pub const SUBPIXEL_6: [[i8; 6]; 6] = [
    [  64,  107,  107,   85,   43,  -64],
    [ -21,   43,  -85,   85,  107,  -43],
    [-107, -107,  -43,   21,   64,    0],
    [ -64,    0,    0,   21,   64,   43],
    [ -85,  -21,   85, -128,  -85,  -21],
    [-128,  -43, -107,  -64,   21, -128],
];

/// Threshold offset for block-local pixel (x, y), without the bias.
#[inline]
pub fn threshold(subpixel: bool, x: usize, y: usize) -> i32 {
    if subpixel {
        SUBPIXEL_6[y % 6][x % 6] as i32
    } else {
        BAYER_4[y % 4][x % 4] as i32
    }
}
