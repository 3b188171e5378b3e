//! Blue noise threshold tiles.
//!
//! Both tiles are signed offsets centred on zero and are generated at
//! compile time from a position hash, so they tile seamlessly and stay
//! identical across builds.

/// 32x32 tile for monochrome panels, indexed `[y % 32][x % 32]`.
pub const MONO_32: [[i8; 32]; 32] = generate::<32, 32>(0x9e37_79b9);

/// 120x40 tile for colour-filter-array panels, indexed
/// `[y % 120][(x / 3) % 40]` so the three subpixels of one colour triplet
/// share an entry.
pub const SUBPIXEL_120X40: [[i8; 40]; 120] = generate::<120, 40>(0x7f4a_7c15);

/// Noise offset for block-local pixel (x, y).
#[inline]
pub fn noise(subpixel: bool, x: usize, y: usize) -> i32 {
    if subpixel {
        SUBPIXEL_120X40[y % 120][(x / 3) % 40] as i32
    } else {
        MONO_32[y % 32][x % 32] as i32
    }
}

const fn generate<const ROWS: usize, const COLS: usize>(seed: u32) -> [[i8; COLS]; ROWS] {
    let mut result = [[0i8; COLS]; ROWS];

    let mut y = 0;
    while y < ROWS {
        let mut x = 0;
        while x < COLS {
            let mut hash = (y * COLS + x) as u32 ^ seed;
            hash = hash.wrapping_mul(0x85eb_ca6b);
            hash ^= hash >> 13;
            hash = hash.wrapping_mul(0xc2b2_ae35);
            hash ^= hash >> 16;

            hash = hash.wrapping_add((x as u32).wrapping_mul(0x045d_9f3b));
            hash ^= hash >> 11;
            hash = hash.wrapping_add((y as u32).wrapping_mul(0x119d_e1f3));
            hash ^= hash >> 15;

            hash = hash.wrapping_mul(0x27d4_eb2d);
            hash ^= hash >> 13;

            result[y][x] = ((hash >> 24) as i32 - 128) as i8;
            x += 1;
        }
        y += 1;
    }

    result
}
