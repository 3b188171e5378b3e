//! Error diffusion kernel definitions.
//!
//! Every kernel here divides by 16 and propagates the full error.

/// An error diffusion kernel.
///
/// Each entry is an offset (dx, dy) from the pixel being quantized and the
/// weight of the error it receives. Only not-yet-visited pixels may be
/// targeted: dy > 0, or dy == 0 with dx > 0.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    /// (dx, dy, weight) entries.
    pub entries: &'static [(i32, i32, u8)],

    /// Each target receives `error * weight / divisor`.
    pub divisor: u8,

    /// Furthest row reached; the error buffer needs `max_dy + 1` rows.
    pub max_dy: usize,
}

impl Kernel {
    /// Sum of all weights. Equal to the divisor for full propagation.
    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|&(_, _, w)| w as u32).sum()
    }
}

/// Floyd-Steinberg.
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[
        (1, 0, 7),  // right
        (-1, 1, 3), // bottom-left
        (0, 1, 5),  // bottom
        (1, 1, 1),  // bottom-right
    ],
    divisor: 16,
    max_dy: 1,
};

/// Two-row Sierra.
///
/// ```text
///            X   4   3
///    1   2   3   2   1
/// ```
pub const SIERRA_TWO_ROW: Kernel = Kernel {
    entries: &[
        (1, 0, 4),
        (2, 0, 3),
        (-2, 1, 1),
        (-1, 1, 2),
        (0, 1, 3),
        (1, 1, 2),
        (2, 1, 1),
    ],
    divisor: 16,
    max_dy: 1,
};

/// Colour-filter-array kernel.
///
/// Subpixel colours cycle with `x - y`, so the only neighbours sharing the
/// current pixel's colour sit where `dx - dy` is a multiple of 3. Error is
/// pushed to the six nearest of those.
///
/// ```text
///    .   .   X   .   .   2
///    3   .   .   5   .   .
///    .   3   .   .   2   .
///    .   .   1   .   .   .
/// ```
pub const SUBPIXEL: Kernel = Kernel {
    entries: &[
        (3, 0, 2),
        (-2, 1, 3),
        (1, 1, 5),
        (-1, 2, 3),
        (2, 2, 2),
        (0, 3, 1),
    ],
    divisor: 16,
    max_dy: 3,
};
