//! Colour-filter-array subpixel layout.
//!
//! Every panel pixel sits under one colour filter dot. Colours cycle along
//! each row and shift by one per row, counted from the bottom edge of the
//! panel.

/// Colour of the filter dot over one panel pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subpixel {
    Red,
    Green,
    Blue,
}

impl Subpixel {
    /// Filter colour at absolute panel position (x, y) on a panel
    /// `height` rows tall.
    #[inline]
    pub fn at(x: u32, y: u32, height: u32) -> Self {
        match (x as u64 + height as u64 - y as u64) % 3 {
            0 => Subpixel::Red,
            1 => Subpixel::Blue,
            _ => Subpixel::Green,
        }
    }

    /// Byte offset of this colour inside an `Rgb888` pixel.
    #[inline]
    pub const fn channel(self) -> usize {
        match self {
            Subpixel::Red => 0,
            Subpixel::Green => 1,
            Subpixel::Blue => 2,
        }
    }

    /// Bit position of this colour inside an `Argb8888` word.
    #[inline]
    pub const fn shift(self) -> u32 {
        match self {
            Subpixel::Red => 16,
            Subpixel::Green => 8,
            Subpixel::Blue => 0,
        }
    }
}
