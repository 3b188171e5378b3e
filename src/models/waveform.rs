use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Panel waveform used to drive an update.
///
/// The discriminants are the controller's waveform indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WaveformMode {
    /// Full clear used after power-on.
    Init = 0,
    /// Direct update, fast 1-bit transitions.
    Du = 1,
    /// 16-level greyscale with full flashing.
    #[default]
    Gc16 = 2,
    /// 4-level greyscale.
    Gc4 = 3,
    /// Fast black and white for animation.
    A2 = 4,
}

impl WaveformMode {
    #[inline]
    pub const fn index(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for WaveformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaveformMode::Init => "INIT",
            WaveformMode::Du => "DU",
            WaveformMode::Gc16 => "GC16",
            WaveformMode::Gc4 => "GC4",
            WaveformMode::A2 => "A2",
        };
        f.write_str(name)
    }
}
