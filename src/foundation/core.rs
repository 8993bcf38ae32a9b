use std::time::Duration;

use crate::foundation::error::{ScriptcastError, ScriptcastResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> ScriptcastResult<Self> {
        if den == 0 {
            return Err(ScriptcastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScriptcastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Nearest frame boundary for a timeline offset.
    ///
    /// Track spans are derived from their cumulative start/end offsets, so adjacent spans share a
    /// boundary and never overlap or leave a gap.
    pub fn frame_at(self, offset: Duration) -> u64 {
        let num = offset.as_nanos() * u128::from(self.num);
        let den = u128::from(self.den) * 1_000_000_000;
        ((num + (den / 2)) / den) as u64
    }
}

/// Nearest sample index for a timeline offset at `sample_rate`.
pub fn sample_at(offset: Duration, sample_rate: u32) -> u64 {
    let num = offset.as_nanos() * u128::from(sample_rate);
    let den = 1_000_000_000u128;
    ((num + (den / 2)) / den) as u64
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Portrait 1080x1920, the short-form video frame.
    pub const PORTRAIT: Canvas = Canvas {
        width: 1080,
        height: 1920,
    };
}

/// Opaque RGB8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// `#rrggbb`, as used in SVG attributes.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
