//! Media helpers shared by renderers and the encoder.

pub mod media;
pub mod wav;
