//! Speech placement and mixdown for the encoder's audio input.

/// Timeline-to-sample placement.
pub mod manifest;
/// PCM mixing and raw output.
pub mod mix;
