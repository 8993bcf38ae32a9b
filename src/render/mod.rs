//! External renderers and the dispatcher that drives them through the cache.

/// Code screenshot backends.
pub mod code_image;
/// Segment-to-artifact dispatch over a bounded pool.
pub mod dispatch;
/// Text-to-speech backends.
pub mod speech;
