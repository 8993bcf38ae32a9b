//! Output boundary: timeline to media file.

/// `ffmpeg` subprocess sink.
pub mod ffmpeg;
/// Frame sink contract and an in-memory sink.
pub mod sink;
/// Timeline encoders and the output boundary.
pub mod timeline;
