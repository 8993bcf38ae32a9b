/// Segment-to-track placement.
pub mod compose;
/// Text line breaking for headings and captions.
pub mod wrap;
