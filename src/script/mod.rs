//! Script front-end: markup parsing and segment extraction.

pub mod language;
pub mod markup;
pub mod segment;
