//! Content-addressed render cache.

/// Render requests and their content digests.
pub mod key;
/// On-disk artifact store with in-process request coalescing.
pub mod store;
