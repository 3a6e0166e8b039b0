//! Shared foundation: the crate error taxonomy and the small value types
//! used across the track, overlay, encode and job layers.

/// Crate-wide value types: speed units, screen corners, overlay timing math.
pub mod core;
/// Crate error taxonomy and result alias.
pub mod error;
