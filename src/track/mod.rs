//! GPS track parsing and the queryable track model.
//!
//! A [`model::Track`] is built either from raw KML bytes
//! ([`model::Track::parse`]) or from an already-decoded point list
//! ([`model::Track::from_points`]); both entry points apply the same
//! ordering and time-span derivation, so downstream consumers cannot
//! observe which path produced the data.

/// The derived, immutable track model and its time queries.
pub mod model;
/// KML reading: `gx:Track` when/coord sequences and `coordinates` blobs.
pub mod parse;
