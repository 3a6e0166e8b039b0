//! Time-indexed overlay rendering.
//!
//! Each panel painter is a deterministic `(state) -> raster` routine with no
//! file I/O; [`layer::LayerRenderer`] drives the per-frame sampling loop and
//! feeds the resulting alpha rasters into a clip sink. Panel geometry
//! (needle angles, line layout, the mini-map projection) lives in pure
//! functions so it can be asserted without rasterizing.

/// The three overlay panels and the per-layer frame sampling loop.
pub mod layer;
/// Typed overlay option structs with their defaults and validation.
pub mod options;
/// Premultiplied RGBA8 raster frames and the CPU painting surface.
pub mod raster;
/// Text shaping and layout on top of registered font bytes.
pub mod text;

pub(crate) mod gauge;
pub(crate) mod info_panel;
pub(crate) mod minimap;
