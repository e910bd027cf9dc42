//! Derive per-vertex attributes for triangle surface meshes.
//!
//! This crate turns decoded surface geometry into render-ready vertex
//! buffers. Everything here is synchronous and allocation-bounded by the
//! mesh size; loading and format handling live in the `surfkit` crate.
//!
//! # Key items
//!
//! - [`SurfaceMesh`]: one sub-surface, linked to its successor via `next`
//! - [`compute_vertex_normals`]: face-accumulated smooth vertex normals
//! - [`composite_colors`]: blend scalar overlays and a boundary mask into RGBA
//! - [`DisplayRanges`]: borrowed view of caller-owned display ranges

mod color;
mod error;

pub mod compositor;
pub mod mesh;
pub mod normals;
pub mod overlay;

pub use color::Rgba;
pub use compositor::composite_colors;
pub use error::{MeshError, MeshResult};
pub use mesh::{Chain, MeshGeometry, SurfaceMesh};
pub use normals::compute_vertex_normals;
pub use overlay::{
    BoundaryLayer, ColorTable, DisplayRange, DisplayRanges, LayerRanges, NoRanges, OverlayLayer,
    ScreenVolume, VolumeId,
};

/// Pixel code of the bottom of a display window.
pub const SCREEN_PIXEL_MIN: u8 = 0;
/// Pixel code of the top of a display window.
pub const SCREEN_PIXEL_MAX: u8 = 255;
/// Largest channel value a [`ColorTable`] returns.
pub const LUT_MAX: f32 = 255.0;
