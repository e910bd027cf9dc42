//! Load triangle surface meshes and prepare them for rendering.
//!
//! A [`Loader`] takes a surface from a URL, a local file or an embedded
//! base64 payload, picks a decoder by file name, and expands every decoded
//! sub-surface into a [`SurfaceMesh`] with vertex colors and normals filled
//! in. The byte-level decoders are supplied by the caller through
//! [`DecoderFactory`].
//!
//! # Example
//!
//! ```no_run
//! use surfkit::{FormatKind, Loader, SurfaceDecoder};
//!
//! # fn make_decoder(kind: FormatKind) -> Box<dyn SurfaceDecoder> { unimplemented!() }
//! # async fn run() -> Result<(), surfkit::LoadError> {
//! let loader = Loader::new(make_decoder);
//! let surface = loader.load_url("https://example.com/lh.pial.surf.gii").await?;
//! for mesh in &surface {
//!     println!("{}: {} vertices", mesh.name, mesh.vertex_count);
//! }
//! # Ok(())
//! # }
//! ```

mod acquire;
mod error;
mod params;

pub mod decoder;
pub mod format;
pub mod pipeline;
pub mod progress;

pub use decoder::{DecodeFuture, DecoderError, DecoderFactory, RawData, SurfaceDecoder};
pub use error::{LoadError, LoadResult};
pub use format::{FormatKind, classify};
pub use params::{ParamsMap, SurfaceParams};
pub use pipeline::{EmbeddedPayloads, LoadStage, Loader};
pub use progress::{DECODE_LABEL, LOADING_LABEL, NoProgress, ProgressSink};

pub use surfkit_mesh::{
    BoundaryLayer, ColorTable, DisplayRange, DisplayRanges, LayerRanges, NoRanges, OverlayLayer,
    Rgba, ScreenVolume, SurfaceMesh, VolumeId,
};
