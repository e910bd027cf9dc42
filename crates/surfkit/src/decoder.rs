//! The contract concrete surface decoders implement.

use std::future::Future;
use std::pin::Pin;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::format::FormatKind;

/// Raw surface bytes, in the mode the decoder asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawData {
    Binary(Vec<u8>),
    Text(String),
}

impl RawData {
    /// Wrap `bytes` for a binary or text decoder. Text must be UTF-8.
    pub fn from_bytes(bytes: Vec<u8>, binary: bool) -> Result<Self, FromUtf8Error> {
        if binary {
            Ok(Self::Binary(bytes))
        } else {
            String::from_utf8(bytes).map(Self::Text)
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Binary(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Failure reported by a decoder.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// The data is structurally invalid for this format.
    #[error("{0}")]
    Malformed(String),

    /// Any other decoder failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Future returned by [`SurfaceDecoder::read_data`].
pub type DecodeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DecoderError>> + Send + 'a>>;

/// A decoder for one surface file format.
///
/// The loader calls [`SurfaceDecoder::read_data`] once, then reads each
/// sub-surface back through the accessors. Accessors are only called with
/// `index < surface_count()` and only after a successful decode.
pub trait SurfaceDecoder: Send {
    /// Whether the decoder wants raw bytes rather than text.
    fn is_binary(&self) -> bool;

    /// Decode `raw`, reporting fractional progress in `[0, 1]` zero or more
    /// times before the future resolves.
    fn read_data<'a>(
        &'a mut self,
        raw: RawData,
        progress: &'a (dyn Fn(f32) + Sync),
    ) -> DecodeFuture<'a>;

    /// Number of sub-surfaces in the decoded file. At least one on success.
    fn surface_count(&self) -> usize;

    fn point_count(&self, index: usize) -> usize;

    fn triangle_count(&self, index: usize) -> usize;

    /// Interleaved XYZ positions.
    fn points(&self, index: usize) -> &[f32];

    /// Interleaved normals, if the file carries them.
    fn normals(&self, index: usize) -> Option<&[f32]>;

    /// Triangle vertex indices.
    fn triangles(&self, index: usize) -> &[u32];

    /// Per-vertex RGBA buffer, if the file carries one. The loader does not
    /// use it: vertex colors are always composited from the record's layers.
    fn colors(&self, _index: usize) -> Option<&[f32]> {
        None
    }

    /// A solid color for the whole sub-surface.
    fn solid_color(&self, _index: usize) -> Option<[f32; 3]> {
        None
    }
}

/// Builds the decoder for a detected format.
pub trait DecoderFactory: Send + Sync {
    fn create(&self, kind: FormatKind) -> Box<dyn SurfaceDecoder>;
}

impl<F> DecoderFactory for F
where
    F: Fn(FormatKind) -> Box<dyn SurfaceDecoder> + Send + Sync,
{
    fn create(&self, kind: FormatKind) -> Box<dyn SurfaceDecoder> {
        self(kind)
    }
}
