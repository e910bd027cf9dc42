//! The surface load pipeline.
//!
//! Each load walks `Idle → Detecting → Acquiring → Decoding → Expanding →
//! Done`, or stops in `Failed`. The returned future resolves exactly once,
//! with the head of the sub-surface chain or the first error. Acquisition
//! and decoding are each attempted once; nothing is retried.

use std::collections::HashMap;
#[cfg(not(target_family = "wasm"))]
use std::path::Path;
use std::sync::Arc;

use surfkit_mesh::{MeshGeometry, NoRanges, SurfaceMesh};

use crate::acquire;
use crate::decoder::{DecoderError, DecoderFactory, RawData, SurfaceDecoder};
use crate::error::{LoadError, LoadResult};
use crate::format::classify;
use crate::params::{ParamsMap, SurfaceParams};
use crate::progress::{DECODE_LABEL, NoProgress, ProgressSink};

/// Base64 surface payloads keyed by name, for [`Loader::load_embedded`].
pub type EmbeddedPayloads = HashMap<String, String>;

/// Suffix given to embedded surfaces, which are always GIFTI.
const EMBEDDED_SUFFIX: &str = ".surf.gii";

/// Where a load request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Idle,
    Detecting,
    Acquiring,
    Decoding,
    Expanding,
    Done,
    Failed,
}

/// Loads surfaces and turns them into render-ready mesh chains.
pub struct Loader<F> {
    factory: F,
    params: ParamsMap,
    payloads: EmbeddedPayloads,
    progress: Arc<dyn ProgressSink>,
    http: reqwest::Client,
}

impl<F: DecoderFactory> Loader<F> {
    /// Create a loader that builds decoders with `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            params: ParamsMap::default(),
            payloads: EmbeddedPayloads::new(),
            progress: Arc::new(NoProgress),
            http: reqwest::Client::new(),
        }
    }

    /// Display overrides, looked up by surface name.
    #[must_use]
    pub fn with_params(mut self, params: ParamsMap) -> Self {
        self.params = params;
        self
    }

    /// Payloads available to [`Loader::load_embedded`].
    #[must_use]
    pub fn with_payloads(mut self, payloads: EmbeddedPayloads) -> Self {
        self.payloads = payloads;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Load a surface over HTTP. The surface is named after the last path
    /// segment of `url`; any non-success status fails the load.
    pub async fn load_url(&self, url: &str) -> LoadResult<SurfaceMesh> {
        let name = url.rsplit('/').next().unwrap_or(url);
        let mut request = self.request(name.to_owned(), name);
        let result = self.run_url(&mut request, url).await;
        request.complete(result)
    }

    /// Load a surface from a local file, named after its file name.
    #[cfg(not(target_family = "wasm"))]
    pub async fn load_file(&self, path: impl AsRef<Path>) -> LoadResult<SurfaceMesh> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
            .into_owned();
        let mut request = self.request(name.clone(), &name);
        let result = self.run_file(&mut request, path).await;
        request.complete(result)
    }

    /// Load a surface from the base64 payload registered as `name`.
    ///
    /// Embedded surfaces are decoded as GIFTI under the name
    /// `<name>.surf.gii`; display overrides are still looked up by `name`.
    pub async fn load_embedded(&self, name: &str) -> LoadResult<SurfaceMesh> {
        let mut request = self.request(format!("{name}{EMBEDDED_SUFFIX}"), name);
        let result = self.run_embedded(&mut request, name).await;
        request.complete(result)
    }

    fn request(&self, name: String, params_key: &str) -> LoadRequest<'_> {
        LoadRequest {
            name,
            params: self.params.get(params_key),
            stage: LoadStage::Idle,
            progress: self.progress.as_ref(),
        }
    }

    async fn run_url(&self, request: &mut LoadRequest<'_>, url: &str) -> LoadResult<SurfaceMesh> {
        let decoder = self.detect(request)?;
        request.enter(LoadStage::Acquiring);
        let raw = acquire::fetch_remote(
            &self.http,
            url,
            &request.name,
            decoder.is_binary(),
            request.progress,
        )
        .await?;
        self.decode(request, decoder, raw).await
    }

    #[cfg(not(target_family = "wasm"))]
    async fn run_file(
        &self,
        request: &mut LoadRequest<'_>,
        path: &Path,
    ) -> LoadResult<SurfaceMesh> {
        let decoder = self.detect(request)?;
        request.enter(LoadStage::Acquiring);
        let raw =
            acquire::read_local(path, &request.name, decoder.is_binary(), request.progress).await?;
        self.decode(request, decoder, raw).await
    }

    async fn run_embedded(
        &self,
        request: &mut LoadRequest<'_>,
        key: &str,
    ) -> LoadResult<SurfaceMesh> {
        let decoder = self.detect(request)?;
        request.enter(LoadStage::Acquiring);
        let raw =
            acquire::decode_embedded(&self.payloads, key, &request.name, decoder.is_binary())?;
        self.decode(request, decoder, raw).await
    }

    fn detect(&self, request: &mut LoadRequest<'_>) -> LoadResult<Box<dyn SurfaceDecoder>> {
        request.enter(LoadStage::Detecting);
        let kind = classify(&request.name).ok_or_else(|| LoadError::UnsupportedFormat {
            name: request.name.clone(),
        })?;
        tracing::debug!("Detected {} surface '{}'", kind, request.name);
        Ok(self.factory.create(kind))
    }

    async fn decode(
        &self,
        request: &mut LoadRequest<'_>,
        mut decoder: Box<dyn SurfaceDecoder>,
        raw: RawData,
    ) -> LoadResult<SurfaceMesh> {
        request.enter(LoadStage::Decoding);
        tracing::debug!("Decoding '{}' ({} bytes)", request.name, raw.len());

        let progress = request.progress;
        let report = move |fraction: f32| progress.report(fraction, DECODE_LABEL);
        decoder
            .read_data(raw, &report)
            .await
            .map_err(|e| match e {
                DecoderError::Malformed(reason) => LoadError::decode(&request.name, reason),
                DecoderError::Other(source) => LoadError::unexpected(&request.name, source),
            })?;

        request.enter(LoadStage::Expanding);
        expand(decoder.as_ref(), &request.name, request.params)
    }
}

impl<F> std::fmt::Debug for Loader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("params", &self.params)
            .field("payloads", &self.payloads.len())
            .finish_non_exhaustive()
    }
}

/// Book-keeping for one load.
struct LoadRequest<'a> {
    name: String,
    params: Option<&'a SurfaceParams>,
    stage: LoadStage,
    progress: &'a dyn ProgressSink,
}

impl LoadRequest<'_> {
    fn enter(&mut self, stage: LoadStage) {
        tracing::debug!(
            surface = %self.name,
            from = ?self.stage,
            to = ?stage,
            "Load stage changed"
        );
        self.stage = stage;
    }

    fn complete(mut self, result: LoadResult<SurfaceMesh>) -> LoadResult<SurfaceMesh> {
        match &result {
            Ok(head) => {
                self.enter(LoadStage::Done);
                self.progress.report(1.0, DECODE_LABEL);
                tracing::info!(
                    "Loaded surface '{}': {} sub-surfaces, {} vertices, {} triangles",
                    self.name,
                    head.surface_count(),
                    head.iter().map(|m| m.vertex_count).sum::<usize>(),
                    head.iter().map(|m| m.triangle_count).sum::<usize>()
                );
            }
            Err(e) => {
                self.enter(LoadStage::Failed);
                tracing::error!("Failed to load surface '{}': {}", self.name, e);
            }
        }
        result
    }
}

/// Turn every decoded sub-surface into a colored mesh with normals, linked
/// in decoder order.
///
/// Display overrides only apply to the first sub-surface. A decoder's own
/// solid color wins over the override.
fn expand(
    decoder: &dyn SurfaceDecoder,
    name: &str,
    params: Option<&SurfaceParams>,
) -> LoadResult<SurfaceMesh> {
    let count = decoder.surface_count();
    if count == 0 {
        return Err(LoadError::unexpected(name, "decoder reported no surfaces"));
    }

    let mut meshes = Vec::with_capacity(count);
    for index in 0..count {
        let geometry = MeshGeometry {
            vertex_count: decoder.point_count(index),
            triangle_count: decoder.triangle_count(index),
            positions: decoder.points(index).to_vec(),
            triangles: decoder.triangles(index).to_vec(),
            normals: decoder.normals(index).map(<[f32]>::to_vec),
        };
        let mut mesh = SurfaceMesh::from_geometry(name, geometry)
            .map_err(|e| LoadError::decode(name, format!("sub-surface {index}: {e}")))?;

        if let Some(params) = params.filter(|_| index == 0) {
            params.apply(&mut mesh);
        }
        if let Some(color) = decoder.solid_color(index) {
            mesh.solid_color = Some(color);
        }
        // Vertex colors always come from compositing; decoder colors are
        // not read.
        mesh.recolor(&NoRanges);

        if mesh.normals.is_none() {
            mesh.generate_normals()
                .map_err(|e| LoadError::unexpected(name, format!("sub-surface {index}: {e}")))?;
        }

        tracing::debug!(
            "Expanded sub-surface {} of '{}': {} vertices, {} triangles",
            index,
            name,
            mesh.vertex_count,
            mesh.triangle_count
        );
        meshes.push(mesh);
    }

    SurfaceMesh::chain(meshes)
        .ok_or_else(|| LoadError::unexpected(name, "decoder reported no surfaces"))
}
