//! End-to-end load tests driven by in-memory fixture decoders.

use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use surfkit::{
    DECODE_LABEL, DecodeFuture, DecoderError, DecoderFactory, EmbeddedPayloads, FormatKind,
    LOADING_LABEL, LoadError, Loader, OverlayLayer, ParamsMap, RawData, ScreenVolume,
    SurfaceDecoder, VolumeId,
};

#[derive(Debug, Clone, Default)]
struct FixtureSurface {
    positions: Vec<f32>,
    triangles: Vec<u32>,
    normals: Option<Vec<f32>>,
    colors: Option<Vec<f32>>,
    solid_color: Option<[f32; 3]>,
}

impl FixtureSurface {
    /// Unit square in the XY plane, two triangles.
    fn quad() -> Self {
        Self {
            positions: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ],
            triangles: vec![0, 1, 2, 0, 2, 3],
            ..Self::default()
        }
    }

    fn triangle_with_normals() -> Self {
        Self {
            positions: vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0],
            triangles: vec![0, 1, 2],
            normals: Some(vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Malformed,
    Other,
}

#[derive(Debug, Clone, Default)]
struct FixtureDecoder {
    binary: bool,
    surfaces: Vec<FixtureSurface>,
    failure: Option<Failure>,
    received: Arc<Mutex<Option<RawData>>>,
}

impl FixtureDecoder {
    fn new(surfaces: Vec<FixtureSurface>) -> Self {
        Self {
            binary: true,
            surfaces,
            ..Self::default()
        }
    }
}

impl SurfaceDecoder for FixtureDecoder {
    fn is_binary(&self) -> bool {
        self.binary
    }

    fn read_data<'a>(
        &'a mut self,
        raw: RawData,
        progress: &'a (dyn Fn(f32) + Sync),
    ) -> DecodeFuture<'a> {
        Box::pin(async move {
            *self.received.lock().unwrap() = Some(raw);
            progress(0.5);
            match self.failure {
                None => Ok(()),
                Some(Failure::Malformed) => {
                    Err(DecoderError::Malformed("missing triangle block".to_owned()))
                }
                Some(Failure::Other) => Err(DecoderError::Other("worker crashed".into())),
            }
        })
    }

    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn point_count(&self, index: usize) -> usize {
        self.surfaces[index].positions.len() / 3
    }

    fn triangle_count(&self, index: usize) -> usize {
        self.surfaces[index].triangles.len() / 3
    }

    fn points(&self, index: usize) -> &[f32] {
        &self.surfaces[index].positions
    }

    fn normals(&self, index: usize) -> Option<&[f32]> {
        self.surfaces[index].normals.as_deref()
    }

    fn triangles(&self, index: usize) -> &[u32] {
        &self.surfaces[index].triangles
    }

    fn colors(&self, index: usize) -> Option<&[f32]> {
        self.surfaces[index].colors.as_deref()
    }

    fn solid_color(&self, index: usize) -> Option<[f32; 3]> {
        self.surfaces[index].solid_color
    }
}

type Kinds = Arc<Mutex<Vec<FormatKind>>>;
type Events = Arc<Mutex<Vec<(f32, String)>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn factory(decoder: FixtureDecoder, kinds: Kinds) -> impl DecoderFactory {
    move |kind: FormatKind| -> Box<dyn SurfaceDecoder> {
        kinds.lock().unwrap().push(kind);
        Box::new(decoder.clone())
    }
}

/// Answer a single HTTP request with `status` and `body`, returning the
/// server's base URL.
async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = socket.read(&mut buf).await.unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
        }
        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        // The client may hang up after reading the status line.
        if socket.write_all(head.as_bytes()).await.is_ok() {
            let _ = socket.write_all(body).await;
        }
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}")
}

fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn payloads(name: &str) -> EmbeddedPayloads {
    let mut payloads = EmbeddedPayloads::new();
    payloads.insert(name.to_owned(), STANDARD.encode(b"surface bytes"));
    payloads
}

fn recorder() -> (Events, impl Fn(f32, &str) + Send + Sync + 'static) {
    let events = Events::default();
    let sink = {
        let events = Arc::clone(&events);
        move |fraction: f32, label: &str| {
            events.lock().unwrap().push((fraction, label.to_owned()));
        }
    };
    (events, sink)
}

#[tokio::test]
async fn two_sub_surfaces_form_a_chain() {
    init_tracing();
    let kinds = Kinds::default();
    let decoder = FixtureDecoder::new(vec![
        FixtureSurface::quad(),
        FixtureSurface::triangle_with_normals(),
    ]);
    let received = Arc::clone(&decoder.received);
    let loader =
        Loader::new(factory(decoder, Arc::clone(&kinds))).with_payloads(payloads("cortex"));

    let head = loader.load_embedded("cortex").await.unwrap();

    assert_eq!(*kinds.lock().unwrap(), [FormatKind::Gifti]);
    assert_eq!(
        *received.lock().unwrap(),
        Some(RawData::Binary(b"surface bytes".to_vec()))
    );

    assert_eq!(head.surface_count(), 2);
    assert_eq!(head.name, "cortex.surf.gii");
    assert_eq!(head.vertex_count, 4);
    assert_eq!(head.colors, vec![1.0; 16]);
    let normals = head.normals.as_ref().unwrap();
    for n in normals.chunks_exact(3) {
        assert!((n[2] - 1.0).abs() < 1e-6, "{n:?}");
    }

    let second = head.next.as_deref().unwrap();
    assert!(second.next.is_none());
    assert_eq!(second.vertex_count, 3);
    assert_eq!(second.colors, vec![1.0; 12]);
    // Decoder normals are kept as supplied.
    assert_eq!(
        second.normals.as_deref(),
        FixtureSurface::triangle_with_normals().normals.as_deref()
    );
}

#[tokio::test]
async fn unsupported_format_fails_without_progress() {
    init_tracing();
    let kinds = Kinds::default();
    let (events, sink) = recorder();
    let loader = Loader::new(factory(FixtureDecoder::default(), Arc::clone(&kinds)))
        .with_progress(sink);

    let err = loader
        .load_url("https://example.invalid/meshes/mesh.xyz")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::UnsupportedFormat {
            name: "mesh.xyz".to_owned()
        }
    );
    assert!(kinds.lock().unwrap().is_empty());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn decoder_failures_are_classified() {
    init_tracing();
    let mut decoder = FixtureDecoder::new(vec![FixtureSurface::quad()]);

    decoder.failure = Some(Failure::Malformed);
    let loader = Loader::new(factory(decoder.clone(), Kinds::default()))
        .with_payloads(payloads("lh"));
    let err = loader.load_embedded("lh").await.unwrap_err();
    assert!(
        matches!(&err, LoadError::Decode { name, reason }
            if name == "lh.surf.gii" && reason == "missing triangle block"),
        "{err:?}"
    );

    decoder.failure = Some(Failure::Other);
    let loader =
        Loader::new(factory(decoder, Kinds::default())).with_payloads(payloads("lh"));
    let err = loader.load_embedded("lh").await.unwrap_err();
    assert!(matches!(err, LoadError::Unexpected { .. }), "{err:?}");
}

#[tokio::test]
async fn empty_decode_is_unexpected() {
    init_tracing();
    let loader = Loader::new(factory(FixtureDecoder::new(Vec::new()), Kinds::default()))
        .with_payloads(payloads("lh"));
    let err = loader.load_embedded("lh").await.unwrap_err();
    assert!(matches!(err, LoadError::Unexpected { .. }), "{err:?}");
}

#[tokio::test]
async fn inconsistent_geometry_is_a_decode_error() {
    init_tracing();
    let mut surface = FixtureSurface::quad();
    surface.triangles[5] = 17;
    let loader = Loader::new(factory(FixtureDecoder::new(vec![surface]), Kinds::default()))
        .with_payloads(payloads("lh"));

    let err = loader.load_embedded("lh").await.unwrap_err();
    assert!(
        matches!(&err, LoadError::Decode { reason, .. } if reason.contains("out of range")),
        "{err:?}"
    );
}

#[tokio::test]
async fn missing_payload_is_a_transport_error() {
    init_tracing();
    let loader = Loader::new(factory(
        FixtureDecoder::new(vec![FixtureSurface::quad()]),
        Kinds::default(),
    ));
    let err = loader.load_embedded("absent").await.unwrap_err();
    assert!(
        matches!(&err, LoadError::Transport { name, .. } if name == "absent.surf.gii"),
        "{err:?}"
    );
}

#[tokio::test]
async fn params_apply_to_head_only() {
    init_tracing();
    let mut second = FixtureSurface::quad();
    second.solid_color = Some([0.0, 0.0, 1.0]);
    let decoder = FixtureDecoder::new(vec![FixtureSurface::quad(), second]);
    let params = ParamsMap::from_json(
        r#"{ "cortex": { "color": [1.0, 0.0, 0.0], "alpha": 0.5, "icon": "cortex.png" } }"#,
    )
    .unwrap();
    let loader = Loader::new(factory(decoder, Kinds::default()))
        .with_params(params)
        .with_payloads(payloads("cortex"));

    let head = loader.load_embedded("cortex").await.unwrap();
    assert_eq!(head.solid_color, Some([1.0, 0.0, 0.0]));
    assert!((head.opacity - 0.5).abs() < f32::EPSILON);
    assert_eq!(head.icon.as_deref(), Some("cortex.png"));

    let second = head.next.as_deref().unwrap();
    assert_eq!(second.solid_color, Some([0.0, 0.0, 1.0]));
    assert!((second.opacity - 1.0).abs() < f32::EPSILON);
    assert_eq!(second.icon, None);
}

#[tokio::test]
async fn decoder_solid_color_overrides_params() {
    init_tracing();
    let mut surface = FixtureSurface::quad();
    surface.solid_color = Some([0.0, 1.0, 0.0]);
    let mut params = ParamsMap::new();
    params.insert(
        "lh",
        surfkit::SurfaceParams {
            color: Some([1.0, 0.0, 0.0]),
            ..Default::default()
        },
    );
    let loader = Loader::new(factory(FixtureDecoder::new(vec![surface]), Kinds::default()))
        .with_params(params)
        .with_payloads(payloads("lh"));

    let head = loader.load_embedded("lh").await.unwrap();
    assert_eq!(head.solid_color, Some([0.0, 1.0, 0.0]));
}

#[tokio::test]
async fn decoder_colors_are_ignored() {
    init_tracing();
    let mut full = FixtureSurface::quad();
    full.colors = Some(vec![0.2; 16]);
    let mut short = FixtureSurface::quad();
    short.colors = Some(vec![0.2; 3]);
    let loader = Loader::new(factory(FixtureDecoder::new(vec![full, short]), Kinds::default()))
        .with_payloads(payloads("lh"));

    let head = loader.load_embedded("lh").await.unwrap();
    assert_eq!(head.colors, vec![1.0; 16]);
    assert_eq!(head.next.as_deref().unwrap().colors, vec![1.0; 16]);
}

#[tokio::test]
async fn decode_progress_ends_at_one() {
    init_tracing();
    let (events, sink) = recorder();
    let loader = Loader::new(factory(
        FixtureDecoder::new(vec![FixtureSurface::quad()]),
        Kinds::default(),
    ))
    .with_payloads(payloads("lh"))
    .with_progress(sink);

    loader.load_embedded("lh").await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        [(0.5_f32, DECODE_LABEL.to_owned()), (1.0, DECODE_LABEL.to_owned())]
    );
}

#[tokio::test]
async fn local_text_file_loads() {
    init_tracing();
    let path = std::env::temp_dir().join(format!("surfkit-{}-local.vtk", std::process::id()));
    tokio::fs::write(&path, "# vtk DataFile Version 3.0\n")
        .await
        .unwrap();

    let kinds = Kinds::default();
    let mut decoder = FixtureDecoder::new(vec![FixtureSurface::quad()]);
    decoder.binary = false;
    let received = Arc::clone(&decoder.received);
    let (events, sink) = recorder();
    let loader = Loader::new(factory(decoder, Arc::clone(&kinds))).with_progress(sink);

    let result = loader.load_file(&path).await;
    tokio::fs::remove_file(&path).await.unwrap();
    let head = result.unwrap();

    assert_eq!(*kinds.lock().unwrap(), [FormatKind::Vtk]);
    assert_eq!(
        *received.lock().unwrap(),
        Some(RawData::Text("# vtk DataFile Version 3.0\n".to_owned()))
    );
    assert_eq!(head.surface_count(), 1);
    assert!(head.name.ends_with("-local.vtk"));

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&(1.0, LOADING_LABEL.to_owned())));
    assert_eq!(events.last(), Some(&(1.0, DECODE_LABEL.to_owned())));
}

#[tokio::test]
async fn missing_local_file_is_a_transport_error() {
    init_tracing();
    let path = std::env::temp_dir().join(format!("surfkit-{}-missing.surf", std::process::id()));
    let loader = Loader::new(factory(
        FixtureDecoder::new(vec![FixtureSurface::quad()]),
        Kinds::default(),
    ));

    let err = loader.load_file(&path).await.unwrap_err();
    assert!(matches!(err, LoadError::Transport { .. }), "{err:?}");
    assert!(err.name().ends_with("-missing.surf"));
}

#[tokio::test]
async fn loaded_surface_recolors_in_place() {
    init_tracing();
    let loader = Loader::new(factory(
        FixtureDecoder::new(vec![FixtureSurface::quad(), FixtureSurface::quad()]),
        Kinds::default(),
    ))
    .with_payloads(payloads("lh"));
    let mut head = loader.load_embedded("lh").await.unwrap();

    head.overlays
        .push(OverlayLayer::new(VolumeId(1), vec![0.0, 1.0, 2.0, 3.0]));
    let screens = vec![ScreenVolume {
        volume: VolumeId(1),
        negative: false,
        hidden: false,
        screen_min: 0.0,
        screen_max: 3.0,
        alpha: 1.0,
        color_table: Arc::new([[255u8, 0, 0]; 256]),
    }];
    head.recolor(&screens);

    assert_eq!(&head.colors[..4], &[1.0, 0.0, 0.0, 1.0]);
    assert_eq!(&head.colors[12..], &[1.0, 0.0, 0.0, 1.0]);
    assert_eq!(head.next.as_deref().unwrap().colors, vec![1.0; 16]);
}

#[tokio::test]
async fn remote_surface_loads_with_download_progress() {
    init_tracing();
    let base = serve_once("200 OK", b"GIFTI bytes").await;

    let kinds = Kinds::default();
    let decoder = FixtureDecoder::new(vec![FixtureSurface::quad()]);
    let received = Arc::clone(&decoder.received);
    let (events, sink) = recorder();
    let loader = Loader::new(factory(decoder, Arc::clone(&kinds)))
        .with_http_client(local_client())
        .with_progress(sink);

    let head = loader
        .load_url(&format!("{base}/meshes/lh.pial.gii"))
        .await
        .unwrap();

    assert_eq!(head.name, "lh.pial.gii");
    assert_eq!(*kinds.lock().unwrap(), [FormatKind::Gifti]);
    assert_eq!(
        *received.lock().unwrap(),
        Some(RawData::Binary(b"GIFTI bytes".to_vec()))
    );

    let events = events.lock().unwrap();
    let loading: Vec<f32> = events
        .iter()
        .take_while(|(_, label)| label == LOADING_LABEL)
        .map(|&(fraction, _)| fraction)
        .collect();
    assert!(!loading.is_empty(), "{events:?}");
    assert!(loading.windows(2).all(|w| w[0] <= w[1]), "{events:?}");
    assert_eq!(loading.last(), Some(&1.0));
    assert!(
        events[loading.len()..]
            .iter()
            .all(|(_, label)| label == DECODE_LABEL),
        "{events:?}"
    );
    assert_eq!(events.last(), Some(&(1.0, DECODE_LABEL.to_owned())));
}

#[tokio::test]
async fn remote_error_status_is_a_transport_error() {
    init_tracing();
    let base = serve_once("404 Not Found", b"not found").await;

    let decoder = FixtureDecoder::new(vec![FixtureSurface::quad()]);
    let received = Arc::clone(&decoder.received);
    let (events, sink) = recorder();
    let loader = Loader::new(factory(decoder, Kinds::default()))
        .with_http_client(local_client())
        .with_progress(sink);

    let err = loader
        .load_url(&format!("{base}/meshes/rh.pial.gii"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::Transport {
            name: "rh.pial.gii".to_owned(),
            reason: "response status = 404".to_owned(),
        }
    );
    assert!(received.lock().unwrap().is_none());
    assert!(events.lock().unwrap().is_empty());
}
