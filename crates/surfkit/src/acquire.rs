//! Byte acquisition for the three load entry points.

#[cfg(not(target_family = "wasm"))]
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::decoder::RawData;
use crate::error::{LoadError, LoadResult};
use crate::pipeline::EmbeddedPayloads;
#[cfg(not(target_family = "wasm"))]
use crate::progress::{LOADING_LABEL, fraction};
use crate::progress::ProgressSink;

/// Read size for local files.
#[cfg(not(target_family = "wasm"))]
const READ_CHUNK: usize = 64 * 1024;

/// Fetch `url`, reporting download progress when the length is known.
pub(crate) async fn fetch_remote(
    client: &reqwest::Client,
    url: &str,
    name: &str,
    binary: bool,
    progress: &dyn ProgressSink,
) -> LoadResult<RawData> {
    #[cfg_attr(target_family = "wasm", allow(unused_mut))]
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LoadError::transport(name, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::transport(
            name,
            format!("response status = {}", status.as_u16()),
        ));
    }

    #[cfg(not(target_family = "wasm"))]
    let body = {
        let total = response.content_length();
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LoadError::transport(name, e))?
        {
            body.extend_from_slice(&chunk);
            if let Some(fraction) = fraction(body.len(), total) {
                progress.report(fraction, LOADING_LABEL);
            }
        }
        body
    };

    // The browser fetch API only hands over the finished body.
    #[cfg(target_family = "wasm")]
    let body = {
        let _ = progress;
        response
            .bytes()
            .await
            .map_err(|e| LoadError::transport(name, e))?
            .to_vec()
    };

    RawData::from_bytes(body, binary).map_err(|e| LoadError::transport(name, e))
}

/// Read a local file in chunks, reporting progress against its length.
#[cfg(not(target_family = "wasm"))]
pub(crate) async fn read_local(
    path: &Path,
    name: &str,
    binary: bool,
    progress: &dyn ProgressSink,
) -> LoadResult<RawData> {
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| LoadError::transport(name, e))?;
    let total = file
        .metadata()
        .await
        .map_err(|e| LoadError::transport(name, e))?
        .len();

    let mut bytes = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let read = file
            .read(&mut chunk)
            .await
            .map_err(|e| LoadError::transport(name, e))?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        if let Some(fraction) = fraction(bytes.len(), Some(total)) {
            progress.report(fraction, LOADING_LABEL);
        }
    }

    RawData::from_bytes(bytes, binary).map_err(|e| LoadError::transport(name, e))
}

/// Decode the base64 payload registered under `key`.
pub(crate) fn decode_embedded(
    payloads: &EmbeddedPayloads,
    key: &str,
    name: &str,
    binary: bool,
) -> LoadResult<RawData> {
    let encoded = payloads
        .get(key)
        .ok_or_else(|| LoadError::transport(name, format!("no embedded payload named '{key}'")))?;

    let compact: String = encoded.split_ascii_whitespace().collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| LoadError::transport(name, e))?;

    RawData::from_bytes(bytes, binary).map_err(|e| LoadError::transport(name, e))
}
