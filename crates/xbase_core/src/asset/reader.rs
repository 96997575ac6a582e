//! Asset read helpers over an [`AssetStore`].
//!
//! # Responsibility
//! - Pair every open with exactly one close (`AssetStream` drop).
//! - Decode bytes into text, properties or raster images.
//! - Log each failure once with a stable `error_code`.
//!
//! # Invariants
//! - Helpers never panic on missing or corrupt assets.
//! - `open_stream` is the only helper that hands a stream to the caller.

use super::properties::{parse_properties, Properties};
use super::store::{AssetStore, DirAssetStore};
use super::{normalize_path, AssetError, AssetResult, DecodeKind};
use image::DynamicImage;
use log::{debug, error, warn};
use std::fmt::{Debug, Formatter};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// Chunk size of the drain loop used by byte/text/image reads.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Caller-owned, single-use, sequential stream over one asset.
///
/// Dropping the stream closes it.
pub struct AssetStream {
    path: String,
    inner: Box<dyn Read + Send>,
}

impl AssetStream {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Closes the stream now instead of at scope end.
    pub fn close(self) {}
}

impl Read for AssetStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Debug for AssetStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStream")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Drop for AssetStream {
    fn drop(&mut self) {
        debug!(
            "event=asset_close module=asset status=ok path={}",
            self.path
        );
    }
}

/// Read-only asset access for UI and service callers.
#[derive(Clone)]
pub struct AssetReader {
    store: Arc<dyn AssetStore>,
}

impl AssetReader {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Reader over a directory acting as the asset root.
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(DirAssetStore::new(root)))
    }

    /// Lists files and folders directly below `path` (`""` is the root).
    ///
    /// A missing directory yields an empty list.
    pub fn list_paths(&self, path: &str) -> AssetResult<Vec<String>> {
        let result = normalize_path(path).and_then(|normalized| {
            self.store
                .list(&normalized)
                .map_err(|err| AssetError::from_io(&normalized, err))
        });
        logged("list", path, result)
    }

    /// Returns whether a file can be opened at `path`.
    ///
    /// The stream opened for the check is closed before returning.
    pub fn exists(&self, path: &str) -> bool {
        match self.open(path) {
            Ok(stream) => {
                stream.close();
                true
            }
            Err(err) => {
                debug!(
                    "event=asset_exists module=asset status=miss path={} error_code={}",
                    path,
                    err.code()
                );
                false
            }
        }
    }

    /// Returns the declared byte length of the asset at `path`.
    pub fn size_of(&self, path: &str) -> AssetResult<u64> {
        let result = normalize_file_path(path).and_then(|normalized| {
            self.store
                .length(&normalized)
                .map_err(|err| AssetError::from_io(&normalized, err))
        });
        logged("size", path, result)
    }

    /// Opens a stream at offset 0. The caller owns and closes it.
    pub fn open_stream(&self, path: &str) -> AssetResult<AssetStream> {
        logged("open", path, self.open(path))
    }

    /// Reads the asset at `path` as a properties file.
    pub fn read_config(&self, path: &str) -> AssetResult<Properties> {
        let result = self.read_with(path, |stream| {
            let bytes = drain(stream).map_err(|err| AssetError::from_io(&stream.path, err))?;
            let text = String::from_utf8(bytes)
                .map_err(|err| AssetError::decode(&stream.path, DecodeKind::Properties, err))?;
            parse_properties(&text)
                .map_err(|err| AssetError::decode(&stream.path, DecodeKind::Properties, err))
        });
        logged("read_config", path, result)
    }

    /// Reads the full content of the asset at `path`.
    pub fn read_bytes(&self, path: &str) -> AssetResult<Vec<u8>> {
        let result = self.read_with(path, |stream| {
            drain(stream).map_err(|err| AssetError::from_io(&stream.path, err))
        });
        logged("read_bytes", path, result)
    }

    /// Reads the asset at `path` as UTF-8 text.
    pub fn read_text(&self, path: &str) -> AssetResult<String> {
        let result = self.read_with(path, |stream| {
            let bytes = drain(stream).map_err(|err| AssetError::from_io(&stream.path, err))?;
            String::from_utf8(bytes)
                .map_err(|err| AssetError::decode(&stream.path, DecodeKind::Text, err))
        });
        logged("read_text", path, result)
    }

    /// Decodes the asset at `path` as a raster image (PNG or JPEG).
    pub fn read_image(&self, path: &str) -> AssetResult<DynamicImage> {
        let result = self.read_with(path, |stream| {
            let bytes = drain(stream).map_err(|err| AssetError::from_io(&stream.path, err))?;
            image::load_from_memory(&bytes)
                .map_err(|err| AssetError::decode(&stream.path, DecodeKind::Image, err))
        });
        logged("read_image", path, result)
    }

    fn open(&self, path: &str) -> AssetResult<AssetStream> {
        let normalized = normalize_file_path(path)?;
        let inner = self
            .store
            .open(&normalized)
            .map_err(|err| AssetError::from_io(&normalized, err))?;
        Ok(AssetStream {
            path: normalized,
            inner,
        })
    }

    /// Opens `path`, runs `f`, and closes the stream on every exit path.
    fn read_with<T>(
        &self,
        path: &str,
        f: impl FnOnce(&mut AssetStream) -> AssetResult<T>,
    ) -> AssetResult<T> {
        let mut stream = self.open(path)?;
        let result = f(&mut stream);
        stream.close();
        result
    }
}

impl Debug for AssetReader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetReader").finish_non_exhaustive()
    }
}

fn normalize_file_path(path: &str) -> AssetResult<String> {
    let normalized = normalize_path(path)?;
    if normalized.is_empty() {
        return Err(AssetError::InvalidPath(path.to_string()));
    }
    Ok(normalized)
}

fn drain(stream: &mut AssetStream) -> io::Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return Ok(output),
            Ok(len) => output.extend_from_slice(&buf[..len]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

fn logged<T>(op: &'static str, path: &str, result: AssetResult<T>) -> AssetResult<T> {
    match &result {
        Ok(_) => debug!(
            "event=asset_read module=asset status=ok op={} path={}",
            op, path
        ),
        Err(err) if err.is_not_found() => warn!(
            "event=asset_read module=asset status=error op={} path={} error_code={}",
            op,
            path,
            err.code()
        ),
        Err(err) => error!(
            "event=asset_read module=asset status=error op={} path={} error_code={} error={}",
            op,
            path,
            err.code(),
            err
        ),
    }
    result
}
